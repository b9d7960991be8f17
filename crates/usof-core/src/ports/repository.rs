use async_trait::async_trait;

use crate::domain::{
    Category, Comment, NewCategory, NewComment, NewPost, NewUser, Post, User, Vote, VoteKind,
    VoteTarget,
};
use crate::error::RepoError;
use crate::policy::CommentVisibility;
use crate::query::{Page, PageRequest, PostQuery};
use crate::views::{CommentRow, FavoriteRow, PostRow, UserProfile, VoteRow};

/// Generic repository trait shared by every keyed entity.
#[async_trait]
pub trait BaseRepository<T, ID>: Send + Sync {
    /// Find an entity by its unique ID.
    async fn find_by_id(&self, id: ID) -> Result<Option<T>, RepoError>;

    /// Delete an entity by its ID. Dependent rows go with it.
    async fn delete(&self, id: ID) -> Result<(), RepoError>;
}

/// User repository with domain-specific methods.
#[async_trait]
pub trait UserRepository: BaseRepository<User, i32> {
    async fn find_by_login(&self, login: &str) -> Result<Option<User>, RepoError>;

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, RepoError>;

    async fn find_by_email_token(&self, token: &str) -> Result<Option<User>, RepoError>;

    async fn find_by_reset_token(&self, token: &str) -> Result<Option<User>, RepoError>;

    /// Insert a new account. A taken login or email yields
    /// [`RepoError::Constraint`] naming the column.
    async fn insert(&self, user: NewUser) -> Result<User, RepoError>;

    /// Overwrite every mutable column of an existing account.
    async fn update(&self, user: &User) -> Result<User, RepoError>;

    /// Profile projection with rating and activity counts.
    async fn profile(&self, id: i32) -> Result<Option<UserProfile>, RepoError>;

    /// Every profile, newest account first.
    async fn list_profiles(&self) -> Result<Vec<UserProfile>, RepoError>;

    async fn count(&self) -> Result<u64, RepoError>;
}

/// Post repository.
#[async_trait]
pub trait PostRepository: BaseRepository<Post, i32> {
    /// Insert a post and its category links atomically.
    async fn insert(&self, post: NewPost) -> Result<Post, RepoError>;

    /// Persist scalar changes; when `categories` is given the category links
    /// are replaced in the same transaction.
    async fn update(&self, post: &Post, categories: Option<&[i32]>) -> Result<Post, RepoError>;

    /// The aggregated list row of a single post, whatever its status.
    async fn row(&self, id: i32) -> Result<Option<PostRow>, RepoError>;

    /// Filtered, sorted and paginated listing.
    async fn list(&self, query: &PostQuery) -> Result<Page<PostRow>, RepoError>;

    async fn categories(&self, post_id: i32) -> Result<Vec<Category>, RepoError>;

    async fn count_active(&self) -> Result<u64, RepoError>;
}

#[async_trait]
pub trait CommentRepository: BaseRepository<Comment, i32> {
    async fn insert(&self, comment: NewComment) -> Result<Comment, RepoError>;

    async fn update(&self, comment: &Comment) -> Result<Comment, RepoError>;

    async fn row(&self, id: i32) -> Result<Option<CommentRow>, RepoError>;

    /// Comments of one post admitted by `visibility`, newest first.
    async fn list_for_post(
        &self,
        post_id: i32,
        visibility: CommentVisibility,
    ) -> Result<Vec<CommentRow>, RepoError>;

    /// Every comment regardless of status, newest first.
    async fn list_all(&self, page: PageRequest) -> Result<Page<CommentRow>, RepoError>;
}

#[async_trait]
pub trait CategoryRepository: BaseRepository<Category, i32> {
    async fn insert(&self, category: NewCategory) -> Result<Category, RepoError>;

    async fn update(&self, category: &Category) -> Result<Category, RepoError>;

    /// Categories ordered by title.
    async fn list(&self, page: PageRequest) -> Result<Page<Category>, RepoError>;

    async fn count(&self) -> Result<u64, RepoError>;
}

/// Likes and dislikes on posts and comments. At most one row per
/// (user, target), enforced by the store.
#[async_trait]
pub trait VoteRepository: Send + Sync {
    async fn find(&self, target: VoteTarget, user_id: i32) -> Result<Option<Vote>, RepoError>;

    async fn insert(
        &self,
        target: VoteTarget,
        user_id: i32,
        kind: VoteKind,
    ) -> Result<Vote, RepoError>;

    async fn set_kind(&self, target: VoteTarget, user_id: i32, kind: VoteKind)
    -> Result<(), RepoError>;

    /// Returns whether a row was removed.
    async fn remove(&self, target: VoteTarget, user_id: i32) -> Result<bool, RepoError>;

    /// Votes on a target, newest first.
    async fn list(&self, target: VoteTarget) -> Result<Vec<VoteRow>, RepoError>;
}

/// Per-user favorite posts.
#[async_trait]
pub trait FavoriteRepository: Send + Sync {
    /// A duplicate pair yields [`RepoError::Constraint`].
    async fn add(&self, user_id: i32, post_id: i32) -> Result<(), RepoError>;

    /// Returns whether a row was removed.
    async fn remove(&self, user_id: i32, post_id: i32) -> Result<bool, RepoError>;

    async fn contains(&self, user_id: i32, post_id: i32) -> Result<bool, RepoError>;

    /// Active favorited posts, most recently favorited first.
    async fn list(&self, user_id: i32, page: PageRequest) -> Result<Page<FavoriteRow>, RepoError>;
}
