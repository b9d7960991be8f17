use async_trait::async_trait;
use chrono::Utc;

use usof_core::domain::{
    Category, Comment, NewCategory, NewComment, NewPost, NewUser, Post, User, Vote, VoteKind,
    VoteTarget,
};
use usof_core::error::RepoError;
use usof_core::lifecycle::ContentStatus;
use usof_core::policy::{CommentVisibility, ContentSnapshot};
use usof_core::ports::{
    BaseRepository, CategoryRepository, CommentRepository, FavoriteRepository, PostRepository,
    UserRepository, VoteRepository,
};
use usof_core::query::{Page, PageRequest, PostQuery, PostVisibility};
use usof_core::views::{CommentRow, FavoriteRow, PostRow, UserProfile, VoteRow, compare_posts};

use super::{FavoriteRecord, InMemoryStore, Tables, VoteRecord, next};

fn check_user_unique(t: &Tables, user: &User) -> Result<(), RepoError> {
    for other in t.users.values().filter(|u| u.id != user.id) {
        if other.login == user.login {
            return Err(RepoError::Constraint("users.login".to_string()));
        }
        if other.email == user.email {
            return Err(RepoError::Constraint("users.email".to_string()));
        }
    }
    Ok(())
}

fn check_categories_exist(t: &Tables, ids: &[i32]) -> Result<(), RepoError> {
    match ids.iter().find(|id| !t.categories.contains_key(id)) {
        Some(missing) => Err(RepoError::Reference(format!(
            "category {missing} does not exist"
        ))),
        None => Ok(()),
    }
}

fn link_categories(t: &mut Tables, post_id: i32, ids: &[i32]) {
    t.post_categories.retain(|(p, _)| *p != post_id);
    for id in ids {
        if !t.post_categories.contains(&(post_id, *id)) {
            t.post_categories.push((post_id, *id));
        }
    }
}

fn admits_post(visibility: PostVisibility, post: &Post) -> bool {
    match visibility {
        PostVisibility::All => true,
        PostVisibility::VisibleTo(uid) => {
            post.status.is_publicly_visible() || post.user_id == uid
        }
        PostVisibility::Public => post.status.is_publicly_visible(),
    }
}

#[async_trait]
impl BaseRepository<User, i32> for InMemoryStore {
    async fn find_by_id(&self, id: i32) -> Result<Option<User>, RepoError> {
        Ok(self.tables.read().await.users.get(&id).cloned())
    }

    async fn delete(&self, id: i32) -> Result<(), RepoError> {
        if self.tables.write().await.remove_user(id) {
            Ok(())
        } else {
            Err(RepoError::NotFound)
        }
    }
}

#[async_trait]
impl UserRepository for InMemoryStore {
    async fn find_by_login(&self, login: &str) -> Result<Option<User>, RepoError> {
        let t = self.tables.read().await;
        Ok(t.users.values().find(|u| u.login == login).cloned())
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, RepoError> {
        let t = self.tables.read().await;
        Ok(t.users.values().find(|u| u.email == email).cloned())
    }

    async fn find_by_email_token(&self, token: &str) -> Result<Option<User>, RepoError> {
        let t = self.tables.read().await;
        Ok(t
            .users
            .values()
            .find(|u| u.email_token.as_deref() == Some(token))
            .cloned())
    }

    async fn find_by_reset_token(&self, token: &str) -> Result<Option<User>, RepoError> {
        let t = self.tables.read().await;
        Ok(t
            .users
            .values()
            .find(|u| u.reset_token.as_deref() == Some(token))
            .cloned())
    }

    async fn insert(&self, new: NewUser) -> Result<User, RepoError> {
        let mut t = self.tables.write().await;
        let mut user = User {
            id: 0,
            login: new.login,
            email: new.email,
            password_hash: new.password_hash,
            full_name: new.full_name,
            role: new.role,
            email_confirmed: new.email_confirmed,
            email_token: new.email_token,
            reset_token: None,
            reset_token_expires: None,
            profile_picture: None,
            created_at: Utc::now(),
        };
        check_user_unique(&t, &user)?;
        user.id = next(&mut t.seq.users);
        t.users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn update(&self, user: &User) -> Result<User, RepoError> {
        let mut t = self.tables.write().await;
        if !t.users.contains_key(&user.id) {
            return Err(RepoError::NotFound);
        }
        check_user_unique(&t, user)?;
        t.users.insert(user.id, user.clone());
        Ok(user.clone())
    }

    async fn profile(&self, id: i32) -> Result<Option<UserProfile>, RepoError> {
        let t = self.tables.read().await;
        Ok(t.users.get(&id).map(|u| t.profile(u)))
    }

    async fn list_profiles(&self) -> Result<Vec<UserProfile>, RepoError> {
        let t = self.tables.read().await;
        let mut users: Vec<&User> = t.users.values().collect();
        users.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(users.into_iter().map(|u| t.profile(u)).collect())
    }

    async fn count(&self) -> Result<u64, RepoError> {
        Ok(self.tables.read().await.users.len() as u64)
    }
}

#[async_trait]
impl BaseRepository<Post, i32> for InMemoryStore {
    async fn find_by_id(&self, id: i32) -> Result<Option<Post>, RepoError> {
        Ok(self.tables.read().await.posts.get(&id).cloned())
    }

    async fn delete(&self, id: i32) -> Result<(), RepoError> {
        if self.tables.write().await.remove_post(id) {
            Ok(())
        } else {
            Err(RepoError::NotFound)
        }
    }
}

#[async_trait]
impl PostRepository for InMemoryStore {
    async fn insert(&self, new: NewPost) -> Result<Post, RepoError> {
        let mut t = self.tables.write().await;
        if !t.users.contains_key(&new.user_id) {
            return Err(RepoError::Reference("author does not exist".to_string()));
        }
        check_categories_exist(&t, &new.category_ids)?;
        let now = Utc::now();
        let post = Post {
            id: next(&mut t.seq.posts),
            user_id: new.user_id,
            title: new.title,
            content: new.content,
            status: ContentStatus::Active,
            created_at: now,
            updated_at: now,
        };
        t.posts.insert(post.id, post.clone());
        link_categories(&mut t, post.id, &new.category_ids);
        Ok(post)
    }

    async fn update(&self, post: &Post, categories: Option<&[i32]>) -> Result<Post, RepoError> {
        let mut t = self.tables.write().await;
        if !t.posts.contains_key(&post.id) {
            return Err(RepoError::NotFound);
        }
        if let Some(ids) = categories {
            check_categories_exist(&t, ids)?;
            link_categories(&mut t, post.id, ids);
        }
        t.posts.insert(post.id, post.clone());
        Ok(post.clone())
    }

    async fn row(&self, id: i32) -> Result<Option<PostRow>, RepoError> {
        let t = self.tables.read().await;
        Ok(t.posts.get(&id).map(|p| t.post_row(p)))
    }

    async fn list(&self, query: &PostQuery) -> Result<Page<PostRow>, RepoError> {
        let t = self.tables.read().await;
        let mut rows: Vec<PostRow> = t
            .posts
            .values()
            .filter(|p| admits_post(query.visibility, p))
            .filter(|p| {
                query.categories.is_empty()
                    || t.post_categories
                        .iter()
                        .any(|(post_id, cat)| *post_id == p.id && query.categories.contains(cat))
            })
            .filter(|p| query.date_from.is_none_or(|from| p.created_at >= from))
            .filter(|p| query.date_to.is_none_or(|to| p.created_at <= to))
            .map(|p| t.post_row(p))
            .collect();
        rows.sort_by(|a, b| compare_posts(a, b, query.sort, query.order));
        let total = rows.len() as u64;
        Ok(Page::new(query.page.slice(&rows), query.page, total))
    }

    async fn categories(&self, post_id: i32) -> Result<Vec<Category>, RepoError> {
        let t = self.tables.read().await;
        Ok(t.post_categories
            .iter()
            .filter(|(p, _)| *p == post_id)
            .filter_map(|(_, c)| t.categories.get(c).cloned())
            .collect())
    }

    async fn count_active(&self) -> Result<u64, RepoError> {
        let t = self.tables.read().await;
        Ok(t.posts
            .values()
            .filter(|p| p.status == ContentStatus::Active)
            .count() as u64)
    }
}

#[async_trait]
impl BaseRepository<Comment, i32> for InMemoryStore {
    async fn find_by_id(&self, id: i32) -> Result<Option<Comment>, RepoError> {
        Ok(self.tables.read().await.comments.get(&id).cloned())
    }

    async fn delete(&self, id: i32) -> Result<(), RepoError> {
        if self.tables.write().await.remove_comment(id) {
            Ok(())
        } else {
            Err(RepoError::NotFound)
        }
    }
}

#[async_trait]
impl CommentRepository for InMemoryStore {
    async fn insert(&self, new: NewComment) -> Result<Comment, RepoError> {
        let mut t = self.tables.write().await;
        if !t.posts.contains_key(&new.post_id) {
            return Err(RepoError::Reference("post does not exist".to_string()));
        }
        if !t.users.contains_key(&new.user_id) {
            return Err(RepoError::Reference("author does not exist".to_string()));
        }
        let now = Utc::now();
        let comment = Comment {
            id: next(&mut t.seq.comments),
            post_id: new.post_id,
            user_id: new.user_id,
            content: new.content,
            status: ContentStatus::Active,
            created_at: now,
            updated_at: now,
        };
        t.comments.insert(comment.id, comment.clone());
        Ok(comment)
    }

    async fn update(&self, comment: &Comment) -> Result<Comment, RepoError> {
        let mut t = self.tables.write().await;
        match t.comments.get_mut(&comment.id) {
            Some(slot) => {
                *slot = comment.clone();
                Ok(comment.clone())
            }
            None => Err(RepoError::NotFound),
        }
    }

    async fn row(&self, id: i32) -> Result<Option<CommentRow>, RepoError> {
        let t = self.tables.read().await;
        Ok(t.comments.get(&id).map(|c| t.comment_row(c)))
    }

    async fn list_for_post(
        &self,
        post_id: i32,
        visibility: CommentVisibility,
    ) -> Result<Vec<CommentRow>, RepoError> {
        let t = self.tables.read().await;
        let mut rows: Vec<CommentRow> = t
            .comments
            .values()
            .filter(|c| c.post_id == post_id)
            .filter(|c| visibility.admits(ContentSnapshot::new(c.user_id, c.status)))
            .map(|c| t.comment_row(c))
            .collect();
        rows.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(a.id.cmp(&b.id)));
        Ok(rows)
    }

    async fn list_all(&self, page: PageRequest) -> Result<Page<CommentRow>, RepoError> {
        let t = self.tables.read().await;
        let mut rows: Vec<CommentRow> = t.comments.values().map(|c| t.comment_row(c)).collect();
        rows.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(a.id.cmp(&b.id)));
        let total = rows.len() as u64;
        Ok(Page::new(page.slice(&rows), page, total))
    }
}

#[async_trait]
impl BaseRepository<Category, i32> for InMemoryStore {
    async fn find_by_id(&self, id: i32) -> Result<Option<Category>, RepoError> {
        Ok(self.tables.read().await.categories.get(&id).cloned())
    }

    async fn delete(&self, id: i32) -> Result<(), RepoError> {
        let mut t = self.tables.write().await;
        if t.categories.remove(&id).is_none() {
            return Err(RepoError::NotFound);
        }
        t.post_categories.retain(|(_, c)| *c != id);
        Ok(())
    }
}

#[async_trait]
impl CategoryRepository for InMemoryStore {
    async fn insert(&self, new: NewCategory) -> Result<Category, RepoError> {
        let mut t = self.tables.write().await;
        if t.categories.values().any(|c| c.title == new.title) {
            return Err(RepoError::Constraint("categories.title".to_string()));
        }
        let category = Category {
            id: next(&mut t.seq.categories),
            title: new.title,
            description: new.description,
            created_at: Utc::now(),
        };
        t.categories.insert(category.id, category.clone());
        Ok(category)
    }

    async fn update(&self, category: &Category) -> Result<Category, RepoError> {
        let mut t = self.tables.write().await;
        if !t.categories.contains_key(&category.id) {
            return Err(RepoError::NotFound);
        }
        if t
            .categories
            .values()
            .any(|c| c.id != category.id && c.title == category.title)
        {
            return Err(RepoError::Constraint("categories.title".to_string()));
        }
        t.categories.insert(category.id, category.clone());
        Ok(category.clone())
    }

    async fn list(&self, page: PageRequest) -> Result<Page<Category>, RepoError> {
        let t = self.tables.read().await;
        let mut all: Vec<Category> = t.categories.values().cloned().collect();
        all.sort_by(|a, b| a.title.cmp(&b.title).then(a.id.cmp(&b.id)));
        let total = all.len() as u64;
        Ok(Page::new(page.slice(&all), page, total))
    }

    async fn count(&self) -> Result<u64, RepoError> {
        Ok(self.tables.read().await.categories.len() as u64)
    }
}

#[async_trait]
impl VoteRepository for InMemoryStore {
    async fn find(&self, target: VoteTarget, user_id: i32) -> Result<Option<Vote>, RepoError> {
        let t = self.tables.read().await;
        Ok(t.votes(target)
            .iter()
            .find(|v| v.target_id == target.id() && v.user_id == user_id)
            .map(|v| Vote {
                id: v.id,
                user_id: v.user_id,
                kind: v.kind,
                created_at: v.created_at,
            }))
    }

    async fn insert(
        &self,
        target: VoteTarget,
        user_id: i32,
        kind: VoteKind,
    ) -> Result<Vote, RepoError> {
        let mut t = self.tables.write().await;
        if !t.target_exists(target) || !t.users.contains_key(&user_id) {
            return Err(RepoError::Reference(format!(
                "{} does not exist",
                target.entity()
            )));
        }
        if t
            .votes(target)
            .iter()
            .any(|v| v.target_id == target.id() && v.user_id == user_id)
        {
            return Err(RepoError::Constraint("vote (user, target)".to_string()));
        }
        let id = match target {
            VoteTarget::Post(_) => next(&mut t.seq.post_votes),
            VoteTarget::Comment(_) => next(&mut t.seq.comment_votes),
        };
        let record = VoteRecord {
            id,
            user_id,
            target_id: target.id(),
            kind,
            created_at: Utc::now(),
        };
        t.votes_mut(target).push(record.clone());
        Ok(Vote {
            id,
            user_id,
            kind,
            created_at: record.created_at,
        })
    }

    async fn set_kind(
        &self,
        target: VoteTarget,
        user_id: i32,
        kind: VoteKind,
    ) -> Result<(), RepoError> {
        let mut t = self.tables.write().await;
        let vote = t
            .votes_mut(target)
            .iter_mut()
            .find(|v| v.target_id == target.id() && v.user_id == user_id)
            .ok_or(RepoError::NotFound)?;
        vote.kind = kind;
        Ok(())
    }

    async fn remove(&self, target: VoteTarget, user_id: i32) -> Result<bool, RepoError> {
        let mut t = self.tables.write().await;
        let votes = t.votes_mut(target);
        let before = votes.len();
        votes.retain(|v| !(v.target_id == target.id() && v.user_id == user_id));
        Ok(votes.len() != before)
    }

    async fn list(&self, target: VoteTarget) -> Result<Vec<VoteRow>, RepoError> {
        let t = self.tables.read().await;
        let mut rows: Vec<VoteRow> = t
            .votes(target)
            .iter()
            .filter(|v| v.target_id == target.id())
            .map(|v| VoteRow {
                id: v.id,
                user_id: v.user_id,
                kind: v.kind,
                created_at: v.created_at,
                author_login: t
                    .users
                    .get(&v.user_id)
                    .map(|u| u.login.clone())
                    .unwrap_or_default(),
            })
            .collect();
        rows.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(rows)
    }
}

#[async_trait]
impl FavoriteRepository for InMemoryStore {
    async fn add(&self, user_id: i32, post_id: i32) -> Result<(), RepoError> {
        let mut t = self.tables.write().await;
        if !t.posts.contains_key(&post_id) || !t.users.contains_key(&user_id) {
            return Err(RepoError::Reference("post does not exist".to_string()));
        }
        if t
            .favorites
            .iter()
            .any(|f| f.user_id == user_id && f.post_id == post_id)
        {
            return Err(RepoError::Constraint("user_favorites (user, post)".to_string()));
        }
        let id = next(&mut t.seq.favorites);
        t.favorites.push(FavoriteRecord {
            id,
            user_id,
            post_id,
            created_at: Utc::now(),
        });
        Ok(())
    }

    async fn remove(&self, user_id: i32, post_id: i32) -> Result<bool, RepoError> {
        let mut t = self.tables.write().await;
        let before = t.favorites.len();
        t.favorites
            .retain(|f| !(f.user_id == user_id && f.post_id == post_id));
        Ok(t.favorites.len() != before)
    }

    async fn contains(&self, user_id: i32, post_id: i32) -> Result<bool, RepoError> {
        let t = self.tables.read().await;
        Ok(t.favorites
            .iter()
            .any(|f| f.user_id == user_id && f.post_id == post_id))
    }

    async fn list(&self, user_id: i32, page: PageRequest) -> Result<Page<FavoriteRow>, RepoError> {
        let t = self.tables.read().await;
        let mut favorites: Vec<&FavoriteRecord> = t
            .favorites
            .iter()
            .filter(|f| f.user_id == user_id)
            .filter(|f| {
                t.posts
                    .get(&f.post_id)
                    .is_some_and(|p| p.status == ContentStatus::Active)
            })
            .collect();
        favorites.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        let rows: Vec<FavoriteRow> = favorites
            .into_iter()
            .filter_map(|f| {
                t.posts.get(&f.post_id).map(|p| FavoriteRow {
                    post: t.post_row(p),
                    favorited_at: f.created_at,
                })
            })
            .collect();
        let total = rows.len() as u64;
        Ok(Page::new(page.slice(&rows), page, total))
    }
}
