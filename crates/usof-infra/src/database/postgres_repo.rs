//! PostgreSQL repository implementations.
//!
//! Plain CRUD goes through the SeaORM entities. Aggregated views (post and
//! comment rows, profiles, favorites) are hand-written SQL so every listing
//! computes counts and ratings with exactly the same expressions.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use sea_orm::prelude::DateTimeWithTimeZone;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DbBackend, DbConn, DbErr, EntityTrait,
    FromQueryResult, PaginatorTrait, QueryFilter, QueryOrder, QueryResult, QuerySelect, Set,
    Statement, TransactionTrait, Value,
};

use usof_core::domain::{
    Category, Comment, NewCategory, NewComment, NewPost, NewUser, Post, User, Vote, VoteKind,
    VoteTarget,
};
use usof_core::error::RepoError;
use usof_core::policy::CommentVisibility;
use usof_core::ports::{
    CategoryRepository, CommentRepository, FavoriteRepository, PostRepository, UserRepository,
    VoteRepository,
};
use usof_core::query::{Page, PageRequest, PostQuery, PostSort, PostVisibility};
use usof_core::services::Repositories;
use usof_core::views::{CommentRow, FavoriteRow, PostRow, UserProfile, VoteRow};

use super::entity::{
    DbContentStatus, DbRole, DbVoteKind, category, comment, favorite, post, post_category, user,
};
use super::postgres_base::{PostgresBaseRepository, map_db_err};

/// PostgreSQL user repository.
pub type PostgresUserRepository = PostgresBaseRepository<user::Entity>;

/// PostgreSQL post repository.
pub type PostgresPostRepository = PostgresBaseRepository<post::Entity>;

pub type PostgresCommentRepository = PostgresBaseRepository<comment::Entity>;

pub type PostgresCategoryRepository = PostgresBaseRepository<category::Entity>;

pub type PostgresFavoriteRepository = PostgresBaseRepository<favorite::Entity>;

/// Votes live in two tables with the same shape, so they are addressed by
/// name instead of through an entity.
pub struct PostgresVoteRepository {
    db: Arc<DbConn>,
}

impl PostgresVoteRepository {
    pub fn new(db: Arc<DbConn>) -> Self {
        Self { db }
    }
}

/// Every repository port backed by one connection pool.
pub fn postgres_repositories(db: DbConn) -> Repositories {
    let db = Arc::new(db);
    Repositories {
        users: Arc::new(PostgresUserRepository::new(db.clone())),
        posts: Arc::new(PostgresPostRepository::new(db.clone())),
        comments: Arc::new(PostgresCommentRepository::new(db.clone())),
        categories: Arc::new(PostgresCategoryRepository::new(db.clone())),
        votes: Arc::new(PostgresVoteRepository::new(db.clone())),
        favorites: Arc::new(PostgresFavoriteRepository::new(db)),
    }
}

/// Positional parameters of a hand-written statement.
#[derive(Debug, Clone, Default)]
struct Params(Vec<Value>);

impl Params {
    /// Append a value and return its placeholder.
    fn bind(&mut self, value: impl Into<Value>) -> String {
        self.0.push(value.into());
        format!("${}", self.0.len())
    }

    fn bind_page(&mut self, page: PageRequest) -> String {
        let limit = self.bind(i64::try_from(page.limit).unwrap_or(i64::MAX));
        let offset = self.bind(i64::try_from(page.offset()).unwrap_or(i64::MAX));
        format!(" LIMIT {limit} OFFSET {offset}")
    }

    fn statement(self, sql: String) -> Statement {
        Statement::from_sql_and_values(DbBackend::Postgres, sql, self.0)
    }
}

#[derive(Debug, FromQueryResult)]
struct CountRow {
    total: i64,
}

async fn count_rows(db: &DbConn, stmt: Statement) -> Result<u64, DbErr> {
    let row = CountRow::find_by_statement(stmt).one(db).await?;
    Ok(row.map_or(0, |r| u64::try_from(r.total).unwrap_or(0)))
}

/// Net score of everything written by `author`, whatever its status.
fn rating_sql(author: &str) -> String {
    format!(
        r#"(COALESCE((SELECT SUM(CASE WHEN pl."type" = 'like' THEN 1 ELSE -1 END)
             FROM post_likes pl JOIN posts rp ON rp.id = pl.post_id
             WHERE rp.user_id = {author}), 0)
          + COALESCE((SELECT SUM(CASE WHEN cl."type" = 'like' THEN 1 ELSE -1 END)
             FROM comment_likes cl JOIN comments rc ON rc.id = cl.comment_id
             WHERE rc.user_id = {author}), 0))::BIGINT"#
    )
}

fn post_row_sql() -> String {
    format!(
        r#"SELECT p.id, p.user_id, p.title, p.content, p.status, p.created_at, p.updated_at,
             u.login AS author_login, u.full_name AS author_name,
             (SELECT COUNT(*) FROM post_likes l WHERE l.post_id = p.id AND l."type" = 'like') AS likes_count,
             (SELECT COUNT(*) FROM post_likes l WHERE l.post_id = p.id AND l."type" = 'dislike') AS dislikes_count,
             (SELECT COUNT(*) FROM comments c WHERE c.post_id = p.id AND c.status = 'active') AS comments_count,
             {rating} AS author_rating
           FROM posts p JOIN users u ON u.id = p.user_id"#,
        rating = rating_sql("p.user_id")
    )
}

const COMMENT_ROW_SQL: &str = r#"SELECT c.id, c.post_id, c.user_id, c.content, c.status, c.created_at, c.updated_at,
       u.login AS author_login, u.full_name AS author_name,
       u.profile_picture AS author_profile_picture, p.title AS post_title,
       (SELECT COUNT(*) FROM comment_likes l WHERE l.comment_id = c.id AND l."type" = 'like') AS likes_count,
       (SELECT COUNT(*) FROM comment_likes l WHERE l.comment_id = c.id AND l."type" = 'dislike') AS dislikes_count
     FROM comments c
     JOIN users u ON u.id = c.user_id
     JOIN posts p ON p.id = c.post_id"#;

fn profile_sql() -> String {
    format!(
        "SELECT u.id, u.login, u.full_name, u.email, u.role, u.profile_picture,
             u.email_confirmed, u.created_at,
             {rating} AS rating,
             (SELECT COUNT(*) FROM posts p WHERE p.user_id = u.id AND p.status = 'active') AS posts_count,
             (SELECT COUNT(*) FROM comments c WHERE c.user_id = u.id AND c.status = 'active') AS comments_count
           FROM users u",
        rating = rating_sql("u.id")
    )
}

#[derive(Debug, FromQueryResult)]
struct PostRowModel {
    id: i32,
    user_id: i32,
    title: String,
    content: String,
    status: DbContentStatus,
    created_at: DateTimeWithTimeZone,
    updated_at: DateTimeWithTimeZone,
    author_login: String,
    author_name: String,
    likes_count: i64,
    dislikes_count: i64,
    comments_count: i64,
    author_rating: i64,
}

impl From<PostRowModel> for PostRow {
    fn from(m: PostRowModel) -> Self {
        Self {
            id: m.id,
            user_id: m.user_id,
            title: m.title,
            content: m.content,
            status: m.status.into(),
            created_at: m.created_at.into(),
            updated_at: m.updated_at.into(),
            author_login: m.author_login,
            author_name: m.author_name,
            likes_count: m.likes_count,
            dislikes_count: m.dislikes_count,
            comments_count: m.comments_count,
            author_rating: m.author_rating,
        }
    }
}

#[derive(Debug, FromQueryResult)]
struct CommentRowModel {
    id: i32,
    post_id: i32,
    user_id: i32,
    content: String,
    status: DbContentStatus,
    created_at: DateTimeWithTimeZone,
    updated_at: DateTimeWithTimeZone,
    author_login: String,
    author_name: String,
    author_profile_picture: Option<String>,
    post_title: String,
    likes_count: i64,
    dislikes_count: i64,
}

impl From<CommentRowModel> for CommentRow {
    fn from(m: CommentRowModel) -> Self {
        Self {
            id: m.id,
            post_id: m.post_id,
            user_id: m.user_id,
            content: m.content,
            status: m.status.into(),
            created_at: m.created_at.into(),
            updated_at: m.updated_at.into(),
            author_login: m.author_login,
            author_name: m.author_name,
            author_profile_picture: m.author_profile_picture,
            post_title: m.post_title,
            likes_count: m.likes_count,
            dislikes_count: m.dislikes_count,
        }
    }
}

#[derive(Debug, FromQueryResult)]
struct ProfileModel {
    id: i32,
    login: String,
    full_name: String,
    email: String,
    role: DbRole,
    profile_picture: Option<String>,
    email_confirmed: bool,
    created_at: DateTimeWithTimeZone,
    rating: i64,
    posts_count: i64,
    comments_count: i64,
}

impl From<ProfileModel> for UserProfile {
    fn from(m: ProfileModel) -> Self {
        Self {
            id: m.id,
            login: m.login,
            full_name: m.full_name,
            email: Some(m.email),
            role: m.role.into(),
            profile_picture: m.profile_picture,
            email_confirmed: Some(m.email_confirmed),
            created_at: m.created_at.into(),
            rating: m.rating,
            posts_count: m.posts_count,
            comments_count: m.comments_count,
        }
    }
}

/// A post row plus the time it was favorited.
#[derive(Debug)]
struct FavoriteRowModel {
    post: PostRowModel,
    favorited_at: DateTimeWithTimeZone,
}

impl FromQueryResult for FavoriteRowModel {
    fn from_query_result(res: &QueryResult, pre: &str) -> Result<Self, DbErr> {
        Ok(Self {
            post: PostRowModel::from_query_result(res, pre)?,
            favorited_at: res.try_get(pre, "favorited_at")?,
        })
    }
}

#[derive(Debug, FromQueryResult)]
struct VoteModel {
    id: i32,
    user_id: i32,
    kind: DbVoteKind,
    created_at: DateTimeWithTimeZone,
}

impl From<VoteModel> for Vote {
    fn from(m: VoteModel) -> Self {
        Self {
            id: m.id,
            user_id: m.user_id,
            kind: m.kind.into(),
            created_at: m.created_at.into(),
        }
    }
}

#[derive(Debug, FromQueryResult)]
struct VoteRowModel {
    id: i32,
    user_id: i32,
    kind: DbVoteKind,
    created_at: DateTimeWithTimeZone,
    author_login: String,
}

// ============================================================================
// Users
// ============================================================================

#[async_trait]
impl UserRepository for PostgresUserRepository {
    async fn find_by_login(&self, login: &str) -> Result<Option<User>, RepoError> {
        let result = user::Entity::find()
            .filter(user::Column::Login.eq(login))
            .one(self.db.as_ref())
            .await
            .map_err(map_db_err)?;
        Ok(result.map(Into::into))
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, RepoError> {
        tracing::debug!(
            user_email = %usof_core::services::mask_email(email),
            "Finding user by email"
        );
        let result = user::Entity::find()
            .filter(user::Column::Email.eq(email))
            .one(self.db.as_ref())
            .await
            .map_err(map_db_err)?;
        Ok(result.map(Into::into))
    }

    async fn find_by_email_token(&self, token: &str) -> Result<Option<User>, RepoError> {
        let result = user::Entity::find()
            .filter(user::Column::EmailToken.eq(token))
            .one(self.db.as_ref())
            .await
            .map_err(map_db_err)?;
        Ok(result.map(Into::into))
    }

    async fn find_by_reset_token(&self, token: &str) -> Result<Option<User>, RepoError> {
        let result = user::Entity::find()
            .filter(user::Column::ResetToken.eq(token))
            .one(self.db.as_ref())
            .await
            .map_err(map_db_err)?;
        Ok(result.map(Into::into))
    }

    async fn insert(&self, new: NewUser) -> Result<User, RepoError> {
        let model = user::ActiveModel::from(new)
            .insert(self.db.as_ref())
            .await
            .map_err(map_db_err)?;
        Ok(model.into())
    }

    async fn update(&self, account: &User) -> Result<User, RepoError> {
        let model = user::ActiveModel::from(account)
            .update(self.db.as_ref())
            .await
            .map_err(map_db_err)?;
        Ok(model.into())
    }

    async fn profile(&self, id: i32) -> Result<Option<UserProfile>, RepoError> {
        let mut params = Params::default();
        let sql = format!("{} WHERE u.id = {}", profile_sql(), params.bind(id));
        let row = ProfileModel::find_by_statement(params.statement(sql))
            .one(self.db.as_ref())
            .await
            .map_err(map_db_err)?;
        Ok(row.map(Into::into))
    }

    async fn list_profiles(&self) -> Result<Vec<UserProfile>, RepoError> {
        let sql = format!("{} ORDER BY u.created_at DESC, u.id DESC", profile_sql());
        let rows = ProfileModel::find_by_statement(Params::default().statement(sql))
            .all(self.db.as_ref())
            .await
            .map_err(map_db_err)?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn count(&self) -> Result<u64, RepoError> {
        user::Entity::find().count(self.db.as_ref()).await.map_err(map_db_err)
    }
}

// ============================================================================
// Posts
// ============================================================================

async fn link_categories<C>(conn: &C, post_id: i32, ids: &[i32]) -> Result<(), RepoError>
where
    C: ConnectionTrait,
{
    if ids.is_empty() {
        return Ok(());
    }
    let links = ids.iter().map(|&category_id| post_category::ActiveModel {
        post_id: Set(post_id),
        category_id: Set(category_id),
    });
    post_category::Entity::insert_many(links)
        .exec_without_returning(conn)
        .await
        .map_err(map_db_err)?;
    Ok(())
}

/// WHERE clause shared by the row query and its count. Columns are
/// addressed through the alias `r`, which both queries bind.
fn post_filter(query: &PostQuery, params: &mut Params) -> String {
    let mut clauses = Vec::new();
    match query.visibility {
        PostVisibility::All => {}
        PostVisibility::VisibleTo(uid) => clauses.push(format!(
            "(r.status <> 'inactive' OR r.user_id = {})",
            params.bind(uid)
        )),
        PostVisibility::Public => clauses.push("r.status <> 'inactive'".to_string()),
    }
    if !query.categories.is_empty() {
        let ids: Vec<String> = query.categories.iter().map(|id| params.bind(*id)).collect();
        clauses.push(format!(
            "EXISTS (SELECT 1 FROM post_categories pc WHERE pc.post_id = r.id AND pc.category_id IN ({}))",
            ids.join(", ")
        ));
    }
    if let Some(from) = query.date_from {
        clauses.push(format!("r.created_at >= {}", params.bind(from)));
    }
    if let Some(to) = query.date_to {
        clauses.push(format!("r.created_at <= {}", params.bind(to)));
    }
    if clauses.is_empty() {
        String::new()
    } else {
        format!(" WHERE {}", clauses.join(" AND "))
    }
}

#[async_trait]
impl PostRepository for PostgresPostRepository {
    async fn insert(&self, new: NewPost) -> Result<Post, RepoError> {
        let txn = self.db.begin().await.map_err(map_db_err)?;
        let now = Utc::now();
        let model = post::ActiveModel {
            user_id: Set(new.user_id),
            title: Set(new.title),
            content: Set(new.content),
            status: Set(DbContentStatus::Active),
            created_at: Set(now.into()),
            updated_at: Set(now.into()),
            ..Default::default()
        }
        .insert(&txn)
        .await
        .map_err(map_db_err)?;
        link_categories(&txn, model.id, &new.category_ids).await?;
        txn.commit().await.map_err(map_db_err)?;
        Ok(model.into())
    }

    async fn update(&self, changed: &Post, categories: Option<&[i32]>) -> Result<Post, RepoError> {
        let txn = self.db.begin().await.map_err(map_db_err)?;
        let model = post::ActiveModel::from(changed)
            .update(&txn)
            .await
            .map_err(map_db_err)?;
        if let Some(ids) = categories {
            post_category::Entity::delete_many()
                .filter(post_category::Column::PostId.eq(changed.id))
                .exec(&txn)
                .await
                .map_err(map_db_err)?;
            link_categories(&txn, changed.id, ids).await?;
        }
        txn.commit().await.map_err(map_db_err)?;
        Ok(model.into())
    }

    async fn row(&self, id: i32) -> Result<Option<PostRow>, RepoError> {
        let mut params = Params::default();
        let sql = format!("{} WHERE p.id = {}", post_row_sql(), params.bind(id));
        let row = PostRowModel::find_by_statement(params.statement(sql))
            .one(self.db.as_ref())
            .await
            .map_err(map_db_err)?;
        Ok(row.map(Into::into))
    }

    async fn list(&self, query: &PostQuery) -> Result<Page<PostRow>, RepoError> {
        let mut params = Params::default();
        let filter = post_filter(query, &mut params);
        let count = params
            .clone()
            .statement(format!("SELECT COUNT(*) AS total FROM posts r{filter}"));

        let order_by = match query.sort {
            PostSort::Likes => "(r.likes_count - r.dislikes_count)",
            PostSort::Date => "r.created_at",
        };
        let page = params.bind_page(query.page);
        let sql = format!(
            "SELECT * FROM ({base}) r{filter} ORDER BY {order_by} {dir}, r.id ASC{page}",
            base = post_row_sql(),
            dir = query.order.as_sql(),
        );
        let rows = PostRowModel::find_by_statement(params.statement(sql)).all(self.db.as_ref());

        let (total, rows) =
            futures::try_join!(count_rows(self.db.as_ref(), count), rows).map_err(map_db_err)?;
        Ok(Page::new(
            rows.into_iter().map(Into::into).collect(),
            query.page,
            total,
        ))
    }

    async fn categories(&self, post_id: i32) -> Result<Vec<Category>, RepoError> {
        let stmt = Statement::from_sql_and_values(
            DbBackend::Postgres,
            "SELECT c.* FROM categories c
               JOIN post_categories pc ON pc.category_id = c.id
              WHERE pc.post_id = $1
              ORDER BY c.title",
            [post_id.into()],
        );
        let rows = category::Entity::find()
            .from_raw_sql(stmt)
            .all(self.db.as_ref())
            .await
            .map_err(map_db_err)?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn count_active(&self) -> Result<u64, RepoError> {
        post::Entity::find()
            .filter(post::Column::Status.eq(DbContentStatus::Active))
            .count(self.db.as_ref())
            .await
            .map_err(map_db_err)
    }
}

// ============================================================================
// Comments
// ============================================================================

#[async_trait]
impl CommentRepository for PostgresCommentRepository {
    async fn insert(&self, new: NewComment) -> Result<Comment, RepoError> {
        let now = Utc::now();
        let model = comment::ActiveModel {
            post_id: Set(new.post_id),
            user_id: Set(new.user_id),
            content: Set(new.content),
            status: Set(DbContentStatus::Active),
            created_at: Set(now.into()),
            updated_at: Set(now.into()),
            ..Default::default()
        }
        .insert(self.db.as_ref())
        .await
        .map_err(map_db_err)?;
        Ok(model.into())
    }

    async fn update(&self, changed: &Comment) -> Result<Comment, RepoError> {
        let model = comment::ActiveModel::from(changed)
            .update(self.db.as_ref())
            .await
            .map_err(map_db_err)?;
        Ok(model.into())
    }

    async fn row(&self, id: i32) -> Result<Option<CommentRow>, RepoError> {
        let mut params = Params::default();
        let sql = format!("{COMMENT_ROW_SQL} WHERE c.id = {}", params.bind(id));
        let row = CommentRowModel::find_by_statement(params.statement(sql))
            .one(self.db.as_ref())
            .await
            .map_err(map_db_err)?;
        Ok(row.map(Into::into))
    }

    async fn list_for_post(
        &self,
        post_id: i32,
        visibility: CommentVisibility,
    ) -> Result<Vec<CommentRow>, RepoError> {
        let mut params = Params::default();
        let mut sql = format!("{COMMENT_ROW_SQL} WHERE c.post_id = {}", params.bind(post_id));
        match visibility {
            CommentVisibility::All => {}
            CommentVisibility::VisibleTo(uid) => sql.push_str(&format!(
                " AND (c.status <> 'inactive' OR c.user_id = {})",
                params.bind(uid)
            )),
            CommentVisibility::Public => sql.push_str(" AND c.status <> 'inactive'"),
        }
        sql.push_str(" ORDER BY c.created_at DESC, c.id ASC");
        let rows = CommentRowModel::find_by_statement(params.statement(sql))
            .all(self.db.as_ref())
            .await
            .map_err(map_db_err)?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn list_all(&self, page: PageRequest) -> Result<Page<CommentRow>, RepoError> {
        let mut params = Params::default();
        let sql = format!(
            "{COMMENT_ROW_SQL} ORDER BY c.created_at DESC, c.id ASC{}",
            params.bind_page(page)
        );
        let total = comment::Entity::find().count(self.db.as_ref());
        let rows = CommentRowModel::find_by_statement(params.statement(sql)).all(self.db.as_ref());
        let (total, rows) = futures::try_join!(total, rows).map_err(map_db_err)?;
        Ok(Page::new(rows.into_iter().map(Into::into).collect(), page, total))
    }
}

// ============================================================================
// Categories
// ============================================================================

#[async_trait]
impl CategoryRepository for PostgresCategoryRepository {
    async fn insert(&self, new: NewCategory) -> Result<Category, RepoError> {
        let model = category::ActiveModel {
            title: Set(new.title),
            description: Set(new.description),
            created_at: Set(Utc::now().into()),
            ..Default::default()
        }
        .insert(self.db.as_ref())
        .await
        .map_err(map_db_err)?;
        Ok(model.into())
    }

    async fn update(&self, changed: &Category) -> Result<Category, RepoError> {
        let model = category::ActiveModel::from(changed)
            .update(self.db.as_ref())
            .await
            .map_err(map_db_err)?;
        Ok(model.into())
    }

    async fn list(&self, page: PageRequest) -> Result<Page<Category>, RepoError> {
        let total = category::Entity::find().count(self.db.as_ref());
        let rows = category::Entity::find()
            .order_by_asc(category::Column::Title)
            .offset(page.offset())
            .limit(page.limit)
            .all(self.db.as_ref());
        let (total, rows) = futures::try_join!(total, rows).map_err(map_db_err)?;
        Ok(Page::new(rows.into_iter().map(Into::into).collect(), page, total))
    }

    async fn count(&self) -> Result<u64, RepoError> {
        category::Entity::find()
            .count(self.db.as_ref())
            .await
            .map_err(map_db_err)
    }
}

// ============================================================================
// Votes
// ============================================================================

/// (table, target column) holding votes for `target`.
fn vote_table(target: VoteTarget) -> (&'static str, &'static str) {
    match target {
        VoteTarget::Post(_) => ("post_likes", "post_id"),
        VoteTarget::Comment(_) => ("comment_likes", "comment_id"),
    }
}

#[async_trait]
impl VoteRepository for PostgresVoteRepository {
    async fn find(&self, target: VoteTarget, user_id: i32) -> Result<Option<Vote>, RepoError> {
        let (table, column) = vote_table(target);
        let mut params = Params::default();
        let sql = format!(
            r#"SELECT id, user_id, "type" AS kind, created_at FROM {table}
               WHERE {column} = {} AND user_id = {}"#,
            params.bind(target.id()),
            params.bind(user_id),
        );
        let row = VoteModel::find_by_statement(params.statement(sql))
            .one(self.db.as_ref())
            .await
            .map_err(map_db_err)?;
        Ok(row.map(Into::into))
    }

    async fn insert(
        &self,
        target: VoteTarget,
        user_id: i32,
        kind: VoteKind,
    ) -> Result<Vote, RepoError> {
        let (table, column) = vote_table(target);
        let mut params = Params::default();
        let sql = format!(
            r#"INSERT INTO {table} ({column}, user_id, "type", created_at)
               VALUES ({}, {}, {}, {})
               RETURNING id, user_id, "type" AS kind, created_at"#,
            params.bind(target.id()),
            params.bind(user_id),
            params.bind(kind.as_str()),
            params.bind(Utc::now()),
        );
        VoteModel::find_by_statement(params.statement(sql))
            .one(self.db.as_ref())
            .await
            .map_err(map_db_err)?
            .map(Into::into)
            .ok_or_else(|| RepoError::Query(format!("insert into {table} returned no row")))
    }

    async fn set_kind(
        &self,
        target: VoteTarget,
        user_id: i32,
        kind: VoteKind,
    ) -> Result<(), RepoError> {
        let (table, column) = vote_table(target);
        let mut params = Params::default();
        let sql = format!(
            r#"UPDATE {table} SET "type" = {} WHERE {column} = {} AND user_id = {}"#,
            params.bind(kind.as_str()),
            params.bind(target.id()),
            params.bind(user_id),
        );
        let result = self
            .db
            .execute(params.statement(sql))
            .await
            .map_err(map_db_err)?;
        if result.rows_affected() == 0 {
            return Err(RepoError::NotFound);
        }
        Ok(())
    }

    async fn remove(&self, target: VoteTarget, user_id: i32) -> Result<bool, RepoError> {
        let (table, column) = vote_table(target);
        let mut params = Params::default();
        let sql = format!(
            "DELETE FROM {table} WHERE {column} = {} AND user_id = {}",
            params.bind(target.id()),
            params.bind(user_id),
        );
        let result = self
            .db
            .execute(params.statement(sql))
            .await
            .map_err(map_db_err)?;
        Ok(result.rows_affected() > 0)
    }

    async fn list(&self, target: VoteTarget) -> Result<Vec<VoteRow>, RepoError> {
        let (table, column) = vote_table(target);
        let mut params = Params::default();
        let sql = format!(
            r#"SELECT v.id, v.user_id, v."type" AS kind, v.created_at, u.login AS author_login
                 FROM {table} v JOIN users u ON u.id = v.user_id
                WHERE v.{column} = {}
                ORDER BY v.created_at DESC, v.id DESC"#,
            params.bind(target.id()),
        );
        let rows = VoteRowModel::find_by_statement(params.statement(sql))
            .all(self.db.as_ref())
            .await
            .map_err(map_db_err)?;
        Ok(rows
            .into_iter()
            .map(|m| VoteRow {
                id: m.id,
                user_id: m.user_id,
                kind: m.kind.into(),
                created_at: m.created_at.into(),
                author_login: m.author_login,
            })
            .collect())
    }
}

// ============================================================================
// Favorites
// ============================================================================

#[async_trait]
impl FavoriteRepository for PostgresFavoriteRepository {
    async fn add(&self, user_id: i32, post_id: i32) -> Result<(), RepoError> {
        favorite::ActiveModel {
            user_id: Set(user_id),
            post_id: Set(post_id),
            created_at: Set(Utc::now().into()),
            ..Default::default()
        }
        .insert(self.db.as_ref())
        .await
        .map_err(map_db_err)?;
        Ok(())
    }

    async fn remove(&self, user_id: i32, post_id: i32) -> Result<bool, RepoError> {
        let result = favorite::Entity::delete_many()
            .filter(favorite::Column::UserId.eq(user_id))
            .filter(favorite::Column::PostId.eq(post_id))
            .exec(self.db.as_ref())
            .await
            .map_err(map_db_err)?;
        Ok(result.rows_affected > 0)
    }

    async fn contains(&self, user_id: i32, post_id: i32) -> Result<bool, RepoError> {
        let count = favorite::Entity::find()
            .filter(favorite::Column::UserId.eq(user_id))
            .filter(favorite::Column::PostId.eq(post_id))
            .count(self.db.as_ref())
            .await
            .map_err(map_db_err)?;
        Ok(count > 0)
    }

    async fn list(&self, user_id: i32, page: PageRequest) -> Result<Page<FavoriteRow>, RepoError> {
        let mut params = Params::default();
        let owner = params.bind(user_id);
        let count = params.clone().statement(format!(
            "SELECT COUNT(*) AS total FROM user_favorites f
               JOIN posts p ON p.id = f.post_id
              WHERE f.user_id = {owner} AND p.status = 'active'"
        ));
        let sql = format!(
            "SELECT r.*, f.created_at AS favorited_at
               FROM user_favorites f JOIN ({base}) r ON r.id = f.post_id
              WHERE f.user_id = {owner} AND r.status = 'active'
              ORDER BY f.created_at DESC, f.id DESC{page}",
            base = post_row_sql(),
            page = params.bind_page(page),
        );
        let rows = FavoriteRowModel::find_by_statement(params.statement(sql)).all(self.db.as_ref());

        let (total, rows) =
            futures::try_join!(count_rows(self.db.as_ref(), count), rows).map_err(map_db_err)?;
        Ok(Page::new(
            rows.into_iter()
                .map(|m| FavoriteRow {
                    post: m.post.into(),
                    favorited_at: m.favorited_at.into(),
                })
                .collect(),
            page,
            total,
        ))
    }
}
