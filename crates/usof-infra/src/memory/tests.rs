use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};

use async_trait::async_trait;
use chrono::{Duration, Utc};

use usof_core::domain::{
    Category, CommentPatch, NewCategory, PostPatch, Role, User, Vote, VoteAction, VoteKind,
    VoteTarget,
};
use usof_core::error::{DomainError, RepoError};
use usof_core::lifecycle::ContentStatus;
use usof_core::ports::{
    AuthError, BaseRepository, PasswordService, TokenGenerator, UserRepository, VoteRepository,
};
use usof_core::query::{PageRequest, PostListParams};
use usof_core::services::{
    CreatePostInput, Credentials, EmailConfirmation, Links, LoginInput, PASSWORD_RESET_NOTICE,
    PasswordResetInput, RegisterInput, Services, VoteService,
};
use usof_core::viewer::Viewer;
use usof_core::views::VoteRow;

use super::InMemoryStore;
use crate::mail::OutboxMailer;

/// Reversible "hash" so tests don't pay for argon2.
struct PlainPasswords;

impl PasswordService for PlainPasswords {
    fn hash(&self, password: &str) -> Result<String, AuthError> {
        Ok(format!("plain:{password}"))
    }

    fn verify(&self, password: &str, hash: &str) -> Result<bool, AuthError> {
        Ok(hash == format!("plain:{password}"))
    }
}

#[derive(Default)]
struct CountingTokens(AtomicU32);

impl TokenGenerator for CountingTokens {
    fn generate(&self) -> String {
        format!("token-{}", self.0.fetch_add(1, Ordering::SeqCst))
    }
}

struct Harness {
    store: Arc<InMemoryStore>,
    outbox: Arc<OutboxMailer>,
    services: Services,
}

fn harness_with(mailer: OutboxMailer) -> Harness {
    let store = Arc::new(InMemoryStore::new());
    let outbox = Arc::new(mailer);
    let credentials = Credentials {
        passwords: Arc::new(PlainPasswords),
        tokens: Arc::new(CountingTokens::default()),
        mailer: outbox.clone(),
        links: Links::new("http://forum.test"),
    };
    let services = Services::new(store.clone().repositories(), credentials);
    Harness {
        store,
        outbox,
        services,
    }
}

fn harness() -> Harness {
    harness_with(OutboxMailer::new())
}

impl Harness {
    /// Register and confirm an account, returning it as a viewer.
    async fn member(&self, login: &str) -> Viewer {
        let user = self
            .services
            .identity
            .register(RegisterInput {
                login: login.to_string(),
                email: format!("{login}@x"),
                password: "pw1234".to_string(),
                password_confirmation: "pw1234".to_string(),
                full_name: None,
            })
            .await
            .unwrap();
        let token = user.email_token.clone().unwrap();
        self.services.identity.confirm_email(&token).await.unwrap();
        Viewer::member(user.id, Role::User)
    }

    async fn admin(&self, login: &str) -> Viewer {
        let viewer = self.member(login).await;
        let id = viewer.id().unwrap();
        let mut user = UserRepository::find_by_login(self.store.as_ref(), login)
            .await
            .unwrap()
            .unwrap();
        user.role = Role::Admin;
        UserRepository::update(self.store.as_ref(), &user).await.unwrap();
        Viewer::member(id, Role::Admin)
    }

    async fn category(&self, admin: &Viewer, title: &str) -> i32 {
        self.services
            .categories
            .create(
                admin,
                NewCategory {
                    title: title.to_string(),
                    description: None,
                },
            )
            .await
            .unwrap()
            .id
    }

    async fn post(&self, author: &Viewer, title: &str, categories: Vec<i32>) -> i32 {
        self.services
            .posts
            .create(
                author,
                CreatePostInput {
                    title: title.to_string(),
                    content: "body".to_string(),
                    categories,
                },
            )
            .await
            .unwrap()
            .id
    }

    async fn set_post_status(&self, viewer: &Viewer, id: i32, status: ContentStatus) {
        self.services
            .posts
            .update(
                viewer,
                id,
                PostPatch {
                    status: Some(status),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
    }
}

#[tokio::test]
async fn test_register_confirm_login() {
    let h = harness();
    let user = h
        .services
        .identity
        .register(RegisterInput {
            login: "alice".into(),
            email: "alice@x".into(),
            password: "pw1234".into(),
            password_confirmation: "pw1234".into(),
            full_name: None,
        })
        .await
        .unwrap();
    assert_eq!(user.full_name, "alice");
    assert_eq!(user.role, Role::User);
    assert!(!user.email_confirmed);

    let mail = h.outbox.last_to("alice@x").unwrap();
    let token = user.email_token.clone().unwrap();
    assert!(mail.html.contains(&format!("/api/auth/confirm-email/{token}")));

    let login = LoginInput {
        login: Some("alice".into()),
        email: None,
        password: "pw1234".into(),
    };
    let err = h.services.identity.login(login.clone()).await.unwrap_err();
    assert!(matches!(err, DomainError::Unauthenticated(_)));

    assert_eq!(
        h.services.identity.confirm_email(&token).await.unwrap(),
        EmailConfirmation::Confirmed
    );
    let confirmed = BaseRepository::<User, i32>::find_by_id(h.store.as_ref(), user.id)
        .await
        .unwrap()
        .unwrap();
    assert!(confirmed.email_confirmed);
    assert!(confirmed.email_token.is_none());

    let reused = h.services.identity.confirm_email(&token).await.unwrap_err();
    assert!(
        matches!(reused, DomainError::Validation(m) if m == "Invalid or expired confirmation token")
    );

    let logged_in = h.services.identity.login(login).await.unwrap();
    assert_eq!(logged_in.id, user.id);

    let by_email = h
        .services
        .identity
        .login(LoginInput {
            login: None,
            email: Some("alice@x".into()),
            password: "wrong1".into(),
        })
        .await
        .unwrap_err();
    assert!(matches!(by_email, DomainError::Unauthenticated(m) if m == "Invalid credentials"));
}

#[tokio::test]
async fn test_registration_validation_and_conflicts() {
    let h = harness();
    h.member("alice").await;

    let mut input = RegisterInput {
        login: "alice".into(),
        email: "other@x".into(),
        password: "pw1234".into(),
        password_confirmation: "pw1234".into(),
        full_name: None,
    };
    let err = h.services.identity.register(input.clone()).await.unwrap_err();
    assert!(matches!(err, DomainError::Conflict(m) if m == "Login already exists"));

    input.login = "alice2".into();
    input.email = "alice@x".into();
    let err = h.services.identity.register(input.clone()).await.unwrap_err();
    assert!(matches!(err, DomainError::Conflict(m) if m == "Email already registered"));

    input.email = "new@x".into();
    input.password_confirmation = "pw12345".into();
    let err = h.services.identity.register(input.clone()).await.unwrap_err();
    assert!(matches!(err, DomainError::Validation(m) if m == "Passwords do not match"));

    input.password = "pw1".into();
    input.password_confirmation = "pw1".into();
    assert!(matches!(
        h.services.identity.register(input).await.unwrap_err(),
        DomainError::Validation(_)
    ));
}

#[tokio::test]
async fn test_mail_failure_does_not_fail_registration() {
    let h = harness_with(OutboxMailer::failing());
    let user = h
        .services
        .identity
        .register(RegisterInput {
            login: "bob".into(),
            email: "bob@x".into(),
            password: "pw1234".into(),
            password_confirmation: "pw1234".into(),
            full_name: Some("Bob".into()),
        })
        .await
        .unwrap();
    assert_eq!(user.full_name, "Bob");
    assert!(h.outbox.sent().is_empty());
}

#[tokio::test]
async fn test_password_reset_flow() {
    let h = harness();
    h.member("alice").await;

    h.services
        .identity
        .request_password_reset("nobody@x")
        .await
        .unwrap();
    assert!(h.outbox.last_to("nobody@x").is_none());

    h.services
        .identity
        .request_password_reset("alice@x")
        .await
        .unwrap();
    let user = UserRepository::find_by_email(h.store.as_ref(), "alice@x")
        .await
        .unwrap()
        .unwrap();
    let token = user.reset_token.clone().unwrap();
    assert!(user.reset_token_expires.unwrap() > Utc::now() + Duration::minutes(59));
    assert!(!PASSWORD_RESET_NOTICE.is_empty());

    let err = h
        .services
        .identity
        .confirm_password_reset(PasswordResetInput {
            token: "bogus".into(),
            password: "newpw1".into(),
            password_confirmation: "newpw1".into(),
        })
        .await
        .unwrap_err();
    assert!(matches!(err, DomainError::Validation(_)));

    h.services
        .identity
        .confirm_password_reset(PasswordResetInput {
            token: token.clone(),
            password: "newpw1".into(),
            password_confirmation: "newpw1".into(),
        })
        .await
        .unwrap();

    let user = UserRepository::find_by_email(h.store.as_ref(), "alice@x")
        .await
        .unwrap()
        .unwrap();
    assert!(user.reset_token.is_none());
    assert!(user.reset_token_expires.is_none());
    h.services
        .identity
        .login(LoginInput {
            login: Some("alice".into()),
            email: None,
            password: "newpw1".into(),
        })
        .await
        .unwrap();
}

#[tokio::test]
async fn test_expired_reset_token_is_rejected() {
    let h = harness();
    h.member("alice").await;
    h.services
        .identity
        .request_password_reset("alice@x")
        .await
        .unwrap();

    let mut user = UserRepository::find_by_email(h.store.as_ref(), "alice@x")
        .await
        .unwrap()
        .unwrap();
    user.reset_token_expires = Some(Utc::now() - Duration::seconds(1));
    UserRepository::update(h.store.as_ref(), &user).await.unwrap();

    let err = h
        .services
        .identity
        .confirm_password_reset(PasswordResetInput {
            token: user.reset_token.clone().unwrap(),
            password: "newpw1".into(),
            password_confirmation: "newpw1".into(),
        })
        .await
        .unwrap_err();
    assert!(matches!(err, DomainError::Validation(m) if m.contains("expired")));
}

#[tokio::test]
async fn test_vote_toggle_and_flip() {
    let h = harness();
    let alice = h.member("alice").await;
    let bob = h.member("bob").await;
    let post = h.post(&alice, "Q1", vec![]).await;
    let target = VoteTarget::Post(post);
    let votes = &h.services.votes;

    assert_eq!(votes.vote_on(&bob, target, VoteKind::Like).await.unwrap(), VoteAction::Created);
    assert_eq!(h.services.posts.detail(&bob, post).await.unwrap().post.likes_count, 1);
    assert_eq!(votes.vote_on(&bob, target, VoteKind::Like).await.unwrap(), VoteAction::Removed);
    assert_eq!(votes.vote_on(&bob, target, VoteKind::Dislike).await.unwrap(), VoteAction::Created);
    assert_eq!(votes.vote_on(&bob, target, VoteKind::Like).await.unwrap(), VoteAction::Updated);
    assert_eq!(votes.vote_on(&bob, target, VoteKind::Dislike).await.unwrap(), VoteAction::Updated);

    let rows = votes.list(&Viewer::Anonymous, target).await.unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].kind, VoteKind::Dislike);
    assert_eq!(rows[0].author_login, "bob");

    let detail = h.services.posts.detail(&bob, post).await.unwrap();
    assert_eq!(detail.post.net_score(), -1);
    assert_eq!(detail.post.author_rating, -1);

    votes.unvote(&bob, target).await.unwrap();
    let err = votes.unvote(&bob, target).await.unwrap_err();
    assert!(matches!(err, DomainError::NotFound(_)));
    let err = votes
        .vote_on(&Viewer::Anonymous, target, VoteKind::Like)
        .await
        .unwrap_err();
    assert!(matches!(err, DomainError::Unauthenticated(_)));
}

#[tokio::test]
async fn test_locked_post_refuses_votes_and_comments_until_unlocked() {
    let h = harness();
    let alice = h.member("alice").await;
    let bob = h.member("bob").await;
    let post = h.post(&alice, "Q1", vec![]).await;
    h.set_post_status(&alice, post, ContentStatus::Locked).await;

    let err = h
        .services
        .votes
        .vote_on(&bob, VoteTarget::Post(post), VoteKind::Like)
        .await
        .unwrap_err();
    assert!(matches!(err, DomainError::Forbidden(m) if m.contains("locked")));
    let err = h
        .services
        .posts
        .add_comment(&bob, post, "hi".into())
        .await
        .unwrap_err();
    assert!(matches!(err, DomainError::Forbidden(m) if m.contains("locked")));

    // Locked content stays readable.
    h.services.posts.detail(&Viewer::Anonymous, post).await.unwrap();

    let edit = PostPatch {
        content: Some("edited".into()),
        ..Default::default()
    };
    assert!(matches!(
        h.services.posts.update(&alice, post, edit).await.unwrap_err(),
        DomainError::Forbidden(_)
    ));

    h.set_post_status(&alice, post, ContentStatus::Active).await;
    h.services
        .posts
        .add_comment(&bob, post, "hi".into())
        .await
        .unwrap();
}

#[tokio::test]
async fn test_inactive_post_is_masked_everywhere_for_outsiders() {
    let h = harness();
    let alice = h.member("alice").await;
    let bob = h.member("bob").await;
    let carol = h.admin("carol").await;
    let post = h.post(&alice, "Q1", vec![]).await;
    h.set_post_status(&alice, post, ContentStatus::Inactive).await;

    for viewer in [Viewer::Anonymous, bob] {
        let posts = &h.services.posts;
        assert!(matches!(posts.detail(&viewer, post).await, Err(DomainError::NotFound(_))));
        assert!(matches!(posts.comments(&viewer, post).await, Err(DomainError::NotFound(_))));
        assert!(matches!(
            h.services.votes.list(&viewer, VoteTarget::Post(post)).await,
            Err(DomainError::NotFound(_))
        ));
    }
    assert!(matches!(
        h.services
            .votes
            .vote_on(&bob, VoteTarget::Post(post), VoteKind::Like)
            .await,
        Err(DomainError::NotFound(_))
    ));
    assert!(matches!(
        h.services.posts.add_comment(&bob, post, "x".into()).await,
        Err(DomainError::NotFound(_))
    ));

    let own = h.services.posts.detail(&alice, post).await.unwrap();
    assert_eq!(own.post.status, ContentStatus::Inactive);

    let public = PostListParams::default();
    let admin_view = PostListParams {
        status: Some("admin_view".into()),
        ..Default::default()
    };
    let anon_list = h.services.posts.list(&Viewer::Anonymous, &public).await.unwrap();
    assert_eq!(anon_list.pagination.total_items, 0);
    let bob_admin_view = h.services.posts.list(&bob, &admin_view).await.unwrap();
    assert_eq!(bob_admin_view.pagination.total_items, 0);
    let alice_list = h.services.posts.list(&alice, &public).await.unwrap();
    assert_eq!(alice_list.items.len(), 1);
    let carol_list = h.services.posts.list(&carol, &admin_view).await.unwrap();
    assert_eq!(carol_list.items[0].id, post);
}

#[tokio::test]
async fn test_comment_visibility_and_counts() {
    let h = harness();
    let alice = h.member("alice").await;
    let bob = h.member("bob").await;
    let carol = h.admin("carol").await;
    let post = h.post(&alice, "Q1", vec![]).await;

    let visible = h.services.posts.add_comment(&bob, post, "one".into()).await.unwrap();
    let hidden = h.services.posts.add_comment(&bob, post, "two".into()).await.unwrap();
    let locked = h.services.posts.add_comment(&alice, post, "three".into()).await.unwrap();

    let comments = &h.services.comments;
    comments
        .update(
            &bob,
            hidden.id,
            CommentPatch {
                content: None,
                status: Some(ContentStatus::Inactive),
            },
        )
        .await
        .unwrap();
    comments
        .update(
            &carol,
            locked.id,
            CommentPatch {
                content: None,
                status: Some(ContentStatus::Locked),
            },
        )
        .await
        .unwrap();

    let ids = |rows: Vec<usof_core::views::CommentRow>| {
        let mut ids: Vec<i32> = rows.into_iter().map(|r| r.id).collect();
        ids.sort();
        ids
    };
    let anon = h.services.posts.comments(&Viewer::Anonymous, post).await.unwrap();
    assert_eq!(ids(anon), vec![visible.id, locked.id]);
    let own = h.services.posts.comments(&bob, post).await.unwrap();
    assert_eq!(ids(own), vec![visible.id, hidden.id, locked.id]);
    let admin = h.services.posts.comments(&carol, post).await.unwrap();
    assert_eq!(admin.len(), 3);

    assert!(matches!(
        comments.detail(&alice, hidden.id).await,
        Err(DomainError::NotFound(_))
    ));

    let detail = h.services.posts.detail(&Viewer::Anonymous, post).await.unwrap();
    assert_eq!(detail.post.comments_count, 1);

    // Admins may not rewrite somebody else's words.
    let err = comments
        .update(
            &carol,
            visible.id,
            CommentPatch {
                content: Some("rewritten".into()),
                status: None,
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, DomainError::Forbidden(_)));

    let feed = comments.list_all(&carol, PageRequest::default()).await.unwrap();
    assert_eq!(feed.pagination.total_items, 3);
    assert_eq!(feed.items[0].post_title, "Q1");
    assert!(matches!(
        comments.list_all(&bob, PageRequest::default()).await,
        Err(DomainError::Forbidden(_))
    ));
}

#[tokio::test]
async fn test_author_rating_matches_between_list_and_detail() {
    let h = harness();
    let alice = h.member("alice").await;
    let bob = h.member("bob").await;
    let first = h.post(&alice, "first", vec![]).await;
    let second = h.post(&alice, "second", vec![]).await;
    let comment = h.services.posts.add_comment(&alice, first, "c".into()).await.unwrap();

    let votes = &h.services.votes;
    votes.vote_on(&bob, VoteTarget::Post(first), VoteKind::Like).await.unwrap();
    votes.vote_on(&bob, VoteTarget::Post(second), VoteKind::Like).await.unwrap();
    votes
        .vote_on(&bob, VoteTarget::Comment(comment.id), VoteKind::Dislike)
        .await
        .unwrap();
    h.set_post_status(&alice, second, ContentStatus::Inactive).await;

    let list = h
        .services
        .posts
        .list(&Viewer::Anonymous, &PostListParams::default())
        .await
        .unwrap();
    let detail = h.services.posts.detail(&Viewer::Anonymous, first).await.unwrap();
    assert_eq!(list.items.len(), 1);
    assert_eq!(list.items[0].author_rating, 1);
    assert_eq!(detail.post.author_rating, list.items[0].author_rating);

    let profile = h
        .services
        .users
        .profile(&Viewer::Anonymous, alice.id().unwrap())
        .await
        .unwrap();
    assert_eq!(profile.rating, 1);
    assert_eq!(profile.posts_count, 1);
    assert!(profile.email.is_none());
}

#[tokio::test]
async fn test_listing_filters_sorting_and_pagination() {
    let h = harness();
    let carol = h.admin("carol").await;
    let alice = h.member("alice").await;
    let bob = h.member("bob").await;
    let rust = h.category(&carol, "rust").await;
    let go = h.category(&carol, "go").await;
    let web = h.category(&carol, "web").await;

    let a = h.post(&alice, "a", vec![rust]).await;
    let b = h.post(&alice, "b", vec![go, web]).await;
    let c = h.post(&alice, "c", vec![web]).await;
    h.services
        .votes
        .vote_on(&bob, VoteTarget::Post(c), VoteKind::Like)
        .await
        .unwrap();
    h.services
        .votes
        .vote_on(&bob, VoteTarget::Post(a), VoteKind::Dislike)
        .await
        .unwrap();

    let by_likes = h
        .services
        .posts
        .list(&Viewer::Anonymous, &PostListParams::default())
        .await
        .unwrap();
    let ids: Vec<i32> = by_likes.items.iter().map(|p| p.id).collect();
    assert_eq!(ids, vec![c, b, a]);

    let filtered = h
        .services
        .posts
        .list(
            &Viewer::Anonymous,
            &PostListParams {
                categories: vec![format!("{rust},{go}")],
                sort_by: Some("date".into()),
                order: Some("asc".into()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    let ids: Vec<i32> = filtered.items.iter().map(|p| p.id).collect();
    assert_eq!(ids, vec![a, b]);

    let beyond = h
        .services
        .posts
        .list(
            &Viewer::Anonymous,
            &PostListParams {
                page: Some("5".into()),
                limit: Some("2".into()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert!(beyond.items.is_empty());
    assert_eq!(beyond.pagination.total_items, 3);
    assert_eq!(beyond.pagination.total_pages, 2);

    let tagged = h
        .services
        .categories
        .posts(&Viewer::Anonymous, web, &PostListParams::default())
        .await
        .unwrap();
    assert_eq!(tagged.pagination.total_items, 2);

    let categories = h.services.categories.list(PageRequest::default()).await.unwrap();
    let titles: Vec<&str> = categories.items.iter().map(|c| c.title.as_str()).collect();
    assert_eq!(titles, vec!["go", "rust", "web"]);

    let stats = h.services.posts.stats().await.unwrap();
    assert_eq!(stats.total_posts, 3);
    assert_eq!(stats.total_users, 3);
    assert_eq!(stats.total_categories, 3);
}

#[tokio::test]
async fn test_unknown_category_is_a_validation_error() {
    let h = harness();
    let alice = h.member("alice").await;
    let err = h
        .services
        .posts
        .create(
            &alice,
            CreatePostInput {
                title: "t".into(),
                content: "c".into(),
                categories: vec![99],
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, DomainError::Validation(_)));

    let err = h
        .services
        .posts
        .list(
            &Viewer::Anonymous,
            &PostListParams {
                categories: vec!["99".into()],
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, DomainError::Validation(m) if m == "One or more categories do not exist"));
}

#[tokio::test]
async fn test_repeated_category_ids_link_once() {
    let h = harness();
    let admin = h.admin("root").await;
    let alice = h.member("alice").await;
    let rust = h.category(&admin, "rust").await;
    let go = h.category(&admin, "go").await;

    let post = h.post(&alice, "t", vec![rust, rust, go, rust]).await;
    let titles = |cats: Vec<Category>| -> Vec<String> {
        let mut titles: Vec<String> = cats.into_iter().map(|c| c.title).collect();
        titles.sort();
        titles
    };
    let linked = h.services.posts.categories(&alice, post).await.unwrap();
    assert_eq!(titles(linked), vec!["go", "rust"]);

    h.services
        .posts
        .update(
            &alice,
            post,
            PostPatch {
                category_ids: Some(vec![go, go]),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    let linked = h.services.posts.categories(&alice, post).await.unwrap();
    assert_eq!(titles(linked), vec!["go"]);
}

#[tokio::test]
async fn test_favorites_index() {
    let h = harness();
    let alice = h.member("alice").await;
    let bob = h.member("bob").await;
    let first = h.post(&alice, "first", vec![]).await;
    let second = h.post(&alice, "second", vec![]).await;
    let favorites = &h.services.favorites;

    assert!(!favorites.is_favorited(&Viewer::Anonymous, first).await.unwrap());
    favorites.add(&bob, first).await.unwrap();
    favorites.add(&bob, second).await.unwrap();
    assert!(favorites.is_favorited(&bob, first).await.unwrap());

    let err = favorites.add(&bob, first).await.unwrap_err();
    assert!(matches!(err, DomainError::Validation(m) if m == "Post already in favorites"));
    assert!(matches!(favorites.add(&bob, 999).await, Err(DomainError::NotFound(_))));

    let listed = favorites.list(&bob, PageRequest::default()).await.unwrap();
    let ids: Vec<i32> = listed.items.iter().map(|f| f.post.id).collect();
    assert_eq!(ids, vec![second, first]);

    h.set_post_status(&alice, second, ContentStatus::Locked).await;
    let listed = favorites.list(&bob, PageRequest::default()).await.unwrap();
    assert_eq!(listed.pagination.total_items, 1);

    favorites.remove(&bob, first).await.unwrap();
    assert!(matches!(
        favorites.remove(&bob, first).await,
        Err(DomainError::NotFound(m)) if m == "Favorite not found"
    ));
}

#[tokio::test]
async fn test_concurrent_favorite_inserts_yield_one_client_error() {
    let h = harness();
    let alice = h.member("alice").await;
    let bob = h.member("bob").await;
    let post = h.post(&alice, "Q1", vec![]).await;

    let (a, b) = tokio::join!(
        h.services.favorites.add(&bob, post),
        h.services.favorites.add(&bob, post)
    );
    let results = [a, b];
    assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 1);
    assert!(results
        .iter()
        .any(|r| matches!(r, Err(DomainError::Validation(m)) if m.contains("already"))));
}

#[tokio::test]
async fn test_user_management() {
    let h = harness();
    let carol = h.admin("carol").await;
    let alice = h.member("alice").await;
    let bob = h.member("bob").await;
    let alice_id = alice.id().unwrap();

    assert!(matches!(
        h.services.users.list(&alice).await,
        Err(DomainError::Forbidden(_))
    ));
    assert_eq!(h.services.users.list(&carol).await.unwrap().len(), 3);

    // A non-admin email change requires reconfirmation.
    let updated = h
        .services
        .users
        .update(
            &alice,
            alice_id,
            usof_core::services::UpdateUserInput {
                email: Some("alice2@x".into()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert!(!updated.user.email_confirmed);
    assert!(h.outbox.last_to("alice2@x").is_some());

    let err = h
        .services
        .users
        .update(
            &alice,
            alice_id,
            usof_core::services::UpdateUserInput {
                role: Some("admin".into()),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, DomainError::Forbidden(_)));

    let err = h
        .services
        .users
        .update(
            &bob,
            alice_id,
            usof_core::services::UpdateUserInput {
                full_name: Some("x".into()),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, DomainError::Forbidden(_)));

    let err = h
        .services
        .users
        .update(
            &alice,
            alice_id,
            usof_core::services::UpdateUserInput {
                login: Some("bob".into()),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, DomainError::Conflict(m) if m == "Login already exists"));

    let err = h
        .services
        .users
        .delete(&carol, carol.id().unwrap())
        .await
        .unwrap_err();
    assert!(matches!(err, DomainError::Validation(m) if m == "Cannot delete your own account"));
}

#[tokio::test]
async fn test_deleting_user_cascades_through_content() {
    let h = harness();
    let carol = h.admin("carol").await;
    let alice = h.member("alice").await;
    let bob = h.member("bob").await;
    let post = h.post(&alice, "Q1", vec![]).await;
    let bobs_post = h.post(&bob, "Q2", vec![]).await;
    h.services.posts.add_comment(&bob, post, "c".into()).await.unwrap();
    h.services
        .votes
        .vote_on(&alice, VoteTarget::Post(bobs_post), VoteKind::Like)
        .await
        .unwrap();
    h.services.favorites.add(&bob, post).await.unwrap();

    h.services
        .users
        .delete(&carol, alice.id().unwrap())
        .await
        .unwrap();

    assert!(matches!(
        h.services.posts.detail(&carol, post).await,
        Err(DomainError::NotFound(_))
    ));
    let bobs = h.services.posts.detail(&carol, bobs_post).await.unwrap();
    assert_eq!(bobs.post.likes_count, 0);
    let favs = h.services.favorites.list(&bob, PageRequest::default()).await.unwrap();
    assert_eq!(favs.pagination.total_items, 0);

    // A stale session for the deleted account resolves to anonymous.
    let viewer = h
        .services
        .identity
        .resolve_viewer(alice.id())
        .await
        .unwrap();
    assert_eq!(viewer, Viewer::Anonymous);
}

#[tokio::test]
async fn test_bootstrap_admin_runs_once() {
    let h = harness();

    let created = h
        .services
        .users
        .bootstrap_admin("root", "root@x", "rootpw1")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(created.role, Role::Admin);
    assert!(created.email_confirmed);

    let again = h
        .services
        .users
        .bootstrap_admin("root", "other@x", "otherpw1")
        .await
        .unwrap();
    assert!(again.is_none());

    let user = h
        .services
        .identity
        .login(LoginInput {
            login: Some("root".to_string()),
            email: None,
            password: "rootpw1".to_string(),
        })
        .await
        .unwrap();
    assert_eq!(user.id, created.id);
}

/// Answers `find` with the current vote, then lets a concurrent unvote land
/// before the caller acts on it.
struct UnvotedMeanwhile(Arc<InMemoryStore>);

#[async_trait]
impl VoteRepository for UnvotedMeanwhile {
    async fn find(&self, target: VoteTarget, user_id: i32) -> Result<Option<Vote>, RepoError> {
        let found = VoteRepository::find(self.0.as_ref(), target, user_id).await?;
        if found.is_some() {
            VoteRepository::remove(self.0.as_ref(), target, user_id).await?;
        }
        Ok(found)
    }

    async fn insert(
        &self,
        target: VoteTarget,
        user_id: i32,
        kind: VoteKind,
    ) -> Result<Vote, RepoError> {
        VoteRepository::insert(self.0.as_ref(), target, user_id, kind).await
    }

    async fn set_kind(
        &self,
        target: VoteTarget,
        user_id: i32,
        kind: VoteKind,
    ) -> Result<(), RepoError> {
        VoteRepository::set_kind(self.0.as_ref(), target, user_id, kind).await
    }

    async fn remove(&self, target: VoteTarget, user_id: i32) -> Result<bool, RepoError> {
        VoteRepository::remove(self.0.as_ref(), target, user_id).await
    }

    async fn list(&self, target: VoteTarget) -> Result<Vec<VoteRow>, RepoError> {
        VoteRepository::list(self.0.as_ref(), target).await
    }
}

#[tokio::test]
async fn test_vote_flip_racing_an_unvote_is_a_conflict() {
    let h = harness();
    let alice = h.member("alice").await;
    let bob = h.member("bob").await;
    let target = VoteTarget::Post(h.post(&alice, "t", vec![]).await);
    h.services
        .votes
        .vote_on(&bob, target, VoteKind::Like)
        .await
        .unwrap();

    let mut repos = h.store.clone().repositories();
    repos.votes = Arc::new(UnvotedMeanwhile(h.store.clone()));
    let racing = VoteService::new(repos);
    let err = racing
        .vote_on(&bob, target, VoteKind::Dislike)
        .await
        .unwrap_err();
    assert!(matches!(err, DomainError::Conflict(_)));

    let retried = h
        .services
        .votes
        .vote_on(&bob, target, VoteKind::Dislike)
        .await
        .unwrap();
    assert_eq!(retried, VoteAction::Created);
}
