//! Application services.
//!
//! Each service loads what the policy needs, asks [`crate::policy`] for a
//! decision and only then touches the store. Services are cheap to clone;
//! every collaborator sits behind an `Arc`.

mod categories;
mod comments;
mod favorites;
mod identity;
mod posts;
mod users;
mod votes;

use std::sync::Arc;

pub use categories::CategoryService;
pub use comments::CommentService;
pub use favorites::FavoriteService;
pub use identity::{
    EmailConfirmation, IdentityService, LoginInput, PASSWORD_RESET_NOTICE, PasswordResetInput,
    RegisterInput,
};
pub use posts::{CreatePostInput, PostService};
pub use users::{CreateUserInput, UpdateUserInput, UpdatedUser, UserService};
pub use votes::VoteService;

use crate::error::{DomainError, RepoError};
use crate::ports::{
    CategoryRepository, CommentRepository, FavoriteRepository, MailMessage, Mailer,
    PasswordService, PostRepository, TokenGenerator, UserRepository, VoteRepository,
};

pub const MIN_PASSWORD_LEN: usize = 6;

/// Every repository the services need.
#[derive(Clone)]
pub struct Repositories {
    pub users: Arc<dyn UserRepository>,
    pub posts: Arc<dyn PostRepository>,
    pub comments: Arc<dyn CommentRepository>,
    pub categories: Arc<dyn CategoryRepository>,
    pub votes: Arc<dyn VoteRepository>,
    pub favorites: Arc<dyn FavoriteRepository>,
}

/// Builds absolute links embedded in outgoing mail.
#[derive(Debug, Clone)]
pub struct Links {
    base_url: String,
}

impl Links {
    pub fn new(base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self { base_url }
    }

    pub fn confirm_email(&self, token: &str) -> String {
        format!("{}/api/auth/confirm-email/{token}", self.base_url)
    }

    pub fn password_reset(&self, token: &str) -> String {
        format!("{}/api/auth/password-reset/{token}", self.base_url)
    }
}

/// Credential-related collaborators shared by identity and user management.
#[derive(Clone)]
pub struct Credentials {
    pub passwords: Arc<dyn PasswordService>,
    pub tokens: Arc<dyn TokenGenerator>,
    pub mailer: Arc<dyn Mailer>,
    pub links: Links,
}

impl Credentials {
    /// Send mail without letting a transport failure reach the caller.
    pub(crate) async fn deliver(&self, message: MailMessage) {
        let to = mask_email(&message.to);
        let subject = message.subject.clone();
        match self.mailer.send(message).await {
            Ok(()) => tracing::info!(to = %to, subject = %subject, "Mail dispatched"),
            Err(e) => tracing::warn!(to = %to, subject = %subject, error = %e, "Mail dispatch failed"),
        }
    }

    pub(crate) async fn send_confirmation(&self, to: &str, name: &str, token: &str) {
        let link = self.links.confirm_email(token);
        self.deliver(MailMessage {
            to: to.to_string(),
            subject: "Confirm Your Email - USOF".to_string(),
            html: format!(
                "<h2>Welcome to USOF!</h2>\
                 <p>Hello {name},</p>\
                 <p>Please follow the link below to confirm your email address:</p>\
                 <p><a href=\"{link}\">{link}</a></p>\
                 <p>If you didn't register for USOF, please ignore this email.</p>"
            ),
        })
        .await;
    }
}

/// The full service set, wired once at startup.
#[derive(Clone)]
pub struct Services {
    pub identity: IdentityService,
    pub users: UserService,
    pub posts: PostService,
    pub comments: CommentService,
    pub votes: VoteService,
    pub categories: CategoryService,
    pub favorites: FavoriteService,
}

impl Services {
    pub fn new(repos: Repositories, credentials: Credentials) -> Self {
        Self {
            identity: IdentityService::new(repos.users.clone(), credentials.clone()),
            users: UserService::new(repos.users.clone(), credentials),
            posts: PostService::new(repos.clone()),
            comments: CommentService::new(repos.comments.clone()),
            votes: VoteService::new(repos.clone()),
            categories: CategoryService::new(repos.categories.clone(), repos.posts.clone()),
            favorites: FavoriteService::new(repos.favorites.clone(), repos.posts),
        }
    }
}

/// Mask the local part of an email address for log output.
pub fn mask_email(email: &str) -> String {
    match email.split_once('@') {
        Some((local, domain)) => {
            let mut chars = local.chars();
            match (chars.next(), chars.next()) {
                (Some(first), Some(_)) => format!("{first}***@{domain}"),
                _ => format!("***@{domain}"),
            }
        }
        None => "***".to_string(),
    }
}

pub(crate) fn is_blank(value: &str) -> bool {
    value.trim().is_empty()
}

pub(crate) fn validate_new_password(password: &str, confirmation: &str) -> Result<(), DomainError> {
    if password != confirmation {
        return Err(DomainError::validation("Passwords do not match"));
    }
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(DomainError::validation(format!(
            "Password must be at least {MIN_PASSWORD_LEN} characters long"
        )));
    }
    Ok(())
}

/// Reclassify a unique violation on the users table.
pub(crate) fn user_conflict(err: RepoError) -> DomainError {
    match err {
        RepoError::Constraint(what) if what.contains("email") => {
            DomainError::conflict("Email already registered")
        }
        RepoError::Constraint(_) => DomainError::conflict("Login already exists"),
        other => other.into(),
    }
}

/// Map a missing row onto an entity-specific not-found error.
pub(crate) fn or_not_found(err: RepoError, entity: &str) -> DomainError {
    match err {
        RepoError::NotFound => DomainError::not_found(entity),
        other => other.into(),
    }
}
