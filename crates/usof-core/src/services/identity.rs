//! Registration, email confirmation, login and password reset.

use std::sync::Arc;

use chrono::{Duration, Utc};
use tracing::{debug, info};

use super::{Credentials, is_blank, mask_email, user_conflict, validate_new_password};
use crate::domain::{NewUser, User};
use crate::error::DomainError;
use crate::ports::{MailMessage, UserRepository};
use crate::viewer::Viewer;

/// Response text for every password reset request, matched or not.
pub const PASSWORD_RESET_NOTICE: &str =
    "If an account with that email exists, a password reset link has been sent.";

const INVALID_CREDENTIALS: &str = "Invalid credentials";
const RESET_TOKEN_TTL_HOURS: i64 = 1;

#[derive(Debug, Clone, Default)]
pub struct RegisterInput {
    pub login: String,
    pub email: String,
    pub password: String,
    pub password_confirmation: String,
    pub full_name: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct LoginInput {
    pub login: Option<String>,
    pub email: Option<String>,
    pub password: String,
}

#[derive(Debug, Clone, Default)]
pub struct PasswordResetInput {
    pub token: String,
    pub password: String,
    pub password_confirmation: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmailConfirmation {
    Confirmed,
    AlreadyConfirmed,
}

#[derive(Clone)]
pub struct IdentityService {
    users: Arc<dyn UserRepository>,
    credentials: Credentials,
}

impl IdentityService {
    pub fn new(users: Arc<dyn UserRepository>, credentials: Credentials) -> Self {
        Self { users, credentials }
    }

    pub async fn register(&self, input: RegisterInput) -> Result<User, DomainError> {
        if is_blank(&input.login) || is_blank(&input.password) || is_blank(&input.email) {
            return Err(DomainError::validation(
                "Login, password, and email are required",
            ));
        }
        validate_new_password(&input.password, &input.password_confirmation)?;

        if self.users.find_by_login(&input.login).await?.is_some() {
            return Err(DomainError::conflict("Login already exists"));
        }
        if self.users.find_by_email(&input.email).await?.is_some() {
            return Err(DomainError::conflict("Email already registered"));
        }

        let hash = self.credentials.passwords.hash(&input.password)?;
        let token = self.credentials.tokens.generate();
        let new_user = NewUser::registration(
            input.login,
            input.email,
            hash,
            input.full_name,
            token.clone(),
        );
        let user = self.users.insert(new_user).await.map_err(user_conflict)?;

        info!(user_id = user.id, email = %mask_email(&user.email), "User registered");
        self.credentials
            .send_confirmation(&user.email, &user.full_name, &token)
            .await;

        Ok(user)
    }

    /// Confirm the account holding `token` and consume the token.
    ///
    /// A confirmed row that still carries a token reports
    /// [`EmailConfirmation::AlreadyConfirmed`] and is left untouched.
    pub async fn confirm_email(&self, token: &str) -> Result<EmailConfirmation, DomainError> {
        if is_blank(token) {
            return Err(DomainError::validation("Token is required"));
        }
        let mut user = self
            .users
            .find_by_email_token(token)
            .await?
            .ok_or_else(|| DomainError::validation("Invalid or expired confirmation token"))?;

        if user.email_confirmed {
            return Ok(EmailConfirmation::AlreadyConfirmed);
        }
        user.email_confirmed = true;
        user.email_token = None;
        self.users.update(&user).await?;
        info!(user_id = user.id, "Email confirmed");
        Ok(EmailConfirmation::Confirmed)
    }

    /// Check credentials. The caller opens the session.
    pub async fn login(&self, input: LoginInput) -> Result<User, DomainError> {
        if is_blank(&input.password) {
            return Err(DomainError::validation("Password is required"));
        }
        let login = input.login.filter(|l| !is_blank(l));
        let email = input.email.filter(|e| !is_blank(e));

        let user = match (login, email) {
            (Some(login), _) => self.users.find_by_login(&login).await?,
            (None, Some(email)) => self.users.find_by_email(&email).await?,
            (None, None) => return Err(DomainError::validation("Login or email is required")),
        };
        let Some(user) = user else {
            debug!("Login attempt for unknown account");
            return Err(DomainError::Unauthenticated(INVALID_CREDENTIALS.to_string()));
        };

        if !self
            .credentials
            .passwords
            .verify(&input.password, &user.password_hash)?
        {
            debug!(user_id = user.id, "Login attempt with wrong password");
            return Err(DomainError::Unauthenticated(INVALID_CREDENTIALS.to_string()));
        }
        if !user.email_confirmed {
            return Err(DomainError::Unauthenticated(
                "Invalid credentials: please confirm your email before logging in".to_string(),
            ));
        }

        info!(user_id = user.id, role = %user.role, "User logged in");
        Ok(user)
    }

    /// Issue a reset token when `email` belongs to an account. The outcome is
    /// deliberately invisible to the caller.
    pub async fn request_password_reset(&self, email: &str) -> Result<(), DomainError> {
        if is_blank(email) {
            return Err(DomainError::validation("Email is required"));
        }
        let Some(mut user) = self.users.find_by_email(email).await? else {
            debug!(email = %mask_email(email), "Password reset requested for unknown email");
            return Ok(());
        };

        let token = self.credentials.tokens.generate();
        user.reset_token = Some(token.clone());
        user.reset_token_expires = Some(Utc::now() + Duration::hours(RESET_TOKEN_TTL_HOURS));
        self.users.update(&user).await?;

        let link = self.credentials.links.password_reset(&token);
        self.credentials
            .deliver(MailMessage {
                to: user.email.clone(),
                subject: "Password Reset - USOF".to_string(),
                html: format!(
                    "<h2>Password Reset Request</h2>\
                     <p>Hello {},</p>\
                     <p>Follow the link below to set a new password:</p>\
                     <p><a href=\"{link}\">{link}</a></p>\
                     <p>This link will expire in 1 hour.</p>\
                     <p>If you didn't request this reset, please ignore this email.</p>",
                    user.full_name
                ),
            })
            .await;
        Ok(())
    }

    pub async fn confirm_password_reset(&self, input: PasswordResetInput) -> Result<(), DomainError> {
        if is_blank(&input.token) {
            return Err(DomainError::validation("Reset token is required"));
        }
        if input.password.is_empty() {
            return Err(DomainError::validation("New password is required"));
        }
        validate_new_password(&input.password, &input.password_confirmation)?;

        let mut user = self
            .users
            .find_by_reset_token(&input.token)
            .await?
            .ok_or_else(|| DomainError::validation("Invalid reset token"))?;
        if !user.reset_token_valid_at(Utc::now()) {
            return Err(DomainError::validation("Reset token has expired"));
        }

        user.password_hash = self.credentials.passwords.hash(&input.password)?;
        user.reset_token = None;
        user.reset_token_expires = None;
        self.users.update(&user).await?;
        info!(user_id = user.id, "Password reset completed");
        Ok(())
    }

    /// Turn a session's user id into a viewer. The role is always read from
    /// the store, so demotions and deletions take effect immediately.
    pub async fn resolve_viewer(&self, user_id: Option<i32>) -> Result<Viewer, DomainError> {
        let Some(id) = user_id else {
            return Ok(Viewer::Anonymous);
        };
        Ok(match self.users.find_by_id(id).await? {
            Some(user) => Viewer::member(user.id, user.role),
            None => {
                debug!(user_id = id, "Session refers to a deleted user");
                Viewer::Anonymous
            }
        })
    }

    /// The signed-in account, for `/auth/me`.
    pub async fn current_user(&self, viewer: &Viewer) -> Result<User, DomainError> {
        let member = viewer.require_member()?;
        self.users
            .find_by_id(member.id)
            .await?
            .ok_or_else(|| DomainError::not_found("User"))
    }
}
