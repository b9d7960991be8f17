use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::DomainError;

/// Account role. Exactly one at a time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    #[default]
    User,
    Admin,
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Admin => "admin",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "user" => Ok(Self::User),
            "admin" => Ok(Self::Admin),
            _ => Err(DomainError::validation(
                "Invalid role. Must be \"user\" or \"admin\"",
            )),
        }
    }
}

/// User entity - a registered account.
///
/// `password_hash` never leaves the core: projections handed to clients are
/// built from [`crate::views::UserProfile`] instead.
#[derive(Debug, Clone)]
pub struct User {
    pub id: i32,
    pub login: String,
    pub email: String,
    pub password_hash: String,
    pub full_name: String,
    pub role: Role,
    pub email_confirmed: bool,
    pub email_token: Option<String>,
    pub reset_token: Option<String>,
    pub reset_token_expires: Option<DateTime<Utc>>,
    pub profile_picture: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl User {
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }

    /// Whether a pending reset token is still usable at `now`.
    pub fn reset_token_valid_at(&self, now: DateTime<Utc>) -> bool {
        self.reset_token.is_some() && self.reset_token_expires.is_some_and(|exp| now <= exp)
    }
}

/// A user about to be inserted; the store assigns `id` and `created_at`.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub login: String,
    pub email: String,
    pub password_hash: String,
    pub full_name: String,
    pub role: Role,
    pub email_confirmed: bool,
    pub email_token: Option<String>,
}

impl NewUser {
    /// A self-registered account awaiting email confirmation.
    pub fn registration(
        login: String,
        email: String,
        password_hash: String,
        full_name: Option<String>,
        email_token: String,
    ) -> Self {
        let full_name = full_name
            .filter(|n| !n.trim().is_empty())
            .unwrap_or_else(|| login.clone());
        Self {
            login,
            email,
            password_hash,
            full_name,
            role: Role::User,
            email_confirmed: false,
            email_token: Some(email_token),
        }
    }
}
