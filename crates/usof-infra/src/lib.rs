//! # USOF Infrastructure
//!
//! Concrete implementations of the ports defined in `usof-core`.
//! This crate contains persistence, credential and mail integrations.
//!
//! ## Feature Flags
//!
//! - `full` (default) - All features enabled
//! - `minimal` - No external services: in-memory store and log mailer only
//! - `postgres` - PostgreSQL persistence via SeaORM
//! - `auth` - Argon2 password hashing and random hex tokens
//! - `mail-http` - Outbound mail through an HTTP relay

pub mod mail;
pub mod memory;

#[cfg(feature = "postgres")]
pub mod database;

#[cfg(feature = "auth")]
pub mod auth;

// Re-exports - In-Memory
pub use mail::{LogMailer, OutboxMailer};
pub use memory::InMemoryStore;

#[cfg(feature = "postgres")]
pub use database::{DatabaseConfig, DatabaseConnections, postgres_repositories};

#[cfg(feature = "auth")]
pub use auth::{Argon2PasswordService, HexTokenGenerator};

#[cfg(feature = "mail-http")]
pub use mail::{HttpMailer, HttpMailerConfig};
