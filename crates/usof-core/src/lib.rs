//! # USOF Core
//!
//! The domain layer of the USOF forum.
//! This crate contains the content lifecycle, the authorization policy, the
//! vote reconciler and the application services. It performs no I/O of its
//! own: persistence, hashing and mail are reached through the traits in
//! [`ports`].

pub mod domain;
pub mod error;
pub mod lifecycle;
pub mod policy;
pub mod ports;
pub mod query;
pub mod services;
pub mod viewer;
pub mod views;

pub use error::{DomainError, RepoError};
pub use lifecycle::ContentStatus;
pub use policy::Decision;
pub use viewer::Viewer;
