//! Ports - trait definitions for external dependencies.
//! These are the "interfaces" that infrastructure must implement.

mod auth;
mod mailer;
mod repository;

pub use auth::{AuthError, PasswordService, TokenGenerator};
pub use mailer::{MailError, MailMessage, Mailer};
pub use repository::{
    BaseRepository, CategoryRepository, CommentRepository, FavoriteRepository, PostRepository,
    UserRepository, VoteRepository,
};
