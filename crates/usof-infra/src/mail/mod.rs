//! Mailer implementations.

mod log;
mod outbox;

#[cfg(feature = "mail-http")]
mod http;

pub use log::LogMailer;
pub use outbox::OutboxMailer;

#[cfg(feature = "mail-http")]
pub use http::{HttpMailer, HttpMailerConfig};
