//! SeaORM entities, one per table.

pub mod category;
pub mod comment;
pub mod enums;
pub mod favorite;
pub mod post;
pub mod post_category;
pub mod user;

pub use enums::{DbContentStatus, DbRole, DbVoteKind};
