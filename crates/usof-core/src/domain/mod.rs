//! Domain entities - the core business objects.

mod category;
mod comment;
mod post;
mod user;
mod vote;

pub use category::{Category, CategoryPatch, NewCategory};
pub use comment::{Comment, CommentPatch, NewComment};
pub use post::{NewPost, Post, PostPatch};
pub use user::{NewUser, Role, User};
pub use vote::{Vote, VoteAction, VoteKind, VoteTarget, reconcile};
