//! Domain entities - the core business objects.

mod post;
mod user;

pub use post::{AuthoredPost, Post, PostChanges, PostDraft, TITLE_MAX_CHARS};
pub use user::User;
