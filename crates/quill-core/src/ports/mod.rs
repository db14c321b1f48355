//! Ports - trait definitions for external dependencies.
//! These are the "interfaces" that infrastructure must implement.

mod auth;
mod repository;

pub use auth::{ADMIN_ROLE, AuthError, PasswordService, TokenClaims, TokenService, USER_ROLE};
pub use repository::{BaseRepository, PostRepository, UserRepository};
