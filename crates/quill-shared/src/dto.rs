//! Data Transfer Objects - request/response types for the API.
//!
//! Request bodies only declare client-writable fields. Anything else a client
//! sends (`author`, `created_at`, ...) is dropped during deserialization.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Request to register a new user.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegisterUserRequest {
    pub username: String,
    pub email: String,
    pub password: String,
}

/// Request to login.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

/// Response containing authentication tokens.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthResponse {
    pub access_token: String,
    pub token_type: String,
    pub expires_in: u64,
}

/// A user account as exposed by the API.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserResponse {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub date_joined: DateTime<Utc>,
}

/// A post as exposed by the API.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PostResponse {
    pub id: Uuid,
    pub title: String,
    pub content: String,
    pub author: Uuid,
    pub author_username: String,
    pub published: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// POST /posts/
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreatePostRequest {
    pub title: String,
    pub content: String,
    #[serde(default)]
    pub published: bool,
}

/// PUT /posts/{id}/ - `published` keeps its value when omitted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReplacePostRequest {
    pub title: String,
    pub content: String,
    pub published: Option<bool>,
}

/// PATCH /posts/{id}/
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PatchPostRequest {
    pub title: Option<String>,
    pub content: Option<String>,
    pub published: Option<bool>,
}

/// Query string of GET /posts/.
///
/// `published` stays a raw string; its interpretation is a server setting.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ListPostsParams {
    pub published: Option<String>,
    pub author: Option<String>,
    pub page: Option<u64>,
    pub page_size: Option<u64>,
}

/// Query string of GET /users/.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ListUsersParams {
    pub page: Option<u64>,
    pub page_size: Option<u64>,
}
