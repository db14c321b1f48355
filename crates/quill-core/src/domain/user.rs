use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// User entity - an account that can author posts.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub is_admin: bool,
    pub date_joined: DateTime<Utc>,
}

impl User {
    /// Create a new regular user with generated ID and join timestamp.
    pub fn new(username: String, email: String, password_hash: String) -> Self {
        Self {
            id: Uuid::new_v4(),
            username,
            email,
            password_hash,
            is_admin: false,
            date_joined: Utc::now(),
        }
    }

    /// Create a user with administrator privilege.
    pub fn admin(username: String, email: String, password_hash: String) -> Self {
        Self {
            is_admin: true,
            ..Self::new(username, email, password_hash)
        }
    }
}
