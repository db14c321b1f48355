use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::User;
use crate::error::DomainError;

/// Maximum length of a post title, in characters.
pub const TITLE_MAX_CHARS: usize = 255;

/// Post entity - represents a blog post.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Post {
    pub id: Uuid,
    pub author_id: Uuid,
    pub title: String,
    pub content: String,
    pub published: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// The writable fields of a new post.
#[derive(Debug, Clone, Default)]
pub struct PostDraft {
    pub title: String,
    pub content: String,
    pub published: bool,
}

/// A set of field updates; `None` leaves the field untouched.
#[derive(Debug, Clone, Default)]
pub struct PostChanges {
    pub title: Option<String>,
    pub content: Option<String>,
    pub published: Option<bool>,
}

/// A post joined with its author, as read back from the store.
#[derive(Debug, Clone)]
pub struct AuthoredPost {
    pub post: Post,
    pub author: User,
}

impl PostDraft {
    pub fn validate(&self) -> Result<(), DomainError> {
        validate_title(&self.title)?;
        validate_content(&self.content)
    }
}

impl Post {
    /// Create a new post owned by `author_id`.
    ///
    /// The draft is not validated here; callers go through
    /// [`crate::access::create_post`].
    pub fn new(author_id: Uuid, draft: PostDraft) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            author_id,
            title: draft.title.trim().to_string(),
            content: draft.content.trim().to_string(),
            published: draft.published,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn is_authored_by(&self, user_id: Uuid) -> bool {
        self.author_id == user_id
    }

    /// Apply `changes` and refresh `updated_at`.
    ///
    /// Every change is validated before any field is touched.
    pub fn apply(&mut self, changes: PostChanges) -> Result<(), DomainError> {
        if let Some(title) = &changes.title {
            validate_title(title)?;
        }
        if let Some(content) = &changes.content {
            validate_content(content)?;
        }

        if let Some(title) = changes.title {
            self.title = title.trim().to_string();
        }
        if let Some(content) = changes.content {
            self.content = content.trim().to_string();
        }
        if let Some(published) = changes.published {
            self.published = published;
        }
        self.updated_at = Utc::now();
        Ok(())
    }
}

fn validate_title(title: &str) -> Result<(), DomainError> {
    let title = title.trim();
    if title.is_empty() {
        return Err(DomainError::Validation("title may not be blank".to_string()));
    }
    if title.chars().count() > TITLE_MAX_CHARS {
        return Err(DomainError::Validation(format!(
            "title may not exceed {} characters",
            TITLE_MAX_CHARS
        )));
    }
    Ok(())
}

fn validate_content(content: &str) -> Result<(), DomainError> {
    if content.trim().is_empty() {
        return Err(DomainError::Validation(
            "content may not be blank".to_string(),
        ));
    }
    Ok(())
}
