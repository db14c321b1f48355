//! Post access control.
//!
//! Every decision is a pure function of the actor, the requested method and
//! the target post (or list filters). Handlers compose these with the store.

use uuid::Uuid;

use crate::domain::{Post, PostDraft};
use crate::error::DomainError;
use crate::query::{PostFilter, PostOrder, PublishedFilterMode};

/// The identity behind a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Actor {
    Anonymous,
    User { id: Uuid, is_admin: bool },
}

impl Actor {
    pub fn user(id: Uuid) -> Self {
        Self::User {
            id,
            is_admin: false,
        }
    }

    pub fn admin(id: Uuid) -> Self {
        Self::User { id, is_admin: true }
    }

    pub fn user_id(&self) -> Option<Uuid> {
        match self {
            Self::Anonymous => None,
            Self::User { id, .. } => Some(*id),
        }
    }

    pub fn is_authenticated(&self) -> bool {
        matches!(self, Self::User { .. })
    }

    pub fn is_admin(&self) -> bool {
        matches!(self, Self::User { is_admin: true, .. })
    }
}

/// Operation requested on a post.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Read,
    Create,
    Update,
    Delete,
}

impl Method {
    /// Safe methods never modify state.
    pub fn is_safe(self) -> bool {
        matches!(self, Self::Read)
    }
}

/// Decide whether `actor` may perform `method` on `post`.
///
/// Rules, first match wins:
/// 1. `Read` is open to everyone.
/// 2. `Create` needs an authenticated actor.
/// 3. `Update` and `Delete` need the actor to be the post's author.
///
/// `Update`/`Delete` without a target post is a contract violation.
pub fn authorize(actor: &Actor, method: Method, post: Option<&Post>) -> Result<bool, DomainError> {
    match method {
        Method::Read => Ok(true),
        Method::Create => Ok(actor.is_authenticated()),
        Method::Update | Method::Delete => {
            let post = post.ok_or_else(|| {
                DomainError::InvalidArgument(format!("{:?} requires a target post", method))
            })?;
            Ok(actor.user_id().is_some_and(|id| post.is_authored_by(id)))
        }
    }
}

/// Like [`authorize`], but a denial becomes `Unauthorized` for anonymous
/// actors and `Forbidden` for authenticated ones.
pub fn require(actor: &Actor, method: Method, post: Option<&Post>) -> Result<(), DomainError> {
    if authorize(actor, method, post)? {
        Ok(())
    } else {
        Err(denial(actor))
    }
}

/// Request-level check run before the target is looked up: unsafe methods
/// need an identity.
pub fn require_view(actor: &Actor, method: Method) -> Result<(), DomainError> {
    if method.is_safe() || actor.is_authenticated() {
        Ok(())
    } else {
        Err(DomainError::Unauthorized)
    }
}

/// Authorize a create and build the post with the actor as its author.
pub fn create_post(actor: &Actor, draft: PostDraft) -> Result<Post, DomainError> {
    require(actor, Method::Create, None)?;
    let author_id = actor.user_id().ok_or(DomainError::Unauthorized)?;
    draft.validate()?;
    Ok(Post::new(author_id, draft))
}

/// Build the filter for a post listing.
///
/// The result never depends on who is asking. An empty `author` is ignored.
pub fn scope_list_query(
    published: Option<&str>,
    author: Option<&str>,
    mode: PublishedFilterMode,
) -> PostFilter {
    PostFilter {
        published: published.and_then(|raw| mode.interpret(raw)),
        author_username: author.filter(|name| !name.is_empty()).map(str::to_string),
        order: PostOrder::NewestFirst,
    }
}

/// Only administrators may browse user accounts.
pub fn authorize_user_list(actor: &Actor) -> bool {
    actor.is_admin()
}

pub fn require_user_list(actor: &Actor) -> Result<(), DomainError> {
    if authorize_user_list(actor) {
        Ok(())
    } else {
        Err(denial(actor))
    }
}

fn denial(actor: &Actor) -> DomainError {
    if actor.is_authenticated() {
        DomainError::Forbidden
    } else {
        DomainError::Unauthorized
    }
}
