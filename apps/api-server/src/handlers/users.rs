//! Read-only user account handlers, restricted to administrators.

use actix_web::{HttpResponse, web};
use uuid::Uuid;

use quill_core::access;
use quill_core::domain::User;
use quill_core::error::DomainError;
use quill_core::ports::{BaseRepository, UserRepository};
use quill_core::query::PageRequest;
use quill_shared::dto::{ListUsersParams, UserResponse};

use super::paginated;
use crate::middleware::auth::MaybeIdentity;
use crate::middleware::error::AppResult;
use crate::state::AppState;

/// Public projection of an account; the password hash never leaves the server.
pub(crate) fn project(user: User) -> UserResponse {
    UserResponse {
        id: user.id,
        username: user.username,
        email: user.email,
        date_joined: user.date_joined,
    }
}

/// GET /api/users/
pub async fn list_users(
    state: web::Data<AppState>,
    identity: MaybeIdentity,
    params: web::Query<ListUsersParams>,
) -> AppResult<HttpResponse> {
    access::require_user_list(&identity.actor())?;

    let page = PageRequest::new(params.page, params.page_size, &state.listing.page_limits);
    let listing = state.users.list(page).await?;

    Ok(HttpResponse::Ok().json(paginated(listing.map(project))))
}

/// GET /api/users/{id}/
pub async fn retrieve_user(
    state: web::Data<AppState>,
    identity: MaybeIdentity,
    path: web::Path<Uuid>,
) -> AppResult<HttpResponse> {
    access::require_user_list(&identity.actor())?;

    let id = path.into_inner();
    let user = state
        .users
        .find_by_id(id)
        .await?
        .ok_or(DomainError::NotFound {
            entity_type: "User",
            id,
        })?;

    Ok(HttpResponse::Ok().json(project(user)))
}
