//! Authentication handlers.

use actix_web::{HttpResponse, web};

use quill_core::domain::User;
use quill_core::ports::{ADMIN_ROLE, AuthError, BaseRepository, USER_ROLE, UserRepository};
use quill_shared::dto::{AuthResponse, LoginRequest, RegisterUserRequest};

use super::users;
use crate::middleware::auth::Identity;
use crate::middleware::error::{AppError, AppResult};
use crate::state::AppState;

const USERNAME_MAX_CHARS: usize = 150;
const PASSWORD_MIN_CHARS: usize = 8;

/// Roles embedded in a user's access token.
pub(crate) fn roles_for(user: &User) -> Vec<String> {
    let mut roles = vec![USER_ROLE.to_string()];
    if user.is_admin {
        roles.push(ADMIN_ROLE.to_string());
    }
    roles
}

fn issue_token(state: &AppState, user: &User) -> AppResult<AuthResponse> {
    let token = state
        .tokens
        .generate_token(user.id, &user.username, roles_for(user))?;

    Ok(AuthResponse {
        access_token: token,
        token_type: "Bearer".to_string(),
        expires_in: state.tokens.expiration_seconds().max(0) as u64,
    })
}

fn validate_registration(req: &RegisterUserRequest) -> AppResult<()> {
    let username_ok = !req.username.is_empty()
        && req.username.chars().count() <= USERNAME_MAX_CHARS
        && req
            .username
            .chars()
            .all(|c| c.is_alphanumeric() || "@.+-_".contains(c));
    if !username_ok {
        return Err(AppError::BadRequest(format!(
            "Username must be 1-{} characters: letters, digits and @/./+/-/_ only",
            USERNAME_MAX_CHARS
        )));
    }
    if !req.email.contains('@') {
        return Err(AppError::BadRequest("Invalid email address".to_string()));
    }
    if req.password.chars().count() < PASSWORD_MIN_CHARS {
        return Err(AppError::BadRequest(format!(
            "Password must be at least {} characters",
            PASSWORD_MIN_CHARS
        )));
    }
    Ok(())
}

/// POST /api/auth/register/
pub async fn register(
    state: web::Data<AppState>,
    body: web::Json<RegisterUserRequest>,
) -> AppResult<HttpResponse> {
    let req = body.into_inner();
    validate_registration(&req)?;

    if state.users.find_by_username(&req.username).await?.is_some() {
        return Err(AppError::Conflict("Username already taken".to_string()));
    }

    let password_hash = state.passwords.hash(&req.password)?;
    let user = state
        .users
        .create(User::new(req.username, req.email, password_hash))
        .await?;
    tracing::info!(user_id = %user.id, username = %user.username, "User registered");

    Ok(HttpResponse::Created().json(issue_token(&state, &user)?))
}

/// POST /api/auth/login/
pub async fn login(
    state: web::Data<AppState>,
    body: web::Json<LoginRequest>,
) -> AppResult<HttpResponse> {
    let req = body.into_inner();

    let user = state
        .users
        .find_by_username(&req.username)
        .await?
        .ok_or(AuthError::InvalidCredentials)?;

    if !state.passwords.verify(&req.password, &user.password_hash)? {
        tracing::debug!(username = %req.username, "Password mismatch");
        return Err(AuthError::InvalidCredentials.into());
    }

    Ok(HttpResponse::Ok().json(issue_token(&state, &user)?))
}

/// GET /api/auth/me/
pub async fn me(state: web::Data<AppState>, identity: Identity) -> AppResult<HttpResponse> {
    tracing::debug!(username = %identity.username, "Resolving current user");

    let user = state
        .users
        .find_by_id(identity.user_id)
        .await?
        .ok_or_else(|| AppError::Unauthorized("Account no longer exists.".to_string()))?;

    Ok(HttpResponse::Ok().json(users::project(user)))
}
