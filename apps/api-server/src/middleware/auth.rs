//! Authentication extractors.
//!
//! Tokens are validated with the `TokenService` held in [`AppState`].

use actix_web::{FromRequest, HttpRequest, dev::Payload, http::header, web};
use std::future::{Ready, ready};

use quill_core::Actor;
use quill_core::ports::{ADMIN_ROLE, AuthError, TokenClaims};

use crate::middleware::error::AppError;
use crate::state::AppState;

/// Authenticated user identity extractor.
///
/// Use this in handlers to require authentication:
/// ```ignore
/// async fn protected_route(identity: Identity) -> impl Responder {
///     format!("Hello, {}!", identity.username)
/// }
/// ```
#[derive(Debug, Clone)]
pub struct Identity {
    pub user_id: uuid::Uuid,
    pub username: String,
    pub roles: Vec<String>,
}

impl Identity {
    pub fn actor(&self) -> Actor {
        Actor::User {
            id: self.user_id,
            is_admin: self.roles.iter().any(|r| r == ADMIN_ROLE),
        }
    }
}

impl From<TokenClaims> for Identity {
    fn from(claims: TokenClaims) -> Self {
        Self {
            user_id: claims.user_id,
            username: claims.username,
            roles: claims.roles,
        }
    }
}

/// Reads the bearer token, if any. `Ok(None)` means no credentials were sent.
fn authenticate(req: &HttpRequest) -> Result<Option<Identity>, AppError> {
    let Some(auth_header) = req.headers().get(header::AUTHORIZATION) else {
        return Ok(None);
    };

    let state = req.app_data::<web::Data<AppState>>().ok_or_else(|| {
        tracing::error!("AppState not found in app data");
        AppError::Internal("Server configuration error".to_string())
    })?;

    let auth_str = auth_header
        .to_str()
        .map_err(|_| AuthError::InvalidToken("Invalid authorization header".to_string()))?;

    let token = auth_str
        .strip_prefix("Bearer ")
        .ok_or_else(|| AuthError::InvalidToken("Expected Bearer token".to_string()))?;

    let claims = state.tokens.validate_token(token.trim())?;
    Ok(Some(Identity::from(claims)))
}

impl FromRequest for Identity {
    type Error = AppError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        ready(authenticate(req).and_then(|identity| {
            identity.ok_or_else(|| {
                AppError::Unauthorized(
                    "Please provide a valid Bearer token in the Authorization header.".to_string(),
                )
            })
        }))
    }
}

/// Optional identity extractor.
///
/// Missing credentials yield an anonymous actor; credentials that are present
/// but invalid are still rejected.
#[derive(Debug, Clone)]
pub struct MaybeIdentity(pub Option<Identity>);

impl MaybeIdentity {
    pub fn actor(&self) -> Actor {
        self.0
            .as_ref()
            .map(Identity::actor)
            .unwrap_or(Actor::Anonymous)
    }
}

impl FromRequest for MaybeIdentity {
    type Error = AppError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        ready(authenticate(req).map(MaybeIdentity))
    }
}
