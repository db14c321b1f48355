//! Post handlers.
//!
//! Each write runs the request-level check, looks the post up, then asks the
//! access controller about that specific post before touching the store.

use actix_web::{HttpResponse, web};
use uuid::Uuid;

use quill_core::access::{self, Actor, Method};
use quill_core::domain::{AuthoredPost, PostChanges, PostDraft};
use quill_core::error::DomainError;
use quill_core::ports::{BaseRepository, PostRepository};
use quill_core::query::PageRequest;
use quill_shared::dto::{
    CreatePostRequest, ListPostsParams, PatchPostRequest, PostResponse, ReplacePostRequest,
};

use super::paginated;
use crate::middleware::auth::MaybeIdentity;
use crate::middleware::error::{AppError, AppResult};
use crate::state::AppState;

/// Project a stored post into its wire form.
fn project(row: AuthoredPost) -> PostResponse {
    PostResponse {
        id: row.post.id,
        title: row.post.title,
        content: row.post.content,
        author: row.author.id,
        author_username: row.author.username,
        published: row.post.published,
        created_at: row.post.created_at,
        updated_at: row.post.updated_at,
    }
}

fn not_found(id: Uuid) -> AppError {
    DomainError::NotFound {
        entity_type: "Post",
        id,
    }
    .into()
}

/// GET /api/posts/
pub async fn list_posts(
    state: web::Data<AppState>,
    params: web::Query<ListPostsParams>,
) -> AppResult<HttpResponse> {
    let params = params.into_inner();

    let filter = access::scope_list_query(
        params.published.as_deref(),
        params.author.as_deref(),
        state.listing.published_mode,
    );
    let page = PageRequest::new(params.page, params.page_size, &state.listing.page_limits);

    let listing = state.posts.list(&filter, page).await?;

    Ok(HttpResponse::Ok().json(paginated(listing.map(project))))
}

/// POST /api/posts/
pub async fn create_post(
    state: web::Data<AppState>,
    identity: MaybeIdentity,
    body: web::Json<CreatePostRequest>,
) -> AppResult<HttpResponse> {
    let actor = identity.actor();
    let req = body.into_inner();

    let post = access::create_post(
        &actor,
        PostDraft {
            title: req.title,
            content: req.content,
            published: req.published,
        },
    )?;

    // A valid token can outlive its account.
    let author = state
        .users
        .find_by_id(post.author_id)
        .await?
        .ok_or_else(|| AppError::Unauthorized("Account no longer exists.".to_string()))?;

    let post = state.posts.create(post).await?;
    tracing::info!(post_id = %post.id, author = %author.username, "Post created");

    Ok(HttpResponse::Created().json(project(AuthoredPost { post, author })))
}

/// GET /api/posts/{id}/
pub async fn retrieve_post(
    state: web::Data<AppState>,
    path: web::Path<Uuid>,
) -> AppResult<HttpResponse> {
    let id = path.into_inner();

    let row = state
        .posts
        .find_with_author(id)
        .await?
        .ok_or_else(|| not_found(id))?;

    Ok(HttpResponse::Ok().json(project(row)))
}

/// PUT /api/posts/{id}/
pub async fn replace_post(
    state: web::Data<AppState>,
    identity: MaybeIdentity,
    path: web::Path<Uuid>,
    body: web::Json<ReplacePostRequest>,
) -> AppResult<HttpResponse> {
    let req = body.into_inner();
    let changes = PostChanges {
        title: Some(req.title),
        content: Some(req.content),
        published: req.published,
    };

    let updated = update_post(&state, identity.actor(), path.into_inner(), changes).await?;
    Ok(HttpResponse::Ok().json(updated))
}

/// PATCH /api/posts/{id}/
pub async fn patch_post(
    state: web::Data<AppState>,
    identity: MaybeIdentity,
    path: web::Path<Uuid>,
    body: web::Json<PatchPostRequest>,
) -> AppResult<HttpResponse> {
    let req = body.into_inner();
    let changes = PostChanges {
        title: req.title,
        content: req.content,
        published: req.published,
    };

    let updated = update_post(&state, identity.actor(), path.into_inner(), changes).await?;
    Ok(HttpResponse::Ok().json(updated))
}

async fn update_post(
    state: &AppState,
    actor: Actor,
    id: Uuid,
    changes: PostChanges,
) -> AppResult<PostResponse> {
    access::require_view(&actor, Method::Update)?;

    let AuthoredPost { mut post, author } = state
        .posts
        .find_with_author(id)
        .await?
        .ok_or_else(|| not_found(id))?;

    access::require(&actor, Method::Update, Some(&post))?;

    post.apply(changes)?;
    let post = state.posts.update(post).await?;
    tracing::info!(post_id = %post.id, "Post updated");

    Ok(project(AuthoredPost { post, author }))
}

/// DELETE /api/posts/{id}/
pub async fn delete_post(
    state: web::Data<AppState>,
    identity: MaybeIdentity,
    path: web::Path<Uuid>,
) -> AppResult<HttpResponse> {
    let actor = identity.actor();
    let id = path.into_inner();

    access::require_view(&actor, Method::Delete)?;

    let post = state.posts.find_by_id(id).await?.ok_or_else(|| not_found(id))?;
    access::require(&actor, Method::Delete, Some(&post))?;

    state.posts.delete(id).await?;
    tracing::info!(post_id = %id, "Post deleted");

    Ok(HttpResponse::NoContent().finish())
}
