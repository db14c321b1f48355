//! HTTP-level tests against the in-memory store.

use std::sync::Arc;

use actix_web::http::StatusCode;
use actix_web::middleware::{NormalizePath, TrailingSlash};
use actix_web::{App, test, web};
use chrono::{Duration, Utc};
use serde_json::json;
use uuid::Uuid;

use quill_core::domain::{Post, PostDraft, User};
use quill_core::ports::{BaseRepository, TokenService, UserRepository};
use quill_core::query::PublishedFilterMode;
use quill_infra::{Argon2PasswordService, InMemoryStore, JwtConfig, JwtTokenService};
use quill_shared::Paginated;
use quill_shared::dto::{AuthResponse, PostResponse, UserResponse};

use super::auth::roles_for;
use super::configure_routes;
use crate::config::ListingConfig;
use crate::state::AppState;

struct TestContext {
    state: AppState,
}

impl TestContext {
    fn new() -> Self {
        Self::with_listing(ListingConfig::default())
    }

    fn with_listing(listing: ListingConfig) -> Self {
        let tokens: Arc<dyn TokenService> = Arc::new(JwtTokenService::new(JwtConfig {
            secret: "test-secret".to_string(),
            expiration_hours: 1,
            issuer: "quill-test".to_string(),
        }));
        let state = AppState::in_memory(
            &InMemoryStore::new(),
            tokens,
            Arc::new(Argon2PasswordService::new()),
            listing,
        );
        Self { state }
    }

    /// Seed an account and return it with a ready-to-send Authorization value.
    async fn account(&self, username: &str, is_admin: bool) -> (User, String) {
        let email = format!("{}@example.com", username);
        let user = if is_admin {
            User::admin(username.to_string(), email, "unused".to_string())
        } else {
            User::new(username.to_string(), email, "unused".to_string())
        };
        let user = self.state.users.create(user).await.unwrap();

        let token = self
            .state
            .tokens
            .generate_token(user.id, &user.username, roles_for(&user))
            .unwrap();
        (user, format!("Bearer {}", token))
    }

    async fn post(&self, author: &User, title: &str, published: bool, age_minutes: i64) -> Post {
        let mut post = Post::new(
            author.id,
            PostDraft {
                title: title.to_string(),
                content: format!("{} body", title),
                published,
            },
        );
        post.created_at = Utc::now() - Duration::minutes(age_minutes);
        post.updated_at = post.created_at;
        self.state.posts.create(post).await.unwrap()
    }
}

macro_rules! init_app {
    ($ctx:expr) => {
        test::init_service(
            App::new()
                .wrap(NormalizePath::new(TrailingSlash::Always))
                .app_data(web::Data::new($ctx.state.clone()))
                .configure(configure_routes),
        )
        .await
    };
}

fn titles(page: &Paginated<PostResponse>) -> Vec<&str> {
    page.results.iter().map(|p| p.title.as_str()).collect()
}

#[actix_web::test]
async fn test_health() {
    let ctx = TestContext::new();
    let app = init_app!(ctx);

    let req = test::TestRequest::get().uri("/api/health/").to_request();
    let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;

    assert_eq!(body["status"], "ok");
}

#[actix_web::test]
async fn test_list_is_public_and_newest_first() {
    let ctx = TestContext::new();
    let (alice, _) = ctx.account("alice", false).await;
    ctx.post(&alice, "first", true, 20).await;
    ctx.post(&alice, "second", false, 10).await;
    let app = init_app!(ctx);

    let req = test::TestRequest::get().uri("/api/posts/").to_request();
    let page: Paginated<PostResponse> = test::call_and_read_body_json(&app, req).await;

    assert_eq!(page.count, 2);
    assert_eq!(titles(&page), vec!["second", "first"]);
    assert_eq!(page.results[0].author, alice.id);
    assert_eq!(page.results[0].author_username, "alice");
}

#[actix_web::test]
async fn test_paths_without_trailing_slash_are_routed() {
    let ctx = TestContext::new();
    let (alice, _) = ctx.account("alice", false).await;
    let post = ctx.post(&alice, "only", true, 1).await;
    let app = init_app!(ctx);

    let req = test::TestRequest::get().uri("/api/posts?author=alice").to_request();
    let page: Paginated<PostResponse> = test::call_and_read_body_json(&app, req).await;
    assert_eq!(titles(&page), vec!["only"]);

    let req = test::TestRequest::get()
        .uri(&format!("/api/posts/{}", post.id))
        .to_request();
    let fetched: PostResponse = test::call_and_read_body_json(&app, req).await;
    assert_eq!(fetched.id, post.id);
}

#[actix_web::test]
async fn test_list_published_filter_is_lenient() {
    let ctx = TestContext::new();
    let (alice, _) = ctx.account("alice", false).await;
    ctx.post(&alice, "draft", false, 2).await;
    ctx.post(&alice, "live", true, 1).await;
    let app = init_app!(ctx);

    for (query, expected) in [
        ("published=true", vec!["live"]),
        ("published=TRUE", vec!["live"]),
        ("published=%20true", vec!["draft"]),
        ("published=false", vec!["draft"]),
        ("published=bogus", vec!["draft"]),
    ] {
        let req = test::TestRequest::get()
            .uri(&format!("/api/posts/?{}", query))
            .to_request();
        let page: Paginated<PostResponse> = test::call_and_read_body_json(&app, req).await;
        assert_eq!(titles(&page), expected, "query {}", query);
    }
}

#[actix_web::test]
async fn test_list_published_filter_strict_mode_ignores_garbage() {
    let ctx = TestContext::with_listing(ListingConfig {
        published_mode: PublishedFilterMode::Strict,
        ..ListingConfig::default()
    });
    let (alice, _) = ctx.account("alice", false).await;
    ctx.post(&alice, "draft", false, 2).await;
    ctx.post(&alice, "live", true, 1).await;
    let app = init_app!(ctx);

    let req = test::TestRequest::get()
        .uri("/api/posts/?published=bogus")
        .to_request();
    let page: Paginated<PostResponse> = test::call_and_read_body_json(&app, req).await;

    assert_eq!(titles(&page), vec!["live", "draft"]);
}

#[actix_web::test]
async fn test_list_by_author() {
    let ctx = TestContext::new();
    let (alice, _) = ctx.account("alice", false).await;
    let (bob, _) = ctx.account("bob", false).await;
    ctx.post(&alice, "alice old", true, 30).await;
    ctx.post(&bob, "bob", true, 20).await;
    ctx.post(&alice, "alice new", false, 10).await;
    let app = init_app!(ctx);

    let req = test::TestRequest::get()
        .uri("/api/posts/?author=alice")
        .to_request();
    let page: Paginated<PostResponse> = test::call_and_read_body_json(&app, req).await;

    assert_eq!(titles(&page), vec!["alice new", "alice old"]);

    let req = test::TestRequest::get()
        .uri("/api/posts/?author=nobody")
        .to_request();
    let page: Paginated<PostResponse> = test::call_and_read_body_json(&app, req).await;
    assert_eq!(page.count, 0);
}

#[actix_web::test]
async fn test_list_pagination() {
    let ctx = TestContext::new();
    let (alice, _) = ctx.account("alice", false).await;
    for age in 1..=5 {
        ctx.post(&alice, &format!("post {}", age), true, age).await;
    }
    let app = init_app!(ctx);

    let req = test::TestRequest::get()
        .uri("/api/posts/?page=3&page_size=2")
        .to_request();
    let page: Paginated<PostResponse> = test::call_and_read_body_json(&app, req).await;

    assert_eq!(page.count, 5);
    assert_eq!(page.page, 3);
    assert_eq!(titles(&page), vec!["post 5"]);
}

#[actix_web::test]
async fn test_anonymous_create_is_rejected() {
    let ctx = TestContext::new();
    let app = init_app!(ctx);

    let req = test::TestRequest::post()
        .uri("/api/posts/")
        .set_json(json!({ "title": "Hello", "content": "World" }))
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

    let req = test::TestRequest::get().uri("/api/posts/").to_request();
    let page: Paginated<PostResponse> = test::call_and_read_body_json(&app, req).await;
    assert_eq!(page.count, 0);
}

#[actix_web::test]
async fn test_create_forces_author_to_caller() {
    let ctx = TestContext::new();
    let (alice, alice_auth) = ctx.account("alice", false).await;
    let (bob, _) = ctx.account("bob", false).await;
    let app = init_app!(ctx);

    let req = test::TestRequest::post()
        .uri("/api/posts/")
        .insert_header(("Authorization", alice_auth))
        .set_json(json!({
            "title": "Hello",
            "content": "World",
            "author": bob.id,
            "author_username": "bob",
            "created_at": "2001-01-01T00:00:00Z",
        }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CREATED);

    let created: PostResponse = test::read_body_json(resp).await;
    assert_eq!(created.author, alice.id);
    assert_eq!(created.author_username, "alice");
    assert!(!created.published);
    assert!(created.created_at > Utc::now() - Duration::minutes(1));

    let req = test::TestRequest::get()
        .uri(&format!("/api/posts/{}/", created.id))
        .to_request();
    let fetched: PostResponse = test::call_and_read_body_json(&app, req).await;
    assert_eq!(fetched.author, alice.id);
}

#[actix_web::test]
async fn test_create_rejects_blank_title() {
    let ctx = TestContext::new();
    let (_, auth) = ctx.account("alice", false).await;
    let app = init_app!(ctx);

    let req = test::TestRequest::post()
        .uri("/api/posts/")
        .insert_header(("Authorization", auth.clone()))
        .set_json(json!({ "title": "   ", "content": "World" }))
        .to_request();
    assert_eq!(
        test::call_service(&app, req).await.status(),
        StatusCode::BAD_REQUEST
    );

    let req = test::TestRequest::post()
        .uri("/api/posts/")
        .insert_header(("Authorization", auth))
        .set_json(json!({ "content": "no title" }))
        .to_request();
    assert_eq!(
        test::call_service(&app, req).await.status(),
        StatusCode::BAD_REQUEST
    );
}

#[actix_web::test]
async fn test_invalid_token_is_rejected() {
    let ctx = TestContext::new();
    let app = init_app!(ctx);

    let req = test::TestRequest::post()
        .uri("/api/posts/")
        .insert_header(("Authorization", "Bearer not-a-token"))
        .set_json(json!({ "title": "Hello", "content": "World" }))
        .to_request();

    assert_eq!(
        test::call_service(&app, req).await.status(),
        StatusCode::UNAUTHORIZED
    );
}

#[actix_web::test]
async fn test_retrieve_missing_post() {
    let ctx = TestContext::new();
    let app = init_app!(ctx);

    let req = test::TestRequest::get()
        .uri(&format!("/api/posts/{}/", Uuid::new_v4()))
        .to_request();

    assert_eq!(
        test::call_service(&app, req).await.status(),
        StatusCode::NOT_FOUND
    );
}

#[actix_web::test]
async fn test_only_author_can_update() {
    let ctx = TestContext::new();
    let (alice, alice_auth) = ctx.account("alice", false).await;
    let (_, bob_auth) = ctx.account("bob", false).await;
    let (_, admin_auth) = ctx.account("root", true).await;
    let post = ctx.post(&alice, "original", false, 5).await;
    let app = init_app!(ctx);
    let uri = format!("/api/posts/{}/", post.id);

    for auth in [bob_auth, admin_auth] {
        let req = test::TestRequest::patch()
            .uri(&uri)
            .insert_header(("Authorization", auth))
            .set_json(json!({ "title": "hijacked" }))
            .to_request();
        assert_eq!(
            test::call_service(&app, req).await.status(),
            StatusCode::FORBIDDEN
        );
    }

    let req = test::TestRequest::patch()
        .uri(&uri)
        .set_json(json!({ "title": "hijacked" }))
        .to_request();
    assert_eq!(
        test::call_service(&app, req).await.status(),
        StatusCode::UNAUTHORIZED
    );

    let req = test::TestRequest::patch()
        .uri(&uri)
        .insert_header(("Authorization", alice_auth.clone()))
        .set_json(json!({ "published": true }))
        .to_request();
    let patched: PostResponse = test::call_and_read_body_json(&app, req).await;
    assert!(patched.published);
    assert_eq!(patched.title, "original");
    assert_eq!(patched.created_at, post.created_at);
    assert!(patched.updated_at > post.updated_at);

    let req = test::TestRequest::put()
        .uri(&uri)
        .insert_header(("Authorization", alice_auth))
        .set_json(json!({ "title": "rewritten", "content": "new body" }))
        .to_request();
    let replaced: PostResponse = test::call_and_read_body_json(&app, req).await;
    assert_eq!(replaced.title, "rewritten");
    assert!(replaced.published);
    assert_eq!(replaced.author, alice.id);
}

#[actix_web::test]
async fn test_update_missing_post() {
    let ctx = TestContext::new();
    let (_, auth) = ctx.account("alice", false).await;
    let app = init_app!(ctx);
    let uri = format!("/api/posts/{}/", Uuid::new_v4());

    let req = test::TestRequest::patch()
        .uri(&uri)
        .insert_header(("Authorization", auth))
        .set_json(json!({ "title": "x" }))
        .to_request();
    assert_eq!(
        test::call_service(&app, req).await.status(),
        StatusCode::NOT_FOUND
    );

    let req = test::TestRequest::patch()
        .uri(&uri)
        .set_json(json!({ "title": "x" }))
        .to_request();
    assert_eq!(
        test::call_service(&app, req).await.status(),
        StatusCode::UNAUTHORIZED
    );
}

#[actix_web::test]
async fn test_only_author_can_delete() {
    let ctx = TestContext::new();
    let (alice, alice_auth) = ctx.account("alice", false).await;
    let (_, bob_auth) = ctx.account("bob", false).await;
    let post = ctx.post(&alice, "doomed", true, 1).await;
    let app = init_app!(ctx);
    let uri = format!("/api/posts/{}/", post.id);

    let req = test::TestRequest::delete()
        .uri(&uri)
        .insert_header(("Authorization", bob_auth))
        .to_request();
    assert_eq!(
        test::call_service(&app, req).await.status(),
        StatusCode::FORBIDDEN
    );

    let req = test::TestRequest::delete()
        .uri(&uri)
        .insert_header(("Authorization", alice_auth))
        .to_request();
    assert_eq!(
        test::call_service(&app, req).await.status(),
        StatusCode::NO_CONTENT
    );

    let req = test::TestRequest::get().uri(&uri).to_request();
    assert_eq!(
        test::call_service(&app, req).await.status(),
        StatusCode::NOT_FOUND
    );
}

#[actix_web::test]
async fn test_user_listing_requires_admin() {
    let ctx = TestContext::new();
    let (alice, alice_auth) = ctx.account("alice", false).await;
    let (_, admin_auth) = ctx.account("root", true).await;
    let app = init_app!(ctx);

    let req = test::TestRequest::get().uri("/api/users/").to_request();
    assert_eq!(
        test::call_service(&app, req).await.status(),
        StatusCode::UNAUTHORIZED
    );

    let req = test::TestRequest::get()
        .uri("/api/users/")
        .insert_header(("Authorization", alice_auth.clone()))
        .to_request();
    assert_eq!(
        test::call_service(&app, req).await.status(),
        StatusCode::FORBIDDEN
    );

    let req = test::TestRequest::get()
        .uri(&format!("/api/users/{}/", alice.id))
        .insert_header(("Authorization", alice_auth))
        .to_request();
    assert_eq!(
        test::call_service(&app, req).await.status(),
        StatusCode::FORBIDDEN
    );

    let req = test::TestRequest::get()
        .uri("/api/users/")
        .insert_header(("Authorization", admin_auth.clone()))
        .to_request();
    let page: Paginated<UserResponse> = test::call_and_read_body_json(&app, req).await;
    assert_eq!(page.count, 2);

    let req = test::TestRequest::get()
        .uri(&format!("/api/users/{}/", alice.id))
        .insert_header(("Authorization", admin_auth.clone()))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body: serde_json::Value = test::read_body_json(resp).await;
    assert_eq!(body["username"], "alice");
    assert!(body.get("password_hash").is_none());

    let req = test::TestRequest::get()
        .uri(&format!("/api/users/{}/", Uuid::new_v4()))
        .insert_header(("Authorization", admin_auth))
        .to_request();
    assert_eq!(
        test::call_service(&app, req).await.status(),
        StatusCode::NOT_FOUND
    );
}

#[actix_web::test]
async fn test_deleting_user_removes_their_posts() {
    let ctx = TestContext::new();
    let (alice, _) = ctx.account("alice", false).await;
    let (bob, _) = ctx.account("bob", false).await;
    ctx.post(&alice, "alice post", true, 2).await;
    ctx.post(&bob, "bob post", true, 1).await;
    let app = init_app!(ctx);

    ctx.state.users.delete(alice.id).await.unwrap();

    let req = test::TestRequest::get().uri("/api/posts/").to_request();
    let page: Paginated<PostResponse> = test::call_and_read_body_json(&app, req).await;
    assert_eq!(titles(&page), vec!["bob post"]);
}

#[actix_web::test]
async fn test_register_login_me() {
    let ctx = TestContext::new();
    let app = init_app!(ctx);

    let req = test::TestRequest::post()
        .uri("/api/auth/register/")
        .set_json(json!({
            "username": "carol",
            "email": "carol@example.com",
            "password": "long-enough-password",
        }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CREATED);

    let req = test::TestRequest::post()
        .uri("/api/auth/register/")
        .set_json(json!({
            "username": "carol",
            "email": "other@example.com",
            "password": "another-password",
        }))
        .to_request();
    assert_eq!(
        test::call_service(&app, req).await.status(),
        StatusCode::CONFLICT
    );

    let req = test::TestRequest::post()
        .uri("/api/auth/login/")
        .set_json(json!({ "username": "carol", "password": "wrong-password" }))
        .to_request();
    assert_eq!(
        test::call_service(&app, req).await.status(),
        StatusCode::UNAUTHORIZED
    );

    let req = test::TestRequest::post()
        .uri("/api/auth/login/")
        .set_json(json!({ "username": "carol", "password": "long-enough-password" }))
        .to_request();
    let auth: AuthResponse = test::call_and_read_body_json(&app, req).await;
    assert_eq!(auth.token_type, "Bearer");

    let req = test::TestRequest::get()
        .uri("/api/auth/me/")
        .insert_header(("Authorization", format!("Bearer {}", auth.access_token)))
        .to_request();
    let me: UserResponse = test::call_and_read_body_json(&app, req).await;
    assert_eq!(me.username, "carol");

    // Freshly registered accounts are not administrators.
    let req = test::TestRequest::get()
        .uri("/api/users/")
        .insert_header(("Authorization", format!("Bearer {}", auth.access_token)))
        .to_request();
    assert_eq!(
        test::call_service(&app, req).await.status(),
        StatusCode::FORBIDDEN
    );
}

#[actix_web::test]
async fn test_register_validation() {
    let ctx = TestContext::new();
    let app = init_app!(ctx);

    for body in [
        json!({ "username": "", "email": "a@b.c", "password": "long-enough" }),
        json!({ "username": "has space", "email": "a@b.c", "password": "long-enough" }),
        json!({ "username": "dave", "email": "not-an-email", "password": "long-enough" }),
        json!({ "username": "dave", "email": "a@b.c", "password": "short" }),
    ] {
        let req = test::TestRequest::post()
            .uri("/api/auth/register/")
            .set_json(body)
            .to_request();
        assert_eq!(
            test::call_service(&app, req).await.status(),
            StatusCode::BAD_REQUEST
        );
    }
}

#[actix_web::test]
async fn test_ensure_admin_is_idempotent() {
    let ctx = TestContext::new();
    let admin = crate::config::AdminBootstrap {
        username: "root".to_string(),
        email: "root@example.com".to_string(),
        password: "bootstrap-password".to_string(),
    };

    ctx.state.ensure_admin(&admin).await.unwrap();
    ctx.state.ensure_admin(&admin).await.unwrap();

    let user = ctx
        .state
        .users
        .find_by_username("root")
        .await
        .unwrap()
        .unwrap();
    assert!(user.is_admin);
}

#[actix_web::test]
async fn test_ensure_admin_does_not_promote_existing_account() {
    let ctx = TestContext::new();
    ctx.account("root", false).await;
    let admin = crate::config::AdminBootstrap {
        username: "root".to_string(),
        email: "root@example.com".to_string(),
        password: "bootstrap-password".to_string(),
    };

    ctx.state.ensure_admin(&admin).await.unwrap();

    let user = ctx
        .state
        .users
        .find_by_username("root")
        .await
        .unwrap()
        .unwrap();
    assert!(!user.is_admin);
    assert_eq!(user.email, "root@example.com");
}
