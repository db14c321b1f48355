//! HTTP handlers and the routing table.

mod auth;
mod health;
mod posts;
mod users;

#[cfg(test)]
mod tests;

use actix_web::web;
use quill_core::query::Paged;
use quill_shared::Paginated;

use crate::middleware::error::AppError;

/// Configure all application routes.
///
/// | Method          | Path                 | Handler               |
/// |-----------------|----------------------|-----------------------|
/// | GET             | /api/health/         | `health::health_check`|
/// | POST            | /api/auth/register/  | `auth::register`      |
/// | POST            | /api/auth/login/     | `auth::login`         |
/// | GET             | /api/auth/me/        | `auth::me`            |
/// | GET             | /api/posts/       | `posts::list_posts`   |
/// | POST            | /api/posts/       | `posts::create_post`  |
/// | GET             | /api/posts/{id}/  | `posts::retrieve_post`|
/// | PUT             | /api/posts/{id}/  | `posts::replace_post` |
/// | PATCH           | /api/posts/{id}/  | `posts::patch_post`   |
/// | DELETE          | /api/posts/{id}/  | `posts::delete_post`  |
/// | GET             | /api/users/       | `users::list_users`   |
/// | GET             | /api/users/{id}/  | `users::retrieve_user`|
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.app_data(web::JsonConfig::default().error_handler(|err, _req| {
        AppError::BadRequest(err.to_string()).into()
    }))
    .app_data(web::QueryConfig::default().error_handler(|err, _req| {
        AppError::BadRequest(err.to_string()).into()
    }))
    .service(
        web::scope("/api")
            .route("/health/", web::get().to(health::health_check))
            .service(
                web::scope("/auth")
                    .route("/register/", web::post().to(auth::register))
                    .route("/login/", web::post().to(auth::login))
                    .route("/me/", web::get().to(auth::me)),
            )
            .service(
                web::resource("/posts/")
                    .route(web::get().to(posts::list_posts))
                    .route(web::post().to(posts::create_post)),
            )
            .service(
                web::resource("/posts/{id}/")
                    .route(web::get().to(posts::retrieve_post))
                    .route(web::put().to(posts::replace_post))
                    .route(web::patch().to(posts::patch_post))
                    .route(web::delete().to(posts::delete_post)),
            )
            .service(web::resource("/users/").route(web::get().to(users::list_users)))
            .service(web::resource("/users/{id}/").route(web::get().to(users::retrieve_user))),
    );
}

/// Wrap a store page in the wire envelope.
fn paginated<T>(paged: Paged<T>) -> Paginated<T> {
    Paginated {
        count: paged.total,
        page: paged.page.page,
        page_size: paged.page.page_size,
        results: paged.items,
    }
}
