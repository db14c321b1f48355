//! Application configuration loaded from environment variables.

use std::env;
use std::str::FromStr;

use quill_core::query::{PageLimits, PublishedFilterMode};
use quill_infra::DatabaseConfig;

/// Application configuration.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub database: Option<DatabaseConfig>,
    pub run_migrations: bool,
    pub listing: ListingConfig,
    pub admin: Option<AdminBootstrap>,
}

/// Knobs for list endpoints.
#[derive(Debug, Clone, Copy, Default)]
pub struct ListingConfig {
    pub page_limits: PageLimits,
    pub published_mode: PublishedFilterMode,
}

/// Administrator account ensured at startup.
#[derive(Clone)]
pub struct AdminBootstrap {
    pub username: String,
    pub email: String,
    pub password: String,
}

impl std::fmt::Debug for AdminBootstrap {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AdminBootstrap")
            .field("username", &self.username)
            .field("email", &self.email)
            .finish_non_exhaustive()
    }
}

impl AppConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        let database = env::var("DATABASE_URL").ok().map(|url| DatabaseConfig {
            url,
            max_connections: parse_or("DB_MAX_CONNECTIONS", 20),
            min_connections: parse_or("DB_MIN_CONNECTIONS", 2),
        });

        let defaults = PageLimits::default();
        let default_size = parse_or("DEFAULT_PAGE_SIZE", defaults.default_size);
        let page_limits = PageLimits::new(default_size, parse_or("MAX_PAGE_SIZE", defaults.max_size));
        if page_limits.default_size != default_size {
            tracing::warn!(
                requested = default_size,
                effective = page_limits.default_size,
                "DEFAULT_PAGE_SIZE clamped to 1..=MAX_PAGE_SIZE"
            );
        }
        let listing = ListingConfig {
            page_limits,
            published_mode: Self::published_mode(),
        };

        let admin = match (env::var("ADMIN_USERNAME"), env::var("ADMIN_PASSWORD")) {
            (Ok(username), Ok(password)) => Some(AdminBootstrap {
                email: env::var("ADMIN_EMAIL")
                    .unwrap_or_else(|_| format!("{}@localhost", username)),
                username,
                password,
            }),
            _ => None,
        };

        Self {
            host: env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string()),
            port: parse_or("PORT", 8080),
            database,
            run_migrations: env::var("RUN_MIGRATIONS")
                .map(|v| v == "true" || v == "1")
                .unwrap_or(false),
            listing,
            admin,
        }
    }

    fn published_mode() -> PublishedFilterMode {
        match env::var("PUBLISHED_FILTER_MODE") {
            Ok(raw) => raw.parse().unwrap_or_else(|e| {
                tracing::warn!("{}; falling back to lenient", e);
                PublishedFilterMode::Lenient
            }),
            Err(_) => PublishedFilterMode::Lenient,
        }
    }
}

fn parse_or<T: FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(default)
}
