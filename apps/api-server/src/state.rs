//! Application state - shared across all handlers.

use std::sync::Arc;

use quill_core::domain::User;
use quill_core::ports::{
    BaseRepository, PasswordService, PostRepository, TokenService, UserRepository,
};
use quill_infra::{Argon2PasswordService, InMemoryStore, JwtTokenService};

use crate::config::{AdminBootstrap, AppConfig, ListingConfig};
use crate::middleware::error::AppResult;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub users: Arc<dyn UserRepository>,
    pub posts: Arc<dyn PostRepository>,
    pub tokens: Arc<dyn TokenService>,
    pub passwords: Arc<dyn PasswordService>,
    pub listing: ListingConfig,
}

impl AppState {
    /// Build the application state with appropriate implementations.
    pub async fn new(config: &AppConfig) -> std::io::Result<Self> {
        let tokens: Arc<dyn TokenService> = Arc::new(JwtTokenService::from_env());
        let passwords: Arc<dyn PasswordService> = Arc::new(Argon2PasswordService::new());

        #[cfg(feature = "postgres")]
        let state = match &config.database {
            Some(db_config) => match quill_infra::database::connect(db_config).await {
                Ok(conn) => {
                    if config.run_migrations {
                        use migration::MigratorTrait;

                        migration::Migrator::up(&conn, None)
                            .await
                            .map_err(|e| std::io::Error::other(e.to_string()))?;
                        tracing::info!("Migrations applied");
                    }

                    Self {
                        users: Arc::new(quill_infra::database::PostgresUserRepository::new(
                            conn.clone(),
                        )),
                        posts: Arc::new(quill_infra::database::PostgresPostRepository::new(conn)),
                        tokens,
                        passwords,
                        listing: config.listing,
                    }
                }
                Err(e) => {
                    tracing::error!(
                        "Failed to connect to database: {}. Using in-memory fallback.",
                        e
                    );
                    Self::in_memory(&InMemoryStore::new(), tokens, passwords, config.listing)
                }
            },
            None => {
                tracing::warn!("DATABASE_URL not set. Running without database (in-memory mode).");
                Self::in_memory(&InMemoryStore::new(), tokens, passwords, config.listing)
            }
        };

        #[cfg(not(feature = "postgres"))]
        let state = {
            tracing::info!("Running without postgres feature - using in-memory store");
            Self::in_memory(&InMemoryStore::new(), tokens, passwords, config.listing)
        };

        tracing::info!(
            published_mode = ?config.listing.published_mode,
            "Application state initialized"
        );

        Ok(state)
    }

    /// State backed by an in-memory store.
    pub fn in_memory(
        store: &InMemoryStore,
        tokens: Arc<dyn TokenService>,
        passwords: Arc<dyn PasswordService>,
        listing: ListingConfig,
    ) -> Self {
        Self {
            users: Arc::new(store.users()),
            posts: Arc::new(store.posts()),
            tokens,
            passwords,
            listing,
        }
    }

    /// Create the configured administrator unless the username already exists.
    pub async fn ensure_admin(&self, admin: &AdminBootstrap) -> AppResult<()> {
        if let Some(existing) = self.users.find_by_username(&admin.username).await? {
            if existing.is_admin {
                tracing::debug!(username = %admin.username, "Admin account already present");
            } else {
                tracing::warn!(
                    username = %admin.username,
                    user_id = %existing.id,
                    "ADMIN_USERNAME belongs to a non-admin account; it was not promoted"
                );
            }
            return Ok(());
        }

        let hash = self.passwords.hash(&admin.password)?;
        let user = User::admin(admin.username.clone(), admin.email.clone(), hash);
        let user = self.users.create(user).await?;

        tracing::info!(user_id = %user.id, username = %user.username, "Admin account created");
        Ok(())
    }
}
