use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::{AuthoredPost, Post, User};
use crate::error::RepoError;
use crate::query::{PageRequest, Paged, PostFilter};

/// Generic repository trait defining standard CRUD operations.
#[async_trait]
pub trait BaseRepository<T, ID>: Send + Sync {
    /// Find an entity by its unique ID.
    async fn find_by_id(&self, id: ID) -> Result<Option<T>, RepoError>;

    /// Insert a new entity.
    async fn create(&self, entity: T) -> Result<T, RepoError>;

    /// Overwrite an existing entity. Fails with `NotFound` if it is gone.
    async fn update(&self, entity: T) -> Result<T, RepoError>;

    /// Delete an entity by its ID.
    async fn delete(&self, id: ID) -> Result<(), RepoError>;
}

/// User repository.
///
/// `delete` removes the user's posts in the same transaction.
#[async_trait]
pub trait UserRepository: BaseRepository<User, Uuid> {
    /// Find a user by their unique username.
    async fn find_by_username(&self, username: &str) -> Result<Option<User>, RepoError>;

    /// List users, oldest account first.
    async fn list(&self, page: PageRequest) -> Result<Paged<User>, RepoError>;
}

/// Post repository.
#[async_trait]
pub trait PostRepository: BaseRepository<Post, Uuid> {
    /// Fetch a post joined with its author.
    async fn find_with_author(&self, id: Uuid) -> Result<Option<AuthoredPost>, RepoError>;

    /// List posts matching `filter`, newest first.
    async fn list(
        &self,
        filter: &PostFilter,
        page: PageRequest,
    ) -> Result<Paged<AuthoredPost>, RepoError>;
}
