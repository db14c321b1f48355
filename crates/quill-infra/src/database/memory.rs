//! In-memory post store - used when no database is configured, and in tests.
//!
//! Users and posts live behind a single `RwLock`; holding the write guard is
//! the transaction, so a cascading user delete is atomic.
//! Note: Data is lost on process restart.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;
use uuid::Uuid;

use quill_core::domain::{AuthoredPost, Post, User};
use quill_core::error::RepoError;
use quill_core::ports::{BaseRepository, PostRepository, UserRepository};
use quill_core::query::{PageRequest, Paged, PostFilter, PostOrder};

/// Rows are kept in insertion order.
#[derive(Default)]
struct Tables {
    users: Vec<User>,
    posts: Vec<Post>,
}

/// Shared in-memory store handing out user and post repositories.
#[derive(Clone, Default)]
pub struct InMemoryStore {
    tables: Arc<RwLock<Tables>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn users(&self) -> InMemoryUserRepository {
        InMemoryUserRepository {
            tables: self.tables.clone(),
        }
    }

    pub fn posts(&self) -> InMemoryPostRepository {
        InMemoryPostRepository {
            tables: self.tables.clone(),
        }
    }
}

pub struct InMemoryUserRepository {
    tables: Arc<RwLock<Tables>>,
}

pub struct InMemoryPostRepository {
    tables: Arc<RwLock<Tables>>,
}

#[async_trait]
impl BaseRepository<User, Uuid> for InMemoryUserRepository {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, RepoError> {
        let tables = self.tables.read().await;
        Ok(tables.users.iter().find(|u| u.id == id).cloned())
    }

    async fn create(&self, user: User) -> Result<User, RepoError> {
        let mut tables = self.tables.write().await;

        if tables.users.iter().any(|u| u.id == user.id) {
            return Err(RepoError::Constraint("user id already exists".to_string()));
        }
        if tables.users.iter().any(|u| u.username == user.username) {
            return Err(RepoError::Constraint("username already taken".to_string()));
        }

        tables.users.push(user.clone());
        Ok(user)
    }

    async fn update(&self, user: User) -> Result<User, RepoError> {
        let mut tables = self.tables.write().await;

        if tables
            .users
            .iter()
            .any(|u| u.username == user.username && u.id != user.id)
        {
            return Err(RepoError::Constraint("username already taken".to_string()));
        }

        let slot = tables
            .users
            .iter_mut()
            .find(|u| u.id == user.id)
            .ok_or(RepoError::NotFound)?;
        *slot = user.clone();
        Ok(user)
    }

    async fn delete(&self, id: Uuid) -> Result<(), RepoError> {
        let mut tables = self.tables.write().await;

        let index = tables
            .users
            .iter()
            .position(|u| u.id == id)
            .ok_or(RepoError::NotFound)?;
        tables.users.remove(index);

        let before = tables.posts.len();
        tables.posts.retain(|p| p.author_id != id);
        tracing::debug!(
            user_id = %id,
            posts_removed = before - tables.posts.len(),
            "User deleted together with their posts"
        );

        Ok(())
    }
}

#[async_trait]
impl UserRepository for InMemoryUserRepository {
    async fn find_by_username(&self, username: &str) -> Result<Option<User>, RepoError> {
        let tables = self.tables.read().await;
        Ok(tables.users.iter().find(|u| u.username == username).cloned())
    }

    async fn list(&self, page: PageRequest) -> Result<Paged<User>, RepoError> {
        let tables = self.tables.read().await;

        let mut users = tables.users.clone();
        users.sort_by_key(|u| u.date_joined);

        Ok(Paged::from_ordered(users, page))
    }
}

#[async_trait]
impl BaseRepository<Post, Uuid> for InMemoryPostRepository {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Post>, RepoError> {
        let tables = self.tables.read().await;
        Ok(tables.posts.iter().find(|p| p.id == id).cloned())
    }

    async fn create(&self, post: Post) -> Result<Post, RepoError> {
        let mut tables = self.tables.write().await;

        if !tables.users.iter().any(|u| u.id == post.author_id) {
            return Err(RepoError::Constraint("author does not exist".to_string()));
        }
        if tables.posts.iter().any(|p| p.id == post.id) {
            return Err(RepoError::Constraint("post id already exists".to_string()));
        }

        tables.posts.push(post.clone());
        Ok(post)
    }

    async fn update(&self, post: Post) -> Result<Post, RepoError> {
        let mut tables = self.tables.write().await;

        let slot = tables
            .posts
            .iter_mut()
            .find(|p| p.id == post.id)
            .ok_or(RepoError::NotFound)?;
        *slot = post.clone();
        Ok(post)
    }

    async fn delete(&self, id: Uuid) -> Result<(), RepoError> {
        let mut tables = self.tables.write().await;

        let index = tables
            .posts
            .iter()
            .position(|p| p.id == id)
            .ok_or(RepoError::NotFound)?;
        tables.posts.remove(index);
        Ok(())
    }
}

#[async_trait]
impl PostRepository for InMemoryPostRepository {
    async fn find_with_author(&self, id: Uuid) -> Result<Option<AuthoredPost>, RepoError> {
        let tables = self.tables.read().await;

        let Some(post) = tables.posts.iter().find(|p| p.id == id) else {
            return Ok(None);
        };
        let author = tables
            .users
            .iter()
            .find(|u| u.id == post.author_id)
            .ok_or_else(|| RepoError::Query(format!("post {} references a missing author", id)))?;

        Ok(Some(AuthoredPost {
            post: post.clone(),
            author: author.clone(),
        }))
    }

    async fn list(
        &self,
        filter: &PostFilter,
        page: PageRequest,
    ) -> Result<Paged<AuthoredPost>, RepoError> {
        let tables = self.tables.read().await;
        let authors: HashMap<Uuid, &User> = tables.users.iter().map(|u| (u.id, u)).collect();

        // Newest insertion first so equal timestamps still list newest first.
        let mut rows: Vec<AuthoredPost> = tables
            .posts
            .iter()
            .rev()
            .filter_map(|post| {
                let author = authors.get(&post.author_id)?;
                filter.matches(post, author).then(|| AuthoredPost {
                    post: post.clone(),
                    author: (*author).clone(),
                })
            })
            .collect();

        match filter.order {
            PostOrder::NewestFirst => {
                rows.sort_by(|a, b| b.post.created_at.cmp(&a.post.created_at));
            }
        }

        Ok(Paged::from_ordered(rows, page))
    }
}
