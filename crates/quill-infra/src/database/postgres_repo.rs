//! PostgreSQL repository implementations.

use async_trait::async_trait;
use sea_orm::{
    ColumnTrait, DbConn, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder,
    SelectTwo, TransactionTrait,
};
use uuid::Uuid;

use quill_core::domain::{AuthoredPost, Post, User};
use quill_core::error::RepoError;
use quill_core::ports::{BaseRepository, PostRepository, UserRepository};
use quill_core::query::{PageRequest, Paged, PostFilter, PostOrder};

use super::entity::post::{self, Entity as PostEntity};
use super::entity::user::{self, Entity as UserEntity};
use super::postgres_base::{PostgresBaseRepository, query_error};

/// PostgreSQL post repository.
pub type PostgresPostRepository = PostgresBaseRepository<PostEntity>;

/// PostgreSQL user repository.
///
/// Deleting a user removes their posts in the same transaction.
pub struct PostgresUserRepository {
    base: PostgresBaseRepository<UserEntity>,
}

impl PostgresUserRepository {
    pub fn new(db: DbConn) -> Self {
        Self {
            base: PostgresBaseRepository::new(db),
        }
    }
}

#[async_trait]
impl BaseRepository<User, Uuid> for PostgresUserRepository {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, RepoError> {
        BaseRepository::<User, Uuid>::find_by_id(&self.base, id).await
    }

    async fn create(&self, user: User) -> Result<User, RepoError> {
        BaseRepository::<User, Uuid>::create(&self.base, user).await
    }

    async fn update(&self, user: User) -> Result<User, RepoError> {
        BaseRepository::<User, Uuid>::update(&self.base, user).await
    }

    async fn delete(&self, id: Uuid) -> Result<(), RepoError> {
        let txn = self.base.db.begin().await.map_err(query_error)?;

        let posts = PostEntity::delete_many()
            .filter(post::Column::AuthorId.eq(id))
            .exec(&txn)
            .await
            .map_err(query_error)?;

        let users = UserEntity::delete_by_id(id)
            .exec(&txn)
            .await
            .map_err(query_error)?;

        if users.rows_affected == 0 {
            txn.rollback().await.map_err(query_error)?;
            return Err(RepoError::NotFound);
        }

        txn.commit().await.map_err(query_error)?;
        tracing::info!(
            user_id = %id,
            posts_removed = posts.rows_affected,
            "User deleted together with their posts"
        );

        Ok(())
    }
}

#[async_trait]
impl UserRepository for PostgresUserRepository {
    async fn find_by_username(&self, username: &str) -> Result<Option<User>, RepoError> {
        tracing::debug!(username, "Finding user by username");

        let result = UserEntity::find()
            .filter(user::Column::Username.eq(username))
            .one(&self.base.db)
            .await
            .map_err(query_error)?;

        Ok(result.map(Into::into))
    }

    async fn list(&self, page: PageRequest) -> Result<Paged<User>, RepoError> {
        let paginator = UserEntity::find()
            .order_by_asc(user::Column::DateJoined)
            .order_by_asc(user::Column::Id)
            .paginate(&self.base.db, page.page_size);

        let total = paginator.num_items().await.map_err(query_error)?;
        if page.offset() >= total {
            return Ok(Paged::empty(total, page));
        }

        let models = paginator
            .fetch_page(page.index())
            .await
            .map_err(query_error)?;

        Ok(Paged {
            items: models.into_iter().map(Into::into).collect(),
            total,
            page,
        })
    }
}

/// The joined post listing query: `posts LEFT JOIN users`, filtered and ordered.
pub(crate) fn list_select(filter: &PostFilter) -> SelectTwo<PostEntity, UserEntity> {
    let mut select = PostEntity::find().find_also_related(UserEntity);

    if let Some(published) = filter.published {
        select = select.filter(post::Column::Published.eq(published));
    }
    if let Some(username) = &filter.author_username {
        select = select.filter(user::Column::Username.eq(username.as_str()));
    }

    match filter.order {
        PostOrder::NewestFirst => select
            .order_by_desc(post::Column::CreatedAt)
            .order_by_desc(post::Column::Id),
    }
}

fn join_author(post: post::Model, author: Option<user::Model>) -> Result<AuthoredPost, RepoError> {
    let author = author.ok_or_else(|| {
        RepoError::Query(format!("post {} references a missing author", post.id))
    })?;

    Ok(AuthoredPost {
        post: post.into(),
        author: author.into(),
    })
}

#[async_trait]
impl PostRepository for PostgresPostRepository {
    async fn find_with_author(&self, id: Uuid) -> Result<Option<AuthoredPost>, RepoError> {
        let row = PostEntity::find_by_id(id)
            .find_also_related(UserEntity)
            .one(&self.db)
            .await
            .map_err(query_error)?;

        row.map(|(post, author)| join_author(post, author))
            .transpose()
    }

    async fn list(
        &self,
        filter: &PostFilter,
        page: PageRequest,
    ) -> Result<Paged<AuthoredPost>, RepoError> {
        tracing::debug!(?filter, page = page.page, "Listing posts");

        let paginator = list_select(filter).paginate(&self.db, page.page_size);
        let total = paginator.num_items().await.map_err(query_error)?;
        // `fetch_page` multiplies without overflow checks.
        if page.offset() >= total {
            return Ok(Paged::empty(total, page));
        }

        let rows = paginator
            .fetch_page(page.index())
            .await
            .map_err(query_error)?;

        let items = rows
            .into_iter()
            .map(|(post, author)| join_author(post, author))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Paged { items, total, page })
    }
}
