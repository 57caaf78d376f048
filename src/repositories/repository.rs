//! Repository and repository-instance queries.

use sea_orm::sea_query::OnConflict;
use sea_orm::{ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, QueryOrder};
use uuid::Uuid;

use crate::entities::{list_exclude_repository, list_include_repository, repository, repository_instance, repository_tag};
use crate::error::StoreResult;

/// Queries over canonical repositories.
pub struct RepositoryRepository;

impl RepositoryRepository {
    /// Get a canonical repository by provider and full name.
    pub async fn get_by_full_name<C>(
        conn: &C,
        provider: &str,
        full_name: &str,
    ) -> StoreResult<Option<repository::Model>>
    where
        C: ConnectionTrait,
    {
        Ok(repository::Entity::find()
            .filter(repository::Column::Provider.eq(provider))
            .filter(repository::Column::FullName.eq(full_name))
            .one(conn)
            .await?)
    }

    /// Insert a canonical repository unless one with the same provider and
    /// full name exists. Returns whether a row was inserted.
    pub async fn insert_if_absent<C>(conn: &C, repository: repository::ActiveModel) -> StoreResult<bool>
    where
        C: ConnectionTrait,
    {
        let inserted = repository::Entity::insert(repository)
            .on_conflict(
                OnConflict::columns([repository::Column::Provider, repository::Column::FullName])
                    .do_nothing()
                    .to_owned(),
            )
            .exec_without_returning(conn)
            .await?;
        Ok(inserted > 0)
    }

    pub async fn update<C>(conn: &C, repository: repository::ActiveModel) -> StoreResult<repository::Model>
    where
        C: ConnectionTrait,
    {
        Ok(repository.update(conn).await?)
    }
}

/// Queries over users' repository instances.
pub struct RepositoryInstanceRepository;

impl RepositoryInstanceRepository {
    /// Get instances by id regardless of owner. Unknown ids are skipped.
    pub async fn get_by_ids<C>(conn: &C, ids: &[Uuid]) -> StoreResult<Vec<repository_instance::Model>>
    where
        C: ConnectionTrait,
    {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        Ok(repository_instance::Entity::find()
            .filter(repository_instance::Column::Id.is_in(ids.iter().copied()))
            .all(conn)
            .await?)
    }

    /// Get an instance only if it belongs to `user_id`.
    pub async fn get_owned<C>(
        conn: &C,
        user_id: Uuid,
        id: Uuid,
    ) -> StoreResult<Option<repository_instance::Model>>
    where
        C: ConnectionTrait,
    {
        Ok(repository_instance::Entity::find()
            .filter(repository_instance::Column::Id.eq(id))
            .filter(repository_instance::Column::UserId.eq(user_id))
            .one(conn)
            .await?)
    }

    /// Get the instance binding `user_id` to a canonical repository, if any.
    pub async fn get_for_repository<C>(
        conn: &C,
        user_id: Uuid,
        repository_id: Uuid,
    ) -> StoreResult<Option<repository_instance::Model>>
    where
        C: ConnectionTrait,
    {
        Ok(repository_instance::Entity::find()
            .filter(repository_instance::Column::UserId.eq(user_id))
            .filter(repository_instance::Column::RepositoryId.eq(repository_id))
            .one(conn)
            .await?)
    }

    /// All instances of a user paired with their canonical repository,
    /// ordered by full name.
    pub async fn get_by_user_with_repository<C>(
        conn: &C,
        user_id: Uuid,
    ) -> StoreResult<Vec<(repository_instance::Model, repository::Model)>>
    where
        C: ConnectionTrait,
    {
        let rows = repository_instance::Entity::find()
            .filter(repository_instance::Column::UserId.eq(user_id))
            .find_also_related(repository::Entity)
            .order_by_asc(repository::Column::FullName)
            .order_by_asc(repository_instance::Column::Id)
            .all(conn)
            .await?;
        Ok(rows
            .into_iter()
            .filter_map(|(instance, repository)| repository.map(|r| (instance, r)))
            .collect())
    }

    /// Insert an instance unless the user already tracks the repository.
    pub async fn insert_if_absent<C>(conn: &C, instance: repository_instance::ActiveModel) -> StoreResult<bool>
    where
        C: ConnectionTrait,
    {
        let inserted = repository_instance::Entity::insert(instance)
            .on_conflict(
                OnConflict::columns([
                    repository_instance::Column::UserId,
                    repository_instance::Column::RepositoryId,
                ])
                .do_nothing()
                .to_owned(),
            )
            .exec_without_returning(conn)
            .await?;
        Ok(inserted > 0)
    }

    /// Delete an instance together with its tag associations and every list
    /// rule referencing it. Callers run this inside a transaction.
    pub async fn delete<C>(conn: &C, id: Uuid) -> StoreResult<()>
    where
        C: ConnectionTrait,
    {
        repository_tag::Entity::delete_many()
            .filter(repository_tag::Column::RepositoryInstanceId.eq(id))
            .exec(conn)
            .await?;
        list_include_repository::Entity::delete_many()
            .filter(list_include_repository::Column::RepositoryInstanceId.eq(id))
            .exec(conn)
            .await?;
        list_exclude_repository::Entity::delete_many()
            .filter(list_exclude_repository::Column::RepositoryInstanceId.eq(id))
            .exec(conn)
            .await?;
        repository_instance::Entity::delete_by_id(id).exec(conn).await?;
        Ok(())
    }
}
