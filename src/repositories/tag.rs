//! Tag repository for database operations.

use sea_orm::sea_query::OnConflict;
use sea_orm::{ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, QueryOrder};
use uuid::Uuid;

use crate::entities::{list_exclude_tag, list_include_tag, repository_tag, tag};
use crate::error::StoreResult;

/// Repository for tag-related database operations.
pub struct TagRepository;

impl TagRepository {
    /// Get tags by id regardless of owner. Unknown ids are skipped.
    pub async fn get_by_ids<C>(conn: &C, ids: &[Uuid]) -> StoreResult<Vec<tag::Model>>
    where
        C: ConnectionTrait,
    {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        Ok(tag::Entity::find()
            .filter(tag::Column::Id.is_in(ids.iter().copied()))
            .order_by_asc(tag::Column::Title)
            .all(conn)
            .await?)
    }

    /// Get all tags of a user ordered by title.
    pub async fn get_by_user<C>(conn: &C, user_id: Uuid) -> StoreResult<Vec<tag::Model>>
    where
        C: ConnectionTrait,
    {
        Ok(tag::Entity::find()
            .filter(tag::Column::UserId.eq(user_id))
            .order_by_asc(tag::Column::Title)
            .all(conn)
            .await?)
    }

    /// Get a tag only if it belongs to `user_id`.
    pub async fn get_owned<C>(conn: &C, user_id: Uuid, id: Uuid) -> StoreResult<Option<tag::Model>>
    where
        C: ConnectionTrait,
    {
        Ok(tag::Entity::find()
            .filter(tag::Column::Id.eq(id))
            .filter(tag::Column::UserId.eq(user_id))
            .one(conn)
            .await?)
    }

    /// Get a user's tag by its normalized title.
    pub async fn get_by_title<C>(conn: &C, user_id: Uuid, title: &str) -> StoreResult<Option<tag::Model>>
    where
        C: ConnectionTrait,
    {
        Ok(tag::Entity::find()
            .filter(tag::Column::UserId.eq(user_id))
            .filter(tag::Column::Title.eq(title))
            .one(conn)
            .await?)
    }

    /// Insert a tag unless the user already has one with the same title.
    /// Returns whether a row was inserted.
    pub async fn insert_if_absent<C>(conn: &C, tag: tag::ActiveModel) -> StoreResult<bool>
    where
        C: ConnectionTrait,
    {
        let inserted = tag::Entity::insert(tag)
            .on_conflict(
                OnConflict::columns([tag::Column::UserId, tag::Column::Title])
                    .do_nothing()
                    .to_owned(),
            )
            .exec_without_returning(conn)
            .await?;
        Ok(inserted > 0)
    }

    /// Update a tag in the database.
    pub async fn update<C>(conn: &C, tag: tag::ActiveModel) -> StoreResult<tag::Model>
    where
        C: ConnectionTrait,
    {
        Ok(tag.update(conn).await?)
    }

    /// Delete a tag together with its associations and every list rule
    /// referencing it. Callers run this inside a transaction.
    pub async fn delete<C>(conn: &C, id: Uuid) -> StoreResult<()>
    where
        C: ConnectionTrait,
    {
        repository_tag::Entity::delete_many()
            .filter(repository_tag::Column::TagId.eq(id))
            .exec(conn)
            .await?;
        list_include_tag::Entity::delete_many()
            .filter(list_include_tag::Column::TagId.eq(id))
            .exec(conn)
            .await?;
        list_exclude_tag::Entity::delete_many()
            .filter(list_exclude_tag::Column::TagId.eq(id))
            .exec(conn)
            .await?;
        tag::Entity::delete_by_id(id).exec(conn).await?;
        Ok(())
    }
}
