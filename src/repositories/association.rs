//! Tag-to-repository-instance association queries.

use sea_orm::sea_query::OnConflict;
use sea_orm::{
    ActiveValue, ColumnTrait, ConnectionTrait, EntityTrait, JoinType, QueryFilter, QuerySelect, RelationTrait,
};
use uuid::Uuid;

use crate::entities::{repository_tag, tag};
use crate::error::StoreResult;

/// Repository for the tag/repository-instance join table.
pub struct AssociationRepository;

impl AssociationRepository {
    /// Every `(tag_id, repository_instance_id)` pair whose tag belongs to `user_id`.
    pub async fn get_by_user<C>(conn: &C, user_id: Uuid) -> StoreResult<Vec<(Uuid, Uuid)>>
    where
        C: ConnectionTrait,
    {
        let rows = repository_tag::Entity::find()
            .join(JoinType::InnerJoin, repository_tag::Relation::Tag.def())
            .filter(tag::Column::UserId.eq(user_id))
            .all(conn)
            .await?;
        Ok(rows.into_iter().map(|row| (row.tag_id, row.repository_instance_id)).collect())
    }

    /// Attach a tag; an existing pair is left as is.
    pub async fn insert<C>(conn: &C, tag_id: Uuid, instance_id: Uuid) -> StoreResult<()>
    where
        C: ConnectionTrait,
    {
        let relation = repository_tag::ActiveModel {
            tag_id: ActiveValue::Set(tag_id),
            repository_instance_id: ActiveValue::Set(instance_id),
        };
        repository_tag::Entity::insert(relation)
            .on_conflict(
                OnConflict::columns([repository_tag::Column::TagId, repository_tag::Column::RepositoryInstanceId])
                    .do_nothing()
                    .to_owned(),
            )
            .exec_without_returning(conn)
            .await?;
        Ok(())
    }

    /// Detach a tag. Returns whether a row was removed.
    pub async fn delete<C>(conn: &C, tag_id: Uuid, instance_id: Uuid) -> StoreResult<bool>
    where
        C: ConnectionTrait,
    {
        let result = repository_tag::Entity::delete_many()
            .filter(repository_tag::Column::TagId.eq(tag_id))
            .filter(repository_tag::Column::RepositoryInstanceId.eq(instance_id))
            .exec(conn)
            .await?;
        Ok(result.rows_affected > 0)
    }

    /// Remove every tag from a repository instance.
    pub async fn delete_for_instance<C>(conn: &C, instance_id: Uuid) -> StoreResult<()>
    where
        C: ConnectionTrait,
    {
        repository_tag::Entity::delete_many()
            .filter(repository_tag::Column::RepositoryInstanceId.eq(instance_id))
            .exec(conn)
            .await?;
        Ok(())
    }
}
