//! List repository for database operations.

use std::collections::BTreeSet;

use sea_orm::{
    ActiveModelTrait, ActiveValue, ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, QueryOrder,
};
use uuid::Uuid;

use crate::entities::{list, list_exclude_repository, list_exclude_tag, list_include_repository, list_include_tag};
use crate::error::StoreResult;
use crate::resolver::RuleSet;

/// One of the four rule relations a list owns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuleRelation {
    IncludeTags,
    ExcludeTags,
    IncludeRepositories,
    ExcludeRepositories,
}

impl RuleRelation {
    pub const ALL: [RuleRelation; 4] = [
        RuleRelation::IncludeTags,
        RuleRelation::ExcludeTags,
        RuleRelation::IncludeRepositories,
        RuleRelation::ExcludeRepositories,
    ];
}

/// Repository for list-related database operations.
pub struct ListRepository;

impl ListRepository {
    /// Get a list only if it belongs to `user_id`.
    pub async fn get_owned<C>(conn: &C, user_id: Uuid, id: Uuid) -> StoreResult<Option<list::Model>>
    where
        C: ConnectionTrait,
    {
        Ok(list::Entity::find()
            .filter(list::Column::Id.eq(id))
            .filter(list::Column::UserId.eq(user_id))
            .one(conn)
            .await?)
    }

    /// Get all lists of a user ordered by name.
    pub async fn get_by_user<C>(conn: &C, user_id: Uuid) -> StoreResult<Vec<list::Model>>
    where
        C: ConnectionTrait,
    {
        Ok(list::Entity::find()
            .filter(list::Column::UserId.eq(user_id))
            .order_by_asc(list::Column::Name)
            .order_by_asc(list::Column::CreatedAt)
            .all(conn)
            .await?)
    }

    pub async fn create<C>(conn: &C, list: list::ActiveModel) -> StoreResult<list::Model>
    where
        C: ConnectionTrait,
    {
        Ok(list.insert(conn).await?)
    }

    pub async fn update<C>(conn: &C, list: list::ActiveModel) -> StoreResult<list::Model>
    where
        C: ConnectionTrait,
    {
        Ok(list.update(conn).await?)
    }

    /// Delete a list and its rule rows. Callers run this inside a transaction.
    pub async fn delete<C>(conn: &C, id: Uuid) -> StoreResult<()>
    where
        C: ConnectionTrait,
    {
        for relation in RuleRelation::ALL {
            Self::clear_rule_ids(conn, id, relation).await?;
        }
        list::Entity::delete_by_id(id).exec(conn).await?;
        Ok(())
    }

    /// Ids stored in one rule relation of a list.
    pub async fn rule_ids<C>(conn: &C, list_id: Uuid, relation: RuleRelation) -> StoreResult<BTreeSet<Uuid>>
    where
        C: ConnectionTrait,
    {
        let ids = match relation {
            RuleRelation::IncludeTags => list_include_tag::Entity::find()
                .filter(list_include_tag::Column::ListId.eq(list_id))
                .all(conn)
                .await?
                .into_iter()
                .map(|row| row.tag_id)
                .collect(),
            RuleRelation::ExcludeTags => list_exclude_tag::Entity::find()
                .filter(list_exclude_tag::Column::ListId.eq(list_id))
                .all(conn)
                .await?
                .into_iter()
                .map(|row| row.tag_id)
                .collect(),
            RuleRelation::IncludeRepositories => list_include_repository::Entity::find()
                .filter(list_include_repository::Column::ListId.eq(list_id))
                .all(conn)
                .await?
                .into_iter()
                .map(|row| row.repository_instance_id)
                .collect(),
            RuleRelation::ExcludeRepositories => list_exclude_repository::Entity::find()
                .filter(list_exclude_repository::Column::ListId.eq(list_id))
                .all(conn)
                .await?
                .into_iter()
                .map(|row| row.repository_instance_id)
                .collect(),
        };
        Ok(ids)
    }

    /// Load the full rule set of `list`.
    pub async fn rule_set<C>(conn: &C, list: &list::Model) -> StoreResult<RuleSet>
    where
        C: ConnectionTrait,
    {
        let mut rules = RuleSet::for_list(list);
        rules.include_tag_ids = Self::rule_ids(conn, list.id, RuleRelation::IncludeTags).await?;
        rules.exclude_tag_ids = Self::rule_ids(conn, list.id, RuleRelation::ExcludeTags).await?;
        rules.include_repository_ids = Self::rule_ids(conn, list.id, RuleRelation::IncludeRepositories).await?;
        rules.exclude_repository_ids = Self::rule_ids(conn, list.id, RuleRelation::ExcludeRepositories).await?;
        Ok(rules)
    }

    /// Remove every row of one rule relation of a list.
    pub async fn clear_rule_ids<C>(conn: &C, list_id: Uuid, relation: RuleRelation) -> StoreResult<()>
    where
        C: ConnectionTrait,
    {
        match relation {
            RuleRelation::IncludeTags => {
                list_include_tag::Entity::delete_many()
                    .filter(list_include_tag::Column::ListId.eq(list_id))
                    .exec(conn)
                    .await?;
            }
            RuleRelation::ExcludeTags => {
                list_exclude_tag::Entity::delete_many()
                    .filter(list_exclude_tag::Column::ListId.eq(list_id))
                    .exec(conn)
                    .await?;
            }
            RuleRelation::IncludeRepositories => {
                list_include_repository::Entity::delete_many()
                    .filter(list_include_repository::Column::ListId.eq(list_id))
                    .exec(conn)
                    .await?;
            }
            RuleRelation::ExcludeRepositories => {
                list_exclude_repository::Entity::delete_many()
                    .filter(list_exclude_repository::Column::ListId.eq(list_id))
                    .exec(conn)
                    .await?;
            }
        }
        Ok(())
    }

    /// Insert rule rows for a list. `ids` is already deduplicated.
    pub async fn insert_rule_ids<C>(
        conn: &C,
        list_id: Uuid,
        relation: RuleRelation,
        ids: &BTreeSet<Uuid>,
    ) -> StoreResult<()>
    where
        C: ConnectionTrait,
    {
        if ids.is_empty() {
            return Ok(());
        }
        match relation {
            RuleRelation::IncludeTags => {
                let rows = ids.iter().map(|id| list_include_tag::ActiveModel {
                    list_id: ActiveValue::Set(list_id),
                    tag_id: ActiveValue::Set(*id),
                });
                list_include_tag::Entity::insert_many(rows).exec_without_returning(conn).await?;
            }
            RuleRelation::ExcludeTags => {
                let rows = ids.iter().map(|id| list_exclude_tag::ActiveModel {
                    list_id: ActiveValue::Set(list_id),
                    tag_id: ActiveValue::Set(*id),
                });
                list_exclude_tag::Entity::insert_many(rows).exec_without_returning(conn).await?;
            }
            RuleRelation::IncludeRepositories => {
                let rows = ids.iter().map(|id| list_include_repository::ActiveModel {
                    list_id: ActiveValue::Set(list_id),
                    repository_instance_id: ActiveValue::Set(*id),
                });
                list_include_repository::Entity::insert_many(rows).exec_without_returning(conn).await?;
            }
            RuleRelation::ExcludeRepositories => {
                let rows = ids.iter().map(|id| list_exclude_repository::ActiveModel {
                    list_id: ActiveValue::Set(list_id),
                    repository_instance_id: ActiveValue::Set(*id),
                });
                list_exclude_repository::Entity::insert_many(rows).exec_without_returning(conn).await?;
            }
        }
        Ok(())
    }

    /// Replace one rule relation wholesale: delete every row, then insert `ids`.
    pub async fn replace_rule_ids<C>(
        conn: &C,
        list_id: Uuid,
        relation: RuleRelation,
        ids: &BTreeSet<Uuid>,
    ) -> StoreResult<()>
    where
        C: ConnectionTrait,
    {
        Self::clear_rule_ids(conn, list_id, relation).await?;
        Self::insert_rule_ids(conn, list_id, relation, ids).await
    }
}
