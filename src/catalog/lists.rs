//! List definition store: create, read, update and delete list rule sets.

use std::collections::BTreeSet;

use chrono::Utc;
use log::{debug, info};
use sea_orm::{ActiveValue, IntoActiveModel, TransactionTrait};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{ensure_owned, CatalogService};
use crate::constants::{ENTITY_LIST, ERROR_NAME_REQUIRED};
use crate::entities::{list, MatchQuorum};
use crate::error::{StoreError, StoreResult, ValidationError};
use crate::repositories::{ListRepository, RuleRelation};
use crate::resolver::RuleSet;
use crate::utils::text::{dedup_ids, normalize_description, normalize_name};

/// Input for [`CatalogService::create_list`].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CreateListArgs {
    pub name: String,
    pub description: Option<String>,
    pub include_match_quorum: MatchQuorum,
    pub exclude_match_quorum: MatchQuorum,
    pub include_tag_ids: Vec<Uuid>,
    pub exclude_tag_ids: Vec<Uuid>,
    pub include_repository_ids: Vec<Uuid>,
    pub exclude_repository_ids: Vec<Uuid>,
}

/// How an update treats one rule relation.
///
/// A field omitted from a deserialized payload is `Keep`; a supplied array,
/// even an empty one, becomes `Replace`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(from = "Vec<Uuid>")]
pub enum RuleUpdate {
    #[default]
    Keep,
    Replace(Vec<Uuid>),
}

impl From<Vec<Uuid>> for RuleUpdate {
    fn from(ids: Vec<Uuid>) -> Self {
        RuleUpdate::Replace(ids)
    }
}

impl RuleUpdate {
    /// Deduplicated replacement ids, or `None` to keep the stored relation.
    fn replacement(&self) -> Option<BTreeSet<Uuid>> {
        match self {
            RuleUpdate::Keep => None,
            RuleUpdate::Replace(ids) => Some(dedup_ids(ids)),
        }
    }
}

/// Partial update for [`CatalogService::update_list`]. `None` and
/// [`RuleUpdate::Keep`] leave the stored value unchanged.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct UpdateListArgs {
    pub name: Option<String>,
    /// A blank description clears it.
    pub description: Option<String>,
    pub include_match_quorum: Option<MatchQuorum>,
    pub exclude_match_quorum: Option<MatchQuorum>,
    pub include_tag_ids: RuleUpdate,
    pub exclude_tag_ids: RuleUpdate,
    pub include_repository_ids: RuleUpdate,
    pub exclude_repository_ids: RuleUpdate,
}

/// A list together with its complete rule set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ListDefinition {
    pub list: list::Model,
    pub rules: RuleSet,
}

fn required_name(name: &str) -> StoreResult<String> {
    normalize_name(name).ok_or_else(|| ValidationError::field(ERROR_NAME_REQUIRED).into())
}

impl CatalogService {
    /// Create a list and its rule rows in one transaction.
    ///
    /// Duplicate ids are collapsed. Every referenced tag and repository
    /// instance must belong to `user_id`.
    ///
    /// # Errors
    /// Returns a validation error for a blank name or for foreign ids, in
    /// which case nothing is written
    pub async fn create_list(&self, user_id: Uuid, args: CreateListArgs) -> StoreResult<ListDefinition> {
        self.bounded("create_list", self.create_list_inner(user_id, args))
            .await
    }

    async fn create_list_inner(&self, user_id: Uuid, args: CreateListArgs) -> StoreResult<ListDefinition> {
        let name = required_name(&args.name)?;
        let rules = RuleSet {
            include_tag_ids: dedup_ids(&args.include_tag_ids),
            exclude_tag_ids: dedup_ids(&args.exclude_tag_ids),
            include_repository_ids: dedup_ids(&args.include_repository_ids),
            exclude_repository_ids: dedup_ids(&args.exclude_repository_ids),
            include_match_quorum: args.include_match_quorum,
            exclude_match_quorum: args.exclude_match_quorum,
        };

        let _write = self.storage.write_lock().await;
        let txn = self.storage.conn.begin().await?;
        ensure_owned(
            &txn,
            user_id,
            &rules.referenced_tag_ids(),
            &rules.referenced_repository_ids(),
        )
        .await?;

        let now = Utc::now();
        let list = ListRepository::create(
            &txn,
            list::ActiveModel {
                id: ActiveValue::Set(Uuid::new_v4()),
                user_id: ActiveValue::Set(user_id),
                name: ActiveValue::Set(name),
                description: ActiveValue::Set(normalize_description(args.description.as_deref())),
                include_match_quorum: ActiveValue::Set(rules.include_match_quorum),
                exclude_match_quorum: ActiveValue::Set(rules.exclude_match_quorum),
                created_at: ActiveValue::Set(now),
                updated_at: ActiveValue::Set(now),
            },
        )
        .await?;

        ListRepository::insert_rule_ids(&txn, list.id, RuleRelation::IncludeTags, &rules.include_tag_ids).await?;
        ListRepository::insert_rule_ids(&txn, list.id, RuleRelation::ExcludeTags, &rules.exclude_tag_ids).await?;
        ListRepository::insert_rule_ids(
            &txn,
            list.id,
            RuleRelation::IncludeRepositories,
            &rules.include_repository_ids,
        )
        .await?;
        ListRepository::insert_rule_ids(
            &txn,
            list.id,
            RuleRelation::ExcludeRepositories,
            &rules.exclude_repository_ids,
        )
        .await?;

        txn.commit().await?;
        info!("Storage: Created list '{}' ({}) for user {}", list.name, list.id, user_id);
        Ok(ListDefinition { list, rules })
    }

    /// Get a list and its rule set.
    ///
    /// # Errors
    /// Returns not-found if the list does not exist or belongs to another user
    pub async fn get_list(&self, user_id: Uuid, list_id: Uuid) -> StoreResult<ListDefinition> {
        self.bounded("get_list", async move {
            let txn = self.storage.conn.begin().await?;
            let list = ListRepository::get_owned(&txn, user_id, list_id)
                .await?
                .ok_or_else(|| StoreError::not_found(ENTITY_LIST, list_id))?;
            let rules = ListRepository::rule_set(&txn, &list).await?;
            txn.commit().await?;
            Ok(ListDefinition { list, rules })
        })
        .await
    }

    /// Get all lists of a user ordered by name.
    pub async fn list_lists(&self, user_id: Uuid) -> StoreResult<Vec<list::Model>> {
        self.bounded("list_lists", ListRepository::get_by_user(&self.storage.conn, user_id))
            .await
    }

    /// Apply a partial update to a list.
    ///
    /// Scalars left as `None` keep their stored value. Each supplied rule
    /// relation replaces the stored one wholesale in the same transaction.
    ///
    /// # Errors
    /// Returns not-found if the list is not owned by `user_id`, or a
    /// validation error for a blank name or foreign ids
    pub async fn update_list(&self, user_id: Uuid, list_id: Uuid, args: UpdateListArgs) -> StoreResult<ListDefinition> {
        self.bounded("update_list", self.update_list_inner(user_id, list_id, args))
            .await
    }

    async fn update_list_inner(&self, user_id: Uuid, list_id: Uuid, args: UpdateListArgs) -> StoreResult<ListDefinition> {
        let name = args.name.as_deref().map(required_name).transpose()?;
        let replacements = [
            (RuleRelation::IncludeTags, args.include_tag_ids.replacement()),
            (RuleRelation::ExcludeTags, args.exclude_tag_ids.replacement()),
            (RuleRelation::IncludeRepositories, args.include_repository_ids.replacement()),
            (RuleRelation::ExcludeRepositories, args.exclude_repository_ids.replacement()),
        ];

        let mut supplied_tags: BTreeSet<Uuid> = BTreeSet::new();
        let mut supplied_repositories: BTreeSet<Uuid> = BTreeSet::new();
        for (relation, ids) in &replacements {
            let Some(ids) = ids else { continue };
            match relation {
                RuleRelation::IncludeTags | RuleRelation::ExcludeTags => supplied_tags.extend(ids),
                RuleRelation::IncludeRepositories | RuleRelation::ExcludeRepositories => {
                    supplied_repositories.extend(ids)
                }
            }
        }

        let _write = self.storage.write_lock().await;
        let txn = self.storage.conn.begin().await?;
        let existing = ListRepository::get_owned(&txn, user_id, list_id)
            .await?
            .ok_or_else(|| StoreError::not_found(ENTITY_LIST, list_id))?;
        ensure_owned(&txn, user_id, &supplied_tags, &supplied_repositories).await?;

        let mut active_model = existing.into_active_model();
        if let Some(name) = name {
            active_model.name = ActiveValue::Set(name);
        }
        if let Some(description) = args.description.as_deref() {
            active_model.description = ActiveValue::Set(normalize_description(Some(description)));
        }
        if let Some(quorum) = args.include_match_quorum {
            active_model.include_match_quorum = ActiveValue::Set(quorum);
        }
        if let Some(quorum) = args.exclude_match_quorum {
            active_model.exclude_match_quorum = ActiveValue::Set(quorum);
        }
        active_model.updated_at = ActiveValue::Set(Utc::now());
        let list = ListRepository::update(&txn, active_model).await?;

        for (relation, ids) in &replacements {
            if let Some(ids) = ids {
                debug!("Storage: Replacing {:?} of list {} with {} ids", relation, list_id, ids.len());
                ListRepository::replace_rule_ids(&txn, list_id, *relation, ids).await?;
            }
        }

        let rules = ListRepository::rule_set(&txn, &list).await?;
        txn.commit().await?;
        info!("Storage: Updated list '{}' ({}) for user {}", list.name, list.id, user_id);
        Ok(ListDefinition { list, rules })
    }

    /// Delete a list and its rule rows.
    ///
    /// # Errors
    /// Returns not-found if the list is not owned by `user_id`
    pub async fn delete_list(&self, user_id: Uuid, list_id: Uuid) -> StoreResult<()> {
        self.bounded("delete_list", async move {
            let _write = self.storage.write_lock().await;
            let txn = self.storage.conn.begin().await?;
            ListRepository::get_owned(&txn, user_id, list_id)
                .await?
                .ok_or_else(|| StoreError::not_found(ENTITY_LIST, list_id))?;
            ListRepository::delete(&txn, list_id).await?;
            txn.commit().await?;
            info!("Storage: Deleted list {} for user {}", list_id, user_id);
            Ok(())
        })
        .await
    }
}
