//! Membership resolution against stored lists.
//!
//! Inputs are read once inside a single transaction, so one resolution pass
//! always sees a consistent snapshot. The evaluation itself lives in
//! [`crate::resolver`] and performs no I/O.

use std::collections::HashMap;

use log::debug;
use sea_orm::{ConnectionTrait, TransactionTrait};
use serde::Serialize;
use uuid::Uuid;

use super::{ensure_owned, CatalogService};
use crate::constants::ENTITY_LIST;
use crate::entities::{repository, repository_instance};
use crate::error::{StoreError, StoreResult};
use crate::repositories::{AssociationRepository, ListRepository, RepositoryInstanceRepository};
use crate::resolver::{Decision, MembershipGraph, RuleSet};

/// A resolved list member paired with its canonical repository.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ListMember {
    pub instance: repository_instance::Model,
    pub repository: repository::Model,
}

/// One candidate instance and the rule that decided it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MemberDecision {
    pub instance: repository_instance::Model,
    pub repository: repository::Model,
    pub decision: Decision,
}

/// A user's instances, ordered by full name then id, and the tag graph over them.
struct Snapshot {
    instances: Vec<(repository_instance::Model, repository::Model)>,
    graph: MembershipGraph,
}

impl Snapshot {
    async fn load<C>(conn: &C, user_id: Uuid) -> StoreResult<Self>
    where
        C: ConnectionTrait,
    {
        let instances = RepositoryInstanceRepository::get_by_user_with_repository(conn, user_id).await?;
        let associations = AssociationRepository::get_by_user(conn, user_id).await?;
        let graph = MembershipGraph::new(instances.iter().map(|(instance, _)| instance.id), &associations);
        debug!(
            "Resolver: Loaded {} instances and {} associations for user {}",
            graph.len(),
            associations.len(),
            user_id
        );
        Ok(Self { instances, graph })
    }

    fn members(self, rules: &RuleSet) -> Vec<ListMember> {
        let member_ids = self.graph.resolve(rules);
        let mut by_id: HashMap<Uuid, (repository_instance::Model, repository::Model)> = self
            .instances
            .into_iter()
            .map(|(instance, repository)| (instance.id, (instance, repository)))
            .collect();
        member_ids
            .into_iter()
            .filter_map(|id| by_id.remove(&id))
            .map(|(instance, repository)| ListMember { instance, repository })
            .collect()
    }

    fn decisions(self, rules: &RuleSet) -> Vec<MemberDecision> {
        let decisions: HashMap<Uuid, Decision> = self.graph.explain(rules).into_iter().collect();
        self.instances
            .into_iter()
            .filter_map(|(instance, repository)| {
                decisions.get(&instance.id).map(|decision| MemberDecision {
                    decision: *decision,
                    instance,
                    repository,
                })
            })
            .collect()
    }
}

impl CatalogService {
    /// Load a list's rules and the user's snapshot in one read transaction.
    async fn load_for_list(&self, user_id: Uuid, list_id: Uuid) -> StoreResult<(RuleSet, Snapshot)> {
        let txn = self.storage.conn.begin().await?;
        let list = ListRepository::get_owned(&txn, user_id, list_id)
            .await?
            .ok_or_else(|| StoreError::not_found(ENTITY_LIST, list_id))?;
        let rules = ListRepository::rule_set(&txn, &list).await?;
        let snapshot = Snapshot::load(&txn, user_id).await?;
        txn.commit().await?;
        Ok((rules, snapshot))
    }

    /// Resolve the members of a list, ordered by repository full name.
    ///
    /// Resolution only reads; calling it repeatedly without intervening
    /// writes returns the same members.
    ///
    /// # Errors
    /// Returns not-found if the list does not exist or belongs to another user
    pub async fn resolve_list_membership(&self, user_id: Uuid, list_id: Uuid) -> StoreResult<Vec<ListMember>> {
        self.bounded("resolve_list_membership", async move {
            let (rules, snapshot) = self.load_for_list(user_id, list_id).await?;
            let members = snapshot.members(&rules);
            debug!("Resolver: List {} resolved to {} members", list_id, members.len());
            Ok(members)
        })
        .await
    }

    /// Every instance of the user with the decision reached for it under the
    /// list's rules, non-members included.
    pub async fn explain_list_membership(&self, user_id: Uuid, list_id: Uuid) -> StoreResult<Vec<MemberDecision>> {
        self.bounded("explain_list_membership", async move {
            let (rules, snapshot) = self.load_for_list(user_id, list_id).await?;
            Ok(snapshot.decisions(&rules))
        })
        .await
    }

    /// Resolve an unsaved rule set against the user's instances.
    ///
    /// # Errors
    /// Returns a validation error if the rules reference ids not owned by
    /// `user_id`
    pub async fn preview_membership(&self, user_id: Uuid, rules: RuleSet) -> StoreResult<Vec<ListMember>> {
        self.bounded("preview_membership", async move {
            let txn = self.storage.conn.begin().await?;
            ensure_owned(
                &txn,
                user_id,
                &rules.referenced_tag_ids(),
                &rules.referenced_repository_ids(),
            )
            .await?;
            let snapshot = Snapshot::load(&txn, user_id).await?;
            txn.commit().await?;
            Ok(snapshot.members(&rules))
        })
        .await
    }
}
