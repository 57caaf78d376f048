//! Catalog service: the operations exposed to callers.
//!
//! [`CatalogService`] owns the tag store, the repository store, the
//! tag-repository associations, the list definition store and membership
//! resolution. Every operation takes the acting user's id explicitly and only
//! ever touches rows owned by that user.
//!
//! Mutations run inside a single transaction each. Early returns drop the
//! transaction, which rolls it back, so a rejected or timed-out operation
//! never leaves partial rows behind.

pub mod associations;
pub mod lists;
pub mod membership;
pub mod repositories;
pub mod tags;

use std::collections::{BTreeSet, HashSet};
use std::future::Future;
use std::time::Duration;

use log::warn;
use sea_orm::ConnectionTrait;
use uuid::Uuid;

use crate::config::ListsConfig;
use crate::error::{StoreError, StoreResult, ValidationError};
use crate::repositories::{RepositoryInstanceRepository, TagRepository};
use crate::storage::LocalStorage;

pub use lists::{CreateListArgs, ListDefinition, RuleUpdate, UpdateListArgs};
pub use membership::{ListMember, MemberDecision};
pub use repositories::NewRepository;
pub use tags::UpdateTagArgs;

/// Service exposing tag, repository, list and membership operations.
///
/// Cloning is cheap: clones share the underlying connection pool.
///
/// # Example
/// ```rust,no_run
/// use repolists::catalog::{CatalogService, CreateListArgs, NewRepository};
/// use repolists::storage::LocalStorage;
///
/// # async fn example() -> anyhow::Result<()> {
/// let storage = LocalStorage::in_memory().await?;
/// let catalog = CatalogService::new(storage, None);
/// let user = uuid::Uuid::new_v4();
///
/// let rust = catalog.upsert_tag(user, "Rust", None).await?;
/// let (instance, _) = catalog.add_repository(user, NewRepository::github("tokio-rs/tokio")).await?;
/// catalog.tag_repository(user, rust.id, instance.id).await?;
///
/// let list = catalog
///     .create_list(user, CreateListArgs {
///         name: "Rust".to_string(),
///         include_tag_ids: vec![rust.id],
///         ..Default::default()
///     })
///     .await?;
/// let members = catalog.resolve_list_membership(user, list.list.id).await?;
/// assert_eq!(members.len(), 1);
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct CatalogService {
    storage: LocalStorage,
    operation_timeout: Option<Duration>,
}

impl CatalogService {
    /// Creates a service over `storage`. Operations exceeding
    /// `operation_timeout` fail with [`StoreError::Timeout`].
    pub fn new(storage: LocalStorage, operation_timeout: Option<Duration>) -> Self {
        Self {
            storage,
            operation_timeout,
        }
    }

    pub fn from_config(storage: LocalStorage, config: &ListsConfig) -> Self {
        Self::new(storage, config.operation_timeout())
    }

    pub fn operation_timeout(&self) -> Option<Duration> {
        self.operation_timeout
    }

    /// Run `operation` under the configured timeout.
    ///
    /// On expiry the future is dropped, taking any open transaction with it.
    async fn bounded<T, F>(&self, name: &'static str, operation: F) -> StoreResult<T>
    where
        F: Future<Output = StoreResult<T>>,
    {
        match self.operation_timeout {
            Some(limit) => match tokio::time::timeout(limit, operation).await {
                Ok(result) => result,
                Err(_) => {
                    warn!("Catalog: {} timed out after {:?}", name, limit);
                    Err(StoreError::Timeout(limit))
                }
            },
            None => operation.await,
        }
    }
}

/// Check that every tag id and repository-instance id belongs to `user_id`.
///
/// Fails closed: a single foreign or unknown id rejects the whole request,
/// and the error lists every offending id.
pub(crate) async fn ensure_owned<C>(
    conn: &C,
    user_id: Uuid,
    tag_ids: &BTreeSet<Uuid>,
    repository_ids: &BTreeSet<Uuid>,
) -> StoreResult<()>
where
    C: ConnectionTrait,
{
    let requested_tags: Vec<Uuid> = tag_ids.iter().copied().collect();
    let owned_tags: HashSet<Uuid> = TagRepository::get_by_ids(conn, &requested_tags)
        .await?
        .into_iter()
        .filter(|tag| tag.user_id == user_id)
        .map(|tag| tag.id)
        .collect();

    let requested_repositories: Vec<Uuid> = repository_ids.iter().copied().collect();
    let owned_repositories: HashSet<Uuid> = RepositoryInstanceRepository::get_by_ids(conn, &requested_repositories)
        .await?
        .into_iter()
        .filter(|instance| instance.user_id == user_id)
        .map(|instance| instance.id)
        .collect();

    let invalid_tags: Vec<Uuid> = requested_tags
        .into_iter()
        .filter(|id| !owned_tags.contains(id))
        .collect();
    let invalid_repositories: Vec<Uuid> = requested_repositories
        .into_iter()
        .filter(|id| !owned_repositories.contains(id))
        .collect();

    if invalid_tags.is_empty() && invalid_repositories.is_empty() {
        return Ok(());
    }

    warn!(
        "Catalog: Rejected request from user {}: {} foreign tag ids, {} foreign repository ids",
        user_id,
        invalid_tags.len(),
        invalid_repositories.len()
    );
    Err(ValidationError::unowned(invalid_tags, invalid_repositories).into())
}
