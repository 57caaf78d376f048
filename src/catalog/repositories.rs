use chrono::Utc;
use log::info;
use sea_orm::{ActiveValue, IntoActiveModel, TransactionTrait};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::CatalogService;
use crate::constants::{DEFAULT_PROVIDER, ENTITY_REPOSITORY, ERROR_FULL_NAME_REQUIRED};
use crate::entities::{repository, repository_instance};
use crate::error::{StoreError, StoreResult, ValidationError};
use crate::repositories::{RepositoryInstanceRepository, RepositoryRepository};
use crate::utils::text::{normalize_description, normalize_name};

fn default_provider() -> String {
    DEFAULT_PROVIDER.to_string()
}

/// A repository a user starts tracking.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewRepository {
    #[serde(default = "default_provider")]
    pub provider: String,
    /// Provider-scoped name, e.g. "owner/name"
    pub full_name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
}

impl NewRepository {
    pub fn new(provider: impl Into<String>, full_name: impl Into<String>) -> Self {
        Self {
            provider: provider.into(),
            full_name: full_name.into(),
            description: None,
            url: None,
        }
    }

    pub fn github(full_name: impl Into<String>) -> Self {
        Self::new(DEFAULT_PROVIDER, full_name)
    }
}

impl CatalogService {
    /// Get the user's repository instances among `ids`. Unknown ids and ids
    /// owned by other users are skipped.
    pub async fn get_repository_instances_by_ids(
        &self,
        user_id: Uuid,
        ids: &[Uuid],
    ) -> StoreResult<Vec<repository_instance::Model>> {
        self.bounded("get_repository_instances_by_ids", async move {
            let instances = RepositoryInstanceRepository::get_by_ids(&self.storage.conn, ids).await?;
            Ok(instances
                .into_iter()
                .filter(|instance| instance.user_id == user_id)
                .collect())
        })
        .await
    }

    /// Get a user's repository instances with their canonical repository,
    /// ordered by full name.
    pub async fn get_repository_instances_by_user(
        &self,
        user_id: Uuid,
    ) -> StoreResult<Vec<(repository_instance::Model, repository::Model)>> {
        self.bounded(
            "get_repository_instances_by_user",
            RepositoryInstanceRepository::get_by_user_with_repository(&self.storage.conn, user_id),
        )
        .await
    }

    /// Start tracking a repository for `user_id`.
    ///
    /// The canonical repository is shared between users and keyed by provider
    /// and full name. Adding a repository the user already tracks returns the
    /// existing instance.
    ///
    /// # Errors
    /// Returns a validation error if the full name or provider is blank
    pub async fn add_repository(
        &self,
        user_id: Uuid,
        new_repository: NewRepository,
    ) -> StoreResult<(repository_instance::Model, repository::Model)> {
        self.bounded("add_repository", self.add_repository_inner(user_id, new_repository))
            .await
    }

    async fn add_repository_inner(
        &self,
        user_id: Uuid,
        new_repository: NewRepository,
    ) -> StoreResult<(repository_instance::Model, repository::Model)> {
        let full_name =
            normalize_name(&new_repository.full_name).ok_or_else(|| ValidationError::field(ERROR_FULL_NAME_REQUIRED))?;
        let provider = normalize_name(&new_repository.provider)
            .map(|provider| provider.to_lowercase())
            .ok_or_else(|| ValidationError::field("repository provider must not be empty"))?;
        let description = normalize_description(new_repository.description.as_deref());
        let url = normalize_description(new_repository.url.as_deref());

        let _write = self.storage.write_lock().await;
        let txn = self.storage.conn.begin().await?;

        let created_repository = RepositoryRepository::insert_if_absent(
            &txn,
            repository::ActiveModel {
                id: ActiveValue::Set(Uuid::new_v4()),
                provider: ActiveValue::Set(provider.clone()),
                full_name: ActiveValue::Set(full_name.clone()),
                description: ActiveValue::Set(description.clone()),
                url: ActiveValue::Set(url.clone()),
                created_at: ActiveValue::Set(Utc::now()),
            },
        )
        .await?;
        let existing = RepositoryRepository::get_by_full_name(&txn, &provider, &full_name)
            .await?
            .ok_or_else(|| StoreError::Conflict(format!("repository {}/{} vanished during add", provider, full_name)))?;

        // Refresh metadata only when new values were supplied
        let refresh_description = description.is_some() && description != existing.description;
        let refresh_url = url.is_some() && url != existing.url;
        let repository = if !created_repository && (refresh_description || refresh_url) {
            let mut active_model = existing.into_active_model();
            if refresh_description {
                active_model.description = ActiveValue::Set(description);
            }
            if refresh_url {
                active_model.url = ActiveValue::Set(url);
            }
            RepositoryRepository::update(&txn, active_model).await?
        } else {
            existing
        };
        if created_repository {
            info!("Storage: Created repository {}/{}", provider, full_name);
        }

        let created_instance = RepositoryInstanceRepository::insert_if_absent(
            &txn,
            repository_instance::ActiveModel {
                id: ActiveValue::Set(Uuid::new_v4()),
                user_id: ActiveValue::Set(user_id),
                repository_id: ActiveValue::Set(repository.id),
                created_at: ActiveValue::Set(Utc::now()),
            },
        )
        .await?;
        let instance = RepositoryInstanceRepository::get_for_repository(&txn, user_id, repository.id)
            .await?
            .ok_or_else(|| StoreError::not_found(ENTITY_REPOSITORY, repository.id))?;
        if created_instance {
            info!("Storage: User {} now tracks {}", user_id, repository.full_name);
        }

        txn.commit().await?;
        Ok((instance, repository))
    }

    /// Stop tracking a repository. Its tags and every list rule naming the
    /// instance are removed with it; the canonical repository is kept.
    ///
    /// # Errors
    /// Returns not-found if the instance is not owned by `user_id`
    pub async fn remove_repository(&self, user_id: Uuid, instance_id: Uuid) -> StoreResult<()> {
        self.bounded("remove_repository", self.remove_repository_inner(user_id, instance_id))
            .await
    }

    async fn remove_repository_inner(&self, user_id: Uuid, instance_id: Uuid) -> StoreResult<()> {
        let _write = self.storage.write_lock().await;
        let txn = self.storage.conn.begin().await?;
        RepositoryInstanceRepository::get_owned(&txn, user_id, instance_id)
            .await?
            .ok_or_else(|| StoreError::not_found(ENTITY_REPOSITORY, instance_id))?;

        info!("Storage: Removing repository instance {} for user {}", instance_id, user_id);
        RepositoryInstanceRepository::delete(&txn, instance_id).await?;
        txn.commit().await?;
        Ok(())
    }
}
