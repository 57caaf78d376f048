use chrono::Utc;
use log::info;
use sea_orm::{ActiveModelTrait, ActiveValue, IntoActiveModel, TransactionTrait};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::CatalogService;
use crate::constants::{DEFAULT_TAG_COLOR, ENTITY_TAG, ERROR_TITLE_REQUIRED};
use crate::entities::tag;
use crate::error::{StoreError, StoreResult, ValidationError};
use crate::repositories::TagRepository;
use crate::utils::text::normalize_title;

/// Fields of a tag that can be edited. Omitted fields are left unchanged.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct UpdateTagArgs {
    pub title: Option<String>,
    pub color: Option<String>,
}

fn required_title(title: &str) -> StoreResult<String> {
    let title = normalize_title(title);
    if title.is_empty() {
        return Err(ValidationError::field(ERROR_TITLE_REQUIRED).into());
    }
    Ok(title)
}

impl CatalogService {
    /// Get the user's tags among `ids`. Unknown ids and ids owned by other
    /// users are skipped.
    pub async fn get_tags_by_ids(&self, user_id: Uuid, ids: &[Uuid]) -> StoreResult<Vec<tag::Model>> {
        self.bounded("get_tags_by_ids", async move {
            let tags = TagRepository::get_by_ids(&self.storage.conn, ids).await?;
            Ok(tags.into_iter().filter(|tag| tag.user_id == user_id).collect())
        })
        .await
    }

    /// Get all tags of a user ordered by title.
    pub async fn get_tags_by_user(&self, user_id: Uuid) -> StoreResult<Vec<tag::Model>> {
        self.bounded("get_tags_by_user", TagRepository::get_by_user(&self.storage.conn, user_id))
            .await
    }

    /// Return the user's tag with this title, creating it if needed.
    ///
    /// The title is trimmed and lowercased before lookup. When `color` is
    /// given it is applied to an existing tag as well.
    ///
    /// # Errors
    /// Returns a validation error if the title is blank
    pub async fn upsert_tag(&self, user_id: Uuid, title: &str, color: Option<&str>) -> StoreResult<tag::Model> {
        self.bounded("upsert_tag", self.upsert_tag_inner(user_id, title, color))
            .await
    }

    async fn upsert_tag_inner(&self, user_id: Uuid, title: &str, color: Option<&str>) -> StoreResult<tag::Model> {
        let title = required_title(title)?;
        let _write = self.storage.write_lock().await;
        let txn = self.storage.conn.begin().await?;

        let inserted = TagRepository::insert_if_absent(
            &txn,
            tag::ActiveModel {
                id: ActiveValue::Set(Uuid::new_v4()),
                user_id: ActiveValue::Set(user_id),
                title: ActiveValue::Set(title.clone()),
                color: ActiveValue::Set(color.unwrap_or(DEFAULT_TAG_COLOR).to_string()),
                created_at: ActiveValue::Set(Utc::now()),
            },
        )
        .await?;
        let existing = TagRepository::get_by_title(&txn, user_id, &title)
            .await?
            .ok_or_else(|| StoreError::Conflict(format!("tag '{}' vanished during upsert", title)))?;

        let tag = match color {
            Some(color) if !inserted && color != existing.color => {
                let mut active_model = existing.into_active_model();
                active_model.color = ActiveValue::Set(color.to_string());
                TagRepository::update(&txn, active_model).await?
            }
            _ => existing,
        };
        if inserted {
            info!("Storage: Created tag '{}' for user {}", title, user_id);
        }

        txn.commit().await?;
        Ok(tag)
    }

    /// Edit a tag's title and/or color.
    ///
    /// # Errors
    /// Returns not-found if the tag is not owned by `user_id`, validation if
    /// the new title is blank, and conflict if the user already has a tag
    /// with the new title
    pub async fn update_tag(&self, user_id: Uuid, tag_id: Uuid, args: UpdateTagArgs) -> StoreResult<tag::Model> {
        self.bounded("update_tag", self.update_tag_inner(user_id, tag_id, args))
            .await
    }

    async fn update_tag_inner(&self, user_id: Uuid, tag_id: Uuid, args: UpdateTagArgs) -> StoreResult<tag::Model> {
        let title = args.title.as_deref().map(required_title).transpose()?;
        let _write = self.storage.write_lock().await;
        let txn = self.storage.conn.begin().await?;

        let existing = TagRepository::get_owned(&txn, user_id, tag_id)
            .await?
            .ok_or_else(|| StoreError::not_found(ENTITY_TAG, tag_id))?;

        let mut active_model = existing.clone().into_active_model();
        if let Some(title) = title {
            if title != existing.title {
                if TagRepository::get_by_title(&txn, user_id, &title).await?.is_some() {
                    return Err(StoreError::Conflict(format!("tag '{}' already exists", title)));
                }
                info!("Storage: Renaming tag {} from '{}' to '{}'", tag_id, existing.title, title);
                active_model.title = ActiveValue::Set(title);
            }
        }
        if let Some(color) = args.color {
            active_model.color = ActiveValue::Set(color);
        }

        if !active_model.is_changed() {
            return Ok(existing);
        }
        let tag = TagRepository::update(&txn, active_model).await?;
        txn.commit().await?;
        Ok(tag)
    }

    /// Delete a tag, its associations and every list rule that references it.
    ///
    /// # Errors
    /// Returns not-found if the tag is not owned by `user_id`
    pub async fn delete_tag(&self, user_id: Uuid, tag_id: Uuid) -> StoreResult<()> {
        self.bounded("delete_tag", self.delete_tag_inner(user_id, tag_id))
            .await
    }

    async fn delete_tag_inner(&self, user_id: Uuid, tag_id: Uuid) -> StoreResult<()> {
        let _write = self.storage.write_lock().await;
        let txn = self.storage.conn.begin().await?;
        TagRepository::get_owned(&txn, user_id, tag_id)
            .await?
            .ok_or_else(|| StoreError::not_found(ENTITY_TAG, tag_id))?;

        info!("Storage: Deleting tag {} for user {}", tag_id, user_id);
        TagRepository::delete(&txn, tag_id).await?;
        txn.commit().await?;
        Ok(())
    }
}
