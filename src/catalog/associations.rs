use std::collections::BTreeSet;

use log::info;
use sea_orm::TransactionTrait;
use uuid::Uuid;

use super::{ensure_owned, CatalogService};
use crate::error::StoreResult;
use crate::repositories::AssociationRepository;
use crate::utils::text::dedup_ids;

impl CatalogService {
    /// Every `(tag_id, repository_instance_id)` pair of a user.
    pub async fn get_associations_by_user(&self, user_id: Uuid) -> StoreResult<Vec<(Uuid, Uuid)>> {
        self.bounded(
            "get_associations_by_user",
            AssociationRepository::get_by_user(&self.storage.conn, user_id),
        )
        .await
    }

    /// Attach a tag to a repository instance. Attaching twice is a no-op.
    ///
    /// # Errors
    /// Returns a validation error naming the tag or instance if either is not
    /// owned by `user_id`
    pub async fn tag_repository(&self, user_id: Uuid, tag_id: Uuid, instance_id: Uuid) -> StoreResult<()> {
        self.bounded("tag_repository", async move {
            let _write = self.storage.write_lock().await;
            let txn = self.storage.conn.begin().await?;
            ensure_owned(&txn, user_id, &BTreeSet::from([tag_id]), &BTreeSet::from([instance_id])).await?;
            AssociationRepository::insert(&txn, tag_id, instance_id).await?;
            txn.commit().await?;
            info!("Storage: Tagged repository instance {} with {}", instance_id, tag_id);
            Ok(())
        })
        .await
    }

    /// Detach a tag from a repository instance. Returns whether it was attached.
    pub async fn untag_repository(&self, user_id: Uuid, tag_id: Uuid, instance_id: Uuid) -> StoreResult<bool> {
        self.bounded("untag_repository", async move {
            let _write = self.storage.write_lock().await;
            let txn = self.storage.conn.begin().await?;
            ensure_owned(&txn, user_id, &BTreeSet::from([tag_id]), &BTreeSet::from([instance_id])).await?;
            let removed = AssociationRepository::delete(&txn, tag_id, instance_id).await?;
            txn.commit().await?;
            if removed {
                info!("Storage: Untagged repository instance {} from {}", instance_id, tag_id);
            }
            Ok(removed)
        })
        .await
    }

    /// Replace the tags of a repository instance with `tag_ids`.
    ///
    /// Returns the resulting tag ids, sorted and deduplicated.
    pub async fn set_repository_tags(
        &self,
        user_id: Uuid,
        instance_id: Uuid,
        tag_ids: &[Uuid],
    ) -> StoreResult<Vec<Uuid>> {
        let tag_ids = dedup_ids(tag_ids);
        self.bounded("set_repository_tags", async move {
            let _write = self.storage.write_lock().await;
            let txn = self.storage.conn.begin().await?;
            ensure_owned(&txn, user_id, &tag_ids, &BTreeSet::from([instance_id])).await?;

            AssociationRepository::delete_for_instance(&txn, instance_id).await?;
            for tag_id in &tag_ids {
                AssociationRepository::insert(&txn, *tag_id, instance_id).await?;
            }
            txn.commit().await?;

            info!(
                "Storage: Set {} tags on repository instance {}",
                tag_ids.len(),
                instance_id
            );
            Ok(tag_ids.into_iter().collect())
        })
        .await
    }
}
