#![allow(dead_code)]

use repolists::catalog::{CatalogService, NewRepository};
use repolists::storage::LocalStorage;
use uuid::Uuid;

/// Service over a fresh in-memory database with no timeout.
pub async fn catalog() -> CatalogService {
    let storage = LocalStorage::in_memory().await.unwrap();
    CatalogService::new(storage, None)
}

pub async fn tag(catalog: &CatalogService, user: Uuid, title: &str) -> Uuid {
    catalog.upsert_tag(user, title, None).await.unwrap().id
}

pub async fn repo(catalog: &CatalogService, user: Uuid, full_name: &str) -> Uuid {
    let (instance, _) = catalog
        .add_repository(user, NewRepository::github(full_name))
        .await
        .unwrap();
    instance.id
}

/// Add a repository and attach the given tags to it.
pub async fn tagged_repo(catalog: &CatalogService, user: Uuid, full_name: &str, tags: &[Uuid]) -> Uuid {
    let instance = repo(catalog, user, full_name).await;
    catalog.set_repository_tags(user, instance, tags).await.unwrap();
    instance
}

/// Full names of the members of a list, in resolution order.
pub async fn member_names(catalog: &CatalogService, user: Uuid, list: Uuid) -> Vec<String> {
    catalog
        .resolve_list_membership(user, list)
        .await
        .unwrap()
        .into_iter()
        .map(|member| member.repository.full_name)
        .collect()
}
