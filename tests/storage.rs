use repolists::catalog::{CatalogService, NewRepository};
use repolists::config::DatabaseConfig;
use repolists::storage::LocalStorage;
use uuid::Uuid;

#[tokio::test]
async fn test_in_memory_storage_creation() {
    let storage = LocalStorage::in_memory().await;
    assert!(storage.is_ok(), "LocalStorage should be created successfully");
    assert!(!storage.unwrap().has_data().await.unwrap());
}

#[tokio::test]
async fn test_file_storage_persists_between_opens() {
    let temp_dir = std::env::temp_dir().join(format!("repolists_test_db_{}", Uuid::new_v4()));
    let config = DatabaseConfig {
        url: format!("sqlite://{}?mode=rwc", temp_dir.join("nested").join("repolists.db").display()),
        max_connections: 2,
    };
    let user = Uuid::new_v4();

    {
        let storage = LocalStorage::new(&config).await.unwrap();
        let catalog = CatalogService::new(storage, None);
        catalog
            .add_repository(user, NewRepository::github("rust-lang/rust"))
            .await
            .unwrap();
    }

    // Reopening runs the schema bootstrap again without touching existing rows
    let storage = LocalStorage::new(&config).await.unwrap();
    assert!(storage.has_data().await.unwrap());
    let catalog = CatalogService::new(storage, None);
    let instances = catalog.get_repository_instances_by_user(user).await.unwrap();
    assert_eq!(instances.len(), 1);
    assert_eq!(instances[0].1.full_name, "rust-lang/rust");

    let _ = std::fs::remove_dir_all(&temp_dir);
}
