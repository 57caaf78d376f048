mod common;

use std::collections::HashSet;

use repolists::catalog::{CatalogService, CreateListArgs, NewRepository};
use repolists::config::DatabaseConfig;
use repolists::storage::LocalStorage;
use uuid::Uuid;

const TASKS: usize = 16;

/// File-backed catalog with the default pool size, so requests really run on
/// separate connections.
async fn file_catalog(name: &str) -> (CatalogService, std::path::PathBuf) {
    let temp_dir = std::env::temp_dir().join(format!("repolists_test_{}_{}", name, Uuid::new_v4()));
    let config = DatabaseConfig {
        url: format!("sqlite://{}?mode=rwc", temp_dir.join("repolists.db").display()),
        ..DatabaseConfig::default()
    };
    let storage = LocalStorage::new(&config).await.unwrap();
    (CatalogService::new(storage, None), temp_dir)
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_list_creation_waits_for_writer() {
    let (catalog, temp_dir) = file_catalog("lists").await;
    let user = Uuid::new_v4();
    let go = common::tag(&catalog, user, "go").await;
    common::tagged_repo(&catalog, user, "golang/go", &[go]).await;

    let handles: Vec<_> = (0..TASKS)
        .map(|i| {
            let catalog = catalog.clone();
            tokio::spawn(async move {
                catalog
                    .create_list(
                        user,
                        CreateListArgs {
                            name: format!("List {}", i),
                            include_tag_ids: vec![go],
                            ..Default::default()
                        },
                    )
                    .await
            })
        })
        .collect();

    let mut failures = Vec::new();
    for handle in handles {
        if let Err(err) = handle.await.unwrap() {
            failures.push(err.to_string());
        }
    }
    assert!(failures.is_empty(), "failed {} of {}: {:?}", failures.len(), TASKS, failures);

    let lists = catalog.list_lists(user).await.unwrap();
    assert_eq!(lists.len(), TASKS);
    for list in lists {
        assert_eq!(common::member_names(&catalog, user, list.id).await, vec!["golang/go"]);
    }

    let _ = std::fs::remove_dir_all(&temp_dir);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_upserts_share_one_tag() {
    let (catalog, temp_dir) = file_catalog("tags").await;
    let user = Uuid::new_v4();

    let handles: Vec<_> = (0..TASKS)
        .map(|_| {
            let catalog = catalog.clone();
            tokio::spawn(async move { catalog.upsert_tag(user, "Rust", None).await })
        })
        .collect();

    let mut ids = HashSet::new();
    for handle in handles {
        ids.insert(handle.await.unwrap().unwrap().id);
    }
    assert_eq!(ids.len(), 1);
    assert_eq!(catalog.get_tags_by_user(user).await.unwrap().len(), 1);

    let _ = std::fs::remove_dir_all(&temp_dir);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_adds_share_one_instance() {
    let (catalog, temp_dir) = file_catalog("repos").await;
    let alice = Uuid::new_v4();
    let bob = Uuid::new_v4();

    let handles: Vec<_> = (0..TASKS)
        .map(|i| {
            let catalog = catalog.clone();
            let user = if i % 2 == 0 { alice } else { bob };
            tokio::spawn(async move {
                catalog
                    .add_repository(user, NewRepository::github("tokio-rs/tokio"))
                    .await
            })
        })
        .collect();

    let mut instances = HashSet::new();
    let mut repositories = HashSet::new();
    for handle in handles {
        let (instance, repository) = handle.await.unwrap().unwrap();
        instances.insert(instance.id);
        repositories.insert(repository.id);
    }
    // One instance per user, one shared canonical repository
    assert_eq!(instances.len(), 2);
    assert_eq!(repositories.len(), 1);

    let _ = std::fs::remove_dir_all(&temp_dir);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_reads_run_alongside_writes() {
    let (catalog, temp_dir) = file_catalog("mixed").await;
    let user = Uuid::new_v4();
    let list = catalog
        .create_list(
            user,
            CreateListArgs {
                name: "Everything".to_string(),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    let writers: Vec<_> = (0..TASKS)
        .map(|i| {
            let catalog = catalog.clone();
            tokio::spawn(async move {
                catalog
                    .add_repository(user, NewRepository::github(format!("owner/repo-{:02}", i)))
                    .await
                    .map(|_| ())
            })
        })
        .collect();
    let readers: Vec<_> = (0..TASKS)
        .map(|_| {
            let catalog = catalog.clone();
            let list_id = list.list.id;
            tokio::spawn(async move { catalog.resolve_list_membership(user, list_id).await.map(|_| ()) })
        })
        .collect();

    for handle in writers.into_iter().chain(readers) {
        handle.await.unwrap().unwrap();
    }
    assert_eq!(common::member_names(&catalog, user, list.list.id).await.len(), TASKS);

    let _ = std::fs::remove_dir_all(&temp_dir);
}
