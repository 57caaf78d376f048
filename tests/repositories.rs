mod common;

use repolists::catalog::NewRepository;
use uuid::Uuid;

#[tokio::test]
async fn test_add_repository_is_idempotent() {
    let catalog = common::catalog().await;
    let user = Uuid::new_v4();

    let (first, repository) = catalog
        .add_repository(user, NewRepository::github("tokio-rs/tokio"))
        .await
        .unwrap();
    assert_eq!(repository.provider, "github");
    assert_eq!(repository.full_name, "tokio-rs/tokio");
    assert_eq!(first.user_id, user);
    assert_eq!(first.repository_id, repository.id);

    let (second, _) = catalog
        .add_repository(user, NewRepository::github(" tokio-rs/tokio "))
        .await
        .unwrap();
    assert_eq!(second.id, first.id);
    assert_eq!(catalog.get_repository_instances_by_user(user).await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_canonical_repository_is_shared_between_users() {
    let catalog = common::catalog().await;
    let alice = Uuid::new_v4();
    let bob = Uuid::new_v4();

    let (a, repo_a) = catalog
        .add_repository(alice, NewRepository::github("serde-rs/serde"))
        .await
        .unwrap();
    let mut new_repository = NewRepository::github("serde-rs/serde");
    new_repository.description = Some("Serialization framework".to_string());
    let (b, repo_b) = catalog.add_repository(bob, new_repository).await.unwrap();

    assert_ne!(a.id, b.id);
    assert_eq!(repo_a.id, repo_b.id);
    assert_eq!(repo_b.description.as_deref(), Some("Serialization framework"));
}

#[tokio::test]
async fn test_add_repository_rejects_blank_name() {
    let catalog = common::catalog().await;
    let err = catalog
        .add_repository(Uuid::new_v4(), NewRepository::github(""))
        .await
        .unwrap_err();
    assert!(err.is_validation());
}

#[tokio::test]
async fn test_instances_by_user_ordered_by_full_name() {
    let catalog = common::catalog().await;
    let user = Uuid::new_v4();
    for name in ["zed/zed", "alpha/beta", "mid/way"] {
        common::repo(&catalog, user, name).await;
    }
    common::repo(&catalog, Uuid::new_v4(), "other/user").await;

    let names: Vec<String> = catalog
        .get_repository_instances_by_user(user)
        .await
        .unwrap()
        .into_iter()
        .map(|(_, repository)| repository.full_name)
        .collect();
    assert_eq!(names, vec!["alpha/beta", "mid/way", "zed/zed"]);
}

#[tokio::test]
async fn test_remove_repository() {
    let catalog = common::catalog().await;
    let user = Uuid::new_v4();
    let go = common::tag(&catalog, user, "go").await;
    let instance = common::tagged_repo(&catalog, user, "golang/go", &[go]).await;

    // Foreign users get not-found and change nothing
    let err = catalog.remove_repository(Uuid::new_v4(), instance).await.unwrap_err();
    assert!(err.is_not_found());
    assert_eq!(catalog.get_repository_instances_by_ids(user, &[instance]).await.unwrap().len(), 1);

    catalog.remove_repository(user, instance).await.unwrap();
    assert!(catalog.get_repository_instances_by_ids(user, &[instance]).await.unwrap().is_empty());
    assert!(catalog.get_associations_by_user(user).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_associations() {
    let catalog = common::catalog().await;
    let user = Uuid::new_v4();
    let go = common::tag(&catalog, user, "go").await;
    let cli = common::tag(&catalog, user, "cli").await;
    let instance = common::repo(&catalog, user, "cli/cli").await;

    catalog.tag_repository(user, go, instance).await.unwrap();
    // Tagging twice is a no-op
    catalog.tag_repository(user, go, instance).await.unwrap();
    assert_eq!(catalog.get_associations_by_user(user).await.unwrap(), vec![(go, instance)]);

    let tags = catalog.set_repository_tags(user, instance, &[cli, cli]).await.unwrap();
    assert_eq!(tags, vec![cli]);
    assert_eq!(catalog.get_associations_by_user(user).await.unwrap(), vec![(cli, instance)]);

    assert!(catalog.untag_repository(user, cli, instance).await.unwrap());
    assert!(!catalog.untag_repository(user, cli, instance).await.unwrap());
    assert!(catalog.get_associations_by_user(user).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_associations_reject_foreign_ids() {
    let catalog = common::catalog().await;
    let alice = Uuid::new_v4();
    let bob = Uuid::new_v4();
    let bobs_tag = common::tag(&catalog, bob, "private").await;
    let instance = common::repo(&catalog, alice, "alice/repo").await;

    let err = catalog.tag_repository(alice, bobs_tag, instance).await.unwrap_err();
    match err {
        repolists::StoreError::Validation(validation) => {
            assert_eq!(validation.invalid_tag_ids, vec![bobs_tag]);
            assert!(validation.invalid_repository_ids.is_empty());
        }
        other => panic!("expected validation error, got {other}"),
    }
    assert!(catalog.get_associations_by_user(bob).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_instances_by_ids_are_scoped_to_user() {
    let catalog = common::catalog().await;
    let alice = Uuid::new_v4();
    let bob = Uuid::new_v4();
    let alices = common::repo(&catalog, alice, "alice/repo").await;
    let bobs = common::repo(&catalog, bob, "bob/repo").await;

    let found = catalog
        .get_repository_instances_by_ids(alice, &[alices, bobs, Uuid::new_v4()])
        .await
        .unwrap();
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].id, alices);
    assert!(catalog.get_repository_instances_by_ids(bob, &[alices]).await.unwrap().is_empty());
}
