mod common;

use repolists::catalog::UpdateTagArgs;
use repolists::constants::DEFAULT_TAG_COLOR;
use uuid::Uuid;

#[tokio::test]
async fn test_upsert_tag_normalizes_and_reuses() {
    let catalog = common::catalog().await;
    let user = Uuid::new_v4();

    let first = catalog.upsert_tag(user, "  Rust ", None).await.unwrap();
    assert_eq!(first.title, "rust");
    assert_eq!(first.color, DEFAULT_TAG_COLOR);

    // Same title in another case resolves to the same tag; color is applied
    let second = catalog.upsert_tag(user, "RUST", Some("#ff0000")).await.unwrap();
    assert_eq!(second.id, first.id);
    assert_eq!(second.color, "#ff0000");

    assert_eq!(catalog.get_tags_by_user(user).await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_upsert_tag_rejects_blank_title() {
    let catalog = common::catalog().await;
    let err = catalog.upsert_tag(Uuid::new_v4(), "   ", None).await.unwrap_err();
    assert!(err.is_validation());
}

#[tokio::test]
async fn test_tags_are_scoped_per_user() {
    let catalog = common::catalog().await;
    let alice = Uuid::new_v4();
    let bob = Uuid::new_v4();

    let a = common::tag(&catalog, alice, "go").await;
    let b = common::tag(&catalog, bob, "go").await;
    assert_ne!(a, b);

    let alice_tags = catalog.get_tags_by_user(alice).await.unwrap();
    assert_eq!(alice_tags.len(), 1);
    assert_eq!(alice_tags[0].id, a);

    // Lookup by id only returns the caller's tags and skips unknown ids
    let by_ids = catalog.get_tags_by_ids(alice, &[a, b, Uuid::new_v4()]).await.unwrap();
    assert_eq!(by_ids.len(), 1);
    assert_eq!(by_ids[0].id, a);
    assert!(catalog.get_tags_by_ids(Uuid::new_v4(), &[a, b]).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_update_tag() {
    let catalog = common::catalog().await;
    let user = Uuid::new_v4();
    let go = common::tag(&catalog, user, "go").await;
    common::tag(&catalog, user, "rust").await;

    let updated = catalog
        .update_tag(
            user,
            go,
            UpdateTagArgs {
                title: Some("Golang".to_string()),
                color: Some("#00add8".to_string()),
            },
        )
        .await
        .unwrap();
    assert_eq!(updated.title, "golang");
    assert_eq!(updated.color, "#00add8");

    // Renaming onto an existing title conflicts
    let err = catalog
        .update_tag(
            user,
            go,
            UpdateTagArgs {
                title: Some("rust".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
    assert!(err.is_conflict());

    // Another user's tag is not found
    let err = catalog
        .update_tag(Uuid::new_v4(), go, UpdateTagArgs::default())
        .await
        .unwrap_err();
    assert!(err.is_not_found());
}

#[tokio::test]
async fn test_delete_tag_removes_associations() {
    let catalog = common::catalog().await;
    let user = Uuid::new_v4();
    let go = common::tag(&catalog, user, "go").await;
    common::tagged_repo(&catalog, user, "golang/go", &[go]).await;
    assert_eq!(catalog.get_associations_by_user(user).await.unwrap().len(), 1);

    // Other users cannot delete it
    assert!(catalog.delete_tag(Uuid::new_v4(), go).await.unwrap_err().is_not_found());

    catalog.delete_tag(user, go).await.unwrap();
    assert!(catalog.get_tags_by_user(user).await.unwrap().is_empty());
    assert!(catalog.get_associations_by_user(user).await.unwrap().is_empty());
}
