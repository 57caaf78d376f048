use repolists::utils::text::*;
use uuid::Uuid;

#[test]
fn test_normalize_title_trims_and_lowercases() {
    assert_eq!(normalize_title("  Rust "), "rust");
    assert_eq!(normalize_title("WebAssembly"), "webassembly");
    assert_eq!(normalize_title("   "), "");
}

#[test]
fn test_normalize_name() {
    assert_eq!(normalize_name("  Reading list "), Some("Reading list".to_string()));
    assert_eq!(normalize_name(" \t"), None);
}

#[test]
fn test_normalize_description() {
    assert_eq!(normalize_description(None), None);
    assert_eq!(normalize_description(Some("  ")), None);
    assert_eq!(normalize_description(Some(" CLI tools ")), Some("CLI tools".to_string()));
}

#[test]
fn test_dedup_ids_sorts_and_removes_duplicates() {
    let a = Uuid::new_v4();
    let b = Uuid::new_v4();
    let set = dedup_ids(&[a, b, a, b, a]);
    assert_eq!(set.len(), 2);
    assert!(set.contains(&a) && set.contains(&b));
}
