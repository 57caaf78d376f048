//! Normalization helpers for user-supplied text and id collections.

use std::collections::BTreeSet;
use uuid::Uuid;

/// Normalize a tag title: surrounding whitespace is dropped and the title is
/// lowercased so that "Rust" and " rust " name the same tag.
pub fn normalize_title(title: &str) -> String {
    title.trim().to_lowercase()
}

/// Trim a required name. Returns `None` when nothing is left.
pub fn normalize_name(name: &str) -> Option<String> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

/// Trim an optional description; blank descriptions are stored as `None`.
pub fn normalize_description(description: Option<&str>) -> Option<String> {
    description.and_then(normalize_name)
}

/// Deduplicate ids into a sorted set.
pub fn dedup_ids<'a, I>(ids: I) -> BTreeSet<Uuid>
where
    I: IntoIterator<Item = &'a Uuid>,
{
    ids.into_iter().copied().collect()
}
