//! Error types for store and resolution operations.

use std::fmt;
use std::time::Duration;

use sea_orm::{DbErr, SqlErr};
use thiserror::Error;
use uuid::Uuid;

/// Format offending ids for display, capping the output so a large rejected
/// request does not flood logs or responses.
fn format_ids(ids: &[Uuid]) -> String {
    const MAX_DISPLAYED: usize = 5;
    let shown: Vec<String> = ids.iter().take(MAX_DISPLAYED).map(Uuid::to_string).collect();
    if ids.len() <= MAX_DISPLAYED {
        format!("[{}]", shown.join(", "))
    } else {
        format!("[{}] (and {} more)", shown.join(", "), ids.len() - MAX_DISPLAYED)
    }
}

/// A request was rejected before any storage write.
///
/// Carries the specific tag and repository-instance ids that do not belong to
/// the requesting user so the caller can correct the request.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ValidationError {
    pub reason: String,
    pub invalid_tag_ids: Vec<Uuid>,
    pub invalid_repository_ids: Vec<Uuid>,
}

impl ValidationError {
    /// Rejection of a scalar field, with no offending ids.
    pub fn field(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
            ..Self::default()
        }
    }

    /// Rejection of references the user does not own. Ids are sorted so the
    /// report is stable.
    pub fn unowned(mut invalid_tag_ids: Vec<Uuid>, mut invalid_repository_ids: Vec<Uuid>) -> Self {
        invalid_tag_ids.sort();
        invalid_repository_ids.sort();
        Self {
            reason: "referenced ids are not owned by the requesting user".to_string(),
            invalid_tag_ids,
            invalid_repository_ids,
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.reason)?;
        if !self.invalid_tag_ids.is_empty() {
            write!(f, "; invalid tag ids: {}", format_ids(&self.invalid_tag_ids))?;
        }
        if !self.invalid_repository_ids.is_empty() {
            write!(f, "; invalid repository ids: {}", format_ids(&self.invalid_repository_ids))?;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationError {}

/// Errors raised by the tag, repository and list stores and by membership
/// resolution.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("validation failed: {0}")]
    Validation(#[from] ValidationError),

    /// Also returned when the row exists but belongs to another user.
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: Uuid },

    #[error("conflict: {0}")]
    Conflict(String),

    #[error("storage error: {0}")]
    Storage(DbErr),

    #[error("operation timed out after {0:?}")]
    Timeout(Duration),
}

impl StoreError {
    pub fn not_found(entity: &'static str, id: Uuid) -> Self {
        Self::NotFound { entity, id }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }

    pub fn is_conflict(&self) -> bool {
        matches!(self, Self::Conflict(_))
    }
}

impl From<DbErr> for StoreError {
    fn from(err: DbErr) -> Self {
        match err.sql_err() {
            Some(SqlErr::UniqueConstraintViolation(detail)) => Self::Conflict(detail),
            _ => Self::Storage(err),
        }
    }
}

/// Result type for store operations.
pub type StoreResult<T> = std::result::Result<T, StoreError>;
