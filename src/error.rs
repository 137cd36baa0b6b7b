//! Error types for the client/billing core.
//!
//! The taxonomy is deliberately small: input the core rejects, referential
//! guards that block a destructive operation, unknown record ids, and
//! persistence failures.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Validation failed: {0}")]
    Validation(String),

    /// A delete was blocked because other records still reference the target.
    /// `blocking` is the count reported back to the user.
    #[error("{entity} is still referenced by {blocking} record(s)")]
    ReferentialConflict { entity: &'static str, blocking: usize },

    /// Unknown record id on update/delete. These fail loudly rather than
    /// silently no-opping, so callers can surface the miss.
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialize(#[from] serde_json::Error),
}

impl AppError {
    pub fn not_found(entity: &'static str, id: &str) -> Self {
        AppError::NotFound {
            entity,
            id: id.to_string(),
        }
    }

    /// True if the operation was blocked by a referential guard rather than
    /// bad input or a missing record.
    pub fn is_conflict(&self) -> bool {
        matches!(self, AppError::ReferentialConflict { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_conflict_message_reports_count() {
        let err = AppError::ReferentialConflict {
            entity: "category",
            blocking: 3,
        };
        assert!(err.is_conflict());
        assert!(err.to_string().contains('3'));
    }

    #[test]
    fn test_not_found_helper() {
        let err = AppError::not_found("client", "abc");
        assert!(err.to_string().contains("client"));
        assert!(err.to_string().contains("abc"));
    }
}
