// ⚠️ Error Taxonomy - every failure is an explicit value
//
// Unauthorized   → no verified owner identity (or a foreign account on create)
// InvalidRange   → malformed or inverted date bounds, names the field
// NotFound       → single-row target missing OR owned by someone else
// Validation     → malformed mutation input
// StorageFailure → SQLite failed; never retried here

use thiserror::Error;

/// Errors surfaced by the ledger core.
#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("Unauthorized")]
    Unauthorized,

    #[error("Invalid date range: {field}: {reason}")]
    InvalidRange { field: &'static str, reason: String },

    /// Absent and not-owned rows deliberately share this variant.
    #[error("Not found")]
    NotFound,

    #[error("Invalid {field}: {reason}")]
    Validation { field: &'static str, reason: String },

    #[error("Storage failure: {0}")]
    StorageFailure(#[from] rusqlite::Error),
}

impl LedgerError {
    pub fn invalid_range(field: &'static str, reason: impl Into<String>) -> Self {
        LedgerError::InvalidRange {
            field,
            reason: reason.into(),
        }
    }

    pub fn validation(field: &'static str, reason: impl Into<String>) -> Self {
        LedgerError::Validation {
            field,
            reason: reason.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, LedgerError>;
