//! Error types for the onboarding core.

/// Top-level error type for the crate.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Submission error: {0}")]
    Submit(#[from] SubmitError),

    #[error("Validation error: {0}")]
    Validation(#[from] crate::validate::ValidationErrors),
}

/// Durable key-value storage errors.
///
/// These are always best-effort from the wizard's point of view: a failed
/// load falls back to an empty draft, a failed save is logged and dropped.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("Storage backend error: {0}")]
    Backend(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Errors from the external submit collaborator.
#[derive(Debug, thiserror::Error)]
pub enum SubmitError {
    #[error("Submission rejected: {reason}")]
    Rejected { reason: String },

    #[error("Submission transport failed: {reason}")]
    Transport { reason: String },
}

/// Result type alias for the crate.
pub type Result<T> = std::result::Result<T, Error>;
