//! Service-level error taxonomy.
//!
//! Guard refusals carry their human-readable reason through unchanged;
//! engine invariant violations and storage codec failures collapse into
//! [`ApiError::Internal`], whose `Display` never exposes the detail. The
//! detail stays on the variant for the service to log.

use thiserror::Error;

use tharsis_core::{ApplyError, StateError};

use crate::store::StoreError;

/// Errors surfaced to API callers.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The action guard refused the submission. The message is written for
    /// the player who sent it.
    #[error("illegal action: {0}")]
    IllegalAction(String),

    #[error("{0} not found")]
    NotFound(String),

    #[error("forbidden: {0}")]
    Forbidden(String),

    /// Another submission committed first. Retryable: reload the game at
    /// its new version and submit again.
    #[error("stale version: expected {expected}, found {found}")]
    Conflict { expected: u64, found: u64 },

    /// Something that should be impossible happened. The detail is for the
    /// server log, not the caller.
    #[error("internal server error")]
    Internal(String),
}

impl ApiError {
    /// Whether the caller can expect a retry of the same request to
    /// succeed after refreshing its view.
    pub fn is_retryable(&self) -> bool {
        matches!(self, ApiError::Conflict { .. })
    }
}

impl From<ApplyError> for ApiError {
    fn from(err: ApplyError) -> Self {
        match err {
            ApplyError::Illegal(reason) => ApiError::IllegalAction(reason.to_string()),
            ApplyError::Invariant(detail) => ApiError::Internal(detail.to_string()),
        }
    }
}

impl From<StateError> for ApiError {
    fn from(err: StateError) -> Self {
        // A stored snapshot that no longer hydrates is corrupt storage,
        // never a caller mistake.
        ApiError::Internal(err.to_string())
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Missing(id) => ApiError::NotFound(format!("game {id}")),
            StoreError::Exists(id) => ApiError::Forbidden(format!("game {id} already exists")),
            StoreError::VersionConflict { expected, found } => {
                ApiError::Conflict { expected, found }
            }
            StoreError::Codec(detail) => ApiError::Internal(detail),
        }
    }
}
