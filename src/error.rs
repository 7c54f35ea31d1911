//! Error types for the collaboration core

use thiserror::Error;

/// Result type for collaboration operations
pub type Result<T> = std::result::Result<T, SyncError>;

/// A step that could not be applied to a document.
///
/// Returned by [`Step::apply`](crate::Step::apply) instead of panicking, so
/// callers can decide whether a failed step is fatal or simply dropped.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{0}")]
pub struct StepError(pub String);

impl StepError {
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}

/// Errors surfaced to the host editor
#[derive(Debug, Error)]
pub enum SyncError {
    /// Inbound batch does not start at the replica's confirmed version
    #[error("Version mismatch: replica is at {expected}, batch starts at {received}")]
    VersionMismatch { expected: u64, received: u64 },

    /// Inbound batch has a different number of steps and client ids
    #[error("Malformed batch: {steps} steps but {client_ids} client ids")]
    MalformedBatch { steps: usize, client_ids: usize },

    /// The host tried to swap out the document while a session is active
    #[error("Document cannot be replaced during a collaborative session")]
    DocumentReplaced,

    /// Transaction was built against a different document than the current one
    #[error("Transaction does not start at the current document")]
    StaleTransaction,

    /// A step that must apply (inverse or confirmed step) failed
    #[error("Step failed: {0}")]
    Step(#[from] StepError),

    /// Wire message could not be encoded or decoded
    #[error("Protocol error: {0}")]
    Protocol(String),
}
