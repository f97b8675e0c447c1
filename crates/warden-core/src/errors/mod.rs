mod dispatch_error;
mod policy_error;
mod storage_error;
mod transition_error;

pub use dispatch_error::DispatchError;
pub use policy_error::PolicyError;
pub use storage_error::StorageError;
pub use transition_error::TransitionError;

/// Top-level error for every Warden operation.
#[derive(Debug, thiserror::Error)]
pub enum WardenError {
    #[error("case not found: {id}")]
    CaseNotFound { id: String },

    #[error("takedown request not found: {id}")]
    TakedownNotFound { id: String },

    #[error("batch job not found: {id}")]
    BatchNotFound { id: String },

    #[error("timed out after {after_ms}ms waiting for the lock on case {case_id}")]
    LockTimeout { case_id: String, after_ms: u64 },

    #[error("validation error: {0}")]
    ValidationError(String),

    #[error(transparent)]
    TransitionError(#[from] TransitionError),

    #[error(transparent)]
    PolicyError(#[from] PolicyError),

    #[error(transparent)]
    DispatchError(#[from] DispatchError),

    #[error(transparent)]
    StorageError(#[from] StorageError),

    #[error("serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("config error: {0}")]
    ConfigError(String),
}

impl WardenError {
    /// Whether this error is a conflict with the current case state
    /// (the caller should re-read and reconcile rather than retry blindly).
    pub fn is_conflict(&self) -> bool {
        matches!(self, WardenError::TransitionError(_))
    }

    /// Whether the operation may succeed if retried unchanged.
    pub fn is_transient(&self) -> bool {
        match self {
            WardenError::DispatchError(e) => e.is_retryable(),
            WardenError::StorageError(StorageError::Busy { .. }) => true,
            WardenError::LockTimeout { .. } => true,
            _ => false,
        }
    }
}

/// Convenience alias used throughout the workspace.
pub type WardenResult<T> = Result<T, WardenError>;
