/// Failures reported by the notice dispatcher.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum DispatchError {
    #[error("dispatch timed out after {after_ms}ms")]
    Timeout { after_ms: u64 },

    #[error("network error: {reason}")]
    Network { reason: String },

    #[error("delivery refused by recipient: {reason}")]
    Refused { reason: String },

    #[error("dispatch retries exhausted after {attempts} attempts: {last_error}")]
    RetriesExhausted { attempts: u32, last_error: String },
}

impl DispatchError {
    /// Timeouts and network failures are retried; a refusal is final.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            DispatchError::Timeout { .. } | DispatchError::Network { .. }
        )
    }
}
