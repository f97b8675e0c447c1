use std::future::Future;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::errors::DispatchError;
use crate::models::TakedownRequest;

/// Delivery confirmation from the notice dispatcher.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DispatchReceipt {
    /// Dispatcher-side reference for the delivered notice.
    pub reference: String,
    pub delivered_at: DateTime<Utc>,
}

/// Sends takedown notices. Implementations must be idempotent on
/// `request.idempotency_key`: resending the same key never produces a second notice.
pub trait INoticeDispatcher: Send + Sync {
    fn send(
        &self,
        request: &TakedownRequest,
    ) -> impl Future<Output = Result<DispatchReceipt, DispatchError>> + Send;
}
