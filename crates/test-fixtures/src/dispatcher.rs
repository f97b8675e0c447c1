use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use chrono::Utc;

use warden_core::errors::DispatchError;
use warden_core::models::TakedownRequest;
use warden_core::traits::{DispatchReceipt, INoticeDispatcher};

/// How a [`ScriptedDispatcher`] answers each call.
#[derive(Debug, Clone)]
pub enum DispatchScript {
    AlwaysSucceed,
    AlwaysFail(DispatchError),
    /// Fail the first `n` calls, then succeed.
    FailTimes(u32, DispatchError),
    /// Never answer (exercises the dispatch timeout).
    Hang,
}

/// In-memory dispatcher that follows a script and records every call.
///
/// Deliveries are idempotent on the request's key: a second successful
/// send with the same key returns the original receipt.
pub struct ScriptedDispatcher {
    script: DispatchScript,
    delay: Option<Duration>,
    failing_cases: HashSet<String>,
    calls: AtomicU32,
    keys: Mutex<Vec<String>>,
    delivered: Mutex<HashMap<String, DispatchReceipt>>,
}

impl ScriptedDispatcher {
    pub fn new(script: DispatchScript) -> Self {
        Self {
            script,
            delay: None,
            failing_cases: HashSet::new(),
            calls: AtomicU32::new(0),
            keys: Mutex::new(Vec::new()),
            delivered: Mutex::new(HashMap::new()),
        }
    }

    pub fn succeeding() -> Self {
        Self::new(DispatchScript::AlwaysSucceed)
    }

    pub fn failing() -> Self {
        Self::new(DispatchScript::AlwaysFail(DispatchError::Network {
            reason: "connection reset".to_string(),
        }))
    }

    /// Sleep before answering each call.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Refuse delivery for one case regardless of the script.
    pub fn with_failing_case(mut self, case_id: &str) -> Self {
        self.failing_cases.insert(case_id.to_string());
        self
    }

    pub fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }

    /// Idempotency keys seen, one entry per call.
    pub fn keys(&self) -> Vec<String> {
        self.keys.lock().expect("keys lock").clone()
    }

    /// Distinct notices actually delivered.
    pub fn delivered_count(&self) -> usize {
        self.delivered.lock().expect("delivered lock").len()
    }

    fn answer(&self, call: u32, request: &TakedownRequest) -> Result<DispatchReceipt, DispatchError> {
        if self.failing_cases.contains(&request.case_id) {
            return Err(DispatchError::Refused {
                reason: format!("platform refused notice for {}", request.case_id),
            });
        }
        match &self.script {
            DispatchScript::AlwaysFail(err) => return Err(err.clone()),
            DispatchScript::FailTimes(n, err) if call <= *n => return Err(err.clone()),
            _ => {}
        }
        let mut delivered = self.delivered.lock().expect("delivered lock");
        let receipt = delivered
            .entry(request.idempotency_key.clone())
            .or_insert_with(|| DispatchReceipt {
                reference: format!("notice-{}", uuid::Uuid::new_v4()),
                delivered_at: Utc::now(),
            });
        Ok(receipt.clone())
    }
}

impl INoticeDispatcher for ScriptedDispatcher {
    async fn send(&self, request: &TakedownRequest) -> Result<DispatchReceipt, DispatchError> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        self.keys
            .lock()
            .expect("keys lock")
            .push(request.idempotency_key.clone());
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if matches!(self.script, DispatchScript::Hang) {
            std::future::pending::<()>().await;
        }
        self.answer(call, request)
    }
}
