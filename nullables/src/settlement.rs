//! Nullable settlement: record submissions without touching a chain.

use gdao_types::{Settlement, SettlementError, SettlementRequest, TransactionId};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;
use std::time::Duration;

/// A settlement collaborator that records every request and answers with
/// sequential transaction ids (`"null-tx-1"`, `"null-tx-2"`, ...).
///
/// Failures can be queued with [`NullSettlement::fail_next`] and every call
/// can be slowed down with [`NullSettlement::set_delay`] to exercise
/// timeouts and cancellation.
#[derive(Debug, Default)]
pub struct NullSettlement {
    submitted: Mutex<Vec<SettlementRequest>>,
    failures: Mutex<VecDeque<SettlementError>>,
    delay: Mutex<Option<Duration>>,
    next_tx: AtomicU64,
}

impl NullSettlement {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the next submission fail with `error`.
    pub fn fail_next(&self, error: SettlementError) {
        self.failures.lock().unwrap().push_back(error);
    }

    /// Sleep this long before answering each submission.
    pub fn set_delay(&self, delay: Duration) {
        *self.delay.lock().unwrap() = Some(delay);
    }

    /// Every request accepted so far (successful ones only).
    pub fn submitted(&self) -> Vec<SettlementRequest> {
        self.submitted.lock().unwrap().clone()
    }

    /// Clear all state.
    pub fn reset(&self) {
        self.submitted.lock().unwrap().clear();
        self.failures.lock().unwrap().clear();
        *self.delay.lock().unwrap() = None;
    }
}

impl Settlement for NullSettlement {
    async fn submit_on_chain(
        &self,
        request: &SettlementRequest,
    ) -> Result<TransactionId, SettlementError> {
        let delay = *self.delay.lock().unwrap();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        let failure = self.failures.lock().unwrap().pop_front();
        if let Some(error) = failure {
            return Err(error);
        }
        self.submitted.lock().unwrap().push(request.clone());
        let n = self.next_tx.fetch_add(1, Ordering::SeqCst) + 1;
        Ok(TransactionId(format!("null-tx-{n}")))
    }
}
