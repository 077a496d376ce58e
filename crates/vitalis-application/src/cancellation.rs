//! Supersession of in-flight send requests.
//!
//! At most one send is live at a time. Starting a new one cancels the
//! previous token. Cancellation is cooperative: adapters receive the token and
//! should stop, and the orchestrator never commits the result of a cancelled
//! request even if the adapter ignores it.

use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio_util::sync::CancellationToken;

/// Handle for one send request.
#[derive(Debug, Clone)]
pub struct RequestToken {
    id: u64,
    token: CancellationToken,
}

impl RequestToken {
    pub fn id(&self) -> u64 {
        self.id
    }

    /// The token to pass to adapters.
    pub fn token(&self) -> &CancellationToken {
        &self.token
    }

    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Resolves once the request is cancelled.
    pub async fn cancelled(&self) {
        self.token.cancelled().await
    }
}

/// Tracks the single live send request.
#[derive(Debug, Default)]
pub struct CancellationController {
    current: Mutex<Option<RequestToken>>,
    next_id: AtomicU64,
}

impl CancellationController {
    pub fn new() -> Self {
        Self::default()
    }

    fn slot(&self) -> std::sync::MutexGuard<'_, Option<RequestToken>> {
        // The slot holds plain data, so a poisoned lock is still consistent.
        self.current.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Cancels the live request, if any, and registers a fresh one.
    pub fn begin(&self) -> RequestToken {
        let request = RequestToken {
            id: self.next_id.fetch_add(1, Ordering::Relaxed) + 1,
            token: CancellationToken::new(),
        };

        let mut slot = self.slot();
        if let Some(previous) = slot.replace(request.clone()) {
            tracing::debug!(
                "[CancellationController] Request {} superseded by {}",
                previous.id,
                request.id
            );
            previous.token.cancel();
        }

        request
    }

    /// Cancels the live request without starting another.
    pub fn cancel_current(&self) {
        if let Some(previous) = self.slot().take() {
            tracing::debug!("[CancellationController] Request {} cancelled", previous.id);
            previous.token.cancel();
        }
    }

    /// Marks `request` finished. Leaves the slot alone if it was superseded.
    pub fn finish(&self, request: &RequestToken) {
        let mut slot = self.slot();
        if slot.as_ref().is_some_and(|live| live.id == request.id) {
            *slot = None;
        }
    }

    /// True if `request` is still the live one.
    pub fn is_current(&self, request: &RequestToken) -> bool {
        self.slot().as_ref().is_some_and(|live| live.id == request.id)
    }

    pub fn has_in_flight(&self) -> bool {
        self.slot().is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_begin_supersedes_previous() {
        let controller = CancellationController::new();
        let first = controller.begin();
        let second = controller.begin();

        assert!(first.is_cancelled());
        assert!(!second.is_cancelled());
        assert!(!controller.is_current(&first));
        assert!(controller.is_current(&second));
    }

    #[test]
    fn test_finish_of_stale_request_keeps_live_one() {
        let controller = CancellationController::new();
        let first = controller.begin();
        let second = controller.begin();

        controller.finish(&first);
        assert!(controller.is_current(&second));

        controller.finish(&second);
        assert!(!controller.has_in_flight());
    }

    #[test]
    fn test_cancel_current_clears_slot() {
        let controller = CancellationController::new();
        let request = controller.begin();
        controller.cancel_current();
        assert!(request.is_cancelled());
        assert!(!controller.has_in_flight());
    }

    #[tokio::test]
    async fn test_cancelled_future_resolves() {
        let controller = CancellationController::new();
        let request = controller.begin();
        let waiter = request.clone();
        let handle = tokio::spawn(async move { waiter.cancelled().await });
        controller.begin();
        handle.await.unwrap();
    }
}
