//! Per-route in-flight forward accounting, used as the drain barrier.
//!
//! [`InFlight`] counts forwards that have been dispatched but not yet
//! completed. The count is incremented synchronously before a forward
//! task is spawned and decremented by dropping the returned
//! [`ForwardGuard`], so the decrement runs on every exit path including
//! a panic inside the task. [`InFlight::drained`] resolves once the
//! count reaches zero, which is what shutdown waits on.

use std::pin::pin;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use tokio::sync::Notify;

#[derive(Debug, Default)]
pub struct InFlight {
    count: AtomicUsize,
    notify: Notify,
}

impl InFlight {
    /// Register one forward attempt. Must be called before the forward
    /// task is spawned so a shutdown arriving in between still sees it.
    #[must_use]
    pub fn start(self: Arc<Self>) -> ForwardGuard {
        self.count.fetch_add(1, Ordering::AcqRel);
        ForwardGuard { inner: self }
    }

    #[must_use]
    pub fn count(&self) -> usize {
        self.count.load(Ordering::Acquire)
    }

    /// Wait until no forwards are in flight. Returns immediately when the
    /// route is already quiescent.
    pub async fn drained(&self) {
        let mut notified = pin!(self.notify.notified());
        loop {
            if self.count.load(Ordering::Acquire) == 0 {
                return;
            }
            // Register as a waiter before re-checking, otherwise a guard
            // dropped between the check and the await would be missed.
            notified.as_mut().enable();
            if self.count.load(Ordering::Acquire) == 0 {
                return;
            }
            notified.as_mut().await;
            notified.set(self.notify.notified());
        }
    }
}

/// Decrements the owning [`InFlight`] exactly once on drop.
#[derive(Debug)]
pub struct ForwardGuard {
    inner: Arc<InFlight>,
}

impl Drop for ForwardGuard {
    fn drop(&mut self) {
        if self.inner.count.fetch_sub(1, Ordering::AcqRel) == 1 {
            self.inner.notify.notify_waiters();
        }
    }
}
