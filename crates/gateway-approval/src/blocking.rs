//! Synchronous adapter over the async call pipeline.
//!
//! Game-server threads that cannot take a callback park on a condvar until
//! the completion worker delivers the result or the wait bound expires.
//! Exactly one of {result, timeout} is observed; a callback arriving after
//! the timeout completes normally and its result is discarded.

use crate::dispatcher::Callback;
use crate::result::ApprovalResult;
use std::sync::{Arc, Condvar, Mutex};
use std::time::{Duration, Instant};

/// One-shot rendezvous between a waiting caller and the completion worker.
pub(crate) struct BlockingSlot {
    slot: Mutex<Option<ApprovalResult>>,
    delivered: Condvar,
}

impl BlockingSlot {
    pub(crate) fn new() -> Arc<Self> {
        Arc::new(Self {
            slot: Mutex::new(None),
            delivered: Condvar::new(),
        })
    }

    /// Completion callback that fills the slot and wakes the waiter.
    pub(crate) fn callback(self: &Arc<Self>) -> Callback {
        let slot = Arc::clone(self);
        Box::new(move |result| {
            let mut guard = slot.slot.lock().expect("blocking slot poisoned");
            *guard = Some(result);
            slot.delivered.notify_all();
        })
    }

    /// Wait up to `timeout` for the result. Returns None on timeout; a late
    /// delivery after that is silently dropped when the slot is released.
    pub(crate) fn wait(&self, timeout: Duration) -> Option<ApprovalResult> {
        let deadline = Instant::now() + timeout;
        let mut guard = self.slot.lock().expect("blocking slot poisoned");

        while guard.is_none() {
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                return None;
            }
            let (next_guard, wait_result) = self
                .delivered
                .wait_timeout(guard, remaining)
                .expect("blocking slot poisoned");
            guard = next_guard;
            if wait_result.timed_out() && guard.is_none() {
                return None;
            }
        }

        guard.take()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::result::ApprovalAction;
    use std::thread;

    #[test]
    fn test_result_delivered_before_wait() {
        let slot = BlockingSlot::new();
        let callback = slot.callback();

        let mut result = ApprovalResult::new();
        result.action = ApprovalAction::Allow;
        callback(result);

        let delivered = slot.wait(Duration::from_millis(10)).unwrap();
        assert_eq!(delivered.action, ApprovalAction::Allow);
    }

    #[test]
    fn test_result_delivered_while_waiting() {
        let slot = BlockingSlot::new();
        let callback = slot.callback();

        let handle = thread::spawn(move || {
            thread::sleep(Duration::from_millis(50));
            let mut result = ApprovalResult::new();
            result.action = ApprovalAction::Reject;
            callback(result);
        });

        let delivered = slot.wait(Duration::from_secs(5)).unwrap();
        assert_eq!(delivered.action, ApprovalAction::Reject);
        handle.join().unwrap();
    }

    #[test]
    fn test_timeout_when_no_delivery() {
        let slot = BlockingSlot::new();
        let _callback = slot.callback();

        let started = Instant::now();
        assert!(slot.wait(Duration::from_millis(100)).is_none());
        let elapsed = started.elapsed();

        assert!(elapsed >= Duration::from_millis(100));
        assert!(elapsed < Duration::from_secs(2));
    }

    #[test]
    fn test_late_delivery_is_discarded() {
        let slot = BlockingSlot::new();
        let callback = slot.callback();

        assert!(slot.wait(Duration::from_millis(20)).is_none());

        // The async pipeline still completes; nobody is waiting anymore.
        let mut result = ApprovalResult::new();
        result.action = ApprovalAction::Allow;
        callback(result);
    }
}
