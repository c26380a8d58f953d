//! Calls postponed until the current scheduler operation has returned.

use std::sync::{Mutex, PoisonError};

type DeferredCall = Box<dyn FnOnce() + Send>;

/// FIFO of postponed calls.
///
/// Calls pushed while a batch is running are kept for the next
/// [`run_pending`](Self::run_pending).
#[derive(Default)]
pub(crate) struct DeferredCalls {
    pending: Mutex<Vec<DeferredCall>>,
}

impl DeferredCalls {
    pub fn push(&self, call: DeferredCall) {
        self.pending
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(call);
    }

    /// Run everything queued so far. Returns how many calls ran.
    pub fn run_pending(&self) -> usize {
        let calls = std::mem::take(
            &mut *self.pending.lock().unwrap_or_else(PoisonError::into_inner),
        );
        let count = calls.len();
        for call in calls {
            call();
        }
        count
    }

    pub fn len(&self) -> usize {
        self.pending
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}
