use std::sync::{Condvar, Mutex};
use std::time::Duration;

/// Binary semaphore: one permit, `give` is idempotent, `take` consumes.
///
/// Used as the per-request rendezvous between a blocked caller and the
/// inbound dispatcher. Plain `Mutex<bool>` + `Condvar`; there is no fairness
/// requirement because at most one thread ever waits on a given instance.
#[derive(Debug, Default)]
pub struct BinarySemaphore {
    given: Mutex<bool>,
    cond: Condvar,
}

impl BinarySemaphore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the permit available and wake a waiter, if any.
    pub fn give(&self) {
        let mut given = self.given.lock().unwrap();
        *given = true;
        self.cond.notify_one();
    }

    /// Wait up to `timeout` for the permit; consume it on success.
    pub fn take(&self, timeout: Duration) -> bool {
        let guard = self.given.lock().unwrap();
        let (mut given, result) = self
            .cond
            .wait_timeout_while(guard, timeout, |given| !*given)
            .unwrap();
        if result.timed_out() && !*given {
            return false;
        }
        *given = false;
        true
    }

    /// Consume the permit only if it is available right now.
    pub fn try_take(&self) -> bool {
        let mut given = self.given.lock().unwrap();
        std::mem::replace(&mut *given, false)
    }
}
