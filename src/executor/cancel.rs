//! Run ownership and cooperative cancellation

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

type Waiter = Box<dyn FnOnce() + Send>;

/// Tracks whether a batch is running and whether it was asked to stop.
/// Cancellation is only observed between tests and between suites.
#[derive(Default)]
pub(crate) struct RunState {
    running: AtomicBool,
    cancel_requested: AtomicBool,
    waiters: Mutex<Vec<Waiter>>,
}

impl RunState {
    /// Claim the runner for one batch. `None` if a batch is already running.
    pub(crate) fn begin(&self) -> Option<RunGuard<'_>> {
        let _waiters = self.waiters();
        if self
            .running
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            return None;
        }
        self.cancel_requested.store(false, Ordering::SeqCst);
        Some(RunGuard { state: self })
    }

    pub(crate) fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    pub(crate) fn is_cancel_requested(&self) -> bool {
        self.cancel_requested.load(Ordering::SeqCst)
    }

    /// Ask the running batch to stop. `on_complete` runs once the batch has
    /// wound down, or right away when nothing is running.
    pub(crate) fn request_cancel(&self, on_complete: Option<Waiter>) {
        let mut waiters = self.waiters();
        if !self.running.load(Ordering::SeqCst) {
            drop(waiters);
            if let Some(callback) = on_complete {
                callback();
            }
            return;
        }
        self.cancel_requested.store(true, Ordering::SeqCst);
        waiters.extend(on_complete);
    }

    fn finish(&self) {
        let pending = {
            let mut waiters = self.waiters();
            self.running.store(false, Ordering::SeqCst);
            self.cancel_requested.store(false, Ordering::SeqCst);
            std::mem::take(&mut *waiters)
        };
        pending.into_iter().for_each(|callback| callback());
    }

    fn waiters(&self) -> MutexGuard<'_, Vec<Waiter>> {
        self.waiters.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Releases the runner when the batch ends, even if the run future is dropped
pub(crate) struct RunGuard<'a> {
    state: &'a RunState,
}

impl Drop for RunGuard<'_> {
    fn drop(&mut self) {
        self.state.finish();
    }
}
