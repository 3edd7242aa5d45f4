//! Progress counters
//!
//! A counter is restarted with a fixed total before a batch and then only
//! grows. Every mutation is checked against the total before it is
//! applied, so `succeeded + failed + skipped <= total` holds at all times.

use serde::{Deserialize, Serialize};
use std::fmt;
use tokio::sync::watch;

use crate::error::{Result, TestbedError};
use crate::utils::Timer;

/// Read-only progress snapshot
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct TestProgress {
    pub total: usize,
    /// succeeded + failed + skipped
    pub progress: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub skipped: usize,
    /// Seconds since the counter was restarted
    pub elapsed_secs: f64,
}

impl TestProgress {
    pub fn is_complete(&self) -> bool {
        self.progress == self.total
    }

    pub fn remaining(&self) -> usize {
        self.total.saturating_sub(self.progress)
    }

    /// Same counts, ignoring elapsed time
    pub fn counts(&self) -> (usize, usize, usize, usize) {
        (self.total, self.succeeded, self.failed, self.skipped)
    }
}

impl fmt::Display for TestProgress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}/{} | Pass: {} | Fail: {} | Skip: {} | {:.1}s",
            self.progress, self.total, self.succeeded, self.failed, self.skipped, self.elapsed_secs
        )
    }
}

/// Outcome category a counter mutation applies to
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Tally {
    Succeeded(usize),
    Failed(usize),
    Skipped(usize),
}

impl Tally {
    fn op(&self) -> &'static str {
        match self {
            Tally::Succeeded(_) => "addSucceeded",
            Tally::Failed(_) => "addFailed",
            Tally::Skipped(_) => "addSkipped",
        }
    }

    fn amount(&self) -> usize {
        match self {
            Tally::Succeeded(n) | Tally::Failed(n) | Tally::Skipped(n) => *n,
        }
    }
}

/// Mutable aggregate of outcomes, observable through a watch channel
#[derive(Debug)]
pub struct TestCounter {
    name: String,
    total: usize,
    succeeded: usize,
    failed: usize,
    skipped: usize,
    timer: Option<Timer>,
    observers: watch::Sender<TestProgress>,
}

impl TestCounter {
    pub fn new(name: impl Into<String>) -> Self {
        let (observers, _) = watch::channel(TestProgress::default());
        Self {
            name: name.into(),
            total: 0,
            succeeded: 0,
            failed: 0,
            skipped: 0,
            timer: None,
            observers,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn total(&self) -> usize {
        self.total
    }

    /// Reset all counts and fix the total for the next batch
    pub fn restart(&mut self, total: usize) -> TestProgress {
        self.total = total;
        self.succeeded = 0;
        self.failed = 0;
        self.skipped = 0;
        self.timer = Some(Timer::start(self.name.clone()));
        self.publish()
    }

    pub fn add_succeeded(&mut self, amount: usize) -> Result<TestProgress> {
        self.add(Tally::Succeeded(amount))
    }

    pub fn add_failed(&mut self, amount: usize) -> Result<TestProgress> {
        self.add(Tally::Failed(amount))
    }

    pub fn add_skipped(&mut self, amount: usize) -> Result<TestProgress> {
        self.add(Tally::Skipped(amount))
    }

    /// Apply a mutation. Nothing changes if it would break the invariant.
    pub fn add(&mut self, tally: Tally) -> Result<TestProgress> {
        if self.timer.is_none() {
            return Err(TestbedError::CounterNotStarted {
                counter: self.name.clone(),
                op: tally.op(),
            });
        }
        let progress = self.succeeded + self.failed + self.skipped;
        if progress + tally.amount() > self.total {
            return Err(TestbedError::CounterOverflow {
                counter: self.name.clone(),
                total: self.total,
                op: tally.op(),
            });
        }
        match tally {
            Tally::Succeeded(n) => self.succeeded += n,
            Tally::Failed(n) => self.failed += n,
            Tally::Skipped(n) => self.skipped += n,
        }
        Ok(self.publish())
    }

    pub fn snapshot(&self) -> TestProgress {
        TestProgress {
            total: self.total,
            progress: self.succeeded + self.failed + self.skipped,
            succeeded: self.succeeded,
            failed: self.failed,
            skipped: self.skipped,
            elapsed_secs: self.timer.as_ref().map(Timer::elapsed_secs).unwrap_or(0.0),
        }
    }

    /// Receive every snapshot published after a mutation
    pub fn subscribe(&self) -> watch::Receiver<TestProgress> {
        self.observers.subscribe()
    }

    fn publish(&self) -> TestProgress {
        let snapshot = self.snapshot();
        self.observers.send_replace(snapshot);
        snapshot
    }
}
