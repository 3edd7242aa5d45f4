//! Monitor sinks
//!
//! A monitor receives events and progress snapshots. It is write-only:
//! nothing the monitor does feeds back into orchestration.

mod interaction;
mod log;

pub use interaction::{PromptDuration, UserInteraction};
pub use log::TracingMonitor;

use std::sync::Arc;

use crate::models::{TestEvent, TestProgress};

/// Receiver of everything the runner reports
pub trait TestMonitor: Send + Sync {
    fn report_event(&self, event: &TestEvent);

    fn report_suites_progress(&self, _progress: &TestProgress) {}

    fn report_tests_progress(&self, _progress: &TestProgress) {}
}

/// Fans every report out to a list of monitors
#[derive(Clone, Default)]
pub struct MonitorGroup {
    monitors: Vec<Arc<dyn TestMonitor>>,
}

impl MonitorGroup {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, monitor: Arc<dyn TestMonitor>) -> Self {
        self.monitors.push(monitor);
        self
    }

    pub fn add_monitor(&mut self, monitor: Arc<dyn TestMonitor>) {
        self.monitors.push(monitor);
    }

    /// Remove a monitor previously added, compared by identity
    pub fn remove_monitor(&mut self, monitor: &Arc<dyn TestMonitor>) {
        self.monitors.retain(|m| !Arc::ptr_eq(m, monitor));
    }

    pub fn len(&self) -> usize {
        self.monitors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.monitors.is_empty()
    }
}

impl TestMonitor for MonitorGroup {
    fn report_event(&self, event: &TestEvent) {
        self.monitors.iter().for_each(|m| m.report_event(event));
    }

    fn report_suites_progress(&self, progress: &TestProgress) {
        self.monitors.iter().for_each(|m| m.report_suites_progress(progress));
    }

    fn report_tests_progress(&self, progress: &TestProgress) {
        self.monitors.iter().for_each(|m| m.report_tests_progress(progress));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[derive(Default)]
    struct CountingMonitor {
        events: Mutex<usize>,
        progress: Mutex<usize>,
    }

    impl TestMonitor for CountingMonitor {
        fn report_event(&self, _event: &TestEvent) {
            *self.events.lock().unwrap() += 1;
        }

        fn report_tests_progress(&self, _progress: &TestProgress) {
            *self.progress.lock().unwrap() += 1;
        }
    }

    #[test]
    fn test_group_fans_out() {
        let a = Arc::new(CountingMonitor::default());
        let b = Arc::new(CountingMonitor::default());
        let group = MonitorGroup::new().with(a.clone()).with(b.clone());

        group.report_event(&TestEvent::batch_info("Batch", "hello"));
        group.report_tests_progress(&TestProgress::default());
        group.report_suites_progress(&TestProgress::default());

        assert_eq!(*a.events.lock().unwrap(), 1);
        assert_eq!(*b.events.lock().unwrap(), 1);
        assert_eq!(*b.progress.lock().unwrap(), 1);
    }

    #[test]
    fn test_group_remove_by_identity() {
        let a: Arc<dyn TestMonitor> = Arc::new(CountingMonitor::default());
        let b: Arc<dyn TestMonitor> = Arc::new(CountingMonitor::default());
        let mut group = MonitorGroup::new().with(a.clone()).with(b);

        group.remove_monitor(&a);
        assert_eq!(group.len(), 1);
    }
}
