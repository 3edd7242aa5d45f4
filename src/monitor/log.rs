//! Monitor that renders events through `tracing`

use tracing::{debug, error, info, trace, warn};

use super::TestMonitor;
use crate::models::{ContextSnapshot, TestEvent, TestEventKind, TestProgress};

/// Logs every event at a level matching its kind
#[derive(Clone, Debug, Default)]
pub struct TracingMonitor {
    /// Also log `PHASE_ENTER` events (at trace level)
    pub phase_changes: bool,
}

impl TracingMonitor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_phase_changes(mut self) -> Self {
        self.phase_changes = true;
        self
    }
}

/// Where an info or warning came from, including the hook name
fn location(event: &TestEvent) -> String {
    match event.phase {
        Some(phase) => ContextSnapshot {
            suite_name: event.suite.clone(),
            test_name: event.test_name.clone(),
            phase,
        }
        .to_string(),
        None => event.description(),
    }
}

impl TestMonitor for TracingMonitor {
    fn report_event(&self, event: &TestEvent) {
        let desc = event.description();
        let msg = event.message.as_deref().unwrap_or("");
        match event.kind {
            TestEventKind::BatchInfo => info!("## {} ## - {}", desc, msg),
            TestEventKind::BatchFail => error!("## {} ## - {}", desc, event.failure_description()),
            TestEventKind::BatchCancelled => warn!("## {} ## - CANCELLED: {}", desc, msg),

            TestEventKind::SuiteStart => info!("[[ {} ]] - STARTED", desc),
            TestEventKind::SuiteSkip => warn!("[[ {} ]] - SKIPPED: {}", desc, msg),
            TestEventKind::SuiteFail => {
                error!("[[ {} ]] - FAILED: {}", desc, event.failure_description())
            }
            TestEventKind::SuiteSuccess => info!("[[ {} ]] - SUCCESS", desc),
            TestEventKind::SuiteInfo => info!(" [ {} ] - {}", location(event), msg),
            TestEventKind::SuiteWarn => warn!(" [ {} ] - {}", location(event), msg),

            TestEventKind::TestStart => info!(" [ {} ] - STARTED", desc),
            TestEventKind::TestSkip => warn!(" [ {} ] - SKIPPED: {}", desc, msg),
            TestEventKind::TestFail => {
                error!(" [ {} ] - FAILED: {}", desc, event.failure_description())
            }
            TestEventKind::TestSuccess => info!(" [ {} ] - SUCCESS", desc),
            TestEventKind::TestInfo => info!(" [ {} ] - {}", location(event), msg),
            TestEventKind::TestWarn => warn!(" [ {} ] - {}", location(event), msg),

            TestEventKind::PhaseEnter => {
                if self.phase_changes {
                    trace!(" [ {} ] - ENTER", location(event));
                }
            }
        }
    }

    fn report_suites_progress(&self, progress: &TestProgress) {
        debug!("Test suites: {}", progress);
    }

    fn report_tests_progress(&self, progress: &TestProgress) {
        debug!("All tests: {}", progress);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Failure, LifecyclePhase};

    #[test]
    fn test_location_includes_hook() {
        let ctx = ContextSnapshot::new("Suite", Some("test1"), LifecyclePhase::AfterEach);
        let event = TestEvent::info(&ctx, "cleaning up");
        assert_eq!(location(&event), "Suite :: test1 :: afterEach");

        let event = TestEvent::batch_info("Batch", "hi");
        assert_eq!(location(&event), "Batch");
    }

    #[test]
    fn test_every_kind_is_rendered() {
        let monitor = TracingMonitor::new().with_phase_changes();
        let ctx = ContextSnapshot::new("Suite", Some("test1"), LifecyclePhase::InTest);
        monitor.report_event(&TestEvent::test_start(&ctx));
        monitor.report_event(&TestEvent::test_fail(&ctx, Some(Failure::new("boom"))));
        monitor.report_event(&TestEvent::phase_enter(&ctx));
        monitor.report_event(&TestEvent::batch_cancelled("Batch", "stopped"));
        monitor.report_tests_progress(&TestProgress::default());
    }
}
