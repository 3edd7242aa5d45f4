//! Test execution runner
//!
//! Runs a batch of suites strictly one after another and aggregates the
//! suite and test counters.

use std::sync::{Arc, Mutex};
use tokio::sync::watch;
use tracing::{debug, error, info, warn};

use super::cancel::RunState;
use super::runtime::{lock, DefectSlot, Reporting, SuiteRuntime};
use crate::config::RunConfig;
use crate::error::{Result, TestbedError};
use crate::models::{Failure, TestCounter, TestEvent, TestProgress};
use crate::monitor::{TestMonitor, UserInteraction};
use crate::suite::Suite;
use crate::utils::Stopwatch;

/// How a suite left its test loop
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum SuiteExit {
    Completed,
    Interrupted,
}

/// Test runner for a batch of suites
pub struct TestRunner {
    config: Arc<RunConfig>,
    monitor: Arc<dyn TestMonitor>,
    interaction: Option<Arc<dyn UserInteraction>>,
    suites: Arc<Mutex<TestCounter>>,
    tests: Arc<Mutex<TestCounter>>,
    run_state: RunState,
}

impl TestRunner {
    pub fn new(config: RunConfig, monitor: Arc<dyn TestMonitor>) -> Self {
        Self {
            config: Arc::new(config),
            monitor,
            interaction: None,
            suites: Arc::new(Mutex::new(TestCounter::new("Test suites"))),
            tests: Arc::new(Mutex::new(TestCounter::new("All tests"))),
            run_state: RunState::default(),
        }
    }

    /// Let interactive suites talk to a person
    pub fn with_interaction(mut self, interaction: Arc<dyn UserInteraction>) -> Self {
        self.interaction = Some(interaction);
        self
    }

    pub fn batch_name(&self) -> &str {
        &self.config.batch_name
    }

    pub fn config(&self) -> &RunConfig {
        &self.config
    }

    pub fn is_interactive(&self) -> bool {
        self.interaction.is_some()
    }

    pub fn is_running(&self) -> bool {
        self.run_state.is_running()
    }

    pub fn suites_progress(&self) -> TestProgress {
        lock(&self.suites).snapshot()
    }

    pub fn tests_progress(&self) -> TestProgress {
        lock(&self.tests).snapshot()
    }

    pub fn subscribe_suites(&self) -> watch::Receiver<TestProgress> {
        lock(&self.suites).subscribe()
    }

    pub fn subscribe_tests(&self) -> watch::Receiver<TestProgress> {
        lock(&self.tests).subscribe()
    }

    /// Stop after the test or suite currently running
    pub fn cancel_running_tests(&self) {
        self.run_state.request_cancel(None);
    }

    /// Stop after the test or suite currently running, then call
    /// `on_complete` once the batch has wound down
    pub fn cancel_running_tests_then(&self, on_complete: impl FnOnce() + Send + 'static) {
        self.run_state.request_cancel(Some(Box::new(on_complete)));
    }

    /// Run all suites. Returns true when nothing failed and not every test
    /// was skipped.
    pub async fn run_tests(&self, suites: &[Suite]) -> bool {
        self.try_run_tests(suites).await.unwrap_or(false)
    }

    /// Like [`run_tests`](Self::run_tests), but authoring defects such as a
    /// stale context are returned as errors. The closing `BATCH_FAIL` is
    /// emitted before cancellation callbacks fire.
    pub async fn try_run_tests(&self, suites: &[Suite]) -> Result<bool> {
        let Some(_guard) = self.run_state.begin() else {
            warn!("Refusing to start a batch while another one is running");
            self.batch_fail(TestbedError::AlreadyRunning);
            return Ok(false);
        };

        let Some(selected) = self.before_batch(suites) else {
            return Ok(false);
        };

        let defects = DefectSlot::default();
        let mut stopwatch = Stopwatch::new();
        let mut cancelled = false;

        for suite in selected {
            if self.run_state.is_cancel_requested() {
                cancelled = true;
                break;
            }
            let exit = self.run_suite(suite, &defects).await;
            stopwatch.lap(suite.name());

            if let Some(defect) = defects.take() {
                error!("Batch aborted: {}", defect);
                self.emit(TestEvent::batch_fail(
                    self.batch_name(),
                    "Unhandled error while executing tests.",
                    Some(Failure::from(defect.clone())),
                ));
                return Err(defect);
            }
            if exit == SuiteExit::Interrupted {
                cancelled = true;
                break;
            }
        }

        debug!("Suite timings:\n{}", stopwatch.format());
        Ok(self.after_batch(cancelled))
    }

    /// Narrow and validate the suite list, then seed the counters
    fn before_batch<'a>(&self, suites: &'a [Suite]) -> Option<Vec<&'a Suite>> {
        let selected: Vec<&Suite> = match &self.config.run_only_suite {
            Some(name) => match suites.iter().find(|s| s.name() == name) {
                Some(suite) => vec![suite],
                None => {
                    self.batch_fail(TestbedError::UnknownSuite(name.clone()));
                    return None;
                }
            },
            None => suites.iter().collect(),
        };

        if selected.is_empty() {
            self.batch_fail(TestbedError::NoSuites);
            return None;
        }
        let total_tests: usize = selected.iter().map(|s| s.test_count()).sum();
        if total_tests == 0 {
            self.batch_fail(TestbedError::NoTestMethods);
            return None;
        }

        info!(
            "Starting batch '{}' with {} suites and {} tests",
            self.batch_name(),
            selected.len(),
            total_tests
        );
        self.emit(TestEvent::batch_info(
            self.batch_name(),
            format!(
                "Starting {} test suites with {} tests inside.",
                selected.len(),
                total_tests
            ),
        ));

        let suites_progress = lock(&self.suites).restart(selected.len());
        let tests_progress = lock(&self.tests).restart(total_tests);
        self.monitor.report_suites_progress(&suites_progress);
        self.monitor.report_tests_progress(&tests_progress);

        Some(selected)
    }

    async fn run_suite(&self, suite: &Suite, defects: &DefectSlot) -> SuiteExit {
        info!("Running suite {}", suite.name());
        let runtime = SuiteRuntime::new(suite, self.reporting(defects));
        runtime.before_all(suite).await;

        let mut exit = SuiteExit::Completed;
        if runtime.is_suite_live() {
            for test in suite.tests() {
                if self.run_state.is_cancel_requested() || defects.is_raised() {
                    exit = SuiteExit::Interrupted;
                    break;
                }
                runtime.before_each(suite, test).await;
                runtime.run_test(test).await;
                runtime.after_each(suite).await;
            }
        }

        runtime.after_all(suite, exit == SuiteExit::Interrupted).await;
        exit
    }

    /// Emit the closing batch event and compute the result
    fn after_batch(&self, cancelled: bool) -> bool {
        let suites = self.suites_progress();
        let tests = self.tests_progress();
        info!("Test suites: {}", suites);
        info!("All tests: {}", tests);

        if cancelled {
            self.emit(TestEvent::batch_cancelled(
                self.batch_name(),
                format!("Cancelled after {} from {} tests.", tests.progress, tests.total),
            ));
            return tests.progress > 0
                && suites.failed == 0
                && tests.failed == 0
                && tests.skipped < tests.progress;
        }

        if tests.skipped == tests.total {
            self.emit(TestEvent::batch_fail(
                self.batch_name(),
                "All tests were skipped.",
                None,
            ));
            false
        } else if suites.failed == 0 && tests.failed == 0 {
            self.emit(TestEvent::batch_info(self.batch_name(), "All tests succeeded."));
            true
        } else {
            self.emit(TestEvent::batch_fail(
                self.batch_name(),
                format!("Failed {} from {} test suites.", suites.failed, suites.total),
                None,
            ));
            false
        }
    }

    fn reporting(&self, defects: &DefectSlot) -> Reporting {
        Reporting {
            monitor: Arc::clone(&self.monitor),
            interaction: self.interaction.clone(),
            config: Arc::clone(&self.config),
            suites: Arc::clone(&self.suites),
            tests: Arc::clone(&self.tests),
            defects: defects.clone(),
        }
    }

    fn batch_fail(&self, error: TestbedError) {
        self.emit(TestEvent::batch_fail(self.batch_name(), error.to_string(), None));
    }

    fn emit(&self, event: TestEvent) {
        self.monitor.report_event(&event);
    }
}
