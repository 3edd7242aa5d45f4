//! Context handed to hooks and test bodies

use std::fmt;
use std::sync::Arc;

use super::runtime::RuntimeShared;
use crate::config::RunConfig;
use crate::error::Result;
use crate::models::{ContextSnapshot, Failure, LifecyclePhase, Platform};
use crate::monitor::PromptDuration;

/// Where a hook or test body runs, and its channel back to the runner.
///
/// Every report made through a context is checked against the runner's
/// current phase. Using a context after its phase ended (typically a
/// forgotten `.await`) returns [`TestbedError::StaleContext`] and aborts
/// the batch.
///
/// [`TestbedError::StaleContext`]: crate::TestbedError::StaleContext
#[derive(Clone)]
pub struct TestContext {
    snapshot: ContextSnapshot,
    generation: u64,
    runtime: Arc<RuntimeShared>,
}

impl TestContext {
    pub(crate) fn new(snapshot: ContextSnapshot, generation: u64, runtime: Arc<RuntimeShared>) -> Self {
        Self {
            snapshot,
            generation,
            runtime,
        }
    }

    pub(crate) fn generation(&self) -> u64 {
        self.generation
    }

    pub fn snapshot(&self) -> &ContextSnapshot {
        &self.snapshot
    }

    pub fn suite_name(&self) -> &str {
        &self.snapshot.suite_name
    }

    pub fn test_name(&self) -> Option<&str> {
        self.snapshot.test_name.as_deref()
    }

    pub fn phase(&self) -> LifecyclePhase {
        self.snapshot.phase
    }

    pub fn host(&self) -> Platform {
        self.runtime.host()
    }

    pub fn config(&self) -> &RunConfig {
        self.runtime.config()
    }

    pub fn setting(&self, key: &str) -> Option<&str> {
        self.runtime.config().setting(key)
    }

    pub fn interaction_is_allowed(&self) -> bool {
        self.runtime.interaction_is_allowed()
    }

    /// False once the runner moved past the phase this context was made for
    pub fn is_current(&self) -> bool {
        self.runtime.is_current(self)
    }

    pub fn report_info(&self, message: impl AsRef<str>) -> Result<()> {
        self.runtime.report_info(self, message.as_ref())
    }

    pub fn report_warning(&self, message: impl AsRef<str>) -> Result<()> {
        self.runtime.report_warning(self, message.as_ref())
    }

    /// Skip the current scope. From `afterEach` or `afterAll` this is
    /// recorded as a failure instead.
    pub fn report_skip(&self, reason: impl AsRef<str>) -> Result<()> {
        self.runtime.report_skip(self, reason.as_ref())
    }

    /// Fail the current scope without returning from the body
    pub fn report_failure(&self, failure: impl Into<Failure>) -> Result<()> {
        self.runtime.report_failure(self, failure.into())
    }

    /// Show a message to the person watching the run
    pub async fn show_prompt(&self, message: impl AsRef<str>, duration: PromptDuration) -> Result<()> {
        self.runtime.show_prompt(self, message.as_ref(), duration).await
    }
}

impl fmt::Debug for TestContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TestContext")
            .field("context", &self.snapshot.to_string())
            .field("generation", &self.generation)
            .finish()
    }
}

impl fmt::Display for TestContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.snapshot)
    }
}
