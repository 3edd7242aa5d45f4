//! Immutable description of "where the runner currently is"

use serde::{Deserialize, Serialize};
use std::fmt;

use super::LifecyclePhase;

/// Snapshot of suite name, test name and phase
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContextSnapshot {
    pub suite_name: String,
    pub test_name: Option<String>,
    pub phase: LifecyclePhase,
}

impl ContextSnapshot {
    pub fn new(suite_name: impl Into<String>, test_name: Option<&str>, phase: LifecyclePhase) -> Self {
        Self {
            suite_name: suite_name.into(),
            test_name: test_name.map(str::to_string),
            phase,
        }
    }

    /// Test name decorated with the hook currently running, as shown in
    /// reports. `None` only when a per-test phase has no test name.
    pub fn decorated_test_name(&self) -> Option<String> {
        match (self.phase, &self.test_name) {
            (LifecyclePhase::BeforeAll, _) | (LifecyclePhase::AfterAll, _) => {
                Some(self.phase.hook_name().to_string())
            }
            (LifecyclePhase::InTest, Some(name)) => Some(name.clone()),
            (phase, Some(name)) => Some(format!("{} :: {}", name, phase.hook_name())),
            (_, None) => None,
        }
    }
}

impl fmt::Display for ContextSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.decorated_test_name() {
            Some(test) => write!(f, "{} :: {}", self.suite_name, test),
            None => write!(f, "{}", self.suite_name),
        }
    }
}
