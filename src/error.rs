//! Testbed errors
//!
//! Authoring defects and definitional errors raised by the orchestration
//! engine itself. Failures raised by test code travel as
//! [`Failure`](crate::models::Failure) instead.

use thiserror::Error;

use crate::models::ContextSnapshot;

/// Errors produced by the testbed
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TestbedError {
    #[error("No test suites to run.")]
    NoSuites,

    #[error("No test methods to execute.")]
    NoTestMethods,

    #[error("Test suite '{0}' is not in the list of suites to run.")]
    UnknownSuite(String),

    #[error("Tests are still in progress.")]
    AlreadyRunning,

    #[error("Test suite '{0}' is empty. Please register at least one test method.")]
    EmptySuite(String),

    #[error("Test suite '{0}' is interactive, but the current test runner doesn't support interaction with the user.")]
    InteractionUnavailable(String),

    #[error("Interaction with the user is not allowed for this test.")]
    InteractionNotAllowed,

    #[error("You should not skip from afterEach()")]
    SkipFromAfterEach,

    #[error("You should not skip from afterAll()")]
    SkipFromAfterAll,

    /// A context was used after the runner already moved to another phase.
    #[error("Result reported from '{reported}' while the runner is already in '{current}'. Did you forget to await an asynchronous operation?")]
    StaleContext {
        reported: ContextSnapshot,
        current: ContextSnapshot,
    },

    #[error("Internal error. Counter '{counter}' exceeded its maximum value {total} after {op}")]
    CounterOverflow {
        counter: String,
        total: usize,
        op: &'static str,
    },

    #[error("Internal error. Counter '{counter}' is not restarted before {op}.")]
    CounterNotStarted { counter: String, op: &'static str },
}

impl TestbedError {
    /// True for errors that indicate broken test code or a broken engine,
    /// which make the results of the whole batch untrustworthy.
    pub fn is_authoring_defect(&self) -> bool {
        matches!(
            self,
            TestbedError::StaleContext { .. }
                | TestbedError::CounterOverflow { .. }
                | TestbedError::CounterNotStarted { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, TestbedError>;
