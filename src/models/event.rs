//! Events emitted while a batch runs
//!
//! Events are produced, handed to the monitor and never mutated. A
//! consumer watching the stream can rebuild the exact run history.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt;

use super::{ContextSnapshot, Failure, LifecyclePhase};

/// Kind of a [`TestEvent`]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TestEventKind {
    SuiteStart,
    SuiteSuccess,
    SuiteFail,
    /// Message contains the reason
    SuiteSkip,
    /// Information reported from `beforeAll()` or `afterAll()`
    SuiteInfo,
    SuiteWarn,

    TestStart,
    TestSuccess,
    TestFail,
    /// Message contains the reason
    TestSkip,
    TestInfo,
    TestWarn,

    /// Runner entered a phase that has no dedicated start event
    PhaseEnter,

    /// Information reported from the top level. Suite contains the batch name.
    BatchInfo,
    /// Whole batch failed. Message contains the reason.
    BatchFail,
    BatchCancelled,
}

impl TestEventKind {
    pub fn symbol(&self) -> &'static str {
        match self {
            TestEventKind::SuiteSuccess | TestEventKind::TestSuccess => "✓",
            TestEventKind::SuiteFail | TestEventKind::TestFail | TestEventKind::BatchFail => "✗",
            TestEventKind::SuiteSkip | TestEventKind::TestSkip => "○",
            TestEventKind::SuiteWarn | TestEventKind::TestWarn => "!",
            _ => "·",
        }
    }

    pub fn is_batch_level(&self) -> bool {
        matches!(
            self,
            TestEventKind::BatchInfo | TestEventKind::BatchFail | TestEventKind::BatchCancelled
        )
    }
}

impl fmt::Display for TestEventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TestEventKind::SuiteStart => "SUITE_START",
            TestEventKind::SuiteSuccess => "SUITE_SUCCESS",
            TestEventKind::SuiteFail => "SUITE_FAIL",
            TestEventKind::SuiteSkip => "SUITE_SKIP",
            TestEventKind::SuiteInfo => "SUITE_INFO",
            TestEventKind::SuiteWarn => "SUITE_WARN",
            TestEventKind::TestStart => "TEST_START",
            TestEventKind::TestSuccess => "TEST_SUCCESS",
            TestEventKind::TestFail => "TEST_FAIL",
            TestEventKind::TestSkip => "TEST_SKIP",
            TestEventKind::TestInfo => "TEST_INFO",
            TestEventKind::TestWarn => "TEST_WARN",
            TestEventKind::PhaseEnter => "PHASE_ENTER",
            TestEventKind::BatchInfo => "BATCH_INFO",
            TestEventKind::BatchFail => "BATCH_FAIL",
            TestEventKind::BatchCancelled => "BATCH_CANCELLED",
        };
        write!(f, "{name}")
    }
}

/// Immutable record of something that happened during a run
#[derive(Clone, Debug, Serialize)]
pub struct TestEvent {
    pub timestamp: DateTime<Utc>,
    pub kind: TestEventKind,
    pub suite: String,
    pub test_name: Option<String>,
    pub phase: Option<LifecyclePhase>,
    pub message: Option<String>,
    pub failure: Option<Failure>,
}

impl TestEvent {
    fn new(kind: TestEventKind, suite: impl Into<String>) -> Self {
        Self {
            timestamp: Utc::now(),
            kind,
            suite: suite.into(),
            test_name: None,
            phase: None,
            message: None,
            failure: None,
        }
    }

    fn for_context(kind: TestEventKind, ctx: &ContextSnapshot) -> Self {
        let mut event = Self::new(kind, ctx.suite_name.clone());
        event.test_name = ctx.test_name.clone();
        event.phase = Some(ctx.phase);
        event
    }

    fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    /// Attach a failure. Its description becomes the message, appended to
    /// any message already present.
    fn with_failure(mut self, failure: Option<Failure>) -> Self {
        if let Some(failure) = &failure {
            let description = failure.description();
            self.message = match self.message.take() {
                Some(msg) if !description.is_empty() => {
                    let separator = if msg.ends_with('.') { " " } else { ". " };
                    Some(format!("{msg}{separator}{description}"))
                }
                Some(msg) => Some(msg),
                None if description.is_empty() => None,
                None => Some(description),
            };
        }
        self.failure = failure;
        self
    }

    pub fn batch_info(batch: &str, message: impl Into<String>) -> Self {
        Self::new(TestEventKind::BatchInfo, batch).with_message(message)
    }

    pub fn batch_fail(batch: &str, reason: impl Into<String>, failure: Option<Failure>) -> Self {
        Self::new(TestEventKind::BatchFail, batch)
            .with_message(reason)
            .with_failure(failure)
    }

    pub fn batch_cancelled(batch: &str, message: impl Into<String>) -> Self {
        Self::new(TestEventKind::BatchCancelled, batch).with_message(message)
    }

    pub fn suite_start(ctx: &ContextSnapshot) -> Self {
        Self::for_context(TestEventKind::SuiteStart, ctx)
    }

    pub fn suite_success(ctx: &ContextSnapshot) -> Self {
        Self::for_context(TestEventKind::SuiteSuccess, ctx)
    }

    pub fn suite_fail(ctx: &ContextSnapshot, failure: Option<Failure>) -> Self {
        Self::for_context(TestEventKind::SuiteFail, ctx).with_failure(failure)
    }

    pub fn suite_skip(ctx: &ContextSnapshot, reason: impl Into<String>) -> Self {
        Self::for_context(TestEventKind::SuiteSkip, ctx).with_message(reason)
    }

    pub fn test_start(ctx: &ContextSnapshot) -> Self {
        Self::for_context(TestEventKind::TestStart, ctx)
    }

    pub fn test_success(ctx: &ContextSnapshot) -> Self {
        Self::for_context(TestEventKind::TestSuccess, ctx)
    }

    pub fn test_fail(ctx: &ContextSnapshot, failure: Option<Failure>) -> Self {
        Self::for_context(TestEventKind::TestFail, ctx).with_failure(failure)
    }

    pub fn test_skip(ctx: &ContextSnapshot, reason: impl Into<String>) -> Self {
        Self::for_context(TestEventKind::TestSkip, ctx).with_message(reason)
    }

    pub fn phase_enter(ctx: &ContextSnapshot) -> Self {
        Self::for_context(TestEventKind::PhaseEnter, ctx)
    }

    /// Info from a hook or test, routed to suite or test scope by phase
    pub fn info(ctx: &ContextSnapshot, message: impl Into<String>) -> Self {
        let kind = if ctx.phase.is_suite_scope() {
            TestEventKind::SuiteInfo
        } else {
            TestEventKind::TestInfo
        };
        Self::for_context(kind, ctx).with_message(message)
    }

    /// Warning from a hook or test, routed to suite or test scope by phase
    pub fn warning(ctx: &ContextSnapshot, message: impl Into<String>) -> Self {
        let kind = if ctx.phase.is_suite_scope() {
            TestEventKind::SuiteWarn
        } else {
            TestEventKind::TestWarn
        };
        Self::for_context(kind, ctx).with_message(message)
    }

    /// "suite" or "suite :: test"
    pub fn description(&self) -> String {
        match &self.test_name {
            Some(test) => format!("{} :: {}", self.suite, test),
            None => self.suite.clone(),
        }
    }

    pub fn failure_description(&self) -> String {
        match (&self.message, &self.failure) {
            (Some(msg), _) => msg.clone(),
            (None, Some(failure)) => failure.description(),
            (None, None) => String::new(),
        }
    }
}

impl fmt::Display for TestEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} [{}]", self.kind.symbol(), self.description(), self.kind)?;
        if let Some(msg) = &self.message {
            write!(f, " - {msg}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_batch_fail_joins_reason_and_failure() {
        let event = TestEvent::batch_fail(
            "Batch",
            "Unhandled error while executing tests.",
            Some(Failure::new("stale context")),
        );
        assert_eq!(event.kind, TestEventKind::BatchFail);
        assert_eq!(
            event.message.as_deref(),
            Some("Unhandled error while executing tests. stale context")
        );
    }

    #[test]
    fn test_info_routes_by_phase() {
        let suite_ctx = ContextSnapshot::new("Suite", None, LifecyclePhase::AfterAll);
        assert_eq!(TestEvent::info(&suite_ctx, "x").kind, TestEventKind::SuiteInfo);

        let test_ctx = ContextSnapshot::new("Suite", Some("test1"), LifecyclePhase::InTest);
        let event = TestEvent::warning(&test_ctx, "careful");
        assert_eq!(event.kind, TestEventKind::TestWarn);
        assert_eq!(event.description(), "Suite :: test1");
    }

    #[test]
    fn test_event_serializes_failure_as_text() {
        let ctx = ContextSnapshot::new("Suite", Some("test1"), LifecyclePhase::InTest);
        let event = TestEvent::test_fail(&ctx, Some(Failure::new("expected 1, got 2")));
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["kind"], "TEST_FAIL");
        assert_eq!(json["failure"], "expected 1, got 2");
        assert_eq!(json["phase"], "IN_TEST");
    }
}
