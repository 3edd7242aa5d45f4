//! Per-suite state machine
//!
//! A [`SuiteRuntime`] drives one suite through
//! `BEFORE_ALL → {BEFORE_EACH → IN_TEST → AFTER_EACH}* → AFTER_ALL`.
//! Skip and fail signals are resolved against the current phase under the
//! state lock; the resulting event and counter change are applied after
//! the lock is released, event first.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::{debug, error, warn};

use super::TestContext;
use crate::config::RunConfig;
use crate::error::{Result, TestbedError};
use crate::models::{
    ContextSnapshot, Failure, LifecyclePhase, Outcome, Platform, Tally, TestCounter, TestEvent,
    TestEventKind,
};
use crate::monitor::{PromptDuration, TestMonitor, UserInteraction};
use crate::suite::{Body, Suite, TestEntry};

pub(crate) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// First authoring defect raised during a batch
#[derive(Clone, Default)]
pub(crate) struct DefectSlot(Arc<Mutex<Option<TestbedError>>>);

impl DefectSlot {
    /// Record the defect unless another one is already in flight
    pub(crate) fn raise(&self, defect: TestbedError) -> bool {
        let mut slot = lock(&self.0);
        if slot.is_some() {
            return false;
        }
        *slot = Some(defect);
        true
    }

    pub(crate) fn is_raised(&self) -> bool {
        lock(&self.0).is_some()
    }

    pub(crate) fn take(&self) -> Option<TestbedError> {
        lock(&self.0).take()
    }
}

/// Sinks and counters a suite runtime reports into
#[derive(Clone)]
pub(crate) struct Reporting {
    pub(crate) monitor: Arc<dyn TestMonitor>,
    pub(crate) interaction: Option<Arc<dyn UserInteraction>>,
    pub(crate) config: Arc<RunConfig>,
    pub(crate) suites: Arc<Mutex<TestCounter>>,
    pub(crate) tests: Arc<Mutex<TestCounter>>,
    pub(crate) defects: DefectSlot,
}

/// Event plus the counter changes that go with it
struct Effect {
    event: TestEvent,
    suites: Option<Tally>,
    tests: Option<Tally>,
}

impl Effect {
    fn event(event: TestEvent) -> Self {
        Self {
            event,
            suites: None,
            tests: None,
        }
    }

    fn suites(mut self, tally: Tally) -> Self {
        self.suites = Some(tally);
        self
    }

    fn tests(mut self, tally: Tally) -> Self {
        self.tests = Some(tally);
        self
    }
}

struct SuiteState {
    suite_name: String,
    test_name: Option<String>,
    phase: LifecyclePhase,
    generation: u64,
    test_count: usize,
    is_skipped: bool,
    is_failed: bool,
    is_test_skipped: bool,
    is_test_failed: bool,
    some_test_failed: bool,
    /// Cancelled before all tests ran; teardown outcomes are not counted
    interrupted: bool,
}

impl SuiteState {
    fn new(suite_name: &str, test_count: usize) -> Self {
        Self {
            suite_name: suite_name.to_string(),
            test_name: None,
            phase: LifecyclePhase::BeforeAll,
            generation: 0,
            test_count,
            is_skipped: false,
            is_failed: false,
            is_test_skipped: false,
            is_test_failed: false,
            some_test_failed: false,
            interrupted: false,
        }
    }

    fn snapshot(&self) -> ContextSnapshot {
        ContextSnapshot {
            suite_name: self.suite_name.clone(),
            test_name: self.test_name.clone(),
            phase: self.phase,
        }
    }

    /// Move to `phase`. Every context handed out before is stale afterwards.
    fn enter(&mut self, phase: LifecyclePhase, test_name: Option<&str>) -> (ContextSnapshot, u64) {
        self.phase = phase;
        self.generation += 1;
        match phase {
            LifecyclePhase::BeforeEach => {
                self.test_name = test_name.map(str::to_string);
                self.is_test_skipped = false;
                self.is_test_failed = false;
            }
            LifecyclePhase::BeforeAll | LifecyclePhase::AfterAll => self.test_name = None,
            LifecyclePhase::InTest | LifecyclePhase::AfterEach => {}
        }
        (self.snapshot(), self.generation)
    }

    fn close(&mut self) {
        self.generation += 1;
    }

    fn is_suite_live(&self) -> bool {
        !self.is_skipped && !self.is_failed
    }

    fn is_test_live(&self) -> bool {
        self.is_suite_live() && !self.is_test_skipped && !self.is_test_failed
    }

    fn record_skip(&mut self, reason: String) -> Option<Effect> {
        let ctx = self.snapshot();
        match self.phase {
            LifecyclePhase::BeforeAll => {
                if !self.is_suite_live() {
                    return None;
                }
                self.is_skipped = true;
                Some(
                    Effect::event(TestEvent::suite_skip(&ctx, reason))
                        .suites(Tally::Skipped(1))
                        .tests(Tally::Skipped(self.test_count)),
                )
            }
            LifecyclePhase::BeforeEach | LifecyclePhase::InTest => {
                if self.is_test_skipped || self.is_test_failed {
                    return None;
                }
                self.is_test_skipped = true;
                Some(Effect::event(TestEvent::test_skip(&ctx, reason)).tests(Tally::Skipped(1)))
            }
            LifecyclePhase::AfterEach => {
                warn!(context = %ctx, reason = %reason, "Skip requested from afterEach");
                self.record_failure(Failure::from(TestbedError::SkipFromAfterEach))
            }
            LifecyclePhase::AfterAll => {
                warn!(context = %ctx, reason = %reason, "Skip requested from afterAll");
                self.record_failure(Failure::from(TestbedError::SkipFromAfterAll))
            }
        }
    }

    fn record_failure(&mut self, failure: Failure) -> Option<Effect> {
        let ctx = self.snapshot();
        match self.phase {
            LifecyclePhase::BeforeAll => {
                if !self.is_suite_live() {
                    return Some(ignored(&ctx, &failure));
                }
                self.is_failed = true;
                Some(
                    Effect::event(TestEvent::suite_fail(&ctx, Some(failure)))
                        .suites(Tally::Failed(1))
                        .tests(Tally::Failed(self.test_count)),
                )
            }
            LifecyclePhase::BeforeEach | LifecyclePhase::InTest | LifecyclePhase::AfterEach => {
                if self.is_test_skipped || self.is_test_failed {
                    return Some(ignored(&ctx, &failure));
                }
                self.is_test_failed = true;
                self.some_test_failed = true;
                Some(Effect::event(TestEvent::test_fail(&ctx, Some(failure))).tests(Tally::Failed(1)))
            }
            LifecyclePhase::AfterAll => {
                if !self.is_suite_live() {
                    return Some(ignored(&ctx, &failure));
                }
                if self.interrupted {
                    return Some(Effect::event(TestEvent::warning(
                        &ctx,
                        format!(
                            "Teardown of interrupted suite failed, not counted: {}",
                            failure.description()
                        ),
                    )));
                }
                self.is_failed = true;
                Some(Effect::event(TestEvent::suite_fail(&ctx, Some(failure))).suites(Tally::Failed(1)))
            }
        }
    }

    /// Success for the current test unless something else was recorded
    fn finish_test(&mut self) -> Option<Effect> {
        if self.is_test_skipped || self.is_test_failed {
            return None;
        }
        let ctx = self.snapshot();
        Some(Effect::event(TestEvent::test_success(&ctx)).tests(Tally::Succeeded(1)))
    }

    /// Final suite outcome, unless a suite scope outcome was recorded already
    fn finish_suite(&mut self) -> Option<Effect> {
        if !self.is_suite_live() {
            return None;
        }
        let ctx = self.snapshot();
        if self.some_test_failed {
            self.is_failed = true;
            let failure = Failure::new("One or more tests failed.");
            return Some(Effect::event(TestEvent::suite_fail(&ctx, Some(failure))).suites(Tally::Failed(1)));
        }
        Some(Effect::event(TestEvent::suite_success(&ctx)).suites(Tally::Succeeded(1)))
    }
}

/// Warning emitted instead of a second outcome for the same scope
fn ignored(ctx: &ContextSnapshot, failure: &Failure) -> Effect {
    Effect::event(TestEvent::warning(
        ctx,
        format!("Failure ignored, outcome already recorded: {}", failure.description()),
    ))
}

/// State shared between a suite runtime and the contexts it hands out
pub(crate) struct RuntimeShared {
    state: Mutex<SuiteState>,
    host: Platform,
    reporting: Reporting,
}

impl RuntimeShared {
    pub(crate) fn config(&self) -> &RunConfig {
        &self.reporting.config
    }

    pub(crate) fn interaction_is_allowed(&self) -> bool {
        self.reporting.interaction.is_some()
    }

    pub(crate) fn host(&self) -> Platform {
        self.host
    }

    pub(crate) fn is_current(&self, ctx: &TestContext) -> bool {
        lock(&self.state).generation == ctx.generation()
    }

    /// Lock the state if `ctx` is still current, raise a defect otherwise
    fn checked(&self, ctx: &TestContext) -> Result<MutexGuard<'_, SuiteState>> {
        let state = lock(&self.state);
        if state.generation == ctx.generation() {
            return Ok(state);
        }
        let current = state.snapshot();
        drop(state);

        let defect = TestbedError::StaleContext {
            reported: ctx.snapshot().clone(),
            current,
        };
        error!("{}", defect);
        if !self.reporting.defects.raise(defect.clone()) {
            debug!("Another defect is already in flight");
        }
        Err(defect)
    }

    pub(crate) fn report_skip(&self, ctx: &TestContext, reason: &str) -> Result<()> {
        let state = self.checked(ctx)?;
        self.settle(state, Outcome::skip(reason));
        Ok(())
    }

    pub(crate) fn report_failure(&self, ctx: &TestContext, failure: Failure) -> Result<()> {
        let state = self.checked(ctx)?;
        self.settle(state, Outcome::Fail(failure));
        Ok(())
    }

    pub(crate) fn report_info(&self, ctx: &TestContext, message: &str) -> Result<()> {
        drop(self.checked(ctx)?);
        self.reporting
            .monitor
            .report_event(&TestEvent::info(ctx.snapshot(), message));
        if let Some(interaction) = &self.reporting.interaction {
            interaction.report_info(ctx.snapshot(), message);
        }
        Ok(())
    }

    pub(crate) fn report_warning(&self, ctx: &TestContext, message: &str) -> Result<()> {
        drop(self.checked(ctx)?);
        self.reporting
            .monitor
            .report_event(&TestEvent::warning(ctx.snapshot(), message));
        if let Some(interaction) = &self.reporting.interaction {
            interaction.report_warning(ctx.snapshot(), message);
        }
        Ok(())
    }

    pub(crate) async fn show_prompt(
        &self,
        ctx: &TestContext,
        message: &str,
        duration: PromptDuration,
    ) -> Result<()> {
        let interaction = self
            .reporting
            .interaction
            .clone()
            .ok_or(TestbedError::InteractionNotAllowed)?;
        drop(self.checked(ctx)?);
        interaction.show_prompt(ctx.snapshot(), message, duration).await;
        Ok(())
    }

    /// Resolve an outcome against the current phase and publish the result
    fn settle(&self, mut state: MutexGuard<'_, SuiteState>, outcome: Outcome) {
        let snapshot = state.snapshot();
        let (effect, skip_reason) = match outcome {
            Outcome::Success => return,
            Outcome::Skip(reason) => (state.record_skip(reason.clone()), Some(reason)),
            Outcome::Fail(failure) => (state.record_failure(failure), None),
        };
        drop(state);

        let Some(effect) = effect else {
            debug!(context = %snapshot, "Skip ignored, outcome already recorded");
            return;
        };
        let skipped = matches!(effect.event.kind, TestEventKind::SuiteSkip | TestEventKind::TestSkip);
        self.apply(effect);

        if let (true, Some(reason), Some(interaction)) = (skipped, skip_reason, &self.reporting.interaction) {
            interaction.report_skip(&snapshot, &reason);
        }
    }

    fn apply(&self, effect: Effect) {
        let reporting = &self.reporting;
        reporting.monitor.report_event(&effect.event);

        if let Some(tally) = effect.suites {
            let result = lock(&reporting.suites).add(tally);
            match result {
                Ok(progress) => reporting.monitor.report_suites_progress(&progress),
                Err(defect) => self.raise_defect(defect),
            }
        }
        if let Some(tally) = effect.tests {
            let result = lock(&reporting.tests).add(tally);
            match result {
                Ok(progress) => reporting.monitor.report_tests_progress(&progress),
                Err(defect) => self.raise_defect(defect),
            }
        }
    }

    fn raise_defect(&self, defect: TestbedError) {
        error!("{}", defect);
        self.reporting.defects.raise(defect);
    }
}

/// Drives one suite through its lifecycle. Created per suite, dropped
/// after `AFTER_ALL`.
pub(crate) struct SuiteRuntime {
    shared: Arc<RuntimeShared>,
}

impl SuiteRuntime {
    pub(crate) fn new(suite: &Suite, reporting: Reporting) -> Self {
        Self {
            shared: Arc::new(RuntimeShared {
                state: Mutex::new(SuiteState::new(suite.name(), suite.test_count())),
                host: suite.host(),
                reporting,
            }),
        }
    }

    pub(crate) fn is_suite_live(&self) -> bool {
        lock(&self.shared.state).is_suite_live()
    }

    fn enter(&self, phase: LifecyclePhase, test_name: Option<&str>) -> TestContext {
        let (snapshot, generation) = lock(&self.shared.state).enter(phase, test_name);
        debug!(context = %snapshot, phase = %phase, "Entering phase");
        TestContext::new(snapshot, generation, Arc::clone(&self.shared))
    }

    fn emit(&self, event: TestEvent) {
        self.shared.reporting.monitor.report_event(&event);
    }

    fn record(&self, outcome: Outcome) {
        let state = lock(&self.shared.state);
        self.shared.settle(state, outcome);
    }

    fn publish(&self, effect: Option<Effect>) {
        if let Some(effect) = effect {
            self.shared.apply(effect);
        }
    }

    /// Run a hook and record what it returned
    async fn invoke(&self, suite: &Suite, hook: Option<&Body>, ctx: TestContext) {
        let Some(hook) = hook else {
            return;
        };
        if suite.print_info_messages() {
            self.emit(TestEvent::info(ctx.snapshot(), format!("{}()", ctx.phase().hook_name())));
        }
        let outcome = hook(ctx).await;
        self.record(outcome);
    }

    pub(crate) async fn before_all(&self, suite: &Suite) {
        let ctx = self.enter(LifecyclePhase::BeforeAll, None);
        self.emit(TestEvent::suite_start(ctx.snapshot()));

        if suite.test_count() == 0 {
            self.record(TestbedError::EmptySuite(suite.name().to_string()).into());
            return;
        }
        if suite.is_interactive() && !self.shared.interaction_is_allowed() {
            self.record(TestbedError::InteractionUnavailable(suite.name().to_string()).into());
            return;
        }
        self.invoke(suite, suite.hook(LifecyclePhase::BeforeAll), ctx).await;
    }

    pub(crate) async fn before_each(&self, suite: &Suite, test: &TestEntry) {
        let ctx = self.enter(LifecyclePhase::BeforeEach, Some(test.name()));
        self.emit(TestEvent::test_start(ctx.snapshot()));

        let only = suite
            .run_only_one_test()
            .or(self.shared.config().run_only_test.as_deref());
        if let Some(only) = only {
            if only != test.name() {
                self.record(Outcome::skip(format!(
                    "Skipped, because only {only} is allowed to run"
                )));
            }
        }
        self.invoke(suite, suite.hook(LifecyclePhase::BeforeEach), ctx).await;
    }

    pub(crate) async fn run_test(&self, test: &TestEntry) {
        let ctx = self.enter(LifecyclePhase::InTest, Some(test.name()));
        self.emit(TestEvent::phase_enter(ctx.snapshot()));

        if !lock(&self.shared.state).is_test_live() {
            return;
        }
        let outcome = test.run(ctx).await;
        self.record(outcome);
    }

    pub(crate) async fn after_each(&self, suite: &Suite) {
        let ctx = self.enter(LifecyclePhase::AfterEach, None);
        self.emit(TestEvent::phase_enter(ctx.snapshot()));

        self.invoke(suite, suite.hook(LifecyclePhase::AfterEach), ctx).await;
        let effect = lock(&self.shared.state).finish_test();
        self.publish(effect);
    }

    /// Run the after_all hook unless the suite never got going. An
    /// interrupted suite is torn down but not counted.
    pub(crate) async fn after_all(&self, suite: &Suite, interrupted: bool) {
        lock(&self.shared.state).interrupted = interrupted;
        let ctx = self.enter(LifecyclePhase::AfterAll, None);
        self.emit(TestEvent::phase_enter(ctx.snapshot()));

        if self.is_suite_live() {
            self.invoke(suite, suite.hook(LifecyclePhase::AfterAll), ctx.clone()).await;
        }
        if interrupted {
            self.emit(TestEvent::warning(ctx.snapshot(), "Suite interrupted, not counted."));
        } else {
            let effect = lock(&self.shared.state).finish_suite();
            self.publish(effect);
        }
        lock(&self.shared.state).close();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state_in(phase: LifecyclePhase) -> SuiteState {
        let mut state = SuiteState::new("Suite", 3);
        state.enter(LifecyclePhase::BeforeEach, Some("test1"));
        state.enter(phase, None);
        state
    }

    #[test]
    fn test_generation_bumps_on_every_transition() {
        let mut state = SuiteState::new("Suite", 1);
        let (_, first) = state.enter(LifecyclePhase::BeforeAll, None);
        let (ctx, second) = state.enter(LifecyclePhase::BeforeEach, Some("test1"));
        assert!(second > first);
        assert_eq!(ctx.test_name.as_deref(), Some("test1"));

        let (ctx, _) = state.enter(LifecyclePhase::InTest, None);
        assert_eq!(ctx.test_name.as_deref(), Some("test1"));

        let (ctx, _) = state.enter(LifecyclePhase::AfterAll, None);
        assert!(ctx.test_name.is_none());
    }

    #[test]
    fn test_second_skip_is_ignored() {
        let mut state = state_in(LifecyclePhase::InTest);
        let first = state.record_skip("first".into()).unwrap();
        assert_eq!(first.event.kind, TestEventKind::TestSkip);
        assert_eq!(first.tests, Some(Tally::Skipped(1)));
        assert!(state.record_skip("second".into()).is_none());
    }

    #[test]
    fn test_failure_after_skip_becomes_warning() {
        let mut state = state_in(LifecyclePhase::BeforeEach);
        state.record_skip("not today".into());
        let effect = state.record_failure(Failure::new("boom")).unwrap();
        assert_eq!(effect.event.kind, TestEventKind::TestWarn);
        assert!(effect.tests.is_none());
        assert!(state.finish_test().is_none());
    }

    #[test]
    fn test_skip_from_after_each_fails_test() {
        let mut state = state_in(LifecyclePhase::AfterEach);
        let effect = state.record_skip("late".into()).unwrap();
        assert_eq!(effect.event.kind, TestEventKind::TestFail);
        assert!(effect
            .event
            .message
            .unwrap()
            .contains("You should not skip from afterEach()"));
        assert!(state.some_test_failed);
    }

    #[test]
    fn test_before_all_skip_covers_every_test() {
        let mut state = SuiteState::new("Suite", 3);
        state.enter(LifecyclePhase::BeforeAll, None);
        let effect = state.record_skip("no server".into()).unwrap();
        assert_eq!(effect.suites, Some(Tally::Skipped(1)));
        assert_eq!(effect.tests, Some(Tally::Skipped(3)));
        assert!(!state.is_suite_live());
        assert!(state.finish_suite().is_none());
    }

    #[test]
    fn test_failed_test_fails_suite() {
        let mut state = state_in(LifecyclePhase::InTest);
        state.record_failure(Failure::new("boom"));
        state.enter(LifecyclePhase::AfterAll, None);
        let effect = state.finish_suite().unwrap();
        assert_eq!(effect.event.kind, TestEventKind::SuiteFail);
        assert_eq!(effect.suites, Some(Tally::Failed(1)));
    }

    #[test]
    fn test_after_all_failure_keeps_test_counts() {
        let mut state = state_in(LifecyclePhase::AfterAll);
        let effect = state.record_failure(Failure::new("teardown")).unwrap();
        assert_eq!(effect.suites, Some(Tally::Failed(1)));
        assert!(effect.tests.is_none());
    }

    #[test]
    fn test_interrupted_teardown_failure_is_not_counted() {
        let mut state = state_in(LifecyclePhase::AfterAll);
        state.interrupted = true;
        let effect = state.record_skip("late".into()).unwrap();
        assert_eq!(effect.event.kind, TestEventKind::SuiteWarn);
        assert!(effect.suites.is_none());
        assert!(effect.tests.is_none());
        assert!(state.is_suite_live());
    }

    #[test]
    fn test_defect_slot_keeps_first() {
        let slot = DefectSlot::default();
        assert!(slot.raise(TestbedError::SkipFromAfterAll));
        assert!(!slot.raise(TestbedError::NoSuites));
        assert_eq!(slot.take(), Some(TestbedError::SkipFromAfterAll));
        assert!(!slot.is_raised());
    }
}
