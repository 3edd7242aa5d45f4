//! Shared helpers for runner scenarios

#![allow(dead_code)]

use futures::future::BoxFuture;
use futures::FutureExt;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use testbed::{
    ContextSnapshot, MonitorGroup, Platform, PromptDuration, RunConfig, Suite, TestContext,
    TestEvent, TestEventKind, TestMonitor, TestProgress, TestRunner, UserInteraction,
};

/// Suite whose skip and failure points are switched on per scenario
#[derive(Default)]
pub struct ConfigurableTest {
    pub skip_from_before_all: bool,
    pub skip_from_before_each: bool,
    pub skip_from_after_each: bool,
    pub skip_from_after_all: bool,
    pub skip_from_func: bool,
    pub double_skip: bool,

    pub fail_from_before_all: bool,
    pub fail_from_before_each: bool,
    pub fail_from_after_each: bool,
    pub fail_from_after_all: bool,
    pub fail_from_func: bool,
    pub double_fail: bool,

    pub before_all_called: AtomicUsize,
    pub before_each_called: AtomicUsize,
    pub after_each_called: AtomicUsize,
    pub after_all_called: AtomicUsize,

    pub test1_called: AtomicUsize,
    pub test2_called: AtomicUsize,
    pub test_skipped_called: AtomicUsize,
    pub test_skipped_from_test_called: AtomicUsize,
    pub test_failed_called: AtomicUsize,
    pub android_test_called: AtomicUsize,
    pub ios_test_called: AtomicUsize,
}

pub fn calls(counter: &AtomicUsize) -> usize {
    counter.load(Ordering::SeqCst)
}

fn bump(counter: &AtomicUsize) {
    counter.fetch_add(1, Ordering::SeqCst);
}

fn skip(ctx: &TestContext, double: bool, reason: &str) -> anyhow::Result<()> {
    ctx.report_skip(reason)?;
    if double {
        ctx.report_skip(format!("{reason} for 2nd time"))?;
    }
    Ok(())
}

impl ConfigurableTest {
    /// Six tests on the simulated Android host
    pub fn build(self) -> (Arc<Self>, Suite) {
        let state = Arc::new(self);
        let suite = Suite::builder(state.clone())
            .host(Platform::Android)
            .before_all(|t, ctx| async move {
                bump(&t.before_all_called);
                if t.skip_from_before_all {
                    skip(&ctx, t.double_skip, "Skipped from beforeAll")?;
                }
                if t.fail_from_before_all {
                    if t.double_fail {
                        ctx.report_failure("Failed from beforeAll through the context")?;
                    }
                    anyhow::bail!("Failed from beforeAll");
                }
                Ok(())
            })
            .after_all(|t, ctx| async move {
                bump(&t.after_all_called);
                if t.skip_from_after_all {
                    skip(&ctx, t.double_skip, "Skipped from afterAll")?;
                }
                if t.fail_from_after_all {
                    anyhow::bail!("Failed from afterAll");
                }
                Ok(())
            })
            .before_each(|t, ctx| async move {
                bump(&t.before_each_called);
                if t.skip_from_before_each && ctx.test_name() == Some("testSkipped") {
                    skip(&ctx, t.double_skip, "Skipped from beforeEach")?;
                }
                if t.fail_from_before_each && ctx.test_name() == Some("testFailed") {
                    anyhow::bail!("Failed from beforeEach");
                }
                Ok(())
            })
            .after_each(|t, ctx| async move {
                bump(&t.after_each_called);
                if t.skip_from_after_each && ctx.test_name() == Some("testSkipped") {
                    skip(&ctx, t.double_skip, "Skipped from afterEach")?;
                }
                if t.fail_from_after_each && ctx.test_name() == Some("testFailed") {
                    anyhow::bail!("Failed from afterEach");
                }
                Ok(())
            })
            .test("test1", |t, _ctx| async move { bump(&t.test1_called) })
            .test("test2", |t, _ctx| async move { bump(&t.test2_called) })
            .test("testSkipped", |t, _ctx| async move {
                bump(&t.test_skipped_called)
            })
            .test("testSkippedFromTest", |t, ctx| async move {
                bump(&t.test_skipped_from_test_called);
                if t.skip_from_func {
                    skip(&ctx, t.double_skip, "Skipped from test")?;
                }
                Ok::<(), anyhow::Error>(())
            })
            .test("testFailed", |t, _ctx| async move {
                bump(&t.test_failed_called);
                if t.fail_from_func {
                    anyhow::bail!("Failed from test");
                }
                Ok(())
            })
            .android_test("androidTest", |t, ctx| async move {
                anyhow::ensure!(ctx.host() == Platform::Android, "Not on Android");
                bump(&t.android_test_called);
                Ok(())
            })
            .ios_test("iosTest", |t, ctx| async move {
                anyhow::ensure!(ctx.host() == Platform::Ios, "Not on iOS");
                bump(&t.ios_test_called);
                Ok(())
            })
            .build();
        (state, suite)
    }
}

/// Plain six-test suite
pub fn normal_suite() -> Suite {
    ConfigurableTest::default().build().1
}

/// Records every event and checks the counter invariant on every snapshot
#[derive(Default)]
pub struct RecordingMonitor {
    events: Mutex<Vec<TestEvent>>,
    progress_reports: AtomicUsize,
    invariant_violations: AtomicUsize,
}

impl RecordingMonitor {
    pub fn events(&self) -> Vec<TestEvent> {
        self.events.lock().unwrap().clone()
    }

    pub fn kinds(&self) -> Vec<TestEventKind> {
        self.events().iter().map(|e| e.kind).collect()
    }

    pub fn count(&self, kind: TestEventKind) -> usize {
        self.events().iter().filter(|e| e.kind == kind).count()
    }

    pub fn last_message(&self) -> Option<String> {
        self.events().last().and_then(|e| e.message.clone())
    }

    pub fn progress_reports(&self) -> usize {
        calls(&self.progress_reports)
    }

    pub fn invariant_violations(&self) -> usize {
        calls(&self.invariant_violations)
    }

    fn check(&self, progress: &TestProgress) {
        bump(&self.progress_reports);
        if progress.succeeded + progress.failed + progress.skipped > progress.total {
            bump(&self.invariant_violations);
        }
    }
}

impl TestMonitor for RecordingMonitor {
    fn report_event(&self, event: &TestEvent) {
        self.events.lock().unwrap().push(event.clone());
    }

    fn report_suites_progress(&self, progress: &TestProgress) {
        self.check(progress);
    }

    fn report_tests_progress(&self, progress: &TestProgress) {
        self.check(progress);
    }
}

/// Interaction provider that remembers prompts and echoes instead of
/// showing anything
#[derive(Default)]
pub struct RecordingInteraction {
    pub prompts: Mutex<Vec<String>>,
    pub skips: Mutex<Vec<String>>,
    pub infos: Mutex<Vec<String>>,
}

impl UserInteraction for RecordingInteraction {
    fn show_prompt<'a>(
        &'a self,
        ctx: &'a ContextSnapshot,
        message: &'a str,
        _duration: PromptDuration,
    ) -> BoxFuture<'a, ()> {
        async move {
            self.prompts.lock().unwrap().push(format!("{ctx}: {message}"));
        }
        .boxed()
    }

    fn report_info(&self, _ctx: &ContextSnapshot, message: &str) {
        self.infos.lock().unwrap().push(message.to_string());
    }

    fn report_skip(&self, _ctx: &ContextSnapshot, reason: &str) {
        self.skips.lock().unwrap().push(reason.to_string());
    }
}

/// Runner reporting into a recording monitor (behind a group, the way
/// embedding applications usually wire it)
pub fn recording_runner(config: RunConfig) -> (TestRunner, Arc<RecordingMonitor>) {
    let monitor = Arc::new(RecordingMonitor::default());
    let group = MonitorGroup::new().with(monitor.clone());
    (TestRunner::new(config, Arc::new(group)), monitor)
}

pub fn interactive_runner(
    config: RunConfig,
) -> (TestRunner, Arc<RecordingMonitor>, Arc<RecordingInteraction>) {
    let (runner, monitor) = recording_runner(config);
    let interaction = Arc::new(RecordingInteraction::default());
    (runner.with_interaction(interaction.clone()), monitor, interaction)
}
