//! Built-in smoke suites
//!
//! Suites the `testbed` binary runs against the engine itself: hook
//! ordering, every outcome kind, settings lookup and host specific tests.

use anyhow::{ensure, Context};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::models::{Outcome, Platform};
use crate::suite::Suite;

/// All smoke suites, in the order they run, with host specific tests
/// resolved against `host`
pub fn smoke_suites(host: Platform) -> Vec<Suite> {
    vec![
        lifecycle_suite(),
        outcome_suite(),
        settings_suite(),
        platform_suite(host),
    ]
}

/// Records hook invocations in the order they happen
#[derive(Default)]
pub struct SmokeLifecycle {
    calls: Mutex<Vec<String>>,
}

impl SmokeLifecycle {
    fn record(&self, call: impl Into<String>) {
        self.calls
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(call.into());
    }

    fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }
}

const LIFECYCLE_TESTS: [&str; 2] = ["test_first", "test_second"];

fn lifecycle_suite() -> Suite {
    let mut builder = Suite::builder(Arc::new(SmokeLifecycle::default()))
        .before_all(|s, _ctx| async move { s.record("beforeAll") })
        .before_each(|s, ctx| async move {
            s.record(format!("beforeEach {}", ctx.test_name().unwrap_or_default()))
        })
        .after_each(|s, ctx| async move {
            s.record(format!("afterEach {}", ctx.test_name().unwrap_or_default()))
        });

    for name in LIFECYCLE_TESTS {
        builder = builder.test(name, move |s, _ctx| async move {
            s.record(name);
            let calls = s.calls();
            let before = calls.len().checked_sub(2).and_then(|i| calls.get(i));
            ensure!(
                before.map(String::as_str) == Some(format!("beforeEach {name}").as_str()),
                "beforeEach didn't run right before {name}: {calls:?}"
            );
            Ok::<(), anyhow::Error>(())
        });
    }

    builder
        .after_all(|s, _ctx| async move {
            let mut expected = vec!["beforeAll".to_string()];
            for name in LIFECYCLE_TESTS {
                expected.push(format!("beforeEach {name}"));
                expected.push(name.to_string());
                expected.push(format!("afterEach {name}"));
            }
            let calls = s.calls();
            ensure!(calls == expected, "Unexpected hook order: {calls:?}");
            Ok::<(), anyhow::Error>(())
        })
        .build()
}

/// Exercises every outcome a test can end with
#[derive(Default)]
pub struct SmokeOutcomes {
    reports: AtomicUsize,
}

fn outcome_suite() -> Suite {
    Suite::builder(Arc::new(SmokeOutcomes::default()))
        .print_info_messages()
        .test("test_success", |_s, _ctx| async {})
        .test("test_async_wait", |_s, ctx| async move {
            tokio::time::sleep(Duration::from_millis(10)).await;
            ctx.report_info("Still current after an awaited sleep")?;
            Ok::<(), anyhow::Error>(())
        })
        .test("test_reports", |s, ctx| async move {
            ctx.report_info("Reporting an info message")?;
            ctx.report_warning("Reporting a warning")?;
            s.reports.fetch_add(2, Ordering::SeqCst);
            Ok::<(), anyhow::Error>(())
        })
        .test("test_skip", |_s, _ctx| async {
            Outcome::skip("Demonstrates a skipped test")
        })
        .test("test_anyhow_context", |_s, _ctx| async {
            let value: u32 = "42".parse().context("Failed to parse constant")?;
            ensure!(value == 42, "Parsed {value}");
            Ok::<(), anyhow::Error>(())
        })
        .build()
}

/// Reads values from the run configuration
pub struct SmokeSettings;

fn settings_suite() -> Suite {
    Suite::builder(Arc::new(SmokeSettings))
        .test("test_greeting_setting", |_s, ctx| async move {
            match ctx.setting("greeting") {
                Some(greeting) if !greeting.trim().is_empty() => Outcome::Success,
                Some(_) => Outcome::fail("Setting 'greeting' is blank"),
                None => Outcome::skip("Setting 'greeting' is not configured"),
            }
        })
        .test("test_batch_name", |_s, ctx| async move {
            ensure!(!ctx.config().batch_name.is_empty(), "Batch name is empty");
            Ok::<(), anyhow::Error>(())
        })
        .build()
}

/// Host specific tests, resolved when the suite is built
pub struct SmokePlatform;

fn platform_suite(host: Platform) -> Suite {
    Suite::builder(Arc::new(SmokePlatform))
        .host(host)
        .test("test_host_is_known", |_s, ctx| async move {
            ctx.report_info(format!("Running on {}", ctx.host()))?;
            Ok::<(), anyhow::Error>(())
        })
        .android_test("test_android_only", |_s, ctx| async move {
            ensure!(ctx.host() == Platform::Android, "Ran on {}", ctx.host());
            Ok::<(), anyhow::Error>(())
        })
        .ios_test("test_ios_only", |_s, ctx| async move {
            ensure!(ctx.host() == Platform::Ios, "Ran on {}", ctx.host());
            Ok::<(), anyhow::Error>(())
        })
        .build()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RunConfig;
    use crate::executor::TestRunner;
    use crate::monitor::TracingMonitor;

    #[test]
    fn test_suite_names() {
        let names: Vec<_> = smoke_suites(Platform::current()).iter().map(|s| s.name().to_string()).collect();
        assert_eq!(
            names,
            vec!["SmokeLifecycle", "SmokeOutcomes", "SmokeSettings", "SmokePlatform"]
        );
    }

    #[test]
    fn test_platform_suite_per_host() {
        assert_eq!(platform_suite(Platform::Other).test_count(), 1);
        assert_eq!(
            platform_suite(Platform::Ios).test_names(),
            vec!["test_host_is_known", "test_ios_only"]
        );
    }

    #[tokio::test]
    async fn test_smoke_suites_pass() {
        let config = RunConfig::new().with_setting("greeting", "hello");
        let runner = TestRunner::new(config, Arc::new(TracingMonitor::new()));
        let suites = smoke_suites(Platform::Android);

        assert!(runner.run_tests(&suites).await);
        let tests = runner.tests_progress();
        assert_eq!(tests.failed, 0);
        assert_eq!(tests.skipped, 1);
        assert_eq!(runner.suites_progress().succeeded, 4);
    }
}
