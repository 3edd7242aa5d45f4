//! testbed - sequential asynchronous test orchestration
//!
//! Runs suites of asynchronous test methods one at a time through the
//! `beforeAll → {beforeEach → test → afterEach}* → afterAll` lifecycle,
//! resolving skips and failures per phase and reporting every step to a
//! monitor.
//!
//! ## Usage
//!
//! ```no_run
//! use std::sync::Arc;
//! use testbed::{RunConfig, Suite, TestRunner, TracingMonitor};
//!
//! # async fn run() {
//! let suite = Suite::named("Math")
//!     .test("test_add", |_s, _ctx| async { anyhow::ensure!(1 + 1 == 2, "math broke"); Ok(()) })
//!     .build();
//!
//! let runner = TestRunner::new(RunConfig::default(), Arc::new(TracingMonitor::new()));
//! let passed = runner.run_tests(&[suite]).await;
//! # }
//! ```

pub mod config;
pub mod error;
pub mod executor;
pub mod models;
pub mod monitor;
pub mod smoke;
pub mod suite;
pub mod utils;

pub use config::{ConfigFile, EnvConfig, RunConfig};
pub use error::{Result, TestbedError};
pub use executor::{TestContext, TestRunner};
pub use models::{
    ContextSnapshot, Failure, HostRequirement, LifecyclePhase, Outcome, Platform, TestEvent,
    TestEventKind, TestProgress,
};
pub use monitor::{MonitorGroup, PromptDuration, TestMonitor, TracingMonitor, UserInteraction};
pub use suite::{Suite, SuiteBuilder, TestEntry, TestFuture};
