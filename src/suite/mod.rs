//! Test suites
//!
//! A suite is assembled with [`SuiteBuilder`]: four optional lifecycle
//! hooks plus an ordered list of test methods. Each test method carries a
//! [`HostRequirement`]; methods for other hosts are dropped when the suite
//! is built, so discovery afterwards is a plain list walk.
//!
//! ```no_run
//! use std::sync::Arc;
//! use std::sync::atomic::{AtomicUsize, Ordering};
//! use testbed::{Outcome, Suite};
//!
//! #[derive(Default)]
//! struct Login {
//!     attempts: AtomicUsize,
//! }
//!
//! let suite = Suite::builder(Arc::new(Login::default()))
//!     .before_each(|s, _ctx| async move { s.attempts.store(0, Ordering::SeqCst) })
//!     .test("test_login", |s, _ctx| async move {
//!         s.attempts.fetch_add(1, Ordering::SeqCst);
//!     })
//!     .test("test_lockout", |_s, _ctx| async move {
//!         Outcome::skip("server doesn't support lockout")
//!     })
//!     .build();
//! assert_eq!(suite.name(), "Login");
//! ```

use futures::future::BoxFuture;
use futures::FutureExt;
use std::fmt;
use std::future::Future;
use std::sync::Arc;

use crate::executor::TestContext;
use crate::models::{HostRequirement, LifecyclePhase, Outcome, Platform};

/// Future returned by every hook and test body
pub type TestFuture = BoxFuture<'static, Outcome>;

pub(crate) type Body = Arc<dyn Fn(TestContext) -> TestFuture + Send + Sync>;

/// One registered test method
#[derive(Clone)]
pub struct TestEntry {
    name: String,
    requirement: HostRequirement,
    body: Body,
}

impl TestEntry {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn requirement(&self) -> HostRequirement {
        self.requirement
    }

    pub(crate) fn run(&self, ctx: TestContext) -> TestFuture {
        (self.body)(ctx)
    }
}

impl fmt::Debug for TestEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TestEntry")
            .field("name", &self.name)
            .field("requirement", &self.requirement)
            .finish()
    }
}

#[derive(Clone, Default)]
struct Hooks {
    before_all: Option<Body>,
    before_each: Option<Body>,
    after_each: Option<Body>,
    after_all: Option<Body>,
}

/// A named collection of test methods sharing lifecycle hooks
#[derive(Clone)]
pub struct Suite {
    name: String,
    interactive: bool,
    print_info_messages: bool,
    run_only_one_test: Option<String>,
    host: Platform,
    hooks: Hooks,
    tests: Vec<TestEntry>,
}

impl Suite {
    /// Start building a suite around shared state. The suite name defaults
    /// to the name of the state type.
    pub fn builder<S: Send + Sync + 'static>(state: Arc<S>) -> SuiteBuilder<S> {
        SuiteBuilder::new(state)
    }

    /// Start building a stateless suite
    pub fn named(name: impl Into<String>) -> SuiteBuilder<()> {
        SuiteBuilder::new(Arc::new(())).name(name)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_interactive(&self) -> bool {
        self.interactive
    }

    pub fn print_info_messages(&self) -> bool {
        self.print_info_messages
    }

    pub fn run_only_one_test(&self) -> Option<&str> {
        self.run_only_one_test.as_deref()
    }

    /// Debug override: every other test is still counted, but skipped
    pub fn set_run_only_one_test(&mut self, name: Option<String>) {
        self.run_only_one_test = name;
    }

    /// Host the test list was resolved against
    pub fn host(&self) -> Platform {
        self.host
    }

    /// Test methods in execution order
    pub fn tests(&self) -> &[TestEntry] {
        &self.tests
    }

    pub fn test_names(&self) -> Vec<&str> {
        self.tests.iter().map(|t| t.name()).collect()
    }

    pub fn test_count(&self) -> usize {
        self.tests.len()
    }

    pub(crate) fn hook(&self, phase: LifecyclePhase) -> Option<&Body> {
        match phase {
            LifecyclePhase::BeforeAll => self.hooks.before_all.as_ref(),
            LifecyclePhase::BeforeEach => self.hooks.before_each.as_ref(),
            LifecyclePhase::AfterEach => self.hooks.after_each.as_ref(),
            LifecyclePhase::AfterAll => self.hooks.after_all.as_ref(),
            LifecyclePhase::InTest => None,
        }
    }
}

impl fmt::Debug for Suite {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Suite")
            .field("name", &self.name)
            .field("interactive", &self.interactive)
            .field("host", &self.host)
            .field("tests", &self.test_names())
            .finish()
    }
}

/// Builder for [`Suite`]
pub struct SuiteBuilder<S> {
    state: Arc<S>,
    name: String,
    interactive: bool,
    print_info_messages: bool,
    run_only_one_test: Option<String>,
    host: Platform,
    hooks: Hooks,
    tests: Vec<TestEntry>,
}

impl<S: Send + Sync + 'static> SuiteBuilder<S> {
    pub fn new(state: Arc<S>) -> Self {
        Self {
            state,
            name: derived_name::<S>(),
            interactive: false,
            print_info_messages: false,
            run_only_one_test: None,
            host: Platform::current(),
            hooks: Hooks::default(),
            tests: Vec::new(),
        }
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// The suite needs a person to interact with
    pub fn interactive(mut self) -> Self {
        self.interactive = true;
        self
    }

    /// Report an info message every time a lifecycle hook starts
    pub fn print_info_messages(mut self) -> Self {
        self.print_info_messages = true;
        self
    }

    pub fn run_only_one_test(mut self, name: impl Into<String>) -> Self {
        self.run_only_one_test = Some(name.into());
        self
    }

    /// Resolve platform specific tests against this host instead of the
    /// build target
    pub fn host(mut self, host: Platform) -> Self {
        self.host = host;
        self
    }

    pub fn before_all<F, Fut>(mut self, hook: F) -> Self
    where
        F: Fn(Arc<S>, TestContext) -> Fut + Send + Sync + 'static,
        Fut: Future + Send + 'static,
        Fut::Output: Into<Outcome>,
    {
        self.hooks.before_all = Some(self.erase(hook));
        self
    }

    pub fn before_each<F, Fut>(mut self, hook: F) -> Self
    where
        F: Fn(Arc<S>, TestContext) -> Fut + Send + Sync + 'static,
        Fut: Future + Send + 'static,
        Fut::Output: Into<Outcome>,
    {
        self.hooks.before_each = Some(self.erase(hook));
        self
    }

    pub fn after_each<F, Fut>(mut self, hook: F) -> Self
    where
        F: Fn(Arc<S>, TestContext) -> Fut + Send + Sync + 'static,
        Fut: Future + Send + 'static,
        Fut::Output: Into<Outcome>,
    {
        self.hooks.after_each = Some(self.erase(hook));
        self
    }

    pub fn after_all<F, Fut>(mut self, hook: F) -> Self
    where
        F: Fn(Arc<S>, TestContext) -> Fut + Send + Sync + 'static,
        Fut: Future + Send + 'static,
        Fut::Output: Into<Outcome>,
    {
        self.hooks.after_all = Some(self.erase(hook));
        self
    }

    /// Register a test method that runs on every host
    pub fn test<F, Fut>(self, name: impl Into<String>, body: F) -> Self
    where
        F: Fn(Arc<S>, TestContext) -> Fut + Send + Sync + 'static,
        Fut: Future + Send + 'static,
        Fut::Output: Into<Outcome>,
    {
        self.test_for(HostRequirement::Any, name, body)
    }

    /// Register a test method that only runs on Android
    pub fn android_test<F, Fut>(self, name: impl Into<String>, body: F) -> Self
    where
        F: Fn(Arc<S>, TestContext) -> Fut + Send + Sync + 'static,
        Fut: Future + Send + 'static,
        Fut::Output: Into<Outcome>,
    {
        self.test_for(HostRequirement::Android, name, body)
    }

    /// Register a test method that only runs on iOS
    pub fn ios_test<F, Fut>(self, name: impl Into<String>, body: F) -> Self
    where
        F: Fn(Arc<S>, TestContext) -> Fut + Send + Sync + 'static,
        Fut: Future + Send + 'static,
        Fut::Output: Into<Outcome>,
    {
        self.test_for(HostRequirement::Ios, name, body)
    }

    pub fn test_for<F, Fut>(mut self, requirement: HostRequirement, name: impl Into<String>, body: F) -> Self
    where
        F: Fn(Arc<S>, TestContext) -> Fut + Send + Sync + 'static,
        Fut: Future + Send + 'static,
        Fut::Output: Into<Outcome>,
    {
        let body = self.erase(body);
        self.tests.push(TestEntry {
            name: name.into(),
            requirement,
            body,
        });
        self
    }

    /// Resolve the test list against the host: common tests first, then
    /// the ones specific to this host, each group in registration order.
    pub fn build(self) -> Suite {
        let host = self.host;
        let (common, specific): (Vec<_>, Vec<_>) = self
            .tests
            .into_iter()
            .filter(|t| t.requirement.applies_to(host))
            .partition(|t| !t.requirement.is_platform_specific());

        Suite {
            name: self.name,
            interactive: self.interactive,
            print_info_messages: self.print_info_messages,
            run_only_one_test: self.run_only_one_test,
            host,
            hooks: self.hooks,
            tests: common.into_iter().chain(specific).collect(),
        }
    }

    fn erase<F, Fut>(&self, body: F) -> Body
    where
        F: Fn(Arc<S>, TestContext) -> Fut + Send + Sync + 'static,
        Fut: Future + Send + 'static,
        Fut::Output: Into<Outcome>,
    {
        let state = Arc::clone(&self.state);
        Arc::new(move |ctx: TestContext| -> TestFuture {
            let fut = body(Arc::clone(&state), ctx);
            async move { fut.await.into() }.boxed()
        })
    }
}

/// Last path segment of the type name, without generic arguments
fn derived_name<S>() -> String {
    let full = std::any::type_name::<S>();
    let base = full.split('<').next().unwrap_or(full);
    base.rsplit("::").next().unwrap_or(base).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    struct ConfigurableTest;

    fn platform_suite(host: Platform) -> Suite {
        Suite::builder(Arc::new(ConfigurableTest))
            .host(host)
            .android_test("androidTest", |_s, _ctx| async {})
            .test("test1", |_s, _ctx| async {})
            .ios_test("iosTest", |_s, _ctx| async {})
            .test("test2", |_s, _ctx| async {})
            .build()
    }

    #[test]
    fn test_name_is_derived_from_state_type() {
        let suite = Suite::builder(Arc::new(ConfigurableTest)).build();
        assert_eq!(suite.name(), "ConfigurableTest");

        let suite = Suite::builder(Arc::new(ConfigurableTest)).name("Custom").build();
        assert_eq!(suite.name(), "Custom");
    }

    #[test]
    fn test_platform_tests_are_appended_for_host() {
        assert_eq!(
            platform_suite(Platform::Android).test_names(),
            vec!["test1", "test2", "androidTest"]
        );
        assert_eq!(
            platform_suite(Platform::Ios).test_names(),
            vec!["test1", "test2", "iosTest"]
        );
        assert_eq!(platform_suite(Platform::Other).test_names(), vec!["test1", "test2"]);
    }

    #[test]
    fn test_hooks_are_optional() {
        let suite = Suite::named("Bare")
            .after_each(|_s, _ctx| async { Outcome::Success })
            .test("test1", |_s, _ctx| async {})
            .build();
        assert!(suite.hook(LifecyclePhase::BeforeAll).is_none());
        assert!(suite.hook(LifecyclePhase::AfterEach).is_some());
        assert!(suite.hook(LifecyclePhase::InTest).is_none());
        assert_eq!(suite.test_count(), 1);
        assert_eq!(suite.tests()[0].requirement(), HostRequirement::Any);
    }

    #[test]
    fn test_run_only_one_test_override() {
        let mut suite = Suite::named("Debug")
            .run_only_one_test("test2")
            .test("test1", |_s, _ctx| async {})
            .build();
        assert_eq!(suite.run_only_one_test(), Some("test2"));
        suite.set_run_only_one_test(None);
        assert_eq!(suite.run_only_one_test(), None);
    }
}
