//! Environment variable configuration
//!
//! Provides environment variable overrides for configuration.

use std::env;

/// Environment variable prefix
const ENV_PREFIX: &str = "TESTBED";

/// Environment configuration from environment variables
#[derive(Clone, Debug, Default)]
pub struct EnvConfig {
    /// Batch name from TESTBED_BATCH
    pub batch: Option<String>,
    /// Single suite from TESTBED_SUITE
    pub suite: Option<String>,
    /// Single test from TESTBED_TEST
    pub test: Option<String>,
    /// Config file from TESTBED_CONFIG
    pub config_file: Option<String>,
    /// Log level from TESTBED_LOG
    pub log_level: Option<String>,
}

impl EnvConfig {
    /// Load configuration from environment variables
    pub fn load() -> Self {
        Self {
            batch: get_env("BATCH"),
            suite: get_env("SUITE"),
            test: get_env("TEST"),
            config_file: get_env("CONFIG"),
            log_level: get_env("LOG"),
        }
    }

    /// Check if any environment variables are set
    pub fn has_any(&self) -> bool {
        self.batch.is_some()
            || self.suite.is_some()
            || self.test.is_some()
            || self.config_file.is_some()
            || self.log_level.is_some()
    }

    /// Print current environment configuration
    pub fn print_summary(&self) {
        println!("Environment Configuration:");
        println!("  {}_BATCH:   {:?}", ENV_PREFIX, self.batch);
        println!("  {}_SUITE:   {:?}", ENV_PREFIX, self.suite);
        println!("  {}_TEST:    {:?}", ENV_PREFIX, self.test);
        println!("  {}_CONFIG:  {:?}", ENV_PREFIX, self.config_file);
        println!("  {}_LOG:     {:?}", ENV_PREFIX, self.log_level);
    }
}

/// Get environment variable with prefix, ignoring empty values
fn get_env(name: &str) -> Option<String> {
    env::var(format!("{ENV_PREFIX}_{name}"))
        .ok()
        .filter(|v| !v.trim().is_empty())
}

/// Builder for setting environment variables (useful for testing)
#[derive(Default)]
pub struct EnvBuilder {
    vars: Vec<(String, String)>,
}

impl EnvBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn batch(self, name: impl Into<String>) -> Self {
        self.var("BATCH", name)
    }

    pub fn suite(self, suite: impl Into<String>) -> Self {
        self.var("SUITE", suite)
    }

    pub fn test(self, test: impl Into<String>) -> Self {
        self.var("TEST", test)
    }

    pub fn config_file(self, path: impl Into<String>) -> Self {
        self.var("CONFIG", path)
    }

    pub fn log_level(self, level: impl Into<String>) -> Self {
        self.var("LOG", level)
    }

    fn var(mut self, name: &str, value: impl Into<String>) -> Self {
        self.vars.push((format!("{ENV_PREFIX}_{name}"), value.into()));
        self
    }

    /// Apply environment variables
    pub fn apply(self) {
        for (key, value) in self.vars {
            env::set_var(key, value);
        }
    }

    /// Apply and return guard that restores on drop
    pub fn apply_scoped(self) -> EnvGuard {
        let previous: Vec<_> = self
            .vars
            .iter()
            .map(|(k, _)| (k.clone(), env::var(k).ok()))
            .collect();

        self.apply();

        EnvGuard { previous }
    }
}

/// Guard that restores environment variables on drop
pub struct EnvGuard {
    previous: Vec<(String, Option<String>)>,
}

impl Drop for EnvGuard {
    fn drop(&mut self) {
        for (key, value) in &self.previous {
            match value {
                Some(v) => env::set_var(key, v),
                None => env::remove_var(key),
            }
        }
    }
}

/// Print all TESTBED environment variables
pub fn print_env_help() {
    println!("Environment Variables:");
    println!();
    println!("  {ENV_PREFIX}_BATCH    Batch name shown in reports");
    println!("  {ENV_PREFIX}_SUITE    Run only this test suite");
    println!("  {ENV_PREFIX}_TEST     Run only this test method, skip the others");
    println!("  {ENV_PREFIX}_CONFIG   Path to configuration file");
    println!("  {ENV_PREFIX}_LOG      Log level (trace, debug, info, warn, error)");
    println!("  RUST_LOG         Full tracing filter, overrides {ENV_PREFIX}_LOG");
    println!();
    println!("Example:");
    println!("  export {ENV_PREFIX}_SUITE=SmokeLifecycle");
    println!("  testbed run");
}
