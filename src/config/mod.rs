//! Configuration module
//!
//! Run configuration plus its file and environment sources. Later sources
//! win: defaults, then the config file, then `TESTBED_*` variables, then
//! command line flags.

mod env;
mod file;

pub use env::{print_env_help, EnvBuilder, EnvConfig, EnvGuard};
pub use file::ConfigFile;

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Configuration of one batch
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    /// Name reported with batch level events
    pub batch_name: String,

    /// Run only the suite with this name
    pub run_only_suite: Option<String>,

    /// Run only the test method with this name, skip the others
    pub run_only_test: Option<String>,

    /// Log level for the launcher
    pub log_level: String,

    /// Free-form values handed to tests through their context
    pub settings: BTreeMap<String, String>,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            batch_name: "Automatic tests".to_string(),
            run_only_suite: None,
            run_only_test: None,
            log_level: "info".to_string(),
            settings: BTreeMap::new(),
        }
    }
}

impl RunConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_batch_name(mut self, name: impl Into<String>) -> Self {
        self.batch_name = name.into();
        self
    }

    pub fn with_only_suite(mut self, suite: impl Into<String>) -> Self {
        self.run_only_suite = Some(suite.into());
        self
    }

    pub fn with_only_test(mut self, test: impl Into<String>) -> Self {
        self.run_only_test = Some(test.into());
        self
    }

    pub fn with_setting(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.settings.insert(key.into(), value.into());
        self
    }

    pub fn setting(&self, key: &str) -> Option<&str> {
        self.settings.get(key).map(String::as_str)
    }

    /// Apply `TESTBED_*` overrides
    pub fn apply_env(&mut self, env: &EnvConfig) {
        if let Some(batch) = &env.batch {
            self.batch_name = batch.clone();
        }
        if let Some(suite) = &env.suite {
            self.run_only_suite = Some(suite.clone());
        }
        if let Some(test) = &env.test {
            self.run_only_test = Some(test.clone());
        }
        if let Some(level) = &env.log_level {
            self.log_level = level.clone();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = RunConfig::default();
        assert_eq!(config.batch_name, "Automatic tests");
        assert_eq!(config.log_level, "info");
        assert!(config.run_only_suite.is_none());
        assert!(config.settings.is_empty());
    }

    #[test]
    fn test_env_overrides_file_values() {
        let mut config = RunConfig::new()
            .with_batch_name("Nightly")
            .with_only_suite("Login");
        let env = EnvConfig {
            suite: Some("Payments".to_string()),
            test: Some("test_refund".to_string()),
            ..Default::default()
        };
        config.apply_env(&env);

        assert_eq!(config.batch_name, "Nightly");
        assert_eq!(config.run_only_suite.as_deref(), Some("Payments"));
        assert_eq!(config.run_only_test.as_deref(), Some("test_refund"));
    }

    #[test]
    fn test_settings_lookup() {
        let config = RunConfig::new().with_setting("server", "staging");
        assert_eq!(config.setting("server"), Some("staging"));
        assert_eq!(config.setting("missing"), None);
    }

    #[test]
    fn test_partial_yaml_uses_defaults() {
        let config: RunConfig = serde_yaml::from_str("run_only_test: test2\n").unwrap();
        assert_eq!(config.run_only_test.as_deref(), Some("test2"));
        assert_eq!(config.batch_name, "Automatic tests");
    }
}
