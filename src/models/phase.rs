//! Lifecycle phases and host platform tags

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Phase a suite runtime is currently in
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LifecyclePhase {
    BeforeAll,
    BeforeEach,
    InTest,
    AfterEach,
    AfterAll,
}

impl LifecyclePhase {
    /// Name of the hook that runs in this phase
    pub fn hook_name(&self) -> &'static str {
        match self {
            LifecyclePhase::BeforeAll => "beforeAll",
            LifecyclePhase::BeforeEach => "beforeEach",
            LifecyclePhase::InTest => "test",
            LifecyclePhase::AfterEach => "afterEach",
            LifecyclePhase::AfterAll => "afterAll",
        }
    }

    /// Phases scoped to the whole suite rather than to a single test
    pub fn is_suite_scope(&self) -> bool {
        matches!(self, LifecyclePhase::BeforeAll | LifecyclePhase::AfterAll)
    }
}

impl fmt::Display for LifecyclePhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.hook_name())
    }
}

/// Platform the tests are running on
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    Android,
    Ios,
    Other,
}

impl Platform {
    /// Platform of the current build target
    pub fn current() -> Self {
        if cfg!(target_os = "android") {
            Platform::Android
        } else if cfg!(target_os = "ios") {
            Platform::Ios
        } else {
            Platform::Other
        }
    }
}

impl FromStr for Platform {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "android" => Ok(Platform::Android),
            "ios" => Ok(Platform::Ios),
            "other" | "host" => Ok(Platform::Other),
            other => Err(format!("unknown platform '{other}'")),
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Platform::Android => write!(f, "Android"),
            Platform::Ios => write!(f, "iOS"),
            Platform::Other => write!(f, "other"),
        }
    }
}

/// Platform a registered test method is restricted to
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HostRequirement {
    #[default]
    Any,
    Android,
    Ios,
}

impl HostRequirement {
    pub fn applies_to(&self, host: Platform) -> bool {
        match self {
            HostRequirement::Any => true,
            HostRequirement::Android => host == Platform::Android,
            HostRequirement::Ios => host == Platform::Ios,
        }
    }

    pub fn is_platform_specific(&self) -> bool {
        !matches!(self, HostRequirement::Any)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_suite_scope_phases() {
        assert!(LifecyclePhase::BeforeAll.is_suite_scope());
        assert!(LifecyclePhase::AfterAll.is_suite_scope());
        assert!(!LifecyclePhase::InTest.is_suite_scope());
    }

    #[test]
    fn test_host_requirement() {
        assert!(HostRequirement::Any.applies_to(Platform::Other));
        assert!(HostRequirement::Android.applies_to(Platform::Android));
        assert!(!HostRequirement::Android.applies_to(Platform::Ios));
        assert!(!HostRequirement::Ios.applies_to(Platform::Other));
    }

    #[test]
    fn test_platform_from_str() {
        assert_eq!("iOS".parse::<Platform>(), Ok(Platform::Ios));
        assert_eq!("android".parse::<Platform>(), Ok(Platform::Android));
        assert!("windows".parse::<Platform>().is_err());
    }
}
