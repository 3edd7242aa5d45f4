//! Tagged result of a hook or test body

use serde::{Serialize, Serializer};
use std::fmt;
use std::sync::Arc;

use crate::error::TestbedError;

/// What a lifecycle hook or test body ended with
#[derive(Clone, Debug)]
pub enum Outcome {
    Success,
    /// Intentional non-execution with a human readable reason
    Skip(String),
    Fail(Failure),
}

impl Outcome {
    pub fn skip(reason: impl Into<String>) -> Self {
        Outcome::Skip(reason.into())
    }

    pub fn fail(message: impl Into<String>) -> Self {
        Outcome::Fail(Failure::new(message))
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Outcome::Success)
    }
}

impl From<()> for Outcome {
    fn from(_: ()) -> Self {
        Outcome::Success
    }
}

impl From<anyhow::Result<()>> for Outcome {
    fn from(result: anyhow::Result<()>) -> Self {
        match result {
            Ok(()) => Outcome::Success,
            Err(e) => Outcome::Fail(Failure::from(e)),
        }
    }
}

impl From<crate::error::Result<()>> for Outcome {
    fn from(result: crate::error::Result<()>) -> Self {
        match result {
            Ok(()) => Outcome::Success,
            Err(e) => Outcome::from(e),
        }
    }
}

impl From<Failure> for Outcome {
    fn from(failure: Failure) -> Self {
        Outcome::Fail(failure)
    }
}

impl From<TestbedError> for Outcome {
    fn from(error: TestbedError) -> Self {
        Outcome::Fail(Failure::from(error))
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Outcome::Success => write!(f, "SUCCESS"),
            Outcome::Skip(reason) => write!(f, "SKIP: {reason}"),
            Outcome::Fail(failure) => write!(f, "FAIL: {failure}"),
        }
    }
}

/// A failure with an optional underlying cause kept for diagnostics
#[derive(Clone, Debug, Default)]
pub struct Failure {
    message: Option<String>,
    cause: Option<Arc<anyhow::Error>>,
}

impl Failure {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: Some(message.into()),
            cause: None,
        }
    }

    pub fn with_cause(mut self, cause: impl Into<anyhow::Error>) -> Self {
        self.cause = Some(Arc::new(cause.into()));
        self
    }

    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }

    pub fn cause(&self) -> Option<&anyhow::Error> {
        self.cause.as_deref()
    }

    /// Message and cause joined into a single line
    pub fn description(&self) -> String {
        let cause = self.cause.as_ref().map(|c| format!("{c:#}"));
        match (&self.message, cause) {
            (Some(msg), Some(cause)) => {
                let separator = if msg.ends_with('.') { " " } else { ". " };
                format!("{msg}{separator}{cause}")
            }
            (Some(msg), None) => msg.clone(),
            (None, Some(cause)) => cause,
            (None, None) => String::new(),
        }
    }
}

impl From<anyhow::Error> for Failure {
    fn from(error: anyhow::Error) -> Self {
        Self {
            message: None,
            cause: Some(Arc::new(error)),
        }
    }
}

impl From<&str> for Failure {
    fn from(message: &str) -> Self {
        Self::new(message)
    }
}

impl From<String> for Failure {
    fn from(message: String) -> Self {
        Self::new(message)
    }
}

impl From<TestbedError> for Failure {
    fn from(error: TestbedError) -> Self {
        Self::from(anyhow::Error::new(error))
    }
}

impl fmt::Display for Failure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.description())
    }
}

impl Serialize for Failure {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.description())
    }
}
