//! User interaction provider for interactive suites

use futures::future::BoxFuture;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::models::ContextSnapshot;

/// How long a prompt stays on screen
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PromptDuration {
    Quick,
    #[default]
    Short,
    Long,
}

impl PromptDuration {
    pub fn as_duration(&self) -> Duration {
        match self {
            PromptDuration::Quick => Duration::from_millis(500),
            PromptDuration::Short => Duration::from_millis(2000),
            PromptDuration::Long => Duration::from_millis(5000),
        }
    }
}

/// Supplied by the embedding application when a person is watching the run.
///
/// Only `show_prompt` is required. The `report_*` methods echo what test
/// code reports through its context, after the runner recorded it.
pub trait UserInteraction: Send + Sync {
    fn show_prompt<'a>(
        &'a self,
        ctx: &'a ContextSnapshot,
        message: &'a str,
        duration: PromptDuration,
    ) -> BoxFuture<'a, ()>;

    fn report_info(&self, _ctx: &ContextSnapshot, _message: &str) {}

    fn report_warning(&self, _ctx: &ContextSnapshot, _message: &str) {}

    fn report_skip(&self, _ctx: &ContextSnapshot, _reason: &str) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prompt_durations_are_ordered() {
        assert!(PromptDuration::Quick.as_duration() < PromptDuration::Short.as_duration());
        assert!(PromptDuration::Short.as_duration() < PromptDuration::Long.as_duration());
        assert_eq!(PromptDuration::default(), PromptDuration::Short);
    }
}
