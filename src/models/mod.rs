//! Data models for the testbed
//!
//! Phases, context snapshots, outcomes, events and progress counters.

mod context;
mod event;
mod outcome;
mod phase;
mod progress;

pub use context::ContextSnapshot;
pub use event::{TestEvent, TestEventKind};
pub use outcome::{Failure, Outcome};
pub use phase::{HostRequirement, LifecyclePhase, Platform};
pub use progress::{Tally, TestCounter, TestProgress};
