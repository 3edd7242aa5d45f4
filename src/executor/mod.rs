//! Test execution engine
//!
//! The runner walks suites one at a time; a fresh suite runtime drives
//! each suite through its lifecycle phases.

mod cancel;
mod context;
mod runner;
mod runtime;

pub use context::TestContext;
pub use runner::TestRunner;
