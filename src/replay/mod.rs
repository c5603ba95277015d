//! Operation scripts for driving a cache from text.
//!
//! Used by the `replay` CLI command and handy for reproducing eviction
//! sequences in tests.

mod runner;
pub mod script;

pub use runner::{ReplayReport, Replayer, StepOutcome};
pub use script::{parse, Operation, Step};
