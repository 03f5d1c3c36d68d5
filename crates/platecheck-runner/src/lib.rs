//! platecheck-runner: contract suite execution

pub mod executor;
pub mod fixtures;
pub mod golden;
pub mod suite;

pub use executor::{CaseRunner, RunnerError};
pub use golden::{GoldenError, GoldenLoader};
pub use suite::{TestCase, suite};
