//! # Stepwright Core
//!
//! The step-execution engine: test-case model, variable substitution, the
//! retrying step executor, the sequential test-case runner, and reporting.
//!
//! Browser access goes through the [`driver::PageDriver`] trait so the engine
//! can be exercised against scripted drivers in tests; the real CDP-backed
//! implementation lives in `stepwright-browser`.

pub mod driver;
mod error;
mod executor;
mod report;
mod runner;
mod sample;
mod testcase;
#[cfg(test)]
mod testutil;
mod urllog;
mod vars;

pub use error::RunError;
pub use executor::{StepExecutor, StepOutcome};
pub use report::{RecordStatus, StepRecord, TestReport};
pub use runner::Runner;
pub use sample::LeadData;
pub use testcase::{LoadError, Step, StepAction, TestCase};
pub use urllog::append_capture;
pub use vars::{substitute, VariableMap};
