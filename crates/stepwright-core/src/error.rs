//! Run-level errors.

use thiserror::Error;

use crate::driver::DriverError;
use crate::testcase::LoadError;

/// Errors escaping the step executor and the test-case runner.
#[derive(Debug, Error)]
pub enum RunError {
    /// Transient browser failure that survived its retry budget handling.
    #[error("Browser driver error: {0}")]
    Driver(#[from] DriverError),

    /// Required configuration is missing. Never retried.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// A required step failed after all retry attempts.
    #[error("Step '{id}' failed after {attempts} attempts: {source}")]
    StepExhausted {
        id: String,
        attempts: u32,
        #[source]
        source: DriverError,
    },

    #[error("Test case error: {0}")]
    Load(#[from] LoadError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
