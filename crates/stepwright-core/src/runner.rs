//! Test-case runner: sequential step execution over one browser session.

use std::sync::Arc;

use tracing::{error, info, warn};

use stepwright_config::Config;

use crate::driver::SessionProvider;
use crate::error::RunError;
use crate::executor::StepExecutor;
use crate::report::{RecordStatus, TestReport};
use crate::testcase::TestCase;
use crate::vars::VariableMap;

/// Runs test cases in order against a single browser session.
///
/// The session is opened lazily on the first run and can be kept alive across
/// test cases (`close_after = false`) so a login case can hand its
/// authenticated session to the cases that follow.
pub struct Runner {
    config: Arc<Config>,
    session: Arc<dyn SessionProvider>,
    report: TestReport,
}

impl Runner {
    pub fn new(config: Arc<Config>, session: Arc<dyn SessionProvider>) -> std::io::Result<Self> {
        let report = TestReport::new(&config.output_dir)?;
        Ok(Self {
            config,
            session,
            report,
        })
    }

    /// Execute every step of `case` in order.
    ///
    /// A failing required step aborts the remaining steps and the error is
    /// re-raised to the caller, who decides whether to run further cases
    /// against the same session. The report is regenerated and, when
    /// `close_after` is set, the session torn down on every exit path.
    pub async fn run(
        &mut self,
        case: &TestCase,
        vars: &VariableMap,
        close_after: bool,
    ) -> Result<(), RunError> {
        info!("Running test case: {}", case.name);
        let result = self.execute_case(case, vars).await;

        if let Err(e) = &result {
            error!("Test case '{}' failed: {}", case.name, e);
        }

        // Finalization is unconditional: neither branch above returns early.
        if let Err(e) = self.report.generate() {
            error!("Error generating report: {}", e);
        }
        if close_after {
            if let Err(e) = self.session.close().await {
                warn!("Error closing browser session: {}", e);
            }
        }

        result
    }

    async fn execute_case(&mut self, case: &TestCase, vars: &VariableMap) -> Result<(), RunError> {
        let page = match self.session.open().await {
            Ok(page) => page,
            Err(e) => {
                self.report.add_result(
                    format!("Error in test case: {}", case.name),
                    RecordStatus::Failure,
                    e.to_string(),
                    None,
                );
                return Err(e.into());
            }
        };

        let mut executor = StepExecutor::new(page.as_ref(), self.config.as_ref(), &mut self.report);
        let mut outcome = Ok(());
        for step in &case.steps {
            if let Err(e) = executor.execute(step, vars).await {
                outcome = Err(e);
                break;
            }
        }

        if let Err(e) = &outcome {
            // Exhausted steps already recorded their own failure and
            // screenshot; anything else gets a case-level record here.
            if !matches!(e, RunError::StepExhausted { .. }) {
                let screenshot = if self.config.screenshot_on_error {
                    self.report
                        .save_screenshot(page.as_ref(), &format!("error_{}", case.name))
                        .await
                } else {
                    None
                };
                self.report.add_result(
                    format!("Error in test case: {}", case.name),
                    RecordStatus::Failure,
                    e.to_string(),
                    screenshot,
                );
            }
        }

        outcome
    }

    /// Results accumulated so far, across all cases run by this runner.
    pub fn report(&self) -> &TestReport {
        &self.report
    }
}

#[cfg(test)]
#[path = "runner_tests.rs"]
mod tests;
