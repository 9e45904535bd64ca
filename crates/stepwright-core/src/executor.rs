//! Step execution: one step against the browser driver, with bounded retry
//! and optional-step semantics.
//!
//! Each step runs through an explicit state machine:
//!
//! ```text
//! Pending -> Attempting -> Succeeded
//!                |  ^
//!                v  |
//!            RetryWait          (transient failure, budget remaining)
//!                |
//!                v
//!            Exhausted          (transient failure, budget spent)
//! ```
//!
//! Transient driver failures are retried on a fixed backoff; configuration
//! errors fail fast; optional steps degrade to a recorded skip instead of
//! propagating.

use std::time::Duration;

use chrono::Local;
use tokio::time::sleep;
use tracing::{debug, info, warn};

use stepwright_config::Config;

use crate::driver::{DriverError, PageDriver};
use crate::error::RunError;
use crate::report::{RecordStatus, TestReport};
use crate::testcase::{Step, StepAction};
use crate::urllog;
use crate::vars::{substitute, VariableMap};

/// Total attempts per step, first try included.
const MAX_ATTEMPTS: u32 = 3;

/// Fixed pause between attempts. Uniform, no jitter: UI flakiness is timing
/// noise, not contention.
const RETRY_BACKOFF: Duration = Duration::from_millis(2000);

/// Shortened wait budget for optional click targets.
const OPTIONAL_CLICK_TIMEOUT: Duration = Duration::from_millis(5000);

/// Inter-character delay when typing, to simulate human input.
const TYPE_DELAY: Duration = Duration::from_millis(100);

/// Terminal outcome of a successfully completed step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepOutcome {
    Completed,
    /// An optional step whose target never materialized.
    SkippedOptional,
}

enum ExecState {
    Pending,
    Attempting,
    RetryWait,
    Succeeded(StepOutcome),
    Exhausted(DriverError),
}

/// Executes single steps against a page, recording outcomes in the report.
pub struct StepExecutor<'a> {
    page: &'a dyn PageDriver,
    config: &'a Config,
    report: &'a mut TestReport,
}

impl<'a> StepExecutor<'a> {
    pub fn new(page: &'a dyn PageDriver, config: &'a Config, report: &'a mut TestReport) -> Self {
        Self {
            page,
            config,
            report,
        }
    }

    /// Run one step to a terminal state.
    ///
    /// Returns the outcome on success (including optional skips); a required
    /// step that exhausts its retry budget returns [`RunError::StepExhausted`]
    /// after recording a failure result and, when configured, a screenshot.
    pub async fn execute(&mut self, step: &Step, vars: &VariableMap) -> Result<StepOutcome, RunError> {
        let step = resolve_step(step, vars);
        let mut state = ExecState::Pending;
        let mut attempts = 0u32;

        loop {
            state = match state {
                ExecState::Pending => ExecState::Attempting,

                ExecState::Attempting => match self.dispatch(&step, vars).await {
                    Ok(outcome) => ExecState::Succeeded(outcome),
                    Err(RunError::Driver(e)) => {
                        attempts += 1;
                        warn!(
                            "Step {} failed (attempt {}/{}): {}",
                            step.id, attempts, MAX_ATTEMPTS, e
                        );
                        if step.optional && matches!(step.action, StepAction::Click { .. }) {
                            // An optional click is abandoned on first failure
                            // rather than burning the retry budget.
                            ExecState::Succeeded(StepOutcome::SkippedOptional)
                        } else if attempts < MAX_ATTEMPTS {
                            ExecState::RetryWait
                        } else {
                            ExecState::Exhausted(e)
                        }
                    }
                    // Configuration and IO failures are not transient.
                    Err(fatal) => return Err(fatal),
                },

                ExecState::RetryWait => {
                    sleep(RETRY_BACKOFF).await;
                    ExecState::Attempting
                }

                ExecState::Succeeded(outcome) => {
                    let details = match outcome {
                        StepOutcome::Completed => format!("Completed {}", step.action.name()),
                        StepOutcome::SkippedOptional => "Skipped optional step".to_string(),
                    };
                    self.report
                        .add_result(step.label(), RecordStatus::Success, details, None);
                    return Ok(outcome);
                }

                ExecState::Exhausted(e) => {
                    if step.optional {
                        info!(
                            "Skipping optional step {} after {} attempts",
                            step.id, attempts
                        );
                        self.report.add_result(
                            step.label(),
                            RecordStatus::Success,
                            format!("Skipped optional step after {} attempts", attempts),
                            None,
                        );
                        return Ok(StepOutcome::SkippedOptional);
                    }

                    let screenshot = if self.config.screenshot_on_error {
                        self.report
                            .save_screenshot(self.page, &format!("error_step_{}", step.id))
                            .await
                    } else {
                        None
                    };
                    self.report.add_result(
                        format!("Error in step: {}", step.id),
                        RecordStatus::Failure,
                        e.to_string(),
                        screenshot,
                    );
                    return Err(RunError::StepExhausted {
                        id: step.id.clone(),
                        attempts,
                        source: e,
                    });
                }
            };
        }
    }

    /// One dispatch of the step's action against the driver.
    async fn dispatch(&self, step: &Step, vars: &VariableMap) -> Result<StepOutcome, RunError> {
        match &step.action {
            StepAction::Navigate { url } => {
                debug!("Navigating to {}", url);
                self.page.goto(url).await?;
                self.page.wait_for_network_idle().await?;
                self.page.wait_for_dom_ready().await?;
                Ok(StepOutcome::Completed)
            }

            StepAction::Click { selector } => {
                let timeout = if step.optional {
                    OPTIONAL_CLICK_TIMEOUT
                } else {
                    self.element_timeout()
                };
                match self.page.wait_for_selector(selector, timeout).await {
                    Ok(element) => {
                        element.scroll_into_view().await?;
                        element.click().await?;
                        Ok(StepOutcome::Completed)
                    }
                    Err(e) if step.optional => {
                        debug!("Optional click target {} not found: {}", selector, e);
                        Ok(StepOutcome::SkippedOptional)
                    }
                    Err(e) => Err(e.into()),
                }
            }

            StepAction::Type { selector, value } => {
                // The optional flag never shortens a type wait.
                let element = self
                    .page
                    .wait_for_selector(selector, self.element_timeout())
                    .await?;
                element.scroll_into_view().await?;
                element.type_text(value, TYPE_DELAY).await?;
                Ok(StepOutcome::Completed)
            }

            StepAction::Wait {
                selector: Some(selector),
                ..
            } => {
                self.page
                    .wait_for_selector(selector, self.element_timeout())
                    .await?;
                Ok(StepOutcome::Completed)
            }

            StepAction::Wait {
                selector: None,
                time_ms: Some(ms),
            } => {
                sleep(Duration::from_millis(*ms)).await;
                Ok(StepOutcome::Completed)
            }

            // Rejected at load time; kept total for steps built in code.
            StepAction::Wait {
                selector: None,
                time_ms: None,
            } => Err(RunError::Configuration(format!(
                "wait step '{}' has neither selector nor duration",
                step.id
            ))),

            StepAction::GetUrl { save_to_file } => {
                let url = self.page.current_url().await?;
                info!("Current URL: {}", url);
                if let Some(file) = save_to_file {
                    let dir = self.config.url_log_dir.as_ref().ok_or_else(|| {
                        RunError::Configuration(
                            "url_log_dir must be set to save captured URLs".to_string(),
                        )
                    })?;
                    let path = urllog::append_capture(dir, file, vars, &url, Local::now())?;
                    debug!("Captured URL to {}", path.display());
                }
                Ok(StepOutcome::Completed)
            }
        }
    }

    fn element_timeout(&self) -> Duration {
        Duration::from_millis(self.config.element_timeout)
    }
}

/// Resolve `${NAME}` placeholders in the step's selector and value for this
/// execution. The templated originals stay untouched in the test case.
fn resolve_step(step: &Step, vars: &VariableMap) -> Step {
    let mut resolved = step.clone();
    resolved.action = match resolved.action {
        StepAction::Click { selector } => StepAction::Click {
            selector: substitute(&selector, vars),
        },
        StepAction::Type { selector, value } => StepAction::Type {
            selector: substitute(&selector, vars),
            value: substitute(&value, vars),
        },
        StepAction::Wait {
            selector: Some(selector),
            time_ms,
        } => StepAction::Wait {
            selector: Some(substitute(&selector, vars)),
            time_ms,
        },
        other => other,
    };
    resolved
}

#[cfg(test)]
#[path = "executor_tests.rs"]
mod tests;
