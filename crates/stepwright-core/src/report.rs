//! Append-only result log and HTML report rendering.

use std::fmt;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};
use tracing::{error, info};

use crate::driver::PageDriver;

/// Outcome recorded for one completed step attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordStatus {
    Success,
    Failure,
}

impl fmt::Display for RecordStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecordStatus::Success => write!(f, "success"),
            RecordStatus::Failure => write!(f, "failure"),
        }
    }
}

/// One entry in the result log.
#[derive(Debug, Clone)]
pub struct StepRecord {
    pub timestamp: DateTime<Local>,
    pub step: String,
    pub status: RecordStatus,
    pub details: String,
    pub screenshot: Option<PathBuf>,
}

/// Collects step results for one run and renders them as an HTML report.
pub struct TestReport {
    output_dir: PathBuf,
    results: Vec<StepRecord>,
    start_time: DateTime<Local>,
}

impl TestReport {
    /// Create a report rooted at `output_dir`, ensuring the directory tree
    /// (including the screenshots subdirectory) exists.
    pub fn new(output_dir: &Path) -> std::io::Result<Self> {
        std::fs::create_dir_all(output_dir.join("screenshots"))?;
        Ok(Self {
            output_dir: output_dir.to_path_buf(),
            results: Vec::new(),
            start_time: Local::now(),
        })
    }

    /// Append a result. Records are never removed or rewritten.
    pub fn add_result(
        &mut self,
        step: impl Into<String>,
        status: RecordStatus,
        details: impl Into<String>,
        screenshot: Option<PathBuf>,
    ) {
        self.results.push(StepRecord {
            timestamp: Local::now(),
            step: step.into(),
            status,
            details: details.into(),
            screenshot,
        });
    }

    /// Capture a screenshot under `screenshots/` with a timestamped name.
    ///
    /// Capture failures are logged, not propagated: a missing screenshot must
    /// never mask the step failure being reported.
    pub async fn save_screenshot(&self, page: &dyn PageDriver, name: &str) -> Option<PathBuf> {
        let filename = format!("{}_{}.png", name, Local::now().format("%Y%m%d_%H%M%S"));
        let path = self.output_dir.join("screenshots").join(filename);
        match page.screenshot(&path).await {
            Ok(()) => Some(path),
            Err(e) => {
                error!("Error saving screenshot {}: {}", path.display(), e);
                None
            }
        }
    }

    pub fn results(&self) -> &[StepRecord] {
        &self.results
    }

    pub fn success_count(&self) -> usize {
        self.results
            .iter()
            .filter(|r| r.status == RecordStatus::Success)
            .count()
    }

    pub fn failure_count(&self) -> usize {
        self.results
            .iter()
            .filter(|r| r.status == RecordStatus::Failure)
            .count()
    }

    /// Write `report.html` under the output directory. Safe to call more than
    /// once; each call rewrites the file from the full result log.
    pub fn generate(&self) -> std::io::Result<PathBuf> {
        let path = self.output_dir.join("report.html");
        std::fs::write(&path, self.render_html())?;
        info!("Report generated: {}", path.display());
        Ok(path)
    }

    fn render_html(&self) -> String {
        let duration = (Local::now() - self.start_time).num_milliseconds() as f64 / 1000.0;
        let mut html = format!(
            r#"<!DOCTYPE html>
<html>
<head>
    <title>Test Automation Report</title>
    <style>
        body {{ font-family: Arial, sans-serif; margin: 20px; }}
        .success {{ color: green; }}
        .failure {{ color: red; }}
        .result {{ margin: 10px 0; padding: 10px; border: 1px solid #ddd; }}
        .screenshot {{ max-width: 800px; }}
    </style>
</head>
<body>
    <h1>Test Automation Report</h1>
    <div class="summary">
        <p>Start Time: {start}</p>
        <p>Duration: {duration:.2} seconds</p>
        <p>Success: <span class="success">{success}</span></p>
        <p>Failures: <span class="failure">{failures}</span></p>
    </div>
    <h2>Test Steps</h2>
"#,
            start = self.start_time.format("%Y-%m-%d %H:%M:%S"),
            duration = duration,
            success = self.success_count(),
            failures = self.failure_count(),
        );

        for result in &self.results {
            html.push_str(&format!(
                r#"    <div class="result">
        <h3>{step}</h3>
        <p>Status: <span class="{status}">{status}</span></p>
        <p>Time: {time}</p>
        <p>Details: {details}</p>
"#,
                step = escape_html(&result.step),
                status = result.status,
                time = result.timestamp.format("%Y-%m-%d %H:%M:%S"),
                details = escape_html(&result.details),
            ));
            if let Some(screenshot) = &result.screenshot {
                html.push_str(&format!(
                    "        <img class=\"screenshot\" src=\"{}\" alt=\"Step Screenshot\">\n",
                    screenshot.display()
                ));
            }
            html.push_str("    </div>\n");
        }

        html.push_str("</body>\n</html>\n");
        html
    }
}

fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}
