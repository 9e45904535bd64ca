//! Configuration schema definitions.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Runner configuration.
///
/// Loaded once per runner instance from a JSON file merged with environment
/// overrides, read-only thereafter.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Run Chrome in headless mode.
    #[serde(default)]
    pub headless: bool,

    /// Capture a screenshot when a required step fails.
    #[serde(default = "default_true")]
    pub screenshot_on_error: bool,

    /// Settle pause between interactions, in seconds.
    #[serde(default = "default_wait_time")]
    pub wait_time: u64,

    /// Maximum recursion depth for autonomous exploration.
    #[serde(default = "default_max_depth")]
    pub max_depth: usize,

    /// Hosts the explorer is allowed to recurse into. Empty = unrestricted.
    #[serde(default)]
    pub allowed_domains: Vec<String>,

    /// URL path fragments the explorer must not recurse into.
    #[serde(default)]
    pub exclude_paths: Vec<String>,

    /// Text-classification model used for element relevance scoring.
    #[serde(default = "default_ai_model")]
    pub ai_model: String,

    /// Base URL of the classification inference API.
    #[serde(default)]
    pub classifier_endpoint: Option<String>,

    /// Timeout for element-visibility waits, in milliseconds.
    #[serde(default = "default_timeout_ms")]
    pub element_timeout: u64,

    /// Timeout for navigation waits, in milliseconds.
    #[serde(default = "default_timeout_ms")]
    pub navigation_timeout: u64,

    /// Directory for the HTML report and screenshots.
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,

    /// Absolute directory for `get_url` capture files. Must be set before a
    /// `get_url` step with `save_to_file` runs.
    #[serde(default)]
    pub url_log_dir: Option<PathBuf>,

    /// Chrome remote-debugging port.
    #[serde(default = "default_debug_port")]
    pub debug_port: u16,

    /// Explicit Chrome binary path. Autodetected when unset.
    #[serde(default)]
    pub chrome_path: Option<PathBuf>,
}

fn default_true() -> bool {
    true
}

fn default_wait_time() -> u64 {
    2
}

fn default_max_depth() -> usize {
    3
}

fn default_ai_model() -> String {
    "distilbert-base-uncased-finetuned-sst-2-english".to_string()
}

fn default_timeout_ms() -> u64 {
    30000
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("reports")
}

fn default_debug_port() -> u16 {
    9222
}

impl Default for Config {
    fn default() -> Self {
        Self {
            headless: false,
            screenshot_on_error: default_true(),
            wait_time: default_wait_time(),
            max_depth: default_max_depth(),
            allowed_domains: Vec::new(),
            exclude_paths: Vec::new(),
            ai_model: default_ai_model(),
            classifier_endpoint: None,
            element_timeout: default_timeout_ms(),
            navigation_timeout: default_timeout_ms(),
            output_dir: default_output_dir(),
            url_log_dir: None,
            debug_port: default_debug_port(),
            chrome_path: None,
        }
    }
}

impl Config {
    /// Check numeric ranges. Called once after loading.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.element_timeout == 0 {
            return Err(ConfigError::InvalidValue {
                field: "element_timeout".to_string(),
                message: "must be greater than zero".to_string(),
            });
        }
        if self.navigation_timeout == 0 {
            return Err(ConfigError::InvalidValue {
                field: "navigation_timeout".to_string(),
                message: "must be greater than zero".to_string(),
            });
        }
        if self.max_depth == 0 {
            return Err(ConfigError::InvalidValue {
                field: "max_depth".to_string(),
                message: "must be at least 1".to_string(),
            });
        }
        Ok(())
    }
}
