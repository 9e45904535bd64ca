//! Configuration loader.
//!
//! Reads a JSON config file and merges `STEPWRIGHT_*` environment overrides
//! on top of it. A missing file is not an error: defaults apply.

use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::ConfigError;
use crate::schema::Config;

/// Environment variable prefix for overrides.
const ENV_PREFIX: &str = "STEPWRIGHT_";

/// Configuration loader with environment-variable overrides.
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration from a JSON file plus environment overrides.
    pub fn load(path: &Path) -> Result<Config, ConfigError> {
        let mut config = if path.exists() {
            let content = std::fs::read_to_string(path)?;
            serde_json::from_str(&content)?
        } else {
            debug!("Config file {} not found, using defaults", path.display());
            Config::default()
        };
        Self::apply_env_overrides(&mut config)?;
        Ok(config)
    }

    /// Load configuration from a JSON string plus environment overrides.
    pub fn load_str(content: &str) -> Result<Config, ConfigError> {
        let mut config: Config = serde_json::from_str(content)?;
        Self::apply_env_overrides(&mut config)?;
        Ok(config)
    }

    fn apply_env_overrides(config: &mut Config) -> Result<(), ConfigError> {
        if let Some(value) = env_var("HEADLESS") {
            config.headless = parse_bool(&value);
        }
        if let Some(value) = env_var("SCREENSHOT_ON_ERROR") {
            config.screenshot_on_error = parse_bool(&value);
        }
        if let Some(value) = env_var("WAIT_TIME") {
            config.wait_time = parse_int(&value, "wait_time")?;
        }
        if let Some(value) = env_var("MAX_DEPTH") {
            config.max_depth = parse_int(&value, "max_depth")? as usize;
        }
        if let Some(value) = env_var("ALLOWED_DOMAINS") {
            config.allowed_domains = parse_list(&value);
        }
        if let Some(value) = env_var("EXCLUDE_PATHS") {
            config.exclude_paths = parse_list(&value);
        }
        if let Some(value) = env_var("AI_MODEL") {
            config.ai_model = value;
        }
        if let Some(value) = env_var("CLASSIFIER_ENDPOINT") {
            config.classifier_endpoint = Some(value);
        }
        if let Some(value) = env_var("ELEMENT_TIMEOUT") {
            config.element_timeout = parse_int(&value, "element_timeout")?;
        }
        if let Some(value) = env_var("NAVIGATION_TIMEOUT") {
            config.navigation_timeout = parse_int(&value, "navigation_timeout")?;
        }
        if let Some(value) = env_var("OUTPUT_DIR") {
            config.output_dir = PathBuf::from(value);
        }
        if let Some(value) = env_var("URL_LOG_DIR") {
            config.url_log_dir = Some(PathBuf::from(value));
        }
        Ok(())
    }
}

fn env_var(suffix: &str) -> Option<String> {
    std::env::var(format!("{ENV_PREFIX}{suffix}")).ok()
}

fn parse_bool(value: &str) -> bool {
    value.eq_ignore_ascii_case("true") || value == "1"
}

fn parse_int(value: &str, field: &str) -> Result<u64, ConfigError> {
    value.parse().map_err(|_| ConfigError::InvalidValue {
        field: field.to_string(),
        message: format!("'{}' is not a valid integer", value),
    })
}

fn parse_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}
