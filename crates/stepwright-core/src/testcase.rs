//! Test-case model: an ordered list of browser steps loaded from JSON.

use std::collections::HashSet;
use std::path::Path;

use serde::{Deserialize, Deserializer};
use thiserror::Error;

/// Errors raised while loading a test case.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("IO error reading test case: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid test case JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Duplicate step id '{id}'")]
    DuplicateStepId { id: String },

    #[error("Invalid step '{id}': {reason}")]
    InvalidStep { id: String, reason: String },
}

/// One named test case. Immutable once loaded.
#[derive(Debug, Clone, Deserialize)]
pub struct TestCase {
    pub name: String,
    pub steps: Vec<Step>,
}

impl TestCase {
    /// Load and validate a test case from a JSON file.
    pub fn from_path(path: &Path) -> Result<Self, LoadError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_str(&content)
    }

    /// Load and validate a test case from a JSON string.
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(content: &str) -> Result<Self, LoadError> {
        let case: TestCase = serde_json::from_str(content)?;
        case.validate()?;
        Ok(case)
    }

    /// Reject malformed cases at load time rather than deep inside dispatch:
    /// duplicate step ids and `wait` steps with nothing to wait on.
    fn validate(&self) -> Result<(), LoadError> {
        let mut seen = HashSet::new();
        for step in &self.steps {
            if !seen.insert(step.id.as_str()) {
                return Err(LoadError::DuplicateStepId {
                    id: step.id.clone(),
                });
            }
            if let StepAction::Wait {
                selector: None,
                time_ms: None,
            } = step.action
            {
                return Err(LoadError::InvalidStep {
                    id: step.id.clone(),
                    reason: "wait step needs a selector or a time_ms duration".to_string(),
                });
            }
        }
        Ok(())
    }
}

/// One atomic browser action within a test case.
#[derive(Debug, Clone, Deserialize)]
pub struct Step {
    /// Unique within the test case; used in logs and error reports.
    #[serde(deserialize_with = "id_from_value")]
    pub id: String,

    #[serde(default)]
    pub description: Option<String>,

    /// Whether a failure after retries is swallowed rather than propagated.
    #[serde(default)]
    pub optional: bool,

    #[serde(flatten)]
    pub action: StepAction,
}

impl Step {
    /// Human-readable label for reports: the description when present,
    /// otherwise the action name.
    pub fn label(&self) -> String {
        self.description
            .clone()
            .unwrap_or_else(|| self.action.name().to_string())
    }
}

/// The action a step performs, with only the fields that action needs.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum StepAction {
    Navigate {
        url: String,
    },
    Click {
        selector: String,
    },
    Type {
        selector: String,
        value: String,
    },
    Wait {
        #[serde(default)]
        selector: Option<String>,
        #[serde(default)]
        time_ms: Option<u64>,
    },
    GetUrl {
        #[serde(default)]
        save_to_file: Option<String>,
    },
}

impl StepAction {
    pub fn name(&self) -> &'static str {
        match self {
            StepAction::Navigate { .. } => "navigate",
            StepAction::Click { .. } => "click",
            StepAction::Type { .. } => "type",
            StepAction::Wait { .. } => "wait",
            StepAction::GetUrl { .. } => "get_url",
        }
    }
}

/// Accept both `"id": "login"` and the common `"id": 1` shorthand.
fn id_from_value<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum IdRepr {
        Text(String),
        Number(i64),
    }

    Ok(match IdRepr::deserialize(deserializer)? {
        IdRepr::Text(s) => s,
        IdRepr::Number(n) => n.to_string(),
    })
}
