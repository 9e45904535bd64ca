//! HTTP sentiment classifier against a HuggingFace-style inference API.

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
use tracing::debug;

use crate::error::ClassifierError;
use crate::score::{Label, RelevanceClassifier, Score};

const DEFAULT_ENDPOINT: &str = "https://api-inference.huggingface.co";

/// Raw classification entry as returned by the inference API.
#[derive(Debug, Deserialize)]
struct ApiScore {
    label: String,
    score: f32,
}

/// Text-classification client.
///
/// Posts `{"inputs": "..."}` to `<endpoint>/models/<model>` and reads the
/// highest-confidence label from the nested score array.
pub struct SentimentClassifier {
    client: reqwest::Client,
    endpoint: String,
    model: String,
    api_token: Option<String>,
}

impl SentimentClassifier {
    pub fn new(model: impl Into<String>, endpoint: Option<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint: endpoint.unwrap_or_else(|| DEFAULT_ENDPOINT.to_string()),
            model: model.into(),
            api_token: std::env::var("STEPWRIGHT_CLASSIFIER_TOKEN").ok(),
        }
    }

    /// Describe the element for the model, mirroring how the classifier was
    /// trained on natural sentences.
    fn context(text: &str, element_kind: &str) -> String {
        format!("This {} element says '{}'", element_kind, text)
    }

    fn parse_response(body: &serde_json::Value) -> Result<Score, ClassifierError> {
        // Responses nest one array per input: [[{label, score}, ...]]
        let entries: Vec<ApiScore> = match body.as_array().and_then(|outer| outer.first()) {
            Some(inner) => serde_json::from_value(inner.clone())
                .map_err(|e| ClassifierError::InvalidResponse(e.to_string()))?,
            None => {
                return Err(ClassifierError::InvalidResponse(
                    "expected a nested score array".to_string(),
                ))
            }
        };

        let top = entries
            .into_iter()
            .max_by(|a, b| a.score.total_cmp(&b.score))
            .ok_or_else(|| ClassifierError::InvalidResponse("empty score array".to_string()))?;

        let label = match top.label.to_ascii_uppercase().as_str() {
            "POSITIVE" | "LABEL_1" => Label::Positive,
            "NEGATIVE" | "LABEL_0" => Label::Negative,
            other => {
                return Err(ClassifierError::InvalidResponse(format!(
                    "unknown label '{}'",
                    other
                )))
            }
        };

        Ok(Score {
            label,
            probability: top.score.clamp(0.0, 1.0),
        })
    }
}

#[async_trait]
impl RelevanceClassifier for SentimentClassifier {
    async fn score(&self, text: &str, element_kind: &str) -> Result<Score, ClassifierError> {
        let url = format!("{}/models/{}", self.endpoint.trim_end_matches('/'), self.model);
        let context = Self::context(text, element_kind);

        let mut request = self.client.post(&url).json(&json!({"inputs": context}));
        if let Some(token) = &self.api_token {
            request = request.bearer_auth(token);
        }

        let response = request.send().await?;
        if !response.status().is_success() {
            let status = response.status().as_u16();
            let message = response.text().await.unwrap_or_default();
            return Err(ClassifierError::Api { status, message });
        }

        let body: serde_json::Value = response.json().await?;
        let score = Self::parse_response(&body)?;
        debug!(
            "Classified {} '{}' as {:?} ({:.3})",
            element_kind, text, score.label, score.probability
        );
        Ok(score)
    }
}
