//! Classifier trait and score types.

use async_trait::async_trait;

use crate::error::ClassifierError;

/// Sentiment-style label returned by the classifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Label {
    Positive,
    Negative,
}

/// One classification result.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Score {
    pub label: Label,
    /// Confidence in the label, in [0, 1].
    pub probability: f32,
}

impl Score {
    /// Interactivity likelihood: the probability of the positive label.
    pub fn likelihood(&self) -> f32 {
        match self.label {
            Label::Positive => self.probability,
            Label::Negative => 1.0 - self.probability,
        }
    }
}

/// Scores an element's likely interactivity from its text and tag.
#[async_trait]
pub trait RelevanceClassifier: Send + Sync {
    async fn score(&self, text: &str, element_kind: &str) -> Result<Score, ClassifierError>;
}
