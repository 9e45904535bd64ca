//! # Stepwright Classify
//!
//! The relevance-classifier capability: given an element's visible text and
//! tag, return a sentiment-style score the explorer maps to an interactivity
//! likelihood.

mod error;
mod score;
mod sentiment;

pub use error::ClassifierError;
pub use score::{Label, RelevanceClassifier, Score};
pub use sentiment::SentimentClassifier;
