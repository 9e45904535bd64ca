//! # Stepwright Explore
//!
//! Autonomous page exploration: a depth-bounded, visited-guarded recursive
//! walker that asks the relevance classifier about every interactive element
//! it discovers and acts on the qualifying ones.

mod explorer;

pub use explorer::{ExplorationState, Explorer, ExploreError};
