//! The recursive page walker.

use std::collections::HashSet;
use std::time::Duration;

use futures::future::BoxFuture;
use thiserror::Error;
use tracing::{debug, info, warn};

use stepwright_classify::RelevanceClassifier;
use stepwright_config::Config;
use stepwright_core::driver::{DriverError, ElementRef, PageDriver};

/// Selector group covering every element kind the explorer considers.
const INTERACTIVE_SELECTORS: &str = "button, a, input, select";

/// Value typed into discovered input fields.
const INPUT_PLACEHOLDER: &str = "test input";

#[derive(Debug, Error)]
pub enum ExploreError {
    #[error("Browser driver error: {0}")]
    Driver(#[from] DriverError),
}

/// State owned by one exploration run.
///
/// `current_depth` follows stack discipline: incremented on recursive descent
/// and restored on return, so it bounds concurrent recursion depth, not the
/// total number of visits.
pub struct ExplorationState {
    visited: HashSet<String>,
    current_depth: usize,
    max_depth: usize,
}

impl ExplorationState {
    pub fn new(max_depth: usize) -> Self {
        Self {
            visited: HashSet::new(),
            current_depth: 0,
            max_depth,
        }
    }

    pub fn visited(&self) -> &HashSet<String> {
        &self.visited
    }

    pub fn current_depth(&self) -> usize {
        self.current_depth
    }
}

/// Walks pages, scoring each discovered element and interacting with the
/// ones the classifier deems relevant.
pub struct Explorer<'a> {
    page: &'a dyn PageDriver,
    classifier: &'a dyn RelevanceClassifier,
    settle: Duration,
    allowed_domains: Vec<String>,
    exclude_paths: Vec<String>,
}

impl<'a> Explorer<'a> {
    pub fn new(
        page: &'a dyn PageDriver,
        classifier: &'a dyn RelevanceClassifier,
        config: &Config,
    ) -> Self {
        Self {
            page,
            classifier,
            settle: Duration::from_secs(config.wait_time),
            allowed_domains: config.allowed_domains.clone(),
            exclude_paths: config.exclude_paths.clone(),
        }
    }

    /// Explore `url` and, recursively, the qualifying same-origin links it
    /// contains.
    ///
    /// Already-visited URLs and visits at the depth bound are no-ops. The URL
    /// is marked visited before navigation, so re-discovering it during its
    /// own exploration cannot recurse.
    pub fn explore<'s>(
        &'s self,
        url: String,
        state: &'s mut ExplorationState,
    ) -> BoxFuture<'s, Result<(), ExploreError>> {
        Box::pin(async move {
            if state.visited.contains(&url) || state.current_depth >= state.max_depth {
                return Ok(());
            }

            info!("Exploring: {} (depth {})", url, state.current_depth);
            state.visited.insert(url.clone());

            self.page.goto(&url).await?;
            self.page.wait_for_network_idle().await?;

            let elements = self.page.query_all(INTERACTIVE_SELECTORS).await?;
            debug!("Found {} candidate elements on {}", elements.len(), url);

            for element in &elements {
                // Element-level failures never abort the walk.
                if let Err(e) = self.process_element(element.as_ref(), &url, state).await {
                    warn!("Error processing element on {}: {}", url, e);
                }
            }
            Ok(())
        })
    }

    /// Score one element and act on it when it qualifies.
    async fn process_element(
        &self,
        element: &dyn ElementRef,
        base_url: &str,
        state: &mut ExplorationState,
    ) -> Result<(), ExploreError> {
        let text = element.text().await?;
        let kind = element.tag_name().await?;

        let likelihood = match self.classifier.score(&text, &kind).await {
            Ok(score) => score.likelihood(),
            Err(e) => {
                // Fail-safe: a failed query means "not interactive".
                debug!("Classifier error for {} '{}': {}", kind, text, e);
                return Ok(());
            }
        };

        if likelihood <= interaction_threshold(&kind) {
            return Ok(());
        }

        info!("Interacting with {}: {}", kind, text);
        self.interact(element, &kind, base_url, state).await?;
        tokio::time::sleep(self.settle).await;
        Ok(())
    }

    async fn interact(
        &self,
        element: &dyn ElementRef,
        kind: &str,
        base_url: &str,
        state: &mut ExplorationState,
    ) -> Result<(), ExploreError> {
        match kind {
            "button" => element.click().await?,
            "input" => element.fill(INPUT_PLACEHOLDER).await?,
            "a" => {
                if let Some(href) = element.attribute("href").await? {
                    if self.should_recurse(&href, base_url) {
                        state.current_depth += 1;
                        let result = self.explore(href.clone(), state).await;
                        // Depth is restored whether or not the descent failed.
                        state.current_depth -= 1;
                        if let Err(e) = result {
                            warn!("Error exploring {}: {}", href, e);
                        }
                    }
                }
            }
            // `select` is enumerated but carries no interaction.
            _ => {}
        }
        Ok(())
    }

    /// Recursion filter: same-origin prefix match, then the configured
    /// domain allowlist and path exclusions.
    fn should_recurse(&self, href: &str, base_url: &str) -> bool {
        if !href.starts_with(base_url) {
            return false;
        }

        if !self.allowed_domains.is_empty() {
            let host = url::Url::parse(href)
                .ok()
                .and_then(|u| u.host_str().map(|h| h.to_string()));
            match host {
                Some(host) if self.allowed_domains.iter().any(|d| d == &host) => {}
                _ => return false,
            }
        }

        if let Ok(parsed) = url::Url::parse(href) {
            let path = parsed.path();
            if self.exclude_paths.iter().any(|p| path.contains(p.as_str())) {
                return false;
            }
        }

        true
    }
}

/// Decision bar for "treat as interactive": structurally interactive tags
/// get the higher bar, everything else the lower one.
fn interaction_threshold(kind: &str) -> f32 {
    match kind {
        "button" | "input" | "select" | "a" => 0.7,
        _ => 0.5,
    }
}

#[cfg(test)]
#[path = "explorer_tests.rs"]
mod tests;
