//! Browser driver capability surface.
//!
//! The engine never talks to Chrome directly; it drives these traits. The
//! CDP-backed implementation lives in `stepwright-browser`, and tests supply
//! scripted implementations.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

/// Errors surfaced by a browser driver.
///
/// All variants are treated as transient by the step executor and retried up
/// to the per-step budget; fail-fast conditions (missing configuration, IO)
/// are represented on [`crate::RunError`] instead.
#[derive(Debug, Error)]
pub enum DriverError {
    #[error("Element not found: {0}")]
    ElementNotFound(String),

    #[error("Timeout: {0}")]
    Timeout(String),

    #[error("Navigation failed: {0}")]
    Navigation(String),

    #[error("Browser connection lost: {0}")]
    Connection(String),

    #[error("Screenshot failed: {0}")]
    Screenshot(String),

    #[error("Driver failure: {0}")]
    Other(String),
}

/// A handle to one element on the current page.
#[async_trait]
pub trait ElementRef: Send + Sync {
    /// Visible text of the element.
    async fn text(&self) -> Result<String, DriverError>;

    /// Lowercased tag name (`button`, `a`, `input`, ...).
    async fn tag_name(&self) -> Result<String, DriverError>;

    /// Attribute value, if present.
    async fn attribute(&self, name: &str) -> Result<Option<String>, DriverError>;

    async fn scroll_into_view(&self) -> Result<(), DriverError>;

    async fn click(&self) -> Result<(), DriverError>;

    /// Replace the element's value in one operation.
    async fn fill(&self, text: &str) -> Result<(), DriverError>;

    /// Clear the element, then enter `text` character by character with the
    /// given inter-character delay.
    async fn type_text(&self, text: &str, delay: Duration) -> Result<(), DriverError>;
}

/// One browser page: navigation, waits, element lookup, screenshots.
#[async_trait]
pub trait PageDriver: Send + Sync {
    async fn goto(&self, url: &str) -> Result<(), DriverError>;

    async fn wait_for_dom_ready(&self) -> Result<(), DriverError>;

    async fn wait_for_network_idle(&self) -> Result<(), DriverError>;

    /// Wait until `selector` resolves to a visible element, up to `timeout`.
    async fn wait_for_selector(
        &self,
        selector: &str,
        timeout: Duration,
    ) -> Result<Box<dyn ElementRef>, DriverError>;

    /// All elements currently matching `selectors` (comma-separated group).
    async fn query_all(&self, selectors: &str) -> Result<Vec<Box<dyn ElementRef>>, DriverError>;

    async fn current_url(&self) -> Result<String, DriverError>;

    /// Capture the viewport as a PNG at `path`.
    async fn screenshot(&self, path: &Path) -> Result<(), DriverError>;
}

/// Owner of one browser session.
///
/// `open` is idempotent: a live session is reused, a closed one is
/// relaunched. This is what lets two test cases share an authenticated
/// session when the first one is run with `close_after = false`.
#[async_trait]
pub trait SessionProvider: Send + Sync {
    async fn open(&self) -> Result<Arc<dyn PageDriver>, DriverError>;

    async fn close(&self) -> Result<(), DriverError>;
}
