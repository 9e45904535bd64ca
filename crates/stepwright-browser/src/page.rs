//! The CDP-backed page driver.

use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use tracing::debug;

use stepwright_core::driver::{DriverError, ElementRef, PageDriver};

use crate::cdp::{CdpError, PageSession};
use crate::element::ElementHandle;

/// Poll interval for selector waits.
const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// One browser page, driving a CDP session.
pub struct Page {
    session: Arc<PageSession>,
    navigation_timeout: Duration,
}

impl Page {
    pub(crate) fn new(session: Arc<PageSession>, navigation_timeout: Duration) -> Self {
        Self {
            session,
            navigation_timeout,
        }
    }

}

/// Map CDP failures onto the driver error taxonomy the engine retries on.
pub(crate) fn driver_error(e: CdpError) -> DriverError {
    match e {
        CdpError::ElementNotFound(s) => DriverError::ElementNotFound(s),
        CdpError::Timeout(s) => DriverError::Timeout(s),
        CdpError::NavigationFailed(s) => DriverError::Navigation(s),
        CdpError::ConnectionFailed(s) | CdpError::ChromeNotAvailable(s) | CdpError::WebSocket(s) => {
            DriverError::Connection(s)
        }
        CdpError::SessionClosed => DriverError::Connection("session closed".to_string()),
        other => DriverError::Other(other.to_string()),
    }
}

#[async_trait]
impl PageDriver for Page {
    async fn goto(&self, url: &str) -> Result<(), DriverError> {
        self.session.navigate(url).await.map_err(driver_error)
    }

    async fn wait_for_dom_ready(&self) -> Result<(), DriverError> {
        self.session
            .wait_for_ready(self.navigation_timeout)
            .await
            .map_err(driver_error)
    }

    async fn wait_for_network_idle(&self) -> Result<(), DriverError> {
        self.session
            .wait_for_network_idle(self.navigation_timeout)
            .await
            .map_err(driver_error)
    }

    async fn wait_for_selector(
        &self,
        selector: &str,
        timeout: Duration,
    ) -> Result<Box<dyn ElementRef>, DriverError> {
        let start = Instant::now();
        loop {
            if let Some(node_id) = self
                .session
                .query_selector(selector)
                .await
                .map_err(driver_error)?
            {
                // Present is not enough: require a layout box, i.e. visible.
                if self
                    .session
                    .box_model(node_id)
                    .await
                    .map_err(driver_error)?
                    .is_some()
                {
                    return Ok(Box::new(ElementHandle::new(
                        self.session.clone(),
                        node_id,
                        selector,
                    )));
                }
            }
            if start.elapsed() > timeout {
                return Err(DriverError::Timeout(format!(
                    "Waiting for selector '{}' timed out",
                    selector
                )));
            }
            tokio::time::sleep(POLL_INTERVAL).await;
        }
    }

    async fn query_all(&self, selectors: &str) -> Result<Vec<Box<dyn ElementRef>>, DriverError> {
        let node_ids = self
            .session
            .query_selector_all(selectors)
            .await
            .map_err(driver_error)?;
        Ok(node_ids
            .into_iter()
            .map(|node_id| {
                Box::new(ElementHandle::new(self.session.clone(), node_id, selectors))
                    as Box<dyn ElementRef>
            })
            .collect())
    }

    async fn current_url(&self) -> Result<String, DriverError> {
        self.session.current_url().await.map_err(driver_error)
    }

    async fn screenshot(&self, path: &Path) -> Result<(), DriverError> {
        let data = self
            .session
            .screenshot_base64()
            .await
            .map_err(driver_error)?;
        let bytes = BASE64
            .decode(data)
            .map_err(|e| DriverError::Screenshot(format!("Invalid image data: {}", e)))?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| DriverError::Screenshot(e.to_string()))?;
        }
        std::fs::write(path, bytes).map_err(|e| DriverError::Screenshot(e.to_string()))?;
        debug!("Screenshot saved to {}", path.display());
        Ok(())
    }
}
