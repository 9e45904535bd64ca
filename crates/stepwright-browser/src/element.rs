//! Element handles backed by CDP node ids.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::json;

use stepwright_core::driver::{DriverError, ElementRef};

use crate::cdp::{CdpError, PageSession};
use crate::page::driver_error;

/// A handle to one DOM node.
///
/// Node ids are invalidated by navigation; callers re-query rather than
/// holding handles across page loads.
pub struct ElementHandle {
    session: Arc<PageSession>,
    node_id: i64,
    selector: String,
}

impl ElementHandle {
    pub(crate) fn new(session: Arc<PageSession>, node_id: i64, selector: &str) -> Self {
        Self {
            session,
            node_id,
            selector: selector.to_string(),
        }
    }

    async fn object_id(&self) -> Result<String, CdpError> {
        let obj = self.session.resolve_node(self.node_id).await?;
        obj.object_id
            .ok_or_else(|| CdpError::InvalidResponse("Node has no object id".to_string()))
    }

    async fn call_self(&self, function: &str, args: Vec<serde_json::Value>) -> Result<serde_json::Value, CdpError> {
        let object_id = self.object_id().await?;
        self.session
            .call_function_on(&object_id, function, args)
            .await
    }
}

#[async_trait]
impl ElementRef for ElementHandle {
    async fn text(&self) -> Result<String, DriverError> {
        let value = self
            .call_self(
                "function() { return this.innerText || this.textContent || ''; }",
                vec![],
            )
            .await
            .map_err(driver_error)?;
        Ok(value.as_str().unwrap_or("").trim().to_string())
    }

    async fn tag_name(&self) -> Result<String, DriverError> {
        let value = self
            .call_self("function() { return this.tagName.toLowerCase(); }", vec![])
            .await
            .map_err(driver_error)?;
        Ok(value.as_str().unwrap_or("").to_string())
    }

    async fn attribute(&self, name: &str) -> Result<Option<String>, DriverError> {
        let value = self
            .call_self(
                "function(name) { return this.getAttribute(name); }",
                vec![json!(name)],
            )
            .await
            .map_err(driver_error)?;
        Ok(value.as_str().map(|s| s.to_string()))
    }

    async fn scroll_into_view(&self) -> Result<(), DriverError> {
        self.session
            .scroll_into_view(self.node_id)
            .await
            .map_err(driver_error)
    }

    async fn click(&self) -> Result<(), DriverError> {
        let model = self
            .session
            .box_model(self.node_id)
            .await
            .map_err(driver_error)?
            .ok_or_else(|| {
                DriverError::ElementNotFound(format!("{} (not visible)", self.selector))
            })?;
        let (x, y) = PageSession::quad_center(&model.content);
        self.session.click_at(x, y).await.map_err(driver_error)
    }

    async fn fill(&self, text: &str) -> Result<(), DriverError> {
        self.session.focus(self.node_id).await.map_err(driver_error)?;
        self.session.select_all().await.map_err(driver_error)?;
        self.session.insert_text(text).await.map_err(driver_error)
    }

    async fn type_text(&self, text: &str, delay: Duration) -> Result<(), DriverError> {
        self.session.focus(self.node_id).await.map_err(driver_error)?;
        // Clear existing content before typing.
        self.session.select_all().await.map_err(driver_error)?;
        self.session
            .press_key("Delete", 0)
            .await
            .map_err(driver_error)?;

        for c in text.chars() {
            self.session.type_char(c).await.map_err(driver_error)?;
            tokio::time::sleep(delay).await;
        }
        Ok(())
    }
}
