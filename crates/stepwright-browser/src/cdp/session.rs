//! CDP page session: commands scoped to one attached target.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use futures::SinkExt;
use parking_lot::Mutex;
use serde_json::{json, Value};
use tokio_tungstenite::tungstenite::Message;
use tracing::{debug, trace};

use super::client::{PendingRequest, WsSink};
use super::error::CdpError;
use super::protocol::{
    BoxModel, CdpRequest, KeyEventType, MouseButton, MouseEventType, RemoteObject,
};

/// Control-key modifier flag for Input events.
const MODIFIER_CTRL: i64 = 2;

/// Poll interval for readiness and selector waits.
const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Consecutive stable polls required before the network counts as idle.
const IDLE_STABLE_POLLS: u32 = 3;

/// A session attached to a single page target.
pub struct PageSession {
    target_id: String,
    session_id: String,
    /// WebSocket sender (shared with the client).
    ws_tx: Arc<tokio::sync::Mutex<WsSink>>,
    /// Pending requests (shared with the client).
    pending: Arc<Mutex<HashMap<u64, PendingRequest>>>,
    /// Request id counter (shared with the client).
    request_id: Arc<AtomicU64>,
}

impl PageSession {
    pub(crate) fn new(
        target_id: String,
        session_id: String,
        ws_tx: Arc<tokio::sync::Mutex<WsSink>>,
        pending: Arc<Mutex<HashMap<u64, PendingRequest>>>,
        request_id: Arc<AtomicU64>,
    ) -> Self {
        Self {
            target_id,
            session_id,
            ws_tx,
            pending,
            request_id,
        }
    }

    pub fn target_id(&self) -> &str {
        &self.target_id
    }

    /// Send a CDP command within this session.
    pub async fn call(&self, method: &str, params: Option<Value>) -> Result<Value, CdpError> {
        let id = self.request_id.fetch_add(1, Ordering::SeqCst);

        let request = CdpRequest {
            id,
            method: method.to_string(),
            params,
            session_id: Some(self.session_id.clone()),
        };
        let json = serde_json::to_string(&request)?;
        trace!("CDP session send: {}", json);

        let (tx, rx) = tokio::sync::oneshot::channel();
        self.pending.lock().insert(id, PendingRequest { tx });

        {
            let mut ws = self.ws_tx.lock().await;
            ws.send(Message::Text(json.into())).await?;
        }

        match tokio::time::timeout(Duration::from_secs(30), rx).await {
            Ok(Ok(result)) => result,
            Ok(Err(_)) => Err(CdpError::SessionClosed),
            Err(_) => {
                self.pending.lock().remove(&id);
                Err(CdpError::Timeout(format!("Request {} timed out", method)))
            }
        }
    }

    /// Enable the CDP domains the driver relies on.
    pub(crate) async fn enable_domains(&self) -> Result<(), CdpError> {
        self.call("Page.enable", None).await?;
        self.call("DOM.enable", None).await?;
        self.call("Runtime.enable", None).await?;
        debug!("Enabled CDP domains for session {}", self.session_id);
        Ok(())
    }

    // ========================================================================
    // Navigation
    // ========================================================================

    /// Start navigation to `url`. Waiting for readiness is separate.
    pub async fn navigate(&self, url: &str) -> Result<(), CdpError> {
        let result = self
            .call("Page.navigate", Some(json!({"url": url})))
            .await?;

        if let Some(error) = result.get("errorText") {
            return Err(CdpError::NavigationFailed(
                error.as_str().unwrap_or("Unknown error").to_string(),
            ));
        }
        debug!("Navigating to {}", url);
        Ok(())
    }

    /// Poll `document.readyState` until the DOM is usable.
    pub async fn wait_for_ready(&self, timeout: Duration) -> Result<(), CdpError> {
        let start = Instant::now();
        loop {
            let result = self.evaluate("document.readyState").await?;
            if let Some(state) = result.as_str() {
                if state == "complete" || state == "interactive" {
                    return Ok(());
                }
            }
            if start.elapsed() > timeout {
                return Err(CdpError::Timeout("Page load timeout".to_string()));
            }
            tokio::time::sleep(POLL_INTERVAL).await;
        }
    }

    /// Wait until the DOM is complete and the page's resource-entry count
    /// holds steady across consecutive polls.
    ///
    /// CDP exposes no single network-idle signal, so this approximates one
    /// the same way the readiness wait does: by polling page state.
    pub async fn wait_for_network_idle(&self, timeout: Duration) -> Result<(), CdpError> {
        let start = Instant::now();
        loop {
            let result = self.evaluate("document.readyState").await?;
            if result.as_str() == Some("complete") {
                break;
            }
            if start.elapsed() > timeout {
                return Err(CdpError::Timeout("Network idle timeout".to_string()));
            }
            tokio::time::sleep(POLL_INTERVAL).await;
        }

        let mut last_count = -1i64;
        let mut stable_polls = 0u32;
        loop {
            let count = self
                .evaluate("performance.getEntriesByType('resource').length")
                .await?
                .as_i64()
                .unwrap_or(0);
            if count == last_count {
                stable_polls += 1;
                if stable_polls >= IDLE_STABLE_POLLS {
                    return Ok(());
                }
            } else {
                stable_polls = 0;
                last_count = count;
            }
            if start.elapsed() > timeout {
                return Err(CdpError::Timeout("Network idle timeout".to_string()));
            }
            tokio::time::sleep(POLL_INTERVAL).await;
        }
    }

    /// Current URL as the page sees it.
    pub async fn current_url(&self) -> Result<String, CdpError> {
        let result = self.evaluate("window.location.href").await?;
        Ok(result.as_str().unwrap_or("").to_string())
    }

    // ========================================================================
    // JavaScript execution
    // ========================================================================

    /// Evaluate a JavaScript expression and return its value.
    pub async fn evaluate(&self, expression: &str) -> Result<Value, CdpError> {
        let result = self
            .call(
                "Runtime.evaluate",
                Some(json!({
                    "expression": expression,
                    "returnByValue": true,
                    "awaitPromise": true,
                })),
            )
            .await?;

        if let Some(exception) = result.get("exceptionDetails") {
            let text = exception["text"].as_str().unwrap_or("Unknown error");
            return Err(CdpError::JavaScript(text.to_string()));
        }
        Ok(result["result"]["value"].clone())
    }

    /// Call a function with a remote object as `this`.
    pub async fn call_function_on(
        &self,
        object_id: &str,
        function: &str,
        args: Vec<Value>,
    ) -> Result<Value, CdpError> {
        let arguments: Vec<Value> = args.into_iter().map(|v| json!({"value": v})).collect();
        let result = self
            .call(
                "Runtime.callFunctionOn",
                Some(json!({
                    "objectId": object_id,
                    "functionDeclaration": function,
                    "arguments": arguments,
                    "returnByValue": true,
                })),
            )
            .await?;

        if let Some(exception) = result.get("exceptionDetails") {
            let text = exception["text"].as_str().unwrap_or("Unknown error");
            return Err(CdpError::JavaScript(text.to_string()));
        }
        Ok(result["result"]["value"].clone())
    }

    // ========================================================================
    // DOM operations
    // ========================================================================

    /// Root document node id. Re-fetched per query: node ids are invalidated
    /// by navigation.
    async fn document_node(&self) -> Result<i64, CdpError> {
        let result = self
            .call("DOM.getDocument", Some(json!({"depth": 0})))
            .await?;
        result["root"]["nodeId"]
            .as_i64()
            .ok_or_else(|| CdpError::InvalidResponse("Missing document node".to_string()))
    }

    pub async fn query_selector(&self, selector: &str) -> Result<Option<i64>, CdpError> {
        let root = self.document_node().await?;
        let result = self
            .call(
                "DOM.querySelector",
                Some(json!({"nodeId": root, "selector": selector})),
            )
            .await?;
        match result["nodeId"].as_i64() {
            Some(0) | None => Ok(None),
            Some(node_id) => Ok(Some(node_id)),
        }
    }

    pub async fn query_selector_all(&self, selector: &str) -> Result<Vec<i64>, CdpError> {
        let root = self.document_node().await?;
        let result = self
            .call(
                "DOM.querySelectorAll",
                Some(json!({"nodeId": root, "selector": selector})),
            )
            .await?;
        Ok(result["nodeIds"]
            .as_array()
            .map(|arr| arr.iter().filter_map(|v| v.as_i64()).collect())
            .unwrap_or_default())
    }

    /// Box model for a node, or `None` when the node has no layout (hidden).
    pub async fn box_model(&self, node_id: i64) -> Result<Option<BoxModel>, CdpError> {
        let result = self
            .call("DOM.getBoxModel", Some(json!({"nodeId": node_id})))
            .await;
        match result {
            Ok(r) => {
                let model: BoxModel = serde_json::from_value(r["model"].clone())?;
                Ok(Some(model))
            }
            Err(CdpError::Protocol { code: -32000, .. }) => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Resolve a node to a runtime object for `call_function_on`.
    pub async fn resolve_node(&self, node_id: i64) -> Result<RemoteObject, CdpError> {
        let result = self
            .call("DOM.resolveNode", Some(json!({"nodeId": node_id})))
            .await?;
        let obj: RemoteObject = serde_json::from_value(result["object"].clone())?;
        Ok(obj)
    }

    pub async fn focus(&self, node_id: i64) -> Result<(), CdpError> {
        self.call("DOM.focus", Some(json!({"nodeId": node_id})))
            .await?;
        Ok(())
    }

    pub async fn scroll_into_view(&self, node_id: i64) -> Result<(), CdpError> {
        self.call(
            "DOM.scrollIntoViewIfNeeded",
            Some(json!({"nodeId": node_id})),
        )
        .await?;
        Ok(())
    }

    // ========================================================================
    // Input
    // ========================================================================

    /// Click at viewport coordinates.
    pub async fn click_at(&self, x: f64, y: f64) -> Result<(), CdpError> {
        for event_type in [MouseEventType::MousePressed, MouseEventType::MouseReleased] {
            self.call(
                "Input.dispatchMouseEvent",
                Some(json!({
                    "type": event_type,
                    "x": x,
                    "y": y,
                    "button": MouseButton::Left,
                    "clickCount": 1,
                })),
            )
            .await?;
        }
        debug!("Clicked at ({}, {})", x, y);
        Ok(())
    }

    /// Insert text into the focused element in one operation.
    pub async fn insert_text(&self, text: &str) -> Result<(), CdpError> {
        self.call("Input.insertText", Some(json!({"text": text})))
            .await?;
        Ok(())
    }

    /// Send one printable character as a key event.
    pub async fn type_char(&self, c: char) -> Result<(), CdpError> {
        self.call(
            "Input.dispatchKeyEvent",
            Some(json!({
                "type": KeyEventType::Char,
                "text": c.to_string(),
            })),
        )
        .await?;
        Ok(())
    }

    /// Press and release a key, with optional modifier flags.
    pub async fn press_key(&self, key: &str, modifiers: i64) -> Result<(), CdpError> {
        for event_type in [KeyEventType::KeyDown, KeyEventType::KeyUp] {
            self.call(
                "Input.dispatchKeyEvent",
                Some(json!({
                    "type": event_type,
                    "key": key,
                    "modifiers": modifiers,
                })),
            )
            .await?;
        }
        Ok(())
    }

    /// Select the focused element's content (Ctrl+A).
    pub async fn select_all(&self) -> Result<(), CdpError> {
        self.press_key("a", MODIFIER_CTRL).await
    }

    // ========================================================================
    // Screenshots
    // ========================================================================

    /// Capture the viewport as base64-encoded PNG data.
    pub async fn screenshot_base64(&self) -> Result<String, CdpError> {
        let result = self
            .call("Page.captureScreenshot", Some(json!({"format": "png"})))
            .await?;
        result["data"]
            .as_str()
            .map(|s| s.to_string())
            .ok_or_else(|| CdpError::InvalidResponse("Missing screenshot data".to_string()))
    }

    /// Centre point of a content quad.
    pub(crate) fn quad_center(quad: &[f64]) -> (f64, f64) {
        if quad.len() >= 8 {
            let x = (quad[0] + quad[2] + quad[4] + quad[6]) / 4.0;
            let y = (quad[1] + quad[3] + quad[5] + quad[7]) / 4.0;
            (x, y)
        } else {
            (0.0, 0.0)
        }
    }
}
