//! Scripted driver implementations shared by the engine tests.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

use crate::driver::{DriverError, ElementRef, PageDriver, SessionProvider};

/// A fake element whose interaction counters are shared across clones.
#[derive(Clone)]
pub struct MockElement {
    pub tag: String,
    pub text: String,
    pub attrs: HashMap<String, String>,
    pub fail_click: bool,
    pub clicks: Arc<AtomicU32>,
    pub scrolls: Arc<AtomicU32>,
    pub typed: Arc<Mutex<Vec<String>>>,
    pub filled: Arc<Mutex<Vec<String>>>,
}

impl MockElement {
    pub fn new(tag: &str, text: &str) -> Self {
        Self {
            tag: tag.to_string(),
            text: text.to_string(),
            attrs: HashMap::new(),
            fail_click: false,
            clicks: Arc::new(AtomicU32::new(0)),
            scrolls: Arc::new(AtomicU32::new(0)),
            typed: Arc::new(Mutex::new(Vec::new())),
            filled: Arc::new(Mutex::new(Vec::new())),
        }
    }

}

#[async_trait]
impl ElementRef for MockElement {
    async fn text(&self) -> Result<String, DriverError> {
        Ok(self.text.clone())
    }

    async fn tag_name(&self) -> Result<String, DriverError> {
        Ok(self.tag.clone())
    }

    async fn attribute(&self, name: &str) -> Result<Option<String>, DriverError> {
        Ok(self.attrs.get(name).cloned())
    }

    async fn scroll_into_view(&self) -> Result<(), DriverError> {
        self.scrolls.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn click(&self) -> Result<(), DriverError> {
        if self.fail_click {
            return Err(DriverError::Other("click intercepted".to_string()));
        }
        self.clicks.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn fill(&self, text: &str) -> Result<(), DriverError> {
        self.filled.lock().unwrap().push(text.to_string());
        Ok(())
    }

    async fn type_text(&self, text: &str, _delay: Duration) -> Result<(), DriverError> {
        self.typed.lock().unwrap().push(text.to_string());
        Ok(())
    }
}

/// Always fail `wait_for_selector`.
pub const ALWAYS: u32 = u32::MAX;

/// A scripted page: configurable failure budgets and call counters.
pub struct MockPage {
    pub element: MockElement,
    pub elements: Vec<MockElement>,
    pub url: String,
    pub goto_urls: Arc<Mutex<Vec<String>>>,
    pub goto_fail_times: AtomicU32,
    pub wait_fail_times: AtomicU32,
    pub wait_calls: Arc<AtomicU32>,
    pub current_url_calls: Arc<AtomicU32>,
    pub screenshots: Arc<Mutex<Vec<PathBuf>>>,
}

impl MockPage {
    pub fn new() -> Self {
        Self {
            element: MockElement::new("button", "Submit"),
            elements: Vec::new(),
            url: "https://example.test/".to_string(),
            goto_urls: Arc::new(Mutex::new(Vec::new())),
            goto_fail_times: AtomicU32::new(0),
            wait_fail_times: AtomicU32::new(0),
            wait_calls: Arc::new(AtomicU32::new(0)),
            current_url_calls: Arc::new(AtomicU32::new(0)),
            screenshots: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Fail the first `n` selector waits, then succeed.
    pub fn failing_waits(n: u32) -> Self {
        let page = Self::new();
        page.wait_fail_times.store(n, Ordering::SeqCst);
        page
    }
}

impl Default for MockPage {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PageDriver for MockPage {
    async fn goto(&self, url: &str) -> Result<(), DriverError> {
        if self.goto_fail_times.load(Ordering::SeqCst) > 0 {
            self.goto_fail_times.fetch_sub(1, Ordering::SeqCst);
            return Err(DriverError::Navigation(format!("net::ERR_FAILED {}", url)));
        }
        self.goto_urls.lock().unwrap().push(url.to_string());
        Ok(())
    }

    async fn wait_for_dom_ready(&self) -> Result<(), DriverError> {
        Ok(())
    }

    async fn wait_for_network_idle(&self) -> Result<(), DriverError> {
        Ok(())
    }

    async fn wait_for_selector(
        &self,
        selector: &str,
        _timeout: Duration,
    ) -> Result<Box<dyn ElementRef>, DriverError> {
        self.wait_calls.fetch_add(1, Ordering::SeqCst);
        let budget = self.wait_fail_times.load(Ordering::SeqCst);
        if budget == ALWAYS {
            return Err(DriverError::Timeout(format!(
                "waiting for selector '{}' timed out",
                selector
            )));
        }
        if budget > 0 {
            self.wait_fail_times.fetch_sub(1, Ordering::SeqCst);
            return Err(DriverError::Timeout(format!(
                "waiting for selector '{}' timed out",
                selector
            )));
        }
        Ok(Box::new(self.element.clone()))
    }

    async fn query_all(&self, _selectors: &str) -> Result<Vec<Box<dyn ElementRef>>, DriverError> {
        Ok(self
            .elements
            .iter()
            .map(|e| Box::new(e.clone()) as Box<dyn ElementRef>)
            .collect())
    }

    async fn current_url(&self) -> Result<String, DriverError> {
        self.current_url_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.url.clone())
    }

    async fn screenshot(&self, path: &Path) -> Result<(), DriverError> {
        self.screenshots.lock().unwrap().push(path.to_path_buf());
        Ok(())
    }
}

/// A session provider handing out one shared [`MockPage`].
pub struct MockSession {
    pub page: Arc<MockPage>,
    pub opens: AtomicU32,
    pub closes: AtomicU32,
    pub open_fails: AtomicU32,
}

impl MockSession {
    pub fn new(page: MockPage) -> Self {
        Self {
            page: Arc::new(page),
            opens: AtomicU32::new(0),
            closes: AtomicU32::new(0),
            open_fails: AtomicU32::new(0),
        }
    }
}

#[async_trait]
impl SessionProvider for MockSession {
    async fn open(&self) -> Result<Arc<dyn PageDriver>, DriverError> {
        self.opens.fetch_add(1, Ordering::SeqCst);
        if self.open_fails.load(Ordering::SeqCst) > 0 {
            self.open_fails.fetch_sub(1, Ordering::SeqCst);
            return Err(DriverError::Connection("browser unreachable".to_string()));
        }
        Ok(self.page.clone())
    }

    async fn close(&self) -> Result<(), DriverError> {
        self.closes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}
