//! Chrome launch and session lifecycle.
//!
//! The browser is launched lazily on first use with a persistent profile, so
//! login state survives across runs that reuse the profile directory.

use std::path::PathBuf;
use std::process::Stdio;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;
use tokio::process::{Child, Command};
use tokio::sync::Mutex;
use tracing::{info, warn};

use stepwright_config::Config;
use stepwright_core::driver::{DriverError, PageDriver, SessionProvider};

use crate::cdp::{CdpClient, CdpError};
use crate::page::Page;

/// Browser lifecycle errors.
#[derive(Debug, Error)]
pub enum BrowserError {
    #[error("Chrome not found. Please install Google Chrome.")]
    ChromeNotFound,

    #[error("Failed to launch Chrome: {0}")]
    LaunchFailed(String),

    #[error(transparent)]
    Cdp(#[from] CdpError),
}

struct LiveSession {
    client: Arc<CdpClient>,
    page: Arc<Page>,
    target_id: String,
    /// Chrome process handle when this browser launched it.
    chrome: Option<Child>,
}

/// Owns at most one Chrome session and hands out its single page.
pub struct Browser {
    headless: bool,
    debug_port: u16,
    chrome_path: Option<PathBuf>,
    navigation_timeout: Duration,
    state: Mutex<Option<LiveSession>>,
}

impl Browser {
    pub fn new(config: &Config) -> Self {
        Self {
            headless: config.headless,
            debug_port: config.debug_port,
            chrome_path: config.chrome_path.clone(),
            navigation_timeout: Duration::from_millis(config.navigation_timeout),
            state: Mutex::new(None),
        }
    }

    fn endpoint(&self) -> String {
        format!("http://localhost:{}", self.debug_port)
    }

    /// Find a Chrome executable on this platform.
    pub fn find_chrome() -> Option<PathBuf> {
        #[cfg(target_os = "macos")]
        let candidates = [
            "/Applications/Google Chrome.app/Contents/MacOS/Google Chrome",
            "/Applications/Chromium.app/Contents/MacOS/Chromium",
            "/Applications/Microsoft Edge.app/Contents/MacOS/Microsoft Edge",
        ];

        #[cfg(target_os = "linux")]
        let candidates = [
            "/usr/bin/google-chrome",
            "/usr/bin/google-chrome-stable",
            "/usr/bin/chromium",
            "/usr/bin/chromium-browser",
            "/snap/bin/chromium",
        ];

        #[cfg(target_os = "windows")]
        let candidates = [
            r"C:\Program Files\Google\Chrome\Application\chrome.exe",
            r"C:\Program Files (x86)\Google\Chrome\Application\chrome.exe",
        ];

        #[cfg(not(any(target_os = "macos", target_os = "linux", target_os = "windows")))]
        let candidates: [&str; 0] = [];

        candidates
            .iter()
            .map(PathBuf::from)
            .find(|p| p.exists())
    }

    fn profile_dir() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".stepwright")
            .join("browser-profile")
    }

    async fn is_chrome_running(&self) -> bool {
        reqwest::get(format!("{}/json/version", self.endpoint()))
            .await
            .is_ok()
    }

    async fn launch_chrome(&self) -> Result<Child, BrowserError> {
        let chrome_path = match &self.chrome_path {
            Some(path) => path.clone(),
            None => Self::find_chrome().ok_or(BrowserError::ChromeNotFound)?,
        };
        let profile_dir = Self::profile_dir();
        if let Err(e) = std::fs::create_dir_all(&profile_dir) {
            warn!("Failed to create profile directory: {}", e);
        }

        info!("Launching Chrome with profile at {}", profile_dir.display());
        let mut cmd = Command::new(&chrome_path);
        cmd.arg(format!("--remote-debugging-port={}", self.debug_port))
            .arg(format!("--user-data-dir={}", profile_dir.display()))
            .arg("--no-first-run")
            .arg("--no-default-browser-check")
            .arg("--disable-background-networking")
            .arg("--disable-sync")
            .arg("--disable-translate")
            .arg("--metrics-recording-only")
            .stdout(Stdio::null())
            .stderr(Stdio::null());

        if self.headless {
            cmd.arg("--headless=new");
        }

        let child = cmd
            .spawn()
            .map_err(|e| BrowserError::LaunchFailed(e.to_string()))?;
        info!("Chrome launched with PID: {:?}", child.id());
        Ok(child)
    }

    async fn start_session(&self) -> Result<LiveSession, BrowserError> {
        let chrome = if self.is_chrome_running().await {
            info!("Chrome already running on port {}", self.debug_port);
            None
        } else {
            info!("Chrome not running on port {}, launching...", self.debug_port);
            let child = self.launch_chrome().await?;

            // Wait for the debugging endpoint to come up.
            let mut attempts = 0;
            let max_attempts = 30; // 30 * 200ms = 6 seconds
            loop {
                tokio::time::sleep(Duration::from_millis(200)).await;
                if self.is_chrome_running().await {
                    break;
                }
                attempts += 1;
                if attempts >= max_attempts {
                    return Err(BrowserError::LaunchFailed(
                        "Chrome failed to start within timeout".to_string(),
                    ));
                }
            }
            Some(child)
        };

        let client = Arc::new(CdpClient::connect(&self.endpoint()).await?);
        let session = Arc::new(client.new_page().await?);
        let target_id = session.target_id().to_string();
        let page = Arc::new(Page::new(session, self.navigation_timeout));
        info!("Connected to Chrome at {}", self.endpoint());

        Ok(LiveSession {
            client,
            page,
            target_id,
            chrome,
        })
    }
}

#[async_trait]
impl SessionProvider for Browser {
    async fn open(&self) -> Result<Arc<dyn PageDriver>, DriverError> {
        let mut state = self.state.lock().await;
        if let Some(live) = state.as_ref() {
            return Ok(live.page.clone());
        }
        let live = self
            .start_session()
            .await
            .map_err(|e| DriverError::Connection(e.to_string()))?;
        let page = live.page.clone();
        *state = Some(live);
        Ok(page)
    }

    async fn close(&self) -> Result<(), DriverError> {
        let mut state = self.state.lock().await;
        if let Some(mut live) = state.take() {
            if let Err(e) = live.client.close_page(&live.target_id).await {
                warn!("Error closing page: {}", e);
            }
            if let Some(mut chrome) = live.chrome.take() {
                info!("Shutting down Chrome...");
                let _ = chrome.kill().await;
            }
            info!("Browser session closed");
        }
        Ok(())
    }
}
