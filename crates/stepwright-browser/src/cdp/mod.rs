//! Minimal Chrome DevTools Protocol client.
//!
//! One WebSocket connection to the browser endpoint carries every command;
//! responses are correlated back to callers by request id. Each page gets a
//! flat-mode target session.

mod client;
mod error;
mod protocol;
mod session;

pub use client::CdpClient;
pub use error::CdpError;
pub use protocol::{BrowserVersion, PageInfo};
pub use session::PageSession;
