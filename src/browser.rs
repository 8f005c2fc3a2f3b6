//! Abstract browser-session capability consumed by the scenario executor.
//!
//! The scenarios only ever talk to [`BrowserSession`]; the concrete engine
//! behind it (see [`webdriver`]) is an external collaborator. Error display
//! text deliberately carries the `timeout` / `selector` markers the failure
//! classifier keys on.

use async_trait::async_trait;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

pub mod webdriver;

#[derive(Error, Debug)]
pub enum BrowserError {
    #[error("timeout after {timeout_ms}ms waiting for selector {selector}")]
    WaitTimeout { selector: String, timeout_ms: u64 },

    #[error("no element matched selector {0}")]
    SelectorNotFound(String),

    #[error("navigation to {url} failed: {message}")]
    Navigation { url: String, message: String },

    #[error("browser session fault: {0}")]
    Session(String),
}

/// CSS selectors for the fixed login form under test.
#[derive(Debug, Clone)]
pub struct LoginSelectors {
    pub username: String,
    pub password: String,
    pub submit: String,
    /// Element shown when the form rejects a submission.
    pub error_indicator: String,
    /// Element that only exists once login has succeeded.
    pub post_login_marker: String,
}

impl Default for LoginSelectors {
    fn default() -> Self {
        Self {
            username: "#txtUsername".to_string(),
            password: "#txtPassword".to_string(),
            submit: "#btnLogin".to_string(),
            error_indicator: "#spanMessage".to_string(),
            post_login_marker: "#grid-Gather".to_string(),
        }
    }
}

/// One live browser page. All operations may fail with a [`BrowserError`];
/// the scenarios decide what each fault means.
#[async_trait]
pub trait BrowserSession: Send + Sync {
    async fn navigate(&self, url: &str) -> Result<(), BrowserError>;

    async fn fill(&self, selector: &str, value: &str) -> Result<(), BrowserError>;

    async fn click(&self, selector: &str) -> Result<(), BrowserError>;

    /// Wait until an element matching `selector` exists, up to `timeout`.
    async fn wait_for_selector(
        &self,
        selector: &str,
        timeout: Duration,
    ) -> Result<(), BrowserError>;

    /// Whether an element matching `selector` exists and is displayed.
    /// An absent element is `Ok(false)`, not an error.
    async fn is_visible(&self, selector: &str) -> Result<bool, BrowserError>;

    /// Capture a full-page screenshot to `path`. Returns `false` when the
    /// engine declined to produce one without raising a fault.
    async fn screenshot(&self, path: &Path) -> Result<bool, BrowserError>;

    async fn close(&self) -> Result<(), BrowserError>;
}

#[async_trait]
pub trait BrowserLauncher: Send + Sync {
    async fn launch(&self) -> Result<Box<dyn BrowserSession>, BrowserError>;
}
