//! Scenario executor: the three fixed login scenarios and the plumbing they
//! share (session context, cancellable waits, best-effort screenshots).

use crate::browser::{BrowserLauncher, BrowserSession, LoginSelectors};
use crate::report::RunReporter;
use crate::{ProbeError, Result};
use async_trait::async_trait;
use chrono::Local;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio_util::sync::CancellationToken;

pub mod empty_fields;
pub mod invalid_login;
pub mod valid_login;

pub use empty_fields::EmptyFieldsScenario;
pub use invalid_login::InvalidLoginScenario;
pub use valid_login::ValidLoginScenario;

/// Hard timeout on the post-login marker appearing after a valid submit.
pub const POST_LOGIN_TIMEOUT: Duration = Duration::from_secs(10);

/// Settle delay before asserting on the error indicator. A polling wait for
/// asynchronous UI state, not a failure condition.
pub const SETTLE_DELAY: Duration = Duration::from_secs(3);

/// Marker downstream code checks to decide pass/fail from outcome text.
pub const PASS_MARKER: &str = "Test Passed";

/// Everything one scenario invocation needs, passed explicitly; there is no
/// shared process state between invocations.
pub struct ScenarioCx<'a> {
    pub launcher: &'a dyn BrowserLauncher,
    pub selectors: &'a LoginSelectors,
    pub url: &'a str,
    /// Credentials this scenario submits (empty for the empty-fields case).
    pub username: &'a str,
    pub password: &'a str,
    pub report: &'a dyn RunReporter,
    pub screenshots_dir: &'a Path,
    pub cancel: &'a CancellationToken,
}

/// One end-to-end login scenario.
///
/// `run` returns outcome text shaped `"Test Passed: …"`, `"Test Failed: …"`
/// or `"Test Error: …"`; an `Err` is an unhandled fault the orchestrator
/// converts into a failed result. Every implementation launches exactly one
/// browser session and closes it on every exit path.
#[async_trait]
pub trait LoginScenario: Send + Sync {
    fn name(&self) -> &'static str;

    fn description(&self) -> &'static str;

    async fn run(&self, cx: &ScenarioCx<'_>) -> Result<String>;
}

/// Sleep that aborts with [`ProbeError::Cancelled`] when the run is
/// cancelled mid-wait.
pub(crate) async fn settle(cx: &ScenarioCx<'_>, duration: Duration) -> Result<()> {
    tokio::select! {
        _ = tokio::time::sleep(duration) => Ok(()),
        _ = cx.cancel.cancelled() => Err(ProbeError::Cancelled),
    }
}

/// Bounded wait for a selector, abortable by cancellation.
pub(crate) async fn wait_for_marker(
    cx: &ScenarioCx<'_>,
    session: &dyn BrowserSession,
    selector: &str,
    timeout: Duration,
) -> Result<()> {
    tokio::select! {
        result = session.wait_for_selector(selector, timeout) => Ok(result?),
        _ = cx.cancel.cancelled() => Err(ProbeError::Cancelled),
    }
}

/// Best-effort screenshot capture. Failures are swallowed and logged; they
/// never change the scenario's own outcome.
pub(crate) async fn capture_screenshot(
    cx: &ScenarioCx<'_>,
    session: &dyn BrowserSession,
    slug: &str,
) -> Option<PathBuf> {
    if let Err(e) = std::fs::create_dir_all(cx.screenshots_dir) {
        tracing::debug!("Could not create screenshots directory: {e}");
        return None;
    }
    let file_name = format!("{}_{}.png", slug, Local::now().format("%Y%m%d_%H%M%S"));
    let path = cx.screenshots_dir.join(file_name);
    match session.screenshot(&path).await {
        Ok(true) => Some(path),
        Ok(false) => {
            tracing::debug!("Browser declined to produce a screenshot");
            None
        }
        Err(e) => {
            tracing::debug!("Screenshot capture failed: {e}");
            None
        }
    }
}

/// Close a session, logging instead of propagating. Called on every scenario
/// exit path.
pub(crate) async fn release_session(session: Box<dyn BrowserSession>) {
    if let Err(e) = session.close().await {
        tracing::warn!("Failed to close browser session: {e}");
    }
}
