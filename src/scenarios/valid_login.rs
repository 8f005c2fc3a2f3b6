//! Scenario 1: log in with valid credentials and assert the post-login
//! marker appears.

use super::{
    LoginScenario, POST_LOGIN_TIMEOUT, ScenarioCx, capture_screenshot, release_session,
    wait_for_marker,
};
use crate::browser::BrowserSession;
use crate::{ProbeError, Result};
use async_trait::async_trait;

pub struct ValidLoginScenario;

impl ValidLoginScenario {
    async fn drive(&self, cx: &ScenarioCx<'_>, session: &dyn BrowserSession) -> Result<String> {
        match self.flow(cx, session).await {
            Ok(()) => {
                cx.report.pass("Login successful - post-login marker visible");
                Ok("Test Passed: Login successful - post-login marker visible".to_string())
            }
            Err(e) => {
                let screenshot = capture_screenshot(cx, session, "valid_login").await;
                cx.report.fail(&format!("Login failed: {e}"), screenshot.as_deref());
                if matches!(e, ProbeError::Cancelled) {
                    Err(e)
                } else {
                    Ok(format!("Test Failed: {e}"))
                }
            }
        }
    }

    async fn flow(&self, cx: &ScenarioCx<'_>, session: &dyn BrowserSession) -> Result<()> {
        let selectors = cx.selectors;

        cx.report.log(&format!("Navigating to {}", cx.url));
        session.navigate(cx.url).await?;

        cx.report.log("Filling username");
        session.fill(&selectors.username, cx.username).await?;

        cx.report.log("Filling password");
        session.fill(&selectors.password, cx.password).await?;

        cx.report.log("Clicking submit");
        session.click(&selectors.submit).await?;

        cx.report.log("Waiting for post-login marker");
        wait_for_marker(cx, session, &selectors.post_login_marker, POST_LOGIN_TIMEOUT).await?;

        Ok(())
    }
}

#[async_trait]
impl LoginScenario for ValidLoginScenario {
    fn name(&self) -> &'static str {
        "Scenario 1: Valid Login Test"
    }

    fn description(&self) -> &'static str {
        "Verify that a user can log in with valid credentials and reach the dashboard"
    }

    async fn run(&self, cx: &ScenarioCx<'_>) -> Result<String> {
        let session = cx.launcher.launch().await?;
        let outcome = self.drive(cx, session.as_ref()).await;
        release_session(session).await;
        outcome
    }
}
