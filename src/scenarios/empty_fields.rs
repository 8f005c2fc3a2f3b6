//! Scenario 3: submit the login form with nothing filled in and assert that
//! validation blocks it.
//!
//! Unlike the invalid-login scenario, a fault here is a plain failure: there
//! is no rejection semantics to read into a crash when no credentials were
//! submitted at all.

use super::{
    LoginScenario, SETTLE_DELAY, ScenarioCx, capture_screenshot, release_session, settle,
};
use crate::browser::{BrowserError, BrowserSession};
use crate::Result;
use async_trait::async_trait;

pub struct EmptyFieldsScenario;

impl EmptyFieldsScenario {
    async fn drive(&self, cx: &ScenarioCx<'_>, session: &dyn BrowserSession) -> Result<String> {
        let selectors = cx.selectors;

        cx.report.log(&format!("Navigating to {}", cx.url));
        let submitted: std::result::Result<(), BrowserError> = async {
            session.navigate(cx.url).await?;
            session.click(&selectors.submit).await?;
            Ok(())
        }
        .await;
        if let Err(e) = submitted {
            return self.fault_outcome(cx, session, e).await;
        }

        cx.report.log("Waiting for the page to settle");
        settle(cx, SETTLE_DELAY).await?;

        match session.is_visible(&selectors.error_indicator).await {
            Ok(true) => {
                cx.report.pass("Validation blocked the empty submission");
                Ok("Test Passed: Empty fields were correctly validated".to_string())
            }
            Ok(false) => {
                let screenshot = capture_screenshot(cx, session, "empty_fields").await;
                cx.report.fail("Empty fields were not validated", screenshot.as_deref());
                Ok("Test Failed: Empty fields were not validated".to_string())
            }
            Err(e) => self.fault_outcome(cx, session, e).await,
        }
    }

    async fn fault_outcome(
        &self,
        cx: &ScenarioCx<'_>,
        session: &dyn BrowserSession,
        e: BrowserError,
    ) -> Result<String> {
        let screenshot = capture_screenshot(cx, session, "empty_fields").await;
        cx.report.fail(&format!("Flow raised a fault: {e}"), screenshot.as_deref());
        Ok(format!("Test Error: {e}"))
    }
}

#[async_trait]
impl LoginScenario for EmptyFieldsScenario {
    fn name(&self) -> &'static str {
        "Scenario 3: Empty Fields Validation Test"
    }

    fn description(&self) -> &'static str {
        "Verify that submitting the login form with empty fields triggers validation"
    }

    async fn run(&self, cx: &ScenarioCx<'_>) -> Result<String> {
        let session = cx.launcher.launch().await?;
        let outcome = self.drive(cx, session.as_ref()).await;
        release_session(session).await;
        outcome
    }
}
