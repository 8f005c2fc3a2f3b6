//! W3C WebDriver backend for the browser-session capability.
//!
//! Speaks the WebDriver REST protocol against a local driver endpoint
//! (chromedriver, geckodriver). `wait_for_selector` is implemented as a
//! 250ms poll over element lookup, so a slow page surfaces as a
//! [`BrowserError::WaitTimeout`] rather than a transport error.

use super::{BrowserError, BrowserLauncher, BrowserSession};
use async_trait::async_trait;
use base64::Engine;
use serde_json::{Value, json};
use std::path::Path;
use std::time::Duration;
use tokio::time::Instant;

const ELEMENT_KEY: &str = "element-6066-11e4-a52e-4f735466cecf";
const POLL_INTERVAL: Duration = Duration::from_millis(250);

pub struct WebdriverLauncher {
    endpoint: String,
    headless: bool,
    client: reqwest::Client,
}

impl WebdriverLauncher {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into().trim_end_matches('/').to_string(),
            headless: true,
            client: reqwest::Client::new(),
        }
    }

    pub fn headless(mut self, headless: bool) -> Self {
        self.headless = headless;
        self
    }
}

#[async_trait]
impl BrowserLauncher for WebdriverLauncher {
    async fn launch(&self) -> Result<Box<dyn BrowserSession>, BrowserError> {
        let mut args = vec!["--disable-gpu".to_string(), "--window-size=1280,900".to_string()];
        if self.headless {
            args.push("--headless=new".to_string());
        }
        let body = json!({
            "capabilities": {
                "alwaysMatch": {
                    "browserName": "chrome",
                    "goog:chromeOptions": { "args": args }
                }
            }
        });

        let value = send(
            &self.client,
            reqwest::Method::POST,
            &format!("{}/session", self.endpoint),
            Some(body),
        )
        .await?;

        let session_id = value
            .get("sessionId")
            .and_then(Value::as_str)
            .ok_or_else(|| BrowserError::Session("driver returned no session id".to_string()))?
            .to_string();

        tracing::debug!("WebDriver session {} started", session_id);

        Ok(Box::new(WebdriverSession {
            base: format!("{}/session/{}", self.endpoint, session_id),
            client: self.client.clone(),
        }))
    }
}

struct WebdriverSession {
    base: String,
    client: reqwest::Client,
}

impl WebdriverSession {
    async fn cmd(
        &self,
        method: reqwest::Method,
        path: &str,
        body: Option<Value>,
    ) -> Result<Value, BrowserError> {
        send(&self.client, method, &format!("{}{}", self.base, path), body).await
    }

    /// Look an element up by CSS selector, returning its element id.
    async fn find_element(&self, selector: &str) -> Result<String, BrowserError> {
        let body = json!({ "using": "css selector", "value": selector });
        let value = self
            .cmd(reqwest::Method::POST, "/element", Some(body))
            .await
            .map_err(|e| match e {
                BrowserError::Session(message) if message.contains("no such element") => {
                    BrowserError::SelectorNotFound(selector.to_string())
                }
                other => other,
            })?;

        value
            .get(ELEMENT_KEY)
            .and_then(Value::as_str)
            .map(str::to_string)
            .ok_or_else(|| BrowserError::SelectorNotFound(selector.to_string()))
    }
}

#[async_trait]
impl BrowserSession for WebdriverSession {
    async fn navigate(&self, url: &str) -> Result<(), BrowserError> {
        self.cmd(reqwest::Method::POST, "/url", Some(json!({ "url": url })))
            .await
            .map_err(|e| BrowserError::Navigation {
                url: url.to_string(),
                message: e.to_string(),
            })?;
        Ok(())
    }

    async fn fill(&self, selector: &str, value: &str) -> Result<(), BrowserError> {
        let element = self.find_element(selector).await?;
        self.cmd(
            reqwest::Method::POST,
            &format!("/element/{}/clear", element),
            Some(json!({})),
        )
        .await?;
        self.cmd(
            reqwest::Method::POST,
            &format!("/element/{}/value", element),
            Some(json!({ "text": value })),
        )
        .await?;
        Ok(())
    }

    async fn click(&self, selector: &str) -> Result<(), BrowserError> {
        let element = self.find_element(selector).await?;
        self.cmd(
            reqwest::Method::POST,
            &format!("/element/{}/click", element),
            Some(json!({})),
        )
        .await?;
        Ok(())
    }

    async fn wait_for_selector(
        &self,
        selector: &str,
        timeout: Duration,
    ) -> Result<(), BrowserError> {
        let deadline = Instant::now() + timeout;
        loop {
            match self.find_element(selector).await {
                Ok(_) => return Ok(()),
                Err(BrowserError::SelectorNotFound(_)) => {}
                Err(other) => return Err(other),
            }
            if Instant::now() >= deadline {
                return Err(BrowserError::WaitTimeout {
                    selector: selector.to_string(),
                    timeout_ms: timeout.as_millis() as u64,
                });
            }
            tokio::time::sleep(POLL_INTERVAL).await;
        }
    }

    async fn is_visible(&self, selector: &str) -> Result<bool, BrowserError> {
        let element = match self.find_element(selector).await {
            Ok(element) => element,
            Err(BrowserError::SelectorNotFound(_)) => return Ok(false),
            Err(other) => return Err(other),
        };
        let value = self
            .cmd(
                reqwest::Method::GET,
                &format!("/element/{}/displayed", element),
                None,
            )
            .await?;
        Ok(value.as_bool().unwrap_or(false))
    }

    async fn screenshot(&self, path: &Path) -> Result<bool, BrowserError> {
        let value = self.cmd(reqwest::Method::GET, "/screenshot", None).await?;
        let Some(encoded) = value.as_str() else {
            return Ok(false);
        };
        let bytes = base64::engine::general_purpose::STANDARD
            .decode(encoded)
            .map_err(|e| BrowserError::Session(format!("bad screenshot payload: {e}")))?;
        tokio::fs::write(path, bytes)
            .await
            .map_err(|e| BrowserError::Session(format!("failed to write screenshot: {e}")))?;
        Ok(true)
    }

    async fn close(&self) -> Result<(), BrowserError> {
        self.cmd(reqwest::Method::DELETE, "", None).await?;
        Ok(())
    }
}

/// Issue one WebDriver command and unwrap the `value` envelope. Driver-side
/// errors come back as `{"value": {"error": …, "message": …}}` with a
/// non-2xx status.
async fn send(
    client: &reqwest::Client,
    method: reqwest::Method,
    url: &str,
    body: Option<Value>,
) -> Result<Value, BrowserError> {
    let mut request = client.request(method, url);
    if let Some(body) = body {
        request = request.json(&body);
    }

    let response = request
        .send()
        .await
        .map_err(|e| BrowserError::Session(format!("webdriver request failed: {e}")))?;
    let status = response.status();
    let payload: Value = response
        .json()
        .await
        .map_err(|e| BrowserError::Session(format!("bad webdriver response: {e}")))?;
    let value = payload.get("value").cloned().unwrap_or(Value::Null);

    if status.is_success() {
        return Ok(value);
    }

    let error = value.get("error").and_then(Value::as_str).unwrap_or("unknown error");
    let message = value.get("message").and_then(Value::as_str).unwrap_or("");
    Err(BrowserError::Session(format!("{error}: {message}")))
}
