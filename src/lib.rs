pub use crate::browser::LoginSelectors;
pub use crate::error::{ProbeError, Result};

use crate::browser::BrowserLauncher;
use crate::browser::webdriver::WebdriverLauncher;
use crate::report::{HtmlReportSink, ReportSink};
use std::path::{Path, PathBuf};
use std::sync::{Arc, OnceLock};
use tokio_util::sync::CancellationToken;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{filter::EnvFilter, fmt::Layer, prelude::*, registry::Registry};

pub mod browser;
pub mod classifier;
mod error;
pub mod formatter;
pub mod orchestrator;
pub mod report;
pub mod scenarios;
pub mod tools;

static TRACING_GUARDS: OnceLock<(WorkerGuard, WorkerGuard)> = OnceLock::new();
static TRACING_INIT: OnceLock<()> = OnceLock::new();

fn init_tracing(logs_dir: &Path) {
    TRACING_INIT.get_or_init(|| {
        let file_appender = tracing_appender::rolling::RollingFileAppender::builder()
            .rotation(tracing_appender::rolling::Rotation::DAILY)
            .filename_prefix("loginprobe")
            .filename_suffix("log")
            .build(logs_dir)
            .expect("Failed to create file appender");

        let (non_blocking_file, file_guard) = tracing_appender::non_blocking(file_appender);
        // stdout carries tool responses; console logging goes to stderr.
        let (non_blocking_stderr, stderr_guard) =
            tracing_appender::non_blocking(std::io::stderr());

        TRACING_GUARDS.set((file_guard, stderr_guard)).ok();

        let stderr_layer = Layer::new()
            .with_writer(non_blocking_stderr)
            .with_ansi(true)
            .with_target(true);

        let file_layer = Layer::new()
            .with_writer(non_blocking_file)
            .with_ansi(false)
            .with_target(true);

        Registry::default()
            .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
            .with(stderr_layer)
            .with(file_layer)
            .init();
    });
}

#[derive(Clone, Debug)]
pub struct ProbeConfig {
    /// Directory for HTML reports.
    pub reports_dir: PathBuf,

    /// Directory for failure screenshots.
    pub screenshots_dir: PathBuf,

    /// Directory for application logs.
    pub logs_dir: PathBuf,

    /// WebDriver endpoint the browser launcher talks to.
    pub webdriver_url: String,

    pub headless: bool,

    /// Open the HTML report in the platform viewer after each flush.
    pub open_report: bool,

    pub selectors: LoginSelectors,
}

impl ProbeConfig {
    pub fn new(data_dir: &Path, logs_dir: &Path) -> Self {
        let env_suffix = if cfg!(debug_assertions) { "dev" } else { "release" };
        let data_dir = data_dir.join(env_suffix);

        Self {
            reports_dir: data_dir.join("reports"),
            screenshots_dir: data_dir.join("screenshots"),
            logs_dir: logs_dir.join(env_suffix),
            webdriver_url: "http://localhost:9515".to_string(),
            headless: true,
            open_report: false,
            selectors: LoginSelectors::default(),
        }
    }
}

/// Top-level handle: owns the browser launcher and the report sink, and is
/// passed by reference to every tool invocation. Constructed once at process
/// start; there is no global state behind it.
pub struct Probe {
    pub config: ProbeConfig,
    pub(crate) launcher: Arc<dyn BrowserLauncher>,
    pub(crate) sink: Arc<dyn ReportSink>,
    cancel: CancellationToken,
}

impl Probe {
    /// Set up directories, logging, the WebDriver launcher and the HTML
    /// report sink from the given configuration.
    pub async fn initialize(config: ProbeConfig) -> Result<Self> {
        tokio::fs::create_dir_all(&config.reports_dir).await?;
        tokio::fs::create_dir_all(&config.screenshots_dir).await?;
        tokio::fs::create_dir_all(&config.logs_dir).await?;

        init_tracing(&config.logs_dir);
        tracing::debug!("Initializing loginprobe with config: {:?}", config);

        let launcher: Arc<dyn BrowserLauncher> = Arc::new(
            WebdriverLauncher::new(config.webdriver_url.clone()).headless(config.headless),
        );
        let sink: Arc<dyn ReportSink> =
            Arc::new(HtmlReportSink::new(&config.reports_dir, config.open_report)?);

        tracing::info!("Loginprobe initialized, reports under {}", config.reports_dir.display());

        Ok(Self {
            config,
            launcher,
            sink,
            cancel: CancellationToken::new(),
        })
    }

    /// Token cancelled when the process shuts down; runs derive child tokens
    /// from it so an in-flight run aborts cleanly.
    pub fn shutdown_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Abort in-flight runs. Scenarios already past their waits finish their
    /// cleanup; unrun scenarios are reported as skipped.
    pub fn shutdown(&self) {
        self.cancel.cancel();
    }

    #[cfg(test)]
    pub(crate) fn with_parts(launcher: Arc<dyn BrowserLauncher>, sink: Arc<dyn ReportSink>) -> Self {
        let base = std::env::temp_dir().join("loginprobe-tests");
        Self {
            config: ProbeConfig::new(&base.join("data"), &base.join("logs")),
            launcher,
            sink,
            cancel: CancellationToken::new(),
        }
    }
}
