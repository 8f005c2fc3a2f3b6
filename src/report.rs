//! Report sink: collects structured log/pass/fail events per run and
//! persists them as a viewable HTML file.
//!
//! There is no global "current run" slot; every scenario invocation receives
//! its own [`RunReporter`] handle, so concurrent tool invocations cannot
//! interleave into each other's runs.

use async_trait::async_trait;
use chrono::Local;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ReportError {
    #[error("report I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Handle for one run's events. Methods never fail; events are buffered
/// until the sink is flushed.
pub trait RunReporter: Send + Sync {
    fn log(&self, message: &str);
    fn pass(&self, message: &str);
    fn fail(&self, message: &str, screenshot: Option<&Path>);
}

#[async_trait]
pub trait ReportSink: Send + Sync {
    fn create_run(&self, name: &str) -> Arc<dyn RunReporter>;

    /// Persist everything buffered so far.
    async fn flush(&self) -> Result<(), ReportError>;

    /// Where the persisted report lives, if this sink writes one.
    fn location(&self) -> Option<PathBuf> {
        None
    }
}

#[derive(Debug, Clone)]
enum RunEvent {
    Log(String),
    Pass(String),
    Fail { message: String, screenshot: Option<PathBuf> },
}

#[derive(Debug, Clone)]
struct RunRecord {
    name: String,
    events: Vec<RunEvent>,
}

/// Writes all runs of one sink instance into a single timestamped HTML file,
/// so concurrent sink instances never collide on a file name.
pub struct HtmlReportSink {
    path: PathBuf,
    open_on_flush: bool,
    runs: Arc<Mutex<Vec<RunRecord>>>,
}

impl HtmlReportSink {
    pub fn new(reports_dir: &Path, open_on_flush: bool) -> Result<Self, ReportError> {
        std::fs::create_dir_all(reports_dir)?;
        let file_name = format!(
            "loginprobe_report_{}.html",
            Local::now().format("%Y%m%d_%H%M%S")
        );
        Ok(Self {
            path: reports_dir.join(file_name),
            open_on_flush,
            runs: Arc::new(Mutex::new(Vec::new())),
        })
    }

    fn render(&self) -> String {
        let runs = self.runs.lock().expect("report buffer poisoned").clone();
        let mut html = String::new();
        html.push_str("<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"utf-8\">\n");
        html.push_str("<title>Loginprobe Automation Report</title>\n<style>\n");
        html.push_str("body { font-family: sans-serif; margin: 2em; }\n");
        html.push_str("li.pass { color: #1a7f37; }\n");
        html.push_str("li.fail { color: #cf222e; }\n");
        html.push_str("li.log { color: #57606a; }\n");
        html.push_str("</style>\n</head>\n<body>\n");
        html.push_str("<h1>Loginprobe Automation Report</h1>\n");
        for run in &runs {
            html.push_str(&format!("<section>\n<h2>{}</h2>\n<ul>\n", escape(&run.name)));
            for event in &run.events {
                match event {
                    RunEvent::Log(message) => {
                        html.push_str(&format!("<li class=\"log\">{}</li>\n", escape(message)));
                    }
                    RunEvent::Pass(message) => {
                        html.push_str(&format!("<li class=\"pass\">✓ {}</li>\n", escape(message)));
                    }
                    RunEvent::Fail { message, screenshot } => {
                        html.push_str(&format!("<li class=\"fail\">✗ {}", escape(message)));
                        if let Some(screenshot) = screenshot {
                            html.push_str(&format!(
                                " — <a href=\"{}\">screenshot</a>",
                                escape(&screenshot.display().to_string())
                            ));
                        }
                        html.push_str("</li>\n");
                    }
                }
            }
            html.push_str("</ul>\n</section>\n");
        }
        html.push_str("</body>\n</html>\n");
        html
    }
}

#[async_trait]
impl ReportSink for HtmlReportSink {
    fn create_run(&self, name: &str) -> Arc<dyn RunReporter> {
        let mut runs = self.runs.lock().expect("report buffer poisoned");
        runs.push(RunRecord {
            name: name.to_string(),
            events: Vec::new(),
        });
        Arc::new(HtmlRunReporter {
            runs: Arc::clone(&self.runs),
            index: runs.len() - 1,
        })
    }

    async fn flush(&self) -> Result<(), ReportError> {
        let html = self.render();
        tokio::fs::write(&self.path, html).await?;
        tracing::info!("Report written to {}", self.path.display());
        if self.open_on_flush {
            open_in_viewer(&self.path);
        }
        Ok(())
    }

    fn location(&self) -> Option<PathBuf> {
        Some(self.path.clone())
    }
}

struct HtmlRunReporter {
    runs: Arc<Mutex<Vec<RunRecord>>>,
    index: usize,
}

impl HtmlRunReporter {
    fn push(&self, event: RunEvent) {
        let mut runs = self.runs.lock().expect("report buffer poisoned");
        if let Some(record) = runs.get_mut(self.index) {
            record.events.push(event);
        }
    }
}

impl RunReporter for HtmlRunReporter {
    fn log(&self, message: &str) {
        self.push(RunEvent::Log(message.to_string()));
    }

    fn pass(&self, message: &str) {
        self.push(RunEvent::Pass(message.to_string()));
    }

    fn fail(&self, message: &str, screenshot: Option<&Path>) {
        self.push(RunEvent::Fail {
            message: message.to_string(),
            screenshot: screenshot.map(Path::to_path_buf),
        });
    }
}

/// Best-effort open of the written report in the platform viewer.
/// Fire-and-log: a missing opener must never fail the run.
fn open_in_viewer(path: &Path) {
    #[cfg(target_os = "macos")]
    let opener = "open";
    #[cfg(target_os = "windows")]
    let opener = "explorer";
    #[cfg(not(any(target_os = "macos", target_os = "windows")))]
    let opener = "xdg-open";

    if let Err(e) = std::process::Command::new(opener).arg(path).spawn() {
        tracing::debug!("Could not open report in viewer: {e}");
    }
}

fn escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}


#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn html_sink_writes_timestamped_file_with_events() {
        let dir = tempfile::tempdir().expect("tempdir");
        let sink = HtmlReportSink::new(dir.path(), false).expect("sink");

        let run = sink.create_run("Scenario 1: Valid Login Test - http://x");
        run.log("Navigating");
        run.pass("Login successful");
        run.fail("Oops & <broken>", Some(Path::new("/tmp/shot.png")));
        sink.flush().await.expect("flush");

        let path = sink.location().expect("location");
        assert!(path.starts_with(dir.path()));
        let html = std::fs::read_to_string(&path).expect("read report");
        assert!(html.contains("Scenario 1: Valid Login Test"));
        assert!(html.contains("Login successful"));
        assert!(html.contains("Oops &amp; &lt;broken&gt;"));
        assert!(html.contains("shot.png"));
    }

    #[tokio::test]
    async fn runs_are_kept_separate() {
        let dir = tempfile::tempdir().expect("tempdir");
        let sink = HtmlReportSink::new(dir.path(), false).expect("sink");

        let first = sink.create_run("first run");
        let second = sink.create_run("second run");
        first.pass("from first");
        second.fail("from second", None);
        sink.flush().await.expect("flush");

        let html = std::fs::read_to_string(sink.location().expect("location")).expect("read");
        let first_at = html.find("first run").expect("first section");
        let second_at = html.find("second run").expect("second section");
        assert!(first_at < second_at);
        assert!(html.contains("from first"));
        assert!(html.contains("from second"));
    }
}
