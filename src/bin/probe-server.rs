//! Stdio tool server: reads line-delimited JSON requests
//! (`{"tool": "...", "args": {...}}`) from stdin and writes one JSON reply
//! per line to stdout. All logging goes to stderr and the log files.

use clap::Parser;
use loginprobe::{Probe, ProbeConfig, tools};
use serde::Deserialize;
use serde_json::{Value, json};
use std::path::PathBuf;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};

/// Login UI test runner, exposed as remotely-invokable tools over stdio.
#[derive(Parser, Debug)]
#[clap(author, version, about)]
struct Args {
    /// Directory for reports and screenshots
    #[clap(long, value_name = "PATH", default_value = "./loginprobe-data")]
    data_dir: PathBuf,

    /// Directory for application logs
    #[clap(long, value_name = "PATH", default_value = "./loginprobe-logs")]
    logs_dir: PathBuf,

    /// WebDriver endpoint (chromedriver, geckodriver)
    #[clap(long, value_name = "URL", default_value = "http://localhost:9515")]
    webdriver_url: String,

    /// Run the browser with a visible window
    #[clap(long)]
    headed: bool,

    /// Open the HTML report in the platform viewer after each run
    #[clap(long)]
    open_report: bool,
}

#[derive(Deserialize)]
struct Request {
    tool: String,
    #[serde(default)]
    args: Value,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let mut config = ProbeConfig::new(&args.data_dir, &args.logs_dir);
    config.webdriver_url = args.webdriver_url;
    config.headless = !args.headed;
    config.open_report = args.open_report;

    let probe = match Probe::initialize(config).await {
        Ok(probe) => probe,
        Err(err) => {
            eprintln!("Failed to initialize loginprobe: {err}");
            std::process::exit(1);
        }
    };

    let shutdown = probe.shutdown_token();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("Shutdown signal received, cancelling in-flight runs");
            shutdown.cancel();
        }
    });

    serve(probe).await
}

async fn serve(probe: Probe) -> anyhow::Result<()> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdout = tokio::io::stdout();

    while let Some(line) = lines.next_line().await? {
        if line.trim().is_empty() {
            continue;
        }
        let reply = handle_line(&probe, &line).await;
        stdout.write_all(reply.to_string().as_bytes()).await?;
        stdout.write_all(b"\n").await?;
        stdout.flush().await?;

        if probe.shutdown_token().is_cancelled() {
            break;
        }
    }

    tracing::info!("Input closed, shutting down");
    Ok(())
}

async fn handle_line(probe: &Probe, line: &str) -> Value {
    match serde_json::from_str::<Request>(line) {
        Ok(request) => match tools::dispatch(probe, &request.tool, &request.args).await {
            Ok(result) => json!({ "ok": true, "result": result }),
            Err(err) => json!({ "ok": false, "error": err.to_string() }),
        },
        Err(err) => json!({ "ok": false, "error": format!("invalid request: {err}") }),
    }
}
