//! Scenario orchestrator: runs the three fixed scenarios in order, wraps
//! each in timing instrumentation, classifies failures and aggregates the
//! results. Scenario-level faults are caught here and converted into failed
//! results; nothing propagates out of [`run_all`].

use crate::classifier::extract_failure_reason;
use crate::scenarios::{
    EmptyFieldsScenario, InvalidLoginScenario, LoginScenario, PASS_MARKER, ScenarioCx,
    ValidLoginScenario,
};
use crate::{Probe, Result};
use chrono::{DateTime, Utc};
use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;

/// Delay inserted between scenarios so external page/session state can
/// settle. A stabilization heuristic, not a correctness requirement.
pub const INTER_SCENARIO_DELAY: Duration = Duration::from_secs(2);

/// Credentials and target for one orchestrated run.
#[derive(Debug, Clone)]
pub struct RunParams {
    pub url: String,
    pub valid_username: String,
    pub valid_password: String,
    pub invalid_username: String,
    pub invalid_password: String,
}

impl RunParams {
    pub fn new(url: &str, valid_username: &str, valid_password: &str) -> Self {
        Self {
            url: url.to_string(),
            valid_username: valid_username.to_string(),
            valid_password: valid_password.to_string(),
            invalid_username: "wronguser".to_string(),
            invalid_password: "wrongpass".to_string(),
        }
    }

    pub fn with_invalid_credentials(mut self, username: &str, password: &str) -> Self {
        self.invalid_username = username.to_string();
        self.invalid_password = password.to_string();
        self
    }
}

/// Outcome of one scenario. Created once when the scenario concludes; no
/// field is ever recomputed afterwards.
#[derive(Debug, Clone)]
pub struct ScenarioResult {
    pub name: String,
    pub description: String,
    pub passed: bool,
    /// The run was cancelled before this scenario started.
    pub skipped: bool,
    pub raw_output: String,
    pub reason: String,
    pub started_at: DateTime<Utc>,
    pub ended_at: DateTime<Utc>,
    pub duration: Duration,
}

impl ScenarioResult {
    fn skipped(scenario: &dyn LoginScenario, at: DateTime<Utc>) -> Self {
        Self {
            name: scenario.name().to_string(),
            description: scenario.description().to_string(),
            passed: false,
            skipped: true,
            raw_output: "Scenario skipped: the run was cancelled before it started".to_string(),
            reason: "Skipped: run cancelled".to_string(),
            started_at: at,
            ended_at: at,
            duration: Duration::ZERO,
        }
    }
}

/// Ordered results of one orchestrated run plus aggregate counts.
#[derive(Debug, Clone)]
pub struct RunSummary {
    pub results: Vec<ScenarioResult>,
    pub passed_count: usize,
    pub failed_count: usize,
    pub skipped_count: usize,
    pub finished_at: DateTime<Utc>,
}

impl RunSummary {
    pub fn new(results: Vec<ScenarioResult>) -> Self {
        let passed_count = results.iter().filter(|r| r.passed).count();
        let skipped_count = results.iter().filter(|r| r.skipped).count();
        let failed_count = results.iter().filter(|r| !r.passed && !r.skipped).count();
        Self {
            results,
            passed_count,
            failed_count,
            skipped_count,
            finished_at: Utc::now(),
        }
    }
}

/// Run a single scenario against its own browser session and report run,
/// flushing the report sink afterwards. Used by the single-scenario tools.
pub async fn run_scenario(
    probe: &Probe,
    scenario: &dyn LoginScenario,
    url: &str,
    username: &str,
    password: &str,
) -> Result<String> {
    let run = probe.sink.create_run(&format!("{} - {}", scenario.name(), url));
    let cancel = probe.shutdown_token().child_token();
    let cx = ScenarioCx {
        launcher: probe.launcher.as_ref(),
        selectors: &probe.config.selectors,
        url,
        username,
        password,
        report: run.as_ref(),
        screenshots_dir: &probe.config.screenshots_dir,
        cancel: &cancel,
    };
    let outcome = scenario.run(&cx).await;
    probe.sink.flush().await?;
    outcome
}

/// Run all scenarios in fixed order and aggregate a [`RunSummary`].
///
/// A fatal fault in one scenario never aborts the run; cancellation fails
/// the in-flight scenario and marks every scenario after it as skipped.
pub async fn run_all(probe: &Probe, params: &RunParams, cancel: &CancellationToken) -> RunSummary {
    let scenarios: [(&dyn LoginScenario, &str, &str); 3] = [
        (
            &ValidLoginScenario as &dyn LoginScenario,
            params.valid_username.as_str(),
            params.valid_password.as_str(),
        ),
        (
            &InvalidLoginScenario as &dyn LoginScenario,
            params.invalid_username.as_str(),
            params.invalid_password.as_str(),
        ),
        (&EmptyFieldsScenario as &dyn LoginScenario, "", ""),
    ];

    let mut results = Vec::with_capacity(scenarios.len());
    let total = scenarios.len();

    for (index, (scenario, username, password)) in scenarios.into_iter().enumerate() {
        if cancel.is_cancelled() {
            tracing::warn!("- Skipping {}: run cancelled", scenario.name());
            results.push(ScenarioResult::skipped(scenario, Utc::now()));
            continue;
        }

        tracing::info!("=== Running {} ===", scenario.name());
        let run = probe.sink.create_run(&format!("{} - {}", scenario.name(), params.url));
        let started_at = Utc::now();
        let timer = Instant::now();

        let cx = ScenarioCx {
            launcher: probe.launcher.as_ref(),
            selectors: &probe.config.selectors,
            url: &params.url,
            username,
            password,
            report: run.as_ref(),
            screenshots_dir: &probe.config.screenshots_dir,
            cancel,
        };
        let outcome = scenario.run(&cx).await;

        let duration = timer.elapsed();
        let ended_at = Utc::now();

        let result = match outcome {
            Ok(raw_output) => {
                let passed = raw_output.contains(PASS_MARKER);
                let reason = if passed {
                    "All validations passed successfully".to_string()
                } else if let Some(fault) = raw_output.strip_prefix("Test Error: ") {
                    // Scenario-handled faults keep their message in the
                    // reason, not only in the raw output.
                    format!("{} ({fault})", extract_failure_reason(&raw_output))
                } else {
                    extract_failure_reason(&raw_output).to_string()
                };
                ScenarioResult {
                    name: scenario.name().to_string(),
                    description: scenario.description().to_string(),
                    passed,
                    skipped: false,
                    raw_output,
                    reason,
                    started_at,
                    ended_at,
                    duration,
                }
            }
            Err(e) => {
                tracing::error!("✗ {} raised an unhandled fault: {}", scenario.name(), e);
                ScenarioResult {
                    name: scenario.name().to_string(),
                    description: scenario.description().to_string(),
                    passed: false,
                    skipped: false,
                    raw_output: format!("{e:?}"),
                    reason: format!("Exception occurred: {e}"),
                    started_at,
                    ended_at,
                    duration,
                }
            }
        };

        let status = if result.passed { "✓" } else { "✗" };
        tracing::info!(
            "{} {} finished in {:.2}s - {}",
            status,
            result.name,
            result.duration.as_secs_f64(),
            result.reason
        );
        results.push(result);

        // Give external page/session state breathing room between scenarios.
        if index + 1 < total {
            tokio::select! {
                _ = tokio::time::sleep(INTER_SCENARIO_DELAY) => {}
                _ = cancel.cancelled() => {}
            }
        }
    }

    let summary = RunSummary::new(results);
    tracing::info!(
        "=== Run complete: {} passed, {} failed, {} skipped ===",
        summary.passed_count,
        summary.failed_count,
        summary.skipped_count
    );

    if let Err(e) = probe.sink.flush().await {
        tracing::warn!("Failed to flush report sink: {e}");
    }

    summary
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Probe;
    use crate::browser::testing::{FaultAt, MockBehavior, MockLauncher};
    use crate::report::testing::{RecordedEvent, RecordingSink};
    use std::sync::Arc;

    fn probe_with(behavior: MockBehavior) -> (Probe, Arc<RecordingSink>) {
        let sink = Arc::new(RecordingSink::default());
        let probe = Probe::with_parts(
            Arc::new(MockLauncher::new(behavior)),
            Arc::clone(&sink) as Arc<dyn crate::report::ReportSink>,
        );
        (probe, sink)
    }

    fn params() -> RunParams {
        RunParams::new("http://login.test/", "admin", "secret")
    }

    #[tokio::test(start_paused = true)]
    async fn all_scenarios_pass_against_a_well_behaved_page() {
        let (probe, sink) = probe_with(MockBehavior {
            post_login_marker_appears: true,
            error_indicator_visible: true,
            ..Default::default()
        });

        let summary = run_all(&probe, &params(), &CancellationToken::new()).await;

        assert_eq!(summary.results.len(), 3);
        assert_eq!(summary.passed_count, 3);
        assert_eq!(summary.failed_count, 0);
        assert_eq!(summary.skipped_count, 0);
        for result in &summary.results {
            assert!(result.passed);
            assert_eq!(result.reason, "All validations passed successfully");
            assert!(result.ended_at >= result.started_at);
        }
        // One run per scenario, in order.
        let runs: Vec<_> = sink
            .events()
            .into_iter()
            .filter(|e| matches!(e, RecordedEvent::Run(_)))
            .collect();
        assert_eq!(runs.len(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn broken_page_yields_classified_failures() {
        // Dashboard never appears, no error indicator: scenario 1 times out,
        // scenarios 2 and 3 see their negative markers accepted.
        let (probe, _sink) = probe_with(MockBehavior::default());

        let summary = run_all(&probe, &params(), &CancellationToken::new()).await;

        assert_eq!(summary.passed_count, 0);
        assert_eq!(summary.failed_count, 3);
        assert_eq!(summary.passed_count + summary.failed_count, summary.results.len());

        assert!(summary.results[0].reason.starts_with("TIMEOUT"));
        assert!(summary.results[1].reason.starts_with("SECURITY ISSUE"));
        assert!(summary.results[2].reason.starts_with("VALIDATION ISSUE"));
        for result in &summary.results {
            assert!(!result.reason.is_empty());
            assert!(!result.raw_output.is_empty());
        }
    }

    #[tokio::test(start_paused = true)]
    async fn launch_fault_is_contained_and_run_continues() {
        let (probe, _sink) = probe_with(MockBehavior {
            fault_at: Some(FaultAt::Launch),
            ..Default::default()
        });

        let summary = run_all(&probe, &params(), &CancellationToken::new()).await;

        // Every scenario still produced a result.
        assert_eq!(summary.results.len(), 3);
        assert_eq!(summary.failed_count, 3);
        for result in &summary.results {
            assert!(!result.passed);
            assert!(!result.skipped);
            assert!(result.reason.starts_with("Exception occurred:"));
            assert!(result.raw_output.contains("browser crashed at launch"));
        }
    }

    #[tokio::test(start_paused = true)]
    async fn empty_fields_fault_message_survives_into_the_reason() {
        let (probe, _sink) = probe_with(MockBehavior {
            fault_at: Some(FaultAt::Navigate),
            ..Default::default()
        });

        let summary = run_all(&probe, &params(), &CancellationToken::new()).await;

        // Navigation crashes every scenario; the invalid-login one converts
        // its fault to a pass, the empty-fields one must not.
        let empty_fields = &summary.results[2];
        assert!(!empty_fields.passed);
        assert!(
            empty_fields.reason.contains("browser crashed during Navigate"),
            "reason does not carry the fault message: {:?}",
            empty_fields.reason
        );
        assert!(empty_fields.raw_output.starts_with("Test Error:"));
        assert!(summary.results[1].passed);
    }

    #[tokio::test(start_paused = true)]
    async fn pre_cancelled_run_skips_everything() {
        let (probe, _sink) = probe_with(MockBehavior::default());
        let cancel = CancellationToken::new();
        cancel.cancel();

        let summary = run_all(&probe, &params(), &cancel).await;

        assert_eq!(summary.results.len(), 3);
        assert_eq!(summary.skipped_count, 3);
        assert_eq!(summary.passed_count, 0);
        assert_eq!(summary.failed_count, 0);
        for result in &summary.results {
            assert!(result.skipped);
            assert!(result.reason.contains("Skipped"));
        }
    }

    #[tokio::test(start_paused = true)]
    async fn mid_run_cancellation_fails_current_and_skips_rest() {
        let (probe, _sink) = probe_with(MockBehavior {
            wait_hangs: true,
            ..Default::default()
        });
        let cancel = CancellationToken::new();
        let trigger = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_secs(1)).await;
            trigger.cancel();
        });

        let summary = run_all(&probe, &params(), &cancel).await;

        assert_eq!(summary.results.len(), 3);
        assert!(!summary.results[0].passed);
        assert!(!summary.results[0].skipped);
        assert!(summary.results[0].reason.starts_with("Exception occurred:"));
        assert!(summary.results[1].skipped);
        assert!(summary.results[2].skipped);
        assert_eq!(summary.passed_count + summary.failed_count, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn single_scenario_runner_flushes_the_sink() {
        let (probe, sink) = probe_with(MockBehavior {
            post_login_marker_appears: true,
            ..Default::default()
        });

        let outcome = run_scenario(
            &probe,
            &crate::scenarios::ValidLoginScenario,
            "http://login.test/",
            "admin",
            "secret",
        )
        .await
        .expect("scenario");

        assert!(outcome.contains(PASS_MARKER));
        assert_eq!(*sink.flushes.lock().unwrap(), 1);
    }

    #[test]
    fn run_params_defaults_invalid_credentials() {
        let params = RunParams::new("http://x/", "u", "p");
        assert_eq!(params.invalid_username, "wronguser");
        assert_eq!(params.invalid_password, "wrongpass");

        let params = params.with_invalid_credentials("bad", "creds");
        assert_eq!(params.invalid_username, "bad");
        assert_eq!(params.invalid_password, "creds");
    }
}
