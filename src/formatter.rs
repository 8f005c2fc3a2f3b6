//! Renders a [`RunSummary`] into a structured text report with a trailing
//! recommendations block.
//!
//! Pure over the summary: the header timestamp comes from
//! `RunSummary::finished_at`, so formatting the same summary twice yields
//! byte-identical output.

use crate::classifier::analyze_failure;
use crate::orchestrator::RunSummary;

const RULE_WIDTH: usize = 70;

pub fn format_report(summary: &RunSummary) -> String {
    let mut report = String::new();

    report.push_str(&format!("╔{}╗\n", "═".repeat(RULE_WIDTH)));
    report.push_str(&format!(
        "║{:^width$}║\n",
        "QA TEST EXECUTION - DETAILED RESULTS",
        width = RULE_WIDTH
    ));
    report.push_str(&format!("╚{}╝\n\n", "═".repeat(RULE_WIDTH)));

    report.push_str(&format!(
        "SUMMARY: {} Passed | {} Failed | Total: {}\n",
        summary.passed_count,
        summary.failed_count,
        summary.results.len()
    ));
    if summary.skipped_count > 0 {
        report.push_str(&format!("         {} Skipped (run cancelled)\n", summary.skipped_count));
    }
    report.push_str(&format!(
        "Executed at: {}\n\n",
        summary.finished_at.format("%Y-%m-%d %H:%M:%S")
    ));
    report.push_str(&format!("{}\n\n", "=".repeat(RULE_WIDTH)));

    for (number, result) in summary.results.iter().enumerate() {
        let (status, rule) = if result.skipped {
            ("- SKIPPED", '─')
        } else if result.passed {
            ("✓ PASSED", '━')
        } else {
            ("✗ FAILED", '═')
        };

        report.push_str(&format!("TEST {}: {}\n", number + 1, result.name));
        report.push_str(&format!("{}\n", rule.to_string().repeat(RULE_WIDTH)));
        report.push_str(&format!("Status: {status}\n"));
        report.push_str(&format!("Description: {}\n", result.description));
        report.push_str(&format!(
            "Duration: {:.2} seconds\n\n",
            result.duration.as_secs_f64()
        ));

        if result.skipped {
            report.push_str(&format!("- Result: {}\n", result.reason));
        } else if result.passed {
            report.push_str(&format!("✓ Result: {}\n", result.reason));
            report.push_str("  All assertions passed. No issues detected.\n");
        } else {
            report.push_str(&format!("✗ Failure Reason: {}\n\n", result.reason));
            report.push_str("Detailed Analysis:\n");
            report.push_str(&analyze_failure(result));
        }

        report.push_str(&format!("\n{}\n\n", "─".repeat(RULE_WIDTH)));
    }

    report.push_str(&format!("{}\n\n", "=".repeat(RULE_WIDTH)));
    report.push_str("RECOMMENDATIONS:\n");
    report.push_str(&generate_recommendations(summary));

    report
}

/// Fixed remediation bullets keyed on which failure categories are present
/// anywhere in the summary. Checks are independent per category, not
/// mutually exclusive.
pub fn generate_recommendations(summary: &RunSummary) -> String {
    if !summary.results.is_empty() && summary.results.iter().all(|r| r.passed) {
        return concat!(
            "  ✓ All tests passed successfully!\n",
            "  ✓ Login functionality is working as expected\n",
            "  ✓ Security validations are in place\n"
        )
        .to_string();
    }

    let has = |marker: &str| summary.results.iter().any(|r| r.reason.contains(marker));
    let mut recommendations = String::new();

    if has("SECURITY") {
        recommendations.push_str("  CRITICAL: Address security vulnerabilities immediately\n");
        recommendations.push_str("     - Review authentication logic\n");
        recommendations.push_str("     - Implement proper credential validation\n");
    }
    if has("VALIDATION") {
        recommendations.push_str("  HIGH: Implement form validation\n");
        recommendations.push_str("     - Add required field checks\n");
        recommendations.push_str("     - Display user-friendly error messages\n");
    }
    if has("TIMEOUT") {
        recommendations.push_str("  MEDIUM: Investigate performance issues\n");
        recommendations.push_str("     - Check page load times\n");
        recommendations.push_str("     - Update test selectors if needed\n");
    }
    if has("ELEMENT NOT FOUND") {
        recommendations.push_str("  MEDIUM: Align selectors with the current page structure\n");
        recommendations.push_str("     - Verify the page under test is reachable\n");
        recommendations.push_str("     - Update element selectors after UI changes\n");
    }
    if recommendations.is_empty() {
        recommendations.push_str("  Review the failure details above and re-run the scenarios\n");
    }

    recommendations
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::orchestrator::ScenarioResult;
    use chrono::Utc;
    use std::time::Duration;

    fn result(name: &str, passed: bool, reason: &str) -> ScenarioResult {
        let now = Utc::now();
        ScenarioResult {
            name: name.to_string(),
            description: format!("description of {name}"),
            passed,
            skipped: false,
            raw_output: if passed {
                "Test Passed: ok".to_string()
            } else {
                "Test Failed: details".to_string()
            },
            reason: reason.to_string(),
            started_at: now,
            ended_at: now,
            duration: Duration::from_millis(1234),
        }
    }

    fn all_pass_summary() -> RunSummary {
        RunSummary::new(vec![
            result("Scenario 1: Valid Login Test", true, "All validations passed successfully"),
            result("Scenario 2: Invalid Login Test", true, "All validations passed successfully"),
            result(
                "Scenario 3: Empty Fields Validation Test",
                true,
                "All validations passed successfully",
            ),
        ])
    }

    #[test]
    fn all_pass_report_is_all_clear() {
        let report = format_report(&all_pass_summary());

        assert!(report.contains("3 Passed | 0 Failed | Total: 3"));
        assert!(report.contains("All tests passed successfully!"));
        assert!(!report.contains("Action Required"));
    }

    #[test]
    fn formatting_is_idempotent() {
        let summary = all_pass_summary();
        assert_eq!(format_report(&summary), format_report(&summary));

        let mixed = RunSummary::new(vec![
            result("Scenario 1: Valid Login Test", true, "All validations passed successfully"),
            result(
                "Scenario 2: Invalid Login Test",
                false,
                "SECURITY ISSUE: System accepted invalid credentials",
            ),
        ]);
        assert_eq!(format_report(&mixed), format_report(&mixed));
    }

    #[test]
    fn failure_blocks_carry_reason_analysis_and_recommendation() {
        let summary = RunSummary::new(vec![
            result(
                "Scenario 1: Valid Login Test",
                false,
                "TIMEOUT: Expected element did not appear within time limit",
            ),
            result(
                "Scenario 2: Invalid Login Test",
                false,
                "SECURITY ISSUE: System accepted invalid credentials",
            ),
        ]);
        let report = format_report(&summary);

        assert!(report.contains("✗ Failure Reason: TIMEOUT"));
        assert!(report.contains("✗ Failure Reason: SECURITY ISSUE"));
        assert!(report.contains("Detailed Analysis:"));
        assert!(report.contains("Action Required: Fix authentication validation immediately"));
        assert!(report.contains("CRITICAL: Address security vulnerabilities immediately"));
        assert!(report.contains("MEDIUM: Investigate performance issues"));
        // Categories that are not present contribute nothing.
        assert!(!report.contains("HIGH: Implement form validation"));
    }

    #[test]
    fn recommendation_checks_are_independent() {
        let summary = RunSummary::new(vec![
            result("a", false, "VALIDATION ISSUE: Form allowed submission with empty fields"),
            result(
                "b",
                false,
                "ELEMENT NOT FOUND: Required page element is missing or has changed",
            ),
        ]);
        let recommendations = generate_recommendations(&summary);

        assert!(recommendations.contains("HIGH: Implement form validation"));
        assert!(recommendations.contains("MEDIUM: Align selectors"));
        assert!(!recommendations.contains("CRITICAL"));
    }

    #[test]
    fn skipped_results_render_a_one_line_note() {
        let mut skipped = result("Scenario 3: Empty Fields Validation Test", false, "Skipped: run cancelled");
        skipped.skipped = true;
        let summary = RunSummary::new(vec![
            result("Scenario 1: Valid Login Test", true, "All validations passed successfully"),
            skipped,
        ]);
        let report = format_report(&summary);

        assert!(report.contains("Status: - SKIPPED"));
        assert!(report.contains("- Result: Skipped: run cancelled"));
        assert!(report.contains("1 Skipped"));
        // A skipped scenario is not a pass, so no all-clear block.
        assert!(!report.contains("All tests passed successfully!"));
    }

    #[test]
    fn duration_renders_with_two_decimals() {
        let report = format_report(&all_pass_summary());
        assert!(report.contains("Duration: 1.23 seconds"));
    }
}
