//! Turns unstructured scenario output into a stable failure category and a
//! multi-line remediation narrative.
//!
//! Classification is a pure, case-sensitive substring match over the raw
//! output, checked in a fixed precedence order: first match wins, no
//! backtracking.

use crate::orchestrator::ScenarioResult;

/// Coarse failure category assigned to a failing scenario. Never persisted;
/// exists only to back the reason labels and the remediation narratives.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureCategory {
    SecurityIssue,
    ValidationIssue,
    Timeout,
    ElementNotFound,
    Unclassified,
}

impl FailureCategory {
    /// Classify raw scenario output. Order-sensitive: the security and
    /// validation markers outrank the generic timeout/selector markers, so
    /// output carrying both is always attributed to the more specific cause.
    pub fn classify(output: &str) -> Self {
        if output.contains("Invalid credentials were accepted") {
            Self::SecurityIssue
        } else if output.contains("Empty fields were not validated") {
            Self::ValidationIssue
        } else if output.contains("timeout") {
            Self::Timeout
        } else if output.contains("selector") {
            Self::ElementNotFound
        } else {
            Self::Unclassified
        }
    }

    /// Human-readable reason label for this category.
    pub fn label(&self) -> &'static str {
        match self {
            Self::SecurityIssue => "SECURITY ISSUE: System accepted invalid credentials",
            Self::ValidationIssue => "VALIDATION ISSUE: Form allowed submission with empty fields",
            Self::Timeout => "TIMEOUT: Expected element did not appear within time limit",
            Self::ElementNotFound => {
                "ELEMENT NOT FOUND: Required page element is missing or has changed"
            }
            Self::Unclassified => "Test failed - check output for details",
        }
    }
}

/// Map raw scenario output to its classified reason label.
pub fn extract_failure_reason(output: &str) -> &'static str {
    FailureCategory::classify(output).label()
}

/// Expand a failing result's reason into a fixed four-line analysis
/// (symptom, likely cause, impact, required action).
///
/// This is a second classification pass over the `reason` string, not the
/// raw output; a reason that matches no known category falls through to
/// echoing the raw output with a generic hint. Never panics, never empty.
pub fn analyze_failure(result: &ScenarioResult) -> String {
    let mut analysis = String::new();

    if result.reason.contains("SECURITY ISSUE") {
        analysis.push_str("  • Invalid credentials were accepted by the system\n");
        analysis.push_str("  • This is a critical security vulnerability\n");
        analysis.push_str("  • Impact: Unauthorized access possible\n");
        analysis.push_str("  • Action Required: Fix authentication validation immediately\n");
    } else if result.reason.contains("VALIDATION ISSUE") {
        analysis.push_str("  • Form submitted without required field values\n");
        analysis.push_str("  • Client-side validation is missing or bypassed\n");
        analysis.push_str("  • Impact: Poor user experience, potential errors\n");
        analysis.push_str("  • Action Required: Implement proper field validation\n");
    } else if result.reason.contains("TIMEOUT") {
        analysis.push_str("  • Expected page element did not load within timeout period\n");
        analysis.push_str("  • Possible causes: Slow server response, changed selectors\n");
        analysis.push_str("  • Impact: Test cannot verify functionality\n");
        analysis.push_str("  • Action Required: Check server performance and element selectors\n");
    } else if result.reason.contains("ELEMENT NOT FOUND") {
        analysis.push_str("  • Required page element could not be located\n");
        analysis.push_str("  • Possible causes: UI changes, incorrect selector, page not loaded\n");
        analysis.push_str("  • Impact: Cannot complete test execution\n");
        analysis.push_str("  • Action Required: Update selectors or verify page structure\n");
    } else {
        analysis.push_str(&format!("  • {}\n", result.raw_output));
        analysis.push_str("  • Review screenshots and logs for more details\n");
    }

    analysis
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use std::time::Duration;

    fn failed_result(reason: &str, raw_output: &str) -> ScenarioResult {
        let now = Utc::now();
        ScenarioResult {
            name: "Scenario X".to_string(),
            description: "test fixture".to_string(),
            passed: false,
            skipped: false,
            raw_output: raw_output.to_string(),
            reason: reason.to_string(),
            started_at: now,
            ended_at: now,
            duration: Duration::from_millis(10),
        }
    }

    #[test]
    fn security_marker_wins_first() {
        let reason = extract_failure_reason("Test Failed: Invalid credentials were accepted");
        assert_eq!(reason, "SECURITY ISSUE: System accepted invalid credentials");
    }

    #[test]
    fn security_outranks_timeout() {
        // Both markers present: precedence picks the security label.
        let reason =
            extract_failure_reason("Invalid credentials were accepted after a timeout of 3s");
        assert_eq!(reason, "SECURITY ISSUE: System accepted invalid credentials");
    }

    #[test]
    fn validation_marker_matches() {
        let reason = extract_failure_reason("Test Failed: Empty fields were not validated");
        assert_eq!(
            reason,
            "VALIDATION ISSUE: Form allowed submission with empty fields"
        );
    }

    #[test]
    fn timeout_marker_matches() {
        let reason = extract_failure_reason("Test Failed: timeout waiting for #grid-Gather");
        assert_eq!(
            reason,
            "TIMEOUT: Expected element did not appear within time limit"
        );
    }

    #[test]
    fn selector_text_maps_to_element_not_found() {
        let reason = extract_failure_reason("Test Error: selector not found on page");
        assert_eq!(
            reason,
            "ELEMENT NOT FOUND: Required page element is missing or has changed"
        );
    }

    #[test]
    fn timeout_outranks_selector() {
        let reason = extract_failure_reason("timeout after 10000ms waiting for selector #x");
        assert_eq!(
            reason,
            "TIMEOUT: Expected element did not appear within time limit"
        );
    }

    #[test]
    fn unmatched_output_falls_back() {
        assert_eq!(
            extract_failure_reason("something entirely different"),
            "Test failed - check output for details"
        );
        assert_eq!(extract_failure_reason(""), "Test failed - check output for details");
    }

    #[test]
    fn classification_is_case_sensitive() {
        // Uppercase "TIMEOUT" is not the lowercase marker.
        assert_eq!(
            FailureCategory::classify("TIMEOUT HAPPENED"),
            FailureCategory::Unclassified
        );
    }

    #[test]
    fn every_label_is_non_empty() {
        for category in [
            FailureCategory::SecurityIssue,
            FailureCategory::ValidationIssue,
            FailureCategory::Timeout,
            FailureCategory::ElementNotFound,
            FailureCategory::Unclassified,
        ] {
            assert!(!category.label().is_empty());
        }
    }

    #[test]
    fn analyze_failure_covers_each_category() {
        let cases = [
            ("SECURITY ISSUE: System accepted invalid credentials", "critical security"),
            (
                "VALIDATION ISSUE: Form allowed submission with empty fields",
                "field validation",
            ),
            (
                "TIMEOUT: Expected element did not appear within time limit",
                "timeout period",
            ),
            (
                "ELEMENT NOT FOUND: Required page element is missing or has changed",
                "could not be located",
            ),
        ];
        for (reason, expected_fragment) in cases {
            let analysis = analyze_failure(&failed_result(reason, "raw output"));
            assert!(
                analysis.contains(expected_fragment),
                "analysis for {reason:?} missing {expected_fragment:?}: {analysis}"
            );
            assert_eq!(analysis.lines().count(), 4);
        }
    }

    #[test]
    fn analyze_failure_tolerates_unknown_reason() {
        let analysis = analyze_failure(&failed_result("??", "the raw diagnostic text"));
        assert!(analysis.contains("the raw diagnostic text"));
        assert!(analysis.contains("Review screenshots and logs"));
        assert!(!analysis.is_empty());
    }
}
