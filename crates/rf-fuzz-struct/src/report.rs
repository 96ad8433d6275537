//! Report generation for fuzzing results

use crate::harness::{FuzzResult, InputSource};
use crate::scalar::Scalar;
use crate::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// How many failures each target lists in text output
const TEXT_FAILURES: usize = 5;

/// How many failures each target lists in markdown output
const MARKDOWN_FAILURES: usize = 10;

/// Fuzzing report for multiple targets
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FuzzReport {
    pub title: String,

    pub timestamp: DateTime<Utc>,

    /// Individual target results
    pub results: Vec<TargetResult>,

    /// Total statistics
    pub summary: FuzzSummary,
}

/// Result for a single fuzz target
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TargetResult {
    /// Record type name
    pub name: String,

    /// Scalars per input
    pub schema_len: usize,

    pub result: FuzzResult,
}

/// Summary statistics
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FuzzSummary {
    pub total_targets: usize,
    pub passed_targets: usize,
    pub failed_targets: usize,
    pub total_iterations: usize,
    pub total_failures: usize,
    pub total_panics: usize,
    pub total_duration_ms: u64,
}

/// Report output format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportFormat {
    Text,
    Json,
    Markdown,
}

impl FuzzReport {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            timestamp: Utc::now(),
            results: Vec::new(),
            summary: FuzzSummary::default(),
        }
    }

    /// Add a target result, keyed by its record type
    pub fn add_result(&mut self, result: FuzzResult) {
        self.summary.total_targets += 1;
        if result.passed {
            self.summary.passed_targets += 1;
        } else {
            self.summary.failed_targets += 1;
        }
        self.summary.total_iterations += result.iterations;
        self.summary.total_failures += result.failures;
        self.summary.total_panics += result.panics;
        self.summary.total_duration_ms += result.duration_ms;

        self.results.push(TargetResult {
            name: result.target.clone(),
            schema_len: result.schema_len,
            result,
        });
    }

    pub fn all_passed(&self) -> bool {
        self.summary.failed_targets == 0
    }

    fn timestamp_str(&self) -> String {
        self.timestamp.format("%Y-%m-%dT%H:%M:%SZ").to_string()
    }

    /// Generate text report
    pub fn to_text(&self) -> String {
        let mut output = String::new();
        let s = &self.summary;

        output.push_str(&format!("{}\n", self.title));
        output.push_str(&format!("{}\n\n", "=".repeat(self.title.chars().count())));
        output.push_str(&format!("Timestamp: {}\n\n", self.timestamp_str()));

        output.push_str("Summary:\n");
        output.push_str(&format!(
            "  Targets: {} total, {} passed, {} failed\n",
            s.total_targets, s.passed_targets, s.failed_targets
        ));
        output.push_str(&format!(
            "  Iterations: {} total, {} failures, {} panics\n",
            s.total_iterations, s.total_failures, s.total_panics
        ));
        output.push_str(&format!("  Duration: {} ms\n\n", s.total_duration_ms));

        output.push_str("Results:\n");
        output.push_str(&format!("{}\n", "-".repeat(80)));

        for target in &self.results {
            let r = &target.result;
            let status = if r.passed { "PASS" } else { "FAIL" };
            output.push_str(&format!(
                "[{}] {} ({} scalars, seed {})\n",
                status, target.name, target.schema_len, r.seed
            ));
            output.push_str(&format!("    {}\n", r.summary()));

            if !r.failure_details.is_empty() {
                output.push_str("    Failures:\n");
                for (i, failure) in r.failure_details.iter().take(TEXT_FAILURES).enumerate() {
                    output.push_str(&format!(
                        "      {}. {:?} ({}): {}\n",
                        i + 1,
                        failure.failure_type,
                        source_label(failure.source),
                        failure.description
                    ));
                    output.push_str(&format!("         Input: {}\n", render_input(&failure.input)));
                }
                if r.failure_details.len() > TEXT_FAILURES {
                    output.push_str(&format!(
                        "      ... and {} more failures\n",
                        r.failure_details.len() - TEXT_FAILURES
                    ));
                }
            }
            output.push('\n');
        }

        output
    }

    /// Generate JSON report
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Generate markdown report
    pub fn to_markdown(&self) -> String {
        let mut output = String::new();
        let s = &self.summary;

        output.push_str(&format!("# {}\n\n", self.title));
        output.push_str(&format!("**Timestamp:** {}\n\n", self.timestamp_str()));

        let status = if self.all_passed() { "✅ PASS" } else { "❌ FAIL" };
        output.push_str(&format!("## Status: {}\n\n", status));

        output.push_str("## Summary\n\n");
        output.push_str("| Metric | Value |\n");
        output.push_str("|--------|-------|\n");
        output.push_str(&format!("| Total Targets | {} |\n", s.total_targets));
        output.push_str(&format!("| Passed | {} |\n", s.passed_targets));
        output.push_str(&format!("| Failed | {} |\n", s.failed_targets));
        output.push_str(&format!("| Total Iterations | {} |\n", s.total_iterations));
        output.push_str(&format!("| Total Failures | {} |\n", s.total_failures));
        output.push_str(&format!("| Total Panics | {} |\n", s.total_panics));
        output.push_str(&format!("| Duration | {} ms |\n\n", s.total_duration_ms));

        output.push_str("## Results\n\n");
        output.push_str("| Target | Scalars | Status | Iterations | Failures | Pass Rate |\n");
        output.push_str("|--------|---------|--------|------------|----------|-----------|\n");
        for target in &self.results {
            let r = &target.result;
            output.push_str(&format!(
                "| {} | {} | {} | {} | {} | {:.1}% |\n",
                target.name,
                target.schema_len,
                if r.passed { "✅" } else { "❌" },
                r.iterations,
                r.failures,
                r.pass_rate() * 100.0
            ));
        }
        output.push('\n');

        let failed: Vec<_> = self.results.iter().filter(|t| !t.result.passed).collect();
        if !failed.is_empty() {
            output.push_str("## Failed Targets\n\n");
            for target in failed {
                output.push_str(&format!("### {}\n\n", target.name));
                output.push_str(&format!("Seed: `{}`\n\n", target.result.seed));
                for failure in target.result.failure_details.iter().take(MARKDOWN_FAILURES) {
                    output.push_str(&format!(
                        "- **{:?}** at iteration {} ({}): {}\n",
                        failure.failure_type,
                        failure.iteration,
                        source_label(failure.source),
                        failure.description
                    ));
                    output.push_str(&format!("  - Input: `{}`\n", render_input(&failure.input)));
                }
                output.push('\n');
            }
        }

        output
    }

    /// Render in `format`
    pub fn render(&self, format: ReportFormat) -> Result<String> {
        match format {
            ReportFormat::Text => Ok(self.to_text()),
            ReportFormat::Json => self.to_json(),
            ReportFormat::Markdown => Ok(self.to_markdown()),
        }
    }

    /// Save report to file
    pub fn save(&self, path: impl AsRef<Path>, format: ReportFormat) -> Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, self.render(format)?)?;
        log::info!("Wrote {:?} report to {}", format, path.display());
        Ok(())
    }
}

fn source_label(source: InputSource) -> &'static str {
    match source {
        InputSource::Corpus => "corpus",
        InputSource::Mutated => "mutated",
        InputSource::Generated => "generated",
    }
}

/// `[a, b, c]`, shortened when long
fn render_input(input: &[Scalar]) -> String {
    const MAX_CHARS: usize = 160;

    let joined = input.iter().map(Scalar::to_string).collect::<Vec<_>>().join(", ");
    if joined.chars().count() > MAX_CHARS {
        let cut: String = joined.chars().take(MAX_CHARS).collect();
        format!("[{cut}...]")
    } else {
        format!("[{joined}]")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::harness::{FailureType, FuzzFailure};

    fn make_test_result(target: &str, passed: bool, failures: usize) -> FuzzResult {
        let failure_details = (0..failures)
            .map(|i| FuzzFailure {
                iteration: i,
                failure_type: FailureType::Panic,
                source: InputSource::Generated,
                description: format!("boom {i}"),
                input: vec![Scalar::Bool(true), Scalar::from("x")],
            })
            .collect();

        FuzzResult {
            target: target.to_string(),
            schema_len: 2,
            iterations: 100,
            successes: 100 - failures,
            failures,
            panics: failures,
            corpus_replayed: 0,
            duration_ms: 50,
            seed: 42,
            failure_details,
            passed,
        }
    }

    #[test]
    fn test_report_creation() {
        let mut report = FuzzReport::new("Test Report");
        report.add_result(make_test_result("Alpha", true, 0));
        report.add_result(make_test_result("Beta", false, 7));

        assert_eq!(report.summary.total_targets, 2);
        assert_eq!(report.summary.passed_targets, 1);
        assert_eq!(report.summary.failed_targets, 1);
        assert_eq!(report.summary.total_failures, 7);
        assert_eq!(report.results[1].name, "Beta");
        assert!(!report.all_passed());
    }

    #[test]
    fn test_text_report() {
        let mut report = FuzzReport::new("Test Report");
        report.add_result(make_test_result("Alpha", true, 0));
        report.add_result(make_test_result("Beta", false, 7));

        let text = report.to_text();
        assert!(text.contains("Test Report"));
        assert!(text.contains("[PASS] Alpha (2 scalars, seed 42)"));
        assert!(text.contains("[FAIL] Beta"));
        assert!(text.contains("Input: [true, \"x\"]"));
        assert!(text.contains("... and 2 more failures"));
    }

    #[test]
    fn test_text_report_layout() {
        let mut report = FuzzReport::new("Layout");
        report.add_result(make_test_result("Beta", false, 1));

        let text = report.to_text();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "Layout");
        assert_eq!(lines[1], "======");
        assert_eq!(lines[2], "");
        assert!(lines[3].starts_with("Timestamp: "));
        assert_eq!(lines[5], "Summary:");
        assert_eq!(lines[6], "  Targets: 1 total, 0 passed, 1 failed");
        assert_eq!(lines[7], "  Iterations: 100 total, 1 failures, 1 panics");
        assert!(lines.contains(&"      1. Panic (generated): boom 0"));
        assert!(text.ends_with("\n\n"));
    }

    #[test]
    fn test_markdown_report() {
        let mut report = FuzzReport::new("Test Report");
        report.add_result(make_test_result("Beta", false, 1));

        let md = report.to_markdown();
        assert!(md.contains("# Test Report"));
        assert!(md.contains("| Target |"));
        assert!(md.contains("### Beta"));
        assert!(md.contains("(generated): boom 0"));
    }

    #[test]
    fn test_json_round_trip() {
        let mut report = FuzzReport::new("Json");
        report.add_result(make_test_result("Beta", false, 1));

        let json = report.to_json().unwrap();
        let back: FuzzReport = serde_json::from_str(&json).unwrap();
        assert_eq!(back.results[0].result.failure_details[0].input.len(), 2);
        assert_eq!(back.timestamp, report.timestamp);
    }

    #[test]
    fn test_save() {
        let dir = tempfile::tempdir().unwrap();
        let mut report = FuzzReport::new("Saved");
        report.add_result(make_test_result("Alpha", true, 0));

        let path = dir.path().join("reports").join("fuzz.md");
        report.save(&path, ReportFormat::Markdown).unwrap();
        let content = fs::read_to_string(&path).unwrap();
        assert!(content.starts_with("# Saved"));
    }

    #[test]
    fn test_long_input_is_shortened() {
        let input = vec![Scalar::from("y".repeat(500))];
        let rendered = render_input(&input);
        assert!(rendered.ends_with("...]"));
        assert!(rendered.chars().count() < 200);
    }
}
