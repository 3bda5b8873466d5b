//! Reporter - aggregation and rendering of a finished run.
//!
//! A [`RunReport`] is built once from the ordered outcomes of a run and is
//! immutable afterwards. It produces two artifacts:
//!
//! ```text
//!   Vec<CheckOutcome> ──► RunReport ──┬──► results.json   (lossless, ordered)
//!                                     └──► report.html    (self-contained)
//! ```
//!
//! Rendering is a pure function of the report plus the generation timestamp,
//! so two renders with the same timestamp are byte-identical.

use crate::outcome::{CheckOutcome, CheckStatus};
use crate::result::{ProbeError, ProbeResult};
use std::fmt::Write as _;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Default document title
pub const DEFAULT_TITLE: &str = "Tracker Blocker Extension Test Report";

/// Where the two artifacts of a run are written
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportPaths {
    /// Structured results (JSON array of outcomes)
    pub results: PathBuf,
    /// Rendered HTML report
    pub report: PathBuf,
}

impl Default for ReportPaths {
    fn default() -> Self {
        Self {
            results: PathBuf::from("test-results/results.json"),
            report: PathBuf::from("test-report.html"),
        }
    }
}

impl ReportPaths {
    /// Resolve both paths against a working root
    #[must_use]
    pub fn under(root: &Path) -> Self {
        let defaults = Self::default();
        Self {
            results: root.join(defaults.results),
            report: root.join(defaults.report),
        }
    }
}

/// Aggregate over the ordered outcomes of one run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunReport {
    title: String,
    outcomes: Vec<CheckOutcome>,
}

impl RunReport {
    /// Build a report from outcomes in execution order
    #[must_use]
    pub fn new(outcomes: Vec<CheckOutcome>) -> Self {
        Self {
            title: DEFAULT_TITLE.to_string(),
            outcomes,
        }
    }

    /// Set the document title
    #[must_use]
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    /// Rebuild a report from a structured results artifact.
    ///
    /// Every outcome must satisfy [`CheckOutcome::validate`].
    pub fn from_json(json: &str) -> ProbeResult<Self> {
        let outcomes: Vec<CheckOutcome> = serde_json::from_str(json)?;
        for outcome in &outcomes {
            outcome
                .validate()
                .map_err(|message| ProbeError::InvalidResults { message })?;
        }
        Ok(Self::new(outcomes))
    }

    /// Load a report from a results file on disk
    pub fn load(path: &Path) -> ProbeResult<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    /// Document title
    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    /// Outcomes in execution order
    #[must_use]
    pub fn outcomes(&self) -> &[CheckOutcome] {
        &self.outcomes
    }

    /// Get number of passed checks
    #[must_use]
    pub fn passed_count(&self) -> usize {
        self.outcomes.iter().filter(|o| o.is_passed()).count()
    }

    /// Get number of failed checks
    #[must_use]
    pub fn failed_count(&self) -> usize {
        self.outcomes.len() - self.passed_count()
    }

    /// Get total check count
    #[must_use]
    pub fn total_count(&self) -> usize {
        self.outcomes.len()
    }

    /// Sum of all outcome durations
    #[must_use]
    pub fn total_duration_ms(&self) -> u64 {
        self.outcomes
            .iter()
            .fold(0u64, |acc, o| acc.saturating_add(o.duration_ms))
    }

    /// Total duration as a `Duration`
    #[must_use]
    pub fn total_duration(&self) -> Duration {
        Duration::from_millis(self.total_duration_ms())
    }

    /// Whether any check failed
    #[must_use]
    pub fn has_failures(&self) -> bool {
        self.failed_count() > 0
    }

    /// Get failing outcomes
    #[must_use]
    pub fn failures(&self) -> Vec<&CheckOutcome> {
        self.outcomes.iter().filter(|o| o.is_failed()).collect()
    }

    /// Process exit code for this run: 0 when nothing failed, 1 otherwise
    #[must_use]
    pub fn exit_code(&self) -> u8 {
        u8::from(self.has_failures())
    }

    /// Generate summary string
    #[must_use]
    pub fn summary(&self) -> String {
        format!(
            "Test Summary: {}/{} passed",
            self.passed_count(),
            self.total_count()
        )
    }

    /// Render the structured artifact (pretty JSON array, input order)
    pub fn render_json(&self) -> ProbeResult<String> {
        Ok(serde_json::to_string_pretty(&self.outcomes)?)
    }

    /// Render the HTML report stamped with the current local time
    #[must_use]
    pub fn render_html(&self) -> String {
        let now = chrono::Local::now().format("%Y-%m-%d %H:%M:%S").to_string();
        self.render_html_at(&now)
    }

    /// Render the HTML report with an explicit generation timestamp
    #[must_use]
    pub fn render_html_at(&self, generated_at: &str) -> String {
        let mut html = String::new();
        let title = escape_html(&self.title);

        html.push_str("<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n");
        html.push_str("    <meta charset=\"UTF-8\">\n");
        let _ = writeln!(html, "    <title>{title}</title>");
        html.push_str(STYLE);
        html.push_str("</head>\n<body>\n    <div class=\"container\">\n");

        // Header
        let _ = write!(
            html,
            r#"        <div class="header">
            <h1>{title}</h1>
            <p>Check results for the browser extension under test</p>
        </div>
"#
        );

        // Summary
        html.push_str("        <div class=\"summary\">\n");
        summary_card(&mut html, "Total Tests", "total", &self.total_count().to_string());
        summary_card(&mut html, "Passed", "passed", &self.passed_count().to_string());
        summary_card(&mut html, "Failed", "failed", &self.failed_count().to_string());
        summary_card(
            &mut html,
            "Duration",
            "duration",
            &format!("{}ms", self.total_duration_ms()),
        );
        html.push_str("        </div>\n");

        // Outcomes
        html.push_str("        <div class=\"test-results\">\n");
        for outcome in &self.outcomes {
            render_outcome(&mut html, outcome);
        }
        html.push_str("        </div>\n");

        // Footer
        let _ = write!(
            html,
            r#"        <div class="timestamp">Report generated on {}</div>
    </div>
</body>
</html>
"#,
            escape_html(generated_at)
        );

        html
    }

    /// Write the structured artifact, creating parent directories
    pub fn write_json(&self, path: &Path) -> ProbeResult<()> {
        let json = self.render_json()?;
        write_artifact(path, &json)
    }

    /// Write the HTML artifact, creating parent directories
    pub fn write_html(&self, path: &Path) -> ProbeResult<()> {
        write_artifact(path, &self.render_html())
    }

    /// Write both artifacts. Any failure is a [`ProbeError::Sink`].
    pub fn write_artifacts(&self, paths: &ReportPaths) -> ProbeResult<()> {
        self.write_json(&paths.results)?;
        self.write_html(&paths.report)?;
        tracing::info!(
            results = %paths.results.display(),
            report = %paths.report.display(),
            "reports generated"
        );
        Ok(())
    }
}

const STYLE: &str = r"    <style>
        body { font-family: 'Segoe UI', Tahoma, Geneva, Verdana, sans-serif; margin: 0; padding: 20px; background: #f5f7fa; }
        .container { max-width: 1200px; margin: 0 auto; }
        .header { background: linear-gradient(135deg, #667eea 0%, #764ba2 100%); color: white; padding: 30px; border-radius: 10px; margin-bottom: 20px; text-align: center; }
        .summary { display: grid; grid-template-columns: repeat(auto-fit, minmax(200px, 1fr)); gap: 20px; margin-bottom: 30px; }
        .summary-card { background: white; padding: 20px; border-radius: 10px; box-shadow: 0 2px 10px rgba(0,0,0,0.1); text-align: center; }
        .summary-card h3 { margin: 0 0 10px 0; color: #333; }
        .summary-card .number { font-size: 2em; font-weight: bold; }
        .total-number { color: #2196F3; }
        .passed-number { color: #4CAF50; }
        .failed-number { color: #f44336; }
        .duration-number { color: #FF9800; }
        .test-results { background: white; border-radius: 10px; overflow: hidden; box-shadow: 0 2px 10px rgba(0,0,0,0.1); }
        .test-result { border-bottom: 1px solid #eee; padding: 20px; }
        .test-result:last-child { border-bottom: none; }
        .test-result.passed { border-left: 5px solid #4CAF50; }
        .test-result.failed { border-left: 5px solid #f44336; }
        .test-name { font-weight: bold; font-size: 18px; margin-bottom: 10px; }
        .test-meta { display: flex; gap: 20px; margin-bottom: 10px; font-size: 14px; color: #666; }
        .test-status { padding: 4px 12px; border-radius: 20px; font-size: 12px; font-weight: bold; text-transform: uppercase; }
        .status-passed { background: #E8F5E8; color: #2E7D32; }
        .status-failed { background: #FFEBEE; color: #C62828; }
        .test-details { color: #666; margin-top: 10px; }
        .error { color: #f44336; background: #ffebee; padding: 15px; border-radius: 5px; margin-top: 10px; font-family: monospace; white-space: pre-wrap; }
        .timestamp { text-align: center; color: #666; margin-top: 30px; font-size: 14px; }
    </style>
";

fn summary_card(html: &mut String, label: &str, class: &str, value: &str) {
    let _ = write!(
        html,
        r#"            <div class="summary-card">
                <h3>{label}</h3>
                <div class="number {class}-number">{value}</div>
            </div>
"#
    );
}

fn render_outcome(html: &mut String, outcome: &CheckOutcome) {
    let status = match outcome.status {
        CheckStatus::Passed => "passed",
        CheckStatus::Failed => "failed",
    };

    let _ = write!(
        html,
        r#"            <div class="test-result {status}">
                <div class="test-name">{}</div>
                <div class="test-meta">
                    <span class="test-status status-{status}">{status}</span>
"#,
        escape_html(&outcome.name)
    );
    if outcome.duration_ms > 0 {
        let _ = writeln!(
            html,
            "                    <span class=\"test-duration\">{}ms</span>",
            outcome.duration_ms
        );
    }
    html.push_str("                </div>\n");

    if let Some(details) = &outcome.details {
        let _ = writeln!(
            html,
            "                <div class=\"test-details\">{}</div>",
            escape_html(details)
        );
    }
    if let Some(error) = &outcome.error {
        let _ = writeln!(
            html,
            "                <div class=\"error\">{}</div>",
            escape_html(error)
        );
    }

    html.push_str("            </div>\n");
}

fn write_artifact(path: &Path, contents: &str) -> ProbeResult<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|e| ProbeError::sink(parent, e))?;
    }
    std::fs::write(path, contents).map_err(|e| ProbeError::sink(path, e))
}

/// Escape HTML special characters
fn escape_html(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}
