//! Output formatting and progress reporting

use console::{style, Style, Term};
use extprobe::{CheckOutcome, RunObserver, RunReport};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::Path;

/// Progress reporter for a check run
#[derive(Debug)]
pub struct ProgressReporter {
    term: Term,
    progress_bar: Option<ProgressBar>,
    /// Whether to use colors
    pub use_color: bool,
    /// Quiet mode
    pub quiet: bool,
}

impl Default for ProgressReporter {
    fn default() -> Self {
        Self::new(true, false)
    }
}

impl ProgressReporter {
    /// Create a new progress reporter
    #[must_use]
    pub fn new(use_color: bool, quiet: bool) -> Self {
        Self {
            term: Term::stderr(),
            progress_bar: None,
            use_color,
            quiet,
        }
    }

    /// Start a progress bar over `total` checks
    pub fn start_progress(&mut self, total: u64, message: &str) {
        if self.quiet || !self.term.is_term() {
            return;
        }

        let pb = ProgressBar::new(total);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("=>-"),
        );
        pb.set_message(message.to_string());
        self.progress_bar = Some(pb);
    }

    /// Finish progress bar
    pub fn finish(&self) {
        if let Some(ref pb) = self.progress_bar {
            pb.finish_and_clear();
        }
    }

    fn write_line(&self, line: &str) {
        match self.progress_bar {
            Some(ref pb) => pb.suspend(|| {
                let _ = self.term.write_line(line);
            }),
            None => {
                let _ = self.term.write_line(line);
            }
        }
    }

    /// Print a success message
    pub fn success(&self, message: &str) {
        if self.quiet {
            return;
        }

        let prefix = if self.use_color {
            style("✓").green().bold().to_string()
        } else {
            "PASS".to_string()
        };

        self.write_line(&format!("{prefix} {message}"));
    }

    /// Print a failure message
    pub fn failure(&self, message: &str) {
        // Always print failures, even in quiet mode
        let prefix = if self.use_color {
            style("✗").red().bold().to_string()
        } else {
            "FAIL".to_string()
        };

        self.write_line(&format!("{prefix} {message}"));
    }

    /// Print an info message
    pub fn info(&self, message: &str) {
        if self.quiet {
            return;
        }

        let prefix = if self.use_color {
            style("ℹ").blue().bold().to_string()
        } else {
            "INFO".to_string()
        };

        self.write_line(&format!("{prefix} {message}"));
    }

    /// Print a section header
    pub fn header(&self, title: &str) {
        if self.quiet {
            return;
        }

        let styled = if self.use_color {
            style(title).bold().underlined().to_string()
        } else {
            format!("=== {title} ===")
        };

        self.write_line("");
        self.write_line(&styled);
    }

    /// Print one line for an outcome
    pub fn outcome(&self, outcome: &CheckOutcome) {
        if outcome.is_passed() {
            self.success(&format_passed(outcome));
        } else {
            self.failure(&format_failed(outcome));
        }
    }

    /// Print every outcome in order
    pub fn outcomes(&self, outcomes: &[CheckOutcome]) {
        for outcome in outcomes {
            self.outcome(outcome);
        }
    }

    /// Print the artifact locations
    pub fn artifacts(&self, results: &Path, report: &Path) {
        self.info(&format!("Results: {}", results.display()));
        self.info(&format!("Report:  {}", report.display()));
    }

    /// Print run summary
    pub fn summary(&self, report: &RunReport) {
        let failed = report.failed_count();
        if self.quiet && failed == 0 {
            return;
        }

        self.write_line("");

        let passed = report.passed_count();
        let total = report.total_count();
        let duration_secs = report.total_duration().as_secs_f64();

        if self.use_color {
            let passed_style = Style::new().green().bold();
            let failed_style = Style::new().red().bold();

            let status = if failed > 0 {
                failed_style.apply_to("FAILED")
            } else {
                passed_style.apply_to("PASSED")
            };

            self.write_line(&format!(
                "{} {} checks in {:.2}s ({} passed, {} failed)",
                status,
                total,
                duration_secs,
                passed_style.apply_to(passed),
                if failed > 0 {
                    failed_style.apply_to(failed).to_string()
                } else {
                    failed.to_string()
                },
            ));
        } else {
            let status = if failed > 0 { "FAILED" } else { "PASSED" };
            self.write_line(&format!(
                "{status} {total} checks in {duration_secs:.2}s ({passed} passed, {failed} failed)"
            ));
        }
    }
}

impl RunObserver for ProgressReporter {
    fn on_check_start(&self, _index: usize, _total: usize, name: &str) {
        if let Some(ref pb) = self.progress_bar {
            pb.set_message(name.to_string());
        }
    }

    fn on_outcome(&self, outcome: &CheckOutcome) {
        if let Some(ref pb) = self.progress_bar {
            pb.inc(1);
        }
        self.outcome(outcome);
    }
}

fn format_passed(outcome: &CheckOutcome) -> String {
    let mut line = format!("{} ({}ms)", outcome.name, outcome.duration_ms);
    if let Some(details) = &outcome.details {
        line.push_str(&format!(" - {details}"));
    }
    line
}

fn format_failed(outcome: &CheckOutcome) -> String {
    format!(
        "{}: {}",
        outcome.name,
        outcome.error.as_deref().unwrap_or("failed")
    )
}
