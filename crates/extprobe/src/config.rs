//! Suite configuration.
//!
//! Every field has a default, so an empty YAML document is a valid
//! configuration. CLI flags are layered on top by the binary.

use crate::browser::BrowserConfig;
use crate::reporter::{ReportPaths, DEFAULT_TITLE};
use crate::result::{ProbeError, ProbeResult};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Files that must be present in the extension directory
pub const DEFAULT_REQUIRED_FILES: [&str; 5] = [
    "manifest.json",
    "background.js",
    "tracker-block-extension.js",
    "tracking-blocker.js",
    "tracker-urls.txt",
];

/// Newline-delimited list of tracker URL prefixes
pub const TRACKER_LIST_FILE: &str = "tracker-urls.txt";

/// Known tracking link and the page it should resolve to
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RedirectProbe {
    /// Tracking URL to open
    pub tracker_url: String,
    /// URL the extension is expected to open instead
    pub expected_url: String,
    /// How long to wait for the expected tab
    #[serde(default = "default_redirect_timeout_ms")]
    pub timeout_ms: u64,
}

const fn default_redirect_timeout_ms() -> u64 {
    5000
}

impl RedirectProbe {
    /// Create a redirect probe with the default timeout
    #[must_use]
    pub fn new(tracker_url: impl Into<String>, expected_url: impl Into<String>) -> Self {
        Self {
            tracker_url: tracker_url.into(),
            expected_url: expected_url.into(),
            timeout_ms: default_redirect_timeout_ms(),
        }
    }

    /// Timeout as a `Duration`
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

/// Configuration for one suite run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SuiteConfig {
    /// Directory holding the unpacked extension
    pub extension_dir: PathBuf,
    /// Files that must exist in `extension_dir`
    pub required_files: Vec<String>,
    /// Structured results artifact
    pub results_path: PathBuf,
    /// Rendered HTML artifact
    pub report_path: PathBuf,
    /// Report title
    pub title: String,
    /// Page loaded while observing traffic
    pub probe_url: String,
    /// Delay after launch before the first check
    pub startup_settle_ms: u64,
    /// Delay after navigation while observing traffic
    pub traffic_settle_ms: u64,
    /// Wall-clock budget for the whole check battery.
    ///
    /// Browser launch gets its own limit of the same length. The startup
    /// settle is not counted, and teardown is bounded separately by
    /// [`TEARDOWN_TIMEOUT`](crate::suite::TEARDOWN_TIMEOUT).
    pub run_budget_secs: u64,
    /// Fail the traffic check when nothing was blocked
    pub require_blocked: bool,
    /// Optional redirect check
    pub redirect: Option<RedirectProbe>,
    /// Browser launch settings
    pub browser: BrowserConfig,
}

impl Default for SuiteConfig {
    fn default() -> Self {
        let paths = ReportPaths::default();
        Self {
            extension_dir: PathBuf::from("extension"),
            required_files: DEFAULT_REQUIRED_FILES.iter().map(|f| (*f).to_string()).collect(),
            results_path: paths.results,
            report_path: paths.report,
            title: DEFAULT_TITLE.to_string(),
            probe_url: "https://example.com".to_string(),
            startup_settle_ms: 3000,
            traffic_settle_ms: 2000,
            run_budget_secs: 60,
            require_blocked: false,
            redirect: None,
            browser: BrowserConfig::default(),
        }
    }
}

impl SuiteConfig {
    /// Create new default configuration
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a YAML document
    pub fn from_yaml_str(yaml: &str) -> ProbeResult<Self> {
        let config: Self = serde_yaml_ng::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Load a YAML configuration file
    pub fn from_yaml_file(path: &Path) -> ProbeResult<Self> {
        let yaml = std::fs::read_to_string(path).map_err(|e| {
            ProbeError::config(format!("cannot read {}: {e}", path.display()))
        })?;
        Self::from_yaml_str(&yaml)
    }

    /// Serialize to YAML
    pub fn to_yaml(&self) -> ProbeResult<String> {
        Ok(serde_yaml_ng::to_string(self)?)
    }

    /// Reject configurations no run could succeed with
    pub fn validate(&self) -> ProbeResult<()> {
        if self.run_budget_secs == 0 {
            return Err(ProbeError::config("run_budget_secs must be greater than zero"));
        }
        if self.probe_url.trim().is_empty() {
            return Err(ProbeError::config("probe_url must not be empty"));
        }
        if self.required_files.iter().any(|f| f.trim().is_empty()) {
            return Err(ProbeError::config("required_files contains an empty name"));
        }
        Ok(())
    }

    /// Set extension directory
    #[must_use]
    pub fn with_extension_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.extension_dir = dir.into();
        self
    }

    /// Set required files
    #[must_use]
    pub fn with_required_files<I, S>(mut self, files: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.required_files = files.into_iter().map(Into::into).collect();
        self
    }

    /// Set results path
    #[must_use]
    pub fn with_results_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.results_path = path.into();
        self
    }

    /// Set report path
    #[must_use]
    pub fn with_report_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.report_path = path.into();
        self
    }

    /// Set probe URL
    #[must_use]
    pub fn with_probe_url(mut self, url: impl Into<String>) -> Self {
        self.probe_url = url.into();
        self
    }

    /// Set both settle delays
    #[must_use]
    pub const fn with_settle(mut self, startup_ms: u64, traffic_ms: u64) -> Self {
        self.startup_settle_ms = startup_ms;
        self.traffic_settle_ms = traffic_ms;
        self
    }

    /// Set run budget
    #[must_use]
    pub const fn with_run_budget_secs(mut self, secs: u64) -> Self {
        self.run_budget_secs = secs;
        self
    }

    /// Require at least one blocked request
    #[must_use]
    pub const fn with_require_blocked(mut self, require: bool) -> Self {
        self.require_blocked = require;
        self
    }

    /// Enable the redirect check
    #[must_use]
    pub fn with_redirect(mut self, redirect: RedirectProbe) -> Self {
        self.redirect = Some(redirect);
        self
    }

    /// Set browser settings
    #[must_use]
    pub fn with_browser(mut self, browser: BrowserConfig) -> Self {
        self.browser = browser;
        self
    }

    /// Artifact locations
    #[must_use]
    pub fn report_paths(&self) -> ReportPaths {
        ReportPaths {
            results: self.results_path.clone(),
            report: self.report_path.clone(),
        }
    }

    /// Startup settle delay
    #[must_use]
    pub const fn startup_settle(&self) -> Duration {
        Duration::from_millis(self.startup_settle_ms)
    }

    /// Traffic settle delay
    #[must_use]
    pub const fn traffic_settle(&self) -> Duration {
        Duration::from_millis(self.traffic_settle_ms)
    }

    /// Run budget
    #[must_use]
    pub const fn run_budget(&self) -> Duration {
        Duration::from_secs(self.run_budget_secs)
    }
}
