//! extprobe: check runner and test-run report model for browser extensions.
//!
//! Drives a Chromium instance with an unpacked extension through a fixed
//! battery of checks and turns the outcomes into a JSON + HTML report.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                    EXTPROBE Architecture                        │
//! ├─────────────────────────────────────────────────────────────────┤
//! │   ┌────────────┐    ┌────────────┐    ┌────────────┐            │
//! │   │ Suite      │    │ Check      │    │ Report     │            │
//! │   │ (preflight │───►│ Runner     │───►│ Builder    │──► JSON    │
//! │   │  + launch) │    │ (battery)  │    │ (RunReport)│──► HTML    │
//! │   └────────────┘    └─────┬──────┘    └────────────┘            │
//! │                           │ &dyn ExtensionTarget                │
//! │                     ┌─────▼──────┐                              │
//! │                     │ Chromium   │  (feature `browser`)         │
//! │                     │ over CDP   │  or MockTarget in tests      │
//! │                     └────────────┘                              │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Runner and report builder only share [`CheckOutcome`]: the builder never
//! needs a browser and the runner is tested against [`MockTarget`].

#![warn(missing_docs)]

/// Browser launch settings and the Chromium target
pub mod browser;

/// The fixed check battery and extension preflight
pub mod checks;

/// Suite configuration (YAML)
pub mod config;

mod outcome;
mod reporter;
mod result;

/// Sequential check runner with a time budget
pub mod runner;

/// Suite orchestration
pub mod suite;

/// Target abstraction and mocks
pub mod target;

#[cfg(feature = "browser")]
pub use browser::{ChromiumLauncher, ChromiumTarget};
pub use browser::BrowserConfig;
pub use checks::{
    count_tracker_urls, preflight, standard_battery, BackgroundScript, Check, ExtensionLoading,
    TrackerBlocking, TrackerRedirect, TrackerUrlsLoading,
};
pub use config::{RedirectProbe, SuiteConfig, DEFAULT_REQUIRED_FILES, TRACKER_LIST_FILE};
pub use outcome::{CheckOutcome, CheckStatus};
pub use reporter::{ReportPaths, RunReport, DEFAULT_TITLE};
pub use result::{ProbeError, ProbeResult};
pub use runner::{CheckRunner, NoopObserver, RunObserver, DEFAULT_RUN_BUDGET};
pub use suite::{validate_static, Suite, EXTENSION_FILES_NAME, SUITE_INIT_NAME};
pub use target::{
    ExtensionTarget, MockLauncher, MockTarget, TargetInfo, TargetLauncher, TrafficObservation,
};

/// Prelude for convenient imports
pub mod prelude {
    pub use super::{
        CheckOutcome, CheckRunner, CheckStatus, ExtensionTarget, ProbeError, ProbeResult,
        RunObserver, RunReport, Suite, SuiteConfig, TargetLauncher,
    };
    #[cfg(feature = "browser")]
    pub use super::ChromiumLauncher;
}
