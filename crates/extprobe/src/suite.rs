//! Suite orchestration: preflight, launch, battery, teardown.

use crate::checks::{count_tracker_urls, preflight, standard_battery, Check};
use crate::config::SuiteConfig;
use crate::outcome::CheckOutcome;
use crate::reporter::RunReport;
use crate::result::{ProbeError, ProbeResult};
use crate::runner::{CheckRunner, RunObserver};
use crate::target::TargetLauncher;
use std::time::{Duration, Instant};

/// Name of the synthetic outcome recorded when setup fails
pub const SUITE_INIT_NAME: &str = "Test Suite Initialization";

/// Upper bound on browser teardown
pub const TEARDOWN_TIMEOUT: Duration = Duration::from_secs(10);

/// Name of the static file check reported by [`validate_static`]
pub const EXTENSION_FILES_NAME: &str = "Extension Files";

/// One configured run of the check battery
#[derive(Debug)]
pub struct Suite {
    config: SuiteConfig,
    runner: CheckRunner,
}

impl Suite {
    /// Suite running the standard battery for `config`
    #[must_use]
    pub fn new(config: SuiteConfig) -> Self {
        let runner = CheckRunner::new(standard_battery(&config)).with_budget(config.run_budget());
        Self { config, runner }
    }

    /// Replace the battery, keeping the configured budget
    #[must_use]
    pub fn with_checks(mut self, checks: Vec<Box<dyn Check>>) -> Self {
        self.runner = CheckRunner::new(checks).with_budget(self.config.run_budget());
        self
    }

    /// Suite configuration
    #[must_use]
    pub const fn config(&self) -> &SuiteConfig {
        &self.config
    }

    /// Check names in execution order
    #[must_use]
    pub fn check_names(&self) -> Vec<&str> {
        self.runner.names()
    }

    /// Run the suite end to end.
    ///
    /// Setup failures become a single failed [`SUITE_INIT_NAME`] outcome, so
    /// the returned report always holds at least one outcome.
    pub async fn run(&self, launcher: &dyn TargetLauncher, observer: &dyn RunObserver) -> RunReport {
        let outcomes = match self.execute(launcher, observer).await {
            Ok(outcomes) => outcomes,
            Err(e) => {
                tracing::error!(error = %e, "suite initialization failed");
                let outcome = CheckOutcome::failed(SUITE_INIT_NAME, e.to_string(), Duration::ZERO);
                observer.on_outcome(&outcome);
                vec![outcome]
            }
        };
        RunReport::new(outcomes).with_title(self.config.title.clone())
    }

    async fn execute(
        &self,
        launcher: &dyn TargetLauncher,
        observer: &dyn RunObserver,
    ) -> ProbeResult<Vec<CheckOutcome>> {
        preflight(&self.config.extension_dir, &self.config.required_files)?;
        tracing::debug!(dir = %self.config.extension_dir.display(), "extension files present");

        let budget = self.config.run_budget();
        let mut target = tokio::time::timeout(budget, launcher.launch(&self.config))
            .await
            .map_err(|_| ProbeError::BrowserLaunchError {
                message: format!("launch did not complete within {}ms", budget.as_millis()),
            })??;
        tracing::info!("browser launched with extension");

        let settle = self.config.startup_settle();
        if !settle.is_zero() {
            tokio::time::sleep(settle).await;
        }

        let outcomes = self.runner.run_all(target.as_ref(), observer).await;

        match tokio::time::timeout(TEARDOWN_TIMEOUT, target.close()).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => tracing::warn!(error = %e, "browser teardown failed"),
            Err(_) => tracing::warn!(
                timeout_secs = TEARDOWN_TIMEOUT.as_secs(),
                "browser teardown timed out"
            ),
        }
        Ok(outcomes)
    }
}

/// Validate the extension directory without launching a browser.
///
/// Runs the file preflight and the tracker list check. A preflight failure
/// yields the single synthetic initialization outcome, as a full run would.
pub async fn validate_static(config: &SuiteConfig) -> Vec<CheckOutcome> {
    let start = Instant::now();
    if let Err(e) = preflight(&config.extension_dir, &config.required_files) {
        return vec![CheckOutcome::failed(SUITE_INIT_NAME, e.to_string(), Duration::ZERO)];
    }
    let files = CheckOutcome::passed(
        EXTENSION_FILES_NAME,
        format!("All {} required files present", config.required_files.len()),
        start.elapsed(),
    );

    let start = Instant::now();
    let tracker_urls = match count_tracker_urls(&config.extension_dir).await {
        Ok(count) => CheckOutcome::passed(
            "Tracker URLs Loading",
            format!("Successfully loaded {count} tracker URLs"),
            start.elapsed(),
        ),
        Err(e) => CheckOutcome::failed("Tracker URLs Loading", e.to_string(), start.elapsed()),
    };

    vec![files, tracker_urls]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TRACKER_LIST_FILE;
    use crate::runner::NoopObserver;
    use crate::target::{MockLauncher, MockTarget};
    use std::path::Path;

    fn write_extension(dir: &Path) {
        std::fs::write(dir.join("manifest.json"), r#"{"manifest_version": 3}"#).unwrap();
        for file in ["background.js", "tracker-block-extension.js", "tracking-blocker.js"] {
            std::fs::write(dir.join(file), "// js").unwrap();
        }
        std::fs::write(dir.join(TRACKER_LIST_FILE), "https://clicks.example/\n").unwrap();
    }

    fn config_for(dir: &Path) -> SuiteConfig {
        SuiteConfig::new().with_extension_dir(dir).with_settle(0, 0)
    }

    mod run_tests {
        use super::*;

        #[tokio::test]
        async fn test_healthy_run_passes_everything() {
            let dir = tempfile::tempdir().unwrap();
            write_extension(dir.path());
            let target = MockTarget::healthy();
            let launcher = MockLauncher::with_target(target.clone());

            let report = Suite::new(config_for(dir.path()))
                .run(&launcher, &NoopObserver)
                .await;

            assert_eq!(report.total_count(), 4);
            assert_eq!(report.passed_count(), 4, "{:?}", report.failures());
            assert_eq!(report.exit_code(), 0);
            assert!(target.was_called("close"));
        }

        #[tokio::test]
        async fn test_missing_file_single_failed_outcome() {
            let dir = tempfile::tempdir().unwrap();
            write_extension(dir.path());
            std::fs::remove_file(dir.path().join("tracking-blocker.js")).unwrap();
            let target = MockTarget::healthy();
            let launcher = MockLauncher::with_target(target.clone());

            let report = Suite::new(config_for(dir.path()))
                .run(&launcher, &NoopObserver)
                .await;

            assert_eq!(report.total_count(), 1);
            let outcome = &report.outcomes()[0];
            assert_eq!(outcome.name, SUITE_INIT_NAME);
            assert!(outcome.is_failed());
            assert_eq!(outcome.duration_ms, 0);
            assert!(outcome
                .error
                .as_deref()
                .unwrap()
                .contains("tracking-blocker.js"));
            assert_ne!(report.exit_code(), 0);
            assert!(!target.was_called("targets"));
        }

        #[tokio::test]
        async fn test_launch_failure_single_failed_outcome() {
            let dir = tempfile::tempdir().unwrap();
            write_extension(dir.path());
            let report = Suite::new(config_for(dir.path()))
                .run(&MockLauncher::failing(), &NoopObserver)
                .await;
            assert_eq!(report.total_count(), 1);
            assert_eq!(report.outcomes()[0].name, SUITE_INIT_NAME);
            assert!(report.has_failures());
        }

        #[tokio::test]
        async fn test_check_failures_still_close_target() {
            let dir = tempfile::tempdir().unwrap();
            write_extension(dir.path());
            let target = MockTarget::new();
            let launcher = MockLauncher::with_target(target.clone());

            let report = Suite::new(config_for(dir.path()))
                .run(&launcher, &NoopObserver)
                .await;

            assert_eq!(report.total_count(), 4);
            // only the tracker list check works without a live extension
            assert_eq!(report.passed_count(), 1);
            assert!(target.was_called("close"));
        }

        #[tokio::test]
        async fn test_slow_launch_bounded_by_run_budget() {
            let dir = tempfile::tempdir().unwrap();
            write_extension(dir.path());
            let target = MockTarget::healthy();
            let launcher = MockLauncher::with_target(target.clone())
                .with_launch_delay(Duration::from_secs(30));
            let config = config_for(dir.path()).with_run_budget_secs(1);

            let report = Suite::new(config).run(&launcher, &NoopObserver).await;

            assert_eq!(report.total_count(), 1);
            let outcome = &report.outcomes()[0];
            assert_eq!(outcome.name, SUITE_INIT_NAME);
            assert!(outcome
                .error
                .as_deref()
                .unwrap()
                .contains("launch did not complete within 1000ms"));
            assert!(!target.was_called("targets"));
        }

        #[tokio::test]
        async fn test_unrepresentable_budget_still_reports() {
            let dir = tempfile::tempdir().unwrap();
            write_extension(dir.path());
            let launcher = MockLauncher::with_target(MockTarget::healthy());
            let config = config_for(dir.path()).with_run_budget_secs(u64::MAX);

            let report = Suite::new(config).run(&launcher, &NoopObserver).await;
            assert_eq!(report.total_count(), 4);
            assert_eq!(report.exit_code(), 0);
        }

        #[tokio::test]
        async fn test_title_carried_into_report() {
            let dir = tempfile::tempdir().unwrap();
            let mut config = config_for(dir.path());
            config.title = "Nightly".to_string();
            let report = Suite::new(config)
                .run(&MockLauncher::failing(), &NoopObserver)
                .await;
            assert_eq!(report.title(), "Nightly");
        }

        #[test]
        fn test_redirect_adds_fifth_check() {
            let config = SuiteConfig::new().with_redirect(crate::config::RedirectProbe::new(
                "https://a.test",
                "https://b.test",
            ));
            assert_eq!(Suite::new(config).check_names().len(), 5);
        }
    }

    mod validate_tests {
        use super::*;

        #[tokio::test]
        async fn test_valid_extension() {
            let dir = tempfile::tempdir().unwrap();
            write_extension(dir.path());
            let outcomes = validate_static(&config_for(dir.path())).await;
            assert_eq!(outcomes.len(), 2);
            assert!(outcomes.iter().all(CheckOutcome::is_passed));
            assert_eq!(
                outcomes[1].details.as_deref(),
                Some("Successfully loaded 1 tracker URLs")
            );
        }

        #[tokio::test]
        async fn test_missing_manifest() {
            let dir = tempfile::tempdir().unwrap();
            let outcomes = validate_static(&config_for(dir.path())).await;
            assert_eq!(outcomes.len(), 1);
            assert_eq!(
                outcomes[0].error.as_deref(),
                Some("Extension file missing: manifest.json")
            );
        }

        #[tokio::test]
        async fn test_empty_tracker_list() {
            let dir = tempfile::tempdir().unwrap();
            write_extension(dir.path());
            std::fs::write(dir.path().join(TRACKER_LIST_FILE), "").unwrap();
            let outcomes = validate_static(&config_for(dir.path())).await;
            assert!(outcomes[0].is_passed());
            assert!(outcomes[1].is_failed());
        }
    }
}
