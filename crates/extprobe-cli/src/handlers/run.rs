//! Run command handler

use crate::commands::RunArgs;
use crate::config::CliConfig;
use crate::error::{CliError, CliResult};
use crate::handlers::config::load_suite_config;
use crate::output::ProgressReporter;
use extprobe::{RunReport, Suite, SuiteConfig, TargetLauncher};

/// Layer the run command's flags over a loaded configuration
pub fn apply_run_overrides(mut config: SuiteConfig, args: &RunArgs) -> CliResult<SuiteConfig> {
    if let Some(results) = &args.results {
        config.results_path.clone_from(results);
    }
    if let Some(report) = &args.report {
        config.report_path.clone_from(report);
    }
    if let Some(url) = &args.probe_url {
        config.probe_url.clone_from(url);
    }
    if let Some(secs) = args.budget_secs {
        if secs == 0 {
            return Err(CliError::invalid_argument("--budget-secs must be greater than zero"));
        }
        config.run_budget_secs = secs;
    }
    if let Some(path) = &args.chromium {
        config.browser.chromium_path = Some(path.clone());
    }
    if args.no_sandbox {
        config.browser.sandbox = false;
    }
    if args.headed {
        config.browser.headless = false;
    }
    if args.require_blocked {
        config.require_blocked = true;
    }
    config.validate()?;
    Ok(config)
}

/// Run the suite with `launcher`, write both artifacts and narrate progress.
///
/// Check failures are part of the returned report; only infrastructure
/// errors (writing the artifacts) are returned as `Err`.
pub async fn run_with_launcher(
    reporter: &mut ProgressReporter,
    config: SuiteConfig,
    launcher: &dyn TargetLauncher,
) -> CliResult<RunReport> {
    reporter.header(&config.title);
    let suite = Suite::new(config);
    reporter.start_progress(suite.check_names().len() as u64, "Running checks");

    let report = suite.run(launcher, &*reporter).await;
    reporter.finish();

    let paths = suite.config().report_paths();
    report.write_artifacts(&paths)?;
    reporter.artifacts(&paths.results, &paths.report);
    reporter.summary(&report);
    Ok(report)
}

/// Execute the run command
pub async fn execute_run(cli: &CliConfig, args: &RunArgs) -> CliResult<()> {
    let config = apply_run_overrides(load_suite_config(&args.suite)?, args)?;
    let launcher = launcher()?;
    let mut reporter = cli.reporter();

    let report = run_with_launcher(&mut reporter, config, launcher.as_ref()).await?;
    if report.has_failures() {
        return Err(CliError::checks_failed(
            report.failed_count(),
            report.total_count(),
        ));
    }
    Ok(())
}

#[cfg(feature = "browser")]
fn launcher() -> CliResult<Box<dyn TargetLauncher>> {
    Ok(Box::new(extprobe::ChromiumLauncher))
}

#[cfg(not(feature = "browser"))]
fn launcher() -> CliResult<Box<dyn TargetLauncher>> {
    Err(CliError::FeatureDisabled { feature: "browser" })
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use extprobe::{MockLauncher, MockTarget, SUITE_INIT_NAME, TRACKER_LIST_FILE};
    use std::path::{Path, PathBuf};

    fn write_extension(dir: &Path) {
        std::fs::write(dir.join("manifest.json"), r#"{"manifest_version": 3}"#).unwrap();
        for file in ["background.js", "tracker-block-extension.js", "tracking-blocker.js"] {
            std::fs::write(dir.join(file), "// js").unwrap();
        }
        std::fs::write(dir.join(TRACKER_LIST_FILE), "https://clicks.example/\n").unwrap();
    }

    fn config_in(root: &Path) -> SuiteConfig {
        SuiteConfig::new()
            .with_extension_dir(root.join("extension"))
            .with_results_path(root.join("test-results/results.json"))
            .with_report_path(root.join("test-report.html"))
            .with_settle(0, 0)
    }

    mod override_tests {
        use super::*;

        #[test]
        fn test_flags_override_config() {
            let args = RunArgs {
                results: Some(PathBuf::from("r.json")),
                probe_url: Some("https://example.org".to_string()),
                budget_secs: Some(15),
                chromium: Some(PathBuf::from("/usr/bin/chromium")),
                require_blocked: true,
                headed: true,
                ..RunArgs::default()
            };
            let config = apply_run_overrides(SuiteConfig::default(), &args).unwrap();
            assert_eq!(config.results_path, PathBuf::from("r.json"));
            assert_eq!(config.report_path, PathBuf::from("test-report.html"));
            assert_eq!(config.probe_url, "https://example.org");
            assert_eq!(config.run_budget_secs, 15);
            assert!(config.require_blocked);
            assert!(!config.browser.headless);
            assert_eq!(
                config.browser.chromium_path,
                Some(PathBuf::from("/usr/bin/chromium"))
            );
        }

        #[test]
        fn test_no_sandbox_wins_over_file() {
            let mut base = SuiteConfig::default();
            base.browser.sandbox = true;
            let args = RunArgs {
                no_sandbox: true,
                ..RunArgs::default()
            };
            assert!(!apply_run_overrides(base, &args).unwrap().browser.sandbox);
        }

        #[test]
        fn test_zero_budget_rejected() {
            let args = RunArgs {
                budget_secs: Some(0),
                ..RunArgs::default()
            };
            let err = apply_run_overrides(SuiteConfig::default(), &args).unwrap_err();
            assert_eq!(err.exit_code(), 2);
        }
    }

    mod pipeline_tests {
        use super::*;

        #[tokio::test]
        async fn test_healthy_run_writes_artifacts() {
            let dir = tempfile::tempdir().unwrap();
            std::fs::create_dir(dir.path().join("extension")).unwrap();
            write_extension(&dir.path().join("extension"));
            let config = config_in(dir.path());
            let launcher = MockLauncher::with_target(MockTarget::healthy());

            let mut reporter = ProgressReporter::new(false, true);
            let report = run_with_launcher(&mut reporter, config, &launcher)
                .await
                .unwrap();

            assert!(!report.has_failures());
            let stored =
                RunReport::load(&dir.path().join("test-results/results.json")).unwrap();
            assert_eq!(stored.outcomes(), report.outcomes());
            let html = std::fs::read_to_string(dir.path().join("test-report.html")).unwrap();
            assert!(html.contains("Tracker URLs Loading"));
        }

        #[tokio::test]
        async fn test_missing_extension_still_writes_report() {
            let dir = tempfile::tempdir().unwrap();
            let config = config_in(dir.path());
            let launcher = MockLauncher::with_target(MockTarget::healthy());

            let mut reporter = ProgressReporter::new(false, true);
            let report = run_with_launcher(&mut reporter, config, &launcher)
                .await
                .unwrap();

            assert_eq!(report.total_count(), 1);
            assert_eq!(report.outcomes()[0].name, SUITE_INIT_NAME);
            assert_eq!(report.exit_code(), 1);
            assert!(dir.path().join("test-report.html").exists());
        }

        #[tokio::test]
        async fn test_unwritable_results_is_infrastructure_error() {
            let dir = tempfile::tempdir().unwrap();
            let blocker = dir.path().join("blocker");
            std::fs::write(&blocker, "file, not a directory").unwrap();
            let config = config_in(dir.path()).with_results_path(blocker.join("results.json"));

            let mut reporter = ProgressReporter::new(false, true);
            let err = run_with_launcher(&mut reporter, config, &MockLauncher::failing())
                .await
                .unwrap_err();
            assert_eq!(err.exit_code(), 2);
            assert!(matches!(err, CliError::Probe(ref e) if e.is_sink()));
        }
    }
}
