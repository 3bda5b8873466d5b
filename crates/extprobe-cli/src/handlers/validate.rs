//! Validate command handler

use crate::commands::ValidateArgs;
use crate::error::{CliError, CliResult};
use crate::handlers::config::load_suite_config;
use crate::output::ProgressReporter;
use extprobe::{validate_static, RunReport};

/// Execute the validate command.
///
/// Checks the extension directory without a browser and writes nothing.
pub async fn execute_validate(reporter: &ProgressReporter, args: &ValidateArgs) -> CliResult<()> {
    let config = load_suite_config(&args.suite)?;
    reporter.header(&format!("Validating {}", config.extension_dir.display()));

    let report = RunReport::new(validate_static(&config).await);
    reporter.outcomes(report.outcomes());
    reporter.summary(&report);

    if report.has_failures() {
        return Err(CliError::checks_failed(
            report.failed_count(),
            report.total_count(),
        ));
    }
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::commands::SuiteArgs;
    use extprobe::{DEFAULT_REQUIRED_FILES, TRACKER_LIST_FILE};

    fn args_for(dir: &std::path::Path) -> ValidateArgs {
        ValidateArgs {
            suite: SuiteArgs {
                config: None,
                extension_dir: Some(dir.to_path_buf()),
            },
        }
    }

    #[tokio::test]
    async fn test_complete_extension_validates() {
        let dir = tempfile::tempdir().unwrap();
        for file in DEFAULT_REQUIRED_FILES {
            std::fs::write(dir.path().join(file), "x").unwrap();
        }
        std::fs::write(dir.path().join("manifest.json"), r#"{"manifest_version": 3}"#).unwrap();
        std::fs::write(dir.path().join(TRACKER_LIST_FILE), "https://t.example/\n").unwrap();

        let reporter = ProgressReporter::new(false, true);
        execute_validate(&reporter, &args_for(dir.path())).await.unwrap();
    }

    #[tokio::test]
    async fn test_empty_directory_fails_with_exit_one() {
        let dir = tempfile::tempdir().unwrap();
        let reporter = ProgressReporter::new(false, true);
        let err = execute_validate(&reporter, &args_for(dir.path()))
            .await
            .unwrap_err();
        assert_eq!(err.exit_code(), 1);
        assert_eq!(err.to_string(), "1 of 1 checks failed");
    }
}
