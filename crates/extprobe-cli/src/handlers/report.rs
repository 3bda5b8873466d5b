//! Report command handler

use crate::commands::{ReportArgs, ReportFormat};
use crate::error::CliResult;
use crate::output::ProgressReporter;
use extprobe::RunReport;

/// Load a stored results file, applying the title override
pub fn load_report(args: &ReportArgs) -> CliResult<RunReport> {
    let report = RunReport::load(&args.results)?;
    Ok(match &args.title {
        Some(title) => report.with_title(title.clone()),
        None => report,
    })
}

/// Render a stored results file in the requested format
pub fn render_report(args: &ReportArgs) -> CliResult<String> {
    let report = load_report(args)?;
    Ok(match args.format {
        ReportFormat::Html => report.render_html(),
        ReportFormat::Json => report.render_json()?,
    })
}

/// Execute the report command
pub fn execute_report(reporter: &ProgressReporter, args: &ReportArgs) -> CliResult<()> {
    let report = load_report(args)?;
    match args.format {
        ReportFormat::Html => report.write_html(&args.output)?,
        ReportFormat::Json => report.write_json(&args.output)?,
    }

    reporter.info(&format!("Report generated at: {}", args.output.display()));
    reporter.info(&report.summary());
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use extprobe::CheckOutcome;
    use std::path::{Path, PathBuf};
    use std::time::Duration;

    fn write_results(dir: &Path) -> PathBuf {
        let report = RunReport::new(vec![
            CheckOutcome::passed("Extension Loading", "ok", Duration::from_millis(10)),
            CheckOutcome::failed("Background Script", "x", Duration::from_millis(5)),
        ]);
        let path = dir.join("results.json");
        report.write_json(&path).unwrap();
        path
    }

    fn args(results: PathBuf, output: PathBuf) -> ReportArgs {
        ReportArgs {
            results,
            output,
            title: None,
            format: ReportFormat::Html,
        }
    }

    #[test]
    fn test_render_html_from_results() {
        let dir = tempfile::tempdir().unwrap();
        let results = write_results(dir.path());
        let args = args(results, dir.path().join("out.html"));
        assert_eq!(load_report(&args).unwrap().failed_count(), 1);
        let html = render_report(&args).unwrap();
        assert!(html.contains("Background Script"));
        assert!(html.contains("Report generated on"));
    }

    #[test]
    fn test_custom_title() {
        let dir = tempfile::tempdir().unwrap();
        let results = write_results(dir.path());
        let mut args = args(results, dir.path().join("out.html"));
        args.title = Some("Nightly run".to_string());
        assert!(render_report(&args).unwrap().contains("Nightly run"));
    }

    #[test]
    fn test_execute_writes_nested_output() {
        let dir = tempfile::tempdir().unwrap();
        let results = write_results(dir.path());
        let output = dir.path().join("nested/report.html");
        execute_report(&ProgressReporter::new(false, true), &args(results, output.clone()))
            .unwrap();
        assert!(output.exists());
    }

    #[test]
    fn test_json_format_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let results = write_results(dir.path());
        let mut args = args(results.clone(), dir.path().join("copy.json"));
        args.format = ReportFormat::Json;
        let json = render_report(&args).unwrap();
        assert_eq!(json, std::fs::read_to_string(results).unwrap());
    }

    #[test]
    fn test_inconsistent_results_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let results = dir.path().join("results.json");
        std::fs::write(
            &results,
            r#"[{"name": "a", "status": "failed", "details": "all good"}]"#,
        )
        .unwrap();
        let output = dir.path().join("out.html");

        let err = execute_report(&ProgressReporter::new(false, true), &args(results, output.clone()))
            .unwrap_err();
        assert_eq!(err.exit_code(), 2);
        assert!(err.to_string().contains("Invalid results file"));
        assert!(!output.exists());
    }

    #[test]
    fn test_missing_results_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope.json");
        assert!(render_report(&args(missing, dir.path().join("out.html"))).is_err());
    }
}
