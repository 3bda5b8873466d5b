//! CLI command definitions using clap

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// extprobe: run a browser extension through its CI check battery
#[derive(Parser, Debug)]
#[command(name = "extprobe")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Verbosity level (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Quiet mode (suppress non-error output)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Color output (auto, always, never)
    #[arg(long, default_value = "auto", global = true)]
    pub color: ColorArg,

    /// Subcommand to run
    #[command(subcommand)]
    pub command: Commands,
}

/// CLI subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Launch Chromium with the extension, run all checks and write the report
    Run(RunArgs),

    /// Check the extension directory without launching a browser
    Validate(ValidateArgs),

    /// Re-render the HTML report from an existing results file
    Report(ReportArgs),

    /// Print the effective configuration as YAML
    Config(ConfigArgs),
}

/// Arguments shared by commands that build a suite configuration
#[derive(Parser, Debug, Default)]
pub struct SuiteArgs {
    /// YAML configuration file
    #[arg(short, long, env = "EXTPROBE_CONFIG")]
    pub config: Option<PathBuf>,

    /// Directory holding the unpacked extension
    #[arg(short, long)]
    pub extension_dir: Option<PathBuf>,
}

/// Arguments for the run command
#[derive(Parser, Debug, Default)]
#[allow(clippy::struct_excessive_bools)]
pub struct RunArgs {
    /// Configuration and extension location
    #[command(flatten)]
    pub suite: SuiteArgs,

    /// Structured results output
    #[arg(long)]
    pub results: Option<PathBuf>,

    /// HTML report output
    #[arg(long)]
    pub report: Option<PathBuf>,

    /// Page loaded while observing traffic
    #[arg(long)]
    pub probe_url: Option<String>,

    /// Wall-clock budget for the whole battery, in seconds
    #[arg(long)]
    pub budget_secs: Option<u64>,

    /// Chromium executable
    #[arg(long, env = "CHROME_PATH")]
    pub chromium: Option<PathBuf>,

    /// Disable the Chromium sandbox (needed in most containers)
    #[arg(long)]
    pub no_sandbox: bool,

    /// Fail the traffic check when no request was blocked
    #[arg(long)]
    pub require_blocked: bool,

    /// Show the browser window
    #[arg(long)]
    pub headed: bool,
}

/// Arguments for the validate command
#[derive(Parser, Debug, Default)]
pub struct ValidateArgs {
    /// Configuration and extension location
    #[command(flatten)]
    pub suite: SuiteArgs,
}

/// Arguments for the report command
#[derive(Parser, Debug)]
pub struct ReportArgs {
    /// Results file written by `extprobe run`
    #[arg(short, long, default_value = "test-results/results.json")]
    pub results: PathBuf,

    /// Output file
    #[arg(short, long, default_value = "test-report.html")]
    pub output: PathBuf,

    /// Report title
    #[arg(long)]
    pub title: Option<String>,

    /// Report format
    #[arg(short, long, default_value = "html")]
    pub format: ReportFormat,
}

/// Report output format
#[derive(ValueEnum, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ReportFormat {
    /// HTML report
    #[default]
    Html,
    /// Pretty-printed JSON outcome list
    Json,
}

/// Arguments for the config command
#[derive(Parser, Debug, Default)]
pub struct ConfigArgs {
    /// Configuration and extension location
    #[command(flatten)]
    pub suite: SuiteArgs,

    /// Print the built-in defaults instead of the effective configuration
    #[arg(long)]
    pub defaults: bool,
}

/// Color argument
#[derive(ValueEnum, Clone, Debug, Default)]
pub enum ColorArg {
    /// Automatic color detection
    #[default]
    Auto,
    /// Always use colors
    Always,
    /// Never use colors
    Never,
}

impl From<ColorArg> for crate::config::ColorChoice {
    fn from(arg: ColorArg) -> Self {
        match arg {
            ColorArg::Auto => Self::Auto,
            ColorArg::Always => Self::Always,
            ColorArg::Never => Self::Never,
        }
    }
}
