//! extprobe: run a browser extension through its CI check battery
//!
//! ## Usage
//!
//! ```bash
//! extprobe run --extension-dir /app/extension --no-sandbox
//! extprobe validate --extension-dir ./extension
//! extprobe report --results test-results/results.json --output test-report.html
//! extprobe config --config extprobe.yaml
//! ```
//!
//! Exit status: 0 when every check passed, 1 when any check failed, 2 when
//! the run itself could not complete (bad configuration, unwritable report).

use clap::Parser;
use extprobe_cli::{handlers, Cli, CliConfig, CliResult, ColorChoice, Commands, Verbosity};
use std::process::ExitCode;

fn main() -> ExitCode {
    let cli = Cli::parse();

    // Build configuration from CLI args
    let config = build_config(&cli);
    init_tracing(config.verbosity);

    match run(cli, &config) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::from(e.exit_code())
        }
    }
}

fn run(cli: Cli, config: &CliConfig) -> CliResult<()> {
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;

    match cli.command {
        Commands::Run(args) => runtime.block_on(handlers::execute_run(config, &args)),
        Commands::Validate(args) => {
            runtime.block_on(handlers::execute_validate(&config.reporter(), &args))
        }
        Commands::Report(args) => handlers::execute_report(&config.reporter(), &args),
        Commands::Config(args) => handlers::execute_config(&args),
    }
}

fn build_config(cli: &Cli) -> CliConfig {
    let verbosity = if cli.quiet {
        Verbosity::Quiet
    } else {
        match cli.verbose {
            0 => Verbosity::Normal,
            1 => Verbosity::Verbose,
            _ => Verbosity::Debug,
        }
    };

    let color: ColorChoice = cli.color.clone().into();

    CliConfig::new().with_verbosity(verbosity).with_color(color)
}

fn init_tracing(verbosity: Verbosity) {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(verbosity.log_filter())),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}
