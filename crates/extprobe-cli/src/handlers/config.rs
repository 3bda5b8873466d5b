//! Config command handler

use crate::commands::{ConfigArgs, SuiteArgs};
use crate::error::CliResult;
use extprobe::SuiteConfig;

/// Load the suite configuration named by `args` and apply its overrides.
///
/// Without `--config` the built-in defaults are used.
pub fn load_suite_config(args: &SuiteArgs) -> CliResult<SuiteConfig> {
    let mut config = match &args.config {
        Some(path) => {
            tracing::debug!(path = %path.display(), "loading configuration");
            SuiteConfig::from_yaml_file(path)?
        }
        None => SuiteConfig::default(),
    };
    if let Some(dir) = &args.extension_dir {
        config.extension_dir.clone_from(dir);
    }
    Ok(config)
}

/// Render the configuration the command would use
pub fn render_config(args: &ConfigArgs) -> CliResult<String> {
    let config = if args.defaults {
        SuiteConfig::default()
    } else {
        load_suite_config(&args.suite)?
    };
    Ok(config.to_yaml()?)
}

/// Execute the config command
pub fn execute_config(args: &ConfigArgs) -> CliResult<()> {
    print!("{}", render_config(args)?);
    Ok(())
}
