//! Command handlers - extracted from main.rs for testability
//!
//! Each handler module contains:
//! - The execution logic for a CLI command
//! - Pure helper functions
//! - Tests

pub mod config;
pub mod report;
pub mod run;
pub mod validate;

// Re-export handlers for convenient access
pub use config::{execute_config, load_suite_config};
pub use report::{execute_report, load_report, render_report};
pub use run::{apply_run_overrides, execute_run, run_with_launcher};
pub use validate::execute_validate;
