//! Result and error types for extprobe.

use std::path::PathBuf;
use thiserror::Error;

/// Result type for extprobe operations
pub type ProbeResult<T> = Result<T, ProbeError>;

/// Errors that can occur while probing an extension
#[derive(Debug, Error)]
pub enum ProbeError {
    /// Browser launch error
    #[error("Failed to launch browser: {message}")]
    BrowserLaunchError {
        /// Error message
        message: String,
    },

    /// Talking to the browser over CDP failed
    #[error("Browser connection error: {message}")]
    ConnectionFailed {
        /// Error message
        message: String,
    },

    /// Page error
    #[error("Page error: {message}")]
    PageError {
        /// Error message
        message: String,
    },

    /// Navigation error
    #[error("Navigation to {url} failed: {message}")]
    NavigationError {
        /// URL that failed
        url: String,
        /// Error message
        message: String,
    },

    /// Operation timed out
    #[error("Operation timed out after {ms}ms")]
    Timeout {
        /// Timeout in milliseconds
        ms: u64,
    },

    /// Script evaluation in a browser context failed
    #[error("Evaluation failed: {message}")]
    EvaluationError {
        /// Error message
        message: String,
    },

    /// A check's assertion did not hold
    #[error("{message}")]
    AssertionFailed {
        /// Error message
        message: String,
    },

    /// A required extension file is absent
    #[error("Extension file missing: {file}")]
    MissingFile {
        /// File name relative to the extension directory
        file: String,
    },

    /// The extension manifest could not be used
    #[error("Invalid manifest.json: {message}")]
    InvalidManifest {
        /// Error message
        message: String,
    },

    /// Suite configuration error
    #[error("Configuration error: {message}")]
    Config {
        /// Error message
        message: String,
    },

    /// A stored results file breaks the outcome invariants
    #[error("Invalid results file: {message}")]
    InvalidResults {
        /// Error message
        message: String,
    },

    /// Writing a report artifact failed
    #[error("Failed to write {}: {source}", path.display())]
    Sink {
        /// Artifact path
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// YAML error
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml_ng::Error),
}

impl ProbeError {
    /// Create an assertion failure
    #[must_use]
    pub fn assertion(message: impl Into<String>) -> Self {
        Self::AssertionFailed {
            message: message.into(),
        }
    }

    /// Create a configuration error
    #[must_use]
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Wrap an I/O error raised while writing an artifact
    #[must_use]
    pub fn sink(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Sink {
            path: path.into(),
            source,
        }
    }

    /// Whether this error came from an artifact sink
    #[must_use]
    pub const fn is_sink(&self) -> bool {
        matches!(self, Self::Sink { .. })
    }
}
