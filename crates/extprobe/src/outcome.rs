//! Check outcomes: the data contract between the runner and the report builder.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// Terminal status of a single check
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CheckStatus {
    /// Check passed
    Passed,
    /// Check failed
    Failed,
}

impl CheckStatus {
    /// Check if status is passing
    #[must_use]
    pub const fn is_passed(&self) -> bool {
        matches!(self, Self::Passed)
    }

    /// Check if status is failing
    #[must_use]
    pub const fn is_failed(&self) -> bool {
        matches!(self, Self::Failed)
    }

    /// Lowercase label, as written to the results file
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Passed => "passed",
            Self::Failed => "failed",
        }
    }
}

impl fmt::Display for CheckStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of one named check
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckOutcome {
    /// Check name, expected to be unique within a run
    pub name: String,
    /// Check status
    pub status: CheckStatus,
    /// Success annotation
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
    /// Failure reason
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Wall-clock time spent on the check
    #[serde(rename = "durationMs", default)]
    pub duration_ms: u64,
}

impl CheckOutcome {
    /// Create a passing outcome
    #[must_use]
    pub fn passed(name: impl Into<String>, details: impl Into<String>, duration: Duration) -> Self {
        Self {
            name: name.into(),
            status: CheckStatus::Passed,
            details: Some(details.into()),
            error: None,
            duration_ms: millis(duration),
        }
    }

    /// Create a failing outcome
    #[must_use]
    pub fn failed(name: impl Into<String>, error: impl Into<String>, duration: Duration) -> Self {
        Self {
            name: name.into(),
            status: CheckStatus::Failed,
            details: None,
            error: Some(error.into()),
            duration_ms: millis(duration),
        }
    }

    /// Check if this outcome passed
    #[must_use]
    pub const fn is_passed(&self) -> bool {
        self.status.is_passed()
    }

    /// Check if this outcome failed
    #[must_use]
    pub const fn is_failed(&self) -> bool {
        self.status.is_failed()
    }

    /// Duration as a `Duration`
    #[must_use]
    pub const fn duration(&self) -> Duration {
        Duration::from_millis(self.duration_ms)
    }

    /// Verify the status/annotation invariant.
    ///
    /// Outcomes built through [`CheckOutcome::passed`] and
    /// [`CheckOutcome::failed`] always satisfy it; this exists for outcomes
    /// read back from a results file.
    pub fn validate(&self) -> Result<(), String> {
        match self.status {
            CheckStatus::Failed if self.error.is_none() => {
                Err(format!("failed check '{}' has no error", self.name))
            }
            CheckStatus::Passed if self.error.is_some() => {
                Err(format!("passed check '{}' carries an error", self.name))
            }
            CheckStatus::Failed if self.details.is_some() => {
                Err(format!("failed check '{}' carries details", self.name))
            }
            _ => Ok(()),
        }
    }
}

fn millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;

    mod check_status_tests {
        use super::*;

        #[test]
        fn test_status_is_passed() {
            assert!(CheckStatus::Passed.is_passed());
            assert!(!CheckStatus::Failed.is_passed());
        }

        #[test]
        fn test_status_is_failed() {
            assert!(CheckStatus::Failed.is_failed());
            assert!(!CheckStatus::Passed.is_failed());
        }

        #[test]
        fn test_status_serializes_lowercase() {
            assert_eq!(
                serde_json::to_string(&CheckStatus::Passed).unwrap(),
                "\"passed\""
            );
            assert_eq!(
                serde_json::to_string(&CheckStatus::Failed).unwrap(),
                "\"failed\""
            );
        }
    }

    mod check_outcome_tests {
        use super::*;

        #[test]
        fn test_passed_outcome() {
            let outcome = CheckOutcome::passed("Extension Loading", "ok", Duration::from_millis(12));
            assert!(outcome.is_passed());
            assert_eq!(outcome.details.as_deref(), Some("ok"));
            assert!(outcome.error.is_none());
            assert_eq!(outcome.duration_ms, 12);
            assert!(outcome.validate().is_ok());
        }

        #[test]
        fn test_failed_outcome() {
            let outcome = CheckOutcome::failed("Background Script", "boom", Duration::ZERO);
            assert!(outcome.is_failed());
            assert_eq!(outcome.error.as_deref(), Some("boom"));
            assert!(outcome.details.is_none());
            assert!(outcome.validate().is_ok());
        }

        #[test]
        fn test_sub_millisecond_duration_truncates() {
            let outcome = CheckOutcome::passed("t", "d", Duration::from_micros(900));
            assert_eq!(outcome.duration_ms, 0);
        }

        #[test]
        fn test_json_field_names() {
            let outcome = CheckOutcome::failed("t", "x", Duration::from_millis(5));
            let json = serde_json::to_value(&outcome).unwrap();
            assert_eq!(json["name"], "t");
            assert_eq!(json["status"], "failed");
            assert_eq!(json["error"], "x");
            assert_eq!(json["durationMs"], 5);
            assert!(json.get("details").is_none());
        }

        #[test]
        fn test_missing_duration_reads_as_zero() {
            let outcome: CheckOutcome =
                serde_json::from_str(r#"{"name":"t","status":"passed","details":"d"}"#).unwrap();
            assert_eq!(outcome.duration_ms, 0);
        }

        #[test]
        fn test_validate_rejects_failed_without_error() {
            let outcome = CheckOutcome {
                name: "t".to_string(),
                status: CheckStatus::Failed,
                details: None,
                error: None,
                duration_ms: 0,
            };
            assert!(outcome.validate().is_err());
        }

        #[test]
        fn test_validate_rejects_passed_with_error() {
            let mut outcome = CheckOutcome::passed("t", "d", Duration::ZERO);
            outcome.error = Some("nope".to_string());
            assert!(outcome.validate().is_err());
        }
    }
}
