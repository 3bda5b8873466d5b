//! Extension targets - the live browser session a check battery runs against.
//!
//! Checks only ever see `&dyn ExtensionTarget`, so the same battery runs
//! against Chromium over CDP (feature `browser`) or [`MockTarget`] in tests.

use crate::config::SuiteConfig;
use crate::result::{ProbeError, ProbeResult};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// A browser target (page, service worker, background page, ...)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TargetInfo {
    /// CDP target type, e.g. `page` or `service_worker`
    pub kind: String,
    /// Target URL
    pub url: String,
}

impl TargetInfo {
    /// Create a new target description
    #[must_use]
    pub fn new(kind: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            url: url.into(),
        }
    }

    /// Whether this target hosts an extension's background context
    #[must_use]
    pub fn is_extension_background(&self) -> bool {
        matches!(self.kind.as_str(), "service_worker" | "background_page")
    }
}

/// Requests seen while a page loaded
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrafficObservation {
    /// URLs of every request the page issued
    pub requests: Vec<String>,
    /// URLs of requests that failed with `net::ERR_BLOCKED_BY_CLIENT`
    pub blocked: Vec<String>,
}

impl TrafficObservation {
    /// Number of observed requests
    #[must_use]
    pub fn request_count(&self) -> usize {
        self.requests.len()
    }

    /// Number of requests blocked by the client
    #[must_use]
    pub fn blocked_count(&self) -> usize {
        self.blocked.len()
    }
}

/// Live session with an extension loaded.
///
/// Implementations must leave the session usable after every call; only
/// [`ExtensionTarget::close`] tears it down.
#[async_trait]
pub trait ExtensionTarget: Send + Sync {
    /// List the browser's current targets
    async fn targets(&self) -> ProbeResult<Vec<TargetInfo>>;

    /// Evaluate an expression in the extension's background context and
    /// return its JSON value
    async fn evaluate_background(&self, expression: &str) -> ProbeResult<serde_json::Value>;

    /// Open a fresh page, navigate to `url`, wait `settle`, close the page and
    /// report the requests observed meanwhile
    async fn observe_traffic(&self, url: &str, settle: Duration)
        -> ProbeResult<TrafficObservation>;

    /// Navigate a fresh page to `url` and wait for a target whose URL equals
    /// `expected`
    async fn await_target_url(
        &self,
        url: &str,
        expected: &str,
        timeout: Duration,
    ) -> ProbeResult<TargetInfo>;

    /// Tear the session down
    async fn close(&mut self) -> ProbeResult<()>;
}

/// Acquires a live target for a suite
#[async_trait]
pub trait TargetLauncher: Send + Sync {
    /// Launch a session with the configured extension loaded
    async fn launch(&self, config: &SuiteConfig) -> ProbeResult<Box<dyn ExtensionTarget>>;
}

/// Mock target for unit testing
#[derive(Debug, Clone, Default)]
pub struct MockTarget {
    /// Targets reported by [`ExtensionTarget::targets`]
    pub targets: Vec<TargetInfo>,
    /// Value returned from background evaluation (`None` = error)
    pub background_value: Option<serde_json::Value>,
    /// Traffic returned from observation (`None` = navigation error)
    pub traffic: Option<TrafficObservation>,
    /// Artificial latency applied to every call
    pub latency: Duration,
    /// Call history for verification
    pub call_history: std::sync::Arc<std::sync::Mutex<Vec<String>>>,
}

impl MockTarget {
    /// Create new mock target
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A target that behaves like a healthy extension session
    #[must_use]
    pub fn healthy() -> Self {
        Self {
            targets: vec![
                TargetInfo::new("page", "about:blank"),
                TargetInfo::new("service_worker", "chrome-extension://abc/background.js"),
            ],
            background_value: Some(serde_json::json!({
                "hasChrome": true,
                "hasWebRequest": true,
            })),
            traffic: Some(TrafficObservation {
                requests: vec![
                    "https://example.com/".to_string(),
                    "https://tracker.test/pixel.gif".to_string(),
                ],
                blocked: vec!["https://tracker.test/pixel.gif".to_string()],
            }),
            ..Self::default()
        }
    }

    /// Set artificial latency
    #[must_use]
    pub const fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    /// Get call history
    #[must_use]
    pub fn history(&self) -> Vec<String> {
        self.call_history
            .lock()
            .map(|h| h.clone())
            .unwrap_or_default()
    }

    /// Check if method was called
    #[must_use]
    pub fn was_called(&self, method: &str) -> bool {
        self.history().iter().any(|c| c.starts_with(method))
    }

    async fn record(&self, call: String) {
        if let Ok(mut history) = self.call_history.lock() {
            history.push(call);
        }
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
    }
}

#[async_trait]
impl ExtensionTarget for MockTarget {
    async fn targets(&self) -> ProbeResult<Vec<TargetInfo>> {
        self.record("targets".to_string()).await;
        Ok(self.targets.clone())
    }

    async fn evaluate_background(&self, expression: &str) -> ProbeResult<serde_json::Value> {
        let _ = expression;
        self.record("evaluate_background".to_string()).await;
        if !self.targets.iter().any(TargetInfo::is_extension_background) {
            return Err(ProbeError::assertion("Service worker not found"));
        }
        self.background_value
            .clone()
            .ok_or_else(|| ProbeError::EvaluationError {
                message: "No mock background value set".to_string(),
            })
    }

    async fn observe_traffic(
        &self,
        url: &str,
        _settle: Duration,
    ) -> ProbeResult<TrafficObservation> {
        self.record(format!("observe_traffic:{url}")).await;
        self.traffic
            .clone()
            .ok_or_else(|| ProbeError::NavigationError {
                url: url.to_string(),
                message: "net::ERR_NAME_NOT_RESOLVED".to_string(),
            })
    }

    async fn await_target_url(
        &self,
        url: &str,
        expected: &str,
        timeout: Duration,
    ) -> ProbeResult<TargetInfo> {
        self.record(format!("await_target_url:{url}")).await;
        self.targets
            .iter()
            .find(|t| t.url == expected)
            .cloned()
            .ok_or(ProbeError::Timeout {
                ms: u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX),
            })
    }

    async fn close(&mut self) -> ProbeResult<()> {
        self.record("close".to_string()).await;
        Ok(())
    }
}

/// Launcher handing out clones of a [`MockTarget`], or failing
#[derive(Debug, Clone, Default)]
pub struct MockLauncher {
    /// Target to hand out (`None` = launch failure)
    pub target: Option<MockTarget>,
    /// Artificial delay before the launch resolves
    pub launch_delay: Duration,
}

impl MockLauncher {
    /// Launcher that succeeds with `target`
    #[must_use]
    pub const fn with_target(target: MockTarget) -> Self {
        Self {
            target: Some(target),
            launch_delay: Duration::ZERO,
        }
    }

    /// Launcher that always fails
    #[must_use]
    pub const fn failing() -> Self {
        Self {
            target: None,
            launch_delay: Duration::ZERO,
        }
    }

    /// Delay every launch by `delay`
    #[must_use]
    pub const fn with_launch_delay(mut self, delay: Duration) -> Self {
        self.launch_delay = delay;
        self
    }
}

#[async_trait]
impl TargetLauncher for MockLauncher {
    async fn launch(&self, _config: &SuiteConfig) -> ProbeResult<Box<dyn ExtensionTarget>> {
        if !self.launch_delay.is_zero() {
            tokio::time::sleep(self.launch_delay).await;
        }
        match &self.target {
            Some(target) => Ok(Box::new(target.clone())),
            None => Err(ProbeError::BrowserLaunchError {
                message: "mock launcher configured to fail".to_string(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    mod target_info_tests {
        use super::*;

        #[test]
        fn test_extension_background_kinds() {
            assert!(TargetInfo::new("service_worker", "x").is_extension_background());
            assert!(TargetInfo::new("background_page", "x").is_extension_background());
            assert!(!TargetInfo::new("page", "x").is_extension_background());
        }
    }

    mod mock_target_tests {
        use super::*;

        #[tokio::test]
        async fn test_healthy_mock() {
            let target = MockTarget::healthy();
            let targets = target.targets().await.unwrap();
            assert!(targets.iter().any(TargetInfo::is_extension_background));
            let traffic = target
                .observe_traffic("https://example.com", Duration::ZERO)
                .await
                .unwrap();
            assert_eq!(traffic.request_count(), 2);
            assert_eq!(traffic.blocked_count(), 1);
            assert!(target.was_called("observe_traffic"));
        }

        #[tokio::test]
        async fn test_background_requires_worker() {
            let target = MockTarget::new();
            let err = target.evaluate_background("1").await.unwrap_err();
            assert_eq!(err.to_string(), "Service worker not found");
        }

        #[tokio::test]
        async fn test_close_is_recorded() {
            let mut target = MockTarget::new();
            target.close().await.unwrap();
            assert!(target.was_called("close"));
        }

        #[tokio::test]
        async fn test_failing_launcher() {
            let launcher = MockLauncher::failing();
            let result = launcher.launch(&SuiteConfig::default()).await;
            assert!(result.is_err());
        }
    }
}
