//! The fixed check battery.
//!
//! A check returns `Ok(details)` on success or an error whose message becomes
//! the outcome's `error`. Checks never close or otherwise tear down the
//! shared target.

use crate::config::{RedirectProbe, SuiteConfig, TRACKER_LIST_FILE};
use crate::result::{ProbeError, ProbeResult};
use crate::target::{ExtensionTarget, TargetInfo};
use async_trait::async_trait;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// A named check run against a live target
#[async_trait]
pub trait Check: Send + Sync {
    /// Stable check name
    fn name(&self) -> &str;

    /// Run the check, returning a success annotation
    async fn run(&self, target: &dyn ExtensionTarget) -> ProbeResult<String>;
}

/// The extension's background context is registered
#[derive(Debug, Clone, Copy, Default)]
pub struct ExtensionLoading;

#[async_trait]
impl Check for ExtensionLoading {
    fn name(&self) -> &str {
        "Extension Loading"
    }

    async fn run(&self, target: &dyn ExtensionTarget) -> ProbeResult<String> {
        let targets = target.targets().await?;
        if !targets.iter().any(TargetInfo::is_extension_background) {
            return Err(ProbeError::assertion("Extension service worker not found"));
        }
        Ok("Extension loaded successfully with service worker".to_string())
    }
}

const BACKGROUND_PROBE: &str = "({ \
    hasChrome: typeof chrome !== 'undefined', \
    hasWebRequest: typeof chrome !== 'undefined' && typeof chrome.webRequest !== 'undefined' \
})";

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct BackgroundApis {
    has_chrome: bool,
    has_web_request: bool,
}

/// The background context exposes the extension APIs the blocker relies on
#[derive(Debug, Clone, Copy, Default)]
pub struct BackgroundScript;

#[async_trait]
impl Check for BackgroundScript {
    fn name(&self) -> &str {
        "Background Script"
    }

    async fn run(&self, target: &dyn ExtensionTarget) -> ProbeResult<String> {
        let value = target.evaluate_background(BACKGROUND_PROBE).await?;
        let apis: BackgroundApis = serde_json::from_value(value)?;
        if !apis.has_chrome || !apis.has_web_request {
            return Err(ProbeError::assertion(
                "Chrome APIs not available in background script",
            ));
        }
        Ok("Background script loaded with Chrome APIs".to_string())
    }
}

/// Loads a page with the extension active and counts what it blocked
#[derive(Debug, Clone)]
pub struct TrackerBlocking {
    /// Page to load
    pub probe_url: String,
    /// Wait after navigation for late requests
    pub settle: Duration,
    /// Fail when no request was blocked
    pub require_blocked: bool,
}

#[async_trait]
impl Check for TrackerBlocking {
    fn name(&self) -> &str {
        "Tracker Blocking"
    }

    async fn run(&self, target: &dyn ExtensionTarget) -> ProbeResult<String> {
        let traffic = target.observe_traffic(&self.probe_url, self.settle).await?;
        let observed = traffic.request_count();
        let blocked = traffic.blocked_count();

        if observed == 0 {
            return Err(ProbeError::assertion(format!(
                "No requests observed while loading {}",
                self.probe_url
            )));
        }
        if self.require_blocked && blocked == 0 {
            return Err(ProbeError::assertion(format!(
                "No requests were blocked by the extension ({observed} observed)"
            )));
        }
        Ok(format!(
            "Monitored {observed} requests, {blocked} blocked by client"
        ))
    }
}

/// The bundled tracker list is present and non-empty
#[derive(Debug, Clone)]
pub struct TrackerUrlsLoading {
    /// Unpacked extension directory
    pub extension_dir: PathBuf,
}

#[async_trait]
impl Check for TrackerUrlsLoading {
    fn name(&self) -> &str {
        "Tracker URLs Loading"
    }

    async fn run(&self, _target: &dyn ExtensionTarget) -> ProbeResult<String> {
        let count = count_tracker_urls(&self.extension_dir).await?;
        Ok(format!("Successfully loaded {count} tracker URLs"))
    }
}

/// Count the entries of the tracker list in `extension_dir`
pub async fn count_tracker_urls(extension_dir: &Path) -> ProbeResult<usize> {
    let path = extension_dir.join(TRACKER_LIST_FILE);
    let text = match tokio::fs::read_to_string(&path).await {
        Ok(text) => text,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => String::new(),
        Err(e) => return Err(e.into()),
    };
    let count = text.lines().filter(|line| !line.trim().is_empty()).count();
    if count == 0 {
        return Err(ProbeError::assertion(format!(
            "{TRACKER_LIST_FILE} is empty or not found"
        )));
    }
    Ok(count)
}

/// Opening a known tracking link lands on the real destination
#[derive(Debug, Clone)]
pub struct TrackerRedirect {
    /// Link and expected destination
    pub probe: RedirectProbe,
}

#[async_trait]
impl Check for TrackerRedirect {
    fn name(&self) -> &str {
        "Tracker Redirect"
    }

    async fn run(&self, target: &dyn ExtensionTarget) -> ProbeResult<String> {
        let found = target
            .await_target_url(
                &self.probe.tracker_url,
                &self.probe.expected_url,
                self.probe.timeout(),
            )
            .await
            .map_err(|e| match e {
                ProbeError::Timeout { .. } => ProbeError::assertion(format!(
                    "Expected tab not found: {}",
                    self.probe.expected_url
                )),
                other => other,
            })?;
        Ok(format!("Extension redirected to {}", found.url))
    }
}

/// The battery for `config`, in execution order
#[must_use]
pub fn standard_battery(config: &SuiteConfig) -> Vec<Box<dyn Check>> {
    let mut checks: Vec<Box<dyn Check>> = vec![
        Box::new(ExtensionLoading),
        Box::new(BackgroundScript),
        Box::new(TrackerBlocking {
            probe_url: config.probe_url.clone(),
            settle: config.traffic_settle(),
            require_blocked: config.require_blocked,
        }),
        Box::new(TrackerUrlsLoading {
            extension_dir: config.extension_dir.clone(),
        }),
    ];
    if let Some(probe) = &config.redirect {
        checks.push(Box::new(TrackerRedirect {
            probe: probe.clone(),
        }));
    }
    checks
}

/// Verify the extension directory before anything is launched.
///
/// Every required file must exist and `manifest.json`, when required, must be
/// a JSON object declaring `manifest_version`.
pub fn preflight(extension_dir: &Path, required_files: &[String]) -> ProbeResult<()> {
    for file in required_files {
        if !extension_dir.join(file).is_file() {
            return Err(ProbeError::MissingFile { file: file.clone() });
        }
    }

    if required_files.iter().any(|f| f == "manifest.json") {
        let text = std::fs::read_to_string(extension_dir.join("manifest.json"))?;
        let manifest: serde_json::Value =
            serde_json::from_str(&text).map_err(|e| ProbeError::InvalidManifest {
                message: e.to_string(),
            })?;
        if manifest.get("manifest_version").is_none() {
            return Err(ProbeError::InvalidManifest {
                message: "missing manifest_version".to_string(),
            });
        }
    }

    Ok(())
}
