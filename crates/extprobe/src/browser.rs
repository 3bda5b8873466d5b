//! Browser control for headless extension testing.
//!
//! With the `browser` feature this module launches Chromium through
//! chromiumoxide with the extension under test loaded, and implements
//! [`ExtensionTarget`](crate::target::ExtensionTarget) over the Chrome
//! `DevTools` Protocol. Without the feature only the configuration types are
//! available.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Browser configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BrowserConfig {
    /// Run in headless mode
    pub headless: bool,
    /// Path to chromium binary (None = auto-detect)
    pub chromium_path: Option<PathBuf>,
    /// Sandbox mode (disable for containers)
    pub sandbox: bool,
    /// Extra command-line switches
    pub extra_args: Vec<String>,
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            headless: true,
            chromium_path: None,
            sandbox: false,
            extra_args: Vec::new(),
        }
    }
}

impl BrowserConfig {
    /// Set headless mode
    #[must_use]
    pub const fn with_headless(mut self, headless: bool) -> Self {
        self.headless = headless;
        self
    }

    /// Set chromium path
    #[must_use]
    pub fn with_chromium_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.chromium_path = Some(path.into());
        self
    }

    /// Enable or disable the sandbox
    #[must_use]
    pub const fn with_sandbox(mut self, sandbox: bool) -> Self {
        self.sandbox = sandbox;
        self
    }

    /// Add an extra command-line switch
    #[must_use]
    pub fn with_arg(mut self, arg: impl Into<String>) -> Self {
        self.extra_args.push(arg.into());
        self
    }

    /// Command-line switches for a session with `extension_dir` loaded
    #[must_use]
    pub fn launch_args(&self, extension_dir: &Path) -> Vec<String> {
        let extension = extension_dir.display();
        let mut args = vec![
            "--disable-dev-shm-usage".to_string(),
            "--disable-features=VizDisplayCompositor".to_string(),
            "--no-first-run".to_string(),
            "--disable-default-apps".to_string(),
            format!("--load-extension={extension}"),
            format!("--disable-extensions-except={extension}"),
        ];
        if self.headless {
            args.push("--headless=new".to_string());
        }
        if !self.sandbox {
            args.push("--no-sandbox".to_string());
            args.push("--disable-setuid-sandbox".to_string());
        }
        args.extend(self.extra_args.iter().cloned());
        args
    }
}

// ============================================================================
// Real CDP Implementation (when `browser` feature is enabled)
// ============================================================================

#[cfg(feature = "browser")]
mod cdp {
    use super::BrowserConfig;
    use crate::config::SuiteConfig;
    use crate::result::{ProbeError, ProbeResult};
    use crate::target::{ExtensionTarget, TargetInfo, TargetLauncher, TrafficObservation};
    use async_trait::async_trait;
    use chromiumoxide::browser::{Browser as CdpBrowser, BrowserConfig as CdpConfig};
    use chromiumoxide::cdp::browser_protocol::network::{
        EnableParams as NetworkEnableParams, EventLoadingFailed, EventRequestWillBeSent,
    };
    use chromiumoxide::cdp::browser_protocol::target::{
        AttachToTargetParams, DetachFromTargetParams, EventReceivedMessageFromTarget,
        GetTargetsParams, SendMessageToTargetParams, TargetInfo as CdpTargetInfo,
    };
    use futures::{FutureExt, StreamExt};
    use std::collections::HashMap;
    use std::path::Path;
    use std::time::{Duration, Instant};
    use tokio::sync::Mutex;

    const BLOCKED_BY_CLIENT: &str = "net::ERR_BLOCKED_BY_CLIENT";
    const EVALUATE_TIMEOUT: Duration = Duration::from_secs(10);
    const POLL_INTERVAL: Duration = Duration::from_millis(100);

    fn connection(e: impl std::fmt::Display) -> ProbeError {
        ProbeError::ConnectionFailed {
            message: e.to_string(),
        }
    }

    fn page_error(e: impl std::fmt::Display) -> ProbeError {
        ProbeError::PageError {
            message: e.to_string(),
        }
    }

    /// Chromium session with the extension under test loaded
    #[derive(Debug)]
    pub struct ChromiumTarget {
        inner: Mutex<CdpBrowser>,
        handle: tokio::task::JoinHandle<()>,
    }

    impl ChromiumTarget {
        /// Launch Chromium with `extension_dir` loaded
        ///
        /// # Errors
        ///
        /// Returns error if browser cannot be launched
        pub async fn launch(config: &BrowserConfig, extension_dir: &Path) -> ProbeResult<Self> {
            let extension_dir = std::fs::canonicalize(extension_dir)?;

            // chromiumoxide's default switches include --disable-extensions
            let mut builder = CdpConfig::builder()
                .disable_default_args()
                .with_head()
                .args(config.launch_args(&extension_dir));

            if let Some(ref path) = config.chromium_path {
                builder = builder.chrome_executable(path);
            }

            let cdp_config = builder
                .build()
                .map_err(|message| ProbeError::BrowserLaunchError { message })?;

            let (browser, mut handler) = CdpBrowser::launch(cdp_config).await.map_err(|e| {
                ProbeError::BrowserLaunchError {
                    message: e.to_string(),
                }
            })?;

            // Spawn handler task
            let handle = tokio::spawn(async move {
                while let Some(h) = handler.next().await {
                    if h.is_err() {
                        break;
                    }
                }
            });

            tracing::info!(extension = %extension_dir.display(), "chromium launched");

            Ok(Self {
                inner: Mutex::new(browser),
                handle,
            })
        }

        async fn raw_targets(&self) -> ProbeResult<Vec<CdpTargetInfo>> {
            let browser = self.inner.lock().await;
            let response = browser
                .execute(GetTargetsParams::default())
                .await
                .map_err(connection)?;
            Ok(response.result.target_infos.clone())
        }

        async fn evaluate_in(
            &self,
            target: &CdpTargetInfo,
            expression: &str,
        ) -> ProbeResult<serde_json::Value> {
            let browser = self.inner.lock().await;

            let mut attach = AttachToTargetParams::new(target.target_id.clone());
            attach.flatten = Some(false);
            let session_id = browser
                .execute(attach)
                .await
                .map_err(connection)?
                .result
                .session_id
                .clone();

            let mut replies = browser
                .event_listener::<EventReceivedMessageFromTarget>()
                .await
                .map_err(connection)?;

            let request = serde_json::json!({
                "id": 1,
                "method": "Runtime.evaluate",
                "params": {
                    "expression": expression,
                    "returnByValue": true,
                    "awaitPromise": true,
                },
            });
            let mut send = SendMessageToTargetParams::new(request.to_string());
            send.session_id = Some(session_id.clone());
            browser.execute(send).await.map_err(connection)?;

            let wait = async {
                while let Some(event) = replies.next().await {
                    if event.session_id != session_id {
                        continue;
                    }
                    let reply: serde_json::Value = match serde_json::from_str(&event.message) {
                        Ok(reply) => reply,
                        Err(e) => return Err(ProbeError::from(e)),
                    };
                    if reply["id"] == 1 {
                        return Ok(reply);
                    }
                }
                Err(ProbeError::EvaluationError {
                    message: "background context closed before replying".to_string(),
                })
            };
            let reply = tokio::time::timeout(EVALUATE_TIMEOUT, wait)
                .await
                .map_err(|_| ProbeError::Timeout {
                    ms: EVALUATE_TIMEOUT.as_millis() as u64,
                })?;

            let mut detach = DetachFromTargetParams::default();
            detach.session_id = Some(session_id);
            if let Err(e) = browser.execute(detach).await {
                tracing::debug!(error = %e, "detach from background target failed");
            }

            let reply = reply?;
            if let Some(error) = reply.get("error") {
                return Err(ProbeError::EvaluationError {
                    message: error["message"].as_str().unwrap_or("unknown").to_string(),
                });
            }
            if let Some(exception) = reply["result"].get("exceptionDetails") {
                return Err(ProbeError::EvaluationError {
                    message: exception["text"].as_str().unwrap_or("exception").to_string(),
                });
            }
            Ok(reply["result"]["result"]["value"].clone())
        }
    }

    #[async_trait]
    impl ExtensionTarget for ChromiumTarget {
        async fn targets(&self) -> ProbeResult<Vec<TargetInfo>> {
            Ok(self
                .raw_targets()
                .await?
                .into_iter()
                .map(|t| TargetInfo::new(t.r#type, t.url))
                .collect())
        }

        async fn evaluate_background(&self, expression: &str) -> ProbeResult<serde_json::Value> {
            let targets = self.raw_targets().await?;
            let worker = targets
                .iter()
                .find(|t| {
                    t.url.starts_with("chrome-extension://")
                        && matches!(t.r#type.as_str(), "service_worker" | "background_page")
                })
                .ok_or_else(|| ProbeError::assertion("Service worker not found"))?;
            self.evaluate_in(worker, expression).await
        }

        async fn observe_traffic(
            &self,
            url: &str,
            settle: Duration,
        ) -> ProbeResult<TrafficObservation> {
            let page = {
                let browser = self.inner.lock().await;
                browser.new_page("about:blank").await.map_err(page_error)?
            };

            page.execute(NetworkEnableParams::default())
                .await
                .map_err(page_error)?;
            let mut sent = page
                .event_listener::<EventRequestWillBeSent>()
                .await
                .map_err(page_error)?;
            let mut failed = page
                .event_listener::<EventLoadingFailed>()
                .await
                .map_err(page_error)?;

            let navigation = page.goto(url).await.map(|_| ()).map_err(|e| {
                ProbeError::NavigationError {
                    url: url.to_string(),
                    message: e.to_string(),
                }
            });
            if navigation.is_ok() {
                tokio::time::sleep(settle).await;
            }

            let mut urls_by_id = HashMap::new();
            let mut observation = TrafficObservation::default();
            while let Some(Some(event)) = sent.next().now_or_never() {
                urls_by_id.insert(event.request_id.inner().clone(), event.request.url.clone());
                observation.requests.push(event.request.url.clone());
            }
            while let Some(Some(event)) = failed.next().now_or_never() {
                if event.error_text == BLOCKED_BY_CLIENT {
                    let url = urls_by_id
                        .get(event.request_id.inner())
                        .cloned()
                        .unwrap_or_default();
                    observation.blocked.push(url);
                }
            }

            if let Err(e) = page.close().await {
                tracing::debug!(error = %e, "closing probe page failed");
            }
            navigation?;

            tracing::debug!(
                requests = observation.request_count(),
                blocked = observation.blocked_count(),
                "traffic observed"
            );
            Ok(observation)
        }

        async fn await_target_url(
            &self,
            url: &str,
            expected: &str,
            timeout: Duration,
        ) -> ProbeResult<TargetInfo> {
            let page = {
                let browser = self.inner.lock().await;
                browser.new_page("about:blank").await.map_err(page_error)?
            };
            page.goto(url)
                .await
                .map_err(|e| ProbeError::NavigationError {
                    url: url.to_string(),
                    message: e.to_string(),
                })?;

            let deadline = Instant::now() + timeout;
            let found = loop {
                let targets = self.targets().await?;
                if let Some(found) = targets.into_iter().find(|t| t.url == expected) {
                    break Some(found);
                }
                if Instant::now() >= deadline {
                    break None;
                }
                tokio::time::sleep(POLL_INTERVAL).await;
            };

            if let Err(e) = page.close().await {
                tracing::debug!(error = %e, "closing redirect page failed");
            }
            found.ok_or_else(|| {
                ProbeError::assertion(format!("Expected tab not found: {expected}"))
            })
        }

        async fn close(&mut self) -> ProbeResult<()> {
            let mut browser = self.inner.lock().await;
            browser.close().await.map_err(connection)?;
            self.handle.abort();
            Ok(())
        }
    }

    /// Launches [`ChromiumTarget`] sessions from a suite configuration
    #[derive(Debug, Clone, Copy, Default)]
    pub struct ChromiumLauncher;

    #[async_trait]
    impl TargetLauncher for ChromiumLauncher {
        async fn launch(&self, config: &SuiteConfig) -> ProbeResult<Box<dyn ExtensionTarget>> {
            let target = ChromiumTarget::launch(&config.browser, &config.extension_dir).await?;
            Ok(Box::new(target))
        }
    }
}

#[cfg(feature = "browser")]
pub use cdp::{ChromiumLauncher, ChromiumTarget};
