//! Check runner.
//!
//! Runs a battery sequentially against one target. Every check produces
//! exactly one outcome: errors, panics and budget expiry are all recorded as
//! failures and never stop the battery.

use crate::checks::Check;
use crate::outcome::CheckOutcome;
use crate::target::ExtensionTarget;
use futures::FutureExt;
use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::time::{Duration, Instant};

/// Default wall-clock budget for a whole battery
pub const DEFAULT_RUN_BUDGET: Duration = Duration::from_secs(60);

/// Receives progress while a battery runs
pub trait RunObserver {
    /// A check is about to start (`index` is zero-based)
    fn on_check_start(&self, index: usize, total: usize, name: &str) {
        let _ = (index, total, name);
    }

    /// A check finished
    fn on_outcome(&self, outcome: &CheckOutcome) {
        let _ = outcome;
    }
}

/// Observer that ignores everything
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopObserver;

impl RunObserver for NoopObserver {}

/// Sequential runner with an overall time budget
pub struct CheckRunner {
    checks: Vec<Box<dyn Check>>,
    budget: Duration,
}

impl std::fmt::Debug for CheckRunner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CheckRunner")
            .field("checks", &self.names())
            .field("budget", &self.budget)
            .finish()
    }
}

impl CheckRunner {
    /// Create a runner over `checks` with the default budget
    #[must_use]
    pub fn new(checks: Vec<Box<dyn Check>>) -> Self {
        Self {
            checks,
            budget: DEFAULT_RUN_BUDGET,
        }
    }

    /// Set the battery budget
    #[must_use]
    pub fn with_budget(mut self, budget: Duration) -> Self {
        self.budget = budget;
        self
    }

    /// Battery budget
    #[must_use]
    pub const fn budget(&self) -> Duration {
        self.budget
    }

    /// Check names in execution order
    #[must_use]
    pub fn names(&self) -> Vec<&str> {
        self.checks.iter().map(|c| c.name()).collect()
    }

    /// Number of checks
    #[must_use]
    pub fn len(&self) -> usize {
        self.checks.len()
    }

    /// Whether the battery is empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.checks.is_empty()
    }

    /// Run every check in order and return one outcome per check.
    ///
    /// An empty battery yields a single failed initialization outcome, so the
    /// result is never empty.
    pub async fn run_all(
        &self,
        target: &dyn ExtensionTarget,
        observer: &dyn RunObserver,
    ) -> Vec<CheckOutcome> {
        if self.checks.is_empty() {
            let outcome = CheckOutcome::failed(
                crate::suite::SUITE_INIT_NAME,
                "No checks configured",
                Duration::ZERO,
            );
            observer.on_outcome(&outcome);
            return vec![outcome];
        }

        let total = self.checks.len();
        // a budget too large to represent as an instant means no deadline
        let deadline = Instant::now().checked_add(self.budget);
        let mut outcomes = Vec::with_capacity(total);

        for (index, check) in self.checks.iter().enumerate() {
            let name = check.name();
            observer.on_check_start(index, total, name);
            tracing::debug!(check = name, index, total, "check started");

            let remaining =
                deadline.map_or(self.budget, |d| d.saturating_duration_since(Instant::now()));
            let outcome = if remaining.is_zero() {
                CheckOutcome::failed(name, self.budget_message(), Duration::ZERO)
            } else {
                self.run_one(check.as_ref(), target, remaining).await
            };

            if outcome.is_passed() {
                tracing::info!(check = name, duration_ms = outcome.duration_ms, "check passed");
            } else {
                tracing::warn!(
                    check = name,
                    duration_ms = outcome.duration_ms,
                    error = outcome.error.as_deref().unwrap_or_default(),
                    "check failed"
                );
            }
            observer.on_outcome(&outcome);
            outcomes.push(outcome);
        }

        outcomes
    }

    async fn run_one(
        &self,
        check: &dyn Check,
        target: &dyn ExtensionTarget,
        remaining: Duration,
    ) -> CheckOutcome {
        let name = check.name();
        let start = Instant::now();
        let guarded = AssertUnwindSafe(check.run(target)).catch_unwind();

        match tokio::time::timeout(remaining, guarded).await {
            Ok(Ok(Ok(details))) => CheckOutcome::passed(name, details, start.elapsed()),
            Ok(Ok(Err(e))) => CheckOutcome::failed(name, e.to_string(), start.elapsed()),
            Ok(Err(payload)) => {
                CheckOutcome::failed(name, panic_message(payload.as_ref()), start.elapsed())
            }
            Err(_) => CheckOutcome::failed(name, self.budget_message(), start.elapsed()),
        }
    }

    fn budget_message(&self) -> String {
        format!(
            "Run budget of {}ms exhausted before check completed",
            self.budget.as_millis()
        )
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    let detail = payload
        .downcast_ref::<&str>()
        .map(|s| (*s).to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "unknown panic payload".to_string());
    format!("Check panicked: {detail}")
}
