//! Workspace activity tracking and idle reclamation: a concurrent map of
//! workspace id to expiration instant, refreshed by status notifications and
//! activity pings, swept by a periodic background task that stops expired
//! workspaces through the workspace control collaborator.

use chrono::Utc;
use dashmap::DashMap;
use log::{error, info, warn};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use crate::core::{RuntimeError, RuntimeResult};
use crate::infra::{WorkspaceControl, WorkspaceStatus};

/// Workspace attribute marking a stop performed by the activity checker,
/// machine-readable so downstream UIs can explain the stoppage.
pub const STOPPED_BY_ACTIVITY_CHECKER_ATTRIBUTE: &str = "stoppedByActivityChecker";

/// Tracks per-workspace expiration instants (epoch milliseconds).
///
/// Safe for concurrent use from status-notification threads, request
/// threads and the reclamation scanner without external locking.
pub struct WorkspaceActivityTracker {
    expirations: DashMap<String, i64>,
    timeout_ms: i64,
    control: Arc<dyn WorkspaceControl>,
}

impl WorkspaceActivityTracker {
    /// A non-positive `timeout_ms` disables tracking: no entry is ever
    /// created.
    pub fn new(timeout_ms: i64, control: Arc<dyn WorkspaceControl>) -> Self {
        Self {
            expirations: DashMap::new(),
            timeout_ms,
            control,
        }
    }

    /// Records activity at `activity_ms`, moving the workspace's expiration
    /// to `activity_ms + timeout`. Last write wins; no history is kept.
    pub fn update(&self, workspace_id: &str, activity_ms: i64) {
        if self.timeout_ms <= 0 {
            return;
        }
        self.expirations
            .insert(workspace_id.to_string(), activity_ms + self.timeout_ms);
    }

    pub fn remove(&self, workspace_id: &str) {
        self.expirations.remove(workspace_id);
    }

    pub fn tracked_count(&self) -> usize {
        self.expirations.len()
    }

    pub fn expiration(&self, workspace_id: &str) -> Option<i64> {
        self.expirations.get(workspace_id).map(|entry| *entry.value())
    }

    /// Reacts to a workspace status transition.
    ///
    /// `Running` starts (or refreshes) tracking, after clearing a stale
    /// stop marker left by an earlier reclamation; `Stopped` drops the entry
    /// immediately.
    pub async fn handle_status_change(&self, workspace_id: &str, status: WorkspaceStatus) {
        match status {
            WorkspaceStatus::Running => {
                if self.timeout_ms <= 0 {
                    return;
                }
                self.clear_stop_marker(workspace_id).await;
                self.update(workspace_id, Utc::now().timestamp_millis());
            }
            WorkspaceStatus::Stopped => self.remove(workspace_id),
            WorkspaceStatus::Starting | WorkspaceStatus::Stopping => {}
        }
    }

    /// Best effort: a failure here is logged and does not block tracking.
    async fn clear_stop_marker(&self, workspace_id: &str) {
        match self.control.get_workspace(workspace_id).await {
            Ok(mut snapshot) => {
                if snapshot
                    .attributes
                    .remove(STOPPED_BY_ACTIVITY_CHECKER_ATTRIBUTE)
                    .is_some()
                {
                    if let Err(e) = self.control.update_workspace(&snapshot).await {
                        warn!(
                            "failed to clear activity stop marker on workspace '{}': {}",
                            workspace_id, e
                        );
                    }
                }
            }
            Err(e) => warn!(
                "failed to load workspace '{}' while clearing stop marker: {}",
                workspace_id, e
            ),
        }
    }

    /// One reclamation pass: stops every workspace whose expiration is at or
    /// before `now_ms` and removes its entry whatever the outcome, so an
    /// entry that fails to stop is never retried indefinitely.
    pub async fn reclaim_expired(&self, now_ms: i64) {
        let expired: Vec<String> = self
            .expirations
            .iter()
            .filter(|entry| *entry.value() <= now_ms)
            .map(|entry| entry.key().clone())
            .collect();

        for workspace_id in expired {
            match self.reclaim(&workspace_id).await {
                Ok(()) => info!("stopped idle workspace '{}'", workspace_id),
                Err(RuntimeError::NotFound(_)) => {}
                Err(RuntimeError::Conflict(message)) => warn!(
                    "workspace '{}' was already stopping or stopped: {}",
                    workspace_id, message
                ),
                Err(e) => error!("{}", e),
            }
            self.expirations.remove(&workspace_id);
        }
    }

    /// Marks the workspace as stopped by the activity checker, persists the
    /// snapshot and requests the stop.
    async fn reclaim(&self, workspace_id: &str) -> RuntimeResult<()> {
        let result: RuntimeResult<()> = async {
            let mut snapshot = self.control.get_workspace(workspace_id).await?;
            snapshot.attributes.insert(
                STOPPED_BY_ACTIVITY_CHECKER_ATTRIBUTE.to_string(),
                "true".to_string(),
            );
            self.control.update_workspace(&snapshot).await?;
            self.control.stop_workspace(workspace_id).await
        }
        .await;

        match result {
            Err(e @ (RuntimeError::NotFound(_) | RuntimeError::Conflict(_))) => Err(e),
            Err(e) => Err(RuntimeError::Reclamation(format!(
                "failed to stop idle workspace '{}': {}",
                workspace_id, e
            ))),
            Ok(()) => Ok(()),
        }
    }
}

/// Timer-driven reclamation loop with an injectable period, started and
/// stopped explicitly at process lifecycle boundaries.
pub struct ActivityCheckScheduler {
    tracker: Arc<WorkspaceActivityTracker>,
    period: Duration,
    handle: Option<JoinHandle<()>>,
}

impl ActivityCheckScheduler {
    pub fn new(tracker: Arc<WorkspaceActivityTracker>, period_ms: u64) -> Self {
        Self {
            tracker,
            period: Duration::from_millis(period_ms),
            handle: None,
        }
    }

    /// Spawns the scan loop. A zero period disables the scheduler.
    pub fn start(&mut self) {
        if self.handle.is_some() {
            return;
        }
        if self.period.is_zero() {
            warn!("activity check scheduler disabled: scan period is zero");
            return;
        }

        let tracker = self.tracker.clone();
        let period = self.period;
        self.handle = Some(tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                tracker.reclaim_expired(Utc::now().timestamp_millis()).await;
            }
        }));
    }

    pub fn stop(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
        }
    }

    pub fn is_running(&self) -> bool {
        self.handle.is_some()
    }
}

impl Drop for ActivityCheckScheduler {
    fn drop(&mut self) {
        self.stop();
    }
}
