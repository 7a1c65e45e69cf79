//! Adaptive poller for a single mission.
//!
//! One `MissionPoller` is bound to one mission id for its whole life.
//! It fetches the authoritative snapshot once immediately, then while the
//! observed status is active schedules exactly one follow-up fetch per
//! completed fetch. Terminal statuses stop the schedule, as does a
//! failure on the very first fetch. Teardown cancels any pending timer
//! and discards an in-flight response, so a stale fetch can never
//! overwrite state after the owner has moved on.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::client::MissionSource;
use crate::model::{Mission, MissionStatus};

/// Last-observed mission state published by a poller.
#[derive(Debug, Clone, Default)]
pub struct MissionSnapshot {
    /// Cached copy of the mission; never authoritative.
    pub mission: Option<Mission>,
    /// True only while the very first fetch is in flight.
    pub loading: bool,
    /// True while a background refresh is in flight. The cached mission
    /// stays visible the whole time.
    pub refreshing: bool,
    /// Error from the most recent failed fetch.
    pub error: Option<String>,
}

/// Poller resource object. Owned by whoever subscribed to the mission;
/// dropping it cancels the poll task.
pub struct MissionPoller {
    mission_id: String,
    snapshot_rx: watch::Receiver<MissionSnapshot>,
    refresh_tx: mpsc::Sender<()>,
    cancel: CancellationToken,
    task: Option<JoinHandle<()>>,
}

impl MissionPoller {
    /// Start polling one mission. The first fetch begins immediately.
    pub fn spawn(
        source: Arc<dyn MissionSource>,
        mission_id: impl Into<String>,
        interval: Duration,
    ) -> Self {
        let mission_id = mission_id.into();
        let (snapshot_tx, snapshot_rx) = watch::channel(MissionSnapshot {
            loading: true,
            ..Default::default()
        });
        let (refresh_tx, refresh_rx) = mpsc::channel(1);
        let cancel = CancellationToken::new();
        let task = tokio::spawn(run(
            source,
            mission_id.clone(),
            interval,
            snapshot_tx,
            refresh_rx,
            cancel.clone(),
        ));
        Self {
            mission_id,
            snapshot_rx,
            refresh_tx,
            cancel,
            task: Some(task),
        }
    }

    /// The mission this poller is bound to.
    pub fn mission_id(&self) -> &str {
        &self.mission_id
    }

    /// Current snapshot.
    pub fn snapshot(&self) -> MissionSnapshot {
        self.snapshot_rx.borrow().clone()
    }

    /// Watch receiver for snapshot updates.
    pub fn subscribe(&self) -> watch::Receiver<MissionSnapshot> {
        self.snapshot_rx.clone()
    }

    /// Trigger an immediate background refresh. Equivalent to the
    /// scheduled refresh; a no-op once the mission has reached a
    /// terminal status and the poll task has exited.
    pub fn refresh(&self) {
        let _ = self.refresh_tx.try_send(());
    }

    /// Cancel the poll task and wait for it to exit.
    pub async fn shutdown(mut self) {
        self.cancel.cancel();
        if let Some(task) = self.task.take() {
            let _ = task.await;
        }
    }
}

impl Drop for MissionPoller {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

async fn run(
    source: Arc<dyn MissionSource>,
    mission_id: String,
    interval: Duration,
    snapshot_tx: watch::Sender<MissionSnapshot>,
    mut refresh_rx: mpsc::Receiver<()>,
    cancel: CancellationToken,
) {
    let mut first = true;
    loop {
        if !first {
            snapshot_tx.send_modify(|s| s.refreshing = true);
        }

        let fetched = tokio::select! {
            _ = cancel.cancelled() => break,
            result = source.fetch_mission(&mission_id) => result,
        };

        let status = apply_fetch(&snapshot_tx, &mission_id, first, fetched);
        first = false;

        match status {
            Some(status) if status.is_active() => {}
            _ => break,
        }

        tokio::select! {
            _ = cancel.cancelled() => break,
            _ = tokio::time::sleep(interval) => {}
            cmd = refresh_rx.recv() => {
                if cmd.is_none() {
                    break;
                }
            }
        }
    }
}

/// Fold a fetch result into the snapshot and report the status that
/// drives the scheduling decision.
fn apply_fetch(
    snapshot_tx: &watch::Sender<MissionSnapshot>,
    mission_id: &str,
    first: bool,
    fetched: Result<Mission, crate::error::SyncError>,
) -> Option<MissionStatus> {
    match fetched {
        Ok(mission) => {
            let status = mission.status;
            snapshot_tx.send_replace(MissionSnapshot {
                mission: Some(mission),
                loading: false,
                refreshing: false,
                error: None,
            });
            Some(status)
        }
        Err(e) if first => {
            // No value was ever obtained: surface the error and stop.
            tracing::warn!(mission_id = %mission_id, "initial mission fetch failed: {}", e);
            snapshot_tx.send_replace(MissionSnapshot {
                mission: None,
                loading: false,
                refreshing: false,
                error: Some(e.to_string()),
            });
            None
        }
        Err(e) => {
            // Background refresh failed: keep the last-good snapshot
            // visible and keep polling while it was still active.
            tracing::warn!(mission_id = %mission_id, "mission refresh failed: {}", e);
            let mut kept = None;
            snapshot_tx.send_modify(|s| {
                s.refreshing = false;
                s.error = Some(e.to_string());
                kept = s.mission.as_ref().map(|m| m.status);
            });
            kept
        }
    }
}
