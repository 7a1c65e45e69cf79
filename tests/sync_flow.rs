//! End-to-end synchronization flow over the public API with mock
//! sources: poll a mission through its lifecycle, derive the activity
//! feed from each observation, then reconcile findings once terminal.

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use mission_sync::activity::{ActivityFeed, ACTIVITY_FEED_CAP};
use mission_sync::client::{FindingsSource, MissionSource};
use mission_sync::error::SyncError;
use mission_sync::model::{AgentActivity, MemoryFinding, Mission, MissionStatus};
use mission_sync::poller::MissionPoller;
use mission_sync::reconciler::reconcile_findings;
use serde_json::json;

fn mission(status: MissionStatus) -> Mission {
    let data = match status {
        MissionStatus::Completed => [
            (
                "confirmed_vulns".to_string(),
                json!([{ "vuln_type": "SQL Injection", "severity": "critical" }]),
            ),
            (
                "secrets_found".to_string(),
                json!([{ "payload": "ghp_XXXX" }]),
            ),
        ]
        .into(),
        _ => HashMap::new(),
    };
    Mission {
        id: "m-42".to_string(),
        target_url: "https://shop.example".to_string(),
        status,
        config: HashMap::new(),
        data,
        created_at: Some("2026-08-05T09:00:00Z".to_string()),
        updated_at: None,
    }
}

/// Backend stub: replays a mission lifecycle and has no memory store.
struct StubBackend {
    lifecycle: Mutex<VecDeque<Mission>>,
}

#[async_trait]
impl MissionSource for StubBackend {
    async fn fetch_mission(&self, _mission_id: &str) -> Result<Mission, SyncError> {
        let mut lifecycle = self.lifecycle.lock().expect("lifecycle lock");
        let next = lifecycle.pop_front().expect("lifecycle exhausted");
        if lifecycle.is_empty() {
            // Keep replaying the terminal snapshot for any extra fetch.
            lifecycle.push_back(next.clone());
        }
        Ok(next)
    }
}

#[async_trait]
impl FindingsSource for StubBackend {
    async fn memory_findings(&self, _mission_id: &str) -> Result<Vec<MemoryFinding>, SyncError> {
        Err(SyncError::RequestFailed {
            status: 404,
            message: "no memory store for mission".to_string(),
        })
    }
}

#[tokio::test(start_paused = true)]
async fn mission_lifecycle_drives_activity_and_findings() {
    let backend = Arc::new(StubBackend {
        lifecycle: Mutex::new(
            vec![
                mission(MissionStatus::Discovery),
                mission(MissionStatus::Attacking),
                mission(MissionStatus::Attacking),
                mission(MissionStatus::Completed),
            ]
            .into(),
        ),
    });

    let poller = MissionPoller::spawn(
        Arc::clone(&backend) as Arc<dyn MissionSource>,
        "m-42",
        Duration::from_secs(5),
    );
    let mut snapshots = poller.subscribe();
    let mut feed = ActivityFeed::new();
    let agents = [
        AgentActivity {
            name: "sqli-agent".to_string(),
            task: Some("Injecting into /search".to_string()),
        },
        AgentActivity {
            name: "xss-agent".to_string(),
            task: None,
        },
    ];

    // Observe every snapshot until the mission lands terminal, feeding
    // the activity deduplicator the way a view would.
    let terminal = loop {
        snapshots.changed().await.expect("poller alive");
        let snapshot = snapshots.borrow().clone();
        let Some(m) = snapshot.mission.clone() else {
            continue;
        };
        let active: &[AgentActivity] = if m.status == MissionStatus::Attacking {
            &agents
        } else {
            &[]
        };
        feed.observe(m.status, active, Utc::now());
        if m.status.is_terminal() {
            break m;
        }
    };

    // Discovery + two attack agents + completion; the repeated attack
    // observation added nothing.
    let entries = feed.entries();
    assert!(entries.len() <= ACTIVITY_FEED_CAP);
    assert_eq!(entries.len(), 4);
    assert_eq!(entries[0].agent, "system");
    assert!(entries.iter().any(|e| e.agent == "sqli-agent"));
    assert!(entries.iter().any(|e| e.agent == "xss-agent"));
    assert!(entries.iter().any(|e| e.agent == "recon"));

    // Memory store is missing, so reconciliation falls back to the
    // findings embedded in the terminal mission record.
    let findings = reconcile_findings(backend.as_ref(), &[terminal]).await;
    assert_eq!(findings.len(), 2);
    assert!(findings
        .iter()
        .any(|f| f.vuln_type == "SQL Injection" && f.severity == "critical"));
    assert!(findings
        .iter()
        .any(|f| f.vuln_type == "Secret Exposure" && f.mission_id == "m-42"));

    poller.shutdown().await;
}
