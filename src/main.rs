//! Mission Watch - terminal mission observer.
//!
//! Stands in for the rendering layer: subscribes to one mission and
//! prints snapshot transitions and pushed events until the mission
//! reaches a terminal status, then runs one findings reconciliation
//! sweep for a closing summary.

use std::sync::Arc;
use std::time::Duration;

use mission_sync::auth::StaticToken;
use mission_sync::client::ApiClient;
use mission_sync::config::Config;
use mission_sync::reconciler::reconcile_findings;
use mission_sync::session::MissionSession;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "mission_sync=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let mission_id = std::env::args()
        .nth(1)
        .ok_or_else(|| anyhow::anyhow!("usage: mission-watch <mission-id>"))?;

    // Load configuration; a missing base URL is fatal.
    let config = Config::from_env()?;
    let token = std::env::var("MISSION_API_TOKEN")
        .map_err(|_| anyhow::anyhow!("MISSION_API_TOKEN must be set"))?;
    let client = Arc::new(ApiClient::new(&config, Arc::new(StaticToken(token)))?);

    info!("Watching mission {} via {}", mission_id, config.api_base_url);
    let session = MissionSession::open(Arc::clone(&client) as _, &config, mission_id);
    let mut snapshots = session.poller().subscribe();
    let mut events_seen = 0usize;

    loop {
        tokio::select! {
            changed = snapshots.changed() => {
                if changed.is_err() {
                    break;
                }
                let snapshot = snapshots.borrow().clone();
                if let Some(err) = &snapshot.error {
                    eprintln!("fetch error: {}", err);
                }
                match &snapshot.mission {
                    Some(mission) => {
                        println!("status: {:?} (target {})", mission.status, mission.target_url);
                        if mission.status.is_terminal() {
                            break;
                        }
                    }
                    // Initial fetch failed; nothing to watch.
                    None if !snapshot.loading => break,
                    None => {}
                }
            }
            _ = tokio::time::sleep(Duration::from_secs(1)) => {
                let frames = session.live_events().frames().await;
                for frame in frames.iter().skip(events_seen) {
                    println!("event: {}", frame);
                }
                events_seen = frames.len();
            }
        }
    }

    let snapshot = session.poller().snapshot();
    if let Some(mission) = snapshot.mission.clone() {
        let findings = reconcile_findings(client.as_ref(), &[mission]).await;
        println!("{} finding(s)", findings.len());
        for finding in findings {
            println!(
                "- [{}] {} at {}",
                finding.severity,
                finding.vuln_type,
                finding.endpoint.as_deref().unwrap_or(&finding.target_url)
            );
        }
    }

    session.close().await;
    Ok(())
}
