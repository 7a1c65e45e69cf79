//! Synthetic activity feed.
//!
//! The server reports phases, not human-readable activity, so the feed
//! is derived client-side from the observed status. Re-observing the
//! same status with the same agent set must not grow the feed: entries
//! are deduplicated on `(agent, message)` scanning newest-first, then
//! truncated to the cap.

use chrono::{DateTime, Utc};
use std::collections::HashSet;

use crate::model::{ActivityEntry, ActivityKind, AgentActivity, MissionStatus};

/// Maximum retained activity entries, most-recent-first.
pub const ACTIVITY_FEED_CAP: usize = 50;

/// Capped, order-stable feed of synthetic activity entries.
#[derive(Debug, Default)]
pub struct ActivityFeed {
    entries: Vec<ActivityEntry>,
}

impl ActivityFeed {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current entries, most recent first.
    pub fn entries(&self) -> &[ActivityEntry] {
        &self.entries
    }

    /// Fold one status observation into the feed.
    ///
    /// Synthesizes the entries for the status, prepends them, drops
    /// `(agent, message)` duplicates keeping the newest occurrence, and
    /// truncates to the cap. Idempotent for a repeated
    /// `(status, agents)` pair.
    pub fn observe(
        &mut self,
        status: MissionStatus,
        active_agents: &[AgentActivity],
        now: DateTime<Utc>,
    ) {
        let mut next = synthesize(status, active_agents, now);
        next.append(&mut self.entries);

        let mut seen = HashSet::new();
        next.retain(|e| seen.insert((e.agent.clone(), e.message.clone())));
        next.truncate(ACTIVITY_FEED_CAP);
        self.entries = next;
    }
}

/// Deterministically derive the entries for one status observation.
fn synthesize(
    status: MissionStatus,
    active_agents: &[AgentActivity],
    now: DateTime<Utc>,
) -> Vec<ActivityEntry> {
    let entry = |agent: &str, message: String, kind: ActivityKind| ActivityEntry {
        timestamp: now,
        agent: agent.to_string(),
        message,
        kind,
    };

    match status {
        MissionStatus::Pending => vec![entry(
            "scheduler",
            "Mission queued, waiting for an execution slot".to_string(),
            ActivityKind::Info,
        )],
        MissionStatus::Discovery => vec![entry(
            "recon",
            "Enumerating attack surface on the target".to_string(),
            ActivityKind::Info,
        )],
        MissionStatus::Analyzing => vec![entry(
            "analysis",
            "Correlating discovered endpoints and parameters".to_string(),
            ActivityKind::Info,
        )],
        MissionStatus::Attacking => {
            if active_agents.is_empty() {
                vec![entry(
                    "attack",
                    "Exploitation agents engaging the target".to_string(),
                    ActivityKind::Warning,
                )]
            } else {
                active_agents
                    .iter()
                    .map(|agent| {
                        let message = agent.task.clone().unwrap_or_else(|| {
                            "Probing the target for exploitable behavior".to_string()
                        });
                        entry(&agent.name, message, ActivityKind::Warning)
                    })
                    .collect()
            }
        }
        MissionStatus::Validating => vec![entry(
            "validation",
            "Re-testing candidate findings for false positives".to_string(),
            ActivityKind::Info,
        )],
        MissionStatus::Reporting => vec![entry(
            "reporting",
            "Compiling the mission report".to_string(),
            ActivityKind::Info,
        )],
        MissionStatus::Running => vec![entry(
            "orchestrator",
            "Mission agents are running".to_string(),
            ActivityKind::Info,
        )],
        MissionStatus::Completed => vec![entry(
            "system",
            "Mission completed".to_string(),
            ActivityKind::Success,
        )],
        MissionStatus::Failed => vec![entry(
            "system",
            "Mission failed".to_string(),
            ActivityKind::Error,
        )],
        MissionStatus::Unknown => Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(secs, 0).single().expect("valid timestamp")
    }

    fn agents(names: &[&str]) -> Vec<AgentActivity> {
        names
            .iter()
            .map(|n| AgentActivity {
                name: n.to_string(),
                task: None,
            })
            .collect()
    }

    #[test]
    fn attack_phase_synthesizes_one_entry_per_agent() {
        let mut feed = ActivityFeed::new();
        feed.observe(
            MissionStatus::Attacking,
            &agents(&["sqli-agent", "xss-agent"]),
            at(100),
        );
        assert_eq!(feed.entries().len(), 2);
        assert_eq!(feed.entries()[0].agent, "sqli-agent");
        assert_eq!(feed.entries()[1].agent, "xss-agent");
    }

    #[test]
    fn attack_phase_without_agents_falls_back_to_one_generic_entry() {
        let mut feed = ActivityFeed::new();
        feed.observe(MissionStatus::Attacking, &[], at(100));
        assert_eq!(feed.entries().len(), 1);
        assert_eq!(feed.entries()[0].agent, "attack");
    }

    #[test]
    fn repeated_observation_is_idempotent() {
        let mut feed = ActivityFeed::new();
        let active = agents(&["sqli-agent", "xss-agent"]);
        feed.observe(MissionStatus::Attacking, &active, at(100));
        let len = feed.entries().len();

        for i in 0..10 {
            feed.observe(MissionStatus::Attacking, &active, at(100 + i));
        }
        assert_eq!(feed.entries().len(), len);
    }

    #[test]
    fn phase_transitions_accumulate_newest_first() {
        let mut feed = ActivityFeed::new();
        feed.observe(MissionStatus::Discovery, &[], at(100));
        feed.observe(MissionStatus::Analyzing, &[], at(200));

        assert_eq!(feed.entries().len(), 2);
        assert_eq!(feed.entries()[0].agent, "analysis");
        assert_eq!(feed.entries()[1].agent, "recon");
    }

    #[test]
    fn feed_never_exceeds_the_cap() {
        let mut feed = ActivityFeed::new();
        let names: Vec<String> = (0..70).map(|i| format!("agent-{}", i)).collect();
        let many: Vec<AgentActivity> = names
            .iter()
            .map(|n| AgentActivity {
                name: n.clone(),
                task: None,
            })
            .collect();

        feed.observe(MissionStatus::Attacking, &many, at(100));
        assert_eq!(feed.entries().len(), ACTIVITY_FEED_CAP);
        // Newest-first scan keeps the head of the synthesized batch.
        assert_eq!(feed.entries()[0].agent, "agent-0");
    }

    #[test]
    fn unknown_status_synthesizes_nothing() {
        let mut feed = ActivityFeed::new();
        feed.observe(MissionStatus::Unknown, &[], at(100));
        assert!(feed.entries().is_empty());
    }
}
