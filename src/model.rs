//! Mission, finding, and activity data model.
//!
//! Missions and memory-store findings are owned by the server; the
//! structs here are cached copies with last-observed semantics, always
//! subject to overwrite by the next successful fetch or push event.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

/// Mission lifecycle status, as labeled by the server.
///
/// `Completed` and `Failed` are terminal; every other label, including
/// ones introduced server-side after this client shipped, is active.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum MissionStatus {
    Pending,
    Discovery,
    Analyzing,
    #[serde(alias = "EXPLOITATION")]
    Attacking,
    Validating,
    Reporting,
    Running,
    Completed,
    Failed,
    /// Label this client does not recognize.
    #[serde(other)]
    Unknown,
}

impl MissionStatus {
    /// Whether the mission can no longer change.
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }

    /// Whether the mission is still progressing and worth polling.
    pub fn is_active(self) -> bool {
        !self.is_terminal()
    }
}

/// A long-running remote task, as reported by the server.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Mission {
    /// Opaque server-assigned identifier.
    pub id: String,

    /// Target under assessment.
    #[serde(default)]
    pub target_url: String,

    /// Current lifecycle status.
    pub status: MissionStatus,

    /// Free-form mission configuration.
    #[serde(default)]
    pub config: HashMap<String, Value>,

    /// Server-owned nested payload: embedded findings, endpoints, analysis.
    #[serde(default)]
    pub data: HashMap<String, Value>,

    /// Creation timestamp (RFC 3339).
    #[serde(default)]
    pub created_at: Option<String>,

    /// Last update timestamp (RFC 3339).
    #[serde(default)]
    pub updated_at: Option<String>,
}

/// A finding record from the per-mission memory store.
///
/// Fast and first-class, but the store may not exist yet for a mission;
/// the reconciler falls back to the findings embedded in `Mission.data`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemoryFinding {
    pub id: String,
    #[serde(default)]
    pub vuln_type: Option<String>,
    #[serde(default)]
    pub severity: Option<String>,
    #[serde(default)]
    pub confidence: Option<String>,
    #[serde(default)]
    pub endpoint: Option<String>,
    #[serde(default)]
    pub payload: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,

    /// Fields this client does not model, kept for display.
    #[serde(flatten)]
    pub extra: HashMap<String, Value>,
}

/// Which store a normalized finding came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FindingSource {
    /// Per-mission memory store (authoritative when non-empty).
    Memory,
    /// Embedded in the persisted mission record (fallback).
    Embedded,
}

/// The one canonical finding shape produced at the reconciler boundary.
///
/// All defaults are applied during normalization, so downstream code
/// never branches on the raw representational variants again.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Finding {
    pub id: String,
    /// Owning mission, annotated for display.
    pub mission_id: String,
    /// Owning mission's target, annotated for display.
    pub target_url: String,
    pub vuln_type: String,
    pub severity: String,
    pub confidence: String,
    pub endpoint: Option<String>,
    pub payload: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
    pub source: FindingSource,
}

/// An endpoint discovered during a mission, from the memory store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MissionEndpoint {
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub method: Option<String>,
    #[serde(default)]
    pub status_code: Option<u16>,
    #[serde(flatten)]
    pub extra: HashMap<String, Value>,
}

/// Severity-like classification of a synthetic activity entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivityKind {
    Info,
    Success,
    Warning,
    Error,
}

/// Client-derived "something is happening" record for a phase.
/// Never persisted server-side.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ActivityEntry {
    pub timestamp: DateTime<Utc>,
    pub agent: String,
    pub message: String,
    pub kind: ActivityKind,
}

/// Descriptor for an agent active during the attack phase.
#[derive(Debug, Clone, Deserialize)]
pub struct AgentActivity {
    pub name: String,
    #[serde(default)]
    pub task: Option<String>,
}

// ─────────────────────────────────────────────────────────────────────────────
// REST envelopes
// ─────────────────────────────────────────────────────────────────────────────

/// Response of `GET /api/missions`.
#[derive(Debug, Clone, Deserialize)]
pub struct MissionListResponse {
    pub missions: Vec<Mission>,
}

/// Response of `GET /api/missions/{id}`.
#[derive(Debug, Clone, Deserialize)]
pub struct MissionResponse {
    pub mission: Mission,
}

/// Request body for `POST /api/missions`.
#[derive(Debug, Clone, Serialize)]
pub struct CreateMissionRequest {
    pub target_url: String,
    pub config: HashMap<String, Value>,
}

/// Response of `POST /api/missions`.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateMissionResponse {
    pub status: String,
    pub mission: Mission,
}

/// Response of `GET /api/memory/findings/{id}`.
#[derive(Debug, Clone, Deserialize)]
pub struct FindingsResponse {
    pub findings: Vec<MemoryFinding>,
}

/// Response of `GET /api/memory/endpoints/{id}`.
#[derive(Debug, Clone, Deserialize)]
pub struct EndpointsResponse {
    pub endpoints: Vec<MissionEndpoint>,
}

/// Response of `GET /api/memory/stats/{id}`.
#[derive(Debug, Clone, Deserialize)]
pub struct MissionStatsResponse {
    pub stats: HashMap<String, Value>,
}

/// Parse a server timestamp leniently.
///
/// The memory store emits RFC 3339; embedded findings carry whatever the
/// backend wrote. Anything unparseable becomes `None` and sorts oldest.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|t| t.with_timezone(&Utc))
        .ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_labels_round_trip() {
        let status: MissionStatus = serde_json::from_str("\"DISCOVERY\"").expect("parse");
        assert_eq!(status, MissionStatus::Discovery);
        assert!(status.is_active());

        let status: MissionStatus = serde_json::from_str("\"COMPLETED\"").expect("parse");
        assert!(status.is_terminal());
    }

    #[test]
    fn exploitation_is_an_alias_for_attacking() {
        let status: MissionStatus = serde_json::from_str("\"EXPLOITATION\"").expect("parse");
        assert_eq!(status, MissionStatus::Attacking);
    }

    #[test]
    fn unrecognized_labels_stay_active() {
        let status: MissionStatus = serde_json::from_str("\"TRIAGING\"").expect("parse");
        assert_eq!(status, MissionStatus::Unknown);
        assert!(status.is_active());
    }

    #[test]
    fn mission_tolerates_missing_optional_fields() {
        let mission: Mission =
            serde_json::from_str(r#"{"id":"m-1","status":"PENDING"}"#).expect("parse");
        assert_eq!(mission.id, "m-1");
        assert!(mission.data.is_empty());
        assert_eq!(mission.created_at, None);
    }

    #[test]
    fn memory_finding_keeps_unmodeled_fields() {
        let finding: MemoryFinding = serde_json::from_str(
            r#"{"id":"f-1","severity":"high","cwe":"CWE-89"}"#,
        )
        .expect("parse");
        assert_eq!(finding.severity.as_deref(), Some("high"));
        assert_eq!(
            finding.extra.get("cwe").and_then(Value::as_str),
            Some("CWE-89")
        );
    }

    #[test]
    fn timestamps_parse_leniently() {
        assert!(parse_timestamp("2026-08-05T10:00:00Z").is_some());
        assert!(parse_timestamp("last tuesday").is_none());
    }
}
