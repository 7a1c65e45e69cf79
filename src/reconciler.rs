//! Findings reconciler.
//!
//! Findings live in two divergent stores: the per-mission memory store
//! (fast, first-class records, may not exist yet) and the persisted
//! mission record itself (embedded sub-objects, durable fallback). For a
//! given mission the stores are alternated wholesale, never merged
//! element-wise: a non-empty memory result is authoritative and the
//! embedded findings are ignored entirely for that mission.

use chrono::{DateTime, Utc};
use futures::future::join_all;
use serde_json::Value;
use std::cmp::Reverse;

use crate::client::FindingsSource;
use crate::model::{parse_timestamp, Finding, FindingSource, MemoryFinding, Mission};

const DEFAULT_SEVERITY: &str = "medium";
const DEFAULT_CONFIDENCE: &str = "CONFIRMED";
const SECRET_VULN_TYPE: &str = "Secret Exposure";

/// Merge findings across a list of missions into one normalized,
/// time-sorted list.
///
/// All per-mission memory-store fetches are issued concurrently and all
/// are awaited (scatter/gather). A fetch failure or empty result falls
/// back to that mission's embedded findings; one mission's failure never
/// aborts the batch. The combined list is sorted by `created_at`
/// descending, with missing timestamps sorting as oldest.
pub async fn reconcile_findings(
    source: &dyn FindingsSource,
    missions: &[Mission],
) -> Vec<Finding> {
    let per_mission = missions.iter().map(|mission| async move {
        match source.memory_findings(&mission.id).await {
            Ok(found) if !found.is_empty() => found
                .into_iter()
                .map(|f| normalize_memory(mission, f))
                .collect(),
            Ok(_) => embedded_findings(mission),
            Err(e) => {
                tracing::warn!(
                    mission_id = %mission.id,
                    "memory findings fetch failed, using embedded fallback: {}",
                    e
                );
                embedded_findings(mission)
            }
        }
    });

    let mut merged: Vec<Finding> = join_all(per_mission).await.into_iter().flatten().collect();
    merged.sort_by_key(|f| Reverse(f.created_at.unwrap_or(DateTime::<Utc>::UNIX_EPOCH)));
    merged
}

/// Normalize a memory-store record into the canonical shape.
fn normalize_memory(mission: &Mission, finding: MemoryFinding) -> Finding {
    Finding {
        id: finding.id,
        mission_id: mission.id.clone(),
        target_url: mission.target_url.clone(),
        vuln_type: finding
            .vuln_type
            .unwrap_or_else(|| "Unknown".to_string()),
        severity: finding
            .severity
            .unwrap_or_else(|| DEFAULT_SEVERITY.to_string()),
        confidence: finding
            .confidence
            .unwrap_or_else(|| DEFAULT_CONFIDENCE.to_string()),
        endpoint: finding.endpoint,
        payload: finding.payload,
        created_at: finding.created_at.as_deref().and_then(parse_timestamp),
        source: FindingSource::Memory,
    }
}

/// Extract and normalize the findings embedded in a mission record.
fn embedded_findings(mission: &Mission) -> Vec<Finding> {
    let mut findings = Vec::new();
    for (key, default_type) in [
        ("confirmed_vulns", None),
        ("secrets_found", Some(SECRET_VULN_TYPE)),
    ] {
        let Some(entries) = mission.data.get(key).and_then(Value::as_array) else {
            continue;
        };
        for (idx, entry) in entries.iter().enumerate() {
            findings.push(normalize_embedded(mission, key, idx, entry, default_type));
        }
    }
    findings
}

/// Normalize one embedded sub-object. Embedded entries lack a stable id,
/// so a deterministic one is derived from the mission id and position.
fn normalize_embedded(
    mission: &Mission,
    key: &str,
    idx: usize,
    entry: &Value,
    default_type: Option<&str>,
) -> Finding {
    let str_field = |name: &str| entry.get(name).and_then(Value::as_str).map(str::to_string);
    Finding {
        id: format!("{}-{}-{}", mission.id, key, idx),
        mission_id: mission.id.clone(),
        target_url: mission.target_url.clone(),
        vuln_type: str_field("vuln_type")
            .or_else(|| str_field("type"))
            .or_else(|| default_type.map(str::to_string))
            .unwrap_or_else(|| "Unknown".to_string()),
        severity: str_field("severity").unwrap_or_else(|| DEFAULT_SEVERITY.to_string()),
        confidence: str_field("confidence").unwrap_or_else(|| DEFAULT_CONFIDENCE.to_string()),
        endpoint: str_field("endpoint").or_else(|| str_field("url")),
        payload: str_field("payload"),
        created_at: entry
            .get("created_at")
            .and_then(Value::as_str)
            .and_then(parse_timestamp),
        source: FindingSource::Embedded,
    }
}
