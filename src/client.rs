//! Credentialed request client for the mission API.
//!
//! Wraps outbound HTTP calls with a bearer credential and uniform error
//! decoding. Retry policy, if any, belongs to the caller; this client
//! never retries on its own.

use std::sync::Arc;

use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use reqwest::Method;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::auth::TokenProvider;
use crate::config::Config;
use crate::error::SyncError;
use crate::model::{
    CreateMissionRequest, CreateMissionResponse, EndpointsResponse, FindingsResponse,
    MemoryFinding, Mission, MissionListResponse, MissionResponse, MissionStatsResponse,
};

/// Whether an endpoint requires a bearer credential.
#[derive(Debug, Clone, Copy)]
enum Auth {
    Required,
    Public,
}

/// Fetches one mission's authoritative snapshot. Seam for the poller.
#[async_trait]
pub trait MissionSource: Send + Sync {
    async fn fetch_mission(&self, mission_id: &str) -> Result<Mission, SyncError>;
}

/// Fetches memory-store findings for a mission. Seam for the reconciler.
#[async_trait]
pub trait FindingsSource: Send + Sync {
    async fn memory_findings(&self, mission_id: &str) -> Result<Vec<MemoryFinding>, SyncError>;
}

/// HTTP client for the mission API.
#[derive(Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
    tokens: Arc<dyn TokenProvider>,
}

impl ApiClient {
    /// Build a client against the configured base URL.
    pub fn new(config: &Config, tokens: Arc<dyn TokenProvider>) -> Result<Self, SyncError> {
        let http = reqwest::Client::builder()
            .user_agent(concat!("mission-sync/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self {
            http,
            base_url: config.api_base_url.clone(),
            tokens,
        })
    }

    /// The configured API base URL (no trailing slash).
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// List all missions visible to the current credential.
    pub async fn list_missions(&self) -> Result<Vec<Mission>, SyncError> {
        let resp: MissionListResponse = self
            .request(Method::GET, "/api/missions", None, Auth::Required)
            .await?;
        Ok(resp.missions)
    }

    /// Fetch one mission's authoritative snapshot.
    pub async fn get_mission(&self, mission_id: &str) -> Result<Mission, SyncError> {
        let path = format!("/api/missions/{}", mission_id);
        let resp: MissionResponse = self.request(Method::GET, &path, None, Auth::Required).await?;
        Ok(resp.mission)
    }

    /// Create a mission. A single fire-and-forget request; no retry queue.
    pub async fn create_mission(
        &self,
        req: &CreateMissionRequest,
    ) -> Result<CreateMissionResponse, SyncError> {
        let body = serde_json::to_value(req)
            .map_err(|e| SyncError::Transport(format!("encode request body: {}", e)))?;
        self.request(Method::POST, "/api/missions", Some(body), Auth::Required)
            .await
    }

    /// Fetch memory-store findings for a mission.
    pub async fn get_memory_findings(
        &self,
        mission_id: &str,
    ) -> Result<Vec<MemoryFinding>, SyncError> {
        let path = format!("/api/memory/findings/{}", mission_id);
        let resp: FindingsResponse = self.request(Method::GET, &path, None, Auth::Required).await?;
        Ok(resp.findings)
    }

    /// Fetch endpoints discovered for a mission.
    pub async fn get_memory_endpoints(
        &self,
        mission_id: &str,
    ) -> Result<EndpointsResponse, SyncError> {
        let path = format!("/api/memory/endpoints/{}", mission_id);
        self.request(Method::GET, &path, None, Auth::Required).await
    }

    /// Fetch memory-store stats for a mission.
    pub async fn get_memory_stats(
        &self,
        mission_id: &str,
    ) -> Result<MissionStatsResponse, SyncError> {
        let path = format!("/api/memory/stats/{}", mission_id);
        self.request(Method::GET, &path, None, Auth::Required).await
    }

    /// Fetch platform-wide aggregate counters. No credential required.
    pub async fn get_platform_stats(&self) -> Result<Value, SyncError> {
        self.request(Method::GET, "/api/public/stats/platform", None, Auth::Public)
            .await
    }

    async fn request<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        body: Option<Value>,
        auth: Auth,
    ) -> Result<T, SyncError> {
        let url = format!("{}{}", self.base_url, path);
        let mut req = self
            .http
            .request(method, &url)
            .header(CONTENT_TYPE, "application/json");

        if let Auth::Required = auth {
            let token = self
                .tokens
                .bearer_token()
                .await
                .ok_or(SyncError::AuthMissing)?;
            req = req.bearer_auth(token);
        }
        if let Some(body) = &body {
            req = req.json(body);
        }

        let resp = req.send().await?;
        let status = resp.status();
        if !status.is_success() {
            let text = resp.text().await.unwrap_or_default();
            return Err(SyncError::RequestFailed {
                status: status.as_u16(),
                message: error_message(status.as_u16(), &text),
            });
        }
        resp.json::<T>().await.map_err(Into::into)
    }
}

#[async_trait]
impl MissionSource for ApiClient {
    async fn fetch_mission(&self, mission_id: &str) -> Result<Mission, SyncError> {
        self.get_mission(mission_id).await
    }
}

#[async_trait]
impl FindingsSource for ApiClient {
    async fn memory_findings(&self, mission_id: &str) -> Result<Vec<MemoryFinding>, SyncError> {
        self.get_memory_findings(mission_id).await
    }
}

/// Extract the server-supplied error message from a non-2xx body, falling
/// back to a generic status-coded message.
fn error_message(status: u16, body: &str) -> String {
    if let Ok(value) = serde_json::from_str::<Value>(body) {
        for key in ["error", "detail", "message"] {
            if let Some(msg) = value.get(key).and_then(Value::as_str) {
                if !msg.is_empty() {
                    return msg.to_string();
                }
            }
        }
    }
    format!("request failed with status {}", status)
}
