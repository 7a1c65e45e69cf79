//! Push channels for incremental mission updates.
//!
//! Two independently-addressed WebSocket channels exist per mission: the
//! live event channel (phase transitions, discovered findings, log
//! lines) and the dashboard telemetry channel (agent activity, reasoning
//! traces, cost/usage). Both speak the same protocol: JSON text frames
//! inbound, a literal `ping` keepalive outbound. Frames are buffered in
//! receipt order; nothing here reorders or coalesces (the activity feed
//! owns dedup). There is no automatic reconnect: after a close or
//! transport error a fresh channel must be opened.

use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;

use futures::{SinkExt, StreamExt};
use serde_json::Value;
use tokio::sync::{watch, RwLock};
use tokio::task::JoinHandle;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message;
use tokio_util::sync::CancellationToken;

/// Frames retained for the dashboard telemetry channel; oldest evicted.
pub const DASHBOARD_BUFFER_CAP: usize = 50;

/// Which of the two push channels to open for a mission.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelKind {
    /// Incremental mission events.
    LiveEvents,
    /// Fine-grained operational telemetry.
    DashboardTelemetry,
}

impl ChannelKind {
    /// Derive the channel URL from the configured API base URL.
    ///
    /// `https://` becomes `wss://` and `http://` becomes `ws://`; a base
    /// with neither prefix is given `wss://`. The dashboard channel
    /// additionally strips one trailing `/api` suffix before appending
    /// its path.
    pub fn derive_url(self, api_base: &str, mission_id: &str) -> String {
        let base = websocket_base(api_base);
        match self {
            Self::LiveEvents => format!("{}/ws/missions/{}", base, mission_id),
            Self::DashboardTelemetry => {
                let trimmed = base.strip_suffix("/api").unwrap_or(base.as_str());
                format!("{}/ws/mission/{}/dashboard", trimmed, mission_id)
            }
        }
    }

    fn buffer_cap(self) -> Option<usize> {
        match self {
            Self::LiveEvents => None,
            Self::DashboardTelemetry => Some(DASHBOARD_BUFFER_CAP),
        }
    }

    fn label(self) -> &'static str {
        match self {
            Self::LiveEvents => "live_events",
            Self::DashboardTelemetry => "dashboard",
        }
    }
}

/// Swap an http(s) scheme for ws(s); bare hosts get `wss://`.
fn websocket_base(api_base: &str) -> String {
    if let Some(rest) = api_base.strip_prefix("https://") {
        format!("wss://{}", rest)
    } else if let Some(rest) = api_base.strip_prefix("http://") {
        format!("ws://{}", rest)
    } else {
        format!("wss://{}", api_base)
    }
}

/// Append a frame, evicting the oldest when the buffer is capped.
fn push_frame(buf: &mut VecDeque<Value>, frame: Value, cap: Option<usize>) {
    buf.push_back(frame);
    if let Some(cap) = cap {
        while buf.len() > cap {
            buf.pop_front();
        }
    }
}

/// One push channel bound to one `(mission id, kind)` pair.
///
/// Owned by whoever subscribed to the mission; never shared across
/// missions. Dropping it cancels the socket task and the keepalive.
pub struct EventChannel {
    mission_id: String,
    kind: ChannelKind,
    url: String,
    connected_rx: watch::Receiver<bool>,
    frames: Arc<RwLock<VecDeque<Value>>>,
    cancel: CancellationToken,
    task: Option<JoinHandle<()>>,
}

impl EventChannel {
    /// Open a channel for one mission. Connection happens in the
    /// background; `connected()` flips to true once the socket is up.
    pub fn open(
        api_base: &str,
        mission_id: impl Into<String>,
        kind: ChannelKind,
        ping_interval: Duration,
    ) -> Self {
        let mission_id = mission_id.into();
        let url = kind.derive_url(api_base, &mission_id);
        let (connected_tx, connected_rx) = watch::channel(false);
        let frames = Arc::new(RwLock::new(VecDeque::new()));
        let cancel = CancellationToken::new();
        let task = tokio::spawn(run_channel(
            url.clone(),
            kind,
            ping_interval,
            connected_tx,
            Arc::clone(&frames),
            cancel.clone(),
        ));
        Self {
            mission_id,
            kind,
            url,
            connected_rx,
            frames,
            cancel,
            task: Some(task),
        }
    }

    pub fn mission_id(&self) -> &str {
        &self.mission_id
    }

    pub fn kind(&self) -> ChannelKind {
        self.kind
    }

    /// The derived channel URL.
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Whether the socket is currently open.
    pub fn is_connected(&self) -> bool {
        *self.connected_rx.borrow()
    }

    /// Watch receiver for connection state changes.
    pub fn connected(&self) -> watch::Receiver<bool> {
        self.connected_rx.clone()
    }

    /// Snapshot of the buffered frames, in receipt order.
    pub async fn frames(&self) -> Vec<Value> {
        self.frames.read().await.iter().cloned().collect()
    }

    /// Cancel the keepalive, close the socket, and wait for the task to
    /// exit. Buffered frames stay readable through prior clones.
    pub async fn close(mut self) {
        self.cancel.cancel();
        if let Some(task) = self.task.take() {
            let _ = task.await;
        }
    }
}

impl Drop for EventChannel {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

async fn run_channel(
    url: String,
    kind: ChannelKind,
    ping_interval: Duration,
    connected_tx: watch::Sender<bool>,
    frames: Arc<RwLock<VecDeque<Value>>>,
    cancel: CancellationToken,
) {
    let connect = tokio::select! {
        _ = cancel.cancelled() => return,
        result = connect_async(url.as_str()) => result,
    };
    let mut ws = match connect {
        Ok((ws, _response)) => ws,
        Err(e) => {
            tracing::warn!(channel = kind.label(), url = %url, "channel connect failed: {}", e);
            return;
        }
    };
    connected_tx.send_replace(true);
    tracing::debug!(channel = kind.label(), url = %url, "channel open");

    let cap = kind.buffer_cap();
    let mut ping = tokio::time::interval(ping_interval);
    // The interval's first tick completes immediately; consume it so the
    // first keepalive goes out one full period after open.
    ping.tick().await;

    loop {
        tokio::select! {
            _ = cancel.cancelled() => break,
            _ = ping.tick() => {
                if ws.send(Message::Text("ping".to_string())).await.is_err() {
                    break;
                }
            }
            inbound = ws.next() => match inbound {
                Some(Ok(Message::Text(text))) => {
                    match serde_json::from_str::<Value>(&text) {
                        Ok(frame) => {
                            let mut buf = frames.write().await;
                            push_frame(&mut buf, frame, cap);
                        }
                        Err(e) => {
                            tracing::warn!(
                                channel = kind.label(),
                                "dropping malformed frame: {}",
                                e
                            );
                        }
                    }
                }
                Some(Ok(Message::Close(_))) | None => break,
                Some(Ok(_)) => {}
                Some(Err(e)) => {
                    tracing::warn!(channel = kind.label(), "channel transport error: {}", e);
                    break;
                }
            }
        }
    }

    let _ = ws.close(None).await;
    connected_tx.send_replace(false);
    tracing::debug!(channel = kind.label(), "channel closed");
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn live_events_url_from_https_base() {
        let url = ChannelKind::LiveEvents.derive_url("https://api.example.com", "X");
        assert_eq!(url, "wss://api.example.com/ws/missions/X");
    }

    #[test]
    fn dashboard_url_strips_trailing_api_suffix() {
        let url = ChannelKind::DashboardTelemetry.derive_url("http://api.example.com/api", "X");
        assert_eq!(url, "ws://api.example.com/ws/mission/X/dashboard");
    }

    #[test]
    fn live_events_url_keeps_api_suffix() {
        let url = ChannelKind::LiveEvents.derive_url("https://api.example.com/api", "X");
        assert_eq!(url, "wss://api.example.com/api/ws/missions/X");
    }

    #[test]
    fn bare_base_is_prefixed_with_wss() {
        let url = ChannelKind::LiveEvents.derive_url("api.example.com", "m-9");
        assert_eq!(url, "wss://api.example.com/ws/missions/m-9");
    }

    #[test]
    fn uncapped_buffer_grows_in_receipt_order() {
        let mut buf = VecDeque::new();
        for i in 0..60 {
            push_frame(&mut buf, json!({ "seq": i }), None);
        }
        assert_eq!(buf.len(), 60);
        assert_eq!(buf.front().and_then(|f| f["seq"].as_u64()), Some(0));
    }

    #[test]
    fn capped_buffer_evicts_oldest_first() {
        let mut buf = VecDeque::new();
        for i in 0..60 {
            push_frame(&mut buf, json!({ "seq": i }), Some(DASHBOARD_BUFFER_CAP));
        }
        assert_eq!(buf.len(), DASHBOARD_BUFFER_CAP);
        assert_eq!(buf.front().and_then(|f| f["seq"].as_u64()), Some(10));
        assert_eq!(buf.back().and_then(|f| f["seq"].as_u64()), Some(59));
    }
}
