//! Per-mission composition root.
//!
//! A `MissionSession` bundles the three live resources a mission view
//! needs: the adaptive poller and both push channels, all bound to the
//! same mission id. The session is owned exclusively by the view that
//! created it; switching missions means closing this session and opening
//! a new one, never rebinding the existing resources.

use std::sync::Arc;

use crate::channel::{ChannelKind, EventChannel};
use crate::client::MissionSource;
use crate::config::Config;
use crate::poller::MissionPoller;

pub struct MissionSession {
    mission_id: String,
    poller: MissionPoller,
    live: EventChannel,
    dashboard: EventChannel,
}

impl MissionSession {
    /// Open the poller and both channels for one mission.
    pub fn open(
        source: Arc<dyn MissionSource>,
        config: &Config,
        mission_id: impl Into<String>,
    ) -> Self {
        let mission_id = mission_id.into();
        let poller = MissionPoller::spawn(source, mission_id.clone(), config.poll_interval);
        let live = EventChannel::open(
            &config.api_base_url,
            mission_id.clone(),
            ChannelKind::LiveEvents,
            config.ping_interval,
        );
        let dashboard = EventChannel::open(
            &config.api_base_url,
            mission_id.clone(),
            ChannelKind::DashboardTelemetry,
            config.ping_interval,
        );
        Self {
            mission_id,
            poller,
            live,
            dashboard,
        }
    }

    pub fn mission_id(&self) -> &str {
        &self.mission_id
    }

    pub fn poller(&self) -> &MissionPoller {
        &self.poller
    }

    pub fn live_events(&self) -> &EventChannel {
        &self.live
    }

    pub fn dashboard(&self) -> &EventChannel {
        &self.dashboard
    }

    /// Tear down all three resources deterministically.
    pub async fn close(self) {
        let Self {
            poller,
            live,
            dashboard,
            ..
        } = self;
        poller.shutdown().await;
        live.close().await;
        dashboard.close().await;
    }
}
