//! # Mission Sync
//!
//! Client-side state synchronization for long-running security missions.
//!
//! This library keeps a client's view of an asynchronously-progressing
//! remote mission consistent, live, and de-duplicated:
//! - Periodic REST polling of the authoritative mission snapshot,
//!   adapting to the mission's lifecycle phase
//! - Two independent push WebSocket channels per mission (live events
//!   and dashboard telemetry)
//! - On-demand reconciliation of findings across the per-mission memory
//!   store and the persisted mission record
//! - A capped, de-duplicated synthetic activity feed
//!
//! ## Architecture
//!
//! Every live resource (poller, channel) is an explicit object bound to
//! one mission id at construction with an explicit teardown; nothing is
//! a process-wide singleton. All mutation happens on the tokio event
//! loop; "concurrency" is concurrently in-flight I/O, never data
//! parallelism.
//!
//! ## Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use mission_sync::{auth::StaticToken, client::ApiClient, session::MissionSession, Config};
//!
//! let config = Config::from_env()?;
//! let client = Arc::new(ApiClient::new(&config, Arc::new(StaticToken(token)))?);
//! let session = MissionSession::open(Arc::clone(&client) as _, &config, "mission-id");
//! let snapshot = session.poller().snapshot();
//! ```

pub mod activity;
pub mod auth;
pub mod channel;
pub mod client;
pub mod config;
pub mod error;
pub mod model;
pub mod poller;
pub mod reconciler;
pub mod session;

pub use config::Config;
pub use error::SyncError;
