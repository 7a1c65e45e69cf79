//! Error taxonomy for the synchronization layer.
//!
//! Only failures that callers can observe are variants here. Malformed
//! channel frames are dropped in place with a logged warning, and a
//! failed per-mission findings fetch is absorbed by the reconciler's
//! fallback path; neither ever reaches a caller as an error value.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum SyncError {
    /// Network-level failure: DNS, connect, timeout. Never retried here;
    /// retry policy belongs to the caller.
    #[error("transport error: {0}")]
    Transport(String),

    /// The server answered with a non-2xx status. `message` carries the
    /// server-supplied error string when the body decodes, otherwise a
    /// generic status-coded message.
    #[error("request failed ({status}): {message}")]
    RequestFailed { status: u16, message: String },

    /// No bearer credential was obtainable for an endpoint that requires
    /// one. Terminal for that operation.
    #[error("no bearer credential available")]
    AuthMissing,
}

impl From<reqwest::Error> for SyncError {
    fn from(err: reqwest::Error) -> Self {
        Self::Transport(err.to_string())
    }
}
