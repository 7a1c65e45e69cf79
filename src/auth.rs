//! Bearer credential acquisition.
//!
//! The credential store itself (login, refresh, expiry) is owned by an
//! external authentication provider. This layer only asks for the current
//! token at request time and treats its absence as a terminal per-request
//! failure, never a silent skip.

use async_trait::async_trait;

/// Supplies the short-lived bearer credential attached to API requests.
#[async_trait]
pub trait TokenProvider: Send + Sync {
    /// Return the current bearer token, or `None` when no session exists.
    async fn bearer_token(&self) -> Option<String>;
}

/// Fixed token provider, used by tests and one-shot CLI invocations.
pub struct StaticToken(pub String);

#[async_trait]
impl TokenProvider for StaticToken {
    async fn bearer_token(&self) -> Option<String> {
        Some(self.0.clone())
    }
}

/// Provider for unauthenticated contexts. Any request against an endpoint
/// that requires a credential fails with `SyncError::AuthMissing`.
pub struct NoToken;

#[async_trait]
impl TokenProvider for NoToken {
    async fn bearer_token(&self) -> Option<String> {
        None
    }
}
