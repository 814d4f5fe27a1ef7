//! crates/messenger_core/src/session.rs
//!
//! Session lifecycle management: issuing, validating, renewing and revoking
//! the opaque bearer tokens that correlate a browser with a user account.
//! Sessions are persisted in the document store so validation survives
//! process restarts; every check is a fresh read, never an in-memory cache.

use std::sync::Arc;

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use chrono::{Duration, Utc};
use rand::rngs::OsRng;
use rand::RngCore;
use tracing::debug;

use crate::domain::{AuthenticatedSession, Session, User};
use crate::ports::{collections, decode_record, CoreError, CoreResult, DocumentStore, IdentityResolver};

/// The cookie under which the session token travels.
pub const SESSION_COOKIE: &str = "session_id";

/// Default session lifetime.
pub const SESSION_TTL_DAYS: i64 = 30;

/// Issues and validates bearer tokens.
///
/// The token doubles as both the cookie value and the store lookup key:
/// possession of the token is simultaneously the authentication credential
/// and the capability to read the session record. There is deliberately no
/// separate internal session id.
pub struct SessionManager {
    store: Arc<dyn DocumentStore>,
    identity: Arc<dyn IdentityResolver>,
    ttl: Duration,
}

impl SessionManager {
    pub fn new(store: Arc<dyn DocumentStore>, identity: Arc<dyn IdentityResolver>) -> Self {
        Self::with_ttl(store, identity, Duration::days(SESSION_TTL_DAYS))
    }

    pub fn with_ttl(
        store: Arc<dyn DocumentStore>,
        identity: Arc<dyn IdentityResolver>,
        ttl: Duration,
    ) -> Self {
        Self { store, identity, ttl }
    }

    /// Creates and persists a fresh session for `user`.
    ///
    /// The token carries 256 bits of OS randomness, URL-safe encoded.
    /// Collisions between concurrently created tokens are cryptographically
    /// negligible, so no uniqueness check is made against the store.
    pub async fn create_session(&self, user: &User) -> CoreResult<Session> {
        let now = Utc::now();
        let session = Session {
            token: generate_token(),
            user_id: user.id,
            created_at: now,
            expires_at: now + self.ttl,
            is_valid: true,
        };

        let record = serde_json::to_value(&session)
            .map_err(|e| CoreError::Storage(e.to_string()))?;
        self.store
            .put(collections::SESSIONS, Some(&session.token), record)
            .await?;

        debug!(user_id = %user.id, "session created");
        Ok(session)
    }

    /// Validates the token presented by a request and resolves its owner.
    ///
    /// Fails with `NoSession` when no token was presented, `NotFound` when
    /// the store has no record under it, `SessionExpired` when the expiry
    /// has passed (checked before the flag, so a stale record still flagged
    /// valid reports expiry), and `SessionInvalid` when the flag is false.
    /// A record that fails to decode is a hard `Malformed` error here.
    pub async fn validate_session(&self, token: Option<&str>) -> CoreResult<AuthenticatedSession> {
        let token = match token {
            Some(t) if !t.is_empty() => t,
            _ => return Err(CoreError::NoSession),
        };

        let raw = self
            .store
            .get(collections::SESSIONS, token)
            .await?
            .ok_or_else(|| CoreError::NotFound("session".to_string()))?;
        let session: Session = decode_record(collections::SESSIONS, raw)?;

        let now = Utc::now();
        if now >= session.expires_at {
            return Err(CoreError::SessionExpired);
        }
        if !session.is_valid || session.token.is_empty() {
            return Err(CoreError::SessionInvalid);
        }

        let user = self
            .identity
            .by_id(session.user_id)
            .await?
            .ok_or_else(|| CoreError::NotFound(format!("user {}", session.user_id)))?;

        Ok(AuthenticatedSession { session, user })
    }

    /// Re-issues a validated session with a full lifetime from now. The web
    /// layer re-attaches the cookie with the new max-age.
    pub async fn renew_session(&self, token: Option<&str>) -> CoreResult<Session> {
        let authed = self.validate_session(token).await?;
        let now = Utc::now();
        let session = Session {
            expires_at: now + self.ttl,
            ..authed.session
        };

        let record = serde_json::to_value(&session)
            .map_err(|e| CoreError::Storage(e.to_string()))?;
        self.store
            .put(collections::SESSIONS, Some(&session.token), record)
            .await?;

        Ok(session)
    }

    /// Deletes the session record under `token`. Idempotent: revoking an
    /// absent cookie or an unknown token succeeds quietly.
    pub async fn revoke_session(&self, token: Option<&str>) -> CoreResult<()> {
        let token = match token {
            Some(t) if !t.is_empty() => t,
            _ => return Ok(()),
        };
        self.store.delete(collections::SESSIONS, token).await?;
        debug!("session revoked");
        Ok(())
    }
}

/// 32 bytes from the OS RNG, URL-safe base64 without padding.
fn generate_token() -> String {
    let mut bytes = [0u8; 32];
    OsRng.fill_bytes(&mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}

#[cfg(test)]
mod tests {
    use super::generate_token;

    #[test]
    fn tokens_are_url_safe_and_distinct() {
        let a = generate_token();
        let b = generate_token();
        // 32 bytes -> 43 unpadded base64 characters.
        assert_eq!(a.len(), 43);
        assert!(a
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_'));
        assert_ne!(a, b);
    }
}
