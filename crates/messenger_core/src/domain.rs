//! crates/messenger_core/src/domain.rs
//!
//! Defines the pure, core data structures for the application.
//! These structs are independent of any database or transport format;
//! they carry `serde` derives only because the document store persists
//! them as JSON documents.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Represents a registered account. The email is the unique business key;
/// at most one non-deleted user may hold a given email.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub password_digest: String,
    pub icon: Option<String>,
    pub is_online: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Represents a browser login session.
///
/// The token is the session's entire identity: it is the cookie value the
/// browser presents AND the document id the record is stored under. There is
/// no separate internal id.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    pub token: String,
    pub user_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub is_valid: bool,
}

impl Session {
    /// A session is usable iff it is still flagged valid, the check time is
    /// strictly before its expiry, and the token is non-empty.
    pub fn is_usable(&self, at: DateTime<Utc>) -> bool {
        self.is_valid && at < self.expires_at && !self.token.is_empty()
    }

    /// Seconds of lifetime left at `at`, floored at zero. Used by the web
    /// layer as the cookie max-age.
    pub fn remaining_seconds(&self, at: DateTime<Utc>) -> i64 {
        (self.expires_at - at).num_seconds().max(0)
    }
}

/// A validated session together with its owning user, as returned by
/// `SessionManager::validate_session`.
#[derive(Debug, Clone)]
pub struct AuthenticatedSession {
    pub session: Session,
    pub user: User,
}

/// Represents a chat thread. The participant set is fixed at creation;
/// no add/remove operation exists.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Chat {
    pub id: Uuid,
    pub is_group: bool,
    pub participants: Vec<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A single message within a chat. Messages are append-only; the ordering
/// key is `created_at`, so two messages written in the same instant have
/// undefined relative order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub id: Uuid,
    pub chat_id: Uuid,
    pub sender_id: Uuid,
    pub sender_name: String,
    pub content: String,
    pub created_at: DateTime<Utc>,
    pub is_read: bool,
}

/// The display identity of the other side of a two-party chat.
#[derive(Debug, Clone, Serialize)]
pub struct Counterpart {
    pub id: Uuid,
    pub name: String,
    pub icon: Option<String>,
    pub is_online: bool,
}

impl From<&User> for Counterpart {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            name: user.name.clone(),
            icon: user.icon.clone(),
            is_online: user.is_online,
        }
    }
}

/// A derived view of one chat thread: counterpart identity, ascending
/// message timeline and the recency key used for ordering. Built fresh on
/// every aggregation call, never persisted.
#[derive(Debug, Clone, Serialize)]
pub struct ConversationSummary {
    pub chat_id: Uuid,
    pub counterpart: Counterpart,
    pub messages: Vec<Message>,
    pub last_activity: DateTime<Utc>,
}
