//! crates/messenger_core/src/ports.rs
//!
//! Defines the service contracts (traits) for the application's core logic.
//! These traits form the boundary of the hexagonal architecture, allowing the
//! core to be independent of specific external implementations like the
//! backing document database.

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde_json::Value;
use uuid::Uuid;

use crate::domain::User;

//=========================================================================================
// Core Error and Result Types
//=========================================================================================

/// The error taxonomy shared by both core components.
///
/// The web layer recovers every authentication failure (`NoSession`,
/// `SessionExpired`, `SessionInvalid`) as "treat as logged out"; `Storage`
/// during session validation is treated the same way (fail safe, not fail
/// open). During aggregation, per-item errors are swallowed and the item is
/// omitted; only enumeration-level errors reach the caller.
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    /// No session cookie was presented with the request.
    #[error("no session token presented")]
    NoSession,

    /// The token or a referenced entity does not exist in the store.
    #[error("not found: {0}")]
    NotFound(String),

    /// The session's expiry time has passed.
    #[error("session expired")]
    SessionExpired,

    /// The session was explicitly revoked or flagged invalid.
    #[error("session invalidated")]
    SessionInvalid,

    /// The underlying store call failed.
    #[error("storage failure: {0}")]
    Storage(String),

    /// A fetched record does not decode into its expected shape.
    #[error("malformed record in '{collection}': {reason}")]
    Malformed { collection: String, reason: String },
}

/// A convenience type alias for `Result<T, CoreError>`.
pub type CoreResult<T> = Result<T, CoreError>;

/// Decodes a raw document into a domain type, mapping decode failures to
/// `CoreError::Malformed`. Callers decide whether that is fatal (session
/// validation) or a skip (aggregation).
pub fn decode_record<T: DeserializeOwned>(collection: &str, raw: Value) -> CoreResult<T> {
    serde_json::from_value(raw).map_err(|e| CoreError::Malformed {
        collection: collection.to_string(),
        reason: e.to_string(),
    })
}

//=========================================================================================
// Collections
//=========================================================================================

/// Collection names used across the store. Messages live in a per-chat
/// sub-collection addressed by path.
pub mod collections {
    use uuid::Uuid;

    pub const USERS: &str = "users";
    pub const SESSIONS: &str = "sessions";
    pub const CHATS: &str = "chats";

    /// Path of the message sub-collection belonging to one chat.
    pub fn messages(chat_id: Uuid) -> String {
        format!("chats/{}/messages", chat_id)
    }
}

//=========================================================================================
// Service Ports (Traits)
//=========================================================================================

/// The predicate operators the store contract supports.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryOperator {
    /// Field value equals the given value.
    Eq,
    /// Field is an array containing the given value.
    ArrayContains,
}

/// The document-store contract: named collections of JSON documents with
/// get/set/query/delete semantics and read-your-writes consistency per
/// document. Implementations must be safely usable by many concurrent
/// logical operations: one long-lived client, shared, never a client per
/// call.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Writes a document, replacing any existing one under the same id.
    /// When `id` is `None` the store assigns one. Returns the document id.
    async fn put(&self, collection: &str, id: Option<&str>, record: Value) -> CoreResult<String>;

    /// Reads one document. Absence is `Ok(None)`, not an error.
    async fn get(&self, collection: &str, id: &str) -> CoreResult<Option<Value>>;

    /// Returns every document in the collection matching the predicate.
    async fn query(
        &self,
        collection: &str,
        field: &str,
        operator: QueryOperator,
        value: Value,
    ) -> CoreResult<Vec<Value>>;

    /// Returns every document in the collection.
    async fn list(&self, collection: &str) -> CoreResult<Vec<Value>>;

    /// Overwrites a single top-level field of an existing document.
    async fn update_field(
        &self,
        collection: &str,
        id: &str,
        field: &str,
        value: Value,
    ) -> CoreResult<()>;

    /// Deletes a document. Deleting an absent document is not an error.
    async fn delete(&self, collection: &str, id: &str) -> CoreResult<()>;
}

/// Loads user records by id or email. Consumed by both the session manager
/// (owner resolution) and the conversation aggregator (counterpart
/// resolution).
#[async_trait]
pub trait IdentityResolver: Send + Sync {
    async fn by_id(&self, id: Uuid) -> CoreResult<Option<User>>;
    async fn by_email(&self, email: &str) -> CoreResult<Option<User>>;
}
