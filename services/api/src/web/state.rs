//! services/api/src/web/state.rs
//!
//! Defines the application's shared state.

use crate::config::Config;
use messenger_core::conversation::ConversationAggregator;
use messenger_core::ports::{DocumentStore, IdentityResolver};
use messenger_core::session::SessionManager;
use std::sync::Arc;

/// The shared application state, created once at startup and passed to all
/// handlers. The store handle is the single long-lived client; nothing in
/// the request path constructs its own connection.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn DocumentStore>,
    pub identity: Arc<dyn IdentityResolver>,
    pub sessions: Arc<SessionManager>,
    pub conversations: Arc<ConversationAggregator>,
    pub config: Arc<Config>,
}
