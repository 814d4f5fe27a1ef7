pub mod auth;
pub mod middleware;
pub mod rest;
pub mod state;

// Re-export the handlers to make them easily accessible to the binary that
// will build the web server router.
pub use middleware::require_auth;
pub use rest::{
    list_conversations_handler, lookup_user_handler, post_message_handler,
    start_conversation_handler,
};
