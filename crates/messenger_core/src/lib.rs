pub mod conversation;
pub mod domain;
pub mod ports;
pub mod session;

pub use conversation::ConversationAggregator;
pub use domain::{AuthenticatedSession, Chat, ConversationSummary, Counterpart, Message, Session, User};
pub use ports::{CoreError, CoreResult, DocumentStore, IdentityResolver, QueryOperator};
pub use session::{SessionManager, SESSION_COOKIE, SESSION_TTL_DAYS};
