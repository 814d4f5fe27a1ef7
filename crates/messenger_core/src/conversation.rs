//! crates/messenger_core/src/conversation.rs
//!
//! Conversation-list aggregation: reconstructing, for one user, the set of
//! chat threads they participate in, resolving the counterpart of each,
//! merging message timelines and producing a stable recency-ordered list.

use std::collections::HashSet;
use std::sync::Arc;

use chrono::Utc;
use serde_json::json;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::domain::{Chat, ConversationSummary, Counterpart, Message, User};
use crate::ports::{collections, decode_record, CoreError, CoreResult, DocumentStore, IdentityResolver, QueryOperator};

/// Builds the ordered, deduplicated conversation list for a user.
///
/// A partial failure (a chat that fails to decode, a counterpart that cannot
/// be resolved, a message sub-collection that cannot be read) drops that one
/// chat from the result. Only a failure to enumerate chats at all is
/// surfaced to the caller.
pub struct ConversationAggregator {
    store: Arc<dyn DocumentStore>,
    identity: Arc<dyn IdentityResolver>,
}

impl ConversationAggregator {
    pub fn new(store: Arc<dyn DocumentStore>, identity: Arc<dyn IdentityResolver>) -> Self {
        Self { store, identity }
    }

    /// Returns every conversation `user` may see, most recent first.
    /// An empty list means "no conversations yet" and is not an error.
    pub async fn get_conversations(&self, user: &User) -> CoreResult<Vec<ConversationSummary>> {
        // Server-side predicate; the membership check is still repeated
        // below because the predicate must be exact either way.
        let candidates = self
            .store
            .query(
                collections::CHATS,
                "participants",
                QueryOperator::ArrayContains,
                json!(user.id),
            )
            .await?;

        let mut seen: HashSet<Uuid> = HashSet::new();
        let mut summaries = Vec::new();

        for raw in candidates {
            let chat: Chat = match decode_record(collections::CHATS, raw) {
                Ok(chat) => chat,
                Err(e) => {
                    warn!("skipping undecodable chat record: {e}");
                    continue;
                }
            };

            if !chat.participants.contains(&user.id) {
                continue;
            }
            // The single remaining participant. A record where no other id
            // exists is malformed for the two-party model; skip it.
            let Some(counterpart_id) = chat
                .participants
                .iter()
                .copied()
                .find(|p| *p != user.id)
            else {
                continue;
            };

            // First occurrence wins; the backing query may yield a chat
            // twice across cursor movement.
            if !seen.insert(chat.id) {
                continue;
            }

            let raw_messages = match self.store.list(&collections::messages(chat.id)).await {
                Ok(raw) => raw,
                Err(e) => {
                    warn!(chat_id = %chat.id, "skipping chat, messages unreadable: {e}");
                    continue;
                }
            };
            let mut messages: Vec<Message> = raw_messages
                .into_iter()
                .filter_map(|m| decode_record(&collections::messages(chat.id), m).ok())
                .collect();
            messages.sort_by_key(|m| m.created_at);

            let last_activity = messages
                .iter()
                .map(|m| m.created_at)
                .max()
                .unwrap_or(chat.updated_at);

            let counterpart = match self.identity.by_id(counterpart_id).await {
                Ok(Some(u)) => Counterpart::from(&u),
                Ok(None) => {
                    warn!(chat_id = %chat.id, %counterpart_id, "skipping chat, counterpart unknown");
                    continue;
                }
                Err(e) => {
                    warn!(chat_id = %chat.id, "skipping chat, counterpart lookup failed: {e}");
                    continue;
                }
            };

            summaries.push(ConversationSummary {
                chat_id: chat.id,
                counterpart,
                messages,
                last_activity,
            });
        }

        // Stable sort: ties keep retrieval order.
        summaries.sort_by(|a, b| b.last_activity.cmp(&a.last_activity));

        debug!(user_id = %user.id, count = summaries.len(), "conversations aggregated");
        Ok(summaries)
    }

    /// Opens a new two-party chat between `user` and `counterpart_id` and
    /// returns its id.
    ///
    /// No check is made for an existing chat between the same pair, so
    /// repeated invocation opens parallel threads.
    pub async fn start_conversation(&self, user: &User, counterpart_id: Uuid) -> CoreResult<Uuid> {
        let now = Utc::now();
        let chat = Chat {
            id: Uuid::new_v4(),
            is_group: false,
            participants: vec![user.id, counterpart_id],
            created_at: now,
            updated_at: now,
        };

        let record = serde_json::to_value(&chat)
            .map_err(|e| CoreError::Storage(e.to_string()))?;
        self.store
            .put(collections::CHATS, Some(&chat.id.to_string()), record)
            .await?;

        debug!(chat_id = %chat.id, "conversation started");
        Ok(chat.id)
    }

    /// Appends a message to a chat's sub-collection and bumps the chat's
    /// `updated_at`. The sender's display name is denormalized into the
    /// message at write time.
    ///
    /// Whether the sender is a participant of the target chat is not checked
    /// here.
    pub async fn append_message(
        &self,
        chat_id: Uuid,
        sender_id: Uuid,
        sender_name: &str,
        content: &str,
    ) -> CoreResult<Message> {
        let now = Utc::now();
        let message = Message {
            id: Uuid::new_v4(),
            chat_id,
            sender_id,
            sender_name: sender_name.to_string(),
            content: content.to_string(),
            created_at: now,
            is_read: false,
        };

        let record = serde_json::to_value(&message)
            .map_err(|e| CoreError::Storage(e.to_string()))?;
        self.store
            .put(
                &collections::messages(chat_id),
                Some(&message.id.to_string()),
                record,
            )
            .await?;
        self.store
            .update_field(
                collections::CHATS,
                &chat_id.to_string(),
                "updated_at",
                json!(now),
            )
            .await?;

        Ok(message)
    }
}
