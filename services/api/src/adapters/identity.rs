//! services/api/src/adapters/identity.rs
//!
//! The store-backed implementation of the `IdentityResolver` port. User
//! documents are keyed by user id; email lookup is an equality query on the
//! unique `email` field.

use std::sync::Arc;

use async_trait::async_trait;
use messenger_core::domain::User;
use messenger_core::ports::{collections, decode_record, CoreResult, DocumentStore, IdentityResolver, QueryOperator};
use serde_json::json;
use uuid::Uuid;

pub struct StoreIdentityResolver {
    store: Arc<dyn DocumentStore>,
}

impl StoreIdentityResolver {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl IdentityResolver for StoreIdentityResolver {
    async fn by_id(&self, id: Uuid) -> CoreResult<Option<User>> {
        let raw = self.store.get(collections::USERS, &id.to_string()).await?;
        raw.map(|r| decode_record(collections::USERS, r)).transpose()
    }

    async fn by_email(&self, email: &str) -> CoreResult<Option<User>> {
        let records = self
            .store
            .query(collections::USERS, "email", QueryOperator::Eq, json!(email))
            .await?;
        // The email is a unique business key; anything past the first
        // record would be drift in the stored data.
        records
            .into_iter()
            .next()
            .map(|r| decode_record(collections::USERS, r))
            .transpose()
    }
}
