//! Shared in-memory doubles for the document-store and identity-resolver
//! ports, plus small fixture builders.

#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use messenger_core::domain::{Chat, Message, User};
use messenger_core::ports::{CoreError, CoreResult, DocumentStore, IdentityResolver, QueryOperator};
use serde_json::Value;
use uuid::Uuid;

struct Doc {
    collection: String,
    id: String,
    data: Value,
}

/// A `DocumentStore` double backed by a flat vector, so the same document id
/// can be made to appear twice in a query result (mimicking the cursor
/// quirks the aggregator has to guard against). Failures can be injected
/// per collection.
#[derive(Default)]
pub struct MemoryStore {
    docs: Mutex<Vec<Doc>>,
    failing: Mutex<HashSet<String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every subsequent call touching `collection` fails with `Storage`.
    pub fn fail_collection(&self, collection: &str) {
        self.failing.lock().unwrap().insert(collection.to_string());
    }

    /// Appends a record without upserting, so a duplicate id can coexist
    /// with the original.
    pub fn push_raw(&self, collection: &str, id: &str, data: Value) {
        self.docs.lock().unwrap().push(Doc {
            collection: collection.to_string(),
            id: id.to_string(),
            data,
        });
    }

    pub fn count(&self, collection: &str) -> usize {
        self.docs
            .lock()
            .unwrap()
            .iter()
            .filter(|d| d.collection == collection)
            .count()
    }

    fn check(&self, collection: &str) -> CoreResult<()> {
        if self.failing.lock().unwrap().contains(collection) {
            return Err(CoreError::Storage(format!(
                "injected failure for '{collection}'"
            )));
        }
        Ok(())
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn put(&self, collection: &str, id: Option<&str>, record: Value) -> CoreResult<String> {
        self.check(collection)?;
        let id = id
            .map(str::to_string)
            .unwrap_or_else(|| Uuid::new_v4().to_string());
        let mut docs = self.docs.lock().unwrap();
        if let Some(doc) = docs
            .iter_mut()
            .find(|d| d.collection == collection && d.id == id)
        {
            doc.data = record;
        } else {
            docs.push(Doc {
                collection: collection.to_string(),
                id: id.clone(),
                data: record,
            });
        }
        Ok(id)
    }

    async fn get(&self, collection: &str, id: &str) -> CoreResult<Option<Value>> {
        self.check(collection)?;
        Ok(self
            .docs
            .lock()
            .unwrap()
            .iter()
            .find(|d| d.collection == collection && d.id == id)
            .map(|d| d.data.clone()))
    }

    async fn query(
        &self,
        collection: &str,
        field: &str,
        operator: QueryOperator,
        value: Value,
    ) -> CoreResult<Vec<Value>> {
        self.check(collection)?;
        Ok(self
            .docs
            .lock()
            .unwrap()
            .iter()
            .filter(|d| d.collection == collection)
            .filter(|d| match operator {
                QueryOperator::Eq => d.data.get(field) == Some(&value),
                QueryOperator::ArrayContains => d
                    .data
                    .get(field)
                    .and_then(Value::as_array)
                    .is_some_and(|a| a.contains(&value)),
            })
            .map(|d| d.data.clone())
            .collect())
    }

    async fn list(&self, collection: &str) -> CoreResult<Vec<Value>> {
        self.check(collection)?;
        Ok(self
            .docs
            .lock()
            .unwrap()
            .iter()
            .filter(|d| d.collection == collection)
            .map(|d| d.data.clone())
            .collect())
    }

    async fn update_field(
        &self,
        collection: &str,
        id: &str,
        field: &str,
        value: Value,
    ) -> CoreResult<()> {
        self.check(collection)?;
        let mut docs = self.docs.lock().unwrap();
        let doc = docs
            .iter_mut()
            .find(|d| d.collection == collection && d.id == id)
            .ok_or_else(|| CoreError::NotFound(format!("{collection}/{id}")))?;
        doc.data[field] = value;
        Ok(())
    }

    async fn delete(&self, collection: &str, id: &str) -> CoreResult<()> {
        self.check(collection)?;
        self.docs
            .lock()
            .unwrap()
            .retain(|d| !(d.collection == collection && d.id == id));
        Ok(())
    }
}

/// An `IdentityResolver` double over a plain map.
#[derive(Default)]
pub struct MemoryDirectory {
    users: Mutex<HashMap<Uuid, User>>,
}

impl MemoryDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, user: &User) {
        self.users.lock().unwrap().insert(user.id, user.clone());
    }
}

#[async_trait]
impl IdentityResolver for MemoryDirectory {
    async fn by_id(&self, id: Uuid) -> CoreResult<Option<User>> {
        Ok(self.users.lock().unwrap().get(&id).cloned())
    }

    async fn by_email(&self, email: &str) -> CoreResult<Option<User>> {
        Ok(self
            .users
            .lock()
            .unwrap()
            .values()
            .find(|u| u.email == email)
            .cloned())
    }
}

//=========================================================================================
// Fixtures
//=========================================================================================

pub fn test_user(name: &str) -> User {
    let now = Utc::now();
    User {
        id: Uuid::new_v4(),
        name: name.to_string(),
        email: format!("{name}@example.com"),
        password_digest: "$argon2id$stub".to_string(),
        icon: None,
        is_online: false,
        created_at: now,
        updated_at: now,
    }
}

pub fn chat_between(a: &User, b: &User, updated_at: DateTime<Utc>) -> Chat {
    Chat {
        id: Uuid::new_v4(),
        is_group: false,
        participants: vec![a.id, b.id],
        created_at: updated_at,
        updated_at,
    }
}

pub fn message_in(chat_id: Uuid, sender: &User, content: &str, at: DateTime<Utc>) -> Message {
    Message {
        id: Uuid::new_v4(),
        chat_id,
        sender_id: sender.id,
        sender_name: sender.name.clone(),
        content: content.to_string(),
        created_at: at,
        is_read: false,
    }
}
