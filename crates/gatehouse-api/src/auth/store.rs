// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Identity lookup capability.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

// =============================================================================
// UserRecord
// =============================================================================

/// A stored identity as returned by an [`IdentityStore`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserRecord {
    /// Durable identity ID.
    pub id: Uuid,
    /// Email address.
    pub email: String,
    /// Username.
    pub username: String,
    /// Full display name.
    pub full_name: String,
    /// Whether the email address has been verified.
    #[serde(default)]
    pub is_verified: bool,
    /// Creation time.
    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,
    /// Last update time.
    #[serde(default = "Utc::now")]
    pub updated_at: DateTime<Utc>,
}

impl UserRecord {
    /// Creates a new, unverified record with a fresh ID.
    pub fn new(
        email: impl Into<String>,
        username: impl Into<String>,
        full_name: impl Into<String>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            email: email.into(),
            username: username.into(),
            full_name: full_name.into(),
            is_verified: false,
            created_at: now,
            updated_at: now,
        }
    }

    /// Marks the record as verified.
    pub fn verified(mut self) -> Self {
        self.is_verified = true;
        self
    }

    /// Returns `true` if any of the keys identify this record.
    ///
    /// Empty username or email keys never match.
    pub fn matches(&self, id: Uuid, username: &str, email: &str) -> bool {
        self.id == id
            || (!username.is_empty() && self.username == username)
            || (!email.is_empty() && self.email == email)
    }
}

// =============================================================================
// IdentityStore
// =============================================================================

/// Error returned by an identity backend.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LookupError {
    /// The backend failed to answer.
    #[error("identity backend error: {0}")]
    Backend(String),
}

impl LookupError {
    /// Creates a backend error.
    pub fn backend(message: impl Into<String>) -> Self {
        Self::Backend(message.into())
    }
}

/// Resolves token subjects to stored identities.
///
/// Implementations match on any of the three keys and return `Ok(None)` when
/// nothing matches. Retries, if any, belong to the implementation.
#[async_trait]
pub trait IdentityStore: Send + Sync {
    /// Looks up an identity by ID, username or email.
    async fn lookup(
        &self,
        id: Uuid,
        username: &str,
        email: &str,
    ) -> Result<Option<UserRecord>, LookupError>;
}

// =============================================================================
// InMemoryIdentityStore
// =============================================================================

/// Identity store held in process memory.
#[derive(Debug, Default)]
pub struct InMemoryIdentityStore {
    records: DashMap<Uuid, UserRecord>,
}

impl InMemoryIdentityStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store seeded with `records`.
    pub fn with_records(records: impl IntoIterator<Item = UserRecord>) -> Self {
        let store = Self::new();
        for record in records {
            store.insert(record);
        }
        store
    }

    /// Inserts or replaces a record.
    pub fn insert(&self, record: UserRecord) {
        self.records.insert(record.id, record);
    }

    /// Removes a record, returning it if present.
    pub fn remove(&self, id: Uuid) -> Option<UserRecord> {
        self.records.remove(&id).map(|(_, record)| record)
    }

    /// Returns the number of stored records.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Returns `true` if the store is empty.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

#[async_trait]
impl IdentityStore for InMemoryIdentityStore {
    async fn lookup(
        &self,
        id: Uuid,
        username: &str,
        email: &str,
    ) -> Result<Option<UserRecord>, LookupError> {
        if let Some(record) = self.records.get(&id) {
            return Ok(Some(record.clone()));
        }

        Ok(self
            .records
            .iter()
            .find(|entry| entry.value().matches(id, username, email))
            .map(|entry| entry.value().clone()))
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn ada() -> UserRecord {
        UserRecord::new("ada@example.com", "ada", "Ada Lovelace").verified()
    }

    #[tokio::test]
    async fn test_lookup_by_id() {
        let record = ada();
        let store = InMemoryIdentityStore::with_records([record.clone()]);

        let found = store.lookup(record.id, "", "").await.unwrap();
        assert_eq!(found, Some(record));
    }

    #[tokio::test]
    async fn test_lookup_by_username_or_email() {
        let record = ada();
        let store = InMemoryIdentityStore::with_records([record.clone()]);

        let by_username = store.lookup(Uuid::new_v4(), "ada", "").await.unwrap();
        assert_eq!(by_username.map(|r| r.id), Some(record.id));

        let by_email = store.lookup(Uuid::new_v4(), "", "ada@example.com").await.unwrap();
        assert_eq!(by_email.map(|r| r.id), Some(record.id));
    }

    #[tokio::test]
    async fn test_lookup_missing() {
        let record = ada();
        let store = InMemoryIdentityStore::with_records([record.clone()]);
        store.remove(record.id);

        let found = store.lookup(record.id, "ada", "ada@example.com").await.unwrap();
        assert!(found.is_none());
        assert!(store.is_empty());
    }

    #[test]
    fn test_empty_keys_never_match() {
        let mut record = ada();
        record.username = String::new();
        record.email = String::new();

        assert!(!record.matches(Uuid::new_v4(), "", ""));
    }
}
