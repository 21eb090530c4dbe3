// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! # Mock Implementations
//!
//! An identity store with controllable failures and latency.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use gatehouse_api::{IdentityStore, InMemoryIdentityStore, LookupError, UserRecord};
use uuid::Uuid;

// =============================================================================
// Mock Identity Store
// =============================================================================

/// Identity store for testing.
///
/// Delegates to an [`InMemoryIdentityStore`] unless failure or latency is
/// injected.
#[derive(Debug, Default)]
pub struct MockIdentityStore {
    records: InMemoryIdentityStore,
    fail_all: AtomicBool,
    latency: Mutex<Option<Duration>>,
    lookup_count: AtomicU64,
}

impl MockIdentityStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts or replaces a record.
    pub fn insert(&self, record: UserRecord) {
        self.records.insert(record);
    }

    /// Deletes a record.
    pub fn remove(&self, id: Uuid) -> Option<UserRecord> {
        self.records.remove(id)
    }

    /// Makes every lookup fail with a backend error.
    pub fn set_fail_all(&self, fail: bool) {
        self.fail_all.store(fail, Ordering::SeqCst);
    }

    /// Delays every lookup.
    pub fn set_latency(&self, latency: Option<Duration>) {
        *self.latency.lock().unwrap() = latency;
    }

    /// Number of lookups performed so far.
    pub fn lookup_count(&self) -> u64 {
        self.lookup_count.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl IdentityStore for MockIdentityStore {
    async fn lookup(
        &self,
        id: Uuid,
        username: &str,
        email: &str,
    ) -> Result<Option<UserRecord>, LookupError> {
        self.lookup_count.fetch_add(1, Ordering::SeqCst);

        let latency = *self.latency.lock().unwrap();
        if let Some(latency) = latency {
            tokio::time::sleep(latency).await;
        }

        if self.fail_all.load(Ordering::SeqCst) {
            return Err(LookupError::backend("mock store unavailable"));
        }

        self.records.lookup(id, username, email).await
    }
}
