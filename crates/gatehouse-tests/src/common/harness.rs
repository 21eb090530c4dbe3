// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! # Test Harness
//!
//! A gate server wired to a [`MockIdentityStore`], driven in-process
//! through `tower::ServiceExt::oneshot`.
//!
//! ## Usage
//!
//! ```rust,ignore
//! let harness = GateHarness::new();
//! let ada = harness.seed(UserFixtures::ada());
//! let token = harness.token_for(&ada);
//!
//! let response = harness
//!     .send(GateRequest::get("/api/auth/me").bearer(&token))
//!     .await;
//! ```

use std::sync::Arc;

use axum::body::Body;
use axum::http::Request;
use axum::Router;
use chrono::{DateTime, Utc};
use gatehouse_api::{ApiConfig, AppState, GateServer, TokenCodec, UserRecord};
use tower::ServiceExt;

use super::assertions::TestResponse;
use super::fixtures::{ConfigFixtures, UserFixtures};
use super::init_test_logging;
use super::mocks::MockIdentityStore;

// =============================================================================
// GateHarness
// =============================================================================

/// In-process gate under test.
pub struct GateHarness {
    store: Arc<MockIdentityStore>,
    server: GateServer,
    router: Router,
}

impl GateHarness {
    /// Creates a harness with the fixture configuration.
    pub fn new() -> Self {
        Self::with_config(ConfigFixtures::api())
    }

    /// Creates a harness with a custom configuration.
    pub fn with_config(config: ApiConfig) -> Self {
        init_test_logging();

        let store = Arc::new(MockIdentityStore::new());
        let state = AppState::builder()
            .config(config)
            .store(store.clone())
            .build()
            .expect("Failed to build state");

        let server = GateServer::new(state);
        let router = server.router();

        Self {
            store,
            server,
            router,
        }
    }

    /// Returns the identity store.
    pub fn store(&self) -> &MockIdentityStore {
        &self.store
    }

    /// Returns the server.
    pub fn server(&self) -> &GateServer {
        &self.server
    }

    /// Returns the token codec.
    pub fn codec(&self) -> &TokenCodec {
        self.server.state().codec()
    }

    /// Inserts `record` into the store and returns it.
    pub fn seed(&self, record: UserRecord) -> UserRecord {
        self.store.insert(record.clone());
        record
    }

    /// Issues a valid token for `record`.
    pub fn token_for(&self, record: &UserRecord) -> String {
        self.codec()
            .issue(&UserFixtures::subject(record))
            .expect("Failed to issue token")
    }

    /// Issues a token for `record` as if it were issued at `issued_at`.
    pub fn token_issued_at(&self, record: &UserRecord, issued_at: DateTime<Utc>) -> String {
        self.codec()
            .issue_at(&UserFixtures::subject(record), issued_at)
            .expect("Failed to issue token")
    }

    /// Sends a request through the full router.
    pub async fn send(&self, request: impl Into<Request<Body>>) -> TestResponse {
        Self::send_to(self.router.clone(), request).await
    }

    /// Sends a request through `router` wrapped in both gate stages.
    pub async fn send_gated(
        &self,
        router: Router,
        request: impl Into<Request<Body>>,
    ) -> TestResponse {
        Self::send_to(self.server.gate(router), request).await
    }

    async fn send_to(router: Router, request: impl Into<Request<Body>>) -> TestResponse {
        let response = router
            .oneshot(request.into())
            .await
            .expect("Router is infallible");
        TestResponse::collect(response).await
    }
}

impl Default for GateHarness {
    fn default() -> Self {
        Self::new()
    }
}
