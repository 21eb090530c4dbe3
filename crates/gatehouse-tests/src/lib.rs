// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! # Gatehouse Integration Tests
//!
//! Shared utilities and end-to-end tests for the gate pipeline.
//!
//! ## Module Structure
//!
//! - [`common`]: Shared test utilities
//!   - `fixtures`: Users, secrets and configurations
//!   - `builders`: Request builders
//!   - `assertions`: Response assertions
//!   - `mocks`: An identity store with failure and latency injection
//!   - `harness`: A gate server wired to the mock store
//!
//! ## Running Tests
//!
//! ```bash
//! cargo test -p gatehouse-tests
//! cargo test -p gatehouse-tests --test integration_gate
//! cargo test -p gatehouse-tests --test integration_admission
//! cargo test -p gatehouse-tests --test integration_config
//! ```
//!
//! ## Writing New Tests
//!
//! ```rust,ignore
//! use gatehouse_tests::prelude::*;
//!
//! #[tokio::test]
//! async fn test_something() {
//!     let harness = GateHarness::new();
//!     let ada = harness.seed(UserFixtures::ada());
//!
//!     let response = harness
//!         .send(GateRequest::get("/api/auth/me").bearer(&harness.token_for(&ada)))
//!         .await;
//!     response.assert_status(StatusCode::OK);
//! }
//! ```

#![warn(missing_docs)]
#![deny(unsafe_code)]

pub mod common;

/// Re-export commonly used items for convenience.
pub mod prelude {
    pub use crate::common::assertions::*;
    pub use crate::common::builders::*;
    pub use crate::common::fixtures::*;
    pub use crate::common::harness::*;
    pub use crate::common::mocks::*;
    pub use axum::http::StatusCode;
}
