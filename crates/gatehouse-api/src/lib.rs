// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! # gatehouse-api
//!
//! The gate every inbound HTTP request passes through before it reaches
//! business handlers.
//!
//! Two pipeline stages are provided, always applied in this order:
//!
//! 1. **Admission** ([`middleware::RateLimitLayer`]): a per-client token
//!    bucket limiter with idle-client eviction by a background sweeper.
//! 2. **Authentication** ([`middleware::AuthLayer`]): bearer token
//!    verification and identity resolution through an [`IdentityStore`].
//!
//! Handlers read the resolved caller through the extractors in
//! [`extractors`].
//!
//! ## Deployment notes
//!
//! - Client keys prefer `X-Forwarded-For` / `X-Real-IP`. Only enable
//!   `trust_proxy_headers` when the service sits behind a proxy that
//!   overwrites those headers, otherwise callers can pick their own key.
//! - Limiter state is process local. Running several replicas gives each
//!   replica its own independent budget per client.

#![warn(missing_docs)]
#![deny(unsafe_code)]

pub mod auth;
pub mod config;
pub mod error;
pub mod extractors;
pub mod handlers;
pub mod middleware;
pub mod response;
pub mod server;
pub mod state;

pub use auth::{
    Identity, IdentityStore, InMemoryIdentityStore, JwtConfig, LookupError, TokenClaims,
    TokenCodec, TokenError, TokenSubject, User, UserRecord,
};
pub use config::ApiConfig;
pub use error::{ApiError, ApiResult};
pub use extractors::{AuthenticatedUser, CurrentIdentity, VerifiedUser};
pub use middleware::{
    Admission, AdmissionController, AuthLayer, ClientKey, RateLimitConfig, RateLimitLayer,
    SweeperHandle,
};
pub use server::GateServer;
pub use state::AppState;

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
