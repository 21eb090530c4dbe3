// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Gate stages applied to every request.
//!
//! - [`RateLimitLayer`]: per-client admission control, always outermost
//! - [`AuthLayer`]: bearer token authentication and identity resolution

mod auth;
mod rate_limit;

pub use auth::{AuthLayer, AuthMiddleware, MALFORMED_HEADER_MESSAGE, UNKNOWN_IDENTITY_MESSAGE};
pub use rate_limit::{
    derive_client_key, Admission, AdmissionController, ClientKey, RateLimitConfig,
    RateLimitLayer, RateLimitMiddleware, SweeperHandle, UNKNOWN_CLIENT,
};
