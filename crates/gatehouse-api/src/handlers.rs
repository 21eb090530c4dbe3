// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Built-in handlers.

use axum::{http::StatusCode, response::Response};

use crate::error::ApiResult;
use crate::extractors::AuthenticatedUser;
use crate::response::{write_json, Envelope, HealthResponse};

/// Health check. Sits behind admission control only.
pub async fn health() -> HealthResponse {
    HealthResponse::healthy()
}

/// Returns the resolved caller as `{"user": {...}}`.
pub async fn current_user(AuthenticatedUser(user): AuthenticatedUser) -> ApiResult<Response> {
    let body = Envelope::new().with_serialized("user", &user)?;
    Ok(write_json(StatusCode::OK, body))
}
