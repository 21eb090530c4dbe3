// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! API error types and handling.
//!
//! Every terminal outcome of the gate maps to one variant here. Responses are
//! always rendered as `{"error": "<message>"}`.

use axum::{
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
};
use thiserror::Error;

use crate::auth::{LookupError, TokenError};
use crate::response::{write_json, Envelope};

/// Result type alias for API operations.
pub type ApiResult<T> = Result<T, ApiError>;

/// Message returned to clients that hit the rate limit.
pub const RATE_LIMIT_MESSAGE: &str = "Too many requests, please try again later";

/// Message returned to clients on internal failures.
pub const INTERNAL_MESSAGE: &str = "internal server error";

// =============================================================================
// ApiError
// =============================================================================

/// Terminal outcome of a gated request.
///
/// The `Display` text is for logs. Clients only ever see
/// [`ApiError::user_message`].
#[derive(Debug, Error)]
pub enum ApiError {
    /// 400. The credential was valid but something else about the request is not.
    #[error("bad request: {0}")]
    BadRequest(String),

    /// 401.
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    /// 403.
    #[error("forbidden: {0}")]
    Forbidden(String),

    /// 429.
    #[error("rate limited")]
    RateLimitExceeded {
        /// Whole seconds until a token is available, `None` if never.
        retry_after: Option<u64>,
    },

    /// 500. The message is logged and never sent.
    #[error("internal: {0}")]
    Internal(String),
}

impl ApiError {
    /// 400 with `message`.
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::BadRequest(message.into())
    }

    /// 401 with `message`.
    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::Unauthorized(message.into())
    }

    /// 403 with `message`.
    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::Forbidden(message.into())
    }

    /// 429, optionally with a `Retry-After` hint.
    pub fn rate_limit_exceeded(retry_after: Option<u64>) -> Self {
        Self::RateLimitExceeded { retry_after }
    }

    /// 500. `message` stays server-side.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    /// HTTP status for this outcome.
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::Forbidden(_) => StatusCode::FORBIDDEN,
            Self::RateLimitExceeded { .. } => StatusCode::TOO_MANY_REQUESTS,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Message placed in the `{"error": ...}` body.
    pub fn user_message(&self) -> String {
        match self {
            Self::BadRequest(message) | Self::Unauthorized(message) | Self::Forbidden(message) => {
                message.clone()
            }
            Self::RateLimitExceeded { .. } => RATE_LIMIT_MESSAGE.to_string(),
            Self::Internal(_) => INTERNAL_MESSAGE.to_string(),
        }
    }

    /// Whether this is the server's fault.
    pub fn is_server_error(&self) -> bool {
        matches!(self, Self::Internal(_))
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        if self.is_server_error() {
            tracing::error!(error = %self, status = status.as_u16(), "Request failed");
        } else {
            tracing::debug!(error = %self, status = status.as_u16(), "Request rejected");
        }

        let mut response = write_json(status, Envelope::error(self.user_message()));

        if let Self::RateLimitExceeded {
            retry_after: Some(seconds),
        } = self
        {
            response
                .headers_mut()
                .insert(header::RETRY_AFTER, HeaderValue::from(seconds));
        }

        response
    }
}

// =============================================================================
// From Implementations
// =============================================================================

impl From<TokenError> for ApiError {
    fn from(err: TokenError) -> Self {
        match err {
            TokenError::InvalidToken => ApiError::unauthorized("invalid token"),
            TokenError::Signing(message) => ApiError::internal(message),
        }
    }
}

impl From<LookupError> for ApiError {
    fn from(err: LookupError) -> Self {
        ApiError::internal(err.to_string())
    }
}

impl From<serde_json::Error> for ApiError {
    fn from(err: serde_json::Error) -> Self {
        ApiError::internal(format!("Failed to encode response body: {}", err))
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_status_codes() {
        assert_eq!(ApiError::bad_request("x").status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(ApiError::unauthorized("x").status_code(), StatusCode::UNAUTHORIZED);
        assert_eq!(ApiError::forbidden("x").status_code(), StatusCode::FORBIDDEN);
        assert_eq!(
            ApiError::rate_limit_exceeded(Some(1)).status_code(),
            StatusCode::TOO_MANY_REQUESTS
        );
        assert_eq!(
            ApiError::internal("x").status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_internal_message_is_hidden() {
        let err = ApiError::internal("connection refused: 10.0.0.5:5432");
        assert_eq!(err.user_message(), INTERNAL_MESSAGE);
    }

    #[test]
    fn test_token_error_conversion() {
        let err = ApiError::from(TokenError::InvalidToken);
        assert_eq!(err.status_code(), StatusCode::UNAUTHORIZED);
        assert_eq!(err.user_message(), "invalid token");

        let err = ApiError::from(TokenError::Signing("boom".to_string()));
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_lookup_error_conversion() {
        let err = ApiError::from(LookupError::backend("timeout"));
        assert!(err.is_server_error());
    }

    #[test]
    fn test_retry_after_header() {
        let response = ApiError::rate_limit_exceeded(Some(3)).into_response();

        assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(response.headers().get(header::RETRY_AFTER).unwrap(), "3");

        let response = ApiError::rate_limit_exceeded(None).into_response();
        assert!(response.headers().get(header::RETRY_AFTER).is_none());
    }
}
