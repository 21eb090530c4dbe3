// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Custom extractors for gated handlers.

use axum::{extract::FromRequestParts, http::request::Parts};

use crate::auth::{context, Identity, User};
use crate::error::ApiError;
use crate::middleware::{derive_client_key, ClientKey};

/// Message for endpoints that need a resolved caller.
pub const AUTH_REQUIRED_MESSAGE: &str = "authentication required";

/// Message for endpoints that need a verified email address.
pub const VERIFICATION_REQUIRED_MESSAGE: &str = "email verification required";

// =============================================================================
// Identity Extractors
// =============================================================================

/// Extractor for the identity attached by the authentication layer.
///
/// # Panics
///
/// Extraction panics if the handler is not behind
/// [`AuthLayer`](crate::middleware::AuthLayer).
pub struct CurrentIdentity(pub Identity);

impl<S> FromRequestParts<S> for CurrentIdentity
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(CurrentIdentity(context::current(&parts.extensions).clone()))
    }
}

/// Extractor for requests that must carry a resolved caller.
///
/// Returns 401 for anonymous callers.
///
/// # Example
///
/// ```rust,ignore
/// async fn handler(AuthenticatedUser(user): AuthenticatedUser) -> impl IntoResponse {
///     format!("Hello, {}", user.username)
/// }
/// ```
pub struct AuthenticatedUser(pub User);

impl<S> FromRequestParts<S> for AuthenticatedUser
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        context::current(&parts.extensions)
            .user()
            .cloned()
            .map(AuthenticatedUser)
            .ok_or_else(|| ApiError::unauthorized(AUTH_REQUIRED_MESSAGE))
    }
}

/// Extractor for requests from a caller with a verified email address.
///
/// Returns 401 for anonymous callers and 403 for unverified ones.
pub struct VerifiedUser(pub User);

impl<S> FromRequestParts<S> for VerifiedUser
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let AuthenticatedUser(user) = AuthenticatedUser::from_request_parts(parts, state).await?;

        if user.is_verified {
            Ok(VerifiedUser(user))
        } else {
            Err(ApiError::forbidden(VERIFICATION_REQUIRED_MESSAGE))
        }
    }
}

// =============================================================================
// Client Key Extractor
// =============================================================================

impl<S> FromRequestParts<S> for ClientKey
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        // Set by the rate limit layer. Without it, proxy headers are not trusted.
        if let Some(key) = parts.extensions.get::<ClientKey>() {
            return Ok(key.clone());
        }

        Ok(derive_client_key(&parts.headers, &parts.extensions, false))
    }
}

// =============================================================================
// Tests
// =============================================================================
