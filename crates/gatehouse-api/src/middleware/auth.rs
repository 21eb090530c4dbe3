// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Bearer token authentication middleware.
//!
//! Every request leaves this stage either rejected or carrying exactly one
//! [`Identity`]. A missing `Authorization` header is not an error here; it
//! yields [`Identity::Anonymous`] and per-endpoint extractors decide later
//! whether identity is required.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use std::time::Duration;

use axum::{
    body::Body,
    http::{header, HeaderMap, HeaderValue, Method, Request, Uri},
    response::{IntoResponse, Response},
};
use tower::{Layer, Service};

use crate::auth::{context, Identity, IdentityStore, TokenCodec, User};
use crate::error::ApiError;

const BEARER: &str = "Bearer";

/// Message for an `Authorization` header that is not `Bearer <token>`.
pub const MALFORMED_HEADER_MESSAGE: &str = "invalid authorization header";

/// Message for a token that references no stored identity.
pub const UNKNOWN_IDENTITY_MESSAGE: &str = "user not found";

// =============================================================================
// AuthLayer
// =============================================================================

/// Layer for bearer token authentication.
#[derive(Clone)]
pub struct AuthLayer {
    resolver: Arc<IdentityResolver>,
}

impl AuthLayer {
    /// Creates a new auth layer.
    pub fn new(codec: Arc<TokenCodec>, store: Arc<dyn IdentityStore>) -> Self {
        Self {
            resolver: Arc::new(IdentityResolver {
                codec,
                store,
                lookup_timeout: None,
            }),
        }
    }

    /// Bounds how long an identity lookup may take.
    pub fn with_lookup_timeout(self, timeout: Duration) -> Self {
        Self {
            resolver: Arc::new(IdentityResolver {
                codec: self.resolver.codec.clone(),
                store: self.resolver.store.clone(),
                lookup_timeout: Some(timeout),
            }),
        }
    }
}

impl<S> Layer<S> for AuthLayer {
    type Service = AuthMiddleware<S>;

    fn layer(&self, inner: S) -> Self::Service {
        AuthMiddleware {
            inner,
            resolver: self.resolver.clone(),
        }
    }
}

// =============================================================================
// AuthMiddleware
// =============================================================================

/// Middleware for bearer token authentication.
#[derive(Clone)]
pub struct AuthMiddleware<S> {
    inner: S,
    resolver: Arc<IdentityResolver>,
}

impl<S> Service<Request<Body>> for AuthMiddleware<S>
where
    S: Service<Request<Body>, Response = Response> + Clone + Send + 'static,
    S::Future: Send + 'static,
{
    type Response = S::Response;
    type Error = S::Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, req: Request<Body>) -> Self::Future {
        let resolver = self.resolver.clone();
        let clone = self.inner.clone();
        let mut inner = std::mem::replace(&mut self.inner, clone);

        Box::pin(async move {
            let (parts, body) = req.into_parts();
            let resolved = resolver
                .resolve(&parts.headers, &parts.method, &parts.uri)
                .await;

            let mut response = match resolved {
                Ok(identity) => {
                    let req = Request::from_parts(parts, body);
                    inner.call(context::attach(req, identity)).await?
                }
                Err(e) => {
                    if !e.is_server_error() {
                        tracing::debug!(
                            method = %parts.method,
                            uri = %parts.uri,
                            reason = %e,
                            "Authentication rejected"
                        );
                    }
                    e.into_response()
                }
            };

            response.headers_mut().append(
                header::VARY,
                HeaderValue::from_static("Authorization"),
            );

            Ok(response)
        })
    }
}

// =============================================================================
// IdentityResolver
// =============================================================================

/// Credential parsing, token verification and identity lookup.
struct IdentityResolver {
    codec: Arc<TokenCodec>,
    store: Arc<dyn IdentityStore>,
    lookup_timeout: Option<Duration>,
}

impl IdentityResolver {
    async fn resolve(
        &self,
        headers: &HeaderMap,
        method: &Method,
        uri: &Uri,
    ) -> Result<Identity, ApiError> {
        let token = match bearer_token(headers)? {
            Some(token) => token,
            None => return Ok(Identity::Anonymous),
        };

        let claims = self.codec.verify(token)?;

        let lookup = self
            .store
            .lookup(claims.id, &claims.username, &claims.email);

        let outcome = match self.lookup_timeout {
            Some(limit) => match tokio::time::timeout(limit, lookup).await {
                Ok(outcome) => outcome,
                Err(_) => {
                    tracing::error!(
                        uri = %uri,
                        method = %method,
                        timeout = ?limit,
                        "Identity lookup timed out"
                    );
                    return Err(ApiError::internal("identity lookup timed out"));
                }
            },
            None => lookup.await,
        };

        match outcome {
            Ok(Some(record)) => Ok(Identity::Resolved(User::from(record))),
            Ok(None) => {
                tracing::debug!(user_id = %claims.id, "Token references unknown identity");
                Err(ApiError::bad_request(UNKNOWN_IDENTITY_MESSAGE))
            }
            Err(e) => {
                tracing::error!(
                    uri = %uri,
                    method = %method,
                    error = %e,
                    "Identity lookup failed"
                );
                Err(e.into())
            }
        }
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Extracts the bearer token from the `Authorization` header.
///
/// Returns `Ok(None)` when the header is absent or empty. Anything other than
/// exactly `Bearer <token>` with a single space is rejected.
fn bearer_token(headers: &HeaderMap) -> Result<Option<&str>, ApiError> {
    let value = match headers.get(header::AUTHORIZATION) {
        Some(value) if !value.is_empty() => value,
        _ => return Ok(None),
    };

    let malformed = || {
        tracing::debug!("Malformed authorization header");
        ApiError::unauthorized(MALFORMED_HEADER_MESSAGE)
    };

    let value = value.to_str().map_err(|_| malformed())?;
    let mut parts = value.split(' ');

    match (parts.next(), parts.next(), parts.next()) {
        (Some(BEARER), Some(token), None) => Ok(Some(token)),
        _ => Err(malformed()),
    }
}

// =============================================================================
// Tests
// =============================================================================
