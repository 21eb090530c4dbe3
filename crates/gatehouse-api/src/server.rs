// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Gate server.
//!
//! Layer order, outermost first:
//!
//! 1. request tracing
//! 2. request deadline (408)
//! 3. admission control (429)
//! 4. authentication (401 / 400 / 500), on API routes only
//! 5. handlers
//!
//! `/health` sits behind admission control only. A health check must not
//! depend on credentials, so it never carries `Vary: Authorization`.

use std::future::Future;
use std::net::SocketAddr;

use axum::{http::StatusCode, routing::get, Router};
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};
use tracing::info;

use crate::error::{ApiError, ApiResult};
use crate::handlers;
use crate::middleware::{AuthLayer, RateLimitLayer};
use crate::state::AppState;

// =============================================================================
// GateServer
// =============================================================================

/// The gate server.
///
/// Owns the shared state and, while running, the admission sweeper.
#[derive(Debug, Clone)]
pub struct GateServer {
    state: AppState,
}

impl GateServer {
    /// Creates a new server with the given state.
    pub fn new(state: AppState) -> Self {
        Self { state }
    }

    /// Returns the shared state.
    pub fn state(&self) -> &AppState {
        &self.state
    }

    /// Returns the admission control layer.
    pub fn rate_limit_layer(&self) -> RateLimitLayer {
        RateLimitLayer::new(self.state.admission.clone())
    }

    /// Returns the authentication layer.
    pub fn auth_layer(&self) -> AuthLayer {
        AuthLayer::new(self.state.codec.clone(), self.state.store.clone())
            .with_lookup_timeout(self.state.config.effective_lookup_timeout())
    }

    /// Wraps `router` in both gate stages, admission first.
    pub fn gate<S>(&self, router: Router<S>) -> Router<S>
    where
        S: Clone + Send + Sync + 'static,
    {
        router.layer(self.auth_layer()).layer(self.rate_limit_layer())
    }

    /// Creates the router with all routes and middleware.
    pub fn router(&self) -> Router {
        let api = Router::new()
            .route("/api/auth/me", get(handlers::current_user))
            .layer(self.auth_layer());

        let middleware_stack = ServiceBuilder::new()
            .layer(TraceLayer::new_for_http())
            .layer(TimeoutLayer::with_status_code(
                StatusCode::REQUEST_TIMEOUT,
                self.state.config.request_timeout,
            ))
            .layer(self.rate_limit_layer());

        Router::new()
            .route("/health", get(handlers::health))
            .merge(api)
            .layer(middleware_stack)
            .with_state(self.state.clone())
    }

    /// Binds the configured address and runs until `shutdown_signal` resolves.
    pub async fn run_with_shutdown(
        self,
        shutdown_signal: impl Future<Output = ()> + Send + 'static,
    ) -> ApiResult<()> {
        let addr = self.addr();

        let listener = TcpListener::bind(addr)
            .await
            .map_err(|e| ApiError::internal(format!("Failed to bind {}: {}", addr, e)))?;

        self.serve(listener, shutdown_signal).await
    }

    /// Serves on an already bound listener until `shutdown_signal` resolves.
    ///
    /// The admission sweeper runs for exactly as long as the server does.
    pub async fn serve(
        self,
        listener: TcpListener,
        shutdown_signal: impl Future<Output = ()> + Send + 'static,
    ) -> ApiResult<()> {
        let local_addr = listener
            .local_addr()
            .map_err(|e| ApiError::internal(format!("Failed to read local address: {}", e)))?;
        let router = self.router();
        let sweeper = self.state.admission.spawn_sweeper();

        info!(
            addr = %local_addr,
            rate_limit = self.state.admission.is_enabled(),
            "Starting gate server"
        );

        let result = axum::serve(
            listener,
            router.into_make_service_with_connect_info::<SocketAddr>(),
        )
        .with_graceful_shutdown(shutdown_signal)
        .await;

        sweeper.stop().await;

        result.map_err(|e| ApiError::internal(format!("Server error: {}", e)))?;

        info!("Gate server shutdown complete");

        Ok(())
    }

    /// Returns the configured server address.
    pub fn addr(&self) -> SocketAddr {
        self.state.config.socket_addr()
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::{body::Body, http::Request};
    use tower::ServiceExt;

    use super::*;
    use crate::auth::{InMemoryIdentityStore, JwtConfig};
    use crate::config::ApiConfig;

    fn server() -> GateServer {
        let state = AppState::builder()
            .config(ApiConfig::new().with_jwt(JwtConfig::new("server-test-secret-long-enough-1234")))
            .store(Arc::new(InMemoryIdentityStore::new()))
            .build()
            .unwrap();
        GateServer::new(state)
    }

    #[tokio::test]
    async fn test_health_is_not_authenticated() {
        let response = server()
            .router()
            .oneshot(
                Request::builder()
                    .uri("/health")
                    .header("authorization", "Basic nonsense")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert!(response.headers().get("vary").is_none());
    }

    #[tokio::test]
    async fn test_me_requires_identity() {
        let response = server()
            .router()
            .oneshot(
                Request::builder()
                    .uri("/api/auth/me")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(response.headers().get("vary").unwrap(), "Authorization");
    }

    #[tokio::test]
    async fn test_serve_stops_on_signal() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();

        let result = tokio::time::timeout(
            std::time::Duration::from_secs(5),
            server().serve(listener, async {}),
        )
        .await;

        assert!(matches!(result, Ok(Ok(()))));
    }
}
