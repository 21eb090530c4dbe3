// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Application state shared across handlers and gate stages.

use std::sync::Arc;

use crate::auth::{IdentityStore, TokenCodec};
use crate::config::ApiConfig;
use crate::error::{ApiError, ApiResult};
use crate::middleware::AdmissionController;

// =============================================================================
// AppState
// =============================================================================

/// Application state shared across all handlers.
///
/// Every field is shared: the admission controller in particular is the same
/// instance seen by the rate limit layer and the background sweeper.
#[derive(Clone)]
pub struct AppState {
    /// Server configuration.
    pub config: Arc<ApiConfig>,
    /// Token issuer and verifier.
    pub codec: Arc<TokenCodec>,
    /// Identity lookup backend.
    pub store: Arc<dyn IdentityStore>,
    /// Per-client admission controller.
    pub admission: Arc<AdmissionController>,
}

impl AppState {
    /// Creates a new app state builder.
    pub fn builder() -> AppStateBuilder {
        AppStateBuilder::new()
    }

    /// Returns the token codec.
    pub fn codec(&self) -> &TokenCodec {
        &self.codec
    }

    /// Returns the admission controller.
    pub fn admission(&self) -> &Arc<AdmissionController> {
        &self.admission
    }
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("config", &self.config)
            .field("codec", &self.codec)
            .field("tracked_clients", &self.admission.tracked_clients())
            .finish_non_exhaustive()
    }
}

// =============================================================================
// AppStateBuilder
// =============================================================================

/// Builder for constructing AppState.
#[derive(Default)]
pub struct AppStateBuilder {
    config: Option<ApiConfig>,
    codec: Option<Arc<TokenCodec>>,
    store: Option<Arc<dyn IdentityStore>>,
    admission: Option<Arc<AdmissionController>>,
}

impl AppStateBuilder {
    /// Creates a new builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the configuration.
    pub fn config(mut self, config: ApiConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Sets the token codec. Built from the configuration if not set.
    pub fn codec(mut self, codec: Arc<TokenCodec>) -> Self {
        self.codec = Some(codec);
        self
    }

    /// Sets the identity store.
    pub fn store(mut self, store: Arc<dyn IdentityStore>) -> Self {
        self.store = Some(store);
        self
    }

    /// Sets the admission controller. Built from the configuration if not set.
    pub fn admission(mut self, admission: Arc<AdmissionController>) -> Self {
        self.admission = Some(admission);
        self
    }

    /// Builds the AppState.
    ///
    /// Fails if no identity store was given or the token configuration is
    /// invalid.
    pub fn build(self) -> ApiResult<AppState> {
        let config = self.config.unwrap_or_default();

        let store = self
            .store
            .ok_or_else(|| ApiError::internal("identity store is required"))?;

        let codec = match self.codec {
            Some(codec) => codec,
            None => Arc::new(TokenCodec::new(config.jwt.clone())?),
        };

        let admission = self
            .admission
            .unwrap_or_else(|| Arc::new(AdmissionController::new(config.rate_limit.clone())));

        Ok(AppState {
            config: Arc::new(config),
            codec,
            store,
            admission,
        })
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::{InMemoryIdentityStore, JwtConfig};
    use crate::middleware::RateLimitConfig;

    fn config() -> ApiConfig {
        ApiConfig::new().with_jwt(JwtConfig::new("state-test-secret-that-is-long-enough"))
    }

    #[test]
    fn test_build_requires_store() {
        let result = AppState::builder().config(config()).build();
        assert!(result.is_err());
    }

    #[test]
    fn test_build_requires_secret() {
        let result = AppState::builder()
            .store(Arc::new(InMemoryIdentityStore::new()))
            .build();
        assert!(result.is_err());
    }

    #[test]
    fn test_build_from_config() {
        let state = AppState::builder()
            .config(config().with_rate_limit(RateLimitConfig::new(5.0, 10)))
            .store(Arc::new(InMemoryIdentityStore::new()))
            .build()
            .unwrap();

        assert_eq!(state.admission().config().burst_size, 10);
        assert_eq!(state.codec().ttl_secs(), 24 * 60 * 60);
    }

    #[test]
    fn test_build_with_shared_admission() {
        let admission = Arc::new(AdmissionController::disabled());
        let state = AppState::builder()
            .config(config())
            .store(Arc::new(InMemoryIdentityStore::new()))
            .admission(admission.clone())
            .build()
            .unwrap();

        assert!(Arc::ptr_eq(state.admission(), &admission));
    }
}
