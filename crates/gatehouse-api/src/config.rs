// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Gate server configuration.

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::auth::JwtConfig;
use crate::error::{ApiError, ApiResult};
use crate::middleware::RateLimitConfig;

// =============================================================================
// ApiConfig
// =============================================================================

/// Configuration for the gate server.
///
/// Loaded once at startup and immutable afterwards.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    /// Server host address.
    pub host: IpAddr,
    /// Server port.
    pub port: u16,
    /// Token signing configuration.
    pub jwt: JwtConfig,
    /// Rate limiting configuration.
    pub rate_limit: RateLimitConfig,
    /// Overall request deadline.
    #[serde(with = "humantime_serde")]
    pub request_timeout: Duration,
    /// Deadline for a single identity lookup.
    #[serde(with = "humantime_serde")]
    pub lookup_timeout: Duration,
    /// Graceful shutdown timeout.
    #[serde(with = "humantime_serde")]
    pub shutdown_timeout: Duration,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            host: IpAddr::V4(Ipv4Addr::new(0, 0, 0, 0)),
            port: 8080,
            jwt: JwtConfig::default(),
            rate_limit: RateLimitConfig::default(),
            request_timeout: Duration::from_secs(30),
            lookup_timeout: Duration::from_secs(5),
            shutdown_timeout: Duration::from_secs(30),
        }
    }
}

impl ApiConfig {
    /// Creates a new configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the socket address to bind to.
    pub fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    /// Sets the host address.
    pub fn with_host(mut self, host: IpAddr) -> Self {
        self.host = host;
        self
    }

    /// Sets the port.
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Sets the JWT configuration.
    pub fn with_jwt(mut self, jwt: JwtConfig) -> Self {
        self.jwt = jwt;
        self
    }

    /// Sets the rate limit configuration.
    pub fn with_rate_limit(mut self, rate_limit: RateLimitConfig) -> Self {
        self.rate_limit = rate_limit;
        self
    }

    /// Sets the identity lookup deadline.
    pub fn with_lookup_timeout(mut self, timeout: Duration) -> Self {
        self.lookup_timeout = timeout;
        self
    }

    /// Sets the overall request deadline.
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Deadline applied to identity lookups.
    ///
    /// A lookup must time out before the request does, so that it fails as an
    /// internal error instead of a bare 408. A `lookup_timeout` that is not
    /// shorter than `request_timeout` is cut to half the request deadline.
    pub fn effective_lookup_timeout(&self) -> Duration {
        if self.lookup_timeout < self.request_timeout {
            self.lookup_timeout
        } else {
            self.request_timeout / 2
        }
    }

    /// Validates the configuration.
    ///
    /// Rate limit values are not rejected here; they are clamped when the
    /// admission controller is built.
    pub fn validate(&self) -> ApiResult<()> {
        self.jwt.validate()?;

        if self.request_timeout.is_zero() {
            return Err(ApiError::internal("request_timeout must be greater than zero"));
        }
        if self.lookup_timeout.is_zero() {
            return Err(ApiError::internal("lookup_timeout must be greater than zero"));
        }
        if self.lookup_timeout >= self.request_timeout {
            return Err(ApiError::internal(format!(
                "lookup_timeout ({:?}) must be shorter than request_timeout ({:?})",
                self.lookup_timeout, self.request_timeout
            )));
        }

        Ok(())
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ApiConfig::default();

        assert_eq!(config.port, 8080);
        assert!(config.rate_limit.enabled);
        assert_eq!(config.rate_limit.requests_per_second, 2.0);
        assert_eq!(config.rate_limit.burst_size, 4);
        assert_eq!(config.jwt.expiration, Duration::from_secs(24 * 60 * 60));
    }

    #[test]
    fn test_socket_addr() {
        let config = ApiConfig::new()
            .with_host(IpAddr::V4(Ipv4Addr::LOCALHOST))
            .with_port(9000);

        assert_eq!(config.socket_addr().to_string(), "127.0.0.1:9000");
    }

    #[test]
    fn test_validate_requires_secret() {
        assert!(ApiConfig::default().validate().is_err());

        let config = ApiConfig::new().with_jwt(JwtConfig::new("a-secret-that-is-long-enough-for-hs256"));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_zero_lookup_timeout() {
        let config = ApiConfig::new()
            .with_jwt(JwtConfig::new("a-secret-that-is-long-enough-for-hs256"))
            .with_lookup_timeout(Duration::ZERO);

        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_lookup_outliving_request() {
        let config = ApiConfig::new()
            .with_jwt(JwtConfig::new("a-secret-that-is-long-enough-for-hs256"))
            .with_request_timeout(Duration::from_secs(5))
            .with_lookup_timeout(Duration::from_secs(5));

        let err = config.validate().unwrap_err();
        assert!(err.is_server_error());
        assert!(err.to_string().contains("lookup_timeout"));
    }

    #[test]
    fn test_validate_errors_are_not_client_errors() {
        let config = ApiConfig::new()
            .with_jwt(JwtConfig::new("a-secret-that-is-long-enough-for-hs256"))
            .with_request_timeout(Duration::ZERO);

        let err = config.validate().unwrap_err();
        assert_ne!(err.status_code(), axum::http::StatusCode::BAD_REQUEST);
        assert!(err.is_server_error());
    }

    #[test]
    fn test_effective_lookup_timeout() {
        let config = ApiConfig::new();
        assert_eq!(config.effective_lookup_timeout(), Duration::from_secs(5));

        let config = ApiConfig::new()
            .with_request_timeout(Duration::from_millis(50))
            .with_lookup_timeout(Duration::from_secs(5));
        assert_eq!(config.effective_lookup_timeout(), Duration::from_millis(25));
    }

    #[test]
    fn test_deserialize_partial() {
        let json = r#"{
            "port": 3000,
            "lookup_timeout": "250ms",
            "rate_limit": { "requests_per_second": 10.0, "idle_timeout": "5m" }
        }"#;

        let config: ApiConfig = serde_json::from_str(json).unwrap();

        assert_eq!(config.port, 3000);
        assert_eq!(config.lookup_timeout, Duration::from_millis(250));
        assert_eq!(config.rate_limit.requests_per_second, 10.0);
        assert_eq!(config.rate_limit.burst_size, 4);
        assert_eq!(config.rate_limit.idle_timeout, Duration::from_secs(300));
    }
}
