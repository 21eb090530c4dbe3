// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! # Test Fixtures
//!
//! Identities and configurations shared across integration tests.

use std::net::{IpAddr, Ipv4Addr};
use std::time::Duration;

use gatehouse_api::{ApiConfig, JwtConfig, RateLimitConfig, TokenSubject, UserRecord};

/// Signing secret used by every test configuration.
pub const TEST_SECRET: &str = "integration-test-secret-with-enough-entropy";

// =============================================================================
// User Fixtures
// =============================================================================

/// Identity fixtures.
pub struct UserFixtures;

impl UserFixtures {
    /// A verified user.
    pub fn ada() -> UserRecord {
        UserRecord::new("ada@example.com", "ada", "Ada Lovelace").verified()
    }

    /// An unverified user.
    pub fn grace() -> UserRecord {
        UserRecord::new("grace@example.com", "grace", "Grace Hopper")
    }

    /// The token subject for `record`.
    pub fn subject(record: &UserRecord) -> TokenSubject {
        TokenSubject::new(record.id, record.email.clone(), record.username.clone())
    }
}

// =============================================================================
// Config Fixtures
// =============================================================================

/// Configuration fixtures.
pub struct ConfigFixtures;

impl ConfigFixtures {
    /// Signing settings with the test secret.
    pub fn jwt() -> JwtConfig {
        JwtConfig::new(TEST_SECRET)
    }

    /// Server configuration bound to an ephemeral loopback port.
    pub fn api() -> ApiConfig {
        ApiConfig::new()
            .with_host(IpAddr::V4(Ipv4Addr::LOCALHOST))
            .with_port(0)
            .with_jwt(Self::jwt())
            .with_rate_limit(Self::rate_limit())
    }

    /// The default limiter settings: 2 req/s with a burst of 4.
    pub fn rate_limit() -> RateLimitConfig {
        RateLimitConfig::default()
    }

    /// A limiter that never refills, so exactly `burst` requests get through.
    pub fn no_refill(burst: u32) -> RateLimitConfig {
        RateLimitConfig::new(0.0, burst)
    }

    /// Server configuration with a short identity lookup deadline.
    pub fn with_lookup_timeout(timeout: Duration) -> ApiConfig {
        Self::api().with_lookup_timeout(timeout)
    }
}
