// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Signed identity tokens.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::{TokenClaims, TokenSubject};
use crate::error::{ApiError, ApiResult};

/// Default token lifetime.
pub const DEFAULT_TOKEN_TTL: Duration = Duration::from_secs(24 * 60 * 60);

/// HMAC algorithms accepted on verification.
const HMAC_FAMILY: [Algorithm; 3] = [Algorithm::HS256, Algorithm::HS384, Algorithm::HS512];

// =============================================================================
// TokenError
// =============================================================================

/// Token codec errors.
///
/// Verification failures are deliberately collapsed into a single variant so
/// callers cannot tell an expired token from a forged one.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TokenError {
    /// The token is expired, malformed, badly signed or uses a foreign algorithm.
    #[error("invalid token")]
    InvalidToken,

    /// The signing backend failed.
    #[error("failed to sign token: {0}")]
    Signing(String),
}

// =============================================================================
// JwtConfig
// =============================================================================

/// Token signing configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct JwtConfig {
    /// Shared secret for the HMAC signature.
    #[serde(skip_serializing)]
    pub secret: String,
    /// Token lifetime.
    #[serde(with = "humantime_serde")]
    pub expiration: Duration,
    /// Signing algorithm. Must be one of HS256, HS384, HS512.
    #[serde(with = "algorithm_serde")]
    pub algorithm: Algorithm,
    /// Clock skew tolerance in seconds.
    pub leeway_secs: u64,
}

impl Default for JwtConfig {
    fn default() -> Self {
        Self {
            secret: String::new(), // Must be set by user
            expiration: DEFAULT_TOKEN_TTL,
            algorithm: Algorithm::HS256,
            leeway_secs: 0,
        }
    }
}

impl JwtConfig {
    /// Creates a new configuration with the given secret.
    pub fn new(secret: impl Into<String>) -> Self {
        Self {
            secret: secret.into(),
            ..Default::default()
        }
    }

    /// Sets the token lifetime.
    pub fn with_expiration(mut self, expiration: Duration) -> Self {
        self.expiration = expiration;
        self
    }

    /// Validates the configuration.
    pub fn validate(&self) -> ApiResult<()> {
        if self.secret.is_empty() {
            return Err(ApiError::internal("JWT secret is not configured"));
        }
        if !HMAC_FAMILY.contains(&self.algorithm) {
            return Err(ApiError::internal(format!(
                "JWT algorithm {:?} is not an HMAC algorithm",
                self.algorithm
            )));
        }
        if self.expiration.is_zero() {
            return Err(ApiError::internal("JWT expiration must be positive"));
        }
        if self.secret.len() < 32 {
            tracing::warn!("JWT secret is shorter than recommended (32 bytes)");
        }
        Ok(())
    }
}

// =============================================================================
// TokenCodec
// =============================================================================

/// Stateless issuer and verifier of identity tokens.
///
/// Cheap to clone; keys and validation rules are shared.
#[derive(Clone)]
pub struct TokenCodec {
    config: Arc<JwtConfig>,
    encoding_key: Arc<EncodingKey>,
    decoding_key: Arc<DecodingKey>,
    validation: Arc<Validation>,
}

impl TokenCodec {
    /// Creates a new codec with the given configuration.
    pub fn new(config: JwtConfig) -> ApiResult<Self> {
        config.validate()?;

        let encoding_key = EncodingKey::from_secret(config.secret.as_bytes());
        let decoding_key = DecodingKey::from_secret(config.secret.as_bytes());

        let mut validation = Validation::new(config.algorithm);
        validation.algorithms = HMAC_FAMILY.to_vec();
        validation.leeway = config.leeway_secs;
        validation.validate_exp = true;
        validation.validate_aud = false;
        validation.set_required_spec_claims(&["exp"]);

        Ok(Self {
            config: Arc::new(config),
            encoding_key: Arc::new(encoding_key),
            decoding_key: Arc::new(decoding_key),
            validation: Arc::new(validation),
        })
    }

    /// Issues a token for `subject`, valid from now for the configured lifetime.
    pub fn issue(&self, subject: &TokenSubject) -> Result<String, TokenError> {
        self.issue_at(subject, Utc::now())
    }

    /// Issues a token as if it had been issued at `issued_at`.
    pub fn issue_at(
        &self,
        subject: &TokenSubject,
        issued_at: DateTime<Utc>,
    ) -> Result<String, TokenError> {
        let claims = TokenClaims::new(subject, issued_at, self.ttl_secs());
        self.sign(&claims)
    }

    /// Signs arbitrary claims.
    pub fn sign(&self, claims: &TokenClaims) -> Result<String, TokenError> {
        encode(&Header::new(self.config.algorithm), claims, &self.encoding_key)
            .map_err(|e| TokenError::Signing(e.to_string()))
    }

    /// Verifies a token and returns its claims.
    pub fn verify(&self, token: &str) -> Result<TokenClaims, TokenError> {
        decode::<TokenClaims>(token, &self.decoding_key, &self.validation)
            .map(|data| data.claims)
            .map_err(|e| {
                // The kind is for operators only.
                tracing::debug!(kind = ?e.kind(), "Token verification failed");
                TokenError::InvalidToken
            })
    }

    /// Returns the token lifetime in seconds.
    pub fn ttl_secs(&self) -> i64 {
        i64::try_from(self.config.expiration.as_secs()).unwrap_or(i64::MAX)
    }
}

impl std::fmt::Debug for TokenCodec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenCodec")
            .field("algorithm", &self.config.algorithm)
            .field("expiration", &self.config.expiration)
            .finish()
    }
}

// =============================================================================
// Algorithm Serialization
// =============================================================================

mod algorithm_serde {
    use jsonwebtoken::Algorithm;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    pub fn serialize<S>(algorithm: &Algorithm, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let s = match algorithm {
            Algorithm::HS256 => "HS256",
            Algorithm::HS384 => "HS384",
            Algorithm::HS512 => "HS512",
            other => return Err(serde::ser::Error::custom(format!("unsupported algorithm: {other:?}"))),
        };
        s.serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Algorithm, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        match s.to_ascii_uppercase().as_str() {
            "HS256" => Ok(Algorithm::HS256),
            "HS384" => Ok(Algorithm::HS384),
            "HS512" => Ok(Algorithm::HS512),
            _ => Err(serde::de::Error::custom(format!(
                "unsupported algorithm: {} (expected HS256, HS384 or HS512)",
                s
            ))),
        }
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    const SECRET: &str = "test-secret-key-that-is-long-enough-for-testing";

    fn codec() -> TokenCodec {
        TokenCodec::new(JwtConfig::new(SECRET)).unwrap()
    }

    fn subject() -> TokenSubject {
        TokenSubject::new(Uuid::new_v4(), "ada@example.com", "ada")
    }

    #[test]
    fn test_issue_and_verify() {
        let codec = codec();
        let subject = subject();

        let token = codec.issue(&subject).unwrap();
        let claims = codec.verify(&token).unwrap();

        assert_eq!(claims.subject(), subject);
        assert_eq!(claims.exp - claims.iat, 24 * 60 * 60);
    }

    #[test]
    fn test_verify_returns_signed_claims() {
        let codec = codec();
        let claims = TokenClaims::new(&subject(), Utc::now() - chrono::Duration::hours(23), codec.ttl_secs());

        let token = codec.sign(&claims).unwrap();
        assert_eq!(codec.verify(&token).unwrap(), claims);
    }

    #[test]
    fn test_expired_token() {
        let codec = codec();
        let issued = Utc::now() - chrono::Duration::hours(25);

        let token = codec.issue_at(&subject(), issued).unwrap();
        assert_eq!(codec.verify(&token), Err(TokenError::InvalidToken));
    }

    #[test]
    fn test_malformed_token() {
        assert_eq!(codec().verify("invalid.token.here"), Err(TokenError::InvalidToken));
        assert_eq!(codec().verify(""), Err(TokenError::InvalidToken));
    }

    #[test]
    fn test_wrong_secret() {
        let other = TokenCodec::new(JwtConfig::new("another-secret-key-that-is-long-enough")).unwrap();
        let token = other.issue(&subject()).unwrap();

        assert_eq!(codec().verify(&token), Err(TokenError::InvalidToken));
    }

    #[test]
    fn test_single_bit_flip_in_signature() {
        let codec = codec();
        let token = codec.issue(&subject()).unwrap();

        let (head, signature) = token.rsplit_once('.').unwrap();
        const ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789-_";
        let mut bytes = signature.as_bytes().to_vec();
        let index = ALPHABET.iter().position(|c| *c == bytes[0]).unwrap();
        bytes[0] = ALPHABET[index ^ 0b10_0000];
        let tampered = format!("{}.{}", head, String::from_utf8(bytes).unwrap());

        assert_ne!(tampered, token);
        assert_eq!(codec.verify(&tampered), Err(TokenError::InvalidToken));
    }

    #[test]
    fn test_non_hmac_algorithm_rejected() {
        // Header declares RS256; the payload is otherwise well-formed.
        let codec = codec();
        let token = codec.issue(&subject()).unwrap();
        let mut parts = token.splitn(3, '.');
        let _header = parts.next().unwrap();
        let payload = parts.next().unwrap();
        let signature = parts.next().unwrap();
        // {"alg":"RS256","typ":"JWT"}
        let forged = format!("eyJhbGciOiJSUzI1NiIsInR5cCI6IkpXVCJ9.{}.{}", payload, signature);

        assert_eq!(codec.verify(&forged), Err(TokenError::InvalidToken));
    }

    #[test]
    fn test_config_validation() {
        assert!(TokenCodec::new(JwtConfig::default()).is_err());

        let mut config = JwtConfig::new(SECRET);
        config.algorithm = Algorithm::RS256;
        assert!(TokenCodec::new(config).is_err());

        let config = JwtConfig::new(SECRET).with_expiration(Duration::ZERO);
        assert!(TokenCodec::new(config).is_err());
    }
}
