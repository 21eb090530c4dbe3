// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Token claims.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// The identity a token is issued for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenSubject {
    /// Durable identity ID.
    pub id: Uuid,
    /// Email address.
    pub email: String,
    /// Username.
    pub username: String,
}

impl TokenSubject {
    /// Creates a new subject.
    pub fn new(id: Uuid, email: impl Into<String>, username: impl Into<String>) -> Self {
        Self {
            id,
            email: email.into(),
            username: username.into(),
        }
    }
}

/// Payload signed into every identity token.
///
/// There is no refresh token and no revocation list: `exp` is the only way a
/// token stops being accepted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenClaims {
    /// Durable identity ID.
    pub id: Uuid,

    /// Email address.
    pub email: String,

    /// Username.
    pub username: String,

    /// Issued at time (Unix timestamp).
    pub iat: i64,

    /// Expiration time (Unix timestamp).
    pub exp: i64,
}

impl TokenClaims {
    /// Creates claims for `subject`, issued at `issued_at` and valid for
    /// `ttl_secs` seconds.
    pub fn new(subject: &TokenSubject, issued_at: DateTime<Utc>, ttl_secs: i64) -> Self {
        let iat = issued_at.timestamp();

        Self {
            id: subject.id,
            email: subject.email.clone(),
            username: subject.username.clone(),
            iat,
            exp: iat + ttl_secs,
        }
    }

    /// Returns the subject the claims were issued for.
    pub fn subject(&self) -> TokenSubject {
        TokenSubject::new(self.id, self.email.clone(), self.username.clone())
    }

    /// Returns `true` if the claims have expired.
    pub fn is_expired(&self) -> bool {
        Utc::now().timestamp() >= self.exp
    }

    /// Returns the issued at time as a DateTime.
    pub fn issued_at(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp(self.iat, 0)
    }

    /// Returns the expiration time as a DateTime.
    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp(self.exp, 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn subject() -> TokenSubject {
        TokenSubject::new(Uuid::new_v4(), "ada@example.com", "ada")
    }

    #[test]
    fn test_claims_window() {
        let now = Utc::now();
        let claims = TokenClaims::new(&subject(), now, 86_400);

        assert_eq!(claims.exp - claims.iat, 86_400);
        assert_eq!(claims.iat, now.timestamp());
        assert!(!claims.is_expired());
    }

    #[test]
    fn test_claims_expired() {
        let issued = Utc::now() - Duration::hours(25);
        let claims = TokenClaims::new(&subject(), issued, 86_400);

        assert!(claims.is_expired());
        assert!(claims.expires_at().is_some_and(|at| at < Utc::now()));
    }

    #[test]
    fn test_claims_subject() {
        let subject = subject();
        let claims = TokenClaims::new(&subject, Utc::now(), 60);

        assert_eq!(claims.subject(), subject);
    }
}
