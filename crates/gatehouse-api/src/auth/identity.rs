// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! The caller attached to a request.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::UserRecord;

/// A resolved caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    /// Durable identity ID.
    pub id: Uuid,
    /// Email address.
    pub email: String,
    /// Username.
    pub username: String,
    /// Full display name.
    pub full_name: String,
    /// Whether the email address has been verified.
    pub is_verified: bool,
}

impl From<UserRecord> for User {
    fn from(record: UserRecord) -> Self {
        Self {
            id: record.id,
            email: record.email,
            username: record.username,
            full_name: record.full_name,
            is_verified: record.is_verified,
        }
    }
}

/// Identity attached to every request that passed authentication.
///
/// Anonymous is its own variant, so a resolved user whose fields all happen
/// to be empty is still a resolved user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Identity {
    /// No credentials were presented.
    Anonymous,
    /// Credentials were verified and resolved to a stored identity.
    Resolved(User),
}

impl Identity {
    /// Returns `true` for the anonymous identity.
    pub fn is_anonymous(&self) -> bool {
        matches!(self, Identity::Anonymous)
    }

    /// Returns the resolved user, if any.
    pub fn user(&self) -> Option<&User> {
        match self {
            Identity::Anonymous => None,
            Identity::Resolved(user) => Some(user),
        }
    }

    /// Consumes the identity and returns the resolved user, if any.
    pub fn into_user(self) -> Option<User> {
        match self {
            Identity::Anonymous => None,
            Identity::Resolved(user) => Some(user),
        }
    }
}

impl From<User> for Identity {
    fn from(user: User) -> Self {
        Identity::Resolved(user)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn empty_user() -> User {
        User {
            id: Uuid::nil(),
            email: String::new(),
            username: String::new(),
            full_name: String::new(),
            is_verified: false,
        }
    }

    #[test]
    fn test_anonymous() {
        let identity = Identity::Anonymous;

        assert!(identity.is_anonymous());
        assert!(identity.user().is_none());
    }

    #[test]
    fn test_empty_resolved_user_is_not_anonymous() {
        let identity = Identity::from(empty_user());

        assert!(!identity.is_anonymous());
        assert_eq!(identity.user(), Some(&empty_user()));
        assert_ne!(identity, Identity::Anonymous);
    }

    #[test]
    fn test_serialization_is_tagged() {
        let json = serde_json::to_value(Identity::Anonymous).unwrap();
        assert_eq!(json, serde_json::json!({ "kind": "anonymous" }));
    }
}
