// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Request-scoped identity carrier.
//!
//! The authentication stage attaches exactly one [`Identity`] to every request
//! it lets through, even when the caller is anonymous. Reading the identity
//! from a request that never passed that stage is a wiring bug in the router,
//! so [`current`] panics instead of returning an error.

use axum::http::{Extensions, Request};

use super::Identity;

const MISSING_IDENTITY: &str =
    "missing identity in request context: the authentication layer must run before this handler";

/// Attaches `identity` to the request and returns it.
///
/// The request is taken by value; downstream code must use the returned one.
/// Attaching twice replaces the earlier identity.
pub fn attach<B>(mut req: Request<B>, identity: Identity) -> Request<B> {
    req.extensions_mut().insert(identity);
    req
}

/// Returns the identity attached to a request.
///
/// # Panics
///
/// Panics if no identity was attached.
pub fn current(extensions: &Extensions) -> &Identity {
    match extensions.get::<Identity>() {
        Some(identity) => identity,
        None => panic!("{}", MISSING_IDENTITY),
    }
}

/// Returns the identity attached to a request, if any.
pub fn try_current(extensions: &Extensions) -> Option<&Identity> {
    extensions.get::<Identity>()
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::User;
    use axum::body::Body;
    use uuid::Uuid;

    fn user() -> User {
        User {
            id: Uuid::new_v4(),
            email: "grace@example.com".to_string(),
            username: "grace".to_string(),
            full_name: "Grace Hopper".to_string(),
            is_verified: true,
        }
    }

    #[test]
    fn test_attach_and_current() {
        let req = Request::builder().uri("/").body(Body::empty()).unwrap();
        let user = user();

        let req = attach(req, Identity::Resolved(user.clone()));

        assert_eq!(current(req.extensions()).user(), Some(&user));
    }

    #[test]
    fn test_attach_anonymous() {
        let req = Request::builder().uri("/").body(Body::empty()).unwrap();
        let req = attach(req, Identity::Anonymous);

        assert!(current(req.extensions()).is_anonymous());
    }

    #[test]
    fn test_attach_replaces() {
        let req = Request::builder().uri("/").body(Body::empty()).unwrap();
        let req = attach(req, Identity::Resolved(user()));
        let req = attach(req, Identity::Anonymous);

        assert!(current(req.extensions()).is_anonymous());
    }

    #[test]
    fn test_try_current_missing() {
        let req = Request::builder().uri("/").body(Body::empty()).unwrap();
        assert!(try_current(req.extensions()).is_none());
    }

    #[test]
    #[should_panic(expected = "missing identity in request context")]
    fn test_current_missing_panics() {
        let req = Request::builder().uri("/").body(Body::empty()).unwrap();
        let _ = current(req.extensions());
    }
}
