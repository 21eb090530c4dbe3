// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Authentication primitives.
//!
//! This module provides:
//! - Signed identity tokens (issue and verify)
//! - The request-scoped identity and its carrier
//! - The identity lookup capability used to resolve token subjects

mod claims;
pub mod context;
mod identity;
mod jwt;
mod store;

pub use claims::{TokenClaims, TokenSubject};
pub use identity::{Identity, User};
pub use jwt::{JwtConfig, TokenCodec, TokenError};
pub use store::{IdentityStore, InMemoryIdentityStore, LookupError, UserRecord};
