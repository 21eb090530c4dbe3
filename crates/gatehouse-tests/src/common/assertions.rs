// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! # Custom Assertions
//!
//! A buffered response with assertion helpers for gate behavior.

use axum::body::{to_bytes, Bytes};
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::Response;
use serde_json::Value;

/// Upper bound on buffered response bodies.
const MAX_BODY_BYTES: usize = 1024 * 1024;

// =============================================================================
// TestResponse
// =============================================================================

/// A response with its body read into memory.
#[derive(Debug)]
pub struct TestResponse {
    /// Status code.
    pub status: StatusCode,
    /// Response headers.
    pub headers: HeaderMap,
    /// Raw body.
    pub body: Bytes,
}

impl TestResponse {
    /// Buffers `response`.
    pub async fn collect(response: Response) -> Self {
        let (parts, body) = response.into_parts();
        let body = to_bytes(body, MAX_BODY_BYTES)
            .await
            .expect("Failed to read response body");

        Self {
            status: parts.status,
            headers: parts.headers,
            body,
        }
    }

    /// Parses the body as JSON.
    pub fn json(&self) -> Value {
        serde_json::from_slice(&self.body).unwrap_or_else(|e| {
            panic!(
                "Body is not JSON ({}): {}",
                e,
                String::from_utf8_lossy(&self.body)
            )
        })
    }

    /// Returns a header as a string.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    // =========================================================================
    // Assertions
    // =========================================================================

    /// Asserts the status code.
    pub fn assert_status(&self, expected: StatusCode) -> &Self {
        assert_eq!(
            self.status,
            expected,
            "Unexpected status, body: {}",
            String::from_utf8_lossy(&self.body)
        );
        self
    }

    /// Asserts a `{"error": message}` body.
    pub fn assert_error(&self, message: &str) -> &Self {
        let body = self.json();
        assert_eq!(body["error"], message, "Unexpected error body: {}", body);
        self
    }

    /// Asserts the status and the error message together.
    pub fn assert_rejected(&self, status: StatusCode, message: &str) -> &Self {
        self.assert_status(status).assert_error(message)
    }

    /// Asserts that `Vary` lists `Authorization`.
    pub fn assert_varies_on_authorization(&self) -> &Self {
        let varies = self
            .headers
            .get_all(header::VARY)
            .iter()
            .filter_map(|v| v.to_str().ok())
            .flat_map(|v| v.split(','))
            .any(|v| v.trim().eq_ignore_ascii_case("authorization"));
        assert!(varies, "Missing Vary: Authorization, got {:?}", self.headers);
        self
    }

    /// Asserts that no `Vary` header is present.
    pub fn assert_no_vary(&self) -> &Self {
        assert!(
            self.headers.get(header::VARY).is_none(),
            "Unexpected Vary header: {:?}",
            self.headers.get(header::VARY)
        );
        self
    }

    /// Asserts `Retry-After` and returns its value in seconds.
    pub fn retry_after(&self) -> u64 {
        self.header(header::RETRY_AFTER.as_str())
            .expect("Missing Retry-After header")
            .parse()
            .expect("Retry-After is not an integer")
    }
}
