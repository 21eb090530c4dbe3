// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! # Request Builders
//!
//! Fluent construction of requests sent through the gate.
//!
//! ```rust,ignore
//! let request = GateRequest::get("/api/auth/me")
//!     .bearer(&token)
//!     .forwarded_for("203.0.113.7")
//!     .build();
//! ```

use axum::body::Body;
use axum::http::{header, Method, Request};

/// Builder for gate requests.
#[derive(Debug, Clone)]
pub struct GateRequest {
    method: Method,
    uri: String,
    headers: Vec<(String, String)>,
}

impl GateRequest {
    /// Starts a request with the given method.
    pub fn new(method: Method, uri: impl Into<String>) -> Self {
        Self {
            method,
            uri: uri.into(),
            headers: Vec::new(),
        }
    }

    /// Starts a GET request.
    pub fn get(uri: impl Into<String>) -> Self {
        Self::new(Method::GET, uri)
    }

    /// Adds `Authorization: Bearer <token>`.
    pub fn bearer(self, token: &str) -> Self {
        self.authorization(format!("Bearer {}", token))
    }

    /// Sets a raw `Authorization` header.
    pub fn authorization(self, value: impl Into<String>) -> Self {
        self.header(header::AUTHORIZATION.as_str(), value)
    }

    /// Sets `X-Forwarded-For`.
    pub fn forwarded_for(self, value: impl Into<String>) -> Self {
        self.header("x-forwarded-for", value)
    }

    /// Sets `X-Real-IP`.
    pub fn real_ip(self, value: impl Into<String>) -> Self {
        self.header("x-real-ip", value)
    }

    /// Adds an arbitrary header.
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// Builds the request.
    pub fn build(self) -> Request<Body> {
        let mut builder = Request::builder().method(self.method).uri(self.uri);
        for (name, value) in self.headers {
            builder = builder.header(name, value);
        }
        builder.body(Body::empty()).expect("Failed to build request")
    }
}

impl From<GateRequest> for Request<Body> {
    fn from(request: GateRequest) -> Self {
        request.build()
    }
}
