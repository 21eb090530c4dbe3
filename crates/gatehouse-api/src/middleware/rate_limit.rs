// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Per-client admission control.
//!
//! Each client key owns a token bucket. Buckets are created lazily on the
//! first request, mutated under the map entry lock on every request, and
//! removed only by the background sweeper once the client has been idle for
//! longer than [`RateLimitConfig::idle_timeout`].

use std::future::Future;
use std::net::{IpAddr, SocketAddr};
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use std::time::Duration;

use axum::{
    body::Body,
    extract::ConnectInfo,
    http::{Extensions, HeaderMap, Request},
    response::{IntoResponse, Response},
};
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tower::{Layer, Service};

use crate::error::ApiError;

/// Key used when no client address can be determined.
pub const UNKNOWN_CLIENT: &str = "unknown";

// =============================================================================
// RateLimitConfig
// =============================================================================

/// Configuration for rate limiting.
///
/// All clients share the same rate and burst.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RateLimitConfig {
    /// Whether rate limiting is enabled.
    pub enabled: bool,
    /// Tokens added to each bucket per second.
    pub requests_per_second: f64,
    /// Burst size (max tokens in bucket).
    pub burst_size: u32,
    /// How often the sweeper scans for idle clients.
    #[serde(with = "humantime_serde")]
    pub sweep_interval: Duration,
    /// Clients idle for at least this long are evicted.
    #[serde(with = "humantime_serde")]
    pub idle_timeout: Duration,
    /// Whether to key clients by `X-Forwarded-For` / `X-Real-IP`.
    pub trust_proxy_headers: bool,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            requests_per_second: 2.0,
            burst_size: 4,
            sweep_interval: Duration::from_secs(60),
            idle_timeout: Duration::from_secs(180),
            trust_proxy_headers: true,
        }
    }
}

impl RateLimitConfig {
    /// Creates a disabled rate limiter.
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            ..Default::default()
        }
    }

    /// Creates an enabled configuration with the given rate and burst.
    pub fn new(requests_per_second: f64, burst_size: u32) -> Self {
        Self {
            requests_per_second,
            burst_size,
            ..Default::default()
        }
    }

    /// Returns a copy safe to feed into bucket arithmetic.
    ///
    /// A negative or non-finite rate becomes zero (buckets never refill). A
    /// zero burst is kept and admits nothing. Zero intervals fall back to the
    /// defaults.
    pub fn sanitized(&self) -> Self {
        let defaults = Self::default();
        let mut config = self.clone();

        if !config.requests_per_second.is_finite() || config.requests_per_second < 0.0 {
            tracing::warn!(
                requests_per_second = self.requests_per_second,
                "Invalid rate limit rate, buckets will not refill"
            );
            config.requests_per_second = 0.0;
        }
        if config.enabled && config.burst_size == 0 {
            tracing::warn!("Rate limit burst size is zero, every request will be rejected");
        }
        if config.sweep_interval.is_zero() {
            config.sweep_interval = defaults.sweep_interval;
        }
        if config.idle_timeout.is_zero() {
            config.idle_timeout = defaults.idle_timeout;
        }

        config
    }
}

// =============================================================================
// Token Bucket
// =============================================================================

/// A token bucket with continuous refill.
#[derive(Debug, Clone)]
struct TokenBucket {
    tokens: f64,
    max_tokens: f64,
    refill_rate: f64, // tokens per second
    last_refill: Instant,
}

impl TokenBucket {
    fn new(max_tokens: u32, refill_rate: f64, now: Instant) -> Self {
        Self {
            tokens: f64::from(max_tokens),
            max_tokens: f64::from(max_tokens),
            refill_rate,
            last_refill: now,
        }
    }

    fn try_acquire(&mut self, now: Instant) -> bool {
        self.refill(now);
        if self.tokens >= 1.0 {
            self.tokens -= 1.0;
            true
        } else {
            false
        }
    }

    fn refill(&mut self, now: Instant) {
        let elapsed = now.saturating_duration_since(self.last_refill).as_secs_f64();
        self.tokens = (self.tokens + elapsed * self.refill_rate).min(self.max_tokens);
        self.last_refill = now;
    }

    /// Time until the next token, or `None` if one will never arrive.
    ///
    /// A wait too long to represent as a `Duration` counts as never.
    fn time_until_token(&self) -> Option<Duration> {
        if self.tokens >= 1.0 {
            Some(Duration::ZERO)
        } else if self.refill_rate <= 0.0 || self.max_tokens < 1.0 {
            None
        } else {
            let needed = 1.0 - self.tokens;
            Duration::try_from_secs_f64(needed / self.refill_rate).ok()
        }
    }
}

/// State tracked per client key.
#[derive(Debug)]
struct ClientState {
    bucket: TokenBucket,
    last_seen: Instant,
}

// =============================================================================
// AdmissionController
// =============================================================================

/// Result of an admission check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    /// Request is allowed.
    Allowed,
    /// Request is rate limited.
    Limited {
        /// Seconds until the client can retry, if its bucket refills at all.
        retry_after: Option<u64>,
    },
}

impl Admission {
    /// Returns `true` if the request was admitted.
    pub fn is_allowed(&self) -> bool {
        matches!(self, Admission::Allowed)
    }
}

/// Per-client token bucket limiter.
///
/// The lookup-or-create of a client and its bucket arithmetic happen while
/// holding that client's map entry, so concurrent requests from one client
/// are linearizable and can never spend more tokens than the bucket holds.
/// Distinct clients only contend when they hash to the same shard.
#[derive(Debug)]
pub struct AdmissionController {
    config: RateLimitConfig,
    clients: DashMap<String, ClientState>,
}

impl AdmissionController {
    /// Creates a new controller. The configuration is sanitized first.
    pub fn new(config: RateLimitConfig) -> Self {
        Self {
            config: config.sanitized(),
            clients: DashMap::new(),
        }
    }

    /// Creates a disabled controller.
    pub fn disabled() -> Self {
        Self::new(RateLimitConfig::disabled())
    }

    /// Returns the effective configuration.
    pub fn config(&self) -> &RateLimitConfig {
        &self.config
    }

    /// Returns `true` if admission checks are enforced.
    pub fn is_enabled(&self) -> bool {
        self.config.enabled
    }

    /// Checks whether a request from `client_key` may proceed and spends a
    /// token if so.
    pub fn admit(&self, client_key: &str) -> Admission {
        if !self.config.enabled {
            return Admission::Allowed;
        }

        let now = Instant::now();
        let mut client = self
            .clients
            .entry(client_key.to_owned())
            .or_insert_with(|| ClientState {
                bucket: TokenBucket::new(
                    self.config.burst_size,
                    self.config.requests_per_second,
                    now,
                ),
                last_seen: now,
            });

        client.last_seen = now;

        if client.bucket.try_acquire(now) {
            Admission::Allowed
        } else {
            let retry_after = client
                .bucket
                .time_until_token()
                .map(|wait| wait.as_secs_f64().ceil().max(1.0) as u64);
            Admission::Limited { retry_after }
        }
    }

    /// Removes every client idle for at least the configured timeout.
    ///
    /// Returns the number of evicted clients.
    pub fn sweep(&self) -> usize {
        let now = Instant::now();
        let idle_timeout = self.config.idle_timeout;
        let before = self.clients.len();

        self.clients
            .retain(|_, client| now.saturating_duration_since(client.last_seen) < idle_timeout);

        before.saturating_sub(self.clients.len())
    }

    /// Returns the number of tracked clients.
    pub fn tracked_clients(&self) -> usize {
        self.clients.len()
    }

    /// Returns `true` if `client_key` is currently tracked.
    pub fn is_tracked(&self, client_key: &str) -> bool {
        self.clients.contains_key(client_key)
    }

    /// Returns the tokens currently available to `client_key`, after refill.
    pub fn available_tokens(&self, client_key: &str) -> Option<f64> {
        self.clients.get_mut(client_key).map(|mut client| {
            client.bucket.refill(Instant::now());
            client.bucket.tokens
        })
    }

    /// Starts the background sweeper.
    ///
    /// The task runs until the returned handle is stopped or dropped. No task
    /// is started for a disabled controller.
    pub fn spawn_sweeper(self: &Arc<Self>) -> SweeperHandle {
        let (shutdown_tx, mut shutdown_rx) = watch::channel(false);

        if !self.config.enabled {
            return SweeperHandle {
                shutdown: shutdown_tx,
                task: None,
            };
        }

        let controller = Arc::clone(self);
        let period = self.config.sweep_interval;

        let task = tokio::spawn(async move {
            let mut ticker = tokio::time::interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            tracing::debug!(interval = ?period, "Rate limit sweeper started");

            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        let evicted = controller.sweep();
                        if evicted > 0 {
                            tracing::debug!(
                                evicted,
                                remaining = controller.tracked_clients(),
                                "Evicted idle rate limit clients"
                            );
                        }
                    }
                    // Fires on stop() and when the handle is dropped.
                    _ = shutdown_rx.changed() => break,
                }
            }

            tracing::debug!("Rate limit sweeper stopped");
        });

        SweeperHandle {
            shutdown: shutdown_tx,
            task: Some(task),
        }
    }
}

// =============================================================================
// SweeperHandle
// =============================================================================

/// Owner of the background sweep task.
///
/// Dropping the handle also stops the task.
#[derive(Debug)]
pub struct SweeperHandle {
    shutdown: watch::Sender<bool>,
    task: Option<JoinHandle<()>>,
}

impl SweeperHandle {
    /// Returns `true` while the sweep task is running.
    pub fn is_running(&self) -> bool {
        self.task.as_ref().is_some_and(|task| !task.is_finished())
    }

    /// Signals the task to stop and waits for it to finish.
    pub async fn stop(mut self) {
        let _ = self.shutdown.send(true);
        if let Some(task) = self.task.take() {
            if let Err(e) = task.await {
                tracing::warn!(error = %e, "Rate limit sweeper ended abnormally");
            }
        }
    }
}

// =============================================================================
// Client Key
// =============================================================================

/// Admission key of a request, stored in request extensions.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ClientKey(pub String);

impl ClientKey {
    /// Returns the key as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ClientKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Derives the admission key for a request.
///
/// With `trust_proxy_headers`, the first well-formed address in
/// `X-Forwarded-For` wins, then `X-Real-IP`. Otherwise, or when neither
/// header is usable, the connection's peer address is used.
pub fn derive_client_key(
    headers: &HeaderMap,
    extensions: &Extensions,
    trust_proxy_headers: bool,
) -> ClientKey {
    if trust_proxy_headers {
        let forwarded = headers
            .get("x-forwarded-for")
            .and_then(|v| v.to_str().ok())
            .and_then(|s| s.split(',').next())
            .and_then(parse_ip);

        if let Some(ip) = forwarded {
            return ClientKey(ip.to_string());
        }

        let real_ip = headers
            .get("x-real-ip")
            .and_then(|v| v.to_str().ok())
            .and_then(parse_ip);

        if let Some(ip) = real_ip {
            return ClientKey(ip.to_string());
        }
    }

    extensions
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ci| ClientKey(ci.0.ip().to_string()))
        .unwrap_or_else(|| ClientKey(UNKNOWN_CLIENT.to_string()))
}

fn parse_ip(value: &str) -> Option<IpAddr> {
    let value = value.trim();
    value
        .parse::<IpAddr>()
        .ok()
        .or_else(|| value.parse::<SocketAddr>().ok().map(|addr| addr.ip()))
}

// =============================================================================
// RateLimitLayer
// =============================================================================

/// Layer for rate limiting.
#[derive(Clone)]
pub struct RateLimitLayer {
    controller: Arc<AdmissionController>,
}

impl RateLimitLayer {
    /// Creates a layer around a shared controller.
    pub fn new(controller: Arc<AdmissionController>) -> Self {
        Self { controller }
    }

    /// Creates a layer with its own controller.
    pub fn from_config(config: RateLimitConfig) -> Self {
        Self::new(Arc::new(AdmissionController::new(config)))
    }

    /// Returns the shared controller.
    pub fn controller(&self) -> Arc<AdmissionController> {
        self.controller.clone()
    }
}

impl<S> Layer<S> for RateLimitLayer {
    type Service = RateLimitMiddleware<S>;

    fn layer(&self, inner: S) -> Self::Service {
        RateLimitMiddleware {
            inner,
            controller: self.controller.clone(),
        }
    }
}

// =============================================================================
// RateLimitMiddleware
// =============================================================================

/// Middleware for rate limiting.
#[derive(Clone)]
pub struct RateLimitMiddleware<S> {
    inner: S,
    controller: Arc<AdmissionController>,
}

impl<S> Service<Request<Body>> for RateLimitMiddleware<S>
where
    S: Service<Request<Body>, Response = Response> + Clone + Send + 'static,
    S::Future: Send + 'static,
{
    type Response = S::Response;
    type Error = S::Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, mut req: Request<Body>) -> Self::Future {
        let controller = self.controller.clone();
        // Keep the service that was driven to readiness.
        let clone = self.inner.clone();
        let mut inner = std::mem::replace(&mut self.inner, clone);

        Box::pin(async move {
            let client_key = derive_client_key(
                req.headers(),
                req.extensions(),
                controller.config().trust_proxy_headers,
            );

            match controller.admit(client_key.as_str()) {
                Admission::Allowed => {
                    req.extensions_mut().insert(client_key);
                    inner.call(req).await
                }
                Admission::Limited { retry_after } => {
                    tracing::warn!(
                        client = %client_key,
                        method = %req.method(),
                        uri = %req.uri(),
                        retry_after = ?retry_after,
                        "Rate limit exceeded"
                    );
                    Ok(ApiError::rate_limit_exceeded(retry_after).into_response())
                }
            }
        })
    }
}

// =============================================================================
// Tests
// =============================================================================
