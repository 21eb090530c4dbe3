// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Gate runtime orchestration.
//!
//! Builds the identity store, the shared state and the gate server from
//! [`Settings`], then runs until a shutdown signal arrives.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{info, warn};

use gatehouse_api::{AppState, GateServer, InMemoryIdentityStore};

use crate::error::{BinError, BinResult};
use crate::settings::{Settings, SettingsLoader};
use crate::shutdown::ShutdownCoordinator;

// =============================================================================
// GateRuntime
// =============================================================================

/// Runs the gate server with graceful shutdown.
pub struct GateRuntime {
    settings: Settings,
    shutdown: ShutdownCoordinator,
}

impl GateRuntime {
    /// Creates a new runtime.
    pub fn new(settings: Settings) -> Self {
        Self {
            settings,
            shutdown: ShutdownCoordinator::new(),
        }
    }

    /// Returns the shutdown coordinator.
    pub fn shutdown(&self) -> &ShutdownCoordinator {
        &self.shutdown
    }

    /// Builds the gate server.
    pub fn build_server(&self) -> BinResult<GateServer> {
        let records = self.settings.user_records();
        if records.is_empty() {
            warn!("No seed users configured, every token will resolve to an unknown identity");
        }

        let store = Arc::new(InMemoryIdentityStore::with_records(records));

        let state = AppState::builder()
            .config(self.settings.server.clone())
            .store(store)
            .build()
            .map_err(|e| BinError::from(e).with_context("Failed to build gate state"))?;

        Ok(GateServer::new(state))
    }

    /// Runs the gate until shutdown is signaled or the server fails.
    pub async fn run(self) -> BinResult<()> {
        info!("Starting Gatehouse v{}", gatehouse_api::VERSION);

        let server = self.build_server()?;
        let shutdown_timeout = self.settings.server.shutdown_timeout;

        let serving = server.run_with_shutdown(self.shutdown.shutdown_signal());
        tokio::pin!(serving);

        tokio::select! {
            result = &mut serving => {
                result?;
            }
            _ = self.shutdown.wait_for_shutdown() => {
                info!("Shutdown initiated, draining connections...");

                match tokio::time::timeout(shutdown_timeout, &mut serving).await {
                    Ok(result) => result?,
                    Err(_) => warn!(
                        timeout = ?shutdown_timeout,
                        "Graceful shutdown timed out, dropping open connections"
                    ),
                }
            }
        }

        info!("Gatehouse shutdown complete");

        Ok(())
    }
}

// =============================================================================
// RuntimeBuilder
// =============================================================================

/// Builder for constructing the runtime.
#[derive(Default)]
pub struct RuntimeBuilder {
    config_path: Option<PathBuf>,
    settings: Option<Settings>,
}

impl RuntimeBuilder {
    /// Creates a new runtime builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the configuration file path.
    pub fn config_path(mut self, path: impl AsRef<Path>) -> Self {
        self.config_path = Some(path.as_ref().to_path_buf());
        self
    }

    /// Sets the settings directly.
    pub fn settings(mut self, settings: Settings) -> Self {
        self.settings = Some(settings);
        self
    }

    /// Builds the runtime.
    pub fn build(self) -> BinResult<GateRuntime> {
        let settings = match self.settings {
            Some(settings) => settings,
            None => {
                let path = self
                    .config_path
                    .ok_or_else(|| BinError::config("No configuration provided"))?;

                SettingsLoader::new().load(&path).map_err(|e| {
                    e.with_context(format!("Failed to load config from {}", path.display()))
                })?
            }
        };

        Ok(GateRuntime::new(settings))
    }
}

// =============================================================================
// Tests
// =============================================================================
