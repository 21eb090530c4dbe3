// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! # gatehouse-bin
//!
//! CLI binary for the gatehouse gate server.
//!
//! ```text
//!   main.rs ──► cli.rs ──► commands ──► runtime ──► gatehouse-api
//!                              │            │
//!                              ▼            ▼
//!                          settings     shutdown
//! ```
//!
//! ## Usage
//!
//! ```bash
//! # Start the server (default command)
//! gatehouse -c /etc/gatehouse/gatehouse.yaml
//!
//! # Validate configuration
//! gatehouse validate --strict
//!
//! # Sign a token for a seeded user
//! gatehouse issue-token --email ada@example.com --username ada
//! ```

#![warn(missing_docs)]
#![deny(unsafe_code)]

pub mod cli;
pub mod commands;
pub mod error;
pub mod logging;
pub mod runtime;
pub mod settings;
pub mod shutdown;

pub use cli::{Cli, Commands};
pub use error::{BinError, BinResult};
pub use logging::init_logging;
pub use runtime::{GateRuntime, RuntimeBuilder};
pub use settings::{Settings, SettingsLoader};
pub use shutdown::{ShutdownCoordinator, ShutdownSignal};

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
