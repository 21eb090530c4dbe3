// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Error types for the gatehouse binary.

use thiserror::Error;

/// Result type for the binary.
pub type BinResult<T> = Result<T, BinError>;

/// Process exit codes, one per failure class.
pub mod exit {
    /// Bad or missing configuration.
    pub const CONFIG: i32 = 1;
    /// Startup failed (logging, state).
    pub const INIT: i32 = 2;
    /// Failure while running.
    pub const RUNTIME: i32 = 3;
    /// File or socket I/O.
    pub const IO: i32 = 4;
    /// Gate server error.
    pub const SERVER: i32 = 6;
    /// Token signing.
    pub const TOKEN: i32 = 7;
}

/// Everything that can stop the `gatehouse` binary.
#[derive(Debug, Error)]
pub enum BinError {
    /// Settings are unusable.
    #[error("invalid configuration: {0}")]
    Configuration(String),

    /// Startup step failed.
    #[error("startup failed: {0}")]
    Initialization(String),

    /// Command failed while running.
    #[error("{0}")]
    Runtime(String),

    /// I/O failure.
    #[error("i/o: {0}")]
    Io(String),

    /// Error surfaced by the gate library.
    #[error(transparent)]
    Api(#[from] gatehouse_api::ApiError),

    /// Config file or environment could not be read.
    #[error(transparent)]
    Config(#[from] config::ConfigError),

    /// Token could not be signed.
    #[error(transparent)]
    Token(#[from] gatehouse_api::TokenError),

    /// An error with a description of what was being attempted.
    #[error("{context}: {source}")]
    WithContext {
        /// What was being attempted.
        context: String,
        /// Underlying failure.
        #[source]
        source: Box<BinError>,
    },
}

impl BinError {
    /// Configuration failure.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Configuration(msg.into())
    }

    /// Startup failure.
    pub fn init(msg: impl Into<String>) -> Self {
        Self::Initialization(msg.into())
    }

    /// Failure while running a command.
    pub fn runtime(msg: impl Into<String>) -> Self {
        Self::Runtime(msg.into())
    }

    /// Wraps `self` with what was being attempted.
    pub fn with_context(self, context: impl Into<String>) -> Self {
        Self::WithContext {
            context: context.into(),
            source: Box::new(self),
        }
    }

    /// Exit code for this error; context wrappers use their source's code.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::WithContext { source, .. } => source.exit_code(),
            Self::Configuration(_) | Self::Config(_) => exit::CONFIG,
            Self::Initialization(_) => exit::INIT,
            Self::Runtime(_) => exit::RUNTIME,
            Self::Io(_) => exit::IO,
            Self::Api(_) => exit::SERVER,
            Self::Token(_) => exit::TOKEN,
        }
    }
}

impl From<std::io::Error> for BinError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}

// =============================================================================
// Error Reporting
// =============================================================================

/// Reports an error with its cause chain.
pub fn report_error(error: &BinError) {
    eprintln!("Error: {}", error);

    let mut source = std::error::Error::source(error);
    while let Some(cause) = source {
        eprintln!("  Caused by: {}", cause);
        source = cause.source();
    }
}

/// Reports an error and exits with the appropriate code.
pub fn report_error_and_exit(error: BinError) -> ! {
    report_error(&error);
    std::process::exit(error.exit_code())
}

// =============================================================================
// Tests
// =============================================================================
