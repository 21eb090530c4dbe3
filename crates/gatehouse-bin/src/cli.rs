// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! CLI argument parsing and command definitions.
//!
//! - `run`: Start the gate server (default)
//! - `validate`: Validate the configuration
//! - `issue-token`: Sign a token for an identity
//! - `version`: Show version information

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use uuid::Uuid;

// =============================================================================
// Main CLI Structure
// =============================================================================

/// Gatehouse - admission control and token authentication for HTTP services
#[derive(Parser, Debug)]
#[command(
    name = "gatehouse",
    author = "Sylvex <contact@sylvex.io>",
    version = gatehouse_api::VERSION,
    about = "Rate limiting and bearer token authentication gate",
    long_about = None,
    propagate_version = true
)]
pub struct Cli {
    /// Configuration file path
    #[arg(
        short,
        long,
        default_value = "gatehouse.yaml",
        env = "GATEHOUSE_CONFIG",
        global = true
    )]
    pub config: PathBuf,

    /// Log level (trace, debug, info, warn, error)
    #[arg(
        short,
        long,
        default_value = "info",
        env = "GATEHOUSE_LOG_LEVEL",
        global = true
    )]
    pub log_level: String,

    /// Log format (text, json, compact)
    #[arg(long, default_value = "text", env = "GATEHOUSE_LOG_FORMAT", global = true)]
    pub log_format: LogFormat,

    /// Enable quiet mode (minimal output)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Option<Commands>,
}

// =============================================================================
// Subcommands
// =============================================================================

/// Available subcommands.
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Start the gate server
    ///
    /// This is the default command when no subcommand is specified.
    Run,

    /// Validate the configuration file
    ///
    /// Loads the file and environment overrides without starting the server.
    Validate(ValidateArgs),

    /// Sign a token for an identity
    ///
    /// Prints a bearer token valid for the configured lifetime.
    #[command(name = "issue-token")]
    IssueToken(IssueTokenArgs),

    /// Show detailed version information
    Version,
}

// =============================================================================
// Command Arguments
// =============================================================================

/// Arguments for the `validate` command.
#[derive(Args, Debug, Clone, Default)]
pub struct ValidateArgs {
    /// Show parsed configuration after validation
    #[arg(short, long)]
    pub show_config: bool,

    /// Output format for validation results
    #[arg(short, long, default_value = "text")]
    pub format: OutputFormat,

    /// Strict mode: treat warnings as errors
    #[arg(long)]
    pub strict: bool,
}

/// Arguments for the `issue-token` command.
#[derive(Args, Debug, Clone)]
pub struct IssueTokenArgs {
    /// Identity ID (taken from the seeded users when omitted)
    #[arg(long)]
    pub id: Option<Uuid>,

    /// Email address
    #[arg(long)]
    pub email: String,

    /// Username
    #[arg(long)]
    pub username: String,
}

// =============================================================================
// Enums
// =============================================================================

/// Log output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum LogFormat {
    /// Human-readable text format
    #[default]
    Text,
    /// JSON format for structured logging
    Json,
    /// Compact format for minimal output
    Compact,
}

/// Output format for command results.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text format
    #[default]
    Text,
    /// JSON format for programmatic parsing
    Json,
}

// =============================================================================
// Helper Methods
// =============================================================================

impl Cli {
    /// Parse CLI arguments from the command line.
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Get the effective command, defaulting to `Run` if none specified.
    pub fn effective_command(&self) -> Commands {
        self.command.clone().unwrap_or(Commands::Run)
    }

    /// Get the effective log level based on flags.
    pub fn effective_log_level(&self) -> &str {
        if self.quiet {
            "warn"
        } else if self.verbose {
            "debug"
        } else {
            &self.log_level
        }
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_command() {
        let cli = Cli::parse_from(["gatehouse"]);
        assert!(cli.command.is_none());
        assert!(matches!(cli.effective_command(), Commands::Run));
    }

    #[test]
    fn test_validate_command() {
        let cli = Cli::parse_from(["gatehouse", "validate", "--show-config", "-f", "json"]);
        if let Some(Commands::Validate(args)) = cli.command {
            assert!(args.show_config);
            assert_eq!(args.format, OutputFormat::Json);
        } else {
            panic!("Expected Validate command");
        }
    }

    #[test]
    fn test_issue_token_command() {
        let cli = Cli::parse_from([
            "gatehouse",
            "issue-token",
            "--email",
            "ada@example.com",
            "--username",
            "ada",
            "--id",
            "67e55044-10b1-426f-9247-bb680e5fe0c8",
        ]);
        if let Some(Commands::IssueToken(args)) = cli.command {
            assert_eq!(args.username, "ada");
            assert_eq!(
                args.id.map(|id| id.to_string()),
                Some("67e55044-10b1-426f-9247-bb680e5fe0c8".to_string())
            );
        } else {
            panic!("Expected IssueToken command");
        }
    }

    #[test]
    fn test_config_path() {
        let cli = Cli::parse_from(["gatehouse", "-c", "/etc/gatehouse/config.toml"]);
        assert_eq!(cli.config, PathBuf::from("/etc/gatehouse/config.toml"));
    }

    #[test]
    fn test_quiet_and_verbose() {
        let cli = Cli::parse_from(["gatehouse", "-q"]);
        assert_eq!(cli.effective_log_level(), "warn");

        let cli = Cli::parse_from(["gatehouse", "-v"]);
        assert_eq!(cli.effective_log_level(), "debug");
    }
}
