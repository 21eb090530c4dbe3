// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Configuration loading for the gatehouse binary.
//!
//! A configuration file (YAML, TOML or JSON, chosen by extension) is layered
//! under environment variable overrides:
//!
//! ```text
//! GATEHOUSE__PORT=9090
//! GATEHOUSE__JWT__SECRET=change-me
//! GATEHOUSE__RATE_LIMIT__BURST_SIZE=8
//! ```
//!
//! Besides the server settings, the file may list seed identities for the
//! bundled in-memory identity store:
//!
//! ```yaml
//! users:
//!   - email: ada@example.com
//!     username: ada
//!     full_name: Ada Lovelace
//!     verified: true
//! ```

use std::path::{Path, PathBuf};

use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use uuid::Uuid;

use gatehouse_api::{ApiConfig, UserRecord};

use crate::error::{BinError, BinResult};

/// Default environment variable prefix.
pub const ENV_PREFIX: &str = "GATEHOUSE";

const ENV_SEPARATOR: &str = "__";

// =============================================================================
// Settings
// =============================================================================

/// Fully loaded binary configuration.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Settings {
    /// Gate server settings.
    pub server: ApiConfig,
    /// Identities loaded into the in-memory store at startup.
    pub users: Vec<SeedUser>,
}

impl Settings {
    /// Converts the seed list into store records.
    pub fn user_records(&self) -> Vec<UserRecord> {
        self.users.iter().map(SeedUser::to_record).collect()
    }

    /// Finds a seed identity by username or email.
    pub fn find_user(&self, username: &str, email: &str) -> Option<&SeedUser> {
        self.users
            .iter()
            .find(|user| user.username == username || user.email == email)
    }
}

/// An identity declared in the configuration file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SeedUser {
    /// Fixed ID. Generated deterministically from the username if omitted.
    #[serde(default)]
    pub id: Option<Uuid>,
    /// Email address.
    pub email: String,
    /// Username.
    pub username: String,
    /// Full display name.
    #[serde(default)]
    pub full_name: String,
    /// Whether the email address is verified.
    #[serde(default)]
    pub verified: bool,
}

impl SeedUser {
    /// Returns the effective ID.
    ///
    /// Without an explicit ID, a v5 UUID of the username keeps tokens valid
    /// across restarts.
    pub fn effective_id(&self) -> Uuid {
        self.id
            .unwrap_or_else(|| Uuid::new_v5(&Uuid::NAMESPACE_OID, self.username.as_bytes()))
    }

    /// Converts to a store record.
    pub fn to_record(&self) -> UserRecord {
        let mut record = UserRecord::new(&self.email, &self.username, &self.full_name);
        record.id = self.effective_id();
        record.is_verified = self.verified;
        record
    }
}

// =============================================================================
// SettingsLoader
// =============================================================================

/// Loads [`Settings`] from a file and the environment.
#[derive(Debug, Clone)]
pub struct SettingsLoader {
    env_prefix: String,
    require_file: bool,
}

impl Default for SettingsLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl SettingsLoader {
    /// Creates a loader with the default prefix. A missing file is tolerated.
    pub fn new() -> Self {
        Self {
            env_prefix: ENV_PREFIX.to_string(),
            require_file: false,
        }
    }

    /// Sets the environment variable prefix.
    pub fn with_env_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.env_prefix = prefix.into();
        self
    }

    /// Makes a missing configuration file an error.
    pub fn require_file(mut self, required: bool) -> Self {
        self.require_file = required;
        self
    }

    /// Loads and validates settings.
    pub fn load(&self, path: impl AsRef<Path>) -> BinResult<Settings> {
        let settings = self.load_unvalidated(path)?;
        settings.server.validate()?;
        Ok(settings)
    }

    /// Loads settings without validating them.
    pub fn load_unvalidated(&self, path: impl AsRef<Path>) -> BinResult<Settings> {
        let path = path.as_ref();
        let mut builder = Config::builder();

        if path.exists() {
            info!("Loading configuration from: {}", path.display());
            builder = builder.add_source(File::from(PathBuf::from(path)));
        } else if self.require_file {
            return Err(BinError::config(format!(
                "Configuration file not found: {}",
                path.display()
            )));
        } else {
            warn!(
                path = %path.display(),
                "Configuration file not found, using defaults and environment"
            );
        }

        let merged = builder
            .add_source(
                Environment::with_prefix(&self.env_prefix)
                    .prefix_separator(ENV_SEPARATOR)
                    .separator(ENV_SEPARATOR)
                    .try_parsing(true),
            )
            .build()?;

        let server: ApiConfig = merged.clone().try_deserialize()?;
        let users: Vec<SeedUser> = match merged.get("users") {
            Ok(users) => users,
            Err(config::ConfigError::NotFound(_)) => Vec::new(),
            Err(e) => return Err(e.into()),
        };

        debug!(
            port = server.port,
            rate_limit = server.rate_limit.enabled,
            users = users.len(),
            "Configuration loaded"
        );

        Ok(Settings { server, users })
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::time::Duration;
    use tempfile::NamedTempFile;

    fn write_config(suffix: &str, content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::with_suffix(suffix).unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_load_yaml() {
        let file = write_config(
            ".yaml",
            r#"
port: 9000
lookup_timeout: 2s
jwt:
  secret: yaml-test-secret-that-is-long-enough
rate_limit:
  requests_per_second: 5.0
  burst_size: 10
  sweep_interval: 30s
users:
  - email: ada@example.com
    username: ada
    full_name: Ada Lovelace
    verified: true
"#,
        );

        let settings = SettingsLoader::new()
            .with_env_prefix("GATEHOUSE_TEST_YAML")
            .load(file.path())
            .unwrap();

        assert_eq!(settings.server.port, 9000);
        assert_eq!(settings.server.lookup_timeout, Duration::from_secs(2));
        assert_eq!(settings.server.rate_limit.burst_size, 10);
        assert_eq!(settings.server.rate_limit.sweep_interval, Duration::from_secs(30));
        assert_eq!(settings.users.len(), 1);
        assert!(settings.user_records()[0].is_verified);
    }

    #[test]
    fn test_load_toml() {
        let file = write_config(
            ".toml",
            r#"
port = 7000

[jwt]
secret = "toml-test-secret-that-is-long-enough"
"#,
        );

        let settings = SettingsLoader::new()
            .with_env_prefix("GATEHOUSE_TEST_TOML")
            .load(file.path())
            .unwrap();

        assert_eq!(settings.server.port, 7000);
        assert!(settings.users.is_empty());
    }

    #[test]
    fn test_env_overrides_file() {
        let file = write_config(
            ".yaml",
            r#"
port: 9000
jwt:
  secret: env-test-secret-that-is-long-enough
"#,
        );

        std::env::set_var("GATEHOUSE_TEST_ENV__PORT", "9100");
        std::env::set_var("GATEHOUSE_TEST_ENV__RATE_LIMIT__BURST_SIZE", "16");

        let settings = SettingsLoader::new()
            .with_env_prefix("GATEHOUSE_TEST_ENV")
            .load(file.path())
            .unwrap();

        std::env::remove_var("GATEHOUSE_TEST_ENV__PORT");
        std::env::remove_var("GATEHOUSE_TEST_ENV__RATE_LIMIT__BURST_SIZE");

        assert_eq!(settings.server.port, 9100);
        assert_eq!(settings.server.rate_limit.burst_size, 16);
    }

    #[test]
    fn test_missing_file() {
        let loader = SettingsLoader::new().with_env_prefix("GATEHOUSE_TEST_MISSING");

        let settings = loader.load_unvalidated("/nonexistent/gatehouse.yaml").unwrap();
        assert_eq!(settings.server.port, 8080);

        let result = loader
            .require_file(true)
            .load_unvalidated("/nonexistent/gatehouse.yaml");
        assert!(result.is_err());
    }

    #[test]
    fn test_validation_requires_secret() {
        let file = write_config(".yaml", "port: 9000\n");

        let result = SettingsLoader::new()
            .with_env_prefix("GATEHOUSE_TEST_NOSECRET")
            .load(file.path());

        assert!(result.is_err());
    }

    #[test]
    fn test_seed_user_id_is_stable() {
        let user = SeedUser {
            id: None,
            email: "grace@example.com".to_string(),
            username: "grace".to_string(),
            full_name: String::new(),
            verified: false,
        };

        assert_eq!(user.effective_id(), user.to_record().id);
        assert_eq!(user.effective_id(), user.clone().effective_id());
    }
}
