// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Implementation of the `validate` command.

use crate::cli::{Cli, OutputFormat, ValidateArgs};
use crate::error::{BinError, BinResult};
use crate::settings::{Settings, SettingsLoader};

/// Executes the `validate` command to validate configuration.
pub fn validate(cli: &Cli, args: ValidateArgs) -> BinResult<()> {
    let config_path = &cli.config;

    let settings = SettingsLoader::new()
        .require_file(true)
        .load(config_path)
        .map_err(|e| e.with_context("Configuration validation failed"))?;

    let warnings = collect_warnings(&settings);
    let server = &settings.server;

    match args.format {
        OutputFormat::Text => {
            println!("✓ Configuration is valid: {}", config_path.display());
            println!();
            println!("Summary:");
            println!("  Listen: {}", server.socket_addr());
            println!(
                "  Rate limit: {}",
                if server.rate_limit.enabled {
                    format!(
                        "{} req/s, burst {}",
                        server.rate_limit.requests_per_second, server.rate_limit.burst_size
                    )
                } else {
                    "disabled".to_string()
                }
            );
            println!("  Token lifetime: {:?}", server.jwt.expiration);
            println!("  Seed users: {}", settings.users.len());

            if !warnings.is_empty() {
                println!();
                println!("Warnings:");
                for warning in &warnings {
                    println!("  ⚠ {}", warning);
                }
            }

            if args.show_config {
                println!();
                println!("Parsed configuration:");
                println!(
                    "{}",
                    serde_json::to_string_pretty(&settings)
                        .unwrap_or_else(|_| "(serialization error)".to_string())
                );
            }
        }
        OutputFormat::Json => {
            let output = serde_json::json!({
                "valid": true,
                "config_path": config_path.display().to_string(),
                "summary": {
                    "listen": server.socket_addr().to_string(),
                    "rate_limit_enabled": server.rate_limit.enabled,
                    "requests_per_second": server.rate_limit.requests_per_second,
                    "burst_size": server.rate_limit.burst_size,
                    "seed_users": settings.users.len(),
                },
                "warnings": warnings,
                "config": if args.show_config { Some(&settings) } else { None },
            });
            let rendered = serde_json::to_string_pretty(&output)
                .map_err(|e| BinError::runtime(format!("Failed to render output: {}", e)))?;
            println!("{}", rendered);
        }
    }

    if args.strict && !warnings.is_empty() {
        return Err(BinError::config(format!(
            "Strict mode: {} warning(s) found",
            warnings.len()
        )));
    }

    Ok(())
}

/// Returns operator-facing warnings for a valid configuration.
pub fn collect_warnings(settings: &Settings) -> Vec<String> {
    let server = &settings.server;
    let rate_limit = &server.rate_limit;
    let mut warnings = Vec::new();

    if server.jwt.secret.len() < 32 {
        warnings.push("JWT secret is shorter than 32 bytes".to_string());
    }
    if settings.users.is_empty() {
        warnings.push("No seed users configured".to_string());
    }

    if !rate_limit.enabled {
        warnings.push("Rate limiting is disabled".to_string());
    } else {
        if rate_limit.burst_size == 0 {
            warnings.push("Rate limit burst size is 0, every request will be rejected".to_string());
        }
        if rate_limit.requests_per_second.is_nan() || rate_limit.requests_per_second <= 0.0 {
            warnings.push("Rate limit rate is not positive, buckets never refill".to_string());
        }
        if rate_limit.trust_proxy_headers {
            warnings.push(
                "Proxy headers are trusted for client keys; only safe behind a proxy that overwrites them"
                    .to_string(),
            );
        }
    }

    warnings
}

#[cfg(test)]
mod tests {
    use super::*;
    use gatehouse_api::{ApiConfig, JwtConfig, RateLimitConfig};

    #[test]
    fn test_collect_warnings() {
        let settings = Settings {
            server: ApiConfig::new()
                .with_jwt(JwtConfig::new("short"))
                .with_rate_limit(RateLimitConfig {
                    burst_size: 0,
                    requests_per_second: -1.0,
                    trust_proxy_headers: false,
                    ..Default::default()
                }),
            users: Vec::new(),
        };

        let warnings = collect_warnings(&settings);

        assert_eq!(warnings.len(), 4);
        assert!(warnings.iter().any(|w| w.contains("burst size is 0")));
    }

    #[test]
    fn test_disabled_rate_limit_warning() {
        let settings = Settings {
            server: ApiConfig::new()
                .with_jwt(JwtConfig::new("a-secret-that-is-long-enough-for-hs256"))
                .with_rate_limit(RateLimitConfig::disabled()),
            users: Vec::new(),
        };

        let warnings = collect_warnings(&settings);

        assert!(warnings.contains(&"Rate limiting is disabled".to_string()));
        assert_eq!(warnings.len(), 2);
    }
}
