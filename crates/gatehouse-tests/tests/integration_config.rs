// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Configuration loading tests.

use std::fs;
use std::time::Duration;

use gatehouse_bin::{GateRuntime, SettingsLoader};
use gatehouse_tests::common::temp_test_dir;

const YAML: &str = r#"
host: 127.0.0.1
port: 0
lookup_timeout: 2s
jwt:
  secret: "yaml-secret-that-is-long-enough-for-hs256"
  expiration: 1h
rate_limit:
  requests_per_second: 5.0
  burst_size: 10
  trust_proxy_headers: false
users:
  - email: ada@example.com
    username: ada
    full_name: Ada Lovelace
    verified: true
  - email: grace@example.com
    username: grace
    full_name: Grace Hopper
"#;

#[test]
fn test_load_yaml_settings() {
    let dir = temp_test_dir("gatehouse-config");
    let path = dir.path().join("gatehouse.yaml");
    fs::write(&path, YAML).unwrap();

    let settings = SettingsLoader::new()
        .with_env_prefix("GATEHOUSE_IT_YAML")
        .load(&path)
        .unwrap();

    assert_eq!(settings.server.port, 0);
    assert_eq!(settings.server.jwt.expiration, Duration::from_secs(3600));
    assert_eq!(settings.server.rate_limit.burst_size, 10);
    assert!(!settings.server.rate_limit.trust_proxy_headers);
    assert_eq!(settings.server.lookup_timeout, Duration::from_secs(2));
    assert_eq!(settings.users.len(), 2);

    let records = settings.user_records();
    let ada = records.iter().find(|r| r.username == "ada").unwrap();
    let grace = records.iter().find(|r| r.username == "grace").unwrap();
    assert!(ada.is_verified);
    assert!(!grace.is_verified);
}

#[test]
fn test_load_json_settings() {
    let dir = temp_test_dir("gatehouse-config");
    let path = dir.path().join("gatehouse.json");
    fs::write(
        &path,
        r#"{
            "port": 9090,
            "jwt": { "secret": "json-secret-that-is-long-enough-for-hs256" },
            "rate_limit": { "enabled": false }
        }"#,
    )
    .unwrap();

    let settings = SettingsLoader::new()
        .with_env_prefix("GATEHOUSE_IT_JSON")
        .load(&path)
        .unwrap();

    assert_eq!(settings.server.port, 9090);
    assert!(!settings.server.rate_limit.enabled);
    assert!(settings.users.is_empty());
}

#[test]
fn test_invalid_file_is_rejected() {
    let dir = temp_test_dir("gatehouse-config");
    let path = dir.path().join("gatehouse.yaml");
    fs::write(&path, "port: not-a-port\n").unwrap();

    let result = SettingsLoader::new()
        .with_env_prefix("GATEHOUSE_IT_INVALID")
        .load(&path);

    assert!(result.is_err());
}

#[tokio::test]
async fn test_loaded_settings_build_a_server() {
    let dir = temp_test_dir("gatehouse-config");
    let path = dir.path().join("gatehouse.yaml");
    fs::write(&path, YAML).unwrap();

    let settings = SettingsLoader::new()
        .with_env_prefix("GATEHOUSE_IT_SERVER")
        .load(&path)
        .unwrap();

    let server = GateRuntime::new(settings).build_server().unwrap();
    let admission = server.state().admission();

    assert_eq!(admission.config().burst_size, 10);
    assert!(admission.is_enabled());
}
