//! Tests for layered configuration loading.
//!
//! The loader merges `.env`, `.env.local`, `.env.<profile>` and
//! `.env.<profile>.local` (later files win), then validates the result.

use std::fs;
use std::path::Path;

use tempfile::TempDir;
use tenancy::config::{ConfigError, ConfigLoader};

// base64 of 32 bytes of 0x07
const TEST_KEY_B64: &str = "BwcHBwcHBwcHBwcHBwcHBwcHBwcHBwcHBwcHBwcHBwc=";

fn write_env(dir: &Path, file: &str, lines: &[&str]) {
    fs::write(dir.join(file), lines.join("\n")).expect("write env file");
}

fn base_env_lines() -> Vec<String> {
    vec![
        format!("TENANCY_CRYPTO_KEY={}", TEST_KEY_B64),
        "TENANCY_OPERATOR_TOKEN=base-token".to_string(),
        "TENANCY_DATABASE_URL=sqlite::memory:".to_string(),
    ]
}

#[test]
fn test_load_from_base_env_file() {
    let dir = TempDir::new().unwrap();
    let lines = base_env_lines();
    let lines: Vec<&str> = lines.iter().map(String::as_str).collect();
    write_env(dir.path(), ".env", &lines);

    let loader = ConfigLoader::with_base_dir(dir.path().to_path_buf());
    let config = loader.load().unwrap();

    assert_eq!(config.profile, "local");
    assert_eq!(config.database_url, "sqlite::memory:");
    assert_eq!(config.operator_tokens, vec!["base-token".to_string()]);
    assert_eq!(config.crypto_key.as_ref().map(Vec::len), Some(32));
}

#[test]
fn test_local_overrides_base() {
    let dir = TempDir::new().unwrap();
    let lines = base_env_lines();
    let lines: Vec<&str> = lines.iter().map(String::as_str).collect();
    write_env(dir.path(), ".env", &lines);
    write_env(
        dir.path(),
        ".env.local",
        &["TENANCY_DATABASE_URL=postgresql://local-override/db"],
    );

    let loader = ConfigLoader::with_base_dir(dir.path().to_path_buf());
    let config = loader.load().unwrap();

    assert_eq!(config.database_url, "postgresql://local-override/db");
    // Values not overridden fall through from .env
    assert_eq!(config.operator_tokens, vec!["base-token".to_string()]);
}

#[test]
fn test_profile_file_layering() {
    let dir = TempDir::new().unwrap();
    let mut lines = base_env_lines();
    lines.push("TENANCY_PROFILE=staging".to_string());
    let lines: Vec<&str> = lines.iter().map(String::as_str).collect();
    write_env(dir.path(), ".env", &lines);
    write_env(
        dir.path(),
        ".env.staging",
        &["TENANCY_BASE_DOMAIN=staging.tenants.example.org"],
    );

    let loader = ConfigLoader::with_base_dir(dir.path().to_path_buf());
    let config = loader.load().unwrap();

    assert_eq!(config.profile, "staging");
    assert_eq!(config.base_domain, "staging.tenants.example.org");
}

#[test]
fn test_operator_tokens_comma_separated() {
    let dir = TempDir::new().unwrap();
    let lines = vec![
        format!("TENANCY_CRYPTO_KEY={}", TEST_KEY_B64),
        "TENANCY_OPERATOR_TOKENS=alpha, beta ,gamma,".to_string(),
    ];
    let lines: Vec<&str> = lines.iter().map(String::as_str).collect();
    write_env(dir.path(), ".env", &lines);

    let loader = ConfigLoader::with_base_dir(dir.path().to_path_buf());
    let config = loader.load().unwrap();

    assert_eq!(
        config.operator_tokens,
        vec!["alpha".to_string(), "beta".to_string(), "gamma".to_string()]
    );
}

#[test]
fn test_missing_crypto_key_rejected() {
    let dir = TempDir::new().unwrap();
    write_env(dir.path(), ".env", &["TENANCY_OPERATOR_TOKEN=token"]);

    let loader = ConfigLoader::with_base_dir(dir.path().to_path_buf());
    let err = loader.load().unwrap_err();

    assert!(matches!(err, ConfigError::MissingCryptoKey));
}

#[test]
fn test_invalid_crypto_key_base64_rejected() {
    let dir = TempDir::new().unwrap();
    write_env(
        dir.path(),
        ".env",
        &[
            "TENANCY_CRYPTO_KEY=not!base64!!",
            "TENANCY_OPERATOR_TOKEN=token",
        ],
    );

    let loader = ConfigLoader::with_base_dir(dir.path().to_path_buf());
    let err = loader.load().unwrap_err();

    assert!(matches!(err, ConfigError::InvalidCryptoKeyBase64 { .. }));
}

#[test]
fn test_wrong_length_crypto_key_rejected() {
    let dir = TempDir::new().unwrap();
    // base64 of 8 bytes, decodes fine but is too short for AES-256
    write_env(
        dir.path(),
        ".env",
        &[
            "TENANCY_CRYPTO_KEY=AAAAAAAAAAA=",
            "TENANCY_OPERATOR_TOKEN=token",
        ],
    );

    let loader = ConfigLoader::with_base_dir(dir.path().to_path_buf());
    let err = loader.load().unwrap_err();

    assert!(matches!(err, ConfigError::InvalidCryptoKeyLength { .. }));
}

#[test]
fn test_missing_operator_tokens_rejected() {
    let dir = TempDir::new().unwrap();
    let lines = vec![format!("TENANCY_CRYPTO_KEY={}", TEST_KEY_B64)];
    let lines: Vec<&str> = lines.iter().map(String::as_str).collect();
    write_env(dir.path(), ".env", &lines);

    let loader = ConfigLoader::with_base_dir(dir.path().to_path_buf());
    let err = loader.load().unwrap_err();

    assert!(matches!(err, ConfigError::MissingOperatorTokens));
}

#[test]
fn test_invalid_bind_addr_rejected() {
    let dir = TempDir::new().unwrap();
    let mut lines = base_env_lines();
    lines.push("TENANCY_API_BIND_ADDR=not-an-addr".to_string());
    let lines: Vec<&str> = lines.iter().map(String::as_str).collect();
    write_env(dir.path(), ".env", &lines);

    let loader = ConfigLoader::with_base_dir(dir.path().to_path_buf());
    let err = loader.load().unwrap_err();

    assert!(matches!(err, ConfigError::InvalidBindAddr { .. }));
}

#[test]
fn test_probe_and_prefix_settings_parsed() {
    let dir = TempDir::new().unwrap();
    let mut lines = base_env_lines();
    lines.push("TENANCY_PROBE_TIMEOUT_MS=5000".to_string());
    lines.push("TENANCY_PREFIX_WIDTH=6".to_string());
    lines.push("TENANCY_PREFIX_MAX_ATTEMPTS=50".to_string());
    let lines: Vec<&str> = lines.iter().map(String::as_str).collect();
    write_env(dir.path(), ".env", &lines);

    let loader = ConfigLoader::with_base_dir(dir.path().to_path_buf());
    let config = loader.load().unwrap();

    assert_eq!(config.probe.timeout_ms, 5000);
    assert_eq!(config.prefix.width, 6);
    assert_eq!(config.prefix.max_attempts, 50);
}
