//! Shared helpers for integration tests.

#![allow(dead_code)]

use migration::MigratorTrait;
use sea_orm::{ConnectOptions, Database, DatabaseConnection};
use tenancy::config::{AppConfig, ProbeConfig};

/// In-memory SQLite control-plane store with all migrations applied.
///
/// A single pooled connection keeps every query on the same in-memory
/// database.
pub async fn setup_control_plane() -> DatabaseConnection {
    let mut options = ConnectOptions::new("sqlite::memory:");
    options.max_connections(1).sqlx_logging(false);

    let db = Database::connect(options)
        .await
        .expect("Failed to connect to in-memory store");

    migration::Migrator::up(&db, None)
        .await
        .expect("Failed to run migrations");

    db
}

/// Control-plane store with the feature catalog seeded.
pub async fn setup_seeded_control_plane() -> DatabaseConnection {
    let db = setup_control_plane().await;
    tenancy::seeds::seed_feature_flags(&db)
        .await
        .expect("Failed to seed feature flags");
    db
}

/// Test configuration with auth and crypto material filled in. Probes use a
/// short timeout so unreachable-target tests stay fast.
pub fn test_config() -> AppConfig {
    AppConfig {
        profile: "test".to_string(),
        operator_tokens: vec!["test-token".to_string()],
        crypto_key: Some(vec![7u8; 32]),
        base_domain: "tenants.test".to_string(),
        probe: ProbeConfig { timeout_ms: 2000 },
        ..Default::default()
    }
}
