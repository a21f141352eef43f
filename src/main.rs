//! # Tenancy Control Plane Main Entry Point
//!
//! This is the main entry point for the Tenancy Control Plane service.

use migration::MigratorTrait;
use tenancy::{config::ConfigLoader, db, seeds, server::run_server, telemetry};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load configuration from layered env files and variables
    let config_loader = ConfigLoader::new();
    let config = config_loader.load()?;

    telemetry::init_tracing(&config)?;

    tracing::info!(profile = %config.profile, "Loaded configuration");
    if let Ok(redacted_json) = config.redacted_json() {
        tracing::debug!(config = %redacted_json, "Effective configuration");
    }

    let db = db::init_pool(&config).await?;

    // Apply pending control-plane migrations and refresh the feature catalog
    migration::Migrator::up(&db, None).await?;
    seeds::seed_feature_flags(&db).await?;

    run_server(config, db).await
}
