//! Database migrations for the Tenancy Control Plane.
//!
//! This module contains all control-plane store migrations using SeaORM Migration.

pub use sea_orm_migration::prelude::*;

mod m2025_11_10_000001_create_tenants;
mod m2025_11_10_000002_create_feature_flags;
mod m2025_11_10_000003_create_tenant_features;
mod m2025_11_10_000004_create_licenses;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m2025_11_10_000001_create_tenants::Migration),
            Box::new(m2025_11_10_000002_create_feature_flags::Migration),
            Box::new(m2025_11_10_000003_create_tenant_features::Migration),
            Box::new(m2025_11_10_000004_create_licenses::Migration),
        ]
    }
}
