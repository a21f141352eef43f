//! Tenant feature gate
//!
//! Consumer-facing toggle for per-tenant features. Enabling a gated feature
//! provisions its table set first and only then flips the enabled flag, so
//! a failed provisioning attempt never leaves the flag set. Disabling never
//! drops tables; a later re-enable finds them already present.

use sea_orm::DatabaseConnection;
use uuid::Uuid;

use crate::config::AppConfig;
use crate::error::ProvisionError;
use crate::features::tables::{EnsureOutcome, FeatureTableManager};
use crate::models::{feature_flag, tenant_feature};
use crate::repositories::{FeatureFlagRepository, TenantFeatureRepository, TenantRepository};

/// Result of a feature toggle
#[derive(Debug, Clone)]
pub struct ToggleOutcome {
    pub feature_key: String,
    pub is_enabled: bool,
    pub tables: EnsureOutcome,
}

/// Toggles features on and off for a tenant
pub struct TenantFeatureGate {
    db: DatabaseConnection,
    tables: FeatureTableManager,
}

impl TenantFeatureGate {
    pub fn new(db: DatabaseConnection, config: &AppConfig) -> Self {
        let tables = FeatureTableManager::new(db.clone(), config);
        Self { db, tables }
    }

    /// Enable or disable a feature for a tenant.
    ///
    /// On enable, table provisioning must succeed before the flag flips;
    /// Connection and Schema errors propagate with the grant untouched.
    pub async fn set_feature(
        &self,
        tenant_id: Uuid,
        feature_key: &str,
        enabled: bool,
        settings: Option<serde_json::Value>,
    ) -> Result<ToggleOutcome, ProvisionError> {
        let tenant = TenantRepository::new(&self.db)
            .find_by_id(tenant_id)
            .await?
            .ok_or(ProvisionError::TenantNotFound(tenant_id))?;

        let flag = FeatureFlagRepository::new(&self.db)
            .find_by_key(feature_key)
            .await?
            .ok_or_else(|| ProvisionError::FeatureNotFound(feature_key.to_string()))?;

        let tables = if enabled {
            self.tables.ensure_feature_tables(&tenant, feature_key).await?
        } else {
            // Disable is flag-only: tables survive so no UI toggle can
            // destroy tenant data.
            EnsureOutcome::not_required()
        };

        let grant = TenantFeatureRepository::new(&self.db)
            .upsert(tenant.id, flag.id, enabled, settings)
            .await?;

        tracing::info!(
            tenant_id = %tenant.id,
            feature_key,
            enabled,
            "Feature toggled"
        );

        Ok(ToggleOutcome {
            feature_key: flag.feature_key,
            is_enabled: grant.is_enabled,
            tables,
        })
    }

    /// The feature catalog, for listings.
    pub async fn list_catalog(&self) -> Result<Vec<feature_flag::Model>, ProvisionError> {
        Ok(FeatureFlagRepository::new(&self.db).list().await?)
    }

    /// All grants for a tenant.
    pub async fn list_grants(
        &self,
        tenant_id: Uuid,
    ) -> Result<Vec<tenant_feature::Model>, ProvisionError> {
        Ok(TenantFeatureRepository::new(&self.db)
            .list_for_tenant(tenant_id)
            .await?)
    }
}
