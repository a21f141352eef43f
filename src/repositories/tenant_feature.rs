//! # Tenant Feature Repository
//!
//! Data access for per-tenant feature grants. Writes go through `upsert`
//! only, so the (tenant_id, feature_id) pair is never duplicated.

use crate::models::tenant_feature::{
    ActiveModel as TenantFeatureActiveModel, Column as TenantFeatureColumn, Entity as TenantFeature,
    Model as TenantFeatureModel,
};
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DbErr, EntityTrait, IntoActiveModel,
    QueryFilter, Set,
};
use uuid::Uuid;

/// Repository for TenantFeature database operations
pub struct TenantFeatureRepository<'a, C: ConnectionTrait> {
    db: &'a C,
}

impl<'a, C: ConnectionTrait> TenantFeatureRepository<'a, C> {
    pub fn new(db: &'a C) -> Self {
        Self { db }
    }

    /// Find the grant for a (tenant, feature) pair
    pub async fn find_pair(
        &self,
        tenant_id: Uuid,
        feature_id: Uuid,
    ) -> Result<Option<TenantFeatureModel>, DbErr> {
        TenantFeature::find()
            .filter(TenantFeatureColumn::TenantId.eq(tenant_id))
            .filter(TenantFeatureColumn::FeatureId.eq(feature_id))
            .one(self.db)
            .await
    }

    /// List all grants for a tenant
    pub async fn list_for_tenant(
        &self,
        tenant_id: Uuid,
    ) -> Result<Vec<TenantFeatureModel>, DbErr> {
        TenantFeature::find()
            .filter(TenantFeatureColumn::TenantId.eq(tenant_id))
            .all(self.db)
            .await
    }

    /// Create or update the grant for a (tenant, feature) pair.
    ///
    /// `settings` is only written when provided so a plain enable/disable
    /// toggle does not clobber stored settings.
    pub async fn upsert(
        &self,
        tenant_id: Uuid,
        feature_id: Uuid,
        is_enabled: bool,
        settings: Option<serde_json::Value>,
    ) -> Result<TenantFeatureModel, DbErr> {
        let now = Utc::now();

        match self.find_pair(tenant_id, feature_id).await? {
            Some(existing) => {
                let mut active = existing.into_active_model();
                active.is_enabled = Set(is_enabled);
                if let Some(settings) = settings {
                    active.settings = Set(Some(settings));
                }
                active.updated_at = Set(now.into());
                active.update(self.db).await
            }
            None => {
                let grant = TenantFeatureActiveModel {
                    id: Set(Uuid::new_v4()),
                    tenant_id: Set(tenant_id),
                    feature_id: Set(feature_id),
                    is_enabled: Set(is_enabled),
                    settings: Set(settings),
                    created_at: Set(now.into()),
                    updated_at: Set(now.into()),
                };
                grant.insert(self.db).await
            }
        }
    }
}
