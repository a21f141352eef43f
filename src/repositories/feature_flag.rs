//! # Feature Flag Repository
//!
//! Data access for the static feature catalog.

use crate::models::feature_flag::{
    ActiveModel as FeatureFlagActiveModel, Column as FeatureFlagColumn, Entity as FeatureFlag,
    Model as FeatureFlagModel,
};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DbErr, EntityTrait, QueryFilter, QueryOrder,
};

/// Repository for FeatureFlag database operations
pub struct FeatureFlagRepository<'a, C: ConnectionTrait> {
    db: &'a C,
}

impl<'a, C: ConnectionTrait> FeatureFlagRepository<'a, C> {
    pub fn new(db: &'a C) -> Self {
        Self { db }
    }

    pub async fn insert(&self, flag: FeatureFlagActiveModel) -> Result<FeatureFlagModel, DbErr> {
        flag.insert(self.db).await
    }

    /// Find a flag by its stable key
    pub async fn find_by_key(&self, feature_key: &str) -> Result<Option<FeatureFlagModel>, DbErr> {
        FeatureFlag::find()
            .filter(FeatureFlagColumn::FeatureKey.eq(feature_key))
            .one(self.db)
            .await
    }

    /// List the whole catalog, stable order
    pub async fn list(&self) -> Result<Vec<FeatureFlagModel>, DbErr> {
        FeatureFlag::find()
            .order_by_asc(FeatureFlagColumn::FeatureKey)
            .all(self.db)
            .await
    }

    /// Flags granted to every new tenant with the feature already enabled
    pub async fn list_default_enabled(&self) -> Result<Vec<FeatureFlagModel>, DbErr> {
        FeatureFlag::find()
            .filter(FeatureFlagColumn::IsGlobal.eq(true))
            .filter(FeatureFlagColumn::DefaultEnabled.eq(true))
            .order_by_asc(FeatureFlagColumn::FeatureKey)
            .all(self.db)
            .await
    }
}
