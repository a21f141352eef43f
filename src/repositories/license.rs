//! # License Repository

use crate::models::license::{
    ActiveModel as LicenseActiveModel, Column as LicenseColumn, Entity as License,
    Model as LicenseModel,
};
use sea_orm::{ActiveModelTrait, ColumnTrait, ConnectionTrait, DbErr, EntityTrait, QueryFilter};
use uuid::Uuid;

/// Repository for License database operations
pub struct LicenseRepository<'a, C: ConnectionTrait> {
    db: &'a C,
}

impl<'a, C: ConnectionTrait> LicenseRepository<'a, C> {
    pub fn new(db: &'a C) -> Self {
        Self { db }
    }

    pub async fn insert(&self, license: LicenseActiveModel) -> Result<LicenseModel, DbErr> {
        license.insert(self.db).await
    }

    /// Find the license belonging to a tenant
    pub async fn find_by_tenant(&self, tenant_id: Uuid) -> Result<Option<LicenseModel>, DbErr> {
        License::find()
            .filter(LicenseColumn::TenantId.eq(tenant_id))
            .one(self.db)
            .await
    }
}
