//! # Tenant Repository
//!
//! This module contains the repository implementation for Tenant entities,
//! providing lookups by id, slug and routing prefix plus the count used by
//! sequential prefix allocation.

use crate::models::tenant::{
    ActiveModel as TenantActiveModel, Column as TenantColumn, Entity as Tenant,
    Model as TenantModel,
};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DbErr, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder,
};
use uuid::Uuid;

/// Repository for Tenant database operations
pub struct TenantRepository<'a, C: ConnectionTrait> {
    db: &'a C,
}

impl<'a, C: ConnectionTrait> TenantRepository<'a, C> {
    /// Create a new TenantRepository with the given connection
    pub fn new(db: &'a C) -> Self {
        Self { db }
    }

    /// Insert a fully populated tenant row
    pub async fn insert(&self, tenant: TenantActiveModel) -> Result<TenantModel, DbErr> {
        tenant.insert(self.db).await
    }

    /// Update an existing tenant row
    pub async fn update(&self, tenant: TenantActiveModel) -> Result<TenantModel, DbErr> {
        tenant.update(self.db).await
    }

    /// Get tenant by ID
    pub async fn find_by_id(&self, tenant_id: Uuid) -> Result<Option<TenantModel>, DbErr> {
        Tenant::find_by_id(tenant_id).one(self.db).await
    }

    /// Get tenant by slug
    pub async fn find_by_slug(&self, slug: &str) -> Result<Option<TenantModel>, DbErr> {
        Tenant::find()
            .filter(TenantColumn::Slug.eq(slug))
            .one(self.db)
            .await
    }

    /// Whether any tenant already claims the given routing prefix
    pub async fn url_prefix_exists(&self, url_prefix: &str) -> Result<bool, DbErr> {
        let count = Tenant::find()
            .filter(TenantColumn::UrlPrefix.eq(url_prefix))
            .count(self.db)
            .await?;

        Ok(count > 0)
    }

    /// List all tenants, oldest first
    pub async fn list(&self) -> Result<Vec<TenantModel>, DbErr> {
        Tenant::find()
            .order_by_asc(TenantColumn::CreatedAt)
            .all(self.db)
            .await
    }

    /// Get tenant count
    pub async fn count(&self) -> Result<u64, DbErr> {
        Tenant::find().count(self.db).await
    }
}
