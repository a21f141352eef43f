//! Tenant feature grant entity model
//!
//! Join entity between tenants and feature flags. The (tenant_id,
//! feature_id) pair is unique; grants are written via upsert only.

use sea_orm::ActiveModelBehavior;
use sea_orm::entity::prelude::*;
use sea_orm::prelude::DateTimeWithTimeZone;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "tenant_features")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    pub tenant_id: Uuid,
    pub feature_id: Uuid,

    pub is_enabled: bool,

    /// Free-form per-tenant feature settings
    pub settings: Option<Json>,

    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::tenant::Entity",
        from = "Column::TenantId",
        to = "super::tenant::Column::Id",
        on_delete = "Cascade"
    )]
    Tenant,
    #[sea_orm(
        belongs_to = "super::feature_flag::Entity",
        from = "Column::FeatureId",
        to = "super::feature_flag::Column::Id",
        on_delete = "Cascade"
    )]
    FeatureFlag,
}

impl Related<super::tenant::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Tenant.def()
    }
}

impl Related<super::feature_flag::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::FeatureFlag.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
