//! Feature flag entity model
//!
//! Static feature catalog seeded at platform bootstrap. Identity is
//! immutable; per-tenant state lives in `tenant_features`.

use sea_orm::ActiveModelBehavior;
use sea_orm::entity::prelude::*;
use sea_orm::prelude::DateTimeWithTimeZone;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "feature_flags")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    /// Stable key consumers toggle by, e.g. "fund_management"
    #[sea_orm(unique)]
    pub feature_key: String,

    pub display_name: String,
    pub description: Option<String>,

    /// Whether the flag is offered to every tenant
    pub is_global: bool,

    /// Whether new tenants receive the feature enabled
    pub default_enabled: bool,

    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::tenant_feature::Entity")]
    TenantFeatures,
}

impl Related<super::tenant_feature::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::TenantFeatures.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
