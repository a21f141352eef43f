//! Tenant entity model
//!
//! This module contains the SeaORM entity model for the tenants table, which
//! stores tenant identity, database topology, connection target fields and
//! the routing prefix.

use sea_orm::ActiveModelBehavior;
use sea_orm::entity::prelude::*;
use sea_orm::prelude::DateTimeWithTimeZone;

/// Tenant entity holding topology and connection state
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "tenants")]
pub struct Model {
    /// Unique identifier for the tenant (primary key)
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    /// Display name for the tenant
    pub name: String,

    /// Stable external identity, unique across the platform
    #[sea_orm(unique)]
    pub slug: String,

    /// Routing subdomain label; routing URL is `<url_prefix>.<base_domain>`
    #[sea_orm(unique)]
    pub url_prefix: String,

    /// Database topology: none, shared, dedicated_managed, dedicated_self
    pub database_topology: String,

    /// Operational status: not_configured, pending_setup, ready, connection_failed
    pub database_status: String,

    /// Whether the tenant may edit its own connection settings
    pub can_edit_database: bool,

    /// Who operates the database: platform, tenant, or null when none
    pub managed_by: Option<String>,

    pub db_host: Option<String>,
    pub db_port: Option<i32>,
    pub db_name: Option<String>,
    pub db_user: Option<String>,

    /// AES-256-GCM ciphertext of the database secret; never serialized out
    pub db_secret_ciphertext: Option<Vec<u8>>,

    pub db_ssl: bool,

    /// Alternative single connection URL form
    pub db_url: Option<String>,

    /// When the connection target was last probed
    pub last_checked_at: Option<DateTimeWithTimeZone>,

    /// Detail of the last failed probe, for operator visibility
    pub last_error: Option<String>,

    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::tenant_feature::Entity")]
    TenantFeatures,
    #[sea_orm(has_one = "super::license::Entity")]
    License,
}

impl Related<super::tenant_feature::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::TenantFeatures.def()
    }
}

impl Related<super::license::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::License.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
