//! # Data Models
//!
//! This module contains all the data models used throughout the Tenancy
//! Control Plane.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

pub mod feature_flag;
pub mod license;
pub mod tenant;
pub mod tenant_feature;

pub use feature_flag::Entity as FeatureFlag;
pub use license::Entity as License;
pub use tenant::Entity as Tenant;
pub use tenant_feature::Entity as TenantFeature;

/// Basic service information response
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ServiceInfo {
    /// The name of the service
    pub service: String,
    /// The version of the service
    pub version: String,
}

impl Default for ServiceInfo {
    fn default() -> Self {
        Self {
            service: "tenancy-control-plane".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}
