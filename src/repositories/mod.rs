//! # Repository Layer
//!
//! This module contains repository implementations that encapsulate SeaORM
//! operations for control-plane entities. Repositories are generic over
//! [`sea_orm::ConnectionTrait`] so the same data access code runs against
//! the pool or inside an open transaction.

pub mod feature_flag;
pub mod license;
pub mod tenant;
pub mod tenant_feature;

pub use feature_flag::FeatureFlagRepository;
pub use license::LicenseRepository;
pub use tenant::TenantRepository;
pub use tenant_feature::TenantFeatureRepository;
