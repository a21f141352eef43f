//! # Tenant Provisioning
//!
//! This module tree contains the tenant-database-topology manager: the pure
//! topology resolver, the connection probe, the routing prefix allocator and
//! the orchestrating provisioning service.

pub mod prefix;
pub mod probe;
pub mod service;
pub mod topology;

pub use prefix::UrlPrefixAllocator;
pub use probe::{ConnectionProbe, ConnectionTarget, ProbeReport};
pub use service::{DatabasePatch, ProvisionedTenant, ProvisioningService, TenantSpec};
pub use topology::{DatabaseStatus, DatabaseTopology, ManagedBy, TopologyDefaults};
