//! Topology resolution
//!
//! Pure mapping from a requested database topology to the initial
//! operational status, edit permission and operator. No I/O; used both on
//! tenant creation and on topology change. Probe results may later move
//! `database_status` between ready and connection_failed, but never change
//! the topology-derived fields.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// The tenant's database ownership/location mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum DatabaseTopology {
    /// Tenant has no database at all
    None,
    /// Rows live in the platform-owned shared database
    Shared,
    /// Dedicated database operated by the platform
    DedicatedManaged,
    /// Dedicated database operated by the tenant itself
    DedicatedSelf,
}

/// Operational status of the tenant's database connection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum DatabaseStatus {
    NotConfigured,
    PendingSetup,
    /// Terminal reachable state, also reported after successful ad-hoc probes
    Ready,
    ConnectionFailed,
}

/// Who operates the tenant's database
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum ManagedBy {
    Platform,
    Tenant,
}

/// Initial values derived from a topology choice
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TopologyDefaults {
    pub status: DatabaseStatus,
    pub can_edit: bool,
    pub managed_by: Option<ManagedBy>,
}

/// Resolve a topology into its initial status, edit permission and operator.
pub fn resolve(topology: DatabaseTopology) -> TopologyDefaults {
    match topology {
        DatabaseTopology::None => TopologyDefaults {
            status: DatabaseStatus::NotConfigured,
            can_edit: true,
            managed_by: None,
        },
        DatabaseTopology::Shared => TopologyDefaults {
            status: DatabaseStatus::Ready,
            can_edit: false,
            managed_by: Some(ManagedBy::Platform),
        },
        DatabaseTopology::DedicatedManaged => TopologyDefaults {
            status: DatabaseStatus::PendingSetup,
            can_edit: false,
            managed_by: Some(ManagedBy::Platform),
        },
        DatabaseTopology::DedicatedSelf => TopologyDefaults {
            status: DatabaseStatus::PendingSetup,
            can_edit: true,
            managed_by: Some(ManagedBy::Tenant),
        },
    }
}

impl DatabaseTopology {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Shared => "shared",
            Self::DedicatedManaged => "dedicated_managed",
            Self::DedicatedSelf => "dedicated_self",
        }
    }

    /// Whether the topology points at a database separate from the
    /// control-plane store
    pub fn is_dedicated(&self) -> bool {
        matches!(self, Self::DedicatedManaged | Self::DedicatedSelf)
    }
}

impl std::str::FromStr for DatabaseTopology {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "none" => Ok(Self::None),
            "shared" => Ok(Self::Shared),
            "dedicated_managed" => Ok(Self::DedicatedManaged),
            "dedicated_self" => Ok(Self::DedicatedSelf),
            other => Err(format!("unknown database topology '{}'", other)),
        }
    }
}

impl std::fmt::Display for DatabaseTopology {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl DatabaseStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NotConfigured => "not_configured",
            Self::PendingSetup => "pending_setup",
            Self::Ready => "ready",
            Self::ConnectionFailed => "connection_failed",
        }
    }
}

impl std::str::FromStr for DatabaseStatus {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "not_configured" => Ok(Self::NotConfigured),
            "pending_setup" => Ok(Self::PendingSetup),
            "ready" => Ok(Self::Ready),
            "connection_failed" => Ok(Self::ConnectionFailed),
            other => Err(format!("unknown database status '{}'", other)),
        }
    }
}

impl std::fmt::Display for DatabaseStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl ManagedBy {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Platform => "platform",
            Self::Tenant => "tenant",
        }
    }
}

impl std::str::FromStr for ManagedBy {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "platform" => Ok(Self::Platform),
            "tenant" => Ok(Self::Tenant),
            other => Err(format!("unknown database operator '{}'", other)),
        }
    }
}

impl std::fmt::Display for ManagedBy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
