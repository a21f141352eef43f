//! Feature table provisioning
//!
//! Ensures the schema objects a gated feature requires exist inside a
//! tenant's target database, exactly once. Creation is idempotent at the
//! DDL level (`CREATE TABLE IF NOT EXISTS`); on Postgres the check-then-
//! create sequence additionally runs under a transaction-scoped advisory
//! lock keyed on (tenant, feature) so concurrent enables from several nodes
//! serialize. Within one process, racing calls for the same pair serialize
//! on a keyed mutex so exactly one reports the creation.
//!
//! The target database is the control-plane store for shared topology and a
//! short-lived dedicated connection otherwise; dedicated connections always
//! carry a bounded connect timeout and are closed before returning.

use std::collections::HashMap;
use std::sync::{Arc, LazyLock, Mutex as StdMutex};
use std::time::Duration;

use sea_orm::{
    ConnectOptions, ConnectionTrait, Database, DatabaseConnection, DbBackend, Statement,
    TransactionTrait,
};
use tokio::sync::Mutex as AsyncMutex;
use uuid::Uuid;

use crate::config::AppConfig;
use crate::crypto::CryptoKey;
use crate::error::ProvisionError;
use crate::features::registry::{self, FeatureTableSet, TableSpec};
use crate::models::tenant;
use crate::provisioning::service::stored_connection_target;
use crate::provisioning::topology::DatabaseTopology;

/// Outcome of an ensure call for a (tenant, feature) pair
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EnsureOutcome {
    pub required: bool,
    pub created: bool,
    pub already_existed: bool,
}

impl EnsureOutcome {
    pub fn not_required() -> Self {
        Self {
            required: false,
            created: false,
            already_existed: false,
        }
    }
}

type EnsureLockMap = HashMap<(Uuid, String), Arc<AsyncMutex<()>>>;

// Per-(tenant, feature) mutexes serializing check-then-create within this
// process. Entries are tiny and bounded by the number of (tenant, feature)
// pairs ever enabled, so they are never evicted.
static ENSURE_LOCKS: LazyLock<StdMutex<EnsureLockMap>> =
    LazyLock::new(|| StdMutex::new(HashMap::new()));

fn ensure_lock(tenant_id: Uuid, feature_key: &str) -> Arc<AsyncMutex<()>> {
    let mut locks = ENSURE_LOCKS.lock().expect("ensure lock map poisoned");
    locks
        .entry((tenant_id, feature_key.to_string()))
        .or_insert_with(|| Arc::new(AsyncMutex::new(())))
        .clone()
}

/// FNV-1a over tenant id and feature key; collisions across distinct pairs
/// only coarsen lock granularity.
fn advisory_lock_key(tenant_id: Uuid, feature_key: &str) -> i64 {
    let mut hash: u64 = 0xcbf2_9ce4_8422_2325;
    for byte in tenant_id.as_bytes().iter().chain(feature_key.as_bytes()) {
        hash ^= u64::from(*byte);
        hash = hash.wrapping_mul(0x0000_0100_0000_01b3);
    }
    hash as i64
}

/// Provisions feature table sets inside tenant target databases
pub struct FeatureTableManager {
    control_plane: DatabaseConnection,
    crypto_key: Option<CryptoKey>,
    connect_timeout: Duration,
}

impl FeatureTableManager {
    pub fn new(control_plane: DatabaseConnection, config: &AppConfig) -> Self {
        let crypto_key = config
            .crypto_key
            .clone()
            .and_then(|bytes| CryptoKey::new(bytes).ok());

        Self {
            control_plane,
            crypto_key,
            connect_timeout: Duration::from_millis(config.probe.timeout_ms),
        }
    }

    /// Ensure the table set for `feature_key` exists in the tenant's target
    /// database. Idempotent; safe to retry and to race.
    pub async fn ensure_feature_tables(
        &self,
        tenant: &tenant::Model,
        feature_key: &str,
    ) -> Result<EnsureOutcome, ProvisionError> {
        let Some(table_set) = registry::table_set(feature_key) else {
            return Ok(EnsureOutcome::not_required());
        };

        let lock = ensure_lock(tenant.id, feature_key);
        let _guard = lock.lock().await;

        let topology: DatabaseTopology = tenant
            .database_topology
            .parse()
            .map_err(ProvisionError::Validation)?;

        let outcome = match topology {
            DatabaseTopology::None => {
                return Err(ProvisionError::connection(
                    "tenant has no database; choose a topology before enabling gated features",
                ));
            }
            DatabaseTopology::Shared => {
                self.ensure_on(&self.control_plane, tenant, table_set).await
            }
            DatabaseTopology::DedicatedManaged | DatabaseTopology::DedicatedSelf => {
                let conn = self.open_dedicated(tenant).await?;
                let result = self.ensure_on(&conn, tenant, table_set).await;
                // Release the dedicated connection regardless of outcome.
                let _ = conn.close().await;
                result
            }
        }?;

        if outcome.created {
            metrics::counter!("tenancy_feature_tables_created_total").increment(1);
            tracing::info!(
                tenant_id = %tenant.id,
                feature_key,
                "Created feature table set"
            );
        }

        Ok(outcome)
    }

    /// Open a short-lived connection to a dedicated tenant database.
    async fn open_dedicated(
        &self,
        tenant: &tenant::Model,
    ) -> Result<DatabaseConnection, ProvisionError> {
        let target = stored_connection_target(tenant, self.crypto_key.as_ref())?
            .ok_or_else(|| {
                ProvisionError::connection("tenant has no connection target configured")
            })?;

        let url = target.connection_url()?;
        let mut options = ConnectOptions::new(url);
        options
            .max_connections(1)
            .connect_timeout(self.connect_timeout)
            .sqlx_logging(false);

        tokio::time::timeout(self.connect_timeout, Database::connect(options))
            .await
            .map_err(|_| {
                ProvisionError::connection(format!(
                    "connection to {} timed out after {}ms",
                    target.redacted(),
                    self.connect_timeout.as_millis()
                ))
            })?
            .map_err(|err| {
                ProvisionError::connection(format!(
                    "{} ({})",
                    err,
                    target.redacted()
                ))
            })
    }

    async fn ensure_on(
        &self,
        conn: &DatabaseConnection,
        tenant: &tenant::Model,
        table_set: &FeatureTableSet,
    ) -> Result<EnsureOutcome, ProvisionError> {
        let missing = missing_tables(conn, table_set).await?;
        if missing.is_empty() {
            return Ok(EnsureOutcome {
                required: true,
                created: false,
                already_existed: true,
            });
        }

        let created = match conn.get_database_backend() {
            DbBackend::Postgres => {
                self.create_missing_postgres(conn, tenant, table_set).await?
            }
            _ => {
                // Conditional DDL alone is the guard on backends without
                // advisory locks.
                for table in &missing {
                    execute_ddl(conn, table).await?;
                }
                true
            }
        };

        Ok(EnsureOutcome {
            required: true,
            created,
            already_existed: !created,
        })
    }

    /// Check-then-create under a transaction-scoped advisory lock so
    /// concurrent enables from different nodes serialize.
    async fn create_missing_postgres(
        &self,
        conn: &DatabaseConnection,
        tenant: &tenant::Model,
        table_set: &FeatureTableSet,
    ) -> Result<bool, ProvisionError> {
        let txn = conn
            .begin()
            .await
            .map_err(|err| ProvisionError::connection(err.to_string()))?;

        let key = advisory_lock_key(tenant.id, table_set.feature_key);
        txn.execute(Statement::from_sql_and_values(
            DbBackend::Postgres,
            "SELECT pg_advisory_xact_lock($1)",
            [key.into()],
        ))
        .await
        .map_err(|err| ProvisionError::connection(err.to_string()))?;

        // Another node may have created the set between the unlocked check
        // and lock acquisition.
        let still_missing = missing_tables(&txn, table_set).await?;
        for table in &still_missing {
            execute_ddl(&txn, table).await?;
        }

        txn.commit()
            .await
            .map_err(|err| ProvisionError::connection(err.to_string()))?;

        Ok(!still_missing.is_empty())
    }
}

async fn execute_ddl<C: ConnectionTrait>(
    conn: &C,
    table: &TableSpec,
) -> Result<(), ProvisionError> {
    conn.execute_unprepared(table.ddl)
        .await
        .map(|_| ())
        .map_err(|err| ProvisionError::Schema {
            table: table.name.to_string(),
            detail: err.to_string(),
        })
}

async fn missing_tables<C: ConnectionTrait>(
    conn: &C,
    table_set: &FeatureTableSet,
) -> Result<Vec<TableSpec>, ProvisionError> {
    let mut missing = Vec::new();
    for table in table_set.tables {
        if !table_exists(conn, table.name).await? {
            missing.push(*table);
        }
    }
    Ok(missing)
}

async fn table_exists<C: ConnectionTrait>(
    conn: &C,
    table: &str,
) -> Result<bool, ProvisionError> {
    let backend = conn.get_database_backend();
    let stmt = match backend {
        DbBackend::Postgres => Statement::from_string(
            backend,
            format!("SELECT to_regclass('public.{table}') IS NOT NULL AS present"),
        ),
        _ => Statement::from_string(
            backend,
            format!(
                "SELECT EXISTS(SELECT 1 FROM sqlite_master WHERE type='table' AND name='{table}') AS present"
            ),
        ),
    };

    let row = conn.query_one(stmt).await.map_err(|err| {
        ProvisionError::Schema {
            table: table.to_string(),
            detail: format!("existence check failed: {err}"),
        }
    })?;

    row.map(|row| row.try_get::<bool>("", "present"))
        .transpose()
        .map_err(|err| ProvisionError::Schema {
            table: table.to_string(),
            detail: format!("existence check failed: {err}"),
        })
        .map(|present| present.unwrap_or(false))
}
