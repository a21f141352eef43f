//! Tenant provisioning service
//!
//! Orchestrates tenant creation and database-config updates: slug and prefix
//! validation, topology resolution, optional connection probing, and a single
//! atomic write of the tenant row together with its dependent records
//! (initial license, default feature grants). A tenant must never exist
//! without its license, or with grants against a nonexistent tenant.

use std::sync::LazyLock;
use std::time::Duration;

use chrono::Utc;
use regex::Regex;
use sea_orm::{DatabaseConnection, IntoActiveModel, Set, TransactionTrait};
use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::config::AppConfig;
use crate::crypto::{self, CryptoKey};
use crate::error::ProvisionError;
use crate::models::{license, tenant};
use crate::provisioning::prefix::UrlPrefixAllocator;
use crate::provisioning::probe::{ConnectionProbe, ConnectionTarget, ProbeReport};
use crate::provisioning::topology::{self, DatabaseStatus, DatabaseTopology};
use crate::repositories::{
    FeatureFlagRepository, LicenseRepository, TenantFeatureRepository, TenantRepository,
};

static SLUG_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[a-z0-9]([a-z0-9-]{0,61}[a-z0-9])?$").expect("slug regex is valid")
});

/// Declarative input for tenant creation
#[derive(Debug, Clone)]
pub struct TenantSpec {
    pub name: String,
    pub slug: String,
    pub topology: DatabaseTopology,
    pub connection: Option<ConnectionTarget>,
    pub url_prefix: Option<String>,
    pub admin_email: Option<String>,
}

/// Patch for an existing tenant's database configuration
#[derive(Debug, Clone, Default)]
pub struct DatabasePatch {
    pub topology: Option<DatabaseTopology>,
    pub connection: Option<ConnectionTarget>,
}

/// Redacted admin payload returned from provisioning. Secret material is
/// never echoed back to the caller.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct AdminSummary {
    pub email: Option<String>,
    /// Always "[redacted]"; credentials are delivered out of band
    pub initial_secret: &'static str,
}

/// Result of a successful tenant provisioning call
#[derive(Debug, Clone)]
pub struct ProvisionedTenant {
    pub tenant: tenant::Model,
    pub license: license::Model,
    pub admin: AdminSummary,
    pub granted_features: Vec<String>,
}

/// Orchestrates tenant lifecycle operations against the control-plane store.
///
/// Holds its own store handle and collaborators; no module-level shared
/// state, so multiple instances with different stores can coexist.
pub struct ProvisioningService {
    db: DatabaseConnection,
    base_domain: String,
    probe: ConnectionProbe,
    allocator: UrlPrefixAllocator,
    crypto_key: Option<CryptoKey>,
}

impl ProvisioningService {
    pub fn new(db: DatabaseConnection, config: &AppConfig) -> Self {
        let crypto_key = config
            .crypto_key
            .clone()
            .and_then(|bytes| CryptoKey::new(bytes).ok());

        Self {
            db,
            base_domain: config.base_domain.clone(),
            probe: ConnectionProbe::new(Duration::from_millis(config.probe.timeout_ms)),
            allocator: UrlPrefixAllocator::new(&config.prefix),
            crypto_key,
        }
    }

    /// The full routing URL for a prefix under the configured base domain.
    pub fn routing_url(&self, url_prefix: &str) -> String {
        format!("{}.{}", url_prefix, self.base_domain)
    }

    pub fn crypto_key(&self) -> Option<&CryptoKey> {
        self.crypto_key.as_ref()
    }

    /// Provision a new tenant.
    ///
    /// Probe failures are absorbed into `database_status`; only slug/prefix
    /// conflicts and validation failures abort the call. All persistence
    /// happens in one transaction.
    pub async fn create_tenant(
        &self,
        spec: TenantSpec,
    ) -> Result<ProvisionedTenant, ProvisionError> {
        validate_name(&spec.name)?;
        validate_slug(&spec.slug)?;

        let repo = TenantRepository::new(&self.db);
        if repo.find_by_slug(&spec.slug).await?.is_some() {
            return Err(ProvisionError::Conflict {
                resource: "slug",
                value: spec.slug,
            });
        }

        let defaults = topology::resolve(spec.topology);
        let mut status = defaults.status;
        let mut last_checked_at = None;
        let mut last_error = None;

        if let Some(target) = &spec.connection {
            let report = self.probe.probe(target).await;
            last_checked_at = Some(Utc::now());
            if report.reachable {
                status = DatabaseStatus::Ready;
            } else {
                status = DatabaseStatus::ConnectionFailed;
                last_error = report.error_detail.clone();
                tracing::warn!(
                    slug = %spec.slug,
                    target = %target.redacted(),
                    "Tenant database probe failed; provisioning continues"
                );
            }
        }

        let url_prefix = match &spec.url_prefix {
            Some(prefix) => self.allocator.claim_custom(&self.db, prefix).await?,
            None => self.allocator.allocate(&self.db).await?,
        };

        let tenant_id = Uuid::new_v4();
        let now = Utc::now();
        let columns = connection_columns(tenant_id, spec.connection.as_ref(), self.crypto_key())?;

        let txn = self.db.begin().await?;

        let tenant = TenantRepository::new(&txn)
            .insert(tenant::ActiveModel {
                id: Set(tenant_id),
                name: Set(spec.name),
                slug: Set(spec.slug),
                url_prefix: Set(url_prefix),
                database_topology: Set(spec.topology.as_str().to_owned()),
                database_status: Set(status.as_str().to_owned()),
                can_edit_database: Set(defaults.can_edit),
                managed_by: Set(defaults.managed_by.map(|m| m.as_str().to_owned())),
                db_host: Set(columns.host),
                db_port: Set(columns.port),
                db_name: Set(columns.database),
                db_user: Set(columns.user),
                db_secret_ciphertext: Set(columns.secret_ciphertext),
                db_ssl: Set(columns.ssl),
                db_url: Set(columns.url),
                last_checked_at: Set(last_checked_at.map(Into::into)),
                last_error: Set(last_error),
                created_at: Set(now.into()),
                updated_at: Set(now.into()),
            })
            .await?;

        let license = LicenseRepository::new(&txn)
            .insert(license::ActiveModel {
                id: Set(Uuid::new_v4()),
                tenant_id: Set(tenant_id),
                plan: Set("trial".to_string()),
                seats: Set(5),
                valid_until: Set(None),
                created_at: Set(now.into()),
            })
            .await?;

        let default_flags = FeatureFlagRepository::new(&txn).list_default_enabled().await?;
        let grants = TenantFeatureRepository::new(&txn);
        let mut granted_features = Vec::with_capacity(default_flags.len());
        for flag in default_flags {
            grants.upsert(tenant_id, flag.id, true, None).await?;
            granted_features.push(flag.feature_key);
        }

        txn.commit().await?;

        metrics::counter!("tenancy_tenants_provisioned_total").increment(1);
        tracing::info!(
            tenant_id = %tenant.id,
            slug = %tenant.slug,
            topology = %tenant.database_topology,
            status = %tenant.database_status,
            "Provisioned tenant"
        );

        Ok(ProvisionedTenant {
            tenant,
            license,
            admin: AdminSummary {
                email: spec.admin_email,
                initial_secret: "[redacted]",
            },
            granted_features,
        })
    }

    /// Update a tenant's database configuration.
    ///
    /// Edit permission and operator are recomputed only when the topology
    /// actually changes; supplying new connection details triggers a
    /// re-probe. The row is written once, so no partial update is visible.
    pub async fn update_database_config(
        &self,
        tenant_id: Uuid,
        patch: DatabasePatch,
    ) -> Result<tenant::Model, ProvisionError> {
        let repo = TenantRepository::new(&self.db);
        let tenant = repo
            .find_by_id(tenant_id)
            .await?
            .ok_or(ProvisionError::TenantNotFound(tenant_id))?;

        let current_topology: DatabaseTopology = tenant
            .database_topology
            .parse()
            .map_err(ProvisionError::Validation)?;

        let now = Utc::now();
        let mut active = tenant.into_active_model();

        if let Some(new_topology) = patch.topology
            && new_topology != current_topology
        {
            let defaults = topology::resolve(new_topology);
            active.database_topology = Set(new_topology.as_str().to_owned());
            active.database_status = Set(defaults.status.as_str().to_owned());
            active.can_edit_database = Set(defaults.can_edit);
            active.managed_by = Set(defaults.managed_by.map(|m| m.as_str().to_owned()));
        }

        if let Some(target) = &patch.connection {
            let report = self.probe.probe(target).await;
            let status = if report.reachable {
                DatabaseStatus::Ready
            } else {
                DatabaseStatus::ConnectionFailed
            };

            let columns = connection_columns(tenant_id, Some(target), self.crypto_key())?;
            active.db_host = Set(columns.host);
            active.db_port = Set(columns.port);
            active.db_name = Set(columns.database);
            active.db_user = Set(columns.user);
            active.db_secret_ciphertext = Set(columns.secret_ciphertext);
            active.db_ssl = Set(columns.ssl);
            active.db_url = Set(columns.url);
            active.database_status = Set(status.as_str().to_owned());
            active.last_checked_at = Set(Some(now.into()));
            active.last_error = Set(report.error_detail.clone());
        }

        active.updated_at = Set(now.into());
        let updated = repo.update(active).await?;

        tracing::info!(
            tenant_id = %updated.id,
            topology = %updated.database_topology,
            status = %updated.database_status,
            "Updated tenant database config"
        );

        Ok(updated)
    }

    /// Re-probe the tenant's stored connection target and persist the
    /// resulting status.
    pub async fn test_connection(
        &self,
        tenant_id: Uuid,
    ) -> Result<(tenant::Model, ProbeReport), ProvisionError> {
        let repo = TenantRepository::new(&self.db);
        let tenant = repo
            .find_by_id(tenant_id)
            .await?
            .ok_or(ProvisionError::TenantNotFound(tenant_id))?;

        let target = stored_connection_target(&tenant, self.crypto_key())?.ok_or_else(|| {
            ProvisionError::validation("tenant has no connection target configured")
        })?;

        let report = self.probe.probe(&target).await;
        let status = if report.reachable {
            DatabaseStatus::Ready
        } else {
            DatabaseStatus::ConnectionFailed
        };

        let now = Utc::now();
        let mut active = tenant.into_active_model();
        active.database_status = Set(status.as_str().to_owned());
        active.last_checked_at = Set(Some(now.into()));
        active.last_error = Set(report.error_detail.clone());
        active.updated_at = Set(now.into());

        let updated = repo.update(active).await?;
        Ok((updated, report))
    }

    pub async fn get_tenant(&self, tenant_id: Uuid) -> Result<tenant::Model, ProvisionError> {
        TenantRepository::new(&self.db)
            .find_by_id(tenant_id)
            .await?
            .ok_or(ProvisionError::TenantNotFound(tenant_id))
    }

    pub async fn list_tenants(&self) -> Result<Vec<tenant::Model>, ProvisionError> {
        Ok(TenantRepository::new(&self.db).list().await?)
    }

    pub async fn find_license(
        &self,
        tenant_id: Uuid,
    ) -> Result<Option<license::Model>, ProvisionError> {
        Ok(LicenseRepository::new(&self.db)
            .find_by_tenant(tenant_id)
            .await?)
    }
}

struct ConnectionColumns {
    host: Option<String>,
    port: Option<i32>,
    database: Option<String>,
    user: Option<String>,
    secret_ciphertext: Option<Vec<u8>>,
    ssl: bool,
    url: Option<String>,
}

impl ConnectionColumns {
    fn empty() -> Self {
        Self {
            host: None,
            port: None,
            database: None,
            user: None,
            secret_ciphertext: None,
            ssl: false,
            url: None,
        }
    }
}

fn connection_columns(
    tenant_id: Uuid,
    target: Option<&ConnectionTarget>,
    crypto_key: Option<&CryptoKey>,
) -> Result<ConnectionColumns, ProvisionError> {
    let Some(target) = target else {
        return Ok(ConnectionColumns::empty());
    };

    match target {
        ConnectionTarget::Url(url) => Ok(ConnectionColumns {
            url: Some(url.clone()),
            ..ConnectionColumns::empty()
        }),
        ConnectionTarget::Params {
            host,
            port,
            database,
            user,
            secret,
            ssl,
        } => {
            let secret_ciphertext = match secret {
                Some(secret) => Some(match crypto_key {
                    Some(key) => crypto::encrypt_tenant_secret(key, tenant_id, secret)?,
                    // Without a configured key the secret is stored in the
                    // legacy plaintext format and picked up later by the
                    // reencryption tool.
                    None => secret.as_bytes().to_vec(),
                }),
                None => None,
            };

            Ok(ConnectionColumns {
                host: Some(host.clone()),
                port: Some(i32::from(*port)),
                database: Some(database.clone()),
                user: Some(user.clone()),
                secret_ciphertext,
                ssl: *ssl,
                url: None,
            })
        }
    }
}

/// Rebuild the probe target from a stored tenant row, decrypting the secret.
pub fn stored_connection_target(
    tenant: &tenant::Model,
    crypto_key: Option<&CryptoKey>,
) -> Result<Option<ConnectionTarget>, ProvisionError> {
    if let Some(url) = &tenant.db_url {
        return Ok(Some(ConnectionTarget::Url(url.clone())));
    }

    let (Some(host), Some(database), Some(user)) =
        (&tenant.db_host, &tenant.db_name, &tenant.db_user)
    else {
        return Ok(None);
    };

    let secret = match &tenant.db_secret_ciphertext {
        Some(ciphertext) if !ciphertext.is_empty() => Some(match crypto_key {
            Some(key) => crypto::decrypt_tenant_secret(key, tenant.id, ciphertext)?,
            None => String::from_utf8(ciphertext.clone()).map_err(|_| {
                ProvisionError::validation("stored database secret is not valid UTF-8")
            })?,
        }),
        _ => None,
    };

    Ok(Some(ConnectionTarget::Params {
        host: host.clone(),
        port: tenant.db_port.map(|p| p as u16).unwrap_or(5432),
        database: database.clone(),
        user: user.clone(),
        secret,
        ssl: tenant.db_ssl,
    }))
}

fn validate_name(name: &str) -> Result<(), ProvisionError> {
    if name.trim().is_empty() {
        return Err(ProvisionError::validation("tenant name cannot be empty"));
    }
    if name.len() > 255 {
        return Err(ProvisionError::validation(
            "tenant name cannot exceed 255 characters",
        ));
    }
    Ok(())
}

fn validate_slug(slug: &str) -> Result<(), ProvisionError> {
    if SLUG_RE.is_match(slug) {
        Ok(())
    } else {
        Err(ProvisionError::validation(format!(
            "slug '{}' must be a lowercase identifier (a-z, 0-9, inner hyphens, max 63 chars)",
            slug
        )))
    }
}
