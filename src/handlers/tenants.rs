//! # Tenant API Handlers
//!
//! This module contains handlers for tenant provisioning, lookup and
//! database-config management endpoints. Connection secrets are accepted on
//! the way in but never serialized back out.

use crate::auth::OperatorAuth;
use crate::error::{ApiError, validation_error};
use crate::models::{license, tenant};
use crate::provisioning::{
    ConnectionTarget, DatabasePatch, ProvisioningService, TenantSpec,
    service::AdminSummary, topology::DatabaseTopology,
};
use crate::server::AppState;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Json,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::json;
use utoipa::ToSchema;
use uuid::Uuid;

/// Connection target payload: either a single `url` or the structured
/// host/database/user form.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ConnectionTargetDto {
    /// Full connection URL (mutually exclusive with the structured form)
    pub url: Option<String>,
    #[schema(example = "db.acme.internal")]
    pub host: Option<String>,
    #[schema(example = 5432)]
    pub port: Option<u16>,
    pub database: Option<String>,
    pub user: Option<String>,
    /// Database secret; stored encrypted, never echoed back
    pub secret: Option<String>,
    #[serde(default)]
    pub ssl: bool,
}

impl ConnectionTargetDto {
    fn into_target(self) -> Result<ConnectionTarget, ApiError> {
        if let Some(url) = self.url {
            return Ok(ConnectionTarget::Url(url));
        }

        match (self.host, self.database, self.user) {
            (Some(host), Some(database), Some(user)) => Ok(ConnectionTarget::Params {
                host,
                port: self.port.unwrap_or(5432),
                database,
                user,
                secret: self.secret,
                ssl: self.ssl,
            }),
            _ => Err(validation_error(
                "Connection target requires either 'url' or 'host' + 'database' + 'user'",
                json!({ "fields": ["url", "host", "database", "user"] }),
            )),
        }
    }
}

/// Request payload for provisioning a new tenant
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CreateTenantRequestDto {
    /// Display name for the tenant (required, max 255 characters)
    #[schema(example = "Acme Corp")]
    pub name: String,
    /// Stable identity, unique across the platform
    #[schema(example = "acme")]
    pub slug: String,
    /// Database topology: none, shared, dedicated_managed, dedicated_self
    #[schema(example = "shared")]
    pub topology: String,
    /// Optional connection target; when present it is probed before persisting
    pub connection: Option<ConnectionTargetDto>,
    /// Optional custom routing prefix; validated for uniqueness
    pub url_prefix: Option<String>,
    /// Contact for the tenant's initial admin
    pub admin_email: Option<String>,
}

/// Tenant representation returned by the API. Connection secrets and raw
/// connection URLs are never included.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct TenantDto {
    pub id: String,
    pub name: String,
    pub slug: String,
    /// Full routing URL, `<prefix>.<base_domain>`
    #[schema(example = "0001.tenants.example.org")]
    pub routing_url: String,
    pub database_topology: String,
    pub database_status: String,
    pub can_edit_database: bool,
    pub managed_by: Option<String>,
    pub db_host: Option<String>,
    pub db_port: Option<i32>,
    pub db_name: Option<String>,
    pub db_user: Option<String>,
    pub db_ssl: bool,
    pub last_checked_at: Option<String>,
    pub last_error: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

impl TenantDto {
    fn from_model(model: tenant::Model, service: &ProvisioningService) -> Self {
        Self {
            id: model.id.to_string(),
            name: model.name,
            slug: model.slug,
            routing_url: service.routing_url(&model.url_prefix),
            database_topology: model.database_topology,
            database_status: model.database_status,
            can_edit_database: model.can_edit_database,
            managed_by: model.managed_by,
            db_host: model.db_host,
            db_port: model.db_port,
            db_name: model.db_name,
            db_user: model.db_user,
            db_ssl: model.db_ssl,
            last_checked_at: model.last_checked_at.map(|t| t.to_rfc3339()),
            last_error: model.last_error,
            created_at: model.created_at.to_rfc3339(),
            updated_at: model.updated_at.to_rfc3339(),
        }
    }
}

/// License summary returned alongside a provisioned tenant
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct LicenseDto {
    pub plan: String,
    pub seats: i32,
    pub valid_until: Option<String>,
}

impl From<license::Model> for LicenseDto {
    fn from(model: license::Model) -> Self {
        Self {
            plan: model.plan,
            seats: model.seats,
            valid_until: model.valid_until.map(|t| t.to_rfc3339()),
        }
    }
}

/// Response payload for tenant provisioning
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CreateTenantResponseDto {
    pub tenant: TenantDto,
    pub license: LicenseDto,
    /// Redacted admin payload; secret material is delivered out of band
    #[schema(value_type = Object)]
    pub admin: serde_json::Value,
    /// Feature keys granted (enabled) at creation
    pub granted_features: Vec<String>,
}

/// Request payload for updating a tenant's database configuration
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct UpdateDatabaseConfigDto {
    /// New topology, when changing it
    pub topology: Option<String>,
    /// New connection details; triggers a re-probe
    pub connection: Option<ConnectionTargetDto>,
}

/// Response payload for the ad-hoc connection test
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct TestConnectionResponseDto {
    pub reachable: bool,
    pub latency_ms: u64,
    pub error_detail: Option<String>,
    /// Tenant status after the probe was folded in
    pub database_status: String,
}

/// Standard API response wrapper for tenant operations
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct TenantApiResponse<T> {
    /// Response data
    pub data: T,
    /// Response metadata
    pub meta: TenantResponseMeta,
}

/// Response metadata
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct TenantResponseMeta {
    /// Unique request identifier for tracing
    pub request_id: String,
    /// Response timestamp (ISO 8601)
    pub timestamp: String,
}

fn wrap<T>(data: T) -> TenantApiResponse<T> {
    TenantApiResponse {
        data,
        meta: TenantResponseMeta {
            request_id: Uuid::new_v4().to_string(),
            timestamp: Utc::now().to_rfc3339(),
        },
    }
}

fn parse_topology(value: &str) -> Result<DatabaseTopology, ApiError> {
    value.parse().map_err(|message: String| {
        validation_error(&message, json!({ "field": "topology" }))
    })
}

fn admin_json(admin: &AdminSummary) -> serde_json::Value {
    json!({
        "email": admin.email,
        "initial_secret": admin.initial_secret,
    })
}

/// Provision a new tenant
#[utoipa::path(
    post,
    path = "/api/v1/tenants",
    security(("bearer_auth" = [])),
    request_body = CreateTenantRequestDto,
    responses(
        (status = 201, description = "Tenant provisioned", body = TenantApiResponse<CreateTenantResponseDto>, headers(
            ("Location", description = "URL of the created tenant")
        )),
        (status = 400, description = "Validation failed", body = ApiError),
        (status = 401, description = "Missing or invalid bearer token", body = ApiError),
        (status = 409, description = "Slug or routing prefix already taken", body = ApiError),
        (status = 500, description = "Internal server error", body = ApiError)
    ),
    tag = "tenants"
)]
pub async fn create_tenant(
    State(state): State<AppState>,
    _operator_auth: OperatorAuth,
    Json(request): Json<CreateTenantRequestDto>,
) -> Result<
    (
        StatusCode,
        [(&'static str, String); 1],
        Json<TenantApiResponse<CreateTenantResponseDto>>,
    ),
    ApiError,
> {
    let topology = parse_topology(&request.topology)?;
    let connection = request
        .connection
        .map(ConnectionTargetDto::into_target)
        .transpose()?;

    let service = ProvisioningService::new(state.db.clone(), &state.config);

    let provisioned = service
        .create_tenant(TenantSpec {
            name: request.name.trim().to_string(),
            slug: request.slug,
            topology,
            connection,
            url_prefix: request.url_prefix,
            admin_email: request.admin_email,
        })
        .await?;

    let location = format!("/api/v1/tenants/{}", provisioned.tenant.id);
    let response = CreateTenantResponseDto {
        tenant: TenantDto::from_model(provisioned.tenant, &service),
        license: provisioned.license.into(),
        admin: admin_json(&provisioned.admin),
        granted_features: provisioned.granted_features,
    };

    Ok((
        StatusCode::CREATED,
        [("Location", location)],
        Json(wrap(response)),
    ))
}

/// Get a tenant by ID
#[utoipa::path(
    get,
    path = "/api/v1/tenants/{id}",
    security(("bearer_auth" = [])),
    params(
        ("id" = Uuid, Path, description = "Tenant UUID")
    ),
    responses(
        (status = 200, description = "Tenant retrieved", body = TenantApiResponse<TenantDto>),
        (status = 401, description = "Missing or invalid bearer token", body = ApiError),
        (status = 404, description = "Tenant not found", body = ApiError)
    ),
    tag = "tenants"
)]
pub async fn get_tenant(
    State(state): State<AppState>,
    _operator_auth: OperatorAuth,
    Path(tenant_id): Path<Uuid>,
) -> Result<Json<TenantApiResponse<TenantDto>>, ApiError> {
    let service = ProvisioningService::new(state.db.clone(), &state.config);
    let tenant = service.get_tenant(tenant_id).await?;

    Ok(Json(wrap(TenantDto::from_model(tenant, &service))))
}

/// List all tenants
#[utoipa::path(
    get,
    path = "/api/v1/tenants",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Tenants listed", body = TenantApiResponse<Vec<TenantDto>>),
        (status = 401, description = "Missing or invalid bearer token", body = ApiError)
    ),
    tag = "tenants"
)]
pub async fn list_tenants(
    State(state): State<AppState>,
    _operator_auth: OperatorAuth,
) -> Result<Json<TenantApiResponse<Vec<TenantDto>>>, ApiError> {
    let service = ProvisioningService::new(state.db.clone(), &state.config);
    let tenants = service.list_tenants().await?;

    let dtos = tenants
        .into_iter()
        .map(|tenant| TenantDto::from_model(tenant, &service))
        .collect();

    Ok(Json(wrap(dtos)))
}

/// Update a tenant's database configuration
#[utoipa::path(
    patch,
    path = "/api/v1/tenants/{id}/database",
    security(("bearer_auth" = [])),
    params(
        ("id" = Uuid, Path, description = "Tenant UUID")
    ),
    request_body = UpdateDatabaseConfigDto,
    responses(
        (status = 200, description = "Database config updated", body = TenantApiResponse<TenantDto>),
        (status = 400, description = "Validation failed", body = ApiError),
        (status = 401, description = "Missing or invalid bearer token", body = ApiError),
        (status = 404, description = "Tenant not found", body = ApiError)
    ),
    tag = "tenants"
)]
pub async fn update_database_config(
    State(state): State<AppState>,
    _operator_auth: OperatorAuth,
    Path(tenant_id): Path<Uuid>,
    Json(request): Json<UpdateDatabaseConfigDto>,
) -> Result<Json<TenantApiResponse<TenantDto>>, ApiError> {
    let topology = request.topology.as_deref().map(parse_topology).transpose()?;
    let connection = request
        .connection
        .map(ConnectionTargetDto::into_target)
        .transpose()?;

    let service = ProvisioningService::new(state.db.clone(), &state.config);
    let tenant = service
        .update_database_config(
            tenant_id,
            DatabasePatch {
                topology,
                connection,
            },
        )
        .await?;

    Ok(Json(wrap(TenantDto::from_model(tenant, &service))))
}

/// Probe a tenant's stored connection target and persist the result
#[utoipa::path(
    post,
    path = "/api/v1/tenants/{id}/database/test",
    security(("bearer_auth" = [])),
    params(
        ("id" = Uuid, Path, description = "Tenant UUID")
    ),
    responses(
        (status = 200, description = "Probe executed", body = TenantApiResponse<TestConnectionResponseDto>),
        (status = 400, description = "Tenant has no connection target", body = ApiError),
        (status = 401, description = "Missing or invalid bearer token", body = ApiError),
        (status = 404, description = "Tenant not found", body = ApiError)
    ),
    tag = "tenants"
)]
pub async fn test_connection(
    State(state): State<AppState>,
    _operator_auth: OperatorAuth,
    Path(tenant_id): Path<Uuid>,
) -> Result<Json<TenantApiResponse<TestConnectionResponseDto>>, ApiError> {
    let service = ProvisioningService::new(state.db.clone(), &state.config);
    let (tenant, report) = service.test_connection(tenant_id).await?;

    Ok(Json(wrap(TestConnectionResponseDto {
        reachable: report.reachable,
        latency_ms: report.latency.as_millis() as u64,
        error_detail: report.error_detail,
        database_status: tenant.database_status,
    })))
}
