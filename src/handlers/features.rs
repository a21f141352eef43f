//! # Feature API Handlers
//!
//! This module contains handlers for the feature catalog and the per-tenant
//! feature toggle endpoint.

use crate::auth::OperatorAuth;
use crate::error::ApiError;
use crate::features::{TenantFeatureGate, registry};
use crate::models::feature_flag;
use crate::server::AppState;
use axum::{
    extract::{Path, State},
    response::Json,
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

/// Feature catalog entry
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct FeatureFlagDto {
    pub id: String,
    #[schema(example = "fund_management")]
    pub feature_key: String,
    pub display_name: String,
    pub description: Option<String>,
    pub is_global: bool,
    pub default_enabled: bool,
    /// Whether enabling this feature provisions schema objects
    pub requires_tables: bool,
}

impl From<feature_flag::Model> for FeatureFlagDto {
    fn from(model: feature_flag::Model) -> Self {
        let requires_tables = registry::table_set(&model.feature_key).is_some();
        Self {
            id: model.id.to_string(),
            feature_key: model.feature_key,
            display_name: model.display_name,
            description: model.description,
            is_global: model.is_global,
            default_enabled: model.default_enabled,
            requires_tables,
        }
    }
}

/// Request payload for toggling a feature
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct SetFeatureRequestDto {
    pub enabled: bool,
    /// Optional per-tenant settings; preserved when omitted
    pub settings: Option<serde_json::Value>,
}

/// Response payload for a feature toggle
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct SetFeatureResponseDto {
    pub feature_key: String,
    pub is_enabled: bool,
    /// Whether this feature requires schema objects at all
    pub required: bool,
    /// Whether this call created the table set
    pub created: bool,
    /// Whether the table set already existed
    pub already_existed: bool,
}

/// List the feature catalog
#[utoipa::path(
    get,
    path = "/api/v1/features",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Feature catalog", body = Vec<FeatureFlagDto>),
        (status = 401, description = "Missing or invalid bearer token", body = ApiError)
    ),
    tag = "features"
)]
pub async fn list_features(
    State(state): State<AppState>,
    _operator_auth: OperatorAuth,
) -> Result<Json<Vec<FeatureFlagDto>>, ApiError> {
    let gate = TenantFeatureGate::new(state.db.clone(), &state.config);
    let catalog = gate.list_catalog().await?;

    Ok(Json(catalog.into_iter().map(Into::into).collect()))
}

/// Enable or disable a feature for a tenant
///
/// Enabling a gated feature provisions its table set in the tenant's target
/// database before the flag flips; disabling only clears the flag and never
/// drops tables.
#[utoipa::path(
    put,
    path = "/api/v1/tenants/{id}/features/{key}",
    security(("bearer_auth" = [])),
    params(
        ("id" = Uuid, Path, description = "Tenant UUID"),
        ("key" = String, Path, description = "Feature key")
    ),
    request_body = SetFeatureRequestDto,
    responses(
        (status = 200, description = "Feature toggled", body = SetFeatureResponseDto),
        (status = 401, description = "Missing or invalid bearer token", body = ApiError),
        (status = 404, description = "Tenant or feature not found", body = ApiError),
        (status = 502, description = "Target database unreachable or DDL failed", body = ApiError)
    ),
    tag = "features"
)]
pub async fn set_feature(
    State(state): State<AppState>,
    _operator_auth: OperatorAuth,
    Path((tenant_id, feature_key)): Path<(Uuid, String)>,
    Json(request): Json<SetFeatureRequestDto>,
) -> Result<Json<SetFeatureResponseDto>, ApiError> {
    let gate = TenantFeatureGate::new(state.db.clone(), &state.config);

    let outcome = gate
        .set_feature(tenant_id, &feature_key, request.enabled, request.settings)
        .await?;

    Ok(Json(SetFeatureResponseDto {
        feature_key: outcome.feature_key,
        is_enabled: outcome.is_enabled,
        required: outcome.tables.required,
        created: outcome.tables.created,
        already_existed: outcome.tables.already_existed,
    }))
}
