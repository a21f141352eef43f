//! # Server Configuration
//!
//! This module contains the server setup and configuration for the Tenancy
//! Control Plane: shared application state, router assembly and the OpenAPI
//! document.

use std::sync::Arc;

use axum::{
    Router,
    extract::Request,
    middleware::{self, Next},
    response::Response,
    routing::{get, patch, post, put},
};
use sea_orm::DatabaseConnection;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;
use uuid::Uuid;

use crate::auth;
use crate::config::AppConfig;
use crate::handlers;
use crate::telemetry::{self, TraceContext};

/// Application state containing shared resources. Constructed explicitly and
/// passed in; there is no module-level store handle.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub db: DatabaseConnection,
}

/// Assigns each request a trace context so errors and logs correlate.
async fn trace_context_middleware(mut request: Request, next: Next) -> Response {
    let context = TraceContext {
        trace_id: Uuid::new_v4().to_string(),
    };
    request.extensions_mut().insert(context.clone());
    telemetry::with_trace_context(context, next.run(request)).await
}

/// Creates and configures the Axum application router
pub fn create_app(state: AppState) -> Router {
    let protected = Router::new()
        .route(
            "/api/v1/tenants",
            post(handlers::tenants::create_tenant).get(handlers::tenants::list_tenants),
        )
        .route("/api/v1/tenants/{id}", get(handlers::tenants::get_tenant))
        .route(
            "/api/v1/tenants/{id}/database",
            patch(handlers::tenants::update_database_config),
        )
        .route(
            "/api/v1/tenants/{id}/database/test",
            post(handlers::tenants::test_connection),
        )
        .route("/api/v1/features", get(handlers::features::list_features))
        .route(
            "/api/v1/tenants/{id}/features/{key}",
            put(handlers::features::set_feature),
        )
        .layer(middleware::from_fn_with_state(
            Arc::clone(&state.config),
            auth::auth_middleware,
        ));

    Router::new()
        .route("/", get(handlers::root))
        .route("/healthz", get(handlers::healthz))
        .merge(protected)
        .layer(middleware::from_fn(trace_context_middleware))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
        .merge(SwaggerUi::new("/docs").url("/openapi.json", ApiDoc::openapi()))
}

/// Starts the server with the given configuration
pub async fn run_server(
    config: AppConfig,
    db: DatabaseConnection,
) -> Result<(), Box<dyn std::error::Error>> {
    let addr = config
        .bind_addr()
        .map_err(|e| format!("Invalid server address: {}", e))?;

    let state = AppState {
        config: Arc::new(config),
        db,
    };
    let app = create_app(state);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(%addr, "Tenancy control plane listening");

    axum::serve(listener, app).await?;

    Ok(())
}

/// Build an AppState for tests without going through the config loader.
pub fn create_test_app_state(config: AppConfig, db: DatabaseConnection) -> AppState {
    AppState {
        config: Arc::new(config),
        db,
    }
}

/// OpenAPI documentation
#[derive(OpenApi)]
#[openapi(
    paths(
        crate::handlers::root,
        crate::handlers::healthz,
        crate::handlers::tenants::create_tenant,
        crate::handlers::tenants::get_tenant,
        crate::handlers::tenants::list_tenants,
        crate::handlers::tenants::update_database_config,
        crate::handlers::tenants::test_connection,
        crate::handlers::features::list_features,
        crate::handlers::features::set_feature,
    ),
    components(
        schemas(
            crate::models::ServiceInfo,
            crate::handlers::HealthResponse,
            crate::handlers::tenants::CreateTenantRequestDto,
            crate::handlers::tenants::ConnectionTargetDto,
            crate::handlers::tenants::TenantDto,
            crate::handlers::tenants::LicenseDto,
            crate::handlers::tenants::CreateTenantResponseDto,
            crate::handlers::tenants::UpdateDatabaseConfigDto,
            crate::handlers::tenants::TestConnectionResponseDto,
            crate::handlers::features::FeatureFlagDto,
            crate::handlers::features::SetFeatureRequestDto,
            crate::handlers::features::SetFeatureResponseDto,
            crate::error::ApiError,
        )
    ),
    info(
        title = "Tenancy Control Plane API",
        description = "API for provisioning tenant database topology and feature table sets",
        version = env!("CARGO_PKG_VERSION"),
    )
)]
pub struct ApiDoc;
