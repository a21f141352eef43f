//! End-to-end tests of the HTTP surface: auth, status-code mapping and
//! secret redaction in responses.

mod test_utils;

use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode},
};
use serde_json::{Value, json};
use tenancy::server::{AppState, create_app, create_test_app_state};
use test_utils::{setup_seeded_control_plane, test_config};
use tower::ServiceExt;
use uuid::Uuid;

async fn setup_app() -> (AppState, Router) {
    let db = setup_seeded_control_plane().await;
    let state = create_test_app_state(test_config(), db);
    let app = create_app(state.clone());
    (state, app)
}

fn authed(builder: axum::http::request::Builder) -> axum::http::request::Builder {
    builder
        .header("Authorization", "Bearer test-token")
        .header("Content-Type", "application/json")
}

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn test_root_is_public() {
    let (_state, app) = setup_app().await;

    let response = app
        .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["service"], "tenancy-control-plane");
}

#[tokio::test]
async fn test_healthz() {
    let (_state, app) = setup_app().await;

    let response = app
        .oneshot(
            Request::builder()
                .uri("/healthz")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_protected_routes_require_bearer_token() {
    let (_state, app) = setup_app().await;

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/api/v1/tenants")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/v1/tenants")
                .header("Authorization", "Bearer wrong-token")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_create_tenant_success() {
    let (_state, app) = setup_app().await;

    let request_body = json!({
        "name": "Acme Corp",
        "slug": "acme",
        "topology": "shared",
        "admin_email": "admin@acme.example"
    });

    let request = authed(Request::builder().method("POST").uri("/api/v1/tenants"))
        .body(Body::from(request_body.to_string()))
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);

    let location = response.headers().get("Location").unwrap();
    assert!(location.to_str().unwrap().starts_with("/api/v1/tenants/"));

    let body = body_json(response).await;
    let tenant = &body["data"]["tenant"];
    assert_eq!(tenant["slug"], "acme");
    assert_eq!(tenant["database_status"], "ready");
    assert_eq!(tenant["can_edit_database"], false);
    assert_eq!(tenant["managed_by"], "platform");
    assert_eq!(tenant["routing_url"], "0001.tenants.test");

    assert_eq!(body["data"]["license"]["plan"], "trial");
    assert_eq!(body["data"]["admin"]["email"], "admin@acme.example");
    assert_eq!(body["data"]["admin"]["initial_secret"], "[redacted]");
    assert!(!body["meta"]["request_id"].as_str().unwrap().is_empty());
}

#[tokio::test]
async fn test_create_tenant_never_echoes_secret() {
    let (_state, app) = setup_app().await;

    let request_body = json!({
        "name": "Beta Inc",
        "slug": "beta",
        "topology": "dedicated_managed",
        "connection": {
            "host": "127.0.0.1",
            "port": 9,
            "database": "beta",
            "user": "beta_app",
            "secret": "ultra-secret-value"
        }
    });

    let request = authed(Request::builder().method("POST").uri("/api/v1/tenants"))
        .body(Body::from(request_body.to_string()))
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);

    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let raw = String::from_utf8(bytes.to_vec()).unwrap();
    assert!(!raw.contains("ultra-secret-value"));

    let body: Value = serde_json::from_str(&raw).unwrap();
    // Unreachable target degrades to connection_failed, tenant still created
    assert_eq!(body["data"]["tenant"]["database_status"], "connection_failed");
}

#[tokio::test]
async fn test_create_tenant_invalid_topology() {
    let (_state, app) = setup_app().await;

    let request_body = json!({
        "name": "Acme",
        "slug": "acme",
        "topology": "cluster"
    });

    let request = authed(Request::builder().method("POST").uri("/api/v1/tenants"))
        .body(Body::from(request_body.to_string()))
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let body = body_json(response).await;
    assert_eq!(body["code"], "VALIDATION_FAILED");
}

#[tokio::test]
async fn test_create_tenant_slug_conflict() {
    let (_state, app) = setup_app().await;

    let request_body = json!({
        "name": "Acme",
        "slug": "acme",
        "topology": "shared"
    });

    let request = authed(Request::builder().method("POST").uri("/api/v1/tenants"))
        .body(Body::from(request_body.to_string()))
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);

    let request = authed(Request::builder().method("POST").uri("/api/v1/tenants"))
        .body(Body::from(request_body.to_string()))
        .unwrap();
    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::CONFLICT);

    let body = body_json(response).await;
    assert_eq!(body["code"], "CONFLICT");
}

#[tokio::test]
async fn test_get_tenant_not_found() {
    let (_state, app) = setup_app().await;

    let request = authed(
        Request::builder()
            .method("GET")
            .uri(format!("/api/v1/tenants/{}", Uuid::new_v4())),
    )
    .body(Body::empty())
    .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let body = body_json(response).await;
    assert_eq!(body["code"], "TENANT_NOT_FOUND");
}

#[tokio::test]
async fn test_feature_toggle_round_trip() {
    let (_state, app) = setup_app().await;

    let request = authed(Request::builder().method("POST").uri("/api/v1/tenants"))
        .body(Body::from(
            json!({"name": "Acme", "slug": "acme", "topology": "shared"}).to_string(),
        ))
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    let body = body_json(response).await;
    let tenant_id = body["data"]["tenant"]["id"].as_str().unwrap().to_string();

    let uri = format!("/api/v1/tenants/{}/features/fund_management", tenant_id);

    let request = authed(Request::builder().method("PUT").uri(&uri))
        .body(Body::from(json!({"enabled": true}).to_string()))
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body["is_enabled"], true);
    assert_eq!(body["required"], true);
    assert_eq!(body["created"], true);
    assert_eq!(body["already_existed"], false);

    // Second enable is a no-op on the table set
    let request = authed(Request::builder().method("PUT").uri(&uri))
        .body(Body::from(json!({"enabled": true}).to_string()))
        .unwrap();
    let response = app.oneshot(request).await.unwrap();
    let body = body_json(response).await;
    assert_eq!(body["created"], false);
    assert_eq!(body["already_existed"], true);
}

#[tokio::test]
async fn test_list_features_catalog() {
    let (_state, app) = setup_app().await;

    let request = authed(Request::builder().method("GET").uri("/api/v1/features"))
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    let catalog = body.as_array().unwrap();
    assert!(catalog.len() >= 4);

    let fund = catalog
        .iter()
        .find(|flag| flag["feature_key"] == "fund_management")
        .unwrap();
    assert_eq!(fund["requires_tables"], true);

    let portal = catalog
        .iter()
        .find(|flag| flag["feature_key"] == "member_portal")
        .unwrap();
    assert_eq!(portal["requires_tables"], false);
}

#[tokio::test]
async fn test_error_responses_use_problem_json() {
    let (_state, app) = setup_app().await;

    let request = authed(
        Request::builder()
            .method("GET")
            .uri(format!("/api/v1/tenants/{}", Uuid::new_v4())),
    )
    .body(Body::empty())
    .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(
        response.headers().get("content-type").unwrap(),
        "application/problem+json"
    );

    let body = body_json(response).await;
    assert!(body["trace_id"].as_str().is_some());
}
