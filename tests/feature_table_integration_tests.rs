//! Integration tests for feature table provisioning and the tenant feature
//! gate: idempotency, concurrency, and the flag/table separation on the
//! disable path.

mod test_utils;

use std::sync::Arc;

use sea_orm::{ConnectionTrait, DatabaseConnection, Statement};
use tenancy::error::ProvisionError;
use tenancy::features::{FeatureTableManager, TenantFeatureGate};
use tenancy::provisioning::{
    ConnectionTarget, ProvisioningService, TenantSpec, topology::DatabaseTopology,
};
use test_utils::{setup_seeded_control_plane, test_config};

async fn provision(
    db: &DatabaseConnection,
    slug: &str,
    topology: DatabaseTopology,
) -> tenancy::models::tenant::Model {
    let service = ProvisioningService::new(db.clone(), &test_config());
    service
        .create_tenant(TenantSpec {
            name: format!("{} Inc", slug),
            slug: slug.to_string(),
            topology,
            connection: None,
            url_prefix: None,
            admin_email: None,
        })
        .await
        .expect("tenant provisioned")
        .tenant
}

async fn table_exists(db: &DatabaseConnection, table: &str) -> bool {
    let stmt = Statement::from_string(
        db.get_database_backend(),
        format!(
            "SELECT EXISTS(SELECT 1 FROM sqlite_master WHERE type='table' AND name='{table}') AS present"
        ),
    );

    db.query_one(stmt)
        .await
        .ok()
        .flatten()
        .and_then(|row| row.try_get::<bool>("", "present").ok())
        .unwrap_or(false)
}

#[tokio::test]
async fn test_ensure_is_idempotent() {
    let db = setup_seeded_control_plane().await;
    let tenant = provision(&db, "acme", DatabaseTopology::Shared).await;
    let manager = FeatureTableManager::new(db.clone(), &test_config());

    let first = manager
        .ensure_feature_tables(&tenant, "fund_management")
        .await
        .unwrap();
    assert!(first.required);
    assert!(first.created);
    assert!(!first.already_existed);

    let second = manager
        .ensure_feature_tables(&tenant, "fund_management")
        .await
        .unwrap();
    assert!(second.required);
    assert!(!second.created);
    assert!(second.already_existed);

    assert!(table_exists(&db, "funds").await);
    assert!(table_exists(&db, "fund_transactions").await);
}

#[tokio::test]
async fn test_ensure_not_required_for_plain_features() {
    let db = setup_seeded_control_plane().await;
    let tenant = provision(&db, "acme", DatabaseTopology::Shared).await;
    let manager = FeatureTableManager::new(db.clone(), &test_config());

    let outcome = manager
        .ensure_feature_tables(&tenant, "member_portal")
        .await
        .unwrap();

    assert!(!outcome.required);
    assert!(!outcome.created);
    assert!(!outcome.already_existed);
}

#[tokio::test]
async fn test_concurrent_ensure_creates_exactly_once() {
    let db = setup_seeded_control_plane().await;
    let tenant = provision(&db, "acme", DatabaseTopology::Shared).await;
    let manager = Arc::new(FeatureTableManager::new(db.clone(), &test_config()));

    let mut handles = Vec::new();
    for _ in 0..4 {
        let manager = Arc::clone(&manager);
        let tenant = tenant.clone();
        handles.push(tokio::spawn(async move {
            manager
                .ensure_feature_tables(&tenant, "inventory_management")
                .await
        }));
    }

    let mut created = 0;
    let mut already_existed = 0;
    for handle in handles {
        let outcome = handle.await.unwrap().expect("no caller sees an error");
        if outcome.created {
            created += 1;
        }
        if outcome.already_existed {
            already_existed += 1;
        }
    }

    assert_eq!(created, 1);
    assert_eq!(already_existed, 3);
    assert!(table_exists(&db, "inventory_items").await);
}

#[tokio::test]
async fn test_gate_enable_then_disable_keeps_tables() {
    let db = setup_seeded_control_plane().await;
    let tenant = provision(&db, "acme", DatabaseTopology::Shared).await;
    let gate = TenantFeatureGate::new(db.clone(), &test_config());

    let enabled = gate
        .set_feature(tenant.id, "fund_management", true, None)
        .await
        .unwrap();
    assert!(enabled.is_enabled);
    assert!(enabled.tables.created);

    let disabled = gate
        .set_feature(tenant.id, "fund_management", false, None)
        .await
        .unwrap();
    assert!(!disabled.is_enabled);
    // Disable never drops tables
    assert!(table_exists(&db, "funds").await);

    let re_enabled = gate
        .set_feature(tenant.id, "fund_management", true, None)
        .await
        .unwrap();
    assert!(re_enabled.is_enabled);
    assert!(!re_enabled.tables.created);
    assert!(re_enabled.tables.already_existed);
}

#[tokio::test]
async fn test_gate_upserts_single_grant() {
    let db = setup_seeded_control_plane().await;
    let tenant = provision(&db, "acme", DatabaseTopology::Shared).await;
    let gate = TenantFeatureGate::new(db.clone(), &test_config());

    gate.set_feature(tenant.id, "advanced_reporting", true, None)
        .await
        .unwrap();
    gate.set_feature(tenant.id, "advanced_reporting", false, None)
        .await
        .unwrap();
    gate.set_feature(tenant.id, "advanced_reporting", true, None)
        .await
        .unwrap();

    let grants: Vec<_> = gate
        .list_grants(tenant.id)
        .await
        .unwrap()
        .into_iter()
        .filter(|grant| grant.is_enabled)
        .collect();

    // Toggling repeatedly never duplicates the (tenant, feature) pair
    assert_eq!(gate.list_grants(tenant.id).await.unwrap().len(), 1);
    assert_eq!(grants.len(), 1);
}

#[tokio::test]
async fn test_gate_unknown_feature() {
    let db = setup_seeded_control_plane().await;
    let tenant = provision(&db, "acme", DatabaseTopology::Shared).await;
    let gate = TenantFeatureGate::new(db.clone(), &test_config());

    let err = gate
        .set_feature(tenant.id, "time_travel", true, None)
        .await
        .unwrap_err();
    assert!(matches!(err, ProvisionError::FeatureNotFound(_)));
}

#[tokio::test]
async fn test_gate_rejects_gated_feature_without_database() {
    let db = setup_seeded_control_plane().await;
    let tenant = provision(&db, "acme", DatabaseTopology::None).await;
    let gate = TenantFeatureGate::new(db.clone(), &test_config());

    let err = gate
        .set_feature(tenant.id, "fund_management", true, None)
        .await
        .unwrap_err();
    assert!(matches!(err, ProvisionError::Connection { .. }));

    // The flag must not have flipped
    assert!(gate.list_grants(tenant.id).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_gate_unreachable_dedicated_target_leaves_flag_untouched() {
    let db = setup_seeded_control_plane().await;

    let service = ProvisioningService::new(db.clone(), &test_config());
    let tenant = service
        .create_tenant(TenantSpec {
            name: "Beta Inc".to_string(),
            slug: "beta".to_string(),
            topology: DatabaseTopology::DedicatedSelf,
            connection: Some(ConnectionTarget::Url(
                "postgres://beta@127.0.0.1:9/beta".to_string(),
            )),
            url_prefix: None,
            admin_email: None,
        })
        .await
        .unwrap()
        .tenant;

    let gate = TenantFeatureGate::new(db.clone(), &test_config());
    let err = gate
        .set_feature(tenant.id, "fund_management", true, None)
        .await
        .unwrap_err();

    assert!(matches!(err, ProvisionError::Connection { .. }));
    assert!(gate.list_grants(tenant.id).await.unwrap().is_empty());
    // No tables appeared in the control-plane store either
    assert!(!table_exists(&db, "funds").await);
}

#[tokio::test]
async fn test_gate_disable_works_without_reachable_database() {
    let db = setup_seeded_control_plane().await;
    let tenant = provision(&db, "acme", DatabaseTopology::Shared).await;
    let gate = TenantFeatureGate::new(db.clone(), &test_config());

    gate.set_feature(tenant.id, "fund_management", true, None)
        .await
        .unwrap();

    // Disabling is flag-only, so it must not touch the target database
    let disabled = gate
        .set_feature(tenant.id, "fund_management", false, None)
        .await
        .unwrap();
    assert!(!disabled.is_enabled);
    assert!(!disabled.tables.required);
}
