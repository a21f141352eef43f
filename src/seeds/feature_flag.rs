//! Feature catalog seeding
//!
//! Seeds the feature_flags table with the platform catalog at bootstrap.
//! Existing flags are left untouched, so the seed is safe to re-run on
//! every startup.

use anyhow::Result;
use chrono::Utc;
use sea_orm::{DatabaseConnection, Set};
use uuid::Uuid;

use crate::models::feature_flag;
use crate::repositories::FeatureFlagRepository;

struct FlagConfig {
    feature_key: &'static str,
    display_name: &'static str,
    description: &'static str,
    is_global: bool,
    default_enabled: bool,
}

/// Seeds the feature_flags table with the platform feature catalog
pub async fn seed_feature_flags(db: &DatabaseConnection) -> Result<()> {
    let repo = FeatureFlagRepository::new(db);

    let flags = vec![
        FlagConfig {
            feature_key: "fund_management",
            display_name: "Fund Management",
            description: "Track funds and fund transactions",
            is_global: true,
            default_enabled: false,
        },
        FlagConfig {
            feature_key: "inventory_management",
            display_name: "Inventory Management",
            description: "Track inventory items and stock movements",
            is_global: true,
            default_enabled: false,
        },
        FlagConfig {
            feature_key: "member_portal",
            display_name: "Member Portal",
            description: "Self-service portal for tenant members",
            is_global: true,
            default_enabled: true,
        },
        FlagConfig {
            feature_key: "advanced_reporting",
            display_name: "Advanced Reporting",
            description: "Extended report exports",
            is_global: false,
            default_enabled: false,
        },
    ];

    for flag_config in flags {
        match repo.find_by_key(flag_config.feature_key).await {
            Ok(Some(_)) => {
                log::info!(
                    "Feature flag '{}' already exists, skipping",
                    flag_config.feature_key
                );
                continue;
            }
            Ok(None) => {
                log::info!("Creating feature flag: {}", flag_config.feature_key);

                let flag = feature_flag::ActiveModel {
                    id: Set(Uuid::new_v4()),
                    feature_key: Set(flag_config.feature_key.to_string()),
                    display_name: Set(flag_config.display_name.to_string()),
                    description: Set(Some(flag_config.description.to_string())),
                    is_global: Set(flag_config.is_global),
                    default_enabled: Set(flag_config.default_enabled),
                    created_at: Set(Utc::now().into()),
                };

                if let Err(e) = repo.insert(flag).await {
                    log::error!(
                        "Failed to create feature flag '{}': {}",
                        flag_config.feature_key,
                        e
                    );
                    return Err(e.into());
                }
            }
            Err(e) => {
                log::error!(
                    "Error checking if feature flag '{}' exists: {}",
                    flag_config.feature_key,
                    e
                );
                return Err(e.into());
            }
        }
    }

    log::info!("Feature flag seeding completed successfully");
    Ok(())
}
