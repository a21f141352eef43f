//! Migration to create the tenant_features table.
//!
//! Join table holding per-tenant feature grants and enabled flags. The
//! (tenant_id, feature_id) pair is unique so grants are upsert-only.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(TenantFeatures::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(TenantFeatures::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(TenantFeatures::TenantId).uuid().not_null())
                    .col(ColumnDef::new(TenantFeatures::FeatureId).uuid().not_null())
                    .col(
                        ColumnDef::new(TenantFeatures::IsEnabled)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(ColumnDef::new(TenantFeatures::Settings).json_binary().null())
                    .col(
                        ColumnDef::new(TenantFeatures::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(TenantFeatures::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_tenant_features_tenant_id")
                            .from(TenantFeatures::Table, TenantFeatures::TenantId)
                            .to(Tenants::Table, Tenants::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_tenant_features_feature_id")
                            .from(TenantFeatures::Table, TenantFeatures::FeatureId)
                            .to(FeatureFlags::Table, FeatureFlags::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_tenant_features_tenant_feature")
                    .table(TenantFeatures::Table)
                    .col(TenantFeatures::TenantId)
                    .col(TenantFeatures::FeatureId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        // Index on tenant_id for per-tenant grant listings
        manager
            .create_index(
                Index::create()
                    .name("idx_tenant_features_tenant_id")
                    .table(TenantFeatures::Table)
                    .col(TenantFeatures::TenantId)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_index(
                Index::drop()
                    .name("idx_tenant_features_tenant_id")
                    .to_owned(),
            )
            .await?;

        manager
            .drop_index(
                Index::drop()
                    .name("idx_tenant_features_tenant_feature")
                    .to_owned(),
            )
            .await?;

        manager
            .drop_table(Table::drop().table(TenantFeatures::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum TenantFeatures {
    Table,
    Id,
    TenantId,
    FeatureId,
    IsEnabled,
    Settings,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum Tenants {
    Table,
    Id,
}

#[derive(DeriveIden)]
enum FeatureFlags {
    Table,
    Id,
}
