//! Migration to create the feature_flags table.
//!
//! Static feature catalog created at platform bootstrap.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(FeatureFlags::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(FeatureFlags::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(FeatureFlags::FeatureKey).text().not_null())
                    .col(ColumnDef::new(FeatureFlags::DisplayName).text().not_null())
                    .col(ColumnDef::new(FeatureFlags::Description).text().null())
                    .col(
                        ColumnDef::new(FeatureFlags::IsGlobal)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .col(
                        ColumnDef::new(FeatureFlags::DefaultEnabled)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(FeatureFlags::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_feature_flags_feature_key")
                    .table(FeatureFlags::Table)
                    .col(FeatureFlags::FeatureKey)
                    .unique()
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_index(
                Index::drop()
                    .name("idx_feature_flags_feature_key")
                    .to_owned(),
            )
            .await?;

        manager
            .drop_table(Table::drop().table(FeatureFlags::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum FeatureFlags {
    Table,
    Id,
    FeatureKey,
    DisplayName,
    Description,
    IsGlobal,
    DefaultEnabled,
    CreatedAt,
}
