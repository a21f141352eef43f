//! Migration to create the tenants table.
//!
//! This migration creates the baseline tenants table holding identity,
//! database topology, connection target fields and routing prefix.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Tenants::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Tenants::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(Tenants::Name).text().not_null())
                    .col(ColumnDef::new(Tenants::Slug).text().not_null())
                    .col(ColumnDef::new(Tenants::UrlPrefix).text().not_null())
                    .col(
                        ColumnDef::new(Tenants::DatabaseTopology)
                            .text()
                            .not_null()
                            .default("none"),
                    )
                    .col(
                        ColumnDef::new(Tenants::DatabaseStatus)
                            .text()
                            .not_null()
                            .default("not_configured"),
                    )
                    .col(
                        ColumnDef::new(Tenants::CanEditDatabase)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .col(ColumnDef::new(Tenants::ManagedBy).text().null())
                    .col(ColumnDef::new(Tenants::DbHost).text().null())
                    .col(ColumnDef::new(Tenants::DbPort).integer().null())
                    .col(ColumnDef::new(Tenants::DbName).text().null())
                    .col(ColumnDef::new(Tenants::DbUser).text().null())
                    .col(
                        ColumnDef::new(Tenants::DbSecretCiphertext)
                            .binary()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(Tenants::DbSsl)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(ColumnDef::new(Tenants::DbUrl).text().null())
                    .col(
                        ColumnDef::new(Tenants::LastCheckedAt)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .col(ColumnDef::new(Tenants::LastError).text().null())
                    .col(
                        ColumnDef::new(Tenants::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(Tenants::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await?;

        // Slug is the external identity; url_prefix backs the routing URL.
        // Both must be globally unique.
        manager
            .create_index(
                Index::create()
                    .name("idx_tenants_slug")
                    .table(Tenants::Table)
                    .col(Tenants::Slug)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_tenants_url_prefix")
                    .table(Tenants::Table)
                    .col(Tenants::UrlPrefix)
                    .unique()
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_index(Index::drop().name("idx_tenants_url_prefix").to_owned())
            .await?;

        manager
            .drop_index(Index::drop().name("idx_tenants_slug").to_owned())
            .await?;

        manager
            .drop_table(Table::drop().table(Tenants::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum Tenants {
    Table,
    Id,
    Name,
    Slug,
    UrlPrefix,
    DatabaseTopology,
    DatabaseStatus,
    CanEditDatabase,
    ManagedBy,
    DbHost,
    DbPort,
    DbName,
    DbUser,
    DbSecretCiphertext,
    DbSsl,
    DbUrl,
    LastCheckedAt,
    LastError,
    CreatedAt,
    UpdatedAt,
}
