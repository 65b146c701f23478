//! Runtime settings editable by staff, with an audit trail.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager.create_table(settings_table()).await?;
        manager.create_table(history_table()).await?;

        // History is always read per key, newest first.
        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_config_history_key_time")
                    .table(ConfigHistory::Table)
                    .col(ConfigHistory::ConfigKey)
                    .col(ConfigHistory::ChangedAt)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(ConfigHistory::Table).if_exists().to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(SystemConfig::Table).if_exists().to_owned())
            .await
    }
}

fn flag(column: impl IntoIden) -> ColumnDef {
    ColumnDef::new(column)
        .boolean()
        .not_null()
        .default(false)
        .to_owned()
}

fn settings_table() -> TableCreateStatement {
    Table::create()
        .table(SystemConfig::Table)
        .if_not_exists()
        .col(
            ColumnDef::new(SystemConfig::Key)
                .string_len(64)
                .not_null()
                .primary_key(),
        )
        .col(ColumnDef::new(SystemConfig::Value).text().not_null())
        .col(
            ColumnDef::new(SystemConfig::ValueType)
                .string_len(16)
                .not_null()
                .default("string"),
        )
        .col(flag(SystemConfig::RequiresRestart))
        .col(flag(SystemConfig::IsSensitive))
        .col(
            ColumnDef::new(SystemConfig::UpdatedAt)
                .timestamp_with_time_zone()
                .not_null(),
        )
        .to_owned()
}

fn history_table() -> TableCreateStatement {
    Table::create()
        .table(ConfigHistory::Table)
        .if_not_exists()
        .col(
            ColumnDef::new(ConfigHistory::Id)
                .integer()
                .not_null()
                .auto_increment()
                .primary_key(),
        )
        .col(
            ColumnDef::new(ConfigHistory::ConfigKey)
                .string_len(64)
                .not_null(),
        )
        .col(ColumnDef::new(ConfigHistory::OldValue).text().null())
        .col(ColumnDef::new(ConfigHistory::NewValue).text().not_null())
        .col(
            ColumnDef::new(ConfigHistory::ChangedAt)
                .timestamp_with_time_zone()
                .not_null(),
        )
        .col(
            ColumnDef::new(ConfigHistory::ChangedBy)
                .string_len(150)
                .null(),
        )
        .foreign_key(
            ForeignKey::create()
                .name("fk_config_history_setting")
                .from(ConfigHistory::Table, ConfigHistory::ConfigKey)
                .to(SystemConfig::Table, SystemConfig::Key)
                .on_delete(ForeignKeyAction::Cascade),
        )
        .to_owned()
}

#[derive(DeriveIden)]
enum SystemConfig {
    #[sea_orm(iden = "system_config")]
    Table,
    Key,
    Value,
    ValueType,
    RequiresRestart,
    IsSensitive,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum ConfigHistory {
    #[sea_orm(iden = "config_history")]
    Table,
    Id,
    ConfigKey,
    OldValue,
    NewValue,
    ChangedAt,
    ChangedBy,
}
