//! Shared builder for the user/target reaction tables.
//!
//! Every reaction table has the same shape: a user, a target, a reward
//! snapshot and a creation date, unique per (user, target).

use sea_orm_migration::prelude::*;

pub async fn create_relation_table(
    manager: &SchemaManager<'_>,
    table: &str,
    target_column: &str,
    target_table: &str,
) -> Result<(), DbErr> {
    manager
        .create_table(
            Table::create()
                .table(Alias::new(table))
                .if_not_exists()
                .col(
                    ColumnDef::new(Alias::new("id"))
                        .integer()
                        .not_null()
                        .auto_increment()
                        .primary_key(),
                )
                .col(ColumnDef::new(Alias::new("user_id")).integer().not_null())
                .col(ColumnDef::new(Alias::new(target_column)).integer().not_null())
                .col(
                    ColumnDef::new(Alias::new("score"))
                        .integer()
                        .not_null()
                        .default(0),
                )
                .col(
                    ColumnDef::new(Alias::new("coin"))
                        .integer()
                        .not_null()
                        .default(0),
                )
                .col(
                    ColumnDef::new(Alias::new("create_date"))
                        .timestamp_with_time_zone()
                        .not_null(),
                )
                .foreign_key(
                    ForeignKey::create()
                        .name(format!("fk_{table}_user"))
                        .from(Alias::new(table), Alias::new("user_id"))
                        .to(Alias::new("users"), Alias::new("id"))
                        .on_delete(ForeignKeyAction::Cascade),
                )
                .foreign_key(
                    ForeignKey::create()
                        .name(format!("fk_{table}_target"))
                        .from(Alias::new(table), Alias::new(target_column))
                        .to(Alias::new(target_table), Alias::new("id"))
                        .on_delete(ForeignKeyAction::Cascade),
                )
                .to_owned(),
        )
        .await?;

    manager
        .create_index(
            Index::create()
                .if_not_exists()
                .name(format!("uq_{table}_user_target"))
                .table(Alias::new(table))
                .col(Alias::new("user_id"))
                .col(Alias::new(target_column))
                .unique()
                .to_owned(),
        )
        .await
}

pub async fn drop_relation_table(manager: &SchemaManager<'_>, table: &str) -> Result<(), DbErr> {
    manager
        .drop_table(Table::drop().table(Alias::new(table)).if_exists().to_owned())
        .await
}
