//! Audit trail of runtime setting changes. Sensitive values are redacted
//! before they land here.

use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "config_history")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub config_key: String,
    #[sea_orm(column_type = "Text", nullable)]
    pub old_value: Option<String>,
    #[sea_orm(column_type = "Text")]
    pub new_value: String,
    pub changed_at: DateTimeUtc,
    /// Staff username, or `cli` for console changes.
    pub changed_by: Option<String>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::system_config::Entity",
        from = "Column::ConfigKey",
        to = "super::system_config::Column::Key",
        on_delete = "Cascade"
    )]
    Setting,
}

impl Related<super::system_config::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Setting.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
