pub use sea_orm_migration::prelude::*;

pub mod entities;
mod m20250601_000001_users;
mod m20250601_000002_learning;
mod m20250601_000003_exams;
mod m20250601_000004_system_config;
mod relation_table;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20250601_000001_users::Migration),
            Box::new(m20250601_000002_learning::Migration),
            Box::new(m20250601_000003_exams::Migration),
            Box::new(m20250601_000004_system_config::Migration),
        ]
    }
}
