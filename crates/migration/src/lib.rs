//! Migrator registering entity-specific migrations in dependency order.
//! Indexes are applied last.
pub use sea_orm_migration::prelude::*;

mod m20220101_000011_create_user;
mod m20220101_000012_create_technician;
mod m20220101_000013_create_location;
mod m20220101_000014_create_service_category;
mod m20220101_000015_create_service;
mod m20220101_000016_create_review;
mod m20220101_000017_create_bookmark;
mod m20220101_000002_add_indexes;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20220101_000011_create_user::Migration),
            Box::new(m20220101_000012_create_technician::Migration),
            Box::new(m20220101_000013_create_location::Migration),
            Box::new(m20220101_000014_create_service_category::Migration),
            Box::new(m20220101_000015_create_service::Migration),
            Box::new(m20220101_000016_create_review::Migration),
            Box::new(m20220101_000017_create_bookmark::Migration),
            // Indexes should always be applied last
            Box::new(m20220101_000002_add_indexes::Migration),
        ]
    }
}
