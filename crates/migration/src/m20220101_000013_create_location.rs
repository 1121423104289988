//! Create `location` table: at most one coordinate per technician.
//! Technicians without a row are excluded from proximity search.
use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Location::Table)
                    .if_not_exists()
                    .col(uuid(Location::Id).primary_key())
                    .col(uuid(Location::TechnicianId).unique_key().not_null())
                    .col(double(Location::Lat).not_null())
                    .col(double(Location::Lng).not_null())
                    .col(timestamp_with_time_zone(Location::LastUpdatedAt).not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_location_technician")
                            .from(Location::Table, Location::TechnicianId)
                            .to(Technician::Table, Technician::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager.drop_table(Table::drop().table(Location::Table).to_owned()).await
    }
}

#[derive(DeriveIden)]
enum Location { Table, Id, TechnicianId, Lat, Lng, LastUpdatedAt }

#[derive(DeriveIden)]
enum Technician { Table, Id }
