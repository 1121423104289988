//! Create `technician` table with FK to `user` (one technician profile per user).
use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Technician::Table)
                    .if_not_exists()
                    .col(uuid(Technician::Id).primary_key())
                    .col(uuid(Technician::UserId).unique_key().not_null())
                    .col(string_len(Technician::Profession, 128).not_null())
                    .col(ColumnDef::new(Technician::BusinessName).string_len(255).null())
                    .col(ColumnDef::new(Technician::Bio).text().null())
                    .col(ColumnDef::new(Technician::ProfilePicture).string_len(512).null())
                    .col(ColumnDef::new(Technician::YearsExperience).integer().null())
                    .col(string_len(Technician::Availability, 16).not_null())
                    .col(timestamp_with_time_zone(Technician::CreatedAt).not_null())
                    .col(timestamp_with_time_zone(Technician::UpdatedAt).not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_technician_user")
                            .from(Technician::Table, Technician::UserId)
                            .to(User::Table, User::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager.drop_table(Table::drop().table(Technician::Table).to_owned()).await
    }
}

#[derive(DeriveIden)]
enum Technician {
    Table,
    Id,
    UserId,
    Profession,
    BusinessName,
    Bio,
    ProfilePicture,
    YearsExperience,
    Availability,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum User { Table, Id }
