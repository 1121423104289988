//! Listing and lookup indexes. Applied after every table exists.
//!
//! Cursor pagination seeks on `(created_at, id)`, so each listed table gets
//! that composite; bounding-box discovery ranges over `(lat, lng)`.
use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_index(
                Index::create()
                    .name("idx_user_created_id")
                    .table(User::Table)
                    .col(User::CreatedAt)
                    .col(User::Id)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_technician_created_id")
                    .table(Technician::Table)
                    .col(Technician::CreatedAt)
                    .col(Technician::Id)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_service_category_created_id")
                    .table(ServiceCategory::Table)
                    .col(ServiceCategory::CreatedAt)
                    .col(ServiceCategory::Id)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_service_created_id")
                    .table(Service::Table)
                    .col(Service::CreatedAt)
                    .col(Service::Id)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_review_created_id")
                    .table(Review::Table)
                    .col(Review::CreatedAt)
                    .col(Review::Id)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_bookmark_created_id")
                    .table(Bookmark::Table)
                    .col(Bookmark::CreatedAt)
                    .col(Bookmark::Id)
                    .to_owned(),
            )
            .await?;

        // Service categories list by name
        manager
            .create_index(
                Index::create()
                    .name("idx_service_category_name_id")
                    .table(ServiceCategory::Table)
                    .col(ServiceCategory::Name)
                    .col(ServiceCategory::Id)
                    .to_owned(),
            )
            .await?;

        // Foreign-key lookups used by listing filters
        manager
            .create_index(
                Index::create()
                    .name("idx_service_technician")
                    .table(Service::Table)
                    .col(Service::TechnicianId)
                    .to_owned(),
            )
            .await?;
        manager
            .create_index(
                Index::create()
                    .name("idx_review_technician")
                    .table(Review::Table)
                    .col(Review::TechnicianId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_location_lat_lng")
                    .table(Location::Table)
                    .col(Location::Lat)
                    .col(Location::Lng)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager.drop_index(Index::drop().name("idx_user_created_id").table(User::Table).to_owned()).await?;
        manager.drop_index(Index::drop().name("idx_technician_created_id").table(Technician::Table).to_owned()).await?;
        manager.drop_index(Index::drop().name("idx_service_category_created_id").table(ServiceCategory::Table).to_owned()).await?;
        manager.drop_index(Index::drop().name("idx_service_created_id").table(Service::Table).to_owned()).await?;
        manager.drop_index(Index::drop().name("idx_review_created_id").table(Review::Table).to_owned()).await?;
        manager.drop_index(Index::drop().name("idx_bookmark_created_id").table(Bookmark::Table).to_owned()).await?;
        manager.drop_index(Index::drop().name("idx_service_category_name_id").table(ServiceCategory::Table).to_owned()).await?;
        manager.drop_index(Index::drop().name("idx_service_technician").table(Service::Table).to_owned()).await?;
        manager.drop_index(Index::drop().name("idx_review_technician").table(Review::Table).to_owned()).await?;
        manager.drop_index(Index::drop().name("idx_location_lat_lng").table(Location::Table).to_owned()).await?;
        Ok(())
    }
}

#[derive(DeriveIden)]
enum User { Table, Id, CreatedAt }

#[derive(DeriveIden)]
enum Technician { Table, Id, CreatedAt }

#[derive(DeriveIden)]
enum ServiceCategory { Table, Id, Name, CreatedAt }

#[derive(DeriveIden)]
enum Service { Table, Id, TechnicianId, CreatedAt }

#[derive(DeriveIden)]
enum Review { Table, Id, TechnicianId, CreatedAt }

#[derive(DeriveIden)]
enum Bookmark { Table, Id, CreatedAt }

#[derive(DeriveIden)]
enum Location { Table, Lat, Lng }
