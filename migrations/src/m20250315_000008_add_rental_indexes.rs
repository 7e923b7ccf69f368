use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // Overlap scans filter by console and status, then compare the window
        manager
            .create_index(
                Index::create()
                    .name("idx_rentals_console_status_window")
                    .table(Rentals::Table)
                    .col(Rentals::ConsoleId)
                    .col(Rentals::Status)
                    .col(Rentals::StartDate)
                    .col(Rentals::EndDate)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_rentals_user_id")
                    .table(Rentals::Table)
                    .col(Rentals::UserId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_rentals_created_status")
                    .table(Rentals::Table)
                    .col((Rentals::CreatedAt, IndexOrder::Desc))
                    .col(Rentals::Status)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        for name in [
            "idx_rentals_console_status_window",
            "idx_rentals_user_id",
            "idx_rentals_created_status",
        ] {
            manager
                .drop_index(Index::drop().name(name).table(Rentals::Table).to_owned())
                .await?;
        }
        Ok(())
    }
}

#[derive(DeriveIden)]
enum Rentals {
    Table,
    ConsoleId,
    Status,
    StartDate,
    EndDate,
    UserId,
    CreatedAt,
}
