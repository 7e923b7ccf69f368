use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Rentals::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Rentals::Id).uuid().primary_key().not_null())
                    .col(ColumnDef::new(Rentals::UserId).string().not_null())
                    .col(ColumnDef::new(Rentals::ConsoleId).uuid().not_null())
                    .col(ColumnDef::new(Rentals::ProductId).uuid().null())
                    .col(ColumnDef::new(Rentals::PlanId).string().null())
                    .col(
                        ColumnDef::new(Rentals::StartDate)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Rentals::EndDate)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Rentals::Status)
                            .string_len(20)
                            .not_null()
                            .default("Pending"),
                    )
                    .col(
                        ColumnDef::new(Rentals::PaymentStatus)
                            .string_len(20)
                            .not_null()
                            .default("pending"),
                    )
                    .col(
                        ColumnDef::new(Rentals::TotalPrice)
                            .decimal_len(12, 2)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Rentals::DeliveryType)
                            .string_len(20)
                            .not_null()
                            .default("DELIVERY"),
                    )
                    .col(ColumnDef::new(Rentals::Address).text().null())
                    .col(ColumnDef::new(Rentals::Notes).text().null())
                    .col(ColumnDef::new(Rentals::Addons).json().null())
                    .col(
                        ColumnDef::new(Rentals::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Rentals::UpdatedAt)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_rentals_console_id")
                            .from(Rentals::Table, Rentals::ConsoleId)
                            .to(Consoles::Table, Consoles::Id)
                            .on_delete(ForeignKeyAction::Restrict),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Rentals::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum Rentals {
    Table,
    Id,
    UserId,
    ConsoleId,
    ProductId,
    PlanId,
    StartDate,
    EndDate,
    Status,
    PaymentStatus,
    TotalPrice,
    DeliveryType,
    Address,
    Notes,
    Addons,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum Consoles {
    Table,
    Id,
}
