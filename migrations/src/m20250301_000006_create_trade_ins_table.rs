use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(TradeIns::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(TradeIns::Id).uuid().primary_key().not_null())
                    .col(ColumnDef::new(TradeIns::UserId).string().null())
                    .col(ColumnDef::new(TradeIns::CustomerName).string().not_null())
                    .col(ColumnDef::new(TradeIns::Phone).string().not_null())
                    .col(
                        ColumnDef::new(TradeIns::DeviceCategory)
                            .string_len(50)
                            .not_null(),
                    )
                    .col(ColumnDef::new(TradeIns::Condition).string().not_null())
                    .col(ColumnDef::new(TradeIns::OfferedPrice).decimal_len(12, 2).null())
                    .col(
                        ColumnDef::new(TradeIns::Status)
                            .string_len(20)
                            .not_null()
                            .default("SUBMITTED"),
                    )
                    .col(
                        ColumnDef::new(TradeIns::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(TradeIns::UpdatedAt)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(TradeIns::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum TradeIns {
    Table,
    Id,
    UserId,
    CustomerName,
    Phone,
    DeviceCategory,
    Condition,
    OfferedPrice,
    Status,
    CreatedAt,
    UpdatedAt,
}
