use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(ServiceBookings::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(ServiceBookings::Id)
                            .uuid()
                            .primary_key()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(ServiceBookings::CustomerName)
                            .string()
                            .not_null(),
                    )
                    .col(ColumnDef::new(ServiceBookings::Email).string().null())
                    .col(ColumnDef::new(ServiceBookings::Phone).string().not_null())
                    .col(
                        ColumnDef::new(ServiceBookings::DeviceCategory)
                            .string_len(50)
                            .not_null(),
                    )
                    .col(ColumnDef::new(ServiceBookings::Issue).text().not_null())
                    .col(
                        ColumnDef::new(ServiceBookings::Status)
                            .string_len(20)
                            .not_null()
                            .default("PENDING"),
                    )
                    .col(
                        ColumnDef::new(ServiceBookings::ScheduledFor)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(ServiceBookings::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(ServiceBookings::UpdatedAt)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(ServiceBookings::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum ServiceBookings {
    Table,
    Id,
    CustomerName,
    Email,
    Phone,
    DeviceCategory,
    Issue,
    Status,
    ScheduledFor,
    CreatedAt,
    UpdatedAt,
}
