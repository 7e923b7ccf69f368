use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Consoles::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Consoles::Id).uuid().primary_key().not_null())
                    .col(
                        ColumnDef::new(Consoles::UnitId)
                            .string_len(64)
                            .not_null()
                            .unique_key(),
                    )
                    .col(ColumnDef::new(Consoles::Category).string_len(50).not_null())
                    .col(
                        ColumnDef::new(Consoles::Status)
                            .string_len(20)
                            .not_null()
                            .default("ACTIVE"),
                    )
                    .col(ColumnDef::new(Consoles::Notes).text().null())
                    .col(
                        ColumnDef::new(Consoles::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Consoles::UpdatedAt)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_consoles_category_status")
                    .table(Consoles::Table)
                    .col(Consoles::Category)
                    .col(Consoles::Status)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Consoles::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum Consoles {
    Table,
    Id,
    UnitId,
    Category,
    Status,
    Notes,
    CreatedAt,
    UpdatedAt,
}
