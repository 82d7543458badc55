use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Stocks::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Stocks::Id).uuid().not_null().primary_key())
                    .col(
                        ColumnDef::new(Stocks::Code)
                            .string_len(100)
                            .not_null()
                            .unique_key(),
                    )
                    .col(ColumnDef::new(Stocks::ProductId).uuid().not_null())
                    .col(ColumnDef::new(Stocks::WarehouseId).uuid().not_null())
                    .col(
                        ColumnDef::new(Stocks::Quantity)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(Stocks::UnitPrice)
                            .decimal_len(10, 2)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Stocks::IsActive)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .col(ColumnDef::new(Stocks::ExpiresAt).date().null())
                    .col(
                        ColumnDef::new(Stocks::Threshold)
                            .integer()
                            .not_null()
                            .default(5),
                    )
                    .col(ColumnDef::new(Stocks::CreatedAt).timestamp().not_null())
                    .col(ColumnDef::new(Stocks::UpdatedAt).timestamp().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_stocks_product_id")
                            .from(Stocks::Table, Stocks::ProductId)
                            .to(Products::Table, Products::Id)
                            .on_delete(ForeignKeyAction::Restrict),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_stocks_warehouse_id")
                            .from(Stocks::Table, Stocks::WarehouseId)
                            .to(Warehouses::Table, Warehouses::Id)
                            .on_delete(ForeignKeyAction::Restrict),
                    )
                    .to_owned(),
            )
            .await?;

        // At most one active row per (product, warehouse); inactive rows may
        // pile up as stocks are retired and re-created. Raw SQL because the
        // index builder has no partial-index support; the WHERE syntax is
        // shared by SQLite and Postgres.
        manager
            .get_connection()
            .execute_unprepared(
                "CREATE UNIQUE INDEX idx_stocks_active_product_warehouse \
                 ON stocks (product_id, warehouse_id) WHERE is_active",
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_stocks_warehouse_id")
                    .table(Stocks::Table)
                    .col(Stocks::WarehouseId)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Stocks::Table).to_owned())
            .await?;
        Ok(())
    }
}

#[derive(Iden)]
enum Stocks {
    Table,
    Id,
    Code,
    ProductId,
    WarehouseId,
    Quantity,
    UnitPrice,
    IsActive,
    ExpiresAt,
    Threshold,
    CreatedAt,
    UpdatedAt,
}

#[derive(Iden)]
enum Products {
    Table,
    Id,
}

#[derive(Iden)]
enum Warehouses {
    Table,
    Id,
}
