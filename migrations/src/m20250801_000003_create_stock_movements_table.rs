use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(StockMovements::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(StockMovements::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(StockMovements::Operation)
                            .string_len(16)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(StockMovements::Structure)
                            .string_len(16)
                            .not_null(),
                    )
                    .col(ColumnDef::new(StockMovements::Quantity).integer().not_null())
                    .col(
                        ColumnDef::new(StockMovements::Motive)
                            .string_len(80)
                            .not_null(),
                    )
                    .col(ColumnDef::new(StockMovements::Description).text().null())
                    .col(ColumnDef::new(StockMovements::CreatedBy).uuid().not_null())
                    .col(ColumnDef::new(StockMovements::StockOneId).uuid().not_null())
                    .col(ColumnDef::new(StockMovements::StockTwoId).uuid().null())
                    .col(
                        ColumnDef::new(StockMovements::CreatedAt)
                            .timestamp()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_stock_movements_stock_one_id")
                            .from(StockMovements::Table, StockMovements::StockOneId)
                            .to(Stocks::Table, Stocks::Id)
                            .on_delete(ForeignKeyAction::Restrict),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_stock_movements_stock_two_id")
                            .from(StockMovements::Table, StockMovements::StockTwoId)
                            .to(Stocks::Table, Stocks::Id)
                            .on_delete(ForeignKeyAction::Restrict),
                    )
                    .to_owned(),
            )
            .await?;

        // History listings filter on either stock reference, newest first
        manager
            .create_index(
                Index::create()
                    .name("idx_stock_movements_stock_one_id")
                    .table(StockMovements::Table)
                    .col(StockMovements::StockOneId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_stock_movements_stock_two_id")
                    .table(StockMovements::Table)
                    .col(StockMovements::StockTwoId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_stock_movements_created_at")
                    .table(StockMovements::Table)
                    .col((StockMovements::CreatedAt, IndexOrder::Desc))
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(StockMovements::Table).to_owned())
            .await?;
        Ok(())
    }
}

#[derive(Iden)]
enum StockMovements {
    Table,
    Id,
    Operation,
    Structure,
    Quantity,
    Motive,
    Description,
    CreatedBy,
    StockOneId,
    StockTwoId,
    CreatedAt,
}

#[derive(Iden)]
enum Stocks {
    Table,
    Id,
}
