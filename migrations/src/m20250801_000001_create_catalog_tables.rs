use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Stores::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Stores::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(Stores::Name).string_len(255).not_null())
                    .col(ColumnDef::new(Stores::Address).text().not_null())
                    .col(ColumnDef::new(Stores::CreatedAt).timestamp().not_null())
                    .col(ColumnDef::new(Stores::UpdatedAt).timestamp().not_null())
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Warehouses::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Warehouses::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Warehouses::StoreId).uuid().not_null())
                    .col(ColumnDef::new(Warehouses::Name).string_len(255).not_null())
                    .col(ColumnDef::new(Warehouses::Address).text().not_null())
                    .col(ColumnDef::new(Warehouses::CreatedAt).timestamp().not_null())
                    .col(ColumnDef::new(Warehouses::UpdatedAt).timestamp().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_warehouses_store_id")
                            .from(Warehouses::Table, Warehouses::StoreId)
                            .to(Stores::Table, Stores::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_warehouses_store_id")
                    .table(Warehouses::Table)
                    .col(Warehouses::StoreId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Products::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Products::Id).uuid().not_null().primary_key())
                    .col(
                        ColumnDef::new(Products::Code)
                            .string_len(100)
                            .not_null()
                            .unique_key(),
                    )
                    .col(ColumnDef::new(Products::Name).string_len(255).not_null())
                    .col(ColumnDef::new(Products::CreatedAt).timestamp().not_null())
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Products::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Warehouses::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Stores::Table).to_owned())
            .await?;
        Ok(())
    }
}

#[derive(Iden)]
enum Stores {
    Table,
    Id,
    Name,
    Address,
    CreatedAt,
    UpdatedAt,
}

#[derive(Iden)]
enum Warehouses {
    Table,
    Id,
    StoreId,
    Name,
    Address,
    CreatedAt,
    UpdatedAt,
}

#[derive(Iden)]
enum Products {
    Table,
    Id,
    Code,
    Name,
    CreatedAt,
}
