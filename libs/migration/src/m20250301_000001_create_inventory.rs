use sea_orm_migration::sea_query::extension::postgres::Type;
use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // Stored by label so reordering the Rust enum never rewrites history
        manager
            .create_type(
                Type::create()
                    .as_enum(MovementKind::Enum)
                    .values([MovementKind::Entrada, MovementKind::Saida])
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Categories::Table)
                    .if_not_exists()
                    .col(pk_uuid(Categories::Id))
                    .col(string_len(Categories::Name, 100))
                    .col(text(Categories::Description).default(""))
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Products::Table)
                    .if_not_exists()
                    .col(pk_uuid(Products::Id))
                    .col(string_len(Products::Name, 200))
                    .col(text(Products::Description).default(""))
                    .col(
                        decimal_len(Products::Price, 12, 2)
                            .check(Expr::col(Products::Price).gte(0)),
                    )
                    .col(
                        integer(Products::Quantity)
                            .default(0)
                            .check(Expr::col(Products::Quantity).gte(0)),
                    )
                    .col(integer(Products::MinStock).default(0))
                    .col(boolean(Products::Active).default(true))
                    .col(
                        timestamp_with_time_zone(Products::RegisteredAt)
                            .default(Expr::current_timestamp()),
                    )
                    .col(uuid(Products::CategoryId))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_products_category_id")
                            .from(Products::Table, Products::CategoryId)
                            .to(Categories::Table, Categories::Id)
                            .on_delete(ForeignKeyAction::Restrict)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(StockMovements::Table)
                    .if_not_exists()
                    .col(pk_uuid(StockMovements::Id))
                    .col(uuid(StockMovements::ProductId))
                    .col(
                        ColumnDef::new(StockMovements::Kind)
                            .enumeration(
                                MovementKind::Enum,
                                [MovementKind::Entrada, MovementKind::Saida],
                            )
                            .not_null(),
                    )
                    .col(
                        integer(StockMovements::Quantity)
                            .check(Expr::col(StockMovements::Quantity).gt(0)),
                    )
                    .col(
                        timestamp_with_time_zone(StockMovements::OccurredAt)
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_stock_movements_product_id")
                            .from(StockMovements::Table, StockMovements::ProductId)
                            .to(Products::Table, Products::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Case-insensitive uniqueness needs an expression index
        manager
            .get_connection()
            .execute_unprepared(
                r#"
                CREATE UNIQUE INDEX IF NOT EXISTS unique_categories_name_lower
                    ON categories (lower(name));
                CREATE UNIQUE INDEX IF NOT EXISTS unique_products_name_lower
                    ON products (lower(name));
                "#,
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_products_category_id")
                    .table(Products::Table)
                    .col(Products::CategoryId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_stock_movements_product_id")
                    .table(StockMovements::Table)
                    .col(StockMovements::ProductId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_stock_movements_occurred_at")
                    .table(StockMovements::Table)
                    .col(StockMovements::OccurredAt)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(StockMovements::Table).to_owned())
            .await?;

        manager
            .drop_table(Table::drop().table(Products::Table).to_owned())
            .await?;

        manager
            .drop_table(Table::drop().table(Categories::Table).to_owned())
            .await?;

        manager
            .drop_type(Type::drop().name(MovementKind::Enum).to_owned())
            .await?;

        Ok(())
    }
}

#[derive(DeriveIden)]
enum Categories {
    Table,
    Id,
    Name,
    Description,
}

#[derive(DeriveIden)]
enum Products {
    Table,
    Id,
    Name,
    Description,
    Price,
    Quantity,
    MinStock,
    Active,
    RegisteredAt,
    CategoryId,
}

#[derive(DeriveIden)]
enum StockMovements {
    Table,
    Id,
    ProductId,
    Kind,
    Quantity,
    OccurredAt,
}

#[derive(DeriveIden)]
enum MovementKind {
    #[sea_orm(iden = "movement_kind")]
    Enum,
    #[sea_orm(iden = "Entrada")]
    Entrada,
    #[sea_orm(iden = "Saida")]
    Saida,
}
