use sea_orm_migration::prelude::*;

pub struct Migration;

impl MigrationName for Migration {
    fn name(&self) -> &str {
        "m20240115_000005_create_cart_items_table"
    }
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(CartItems::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(CartItems::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(CartItems::CartId).uuid().not_null())
                    .col(ColumnDef::new(CartItems::ProgramId).uuid().not_null())
                    .col(ColumnDef::new(CartItems::Title).string_len(255).not_null())
                    .col(
                        ColumnDef::new(CartItems::UnitPrice)
                            .decimal_len(19, 4)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(CartItems::OriginalPrice)
                            .decimal_len(19, 4)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(CartItems::Duration)
                            .string_len(100)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(CartItems::Instructor)
                            .string_len(255)
                            .not_null(),
                    )
                    .col(ColumnDef::new(CartItems::ImageUrl).string_len(1024).null())
                    .col(
                        ColumnDef::new(CartItems::Category)
                            .string_len(100)
                            .not_null(),
                    )
                    .col(ColumnDef::new(CartItems::Quantity).integer().not_null())
                    .col(
                        ColumnDef::new(CartItems::LineTotal)
                            .decimal_len(19, 4)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(CartItems::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(CartItems::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_cart_items_cart_id")
                            .from(CartItems::Table, CartItems::CartId)
                            .to(Carts::Table, Carts::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Line items are keyed by (cart, program)
        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_cart_items_cart_program")
                    .table(CartItems::Table)
                    .col(CartItems::CartId)
                    .col(CartItems::ProgramId)
                    .unique()
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(CartItems::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum CartItems {
    Table,
    Id,
    CartId,
    ProgramId,
    Title,
    UnitPrice,
    OriginalPrice,
    Duration,
    Instructor,
    ImageUrl,
    Category,
    Quantity,
    LineTotal,
    CreatedAt,
    UpdatedAt,
}

#[derive(Iden)]
enum Carts {
    Table,
    Id,
}
