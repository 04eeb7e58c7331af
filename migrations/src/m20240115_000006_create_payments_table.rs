use sea_orm_migration::prelude::*;

pub struct Migration;

impl MigrationName for Migration {
    fn name(&self) -> &str {
        "m20240115_000006_create_payments_table"
    }
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Payments::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Payments::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Payments::UserId).uuid().not_null())
                    .col(
                        ColumnDef::new(Payments::OrderId)
                            .string_len(255)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Payments::PaymentId)
                            .string_len(255)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Payments::Signature)
                            .string_len(512)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Payments::Amount)
                            .decimal_len(19, 4)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Payments::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        // A provider callback may be delivered more than once; the unique pair
        // makes replays detectable at insert time.
        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_payments_order_payment")
                    .table(Payments::Table)
                    .col(Payments::OrderId)
                    .col(Payments::PaymentId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_payments_user_id")
                    .table(Payments::Table)
                    .col(Payments::UserId)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Payments::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum Payments {
    Table,
    Id,
    UserId,
    OrderId,
    PaymentId,
    Signature,
    Amount,
    CreatedAt,
}
