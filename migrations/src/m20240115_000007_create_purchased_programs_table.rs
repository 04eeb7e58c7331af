use sea_orm_migration::prelude::*;

pub struct Migration;

impl MigrationName for Migration {
    fn name(&self) -> &str {
        "m20240115_000007_create_purchased_programs_table"
    }
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(PurchasedPrograms::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(PurchasedPrograms::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(PurchasedPrograms::UserId).uuid().not_null())
                    .col(
                        ColumnDef::new(PurchasedPrograms::ProgramId)
                            .uuid()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(PurchasedPrograms::PaymentId)
                            .uuid()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(PurchasedPrograms::GrantedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_purchased_programs_payment_id")
                            .from(PurchasedPrograms::Table, PurchasedPrograms::PaymentId)
                            .to(Payments::Table, Payments::Id),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_purchased_programs_user_id")
                    .table(PurchasedPrograms::Table)
                    .col(PurchasedPrograms::UserId)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(PurchasedPrograms::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum PurchasedPrograms {
    Table,
    Id,
    UserId,
    ProgramId,
    PaymentId,
    GrantedAt,
}

#[derive(Iden)]
enum Payments {
    Table,
    Id,
}
