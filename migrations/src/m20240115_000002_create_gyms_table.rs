use sea_orm_migration::prelude::*;

pub struct Migration;

impl MigrationName for Migration {
    fn name(&self) -> &str {
        "m20240115_000002_create_gyms_table"
    }
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Gyms::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Gyms::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(Gyms::Name).string_len(255).not_null())
                    .col(ColumnDef::new(Gyms::City).string_len(100).not_null())
                    .col(ColumnDef::new(Gyms::Address).string_len(512).not_null())
                    .col(ColumnDef::new(Gyms::Description).text().not_null())
                    .col(ColumnDef::new(Gyms::ImageUrl).string_len(1024).null())
                    .col(ColumnDef::new(Gyms::Phone).string_len(30).null())
                    .col(
                        ColumnDef::new(Gyms::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Gyms::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Gyms::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum Gyms {
    Table,
    Id,
    Name,
    City,
    Address,
    Description,
    ImageUrl,
    Phone,
    CreatedAt,
    UpdatedAt,
}
