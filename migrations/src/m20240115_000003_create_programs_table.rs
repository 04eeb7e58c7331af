use sea_orm_migration::prelude::*;

pub struct Migration;

impl MigrationName for Migration {
    fn name(&self) -> &str {
        "m20240115_000003_create_programs_table"
    }
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Programs::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Programs::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Programs::Title).string_len(255).not_null())
                    .col(ColumnDef::new(Programs::Description).text().not_null())
                    .col(
                        ColumnDef::new(Programs::Price)
                            .decimal_len(19, 4)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Programs::OriginalPrice)
                            .decimal_len(19, 4)
                            .null(),
                    )
                    .col(ColumnDef::new(Programs::Level).string_len(20).not_null())
                    .col(
                        ColumnDef::new(Programs::Category)
                            .string_len(100)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Programs::Instructor)
                            .string_len(255)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Programs::Rating)
                            .decimal_len(4, 2)
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(Programs::StudentsCount)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(Programs::Duration)
                            .string_len(100)
                            .not_null(),
                    )
                    .col(ColumnDef::new(Programs::ImageUrl).string_len(1024).null())
                    .col(ColumnDef::new(Programs::Features).json().not_null())
                    .col(ColumnDef::new(Programs::Tags).json().not_null())
                    .col(
                        ColumnDef::new(Programs::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Programs::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_programs_category")
                    .table(Programs::Table)
                    .col(Programs::Category)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Programs::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum Programs {
    Table,
    Id,
    Title,
    Description,
    Price,
    OriginalPrice,
    Level,
    Category,
    Instructor,
    Rating,
    StudentsCount,
    Duration,
    ImageUrl,
    Features,
    Tags,
    CreatedAt,
    UpdatedAt,
}
