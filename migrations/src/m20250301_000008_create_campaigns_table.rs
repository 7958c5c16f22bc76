use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(MarketingCampaigns::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(MarketingCampaigns::Id)
                            .uuid()
                            .primary_key()
                            .not_null(),
                    )
                    .col(ColumnDef::new(MarketingCampaigns::Name).string().not_null())
                    .col(
                        ColumnDef::new(MarketingCampaigns::Kind)
                            .string_len(20)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(MarketingCampaigns::Status)
                            .string_len(20)
                            .not_null()
                            .default("draft"),
                    )
                    .col(ColumnDef::new(MarketingCampaigns::Subject).string().null())
                    .col(ColumnDef::new(MarketingCampaigns::Content).text().not_null())
                    .col(
                        ColumnDef::new(MarketingCampaigns::ScheduledTime)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(MarketingCampaigns::SentCount)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(MarketingCampaigns::OpenedCount)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(MarketingCampaigns::ClickedCount)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(MarketingCampaigns::ConversionCount)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(MarketingCampaigns::SentAt)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(MarketingCampaigns::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(MarketingCampaigns::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum MarketingCampaigns {
    Table,
    Id,
    Name,
    Kind,
    Status,
    Subject,
    Content,
    ScheduledTime,
    SentCount,
    OpenedCount,
    ClickedCount,
    ConversionCount,
    SentAt,
    CreatedAt,
}
