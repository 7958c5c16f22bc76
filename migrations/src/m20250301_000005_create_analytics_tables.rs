use sea_orm_migration::prelude::*;

use crate::m20250301_000001_create_customers_tables::Customers;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(CustomerRfm::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(CustomerRfm::Id)
                            .uuid()
                            .primary_key()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(CustomerRfm::CustomerId)
                            .uuid()
                            .not_null()
                            .unique_key(),
                    )
                    .col(
                        ColumnDef::new(CustomerRfm::RecencyScore)
                            .small_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(CustomerRfm::FrequencyScore)
                            .small_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(CustomerRfm::MonetaryScore)
                            .small_integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(CustomerRfm::Segment).string().not_null())
                    .col(
                        ColumnDef::new(CustomerRfm::LastCalculated)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_customer_rfm_customer")
                            .from(CustomerRfm::Table, CustomerRfm::CustomerId)
                            .to(Customers::Table, Customers::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(CustomerAnalytics::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(CustomerAnalytics::Id)
                            .uuid()
                            .primary_key()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(CustomerAnalytics::CustomerId)
                            .uuid()
                            .not_null()
                            .unique_key(),
                    )
                    .col(
                        ColumnDef::new(CustomerAnalytics::LifetimeValue)
                            .decimal()
                            .not_null()
                            .default(0.0),
                    )
                    .col(
                        ColumnDef::new(CustomerAnalytics::AverageOrderValue)
                            .decimal()
                            .not_null()
                            .default(0.0),
                    )
                    .col(
                        ColumnDef::new(CustomerAnalytics::PurchaseFrequency)
                            .decimal()
                            .not_null()
                            .default(0.0),
                    )
                    .col(
                        ColumnDef::new(CustomerAnalytics::DaysSinceLastPurchase)
                            .integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(CustomerAnalytics::ChurnProbability)
                            .small_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(CustomerAnalytics::PredictedNextPurchaseDate)
                            .date()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(CustomerAnalytics::LastCalculated)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_customer_analytics_customer")
                            .from(CustomerAnalytics::Table, CustomerAnalytics::CustomerId)
                            .to(Customers::Table, Customers::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(CustomerAnalytics::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(CustomerRfm::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum CustomerRfm {
    Table,
    Id,
    CustomerId,
    RecencyScore,
    FrequencyScore,
    MonetaryScore,
    Segment,
    LastCalculated,
}

#[derive(DeriveIden)]
enum CustomerAnalytics {
    Table,
    Id,
    CustomerId,
    LifetimeValue,
    AverageOrderValue,
    PurchaseFrequency,
    DaysSinceLastPurchase,
    ChurnProbability,
    PredictedNextPurchaseDate,
    LastCalculated,
}
