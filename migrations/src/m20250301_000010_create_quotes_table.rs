use sea_orm_migration::prelude::*;

use crate::m20250301_000001_create_customers_tables::Customers;
use crate::m20250301_000004_create_crm_tables::Deals;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Quotes::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Quotes::Id).uuid().primary_key().not_null())
                    .col(
                        ColumnDef::new(Quotes::QuoteNumber)
                            .string()
                            .not_null()
                            .unique_key(),
                    )
                    .col(ColumnDef::new(Quotes::CustomerId).uuid().not_null())
                    .col(ColumnDef::new(Quotes::DealId).uuid().null())
                    .col(
                        ColumnDef::new(Quotes::Status)
                            .string_len(20)
                            .not_null()
                            .default("draft"),
                    )
                    .col(ColumnDef::new(Quotes::Subtotal).decimal().not_null())
                    .col(ColumnDef::new(Quotes::Tax).decimal().not_null())
                    .col(ColumnDef::new(Quotes::Discount).decimal().not_null())
                    .col(ColumnDef::new(Quotes::TotalAmount).decimal().not_null())
                    .col(ColumnDef::new(Quotes::ValidUntil).date().not_null())
                    .col(ColumnDef::new(Quotes::Notes).text().null())
                    .col(
                        ColumnDef::new(Quotes::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Quotes::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_quotes_customer")
                            .from(Quotes::Table, Quotes::CustomerId)
                            .to(Customers::Table, Customers::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_quotes_deal")
                            .from(Quotes::Table, Quotes::DealId)
                            .to(Deals::Table, Deals::Id)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_quotes_customer_id")
                    .table(Quotes::Table)
                    .col(Quotes::CustomerId)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Quotes::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum Quotes {
    Table,
    Id,
    QuoteNumber,
    CustomerId,
    DealId,
    Status,
    Subtotal,
    Tax,
    Discount,
    TotalAmount,
    ValidUntil,
    Notes,
    CreatedAt,
    UpdatedAt,
}
