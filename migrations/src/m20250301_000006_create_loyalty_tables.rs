use sea_orm_migration::prelude::*;

use crate::m20250301_000001_create_customers_tables::Customers;
use crate::m20250301_000003_create_orders_tables::Orders;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(LoyaltyAccounts::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(LoyaltyAccounts::Id)
                            .uuid()
                            .primary_key()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(LoyaltyAccounts::CustomerId)
                            .uuid()
                            .not_null()
                            .unique_key(),
                    )
                    .col(
                        ColumnDef::new(LoyaltyAccounts::Tier)
                            .string_len(20)
                            .not_null()
                            .default("bronze"),
                    )
                    .col(
                        ColumnDef::new(LoyaltyAccounts::PointsBalance)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(LoyaltyAccounts::LifetimePoints)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(LoyaltyAccounts::TotalRedeemed)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(LoyaltyAccounts::JoinDate)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(LoyaltyAccounts::LastActivity)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_loyalty_accounts_customer")
                            .from(LoyaltyAccounts::Table, LoyaltyAccounts::CustomerId)
                            .to(Customers::Table, Customers::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(LoyaltyTransactions::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(LoyaltyTransactions::Id)
                            .uuid()
                            .primary_key()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(LoyaltyTransactions::AccountId)
                            .uuid()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(LoyaltyTransactions::Kind)
                            .string_len(20)
                            .not_null(),
                    )
                    .col(ColumnDef::new(LoyaltyTransactions::Points).integer().not_null())
                    .col(
                        ColumnDef::new(LoyaltyTransactions::Description)
                            .string()
                            .not_null(),
                    )
                    .col(ColumnDef::new(LoyaltyTransactions::OrderId).uuid().null())
                    .col(
                        ColumnDef::new(LoyaltyTransactions::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_loyalty_transactions_account")
                            .from(LoyaltyTransactions::Table, LoyaltyTransactions::AccountId)
                            .to(LoyaltyAccounts::Table, LoyaltyAccounts::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_loyalty_transactions_order")
                            .from(LoyaltyTransactions::Table, LoyaltyTransactions::OrderId)
                            .to(Orders::Table, Orders::Id)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_loyalty_transactions_account_id")
                    .table(LoyaltyTransactions::Table)
                    .col(LoyaltyTransactions::AccountId)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(LoyaltyTransactions::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(LoyaltyAccounts::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum LoyaltyAccounts {
    Table,
    Id,
    CustomerId,
    Tier,
    PointsBalance,
    LifetimePoints,
    TotalRedeemed,
    JoinDate,
    LastActivity,
}

#[derive(DeriveIden)]
enum LoyaltyTransactions {
    Table,
    Id,
    AccountId,
    Kind,
    Points,
    Description,
    OrderId,
    CreatedAt,
}
