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
                    .table(Tasks::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Tasks::Id).uuid().primary_key().not_null())
                    .col(ColumnDef::new(Tasks::Title).string().not_null())
                    .col(ColumnDef::new(Tasks::Description).text().null())
                    .col(ColumnDef::new(Tasks::CustomerId).uuid().null())
                    .col(
                        ColumnDef::new(Tasks::Priority)
                            .string_len(20)
                            .not_null()
                            .default("medium"),
                    )
                    .col(
                        ColumnDef::new(Tasks::Status)
                            .string_len(20)
                            .not_null()
                            .default("pending"),
                    )
                    .col(
                        ColumnDef::new(Tasks::DueDate)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Tasks::CompletedAt)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(Tasks::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_tasks_customer")
                            .from(Tasks::Table, Tasks::CustomerId)
                            .to(Customers::Table, Customers::Id)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Deals::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Deals::Id).uuid().primary_key().not_null())
                    .col(ColumnDef::new(Deals::CustomerId).uuid().not_null())
                    .col(ColumnDef::new(Deals::Title).string().not_null())
                    .col(ColumnDef::new(Deals::Amount).decimal().not_null())
                    .col(
                        ColumnDef::new(Deals::Stage)
                            .string_len(20)
                            .not_null()
                            .default("lead"),
                    )
                    .col(
                        ColumnDef::new(Deals::Probability)
                            .small_integer()
                            .not_null()
                            .default(10),
                    )
                    .col(ColumnDef::new(Deals::ExpectedCloseDate).date().not_null())
                    .col(ColumnDef::new(Deals::Description).text().null())
                    .col(
                        ColumnDef::new(Deals::ClosedAt)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(Deals::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Deals::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_deals_customer")
                            .from(Deals::Table, Deals::CustomerId)
                            .to(Customers::Table, Customers::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(SupportTickets::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(SupportTickets::Id)
                            .uuid()
                            .primary_key()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(SupportTickets::TicketNumber)
                            .string()
                            .not_null()
                            .unique_key(),
                    )
                    .col(ColumnDef::new(SupportTickets::CustomerId).uuid().not_null())
                    .col(ColumnDef::new(SupportTickets::Subject).string().not_null())
                    .col(ColumnDef::new(SupportTickets::Description).text().not_null())
                    .col(
                        ColumnDef::new(SupportTickets::Priority)
                            .string_len(20)
                            .not_null()
                            .default("medium"),
                    )
                    .col(
                        ColumnDef::new(SupportTickets::Status)
                            .string_len(20)
                            .not_null()
                            .default("new"),
                    )
                    .col(
                        ColumnDef::new(SupportTickets::Source)
                            .string_len(20)
                            .not_null()
                            .default("web"),
                    )
                    .col(ColumnDef::new(SupportTickets::Category).string().null())
                    .col(
                        ColumnDef::new(SupportTickets::FirstResponseAt)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(SupportTickets::ResolvedAt)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(SupportTickets::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(SupportTickets::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_support_tickets_customer")
                            .from(SupportTickets::Table, SupportTickets::CustomerId)
                            .to(Customers::Table, Customers::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(CustomerFeedback::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(CustomerFeedback::Id)
                            .uuid()
                            .primary_key()
                            .not_null(),
                    )
                    .col(ColumnDef::new(CustomerFeedback::CustomerId).uuid().not_null())
                    .col(
                        ColumnDef::new(CustomerFeedback::Kind)
                            .string_len(20)
                            .not_null(),
                    )
                    .col(ColumnDef::new(CustomerFeedback::Rating).small_integer().null())
                    .col(ColumnDef::new(CustomerFeedback::Comment).text().null())
                    .col(ColumnDef::new(CustomerFeedback::OrderId).uuid().null())
                    .col(
                        ColumnDef::new(CustomerFeedback::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_customer_feedback_customer")
                            .from(CustomerFeedback::Table, CustomerFeedback::CustomerId)
                            .to(Customers::Table, Customers::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_customer_feedback_order")
                            .from(CustomerFeedback::Table, CustomerFeedback::OrderId)
                            .to(Orders::Table, Orders::Id)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(CustomerFeedback::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(SupportTickets::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Deals::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Tasks::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum Tasks {
    Table,
    Id,
    Title,
    Description,
    CustomerId,
    Priority,
    Status,
    DueDate,
    CompletedAt,
    CreatedAt,
}

#[derive(DeriveIden)]
pub enum Deals {
    Table,
    Id,
    CustomerId,
    Title,
    Amount,
    Stage,
    Probability,
    ExpectedCloseDate,
    Description,
    ClosedAt,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum SupportTickets {
    Table,
    Id,
    TicketNumber,
    CustomerId,
    Subject,
    Description,
    Priority,
    Status,
    Source,
    Category,
    FirstResponseAt,
    ResolvedAt,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum CustomerFeedback {
    Table,
    Id,
    CustomerId,
    Kind,
    Rating,
    Comment,
    OrderId,
    CreatedAt,
}
