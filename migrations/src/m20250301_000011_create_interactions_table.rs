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
                    .table(Interactions::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Interactions::Id)
                            .uuid()
                            .primary_key()
                            .not_null(),
                    )
                    .col(ColumnDef::new(Interactions::CustomerId).uuid().not_null())
                    .col(
                        ColumnDef::new(Interactions::Kind)
                            .string_len(20)
                            .not_null(),
                    )
                    .col(ColumnDef::new(Interactions::Subject).string().not_null())
                    .col(ColumnDef::new(Interactions::Description).text().not_null())
                    .col(ColumnDef::new(Interactions::Outcome).text().null())
                    .col(ColumnDef::new(Interactions::NextAction).text().null())
                    .col(
                        ColumnDef::new(Interactions::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_interactions_customer")
                            .from(Interactions::Table, Interactions::CustomerId)
                            .to(Customers::Table, Customers::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_interactions_customer_id")
                    .table(Interactions::Table)
                    .col(Interactions::CustomerId)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Interactions::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum Interactions {
    Table,
    Id,
    CustomerId,
    Kind,
    Subject,
    Description,
    Outcome,
    NextAction,
    CreatedAt,
}
