use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Customers::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Customers::Id).uuid().primary_key().not_null())
                    .col(ColumnDef::new(Customers::FirstName).string().not_null())
                    .col(ColumnDef::new(Customers::LastName).string().not_null())
                    .col(
                        ColumnDef::new(Customers::Email)
                            .string()
                            .not_null()
                            .unique_key(),
                    )
                    .col(ColumnDef::new(Customers::Phone).string().null())
                    .col(ColumnDef::new(Customers::Address).text().null())
                    .col(ColumnDef::new(Customers::City).string().null())
                    .col(ColumnDef::new(Customers::Country).string().null())
                    .col(ColumnDef::new(Customers::PostalCode).string().null())
                    .col(
                        ColumnDef::new(Customers::CustomerType)
                            .string_len(20)
                            .not_null()
                            .default("individual"),
                    )
                    .col(ColumnDef::new(Customers::CompanyName).string().null())
                    .col(
                        ColumnDef::new(Customers::Status)
                            .string_len(20)
                            .not_null()
                            .default("lead"),
                    )
                    .col(
                        ColumnDef::new(Customers::Source)
                            .string_len(20)
                            .not_null()
                            .default("website"),
                    )
                    .col(ColumnDef::new(Customers::Notes).text().null())
                    .col(ColumnDef::new(Customers::Tags).string().null())
                    .col(
                        ColumnDef::new(Customers::DateJoined)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Customers::LastContactDate)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(Customers::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Customers::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(CommunicationPreferences::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(CommunicationPreferences::Id)
                            .uuid()
                            .primary_key()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(CommunicationPreferences::CustomerId)
                            .uuid()
                            .not_null()
                            .unique_key(),
                    )
                    .col(
                        ColumnDef::new(CommunicationPreferences::EmailEnabled)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .col(
                        ColumnDef::new(CommunicationPreferences::SmsEnabled)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(CommunicationPreferences::PhoneEnabled)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .col(
                        ColumnDef::new(CommunicationPreferences::MarketingEmails)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(CommunicationPreferences::Language)
                            .string_len(10)
                            .not_null()
                            .default("en"),
                    )
                    .col(
                        ColumnDef::new(CommunicationPreferences::Timezone)
                            .string()
                            .not_null()
                            .default("UTC"),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_communication_preferences_customer")
                            .from(
                                CommunicationPreferences::Table,
                                CommunicationPreferences::CustomerId,
                            )
                            .to(Customers::Table, Customers::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(CommunicationPreferences::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Customers::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
pub enum Customers {
    Table,
    Id,
    FirstName,
    LastName,
    Email,
    Phone,
    Address,
    City,
    Country,
    PostalCode,
    CustomerType,
    CompanyName,
    Status,
    Source,
    Notes,
    Tags,
    DateJoined,
    LastContactDate,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
pub enum CommunicationPreferences {
    Table,
    Id,
    CustomerId,
    EmailEnabled,
    SmsEnabled,
    PhoneEnabled,
    MarketingEmails,
    Language,
    Timezone,
}
