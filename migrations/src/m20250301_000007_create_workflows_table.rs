use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(AutomationWorkflows::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(AutomationWorkflows::Id)
                            .uuid()
                            .primary_key()
                            .not_null(),
                    )
                    .col(ColumnDef::new(AutomationWorkflows::Name).string().not_null())
                    .col(ColumnDef::new(AutomationWorkflows::Description).text().null())
                    .col(
                        ColumnDef::new(AutomationWorkflows::TriggerType)
                            .string_len(30)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(AutomationWorkflows::TriggerConditions)
                            .json()
                            .not_null(),
                    )
                    .col(ColumnDef::new(AutomationWorkflows::Action).json().not_null())
                    .col(
                        ColumnDef::new(AutomationWorkflows::IsActive)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .col(
                        ColumnDef::new(AutomationWorkflows::ExecutionCount)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(AutomationWorkflows::LastExecuted)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(AutomationWorkflows::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(AutomationWorkflows::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_automation_workflows_trigger_type")
                    .table(AutomationWorkflows::Table)
                    .col(AutomationWorkflows::TriggerType)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(AutomationWorkflows::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum AutomationWorkflows {
    Table,
    Id,
    Name,
    Description,
    TriggerType,
    TriggerConditions,
    Action,
    IsActive,
    ExecutionCount,
    LastExecuted,
    CreatedAt,
    UpdatedAt,
}
