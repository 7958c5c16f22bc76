pub use sea_orm_migration::prelude::*;

mod m20250301_000001_create_customers_tables;
mod m20250301_000002_create_products_table;
mod m20250301_000003_create_orders_tables;
mod m20250301_000004_create_crm_tables;
mod m20250301_000005_create_analytics_tables;
mod m20250301_000006_create_loyalty_tables;
mod m20250301_000007_create_workflows_table;
mod m20250301_000008_create_campaigns_table;
mod m20250301_000009_create_otp_codes_table;
mod m20250301_000010_create_quotes_table;
mod m20250301_000011_create_interactions_table;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20250301_000001_create_customers_tables::Migration),
            Box::new(m20250301_000002_create_products_table::Migration),
            Box::new(m20250301_000003_create_orders_tables::Migration),
            Box::new(m20250301_000004_create_crm_tables::Migration),
            Box::new(m20250301_000005_create_analytics_tables::Migration),
            Box::new(m20250301_000006_create_loyalty_tables::Migration),
            Box::new(m20250301_000007_create_workflows_table::Migration),
            Box::new(m20250301_000008_create_campaigns_table::Migration),
            Box::new(m20250301_000009_create_otp_codes_table::Migration),
            Box::new(m20250301_000010_create_quotes_table::Migration),
            Box::new(m20250301_000011_create_interactions_table::Migration),
        ]
    }
}
