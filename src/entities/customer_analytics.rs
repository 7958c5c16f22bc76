use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Derived lifetime-value and churn analytics, one row per customer,
/// recalculated wholesale on demand.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "customer_analytics")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    #[sea_orm(unique)]
    pub customer_id: Uuid,
    pub lifetime_value: Decimal,
    pub average_order_value: Decimal,
    /// Estimated orders per year
    pub purchase_frequency: Decimal,
    /// 999 sentinel when the customer has never purchased
    pub days_since_last_purchase: i32,
    /// Percentage, 0-100
    pub churn_probability: i16,
    pub predicted_next_purchase_date: Option<NaiveDate>,
    pub last_calculated: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::customer::Entity",
        from = "Column::CustomerId",
        to = "super::customer::Column::Id"
    )]
    Customer,
}

impl Related<super::customer::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Customer.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
