use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Priced proposal sent to a customer, optionally attached to a pipeline deal.
///
/// `total_amount` is always `subtotal + tax - discount`; the service
/// recomputes it on every write.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "quotes")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    #[sea_orm(unique)]
    pub quote_number: String,
    pub customer_id: Uuid,
    pub deal_id: Option<Uuid>,
    pub status: QuoteStatus,
    pub subtotal: Decimal,
    pub tax: Decimal,
    pub discount: Decimal,
    pub total_amount: Decimal,
    pub valid_until: NaiveDate,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::customer::Entity",
        from = "Column::CustomerId",
        to = "super::customer::Column::Id"
    )]
    Customer,
    #[sea_orm(
        belongs_to = "super::deal::Entity",
        from = "Column::DealId",
        to = "super::deal::Column::Id"
    )]
    Deal,
}

impl Related<super::customer::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Customer.def()
    }
}

impl Related<super::deal::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Deal.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    /// An outstanding quote past its validity date. Answered quotes never
    /// count as expired.
    pub fn is_expired(&self, today: NaiveDate) -> bool {
        today > self.valid_until && self.status.is_outstanding()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, EnumIter, DeriveActiveEnum)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(20))")]
#[serde(rename_all = "snake_case")]
pub enum QuoteStatus {
    #[sea_orm(string_value = "draft")]
    Draft,
    #[sea_orm(string_value = "sent")]
    Sent,
    #[sea_orm(string_value = "accepted")]
    Accepted,
    #[sea_orm(string_value = "rejected")]
    Rejected,
    #[sea_orm(string_value = "expired")]
    Expired,
}

impl QuoteStatus {
    /// Still waiting on the customer's answer.
    pub fn is_outstanding(&self) -> bool {
        matches!(self, QuoteStatus::Draft | QuoteStatus::Sent)
    }

    pub fn is_answered(&self) -> bool {
        matches!(self, QuoteStatus::Accepted | QuoteStatus::Rejected)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn sample(status: QuoteStatus, valid_until: NaiveDate) -> Model {
        Model {
            id: Uuid::new_v4(),
            quote_number: "QTE-0A1B2C3D".into(),
            customer_id: Uuid::new_v4(),
            deal_id: None,
            status,
            subtotal: dec!(100),
            tax: dec!(10),
            discount: dec!(0),
            total_amount: dec!(110),
            valid_until,
            notes: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn outstanding_quotes_expire_past_validity() {
        let today = NaiveDate::from_ymd_opt(2025, 6, 15).unwrap();
        let yesterday = NaiveDate::from_ymd_opt(2025, 6, 14).unwrap();

        assert!(sample(QuoteStatus::Draft, yesterday).is_expired(today));
        assert!(sample(QuoteStatus::Sent, yesterday).is_expired(today));
        assert!(!sample(QuoteStatus::Draft, today).is_expired(today));
    }

    #[test]
    fn answered_quotes_never_expire() {
        let today = NaiveDate::from_ymd_opt(2025, 6, 15).unwrap();
        let long_gone = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();

        assert!(!sample(QuoteStatus::Accepted, long_gone).is_expired(today));
        assert!(!sample(QuoteStatus::Rejected, long_gone).is_expired(today));
    }
}
