use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Loyalty account, one per customer.
///
/// `lifetime_points` is monotonically non-decreasing and `tier` is recomputed
/// from it on every update; the two can never drift apart.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "loyalty_accounts")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    #[sea_orm(unique)]
    pub customer_id: Uuid,
    pub tier: LoyaltyTier,
    pub points_balance: i32,
    pub lifetime_points: i32,
    pub total_redeemed: i32,
    pub join_date: DateTime<Utc>,
    pub last_activity: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::customer::Entity",
        from = "Column::CustomerId",
        to = "super::customer::Column::Id"
    )]
    Customer,
    #[sea_orm(has_many = "super::loyalty_transaction::Entity")]
    Transactions,
}

impl Related<super::customer::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Customer.def()
    }
}

impl Related<super::loyalty_transaction::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Transactions.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, EnumIter, DeriveActiveEnum,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(20))")]
#[serde(rename_all = "snake_case")]
pub enum LoyaltyTier {
    #[sea_orm(string_value = "bronze")]
    Bronze,
    #[sea_orm(string_value = "silver")]
    Silver,
    #[sea_orm(string_value = "gold")]
    Gold,
    #[sea_orm(string_value = "platinum")]
    Platinum,
}

impl LoyaltyTier {
    /// Tier is a pure function of lifetime points.
    pub fn for_lifetime_points(lifetime_points: i32) -> Self {
        if lifetime_points >= 10_000 {
            LoyaltyTier::Platinum
        } else if lifetime_points >= 5_000 {
            LoyaltyTier::Gold
        } else if lifetime_points >= 2_000 {
            LoyaltyTier::Silver
        } else {
            LoyaltyTier::Bronze
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tier_thresholds() {
        assert_eq!(LoyaltyTier::for_lifetime_points(0), LoyaltyTier::Bronze);
        assert_eq!(LoyaltyTier::for_lifetime_points(1_999), LoyaltyTier::Bronze);
        assert_eq!(LoyaltyTier::for_lifetime_points(2_000), LoyaltyTier::Silver);
        assert_eq!(LoyaltyTier::for_lifetime_points(4_999), LoyaltyTier::Silver);
        assert_eq!(LoyaltyTier::for_lifetime_points(5_000), LoyaltyTier::Gold);
        assert_eq!(LoyaltyTier::for_lifetime_points(9_999), LoyaltyTier::Gold);
        assert_eq!(
            LoyaltyTier::for_lifetime_points(10_000),
            LoyaltyTier::Platinum
        );
    }
}
