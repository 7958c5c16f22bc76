use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set,
    TransactionTrait,
};
use tracing::{info, instrument};
use uuid::Uuid;

use crate::{
    entities::{
        customer,
        customer_analytics::{self, Entity as CustomerAnalytics},
        customer_rfm::{self, Entity as CustomerRfm},
        order::{self, Entity as Order},
    },
    errors::ServiceError,
};

/// Sentinel for "never purchased", both for recency days and analytics.
const NO_PURCHASE_DAYS: i32 = 999;

/// Customer lifecycle scoring: RFM scores and derived lifetime-value /
/// churn analytics. Both calculations are idempotent upserts of a single
/// per-customer row.
#[derive(Clone)]
pub struct ScoringService {
    db: Arc<DatabaseConnection>,
}

impl ScoringService {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Recalculates and stores the RFM scores for a customer.
    #[instrument(skip(self))]
    pub async fn calculate_rfm(
        &self,
        customer_id: Uuid,
        now: DateTime<Utc>,
    ) -> Result<customer_rfm::Model, ServiceError> {
        self.ensure_customer_exists(customer_id).await?;

        let last_order = Order::find()
            .filter(order::Column::CustomerId.eq(customer_id))
            .order_by_desc(order::Column::CreatedAt)
            .one(&*self.db)
            .await?;

        let days_since = match &last_order {
            Some(o) => (now - o.created_at).num_days().max(0) as i32,
            None => NO_PURCHASE_DAYS,
        };

        let one_year_ago = now - Duration::days(365);
        let recent_orders = Order::find()
            .filter(order::Column::CustomerId.eq(customer_id))
            .filter(order::Column::CreatedAt.gte(one_year_ago))
            .all(&*self.db)
            .await?;

        let order_count = recent_orders.len() as i64;
        let total_spent: Decimal = recent_orders.iter().map(|o| o.total_amount).sum();

        let recency = recency_score(days_since);
        let frequency = frequency_score(order_count);
        let monetary = monetary_score(total_spent);
        let segment = segment_label(recency, frequency, monetary);

        // All three scores, the segment and the timestamp land in one row,
        // in one transaction; the row is never partially updated.
        let txn = self.db.begin().await?;
        let existing = CustomerRfm::find()
            .filter(customer_rfm::Column::CustomerId.eq(customer_id))
            .one(&txn)
            .await?;

        let model = match existing {
            Some(row) => {
                let mut row: customer_rfm::ActiveModel = row.into();
                row.recency_score = Set(recency);
                row.frequency_score = Set(frequency);
                row.monetary_score = Set(monetary);
                row.segment = Set(segment.to_string());
                row.last_calculated = Set(now);
                row.update(&txn).await?
            }
            None => {
                customer_rfm::ActiveModel {
                    id: Set(Uuid::new_v4()),
                    customer_id: Set(customer_id),
                    recency_score: Set(recency),
                    frequency_score: Set(frequency),
                    monetary_score: Set(monetary),
                    segment: Set(segment.to_string()),
                    last_calculated: Set(now),
                }
                .insert(&txn)
                .await?
            }
        };
        txn.commit().await?;

        info!(
            %customer_id,
            recency, frequency, monetary, segment, "RFM recalculated"
        );
        Ok(model)
    }

    /// Recalculates and stores the derived analytics for a customer.
    #[instrument(skip(self))]
    pub async fn calculate_analytics(
        &self,
        customer_id: Uuid,
        now: DateTime<Utc>,
    ) -> Result<customer_analytics::Model, ServiceError> {
        let customer = self.ensure_customer_exists(customer_id).await?;

        let orders = Order::find()
            .filter(order::Column::CustomerId.eq(customer_id))
            .order_by_asc(order::Column::CreatedAt)
            .all(&*self.db)
            .await?;

        let order_count = orders.len() as i64;
        let lifetime_value: Decimal = orders.iter().map(|o| o.total_amount).sum();

        let average_order_value = if order_count > 0 {
            lifetime_value / Decimal::from(order_count)
        } else {
            Decimal::ZERO
        };

        let days_active = (now - customer.date_joined).num_days();
        let purchase_frequency = if days_active > 0 {
            Decimal::from(order_count) / Decimal::from(days_active) * Decimal::from(365)
        } else {
            Decimal::ZERO
        };

        let days_since_last_purchase = match orders.last() {
            Some(o) => (now - o.created_at).num_days().max(0) as i32,
            None => NO_PURCHASE_DAYS,
        };

        let churn_probability = churn_probability(days_since_last_purchase);

        // Mean gap between consecutive orders predicts the next purchase.
        let predicted_next_purchase_date = if order_count > 1 {
            let total_gap_days: i64 = orders
                .windows(2)
                .map(|pair| (pair[1].created_at - pair[0].created_at).num_days())
                .sum();
            let avg_gap = total_gap_days / (order_count - 1);
            Some((now + Duration::days(avg_gap)).date_naive())
        } else {
            None
        };

        let txn = self.db.begin().await?;
        let existing = CustomerAnalytics::find()
            .filter(customer_analytics::Column::CustomerId.eq(customer_id))
            .one(&txn)
            .await?;

        let model = match existing {
            Some(row) => {
                let mut row: customer_analytics::ActiveModel = row.into();
                row.lifetime_value = Set(lifetime_value);
                row.average_order_value = Set(average_order_value);
                row.purchase_frequency = Set(purchase_frequency);
                row.days_since_last_purchase = Set(days_since_last_purchase);
                row.churn_probability = Set(churn_probability);
                row.predicted_next_purchase_date = Set(predicted_next_purchase_date);
                row.last_calculated = Set(now);
                row.update(&txn).await?
            }
            None => {
                customer_analytics::ActiveModel {
                    id: Set(Uuid::new_v4()),
                    customer_id: Set(customer_id),
                    lifetime_value: Set(lifetime_value),
                    average_order_value: Set(average_order_value),
                    purchase_frequency: Set(purchase_frequency),
                    days_since_last_purchase: Set(days_since_last_purchase),
                    churn_probability: Set(churn_probability),
                    predicted_next_purchase_date: Set(predicted_next_purchase_date),
                    last_calculated: Set(now),
                }
                .insert(&txn)
                .await?
            }
        };
        txn.commit().await?;

        Ok(model)
    }

    /// Fetches the stored RFM row, if any.
    pub async fn get_rfm(
        &self,
        customer_id: Uuid,
    ) -> Result<Option<customer_rfm::Model>, ServiceError> {
        CustomerRfm::find()
            .filter(customer_rfm::Column::CustomerId.eq(customer_id))
            .one(&*self.db)
            .await
            .map_err(Into::into)
    }

    /// Fetches the stored analytics row, if any.
    pub async fn get_analytics(
        &self,
        customer_id: Uuid,
    ) -> Result<Option<customer_analytics::Model>, ServiceError> {
        CustomerAnalytics::find()
            .filter(customer_analytics::Column::CustomerId.eq(customer_id))
            .one(&*self.db)
            .await
            .map_err(Into::into)
    }

    async fn ensure_customer_exists(
        &self,
        customer_id: Uuid,
    ) -> Result<customer::Model, ServiceError> {
        customer::Entity::find_by_id(customer_id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Customer {} not found", customer_id)))
    }
}

/// Days since last purchase, bucketed so that more recent means higher.
pub fn recency_score(days_since: i32) -> i16 {
    if days_since <= 30 {
        5
    } else if days_since <= 60 {
        4
    } else if days_since <= 90 {
        3
    } else if days_since <= 180 {
        2
    } else {
        1
    }
}

/// Orders in the trailing year, bucketed.
pub fn frequency_score(order_count: i64) -> i16 {
    if order_count >= 20 {
        5
    } else if order_count >= 10 {
        4
    } else if order_count >= 5 {
        3
    } else if order_count >= 2 {
        2
    } else {
        1
    }
}

/// Spend in the trailing year, bucketed (currency units).
pub fn monetary_score(total_spent: Decimal) -> i16 {
    if total_spent >= Decimal::from(5_000) {
        5
    } else if total_spent >= Decimal::from(2_000) {
        4
    } else if total_spent >= Decimal::from(1_000) {
        3
    } else if total_spent >= Decimal::from(500) {
        2
    } else {
        1
    }
}

/// Fixed decision table, evaluated top to bottom; first match wins.
pub fn segment_label(recency: i16, frequency: i16, monetary: i16) -> &'static str {
    if recency >= 4 && frequency >= 4 && monetary >= 4 {
        "Champions"
    } else if recency >= 3 && frequency >= 3 && monetary >= 3 {
        "Loyal Customers"
    } else if recency >= 4 && frequency <= 2 {
        "Potential Loyalists"
    } else if recency >= 3 && frequency <= 2 {
        "New Customers"
    } else if recency <= 2 && frequency >= 3 {
        "At Risk"
    } else if recency <= 2 && frequency <= 2 {
        "Lost"
    } else if recency >= 3 && monetary <= 2 {
        "Hibernating"
    } else {
        "Need Attention"
    }
}

/// Fixed churn staircase keyed on days since last purchase (percentage).
pub fn churn_probability(days_since_last_purchase: i32) -> i16 {
    if days_since_last_purchase > 180 {
        80
    } else if days_since_last_purchase > 90 {
        50
    } else if days_since_last_purchase > 60 {
        30
    } else if days_since_last_purchase > 30 {
        15
    } else {
        5
    }
}
