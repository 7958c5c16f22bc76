use std::sync::Arc;

use chrono::Utc;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, QueryFilter,
    QueryOrder, QuerySelect, Set, TransactionTrait,
};
use tracing::{info, instrument};
use uuid::Uuid;

use crate::{
    entities::{
        loyalty_account::{self, Entity as LoyaltyAccount, LoyaltyTier},
        loyalty_transaction::{self, Entity as LoyaltyTransaction, LoyaltyTransactionKind},
        order::{self, PaymentStatus},
    },
    errors::ServiceError,
    events::{Event, EventSender},
};

/// Loyalty point bookkeeping: earn/redeem against a per-customer account with
/// an append-only ledger. Tier is recomputed from lifetime points on every
/// mutation, and mutations serialize on the account row so lifetime points
/// stay monotonic under concurrent awards.
#[derive(Clone)]
pub struct LoyaltyService {
    db: Arc<DatabaseConnection>,
    event_sender: Arc<EventSender>,
}

impl LoyaltyService {
    pub fn new(db: Arc<DatabaseConnection>, event_sender: Arc<EventSender>) -> Self {
        Self { db, event_sender }
    }

    /// Awards points for a paid order: `floor(total * points_per_unit)`.
    /// Returns 0 and changes nothing when the order is not paid.
    #[instrument(skip(self, order))]
    pub async fn award_points_for_order(
        &self,
        customer_id: Uuid,
        order: &order::Model,
        points_per_unit: u32,
    ) -> Result<i32, ServiceError> {
        if order.payment_status != PaymentStatus::Paid {
            return Ok(0);
        }

        let points = (order.total_amount * Decimal::from(points_per_unit))
            .trunc()
            .to_i32()
            .unwrap_or(0);
        if points <= 0 {
            return Ok(0);
        }

        self.credit(
            customer_id,
            points,
            format!("Points earned from order {}", order.order_number),
            Some(order.id),
        )
        .await?;

        Ok(points)
    }

    /// Credits points to the account (workflow awards and manual grants).
    #[instrument(skip(self))]
    pub async fn credit(
        &self,
        customer_id: Uuid,
        points: i32,
        description: String,
        order_id: Option<Uuid>,
    ) -> Result<loyalty_account::Model, ServiceError> {
        if points <= 0 {
            return Err(ServiceError::ValidationError(
                "points credit must be positive".to_string(),
            ));
        }

        let now = Utc::now();
        let txn = self.db.begin().await?;

        // Exclusive row lock: concurrent credits for the same customer
        // serialize here, keeping lifetime_points monotonic.
        let account = Self::get_or_create_account(&txn, customer_id).await?;
        let new_balance = account.points_balance + points;
        let new_lifetime = account.lifetime_points + points;

        let mut active: loyalty_account::ActiveModel = account.into();
        active.points_balance = Set(new_balance);
        active.lifetime_points = Set(new_lifetime);
        active.tier = Set(LoyaltyTier::for_lifetime_points(new_lifetime));
        active.last_activity = Set(now);
        let account = active.update(&txn).await?;

        loyalty_transaction::ActiveModel {
            id: Set(Uuid::new_v4()),
            account_id: Set(account.id),
            kind: Set(LoyaltyTransactionKind::Earned),
            points: Set(points),
            description: Set(description),
            order_id: Set(order_id),
            created_at: Set(now),
        }
        .insert(&txn)
        .await?;

        txn.commit().await?;

        self.event_sender
            .send(Event::PointsAwarded {
                customer_id,
                points,
            })
            .await;
        info!(%customer_id, points, "loyalty points credited");
        Ok(account)
    }

    /// Redeems points from the spendable balance. Lifetime points are
    /// untouched; the ledger row carries a negative delta.
    #[instrument(skip(self))]
    pub async fn redeem(
        &self,
        customer_id: Uuid,
        points: i32,
        description: String,
    ) -> Result<loyalty_account::Model, ServiceError> {
        if points <= 0 {
            return Err(ServiceError::ValidationError(
                "points redemption must be positive".to_string(),
            ));
        }

        let now = Utc::now();
        let txn = self.db.begin().await?;

        let account = Self::get_or_create_account(&txn, customer_id).await?;
        if account.points_balance < points {
            return Err(ServiceError::InsufficientPoints(format!(
                "balance {} is less than requested {}",
                account.points_balance, points
            )));
        }

        let new_balance = account.points_balance - points;
        let new_redeemed = account.total_redeemed + points;
        let lifetime = account.lifetime_points;

        let mut active: loyalty_account::ActiveModel = account.into();
        active.points_balance = Set(new_balance);
        active.total_redeemed = Set(new_redeemed);
        active.tier = Set(LoyaltyTier::for_lifetime_points(lifetime));
        active.last_activity = Set(now);
        let account = active.update(&txn).await?;

        loyalty_transaction::ActiveModel {
            id: Set(Uuid::new_v4()),
            account_id: Set(account.id),
            kind: Set(LoyaltyTransactionKind::Redeemed),
            points: Set(-points),
            description: Set(description),
            order_id: Set(None),
            created_at: Set(now),
        }
        .insert(&txn)
        .await?;

        txn.commit().await?;

        self.event_sender
            .send(Event::PointsRedeemed {
                customer_id,
                points,
            })
            .await;
        Ok(account)
    }

    /// Returns the customer's account, creating an empty bronze one on first
    /// access.
    pub async fn get_account(
        &self,
        customer_id: Uuid,
    ) -> Result<loyalty_account::Model, ServiceError> {
        let txn = self.db.begin().await?;
        let account = Self::get_or_create_account(&txn, customer_id).await?;
        txn.commit().await?;
        Ok(account)
    }

    /// Ledger history, newest first.
    pub async fn list_transactions(
        &self,
        customer_id: Uuid,
    ) -> Result<Vec<loyalty_transaction::Model>, ServiceError> {
        let account = self.get_account(customer_id).await?;
        LoyaltyTransaction::find()
            .filter(loyalty_transaction::Column::AccountId.eq(account.id))
            .order_by_desc(loyalty_transaction::Column::CreatedAt)
            .all(&*self.db)
            .await
            .map_err(Into::into)
    }

    /// Get-or-create with an exclusive lock on the existing row. The lock
    /// clause is a no-op on SQLite, where writes serialize anyway.
    pub(crate) async fn get_or_create_account<C: ConnectionTrait>(
        conn: &C,
        customer_id: Uuid,
    ) -> Result<loyalty_account::Model, ServiceError> {
        let existing = LoyaltyAccount::find()
            .filter(loyalty_account::Column::CustomerId.eq(customer_id))
            .lock_exclusive()
            .one(conn)
            .await?;

        if let Some(account) = existing {
            return Ok(account);
        }

        let now = Utc::now();
        loyalty_account::ActiveModel {
            id: Set(Uuid::new_v4()),
            customer_id: Set(customer_id),
            tier: Set(LoyaltyTier::Bronze),
            points_balance: Set(0),
            lifetime_points: Set(0),
            total_redeemed: Set(0),
            join_date: Set(now),
            last_activity: Set(now),
        }
        .insert(conn)
        .await
        .map_err(Into::into)
    }
}
