use std::sync::Arc;

use chrono::Utc;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, ModelTrait, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect, Set, TransactionTrait,
};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument, warn};
use uuid::Uuid;
use validator::Validate;

use crate::{
    entities::{
        automation_workflow::TriggerType,
        customer::Entity as Customer,
        order::{self, Entity as Order, OrderStatus, PaymentStatus},
        order_item::{self, Entity as OrderItem},
        product::{self, Entity as Product},
    },
    errors::ServiceError,
    events::{Event, EventSender},
    services::{
        automation::{AutomationService, TriggerContext},
        loyalty::LoyaltyService,
    },
};

const TAX_RATE: Decimal = dec!(0.10);
const FREE_SHIPPING_THRESHOLD: Decimal = dec!(100);
const SHIPPING_COST: Decimal = dec!(10.00);

#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct OrderItemInput {
    pub product_id: Uuid,
    #[validate(range(min = 1))]
    pub quantity: i32,
    /// Defaults to the product's current price.
    pub unit_price: Option<Decimal>,
    pub discount: Option<Decimal>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateOrderInput {
    pub customer_id: Uuid,
    #[validate(length(min = 1))]
    pub items: Vec<OrderItemInput>,
    pub discount: Option<Decimal>,
    pub shipping_address: Option<String>,
    pub notes: Option<String>,
}

/// Order lifecycle: creation with stock reservation, status transitions,
/// payment and the loyalty accrual that follows it.
#[derive(Clone)]
pub struct OrderService {
    db: Arc<DatabaseConnection>,
    event_sender: Arc<EventSender>,
    loyalty: LoyaltyService,
    automation: AutomationService,
    points_per_unit: u32,
}

impl OrderService {
    pub fn new(
        db: Arc<DatabaseConnection>,
        event_sender: Arc<EventSender>,
        loyalty: LoyaltyService,
        automation: AutomationService,
        points_per_unit: u32,
    ) -> Self {
        Self {
            db,
            event_sender,
            loyalty,
            automation,
            points_per_unit,
        }
    }

    /// Creates an order with its line items in one transaction, decrementing
    /// stock per line. Fires `order_placed` workflows after commit.
    #[instrument(skip(self, input))]
    pub async fn create_order(
        &self,
        input: CreateOrderInput,
    ) -> Result<order::Model, ServiceError> {
        input.validate()?;
        for item in &input.items {
            item.validate()?;
        }

        let customer = Customer::find_by_id(input.customer_id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| {
                ServiceError::NotFound(format!("Customer {} not found", input.customer_id))
            })?;

        let txn = self.db.begin().await?;
        let now = Utc::now();
        let order_id = Uuid::new_v4();

        let mut subtotal = Decimal::ZERO;
        let mut lines = Vec::with_capacity(input.items.len());
        for item in &input.items {
            // Locking clause is ignored on SQLite; writes serialize there anyway.
            let product = Product::find_by_id(item.product_id)
                .lock_exclusive()
                .one(&txn)
                .await?
                .ok_or_else(|| {
                    ServiceError::NotFound(format!("Product {} not found", item.product_id))
                })?;

            if !product.is_active {
                return Err(ServiceError::InvalidOperation(format!(
                    "Product {} is not active",
                    product.sku
                )));
            }
            if product.stock_quantity < item.quantity {
                return Err(ServiceError::InsufficientStock(format!(
                    "Product {}: requested {}, available {}",
                    product.sku, item.quantity, product.stock_quantity
                )));
            }

            let unit_price = item.unit_price.unwrap_or(product.price);
            let discount = item.discount.unwrap_or(Decimal::ZERO);
            let line_subtotal = unit_price * Decimal::from(item.quantity) - discount;
            subtotal += line_subtotal;

            let remaining = product.stock_quantity - item.quantity;
            let mut active: product::ActiveModel = product.clone().into();
            active.stock_quantity = Set(remaining);
            active.updated_at = Set(now);
            let product = active.update(&txn).await?;
            if product.is_low_stock() {
                warn!(sku = %product.sku, stock = product.stock_quantity, "product below minimum stock level");
            }

            lines.push(order_item::ActiveModel {
                id: Set(Uuid::new_v4()),
                order_id: Set(order_id),
                product_id: Set(item.product_id),
                quantity: Set(item.quantity),
                unit_price: Set(unit_price),
                discount: Set(discount),
                subtotal: Set(line_subtotal),
            });
        }

        let tax = subtotal * TAX_RATE;
        let shipping_cost = if subtotal < FREE_SHIPPING_THRESHOLD {
            SHIPPING_COST
        } else {
            Decimal::ZERO
        };
        let discount = input.discount.unwrap_or(Decimal::ZERO);
        let total_amount = subtotal + tax + shipping_cost - discount;

        let model = order::ActiveModel {
            id: Set(order_id),
            order_number: Set(generate_order_number()),
            customer_id: Set(input.customer_id),
            status: Set(OrderStatus::Pending),
            payment_status: Set(PaymentStatus::Unpaid),
            subtotal: Set(subtotal),
            tax: Set(tax),
            discount: Set(discount),
            shipping_cost: Set(shipping_cost),
            total_amount: Set(total_amount),
            shipping_address: Set(input.shipping_address),
            tracking_number: Set(None),
            shipped_date: Set(None),
            delivered_date: Set(None),
            notes: Set(input.notes),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(&txn)
        .await?;

        for line in lines {
            line.insert(&txn).await?;
        }
        txn.commit().await?;

        self.automation
            .execute_workflows(
                TriggerType::OrderPlaced,
                TriggerContext {
                    customer: Some(&customer),
                    order: Some(&model),
                },
            )
            .await?;

        self.event_sender.send(Event::OrderPlaced(model.id)).await;
        info!(order_number = %model.order_number, total = %model.total_amount, "order created");
        Ok(model)
    }

    #[instrument(skip(self))]
    pub async fn get_order(&self, order_id: Uuid) -> Result<order::Model, ServiceError> {
        Order::find_by_id(order_id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Order {} not found", order_id)))
    }

    #[instrument(skip(self))]
    pub async fn get_order_items(
        &self,
        order_id: Uuid,
    ) -> Result<Vec<order_item::Model>, ServiceError> {
        let order = self.get_order(order_id).await?;
        order
            .find_related(OrderItem)
            .all(&*self.db)
            .await
            .map_err(Into::into)
    }

    #[instrument(skip(self))]
    pub async fn list_orders(
        &self,
        limit: u64,
        offset: u64,
    ) -> Result<Vec<order::Model>, ServiceError> {
        Order::find()
            .order_by_desc(order::Column::CreatedAt)
            .limit(limit)
            .offset(offset)
            .all(&*self.db)
            .await
            .map_err(Into::into)
    }

    #[instrument(skip(self))]
    pub async fn list_customer_orders(
        &self,
        customer_id: Uuid,
    ) -> Result<Vec<order::Model>, ServiceError> {
        Order::find()
            .filter(order::Column::CustomerId.eq(customer_id))
            .order_by_desc(order::Column::CreatedAt)
            .all(&*self.db)
            .await
            .map_err(Into::into)
    }

    #[instrument(skip(self))]
    pub async fn count_orders(&self) -> Result<u64, ServiceError> {
        Order::find().count(&*self.db).await.map_err(Into::into)
    }

    /// Marks an order paid and credits loyalty points for it. Idempotent
    /// payment is rejected so points are never awarded twice.
    #[instrument(skip(self))]
    pub async fn mark_paid(&self, order_id: Uuid) -> Result<order::Model, ServiceError> {
        let order = self.get_order(order_id).await?;
        if order.payment_status == PaymentStatus::Paid {
            return Err(ServiceError::InvalidOperation(format!(
                "Order {} is already paid",
                order.order_number
            )));
        }
        if order.status == OrderStatus::Cancelled {
            return Err(ServiceError::InvalidOperation(format!(
                "Order {} is cancelled",
                order.order_number
            )));
        }

        let mut active: order::ActiveModel = order.into();
        active.payment_status = Set(PaymentStatus::Paid);
        active.updated_at = Set(Utc::now());
        let order = active.update(&*self.db).await?;

        let points = self
            .loyalty
            .award_points_for_order(order.customer_id, &order, self.points_per_unit)
            .await?;
        info!(order_number = %order.order_number, points, "order paid");

        self.event_sender.send(Event::OrderPaid(order.id)).await;
        Ok(order)
    }

    /// Advances the order through its lifecycle. Entering `shipped` stamps the
    /// shipped date, entering `delivered` stamps the delivery date and fires
    /// `order_delivered` workflows.
    #[instrument(skip(self))]
    pub async fn update_status(
        &self,
        order_id: Uuid,
        new_status: OrderStatus,
        tracking_number: Option<String>,
    ) -> Result<order::Model, ServiceError> {
        let order = self.get_order(order_id).await?;
        if !is_valid_transition(order.status, new_status) {
            return Err(ServiceError::InvalidOperation(format!(
                "Cannot transition order {} from {:?} to {:?}",
                order.order_number, order.status, new_status
            )));
        }

        let now = Utc::now();
        let mut active: order::ActiveModel = order.clone().into();
        active.status = Set(new_status);
        active.updated_at = Set(now);
        if let Some(tracking) = tracking_number {
            active.tracking_number = Set(Some(tracking));
        }
        match new_status {
            OrderStatus::Shipped => active.shipped_date = Set(Some(now)),
            OrderStatus::Delivered => active.delivered_date = Set(Some(now)),
            _ => {}
        }
        let updated = active.update(&*self.db).await?;

        if new_status == OrderStatus::Delivered {
            let customer = Customer::find_by_id(updated.customer_id)
                .one(&*self.db)
                .await?;
            self.automation
                .execute_workflows(
                    TriggerType::OrderDelivered,
                    TriggerContext {
                        customer: customer.as_ref(),
                        order: Some(&updated),
                    },
                )
                .await?;
        }

        self.event_sender
            .send(Event::OrderStatusChanged {
                order_id: updated.id,
                new_status: format!("{:?}", new_status),
            })
            .await;
        Ok(updated)
    }

    /// Cancels an unshipped order and restores the reserved stock.
    #[instrument(skip(self))]
    pub async fn cancel_order(&self, order_id: Uuid) -> Result<order::Model, ServiceError> {
        let order = self.get_order(order_id).await?;
        if !matches!(
            order.status,
            OrderStatus::Draft | OrderStatus::Pending | OrderStatus::Processing
        ) {
            return Err(ServiceError::InvalidOperation(format!(
                "Order {} can no longer be cancelled ({:?})",
                order.order_number, order.status
            )));
        }

        let txn = self.db.begin().await?;
        let items = order.find_related(OrderItem).all(&txn).await?;
        for item in items {
            let product = Product::find_by_id(item.product_id)
                .lock_exclusive()
                .one(&txn)
                .await?;
            if let Some(product) = product {
                let restored = product.stock_quantity + item.quantity;
                let mut active: product::ActiveModel = product.into();
                active.stock_quantity = Set(restored);
                active.updated_at = Set(Utc::now());
                active.update(&txn).await?;
            }
        }

        let mut active: order::ActiveModel = order.into();
        active.status = Set(OrderStatus::Cancelled);
        active.updated_at = Set(Utc::now());
        let updated = active.update(&txn).await?;
        txn.commit().await?;

        self.event_sender
            .send(Event::OrderStatusChanged {
                order_id: updated.id,
                new_status: format!("{:?}", OrderStatus::Cancelled),
            })
            .await;
        Ok(updated)
    }
}

fn generate_order_number() -> String {
    let suffix = Uuid::new_v4().simple().to_string()[..8].to_uppercase();
    format!("ORD-{}", suffix)
}

fn is_valid_transition(from: OrderStatus, to: OrderStatus) -> bool {
    use OrderStatus::*;
    matches!(
        (from, to),
        (Draft, Pending)
            | (Draft, Cancelled)
            | (Pending, Processing)
            | (Pending, Cancelled)
            | (Processing, Shipped)
            | (Processing, Cancelled)
            | (Shipped, Delivered)
            | (Delivered, Refunded)
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn order_number_has_prefix_and_eight_hex_chars() {
        let n = generate_order_number();
        assert!(n.starts_with("ORD-"));
        assert_eq!(n.len(), 12);
        assert!(n[4..].chars().all(|c| c.is_ascii_hexdigit()));
        assert_eq!(n, n.to_uppercase());
    }

    #[test]
    fn order_without_lines_fails_validation() {
        let input = CreateOrderInput {
            customer_id: Uuid::new_v4(),
            items: Vec::new(),
            discount: None,
            shipping_address: None,
            notes: None,
        };
        let errors = input.validate().unwrap_err();
        assert!(errors.field_errors().contains_key("items"));

        let input = CreateOrderInput {
            customer_id: Uuid::new_v4(),
            items: vec![OrderItemInput {
                product_id: Uuid::new_v4(),
                quantity: 1,
                unit_price: None,
                discount: None,
            }],
            discount: None,
            shipping_address: None,
            notes: None,
        };
        assert!(input.validate().is_ok());
    }

    #[test]
    fn valid_lifecycle_transitions() {
        use OrderStatus::*;
        assert!(is_valid_transition(Pending, Processing));
        assert!(is_valid_transition(Processing, Shipped));
        assert!(is_valid_transition(Shipped, Delivered));
        assert!(is_valid_transition(Delivered, Refunded));
    }

    #[test]
    fn invalid_transitions_are_rejected() {
        use OrderStatus::*;
        assert!(!is_valid_transition(Pending, Delivered));
        assert!(!is_valid_transition(Delivered, Pending));
        assert!(!is_valid_transition(Cancelled, Processing));
        assert!(!is_valid_transition(Shipped, Cancelled));
    }
}
