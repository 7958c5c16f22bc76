use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, DatabaseConnection, EntityTrait, QueryFilter,
    QueryOrder, QuerySelect, Set,
};
use serde::Deserialize;
use tracing::{info, instrument};
use uuid::Uuid;
use validator::Validate;

use crate::{
    entities::{
        customer::Entity as Customer,
        deal::Entity as Deal,
        quote::{self, Entity as Quote, QuoteStatus},
    },
    errors::ServiceError,
};

#[derive(Debug, Deserialize, Validate)]
pub struct CreateQuoteInput {
    pub customer_id: Uuid,
    pub deal_id: Option<Uuid>,
    pub subtotal: Decimal,
    pub tax: Option<Decimal>,
    pub discount: Option<Decimal>,
    pub valid_until: NaiveDate,
    pub notes: Option<String>,
}

#[derive(Debug, Default, Deserialize, Validate)]
pub struct UpdateQuoteInput {
    pub subtotal: Option<Decimal>,
    pub tax: Option<Decimal>,
    pub discount: Option<Decimal>,
    pub valid_until: Option<NaiveDate>,
    pub notes: Option<String>,
}

/// Quotes: priced proposals with a draft/sent/answered lifecycle and a
/// validity date after which outstanding ones count as expired.
#[derive(Clone)]
pub struct QuoteService {
    db: Arc<DatabaseConnection>,
}

impl QuoteService {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    #[instrument(skip(self, input))]
    pub async fn create_quote(
        &self,
        input: CreateQuoteInput,
    ) -> Result<quote::Model, ServiceError> {
        input.validate()?;
        let subtotal = input.subtotal;
        let tax = input.tax.unwrap_or(Decimal::ZERO);
        let discount = input.discount.unwrap_or(Decimal::ZERO);
        if subtotal < Decimal::ZERO || tax < Decimal::ZERO || discount < Decimal::ZERO {
            return Err(ServiceError::ValidationError(
                "Quote amounts must not be negative".to_string(),
            ));
        }

        Customer::find_by_id(input.customer_id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| {
                ServiceError::NotFound(format!("Customer {} not found", input.customer_id))
            })?;
        if let Some(deal_id) = input.deal_id {
            let deal = Deal::find_by_id(deal_id)
                .one(&*self.db)
                .await?
                .ok_or_else(|| ServiceError::NotFound(format!("Deal {} not found", deal_id)))?;
            if deal.customer_id != input.customer_id {
                return Err(ServiceError::ValidationError(format!(
                    "Deal {} belongs to a different customer",
                    deal_id
                )));
            }
        }

        let now = Utc::now();
        let created = quote::ActiveModel {
            id: Set(Uuid::new_v4()),
            quote_number: Set(generate_quote_number()),
            customer_id: Set(input.customer_id),
            deal_id: Set(input.deal_id),
            status: Set(QuoteStatus::Draft),
            subtotal: Set(subtotal),
            tax: Set(tax),
            discount: Set(discount),
            total_amount: Set(subtotal + tax - discount),
            valid_until: Set(input.valid_until),
            notes: Set(input.notes),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(&*self.db)
        .await?;

        info!(quote_number = %created.quote_number, "quote created");
        Ok(created)
    }

    #[instrument(skip(self))]
    pub async fn get_quote(&self, quote_id: Uuid) -> Result<quote::Model, ServiceError> {
        Quote::find_by_id(quote_id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Quote {} not found", quote_id)))
    }

    /// Newest first, with optional status filter. `expired_only` narrows to
    /// outstanding quotes past their validity date.
    #[instrument(skip(self))]
    pub async fn list_quotes(
        &self,
        status: Option<QuoteStatus>,
        expired_only: bool,
        today: NaiveDate,
        limit: u64,
        offset: u64,
    ) -> Result<Vec<quote::Model>, ServiceError> {
        let mut query = Quote::find();
        if let Some(status) = status {
            query = query.filter(quote::Column::Status.eq(status));
        }
        if expired_only {
            query = query.filter(
                Condition::all()
                    .add(quote::Column::ValidUntil.lt(today))
                    .add(
                        quote::Column::Status.is_in([QuoteStatus::Draft, QuoteStatus::Sent]),
                    ),
            );
        }
        query
            .order_by_desc(quote::Column::CreatedAt)
            .limit(limit)
            .offset(offset)
            .all(&*self.db)
            .await
            .map_err(Into::into)
    }

    #[instrument(skip(self))]
    pub async fn list_customer_quotes(
        &self,
        customer_id: Uuid,
    ) -> Result<Vec<quote::Model>, ServiceError> {
        Quote::find()
            .filter(quote::Column::CustomerId.eq(customer_id))
            .order_by_desc(quote::Column::CreatedAt)
            .all(&*self.db)
            .await
            .map_err(Into::into)
    }

    #[instrument(skip(self))]
    pub async fn list_deal_quotes(
        &self,
        deal_id: Uuid,
    ) -> Result<Vec<quote::Model>, ServiceError> {
        Quote::find()
            .filter(quote::Column::DealId.eq(deal_id))
            .order_by_desc(quote::Column::CreatedAt)
            .all(&*self.db)
            .await
            .map_err(Into::into)
    }

    /// Reprices an outstanding quote; the total is recomputed from whatever
    /// the updated parts are. Answered quotes are immutable.
    #[instrument(skip(self, input))]
    pub async fn update_quote(
        &self,
        quote_id: Uuid,
        input: UpdateQuoteInput,
    ) -> Result<quote::Model, ServiceError> {
        input.validate()?;
        let quote = self.get_quote(quote_id).await?;
        if quote.status.is_answered() {
            return Err(ServiceError::InvalidOperation(format!(
                "Quote {} has been answered and can no longer change",
                quote.quote_number
            )));
        }

        let subtotal = input.subtotal.unwrap_or(quote.subtotal);
        let tax = input.tax.unwrap_or(quote.tax);
        let discount = input.discount.unwrap_or(quote.discount);
        if subtotal < Decimal::ZERO || tax < Decimal::ZERO || discount < Decimal::ZERO {
            return Err(ServiceError::ValidationError(
                "Quote amounts must not be negative".to_string(),
            ));
        }

        let mut active: quote::ActiveModel = quote.into();
        active.subtotal = Set(subtotal);
        active.tax = Set(tax);
        active.discount = Set(discount);
        active.total_amount = Set(subtotal + tax - discount);
        if let Some(valid_until) = input.valid_until {
            active.valid_until = Set(valid_until);
        }
        if let Some(notes) = input.notes {
            active.notes = Set(Some(notes));
        }
        active.updated_at = Set(Utc::now());
        active.update(&*self.db).await.map_err(Into::into)
    }

    /// Moves a quote through its lifecycle. Accepted and rejected are
    /// terminal; only outstanding quotes can be marked expired.
    #[instrument(skip(self))]
    pub async fn update_status(
        &self,
        quote_id: Uuid,
        new_status: QuoteStatus,
    ) -> Result<quote::Model, ServiceError> {
        let quote = self.get_quote(quote_id).await?;
        if quote.status.is_answered() {
            return Err(ServiceError::InvalidOperation(format!(
                "Quote {} has already been answered",
                quote.quote_number
            )));
        }
        if new_status == QuoteStatus::Expired && !quote.status.is_outstanding() {
            return Err(ServiceError::InvalidOperation(format!(
                "Quote {} cannot expire from {:?}",
                quote.quote_number, quote.status
            )));
        }

        let mut active: quote::ActiveModel = quote.into();
        active.status = Set(new_status);
        active.updated_at = Set(Utc::now());
        let updated = active.update(&*self.db).await?;
        info!(quote_number = %updated.quote_number, status = ?new_status, "quote status updated");
        Ok(updated)
    }
}

fn generate_quote_number() -> String {
    let suffix = Uuid::new_v4().simple().to_string()[..8].to_uppercase();
    format!("QTE-{}", suffix)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quote_number_has_prefix_and_eight_hex_chars() {
        let n = generate_quote_number();
        assert!(n.starts_with("QTE-"));
        assert_eq!(n.len(), 12);
        assert!(n[4..].chars().all(|c| c.is_ascii_hexdigit()));
        assert_eq!(n, n.to_uppercase());
    }
}
