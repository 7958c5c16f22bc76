use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder,
    QuerySelect, Set,
};
use serde::Deserialize;
use tracing::{info, instrument};
use uuid::Uuid;
use validator::Validate;

use crate::{
    entities::{
        customer::Entity as Customer,
        deal::{self, DealStage, Entity as Deal},
    },
    errors::ServiceError,
    events::{Event, EventSender},
};

#[derive(Debug, Deserialize, Validate)]
pub struct CreateDealInput {
    pub customer_id: Uuid,
    #[validate(length(min = 1, max = 200))]
    pub title: String,
    pub amount: Decimal,
    pub expected_close_date: NaiveDate,
    #[validate(range(min = 0, max = 100))]
    pub probability: Option<i16>,
    pub description: Option<String>,
}

/// Sales pipeline: deals move through stages until closed won or lost.
#[derive(Clone)]
pub struct DealService {
    db: Arc<DatabaseConnection>,
    event_sender: Arc<EventSender>,
}

impl DealService {
    pub fn new(db: Arc<DatabaseConnection>, event_sender: Arc<EventSender>) -> Self {
        Self { db, event_sender }
    }

    #[instrument(skip(self, input))]
    pub async fn create_deal(&self, input: CreateDealInput) -> Result<deal::Model, ServiceError> {
        input.validate()?;
        if input.amount < Decimal::ZERO {
            return Err(ServiceError::ValidationError(
                "Deal amount must not be negative".to_string(),
            ));
        }
        Customer::find_by_id(input.customer_id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| {
                ServiceError::NotFound(format!("Customer {} not found", input.customer_id))
            })?;

        let now = Utc::now();
        deal::ActiveModel {
            id: Set(Uuid::new_v4()),
            customer_id: Set(input.customer_id),
            title: Set(input.title),
            amount: Set(input.amount),
            stage: Set(DealStage::Lead),
            probability: Set(input.probability.unwrap_or(10)),
            expected_close_date: Set(input.expected_close_date),
            description: Set(input.description),
            closed_at: Set(None),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(&*self.db)
        .await
        .map_err(Into::into)
    }

    #[instrument(skip(self))]
    pub async fn get_deal(&self, deal_id: Uuid) -> Result<deal::Model, ServiceError> {
        Deal::find_by_id(deal_id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Deal {} not found", deal_id)))
    }

    #[instrument(skip(self))]
    pub async fn list_deals(
        &self,
        stage: Option<DealStage>,
        limit: u64,
        offset: u64,
    ) -> Result<Vec<deal::Model>, ServiceError> {
        let mut query = Deal::find();
        if let Some(stage) = stage {
            query = query.filter(deal::Column::Stage.eq(stage));
        }
        query
            .order_by_desc(deal::Column::CreatedAt)
            .limit(limit)
            .offset(offset)
            .all(&*self.db)
            .await
            .map_err(Into::into)
    }

    #[instrument(skip(self))]
    pub async fn list_customer_deals(
        &self,
        customer_id: Uuid,
    ) -> Result<Vec<deal::Model>, ServiceError> {
        Deal::find()
            .filter(deal::Column::CustomerId.eq(customer_id))
            .order_by_desc(deal::Column::CreatedAt)
            .all(&*self.db)
            .await
            .map_err(Into::into)
    }

    /// Moves a deal to a new stage. Closed deals are immutable; entering a
    /// terminal stage stamps `closed_at` and pins the probability.
    #[instrument(skip(self))]
    pub async fn update_stage(
        &self,
        deal_id: Uuid,
        new_stage: DealStage,
    ) -> Result<deal::Model, ServiceError> {
        let deal = self.get_deal(deal_id).await?;
        if deal.stage.is_terminal() {
            return Err(ServiceError::InvalidOperation(format!(
                "Deal {} is already closed",
                deal.id
            )));
        }

        let mut active: deal::ActiveModel = deal.into();
        active.stage = Set(new_stage);
        active.updated_at = Set(Utc::now());
        match new_stage {
            DealStage::ClosedWon => {
                active.probability = Set(100);
                active.closed_at = Set(Some(Utc::now()));
            }
            DealStage::ClosedLost => {
                active.probability = Set(0);
                active.closed_at = Set(Some(Utc::now()));
            }
            _ => {}
        }
        let updated = active.update(&*self.db).await?;

        self.event_sender
            .send(Event::DealStageChanged {
                deal_id: updated.id,
                new_stage: format!("{:?}", new_stage),
            })
            .await;
        info!(deal_id = %updated.id, stage = ?new_stage, "deal stage updated");
        Ok(updated)
    }

    /// Total weighted value of the open pipeline.
    #[instrument(skip(self))]
    pub async fn pipeline_value(&self) -> Result<Decimal, ServiceError> {
        let open = Deal::find()
            .filter(
                deal::Column::Stage.is_not_in([DealStage::ClosedWon, DealStage::ClosedLost]),
            )
            .all(&*self.db)
            .await?;
        Ok(open.iter().map(|d| d.weighted_value()).sum())
    }
}
