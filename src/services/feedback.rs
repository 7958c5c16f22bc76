use std::sync::Arc;

use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set,
};
use serde::Deserialize;
use tracing::instrument;
use uuid::Uuid;
use validator::Validate;

use crate::{
    entities::{
        automation_workflow::TriggerType,
        customer::Entity as Customer,
        customer_feedback::{self, Entity as CustomerFeedback, FeedbackKind},
    },
    errors::ServiceError,
    events::{Event, EventSender},
    services::automation::{AutomationService, TriggerContext},
};

#[derive(Debug, Deserialize, Validate)]
pub struct CreateFeedbackInput {
    pub customer_id: Uuid,
    pub kind: FeedbackKind,
    #[validate(range(min = 1, max = 5))]
    pub rating: Option<i16>,
    pub comment: Option<String>,
    pub order_id: Option<Uuid>,
}

/// Customer feedback capture and the satisfaction aggregates built on it.
#[derive(Clone)]
pub struct FeedbackService {
    db: Arc<DatabaseConnection>,
    event_sender: Arc<EventSender>,
    automation: AutomationService,
}

impl FeedbackService {
    pub fn new(
        db: Arc<DatabaseConnection>,
        event_sender: Arc<EventSender>,
        automation: AutomationService,
    ) -> Self {
        Self {
            db,
            event_sender,
            automation,
        }
    }

    /// Records feedback and fires `feedback_received` workflows.
    #[instrument(skip(self, input))]
    pub async fn record_feedback(
        &self,
        input: CreateFeedbackInput,
    ) -> Result<customer_feedback::Model, ServiceError> {
        input.validate()?;
        let customer = Customer::find_by_id(input.customer_id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| {
                ServiceError::NotFound(format!("Customer {} not found", input.customer_id))
            })?;

        let model = customer_feedback::ActiveModel {
            id: Set(Uuid::new_v4()),
            customer_id: Set(input.customer_id),
            kind: Set(input.kind),
            rating: Set(input.rating),
            comment: Set(input.comment),
            order_id: Set(input.order_id),
            created_at: Set(Utc::now()),
        }
        .insert(&*self.db)
        .await?;

        self.automation
            .execute_workflows(
                TriggerType::FeedbackReceived,
                TriggerContext {
                    customer: Some(&customer),
                    order: None,
                },
            )
            .await?;

        self.event_sender.send(Event::FeedbackReceived(model.id)).await;
        Ok(model)
    }

    #[instrument(skip(self))]
    pub async fn list_customer_feedback(
        &self,
        customer_id: Uuid,
    ) -> Result<Vec<customer_feedback::Model>, ServiceError> {
        CustomerFeedback::find()
            .filter(customer_feedback::Column::CustomerId.eq(customer_id))
            .order_by_desc(customer_feedback::Column::CreatedAt)
            .all(&*self.db)
            .await
            .map_err(Into::into)
    }

    /// Mean rating over all rated feedback of one kind, `None` when there is
    /// no rated feedback yet.
    #[instrument(skip(self))]
    pub async fn average_rating(
        &self,
        kind: FeedbackKind,
    ) -> Result<Option<Decimal>, ServiceError> {
        let rated: Vec<customer_feedback::Model> = CustomerFeedback::find()
            .filter(customer_feedback::Column::Kind.eq(kind))
            .filter(customer_feedback::Column::Rating.is_not_null())
            .all(&*self.db)
            .await?;

        let ratings: Vec<i16> = rated.iter().filter_map(|f| f.rating).collect();
        if ratings.is_empty() {
            return Ok(None);
        }
        let sum: i64 = ratings.iter().map(|r| i64::from(*r)).sum();
        Ok(Some(Decimal::from(sum) / Decimal::from(ratings.len())))
    }
}
