use std::sync::Arc;

use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder,
    QuerySelect, Set,
};
use serde::Deserialize;
use tracing::instrument;
use uuid::Uuid;
use validator::Validate;

use crate::{
    entities::{
        customer::Entity as Customer,
        interaction::{self, Entity as Interaction, InteractionKind},
    },
    errors::ServiceError,
};

#[derive(Debug, Deserialize, Validate)]
pub struct CreateInteractionInput {
    pub customer_id: Uuid,
    pub kind: InteractionKind,
    #[validate(length(min = 1, max = 200))]
    pub subject: String,
    #[validate(length(min = 1))]
    pub description: String,
    pub outcome: Option<String>,
    pub next_action: Option<String>,
}

/// Customer touchpoint journal.
#[derive(Clone)]
pub struct InteractionService {
    db: Arc<DatabaseConnection>,
}

impl InteractionService {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    #[instrument(skip(self, input))]
    pub async fn record_interaction(
        &self,
        input: CreateInteractionInput,
    ) -> Result<interaction::Model, ServiceError> {
        input.validate()?;
        Customer::find_by_id(input.customer_id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| {
                ServiceError::NotFound(format!("Customer {} not found", input.customer_id))
            })?;

        interaction::ActiveModel {
            id: Set(Uuid::new_v4()),
            customer_id: Set(input.customer_id),
            kind: Set(input.kind),
            subject: Set(input.subject),
            description: Set(input.description),
            outcome: Set(input.outcome),
            next_action: Set(input.next_action),
            created_at: Set(Utc::now()),
        }
        .insert(&*self.db)
        .await
        .map_err(Into::into)
    }

    /// Journal for one customer, newest first.
    #[instrument(skip(self))]
    pub async fn list_customer_interactions(
        &self,
        customer_id: Uuid,
        limit: u64,
        offset: u64,
    ) -> Result<Vec<interaction::Model>, ServiceError> {
        Interaction::find()
            .filter(interaction::Column::CustomerId.eq(customer_id))
            .order_by_desc(interaction::Column::CreatedAt)
            .limit(limit)
            .offset(offset)
            .all(&*self.db)
            .await
            .map_err(Into::into)
    }
}
