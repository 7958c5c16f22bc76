use std::sync::Arc;

use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect, Set,
};
use serde::Deserialize;
use tracing::{info, instrument};
use uuid::Uuid;
use validator::Validate;

use crate::{
    entities::{
        automation_workflow::TriggerType,
        customer::Entity as Customer,
        support_ticket::{self, Entity as SupportTicket, TicketSource, TicketStatus},
        task::TaskPriority,
    },
    errors::ServiceError,
    events::{Event, EventSender},
    services::automation::{AutomationService, TriggerContext},
};

#[derive(Debug, Deserialize, Validate)]
pub struct CreateTicketInput {
    pub customer_id: Uuid,
    #[validate(length(min = 1, max = 200))]
    pub subject: String,
    #[validate(length(min = 1))]
    pub description: String,
    pub priority: Option<TaskPriority>,
    pub source: Option<TicketSource>,
    pub category: Option<String>,
}

/// Support tickets: numbered, prioritised, with first-response and
/// resolution timestamps for response-time reporting.
#[derive(Clone)]
pub struct TicketService {
    db: Arc<DatabaseConnection>,
    event_sender: Arc<EventSender>,
    automation: AutomationService,
}

impl TicketService {
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

    /// Opens a ticket and fires `ticket_created` workflows.
    #[instrument(skip(self, input))]
    pub async fn create_ticket(
        &self,
        input: CreateTicketInput,
    ) -> Result<support_ticket::Model, ServiceError> {
        input.validate()?;
        let customer = Customer::find_by_id(input.customer_id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| {
                ServiceError::NotFound(format!("Customer {} not found", input.customer_id))
            })?;

        let now = Utc::now();
        let model = support_ticket::ActiveModel {
            id: Set(Uuid::new_v4()),
            ticket_number: Set(generate_ticket_number()),
            customer_id: Set(input.customer_id),
            subject: Set(input.subject),
            description: Set(input.description),
            priority: Set(input.priority.unwrap_or(TaskPriority::Medium)),
            status: Set(TicketStatus::New),
            source: Set(input.source.unwrap_or(TicketSource::Web)),
            category: Set(input.category),
            first_response_at: Set(None),
            resolved_at: Set(None),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(&*self.db)
        .await?;

        self.automation
            .execute_workflows(
                TriggerType::TicketCreated,
                TriggerContext {
                    customer: Some(&customer),
                    order: None,
                },
            )
            .await?;

        self.event_sender.send(Event::TicketCreated(model.id)).await;
        info!(ticket_number = %model.ticket_number, "ticket opened");
        Ok(model)
    }

    #[instrument(skip(self))]
    pub async fn get_ticket(
        &self,
        ticket_id: Uuid,
    ) -> Result<support_ticket::Model, ServiceError> {
        SupportTicket::find_by_id(ticket_id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Ticket {} not found", ticket_id)))
    }

    #[instrument(skip(self))]
    pub async fn list_tickets(
        &self,
        status: Option<TicketStatus>,
        limit: u64,
        offset: u64,
    ) -> Result<Vec<support_ticket::Model>, ServiceError> {
        let mut query = SupportTicket::find();
        if let Some(status) = status {
            query = query.filter(support_ticket::Column::Status.eq(status));
        }
        query
            .order_by_desc(support_ticket::Column::CreatedAt)
            .limit(limit)
            .offset(offset)
            .all(&*self.db)
            .await
            .map_err(Into::into)
    }

    #[instrument(skip(self))]
    pub async fn list_customer_tickets(
        &self,
        customer_id: Uuid,
    ) -> Result<Vec<support_ticket::Model>, ServiceError> {
        SupportTicket::find()
            .filter(support_ticket::Column::CustomerId.eq(customer_id))
            .order_by_desc(support_ticket::Column::CreatedAt)
            .all(&*self.db)
            .await
            .map_err(Into::into)
    }

    #[instrument(skip(self))]
    pub async fn count_open_tickets(&self) -> Result<u64, ServiceError> {
        SupportTicket::find()
            .filter(
                support_ticket::Column::Status
                    .is_not_in([TicketStatus::Resolved, TicketStatus::Closed]),
            )
            .count(&*self.db)
            .await
            .map_err(Into::into)
    }

    /// Moves a ticket to a new status. The first move out of `new` stamps
    /// `first_response_at`, entering a resolved state stamps `resolved_at`.
    #[instrument(skip(self))]
    pub async fn update_status(
        &self,
        ticket_id: Uuid,
        new_status: TicketStatus,
    ) -> Result<support_ticket::Model, ServiceError> {
        let ticket = self.get_ticket(ticket_id).await?;
        if ticket.status == TicketStatus::Closed && new_status != TicketStatus::Open {
            return Err(ServiceError::InvalidOperation(format!(
                "Ticket {} is closed; it can only be reopened",
                ticket.ticket_number
            )));
        }

        let now = Utc::now();
        let mut active: support_ticket::ActiveModel = ticket.clone().into();
        active.status = Set(new_status);
        active.updated_at = Set(now);
        if ticket.status == TicketStatus::New
            && new_status != TicketStatus::New
            && ticket.first_response_at.is_none()
        {
            active.first_response_at = Set(Some(now));
        }
        if new_status.is_resolved() && ticket.resolved_at.is_none() {
            active.resolved_at = Set(Some(now));
        }
        if !new_status.is_resolved() {
            active.resolved_at = Set(None);
        }

        active.update(&*self.db).await.map_err(Into::into)
    }

    #[instrument(skip(self))]
    pub async fn update_priority(
        &self,
        ticket_id: Uuid,
        priority: TaskPriority,
    ) -> Result<support_ticket::Model, ServiceError> {
        let ticket = self.get_ticket(ticket_id).await?;
        let mut active: support_ticket::ActiveModel = ticket.into();
        active.priority = Set(priority);
        active.updated_at = Set(Utc::now());
        active.update(&*self.db).await.map_err(Into::into)
    }
}

fn generate_ticket_number() -> String {
    let suffix = Uuid::new_v4().simple().to_string()[..8].to_uppercase();
    format!("TKT-{}", suffix)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ticket_number_format() {
        let n = generate_ticket_number();
        assert!(n.starts_with("TKT-"));
        assert_eq!(n.len(), 12);
        assert!(n[4..].chars().all(|c| c.is_ascii_hexdigit()));
    }
}
