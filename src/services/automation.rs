use std::sync::Arc;

use chrono::{Duration, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set,
};
use tracing::{error, info, instrument, warn};
use uuid::Uuid;

use crate::{
    entities::{
        automation_workflow::{self, Entity as AutomationWorkflow, TriggerConditions, TriggerType, WorkflowAction},
        customer,
        order,
        task::{self, TaskStatus},
    },
    errors::ServiceError,
    events::{Event, EventSender},
    services::{loyalty::LoyaltyService, notifier::EmailNotifier},
};

/// Context objects supplied by the caller for condition evaluation and
/// action dispatch. Triggers carry whatever the business event has at hand.
#[derive(Clone, Copy, Default)]
pub struct TriggerContext<'a> {
    pub customer: Option<&'a customer::Model>,
    pub order: Option<&'a order::Model>,
}

/// Trigger/action automation engine.
///
/// Evaluates every active workflow bound to a trigger and dispatches its
/// action. A failing workflow is logged and never prevents the rest of the
/// batch from running.
#[derive(Clone)]
pub struct AutomationService {
    db: Arc<DatabaseConnection>,
    loyalty: LoyaltyService,
    notifier: EmailNotifier,
    event_sender: Arc<EventSender>,
}

impl AutomationService {
    pub fn new(
        db: Arc<DatabaseConnection>,
        loyalty: LoyaltyService,
        notifier: EmailNotifier,
        event_sender: Arc<EventSender>,
    ) -> Self {
        Self {
            db,
            loyalty,
            notifier,
            event_sender,
        }
    }

    /// Runs all active workflows bound to `trigger` against the supplied
    /// context. Only the workflow query itself can fail; per-workflow errors
    /// are isolated and logged.
    #[instrument(skip(self, ctx))]
    pub async fn execute_workflows(
        &self,
        trigger: TriggerType,
        ctx: TriggerContext<'_>,
    ) -> Result<(), ServiceError> {
        let workflows = AutomationWorkflow::find()
            .filter(automation_workflow::Column::TriggerType.eq(trigger))
            .filter(automation_workflow::Column::IsActive.eq(true))
            .all(&*self.db)
            .await?;

        for workflow in workflows {
            let conditions = match workflow.conditions() {
                Ok(c) => c,
                Err(e) => {
                    warn!(
                        workflow_id = %workflow.id,
                        error = %e,
                        "undecodable trigger conditions, skipping workflow"
                    );
                    continue;
                }
            };

            if !conditions_met(&conditions, &ctx) {
                continue;
            }

            // Dispatch failures are logged, not propagated; the counter still
            // advances so staff can see the workflow fired.
            match workflow.workflow_action() {
                Ok(action) => {
                    if let Err(e) = self.dispatch(&action, &ctx).await {
                        error!(
                            workflow_id = %workflow.id,
                            error = %e,
                            "workflow action failed"
                        );
                    }
                }
                Err(e) => {
                    warn!(
                        workflow_id = %workflow.id,
                        error = %e,
                        "undecodable workflow action, treating as no-op"
                    );
                }
            }

            if let Err(e) = self.record_execution(&workflow).await {
                error!(
                    workflow_id = %workflow.id,
                    error = %e,
                    "failed to record workflow execution"
                );
            }

            self.event_sender
                .send(Event::WorkflowExecuted {
                    workflow_id: workflow.id,
                    trigger: format!("{:?}", trigger),
                })
                .await;
        }

        Ok(())
    }

    async fn dispatch(
        &self,
        action: &WorkflowAction,
        ctx: &TriggerContext<'_>,
    ) -> Result<(), ServiceError> {
        match action {
            WorkflowAction::CreateTask {
                title,
                description,
                priority,
                due_days,
            } => {
                let now = Utc::now();
                task::ActiveModel {
                    id: Set(Uuid::new_v4()),
                    title: Set(title.clone()),
                    description: Set(Some(description.clone())),
                    customer_id: Set(ctx.customer.map(|c| c.id)),
                    priority: Set(*priority),
                    status: Set(TaskStatus::Pending),
                    due_date: Set(now + Duration::days(*due_days)),
                    completed_at: Set(None),
                    created_at: Set(now),
                }
                .insert(&*self.db)
                .await?;
                info!(title, "automation created task");
                Ok(())
            }

            WorkflowAction::AwardPoints {
                points,
                description,
            } => {
                let customer = ctx.customer.ok_or_else(|| {
                    ServiceError::InvalidOperation(
                        "award_points requires a customer context".to_string(),
                    )
                })?;
                self.loyalty
                    .credit(
                        customer.id,
                        *points,
                        description.clone(),
                        ctx.order.map(|o| o.id),
                    )
                    .await?;
                Ok(())
            }

            WorkflowAction::UpdateCustomerStatus { status } => {
                let current = ctx.customer.ok_or_else(|| {
                    ServiceError::InvalidOperation(
                        "update_customer_status requires a customer context".to_string(),
                    )
                })?;
                let mut active: customer::ActiveModel = current.clone().into();
                active.status = Set(*status);
                active.updated_at = Set(Utc::now());
                active.update(&*self.db).await?;
                info!(customer_id = %current.id, ?status, "automation updated customer status");
                Ok(())
            }

            WorkflowAction::SendEmail { subject, body } => {
                // Best-effort; delivery failure degrades inside the notifier.
                if let Some(customer) = ctx.customer {
                    self.notifier.send_simple_async(subject, body, &customer.email);
                } else {
                    warn!("send_email action fired without a customer context");
                }
                Ok(())
            }

            WorkflowAction::SendSms { message } => {
                // No SMS provider is wired up; log and move on.
                info!(message, "send_sms action is a logged no-op");
                Ok(())
            }
        }
    }

    /// Defines a workflow. Conditions and action are validated by encoding
    /// through their typed forms, so a malformed definition is rejected here
    /// rather than discovered at trigger time.
    #[instrument(skip(self, conditions, action))]
    pub async fn create_workflow(
        &self,
        name: String,
        description: Option<String>,
        trigger_type: TriggerType,
        conditions: TriggerConditions,
        action: WorkflowAction,
    ) -> Result<automation_workflow::Model, ServiceError> {
        if name.trim().is_empty() {
            return Err(ServiceError::ValidationError(
                "Workflow name must not be empty".to_string(),
            ));
        }

        let conditions_json = serde_json::to_value(&conditions)
            .map_err(|e| ServiceError::ValidationError(format!("Invalid conditions: {}", e)))?;
        let action_json = serde_json::to_value(&action)
            .map_err(|e| ServiceError::ValidationError(format!("Invalid action: {}", e)))?;

        let now = Utc::now();
        automation_workflow::ActiveModel {
            id: Set(Uuid::new_v4()),
            name: Set(name),
            description: Set(description),
            trigger_type: Set(trigger_type),
            trigger_conditions: Set(conditions_json),
            action: Set(action_json),
            is_active: Set(true),
            execution_count: Set(0),
            last_executed: Set(None),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(&*self.db)
        .await
        .map_err(Into::into)
    }

    #[instrument(skip(self))]
    pub async fn get_workflow(
        &self,
        workflow_id: Uuid,
    ) -> Result<automation_workflow::Model, ServiceError> {
        AutomationWorkflow::find_by_id(workflow_id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Workflow {} not found", workflow_id)))
    }

    #[instrument(skip(self))]
    pub async fn list_workflows(
        &self,
        trigger: Option<TriggerType>,
    ) -> Result<Vec<automation_workflow::Model>, ServiceError> {
        let mut query = AutomationWorkflow::find();
        if let Some(trigger) = trigger {
            query = query.filter(automation_workflow::Column::TriggerType.eq(trigger));
        }
        query.all(&*self.db).await.map_err(Into::into)
    }

    #[instrument(skip(self))]
    pub async fn set_workflow_active(
        &self,
        workflow_id: Uuid,
        is_active: bool,
    ) -> Result<automation_workflow::Model, ServiceError> {
        let workflow = self.get_workflow(workflow_id).await?;
        let mut active: automation_workflow::ActiveModel = workflow.into();
        active.is_active = Set(is_active);
        active.updated_at = Set(Utc::now());
        active.update(&*self.db).await.map_err(Into::into)
    }

    #[instrument(skip(self))]
    pub async fn delete_workflow(&self, workflow_id: Uuid) -> Result<(), ServiceError> {
        let workflow = self.get_workflow(workflow_id).await?;
        AutomationWorkflow::delete_by_id(workflow.id)
            .exec(&*self.db)
            .await?;
        Ok(())
    }

    async fn record_execution(
        &self,
        workflow: &automation_workflow::Model,
    ) -> Result<(), ServiceError> {
        let mut active: automation_workflow::ActiveModel = workflow.clone().into();
        active.execution_count = Set(workflow.execution_count + 1);
        active.last_executed = Set(Some(Utc::now()));
        active.updated_at = Set(Utc::now());
        active.update(&*self.db).await?;
        Ok(())
    }
}

/// Every configured condition must hold; an empty set always passes. A
/// condition whose context object was not supplied fails the match.
fn conditions_met(conditions: &TriggerConditions, ctx: &TriggerContext<'_>) -> bool {
    if let Some(expected) = conditions.customer_status {
        match ctx.customer {
            Some(c) if c.status == expected => {}
            _ => return false,
        }
    }

    if let Some(min_total) = conditions.min_order_total {
        match ctx.order {
            Some(o) if o.total_amount >= min_total => {}
            _ => return false,
        }
    }

    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::customer::{CustomerSource, CustomerStatus, CustomerType};
    use crate::entities::order::{OrderStatus, PaymentStatus};
    use rust_decimal_macros::dec;

    fn sample_customer(status: CustomerStatus) -> customer::Model {
        customer::Model {
            id: Uuid::new_v4(),
            first_name: "Ada".into(),
            last_name: "Lovelace".into(),
            email: "ada@example.com".into(),
            phone: None,
            address: None,
            city: None,
            country: None,
            postal_code: None,
            customer_type: CustomerType::Individual,
            company_name: None,
            status,
            source: CustomerSource::Website,
            notes: None,
            tags: None,
            date_joined: Utc::now(),
            last_contact_date: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn sample_order(total: rust_decimal::Decimal) -> order::Model {
        order::Model {
            id: Uuid::new_v4(),
            order_number: "ORD-TEST0001".into(),
            customer_id: Uuid::new_v4(),
            status: OrderStatus::Pending,
            payment_status: PaymentStatus::Unpaid,
            subtotal: total,
            tax: dec!(0),
            discount: dec!(0),
            shipping_cost: dec!(0),
            total_amount: total,
            shipping_address: None,
            tracking_number: None,
            shipped_date: None,
            delivered_date: None,
            notes: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn empty_conditions_always_pass() {
        let conditions = TriggerConditions::default();
        assert!(conditions_met(&conditions, &TriggerContext::default()));
    }

    #[test]
    fn order_total_threshold() {
        let conditions = TriggerConditions {
            customer_status: None,
            min_order_total: Some(dec!(100)),
        };

        let big = sample_order(dec!(150));
        let small = sample_order(dec!(50));

        let ctx_big = TriggerContext {
            customer: None,
            order: Some(&big),
        };
        let ctx_small = TriggerContext {
            customer: None,
            order: Some(&small),
        };

        assert!(conditions_met(&conditions, &ctx_big));
        assert!(!conditions_met(&conditions, &ctx_small));
    }

    #[test]
    fn missing_context_object_fails_the_match() {
        let conditions = TriggerConditions {
            customer_status: None,
            min_order_total: Some(dec!(100)),
        };
        // No order in context: a threshold on the order cannot hold.
        assert!(!conditions_met(&conditions, &TriggerContext::default()));
    }

    #[test]
    fn customer_status_equality() {
        let conditions = TriggerConditions {
            customer_status: Some(CustomerStatus::Vip),
            min_order_total: None,
        };

        let vip = sample_customer(CustomerStatus::Vip);
        let lead = sample_customer(CustomerStatus::Lead);

        assert!(conditions_met(
            &conditions,
            &TriggerContext {
                customer: Some(&vip),
                order: None
            }
        ));
        assert!(!conditions_met(
            &conditions,
            &TriggerContext {
                customer: Some(&lead),
                order: None
            }
        ));
    }
}
