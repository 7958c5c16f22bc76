use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use super::customer::CustomerStatus;
use super::task::TaskPriority;

/// Automation workflow definition: one trigger, one action.
///
/// The engine only ever mutates `execution_count` and `last_executed`; the
/// definition itself is edited by staff through the workflow endpoints.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "automation_workflows")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub trigger_type: TriggerType,
    /// Typed `TriggerConditions`, stored as JSON
    #[sea_orm(column_type = "Json")]
    pub trigger_conditions: Json,
    /// Typed `WorkflowAction`, stored as JSON
    #[sea_orm(column_type = "Json")]
    pub action: Json,
    pub is_active: bool,
    pub execution_count: i32,
    pub last_executed: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    pub fn conditions(&self) -> Result<TriggerConditions, serde_json::Error> {
        serde_json::from_value(self.trigger_conditions.clone())
    }

    pub fn workflow_action(&self) -> Result<WorkflowAction, serde_json::Error> {
        serde_json::from_value(self.action.clone())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, EnumIter, DeriveActiveEnum)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(30))")]
#[serde(rename_all = "snake_case")]
pub enum TriggerType {
    #[sea_orm(string_value = "customer_created")]
    CustomerCreated,
    #[sea_orm(string_value = "order_placed")]
    OrderPlaced,
    #[sea_orm(string_value = "order_delivered")]
    OrderDelivered,
    #[sea_orm(string_value = "customer_inactive")]
    CustomerInactive,
    #[sea_orm(string_value = "ticket_created")]
    TicketCreated,
    #[sea_orm(string_value = "feedback_received")]
    FeedbackReceived,
}

/// Trigger predicate. Every set field must hold for the workflow to fire; an
/// empty set always passes. A field that references a context object the
/// caller did not supply fails the match.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct TriggerConditions {
    /// Customer status must equal this value
    pub customer_status: Option<CustomerStatus>,
    /// Order total must be at least this amount
    pub min_order_total: Option<Decimal>,
}

impl TriggerConditions {
    pub fn is_empty(&self) -> bool {
        self.customer_status.is_none() && self.min_order_total.is_none()
    }
}

/// Workflow action, tagged by kind. Replaces the free-form JSON
/// `action_config` maps of earlier iterations so a typo in a config key is a
/// deserialization error, not a silently ignored setting.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum WorkflowAction {
    SendEmail {
        subject: String,
        body: String,
    },
    SendSms {
        message: String,
    },
    CreateTask {
        title: String,
        #[serde(default)]
        description: String,
        #[serde(default = "default_task_priority")]
        priority: TaskPriority,
        #[serde(default = "default_due_days")]
        due_days: i64,
    },
    AwardPoints {
        points: i32,
        #[serde(default = "default_award_description")]
        description: String,
    },
    UpdateCustomerStatus {
        status: CustomerStatus,
    },
}

fn default_task_priority() -> TaskPriority {
    TaskPriority::Medium
}

fn default_due_days() -> i64 {
    7
}

fn default_award_description() -> String {
    "Automated points award".to_string()
}
