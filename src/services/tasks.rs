use std::sync::Arc;

use chrono::{DateTime, Utc};
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
        task::{self, Entity as Task, TaskPriority, TaskStatus},
    },
    errors::ServiceError,
};

#[derive(Debug, Deserialize, Validate)]
pub struct CreateTaskInput {
    #[validate(length(min = 1, max = 200))]
    pub title: String,
    pub description: Option<String>,
    pub customer_id: Option<Uuid>,
    pub priority: Option<TaskPriority>,
    pub due_date: DateTime<Utc>,
}

/// Follow-up tasks, optionally tied to a customer. Workflows create these
/// too, through the same service.
#[derive(Clone)]
pub struct TaskService {
    db: Arc<DatabaseConnection>,
}

impl TaskService {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    #[instrument(skip(self, input))]
    pub async fn create_task(&self, input: CreateTaskInput) -> Result<task::Model, ServiceError> {
        input.validate()?;
        if let Some(customer_id) = input.customer_id {
            Customer::find_by_id(customer_id)
                .one(&*self.db)
                .await?
                .ok_or_else(|| {
                    ServiceError::NotFound(format!("Customer {} not found", customer_id))
                })?;
        }

        task::ActiveModel {
            id: Set(Uuid::new_v4()),
            title: Set(input.title),
            description: Set(input.description),
            customer_id: Set(input.customer_id),
            priority: Set(input.priority.unwrap_or(TaskPriority::Medium)),
            status: Set(TaskStatus::Pending),
            due_date: Set(input.due_date),
            completed_at: Set(None),
            created_at: Set(Utc::now()),
        }
        .insert(&*self.db)
        .await
        .map_err(Into::into)
    }

    #[instrument(skip(self))]
    pub async fn get_task(&self, task_id: Uuid) -> Result<task::Model, ServiceError> {
        Task::find_by_id(task_id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Task {} not found", task_id)))
    }

    #[instrument(skip(self))]
    pub async fn list_tasks(
        &self,
        status: Option<TaskStatus>,
        limit: u64,
        offset: u64,
    ) -> Result<Vec<task::Model>, ServiceError> {
        let mut query = Task::find();
        if let Some(status) = status {
            query = query.filter(task::Column::Status.eq(status));
        }
        query
            .order_by_asc(task::Column::DueDate)
            .limit(limit)
            .offset(offset)
            .all(&*self.db)
            .await
            .map_err(Into::into)
    }

    #[instrument(skip(self))]
    pub async fn list_overdue(&self, now: DateTime<Utc>) -> Result<Vec<task::Model>, ServiceError> {
        Task::find()
            .filter(task::Column::Status.is_not_in([TaskStatus::Completed, TaskStatus::Cancelled]))
            .filter(task::Column::DueDate.lt(now))
            .order_by_asc(task::Column::DueDate)
            .all(&*self.db)
            .await
            .map_err(Into::into)
    }

    /// Completing stamps `completed_at`; moving a completed task back clears it.
    #[instrument(skip(self))]
    pub async fn update_status(
        &self,
        task_id: Uuid,
        new_status: TaskStatus,
    ) -> Result<task::Model, ServiceError> {
        let task = self.get_task(task_id).await?;
        let mut active: task::ActiveModel = task.into();
        active.status = Set(new_status);
        active.completed_at = Set(if new_status == TaskStatus::Completed {
            Some(Utc::now())
        } else {
            None
        });
        active.update(&*self.db).await.map_err(Into::into)
    }

    #[instrument(skip(self))]
    pub async fn delete_task(&self, task_id: Uuid) -> Result<(), ServiceError> {
        let task = self.get_task(task_id).await?;
        Task::delete_by_id(task.id).exec(&*self.db).await?;
        Ok(())
    }
}
