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
        communication_preference::{self, Entity as CommunicationPreference},
        customer::{self, CustomerSource, CustomerStatus, CustomerType, Entity as Customer},
    },
    errors::ServiceError,
    events::{Event, EventSender},
    services::automation::{AutomationService, TriggerContext},
};

#[derive(Debug, Deserialize, Validate)]
pub struct CreateCustomerInput {
    #[validate(length(min = 1, max = 100))]
    pub first_name: String,
    #[validate(length(min = 1, max = 100))]
    pub last_name: String,
    #[validate(email)]
    pub email: String,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub city: Option<String>,
    pub country: Option<String>,
    pub postal_code: Option<String>,
    pub customer_type: Option<CustomerType>,
    pub company_name: Option<String>,
    pub source: Option<CustomerSource>,
    pub notes: Option<String>,
    pub tags: Option<String>,
}

#[derive(Debug, Default, Deserialize, Validate)]
pub struct UpdateCustomerInput {
    #[validate(length(min = 1, max = 100))]
    pub first_name: Option<String>,
    #[validate(length(min = 1, max = 100))]
    pub last_name: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub city: Option<String>,
    pub country: Option<String>,
    pub postal_code: Option<String>,
    pub company_name: Option<String>,
    pub status: Option<CustomerStatus>,
    pub notes: Option<String>,
    pub tags: Option<String>,
    pub last_contact_date: Option<chrono::DateTime<Utc>>,
}

/// Service for managing customer records.
#[derive(Clone)]
pub struct CustomerService {
    db: Arc<DatabaseConnection>,
    event_sender: Arc<EventSender>,
    automation: AutomationService,
}

impl CustomerService {
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

    /// Creates a customer and fires `customer_created` workflows.
    #[instrument(skip(self, input))]
    pub async fn create_customer(
        &self,
        input: CreateCustomerInput,
    ) -> Result<customer::Model, ServiceError> {
        input.validate()?;

        let existing = Customer::find()
            .filter(customer::Column::Email.eq(&input.email))
            .one(&*self.db)
            .await?;
        if existing.is_some() {
            return Err(ServiceError::Conflict(format!(
                "Customer with email {} already exists",
                input.email
            )));
        }

        let now = Utc::now();
        let model = customer::ActiveModel {
            id: Set(Uuid::new_v4()),
            first_name: Set(input.first_name),
            last_name: Set(input.last_name),
            email: Set(input.email),
            phone: Set(input.phone),
            address: Set(input.address),
            city: Set(input.city),
            country: Set(input.country),
            postal_code: Set(input.postal_code),
            customer_type: Set(input.customer_type.unwrap_or(CustomerType::Individual)),
            company_name: Set(input.company_name),
            status: Set(CustomerStatus::Lead),
            source: Set(input.source.unwrap_or(CustomerSource::Website)),
            notes: Set(input.notes),
            tags: Set(input.tags),
            date_joined: Set(now),
            last_contact_date: Set(None),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(&*self.db)
        .await?;

        self.automation
            .execute_workflows(
                TriggerType::CustomerCreated,
                TriggerContext {
                    customer: Some(&model),
                    order: None,
                },
            )
            .await?;

        self.event_sender.send(Event::CustomerCreated(model.id)).await;
        info!(customer_id = %model.id, "customer created");
        Ok(model)
    }

    #[instrument(skip(self))]
    pub async fn get_customer(&self, customer_id: Uuid) -> Result<customer::Model, ServiceError> {
        Customer::find_by_id(customer_id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Customer {} not found", customer_id)))
    }

    #[instrument(skip(self))]
    pub async fn get_customer_by_email(
        &self,
        email: &str,
    ) -> Result<Option<customer::Model>, ServiceError> {
        Customer::find()
            .filter(customer::Column::Email.eq(email))
            .one(&*self.db)
            .await
            .map_err(Into::into)
    }

    #[instrument(skip(self))]
    pub async fn list_customers(
        &self,
        limit: u64,
        offset: u64,
    ) -> Result<Vec<customer::Model>, ServiceError> {
        Customer::find()
            .order_by_desc(customer::Column::CreatedAt)
            .limit(limit)
            .offset(offset)
            .all(&*self.db)
            .await
            .map_err(Into::into)
    }

    #[instrument(skip(self))]
    pub async fn count_customers(&self) -> Result<u64, ServiceError> {
        Customer::find().count(&*self.db).await.map_err(Into::into)
    }

    /// Case-insensitive substring search over name and email.
    #[instrument(skip(self))]
    pub async fn search_customers(
        &self,
        term: &str,
    ) -> Result<Vec<customer::Model>, ServiceError> {
        let pattern = format!("%{}%", term);
        Customer::find()
            .filter(
                sea_orm::Condition::any()
                    .add(customer::Column::FirstName.like(&pattern))
                    .add(customer::Column::LastName.like(&pattern))
                    .add(customer::Column::Email.like(&pattern)),
            )
            .all(&*self.db)
            .await
            .map_err(Into::into)
    }

    #[instrument(skip(self, input))]
    pub async fn update_customer(
        &self,
        customer_id: Uuid,
        input: UpdateCustomerInput,
    ) -> Result<customer::Model, ServiceError> {
        input.validate()?;
        let model = self.get_customer(customer_id).await?;
        let mut active: customer::ActiveModel = model.into();

        if let Some(v) = input.first_name {
            active.first_name = Set(v);
        }
        if let Some(v) = input.last_name {
            active.last_name = Set(v);
        }
        if let Some(v) = input.phone {
            active.phone = Set(Some(v));
        }
        if let Some(v) = input.address {
            active.address = Set(Some(v));
        }
        if let Some(v) = input.city {
            active.city = Set(Some(v));
        }
        if let Some(v) = input.country {
            active.country = Set(Some(v));
        }
        if let Some(v) = input.postal_code {
            active.postal_code = Set(Some(v));
        }
        if let Some(v) = input.company_name {
            active.company_name = Set(Some(v));
        }
        if let Some(v) = input.status {
            active.status = Set(v);
        }
        if let Some(v) = input.notes {
            active.notes = Set(Some(v));
        }
        if let Some(v) = input.tags {
            active.tags = Set(Some(v));
        }
        if let Some(v) = input.last_contact_date {
            active.last_contact_date = Set(Some(v));
        }
        active.updated_at = Set(Utc::now());

        let model = active.update(&*self.db).await?;
        self.event_sender.send(Event::CustomerUpdated(customer_id)).await;
        Ok(model)
    }

    #[instrument(skip(self))]
    pub async fn delete_customer(&self, customer_id: Uuid) -> Result<(), ServiceError> {
        let model = self.get_customer(customer_id).await?;
        Customer::delete_by_id(model.id).exec(&*self.db).await?;
        self.event_sender.send(Event::CustomerDeleted(customer_id)).await;
        Ok(())
    }

    /// Returns the customer's communication preferences, creating the default
    /// row on first access.
    #[instrument(skip(self))]
    pub async fn get_communication_preferences(
        &self,
        customer_id: Uuid,
    ) -> Result<communication_preference::Model, ServiceError> {
        self.get_customer(customer_id).await?;

        let existing = CommunicationPreference::find()
            .filter(communication_preference::Column::CustomerId.eq(customer_id))
            .one(&*self.db)
            .await?;
        if let Some(prefs) = existing {
            return Ok(prefs);
        }

        communication_preference::ActiveModel {
            id: Set(Uuid::new_v4()),
            customer_id: Set(customer_id),
            email_enabled: Set(true),
            sms_enabled: Set(false),
            phone_enabled: Set(true),
            marketing_emails: Set(false),
            language: Set("en".to_string()),
            timezone: Set("UTC".to_string()),
        }
        .insert(&*self.db)
        .await
        .map_err(Into::into)
    }
}
