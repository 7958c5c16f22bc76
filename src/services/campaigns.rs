use std::sync::Arc;

use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, JoinType, QueryFilter,
    QueryOrder, QuerySelect, RelationTrait, Set,
};
use serde::Deserialize;
use tracing::{info, instrument};
use uuid::Uuid;
use validator::Validate;

use crate::{
    entities::{
        communication_preference,
        customer::{self, Entity as Customer},
        marketing_campaign::{self, CampaignKind, CampaignStatus, Entity as MarketingCampaign},
    },
    errors::ServiceError,
    events::{Event, EventSender},
    services::notifier::EmailNotifier,
};

#[derive(Debug, Deserialize, Validate)]
pub struct CreateCampaignInput {
    #[validate(length(min = 1, max = 200))]
    pub name: String,
    pub kind: CampaignKind,
    pub subject: Option<String>,
    #[validate(length(min = 1))]
    pub content: String,
    pub scheduled_time: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EngagementKind {
    Opened,
    Clicked,
    Converted,
}

/// Marketing campaigns: authored as drafts, sent to opted-in customers,
/// engagement counted afterwards.
#[derive(Clone)]
pub struct CampaignService {
    db: Arc<DatabaseConnection>,
    event_sender: Arc<EventSender>,
    notifier: EmailNotifier,
}

impl CampaignService {
    pub fn new(
        db: Arc<DatabaseConnection>,
        event_sender: Arc<EventSender>,
        notifier: EmailNotifier,
    ) -> Self {
        Self {
            db,
            event_sender,
            notifier,
        }
    }

    #[instrument(skip(self, input))]
    pub async fn create_campaign(
        &self,
        input: CreateCampaignInput,
    ) -> Result<marketing_campaign::Model, ServiceError> {
        input.validate()?;
        if input.kind == CampaignKind::Email && input.subject.is_none() {
            return Err(ServiceError::ValidationError(
                "Email campaigns require a subject".to_string(),
            ));
        }

        let status = if input.scheduled_time.is_some() {
            CampaignStatus::Scheduled
        } else {
            CampaignStatus::Draft
        };
        marketing_campaign::ActiveModel {
            id: Set(Uuid::new_v4()),
            name: Set(input.name),
            kind: Set(input.kind),
            status: Set(status),
            subject: Set(input.subject),
            content: Set(input.content),
            scheduled_time: Set(input.scheduled_time),
            sent_count: Set(0),
            opened_count: Set(0),
            clicked_count: Set(0),
            conversion_count: Set(0),
            sent_at: Set(None),
            created_at: Set(Utc::now()),
        }
        .insert(&*self.db)
        .await
        .map_err(Into::into)
    }

    #[instrument(skip(self))]
    pub async fn get_campaign(
        &self,
        campaign_id: Uuid,
    ) -> Result<marketing_campaign::Model, ServiceError> {
        MarketingCampaign::find_by_id(campaign_id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Campaign {} not found", campaign_id)))
    }

    #[instrument(skip(self))]
    pub async fn list_campaigns(
        &self,
        limit: u64,
        offset: u64,
    ) -> Result<Vec<marketing_campaign::Model>, ServiceError> {
        MarketingCampaign::find()
            .order_by_desc(marketing_campaign::Column::CreatedAt)
            .limit(limit)
            .offset(offset)
            .all(&*self.db)
            .await
            .map_err(Into::into)
    }

    /// Sends a draft or scheduled campaign to every customer opted in to
    /// marketing email. Returns the updated campaign with its sent count.
    #[instrument(skip(self))]
    pub async fn send_campaign(
        &self,
        campaign_id: Uuid,
    ) -> Result<marketing_campaign::Model, ServiceError> {
        let campaign = self.get_campaign(campaign_id).await?;
        if !matches!(
            campaign.status,
            CampaignStatus::Draft | CampaignStatus::Scheduled
        ) {
            return Err(ServiceError::InvalidOperation(format!(
                "Campaign {} cannot be sent from {:?}",
                campaign.name, campaign.status
            )));
        }

        let recipients = self.marketing_recipients().await?;

        let mut active: marketing_campaign::ActiveModel = campaign.clone().into();
        active.status = Set(CampaignStatus::Sending);
        let campaign = active.update(&*self.db).await?;

        if campaign.kind == CampaignKind::Email && !recipients.is_empty() {
            let subject = campaign.subject.clone().unwrap_or_else(|| campaign.name.clone());
            let emails: Vec<String> = recipients.iter().map(|c| c.email.clone()).collect();
            let html = format!("<html><body>{}</body></html>", campaign.content);
            self.notifier
                .send_async(subject, html, campaign.content.clone(), emails);
        }

        let mut active: marketing_campaign::ActiveModel = campaign.into();
        active.status = Set(CampaignStatus::Sent);
        active.sent_count = Set(recipients.len() as i32);
        active.sent_at = Set(Some(Utc::now()));
        let campaign = active.update(&*self.db).await?;

        self.event_sender.send(Event::CampaignSent(campaign.id)).await;
        info!(campaign = %campaign.name, recipients = recipients.len(), "campaign sent");
        Ok(campaign)
    }

    /// Increments one engagement counter, capped at the sent count so rates
    /// stay within 100%.
    #[instrument(skip(self))]
    pub async fn record_engagement(
        &self,
        campaign_id: Uuid,
        kind: EngagementKind,
    ) -> Result<marketing_campaign::Model, ServiceError> {
        let campaign = self.get_campaign(campaign_id).await?;
        if campaign.status != CampaignStatus::Sent {
            return Err(ServiceError::InvalidOperation(
                "Engagement can only be recorded for sent campaigns".to_string(),
            ));
        }

        let mut active: marketing_campaign::ActiveModel = campaign.clone().into();
        match kind {
            EngagementKind::Opened => {
                active.opened_count = Set((campaign.opened_count + 1).min(campaign.sent_count));
            }
            EngagementKind::Clicked => {
                active.clicked_count = Set((campaign.clicked_count + 1).min(campaign.sent_count));
            }
            EngagementKind::Converted => {
                active.conversion_count =
                    Set((campaign.conversion_count + 1).min(campaign.sent_count));
            }
        }
        active.update(&*self.db).await.map_err(Into::into)
    }

    #[instrument(skip(self))]
    pub async fn cancel_campaign(
        &self,
        campaign_id: Uuid,
    ) -> Result<marketing_campaign::Model, ServiceError> {
        let campaign = self.get_campaign(campaign_id).await?;
        if matches!(campaign.status, CampaignStatus::Sent | CampaignStatus::Cancelled) {
            return Err(ServiceError::InvalidOperation(format!(
                "Campaign {} cannot be cancelled from {:?}",
                campaign.name, campaign.status
            )));
        }
        let mut active: marketing_campaign::ActiveModel = campaign.into();
        active.status = Set(CampaignStatus::Cancelled);
        active.update(&*self.db).await.map_err(Into::into)
    }

    /// Customers whose communication preferences allow marketing email.
    async fn marketing_recipients(&self) -> Result<Vec<customer::Model>, ServiceError> {
        Customer::find()
            .join(
                JoinType::InnerJoin,
                customer::Relation::CommunicationPreferences.def(),
            )
            .filter(communication_preference::Column::EmailEnabled.eq(true))
            .filter(communication_preference::Column::MarketingEmails.eq(true))
            .all(&*self.db)
            .await
            .map_err(Into::into)
    }
}
