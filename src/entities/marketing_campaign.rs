use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "marketing_campaigns")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub name: String,
    pub kind: CampaignKind,
    pub status: CampaignStatus,
    pub subject: Option<String>,
    pub content: String,
    pub scheduled_time: Option<DateTime<Utc>>,
    pub sent_count: i32,
    pub opened_count: i32,
    pub clicked_count: i32,
    pub conversion_count: i32,
    pub sent_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    pub fn open_rate(&self) -> Decimal {
        rate(self.opened_count, self.sent_count)
    }

    pub fn click_rate(&self) -> Decimal {
        rate(self.clicked_count, self.sent_count)
    }
}

fn rate(part: i32, whole: i32) -> Decimal {
    if whole > 0 {
        Decimal::from(part) * Decimal::from(100) / Decimal::from(whole)
    } else {
        Decimal::ZERO
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, EnumIter, DeriveActiveEnum)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(20))")]
#[serde(rename_all = "snake_case")]
pub enum CampaignKind {
    #[sea_orm(string_value = "email")]
    Email,
    #[sea_orm(string_value = "sms")]
    Sms,
    #[sea_orm(string_value = "push")]
    Push,
    #[sea_orm(string_value = "social")]
    Social,
    #[sea_orm(string_value = "multi")]
    Multi,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, EnumIter, DeriveActiveEnum)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(20))")]
#[serde(rename_all = "snake_case")]
pub enum CampaignStatus {
    #[sea_orm(string_value = "draft")]
    Draft,
    #[sea_orm(string_value = "scheduled")]
    Scheduled,
    #[sea_orm(string_value = "sending")]
    Sending,
    #[sea_orm(string_value = "sent")]
    Sent,
    #[sea_orm(string_value = "paused")]
    Paused,
    #[sea_orm(string_value = "cancelled")]
    Cancelled,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn rates_guard_against_zero_sends() {
        let campaign = Model {
            id: Uuid::new_v4(),
            name: "Spring".into(),
            kind: CampaignKind::Email,
            status: CampaignStatus::Draft,
            subject: None,
            content: "hello".into(),
            scheduled_time: None,
            sent_count: 0,
            opened_count: 0,
            clicked_count: 0,
            conversion_count: 0,
            sent_at: None,
            created_at: Utc::now(),
        };
        assert_eq!(campaign.open_rate(), Decimal::ZERO);

        let sent = Model {
            sent_count: 200,
            opened_count: 50,
            clicked_count: 10,
            ..campaign
        };
        assert_eq!(sent.open_rate(), dec!(25));
        assert_eq!(sent.click_rate(), dec!(5));
    }
}
