use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use rand::Rng;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set,
};
use tracing::{info, instrument};
use uuid::Uuid;

use crate::{
    auth::AuthService,
    entities::{
        customer::{self, Entity as Customer},
        otp_code::{self, Entity as OtpCode},
    },
    errors::ServiceError,
    services::notifier::EmailNotifier,
};

/// Passwordless login: a short-lived six-digit code emailed to a known
/// customer, exchanged once for a session token.
#[derive(Clone)]
pub struct OtpService {
    db: Arc<DatabaseConnection>,
    auth: AuthService,
    notifier: EmailNotifier,
    ttl: Duration,
}

impl OtpService {
    pub fn new(
        db: Arc<DatabaseConnection>,
        auth: AuthService,
        notifier: EmailNotifier,
        ttl_minutes: i64,
    ) -> Self {
        Self {
            db,
            auth,
            notifier,
            ttl: Duration::minutes(ttl_minutes),
        }
    }

    /// Issues a fresh code for the address and emails it. Any earlier codes
    /// for the same address are consumed so only the newest one verifies.
    #[instrument(skip(self))]
    pub async fn request_code(&self, email: &str) -> Result<(), ServiceError> {
        let customer = Customer::find()
            .filter(customer::Column::Email.eq(email))
            .one(&*self.db)
            .await?
            .ok_or_else(|| {
                ServiceError::NotFound(format!("No customer registered with email {}", email))
            })?;

        self.invalidate_pending(email).await?;

        let code = generate_code();
        let now = Utc::now();
        otp_code::ActiveModel {
            id: Set(Uuid::new_v4()),
            email: Set(email.to_string()),
            code: Set(code.clone()),
            is_used: Set(false),
            expires_at: Set(now + self.ttl),
            created_at: Set(now),
        }
        .insert(&*self.db)
        .await?;

        let message = format!(
            "Hello {},\n\nYour login code is {}. It expires in {} minutes.",
            customer.first_name,
            code,
            self.ttl.num_minutes()
        );
        self.notifier
            .send_simple_async("Your login code", &message, email);
        info!(email, "otp issued");
        Ok(())
    }

    /// Exchanges a valid, unexpired, unused code for a session token. The
    /// code is consumed whether or not the caller keeps the token.
    #[instrument(skip(self, code))]
    pub async fn verify_code(
        &self,
        email: &str,
        code: &str,
        now: DateTime<Utc>,
    ) -> Result<String, ServiceError> {
        let record = OtpCode::find()
            .filter(otp_code::Column::Email.eq(email))
            .filter(otp_code::Column::Code.eq(code))
            .filter(otp_code::Column::IsUsed.eq(false))
            .order_by_desc(otp_code::Column::CreatedAt)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::AuthError("Invalid code".to_string()))?;

        if record.is_expired(now) {
            return Err(ServiceError::AuthError("Code has expired".to_string()));
        }

        let mut active: otp_code::ActiveModel = record.into();
        active.is_used = Set(true);
        active.update(&*self.db).await?;

        let token = self.auth.issue_token(email)?;
        info!(email, "otp verified, session issued");
        Ok(token)
    }

    async fn invalidate_pending(&self, email: &str) -> Result<(), ServiceError> {
        let pending = OtpCode::find()
            .filter(otp_code::Column::Email.eq(email))
            .filter(otp_code::Column::IsUsed.eq(false))
            .all(&*self.db)
            .await?;
        for record in pending {
            let mut active: otp_code::ActiveModel = record.into();
            active.is_used = Set(true);
            active.update(&*self.db).await?;
        }
        Ok(())
    }
}

fn generate_code() -> String {
    let n: u32 = rand::thread_rng().gen_range(0..1_000_000);
    format!("{:06}", n)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn code_is_six_digits() {
        for _ in 0..100 {
            let code = generate_code();
            assert_eq!(code.len(), 6);
            assert!(code.chars().all(|c| c.is_ascii_digit()));
        }
    }
}
