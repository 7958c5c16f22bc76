use serde::Serialize;
use serde_json::json;
use tracing::{error, info, warn};

use crate::config::NotifierConfig;

/// Outbound transactional email client (Brevo-style HTTP API).
///
/// Delivery is at-most-once and best-effort: a failed attempt degrades to a
/// console log and is never surfaced to the caller as an error.
#[derive(Clone)]
pub struct EmailNotifier {
    config: NotifierConfig,
    client: reqwest::Client,
}

#[derive(Debug, Serialize)]
struct Recipient<'a> {
    email: &'a str,
}

impl EmailNotifier {
    pub fn new(config: NotifierConfig) -> Self {
        let client = reqwest::Client::builder()
            .timeout(config.timeout())
            .build()
            .unwrap_or_default();
        Self { config, client }
    }

    /// Attempts delivery once. Returns whether the provider accepted the
    /// message; transport and provider errors both come back as `false`.
    pub async fn send(
        &self,
        subject: &str,
        html_body: &str,
        text_body: &str,
        recipients: &[String],
    ) -> bool {
        if recipients.is_empty() {
            return true;
        }

        if self.config.console_only {
            info!(subject, ?recipients, "console-only mode, email not delivered");
            info!("email body: {}", text_body);
            return true;
        }

        if self.config.api_key.is_empty() {
            warn!("notifier api key not configured, dropping email '{}'", subject);
            return false;
        }

        let payload = json!({
            "sender": {
                "name": self.config.sender_name,
                "email": self.config.sender_email,
            },
            "to": recipients
                .iter()
                .map(|email| Recipient { email })
                .collect::<Vec<_>>(),
            "subject": subject,
            "htmlContent": html_body,
            "textContent": text_body,
        });

        let response = self
            .client
            .post(&self.config.endpoint)
            .header("accept", "application/json")
            .header("api-key", &self.config.api_key)
            .json(&payload)
            .send()
            .await;

        match response {
            Ok(resp) if resp.status().is_success() => {
                info!(subject, count = recipients.len(), "email delivered");
                true
            }
            Ok(resp) => {
                error!(
                    subject,
                    status = %resp.status(),
                    "email provider rejected delivery"
                );
                false
            }
            Err(e) => {
                error!(subject, error = %e, "email delivery failed");
                false
            }
        }
    }

    /// Fire-and-forget dispatch on a detached task. No ordering guarantee
    /// relative to the caller; failure falls back to logging the content.
    pub fn send_async(
        &self,
        subject: String,
        html_body: String,
        text_body: String,
        recipients: Vec<String>,
    ) {
        let notifier = self.clone();
        tokio::spawn(async move {
            let delivered = notifier
                .send(&subject, &html_body, &text_body, &recipients)
                .await;
            if !delivered {
                warn!(subject, ?recipients, "undelivered email, body follows");
                warn!("{}", text_body);
            }
        });
    }

    /// Wraps a plain message in the standard HTML shell and dispatches it
    /// asynchronously to a single recipient.
    pub fn send_simple_async(&self, subject: &str, message: &str, recipient: &str) {
        let html = format!(
            "<!DOCTYPE html><html><body>\
             <div style=\"max-width:600px;margin:0 auto;padding:20px\">\
             <h1>Retail CRM</h1><div>{}</div>\
             <p style=\"font-size:12px;color:#666\">This is an automated message from Retail CRM</p>\
             </div></body></html>",
            message
        );
        self.send_async(
            subject.to_string(),
            html,
            message.to_string(),
            vec![recipient.to_string()],
        );
    }
}
