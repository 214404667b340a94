use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use serde_json::{json, Value};

use super::{http_client, rejected, MailError, Mailer, OutboundEmail};

pub struct ResendMailer {
    client: reqwest::Client,
    api_key: String,
    url: String,
}

impl ResendMailer {
    pub fn new(api_key: String, api_base: &str) -> Result<Self, String> {
        Ok(Self {
            client: http_client()?,
            api_key,
            url: format!("{}/emails", api_base.trim_end_matches('/')),
        })
    }
}

pub fn payload(email: &OutboundEmail) -> Value {
    let mut body = json!({
        "from": email.from,
        "to": email.to,
        "reply_to": email.reply_to,
        "subject": email.subject,
        "text": email.text,
        "html": email.html,
    });

    if !email.attachments.is_empty() {
        body["attachments"] = email
            .attachments
            .iter()
            .map(|a| {
                json!({
                    "filename": a.filename,
                    "content": STANDARD.encode(&a.data),
                    "content_type": a.content_type,
                })
            })
            .collect();
    }

    body
}

#[async_trait]
impl Mailer for ResendMailer {
    fn provider(&self) -> &'static str {
        "resend"
    }

    async fn send(&self, email: &OutboundEmail) -> Result<(), MailError> {
        let resp = self
            .client
            .post(&self.url)
            .bearer_auth(&self.api_key)
            .json(&payload(email))
            .send()
            .await
            .map_err(|e| MailError::Transport(format!("Resend request failed: {e}")))?;

        if !resp.status().is_success() {
            return Err(rejected(resp).await);
        }

        let accepted: Value = resp.json().await.unwrap_or(Value::Null);
        tracing::debug!(
            "Resend accepted message {}",
            accepted["id"].as_str().unwrap_or("-")
        );

        Ok(())
    }
}
