use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use serde_json::{json, Value};

use super::{http_client, rejected, MailError, Mailer, OutboundEmail};

/// SendGrid v3 `mail/send` over HTTPS.
pub struct SendGridMailer {
    client: reqwest::Client,
    api_key: String,
    url: String,
}

impl SendGridMailer {
    pub fn new(api_key: String, api_base: &str) -> Result<Self, String> {
        Ok(Self {
            client: http_client()?,
            api_key,
            url: format!("{}/mail/send", api_base.trim_end_matches('/')),
        })
    }
}

pub fn payload(email: &OutboundEmail) -> Value {
    let to: Vec<Value> = email.to.iter().map(|addr| json!({ "email": addr })).collect();

    let mut body = json!({
        "personalizations": [{ "to": to }],
        "from": { "email": email.from },
        "reply_to": { "email": email.reply_to },
        "subject": email.subject,
        "content": [
            { "type": "text/plain", "value": email.text },
            { "type": "text/html", "value": email.html },
        ],
    });

    if !email.attachments.is_empty() {
        body["attachments"] = email
            .attachments
            .iter()
            .map(|a| {
                json!({
                    "content": STANDARD.encode(&a.data),
                    "filename": a.filename,
                    "type": a.content_type,
                    "disposition": "attachment",
                })
            })
            .collect();
    }

    body
}

#[async_trait]
impl Mailer for SendGridMailer {
    fn provider(&self) -> &'static str {
        "sendgrid"
    }

    async fn send(&self, email: &OutboundEmail) -> Result<(), MailError> {
        let resp = self
            .client
            .post(&self.url)
            .bearer_auth(&self.api_key)
            .json(&payload(email))
            .send()
            .await
            .map_err(|e| MailError::Transport(format!("SendGrid request failed: {e}")))?;

        if !resp.status().is_success() {
            return Err(rejected(resp).await);
        }

        let message_id = resp
            .headers()
            .get("x-message-id")
            .and_then(|v| v.to_str().ok())
            .unwrap_or("-");
        tracing::debug!("SendGrid accepted message {message_id}");

        Ok(())
    }
}
