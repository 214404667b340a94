pub mod resend;
pub mod sendgrid;
pub mod smtp;
pub mod templates;

use std::sync::Arc;

use async_trait::async_trait;

use crate::config::{MailConfig, Provider};
use crate::submission::Submission;

use resend::ResendMailer;
use sendgrid::SendGridMailer;
use smtp::SmtpMailer;

#[derive(Debug, Clone)]
pub struct Attachment {
    pub filename: String,
    pub content_type: String,
    pub data: Vec<u8>,
}

/// A fully assembled message, ready for any provider.
#[derive(Debug, Clone)]
pub struct OutboundEmail {
    pub from: String,
    pub to: Vec<String>,
    pub reply_to: String,
    pub subject: String,
    pub text: String,
    pub html: String,
    pub attachments: Vec<Attachment>,
}

impl OutboundEmail {
    /// Render a validated submission into a message addressed per `config`.
    pub fn from_submission(submission: &Submission, from: &str, config: &MailConfig) -> Self {
        let attachments = [&submission.treatments_file, &submission.logo_file]
            .into_iter()
            .flatten()
            .filter(|f| !f.data.is_empty())
            .map(|f| Attachment {
                filename: f.filename.clone(),
                content_type: f
                    .content_type
                    .clone()
                    .unwrap_or_else(|| "application/octet-stream".to_string()),
                data: f.data.to_vec(),
            })
            .collect();

        Self {
            from: from.to_string(),
            to: config.to.clone(),
            reply_to: submission.email.clone(),
            subject: config.subject.clone(),
            text: templates::render_text(submission),
            html: templates::render_html(submission),
            attachments,
        }
    }
}

#[derive(Debug)]
pub enum MailError {
    /// The provider answered with a non-success status.
    Rejected { status: u16, body: String },
    Transport(String),
    InvalidMessage(String),
}

impl std::fmt::Display for MailError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MailError::Rejected { status, body } => {
                write!(f, "provider rejected message (status {status}): {body}")
            }
            MailError::Transport(msg) => write!(f, "transport error: {msg}"),
            MailError::InvalidMessage(msg) => write!(f, "invalid message: {msg}"),
        }
    }
}

impl std::error::Error for MailError {}

/// Outbound email capability. One implementation per provider.
#[async_trait]
pub trait Mailer: Send + Sync {
    fn provider(&self) -> &'static str;
    async fn send(&self, email: &OutboundEmail) -> Result<(), MailError>;
}

/// Build the mailer for the configured provider. Fails if credentials or
/// the sender address are missing.
pub fn build_mailer(config: &MailConfig) -> Result<Arc<dyn Mailer>, String> {
    if !config.missing_settings().is_empty() {
        return Err(config.setup_error());
    }

    match config.provider {
        Provider::SendGrid => {
            let api_key = config.api_key.clone().unwrap_or_default();
            Ok(Arc::new(SendGridMailer::new(api_key, &config.api_base)?))
        }
        Provider::Resend => {
            let api_key = config.api_key.clone().unwrap_or_default();
            Ok(Arc::new(ResendMailer::new(api_key, &config.api_base)?))
        }
        Provider::Smtp => {
            let smtp = config
                .smtp
                .as_ref()
                .ok_or_else(|| config.setup_error())?;
            Ok(Arc::new(SmtpMailer::new(smtp)?))
        }
    }
}

/// Shared reqwest client for the HTTP providers.
pub(crate) fn http_client() -> Result<reqwest::Client, String> {
    reqwest::Client::builder()
        .timeout(std::time::Duration::from_secs(30))
        .build()
        .map_err(|e| format!("Failed to build HTTP client: {e}"))
}

/// Read a failed response into a [`MailError::Rejected`], truncating the body.
pub(crate) async fn rejected(resp: reqwest::Response) -> MailError {
    let status = resp.status().as_u16();
    let body = resp
        .text()
        .await
        .unwrap_or_default()
        .chars()
        .take(1024)
        .collect::<String>();
    MailError::Rejected { status, body }
}
