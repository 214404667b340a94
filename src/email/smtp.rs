use std::time::Duration;

use async_trait::async_trait;
use lettre::message::header::ContentType;
use lettre::message::{Attachment as MimeAttachment, Mailbox, MultiPart, SinglePart};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};

use super::{MailError, Mailer, OutboundEmail};
use crate::config::{SmtpConfig, SmtpTls};

pub struct SmtpMailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
}

impl SmtpMailer {
    pub fn new(config: &SmtpConfig) -> Result<Self, String> {
        Ok(Self {
            transport: build_smtp_transport(config)?,
        })
    }
}

pub fn build_smtp_transport(
    config: &SmtpConfig,
) -> Result<AsyncSmtpTransport<Tokio1Executor>, String> {
    let mut builder = match config.tls {
        SmtpTls::Tls => AsyncSmtpTransport::<Tokio1Executor>::relay(&config.host)
            .map_err(|e| format!("SMTP relay error: {e}"))?,
        SmtpTls::None => AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(&config.host),
        SmtpTls::StartTls => AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.host)
            .map_err(|e| format!("SMTP starttls error: {e}"))?,
    };

    builder = builder
        .port(config.port)
        .timeout(Some(Duration::from_secs(15)));

    if let (Some(user), Some(pass)) = (&config.user, &config.pass) {
        builder = builder.credentials(Credentials::new(user.clone(), pass.clone()));
    }

    Ok(builder.build())
}

/// Assemble a multipart/mixed message: text + html alternative, then attachments.
pub fn build_message(email: &OutboundEmail) -> Result<Message, MailError> {
    let from: Mailbox = email
        .from
        .parse()
        .map_err(|e| MailError::InvalidMessage(format!("Invalid from address: {e}")))?;

    let mut builder = Message::builder().from(from).subject(email.subject.clone());

    // The form accepts some addresses lettre cannot encode (e.g. `a,b@c.de`).
    // The submitter's address is still in the body, so send without Reply-To.
    match email.reply_to.parse::<Mailbox>() {
        Ok(reply_to) => builder = builder.reply_to(reply_to),
        Err(e) => tracing::warn!(
            "Omitting Reply-To, '{}' is not a valid mailbox: {e}",
            email.reply_to
        ),
    }
    for to in &email.to {
        builder = builder.to(to
            .parse()
            .map_err(|e| MailError::InvalidMessage(format!("Invalid to address: {e}")))?);
    }

    let alternative = MultiPart::alternative()
        .singlepart(
            SinglePart::builder()
                .header(ContentType::TEXT_PLAIN)
                .body(email.text.clone()),
        )
        .singlepart(
            SinglePart::builder()
                .header(ContentType::TEXT_HTML)
                .body(email.html.clone()),
        );

    let body = if email.attachments.is_empty() {
        alternative
    } else {
        let mut mixed = MultiPart::mixed().multipart(alternative);
        for attachment in &email.attachments {
            let content_type = ContentType::parse(&attachment.content_type).map_err(|e| {
                MailError::InvalidMessage(format!(
                    "Invalid attachment type '{}': {e}",
                    attachment.content_type
                ))
            })?;
            mixed = mixed.singlepart(
                MimeAttachment::new(attachment.filename.clone())
                    .body(attachment.data.clone(), content_type),
            );
        }
        mixed
    };

    builder
        .multipart(body)
        .map_err(|e| MailError::InvalidMessage(format!("Failed to build email: {e}")))
}

#[async_trait]
impl Mailer for SmtpMailer {
    fn provider(&self) -> &'static str {
        "smtp"
    }

    async fn send(&self, email: &OutboundEmail) -> Result<(), MailError> {
        let message = build_message(email)?;

        self.transport
            .send(message)
            .await
            .map_err(|e| MailError::Transport(format!("Failed to send email: {e}")))?;

        Ok(())
    }
}
