use std::net::SocketAddr;

use axum::body::Body;
use axum::extract::{ConnectInfo, State};
use axum::http::HeaderMap;
use axum::Json;
use serde_json::{json, Value};

use crate::email::OutboundEmail;
use crate::error::{ApiResponse, AppError};
use crate::state::SharedState;
use crate::submission::parser::{self, BodyKind};
use crate::submission::{fields, honeypot, metadata, validate};

/// Accept one form submission and relay it as an email.
pub async fn send(
    State(state): State<SharedState>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
    body: Body,
) -> Result<Json<ApiResponse>, AppError> {
    let config = &state.config;

    let raw = match parser::body_kind(&headers) {
        BodyKind::Multipart => {
            parser::parse_multipart(&headers, body.into_data_stream(), config.limits).await?
        }
        kind => {
            let bytes = axum::body::to_bytes(body, config.max_body_size)
                .await
                .map_err(|e| {
                    tracing::debug!("Failed to read request body: {e}");
                    AppError::PayloadTooLarge
                })?;
            if kind == BodyKind::FormUrlencoded {
                parser::parse_form_urlencoded(&bytes)
            } else {
                parser::parse_json(&bytes)?
            }
        }
    };

    if honeypot::is_spam(&raw, &config.honeypot_field) {
        let client = metadata::extract(&headers, Some(addr.ip()), &config.trusted_proxies);
        tracing::info!(
            "Dropped honeypot submission from {} ({})",
            client.ip,
            client.user_agent
        );
        return Ok(Json(ApiResponse::ok()));
    }

    let submission = fields::normalize(&raw);
    if let Err(errors) = validate::validate(&submission, config.require_uploads) {
        tracing::debug!(
            "Rejected submission: missing={:?} invalid={:?}",
            errors.missing,
            errors.invalid
        );
        return Err(AppError::BadRequest(errors.to_string()));
    }

    let mailer = state
        .mailer
        .as_ref()
        .ok_or_else(|| AppError::Misconfigured(config.mail.setup_error()))?;
    let from = config
        .mail
        .from
        .as_deref()
        .ok_or_else(|| AppError::Misconfigured(config.mail.setup_error()))?;

    let email = OutboundEmail::from_submission(&submission, from, &config.mail);
    mailer.send(&email).await?;

    tracing::info!(
        "Request email sent via {} to {} recipient(s) with {} attachment(s)",
        mailer.provider(),
        email.to.len(),
        email.attachments.len()
    );

    Ok(Json(ApiResponse::ok()))
}

pub async fn liveness() -> Json<Value> {
    Json(json!({ "ok": true, "service": "send-request" }))
}

pub async fn method_not_allowed() -> AppError {
    AppError::MethodNotAllowed
}
