use axum::http::{header, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use serde::Serialize;

use crate::email::MailError;
use crate::submission::parser::ParseError;

pub const ALLOWED_METHODS: &str = "GET, POST";

/// Body of every `/send-request` answer.
#[derive(Debug, Serialize)]
pub struct ApiResponse {
    pub ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ApiResponse {
    pub fn ok() -> Self {
        Self { ok: true, error: None }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            ok: false,
            error: Some(message.into()),
        }
    }
}

#[derive(Debug)]
pub enum AppError {
    MethodNotAllowed,
    BadRequest(String),
    PayloadTooLarge,
    Misconfigured(String),
    SendFailed(MailError),
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AppError::MethodNotAllowed => write!(f, "Method Not Allowed"),
            AppError::BadRequest(msg) => write!(f, "Bad Request: {msg}"),
            AppError::PayloadTooLarge => write!(f, "Payload Too Large"),
            AppError::Misconfigured(msg) => write!(f, "Misconfigured: {msg}"),
            AppError::SendFailed(err) => write!(f, "Send failed: {err}"),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            AppError::MethodNotAllowed => {
                (StatusCode::METHOD_NOT_ALLOWED, "Method Not Allowed".to_string())
            }
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            AppError::PayloadTooLarge => {
                (StatusCode::PAYLOAD_TOO_LARGE, "file too large".to_string())
            }
            AppError::Misconfigured(msg) => {
                tracing::error!("Mail provider not configured: {msg}");
                (StatusCode::INTERNAL_SERVER_ERROR, msg.clone())
            }
            AppError::SendFailed(err) => {
                tracing::error!("Mail provider error: {err}");
                (StatusCode::BAD_GATEWAY, "send failed".to_string())
            }
        };

        let mut response = (status, axum::Json(ApiResponse::error(message))).into_response();
        if matches!(self, AppError::MethodNotAllowed) {
            response
                .headers_mut()
                .insert(header::ALLOW, HeaderValue::from_static(ALLOWED_METHODS));
        }
        response
    }
}

impl From<ParseError> for AppError {
    fn from(err: ParseError) -> Self {
        match err {
            ParseError::TooLarge => AppError::PayloadTooLarge,
            ParseError::InvalidJson => AppError::BadRequest("invalid JSON".to_string()),
            ParseError::InvalidMultipart(detail) => {
                tracing::debug!("Rejected multipart body: {detail}");
                AppError::BadRequest("invalid multipart body".to_string())
            }
        }
    }
}

impl From<MailError> for AppError {
    fn from(err: MailError) -> Self {
        AppError::SendFailed(err)
    }
}
