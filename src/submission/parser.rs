use axum::http::HeaderMap;
use bytes::Bytes;
use futures_util::Stream;
use serde_json::{Map, Value};

use crate::config::UploadLimits;

use super::{RawSubmission, Upload};

#[derive(Debug, PartialEq)]
pub enum ParseError {
    InvalidJson,
    InvalidMultipart(String),
    TooLarge,
}

impl std::fmt::Display for ParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ParseError::InvalidJson => write!(f, "invalid JSON"),
            ParseError::InvalidMultipart(msg) => write!(f, "invalid multipart body: {msg}"),
            ParseError::TooLarge => write!(f, "file too large"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BodyKind {
    Json,
    FormUrlencoded,
    Multipart,
}

/// Pick a decoder from the Content-Type header. Anything unknown is read as JSON.
pub fn body_kind(headers: &HeaderMap) -> BodyKind {
    let ct = headers
        .get("content-type")
        .and_then(|v| v.to_str().ok())
        .unwrap_or("application/json")
        .to_ascii_lowercase();

    if ct.contains("multipart/form-data") {
        BodyKind::Multipart
    } else if ct.contains("application/x-www-form-urlencoded") {
        BodyKind::FormUrlencoded
    } else {
        BodyKind::Json
    }
}

/// Parse a JSON body. An empty body is an empty submission; anything other
/// than an object is rejected.
pub fn parse_json(body: &[u8]) -> Result<RawSubmission, ParseError> {
    if body.iter().all(|b| b.is_ascii_whitespace()) {
        return Ok(RawSubmission::default());
    }

    match serde_json::from_slice(body) {
        Ok(Value::Object(fields)) => Ok(RawSubmission {
            fields,
            files: Vec::new(),
        }),
        _ => Err(ParseError::InvalidJson),
    }
}

pub fn parse_form_urlencoded(body: &[u8]) -> RawSubmission {
    let mut map = Map::new();
    for (k, v) in form_urlencoded::parse(body) {
        insert_repeated(&mut map, k.into_owned(), v.into_owned());
    }
    RawSubmission {
        fields: map,
        files: Vec::new(),
    }
}

/// Parse multipart form data using multer, enforcing the per-file size,
/// file-count and field-count limits while streaming.
pub async fn parse_multipart<S, E>(
    headers: &HeaderMap,
    stream: S,
    limits: UploadLimits,
) -> Result<RawSubmission, ParseError>
where
    S: Stream<Item = Result<Bytes, E>> + Send + 'static,
    E: Into<Box<dyn std::error::Error + Send + Sync>> + 'static,
{
    let boundary = headers
        .get("content-type")
        .and_then(|v| v.to_str().ok())
        .and_then(|ct| multer::parse_boundary(ct).ok())
        .ok_or_else(|| ParseError::InvalidMultipart("missing boundary".to_string()))?;

    let whole_stream = limits
        .max_file_size
        .saturating_mul(limits.max_files as u64 + 1);
    let constraints = multer::Constraints::new().size_limit(
        multer::SizeLimit::new()
            .whole_stream(whole_stream)
            .per_field(limits.max_file_size),
    );
    let mut multipart = multer::Multipart::with_constraints(stream, boundary, constraints);

    let mut raw = RawSubmission::default();
    let mut field_count = 0usize;

    while let Some(field) = multipart.next_field().await.map_err(map_multer_error)? {
        field_count += 1;
        if field_count > limits.max_fields {
            return Err(ParseError::TooLarge);
        }

        let name = field.name().unwrap_or("unknown").to_string();

        if let Some(filename) = field.file_name().map(|s| s.trim().to_string()) {
            let content_type = field.content_type().map(|m| m.essence_str().to_string());
            let data = field.bytes().await.map_err(map_multer_error)?;

            // Browsers send an empty part for an untouched file input.
            if filename.is_empty() && data.is_empty() {
                continue;
            }

            if raw.files.len() >= limits.max_files {
                return Err(ParseError::TooLarge);
            }

            raw.files.push(Upload {
                field: name,
                filename,
                content_type,
                data,
            });
        } else {
            let value = field.text().await.map_err(map_multer_error)?;
            insert_repeated(&mut raw.fields, name, value);
        }
    }

    Ok(raw)
}

fn map_multer_error(err: multer::Error) -> ParseError {
    match err {
        multer::Error::FieldSizeExceeded { .. } | multer::Error::StreamSizeExceeded { .. } => {
            ParseError::TooLarge
        }
        other => ParseError::InvalidMultipart(other.to_string()),
    }
}

/// Repeated keys collect into an array in arrival order.
fn insert_repeated(map: &mut Map<String, Value>, key: String, value: String) {
    match map.get_mut(&key) {
        Some(Value::Array(items)) => items.push(Value::String(value)),
        Some(existing) => {
            let first = existing.take();
            *existing = Value::Array(vec![first, Value::String(value)]);
        }
        None => {
            map.insert(key, Value::String(value));
        }
    }
}
