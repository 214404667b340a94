use serde_json::Value;

use super::RawSubmission;

/// Check if the honeypot field is filled, either as text or as an uploaded
/// part. Returns true if spam detected.
pub fn is_spam(raw: &RawSubmission, honeypot_field: &str) -> bool {
    if honeypot_field.is_empty() {
        return false;
    }

    if raw.file(honeypot_field).is_some() {
        return true;
    }

    match raw.fields.get(honeypot_field) {
        Some(Value::String(s)) => !s.trim().is_empty(),
        Some(Value::Array(items)) => items.iter().any(|v| match v {
            Value::String(s) => !s.trim().is_empty(),
            Value::Null => false,
            _ => true,
        }),
        Some(Value::Null) | None => false,
        Some(_) => true,
    }
}
