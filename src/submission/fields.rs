use std::sync::LazyLock;

use regex::Regex;
use serde_json::{Map, Value};

use super::{FileField, RawSubmission, Submission, UserType};

static LIST_SEPARATOR_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[\n,;]+").unwrap());

/// Build a [`Submission`] from a decoded body. Never fails; missing and
/// malformed values are left for validation to report.
pub fn normalize(raw: &RawSubmission) -> Submission {
    let f = &raw.fields;

    let user_type = match text(f, "nutzer_typ").as_str() {
        "team" => UserType::Team,
        _ => UserType::Single,
    };
    let team_count = match user_type {
        UserType::Team => integer(f, "team_count"),
        UserType::Single => 1,
    };

    Submission {
        salutation: text(f, "anrede"),
        first_name: text(f, "vorname"),
        last_name: text(f, "nachname"),
        email: text(f, "email"),
        company_name: text(f, "company_name"),
        company_address: text(f, "company_address"),
        app_title: text(f, "app_title"),
        play_store_emails: list(f, "play_emails"),
        practitioners: list(f, "behandlers"),
        user_type,
        team_count,
        treatments_file: file_field(raw, "treatments_file"),
        logo_file: file_field(raw, "logo_file"),
        b2b_confirmed: boolean(f, "b2b"),
    }
}

/// Stringify and trim a scalar. Arrays take their first element.
pub fn text(fields: &Map<String, Value>, key: &str) -> String {
    match fields.get(key) {
        Some(value) => value_text(value),
        None => String::new(),
    }
}

fn value_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.trim().to_string(),
        Value::Array(items) => items.first().map(value_text).unwrap_or_default(),
        other => other.to_string(),
    }
}

/// Coerce a list into trimmed, non-empty entries. Native lists and repeated
/// keys keep each element whole; a single string is split on newlines,
/// commas and semicolons.
pub fn list(fields: &Map<String, Value>, key: &str) -> Vec<String> {
    match fields.get(key) {
        Some(Value::Array(items)) => items
            .iter()
            .map(value_text)
            .filter(|s| !s.is_empty())
            .collect(),
        Some(Value::String(s)) => split_list(s),
        _ => Vec::new(),
    }
}

pub fn split_list(raw: &str) -> Vec<String> {
    LIST_SEPARATOR_RE
        .split(raw)
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .map(|s| s.to_string())
        .collect()
}

/// Leading integer of the value, 0 when absent or unparseable.
fn integer(fields: &Map<String, Value>, key: &str) -> u32 {
    match fields.get(key) {
        Some(Value::Number(n)) => n
            .as_u64()
            .or_else(|| n.as_f64().filter(|f| *f >= 0.0).map(|f| f as u64))
            .map(|n| n.min(u32::MAX as u64) as u32)
            .unwrap_or(0),
        Some(value) => {
            let s = value_text(value);
            let digits: String = s.chars().take_while(|c| c.is_ascii_digit()).collect();
            digits.parse().unwrap_or(0)
        }
        None => 0,
    }
}

fn boolean(fields: &Map<String, Value>, key: &str) -> bool {
    match fields.get(key) {
        Some(Value::Bool(b)) => *b,
        Some(value) => matches!(
            value_text(value).to_lowercase().as_str(),
            "true" | "on" | "1" | "yes"
        ),
        None => false,
    }
}

/// Prefer an uploaded part; fall back to the `<field>_name` text of JSON bodies.
fn file_field(raw: &RawSubmission, field: &str) -> Option<FileField> {
    if let Some(upload) = raw.file(field) {
        return Some(FileField {
            filename: upload.filename.clone(),
            content_type: upload.content_type.clone(),
            data: upload.data.clone(),
        });
    }

    let name = text(&raw.fields, &format!("{field}_name"));
    if name.is_empty() {
        return None;
    }
    Some(FileField {
        filename: name,
        content_type: None,
        data: bytes::Bytes::new(),
    })
}
