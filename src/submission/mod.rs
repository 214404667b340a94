pub mod fields;
pub mod honeypot;
pub mod metadata;
pub mod parser;
pub mod validate;

use bytes::Bytes;
use serde_json::{Map, Value};

/// Decoded request body before normalization.
#[derive(Debug, Default)]
pub struct RawSubmission {
    pub fields: Map<String, Value>,
    pub files: Vec<Upload>,
}

impl RawSubmission {
    pub fn file(&self, field: &str) -> Option<&Upload> {
        self.files.iter().find(|f| f.field == field)
    }
}

/// A file part from a multipart body.
#[derive(Debug, Clone)]
pub struct Upload {
    pub field: String,
    pub filename: String,
    pub content_type: Option<String>,
    pub data: Bytes,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum UserType {
    Single,
    Team,
}

/// A file named by the submitter. JSON bodies only carry the name, so
/// `content_type` is unknown and `data` is empty there.
#[derive(Debug, Clone, PartialEq)]
pub struct FileField {
    pub filename: String,
    pub content_type: Option<String>,
    pub data: Bytes,
}

/// A normalized form submission. Lives for one request only.
#[derive(Debug, Clone)]
pub struct Submission {
    pub salutation: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub company_name: String,
    pub company_address: String,
    pub app_title: String,
    pub play_store_emails: Vec<String>,
    pub practitioners: Vec<String>,
    pub user_type: UserType,
    pub team_count: u32,
    pub treatments_file: Option<FileField>,
    pub logo_file: Option<FileField>,
    pub b2b_confirmed: bool,
}

impl Submission {
    /// "Team (n)" or "1 Person" as shown in the email.
    pub fn user_count_label(&self) -> String {
        match self.user_type {
            UserType::Team => format!("Team ({})", self.team_count),
            UserType::Single => "1 Person".to_string(),
        }
    }
}
