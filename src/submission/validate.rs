use std::sync::LazyLock;

use regex::Regex;

use super::{FileField, Submission, UserType};

static EMAIL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").unwrap());

pub const TREATMENTS_MIME_TYPES: &[&str] = &[
    "text/csv",
    "application/pdf",
    "application/vnd.ms-excel",
    "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
    "image/png",
    "image/jpeg",
    "image/webp",
];

pub const LOGO_MIME_TYPES: &[&str] = &["image/png", "image/jpeg"];

pub fn is_valid_email(email: &str) -> bool {
    EMAIL_RE.is_match(email)
}

/// Compare a declared MIME type against an allow-list, ignoring case,
/// parameters and the common `image/jpg` alias.
pub fn mime_allowed(declared: &str, allowed: &[&str]) -> bool {
    let essence = declared
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();
    let essence = if essence == "image/jpg" {
        "image/jpeg".to_string()
    } else {
        essence
    };
    allowed.contains(&essence.as_str())
}

#[derive(Debug, Default, PartialEq)]
pub struct ValidationError {
    pub missing: Vec<String>,
    pub invalid: Vec<String>,
}

impl ValidationError {
    pub fn is_empty(&self) -> bool {
        self.missing.is_empty() && self.invalid.is_empty()
    }
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut clauses = Vec::new();
        if !self.missing.is_empty() {
            clauses.push(format!("Please fill in: {}.", self.missing.join(", ")));
        }
        if !self.invalid.is_empty() {
            clauses.push(format!("Please check: {}.", self.invalid.join(", ")));
        }
        if clauses.is_empty() {
            write!(f, "Validation failed.")
        } else {
            write!(f, "{}", clauses.join(" "))
        }
    }
}

/// Check every field and report all problems at once.
pub fn validate(submission: &Submission, require_uploads: bool) -> Result<(), ValidationError> {
    let mut errors = ValidationError::default();
    let s = submission;

    require(&mut errors, &s.salutation, "Anrede");
    require(&mut errors, &s.first_name, "Vorname");
    require(&mut errors, &s.last_name, "Nachname");
    require(&mut errors, &s.email, "E-Mail");
    if !s.email.is_empty() && !is_valid_email(&s.email) {
        errors.invalid.push("E-Mail (Format)".to_string());
    }

    require(&mut errors, &s.company_name, "Unternehmensname");
    require(&mut errors, &s.company_address, "Anschrift");
    require(&mut errors, &s.app_title, "Praxisname (App-Titel)");

    if s.play_store_emails.is_empty() {
        errors
            .missing
            .push("Google-Mailadressen (Play-Store-Zugriff)".to_string());
    } else {
        let bad: Vec<&str> = s
            .play_store_emails
            .iter()
            .filter(|e| !is_valid_email(e))
            .map(|e| e.as_str())
            .collect();
        if !bad.is_empty() {
            errors
                .invalid
                .push(format!("Google-Mailadressen ungültig: {}", bad.join(", ")));
        }
    }

    if s.practitioners.is_empty() {
        errors
            .missing
            .push("Behandler:innen (Name/Kürzel)".to_string());
    }

    if s.user_type == UserType::Team && s.team_count < 2 {
        errors.invalid.push("Teamgröße (mind. 2)".to_string());
    }

    check_file(
        &mut errors,
        s.treatments_file.as_ref(),
        require_uploads,
        "Behandlungen – Datei",
        "Behandlungen – Dateityp (CSV, PDF, Excel, PNG, JPEG, WebP)",
        TREATMENTS_MIME_TYPES,
    );
    check_file(
        &mut errors,
        s.logo_file.as_ref(),
        require_uploads,
        "Logo – Datei",
        "Logo – Dateityp (PNG, JPEG)",
        LOGO_MIME_TYPES,
    );

    if !s.b2b_confirmed {
        errors.invalid.push("B2B-Bestätigung (§14 BGB)".to_string());
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn require(errors: &mut ValidationError, value: &str, label: &str) {
    if value.is_empty() {
        errors.missing.push(label.to_string());
    }
}

fn check_file(
    errors: &mut ValidationError,
    file: Option<&FileField>,
    required: bool,
    missing_label: &str,
    invalid_label: &str,
    allowed: &[&str],
) {
    match file {
        None if required => errors.missing.push(missing_label.to_string()),
        None => {}
        Some(file) => {
            // Name-only references from JSON bodies have no declared type.
            let declared = match (&file.content_type, file.data.is_empty()) {
                (Some(ct), _) => Some(ct.as_str()),
                (None, false) => Some("application/octet-stream"),
                (None, true) => None,
            };
            if let Some(ct) = declared {
                if !mime_allowed(ct, allowed) {
                    errors.invalid.push(invalid_label.to_string());
                }
            }
        }
    }
}
