use axum::http::HeaderMap;
use bytes::Bytes;
use serde_json::json;

use praxismail::config::recipients_or_default;
use praxismail::config::DEFAULT_RECIPIENT;
use praxismail::email::templates::{escape_html, render_html, render_text};
use praxismail::submission::fields::{normalize, split_list};
use praxismail::submission::honeypot::is_spam;
use praxismail::submission::metadata;
use praxismail::submission::parser::{parse_form_urlencoded, parse_json, ParseError};
use praxismail::submission::validate::{
    is_valid_email, mime_allowed, validate, ValidationError, LOGO_MIME_TYPES,
    TREATMENTS_MIME_TYPES,
};
use praxismail::submission::{RawSubmission, Upload, UserType};

fn raw(value: serde_json::Value) -> RawSubmission {
    RawSubmission {
        fields: value.as_object().unwrap().clone(),
        files: Vec::new(),
    }
}

fn complete() -> RawSubmission {
    raw(json!({
        "anrede": " Frau ",
        "vorname": "Anna",
        "nachname": "Muster",
        "email": "a@b.de",
        "company_name": "Praxis",
        "company_address": "Weg 1",
        "app_title": "Praxis",
        "play_emails": "x@gmail.com",
        "behandlers": ["Anna", "  ", "Bernd"],
        "treatments_file_name": "t.csv",
        "logo_file_name": "l.png",
        "b2b": "true"
    }))
}

// ── Email pattern ───────────────────────────────────────────────

#[test]
fn email_pattern_accepts_local_at_domain_tld() {
    for ok in ["a@b.de", "first.last+tag@sub.example.org", "x@y.z", "ü@ö.de"] {
        assert!(is_valid_email(ok), "{ok}");
    }
}

#[test]
fn email_pattern_rejects_everything_else() {
    for bad in [
        "",
        "not-an-email",
        "a@b",
        "@b.de",
        "a@.de.",
        "a b@c.de",
        "a@b c.de",
        "a@@b.de",
        "a@b.de ",
    ] {
        assert!(!is_valid_email(bad), "{bad:?}");
    }
}

// ── Normalization ───────────────────────────────────────────────

#[test]
fn lists_split_on_newlines_commas_and_semicolons() {
    assert_eq!(
        split_list("a@x.de,\n b@x.de ;; c@x.de\n\n"),
        vec!["a@x.de", "b@x.de", "c@x.de"]
    );
    assert!(split_list(" ,;\n").is_empty());
}

#[test]
fn normalize_trims_and_coerces() {
    let s = normalize(&complete());
    assert_eq!(s.salutation, "Frau");
    assert_eq!(s.practitioners, vec!["Anna", "Bernd"]);
    assert_eq!(s.play_store_emails, vec!["x@gmail.com"]);
    assert_eq!(s.user_type, UserType::Single);
    assert_eq!(s.team_count, 1);
    assert!(s.b2b_confirmed);
    assert_eq!(s.treatments_file.as_ref().unwrap().filename, "t.csv");
    assert!(s.treatments_file.as_ref().unwrap().content_type.is_none());
}

#[test]
fn native_list_elements_are_not_split() {
    let mut r = complete();
    r.fields.insert("behandlers".into(), json!(["Müller, Anna", " Schmidt; Bernd ", ""]));
    r.fields.insert("play_emails".into(), json!(["a@b.de, c@d.de"]));
    let s = normalize(&r);
    assert_eq!(s.practitioners, vec!["Müller, Anna", "Schmidt; Bernd"]);
    assert_eq!(s.play_store_emails, vec!["a@b.de, c@d.de"]);

    let err = validate(&s, true).unwrap_err();
    assert_eq!(err.invalid, vec!["Google-Mailadressen ungültig: a@b.de, c@d.de"]);
}

#[test]
fn user_type_must_be_exactly_team() {
    for value in ["Team", "TEAM", "teams", ""] {
        let mut r = complete();
        r.fields.insert("nutzer_typ".into(), json!(value));
        r.fields.insert("team_count".into(), json!(5));
        let s = normalize(&r);
        assert_eq!(s.user_type, UserType::Single, "{value:?}");
        assert_eq!(s.team_count, 1);
    }
}

#[test]
fn normalize_reads_team_count_only_for_teams() {
    let mut r = complete();
    r.fields.insert("nutzer_typ".into(), json!("team"));
    r.fields.insert("team_count".into(), json!("4 Personen"));
    let s = normalize(&r);
    assert_eq!(s.user_type, UserType::Team);
    assert_eq!(s.team_count, 4);

    r.fields.insert("nutzer_typ".into(), json!("single"));
    assert_eq!(normalize(&r).team_count, 1);
}

#[test]
fn b2b_accepts_checkbox_values() {
    for (value, expected) in [
        (json!(true), true),
        (json!("TRUE"), true),
        (json!("on"), true),
        (json!("1"), true),
        (json!(false), false),
        (json!("false"), false),
        (json!(""), false),
    ] {
        let mut r = complete();
        r.fields.insert("b2b".into(), value.clone());
        assert_eq!(normalize(&r).b2b_confirmed, expected, "{value}");
    }
}

#[test]
fn uploaded_part_wins_over_file_name() {
    let mut r = complete();
    r.files.push(Upload {
        field: "logo_file".into(),
        filename: "real.jpg".into(),
        content_type: Some("image/jpeg".into()),
        data: Bytes::from_static(b"\xff\xd8"),
    });
    let s = normalize(&r);
    let logo = s.logo_file.unwrap();
    assert_eq!(logo.filename, "real.jpg");
    assert_eq!(logo.content_type.as_deref(), Some("image/jpeg"));
}

// ── Validation ──────────────────────────────────────────────────

#[test]
fn complete_submission_validates() {
    assert_eq!(validate(&normalize(&complete()), true), Ok(()));
}

#[test]
fn team_rules() {
    for (count, valid) in [(0, false), (1, false), (2, true), (50, true)] {
        let mut r = complete();
        r.fields.insert("nutzer_typ".into(), json!("team"));
        r.fields.insert("team_count".into(), json!(count));
        assert_eq!(validate(&normalize(&r), true).is_ok(), valid, "team of {count}");
    }
}

#[test]
fn disallowed_mime_types_are_invalid() {
    let mut r = complete();
    r.files.push(Upload {
        field: "treatments_file".into(),
        filename: "t.zip".into(),
        content_type: Some("application/zip".into()),
        data: Bytes::from_static(b"PK"),
    });
    r.files.push(Upload {
        field: "logo_file".into(),
        filename: "l.webp".into(),
        content_type: Some("image/webp".into()),
        data: Bytes::from_static(b"RIFF"),
    });

    let err = validate(&normalize(&r), true).unwrap_err();
    assert!(err.missing.is_empty());
    assert_eq!(
        err.invalid,
        vec![
            "Behandlungen – Dateityp (CSV, PDF, Excel, PNG, JPEG, WebP)",
            "Logo – Dateityp (PNG, JPEG)",
        ]
    );
}

#[test]
fn mime_comparison_is_lenient_about_case_and_params() {
    assert!(mime_allowed("IMAGE/PNG", LOGO_MIME_TYPES));
    assert!(mime_allowed("image/jpg", LOGO_MIME_TYPES));
    assert!(mime_allowed("text/csv; charset=utf-8", TREATMENTS_MIME_TYPES));
    assert!(mime_allowed(
        "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
        TREATMENTS_MIME_TYPES
    ));
    assert!(!mime_allowed("image/webp", LOGO_MIME_TYPES));
    assert!(!mime_allowed("application/x-msdownload", LOGO_MIME_TYPES));
}

#[test]
fn validation_message_has_both_clauses() {
    let err = ValidationError {
        missing: vec!["Anrede".into(), "Vorname".into()],
        invalid: vec!["E-Mail (Format)".into()],
    };
    assert_eq!(
        err.to_string(),
        "Please fill in: Anrede, Vorname. Please check: E-Mail (Format)."
    );

    let only_invalid = ValidationError {
        missing: vec![],
        invalid: vec!["Teamgröße (mind. 2)".into()],
    };
    assert_eq!(only_invalid.to_string(), "Please check: Teamgröße (mind. 2).");
}

// ── Honeypot ────────────────────────────────────────────────────

#[test]
fn honeypot_detection() {
    assert!(is_spam(&raw(json!({ "company": "Bot Inc" })), "company"));
    assert!(is_spam(&raw(json!({ "company": 1 })), "company"));
    assert!(!is_spam(&raw(json!({ "company": "  " })), "company"));
    assert!(!is_spam(&raw(json!({ "company": null })), "company"));
    assert!(!is_spam(&raw(json!({ "company_name": "Praxis" })), "company"));
    assert!(!is_spam(&raw(json!({ "company": "x" })), ""));
}

#[test]
fn honeypot_file_part_counts_as_spam() {
    let mut r = raw(json!({}));
    r.files.push(Upload {
        field: "company".into(),
        filename: "bot.txt".into(),
        content_type: Some("text/plain".into()),
        data: Bytes::from_static(b"x"),
    });
    assert!(is_spam(&r, "company"));
}

// ── Parsing ─────────────────────────────────────────────────────

#[test]
fn json_parsing_edge_cases() {
    assert!(parse_json(b"").unwrap().fields.is_empty());
    assert!(parse_json(b"  \n").unwrap().fields.is_empty());
    assert_eq!(parse_json(b"null").unwrap_err(), ParseError::InvalidJson);
    assert_eq!(parse_json(b"\"text\"").unwrap_err(), ParseError::InvalidJson);
    assert_eq!(parse_json(b"{oops}").unwrap_err(), ParseError::InvalidJson);
}

#[test]
fn urlencoded_repeated_keys_become_lists() {
    let r = parse_form_urlencoded(b"play_emails=a%40x.de&play_emails=b%40x.de&vorname=Anna");
    assert_eq!(r.fields["play_emails"], json!(["a@x.de", "b@x.de"]));
    assert_eq!(r.fields["vorname"], json!("Anna"));
}

// ── Rendering ───────────────────────────────────────────────────

#[test]
fn escape_html_covers_all_special_characters() {
    assert_eq!(
        escape_html(r#"<a href="x">Tom & 'Jerry'</a>"#),
        "&lt;a href=&quot;x&quot;&gt;Tom &amp; &#39;Jerry&#39;&lt;/a&gt;"
    );
}

#[test]
fn script_in_any_field_is_never_emitted_raw() {
    let payload = "<script>alert(1)</script>";
    let mut r = complete();
    for key in ["anrede", "vorname", "nachname", "company_name", "company_address", "app_title"] {
        r.fields.insert(key.into(), json!(payload));
    }
    r.fields.insert("behandlers".into(), json!([payload]));
    let html = render_html(&normalize(&r));
    assert!(!html.contains("<script"));
    assert!(!html.contains("</script"));
}

#[test]
fn empty_lists_render_placeholders() {
    let mut r = complete();
    r.fields.remove("behandlers");
    r.fields.remove("play_emails");
    let s = normalize(&r);

    let html = render_html(&s);
    assert!(html.contains("<h4>Behandler:innen</h4>\n  <p>–</p>"));
    let text = render_text(&s);
    assert!(text.contains("Behandler:innen:\n-\n"));
}

#[test]
fn text_rendering_lists_hyphen_prefixed_lines() {
    let text = render_text(&normalize(&complete()));
    assert!(text.contains("Behandler:innen:\n- Anna\n- Bernd\n"));
    assert!(text.contains("Nutzeranzahl: 1 Person"));
    assert!(text.contains("B2B bestätigt: Ja"));
}

// ── Config & metadata ───────────────────────────────────────────

#[test]
fn recipients_fall_back_to_default() {
    assert_eq!(recipients_or_default(None), vec![DEFAULT_RECIPIENT]);
    assert_eq!(recipients_or_default(Some(" , ")), vec![DEFAULT_RECIPIENT]);
    assert_eq!(
        recipients_or_default(Some("a@x.de; b@x.de")),
        vec!["a@x.de", "b@x.de"]
    );
}

#[test]
fn forwarded_for_only_trusted_from_proxies() {
    let mut headers = HeaderMap::new();
    headers.insert("x-forwarded-for", "203.0.113.7, 10.0.0.2".parse().unwrap());
    headers.insert("user-agent", "curl/8".parse().unwrap());
    let proxy = "10.0.0.2".parse().ok();
    let trusted: Vec<ipnet::IpNet> = vec!["10.0.0.0/8".parse().unwrap()];

    let info = metadata::extract(&headers, proxy, &trusted);
    assert_eq!(info.ip, "203.0.113.7");
    assert_eq!(info.user_agent, "curl/8");

    let info = metadata::extract(&headers, proxy, &[]);
    assert_eq!(info.ip, "10.0.0.2");
}
