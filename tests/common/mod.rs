#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::{Client, StatusCode};
use serde_json::{json, Value};

use praxismail::config::{Config, MailConfig, Provider, UploadLimits, DEFAULT_SUBJECT};
use praxismail::email::{MailError, Mailer, OutboundEmail};

/// In-process mailer that records every message instead of sending it.
#[derive(Default)]
pub struct RecordingMailer {
    sent: Mutex<Vec<OutboundEmail>>,
    reject: bool,
}

impl RecordingMailer {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// A mailer whose provider refuses every message.
    pub fn rejecting() -> Arc<Self> {
        Arc::new(Self {
            sent: Mutex::new(Vec::new()),
            reject: true,
        })
    }

    pub fn sent(&self) -> Vec<OutboundEmail> {
        self.sent.lock().unwrap().clone()
    }

    pub fn count(&self) -> usize {
        self.sent.lock().unwrap().len()
    }
}

#[async_trait]
impl Mailer for RecordingMailer {
    fn provider(&self) -> &'static str {
        "recording"
    }

    async fn send(&self, email: &OutboundEmail) -> Result<(), MailError> {
        if self.reject {
            return Err(MailError::Rejected {
                status: 500,
                body: "simulated upstream failure".to_string(),
            });
        }
        self.sent.lock().unwrap().push(email.clone());
        Ok(())
    }
}

/// A running test server instance.
pub struct TestApp {
    pub addr: SocketAddr,
    pub client: Client,
}

impl TestApp {
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    /// POST a JSON body to /send-request, return (body, status).
    pub async fn submit_json(&self, data: &Value) -> (Value, StatusCode) {
        let resp = self
            .client
            .post(self.url("/send-request"))
            .json(data)
            .send()
            .await
            .expect("submit json failed");
        let status = resp.status();
        let body: Value = resp.json().await.unwrap_or(json!(null));
        (body, status)
    }

    /// POST a raw body with the given content type.
    pub async fn submit_raw(&self, content_type: &str, body: &str) -> (Value, StatusCode) {
        let resp = self
            .client
            .post(self.url("/send-request"))
            .header("content-type", content_type)
            .body(body.to_string())
            .send()
            .await
            .expect("submit raw failed");
        let status = resp.status();
        let body: Value = resp.json().await.unwrap_or(json!(null));
        (body, status)
    }

    pub async fn submit_form(&self, data: &[(&str, &str)]) -> (Value, StatusCode) {
        let resp = self
            .client
            .post(self.url("/send-request"))
            .form(data)
            .send()
            .await
            .expect("submit form failed");
        let status = resp.status();
        let body: Value = resp.json().await.unwrap_or(json!(null));
        (body, status)
    }

    pub async fn submit_multipart(&self, form: Form) -> (Value, StatusCode) {
        let resp = self
            .client
            .post(self.url("/send-request"))
            .multipart(form)
            .send()
            .await
            .expect("submit multipart failed");
        let status = resp.status();
        let body: Value = resp.json().await.unwrap_or(json!(null));
        (body, status)
    }
}

pub fn test_config() -> Config {
    Config {
        host: "127.0.0.1".parse().unwrap(),
        port: 0, // unused, we bind to random port
        log_level: "warn".to_string(),
        max_body_size: 1_048_576,
        limits: UploadLimits::default(),
        require_uploads: true,
        honeypot_field: "company".to_string(),
        trusted_proxies: vec![],
        cors_origins: vec![],
        mail: MailConfig {
            provider: Provider::SendGrid,
            subject: DEFAULT_SUBJECT.to_string(),
            from: Some("noreply@praxiskalender.test".to_string()),
            to: vec!["inbox@praxiskalender.test".to_string()],
            api_key: Some("test-key".to_string()),
            api_base: "http://127.0.0.1:9".to_string(),
            smtp: None,
        },
    }
}

/// Spawn the app around a recording mailer with the default test config.
pub async fn spawn_app() -> (TestApp, Arc<RecordingMailer>) {
    let mailer = RecordingMailer::new();
    let app = spawn_with(test_config(), Some(mailer.clone())).await;
    (app, mailer)
}

pub async fn spawn_with(config: Config, mailer: Option<Arc<RecordingMailer>>) -> TestApp {
    let mailer = mailer.map(|m| m as Arc<dyn Mailer>);
    serve(praxismail::build_app_with_mailer(config, mailer)).await
}

/// Spawn the app with the mailer `build_app` derives from `config`.
pub async fn spawn_configured(config: Config) -> TestApp {
    serve(praxismail::build_app(config)).await
}

async fn serve(app: axum::Router) -> TestApp {
    // Bind to random port
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind to random port");
    let addr = listener.local_addr().unwrap();

    // Spawn server in background
    tokio::spawn(async move {
        axum::serve(
            listener,
            app.into_make_service_with_connect_info::<SocketAddr>(),
        )
        .await
        .expect("Server failed");
    });

    TestApp {
        addr,
        client: Client::new(),
    }
}

/// A JSON submission that passes every check.
pub fn valid_submission() -> Value {
    json!({
        "anrede": "Frau",
        "vorname": "Anna",
        "nachname": "Muster",
        "email": "a@b.de",
        "company_name": "Praxis Muster GmbH",
        "company_address": "Hauptstr. 1\n12345 Berlin",
        "app_title": "Praxis Muster",
        "play_emails": ["anna@gmail.com", "team@gmail.com"],
        "behandlers": "Anna Muster; Bernd Beispiel",
        "nutzer_typ": "single",
        "treatments_file_name": "behandlungen.csv",
        "logo_file_name": "logo.png",
        "b2b": true
    })
}

/// Multipart text fields matching [`valid_submission`].
pub fn valid_multipart_fields() -> Form {
    Form::new()
        .text("anrede", "Herr")
        .text("vorname", "Bernd")
        .text("nachname", "Beispiel")
        .text("email", "bernd@example.org")
        .text("company_name", "Physio Beispiel")
        .text("company_address", "Ringweg 5\n50667 Köln")
        .text("app_title", "Physio Beispiel")
        .text("play_emails", "bernd@gmail.com")
        .text("play_emails", "empfang@gmail.com")
        .text("behandlers", "Bernd Beispiel\nClara Clever")
        .text("nutzer_typ", "team")
        .text("team_count", "3")
        .text("b2b", "on")
}

pub fn file_part(bytes: Vec<u8>, filename: &str, mime: &str) -> Part {
    Part::bytes(bytes)
        .file_name(filename.to_string())
        .mime_str(mime)
        .unwrap()
}
