use std::net::IpAddr;

use ipnet::IpNet;

/// Recipient used when the provider's `*_TO` variable is unset.
pub const DEFAULT_RECIPIENT: &str = "kontakt@praxiskalender.de";

pub const DEFAULT_SUBJECT: &str = "Anfrage Vollversion – Praxiskalender";

#[derive(Debug, Clone)]
pub struct Config {
    pub host: IpAddr,
    pub port: u16,
    pub log_level: String,
    pub max_body_size: usize,
    pub limits: UploadLimits,
    pub require_uploads: bool,
    pub honeypot_field: String,
    pub trusted_proxies: Vec<IpNet>,
    pub cors_origins: Vec<String>,
    pub mail: MailConfig,
}

#[derive(Debug, Clone, Copy)]
pub struct UploadLimits {
    pub max_file_size: u64,
    pub max_files: usize,
    pub max_fields: usize,
}

impl Default for UploadLimits {
    fn default() -> Self {
        Self {
            max_file_size: 10 * 1024 * 1024,
            max_files: 5,
            max_fields: 50,
        }
    }
}

#[derive(Debug, Clone)]
pub struct MailConfig {
    pub provider: Provider,
    pub subject: String,
    pub from: Option<String>,
    pub to: Vec<String>,
    pub api_key: Option<String>,
    pub api_base: String,
    pub smtp: Option<SmtpConfig>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Provider {
    SendGrid,
    Resend,
    Smtp,
}

impl Provider {
    /// Environment variable prefix for this provider's settings.
    pub fn env_prefix(&self) -> &'static str {
        match self {
            Provider::SendGrid => "SENDGRID",
            Provider::Resend => "RESEND",
            Provider::Smtp => "SMTP",
        }
    }

    fn default_api_base(&self) -> &'static str {
        match self {
            Provider::SendGrid => "https://api.sendgrid.com/v3",
            Provider::Resend => "https://api.resend.com",
            Provider::Smtp => "",
        }
    }
}

#[derive(Debug, Clone)]
pub struct SmtpConfig {
    pub host: String,
    pub port: u16,
    pub user: Option<String>,
    pub pass: Option<String>,
    pub tls: SmtpTls,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SmtpTls {
    StartTls,
    Tls,
    None,
}

impl MailConfig {
    /// Names of the environment variables the selected provider still needs.
    pub fn missing_settings(&self) -> Vec<String> {
        let prefix = self.provider.env_prefix();
        let mut missing = Vec::new();
        match self.provider {
            Provider::SendGrid | Provider::Resend => {
                if self.api_key.is_none() {
                    missing.push(format!("{prefix}_API_KEY"));
                }
            }
            Provider::Smtp => {
                if self.smtp.is_none() {
                    missing.push(format!("{prefix}_HOST"));
                }
            }
        }
        if self.from.is_none() {
            missing.push(format!("{prefix}_FROM"));
        }
        missing
    }

    /// Client-facing message for a provider that cannot send.
    pub fn setup_error(&self) -> String {
        let missing = self.missing_settings();
        if missing.is_empty() {
            "Server not configured.".to_string()
        } else {
            format!("Server not configured ({} missing).", missing.join(" or "))
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self, String> {
        let host: IpAddr = env_or("PRAXISMAIL_HOST", "0.0.0.0")
            .parse()
            .map_err(|e| format!("Invalid PRAXISMAIL_HOST: {e}"))?;

        let port: u16 = env_or("PRAXISMAIL_PORT", "3000")
            .parse()
            .map_err(|e| format!("Invalid PRAXISMAIL_PORT: {e}"))?;

        let log_level = env_or("PRAXISMAIL_LOG_LEVEL", "info");

        let max_body_size: usize = env_or("PRAXISMAIL_MAX_BODY_SIZE", "1048576")
            .parse()
            .map_err(|e| format!("Invalid PRAXISMAIL_MAX_BODY_SIZE: {e}"))?;

        let defaults = UploadLimits::default();
        let limits = UploadLimits {
            max_file_size: env_parse("PRAXISMAIL_MAX_FILE_SIZE", defaults.max_file_size)?,
            max_files: env_parse("PRAXISMAIL_MAX_FILES", defaults.max_files)?,
            max_fields: env_parse("PRAXISMAIL_MAX_FIELDS", defaults.max_fields)?,
        };

        let require_uploads = match env_or("PRAXISMAIL_REQUIRE_UPLOADS", "true")
            .to_lowercase()
            .as_str()
        {
            "true" | "1" | "yes" => true,
            "false" | "0" | "no" => false,
            other => return Err(format!("Invalid PRAXISMAIL_REQUIRE_UPLOADS: {other}")),
        };

        let honeypot_field = env_or("PRAXISMAIL_HONEYPOT_FIELD", "company");

        let trusted_proxies: Vec<IpNet> = env_or("PRAXISMAIL_TRUSTED_PROXIES", "")
            .split(',')
            .filter(|s| !s.trim().is_empty())
            .map(|s| {
                s.trim()
                    .parse()
                    .map_err(|e| format!("Invalid PRAXISMAIL_TRUSTED_PROXIES entry '{s}': {e}"))
            })
            .collect::<Result<Vec<_>, _>>()?;

        let cors_origins = split_list(&env_or("PRAXISMAIL_CORS_ORIGINS", ""));

        let mail = mail_from_env()?;

        Ok(Config {
            host,
            port,
            log_level,
            max_body_size,
            limits,
            require_uploads,
            honeypot_field,
            trusted_proxies,
            cors_origins,
            mail,
        })
    }
}

fn mail_from_env() -> Result<MailConfig, String> {
    let provider = match env_or("PRAXISMAIL_PROVIDER", "sendgrid").to_lowercase().as_str() {
        "sendgrid" => Provider::SendGrid,
        "resend" => Provider::Resend,
        "smtp" => Provider::Smtp,
        other => return Err(format!("Invalid PRAXISMAIL_PROVIDER: {other}")),
    };
    let prefix = provider.env_prefix();

    let subject = env_or("PRAXISMAIL_SUBJECT", DEFAULT_SUBJECT);
    let from = env_nonempty(&format!("{prefix}_FROM"));
    let to = recipients_or_default(env_nonempty(&format!("{prefix}_TO")).as_deref());

    let api_key = env_nonempty(&format!("{prefix}_API_KEY"));
    let api_base = env_nonempty(&format!("{prefix}_API_BASE"))
        .unwrap_or_else(|| provider.default_api_base().to_string());

    let smtp = match env_nonempty("SMTP_HOST") {
        Some(host) => Some(SmtpConfig {
            host,
            port: env_parse("SMTP_PORT", 587u16)?,
            user: env_nonempty("SMTP_USER"),
            pass: env_nonempty("SMTP_PASS"),
            tls: match env_or("SMTP_TLS", "starttls").to_lowercase().as_str() {
                "starttls" => SmtpTls::StartTls,
                "tls" => SmtpTls::Tls,
                "none" => SmtpTls::None,
                other => return Err(format!("Invalid SMTP_TLS: {other}")),
            },
        }),
        None => None,
    };

    Ok(MailConfig {
        provider,
        subject,
        from,
        to,
        api_key,
        api_base,
        smtp,
    })
}

/// Split a comma/semicolon separated recipient list, falling back to
/// [`DEFAULT_RECIPIENT`] when nothing usable is left.
pub fn recipients_or_default(raw: Option<&str>) -> Vec<String> {
    let list = raw.map(split_list).unwrap_or_default();
    if list.is_empty() {
        vec![DEFAULT_RECIPIENT.to_string()]
    } else {
        list
    }
}

fn split_list(raw: &str) -> Vec<String> {
    raw.split([',', ';'])
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .map(|s| s.to_string())
        .collect()
}

fn env_nonempty(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

fn env_parse<T>(key: &str, default: T) -> Result<T, String>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match env_nonempty(key) {
        Some(v) => v.parse().map_err(|e| format!("Invalid {key}: {e}")),
        None => Ok(default),
    }
}
