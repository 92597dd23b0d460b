/// Worker configuration
///
/// Loaded from environment variables (a `.env` file is read first when
/// present).
///
/// # Environment Variables
///
/// - `DATABASE_URL`: PostgreSQL connection string (required)
/// - `DATABASE_MAX_CONNECTIONS`: pool size (default: 5)
/// - `SMTP_HOST`: mail relay (default: smtp.yandex.ru)
/// - `SMTP_PORT`: relay port (default: 465)
/// - `SMTP_USERNAME`, `SMTP_PASSWORD`: relay credentials (optional, set together)
/// - `SMTP_TLS`: `implicit`, `starttls` or `none` (default: implicit)
/// - `MAIL_FROM`: sender address (required)
/// - `REMINDER_LEAD_HOURS`: how far ahead of the meeting to remind (default: 24)
/// - `MAIL_SEND_TIMEOUT_SECS`: per-message send timeout (default: 30)

use std::env;
use std::str::FromStr;
use std::time::Duration;

/// Complete worker configuration
#[derive(Debug, Clone)]
pub struct WorkerConfig {
    pub database_url: String,
    pub database_max_connections: u32,
    pub smtp: SmtpConfig,

    /// Sender mailbox, e.g. `EventHub <noreply@example.com>`
    pub mail_from: String,

    pub reminder_lead_hours: i64,
    pub send_timeout: Duration,
}

/// How the SMTP connection is secured
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SmtpTls {
    /// TLS from the first byte (SMTPS, usually port 465)
    Implicit,

    /// Plain connection upgraded with STARTTLS (usually port 587)
    StartTls,

    /// No encryption; local relays and test servers only
    None,
}

impl FromStr for SmtpTls {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "implicit" | "ssl" | "tls" => Ok(SmtpTls::Implicit),
            "starttls" => Ok(SmtpTls::StartTls),
            "none" | "plain" => Ok(SmtpTls::None),
            other => Err(format!("unknown SMTP_TLS mode: {}", other)),
        }
    }
}

/// SMTP relay settings
#[derive(Clone)]
pub struct SmtpConfig {
    pub host: String,
    pub port: u16,
    pub username: Option<String>,
    pub password: Option<String>,
    pub tls: SmtpTls,
}

impl std::fmt::Debug for SmtpConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SmtpConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .field("tls", &self.tls)
            .finish()
    }
}

impl WorkerConfig {
    /// Loads configuration from environment variables
    ///
    /// # Errors
    ///
    /// Returns an error if a required variable is missing or a value does not
    /// parse.
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let database_url = env::var("DATABASE_URL")
            .map_err(|_| anyhow::anyhow!("DATABASE_URL environment variable is required"))?;

        let database_max_connections = env::var("DATABASE_MAX_CONNECTIONS")
            .unwrap_or_else(|_| "5".to_string())
            .parse::<u32>()?;

        let host = env::var("SMTP_HOST").unwrap_or_else(|_| "smtp.yandex.ru".to_string());
        let port = env::var("SMTP_PORT")
            .unwrap_or_else(|_| "465".to_string())
            .parse::<u16>()?;

        let username = env::var("SMTP_USERNAME").ok().filter(|s| !s.is_empty());
        let password = env::var("SMTP_PASSWORD").ok().filter(|s| !s.is_empty());
        if username.is_some() != password.is_some() {
            anyhow::bail!("SMTP_USERNAME and SMTP_PASSWORD must be set together");
        }

        let tls = env::var("SMTP_TLS")
            .unwrap_or_else(|_| "implicit".to_string())
            .parse::<SmtpTls>()
            .map_err(|e| anyhow::anyhow!(e))?;

        let mail_from = env::var("MAIL_FROM")
            .map_err(|_| anyhow::anyhow!("MAIL_FROM environment variable is required"))?;

        let reminder_lead_hours = env::var("REMINDER_LEAD_HOURS")
            .unwrap_or_else(|_| "24".to_string())
            .parse::<i64>()?;
        if reminder_lead_hours < 0 {
            anyhow::bail!("REMINDER_LEAD_HOURS must not be negative");
        }

        let send_timeout_secs = env::var("MAIL_SEND_TIMEOUT_SECS")
            .unwrap_or_else(|_| "30".to_string())
            .parse::<u64>()?;
        if send_timeout_secs == 0 {
            anyhow::bail!("MAIL_SEND_TIMEOUT_SECS must be greater than zero");
        }

        Ok(Self {
            database_url,
            database_max_connections,
            smtp: SmtpConfig {
                host,
                port,
                username,
                password,
                tls,
            },
            mail_from,
            reminder_lead_hours,
            send_timeout: Duration::from_secs(send_timeout_secs),
        })
    }
}
