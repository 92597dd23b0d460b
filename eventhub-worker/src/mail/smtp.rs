/// SMTP delivery over `lettre`
///
/// # Example
///
/// ```no_run
/// use eventhub_worker::config::{SmtpConfig, SmtpTls};
/// use eventhub_worker::mail::{Mailer, MailMessage, SmtpMailer};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let config = SmtpConfig {
///     host: "smtp.yandex.ru".to_string(),
///     port: 465,
///     username: Some("events@yandex.ru".to_string()),
///     password: Some("app-password".to_string()),
///     tls: SmtpTls::Implicit,
/// };
/// let mailer = SmtpMailer::new(&config, "events@yandex.ru")?;
///
/// mailer
///     .send(&MailMessage {
///         to: "alice@example.com".to_string(),
///         subject: "Reminder".to_string(),
///         body: "See you tomorrow".to_string(),
///     })
///     .await?;
/// # Ok(())
/// # }
/// ```

use super::{MailError, MailMessage, MailResult, Mailer};
use crate::config::{SmtpConfig, SmtpTls};
use async_trait::async_trait;
use lettre::{
    message::{header::ContentType, Mailbox},
    transport::smtp::authentication::Credentials,
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
};

fn parse_mailbox(address: &str) -> MailResult<Mailbox> {
    address.parse().map_err(|e: lettre::address::AddressError| MailError::InvalidAddress {
        address: address.to_string(),
        reason: e.to_string(),
    })
}

/// SMTP mailer
pub struct SmtpMailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
}

impl SmtpMailer {
    /// Builds the transport; no connection is opened until the first send
    pub fn new(config: &SmtpConfig, from: &str) -> MailResult<Self> {
        let from = parse_mailbox(from)?;

        let builder = match config.tls {
            SmtpTls::Implicit => AsyncSmtpTransport::<Tokio1Executor>::relay(&config.host)
                .map_err(|e| MailError::Transport(e.to_string()))?,
            SmtpTls::StartTls => {
                AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.host)
                    .map_err(|e| MailError::Transport(e.to_string()))?
            }
            SmtpTls::None => AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(&config.host),
        };

        let builder = builder.port(config.port);
        let builder = match (&config.username, &config.password) {
            (Some(username), Some(password)) => {
                builder.credentials(Credentials::new(username.clone(), password.clone()))
            }
            _ => builder,
        };

        tracing::info!(
            host = %config.host,
            port = config.port,
            tls = ?config.tls,
            "SMTP mailer configured"
        );

        Ok(Self {
            transport: builder.build(),
            from,
        })
    }

    fn build_message(&self, message: &MailMessage) -> MailResult<Message> {
        Message::builder()
            .from(self.from.clone())
            .to(parse_mailbox(&message.to)?)
            .subject(message.subject.clone())
            .header(ContentType::TEXT_PLAIN)
            .body(message.body.clone())
            .map_err(|e| MailError::Build(e.to_string()))
    }
}

#[async_trait]
impl Mailer for SmtpMailer {
    fn name(&self) -> &str {
        "smtp"
    }

    async fn send(&self, message: &MailMessage) -> MailResult<()> {
        let email = self.build_message(message)?;

        self.transport
            .send(email)
            .await
            .map_err(|e| MailError::Transport(e.to_string()))?;

        tracing::debug!(to = %message.to, "Mail accepted by relay");
        Ok(())
    }
}
