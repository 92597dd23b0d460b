/// Mail transport
///
/// The scheduler talks to a [`Mailer`]; production uses [`SmtpMailer`], tests
/// use [`RecordingMailer`].

use async_trait::async_trait;
use std::time::Duration;

pub mod recording;
pub mod smtp;

pub use recording::RecordingMailer;
pub use smtp::SmtpMailer;

/// Mail error types
#[derive(Debug, thiserror::Error)]
pub enum MailError {
    /// Sender or recipient is not a valid mailbox
    #[error("Invalid address {address:?}: {reason}")]
    InvalidAddress { address: String, reason: String },

    /// Message could not be assembled
    #[error("Failed to build message: {0}")]
    Build(String),

    /// Relay rejected the message or the connection failed
    #[error("Transport error: {0}")]
    Transport(String),

    /// Send did not finish in time
    #[error("Send timed out after {0:?}")]
    Timeout(Duration),
}

/// Mail result type alias
pub type MailResult<T> = Result<T, MailError>;

/// Plain-text message to one recipient
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MailMessage {
    pub to: String,
    pub subject: String,
    pub body: String,
}

/// Something that delivers [`MailMessage`]s
#[async_trait]
pub trait Mailer: Send + Sync {
    /// Short name for logs
    fn name(&self) -> &str;

    async fn send(&self, message: &MailMessage) -> MailResult<()>;
}
