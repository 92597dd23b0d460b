/// In-memory mailer for tests and dry runs
///
/// Records every message it accepts. Recipients registered with
/// [`RecordingMailer::fail_for`] get a transport error instead, and
/// [`RecordingMailer::with_delay`] makes every send take a while.

use super::{MailError, MailMessage, MailResult, Mailer};
use async_trait::async_trait;
use std::collections::HashSet;
use std::time::Duration;
use tokio::sync::Mutex;

#[derive(Default)]
pub struct RecordingMailer {
    sent: Mutex<Vec<MailMessage>>,
    failing: HashSet<String>,
    delay: Option<Duration>,
}

impl RecordingMailer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fails every send to `address`
    pub fn fail_for(mut self, address: impl Into<String>) -> Self {
        self.failing.insert(address.into());
        self
    }

    /// Sleeps before every send
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Messages accepted so far, in send order
    pub async fn sent(&self) -> Vec<MailMessage> {
        self.sent.lock().await.clone()
    }
}

#[async_trait]
impl Mailer for RecordingMailer {
    fn name(&self) -> &str {
        "recording"
    }

    async fn send(&self, message: &MailMessage) -> MailResult<()> {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        if self.failing.contains(&message.to) {
            return Err(MailError::Transport(format!(
                "recipient {} rejected",
                message.to
            )));
        }

        self.sent.lock().await.push(message.clone());
        Ok(())
    }
}
