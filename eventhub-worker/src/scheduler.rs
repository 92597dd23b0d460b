/// Reminder Scheduler
///
/// Waits for hourly ticks and, on each one, emails every user signed up for an
/// event that falls in the tick's reminder window.
///
/// # States
///
/// ```text
/// Idle ──tick──> Dispatching ──batch done──> Idle
/// ```
///
/// The loop is sequential, so a dispatch never overlaps another one in the
/// same process. Separate worker processes do not coordinate and would each
/// send the same reminders.
///
/// # Failure handling
///
/// Every send is independent and bounded by a timeout. A failed or timed-out
/// send is logged and counted in the [`DispatchReport`], never retried, and
/// never stops the rest of the batch.
///
/// # Example
///
/// ```no_run
/// use eventhub_shared::repository::InMemoryRepository;
/// use eventhub_worker::mail::RecordingMailer;
/// use eventhub_worker::scheduler::ReminderScheduler;
/// use std::sync::Arc;
/// use tokio_util::sync::CancellationToken;
///
/// # async fn example() {
/// let scheduler = ReminderScheduler::new(
///     Arc::new(InMemoryRepository::new()),
///     Arc::new(RecordingMailer::new()),
/// );
///
/// let shutdown = CancellationToken::new();
/// scheduler.run(shutdown).await;
/// # }
/// ```

use crate::mail::{MailError, Mailer};
use crate::reminder::{compose, ReminderPolicy};
use crate::ticks::HourlyTicks;
use chrono::{DateTime, Utc};
use eventhub_shared::repository::{EventRepository, RepositoryError};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;

/// Default per-send timeout
pub const DEFAULT_SEND_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulerState {
    /// Waiting for the next tick
    Idle,

    /// Sending a batch
    Dispatching,
}

/// Outcome of one dispatch
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispatchReport {
    pub tick: DateTime<Utc>,

    /// Events in the reminder window
    pub events: usize,

    pub attempted: usize,
    pub sent: usize,
    pub failed: usize,
}

impl DispatchReport {
    fn new(tick: DateTime<Utc>) -> Self {
        Self {
            tick,
            events: 0,
            attempted: 0,
            sent: 0,
            failed: 0,
        }
    }
}

pub struct ReminderScheduler {
    events: Arc<dyn EventRepository>,
    mailer: Arc<dyn Mailer>,
    policy: ReminderPolicy,
    send_timeout: Duration,
    state: watch::Sender<SchedulerState>,
}

impl ReminderScheduler {
    pub fn new(events: Arc<dyn EventRepository>, mailer: Arc<dyn Mailer>) -> Self {
        let (state, _) = watch::channel(SchedulerState::Idle);

        Self {
            events,
            mailer,
            policy: ReminderPolicy::default(),
            send_timeout: DEFAULT_SEND_TIMEOUT,
            state,
        }
    }

    pub fn with_policy(mut self, policy: ReminderPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_send_timeout(mut self, timeout: Duration) -> Self {
        self.send_timeout = timeout;
        self
    }

    pub fn state(&self) -> SchedulerState {
        *self.state.borrow()
    }

    /// Watches state transitions
    pub fn subscribe(&self) -> watch::Receiver<SchedulerState> {
        self.state.subscribe()
    }

    /// Runs until `shutdown` is cancelled
    ///
    /// A dispatch already in progress finishes before the loop exits.
    pub async fn run(&self, shutdown: CancellationToken) {
        tracing::info!(
            mailer = self.mailer.name(),
            lead_hours = self.policy.lead.num_hours(),
            "Reminder scheduler starting"
        );

        let mut ticks = HourlyTicks::new(shutdown);

        while let Some(tick) = ticks.next().await {
            match self.dispatch_at(tick).await {
                Ok(report) => tracing::info!(
                    tick = %report.tick,
                    events = report.events,
                    attempted = report.attempted,
                    sent = report.sent,
                    failed = report.failed,
                    "Reminder dispatch finished"
                ),
                Err(e) => tracing::error!(tick = %tick, error = %e, "Reminder dispatch aborted"),
            }
        }

        tracing::info!("Reminder scheduler shut down");
    }

    /// Sends the reminders due at `tick`
    ///
    /// The state is `Dispatching` for the duration of the call and `Idle`
    /// afterwards, whether or not it succeeded.
    ///
    /// # Errors
    ///
    /// Returns the storage error if events or their members cannot be read;
    /// mail failures are reported in the [`DispatchReport`] instead.
    pub async fn dispatch_at(&self, tick: DateTime<Utc>) -> Result<DispatchReport, RepositoryError> {
        self.state.send_replace(SchedulerState::Dispatching);
        let result = self.dispatch(tick).await;
        self.state.send_replace(SchedulerState::Idle);
        result
    }

    async fn dispatch(&self, tick: DateTime<Utc>) -> Result<DispatchReport, RepositoryError> {
        let (from, to) = self.policy.window_at(tick);
        let events = self.events.list_events_between(from, to).await?;

        tracing::info!(tick = %tick, from = %from, to = %to, events = events.len(), "Reminder dispatch starting");

        let mut report = DispatchReport::new(tick);
        report.events = events.len();

        for event in &events {
            let users = self.events.list_signed_up_users(event.id).await?;

            for user in &users {
                report.attempted += 1;
                let message = compose(event, user);

                let outcome = match tokio::time::timeout(self.send_timeout, self.mailer.send(&message)).await {
                    Ok(result) => result,
                    Err(_) => Err(MailError::Timeout(self.send_timeout)),
                };

                match outcome {
                    Ok(()) => report.sent += 1,
                    Err(e) => {
                        report.failed += 1;
                        tracing::warn!(
                            event_id = event.id,
                            user_id = %user.id,
                            error = %e,
                            "Reminder not delivered"
                        );
                    }
                }
            }
        }

        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mail::RecordingMailer;
    use chrono::TimeZone;
    use eventhub_shared::models::{CreateEvent, CreateUser, Event, User};
    use eventhub_shared::repository::{InMemoryRepository, UserRepository};

    fn tick() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2030, 1, 1, 9, 0, 0).unwrap()
    }

    async fn user(repo: &InMemoryRepository, name: &str) -> User {
        repo.create_user(CreateUser {
            username: name.to_string(),
            email: format!("{}@example.com", name),
            password_hash: "hash".to_string(),
            is_admin: false,
        })
        .await
        .unwrap()
    }

    async fn event(repo: &InMemoryRepository, name: &str, offset: chrono::Duration) -> Event {
        repo.create_event(CreateEvent {
            name: name.to_string(),
            meeting_time: tick() + offset,
        })
        .await
        .unwrap()
    }

    #[tokio::test]
    async fn test_reminds_only_events_in_window() {
        let repo = Arc::new(InMemoryRepository::new());
        let alice = user(&repo, "alice").await;
        let bob = user(&repo, "bob").await;

        let due = event(&repo, "due", chrono::Duration::hours(24) + chrono::Duration::minutes(30)).await;
        let too_soon = event(&repo, "too soon", chrono::Duration::hours(23)).await;
        let too_late = event(&repo, "too late", chrono::Duration::hours(25)).await;

        for e in [&due, &too_soon, &too_late] {
            repo.add_signup(e.id, alice.id).await.unwrap();
        }
        repo.add_signup(due.id, bob.id).await.unwrap();

        let mailer = Arc::new(RecordingMailer::new());
        let scheduler = ReminderScheduler::new(repo.clone(), mailer.clone());

        let report = scheduler.dispatch_at(tick()).await.unwrap();

        assert_eq!(report.events, 1);
        assert_eq!(report.attempted, 2);
        assert_eq!(report.sent, 2);
        assert_eq!(report.failed, 0);

        let mut recipients: Vec<String> = mailer.sent().await.into_iter().map(|m| m.to).collect();
        recipients.sort();
        assert_eq!(recipients, vec!["alice@example.com", "bob@example.com"]);
        assert!(mailer.sent().await.iter().all(|m| m.subject == "Reminder: due"));
    }

    #[tokio::test]
    async fn test_failed_send_does_not_abort_batch() {
        let repo = Arc::new(InMemoryRepository::new());
        let alice = user(&repo, "alice").await;
        let bob = user(&repo, "bob").await;
        let carol = user(&repo, "carol").await;

        let due = event(&repo, "due", chrono::Duration::hours(24)).await;
        for u in [&alice, &bob, &carol] {
            repo.add_signup(due.id, u.id).await.unwrap();
        }

        let mailer = Arc::new(RecordingMailer::new().fail_for("bob@example.com"));
        let scheduler = ReminderScheduler::new(repo.clone(), mailer.clone());

        let report = scheduler.dispatch_at(tick()).await.unwrap();

        assert_eq!(report.attempted, 3);
        assert_eq!(report.sent, 2);
        assert_eq!(report.failed, 1);
        assert_eq!(mailer.sent().await.len(), 2);
        assert_eq!(scheduler.state(), SchedulerState::Idle);
    }

    #[tokio::test(start_paused = true)]
    async fn test_hung_send_times_out() {
        let repo = Arc::new(InMemoryRepository::new());
        let alice = user(&repo, "alice").await;
        let due = event(&repo, "due", chrono::Duration::hours(24)).await;
        repo.add_signup(due.id, alice.id).await.unwrap();

        let mailer = Arc::new(RecordingMailer::new().with_delay(Duration::from_secs(600)));
        let scheduler = ReminderScheduler::new(repo.clone(), mailer.clone())
            .with_send_timeout(Duration::from_secs(5));

        let report = scheduler.dispatch_at(tick()).await.unwrap();

        assert_eq!(report.failed, 1);
        assert!(mailer.sent().await.is_empty());
    }

    #[tokio::test]
    async fn test_empty_window_sends_nothing() {
        let repo = Arc::new(InMemoryRepository::new());
        let mailer = Arc::new(RecordingMailer::new());
        let scheduler = ReminderScheduler::new(repo, mailer.clone());

        let report = scheduler.dispatch_at(tick()).await.unwrap();

        assert_eq!(report, DispatchReport::new(tick()));
        assert!(mailer.sent().await.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_state_is_dispatching_while_sending() {
        let repo = Arc::new(InMemoryRepository::new());
        let alice = user(&repo, "alice").await;
        let due = event(&repo, "due", chrono::Duration::hours(24)).await;
        repo.add_signup(due.id, alice.id).await.unwrap();

        let mailer = Arc::new(RecordingMailer::new().with_delay(Duration::from_secs(1)));
        let scheduler = Arc::new(ReminderScheduler::new(repo, mailer));
        let mut states = scheduler.subscribe();
        assert_eq!(scheduler.state(), SchedulerState::Idle);

        let handle = {
            let scheduler = scheduler.clone();
            tokio::spawn(async move { scheduler.dispatch_at(tick()).await })
        };

        states.changed().await.unwrap();
        assert_eq!(*states.borrow_and_update(), SchedulerState::Dispatching);

        let report = handle.await.unwrap().unwrap();
        assert_eq!(report.sent, 1);
        assert_eq!(scheduler.state(), SchedulerState::Idle);
    }

    #[tokio::test(start_paused = true)]
    async fn test_run_dispatches_each_window_once() {
        let repo = Arc::new(InMemoryRepository::new());
        let alice = user(&repo, "alice").await;

        let first_tick = crate::ticks::next_top_of_hour(Utc::now());
        let due = repo
            .create_event(CreateEvent {
                name: "standup".to_string(),
                meeting_time: first_tick + chrono::Duration::hours(24) + chrono::Duration::minutes(30),
            })
            .await
            .unwrap();
        repo.add_signup(due.id, alice.id).await.unwrap();

        let mailer = Arc::new(RecordingMailer::new());
        let scheduler = Arc::new(ReminderScheduler::new(repo, mailer.clone()));
        let shutdown = CancellationToken::new();

        let handle = {
            let scheduler = scheduler.clone();
            let shutdown = shutdown.clone();
            tokio::spawn(async move { scheduler.run(shutdown).await })
        };

        let mut waited = 0;
        while mailer.sent().await.is_empty() && waited < 120 {
            tokio::time::sleep(Duration::from_secs(60)).await;
            waited += 1;
        }
        let sent = mailer.sent().await;
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].to, "alice@example.com");
        assert_eq!(sent[0].subject, "Reminder: standup");

        // Three more ticks fire; none of their windows holds the event.
        tokio::time::sleep(Duration::from_secs(3 * 3600 + 60)).await;
        assert_eq!(mailer.sent().await.len(), 1);

        shutdown.cancel();
        handle.await.unwrap();
        assert_eq!(scheduler.state(), SchedulerState::Idle);
    }

    #[tokio::test]
    async fn test_run_stops_on_shutdown() {
        let repo = Arc::new(InMemoryRepository::new());
        let scheduler = ReminderScheduler::new(repo, Arc::new(RecordingMailer::new()));
        let shutdown = CancellationToken::new();
        shutdown.cancel();

        scheduler.run(shutdown).await;

        assert_eq!(scheduler.state(), SchedulerState::Idle);
    }
}
