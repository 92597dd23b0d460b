/// Reminder composition and selection window

use crate::mail::MailMessage;
use chrono::{DateTime, Duration, Utc};
use eventhub_shared::models::{Event, User};

/// Which events a tick reminds about
///
/// A tick at `t` covers events with `meeting_time` in `[t + lead, t + lead + window)`.
/// With an hourly tick and a one-hour window consecutive ticks tile the
/// timeline, so each event falls into exactly one tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReminderPolicy {
    pub lead: Duration,
    pub window: Duration,
}

impl ReminderPolicy {
    pub fn new(lead: Duration) -> Self {
        Self {
            lead,
            window: Duration::hours(1),
        }
    }

    pub fn from_lead_hours(hours: i64) -> Self {
        Self::new(Duration::hours(hours))
    }

    /// Half-open interval of meeting times covered by a tick at `tick`
    pub fn window_at(&self, tick: DateTime<Utc>) -> (DateTime<Utc>, DateTime<Utc>) {
        let from = tick + self.lead;
        (from, from + self.window)
    }
}

impl Default for ReminderPolicy {
    fn default() -> Self {
        Self::from_lead_hours(24)
    }
}

/// Builds the reminder for one signed-up user
pub fn compose(event: &Event, user: &User) -> MailMessage {
    MailMessage {
        to: user.email.clone(),
        subject: format!("Reminder: {}", event.name),
        body: format!(
            "Hello {},\n\n\
             You are signed up for \"{}\", which starts at {}.\n\n\
             See you there!\n",
            user.username,
            event.name,
            event.meeting_time.format("%Y-%m-%d %H:%M UTC"),
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn user(username: &str, email: &str) -> User {
        User {
            id: Default::default(),
            username: username.to_string(),
            email: email.to_string(),
            password_hash: String::new(),
            is_admin: false,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_window_is_lead_ahead() {
        let policy = ReminderPolicy::default();
        let tick = Utc.with_ymd_and_hms(2024, 5, 1, 9, 0, 0).unwrap();

        let (from, to) = policy.window_at(tick);

        assert_eq!(from, Utc.with_ymd_and_hms(2024, 5, 2, 9, 0, 0).unwrap());
        assert_eq!(to, Utc.with_ymd_and_hms(2024, 5, 2, 10, 0, 0).unwrap());
    }

    #[test]
    fn test_consecutive_windows_tile() {
        let policy = ReminderPolicy::from_lead_hours(2);
        let tick = Utc.with_ymd_and_hms(2024, 5, 1, 9, 0, 0).unwrap();

        let (_, first_end) = policy.window_at(tick);
        let (second_start, _) = policy.window_at(tick + Duration::hours(1));

        assert_eq!(first_end, second_start);
    }

    #[test]
    fn test_compose_addresses_user() {
        let event = Event {
            id: 1,
            name: "Rust meetup".to_string(),
            meeting_time: Utc.with_ymd_and_hms(2024, 5, 2, 18, 30, 0).unwrap(),
            created_at: Utc::now(),
        };

        let message = compose(&event, &user("alice", "alice@example.com"));

        assert_eq!(message.to, "alice@example.com");
        assert_eq!(message.subject, "Reminder: Rust meetup");
        assert!(message.body.contains("Hello alice"));
        assert!(message.body.contains("2024-05-02 18:30 UTC"));
    }
}
