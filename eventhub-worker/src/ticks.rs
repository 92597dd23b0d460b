/// Hourly tick source
///
/// Fires at the top of every hour (UTC) until the shutdown token is
/// cancelled. Ticks strictly increase by one hour: the first is the next top
/// of the hour after *now*, every later one follows the previous tick. A tick
/// whose instant already passed while the caller was busy fires immediately,
/// so no hour is skipped and none is emitted twice.

use chrono::{DateTime, Duration, Utc};
use tokio_util::sync::CancellationToken;

const HOUR_SECS: i64 = 3600;

/// First top-of-hour instant strictly after `now`
pub fn next_top_of_hour(now: DateTime<Utc>) -> DateTime<Utc> {
    let next = (now.timestamp().div_euclid(HOUR_SECS) + 1) * HOUR_SECS;
    DateTime::<Utc>::from_timestamp(next, 0).unwrap_or_else(|| now + Duration::hours(1))
}

pub struct HourlyTicks {
    shutdown: CancellationToken,
    last: Option<DateTime<Utc>>,
}

impl HourlyTicks {
    pub fn new(shutdown: CancellationToken) -> Self {
        Self { shutdown, last: None }
    }

    /// Waits for the next tick; `None` once shutdown is requested
    pub async fn next(&mut self) -> Option<DateTime<Utc>> {
        let now = Utc::now();
        let at = match self.last {
            Some(last) => last + Duration::hours(1),
            None => next_top_of_hour(now),
        };
        let wait = (at - now).to_std().unwrap_or_default();

        if wait.is_zero() {
            tracing::warn!(tick = %at, "Reminder tick is late, firing now");
        } else {
            tracing::debug!(next_tick = %at, "Waiting for next reminder tick");
        }

        tokio::select! {
            biased;
            _ = self.shutdown.cancelled() => None,
            _ = tokio::time::sleep(wait) => {
                self.last = Some(at);
                Some(at)
            }
        }
    }
}
