//! Reminder store and the background poller that fires reminders.
//!
//! The store is shared between the UI (which appends) and the poller (which
//! flips `fired`). Notifications travel back to the UI over a channel so the
//! UI stays the only thing that draws.

use crate::error::UserFacing;
use crate::handlers::clock::{Clock, TimeOfDay};
use crate::models::Reminder;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::sync::mpsc::UnboundedSender;
use tokio::task::JoinHandle;

pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(30);

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ReminderError {
    #[error("expected 'HH:MM - message', got {0:?}")]
    MissingSeparator(String),
    #[error("{0:?} is not a 24-hour HH:MM time")]
    InvalidTime(String),
    #[error("reminder message is empty")]
    EmptyMessage,
}

impl UserFacing for ReminderError {
    fn user_message(&self) -> String {
        "Invalid format".to_string()
    }
}

/// Parse `HH:MM - message`. Splits on the first `-`, so the message may
/// contain dashes of its own.
pub fn parse_reminder(input: &str) -> Result<(TimeOfDay, String), ReminderError> {
    let (time_part, message) = input
        .split_once('-')
        .ok_or_else(|| ReminderError::MissingSeparator(input.to_string()))?;

    let at = TimeOfDay::parse(time_part)
        .ok_or_else(|| ReminderError::InvalidTime(time_part.trim().to_string()))?;

    let message = message.trim();
    if message.is_empty() {
        return Err(ReminderError::EmptyMessage);
    }
    Ok((at, message.to_string()))
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub at: TimeOfDay,
    pub message: String,
}

impl fmt::Display for Notification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Reminder: {}", self.message)
    }
}

#[derive(Debug, Clone, Default)]
pub struct ReminderStore {
    inner: Arc<Mutex<Vec<Reminder>>>,
}

impl ReminderStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Vec<Reminder>> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn schedule(&self, at: TimeOfDay, message: impl Into<String>) {
        let message = message.into();
        log::info!("Reminder scheduled for {}: {}", at, message);
        self.lock().push(Reminder {
            at,
            message,
            fired: false,
        });
    }

    /// Mark every unfired reminder for `now` as fired and return them, in
    /// scheduling order.
    pub fn fire_due(&self, now: TimeOfDay) -> Vec<Notification> {
        let mut reminders = self.lock();
        reminders
            .iter_mut()
            .filter(|r| !r.fired && r.at == now)
            .map(|r| {
                r.fired = true;
                Notification {
                    at: r.at,
                    message: r.message.clone(),
                }
            })
            .collect()
    }

    pub fn pending(&self) -> usize {
        self.lock().iter().filter(|r| !r.fired).count()
    }

    pub fn snapshot(&self) -> Vec<Reminder> {
        self.lock().clone()
    }
}

/// Spawn the polling task. It wakes every `interval`, fires what is due and
/// sends each notification on `tx`. It stops once the receiver is gone.
///
/// Only minutes that a tick lands in are seen, so the interval must stay at
/// or below one minute for every reminder to fire.
pub fn spawn_poller(
    store: ReminderStore,
    clock: Arc<dyn Clock>,
    interval: Duration,
    tx: UnboundedSender<Notification>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        loop {
            ticker.tick().await;
            let now = clock.time_of_day();
            for notification in store.fire_due(now) {
                log::info!("Reminder fired at {}: {}", now, notification.message);
                if tx.send(notification).is_err() {
                    log::debug!("Notification receiver dropped, stopping poller");
                    return;
                }
            }
            if tx.is_closed() {
                return;
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, NaiveDateTime};
    use tokio::sync::mpsc;

    struct ManualClock(Mutex<NaiveDateTime>);

    impl ManualClock {
        fn at(hour: u32, minute: u32) -> Self {
            Self(Mutex::new(datetime(hour, minute)))
        }

        fn set(&self, hour: u32, minute: u32) {
            *self.0.lock().unwrap() = datetime(hour, minute);
        }
    }

    impl Clock for ManualClock {
        fn now(&self) -> NaiveDateTime {
            *self.0.lock().unwrap()
        }
    }

    fn datetime(hour: u32, minute: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2026, 1, 1)
            .unwrap()
            .and_hms_opt(hour, minute, 12)
            .unwrap()
    }

    fn time(hour: u32, minute: u32) -> TimeOfDay {
        TimeOfDay::new(hour, minute).unwrap()
    }

    #[test]
    fn parse_well_formed() {
        let (at, message) = parse_reminder("09:00 - take medicine").unwrap();
        assert_eq!(at, time(9, 0));
        assert_eq!(message, "take medicine");
    }

    #[test]
    fn parse_keeps_later_dashes() {
        let (_, message) = parse_reminder("18:30 - call mum - about sunday").unwrap();
        assert_eq!(message, "call mum - about sunday");
    }

    #[test]
    fn parse_rejects_malformed() {
        assert!(matches!(
            parse_reminder("09:00 take medicine"),
            Err(ReminderError::MissingSeparator(_))
        ));
        assert_eq!(
            parse_reminder("nine - take medicine"),
            Err(ReminderError::InvalidTime("nine".to_string()))
        );
        assert_eq!(parse_reminder("09:00 -   "), Err(ReminderError::EmptyMessage));
        assert_eq!(
            parse_reminder("bad").unwrap_err().user_message(),
            "Invalid format"
        );
    }

    #[test]
    fn fires_once_per_reminder() {
        let store = ReminderStore::new();
        store.schedule(time(9, 0), "take medicine");

        let fired = store.fire_due(time(9, 0));
        assert_eq!(fired.len(), 1);
        assert_eq!(fired[0].message, "take medicine");
        assert_eq!(fired[0].to_string(), "Reminder: take medicine");

        assert!(store.fire_due(time(9, 0)).is_empty());
        assert_eq!(store.pending(), 0);
        assert!(store.snapshot()[0].fired);
    }

    #[test]
    fn same_minute_reminders_fire_together() {
        let store = ReminderStore::new();
        store.schedule(time(7, 15), "first");
        store.schedule(time(8, 0), "other");
        store.schedule(time(7, 15), "second");

        let fired: Vec<String> = store
            .fire_due(time(7, 15))
            .into_iter()
            .map(|n| n.message)
            .collect();
        assert_eq!(fired, vec!["first", "second"]);
        assert_eq!(store.pending(), 1);
    }

    #[test]
    fn other_minutes_do_not_fire() {
        let store = ReminderStore::new();
        store.schedule(time(9, 0), "later");
        assert!(store.fire_due(time(8, 59)).is_empty());
        assert!(store.fire_due(time(9, 1)).is_empty());
        assert_eq!(store.pending(), 1);
    }

    #[test]
    fn clones_share_state() {
        let store = ReminderStore::new();
        let poller_side = store.clone();
        store.schedule(time(12, 0), "lunch");
        assert_eq!(poller_side.fire_due(time(12, 0)).len(), 1);
        assert_eq!(store.pending(), 0);
    }

    #[tokio::test]
    async fn poller_delivers_notifications() {
        let store = ReminderStore::new();
        store.schedule(time(9, 0), "take medicine");
        let clock = Arc::new(ManualClock::at(8, 59));
        let (tx, mut rx) = mpsc::unbounded_channel();

        let handle = spawn_poller(
            store.clone(),
            clock.clone(),
            Duration::from_millis(10),
            tx,
        );

        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(rx.try_recv().is_err());

        clock.set(9, 0);
        let notification = tokio::time::timeout(Duration::from_secs(2), rx.recv())
            .await
            .expect("poller did not fire")
            .expect("channel closed");
        assert_eq!(notification.message, "take medicine");

        // Further ticks in the same minute must not fire again.
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(rx.try_recv().is_err());

        drop(rx);
        tokio::time::timeout(Duration::from_secs(2), handle)
            .await
            .expect("poller did not stop")
            .unwrap();
    }
}
