use chrono::{Local, NaiveDateTime, NaiveTime, Timelike};
use std::fmt;

/// Source of wall-clock time. Injected so the poller can be driven by a
/// simulated clock.
pub trait Clock: Send + Sync {
    fn now(&self) -> NaiveDateTime;

    fn time_of_day(&self) -> TimeOfDay {
        TimeOfDay::from_time(self.now().time())
    }
}

/// Local time from the operating system. No timezone conversion.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> NaiveDateTime {
        Local::now().naive_local()
    }
}

/// A minute of the day. Reminders match on this, seconds are ignored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TimeOfDay {
    hour: u32,
    minute: u32,
}

impl TimeOfDay {
    #[cfg(test)]
    pub fn new(hour: u32, minute: u32) -> Option<Self> {
        if hour < 24 && minute < 60 {
            Some(Self { hour, minute })
        } else {
            None
        }
    }

    pub fn from_time(time: NaiveTime) -> Self {
        Self {
            hour: time.hour(),
            minute: time.minute(),
        }
    }

    /// Parse `HH:MM`, 24-hour clock.
    pub fn parse(input: &str) -> Option<Self> {
        NaiveTime::parse_from_str(input.trim(), "%H:%M")
            .ok()
            .map(Self::from_time)
    }
}

impl fmt::Display for TimeOfDay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:{:02}", self.hour, self.minute)
    }
}

/// The two log lines shown by the Time & Date button.
pub fn lines(now: NaiveDateTime) -> Vec<String> {
    vec![
        format!("Date: {}", now.format("%Y-%m-%d")),
        format!("Time: {}", now.format("%H:%M:%S")),
    ]
}
