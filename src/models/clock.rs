//! Source of "now" for the review session.
use chrono::{Local, NaiveDate, NaiveDateTime, TimeDelta};

pub trait Clock {
    /// Local wall-clock time, without a time zone.
    fn now(&self) -> NaiveDateTime;

    fn today(&self) -> NaiveDate {
        self.now().date()
    }
}

#[derive(Clone, Copy, Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> NaiveDateTime {
        Local::now().naive_local()
    }
}

/// Clock pinned to a given instant.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FixedClock(pub NaiveDateTime);

impl FixedClock {
    /// Given day at the current local time of day.
    pub fn on_day(day: NaiveDate) -> Self {
        Self(day.and_time(Local::now().time()))
    }
}

impl Clock for FixedClock {
    fn now(&self) -> NaiveDateTime {
        self.0
    }
}

/// Wall clock shifted onto a simulated calendar day.
///
/// Time keeps running from the current local time of day, so study time
/// is measured normally while dates follow the simulated calendar.
#[derive(Clone, Copy, Debug)]
pub struct SimulatedClock {
    offset: TimeDelta,
}

impl SimulatedClock {
    pub fn on_day(day: NaiveDate) -> Self {
        let now = Local::now().naive_local();
        Self {
            offset: day.and_time(now.time()) - now,
        }
    }
}

impl Clock for SimulatedClock {
    fn now(&self) -> NaiveDateTime {
        Local::now().naive_local() + self.offset
    }
}
