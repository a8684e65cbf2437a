use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

pub const DEFAULT_EASE_FACTOR: f64 = 2.5;

/// Ease factor never drops below this, whatever the rating history.
pub const MIN_EASE_FACTOR: f64 = 1.3;

/// Scheduling fields persisted alongside every card.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SchedulingState {
    pub interval_days: u32,
    pub ease_factor: f64,
    pub review_count: u32,
    pub next_review_date: NaiveDate,
}

impl SchedulingState {
    /// State of a freshly created card: due immediately.
    pub fn new(today: NaiveDate) -> Self {
        Self {
            interval_days: 0,
            ease_factor: DEFAULT_EASE_FACTOR,
            review_count: 0,
            next_review_date: today,
        }
    }

    pub fn is_due(&self, today: NaiveDate) -> bool {
        self.next_review_date <= today
    }
}
