//! SM-2 (SuperMemo 2) spaced repetition algorithm, three-button variant.
//!
//! The learner answers hard, medium or easy, mapped to quality 0, 1 and 2:
//! - The ease factor (EF) is recomputed on every rating, hard included,
//!   and never falls below 1.3
//! - Hard keeps the current interval (1 day for a card never scheduled)
//! - Medium grows 1 day → 6 days → interval × EF
//! - Easy grows 4 days → 6 days → interval × EF × 1.2

use super::{MIN_EASE_FACTOR, Rating, SchedulingState};
use chrono::{Days, NaiveDate};

/// Extra multiplier applied to mature intervals on an easy answer.
const EASY_BONUS: f64 = 1.2;

/// New ease factor after a rating: EF' = EF + (0.1 - (5-q) * (0.08 + (5-q) * 0.02))
pub fn next_ease_factor(ease_factor: f64, rating: Rating) -> f64 {
    let miss = 5.0 - rating.quality() as f64;
    let delta = 0.1 - miss * (0.08 + miss * 0.02);
    (ease_factor + delta).max(MIN_EASE_FACTOR)
}

/// Computes the scheduling state that follows `rating`.
/// `today` is read once by the caller; the result is scheduled relative to it.
pub fn transition(state: &SchedulingState, rating: Rating, today: NaiveDate) -> SchedulingState {
    let ease_factor = next_ease_factor(state.ease_factor, rating);
    let review_count = state.review_count.saturating_add(1);
    let interval = state.interval_days;

    let interval_days = match rating {
        Rating::Hard => interval.max(1),
        Rating::Medium => match review_count {
            1 => 1,
            2 => 6,
            _ => scale(interval, ease_factor),
        },
        Rating::Easy => match review_count {
            1 => 4,
            2 => 6,
            _ => scale(interval, ease_factor * EASY_BONUS),
        },
    };

    SchedulingState {
        interval_days,
        ease_factor,
        review_count,
        next_review_date: add_days(today, interval_days),
    }
}

/// Outcome of each rating, in `Rating::ALL` order.
/// Used to label the rating buttons with the interval they would give.
pub fn preview(state: &SchedulingState, today: NaiveDate) -> [SchedulingState; 3] {
    Rating::ALL.map(|rating| transition(state, rating, today))
}

// f64::round rounds half away from zero; `as` saturates on overflow.
fn scale(interval: u32, factor: f64) -> u32 {
    (interval as f64 * factor).round() as u32
}

fn add_days(today: NaiveDate, days: u32) -> NaiveDate {
    today
        .checked_add_days(Days::new(days as u64))
        .unwrap_or(NaiveDate::MAX)
}

/// Format an interval in days to a short label
pub fn format_interval(days: u32) -> String {
    match days {
        0 => "now".to_string(),
        1..=6 => format!("{}d", days),
        7..=29 => format!("{}w", days / 7),
        30..=364 => format!("{}mo", days / 30),
        _ => format!("{}y", days / 365),
    }
}
