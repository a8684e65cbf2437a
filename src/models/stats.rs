//! Streak and statistics derived from the session log.
//!
//! Nothing here is cached: every figure is recomputed from the log entries
//! passed in, which stay the only source of truth.

use super::{Card, CardId, Rating, SessionLogEntry};
use chrono::{Days, NaiveDate, NaiveDateTime};
use serde::Serialize;
use std::collections::{BTreeMap, HashMap, HashSet};

/// Number of consecutive days, ending today, with at least one review.
///
/// A day without reviews breaks the streak. Today only breaks it once it is
/// over, so a streak that ran through yesterday is still reported.
pub fn current_streak<'a>(
    entries: impl IntoIterator<Item = &'a SessionLogEntry>,
    today: NaiveDate,
) -> u32 {
    let days: HashSet<NaiveDate> = entries.into_iter().map(SessionLogEntry::day).collect();

    let mut day = if days.contains(&today) {
        today
    } else {
        match today.pred_opt() {
            Some(yesterday) if days.contains(&yesterday) => yesterday,
            _ => return 0,
        }
    };

    let mut streak = 0;
    while days.contains(&day) {
        streak += 1;
        match day.pred_opt() {
            Some(previous) => day = previous,
            None => break,
        }
    }
    streak
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct RatingDistribution {
    pub hard: usize,
    pub medium: usize,
    pub easy: usize,
}

impl RatingDistribution {
    pub fn record(&mut self, rating: Rating) {
        match rating {
            Rating::Hard => self.hard += 1,
            Rating::Medium => self.medium += 1,
            Rating::Easy => self.easy += 1,
        }
    }

    pub fn total(&self) -> usize {
        self.hard + self.medium + self.easy
    }

    /// Easy answers count fully, medium ones half. 0 when nothing was rated.
    pub fn accuracy_percent(&self) -> u32 {
        let total = self.total();
        if total == 0 {
            return 0;
        }
        let score = self.easy as f64 + self.medium as f64 * 0.5;
        (score / total as f64 * 100.0).round() as u32
    }
}

/// Mean recall score of all ratings, with hard worth 0.3, medium 0.7 and
/// easy 1.0. 0 when nothing was rated.
pub fn average_accuracy_percent<'a>(entries: impl IntoIterator<Item = &'a SessionLogEntry>) -> u32 {
    let (total, score) = entries.into_iter().fold((0usize, 0.0), |(total, score), entry| {
        let weight = match entry.rating {
            Rating::Hard => 0.3,
            Rating::Medium => 0.7,
            Rating::Easy => 1.0,
        };
        (total + 1, score + weight)
    });
    if total == 0 {
        return 0;
    }
    (score / total as f64 * 100.0).round() as u32
}

pub fn rating_distribution<'a>(
    entries: impl IntoIterator<Item = &'a SessionLogEntry>,
) -> RatingDistribution {
    let mut distribution = RatingDistribution::default();
    for entry in entries {
        distribution.record(entry.rating);
    }
    distribution
}

/// Window of days shown by the activity views.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub enum ActivityRange {
    Week,
    #[default]
    Month,
    Quarter,
}

impl ActivityRange {
    pub fn days(self) -> u32 {
        match self {
            ActivityRange::Week => 7,
            ActivityRange::Month => 30,
            ActivityRange::Quarter => 90,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct DayActivity {
    pub date: NaiveDate,
    pub count: usize,
}

/// Reviews per day over `range`, oldest day first, ending today.
/// Days without reviews are present with a zero count.
pub fn daily_activity<'a>(
    entries: impl IntoIterator<Item = &'a SessionLogEntry>,
    today: NaiveDate,
    range: ActivityRange,
) -> Vec<DayActivity> {
    let mut per_day: HashMap<NaiveDate, usize> = HashMap::new();
    for entry in entries {
        *per_day.entry(entry.day()).or_default() += 1;
    }

    (0..range.days())
        .rev()
        .filter_map(|back| today.checked_sub_days(Days::new(back as u64)))
        .map(|date| DayActivity {
            date,
            count: per_day.get(&date).copied().unwrap_or(0),
        })
        .collect()
}

pub fn reviews_on<'a>(entries: impl IntoIterator<Item = &'a SessionLogEntry>, day: NaiveDate) -> usize {
    entries.into_iter().filter(|entry| entry.day() == day).count()
}

/// Reviews in the last seven days against the seven days before.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct WeeklyComparison {
    pub this_week: usize,
    pub last_week: usize,
    /// Rounded change in percent. 100 when last week was empty and this week
    /// was not, 0 when both were empty.
    pub change_percent: i64,
}

pub fn weekly_comparison<'a>(
    entries: impl IntoIterator<Item = &'a SessionLogEntry>,
    now: NaiveDateTime,
) -> WeeklyComparison {
    let this_week_start = now.checked_sub_days(Days::new(7)).unwrap_or(NaiveDateTime::MIN);
    let last_week_start = now.checked_sub_days(Days::new(14)).unwrap_or(NaiveDateTime::MIN);

    let mut comparison = WeeklyComparison::default();
    for entry in entries {
        if entry.timestamp >= this_week_start {
            comparison.this_week += 1;
        } else if entry.timestamp >= last_week_start {
            comparison.last_week += 1;
        }
    }

    comparison.change_percent = match (comparison.this_week, comparison.last_week) {
        (0, 0) => 0,
        (_, 0) => 100,
        (this_week, last_week) => {
            let change = (this_week as f64 - last_week as f64) / last_week as f64;
            (change * 100.0).round() as i64
        }
    };
    comparison
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct SubjectPerformance {
    pub subject: String,
    pub ratings: RatingDistribution,
    pub accuracy_percent: u32,
}

/// Ratings grouped by the subject of the rated card, sorted by subject name.
/// Entries for cards without a subject, or no longer present, are left out.
pub fn subject_performance<'a>(
    entries: impl IntoIterator<Item = &'a SessionLogEntry>,
    cards: &[Card],
) -> Vec<SubjectPerformance> {
    let subject_of: HashMap<CardId, &str> = cards
        .iter()
        .filter_map(|card| card.subject.as_deref().map(|subject| (card.id, subject)))
        .collect();

    let mut grouped: BTreeMap<&str, RatingDistribution> = BTreeMap::new();
    for entry in entries {
        if let Some(&subject) = subject_of.get(&entry.card_id) {
            grouped.entry(subject).or_default().record(entry.rating);
        }
    }

    grouped
        .into_iter()
        .map(|(subject, ratings)| SubjectPerformance {
            subject: subject.to_string(),
            accuracy_percent: ratings.accuracy_percent(),
            ratings,
        })
        .collect()
}

/// Everything the dashboard shows, computed in one pass over the log.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct StatsReport {
    pub streak_days: u32,
    pub reviews_today: usize,
    pub ratings: RatingDistribution,
    pub accuracy_percent: u32,
    pub activity: Vec<DayActivity>,
    pub weekly: WeeklyComparison,
}

impl StatsReport {
    pub fn compute(entries: &[SessionLogEntry], now: NaiveDateTime, range: ActivityRange) -> Self {
        let today = now.date();
        Self {
            streak_days: current_streak(entries, today),
            reviews_today: reviews_on(entries, today),
            ratings: rating_distribution(entries),
            accuracy_percent: average_accuracy_percent(entries),
            activity: daily_activity(entries, today, range),
            weekly: weekly_comparison(entries, now),
        }
    }
}
