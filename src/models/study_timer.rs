//! Study time tracking as a plain value.
//!
//! Each operation takes the current time and returns a new timer, so a
//! session can keep its own timer without any shared mutable instance.

use chrono::{NaiveDateTime, TimeDelta};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct StudyTimer {
    accumulated: TimeDelta,
    running_since: Option<NaiveDateTime>,
}

impl Default for StudyTimer {
    fn default() -> Self {
        Self {
            accumulated: TimeDelta::zero(),
            running_since: None,
        }
    }
}

impl StudyTimer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_running(&self) -> bool {
        self.running_since.is_some()
    }

    /// Starts counting from `now`; a running timer is returned unchanged.
    pub fn start(self, now: NaiveDateTime) -> Self {
        match self.running_since {
            Some(_) => self,
            None => Self {
                running_since: Some(now),
                ..self
            },
        }
    }

    /// Folds the running span into the accumulated total.
    pub fn pause(self, now: NaiveDateTime) -> Self {
        Self {
            accumulated: self.elapsed(now),
            running_since: None,
        }
    }

    pub fn reset(self) -> Self {
        Self::default()
    }

    pub fn elapsed(&self, now: NaiveDateTime) -> TimeDelta {
        let running = self
            .running_since
            .map(|since| (now - since).max(TimeDelta::zero()))
            .unwrap_or_else(TimeDelta::zero);
        self.accumulated + running
    }

    pub fn elapsed_seconds(&self, now: NaiveDateTime) -> i64 {
        self.elapsed(now).num_seconds()
    }

    pub fn elapsed_minutes(&self, now: NaiveDateTime) -> i64 {
        self.elapsed(now).num_minutes()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn at(h: u32, m: u32, s: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 5, 1)
            .unwrap()
            .and_hms_opt(h, m, s)
            .unwrap()
    }

    #[test]
    fn test_idle_timer_reports_zero() {
        let timer = StudyTimer::new();
        assert!(!timer.is_running());
        assert_eq!(timer.elapsed_seconds(at(10, 0, 0)), 0);
    }

    #[test]
    fn test_running_timer_counts_until_now() {
        let timer = StudyTimer::new().start(at(10, 0, 0));
        assert!(timer.is_running());
        assert_eq!(timer.elapsed_seconds(at(10, 1, 30)), 90);
        assert_eq!(timer.elapsed_minutes(at(10, 1, 30)), 1);
    }

    #[test]
    fn test_pause_accumulates_across_spans() {
        let timer = StudyTimer::new()
            .start(at(10, 0, 0))
            .pause(at(10, 5, 0))
            .start(at(11, 0, 0))
            .pause(at(11, 2, 59));

        assert!(!timer.is_running());
        // Paused time between spans is not counted.
        assert_eq!(timer.elapsed_seconds(at(12, 0, 0)), 479);
        assert_eq!(timer.elapsed_minutes(at(12, 0, 0)), 7);
    }

    #[test]
    fn test_start_while_running_keeps_original_start() {
        let timer = StudyTimer::new().start(at(10, 0, 0)).start(at(10, 30, 0));
        assert_eq!(timer.elapsed_minutes(at(10, 40, 0)), 40);
    }

    #[test]
    fn test_pause_while_paused_is_noop() {
        let timer = StudyTimer::new().start(at(10, 0, 0)).pause(at(10, 10, 0));
        assert_eq!(timer.pause(at(11, 0, 0)), timer);
    }

    #[test]
    fn test_reset_clears_everything() {
        let timer = StudyTimer::new().start(at(10, 0, 0)).reset();
        assert_eq!(timer, StudyTimer::new());
    }

    #[test]
    fn test_timers_are_independent_values() {
        let base = StudyTimer::new().start(at(9, 0, 0));
        let paused = base.pause(at(9, 10, 0));

        assert!(base.is_running());
        assert!(!paused.is_running());
        assert_eq!(base.elapsed_minutes(at(9, 20, 0)), 20);
        assert_eq!(paused.elapsed_minutes(at(9, 20, 0)), 10);
    }
}
