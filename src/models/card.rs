//! Card is a pair <front, back> owned by a user, plus its scheduling state.
use super::SchedulingState;
use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

pub type CardId = i64;
pub type UserId = i64;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Card {
    pub id: CardId,
    pub user_id: UserId,
    pub subject: Option<String>,
    pub front: String,
    pub back: String,
    pub created_at: NaiveDateTime,
    pub scheduling: SchedulingState,
}

impl Card {
    pub fn is_due(&self, today: NaiveDate) -> bool {
        self.scheduling.is_due(today)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_card_is_due_on_creation_day() {
        let today = NaiveDate::from_ymd_opt(2024, 3, 10).unwrap();
        let card = Card {
            id: 1,
            user_id: 7,
            subject: Some("Polish".to_string()),
            front: "cześć".to_string(),
            back: "hello".to_string(),
            created_at: today.and_hms_opt(9, 0, 0).unwrap(),
            scheduling: SchedulingState::new(today),
        };

        assert!(card.is_due(today));
        assert!(!card.is_due(today.pred_opt().unwrap()));
        assert_eq!(card.scheduling.interval_days, 0);
        assert_eq!(card.scheduling.review_count, 0);
        assert_eq!(card.scheduling.ease_factor, 2.5);
    }
}
