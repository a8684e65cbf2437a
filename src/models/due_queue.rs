//! Selection of the cards a review session should present, in order.
use super::Card;
use chrono::NaiveDate;

/// Returns every card due on `today`, most overdue first.
///
/// Cards due on the same day keep creation order (oldest first), with the
/// id breaking ties between cards created at the same instant. The ordering
/// only depends on those keys, so identical input always yields the same queue.
pub fn select_due(cards: impl IntoIterator<Item = Card>, today: NaiveDate) -> Vec<Card> {
    let mut due: Vec<Card> = cards.into_iter().filter(|card| card.is_due(today)).collect();

    due.sort_by(|a, b| {
        a.scheduling
            .next_review_date
            .cmp(&b.scheduling.next_review_date)
            .then_with(|| a.created_at.cmp(&b.created_at))
            .then_with(|| a.id.cmp(&b.id))
    });

    due
}

pub fn due_count<'a>(cards: impl IntoIterator<Item = &'a Card>, today: NaiveDate) -> usize {
    cards.into_iter().filter(|card| card.is_due(today)).count()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::SchedulingState;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn card(id: i64, due: NaiveDate, created: NaiveDate) -> Card {
        Card {
            id,
            user_id: 1,
            subject: None,
            front: format!("front {id}"),
            back: format!("back {id}"),
            created_at: created.and_hms_opt(8, 0, 0).unwrap(),
            scheduling: SchedulingState {
                next_review_date: due,
                ..SchedulingState::new(created)
            },
        }
    }

    fn ids(cards: &[Card]) -> Vec<i64> {
        cards.iter().map(|c| c.id).collect()
    }

    #[test]
    fn test_oldest_due_first() {
        let cards = vec![
            card(1, date(2024, 1, 3), date(2023, 12, 1)),
            card(2, date(2024, 1, 1), date(2023, 12, 2)),
        ];

        let due = select_due(cards, date(2024, 1, 3));
        assert_eq!(ids(&due), vec![2, 1]);
    }

    #[test]
    fn test_future_cards_are_excluded() {
        let cards = vec![
            card(1, date(2024, 1, 4), date(2023, 12, 1)),
            card(2, date(2024, 1, 3), date(2023, 12, 1)),
        ];

        let due = select_due(cards, date(2024, 1, 3));
        assert_eq!(ids(&due), vec![2]);
    }

    #[test]
    fn test_same_day_ties_broken_by_creation_order() {
        let cards = vec![
            card(3, date(2024, 1, 2), date(2023, 11, 5)),
            card(1, date(2024, 1, 2), date(2023, 11, 9)),
            card(2, date(2024, 1, 2), date(2023, 11, 5)),
        ];

        let due = select_due(cards, date(2024, 1, 3));
        assert_eq!(ids(&due), vec![2, 3, 1]);
    }

    #[test]
    fn test_ordering_is_reproducible() {
        let cards = vec![
            card(5, date(2024, 1, 2), date(2023, 10, 1)),
            card(4, date(2024, 1, 1), date(2023, 10, 3)),
            card(6, date(2024, 1, 1), date(2023, 10, 2)),
        ];
        let mut reversed = cards.clone();
        reversed.reverse();

        let first = select_due(cards, date(2024, 1, 3));
        let second = select_due(reversed, date(2024, 1, 3));
        assert_eq!(ids(&first), vec![6, 4, 5]);
        assert_eq!(ids(&first), ids(&second));
    }

    #[test]
    fn test_nothing_due_is_empty() {
        let cards = vec![card(1, date(2024, 2, 1), date(2024, 1, 1))];
        assert!(select_due(cards.clone(), date(2024, 1, 3)).is_empty());
        assert_eq!(due_count(&cards, date(2024, 1, 3)), 0);
        assert_eq!(due_count(&cards, date(2024, 2, 1)), 1);
    }
}
