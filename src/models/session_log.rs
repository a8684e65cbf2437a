//! Append-only record of answered cards.
use super::{CardId, Rating};
use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

/// One rating event. Never updated or deleted once written.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionLogEntry {
    pub card_id: CardId,
    pub rating: Rating,
    pub timestamp: NaiveDateTime,
    /// The card's review count after this rating. Together with `card_id`
    /// it identifies the attempt, so a retried write cannot be counted twice.
    pub review_number: u32,
}

impl SessionLogEntry {
    pub fn day(&self) -> NaiveDate {
        self.timestamp.date()
    }
}
