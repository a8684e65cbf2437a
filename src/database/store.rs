//! Persistence contracts consumed by the review engine.
//!
//! Every read and write is scoped by the owning user. Enforcing that the
//! user may touch the card is the implementation's job, not the engine's.

use crate::error::StoreError;
use crate::models::{Card, CardId, SchedulingState, SessionLogEntry, UserId};
use chrono::NaiveDate;

pub trait CardStore {
    /// Cards of `user_id` due on `today`, in review order.
    fn fetch_due(&self, user_id: UserId, today: NaiveDate) -> Result<Vec<Card>, StoreError>;

    fn update_scheduling(
        &self,
        user_id: UserId,
        card_id: CardId,
        state: &SchedulingState,
    ) -> Result<(), StoreError>;
}

pub trait SessionLog {
    fn append(&self, user_id: UserId, entry: &SessionLogEntry) -> Result<(), StoreError>;

    fn entries(&self, user_id: UserId) -> Result<Vec<SessionLogEntry>, StoreError>;
}

/// Everything written for one rating.
#[derive(Clone, Debug, PartialEq)]
pub struct ReviewCommit {
    pub card_id: CardId,
    /// Review count the card had when it was shown.
    pub expected_review_count: u32,
    pub state: SchedulingState,
    pub entry: SessionLogEntry,
}

pub trait ReviewStore: CardStore + SessionLog {
    /// Persists the card update and the log entry of one rating.
    ///
    /// Either both are written or the call fails. The default runs the two
    /// writes one after the other; stores with transactions should override it.
    fn commit_review(&self, user_id: UserId, commit: &ReviewCommit) -> Result<(), StoreError> {
        self.update_scheduling(user_id, commit.card_id, &commit.state)?;
        self.append(user_id, &commit.entry)
    }
}

impl<T: CardStore + ?Sized> CardStore for &T {
    fn fetch_due(&self, user_id: UserId, today: NaiveDate) -> Result<Vec<Card>, StoreError> {
        (**self).fetch_due(user_id, today)
    }

    fn update_scheduling(
        &self,
        user_id: UserId,
        card_id: CardId,
        state: &SchedulingState,
    ) -> Result<(), StoreError> {
        (**self).update_scheduling(user_id, card_id, state)
    }
}

impl<T: SessionLog + ?Sized> SessionLog for &T {
    fn append(&self, user_id: UserId, entry: &SessionLogEntry) -> Result<(), StoreError> {
        (**self).append(user_id, entry)
    }

    fn entries(&self, user_id: UserId) -> Result<Vec<SessionLogEntry>, StoreError> {
        (**self).entries(user_id)
    }
}

impl<T: ReviewStore + ?Sized> ReviewStore for &T {
    fn commit_review(&self, user_id: UserId, commit: &ReviewCommit) -> Result<(), StoreError> {
        (**self).commit_review(user_id, commit)
    }
}
