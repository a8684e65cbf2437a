//! Review session over a snapshot of due cards.
//!
//! The learner sees the front of the current card, flips it once to reveal
//! the back, then rates it. Each rating is scheduled with SM-2 and saved
//! (card update and log entry together) before the session moves on. When
//! the last card is done the session is completed and reports a summary.
//!
//! Sessions live in memory only. Dropping one abandons it: cards already
//! rated stay saved, the rest are still due next time.

use super::clock::{Clock, SystemClock};
use super::sm2;
use super::stats::RatingDistribution;
use super::{Card, CardId, Rating, SchedulingState, SessionLogEntry, StudyTimer, UserId};
use crate::database::{ReviewCommit, ReviewStore};
use crate::error::{EngineError, StoreError, ValidationError};
use chrono::TimeDelta;
use log::{debug, info, warn};
use serde::Serialize;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SessionPhase {
    /// Front of the current card is shown.
    Front,
    /// Card is flipped and waiting for a rating.
    Back,
    Completed,
}

/// Counts reported when a session completes.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct SessionSummary {
    pub hard: usize,
    pub medium: usize,
    pub easy: usize,
    pub total: usize,
    /// Cards that disappeared from the store before they could be rated.
    pub skipped: usize,
}

#[derive(Clone, Debug, PartialEq)]
pub enum RateOutcome {
    /// Rating saved, the next card is now shown.
    Rated {
        card_id: CardId,
        state: SchedulingState,
    },
    /// Card no longer exists; it was passed over without a review.
    Skipped { card_id: CardId },
    /// The rated (or skipped) card was the last one.
    Completed(SessionSummary),
}

pub struct ReviewSession<S, C = SystemClock> {
    user_id: UserId,
    queue: Vec<Card>,
    cursor: usize,
    flipped: bool,
    completed_count: usize,
    ratings: RatingDistribution,
    skipped: Vec<CardId>,
    timer: StudyTimer,
    store: S,
    clock: C,
}

impl<S: ReviewStore, C: Clock> ReviewSession<S, C> {
    /// Starts a session on `queue`, usually the output of `select_due`.
    /// An empty queue is refused: the caller should show something else.
    pub fn start(user_id: UserId, queue: Vec<Card>, store: S, clock: C) -> Result<Self, EngineError> {
        if queue.is_empty() {
            return Err(ValidationError::EmptyQueue.into());
        }

        info!("Review session started for user {} with {} cards", user_id, queue.len());
        let timer = StudyTimer::new().start(clock.now());

        Ok(Self {
            user_id,
            queue,
            cursor: 0,
            flipped: false,
            completed_count: 0,
            ratings: RatingDistribution::default(),
            skipped: Vec::new(),
            timer,
            store,
            clock,
        })
    }

    pub fn user_id(&self) -> UserId {
        self.user_id
    }

    pub fn current_card(&self) -> Option<&Card> {
        self.queue.get(self.cursor)
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn total_count(&self) -> usize {
        self.queue.len()
    }

    pub fn completed_count(&self) -> usize {
        self.completed_count
    }

    pub fn is_flipped(&self) -> bool {
        self.flipped
    }

    pub fn is_completed(&self) -> bool {
        self.cursor >= self.queue.len()
    }

    pub fn phase(&self) -> SessionPhase {
        if self.is_completed() {
            SessionPhase::Completed
        } else if self.flipped {
            SessionPhase::Back
        } else {
            SessionPhase::Front
        }
    }

    /// Fraction of the queue already handled, from 0.0 to 1.0.
    pub fn progress(&self) -> f32 {
        self.cursor as f32 / self.queue.len() as f32
    }

    pub fn summary(&self) -> SessionSummary {
        SessionSummary {
            hard: self.ratings.hard,
            medium: self.ratings.medium,
            easy: self.ratings.easy,
            total: self.completed_count,
            skipped: self.skipped.len(),
        }
    }

    pub fn skipped_cards(&self) -> &[CardId] {
        &self.skipped
    }

    pub fn study_time(&self) -> TimeDelta {
        self.timer.elapsed(self.clock.now())
    }

    /// What each rating would schedule for the current card.
    pub fn preview(&self) -> Option<[SchedulingState; 3]> {
        let today = self.clock.today();
        self.current_card()
            .map(|card| sm2::preview(&card.scheduling, today))
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Reveals the back of the current card.
    /// Returns false, changing nothing, if it is already revealed or the
    /// session is over. There is no way back to the front.
    pub fn flip(&mut self) -> bool {
        if self.flipped || self.is_completed() {
            return false;
        }
        self.flipped = true;
        true
    }

    /// Rates the current card, saves the result and moves to the next card.
    ///
    /// On a persistence error nothing moves: the card stays flipped and the
    /// same rating can be submitted again. Nothing is retried automatically.
    /// A card that no longer exists is skipped instead of rated.
    pub fn rate(&mut self, rating: Rating) -> Result<RateOutcome, EngineError> {
        if self.is_completed() {
            return Err(ValidationError::SessionCompleted.into());
        }
        if !self.flipped {
            return Err(ValidationError::NotFlipped.into());
        }

        let now = self.clock.now();
        let card = &self.queue[self.cursor];
        let card_id = card.id;
        let state = sm2::transition(&card.scheduling, rating, now.date());
        let commit = ReviewCommit {
            card_id,
            expected_review_count: card.scheduling.review_count,
            entry: SessionLogEntry {
                card_id,
                rating,
                timestamp: now,
                review_number: state.review_count,
            },
            state,
        };

        match self.store.commit_review(self.user_id, &commit) {
            Ok(()) => {}
            Err(StoreError::CardNotFound(_)) => {
                warn!("Card {} no longer exists, skipping it", card_id);
                self.skipped.push(card_id);
                return Ok(self
                    .advance()
                    .unwrap_or(RateOutcome::Skipped { card_id }));
            }
            Err(err) => {
                warn!("Saving {} rating for card {} failed: {}", rating, card_id, err);
                return Err(EngineError::Persistence(err));
            }
        }

        debug!(
            "Card {} rated {}: next review in {} days",
            card_id, rating, commit.state.interval_days
        );
        self.queue[self.cursor].scheduling = commit.state.clone();
        self.completed_count += 1;
        self.ratings.record(rating);

        Ok(self.advance().unwrap_or(RateOutcome::Rated {
            card_id,
            state: commit.state,
        }))
    }

    /// Ends the session early and hands the store back.
    pub fn abandon(self) -> S {
        info!(
            "Review session abandoned after {} of {} cards",
            self.completed_count,
            self.queue.len()
        );
        self.store
    }

    fn advance(&mut self) -> Option<RateOutcome> {
        self.cursor += 1;
        self.flipped = false;

        if !self.is_completed() {
            return None;
        }

        self.timer = self.timer.pause(self.clock.now());
        let summary = self.summary();
        info!(
            "Review session completed: {} rated ({} hard, {} medium, {} easy), {} skipped",
            summary.total, summary.hard, summary.medium, summary.easy, summary.skipped
        );
        Some(RateOutcome::Completed(summary))
    }
}
