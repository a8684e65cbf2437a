//! Keyboard shortcuts for review sessions.
//!
//! Keys are translated to commands and dispatched to the session with the
//! same guards as direct calls. A key that does not apply to the current
//! phase (rating a card still showing its front, flipping twice, anything
//! after completion) is dropped, never queued for later.

use super::clock::Clock;
use super::review_session::{RateOutcome, ReviewSession, SessionPhase};
use super::Rating;
use crate::database::ReviewStore;
use crate::error::EngineError;
use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Command {
    Flip,
    Rate(Rating),
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct KeyMap {
    pub flip: char,
    pub hard: char,
    pub medium: char,
    pub easy: char,
}

impl Default for KeyMap {
    fn default() -> Self {
        Self {
            flip: ' ',
            hard: '1',
            medium: '2',
            easy: '3',
        }
    }
}

impl KeyMap {
    pub fn command_for(&self, key: char) -> Option<Command> {
        match key {
            k if k == self.flip => Some(Command::Flip),
            k if k == self.hard => Some(Command::Rate(Rating::Hard)),
            k if k == self.medium => Some(Command::Rate(Rating::Medium)),
            k if k == self.easy => Some(Command::Rate(Rating::Easy)),
            _ => None,
        }
    }

    pub fn key_for(&self, rating: Rating) -> char {
        match rating {
            Rating::Hard => self.hard,
            Rating::Medium => self.medium,
            Rating::Easy => self.easy,
        }
    }

    /// Dispatches a key press. Unmapped keys are ignored.
    pub fn dispatch_key<S: ReviewStore, C: Clock>(
        &self,
        session: &mut ReviewSession<S, C>,
        key: char,
    ) -> Result<Dispatch, EngineError> {
        match self.command_for(key) {
            Some(command) => dispatch(session, command),
            None => Ok(Dispatch::Ignored),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum Dispatch {
    /// The command does not apply in the current phase.
    Ignored,
    Flipped,
    Rated(RateOutcome),
}

pub fn dispatch<S: ReviewStore, C: Clock>(
    session: &mut ReviewSession<S, C>,
    command: Command,
) -> Result<Dispatch, EngineError> {
    match (command, session.phase()) {
        (Command::Flip, SessionPhase::Front) => {
            session.flip();
            Ok(Dispatch::Flipped)
        }
        (Command::Rate(rating), SessionPhase::Back) => session.rate(rating).map(Dispatch::Rated),
        _ => Ok(Dispatch::Ignored),
    }
}
