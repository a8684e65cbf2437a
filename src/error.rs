//! Error types shared by the review engine and its persistence layer.
use crate::models::CardId;
use thiserror::Error;

/// Failure reported by a card store or session log.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("Database lock poisoned")]
    LockPoisoned,

    #[error("Card not found: {0}")]
    CardNotFound(CardId),

    #[error("Card {card_id} was reviewed elsewhere (expected review count {expected}, found {found})")]
    Conflict {
        card_id: CardId,
        expected: u32,
        found: u32,
    },

    #[error("Invalid stored data: {0}")]
    InvalidData(String),
}

/// Misuse of the session controller. These are programming errors on the
/// caller's side and are never retried.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationError {
    #[error("cannot start a review session without due cards")]
    EmptyQueue,

    #[error("the card must be flipped before it can be rated")]
    NotFlipped,

    #[error("the review session is already completed")]
    SessionCompleted,
}

#[derive(Error, Debug)]
pub enum EngineError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// Writing the rating failed and nothing was advanced. Unless the card
    /// changed elsewhere, the same rating may be submitted again.
    #[error("failed to save review: {0}")]
    Persistence(#[source] StoreError),

    #[error("card {0} no longer exists")]
    NotFound(CardId),
}

impl EngineError {
    /// A conflict repeats on every retry, so only other write failures count.
    pub fn is_retryable(&self) -> bool {
        match self {
            EngineError::Persistence(StoreError::Conflict { .. }) => false,
            EngineError::Persistence(_) => true,
            _ => false,
        }
    }
}

impl From<StoreError> for EngineError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::CardNotFound(card_id) => EngineError::NotFound(card_id),
            other => EngineError::Persistence(other),
        }
    }
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid config file: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Invalid value for {key}: {value:?}")]
    InvalidEnv { key: &'static str, value: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_card_maps_to_not_found() {
        let err = EngineError::from(StoreError::CardNotFound(42));
        assert!(matches!(err, EngineError::NotFound(42)));
        assert!(!err.is_retryable());
    }

    #[test]
    fn test_write_failures_are_retryable() {
        let err = EngineError::from(StoreError::LockPoisoned);
        assert!(err.is_retryable());
        assert!(!EngineError::from(ValidationError::NotFlipped).is_retryable());
    }

    #[test]
    fn test_conflict_is_not_retryable() {
        let err = EngineError::from(StoreError::Conflict {
            card_id: 7,
            expected: 0,
            found: 2,
        });
        assert!(matches!(err, EngineError::Persistence(StoreError::Conflict { .. })));
        assert!(!err.is_retryable());
    }
}
