//! Learner's self-assessment after revealing the back of a card.
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Rating {
    Hard,
    Medium,
    Easy,
}

impl Rating {
    pub const ALL: [Rating; 3] = [Rating::Hard, Rating::Medium, Rating::Easy];

    /// Quality score fed into the ease-factor formula.
    pub fn quality(self) -> u8 {
        match self {
            Rating::Hard => 0,
            Rating::Medium => 1,
            Rating::Easy => 2,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Rating::Hard => "hard",
            Rating::Medium => "medium",
            Rating::Easy => "easy",
        }
    }
}

impl fmt::Display for Rating {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown rating: {0:?}")]
pub struct ParseRatingError(pub String);

impl FromStr for Rating {
    type Err = ParseRatingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "hard" => Ok(Rating::Hard),
            "medium" => Ok(Rating::Medium),
            "easy" => Ok(Rating::Easy),
            other => Err(ParseRatingError(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quality_mapping() {
        assert_eq!(Rating::Hard.quality(), 0);
        assert_eq!(Rating::Medium.quality(), 1);
        assert_eq!(Rating::Easy.quality(), 2);
    }

    #[test]
    fn test_parse_rejects_unknown_values() {
        assert_eq!("medium".parse::<Rating>(), Ok(Rating::Medium));
        assert!("again".parse::<Rating>().is_err());
        assert!("Easy".parse::<Rating>().is_err());
    }

    #[test]
    fn test_serde_uses_lowercase_names() {
        assert_eq!(serde_json::to_string(&Rating::Easy).unwrap(), "\"easy\"");
        let parsed: Rating = serde_json::from_str("\"hard\"").unwrap();
        assert_eq!(parsed, Rating::Hard);
        assert!(serde_json::from_str::<Rating>("\"good\"").is_err());
    }
}
