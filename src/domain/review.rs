use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::SchedulingState;
use crate::error::Error;

/// Self-reported recall quality collected after each review.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReviewQuality {
  Again = 0,
  Hard = 1,
  Good = 2,
  Easy = 3,
}

impl ReviewQuality {
  /// All ratings in ascending order
  pub const ALL: [ReviewQuality; 4] = [Self::Again, Self::Hard, Self::Good, Self::Easy];

  pub fn from_i64(value: i64) -> Option<Self> {
    match value {
      0 => Some(Self::Again),
      1 => Some(Self::Hard),
      2 => Some(Self::Good),
      3 => Some(Self::Easy),
      _ => None,
    }
  }

  pub fn as_u8(&self) -> u8 {
    *self as u8
  }

  pub fn as_str(&self) -> &'static str {
    match self {
      Self::Again => "again",
      Self::Hard => "hard",
      Self::Good => "good",
      Self::Easy => "easy",
    }
  }
}

impl TryFrom<i64> for ReviewQuality {
  type Error = Error;

  /// Out-of-range ratings are rejected, never coerced to a neighbouring rating.
  fn try_from(value: i64) -> Result<Self, Self::Error> {
    Self::from_i64(value).ok_or_else(|| {
      Error::InvalidInput(format!("quality must be between 0 and 3, got {}", value))
    })
  }
}

impl std::fmt::Display for ReviewQuality {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.write_str(self.as_str())
  }
}

/// One scheduling decision as appended to a card's review history.
/// Never mutated once created.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReviewDecision {
  pub quality: ReviewQuality,
  pub state: SchedulingState,
  pub reviewed_at: DateTime<Utc>,
}

impl ReviewDecision {
  pub fn new(quality: ReviewQuality, state: SchedulingState, reviewed_at: DateTime<Utc>) -> Self {
    Self {
      quality,
      state,
      reviewed_at,
    }
  }
}
