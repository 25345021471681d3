use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Card {
  pub id: i64,
  pub front: String,
  pub back: String,
  pub created_at: DateTime<Utc>,
}

/// Per-card memory model, read and rewritten on every review.
///
/// `interval` is always in days. Values below 1 are learning steps expressed
/// as a day fraction (minutes / 1440).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SchedulingState {
  /// Consecutive non-"Again" answers since the last lapse. While below the
  /// number of learning steps it doubles as the current step index.
  pub repetition: u32,
  pub ease_factor: f64,
  pub interval: f64,
  pub next_review: DateTime<Utc>,
}

impl SchedulingState {
  /// State synthesized for a card that has never been reviewed
  pub fn new_card(initial_ease: f64, now: DateTime<Utc>) -> Self {
    Self {
      repetition: 0,
      ease_factor: initial_ease,
      interval: 0.0,
      next_review: now,
    }
  }

  /// False for states that cannot have come out of the scheduler
  /// (NaN/infinite numbers, negative interval).
  pub fn is_well_formed(&self) -> bool {
    self.ease_factor.is_finite() && self.interval.is_finite() && self.interval >= 0.0
  }

  pub fn is_due(&self, as_of: DateTime<Utc>) -> bool {
    self.next_review <= as_of
  }
}
