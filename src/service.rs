//! Review workflow: load state, schedule, record.
//!
//! This is the only place that reads the wall clock; the `_at` variants take
//! the time explicitly.

use chrono::{DateTime, Utc};

use crate::domain::{ReviewDecision, ReviewQuality};
use crate::error::Result;
use crate::srs::Scheduler;
use crate::store::StateStore;

pub struct ReviewService<S: StateStore> {
  store: S,
  scheduler: Scheduler,
}

impl<S: StateStore> ReviewService<S> {
  pub fn new(store: S, scheduler: Scheduler) -> Self {
    Self { store, scheduler }
  }

  pub fn store(&self) -> &S {
    &self.store
  }

  pub fn scheduler(&self) -> &Scheduler {
    &self.scheduler
  }

  pub fn review_card(&self, card_id: i64, quality: i64) -> Result<ReviewDecision> {
    self.review_card_at(card_id, quality, Utc::now())
  }

  /// Record one review. The quality is validated before anything is read
  /// or written; load, schedule and append happen under one store lock.
  pub fn review_card_at(&self, card_id: i64, quality: i64, now: DateTime<Utc>) -> Result<ReviewDecision> {
    let quality = ReviewQuality::try_from(quality)?;
    let decision = self.store.record_review(card_id, &|current| {
      ReviewDecision::new(quality, self.scheduler.schedule(current, quality, now), now)
    })?;

    tracing::info!(
      card_id,
      %quality,
      repetition = decision.state.repetition,
      next_review = %decision.state.next_review,
      "Recorded review"
    );
    Ok(decision)
  }

  pub fn due_cards(&self, as_of: DateTime<Utc>) -> Result<Vec<i64>> {
    self.store.list_due_cards(as_of)
  }

  pub fn due_cards_now(&self) -> Result<Vec<i64>> {
    self.due_cards(Utc::now())
  }
}
