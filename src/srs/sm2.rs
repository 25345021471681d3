//! Anki-style SM-2 scheduling.
//!
//! Cards move through two phases:
//! - Learning (`repetition < learning_steps.len()`): short minute-based steps.
//!   Good advances one step, Hard repeats the current step, Again restarts
//!   at step 0, Easy graduates immediately with `easy_interval`.
//! - Graduated: the previous interval is multiplied by the ease factor
//!   (Good), by `hard_interval_modifier` (Hard), or by ease factor times
//!   `easy_interval_modifier` (Easy). Again lapses the card back to step 0.
//!
//! The scheduler never reads the clock; `now` is always passed in.

use chrono::{DateTime, Utc};
use serde::Deserialize;

use super::interval::{minutes_to_days, next_review_at, MINUTES_PER_DAY};
use crate::domain::{ReviewQuality, SchedulingState};
use crate::error::{Error, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
  Learning,
  Graduated,
}

/// Scheduler tunables. Missing keys in a config file fall back to the defaults.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct SchedulerConfig {
  pub initial_ease: f64,
  pub minimum_ease: f64,
  pub maximum_ease: f64,
  /// Learning steps in minutes
  pub learning_steps: Vec<u32>,
  /// Days
  pub graduating_interval: f64,
  /// Days
  pub easy_interval: f64,
  pub hard_interval_modifier: f64,
  pub easy_interval_modifier: f64,
  // Ease adjustments are magnitudes: again/hard subtract, good/easy add.
  pub ease_again: f64,
  pub ease_hard: f64,
  pub ease_good: f64,
  pub ease_easy: f64,
}

impl Default for SchedulerConfig {
  fn default() -> Self {
    Self {
      initial_ease: 2.5,
      minimum_ease: 1.3,
      maximum_ease: 3.0,
      learning_steps: vec![1, 10],
      graduating_interval: 1.0,
      easy_interval: 4.0,
      hard_interval_modifier: 1.2,
      easy_interval_modifier: 1.3,
      ease_again: 0.20,
      ease_hard: 0.15,
      ease_good: 0.0,
      ease_easy: 0.15,
    }
  }
}

impl SchedulerConfig {
  pub fn validate(&self) -> Result<()> {
    let numbers = [
      ("initial_ease", self.initial_ease),
      ("minimum_ease", self.minimum_ease),
      ("maximum_ease", self.maximum_ease),
      ("graduating_interval", self.graduating_interval),
      ("easy_interval", self.easy_interval),
      ("hard_interval_modifier", self.hard_interval_modifier),
      ("easy_interval_modifier", self.easy_interval_modifier),
      ("ease_again", self.ease_again),
      ("ease_hard", self.ease_hard),
      ("ease_good", self.ease_good),
      ("ease_easy", self.ease_easy),
    ];
    for (name, value) in numbers {
      if !value.is_finite() {
        return Err(Error::InvalidInput(format!("{} must be a finite number", name)));
      }
    }

    if self.learning_steps.is_empty() {
      return Err(Error::InvalidInput("learning_steps must not be empty".into()));
    }
    if self.learning_steps.contains(&0) {
      return Err(Error::InvalidInput("learning_steps must be positive".into()));
    }
    // Steps must stay sub-day so they are scheduled by minutes
    if let Some(step) = self.learning_steps.iter().find(|&&m| m as f64 >= MINUTES_PER_DAY) {
      return Err(Error::InvalidInput(format!(
        "learning step of {} minutes is not shorter than a day",
        step
      )));
    }
    if self.hard_interval_modifier <= 0.0 || self.easy_interval_modifier <= 0.0 {
      return Err(Error::InvalidInput("interval modifiers must be positive".into()));
    }
    if self.minimum_ease <= 0.0 {
      return Err(Error::InvalidInput("minimum_ease must be positive".into()));
    }
    if self.minimum_ease > self.initial_ease || self.initial_ease > self.maximum_ease {
      return Err(Error::InvalidInput(format!(
        "ease bounds must satisfy minimum ({}) <= initial ({}) <= maximum ({})",
        self.minimum_ease, self.initial_ease, self.maximum_ease
      )));
    }
    if self.graduating_interval < 1.0 || self.easy_interval < 1.0 {
      return Err(Error::InvalidInput(
        "graduating_interval and easy_interval must be at least one day".into(),
      ));
    }
    Ok(())
  }

  fn step_count(&self) -> u32 {
    self.learning_steps.len() as u32
  }

  fn step_interval(&self, step: u32) -> f64 {
    minutes_to_days(self.learning_steps[step as usize])
  }

  fn adjust_ease(&self, ease_factor: f64, delta: f64) -> f64 {
    (ease_factor + delta).clamp(self.minimum_ease, self.maximum_ease)
  }
}

/// Stateless scheduling engine bound to an immutable configuration.
///
/// Safe to share across threads; every call is a pure function of
/// `(state, quality, now)`.
#[derive(Debug, Clone, Default)]
pub struct Scheduler {
  config: SchedulerConfig,
}

impl Scheduler {
  pub fn new(config: SchedulerConfig) -> Result<Self> {
    config.validate()?;
    Ok(Self { config })
  }

  pub fn config(&self) -> &SchedulerConfig {
    &self.config
  }

  pub fn new_card_state(&self, now: DateTime<Utc>) -> SchedulingState {
    SchedulingState::new_card(self.config.initial_ease, now)
  }

  pub fn phase(&self, state: &SchedulingState) -> Phase {
    if state.repetition < self.config.step_count() {
      Phase::Learning
    } else {
      Phase::Graduated
    }
  }

  /// Schedule from an unvalidated rating. Anything outside 0..=3 is an error.
  pub fn review(
    &self,
    state: Option<&SchedulingState>,
    quality: i64,
    now: DateTime<Utc>,
  ) -> Result<SchedulingState> {
    let quality = ReviewQuality::try_from(quality)?;
    Ok(self.schedule(state, quality, now))
  }

  /// Compute the state that follows `state` after answering with `quality`.
  /// A missing or malformed prior state is treated as a brand-new card.
  pub fn schedule(
    &self,
    state: Option<&SchedulingState>,
    quality: ReviewQuality,
    now: DateTime<Utc>,
  ) -> SchedulingState {
    let current = self.normalize(state, now);
    let phase = self.phase(&current);

    let (repetition, ease_factor, interval) = match phase {
      Phase::Learning => self.learning_phase(&current, quality),
      Phase::Graduated => self.graduated_phase(&current, quality),
    };

    tracing::debug!(
      ?phase,
      %quality,
      repetition,
      ease_factor,
      interval,
      "Scheduled review"
    );

    SchedulingState {
      repetition,
      ease_factor,
      interval,
      next_review: next_review_at(now, interval),
    }
  }

  /// Intervals each rating would produce for `state`, indexed Again..Easy.
  pub fn preview_intervals(&self, state: Option<&SchedulingState>, now: DateTime<Utc>) -> [f64; 4] {
    ReviewQuality::ALL.map(|quality| self.schedule(state, quality, now).interval)
  }

  fn normalize(&self, state: Option<&SchedulingState>, now: DateTime<Utc>) -> SchedulingState {
    match state {
      None => self.new_card_state(now),
      Some(s) if !s.is_well_formed() => {
        tracing::warn!(?s, "Malformed scheduling state, treating card as new");
        self.new_card_state(now)
      }
      Some(s) => {
        let mut s = s.clone();
        s.ease_factor = s
          .ease_factor
          .clamp(self.config.minimum_ease, self.config.maximum_ease);
        s
      }
    }
  }

  fn learning_phase(&self, state: &SchedulingState, quality: ReviewQuality) -> (u32, f64, f64) {
    let cfg = &self.config;
    match quality {
      ReviewQuality::Again => (
        0,
        cfg.adjust_ease(state.ease_factor, -cfg.ease_again),
        cfg.step_interval(0),
      ),
      ReviewQuality::Hard => (
        state.repetition,
        cfg.adjust_ease(state.ease_factor, -cfg.ease_hard),
        cfg.step_interval(state.repetition),
      ),
      ReviewQuality::Good => {
        let repetition = state.repetition + 1;
        let interval = if repetition < cfg.step_count() {
          cfg.step_interval(repetition)
        } else {
          cfg.graduating_interval
        };
        (repetition, cfg.adjust_ease(state.ease_factor, cfg.ease_good), interval)
      }
      ReviewQuality::Easy => (
        cfg.step_count(),
        cfg.adjust_ease(state.ease_factor, cfg.ease_easy),
        cfg.easy_interval,
      ),
    }
  }

  fn graduated_phase(&self, state: &SchedulingState, quality: ReviewQuality) -> (u32, f64, f64) {
    let cfg = &self.config;
    match quality {
      // Lapse: back to the first learning step
      ReviewQuality::Again => (
        0,
        cfg.adjust_ease(state.ease_factor, -cfg.ease_again),
        cfg.step_interval(0),
      ),
      ReviewQuality::Hard => (
        state.repetition,
        cfg.adjust_ease(state.ease_factor, -cfg.ease_hard),
        state.interval * cfg.hard_interval_modifier,
      ),
      // Interval growth uses the ease factor from before this review
      ReviewQuality::Good => (
        state.repetition,
        cfg.adjust_ease(state.ease_factor, cfg.ease_good),
        state.interval * state.ease_factor,
      ),
      ReviewQuality::Easy => (
        state.repetition,
        cfg.adjust_ease(state.ease_factor, cfg.ease_easy),
        state.interval * state.ease_factor * cfg.easy_interval_modifier,
      ),
    }
  }
}
