//! Conversions between day-unit intervals and concrete review times.
//!
//! Both conversions truncate toward zero: a 1.9 day interval schedules one day
//! out and is displayed as "1d". Stored review histories depend on this, so it
//! must stay truncation rather than rounding.

use chrono::{DateTime, NaiveDate, TimeDelta, Utc};

pub const MINUTES_PER_DAY: f64 = 1440.0;

/// Latest schedulable review time. Kept within four-digit years so the
/// RFC 3339 text written to storage parses back.
pub fn latest_review_time() -> DateTime<Utc> {
  NaiveDate::from_ymd_opt(9999, 12, 31)
    .and_then(|d| d.and_hms_opt(23, 59, 59))
    .map(|naive| naive.and_utc())
    .unwrap_or(DateTime::<Utc>::MAX_UTC)
}

/// Convert a learning step in minutes to a day fraction
pub fn minutes_to_days(minutes: u32) -> f64 {
  minutes as f64 / MINUTES_PER_DAY
}

/// Sub-day intervals resolve to whole minutes, everything else to whole days.
/// Intervals too long to represent saturate at `latest_review_time`.
pub fn next_review_at(now: DateTime<Utc>, interval: f64) -> DateTime<Utc> {
  let delta = if interval < 1.0 {
    TimeDelta::try_minutes((interval * MINUTES_PER_DAY).trunc() as i64)
  } else {
    TimeDelta::try_days(interval.trunc() as i64)
  };
  let latest = latest_review_time();
  delta
    .and_then(|d| now.checked_add_signed(d))
    .map_or(latest, |t| t.min(latest))
}

/// Short human-readable form of an interval, e.g. "10m" or "15d"
pub fn format_interval(interval: f64) -> String {
  if interval < 1.0 {
    format!("{}m", (interval * MINUTES_PER_DAY).trunc() as i64)
  } else {
    format!("{}d", interval.trunc() as i64)
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use chrono::Duration;

  fn t0() -> DateTime<Utc> {
    DateTime::parse_from_rfc3339("2024-03-01T12:00:00Z")
      .unwrap()
      .with_timezone(&Utc)
  }

  #[test]
  fn test_learning_step_minutes() {
    assert_eq!(next_review_at(t0(), minutes_to_days(1)), t0() + Duration::minutes(1));
    assert_eq!(next_review_at(t0(), minutes_to_days(10)), t0() + Duration::minutes(10));
  }

  #[test]
  fn test_fractional_days_truncate() {
    // 19.5 days -> 19 days, not 20
    assert_eq!(next_review_at(t0(), 19.5), t0() + Duration::days(19));
    assert_eq!(next_review_at(t0(), 1.99), t0() + Duration::days(1));
  }

  #[test]
  fn test_zero_interval_is_immediate() {
    assert_eq!(next_review_at(t0(), 0.0), t0());
  }

  #[test]
  fn test_huge_interval_saturates() {
    assert_eq!(next_review_at(t0(), 1e9), latest_review_time());
    assert_eq!(next_review_at(t0(), f64::MAX), latest_review_time());
    // Representable in chrono but past year 9999
    assert_eq!(next_review_at(t0(), 4_000_000.0), latest_review_time());
  }

  #[test]
  fn test_latest_review_time_round_trips() {
    let text = latest_review_time().to_rfc3339();
    let parsed = DateTime::parse_from_rfc3339(&text).unwrap().with_timezone(&Utc);
    assert_eq!(parsed, latest_review_time());
  }

  #[test]
  fn test_format_interval() {
    assert_eq!(format_interval(minutes_to_days(1)), "1m");
    assert_eq!(format_interval(minutes_to_days(10)), "10m");
    assert_eq!(format_interval(1.0), "1d");
    assert_eq!(format_interval(15.9), "15d");
  }
}
