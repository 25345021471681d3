//! Append-only review history and the queries derived from it

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, Result};

use super::timestamp_or_epoch;
use crate::domain::{ReviewDecision, ReviewQuality, SchedulingState};

/// Append one decision to a card's history. Rows are never updated.
pub fn append_review_decision(conn: &Connection, card_id: i64, decision: &ReviewDecision) -> Result<i64> {
    conn.execute(
        r#"
    INSERT INTO review_history
    (card_id, review_date, quality, ease_factor, interval, repetition, next_review)
    VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
    "#,
        params![
            card_id,
            decision.reviewed_at.to_rfc3339(),
            decision.quality.as_u8(),
            decision.state.ease_factor,
            decision.state.interval,
            decision.state.repetition,
            decision.state.next_review.to_rfc3339(),
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

/// State from the most recently appended decision, or None for a card
/// that has never been reviewed.
pub fn load_latest_state(conn: &Connection, card_id: i64) -> Result<Option<SchedulingState>> {
    let mut stmt = conn.prepare(
        r#"
    SELECT ease_factor, interval, repetition, next_review
    FROM review_history
    WHERE card_id = ?1
    ORDER BY id DESC
    LIMIT 1
    "#,
    )?;

    let mut rows = stmt.query(params![card_id])?;
    if let Some(row) = rows.next()? {
        Ok(Some(row_to_state(row, 0)?))
    } else {
        Ok(None)
    }
}

/// Full history for a card, oldest first
pub fn get_review_history(conn: &Connection, card_id: i64) -> Result<Vec<ReviewDecision>> {
    let mut stmt = conn.prepare(
        r#"
    SELECT review_date, quality, ease_factor, interval, repetition, next_review
    FROM review_history
    WHERE card_id = ?1
    ORDER BY id ASC
    "#,
    )?;

    let history = stmt
        .query_map(params![card_id], |row| {
            let reviewed_at: String = row.get(0)?;
            let quality: i64 = row.get(1)?;
            Ok(ReviewDecision {
                quality: ReviewQuality::from_i64(quality)
                    .ok_or(rusqlite::Error::IntegralValueOutOfRange(1, quality))?,
                state: row_to_state(row, 2)?,
                reviewed_at: timestamp_or_epoch(&reviewed_at, "review_date"),
            })
        })?
        .collect::<Result<Vec<_>>>()?;

    Ok(history)
}

/// Cards with no review yet, or whose latest decision is due at `as_of`.
///
/// Timestamps are compared after parsing since older rows may use a
/// different text format than RFC 3339.
pub fn list_due_card_ids(conn: &Connection, as_of: DateTime<Utc>) -> Result<Vec<i64>> {
    let mut stmt = conn.prepare(
        r#"
    WITH LatestReviews AS (
      SELECT card_id, MAX(id) AS max_id
      FROM review_history
      GROUP BY card_id
    )
    SELECT c.id, rh.next_review
    FROM cards c
    LEFT JOIN LatestReviews lr ON c.id = lr.card_id
    LEFT JOIN review_history rh ON lr.max_id = rh.id
    ORDER BY c.id
    "#,
    )?;

    let rows = stmt
        .query_map([], |row| Ok((row.get::<_, i64>(0)?, row.get::<_, Option<String>>(1)?)))?
        .collect::<Result<Vec<_>>>()?;

    let due = rows
        .into_iter()
        .filter(|(_, next_review)| match next_review {
            None => true,
            Some(s) => timestamp_or_epoch(s, "next_review") <= as_of,
        })
        .map(|(id, _)| id)
        .collect();

    Ok(due)
}

/// Reads ease_factor, interval, repetition, next_review starting at `offset`
fn row_to_state(row: &rusqlite::Row, offset: usize) -> Result<SchedulingState> {
    let next_review: String = row.get(offset + 3)?;

    Ok(SchedulingState {
        ease_factor: row.get(offset)?,
        interval: row.get(offset + 1)?,
        repetition: row.get(offset + 2)?,
        next_review: timestamp_or_epoch(&next_review, "next_review"),
    })
}
