//! Overview statistics across all cards

use chrono::{DateTime, Utc};
use rusqlite::{Connection, Result};

use super::cards::row_to_card;
use super::timestamp_or_epoch;
use crate::domain::Card;

#[derive(Debug, Clone)]
pub struct CardOverview {
    pub card: Card,
    pub review_count: i64,
    /// None if the card has never been reviewed
    pub last_review: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Totals {
    pub total_cards: i64,
    pub total_reviews: i64,
}

impl Totals {
    pub fn average_reviews_per_card(&self) -> f64 {
        if self.total_cards > 0 {
            self.total_reviews as f64 / self.total_cards as f64
        } else {
            0.0
        }
    }
}

pub fn get_card_overview(conn: &Connection) -> Result<Vec<CardOverview>> {
    let mut stmt = conn.prepare(
        r#"
    SELECT c.id, c.front_content, c.back_content, c.created_at,
           COUNT(rh.id) AS review_count,
           (SELECT review_date FROM review_history WHERE card_id = c.id ORDER BY id DESC LIMIT 1) AS last_review
    FROM cards c
    LEFT JOIN review_history rh ON c.id = rh.card_id
    GROUP BY c.id
    ORDER BY c.id
    "#,
    )?;

    let overview = stmt
        .query_map([], |row| {
            let last_review: Option<String> = row.get(5)?;
            Ok(CardOverview {
                card: row_to_card(row)?,
                review_count: row.get(4)?,
                last_review: last_review.map(|s| timestamp_or_epoch(&s, "review_date")),
            })
        })?
        .collect::<Result<Vec<_>>>()?;

    Ok(overview)
}

pub fn get_totals(conn: &Connection) -> Result<Totals> {
    let total_cards: i64 = conn.query_row("SELECT COUNT(*) FROM cards", [], |row| row.get(0))?;
    let total_reviews: i64 = conn.query_row("SELECT COUNT(*) FROM review_history", [], |row| row.get(0))?;
    Ok(Totals {
        total_cards,
        total_reviews,
    })
}
