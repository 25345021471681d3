//! Card insert and lookup

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, Result};

use super::timestamp_or_epoch;
use crate::domain::Card;

pub fn insert_card(conn: &Connection, front: &str, back: &str, created_at: DateTime<Utc>) -> Result<i64> {
    conn.execute(
        "INSERT INTO cards (front_content, back_content, created_at) VALUES (?1, ?2, ?3)",
        params![front, back, created_at.to_rfc3339()],
    )?;
    Ok(conn.last_insert_rowid())
}

pub fn get_card_by_id(conn: &Connection, id: i64) -> Result<Option<Card>> {
    let mut stmt = conn.prepare(
        "SELECT id, front_content, back_content, created_at FROM cards WHERE id = ?1",
    )?;

    let mut rows = stmt.query(params![id])?;
    if let Some(row) = rows.next()? {
        Ok(Some(row_to_card(row)?))
    } else {
        Ok(None)
    }
}

pub fn card_exists(conn: &Connection, id: i64) -> Result<bool> {
    conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM cards WHERE id = ?1)",
        params![id],
        |row| row.get(0),
    )
}

pub fn list_cards(conn: &Connection) -> Result<Vec<Card>> {
    let mut stmt = conn.prepare(
        "SELECT id, front_content, back_content, created_at FROM cards ORDER BY id",
    )?;

    let cards = stmt
        .query_map([], row_to_card)?
        .collect::<Result<Vec<_>>>()?;
    Ok(cards)
}

pub(crate) fn row_to_card(row: &rusqlite::Row) -> Result<Card> {
    let created_at: Option<String> = row.get(3)?;

    Ok(Card {
        id: row.get(0)?,
        front: row.get(1)?,
        back: row.get(2)?,
        created_at: created_at
            .map(|s| timestamp_or_epoch(&s, "created_at"))
            .unwrap_or(DateTime::<Utc>::UNIX_EPOCH),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::TestEnv;

    #[test]
    fn test_insert_and_get_card() {
        let env = TestEnv::new().unwrap();
        let now = Utc::now();

        let id = insert_card(&env.conn, "cześć", "hello", now).unwrap();
        let card = get_card_by_id(&env.conn, id).unwrap().unwrap();

        assert_eq!(card.id, id);
        assert_eq!(card.front, "cześć");
        assert_eq!(card.back, "hello");
        assert_eq!(card.created_at.timestamp(), now.timestamp());
    }

    #[test]
    fn test_get_missing_card() {
        let env = TestEnv::new().unwrap();
        assert!(get_card_by_id(&env.conn, 99).unwrap().is_none());
        assert!(!card_exists(&env.conn, 99).unwrap());
    }

    #[test]
    fn test_list_cards_ordered_by_id() {
        let env = TestEnv::new().unwrap();
        let now = Utc::now();
        let a = insert_card(&env.conn, "a", "1", now).unwrap();
        let b = insert_card(&env.conn, "b", "2", now).unwrap();

        let ids: Vec<i64> = list_cards(&env.conn).unwrap().iter().map(|c| c.id).collect();
        assert_eq!(ids, vec![a, b]);
        assert!(card_exists(&env.conn, a).unwrap());
    }

    #[test]
    fn test_legacy_created_at_default() {
        let env = TestEnv::new().unwrap();
        env.conn
            .execute(
                "INSERT INTO cards (front_content, back_content) VALUES ('x', 'y')",
                [],
            )
            .unwrap();

        let cards = list_cards(&env.conn).unwrap();
        assert_eq!(cards.len(), 1);
        // CURRENT_TIMESTAMP format is readable
        assert_ne!(cards[0].created_at, DateTime::<Utc>::UNIX_EPOCH);
    }
}
