use rusqlite::{Connection, Result};

/// Column names match databases written by earlier versions of the tool so
/// existing review histories open unchanged.
pub fn run_migrations(conn: &Connection) -> Result<()> {
  conn.execute_batch(
    r#"
    CREATE TABLE IF NOT EXISTS cards (
      id INTEGER PRIMARY KEY AUTOINCREMENT,
      front_content TEXT NOT NULL,
      back_content TEXT NOT NULL,
      created_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP
    );

    CREATE TABLE IF NOT EXISTS review_history (
      id INTEGER PRIMARY KEY AUTOINCREMENT,
      card_id INTEGER,
      review_date TIMESTAMP,
      quality INTEGER,
      ease_factor REAL,
      interval REAL,
      repetition INTEGER,
      next_review TIMESTAMP,
      FOREIGN KEY (card_id) REFERENCES cards (id)
    );

    -- Indexes
    CREATE INDEX IF NOT EXISTS idx_review_history_card_id ON review_history(card_id);
    "#,
  )?;

  Ok(())
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_migrations_are_idempotent() {
    let conn = Connection::open_in_memory().unwrap();
    run_migrations(&conn).unwrap();
    run_migrations(&conn).unwrap();

    let tables: i64 = conn
      .query_row(
        "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name IN ('cards', 'review_history')",
        [],
        |row| row.get(0),
      )
      .unwrap();
    assert_eq!(tables, 2);
  }

  #[test]
  fn test_only_card_id_index() {
    let conn = Connection::open_in_memory().unwrap();
    run_migrations(&conn).unwrap();

    let mut stmt = conn
      .prepare("SELECT name FROM sqlite_master WHERE type = 'index' AND tbl_name = 'review_history' AND sql IS NOT NULL")
      .unwrap();
    let names = stmt
      .query_map([], |row| row.get::<_, String>(0))
      .unwrap()
      .collect::<rusqlite::Result<Vec<_>>>()
      .unwrap();
    assert_eq!(names, vec!["idx_review_history_card_id".to_string()]);
  }
}
