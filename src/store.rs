//! Persistence seam between the scheduler and whatever keeps review history.

use chrono::{DateTime, Utc};
use rusqlite::TransactionBehavior;
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Mutex;

use crate::db::{self, DbPool};
use crate::domain::{ReviewDecision, SchedulingState};
use crate::error::{Error, Result};

/// Builds the next decision from a card's latest state
pub type DecideFn<'a> = &'a dyn Fn(Option<&SchedulingState>) -> ReviewDecision;

/// Latest-state lookup plus an append-only decision history per card.
pub trait StateStore {
    /// None for a card that has never been reviewed
    fn load_latest_state(&self, card_id: i64) -> Result<Option<SchedulingState>>;

    fn append_review_decision(&self, card_id: i64, decision: &ReviewDecision) -> Result<()>;

    /// Load the latest state, derive a decision from it and append it as one
    /// atomic step. Concurrent reviews of the same card each see the decision
    /// recorded before them.
    fn record_review(&self, card_id: i64, decide: DecideFn<'_>) -> Result<ReviewDecision>;

    /// Cards with no decision yet, or whose latest `next_review <= as_of`
    fn list_due_cards(&self, as_of: DateTime<Utc>) -> Result<Vec<i64>>;
}

/// SQLite-backed store sharing a single connection.
#[derive(Clone)]
pub struct SqliteStore {
    pool: DbPool,
}

impl SqliteStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    pub fn open(path: &Path) -> Result<Self> {
        Ok(Self::new(db::init_db(path)?))
    }

    pub fn pool(&self) -> &DbPool {
        &self.pool
    }

    pub fn add_card(&self, front: &str, back: &str, created_at: DateTime<Utc>) -> Result<i64> {
        let conn = db::try_lock(&self.pool)?;
        Ok(db::insert_card(&conn, front, back, created_at)?)
    }

    pub fn review_history(&self, card_id: i64) -> Result<Vec<ReviewDecision>> {
        let conn = db::try_lock(&self.pool)?;
        Ok(db::get_review_history(&conn, card_id)?)
    }
}

impl StateStore for SqliteStore {
    fn load_latest_state(&self, card_id: i64) -> Result<Option<SchedulingState>> {
        let conn = db::try_lock(&self.pool)?;
        Ok(db::load_latest_state(&conn, card_id)?)
    }

    fn append_review_decision(&self, card_id: i64, decision: &ReviewDecision) -> Result<()> {
        let conn = db::try_lock(&self.pool)?;
        if !db::card_exists(&conn, card_id)? {
            return Err(Error::CardNotFound(card_id));
        }
        db::append_review_decision(&conn, card_id, decision)?;
        Ok(())
    }

    fn record_review(&self, card_id: i64, decide: DecideFn<'_>) -> Result<ReviewDecision> {
        let mut conn = db::try_lock(&self.pool)?;
        // IMMEDIATE also keeps other processes on the same file out
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        if !db::card_exists(&tx, card_id)? {
            return Err(Error::CardNotFound(card_id));
        }
        let current = db::load_latest_state(&tx, card_id)?;
        let decision = decide(current.as_ref());
        db::append_review_decision(&tx, card_id, &decision)?;
        tx.commit()?;
        Ok(decision)
    }

    fn list_due_cards(&self, as_of: DateTime<Utc>) -> Result<Vec<i64>> {
        let conn = db::try_lock(&self.pool)?;
        Ok(db::list_due_card_ids(&conn, as_of)?)
    }
}

/// In-process store keyed by card id.
#[derive(Default)]
pub struct MemoryStore {
    histories: Mutex<BTreeMap<i64, Vec<ReviewDecision>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a card with an empty history. Registering twice is a no-op.
    pub fn add_card(&self, card_id: i64) -> Result<()> {
        let mut histories = self.histories.lock().map_err(|_| Error::StoreUnavailable)?;
        histories.entry(card_id).or_default();
        Ok(())
    }

    pub fn review_history(&self, card_id: i64) -> Result<Vec<ReviewDecision>> {
        let histories = self.histories.lock().map_err(|_| Error::StoreUnavailable)?;
        histories
            .get(&card_id)
            .cloned()
            .ok_or(Error::CardNotFound(card_id))
    }
}

impl StateStore for MemoryStore {
    fn load_latest_state(&self, card_id: i64) -> Result<Option<SchedulingState>> {
        let histories = self.histories.lock().map_err(|_| Error::StoreUnavailable)?;
        Ok(histories
            .get(&card_id)
            .and_then(|history| history.last())
            .map(|decision| decision.state.clone()))
    }

    fn append_review_decision(&self, card_id: i64, decision: &ReviewDecision) -> Result<()> {
        let mut histories = self.histories.lock().map_err(|_| Error::StoreUnavailable)?;
        histories
            .get_mut(&card_id)
            .ok_or(Error::CardNotFound(card_id))?
            .push(decision.clone());
        Ok(())
    }

    fn record_review(&self, card_id: i64, decide: DecideFn<'_>) -> Result<ReviewDecision> {
        let mut histories = self.histories.lock().map_err(|_| Error::StoreUnavailable)?;
        let history = histories.get_mut(&card_id).ok_or(Error::CardNotFound(card_id))?;
        let decision = decide(history.last().map(|d| &d.state));
        history.push(decision.clone());
        Ok(decision)
    }

    fn list_due_cards(&self, as_of: DateTime<Utc>) -> Result<Vec<i64>> {
        let histories = self.histories.lock().map_err(|_| Error::StoreUnavailable)?;
        Ok(histories
            .iter()
            .filter(|(_, history)| history.last().is_none_or(|d| d.state.is_due(as_of)))
            .map(|(id, _)| *id)
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ReviewQuality;
    use crate::testing::TestEnv;
    use chrono::Duration;

    fn decision_due_at(next_review: DateTime<Utc>) -> ReviewDecision {
        let mut state = SchedulingState::new_card(2.5, next_review);
        state.interval = 1.0;
        ReviewDecision::new(ReviewQuality::Good, state, Utc::now())
    }

    fn exercise_store(store: &dyn StateStore, first: i64, second: i64) {
        let now = Utc::now();
        assert!(store.load_latest_state(first).unwrap().is_none());
        assert_eq!(store.list_due_cards(now).unwrap(), vec![first, second]);

        store
            .append_review_decision(first, &decision_due_at(now + Duration::days(1)))
            .unwrap();
        assert_eq!(store.list_due_cards(now).unwrap(), vec![second]);
        assert_eq!(
            store.list_due_cards(now + Duration::days(1)).unwrap(),
            vec![first, second]
        );

        let latest = store.load_latest_state(first).unwrap().unwrap();
        assert_eq!(latest.interval, 1.0);

        // The closure sees the decision appended just before
        let recorded = store
            .record_review(first, &|prior| {
                let mut next = prior.expect("card already reviewed").clone();
                next.interval *= 2.0;
                ReviewDecision::new(ReviewQuality::Good, next, now)
            })
            .unwrap();
        assert_eq!(recorded.state.interval, 2.0);
        assert_eq!(store.load_latest_state(first).unwrap().unwrap().interval, 2.0);

        let seen_new = store
            .record_review(second, &|prior| {
                assert!(prior.is_none());
                decision_due_at(now)
            })
            .unwrap();
        assert_eq!(seen_new.state.interval, 1.0);
    }

    #[test]
    fn test_memory_store_contract() {
        let store = MemoryStore::new();
        store.add_card(1).unwrap();
        store.add_card(2).unwrap();
        exercise_store(&store, 1, 2);
        assert_eq!(store.review_history(1).unwrap().len(), 2);
    }

    #[test]
    fn test_sqlite_store_contract() {
        let env = TestEnv::new().unwrap();
        let store = SqliteStore::open(&env.path().join("store.db")).unwrap();
        let now = Utc::now();
        let first = store.add_card("a", "1", now).unwrap();
        let second = store.add_card("b", "2", now).unwrap();
        exercise_store(&store, first, second);
        assert_eq!(store.review_history(first).unwrap().len(), 2);
    }

    #[test]
    fn test_append_to_unknown_card() {
        let memory = MemoryStore::new();
        let result = memory.append_review_decision(7, &decision_due_at(Utc::now()));
        assert!(matches!(result, Err(Error::CardNotFound(7))));

        let env = TestEnv::new().unwrap();
        let sqlite = SqliteStore::open(&env.path().join("store.db")).unwrap();
        let result = sqlite.append_review_decision(7, &decision_due_at(Utc::now()));
        assert!(matches!(result, Err(Error::CardNotFound(7))));

        let decide = |_: Option<&SchedulingState>| decision_due_at(Utc::now());
        assert!(matches!(memory.record_review(7, &decide), Err(Error::CardNotFound(7))));
        assert!(matches!(sqlite.record_review(7, &decide), Err(Error::CardNotFound(7))));
    }
}
