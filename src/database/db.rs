//! SQLite persistence for cards, scheduling state and the session log
//!
//! Handles database initialization, the simulated current date, the few
//! CRUD helpers needed to seed cards, and the `SqliteStore` used by review
//! sessions.

use super::store::{CardStore, ReviewCommit, ReviewStore, SessionLog};
use crate::error::StoreError;
use crate::models::{
    Card, CardId, DEFAULT_EASE_FACTOR, Rating, SchedulingState, SessionLogEntry, UserId,
    select_due,
};
use chrono::{Days, Local, NaiveDate};
use log::{debug, info, warn};
use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, ValueRef};
use rusqlite::{Connection, OptionalExtension, Result, Row, params};
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};

impl ToSql for Rating {
    fn to_sql(&self) -> Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.as_str()))
    }
}

impl FromSql for Rating {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        value
            .as_str()?
            .parse()
            .map_err(|e| FromSqlError::Other(Box::new(e)))
    }
}

/// Opens (or creates) the database file and makes sure the schema exists
pub fn open_database(path: impl AsRef<Path>) -> Result<Connection> {
    let conn = Connection::open(path)?;
    init_database(&conn)?;
    Ok(conn)
}

/// Creates tables for subjects, flashcards with their scheduling state,
/// the study session log, and app state.
/// Sets current date to today if not already initialized.
pub fn init_database(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "PRAGMA foreign_keys = ON;

        CREATE TABLE IF NOT EXISTS subjects (
            user_id INTEGER NOT NULL,
            name TEXT NOT NULL,
            PRIMARY KEY (user_id, name)
        );

        CREATE TABLE IF NOT EXISTS flashcards (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            user_id INTEGER NOT NULL,
            subject TEXT,
            front_text TEXT NOT NULL,
            back_text TEXT NOT NULL,
            created_at TEXT NOT NULL,
            ease_factor REAL NOT NULL DEFAULT 2.5,
            interval_days INTEGER NOT NULL DEFAULT 0,
            review_count INTEGER NOT NULL DEFAULT 0,
            next_review_date TEXT NOT NULL,
            FOREIGN KEY (user_id, subject) REFERENCES subjects(user_id, name)
        );

        CREATE INDEX IF NOT EXISTS flashcards_due
            ON flashcards (user_id, next_review_date);

        CREATE TABLE IF NOT EXISTS study_sessions (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            user_id INTEGER NOT NULL,
            flashcard_id INTEGER NOT NULL,
            rating TEXT NOT NULL CHECK (rating IN ('hard', 'medium', 'easy')),
            review_number INTEGER NOT NULL,
            studied_at TEXT NOT NULL,
            UNIQUE (flashcard_id, review_number)
        );

        CREATE TABLE IF NOT EXISTS app_state (
            key TEXT PRIMARY KEY,
            value TEXT NOT NULL
        );",
    )?;

    let today = Local::now().date_naive();
    conn.execute(
        "INSERT OR IGNORE INTO app_state (key, value) VALUES ('current_date', ?1)",
        params![today],
    )?;

    Ok(())
}

/// Retrieves the current simulated date from the database
pub fn get_current_date(conn: &Connection) -> Result<NaiveDate> {
    conn.query_row(
        "SELECT value FROM app_state WHERE key = 'current_date'",
        [],
        |row| row.get(0),
    )
}

/// Advances the simulated date by one day (for trying out spaced repetition)
pub fn advance_day(conn: &Connection) -> Result<NaiveDate> {
    let current = get_current_date(conn)?;
    let next_day = current.checked_add_days(Days::new(1)).unwrap_or(current);

    conn.execute(
        "UPDATE app_state SET value = ?1 WHERE key = 'current_date'",
        params![next_day],
    )?;

    Ok(next_day)
}

/// Creates a subject for a user; creating an existing one is a no-op
pub fn new_subject(user_id: UserId, name: &str, conn: &Connection) -> Result<()> {
    conn.execute(
        "INSERT OR IGNORE INTO subjects (user_id, name) VALUES (?1, ?2)",
        params![user_id, name],
    )?;
    info!("Subject '{}' ready for user {}", name, user_id);
    Ok(())
}

/// Adds a flashcard with default scheduling values, due on the current date
///
/// Returns the flashcard ID. The subject, when given, must already exist.
pub fn add_flashcard(
    user_id: UserId,
    subject: Option<&str>,
    front: &str,
    back: &str,
    conn: &Connection,
) -> Result<CardId> {
    let current_date = get_current_date(conn)?;
    let created_at = current_date.and_time(Local::now().time());

    conn.execute(
        "INSERT INTO flashcards
            (user_id, subject, front_text, back_text, created_at,
             ease_factor, interval_days, review_count, next_review_date)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, 0, 0, ?7)",
        params![
            user_id,
            subject,
            front,
            back,
            created_at,
            DEFAULT_EASE_FACTOR,
            current_date
        ],
    )?;

    Ok(conn.last_insert_rowid())
}

/// Removes a card. Its session log entries are kept as history.
pub fn delete_flashcard(user_id: UserId, card_id: CardId, conn: &Connection) -> Result<bool> {
    let deleted = conn.execute(
        "DELETE FROM flashcards WHERE id = ?1 AND user_id = ?2",
        params![card_id, user_id],
    )?;
    Ok(deleted > 0)
}

const CARD_COLUMNS: &str = "id, user_id, subject, front_text, back_text, created_at,
    ease_factor, interval_days, review_count, next_review_date";

fn card_from_row(row: &Row<'_>) -> Result<Card> {
    Ok(Card {
        id: row.get(0)?,
        user_id: row.get(1)?,
        subject: row.get(2)?,
        front: row.get(3)?,
        back: row.get(4)?,
        created_at: row.get(5)?,
        scheduling: SchedulingState {
            ease_factor: row.get(6)?,
            interval_days: row.get(7)?,
            review_count: row.get(8)?,
            next_review_date: row.get(9)?,
        },
    })
}

/// Retrieves every card of a user, in creation order
pub fn get_cards(user_id: UserId, conn: &Connection) -> Result<Vec<Card>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {CARD_COLUMNS} FROM flashcards WHERE user_id = ?1 ORDER BY created_at, id"
    ))?;

    let cards = stmt
        .query_map(params![user_id], card_from_row)?
        .collect::<Result<Vec<Card>>>()?;

    Ok(cards)
}

/// Retrieves cards of a user whose next review date is on or before `today`.
/// Ordering is left to `select_due`.
pub fn get_cards_due(user_id: UserId, today: NaiveDate, conn: &Connection) -> Result<Vec<Card>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {CARD_COLUMNS} FROM flashcards WHERE user_id = ?1 AND next_review_date <= ?2"
    ))?;

    let cards = stmt
        .query_map(params![user_id, today], card_from_row)?
        .collect::<Result<Vec<Card>>>()?;

    Ok(cards)
}

fn get_review_count(user_id: UserId, card_id: CardId, conn: &Connection) -> Result<Option<u32>> {
    conn.query_row(
        "SELECT review_count FROM flashcards WHERE id = ?1 AND user_id = ?2",
        params![card_id, user_id],
        |row| row.get(0),
    )
    .optional()
}

fn insert_log_entry(user_id: UserId, entry: &SessionLogEntry, conn: &Connection) -> Result<()> {
    conn.execute(
        "INSERT INTO study_sessions (user_id, flashcard_id, rating, review_number, studied_at)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        params![
            user_id,
            entry.card_id,
            entry.rating,
            entry.review_number,
            entry.timestamp
        ],
    )?;
    Ok(())
}

fn log_contains(user_id: UserId, entry: &SessionLogEntry, conn: &Connection) -> Result<bool> {
    conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM study_sessions
            WHERE user_id = ?1 AND flashcard_id = ?2 AND review_number = ?3 AND rating = ?4)",
        params![user_id, entry.card_id, entry.review_number, entry.rating],
        |row| row.get(0),
    )
}

/// Card store and session log backed by one SQLite connection.
///
/// Clones share the connection, so the app and a running review session can
/// both hold a store.
#[derive(Clone)]
pub struct SqliteStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteStore {
    pub fn open(path: impl AsRef<Path>) -> std::result::Result<Self, StoreError> {
        let path = path.as_ref();
        info!("Opening database at {}", path.display());
        Ok(Self::from_connection(open_database(path)?))
    }

    pub fn open_in_memory() -> std::result::Result<Self, StoreError> {
        let conn = Connection::open_in_memory()?;
        init_database(&conn)?;
        Ok(Self::from_connection(conn))
    }

    pub fn from_connection(conn: Connection) -> Self {
        Self {
            conn: Arc::new(Mutex::new(conn)),
        }
    }

    fn lock(&self) -> std::result::Result<MutexGuard<'_, Connection>, StoreError> {
        self.conn.lock().map_err(|_| StoreError::LockPoisoned)
    }

    /// Runs `f` with exclusive access to the connection.
    pub fn with_connection<T>(
        &self,
        f: impl FnOnce(&Connection) -> Result<T>,
    ) -> std::result::Result<T, StoreError> {
        let conn = self.lock()?;
        Ok(f(&conn)?)
    }

    pub fn current_date(&self) -> std::result::Result<NaiveDate, StoreError> {
        self.with_connection(get_current_date)
    }

    pub fn advance_day(&self) -> std::result::Result<NaiveDate, StoreError> {
        let next_day = self.with_connection(advance_day)?;
        info!("Simulated date advanced to {}", next_day);
        Ok(next_day)
    }

    pub fn all_cards(&self, user_id: UserId) -> std::result::Result<Vec<Card>, StoreError> {
        self.with_connection(|conn| get_cards(user_id, conn))
    }
}

impl CardStore for SqliteStore {
    fn fetch_due(&self, user_id: UserId, today: NaiveDate) -> std::result::Result<Vec<Card>, StoreError> {
        let cards = self.with_connection(|conn| get_cards_due(user_id, today, conn))?;
        let due = select_due(cards, today);
        debug!("{} cards due for user {} on {}", due.len(), user_id, today);
        Ok(due)
    }

    fn update_scheduling(
        &self,
        user_id: UserId,
        card_id: CardId,
        state: &SchedulingState,
    ) -> std::result::Result<(), StoreError> {
        let updated = self.with_connection(|conn| {
            conn.execute(
                "UPDATE flashcards
                 SET ease_factor = ?1, interval_days = ?2, review_count = ?3, next_review_date = ?4
                 WHERE id = ?5 AND user_id = ?6",
                params![
                    state.ease_factor,
                    state.interval_days,
                    state.review_count,
                    state.next_review_date,
                    card_id,
                    user_id
                ],
            )
        })?;

        if updated == 0 {
            return Err(StoreError::CardNotFound(card_id));
        }
        Ok(())
    }
}

impl SessionLog for SqliteStore {
    fn append(&self, user_id: UserId, entry: &SessionLogEntry) -> std::result::Result<(), StoreError> {
        self.with_connection(|conn| insert_log_entry(user_id, entry, conn))
    }

    fn entries(&self, user_id: UserId) -> std::result::Result<Vec<SessionLogEntry>, StoreError> {
        self.with_connection(|conn| {
            let mut stmt = conn.prepare(
                "SELECT flashcard_id, rating, studied_at, review_number
                 FROM study_sessions WHERE user_id = ?1 ORDER BY studied_at, id",
            )?;

            let entries = stmt
                .query_map(params![user_id], |row| {
                    Ok(SessionLogEntry {
                        card_id: row.get(0)?,
                        rating: row.get(1)?,
                        timestamp: row.get(2)?,
                        review_number: row.get(3)?,
                    })
                })?
                .collect::<Result<Vec<_>>>()?;

            Ok(entries)
        })
    }
}

impl ReviewStore for SqliteStore {
    /// Writes the card update and the log entry in one transaction.
    ///
    /// The update only applies while the card still has the review count it
    /// was shown with. If it has already moved on by exactly this attempt and
    /// the log holds the same review with the same rating, an earlier call
    /// went through and this one is accepted without writing anything again.
    /// A different rating for an already saved review is a conflict.
    fn commit_review(&self, user_id: UserId, commit: &ReviewCommit) -> std::result::Result<(), StoreError> {
        let mut conn = self.lock()?;
        let tx = conn.transaction()?;

        let state = &commit.state;
        let updated = tx.execute(
            "UPDATE flashcards
             SET ease_factor = ?1, interval_days = ?2, review_count = ?3, next_review_date = ?4
             WHERE id = ?5 AND user_id = ?6 AND review_count = ?7",
            params![
                state.ease_factor,
                state.interval_days,
                state.review_count,
                state.next_review_date,
                commit.card_id,
                user_id,
                commit.expected_review_count
            ],
        )?;

        if updated == 0 {
            return match get_review_count(user_id, commit.card_id, &tx)? {
                None => Err(StoreError::CardNotFound(commit.card_id)),
                Some(found)
                    if found == state.review_count
                        && log_contains(user_id, &commit.entry, &tx)? =>
                {
                    info!(
                        "Review {} of card {} was already saved, skipping duplicate write",
                        commit.entry.review_number, commit.card_id
                    );
                    Ok(())
                }
                Some(found) => {
                    warn!(
                        "Card {} has review count {}, expected {}",
                        commit.card_id, found, commit.expected_review_count
                    );
                    Err(StoreError::Conflict {
                        card_id: commit.card_id,
                        expected: commit.expected_review_count,
                        found,
                    })
                }
            };
        }

        insert_log_entry(user_id, &commit.entry, &tx)?;
        tx.commit()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDateTime;

    const USER: UserId = 1;

    fn store() -> SqliteStore {
        SqliteStore::open_in_memory().unwrap()
    }

    fn seed(store: &SqliteStore, fronts: &[&str]) -> Vec<CardId> {
        store
            .with_connection(|conn| {
                new_subject(USER, "Polish", conn)?;
                fronts
                    .iter()
                    .map(|front| add_flashcard(USER, Some("Polish"), front, "answer", conn))
                    .collect()
            })
            .unwrap()
    }

    fn reviewed_at(day: NaiveDate) -> NaiveDateTime {
        day.and_hms_opt(20, 0, 0).unwrap()
    }

    fn commit_for(card: &Card, rating: Rating, today: NaiveDate) -> ReviewCommit {
        let state = crate::models::sm2::transition(&card.scheduling, rating, today);
        ReviewCommit {
            card_id: card.id,
            expected_review_count: card.scheduling.review_count,
            entry: SessionLogEntry {
                card_id: card.id,
                rating,
                timestamp: reviewed_at(today),
                review_number: state.review_count,
            },
            state,
        }
    }

    #[test]
    fn test_new_cards_are_due_today_with_defaults() {
        let store = store();
        let ids = seed(&store, &["cześć", "dziękuję", "proszę"]);
        let today = store.current_date().unwrap();

        let due = store.fetch_due(USER, today).unwrap();
        assert_eq!(due.iter().map(|c| c.id).collect::<Vec<_>>(), ids);

        let card = &due[0];
        assert_eq!(card.subject.as_deref(), Some("Polish"));
        assert_eq!(card.scheduling, SchedulingState::new(today));
    }

    #[test]
    fn test_cards_are_scoped_by_user() {
        let store = store();
        let ids = seed(&store, &["cześć"]);
        let today = store.current_date().unwrap();

        assert!(store.fetch_due(2, today).unwrap().is_empty());

        let result = store.update_scheduling(2, ids[0], &SchedulingState::new(today));
        assert!(matches!(result, Err(StoreError::CardNotFound(id)) if id == ids[0]));
    }

    #[test]
    fn test_commit_review_updates_card_and_log() {
        let store = store();
        seed(&store, &["cześć"]);
        let today = store.current_date().unwrap();
        let card = store.fetch_due(USER, today).unwrap().remove(0);

        store
            .commit_review(USER, &commit_for(&card, Rating::Easy, today))
            .unwrap();

        let saved = store.all_cards(USER).unwrap().remove(0);
        assert_eq!(saved.scheduling.interval_days, 4);
        assert_eq!(saved.scheduling.review_count, 1);
        assert!((saved.scheduling.ease_factor - 2.18).abs() < 1e-9);
        assert!(store.fetch_due(USER, today).unwrap().is_empty());

        let entries = store.entries(USER).unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].rating, Rating::Easy);
        assert_eq!(entries[0].review_number, 1);
        assert_eq!(entries[0].timestamp, reviewed_at(today));
    }

    #[test]
    fn test_retried_commit_is_not_counted_twice() {
        let store = store();
        seed(&store, &["cześć"]);
        let today = store.current_date().unwrap();
        let card = store.fetch_due(USER, today).unwrap().remove(0);
        let commit = commit_for(&card, Rating::Medium, today);

        store.commit_review(USER, &commit).unwrap();
        store.commit_review(USER, &commit).unwrap();

        assert_eq!(store.entries(USER).unwrap().len(), 1);
        assert_eq!(store.all_cards(USER).unwrap()[0].scheduling.review_count, 1);
    }

    #[test]
    fn test_stale_commit_is_a_conflict() {
        let store = store();
        seed(&store, &["cześć"]);
        let today = store.current_date().unwrap();
        let card = store.fetch_due(USER, today).unwrap().remove(0);

        store
            .commit_review(USER, &commit_for(&card, Rating::Hard, today))
            .unwrap();
        let reviewed = store.all_cards(USER).unwrap().remove(0);
        store
            .commit_review(USER, &commit_for(&reviewed, Rating::Hard, today))
            .unwrap();

        // Built from the card as it was before both reviews.
        let stale = commit_for(&card, Rating::Easy, today);
        let result = store.commit_review(USER, &stale);
        assert!(matches!(
            result,
            Err(StoreError::Conflict { expected: 0, found: 2, .. })
        ));
        assert_eq!(store.entries(USER).unwrap().len(), 2);
    }

    #[test]
    fn test_retry_with_other_rating_is_a_conflict() {
        let store = store();
        seed(&store, &["cześć"]);
        let today = store.current_date().unwrap();
        let card = store.fetch_due(USER, today).unwrap().remove(0);

        store
            .commit_review(USER, &commit_for(&card, Rating::Hard, today))
            .unwrap();
        let result = store.commit_review(USER, &commit_for(&card, Rating::Easy, today));

        assert!(matches!(
            result,
            Err(StoreError::Conflict { expected: 0, found: 1, .. })
        ));
        let entries = store.entries(USER).unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].rating, Rating::Hard);
    }

    #[test]
    fn test_failed_log_insert_rolls_back_card_update() {
        let store = store();
        seed(&store, &["cześć"]);
        let today = store.current_date().unwrap();
        let card = store.fetch_due(USER, today).unwrap().remove(0);

        // Occupies the (card, review number) slot the commit will need.
        store
            .with_connection(|conn| {
                conn.execute(
                    "INSERT INTO study_sessions (user_id, flashcard_id, rating, review_number, studied_at)
                     VALUES (?1, ?2, 'hard', 1, '2024-01-01 10:00:00')",
                    params![USER, card.id],
                )
            })
            .unwrap();

        let result = store.commit_review(USER, &commit_for(&card, Rating::Easy, today));
        assert!(matches!(result, Err(StoreError::Sqlite(_))));

        let saved = store.all_cards(USER).unwrap().remove(0);
        assert_eq!(saved.scheduling, card.scheduling);
        assert_eq!(store.entries(USER).unwrap().len(), 1);
    }

    #[test]
    fn test_commit_for_deleted_card_is_not_found() {
        let store = store();
        let ids = seed(&store, &["cześć"]);
        let today = store.current_date().unwrap();
        let card = store.fetch_due(USER, today).unwrap().remove(0);

        assert!(store.with_connection(|conn| delete_flashcard(USER, ids[0], conn)).unwrap());

        let result = store.commit_review(USER, &commit_for(&card, Rating::Easy, today));
        assert!(matches!(result, Err(StoreError::CardNotFound(_))));
        assert!(store.entries(USER).unwrap().is_empty());
    }

    #[test]
    fn test_advance_day_brings_cards_back() {
        let store = store();
        seed(&store, &["cześć"]);
        let today = store.current_date().unwrap();
        let card = store.fetch_due(USER, today).unwrap().remove(0);
        store
            .commit_review(USER, &commit_for(&card, Rating::Hard, today))
            .unwrap();

        assert!(store.fetch_due(USER, today).unwrap().is_empty());
        let tomorrow = store.advance_day().unwrap();
        assert_eq!(tomorrow, today.succ_opt().unwrap());
        assert_eq!(store.current_date().unwrap(), tomorrow);
        assert_eq!(store.fetch_due(USER, tomorrow).unwrap().len(), 1);
    }

    #[test]
    fn test_rating_column_rejects_unknown_values() {
        let store = store();
        let result = store.with_connection(|conn| {
            conn.execute(
                "INSERT INTO study_sessions (user_id, flashcard_id, rating, review_number, studied_at)
                 VALUES (1, 1, 'again', 1, '2024-01-01 10:00:00')",
                [],
            )
        });
        assert!(result.is_err());
    }

    #[test]
    fn test_database_file_persists_between_opens() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("studyflow.sqlite3");

        let id = {
            let store = SqliteStore::open(&path).unwrap();
            seed(&store, &["cześć"])[0]
        };

        let reopened = SqliteStore::open(&path).unwrap();
        let cards = reopened.all_cards(USER).unwrap();
        assert_eq!(cards.len(), 1);
        assert_eq!(cards[0].id, id);
        assert_eq!(cards[0].front, "cześć");
    }
}
