//! SQLite-backed concept store
//!
//! Handles database initialization, concept CRUD with optimistic versioning,
//! due-set queries, and the persisted simulated "current date".

use super::store::ConceptStore;
use crate::error::{Error, Result, StorageError};
use crate::models::{Concept, ConceptId, NewConcept, OwnerId, ReviewState, Session};
use chrono::{DateTime, Days, SubsecRound, Utc};
use rusqlite::{Connection, OptionalExtension, Row, params};
use std::path::Path;

const CONCEPT_COLUMNS: &str = "id, owner_id, name, learned_at, easiness_factor, revision_interval, \
     repetitions, next_revision_at, last_reviewed_at, version";

pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    /// Opens (or creates) the database file and makes sure the schema exists.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let store = Self {
            conn: Connection::open(path.as_ref())?,
        };
        store.init()?;
        log::debug!("opened concept database {}", path.as_ref().display());
        Ok(store)
    }

    pub fn open_in_memory() -> Result<Self> {
        let store = Self {
            conn: Connection::open_in_memory()?,
        };
        store.init()?;
        Ok(store)
    }

    /// Creates tables for concepts and app state.
    /// Sets the current date to now if not already initialized.
    fn init(&self) -> Result<()> {
        // Create concepts table; scheduling state lives on the concept row
        self.conn.execute(
            "CREATE TABLE IF NOT EXISTS concepts (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                owner_id TEXT NOT NULL,
                name TEXT NOT NULL,
                learned_at INTEGER NOT NULL,
                easiness_factor REAL NOT NULL DEFAULT 2.5,
                revision_interval INTEGER NOT NULL DEFAULT 1,
                repetitions INTEGER NOT NULL DEFAULT 0,
                next_revision_at INTEGER NOT NULL,
                last_reviewed_at INTEGER,
                version INTEGER NOT NULL DEFAULT 0
            )",
            (),
        )?;

        // Index for due-set queries
        self.conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_concepts_due
             ON concepts (owner_id, next_revision_at, id)",
            (),
        )?;

        // Create app_state table for storing current date
        self.conn.execute(
            "CREATE TABLE IF NOT EXISTS app_state (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL
            )",
            (),
        )?;

        // Initialize current_date if not exists
        let today = Utc::now().trunc_subsecs(0).timestamp();
        self.conn.execute(
            "INSERT OR IGNORE INTO app_state (key, value) VALUES ('current_date', ?1)",
            params![today.to_string()],
        )?;

        Ok(())
    }

    /// Retrieves the simulated current date.
    pub fn current_date(&self) -> Result<DateTime<Utc>> {
        let value: String = self.conn.query_row(
            "SELECT value FROM app_state WHERE key = 'current_date'",
            [],
            |row| row.get(0),
        )?;

        let secs = value
            .parse::<i64>()
            .map_err(|_| StorageError::Corrupt(format!("current_date '{value}'")))?;
        from_timestamp(secs)
    }

    pub fn set_current_date(&self, date: DateTime<Utc>) -> Result<()> {
        self.conn.execute(
            "UPDATE app_state SET value = ?1 WHERE key = 'current_date'",
            params![date.timestamp().to_string()],
        )?;
        Ok(())
    }

    /// Advances the simulated current date by one day and returns the new date.
    pub fn advance_day(&self) -> Result<DateTime<Utc>> {
        let next_day = self
            .current_date()?
            .checked_add_days(Days::new(1))
            .ok_or_else(|| StorageError::Corrupt("current_date out of range".to_string()))?;
        self.set_current_date(next_day)?;
        log::info!("current date advanced to {}", next_day.format("%Y-%m-%d"));
        Ok(next_day)
    }

    fn query_concepts(
        &self,
        sql: &str,
        params: impl rusqlite::Params,
    ) -> Result<Vec<Concept>> {
        let mut stmt = self.conn.prepare(sql)?;
        let rows = stmt
            .query_map(params, ConceptRow::from_row)?
            .collect::<rusqlite::Result<Vec<ConceptRow>>>()?;

        rows.into_iter().map(ConceptRow::into_concept).collect()
    }
}

impl ConceptStore for SqliteStore {
    fn insert(&self, session: &Session, concept: NewConcept) -> Result<Concept> {
        let id = insert_concept(&self.conn, session, &concept)?;
        log::info!("concept {} '{}' created for {}", id, concept.name, session.owner);
        self.load(session, id)
    }

    fn insert_all(&self, session: &Session, concepts: Vec<NewConcept>) -> Result<Vec<Concept>> {
        // Rolled back on drop unless committed.
        let tx = self.conn.unchecked_transaction()?;
        let mut ids = Vec::with_capacity(concepts.len());
        for concept in &concepts {
            ids.push(insert_concept(&tx, session, concept)?);
        }
        tx.commit()?;

        log::info!("{} concept(s) created for {}", ids.len(), session.owner);
        ids.into_iter().map(|id| self.load(session, id)).collect()
    }

    fn load(&self, session: &Session, id: ConceptId) -> Result<Concept> {
        let sql = format!("SELECT {CONCEPT_COLUMNS} FROM concepts WHERE id = ?1 AND owner_id = ?2");
        let row = self
            .conn
            .query_row(&sql, params![id.0, session.owner.0], ConceptRow::from_row)
            .optional()?
            .ok_or(StorageError::NotFound(id))?;
        row.into_concept()
    }

    fn save(
        &self,
        session: &Session,
        id: ConceptId,
        expected_version: i64,
        state: &ReviewState,
    ) -> Result<()> {
        let updated = self.conn.execute(
            "UPDATE concepts
             SET easiness_factor = ?1, revision_interval = ?2, repetitions = ?3,
                 next_revision_at = ?4, last_reviewed_at = ?5, version = version + 1
             WHERE id = ?6 AND owner_id = ?7 AND version = ?8",
            params![
                state.easiness_factor,
                state.revision_interval,
                state.repetitions,
                state.next_revision_at.timestamp(),
                state.last_reviewed_at.map(|t| t.timestamp()),
                id.0,
                session.owner.0,
                expected_version,
            ],
        )?;

        if updated == 1 {
            return Ok(());
        }

        // Nothing matched: either the row is gone or someone else bumped the version.
        let exists = self
            .conn
            .query_row(
                "SELECT 1 FROM concepts WHERE id = ?1 AND owner_id = ?2",
                params![id.0, session.owner.0],
                |_| Ok(()),
            )
            .optional()?
            .is_some();

        if exists {
            Err(Error::StaleState(id))
        } else {
            Err(StorageError::NotFound(id).into())
        }
    }

    fn list_due(&self, session: &Session, now: DateTime<Utc>) -> Result<Vec<Concept>> {
        let sql = format!(
            "SELECT {CONCEPT_COLUMNS} FROM concepts
             WHERE owner_id = ?1 AND next_revision_at <= ?2
             ORDER BY next_revision_at ASC, id ASC"
        );
        self.query_concepts(&sql, params![session.owner.0, now.timestamp()])
    }

    fn list_all(&self, session: &Session) -> Result<Vec<Concept>> {
        let sql = format!("SELECT {CONCEPT_COLUMNS} FROM concepts WHERE owner_id = ?1 ORDER BY id");
        self.query_concepts(&sql, params![session.owner.0])
    }
}

/// Raw column values; timestamps are converted once the row is out of rusqlite.
struct ConceptRow {
    id: i64,
    owner_id: String,
    name: String,
    learned_at: i64,
    easiness_factor: f64,
    revision_interval: i32,
    repetitions: i32,
    next_revision_at: i64,
    last_reviewed_at: Option<i64>,
    version: i64,
}

impl ConceptRow {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            owner_id: row.get(1)?,
            name: row.get(2)?,
            learned_at: row.get(3)?,
            easiness_factor: row.get(4)?,
            revision_interval: row.get(5)?,
            repetitions: row.get(6)?,
            next_revision_at: row.get(7)?,
            last_reviewed_at: row.get(8)?,
            version: row.get(9)?,
        })
    }

    fn into_concept(self) -> Result<Concept> {
        Ok(Concept {
            id: ConceptId(self.id),
            owner: OwnerId(self.owner_id),
            name: self.name,
            learned_at: from_timestamp(self.learned_at)?,
            state: ReviewState {
                easiness_factor: self.easiness_factor,
                revision_interval: self.revision_interval,
                repetitions: self.repetitions,
                next_revision_at: from_timestamp(self.next_revision_at)?,
                last_reviewed_at: self.last_reviewed_at.map(from_timestamp).transpose()?,
            },
            version: self.version,
        })
    }
}

fn insert_concept(conn: &Connection, session: &Session, concept: &NewConcept) -> Result<ConceptId> {
    let state = &concept.state;
    conn.execute(
        "INSERT INTO concepts (owner_id, name, learned_at, easiness_factor, revision_interval,
                               repetitions, next_revision_at, last_reviewed_at, version)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, 0)",
        params![
            session.owner.0,
            concept.name,
            concept.learned_at.timestamp(),
            state.easiness_factor,
            state.revision_interval,
            state.repetitions,
            state.next_revision_at.timestamp(),
            state.last_reviewed_at.map(|t| t.timestamp()),
        ],
    )?;
    Ok(ConceptId(conn.last_insert_rowid()))
}

fn from_timestamp(secs: i64) -> Result<DateTime<Utc>> {
    DateTime::from_timestamp(secs, 0)
        .ok_or_else(|| StorageError::Corrupt(format!("timestamp {secs} out of range")).into())
}
