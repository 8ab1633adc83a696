//! Database module for railbot
//!
//! Provides persistence for sessions, their transcripts, and the
//! profiles collected by completed waterfalls.

mod schema;

pub use schema::*;

use crate::dialog::state::Intent;
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection};
use std::path::Path;
use std::sync::{Arc, Mutex};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DbError {
    #[error("Database error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("Session not found: {0}")]
    SessionNotFound(String),
    #[error("Slug already exists: {0}")]
    SlugExists(String),
}

pub type DbResult<T> = Result<T, DbError>;

/// Thread-safe database handle
#[derive(Clone)]
pub struct Database {
    conn: Arc<Mutex<Connection>>,
}

impl Database {
    /// Open or create database at the given path
    pub fn open<P: AsRef<Path>>(path: P) -> DbResult<Self> {
        let conn = Connection::open(path)?;
        let db = Self {
            conn: Arc::new(Mutex::new(conn)),
        };
        db.init_schema()?;
        Ok(db)
    }

    /// Open an in-memory database (for testing)
    #[allow(dead_code)] // Used in tests
    pub fn open_in_memory() -> DbResult<Self> {
        let conn = Connection::open_in_memory()?;
        let db = Self {
            conn: Arc::new(Mutex::new(conn)),
        };
        db.init_schema()?;
        Ok(db)
    }

    fn init_schema(&self) -> DbResult<()> {
        let conn = self.conn.lock().unwrap();
        conn.execute_batch(SCHEMA)?;
        Ok(())
    }

    // ==================== Session Operations ====================

    /// Create a new session
    pub fn create_session(&self, id: &str, slug: &str) -> DbResult<Session> {
        let conn = self.conn.lock().unwrap();
        let now = Utc::now();
        let fresh_state = serde_json::to_string(&DialogState::Fresh).unwrap();

        conn.execute(
            "INSERT INTO sessions (id, slug, state, state_updated_at, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?4, ?4)",
            params![id, slug, fresh_state, now.to_rfc3339()],
        )?;

        Ok(Session {
            id: id.to_string(),
            slug: Some(slug.to_string()),
            state: DialogState::Fresh,
            state_updated_at: now,
            created_at: now,
            updated_at: now,
            turn_count: 0,
        })
    }

    /// Get session by ID
    pub fn get_session(&self, id: &str) -> DbResult<Session> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(
            "SELECT s.id, s.slug, s.state, s.state_updated_at, s.created_at, s.updated_at,
                    (SELECT COUNT(*) FROM turns t WHERE t.session_id = s.id) as turn_count
             FROM sessions s WHERE s.id = ?1",
        )?;

        stmt.query_row(params![id], parse_session_row)
            .map_err(|e| match e {
                rusqlite::Error::QueryReturnedNoRows => DbError::SessionNotFound(id.to_string()),
                other => DbError::Sqlite(other),
            })
    }

    /// Get session by slug
    pub fn get_session_by_slug(&self, slug: &str) -> DbResult<Session> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(
            "SELECT s.id, s.slug, s.state, s.state_updated_at, s.created_at, s.updated_at,
                    (SELECT COUNT(*) FROM turns t WHERE t.session_id = s.id) as turn_count
             FROM sessions s WHERE s.slug = ?1",
        )?;

        stmt.query_row(params![slug], parse_session_row)
            .map_err(|e| match e {
                rusqlite::Error::QueryReturnedNoRows => DbError::SessionNotFound(slug.to_string()),
                other => DbError::Sqlite(other),
            })
    }

    /// List sessions, most recently active first
    pub fn list_sessions(&self) -> DbResult<Vec<Session>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(
            "SELECT s.id, s.slug, s.state, s.state_updated_at, s.created_at, s.updated_at,
                    (SELECT COUNT(*) FROM turns t WHERE t.session_id = s.id) as turn_count
             FROM sessions s
             ORDER BY s.updated_at DESC",
        )?;

        let rows = stmt.query_map([], parse_session_row)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(DbError::from)
    }

    /// Update session dialog state
    pub fn update_session_state(&self, id: &str, state: &DialogState) -> DbResult<()> {
        let conn = self.conn.lock().unwrap();
        let now = Utc::now();
        let state_json = serde_json::to_string(state).unwrap();

        let updated = conn.execute(
            "UPDATE sessions SET state = ?1, state_updated_at = ?2, updated_at = ?2 WHERE id = ?3",
            params![state_json, now.to_rfc3339(), id],
        )?;

        if updated == 0 {
            return Err(DbError::SessionNotFound(id.to_string()));
        }
        Ok(())
    }

    /// Rename session (update slug)
    pub fn rename_session(&self, id: &str, new_slug: &str) -> DbResult<()> {
        let conn = self.conn.lock().unwrap();
        let now = Utc::now();

        let exists: bool = conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM sessions WHERE slug = ?1 AND id != ?2)",
            params![new_slug, id],
            |row| row.get(0),
        )?;

        if exists {
            return Err(DbError::SlugExists(new_slug.to_string()));
        }

        let updated = conn.execute(
            "UPDATE sessions SET slug = ?1, updated_at = ?2 WHERE id = ?3",
            params![new_slug, now.to_rfc3339(), id],
        )?;

        if updated == 0 {
            return Err(DbError::SessionNotFound(id.to_string()));
        }
        Ok(())
    }

    /// Delete a session, its transcript, and its profiles
    pub fn delete_session(&self, id: &str) -> DbResult<()> {
        let conn = self.conn.lock().unwrap();

        conn.execute("DELETE FROM turns WHERE session_id = ?1", params![id])?;
        conn.execute("DELETE FROM profiles WHERE session_id = ?1", params![id])?;
        let deleted = conn.execute("DELETE FROM sessions WHERE id = ?1", params![id])?;

        if deleted == 0 {
            return Err(DbError::SessionNotFound(id.to_string()));
        }
        Ok(())
    }

    // ==================== Turn Operations ====================

    /// Append a turn to a session transcript
    pub fn add_turn(
        &self,
        turn_id: &str,
        session_id: &str,
        sender: Sender,
        body: &str,
    ) -> DbResult<Turn> {
        let conn = self.conn.lock().unwrap();
        let now = Utc::now();

        // Next sequence ID within this session
        let sequence_id: i64 = conn.query_row(
            "SELECT COALESCE(MAX(sequence_id), 0) + 1 FROM turns WHERE session_id = ?1",
            params![session_id],
            |row| row.get(0),
        )?;

        conn.execute(
            "INSERT INTO turns (turn_id, session_id, sequence_id, sender, body, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                turn_id,
                session_id,
                sequence_id,
                sender.to_string(),
                body,
                now.to_rfc3339(),
            ],
        )?;

        // Keep the session ordering current
        conn.execute(
            "UPDATE sessions SET updated_at = ?1 WHERE id = ?2",
            params![now.to_rfc3339(), session_id],
        )?;

        Ok(Turn {
            turn_id: turn_id.to_string(),
            session_id: session_id.to_string(),
            sequence_id,
            sender,
            body: body.to_string(),
            created_at: now,
        })
    }

    /// Get the transcript for a session
    pub fn get_turns(&self, session_id: &str) -> DbResult<Vec<Turn>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(
            "SELECT turn_id, session_id, sequence_id, sender, body, created_at
             FROM turns WHERE session_id = ?1 ORDER BY sequence_id ASC",
        )?;

        let rows = stmt.query_map(params![session_id], parse_turn_row)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(DbError::from)
    }

    /// Get turns after a sequence ID
    pub fn get_turns_after(&self, session_id: &str, after_sequence: i64) -> DbResult<Vec<Turn>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(
            "SELECT turn_id, session_id, sequence_id, sender, body, created_at
             FROM turns WHERE session_id = ?1 AND sequence_id > ?2 ORDER BY sequence_id ASC",
        )?;

        let rows = stmt.query_map(params![session_id, after_sequence], parse_turn_row)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(DbError::from)
    }

    /// Get the last sequence ID for a session
    pub fn get_last_sequence_id(&self, session_id: &str) -> DbResult<i64> {
        let conn = self.conn.lock().unwrap();
        conn.query_row(
            "SELECT COALESCE(MAX(sequence_id), 0) FROM turns WHERE session_id = ?1",
            params![session_id],
            |row| row.get(0),
        )
        .map_err(DbError::from)
    }

    // ==================== Profile Operations ====================

    /// Record what a completed waterfall collected
    pub fn add_profile(
        &self,
        profile_id: &str,
        session_id: &str,
        intent: Intent,
        client: Option<&str>,
    ) -> DbResult<Profile> {
        let conn = self.conn.lock().unwrap();
        let now = Utc::now();

        conn.execute(
            "INSERT INTO profiles (profile_id, session_id, intent, client, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                profile_id,
                session_id,
                intent.to_string(),
                client,
                now.to_rfc3339(),
            ],
        )?;

        Ok(Profile {
            profile_id: profile_id.to_string(),
            session_id: session_id.to_string(),
            intent,
            client: client.map(String::from),
            created_at: now,
        })
    }

    /// Get profiles collected in a session, oldest first
    pub fn get_profiles(&self, session_id: &str) -> DbResult<Vec<Profile>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(
            "SELECT profile_id, session_id, intent, client, created_at
             FROM profiles WHERE session_id = ?1 ORDER BY created_at ASC",
        )?;

        let rows = stmt.query_map(params![session_id], |row| {
            Ok(Profile {
                profile_id: row.get(0)?,
                session_id: row.get(1)?,
                intent: parse_intent(&row.get::<_, String>(2)?),
                client: row.get(3)?,
                created_at: parse_datetime(&row.get::<_, String>(4)?),
            })
        })?;
        rows.collect::<Result<Vec<_>, _>>().map_err(DbError::from)
    }
}

/// Parse a session row from the database
fn parse_session_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Session> {
    let state_json: String = row.get(2)?;
    let state: DialogState = serde_json::from_str(&state_json).unwrap_or_default();
    Ok(Session {
        id: row.get(0)?,
        slug: row.get(1)?,
        state,
        state_updated_at: parse_datetime(&row.get::<_, String>(3)?),
        created_at: parse_datetime(&row.get::<_, String>(4)?),
        updated_at: parse_datetime(&row.get::<_, String>(5)?),
        turn_count: row.get(6)?,
    })
}

/// Parse a turn row from the database
fn parse_turn_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Turn> {
    Ok(Turn {
        turn_id: row.get(0)?,
        session_id: row.get(1)?,
        sequence_id: row.get(2)?,
        sender: parse_sender(&row.get::<_, String>(3)?),
        body: row.get(4)?,
        created_at: parse_datetime(&row.get::<_, String>(5)?),
    })
}

fn parse_sender(s: &str) -> Sender {
    match s {
        "user" => Sender::User,
        _ => Sender::Bot,
    }
}

fn parse_intent(s: &str) -> Intent {
    Intent::from_label(s).unwrap_or(Intent::Architecture)
}

fn parse_datetime(s: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(s).map_or_else(|_| Utc::now(), |dt| dt.with_timezone(&Utc))
}
