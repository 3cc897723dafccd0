//! SQLite-based touchpoint storage.
//!
//! One row per touchpoint. Timestamps are stored as RFC 3339 UTC strings;
//! enums as their lowercase labels.

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;

use super::data_dir;
use super::migrations;
use super::store::TouchpointStore;
use crate::error::{CoreError, PersistenceError, ValidationError};
use crate::touchpoint::{Category, PreferredAction, TouchpointId, TouchpointRecord};

const SELECT_COLUMNS: &str = "id, name, channel, cadence_days, last_contact_at,
                              preferred_action, category, created_at";

// === Helper Functions ===

fn invalid_label(column: usize, field: &str, value: &str) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(
        column,
        rusqlite::types::Type::Text,
        Box::new(ValidationError::InvalidValue {
            field: field.to_string(),
            message: format!("unknown stored label '{value}'"),
        }),
    )
}

/// Parse preferred action from its stored label
fn parse_action(column: usize, action_str: &str) -> Result<PreferredAction, rusqlite::Error> {
    match action_str {
        "message" => Ok(PreferredAction::Message),
        "call" => Ok(PreferredAction::Call),
        "meet_up" => Ok(PreferredAction::MeetUp),
        other => Err(invalid_label(column, "preferred_action", other)),
    }
}

/// Parse category from its stored label; NULL means uncategorised
fn parse_category(
    column: usize,
    category_str: Option<&str>,
) -> Result<Option<Category>, rusqlite::Error> {
    match category_str {
        None => Ok(None),
        Some("personal") => Ok(Some(Category::Personal)),
        Some("business") => Ok(Some(Category::Business)),
        Some(other) => Err(invalid_label(column, "category", other)),
    }
}

fn parse_datetime(column: usize, value: &str) -> Result<DateTime<Utc>, rusqlite::Error> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(
                column,
                rusqlite::types::Type::Text,
                Box::new(e),
            )
        })
}

/// Build a TouchpointRecord from a row selected with `SELECT_COLUMNS`
fn row_to_record(row: &rusqlite::Row) -> Result<TouchpointRecord, rusqlite::Error> {
    let last_contact_str: String = row.get(4)?;
    let action_str: String = row.get(5)?;
    let category_str: Option<String> = row.get(6)?;
    let created_str: String = row.get(7)?;

    Ok(TouchpointRecord {
        id: TouchpointId::from(row.get::<_, String>(0)?),
        name: row.get(1)?,
        channel: row.get(2)?,
        cadence_days: row.get(3)?,
        last_contact_at: parse_datetime(4, &last_contact_str)?,
        preferred_action: parse_action(5, &action_str)?,
        category: parse_category(6, category_str.as_deref())?,
        created_at: parse_datetime(7, &created_str)?,
    })
}

/// SQLite database for touchpoint storage.
pub struct TouchpointDb {
    conn: Connection,
}

impl TouchpointDb {
    /// Open the database at `<data_dir>/tchpnt.db`.
    ///
    /// Creates the database file and schema if they don't exist.
    ///
    /// # Errors
    /// Returns an error if the database cannot be opened or migrated.
    pub fn open() -> Result<Self, CoreError> {
        let path = data_dir()?.join("tchpnt.db");
        Ok(Self::open_at(&path)?)
    }

    /// Open (or create) a database file at an explicit path.
    pub fn open_at(path: &Path) -> Result<Self, PersistenceError> {
        let conn = Connection::open(path).map_err(|source| PersistenceError::OpenFailed {
            path: path.to_path_buf(),
            source,
        })?;
        Self::with_connection(conn)
    }

    /// Open an in-memory database (for tests).
    pub fn open_memory() -> Result<Self, PersistenceError> {
        let conn = Connection::open_in_memory().map_err(|source| PersistenceError::OpenFailed {
            path: ":memory:".into(),
            source,
        })?;
        Self::with_connection(conn)
    }

    fn with_connection(conn: Connection) -> Result<Self, PersistenceError> {
        migrations::migrate(&conn)
            .map_err(|e| PersistenceError::MigrationFailed(e.to_string()))?;
        Ok(Self { conn })
    }

    /// Get a reference to the underlying SQLite connection.
    pub fn conn(&self) -> &Connection {
        &self.conn
    }
}

impl TouchpointStore for TouchpointDb {
    fn list(&self) -> Result<Vec<TouchpointRecord>, PersistenceError> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {SELECT_COLUMNS} FROM touchpoints ORDER BY created_at, id"
        ))?;
        let rows = stmt.query_map([], row_to_record)?;
        let mut records = Vec::new();
        for row in rows {
            records.push(row?);
        }
        Ok(records)
    }

    fn get(&self, id: &TouchpointId) -> Result<Option<TouchpointRecord>, PersistenceError> {
        let record = self
            .conn
            .query_row(
                &format!("SELECT {SELECT_COLUMNS} FROM touchpoints WHERE id = ?1"),
                params![id.as_str()],
                row_to_record,
            )
            .optional()?;
        Ok(record)
    }

    fn insert(&mut self, record: &TouchpointRecord) -> Result<(), PersistenceError> {
        self.conn.execute(
            "INSERT INTO touchpoints (id, name, channel, cadence_days, last_contact_at,
                                      preferred_action, category, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            params![
                record.id.as_str(),
                record.name,
                record.channel,
                record.cadence_days,
                record.last_contact_at.to_rfc3339(),
                record.preferred_action.as_str(),
                record.category.map(|c| c.as_str()),
                record.created_at.to_rfc3339(),
            ],
        )?;
        Ok(())
    }

    fn reset(
        &mut self,
        id: &TouchpointId,
        at: DateTime<Utc>,
    ) -> Result<TouchpointRecord, PersistenceError> {
        let changed = self.conn.execute(
            "UPDATE touchpoints SET last_contact_at = ?1 WHERE id = ?2",
            params![at.to_rfc3339(), id.as_str()],
        )?;
        if changed == 0 {
            return Err(PersistenceError::NotFound(id.to_string()));
        }
        self.get(id)?
            .ok_or_else(|| PersistenceError::NotFound(id.to_string()))
    }

    fn delete(&mut self, id: &TouchpointId) -> Result<TouchpointRecord, PersistenceError> {
        let tx = self.conn.transaction()?;
        let record = tx
            .query_row(
                &format!("SELECT {SELECT_COLUMNS} FROM touchpoints WHERE id = ?1"),
                params![id.as_str()],
                row_to_record,
            )
            .optional()?
            .ok_or_else(|| PersistenceError::NotFound(id.to_string()))?;
        tx.execute("DELETE FROM touchpoints WHERE id = ?1", params![id.as_str()])?;
        tx.commit()?;
        Ok(record)
    }
}
