//! Sessions as records in an embedded sqlite database
//!
//! One row per session in `sessions`, plus one row per encoded sheet in
//! `session_sheets`. A save replaces every row of the session inside a
//! single transaction.

use std::path::{Path, PathBuf};

use chrono::{Local, NaiveDateTime};
use rusqlite::{params, Connection, OptionalExtension};

use crate::core::session::{SessionMeta, SessionSummary};
use crate::core::store::ValueStore;
use crate::core::value::TIMESTAMP_FORMAT;
use crate::persist::book::{Sheet, SheetBook};
use crate::persist::{codec, sort_newest_first, LoadOutcome, PersistError, PersistenceAdapter, SaveReceipt};

/// Default database file name inside the sessions directory
pub const DB_FILE: &str = "sessions.db";

#[derive(Debug, Clone)]
pub struct SqliteStore {
    path: PathBuf,
}

impl SqliteStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn location(&self) -> String {
        self.path.display().to_string()
    }

    fn connect(&self) -> rusqlite::Result<Connection> {
        let conn = Connection::open(&self.path)?;
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS sessions (
                session_id TEXT PRIMARY KEY,
                workplace TEXT NOT NULL,
                saved_at TEXT
            );

            CREATE TABLE IF NOT EXISTS session_sheets (
                session_id TEXT NOT NULL,
                position INTEGER NOT NULL,
                sheet_name TEXT NOT NULL,
                content TEXT NOT NULL,
                PRIMARY KEY (session_id, position)
            );
            CREATE INDEX IF NOT EXISTS idx_session_sheets_session ON session_sheets(session_id);
            "#,
        )?;
        Ok(conn)
    }
}

fn format_ts(ts: Option<NaiveDateTime>) -> Option<String> {
    ts.map(|t| t.format(TIMESTAMP_FORMAT).to_string())
}

fn parse_ts(text: Option<String>) -> Option<NaiveDateTime> {
    text.and_then(|t| NaiveDateTime::parse_from_str(&t, TIMESTAMP_FORMAT).ok())
}

impl PersistenceAdapter for SqliteStore {
    fn save(&self, meta: &SessionMeta, store: &ValueStore) -> Result<SaveReceipt, PersistError> {
        let saved_at = meta.saved_at.unwrap_or_else(|| Local::now().naive_local());
        let fail = |reason: String| PersistError::Save {
            location: self.location(),
            reason,
        };

        let book = codec::encode(meta, store);
        let mut sheets = Vec::with_capacity(book.len());
        for sheet in book.sheets() {
            let content = serde_json::to_string(&sheet.rows).map_err(|e| fail(e.to_string()))?;
            sheets.push((sheet.name.as_str(), content));
        }

        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| fail(e.to_string()))?;
        }
        let mut conn = self.connect().map_err(|e| fail(e.to_string()))?;
        let tx = conn.transaction().map_err(|e| fail(e.to_string()))?;

        let written = (|| -> rusqlite::Result<()> {
            tx.execute(
                "INSERT OR REPLACE INTO sessions (session_id, workplace, saved_at) VALUES (?1, ?2, ?3)",
                params![meta.session_id, meta.workplace, format_ts(Some(saved_at))],
            )?;
            tx.execute(
                "DELETE FROM session_sheets WHERE session_id = ?1",
                params![meta.session_id],
            )?;
            for (position, (name, content)) in sheets.iter().enumerate() {
                tx.execute(
                    "INSERT INTO session_sheets (session_id, position, sheet_name, content)
                     VALUES (?1, ?2, ?3, ?4)",
                    params![meta.session_id, position as i64, name, content],
                )?;
            }
            Ok(())
        })();

        match written {
            Ok(()) => tx.commit().map_err(|e| fail(e.to_string()))?,
            Err(e) => {
                if let Err(rollback) = tx.rollback() {
                    tracing::error!(error = %rollback, "rollback failed");
                }
                return Err(fail(e.to_string()));
            }
        }

        tracing::info!(session = %meta.session_id, db = %self.path.display(), "saved session records");
        Ok(SaveReceipt {
            location: self.location(),
            saved_at,
            backup: None,
        })
    }

    fn load(&self, session_id: &str) -> Result<LoadOutcome, PersistError> {
        if !self.path.exists() {
            return Err(PersistError::NotFound(session_id.to_string()));
        }
        let corrupt = |reason: String| PersistError::Corrupt {
            location: self.location(),
            reason,
        };

        let conn = self.connect().map_err(|e| corrupt(e.to_string()))?;
        let found: Option<String> = conn
            .query_row(
                "SELECT session_id FROM sessions WHERE session_id = ?1",
                params![session_id],
                |row| row.get(0),
            )
            .optional()
            .map_err(|e| corrupt(e.to_string()))?;
        if found.is_none() {
            return Err(PersistError::NotFound(session_id.to_string()));
        }

        let mut stmt = conn
            .prepare(
                "SELECT sheet_name, content FROM session_sheets
                 WHERE session_id = ?1 ORDER BY position",
            )
            .map_err(|e| corrupt(e.to_string()))?;
        let rows = stmt
            .query_map(params![session_id], |row| {
                Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
            })
            .map_err(|e| corrupt(e.to_string()))?;

        let mut book = SheetBook::new();
        let mut warnings = Vec::new();
        for row in rows {
            let (name, content) = row.map_err(|e| corrupt(e.to_string()))?;
            match serde_json::from_str::<Vec<Vec<String>>>(&content) {
                Ok(rows) => book.push_raw(Sheet { name, rows }),
                Err(e) => warnings.push(format!("{}: {}", name, e)),
            }
        }

        let mut outcome = codec::decode(&book).map_err(corrupt)?;
        warnings.append(&mut outcome.warnings);
        outcome.warnings = warnings;
        Ok(outcome)
    }

    fn list(&self) -> Result<Vec<SessionSummary>, PersistError> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }
        let corrupt = |e: rusqlite::Error| PersistError::Corrupt {
            location: self.location(),
            reason: e.to_string(),
        };

        let conn = self.connect().map_err(corrupt)?;
        let mut stmt = conn
            .prepare("SELECT session_id, workplace, saved_at FROM sessions")
            .map_err(corrupt)?;
        let rows = stmt
            .query_map([], |row| {
                Ok(SessionSummary {
                    session_id: row.get(0)?,
                    workplace: row.get(1)?,
                    saved_at: parse_ts(row.get(2)?),
                    location: self.location(),
                })
            })
            .map_err(corrupt)?;

        let mut sessions = rows.collect::<Result<Vec<_>, _>>().map_err(corrupt)?;
        sort_newest_first(&mut sessions);
        Ok(sessions)
    }
}
