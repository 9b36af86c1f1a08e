//! Session persistence
//!
//! Sessions are stored either as one xlsx workbook per session
//! ([`WorkbookStore`]) or as rows in an embedded sqlite database
//! ([`SqliteStore`]). Both strategies map the value store to the same
//! [`SheetBook`] through [`codec`], so sheet naming, sanitization and
//! partial recovery behave identically.

pub mod book;
pub mod codec;
pub mod file;
pub mod snapshot;
pub mod sqlite;
pub mod upload;
pub mod xlsx;

use chrono::NaiveDateTime;
use miette::Diagnostic;
use thiserror::Error;

use crate::core::session::{SessionMeta, SessionSummary};
use crate::core::store::ValueStore;

pub use book::{Sheet, SheetBook};
pub use file::WorkbookStore;
pub use sqlite::SqliteStore;

/// Errors raised while saving or loading a session
#[derive(Debug, Error, Diagnostic)]
pub enum PersistError {
    #[error("saved session not found: {0}")]
    #[diagnostic(
        code(ergo::persist::not_found),
        help("run `ergo session list` to see saved sessions")
    )]
    NotFound(String),

    #[error("saved session at {location} is unreadable: {reason}")]
    #[diagnostic(code(ergo::persist::corrupt))]
    Corrupt { location: String, reason: String },

    #[error("failed to save session to {location}: {reason}")]
    #[diagnostic(
        code(ergo::persist::save),
        help("the previous save, if any, was left untouched")
    )]
    Save { location: String, reason: String },
}

/// Where and when a save landed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SaveReceipt {
    pub location: String,
    pub saved_at: NaiveDateTime,
    /// Copy of the previous artifact, when one was made
    pub backup: Option<String>,
}

/// A loaded session plus any sheets that could not be recovered
#[derive(Debug, Clone, PartialEq)]
pub struct LoadOutcome {
    pub meta: SessionMeta,
    pub store: ValueStore,
    pub warnings: Vec<String>,
}

/// Storage strategy for sessions
pub trait PersistenceAdapter {
    /// Persist the whole store atomically; a failure leaves the previous
    /// save intact
    fn save(&self, meta: &SessionMeta, store: &ValueStore) -> Result<SaveReceipt, PersistError>;

    /// Load one session by id
    fn load(&self, session_id: &str) -> Result<LoadOutcome, PersistError>;

    /// Saved sessions, newest first
    fn list(&self) -> Result<Vec<SessionSummary>, PersistError>;
}

/// Sort summaries newest first; sessions without a timestamp go last
pub(crate) fn sort_newest_first(sessions: &mut [SessionSummary]) {
    sessions.sort_by(|a, b| b.saved_at.cmp(&a.saved_at));
}
