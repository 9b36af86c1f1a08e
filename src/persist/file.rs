//! One xlsx workbook per session
//!
//! `save` never writes the final file in place: the workbook goes to
//! `<id>_temp.xlsx` first and is renamed over `<id>.xlsx` only once it is
//! complete. The previous workbook, if any, is copied to `backups/` first.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{Local, NaiveDateTime};

use crate::core::session::{SessionMeta, SessionSummary};
use crate::core::store::ValueStore;
use crate::persist::book::SheetBook;
use crate::persist::codec::{self, METADATA_SHEET};
use crate::persist::{sort_newest_first, xlsx, LoadOutcome, PersistError, PersistenceAdapter, SaveReceipt};

const EXTENSION: &str = "xlsx";
const TEMP_SUFFIX: &str = "_temp";

#[derive(Debug, Clone)]
pub struct WorkbookStore {
    dir: PathBuf,
}

impl WorkbookStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn backup_dir(&self) -> PathBuf {
        self.dir.join("backups")
    }

    /// Final workbook path of a session
    pub fn path_for(&self, session_id: &str) -> PathBuf {
        self.dir.join(format!("{}.{}", session_id, EXTENSION))
    }

    fn temp_path(&self, session_id: &str) -> PathBuf {
        self.dir.join(format!("{}{}.{}", session_id, TEMP_SUFFIX, EXTENSION))
    }

    /// Copy the current workbook to the backup directory; failures are
    /// logged and otherwise ignored
    fn backup(&self, session_id: &str, current: &Path, at: NaiveDateTime) -> Option<PathBuf> {
        let dir = self.backup_dir();
        let target = dir.join(format!(
            "{}_{}.{}",
            session_id,
            at.format("%Y%m%d_%H%M%S"),
            EXTENSION
        ));
        let result = fs::create_dir_all(&dir).and_then(|_| fs::copy(current, &target));
        match result {
            Ok(_) => {
                tracing::debug!(backup = %target.display(), "backed up previous save");
                Some(target)
            }
            Err(e) => {
                tracing::warn!(error = %e, "could not back up {}", current.display());
                None
            }
        }
    }

    fn read_summary(&self, path: &Path) -> Result<SessionSummary, String> {
        let bytes = fs::read(path).map_err(|e| e.to_string())?;
        let sheet = xlsx::read_sheet(&bytes, METADATA_SHEET)?
            .ok_or_else(|| format!("missing {} sheet", METADATA_SHEET))?;
        let mut book = SheetBook::new();
        book.push_raw(sheet);
        let meta = codec::decode_meta(&book)?;
        Ok(SessionSummary {
            session_id: meta.session_id,
            workplace: meta.workplace,
            saved_at: meta.saved_at,
            location: path.display().to_string(),
        })
    }
}

impl PersistenceAdapter for WorkbookStore {
    fn save(&self, meta: &SessionMeta, store: &ValueStore) -> Result<SaveReceipt, PersistError> {
        let saved_at = meta.saved_at.unwrap_or_else(|| Local::now().naive_local());
        let location = self.path_for(&meta.session_id);
        let fail = |reason: String| PersistError::Save {
            location: location.display().to_string(),
            reason,
        };

        let bytes = xlsx::write_book(&codec::encode(meta, store)).map_err(fail)?;
        fs::create_dir_all(&self.dir).map_err(|e| fail(e.to_string()))?;

        let backup = if location.exists() {
            self.backup(&meta.session_id, &location, saved_at)
        } else {
            None
        };

        let temp = self.temp_path(&meta.session_id);
        if let Err(e) = fs::write(&temp, &bytes).and_then(|_| fs::rename(&temp, &location)) {
            fs::remove_file(&temp).ok();
            return Err(fail(e.to_string()));
        }

        tracing::info!(path = %location.display(), "saved session workbook");
        Ok(SaveReceipt {
            location: location.display().to_string(),
            saved_at,
            backup: backup.map(|p| p.display().to_string()),
        })
    }

    fn load(&self, session_id: &str) -> Result<LoadOutcome, PersistError> {
        let path = self.path_for(session_id);
        if !path.exists() {
            return Err(PersistError::NotFound(session_id.to_string()));
        }
        let corrupt = |reason: String| PersistError::Corrupt {
            location: path.display().to_string(),
            reason,
        };

        let bytes = fs::read(&path).map_err(|e| corrupt(e.to_string()))?;
        let (book, mut warnings) = xlsx::read_book(&bytes).map_err(corrupt)?;
        let mut outcome = codec::decode(&book).map_err(corrupt)?;
        warnings.append(&mut outcome.warnings);
        outcome.warnings = warnings;

        tracing::debug!(path = %path.display(), warnings = outcome.warnings.len(), "loaded session workbook");
        Ok(outcome)
    }

    fn list(&self) -> Result<Vec<SessionSummary>, PersistError> {
        if !self.dir.exists() {
            return Ok(Vec::new());
        }

        let mut sessions = Vec::new();
        for entry in walkdir::WalkDir::new(&self.dir)
            .min_depth(1)
            .max_depth(1)
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().is_file())
            .filter(|e| e.path().extension().is_some_and(|ext| ext == EXTENSION))
            .filter(|e| {
                !e.path()
                    .file_stem()
                    .is_some_and(|s| s.to_string_lossy().ends_with(TEMP_SUFFIX))
            })
        {
            match self.read_summary(entry.path()) {
                Ok(summary) => sessions.push(summary),
                Err(e) => {
                    tracing::warn!(path = %entry.path().display(), error = %e, "skipping unreadable session");
                }
            }
        }

        sort_newest_first(&mut sessions);
        Ok(sessions)
    }
}
