//! Workspace discovery and structure
//!
//! A workspace is any directory holding an `.ergo/` marker. Durable saves
//! live under `saved_sessions/`; the session being edited lives in
//! `.ergo/draft.json` between CLI invocations.

use std::path::{Path, PathBuf};

use miette::Diagnostic;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::core::autosave::AutoSave;
use crate::core::config::Backend;
use crate::core::session::SessionContext;
use crate::persist::sqlite::DB_FILE;
use crate::persist::{codec, PersistenceAdapter, Sheet, SheetBook, SqliteStore, WorkbookStore};

const MARKER_DIR: &str = ".ergo";
const SESSIONS_DIR: &str = "saved_sessions";
const DRAFT_FILE: &str = "draft.json";

/// Working copy of the active session
#[derive(Debug, Serialize, Deserialize)]
struct Draft {
    autosave: AutoSave,
    sheets: Vec<Sheet>,
}

#[derive(Debug)]
pub struct Workspace {
    /// Root directory of the workspace (parent of .ergo/)
    root: PathBuf,
}

impl Workspace {
    /// Find the workspace root by walking up from the current directory
    pub fn discover() -> Result<Self, WorkspaceError> {
        let current = std::env::current_dir().map_err(|e| WorkspaceError::Io(e.to_string()))?;
        Self::discover_from(&current)
    }

    /// Find the workspace root by walking up from the given directory
    pub fn discover_from(start: &Path) -> Result<Self, WorkspaceError> {
        let mut current = start
            .canonicalize()
            .map_err(|e| WorkspaceError::Io(e.to_string()))?;

        loop {
            if current.join(MARKER_DIR).is_dir() {
                return Ok(Self { root: current });
            }
            if !current.pop() {
                return Err(WorkspaceError::NotFound {
                    searched_from: start.to_path_buf(),
                });
            }
        }
    }

    /// Create a new workspace at the given path
    pub fn init(path: &Path) -> Result<Self, WorkspaceError> {
        std::fs::create_dir_all(path).map_err(|e| WorkspaceError::Io(e.to_string()))?;
        let root = path.canonicalize().unwrap_or_else(|_| path.to_path_buf());
        if root.join(MARKER_DIR).exists() {
            return Err(WorkspaceError::AlreadyExists(root));
        }
        Self::create(root)
    }

    /// Initialize even if .ergo/ exists; the config file is rewritten, the
    /// draft and saved sessions are kept
    pub fn init_force(path: &Path) -> Result<Self, WorkspaceError> {
        std::fs::create_dir_all(path).map_err(|e| WorkspaceError::Io(e.to_string()))?;
        let root = path.canonicalize().unwrap_or_else(|_| path.to_path_buf());
        Self::create(root)
    }

    fn create(root: PathBuf) -> Result<Self, WorkspaceError> {
        let ws = Self { root };
        for dir in [ws.ergo_dir(), ws.sessions_dir(), ws.backup_dir()] {
            std::fs::create_dir_all(&dir).map_err(|e| WorkspaceError::Io(e.to_string()))?;
        }
        std::fs::write(ws.config_path(), Self::default_config())
            .map_err(|e| WorkspaceError::Io(e.to_string()))?;
        tracing::info!(root = %ws.root.display(), "initialized workspace");
        Ok(ws)
    }

    fn default_config() -> &'static str {
        r#"# Ergo workspace configuration

# Surveyor name filled into new survey forms (default: login name)
# surveyor: ""

# Where saves go: workbook (one xlsx per session) or sqlite (sessions.db)
# backend: workbook

# Seconds between automatic saves
# autosave_secs: 30

# Append a random suffix to new session ids
# session_suffix: false

# Workplaces offered when starting a session
# workplaces:
#   - A사업장
#   - B사업장
#   - C사업장
"#
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn ergo_dir(&self) -> PathBuf {
        self.root.join(MARKER_DIR)
    }

    pub fn config_path(&self) -> PathBuf {
        self.ergo_dir().join("config.yaml")
    }

    pub fn sessions_dir(&self) -> PathBuf {
        self.root.join(SESSIONS_DIR)
    }

    pub fn backup_dir(&self) -> PathBuf {
        self.sessions_dir().join("backups")
    }

    pub fn draft_path(&self) -> PathBuf {
        self.ergo_dir().join(DRAFT_FILE)
    }

    /// Durable store for the configured backend
    pub fn adapter(&self, backend: Backend) -> Box<dyn PersistenceAdapter> {
        match backend {
            Backend::Workbook => Box::new(WorkbookStore::new(self.sessions_dir())),
            Backend::Sqlite => Box::new(SqliteStore::new(self.sessions_dir().join(DB_FILE))),
        }
    }

    pub fn has_draft(&self) -> bool {
        self.draft_path().is_file()
    }

    /// Load the active session
    pub fn load_draft(&self) -> Result<SessionContext, WorkspaceError> {
        let path = self.draft_path();
        if !path.is_file() {
            return Err(WorkspaceError::NoActiveSession);
        }
        let broken = |reason: String| WorkspaceError::Draft {
            path: path.clone(),
            reason,
        };

        let text = std::fs::read_to_string(&path).map_err(|e| broken(e.to_string()))?;
        let draft: Draft = serde_json::from_str(&text).map_err(|e| broken(e.to_string()))?;

        let mut book = SheetBook::new();
        for sheet in draft.sheets {
            book.push_raw(sheet);
        }
        let outcome = codec::decode(&book).map_err(broken)?;
        for warning in &outcome.warnings {
            tracing::warn!(%warning, "draft sheet skipped");
        }
        Ok(SessionContext::resume(outcome.meta, outcome.store, draft.autosave))
    }

    /// Write the active session's working copy
    pub fn save_draft(&self, ctx: &SessionContext) -> Result<(), WorkspaceError> {
        let path = self.draft_path();
        let broken = |reason: String| WorkspaceError::Draft {
            path: path.clone(),
            reason,
        };

        let book = codec::encode(&ctx.meta, &ctx.store);
        let draft = Draft {
            autosave: ctx.autosave,
            sheets: book.sheets().to_vec(),
        };
        let text = serde_json::to_string(&draft).map_err(|e| broken(e.to_string()))?;

        let temp = path.with_extension("json.tmp");
        std::fs::write(&temp, text)
            .and_then(|_| std::fs::rename(&temp, &path))
            .map_err(|e| {
                std::fs::remove_file(&temp).ok();
                broken(e.to_string())
            })?;
        tracing::debug!(session = %ctx.meta.session_id, "updated draft");
        Ok(())
    }

    /// Forget the active session (durable saves are untouched)
    pub fn clear_draft(&self) -> Result<(), WorkspaceError> {
        match std::fs::remove_file(self.draft_path()) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(WorkspaceError::Io(e.to_string())),
        }
    }
}

/// Errors that can occur during workspace operations
#[derive(Debug, Error, Diagnostic)]
pub enum WorkspaceError {
    #[error("not an ergo workspace (searched from {searched_from:?})")]
    #[diagnostic(code(ergo::workspace::not_found), help("run `ergo init` to create one"))]
    NotFound { searched_from: PathBuf },

    #[error("ergo workspace already exists at {0:?}")]
    #[diagnostic(code(ergo::workspace::exists), help("use `ergo init --force` to rewrite its config"))]
    AlreadyExists(PathBuf),

    #[error("no active session")]
    #[diagnostic(
        code(ergo::workspace::no_session),
        help("start one with `ergo session new <workplace>` or `ergo session open <id>`")
    )]
    NoActiveSession,

    #[error("active session at {path:?} is unreadable: {reason}")]
    #[diagnostic(code(ergo::workspace::draft))]
    Draft { path: PathBuf, reason: String },

    #[error("IO error: {0}")]
    Io(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::key::{FieldId, ValueKey};
    use crate::entities::checklist::ChecklistTable;
    use chrono::NaiveDate;
    use tempfile::tempdir;

    fn context() -> SessionContext {
        let now = NaiveDate::from_ymd_opt(2024, 5, 1)
            .unwrap()
            .and_hms_opt(9, 0, 0)
            .unwrap();
        let mut ctx = SessionContext::start("A사업장", now, false).unwrap();
        ctx.store.checklist = ChecklistTable::sample();
        ctx.store.set_scalar(ValueKey::unit(FieldId::Surveyor, "포장반"), "박민수");
        ctx
    }

    #[test]
    fn test_init_creates_structure() {
        let tmp = tempdir().unwrap();
        let ws = Workspace::init(tmp.path()).unwrap();

        assert!(ws.ergo_dir().is_dir());
        assert!(ws.config_path().exists());
        assert!(ws.sessions_dir().is_dir());
        assert!(ws.backup_dir().is_dir());
        assert!(!ws.has_draft());
    }

    #[test]
    fn test_init_fails_if_exists() {
        let tmp = tempdir().unwrap();
        Workspace::init(tmp.path()).unwrap();
        let err = Workspace::init(tmp.path()).unwrap_err();
        assert!(matches!(err, WorkspaceError::AlreadyExists(_)));
        assert!(Workspace::init_force(tmp.path()).is_ok());
    }

    #[test]
    fn test_discover_from_subdirectory() {
        let tmp = tempdir().unwrap();
        Workspace::init(tmp.path()).unwrap();
        let subdir = tmp.path().join("a/b/c");
        std::fs::create_dir_all(&subdir).unwrap();

        let ws = Workspace::discover_from(&subdir).unwrap();
        assert_eq!(ws.root(), tmp.path().canonicalize().unwrap());
    }

    #[test]
    fn test_discover_fails_without_marker() {
        let tmp = tempdir().unwrap();
        let err = Workspace::discover_from(tmp.path()).unwrap_err();
        assert!(matches!(err, WorkspaceError::NotFound { .. }));
    }

    #[test]
    fn test_draft_round_trip_keeps_autosave_markers() {
        let tmp = tempdir().unwrap();
        let ws = Workspace::init(tmp.path()).unwrap();
        let mut ctx = context();
        ctx.autosave.record_success(
            NaiveDate::from_ymd_opt(2024, 5, 1)
                .unwrap()
                .and_hms_opt(9, 5, 0)
                .unwrap(),
        );

        ws.save_draft(&ctx).unwrap();
        assert!(ws.has_draft());
        assert_eq!(ws.load_draft().unwrap(), ctx);
    }

    #[test]
    fn test_missing_draft_is_no_active_session() {
        let tmp = tempdir().unwrap();
        let ws = Workspace::init(tmp.path()).unwrap();
        assert!(matches!(ws.load_draft(), Err(WorkspaceError::NoActiveSession)));
        ws.clear_draft().unwrap();
    }

    #[test]
    fn test_garbled_draft_is_reported() {
        let tmp = tempdir().unwrap();
        let ws = Workspace::init(tmp.path()).unwrap();
        std::fs::write(ws.draft_path(), "{not json").unwrap();
        assert!(matches!(ws.load_draft(), Err(WorkspaceError::Draft { .. })));
    }

    #[test]
    fn test_adapter_follows_backend() {
        let tmp = tempdir().unwrap();
        let ws = Workspace::init(tmp.path()).unwrap();
        let ctx = context();

        ws.adapter(Backend::Sqlite).save(&ctx.meta, &ctx.store).unwrap();
        assert!(ws.sessions_dir().join(DB_FILE).exists());
        assert_eq!(ws.adapter(Backend::Workbook).list().unwrap().len(), 0);
        assert_eq!(ws.adapter(Backend::Sqlite).list().unwrap().len(), 1);
    }
}
