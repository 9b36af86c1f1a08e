//! Configuration management with layered hierarchy

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::core::autosave::DEFAULT_THRESHOLD_SECS;
use crate::core::workspace::Workspace;

/// Workplaces offered by the session picker when none are configured
pub const DEFAULT_WORKPLACES: [&str; 3] = ["A사업장", "B사업장", "C사업장"];

/// Where durable saves go
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    /// One xlsx workbook per session
    #[default]
    Workbook,
    /// Records in `sessions.db`
    Sqlite,
}

impl std::str::FromStr for Backend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "workbook" | "xlsx" | "file" => Ok(Backend::Workbook),
            "sqlite" | "db" | "database" => Ok(Backend::Sqlite),
            other => Err(format!("unknown backend '{}' (expected workbook or sqlite)", other)),
        }
    }
}

/// Ergo configuration with layered hierarchy
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Default surveyor name written into new survey forms
    pub surveyor: Option<String>,

    /// Durable save strategy
    pub backend: Option<Backend>,

    /// Seconds between automatic saves
    pub autosave_secs: Option<u64>,

    /// Append a random suffix to new session ids
    pub session_suffix: Option<bool>,

    /// Preset workplace names
    pub workplaces: Option<Vec<String>>,
}

impl Config {
    /// Load configuration from all sources, merging in priority order
    pub fn load() -> Self {
        let workspace = Workspace::discover().ok();
        Self::load_with(Self::global_config_path().as_deref(), workspace.as_ref())
    }

    /// Load for an already discovered workspace
    pub fn for_workspace(workspace: &Workspace) -> Self {
        Self::load_with(Self::global_config_path().as_deref(), Some(workspace))
    }

    /// Load with explicit global config and workspace
    pub fn load_with(global: Option<&Path>, workspace: Option<&Workspace>) -> Self {
        let mut config = Config::default();

        // 1. Built-in defaults (accessors below)

        // 2. Global user config (~/.config/ergo/config.yaml)
        if let Some(global) = global.and_then(Self::read_file) {
            config.merge(global);
        }

        // 3. Workspace config (.ergo/config.yaml)
        if let Some(local) = workspace.and_then(|ws| Self::read_file(&ws.config_path())) {
            config.merge(local);
        }

        // 4. Environment variables
        config.merge(Self::from_env());

        config
    }

    fn read_file(path: &Path) -> Option<Config> {
        if !path.exists() {
            return None;
        }
        let contents = std::fs::read_to_string(path)
            .map_err(|e| tracing::warn!(path = %path.display(), error = %e, "cannot read config"))
            .ok()?;
        serde_yml::from_str::<Config>(&contents)
            .map_err(|e| tracing::warn!(path = %path.display(), error = %e, "ignoring invalid config"))
            .ok()
    }

    fn from_env() -> Config {
        let var = |name: &str| std::env::var(name).ok().filter(|v| !v.trim().is_empty());
        Config {
            surveyor: var("ERGO_SURVEYOR"),
            backend: var("ERGO_BACKEND").and_then(|v| {
                v.parse()
                    .map_err(|e: String| tracing::warn!("ERGO_BACKEND: {}", e))
                    .ok()
            }),
            autosave_secs: var("ERGO_AUTOSAVE_SECS").and_then(|v| v.trim().parse().ok()),
            session_suffix: var("ERGO_SESSION_SUFFIX")
                .map(|v| matches!(v.trim().to_lowercase().as_str(), "1" | "true" | "yes")),
            workplaces: None,
        }
    }

    /// Get the path to the global config file
    fn global_config_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("", "", "ergo")
            .map(|dirs| dirs.config_dir().join("config.yaml"))
    }

    /// Merge another config into this one (other takes precedence)
    fn merge(&mut self, other: Config) {
        if other.surveyor.is_some() {
            self.surveyor = other.surveyor;
        }
        if other.backend.is_some() {
            self.backend = other.backend;
        }
        if other.autosave_secs.is_some() {
            self.autosave_secs = other.autosave_secs;
        }
        if other.session_suffix.is_some() {
            self.session_suffix = other.session_suffix;
        }
        if other.workplaces.is_some() {
            self.workplaces = other.workplaces;
        }
    }

    pub fn backend(&self) -> Backend {
        self.backend.unwrap_or_default()
    }

    pub fn autosave_secs(&self) -> u64 {
        self.autosave_secs.unwrap_or(DEFAULT_THRESHOLD_SECS)
    }

    pub fn session_suffix(&self) -> bool {
        self.session_suffix.unwrap_or(false)
    }

    /// Get the surveyor name, falling back to the login name
    pub fn surveyor(&self) -> String {
        if let Some(ref surveyor) = self.surveyor {
            return surveyor.clone();
        }
        std::env::var("USER")
            .or_else(|_| std::env::var("USERNAME"))
            .unwrap_or_default()
    }

    pub fn workplaces(&self) -> Vec<String> {
        match &self.workplaces {
            Some(list) if !list.is_empty() => list.clone(),
            _ => DEFAULT_WORKPLACES.iter().map(|s| s.to_string()).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.backend(), Backend::Workbook);
        assert_eq!(config.autosave_secs(), DEFAULT_THRESHOLD_SECS);
        assert!(!config.session_suffix());
        assert_eq!(config.workplaces(), vec!["A사업장", "B사업장", "C사업장"]);
    }

    #[test]
    fn test_workspace_overrides_global() {
        let tmp = tempdir().unwrap();
        let global = tmp.path().join("global.yaml");
        std::fs::write(&global, "surveyor: 김철수\nautosave_secs: 60\n").unwrap();

        let ws = Workspace::init(&tmp.path().join("site")).unwrap();
        std::fs::write(ws.config_path(), "backend: sqlite\nautosave_secs: 10\n").unwrap();

        let config = Config::load_with(Some(&global), Some(&ws));
        assert_eq!(config.surveyor.as_deref(), Some("김철수"));
        assert_eq!(config.backend(), Backend::Sqlite);
        assert_eq!(config.autosave_secs(), 10);
    }

    #[test]
    fn test_invalid_file_is_ignored() {
        let tmp = tempdir().unwrap();
        let global = tmp.path().join("global.yaml");
        std::fs::write(&global, "autosave_secs: [not, a, number]\n").unwrap();
        let config = Config::load_with(Some(&global), None);
        assert_eq!(config.autosave_secs, None);
    }

    #[test]
    fn test_backend_parse() {
        assert_eq!("SQLite".parse::<Backend>(), Ok(Backend::Sqlite));
        assert_eq!("xlsx".parse::<Backend>(), Ok(Backend::Workbook));
        assert!("csv".parse::<Backend>().is_err());
    }

    #[test]
    fn test_empty_workplace_list_falls_back() {
        let config = Config {
            workplaces: Some(Vec::new()),
            ..Config::default()
        };
        assert_eq!(config.workplaces().len(), 3);
    }
}
