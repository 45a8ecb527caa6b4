use crate::error::{WorkspaceError, WorkspaceResult};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use wireframe_common::Millis;
use wireframe_editor::{
    Actor, SessionConfig, DEFAULT_CONFLICT_WINDOW_MS, DEFAULT_HISTORY_LIMIT,
    DRAFT_FRESHNESS_MS, PRESENCE_TTL_MS,
};

pub const DEFAULT_CONFIG_NAME: &str = "wireframe.config.json";

/// Workspace configuration file format
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkspaceConfig {
    /// Directory backing the file store
    #[serde(default = "default_store_dir")]
    pub store_dir: String,

    /// Directory for local drafts and preferences
    #[serde(default = "default_draft_dir")]
    pub draft_dir: String,

    #[serde(default = "default_project_id")]
    pub project_id: String,

    #[serde(default)]
    pub user: UserConfig,

    #[serde(default)]
    pub timings: Timings,
}

fn default_store_dir() -> String {
    ".wireframe/store".to_string()
}

fn default_draft_dir() -> String {
    ".wireframe/drafts".to_string()
}

fn default_project_id() -> String {
    "default".to_string()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserConfig {
    pub id: String,
    pub display_name: String,
}

impl Default for UserConfig {
    fn default() -> Self {
        Self {
            id: "local".to_string(),
            display_name: "Local User".to_string(),
        }
    }
}

impl UserConfig {
    pub fn actor(&self) -> Actor {
        Actor::new(&self.id, &self.display_name)
    }
}

/// Debounces, heartbeats and windows, all in milliseconds
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Timings {
    pub presence_debounce_ms: u64,
    pub heartbeat_ms: u64,
    pub presence_ttl_ms: Millis,
    pub conflict_window_ms: Millis,
    pub autosave_debounce_ms: u64,
    pub draft_freshness_ms: Millis,
    pub history_limit: usize,
}

impl Default for Timings {
    fn default() -> Self {
        Self {
            presence_debounce_ms: 100,
            heartbeat_ms: 10_000,
            presence_ttl_ms: PRESENCE_TTL_MS,
            conflict_window_ms: DEFAULT_CONFLICT_WINDOW_MS,
            autosave_debounce_ms: 1_500,
            draft_freshness_ms: DRAFT_FRESHNESS_MS,
            history_limit: DEFAULT_HISTORY_LIMIT,
        }
    }
}

impl Timings {
    pub fn presence_debounce(&self) -> Duration {
        Duration::from_millis(self.presence_debounce_ms)
    }

    pub fn heartbeat(&self) -> Duration {
        Duration::from_millis(self.heartbeat_ms.max(1))
    }

    pub fn autosave_debounce(&self) -> Duration {
        Duration::from_millis(self.autosave_debounce_ms)
    }

    pub fn session_config(&self) -> SessionConfig {
        SessionConfig {
            history_limit: self.history_limit,
            conflict_window_ms: self.conflict_window_ms,
        }
    }
}

impl WorkspaceConfig {
    /// Load config from a directory, defaulting when the file is absent
    pub fn load(cwd: impl AsRef<Path>) -> WorkspaceResult<Self> {
        let config_path = cwd.as_ref().join(DEFAULT_CONFIG_NAME);

        if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            serde_json::from_str(&content).map_err(|source| WorkspaceError::Config {
                path: config_path,
                source,
            })
        } else {
            Ok(Self::default())
        }
    }

    /// Write this config into `cwd`
    pub fn save(&self, cwd: impl AsRef<Path>) -> WorkspaceResult<PathBuf> {
        let config_path = cwd.as_ref().join(DEFAULT_CONFIG_NAME);
        std::fs::write(&config_path, serde_json::to_string_pretty(self)?)?;
        Ok(config_path)
    }

    pub fn get_store_dir(&self, cwd: impl AsRef<Path>) -> PathBuf {
        cwd.as_ref().join(&self.store_dir)
    }

    pub fn get_draft_dir(&self, cwd: impl AsRef<Path>) -> PathBuf {
        cwd.as_ref().join(&self.draft_dir)
    }
}

impl Default for WorkspaceConfig {
    fn default() -> Self {
        Self {
            store_dir: default_store_dir(),
            draft_dir: default_draft_dir(),
            project_id: default_project_id(),
            user: UserConfig::default(),
            timings: Timings::default(),
        }
    }
}
