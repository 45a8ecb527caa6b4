use anyhow::{Context as _, Result};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use wireframe_common::{FileKeyValueStore, SystemClock};
use wireframe_editor::{Drafts, PreferenceStore};
use wireframe_workspace::{FileStore, TemplateRef, WorkspaceClient, WorkspaceConfig};

/// Loaded config plus the stores it points at
pub struct Context {
    cwd: PathBuf,
    pub config: WorkspaceConfig,
}

impl Context {
    pub fn load(cwd: &Path) -> Result<Self> {
        let config = WorkspaceConfig::load(cwd)?;
        Ok(Self {
            cwd: cwd.to_path_buf(),
            config,
        })
    }

    pub fn store(&self) -> Arc<FileStore> {
        Arc::new(FileStore::new(self.config.get_store_dir(&self.cwd)))
    }

    pub fn local(&self) -> Result<Arc<FileKeyValueStore>> {
        let dir = self.config.get_draft_dir(&self.cwd);
        let store = FileKeyValueStore::new(&dir)
            .with_context(|| format!("Cannot open draft directory {}", dir.display()))?;
        Ok(Arc::new(store))
    }

    pub fn drafts(&self) -> Result<Drafts> {
        Ok(Drafts::with_freshness(
            self.local()?,
            self.config.timings.draft_freshness_ms,
        ))
    }

    /// Editor preferences kept next to the drafts
    pub fn preferences(&self) -> Result<PreferenceStore> {
        PreferenceStore::load(self.local()?).context("Cannot read preferences")
    }

    pub fn template(&self, template_id: &str) -> TemplateRef {
        TemplateRef::new(&self.config.project_id, template_id)
    }

    pub fn client(&self) -> Result<WorkspaceClient> {
        Ok(WorkspaceClient::new(
            self.store(),
            self.local()?,
            Arc::new(SystemClock),
            &self.config,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_without_config_file() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = Context::load(dir.path()).unwrap();

        assert_eq!(ctx.config.project_id, "default");
        assert_eq!(ctx.template("t1").to_string(), "default/t1");
        assert_eq!(ctx.store().root(), dir.path().join(".wireframe/store"));
    }

    #[test]
    fn test_local_store_creates_draft_dir() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = Context::load(dir.path()).unwrap();
        ctx.local().unwrap();
        assert!(dir.path().join(".wireframe/drafts").is_dir());
    }

    #[test]
    fn test_preferences_shared_with_client() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = Context::load(dir.path()).unwrap();
        ctx.preferences().unwrap().update(|p| p.grid_size = 4.0).unwrap();

        assert_eq!(ctx.preferences().unwrap().get().grid_size, 4.0);
        assert_eq!(ctx.client().unwrap().preferences().grid_size, 4.0);
    }
}
