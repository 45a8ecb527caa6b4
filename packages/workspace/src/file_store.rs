//! [`DocumentStore`] over a directory tree of JSON files.
//!
//! ```text
//! <root>/<project>/<template>/template.json
//!                             changes.jsonl
//!                             presence/<user>.json
//!                             versions/<id>.json
//! ```
//!
//! Realtime feeds are driven by file watching, so two processes sharing a
//! directory see each other's writes.

use crate::feed::Subscription;
use crate::store::{
    validate_id, DocumentStore, StoreError, StoreResult, TemplateRecord, TemplateRef,
    TemplateUpdate,
};
use crate::watcher::{touches, touches_dir, FileWatcher};
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::io::AsyncWriteExt;
use wireframe_common::Millis;
use wireframe_editor::{newest_first, ChangeLogEntry, PresenceRecord, VersionSnapshot};

const TEMPLATE_FILE: &str = "template.json";
const CHANGES_FILE: &str = "changes.jsonl";
const PRESENCE_DIR: &str = "presence";
const VERSIONS_DIR: &str = "versions";

pub struct FileStore {
    root: PathBuf,
}

impl FileStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn template_dir(&self, template: &TemplateRef) -> StoreResult<PathBuf> {
        validate_id(&template.project_id)?;
        validate_id(&template.template_id)?;
        Ok(self
            .root
            .join(&template.project_id)
            .join(&template.template_id))
    }

    /// Directory of an existing template
    async fn existing_dir(&self, template: &TemplateRef) -> StoreResult<PathBuf> {
        let dir = self.template_dir(template)?;
        if tokio::fs::try_exists(dir.join(TEMPLATE_FILE)).await? {
            Ok(dir)
        } else {
            Err(StoreError::TemplateNotFound(template.clone()))
        }
    }
}

async fn write_json<T: Serialize>(path: &Path, value: &T) -> StoreResult<()> {
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }
    let tmp = path.with_extension("json.tmp");
    tokio::fs::write(&tmp, serde_json::to_vec_pretty(value)?).await?;
    tokio::fs::rename(&tmp, path).await?;
    Ok(())
}

async fn read_json<T: DeserializeOwned>(path: &Path) -> StoreResult<Option<T>> {
    match tokio::fs::read(path).await {
        Ok(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e.into()),
    }
}

/// Every `*.json` in `dir`; unreadable files are skipped with a warning
async fn read_json_dir<T: DeserializeOwned>(dir: &Path) -> StoreResult<Vec<T>> {
    let mut entries = match tokio::fs::read_dir(dir).await {
        Ok(entries) => entries,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(e.into()),
    };

    let mut values = Vec::new();
    while let Some(entry) = entries.next_entry().await? {
        let path = entry.path();
        if path.extension().and_then(|e| e.to_str()) != Some("json") {
            continue;
        }
        match read_json(&path).await {
            Ok(Some(value)) => values.push(value),
            Ok(None) => {}
            Err(e) => tracing::warn!(path = %path.display(), error = %e, "skipping unreadable file"),
        }
    }
    Ok(values)
}

async fn read_record(dir: &Path, template: &TemplateRef) -> StoreResult<TemplateRecord> {
    read_json(&dir.join(TEMPLATE_FILE))
        .await?
        .ok_or_else(|| StoreError::TemplateNotFound(template.clone()))
}

#[async_trait]
impl DocumentStore for FileStore {
    async fn create_template(&self, project_id: &str, update: &TemplateUpdate) -> StoreResult<TemplateRef> {
        let template = TemplateRef::new(project_id, uuid::Uuid::new_v4().to_string());
        let dir = self.template_dir(&template)?;
        write_json(&dir.join(TEMPLATE_FILE), &TemplateRecord::new(update.clone())).await?;
        tracing::info!(%template, "created template");
        Ok(template)
    }

    async fn load_template(&self, template: &TemplateRef) -> StoreResult<TemplateRecord> {
        let dir = self.template_dir(template)?;
        read_record(&dir, template).await
    }

    async fn save_template(&self, template: &TemplateRef, update: &TemplateUpdate) -> StoreResult<()> {
        let dir = self.existing_dir(template).await?;
        let mut record = read_record(&dir, template).await?;
        record.apply(update);
        write_json(&dir.join(TEMPLATE_FILE), &record).await
    }

    async fn list_templates(&self, project_id: &str) -> StoreResult<Vec<TemplateRef>> {
        validate_id(project_id)?;
        let mut entries = match tokio::fs::read_dir(self.root.join(project_id)).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut refs = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            if !tokio::fs::try_exists(entry.path().join(TEMPLATE_FILE)).await? {
                continue;
            }
            if let Some(name) = entry.file_name().to_str() {
                refs.push(TemplateRef::new(project_id, name));
            }
        }
        refs.sort();
        Ok(refs)
    }

    async fn rename_template(&self, template: &TemplateRef, name: &str, at: Millis) -> StoreResult<()> {
        let dir = self.existing_dir(template).await?;
        let mut record = read_record(&dir, template).await?;
        record.rename(name, at)?;
        write_json(&dir.join(TEMPLATE_FILE), &record).await?;
        tracing::info!(%template, name = %record.name, "renamed template");
        Ok(())
    }

    async fn delete_template(&self, template: &TemplateRef) -> StoreResult<()> {
        let dir = self.existing_dir(template).await?;
        tokio::fs::remove_dir_all(&dir).await?;
        tracing::info!(%template, "deleted template");
        Ok(())
    }

    async fn append_change(&self, template: &TemplateRef, entry: &ChangeLogEntry) -> StoreResult<()> {
        let dir = self.existing_dir(template).await?;
        let mut line = serde_json::to_vec(entry)?;
        line.push(b'\n');

        let mut file = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(dir.join(CHANGES_FILE))
            .await?;
        file.write_all(&line).await?;
        file.flush().await?;
        Ok(())
    }

    async fn recent_changes(&self, template: &TemplateRef, limit: usize) -> StoreResult<Vec<ChangeLogEntry>> {
        let dir = self.existing_dir(template).await?;
        let content = match tokio::fs::read_to_string(dir.join(CHANGES_FILE)).await {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let entries = content
            .lines()
            .filter(|line| !line.trim().is_empty())
            .filter_map(|line| match serde_json::from_str(line) {
                Ok(entry) => Some(entry),
                Err(e) => {
                    tracing::warn!(error = %e, "skipping unreadable change log line");
                    None
                }
            })
            .collect();
        Ok(newest_first(entries, limit))
    }

    async fn put_presence(&self, template: &TemplateRef, record: &PresenceRecord) -> StoreResult<()> {
        validate_id(&record.user_id)?;
        let dir = self.existing_dir(template).await?;
        write_json(
            &dir.join(PRESENCE_DIR).join(format!("{}.json", record.user_id)),
            record,
        )
        .await
    }

    async fn delete_presence(&self, template: &TemplateRef, user_id: &str) -> StoreResult<()> {
        validate_id(user_id)?;
        let dir = self.existing_dir(template).await?;
        match tokio::fs::remove_file(dir.join(PRESENCE_DIR).join(format!("{}.json", user_id))).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    async fn list_presence(&self, template: &TemplateRef) -> StoreResult<Vec<PresenceRecord>> {
        let dir = self.existing_dir(template).await?;
        let mut records: Vec<PresenceRecord> = read_json_dir(&dir.join(PRESENCE_DIR)).await?;
        records.sort_by(|a, b| a.user_id.cmp(&b.user_id));
        Ok(records)
    }

    async fn put_version(&self, template: &TemplateRef, snapshot: &VersionSnapshot) -> StoreResult<()> {
        validate_id(snapshot.id())?;
        let dir = self.existing_dir(template).await?;
        let path = dir.join(VERSIONS_DIR).join(format!("{}.json", snapshot.id()));
        if tokio::fs::try_exists(&path).await? {
            // Snapshots are immutable
            return Ok(());
        }
        write_json(&path, snapshot).await
    }

    async fn get_version(&self, template: &TemplateRef, id: &str) -> StoreResult<VersionSnapshot> {
        validate_id(id)?;
        let dir = self.existing_dir(template).await?;
        read_json(&dir.join(VERSIONS_DIR).join(format!("{}.json", id)))
            .await?
            .ok_or_else(|| StoreError::VersionNotFound(id.to_string()))
    }

    async fn list_versions(&self, template: &TemplateRef) -> StoreResult<Vec<VersionSnapshot>> {
        let dir = self.existing_dir(template).await?;
        read_json_dir(&dir.join(VERSIONS_DIR)).await
    }

    async fn subscribe(&self, template: &TemplateRef) -> StoreResult<Subscription<TemplateRecord>> {
        let dir = self.existing_dir(template).await?;
        let mut watcher = FileWatcher::new(dir.clone()).map_err(watch_error)?;
        let initial = read_record(&dir, template).await?;
        let template = template.clone();

        let (tx, rx) = Subscription::channel();
        let task = tokio::spawn(async move {
            let mut last = initial.clone();
            if tx.send(initial).await.is_err() {
                return;
            }
            while let Some(event) = watcher.next_event().await {
                if !touches(&event, TEMPLATE_FILE) {
                    continue;
                }
                match read_record(&dir, &template).await {
                    Ok(record) if record != last => {
                        last = record.clone();
                        if tx.send(record).await.is_err() {
                            break;
                        }
                    }
                    Ok(_) => {}
                    Err(e) => tracing::debug!(%template, error = %e, "template not readable yet"),
                }
            }
        });
        Ok(Subscription::new(rx, task))
    }

    async fn subscribe_presence(
        &self,
        template: &TemplateRef,
    ) -> StoreResult<Subscription<Vec<PresenceRecord>>> {
        let presence_dir = self.existing_dir(template).await?.join(PRESENCE_DIR);
        tokio::fs::create_dir_all(&presence_dir).await?;
        let mut watcher = FileWatcher::new(presence_dir.clone()).map_err(watch_error)?;
        let initial = self.list_presence(template).await?;

        let (tx, rx) = Subscription::channel();
        let task = tokio::spawn(async move {
            let mut last = initial.clone();
            if tx.send(initial).await.is_err() {
                return;
            }
            while let Some(event) = watcher.next_event().await {
                if !touches_dir(&event, &presence_dir) {
                    continue;
                }
                let mut records: Vec<PresenceRecord> = match read_json_dir(&presence_dir).await {
                    Ok(records) => records,
                    Err(e) => {
                        tracing::debug!(error = %e, "presence not readable yet");
                        continue;
                    }
                };
                records.sort_by(|a, b| a.user_id.cmp(&b.user_id));
                if records != last {
                    last = records.clone();
                    if tx.send(records).await.is_err() {
                        break;
                    }
                }
            }
        });
        Ok(Subscription::new(rx, task))
    }
}

fn watch_error(e: crate::watcher::WatcherError) -> StoreError {
    match e {
        crate::watcher::WatcherError::CreateError(e) => StoreError::Watch(e),
        crate::watcher::WatcherError::WatchError(msg) => StoreError::Unavailable(msg),
    }
}
