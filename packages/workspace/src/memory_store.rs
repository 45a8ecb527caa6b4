//! In-process [`DocumentStore`] with broadcast feeds.
//!
//! Used by tests and by anything that wants the remote store semantics
//! without I/O. Reads and writes can be made to fail on demand.

use crate::feed::Subscription;
use crate::store::{
    DocumentStore, StoreError, StoreResult, TemplateRecord, TemplateRef, TemplateUpdate,
};
use async_trait::async_trait;
use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard};
use tokio::sync::broadcast;
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::StreamExt;
use wireframe_common::Millis;
use wireframe_editor::{newest_first, ChangeLogEntry, PresenceRecord, VersionSnapshot};

const BROADCAST_CAPACITY: usize = 64;

#[derive(Default)]
struct TemplateSlot {
    record: Option<TemplateRecord>,
    changes: Vec<ChangeLogEntry>,
    presence: BTreeMap<String, PresenceRecord>,
    versions: Vec<VersionSnapshot>,
    record_feed: Option<broadcast::Sender<TemplateRecord>>,
    presence_feed: Option<broadcast::Sender<Vec<PresenceRecord>>>,
}

impl TemplateSlot {
    fn record_feed(&mut self) -> broadcast::Sender<TemplateRecord> {
        self.record_feed
            .get_or_insert_with(|| broadcast::channel(BROADCAST_CAPACITY).0)
            .clone()
    }

    fn presence_feed(&mut self) -> broadcast::Sender<Vec<PresenceRecord>> {
        self.presence_feed
            .get_or_insert_with(|| broadcast::channel(BROADCAST_CAPACITY).0)
            .clone()
    }

    fn presence_list(&self) -> Vec<PresenceRecord> {
        self.presence.values().cloned().collect()
    }

    fn publish_record(&self) {
        if let (Some(feed), Some(record)) = (&self.record_feed, &self.record) {
            // No receivers is fine
            let _ = feed.send(record.clone());
        }
    }

    fn publish_presence(&self) {
        if let Some(feed) = &self.presence_feed {
            let _ = feed.send(self.presence_list());
        }
    }
}

#[derive(Default)]
pub struct MemoryStore {
    templates: Mutex<HashMap<TemplateRef, TemplateSlot>>,
    fail_reads: AtomicBool,
    fail_writes: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent read fail with [`StoreError::Unavailable`]
    pub fn set_fail_reads(&self, fail: bool) {
        self.fail_reads.store(fail, Ordering::SeqCst);
    }

    /// Make every subsequent write fail with [`StoreError::Unavailable`]
    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Stored record without going through the read-failure switch
    pub fn peek(&self, template: &TemplateRef) -> Option<TemplateRecord> {
        self.lock().get(template).and_then(|slot| slot.record.clone())
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<TemplateRef, TemplateSlot>> {
        self.templates
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn check_read(&self) -> StoreResult<()> {
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("reads disabled".to_string()));
        }
        Ok(())
    }

    fn check_write(&self) -> StoreResult<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("writes disabled".to_string()));
        }
        Ok(())
    }

    /// Run `f` on an existing template
    fn with_template<T>(
        &self,
        template: &TemplateRef,
        f: impl FnOnce(&mut TemplateSlot) -> StoreResult<T>,
    ) -> StoreResult<T> {
        let mut templates = self.lock();
        match templates.get_mut(template) {
            Some(slot) if slot.record.is_some() => f(slot),
            _ => Err(StoreError::TemplateNotFound(template.clone())),
        }
    }
}

/// Forward a broadcast receiver into a subscription, optionally starting
/// with `initial`. Lagged receivers skip ahead.
fn forward<T: Clone + Send + 'static>(
    initial: Option<T>,
    receiver: broadcast::Receiver<T>,
) -> Subscription<T> {
    let (tx, rx) = Subscription::channel();
    let task = tokio::spawn(async move {
        if let Some(value) = initial {
            if tx.send(value).await.is_err() {
                return;
            }
        }
        let mut events = BroadcastStream::new(receiver);
        while let Some(event) = events.next().await {
            match event {
                Ok(value) => {
                    if tx.send(value).await.is_err() {
                        break;
                    }
                }
                Err(e) => tracing::debug!(error = %e, "feed lagged; skipping ahead"),
            }
        }
    });
    Subscription::new(rx, task)
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn create_template(&self, project_id: &str, update: &TemplateUpdate) -> StoreResult<TemplateRef> {
        self.check_write()?;
        let template = TemplateRef::new(project_id, uuid::Uuid::new_v4().to_string());
        let mut templates = self.lock();
        let slot = templates.entry(template.clone()).or_default();
        slot.record = Some(TemplateRecord::new(update.clone()));
        slot.publish_record();
        Ok(template)
    }

    async fn load_template(&self, template: &TemplateRef) -> StoreResult<TemplateRecord> {
        self.check_read()?;
        self.with_template(template, |slot| {
            slot.record
                .clone()
                .ok_or_else(|| StoreError::TemplateNotFound(template.clone()))
        })
    }

    async fn save_template(&self, template: &TemplateRef, update: &TemplateUpdate) -> StoreResult<()> {
        self.check_write()?;
        self.with_template(template, |slot| {
            if let Some(record) = slot.record.as_mut() {
                record.apply(update);
            }
            slot.publish_record();
            Ok(())
        })
    }

    async fn list_templates(&self, project_id: &str) -> StoreResult<Vec<TemplateRef>> {
        self.check_read()?;
        let mut refs: Vec<_> = self
            .lock()
            .iter()
            .filter(|(r, slot)| r.project_id == project_id && slot.record.is_some())
            .map(|(r, _)| r.clone())
            .collect();
        refs.sort();
        Ok(refs)
    }

    async fn rename_template(&self, template: &TemplateRef, name: &str, at: Millis) -> StoreResult<()> {
        self.check_write()?;
        self.with_template(template, |slot| {
            if let Some(record) = slot.record.as_mut() {
                record.rename(name, at)?;
            }
            slot.publish_record();
            Ok(())
        })
    }

    async fn delete_template(&self, template: &TemplateRef) -> StoreResult<()> {
        self.check_write()?;
        let mut templates = self.lock();
        match templates.remove(template) {
            // Dropping the slot closes its feeds
            Some(slot) if slot.record.is_some() => Ok(()),
            _ => Err(StoreError::TemplateNotFound(template.clone())),
        }
    }

    async fn append_change(&self, template: &TemplateRef, entry: &ChangeLogEntry) -> StoreResult<()> {
        self.check_write()?;
        self.with_template(template, |slot| {
            slot.changes.push(entry.clone());
            Ok(())
        })
    }

    async fn recent_changes(&self, template: &TemplateRef, limit: usize) -> StoreResult<Vec<ChangeLogEntry>> {
        self.check_read()?;
        self.with_template(template, |slot| Ok(newest_first(slot.changes.clone(), limit)))
    }

    async fn put_presence(&self, template: &TemplateRef, record: &PresenceRecord) -> StoreResult<()> {
        self.check_write()?;
        self.with_template(template, |slot| {
            slot.presence.insert(record.user_id.clone(), record.clone());
            slot.publish_presence();
            Ok(())
        })
    }

    async fn delete_presence(&self, template: &TemplateRef, user_id: &str) -> StoreResult<()> {
        self.check_write()?;
        self.with_template(template, |slot| {
            if slot.presence.remove(user_id).is_some() {
                slot.publish_presence();
            }
            Ok(())
        })
    }

    async fn list_presence(&self, template: &TemplateRef) -> StoreResult<Vec<PresenceRecord>> {
        self.check_read()?;
        self.with_template(template, |slot| Ok(slot.presence_list()))
    }

    async fn put_version(&self, template: &TemplateRef, snapshot: &VersionSnapshot) -> StoreResult<()> {
        self.check_write()?;
        self.with_template(template, |slot| {
            if !slot.versions.iter().any(|v| v.id() == snapshot.id()) {
                slot.versions.push(snapshot.clone());
            }
            Ok(())
        })
    }

    async fn get_version(&self, template: &TemplateRef, id: &str) -> StoreResult<VersionSnapshot> {
        self.check_read()?;
        self.with_template(template, |slot| {
            slot.versions
                .iter()
                .find(|v| v.id() == id)
                .cloned()
                .ok_or_else(|| StoreError::VersionNotFound(id.to_string()))
        })
    }

    async fn list_versions(&self, template: &TemplateRef) -> StoreResult<Vec<VersionSnapshot>> {
        self.check_read()?;
        self.with_template(template, |slot| Ok(slot.versions.clone()))
    }

    async fn subscribe(&self, template: &TemplateRef) -> StoreResult<Subscription<TemplateRecord>> {
        self.check_read()?;
        let (initial, receiver) = self.with_template(template, |slot| {
            Ok((slot.record.clone(), slot.record_feed().subscribe()))
        })?;
        Ok(forward(initial, receiver))
    }

    async fn subscribe_presence(
        &self,
        template: &TemplateRef,
    ) -> StoreResult<Subscription<Vec<PresenceRecord>>> {
        self.check_read()?;
        let (initial, receiver) = self.with_template(template, |slot| {
            Ok((slot.presence_list(), slot.presence_feed().subscribe()))
        })?;
        Ok(forward(Some(initial), receiver))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wireframe_editor::{Document, Viewport};

    fn update(at: i64) -> TemplateUpdate {
        TemplateUpdate::from_document(&Document::new(at), Viewport::Mobile)
    }

    #[tokio::test]
    async fn test_create_load_save() {
        let store = MemoryStore::new();
        let template = store.create_template("p1", &update(1)).await.unwrap();

        store.save_template(&template, &update(2)).await.unwrap();
        let record = store.load_template(&template).await.unwrap();
        assert_eq!(record.updated_at, 2);
        assert_eq!(store.list_templates("p1").await.unwrap(), vec![template]);
        assert!(store.list_templates("p2").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_rename_delete_and_recent_listing() {
        let store = MemoryStore::new();
        let older = store.create_template("p1", &update(1)).await.unwrap();
        let newer = store.create_template("p1", &update(5)).await.unwrap();

        let listed = store.recent_templates("p1").await.unwrap();
        assert_eq!(listed[0].template, newer);
        assert_eq!(listed[1].display_name(), "Untitled");

        store.rename_template(&older, "Landing", 9).await.unwrap();
        let listed = store.recent_templates("p1").await.unwrap();
        assert_eq!(listed[0].template, older);
        assert_eq!(listed[0].name, "Landing");
        assert!(matches!(
            store.rename_template(&older, "", 10).await,
            Err(StoreError::InvalidName(_))
        ));

        let mut feed = store.subscribe(&newer).await.unwrap();
        feed.next().await.unwrap();
        store.delete_template(&newer).await.unwrap();
        assert!(feed.next().await.is_none());
        assert_eq!(store.list_templates("p1").await.unwrap(), vec![older]);
        assert!(matches!(
            store.delete_template(&newer).await,
            Err(StoreError::TemplateNotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_missing_template() {
        let store = MemoryStore::new();
        let result = store.load_template(&TemplateRef::new("p", "nope")).await;
        assert!(matches!(result, Err(StoreError::TemplateNotFound(_))));
    }

    #[tokio::test]
    async fn test_failure_injection() {
        let store = MemoryStore::new();
        let template = store.create_template("p1", &update(1)).await.unwrap();

        store.set_fail_writes(true);
        assert!(store.save_template(&template, &update(2)).await.is_err());
        assert_eq!(store.peek(&template).unwrap().updated_at, 1);

        store.set_fail_reads(true);
        assert!(matches!(
            store.load_template(&template).await,
            Err(StoreError::Unavailable(_))
        ));
    }

    #[tokio::test]
    async fn test_subscribe_sees_current_then_writes() {
        let store = MemoryStore::new();
        let template = store.create_template("p1", &update(1)).await.unwrap();

        let mut feed = store.subscribe(&template).await.unwrap();
        assert_eq!(feed.next().await.unwrap().updated_at, 1);

        store.save_template(&template, &update(2)).await.unwrap();
        assert_eq!(feed.next().await.unwrap().updated_at, 2);
    }

    #[tokio::test]
    async fn test_presence_feed() {
        let store = MemoryStore::new();
        let template = store.create_template("p1", &update(1)).await.unwrap();

        let mut feed = store.subscribe_presence(&template).await.unwrap();
        assert!(feed.next().await.unwrap().is_empty());

        let record = PresenceRecord::new("u1", "Ada", Viewport::Desktop, 10);
        store.put_presence(&template, &record).await.unwrap();
        assert_eq!(feed.next().await.unwrap(), vec![record]);

        store.delete_presence(&template, "u1").await.unwrap();
        assert!(feed.next().await.unwrap().is_empty());
    }
}
