//! Version snapshots against the remote store.

use crate::error::WorkspaceResult;
use crate::store::{DocumentStore, TemplateRef, TemplateUpdate};
use std::sync::Arc;
use wireframe_common::Millis;
use wireframe_editor::{
    compare_snapshots, Document, RestoreOutcome, VersionDiff, VersionLog, VersionSnapshot,
    Viewport,
};

#[derive(Clone)]
pub struct VersionService {
    store: Arc<dyn DocumentStore>,
}

impl VersionService {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    pub async fn create(
        &self,
        template: &TemplateRef,
        document: &Document,
        message: &str,
        author_id: &str,
        now: Millis,
    ) -> WorkspaceResult<VersionSnapshot> {
        let snapshot = VersionSnapshot::capture(document, message, author_id, now);
        self.store.put_version(template, &snapshot).await?;
        tracing::info!(%template, version = %snapshot.id(), "created version");
        Ok(snapshot)
    }

    /// Newest first
    pub async fn list(&self, template: &TemplateRef) -> WorkspaceResult<Vec<VersionSnapshot>> {
        Ok(self.log(template).await?.list().to_vec())
    }

    pub async fn get(&self, template: &TemplateRef, id: &str) -> WorkspaceResult<VersionSnapshot> {
        Ok(self.store.get_version(template, id).await?)
    }

    /// Save a pre-restore marker of `live`, then overwrite the remote
    /// template with the chosen snapshot. The caller installs
    /// `outcome.document` locally.
    pub async fn restore(
        &self,
        template: &TemplateRef,
        id: &str,
        live: &Document,
        active: Viewport,
        author_id: &str,
        now: Millis,
    ) -> WorkspaceResult<RestoreOutcome> {
        let target = self.store.get_version(template, id).await?;
        let mut log = VersionLog::from_snapshots([target]);
        let outcome = log.restore(id, live, author_id, now)?;

        self.store.put_version(template, &outcome.marker).await?;
        self.store
            .save_template(template, &TemplateUpdate::from_document(&outcome.document, active))
            .await?;

        tracing::info!(%template, version = %id, marker = %outcome.marker.id(), "restored version");
        Ok(outcome)
    }

    pub async fn compare(
        &self,
        template: &TemplateRef,
        from_id: &str,
        to_id: &str,
    ) -> WorkspaceResult<VersionDiff> {
        let from = self.store.get_version(template, from_id).await?;
        let to = self.store.get_version(template, to_id).await?;
        Ok(compare_snapshots(&from, &to))
    }

    async fn log(&self, template: &TemplateRef) -> WorkspaceResult<VersionLog> {
        Ok(VersionLog::from_snapshots(
            self.store.list_versions(template).await?,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::MemoryStore;
    use wireframe_editor::{Component, ComponentPayload, Rect, SnapshotKind};

    fn doc(count: usize, at: Millis) -> Document {
        let mut doc = Document::new(at);
        doc.replace_components(
            Viewport::Desktop,
            (0..count)
                .map(|i| {
                    Component::new(
                        format!("generated-{}", i),
                        Rect::new(0.0, 0.0, 10.0, 10.0),
                        ComponentPayload::Divider {},
                    )
                })
                .collect(),
        )
        .unwrap();
        doc
    }

    async fn setup() -> (Arc<MemoryStore>, TemplateRef, VersionService) {
        let store = Arc::new(MemoryStore::new());
        let template = store
            .create_template("p1", &TemplateUpdate::from_document(&doc(0, 0), Viewport::Desktop))
            .await
            .unwrap();
        let service = VersionService::new(store.clone());
        (store, template, service)
    }

    #[tokio::test]
    async fn test_list_newest_first() {
        let (_, template, service) = setup().await;
        service.create(&template, &doc(1, 0), "old", "u1", 100).await.unwrap();
        service.create(&template, &doc(2, 0), "new", "u1", 200).await.unwrap();

        let listed = service.list(&template).await.unwrap();
        let messages: Vec<_> = listed.iter().map(|s| s.message()).collect();
        assert_eq!(messages, vec!["new", "old"]);
    }

    #[tokio::test]
    async fn test_restore_writes_marker_and_template() {
        let (store, template, service) = setup().await;
        let v1 = service.create(&template, &doc(1, 0), "one", "u1", 100).await.unwrap();

        let live = doc(3, 150);
        let outcome = service
            .restore(&template, v1.id(), &live, Viewport::Desktop, "u1", 200)
            .await
            .unwrap();

        let remote = store.peek(&template).unwrap();
        assert_eq!(remote.to_document().components(Viewport::Desktop).len(), 1);
        assert_eq!(remote.updated_at, 200);

        let listed = service.list(&template).await.unwrap();
        assert_eq!(listed.len(), 2);
        assert_eq!(listed[0].kind(), SnapshotKind::PreRestore);
        assert_eq!(listed[0].id(), outcome.marker.id());

        let diff = service.compare(&template, v1.id(), outcome.marker.id()).await.unwrap();
        assert_eq!(diff.viewports[&Viewport::Desktop].component_count, 2);
    }

    #[tokio::test]
    async fn test_restore_unknown_version() {
        let (_, template, service) = setup().await;
        let result = service
            .restore(&template, "missing", &doc(0, 0), Viewport::Desktop, "u1", 1)
            .await;
        assert!(result.is_err());
    }
}
