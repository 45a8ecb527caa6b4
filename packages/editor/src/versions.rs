//! # Version Snapshots
//!
//! Named, immutable copies of the whole document. Restoring a snapshot
//! first captures the live state as a "pre-restore" snapshot, so any
//! restore can itself be undone by restoring that marker.
//!
//! ```text
//! live ──create──► S1
//! live ──restore(S1)──► marker M (copy of live) ──► live := S1
//! live ──restore(M)───► marker M' ──► live := pre-S1 state
//! ```

use crate::{Document, EditorError, EditorResult, Viewport};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use wireframe_common::Millis;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SnapshotKind {
    #[default]
    Manual,
    PreRestore,
}

/// Immutable full-document snapshot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VersionSnapshot {
    id: String,
    document: Document,
    message: String,
    author_id: String,
    created_at: Millis,
    component_counts: BTreeMap<Viewport, usize>,
    #[serde(default)]
    kind: SnapshotKind,
}

impl VersionSnapshot {
    /// Copy `document` into a new snapshot with a fresh id
    pub fn capture(
        document: &Document,
        message: impl Into<String>,
        author_id: impl Into<String>,
        now: Millis,
    ) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            component_counts: document.component_counts(),
            document: document.clone(),
            message: message.into(),
            author_id: author_id.into(),
            created_at: now,
            kind: SnapshotKind::Manual,
        }
    }

    /// Snapshot of the live state taken just before restoring `restoring_id`
    pub fn pre_restore(
        document: &Document,
        restoring_id: &str,
        author_id: impl Into<String>,
        now: Millis,
    ) -> Self {
        Self {
            kind: SnapshotKind::PreRestore,
            ..Self::capture(
                document,
                format!("Before restoring {}", restoring_id),
                author_id,
                now,
            )
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn document(&self) -> &Document {
        &self.document
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn author_id(&self) -> &str {
        &self.author_id
    }

    pub fn created_at(&self) -> Millis {
        self.created_at
    }

    pub fn component_counts(&self) -> &BTreeMap<Viewport, usize> {
        &self.component_counts
    }

    pub fn kind(&self) -> SnapshotKind {
        self.kind
    }
}

/// Per-viewport change between two snapshots (`to - from`)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ViewportDelta {
    pub component_count: i64,
    pub canvas_width: f64,
    pub canvas_height: f64,
}

impl ViewportDelta {
    pub fn is_zero(&self) -> bool {
        self.component_count == 0 && self.canvas_width == 0.0 && self.canvas_height == 0.0
    }
}

/// Coarse structural diff: counts and canvas sizes, not fields
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VersionDiff {
    pub from_id: String,
    pub to_id: String,
    pub viewports: BTreeMap<Viewport, ViewportDelta>,
}

impl VersionDiff {
    pub fn is_unchanged(&self) -> bool {
        self.viewports.values().all(ViewportDelta::is_zero)
    }
}

pub fn compare(from: &VersionSnapshot, to: &VersionSnapshot) -> VersionDiff {
    let viewports = Viewport::ALL
        .into_iter()
        .map(|viewport| {
            let count = |s: &VersionSnapshot| s.document.components(viewport).len() as i64;
            let a = from.document.canvas_size(viewport);
            let b = to.document.canvas_size(viewport);
            (
                viewport,
                ViewportDelta {
                    component_count: count(to) - count(from),
                    canvas_width: b.width - a.width,
                    canvas_height: b.height - a.height,
                },
            )
        })
        .collect();

    VersionDiff {
        from_id: from.id.clone(),
        to_id: to.id.clone(),
        viewports,
    }
}

/// Result of restoring a snapshot
#[derive(Debug, Clone)]
pub struct RestoreOutcome {
    /// The document that should replace the live one
    pub document: Document,
    /// Snapshot of the state that was overwritten
    pub marker: VersionSnapshot,
}

/// Snapshots of one document, kept newest-first
#[derive(Debug, Clone, Default)]
pub struct VersionLog {
    snapshots: Vec<VersionSnapshot>,
}

impl VersionLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from snapshots in any order
    pub fn from_snapshots(snapshots: impl IntoIterator<Item = VersionSnapshot>) -> Self {
        let mut log = Self::new();
        for snapshot in snapshots {
            log.insert(snapshot);
        }
        log
    }

    /// Insert keeping newest-first order; on equal timestamps the later
    /// insert sorts first
    pub fn insert(&mut self, snapshot: VersionSnapshot) {
        if self.get(&snapshot.id).is_some() {
            return;
        }
        let at = self
            .snapshots
            .iter()
            .position(|s| s.created_at <= snapshot.created_at)
            .unwrap_or(self.snapshots.len());
        self.snapshots.insert(at, snapshot);
    }

    pub fn create(
        &mut self,
        document: &Document,
        message: impl Into<String>,
        author_id: impl Into<String>,
        now: Millis,
    ) -> VersionSnapshot {
        let snapshot = VersionSnapshot::capture(document, message, author_id, now);
        self.insert(snapshot.clone());
        snapshot
    }

    pub fn list(&self) -> &[VersionSnapshot] {
        &self.snapshots
    }

    pub fn get(&self, id: &str) -> Option<&VersionSnapshot> {
        self.snapshots.iter().find(|s| s.id == id)
    }

    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }

    /// Capture `live` as a pre-restore marker, then hand back the target
    /// snapshot's document for the caller to install.
    pub fn restore(
        &mut self,
        id: &str,
        live: &Document,
        author_id: impl Into<String>,
        now: Millis,
    ) -> EditorResult<RestoreOutcome> {
        let target = self
            .get(id)
            .ok_or_else(|| EditorError::SnapshotNotFound(id.to_string()))?;

        let mut document = target.document.clone();
        document.touch(now);

        let marker = VersionSnapshot::pre_restore(live, id, author_id, now);
        self.insert(marker.clone());

        Ok(RestoreOutcome { document, marker })
    }

    pub fn compare(&self, from_id: &str, to_id: &str) -> EditorResult<VersionDiff> {
        let from = self
            .get(from_id)
            .ok_or_else(|| EditorError::SnapshotNotFound(from_id.to_string()))?;
        let to = self
            .get(to_id)
            .ok_or_else(|| EditorError::SnapshotNotFound(to_id.to_string()))?;
        Ok(compare(from, to))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Component, ComponentPayload, Rect};

    fn doc_with(mobile: usize, desktop: usize) -> Document {
        let mut doc = Document::new(0);
        let make = |n: usize, offset: f64| {
            (0..n)
                .map(|i| {
                    Component::new(
                        format!("generated-{}", i),
                        Rect::new(0.0, offset + i as f64 * 10.0, 10.0, 10.0),
                        ComponentPayload::Divider {},
                    )
                })
                .collect::<Vec<_>>()
        };
        doc.replace_components(Viewport::Mobile, make(mobile, 0.0)).unwrap();
        doc.replace_components(Viewport::Desktop, make(desktop, 0.0)).unwrap();
        doc
    }

    #[test]
    fn test_snapshot_stamps_counts() {
        let snapshot = VersionSnapshot::capture(&doc_with(2, 5), "first", "u1", 10);
        assert_eq!(snapshot.component_counts()[&Viewport::Mobile], 2);
        assert_eq!(snapshot.component_counts()[&Viewport::Desktop], 5);
        assert_eq!(snapshot.component_counts()[&Viewport::Tablet], 0);
        assert_eq!(snapshot.kind(), SnapshotKind::Manual);
    }

    #[test]
    fn test_list_is_newest_first() {
        let mut log = VersionLog::new();
        let doc = doc_with(0, 0);
        log.create(&doc, "b", "u", 200);
        log.create(&doc, "a", "u", 100);
        log.create(&doc, "c", "u", 300);

        let messages: Vec<_> = log.list().iter().map(|s| s.message()).collect();
        assert_eq!(messages, vec!["c", "b", "a"]);
    }

    #[test]
    fn test_restore_is_reversible() {
        let mut log = VersionLog::new();
        let s1 = log.create(&doc_with(1, 1), "s1", "u", 100);

        let live = doc_with(4, 2);
        let before = live.component_counts();

        let outcome = log.restore(s1.id(), &live, "u", 200).unwrap();
        assert_eq!(outcome.marker.kind(), SnapshotKind::PreRestore);
        assert_eq!(outcome.document.component_counts(), s1.document().component_counts());
        let live = outcome.document;

        let back = log.restore(outcome.marker.id(), &live, "u", 300).unwrap();
        assert_eq!(back.document.component_counts(), before);
        assert_eq!(log.len(), 3);
        assert_eq!(log.list()[0].message(), format!("Before restoring {}", outcome.marker.id()));
    }

    #[test]
    fn test_restore_unknown_id() {
        let mut log = VersionLog::new();
        let result = log.restore("missing", &doc_with(0, 0), "u", 1);
        assert!(matches!(result, Err(EditorError::SnapshotNotFound(_))));
        assert!(log.is_empty());
    }

    #[test]
    fn test_compare_counts_and_canvas() {
        let mut log = VersionLog::new();
        let a = log.create(&doc_with(1, 0), "a", "u", 1);

        let mut tall = doc_with(3, 0);
        tall.replace_components(
            Viewport::Tablet,
            vec![Component::new(
                "t",
                Rect::new(0.0, 1000.0, 10.0, 100.0),
                ComponentPayload::Divider {},
            )],
        )
        .unwrap();
        let b = log.create(&tall, "b", "u", 2);

        let diff = log.compare(a.id(), b.id()).unwrap();
        assert_eq!(diff.viewports[&Viewport::Mobile].component_count, 2);
        assert_eq!(diff.viewports[&Viewport::Tablet].component_count, 1);
        assert_eq!(diff.viewports[&Viewport::Tablet].canvas_height, 1200.0 - 1024.0);
        assert!(diff.viewports[&Viewport::Desktop].is_zero());
        assert!(!diff.is_unchanged());
        assert!(log.compare(a.id(), a.id()).unwrap().is_unchanged());
    }
}
