//! # Local Drafts
//!
//! A draft is an unsaved working copy kept in client-local storage under
//! `draft:<documentId>` (or `draft:unassigned` before the template has an
//! id). On open, a fresh draft is offered for resume instead of loading the
//! remote copy; a stale or unreadable one is thrown away.

use crate::{Document, EditorResult, Theme, Viewport, ViewportState};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;
use wireframe_common::{KeyValueStore, Millis};

/// Drafts older than this are never offered
pub const DRAFT_FRESHNESS_MS: Millis = 60 * 60 * 1000;

pub const UNASSIGNED_DRAFT: &str = "unassigned";
const DRAFT_PREFIX: &str = "draft:";

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum DraftKey {
    Document(String),
    Unassigned,
}

impl DraftKey {
    pub fn for_document(document_id: Option<&str>) -> Self {
        match document_id {
            Some(id) if !id.is_empty() && id != UNASSIGNED_DRAFT => DraftKey::Document(id.to_string()),
            _ => DraftKey::Unassigned,
        }
    }

    pub fn storage_key(&self) -> String {
        format!("{}{}", DRAFT_PREFIX, self)
    }

    fn from_storage_key(key: &str) -> Option<Self> {
        key.strip_prefix(DRAFT_PREFIX)
            .map(|id| Self::for_document(Some(id)))
    }
}

impl fmt::Display for DraftKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DraftKey::Document(id) => f.write_str(id),
            DraftKey::Unassigned => f.write_str(UNASSIGNED_DRAFT),
        }
    }
}

/// Stored value of a draft
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DraftPayload {
    pub viewports: BTreeMap<Viewport, ViewportState>,
    pub theme: Theme,
    pub canvas_width: f64,
    pub canvas_height: f64,
    pub updated_at: Millis,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LocalDraft {
    pub key: DraftKey,
    pub payload: DraftPayload,
}

impl LocalDraft {
    /// Working copy of `document`; top-level canvas size follows `active`
    pub fn capture(key: DraftKey, document: &Document, active: Viewport, now: Millis) -> Self {
        let canvas = document.canvas_size(active);
        Self {
            key,
            payload: DraftPayload {
                viewports: document.viewports().clone(),
                theme: document.theme.clone(),
                canvas_width: canvas.width,
                canvas_height: canvas.height,
                updated_at: now,
            },
        }
    }

    pub fn age(&self, now: Millis) -> Millis {
        now.saturating_sub(self.payload.updated_at)
    }

    pub fn to_document(&self) -> Document {
        Document::from_parts(
            self.payload.viewports.clone(),
            self.payload.theme.clone(),
            self.payload.updated_at,
        )
    }
}

/// Outcome of checking for a draft when opening a document
#[derive(Debug, Clone, PartialEq)]
pub enum DraftCheck {
    /// Offer this draft for resume
    Resume(LocalDraft),
    /// No usable draft; load the authoritative copy
    LoadRemote,
}

/// Draft persistence over an injected key-value store
#[derive(Clone)]
pub struct Drafts {
    store: Arc<dyn KeyValueStore>,
    freshness_ms: Millis,
}

impl Drafts {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self::with_freshness(store, DRAFT_FRESHNESS_MS)
    }

    pub fn with_freshness(store: Arc<dyn KeyValueStore>, freshness_ms: Millis) -> Self {
        Self {
            store,
            freshness_ms,
        }
    }

    pub fn save(&self, draft: &LocalDraft) -> EditorResult<()> {
        let json = serde_json::to_string(&draft.payload)?;
        self.store.set(&draft.key.storage_key(), &json)?;
        tracing::debug!(key = %draft.key, "saved local draft");
        Ok(())
    }

    /// Read a draft. An unparsable value is removed and reported as absent.
    pub fn load(&self, key: &DraftKey) -> EditorResult<Option<LocalDraft>> {
        let Some(raw) = self.store.get(&key.storage_key())? else {
            return Ok(None);
        };

        match serde_json::from_str::<DraftPayload>(&raw) {
            Ok(payload) => Ok(Some(LocalDraft {
                key: key.clone(),
                payload,
            })),
            Err(e) => {
                tracing::warn!(key = %key, error = %e, "discarding corrupted local draft");
                self.store.remove(&key.storage_key())?;
                Ok(None)
            }
        }
    }

    /// Decide between resuming a draft and loading remotely.
    ///
    /// Drafts past the freshness window are deleted on the way.
    pub fn check(&self, key: &DraftKey, now: Millis) -> EditorResult<DraftCheck> {
        match self.load(key)? {
            Some(draft) if draft.age(now) <= self.freshness_ms => Ok(DraftCheck::Resume(draft)),
            Some(draft) => {
                tracing::debug!(key = %key, age_ms = draft.age(now), "dropping stale local draft");
                self.discard(key)?;
                Ok(DraftCheck::LoadRemote)
            }
            None => Ok(DraftCheck::LoadRemote),
        }
    }

    pub fn discard(&self, key: &DraftKey) -> EditorResult<()> {
        self.store.remove(&key.storage_key())?;
        Ok(())
    }

    /// After a confirmed save: drop the document's draft and the
    /// unassigned one so neither prompts for resume later
    pub fn clear_after_save(&self, document_id: &str) -> EditorResult<()> {
        self.discard(&DraftKey::for_document(Some(document_id)))?;
        self.discard(&DraftKey::Unassigned)?;
        Ok(())
    }

    pub fn keys(&self) -> EditorResult<Vec<DraftKey>> {
        Ok(self
            .store
            .keys(DRAFT_PREFIX)?
            .iter()
            .filter_map(|k| DraftKey::from_storage_key(k))
            .collect())
    }
}

/// Gate for debounced autosave.
///
/// Loading a document counts as the mount and never saves by itself; after
/// that, only a non-empty document is worth persisting.
#[derive(Debug, Default)]
pub struct AutosaveGuard {
    mounted: bool,
}

impl AutosaveGuard {
    pub fn new() -> Self {
        Self::default()
    }

    /// A document was just installed
    pub fn mount(&mut self) {
        self.mounted = true;
    }

    /// The document was closed
    pub fn reset(&mut self) {
        self.mounted = false;
    }

    pub fn should_save(&self, document: Option<&Document>) -> bool {
        self.mounted && matches!(document, Some(doc) if !doc.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Component, ComponentPayload, Rect};
    use wireframe_common::MemoryKeyValueStore;

    fn sample_doc() -> Document {
        let mut doc = Document::new(0);
        doc.replace_components(
            Viewport::Mobile,
            vec![Component::new(
                "generated-0",
                Rect::new(1.0, 2.0, 3.0, 4.0),
                ComponentPayload::Divider {},
            )],
        )
        .unwrap();
        doc
    }

    fn drafts() -> (Arc<MemoryKeyValueStore>, Drafts) {
        let store = Arc::new(MemoryKeyValueStore::new());
        (store.clone(), Drafts::new(store))
    }

    #[test]
    fn test_key_format() {
        assert_eq!(DraftKey::for_document(Some("t1")).storage_key(), "draft:t1");
        assert_eq!(DraftKey::for_document(None).storage_key(), "draft:unassigned");
        assert_eq!(DraftKey::for_document(Some("")), DraftKey::Unassigned);
    }

    #[test]
    fn test_fresh_draft_offered() {
        let (_, drafts) = drafts();
        let key = DraftKey::for_document(Some("t1"));
        drafts
            .save(&LocalDraft::capture(key.clone(), &sample_doc(), Viewport::Mobile, 1_000))
            .unwrap();

        match drafts.check(&key, 1_000 + DRAFT_FRESHNESS_MS).unwrap() {
            DraftCheck::Resume(draft) => {
                assert_eq!(draft.to_document().components(Viewport::Mobile).len(), 1);
                assert_eq!(draft.payload.canvas_width, 375.0);
            }
            other => panic!("expected resume, got {:?}", other),
        }
    }

    #[test]
    fn test_stale_draft_never_offered() {
        let (store, drafts) = drafts();
        let key = DraftKey::for_document(Some("t1"));
        drafts
            .save(&LocalDraft::capture(key.clone(), &sample_doc(), Viewport::Mobile, 1_000))
            .unwrap();

        let check = drafts.check(&key, 1_000 + DRAFT_FRESHNESS_MS + 1).unwrap();
        assert_eq!(check, DraftCheck::LoadRemote);
        assert_eq!(store.get("draft:t1").unwrap(), None);
    }

    #[test]
    fn test_corrupted_draft_discarded() {
        let (store, drafts) = drafts();
        store.set("draft:t1", "{not json").unwrap();

        let key = DraftKey::for_document(Some("t1"));
        assert_eq!(drafts.check(&key, 0).unwrap(), DraftCheck::LoadRemote);
        assert_eq!(store.get("draft:t1").unwrap(), None);
    }

    #[test]
    fn test_clear_after_save_removes_both_keys() {
        let (store, drafts) = drafts();
        let doc = sample_doc();
        drafts
            .save(&LocalDraft::capture(DraftKey::Unassigned, &doc, Viewport::Mobile, 0))
            .unwrap();
        drafts
            .save(&LocalDraft::capture(DraftKey::for_document(Some("t1")), &doc, Viewport::Mobile, 0))
            .unwrap();
        assert_eq!(drafts.keys().unwrap().len(), 2);

        drafts.clear_after_save("t1").unwrap();
        assert!(store.keys("draft:").unwrap().is_empty());
    }

    #[test]
    fn test_autosave_guard() {
        let mut guard = AutosaveGuard::new();
        let doc = sample_doc();

        assert!(!guard.should_save(Some(&doc)), "nothing mounted yet");

        guard.mount();
        assert!(guard.should_save(Some(&doc)));
        assert!(!guard.should_save(Some(&Document::new(0))), "empty document");
        assert!(!guard.should_save(None), "nothing loaded");

        guard.reset();
        assert!(!guard.should_save(Some(&doc)));
    }
}
