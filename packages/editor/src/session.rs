//! # Edit Session
//!
//! One client's view of one document. Every local change goes through
//! [`EditSession::apply`], which validates the edit, swaps in new
//! per-viewport arrays, pushes a history snapshot and emits change log
//! entries. Remote snapshots go through [`EditSession::apply_remote`] and
//! never touch history.
//!
//! ```text
//! CLOSED ─open─► CHECK_DRAFT ─offer─► RESUME_DRAFT ─accept─► OPEN(dirty)
//!                     │                    │ decline
//!                     └────────────────────┴──► LOAD_REMOTE ─finish─► OPEN(clean)
//!                                                    │ fail
//!                                                    └──► CLOSED
//! OPEN(clean) ─edit─► OPEN(dirty) ─save─► OPEN(clean) ─close─► CLOSED
//! ```
//!
//! Collaboration is a flag on top of OPEN, not a phase of its own.

use crate::{
    Actor, AutosaveGuard, ChangeAction, ChangeLog, ChangeLogEntry, Component, ComponentPayload, ConflictDetector,
    ConflictNotice, ConflictResolution, Document, DraftCheck, DraftKey, EditorError, EditorResult,
    HistoryStack, IdAllocator, LocalDraft, Rect, Style, Theme, Viewport, DEFAULT_CONFLICT_WINDOW_MS,
    DEFAULT_HISTORY_LIMIT,
};
use serde_json::json;
use std::collections::HashMap;
use wireframe_common::Millis;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    Closed,
    CheckDraft,
    ResumeDraft,
    LoadRemote,
    Open { dirty: bool },
}

impl SessionPhase {
    pub fn name(&self) -> &'static str {
        match self {
            SessionPhase::Closed => "closed",
            SessionPhase::CheckDraft => "checking for a draft",
            SessionPhase::ResumeDraft => "offering a draft",
            SessionPhase::LoadRemote => "loading",
            SessionPhase::Open { dirty: false } => "open",
            SessionPhase::Open { dirty: true } => "open with unsaved changes",
        }
    }

    pub fn is_open(&self) -> bool {
        matches!(self, SessionPhase::Open { .. })
    }
}

/// A local change to the open document
#[derive(Debug, Clone, PartialEq)]
pub enum Edit {
    /// Append a new component on top of the viewport's z-order
    Insert {
        viewport: Viewport,
        rect: Rect,
        payload: ComponentPayload,
        style: Style,
    },
    /// Move and/or resize
    Transform {
        viewport: Viewport,
        id: String,
        rect: Rect,
    },
    /// Merge style properties; an empty value removes the property
    UpdateStyle {
        viewport: Viewport,
        id: String,
        style: Style,
    },
    /// Replace kind-specific fields; the kind itself cannot change
    UpdatePayload {
        viewport: Viewport,
        id: String,
        payload: ComponentPayload,
    },
    /// Change z-order by moving the component to `index`
    Reorder {
        viewport: Viewport,
        id: String,
        index: usize,
    },
    Remove {
        viewport: Viewport,
        id: String,
    },
    SetTheme(Theme),
    /// Fill an empty viewport from another one
    CloneViewport { from: Viewport, to: Viewport },
    /// Bulk replace, e.g. an import. Components with an empty id get a
    /// freshly allocated one.
    ReplaceViewport {
        viewport: Viewport,
        components: Vec<Component>,
    },
}

impl Edit {
    pub fn viewport(&self) -> Option<Viewport> {
        match self {
            Edit::Insert { viewport, .. }
            | Edit::Transform { viewport, .. }
            | Edit::UpdateStyle { viewport, .. }
            | Edit::UpdatePayload { viewport, .. }
            | Edit::Reorder { viewport, .. }
            | Edit::Remove { viewport, .. }
            | Edit::ReplaceViewport { viewport, .. } => Some(*viewport),
            Edit::CloneViewport { to, .. } => Some(*to),
            Edit::SetTheme(_) => None,
        }
    }
}

/// What an applied edit did
#[derive(Debug, Clone, PartialEq)]
pub struct Applied {
    pub description: String,
    /// Viewport whose array changed, if any
    pub viewport: Option<Viewport>,
    pub entries: Vec<ChangeLogEntry>,
    /// Id allocated by an insert
    pub inserted_id: Option<String>,
}

/// Answer to switching the active viewport
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewportSwitch {
    Ready,
    /// The target is empty; offer to fill it from `from`
    OfferClone { from: Viewport, count: usize },
}

#[derive(Debug, Clone, Copy)]
pub struct SessionConfig {
    pub history_limit: usize,
    pub conflict_window_ms: Millis,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            history_limit: DEFAULT_HISTORY_LIMIT,
            conflict_window_ms: DEFAULT_CONFLICT_WINDOW_MS,
        }
    }
}

pub struct EditSession {
    actor: Actor,
    config: SessionConfig,
    phase: SessionPhase,
    collab_active: bool,
    document_id: Option<String>,
    document: Option<Document>,
    history: Option<HistoryStack>,
    ids: IdAllocator,
    change_log: ChangeLog,
    detector: ConflictDetector,
    active_viewport: Viewport,
    selection: Option<String>,
    offered_draft: Option<LocalDraft>,
    pending_conflict: Option<ConflictNotice>,
    autosave: AutosaveGuard,
}

impl EditSession {
    pub fn new(actor: Actor) -> Self {
        Self::with_config(actor, SessionConfig::default())
    }

    pub fn with_config(actor: Actor, config: SessionConfig) -> Self {
        Self {
            actor,
            config,
            phase: SessionPhase::Closed,
            collab_active: false,
            document_id: None,
            document: None,
            history: None,
            ids: IdAllocator::new(),
            change_log: ChangeLog::new(),
            detector: ConflictDetector::new(config.conflict_window_ms),
            active_viewport: Viewport::Mobile,
            selection: None,
            offered_draft: None,
            pending_conflict: None,
            autosave: AutosaveGuard::new(),
        }
    }

    pub fn actor(&self) -> &Actor {
        &self.actor
    }

    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    pub fn is_open(&self) -> bool {
        self.phase.is_open()
    }

    pub fn is_dirty(&self) -> bool {
        matches!(self.phase, SessionPhase::Open { dirty: true })
    }

    pub fn collab_active(&self) -> bool {
        self.collab_active
    }

    pub fn document_id(&self) -> Option<&str> {
        self.document_id.as_deref()
    }

    pub fn document(&self) -> Option<&Document> {
        self.document.as_ref()
    }

    pub fn history(&self) -> Option<&HistoryStack> {
        self.history.as_ref()
    }

    pub fn ids(&self) -> &IdAllocator {
        &self.ids
    }

    pub fn change_log(&self) -> &ChangeLog {
        &self.change_log
    }

    pub fn active_viewport(&self) -> Viewport {
        self.active_viewport
    }

    pub fn selection(&self) -> Option<&str> {
        self.selection.as_deref()
    }

    pub fn offered_draft(&self) -> Option<&LocalDraft> {
        self.offered_draft.as_ref()
    }

    pub fn pending_conflict(&self) -> Option<&ConflictNotice> {
        self.pending_conflict.as_ref()
    }

    pub fn draft_key(&self) -> DraftKey {
        DraftKey::for_document(self.document_id.as_deref())
    }

    // ------------------------------------------------------------------
    // Lifecycle
    // ------------------------------------------------------------------

    /// Start opening a document. Returns the draft key to check.
    pub fn open(&mut self, document_id: Option<String>) -> EditorResult<DraftKey> {
        self.expect_phase(SessionPhase::Closed, "open a document")?;
        self.document_id = document_id;
        self.transition(SessionPhase::CheckDraft);
        Ok(self.draft_key())
    }

    /// Feed in the result of the draft check
    pub fn offer_draft(&mut self, check: DraftCheck) -> EditorResult<()> {
        self.expect_phase(SessionPhase::CheckDraft, "offer a draft")?;
        match check {
            DraftCheck::Resume(draft) => {
                self.offered_draft = Some(draft);
                self.transition(SessionPhase::ResumeDraft);
            }
            DraftCheck::LoadRemote => self.transition(SessionPhase::LoadRemote),
        }
        Ok(())
    }

    /// Resume the offered draft. The session opens dirty since the draft was
    /// never saved remotely.
    pub fn accept_draft(&mut self) -> EditorResult<&Document> {
        self.expect_phase(SessionPhase::ResumeDraft, "resume a draft")?;
        let draft = self
            .offered_draft
            .take()
            .ok_or(EditorError::NoDocument)?;
        self.install(draft.to_document());
        self.transition(SessionPhase::Open { dirty: true });
        self.document.as_ref().ok_or(EditorError::NoDocument)
    }

    /// Decline the offered draft and fall through to the remote load.
    /// Returns the key of the draft to throw away.
    pub fn decline_draft(&mut self) -> EditorResult<DraftKey> {
        self.expect_phase(SessionPhase::ResumeDraft, "decline a draft")?;
        let key = self
            .offered_draft
            .take()
            .map(|d| d.key)
            .unwrap_or_else(|| self.draft_key());
        self.transition(SessionPhase::LoadRemote);
        Ok(key)
    }

    pub fn finish_remote_load(&mut self, document: Document) -> EditorResult<()> {
        self.expect_phase(SessionPhase::LoadRemote, "finish loading")?;
        self.install(document);
        self.transition(SessionPhase::Open { dirty: false });
        Ok(())
    }

    /// Remote read failed; nothing was installed
    pub fn fail_remote_load(&mut self) -> EditorResult<()> {
        self.expect_phase(SessionPhase::LoadRemote, "fail loading")?;
        self.close();
        Ok(())
    }

    /// Drop the document and every piece of per-document state
    pub fn close(&mut self) {
        self.document = None;
        self.document_id = None;
        self.history = None;
        self.change_log.clear();
        self.collab_active = false;
        self.selection = None;
        self.offered_draft = None;
        self.pending_conflict = None;
        self.autosave.reset();
        self.transition(SessionPhase::Closed);
    }

    /// The document now has a remote identity (first save of a new template)
    pub fn assign_document_id(&mut self, document_id: impl Into<String>) {
        self.document_id = Some(document_id.into());
    }

    pub fn mark_saved(&mut self) -> EditorResult<()> {
        self.require_open("mark saved")?;
        self.transition(SessionPhase::Open { dirty: false });
        Ok(())
    }

    pub fn set_collaboration(&mut self, active: bool) -> EditorResult<()> {
        if active {
            self.require_open("start collaboration")?;
        }
        if self.collab_active != active {
            tracing::debug!(active, "collaboration toggled");
        }
        self.collab_active = active;
        Ok(())
    }

    fn install(&mut self, document: Document) {
        for (viewport, id) in document.duplicate_ids() {
            tracing::warn!(%viewport, %id, "document contains duplicate component id");
        }
        self.ids.resync(&document);
        self.history = Some(HistoryStack::with_max_levels(
            document.content(),
            self.config.history_limit,
        ));
        self.document = Some(document);
        self.change_log.clear();
        self.pending_conflict = None;
        self.selection = None;
        self.autosave.reset();
        self.autosave.mount();
    }

    fn transition(&mut self, next: SessionPhase) {
        if self.phase != next {
            tracing::debug!(from = self.phase.name(), to = next.name(), "session transition");
        }
        self.phase = next;
    }

    fn expect_phase(&self, expected: SessionPhase, action: &'static str) -> EditorResult<()> {
        if self.phase == expected {
            Ok(())
        } else {
            Err(self.invalid(action))
        }
    }

    fn require_open(&self, action: &'static str) -> EditorResult<()> {
        if self.phase.is_open() {
            Ok(())
        } else {
            Err(self.invalid(action))
        }
    }

    fn invalid(&self, action: &'static str) -> EditorError {
        EditorError::InvalidTransition {
            phase: self.phase.name(),
            action,
        }
    }

    // ------------------------------------------------------------------
    // Viewports and selection
    // ------------------------------------------------------------------

    /// Make `viewport` active. An empty target with content on mobile gets
    /// a clone offer.
    pub fn switch_viewport(&mut self, viewport: Viewport) -> ViewportSwitch {
        self.active_viewport = viewport;
        self.selection = None;

        let Some(document) = self.document.as_ref() else {
            return ViewportSwitch::Ready;
        };
        let source = Viewport::Mobile;
        let count = document.components(source).len();
        if viewport != source && document.components(viewport).is_empty() && count > 0 {
            ViewportSwitch::OfferClone {
                from: source,
                count,
            }
        } else {
            ViewportSwitch::Ready
        }
    }

    pub fn select(&mut self, id: Option<String>) {
        self.selection = id;
    }

    // ------------------------------------------------------------------
    // Edits
    // ------------------------------------------------------------------

    /// Apply a local edit: new arrays, one history entry, change log
    /// entries. Any pending conflict notice is superseded.
    pub fn apply(&mut self, edit: Edit, now: Millis) -> EditorResult<Applied> {
        self.require_open("apply an edit")?;
        let document = self.document.as_mut().ok_or(EditorError::NoDocument)?;
        let actor = &self.actor;
        let entry = |action, id: &str, viewport, details| {
            ChangeLogEntry::new(actor, action, id, viewport, now, details)
        };

        let viewport = edit.viewport();
        let mut entries = Vec::new();
        let mut inserted_id = None;

        let description = match edit {
            Edit::Insert {
                viewport,
                rect,
                payload,
                style,
            } => {
                if !rect.is_valid() {
                    return Err(EditorError::InvalidBox {
                        id: format!("new {}", payload.kind()),
                    });
                }
                let kind = payload.kind();
                let id = self.ids.allocate();
                let component = Component::new(id.clone(), rect, payload).with_style(style);

                let mut list = document.components(viewport).to_vec();
                list.push(component);
                document.replace_components(viewport, list)?;

                entries.push(entry(
                    ChangeAction::Add,
                    &id,
                    viewport,
                    json!({ "kind": kind, "box": rect }),
                ));
                inserted_id = Some(id);
                format!("Insert {}", kind)
            }

            Edit::Transform { viewport, id, rect } => {
                if !rect.is_valid() {
                    return Err(EditorError::InvalidBox { id });
                }
                let mut list = document.components(viewport).to_vec();
                let index = position(&list, viewport, &id)?;
                let old = list[index].rect;
                list[index].rect = rect;
                document.replace_components(viewport, list)?;

                let action = ChangeAction::classify(&old, &rect);
                entries.push(entry(action, &id, viewport, json!({ "from": old, "to": rect })));
                format!("{} {}", capitalized(action), id)
            }

            Edit::UpdateStyle {
                viewport,
                id,
                style,
            } => {
                let mut list = document.components(viewport).to_vec();
                let index = position(&list, viewport, &id)?;
                list[index].style.merge(&style);
                document.replace_components(viewport, list)?;

                entries.push(entry(ChangeAction::Update, &id, viewport, json!({ "style": style })));
                format!("Style {}", id)
            }

            Edit::UpdatePayload {
                viewport,
                id,
                payload,
            } => {
                let mut list = document.components(viewport).to_vec();
                let index = position(&list, viewport, &id)?;
                let expected = list[index].kind();
                if payload.kind() != expected {
                    return Err(EditorError::KindMismatch {
                        id,
                        expected,
                        found: payload.kind(),
                    });
                }
                list[index].payload = payload;
                document.replace_components(viewport, list)?;

                entries.push(entry(ChangeAction::Update, &id, viewport, json!({ "kind": expected })));
                format!("Edit {}", id)
            }

            Edit::Reorder {
                viewport,
                id,
                index,
            } => {
                let mut list = document.components(viewport).to_vec();
                let from = position(&list, viewport, &id)?;
                let component = list.remove(from);
                let to = index.min(list.len());
                list.insert(to, component);
                document.replace_components(viewport, list)?;

                entries.push(entry(
                    ChangeAction::Update,
                    &id,
                    viewport,
                    json!({ "zIndex": { "from": from, "to": to } }),
                ));
                format!("Reorder {}", id)
            }

            Edit::Remove { viewport, id } => {
                let mut list = document.components(viewport).to_vec();
                let index = position(&list, viewport, &id)?;
                let removed = list.remove(index);
                document.replace_components(viewport, list)?;

                entries.push(entry(
                    ChangeAction::Delete,
                    &id,
                    viewport,
                    json!({ "kind": removed.kind() }),
                ));
                format!("Delete {}", id)
            }

            Edit::SetTheme(theme) => {
                let description = format!("Theme {}", theme.name);
                document.theme = theme;
                description
            }

            Edit::CloneViewport { from, to } => {
                let count = document.clone_viewport(from, to, &mut self.ids)?;
                for component in document.components(to) {
                    entries.push(entry(
                        ChangeAction::Add,
                        &component.id,
                        to,
                        json!({ "kind": component.kind(), "clonedFrom": from }),
                    ));
                }
                format!("Clone {} components from {} to {}", count, from, to)
            }

            Edit::ReplaceViewport {
                viewport,
                components,
            } => {
                let components: Vec<Component> = components
                    .into_iter()
                    .map(|mut component| {
                        if component.id.is_empty() {
                            component.id = self.ids.allocate();
                        }
                        component
                    })
                    .collect();
                let old = document.shared_components(viewport);
                document.replace_components(viewport, components)?;

                entries.extend(
                    diff_arrays(&old, document.components(viewport))
                        .into_iter()
                        .map(|(action, id, details)| entry(action, &id, viewport, details)),
                );
                format!("Replace {} components", viewport)
            }
        };

        document.touch(now);
        // Pasted ids may sit above the counter
        self.ids.resync(document);
        if let Some(history) = self.history.as_mut() {
            history.push(document.content(), description.clone());
        }
        for e in &entries {
            self.change_log.append(e.clone());
        }
        self.pending_conflict = None;
        self.transition(SessionPhase::Open { dirty: true });

        tracing::debug!(edit = %description, entries = entries.len(), "applied edit");

        Ok(Applied {
            description,
            viewport,
            entries,
            inserted_id,
        })
    }

    /// Step back one local edit. Emits no change log entries.
    pub fn undo(&mut self) -> EditorResult<bool> {
        self.require_open("undo")?;
        let (Some(history), Some(document)) = (self.history.as_mut(), self.document.as_mut()) else {
            return Err(EditorError::NoDocument);
        };
        match history.undo() {
            Some(entry) => {
                document.restore_content(&entry.content);
                self.transition(SessionPhase::Open { dirty: true });
                Ok(true)
            }
            None => Ok(false),
        }
    }

    pub fn redo(&mut self) -> EditorResult<bool> {
        self.require_open("redo")?;
        let (Some(history), Some(document)) = (self.history.as_mut(), self.document.as_mut()) else {
            return Err(EditorError::NoDocument);
        };
        match history.redo() {
            Some(entry) => {
                document.restore_content(&entry.content);
                self.transition(SessionPhase::Open { dirty: true });
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Install a whole document as a local, undoable change (used after a
    /// version restore)
    pub fn replace_document(&mut self, replacement: Document, description: impl Into<String>) -> EditorResult<()> {
        self.require_open("replace the document")?;
        let document = self.document.as_mut().ok_or(EditorError::NoDocument)?;
        *document = replacement;
        self.ids.resync(document);
        if let Some(history) = self.history.as_mut() {
            history.push(document.content(), description);
        }
        self.transition(SessionPhase::Open { dirty: true });
        Ok(())
    }

    /// Last-write-wins: overwrite every viewport array and the theme with
    /// the remote copy. History and dirty state are left alone.
    pub fn apply_remote(&mut self, remote: &Document) -> EditorResult<()> {
        self.require_open("apply a remote update")?;
        let document = self.document.as_mut().ok_or(EditorError::NoDocument)?;
        document.restore_content(&remote.content());
        document.updated_at = remote.updated_at;
        self.ids.resync(document);
        tracing::debug!(updated_at = remote.updated_at, "applied remote snapshot");
        Ok(())
    }

    // ------------------------------------------------------------------
    // Collaboration
    // ------------------------------------------------------------------

    /// Merge change log entries fetched from the store
    pub fn ingest_changes(&mut self, entries: impl IntoIterator<Item = ChangeLogEntry>) {
        self.change_log.merge(entries);
    }

    /// Look for another actor's recent change to anything `applied`
    /// touched. Only meaningful while collaborating. A hit is kept as the
    /// pending conflict until resolved.
    pub fn check_conflicts(&mut self, applied: &Applied, now: Millis) -> Option<ConflictNotice> {
        if !self.collab_active {
            return None;
        }
        let notice = applied.entries.iter().find_map(|e| {
            self.detector.check(
                self.change_log.iter(),
                e.viewport,
                &e.component_id,
                &self.actor.id,
                now,
            )
        });
        if let Some(n) = &notice {
            tracing::debug!(component = %n.component_id, other = %n.other_actor_id, "conflict detected");
        }
        self.pending_conflict = notice.clone();
        notice
    }

    /// Settle the pending conflict. Returns true when the edit should still
    /// be committed.
    pub fn resolve_conflict(&mut self, resolution: ConflictResolution) -> EditorResult<bool> {
        let notice = self
            .pending_conflict
            .take()
            .ok_or(EditorError::NoPendingConflict)?;
        match resolution {
            ConflictResolution::Discard => {
                tracing::debug!(component = %notice.component_id, "discarding conflicting edit");
                self.undo()?;
                Ok(false)
            }
            ConflictResolution::Proceed => Ok(true),
        }
    }

    // ------------------------------------------------------------------
    // Drafts
    // ------------------------------------------------------------------

    /// Working copy to autosave, if the current state is worth saving
    pub fn draft_for_autosave(&self, now: Millis) -> Option<LocalDraft> {
        if !self.autosave.should_save(self.document.as_ref()) {
            return None;
        }
        self.document
            .as_ref()
            .map(|doc| LocalDraft::capture(self.draft_key(), doc, self.active_viewport, now))
    }
}

fn position(list: &[Component], viewport: Viewport, id: &str) -> EditorResult<usize> {
    list.iter()
        .position(|c| c.id == id)
        .ok_or_else(|| EditorError::ComponentNotFound {
            viewport,
            id: id.to_string(),
        })
}

fn capitalized(action: ChangeAction) -> &'static str {
    match action {
        ChangeAction::Add => "Add",
        ChangeAction::Update => "Update",
        ChangeAction::Delete => "Delete",
        ChangeAction::Move => "Move",
        ChangeAction::Resize => "Resize",
    }
}

/// Per-component actions turning `old` into `new`
fn diff_arrays(old: &[Component], new: &[Component]) -> Vec<(ChangeAction, String, serde_json::Value)> {
    let before: HashMap<&str, &Component> = old.iter().map(|c| (c.id.as_str(), c)).collect();
    let mut changes = Vec::new();

    for component in new {
        match before.get(component.id.as_str()) {
            None => changes.push((
                ChangeAction::Add,
                component.id.clone(),
                json!({ "kind": component.kind() }),
            )),
            Some(previous) if *previous != component => {
                let action = if previous.rect != component.rect {
                    ChangeAction::classify(&previous.rect, &component.rect)
                } else {
                    ChangeAction::Update
                };
                changes.push((action, component.id.clone(), json!({})));
            }
            Some(_) => {}
        }
    }

    let after: std::collections::HashSet<&str> = new.iter().map(|c| c.id.as_str()).collect();
    for component in old {
        if !after.contains(component.id.as_str()) {
            changes.push((
                ChangeAction::Delete,
                component.id.clone(),
                json!({ "kind": component.kind() }),
            ));
        }
    }
    changes
}
