//! # Workspace client
//!
//! Wires one [`EditSession`] to the remote store, local drafts, presence and
//! versions.
//!
//! ```text
//! edit ─► session.apply ─► collaborating? ──no──► change log + autosave draft
//!                               │
//!                              yes ─► fetch recent changes ─► conflict?
//!                                        │                      │
//!                                        no                    yes ─► wait for resolve
//!                                        ▼
//!                               save arrays ─► change log ─► clear drafts
//! ```
//!
//! Remote reads that fail abort the operation and leave local state as it
//! was. Remote writes that fail are returned without rolling back the
//! optimistic local state, so the session stays dirty.

use crate::autosave::Autosaver;
use crate::changes::ChangeLogWriter;
use crate::config::{Timings, WorkspaceConfig};
use crate::error::{WorkspaceError, WorkspaceResult};
use crate::feed::Subscription;
use crate::presence::PresenceBroadcaster;
use crate::store::{DocumentStore, TemplateRecord, TemplateRef, TemplateUpdate};
use crate::versions::VersionService;
use std::sync::Arc;
use wireframe_common::{Clock, KeyValueStore, Millis};
use wireframe_editor::{
    visible_collaborators, visible_cursors, AppPreferences, Applied, CanvasTransform,
    ChangeLogEntry, ConflictNotice, ConflictResolution, ContainerSize, Document, DraftCheck,
    Drafts, Edit, EditSession, NormalizedPoint, PreferenceStore, PresenceRecord, Rect,
    VersionDiff, VersionSnapshot, Viewport, ViewportSwitch,
};

/// Change log entries fetched before each collaborative commit
const CONFLICT_SCAN_LIMIT: usize = 50;

#[derive(Debug, Clone, PartialEq)]
pub enum OpenOutcome {
    /// The document is open
    Loaded,
    /// A fresh draft exists; call `resume_draft` or `discard_draft`
    DraftOffered { age_ms: Millis },
}

#[derive(Debug, Clone, PartialEq)]
pub struct EditOutcome {
    pub applied: Applied,
    /// Set when the edit is held back pending [`WorkspaceClient::resolve_conflict`]
    pub conflict: Option<ConflictNotice>,
    /// Whether the edit reached the remote store
    pub committed: bool,
}

pub struct WorkspaceClient {
    store: Arc<dyn DocumentStore>,
    drafts: Drafts,
    preferences: PreferenceStore,
    clock: Arc<dyn Clock>,
    project_id: String,
    timings: Timings,
    session: EditSession,
    template: Option<TemplateRef>,
    changes: ChangeLogWriter,
    versions: VersionService,
    autosave: Autosaver,
    remote: Option<Subscription<TemplateRecord>>,
    presence: Option<PresenceBroadcaster>,
    presence_feed: Option<Subscription<Vec<PresenceRecord>>>,
    presence_records: Vec<PresenceRecord>,
    /// Entries of the edit waiting on a conflict answer
    held_entries: Vec<ChangeLogEntry>,
    /// Entries of held edits that a later edit superseded. They go out with
    /// the next remote write.
    unlogged: Vec<ChangeLogEntry>,
}

impl WorkspaceClient {
    pub fn new(
        store: Arc<dyn DocumentStore>,
        local: Arc<dyn KeyValueStore>,
        clock: Arc<dyn Clock>,
        config: &WorkspaceConfig,
    ) -> Self {
        let timings = config.timings;
        let preferences = PreferenceStore::load_or_default(local.clone());
        let drafts = Drafts::with_freshness(local, timings.draft_freshness_ms);
        Self {
            changes: ChangeLogWriter::new(store.clone()),
            versions: VersionService::new(store.clone()),
            autosave: Autosaver::new(drafts.clone(), timings.autosave_debounce()),
            session: EditSession::with_config(config.user.actor(), timings.session_config()),
            store,
            drafts,
            preferences,
            clock,
            project_id: config.project_id.clone(),
            timings,
            template: None,
            remote: None,
            presence: None,
            presence_feed: None,
            presence_records: Vec::new(),
            held_entries: Vec::new(),
            unlogged: Vec::new(),
        }
    }

    pub fn session(&self) -> &EditSession {
        &self.session
    }

    pub fn document(&self) -> Option<&Document> {
        self.session.document()
    }

    pub fn template(&self) -> Option<&TemplateRef> {
        self.template.as_ref()
    }

    pub fn drafts(&self) -> &Drafts {
        &self.drafts
    }

    pub fn preferences(&self) -> &AppPreferences {
        self.preferences.get()
    }

    /// Change preferences and write them to the local store
    pub fn update_preferences(&mut self, change: impl FnOnce(&mut AppPreferences)) -> WorkspaceResult<()> {
        self.preferences.update(change)?;
        Ok(())
    }

    /// Map a box drawn in a `container` sized surface onto the active
    /// viewport's canvas, snapped to the preferred grid unless snapping is
    /// off.
    pub fn place(&self, container_rect: Rect, container: ContainerSize) -> WorkspaceResult<Rect> {
        let canvas = self.require_document()?.canvas_size(self.session.active_viewport());
        let transform = CanvasTransform::new(canvas, container)?;
        let prefs = self.preferences.get();
        if prefs.snap_to_grid {
            Ok(transform.snap_rect(container_rect, prefs.grid_size)?)
        } else {
            Ok(transform.to_logical(container_rect))
        }
    }

    fn now(&self) -> Millis {
        self.clock.now_millis()
    }

    fn require_template(&self) -> WorkspaceResult<TemplateRef> {
        self.template.clone().ok_or(WorkspaceError::NoTemplate)
    }

    fn require_document(&self) -> WorkspaceResult<&Document> {
        self.session
            .document()
            .ok_or(WorkspaceError::Editor(wireframe_editor::EditorError::NoDocument))
    }

    // ------------------------------------------------------------------
    // Open / close
    // ------------------------------------------------------------------

    /// Open `template_id`, or a brand new unsaved document when `None`.
    ///
    /// A fresh local draft short-circuits the remote load.
    pub async fn open(&mut self, template_id: Option<&str>) -> WorkspaceResult<OpenOutcome> {
        let key = self.session.open(template_id.map(str::to_string))?;
        self.template = template_id.map(|id| TemplateRef::new(&self.project_id, id));

        let now = self.now();
        let check = self.drafts.check(&key, now).unwrap_or_else(|e| {
            tracing::warn!(key = %key, error = %e, "draft check failed; loading remote copy");
            DraftCheck::LoadRemote
        });

        match check {
            DraftCheck::Resume(draft) => {
                let age_ms = draft.age(now);
                self.session.offer_draft(DraftCheck::Resume(draft))?;
                Ok(OpenOutcome::DraftOffered { age_ms })
            }
            DraftCheck::LoadRemote => {
                self.session.offer_draft(DraftCheck::LoadRemote)?;
                self.load_remote().await?;
                Ok(OpenOutcome::Loaded)
            }
        }
    }

    pub fn resume_draft(&mut self) -> WorkspaceResult<()> {
        self.session.accept_draft()?;
        tracing::info!(template = ?self.template, "resumed local draft");
        Ok(())
    }

    pub async fn discard_draft(&mut self) -> WorkspaceResult<()> {
        let key = self.session.decline_draft()?;
        if let Err(e) = self.drafts.discard(&key) {
            tracing::warn!(key = %key, error = %e, "failed to discard draft");
        }
        self.load_remote().await
    }

    async fn load_remote(&mut self) -> WorkspaceResult<()> {
        let document = match self.template.clone() {
            None => Document::new(self.now()),
            Some(template) => match self.store.load_template(&template).await {
                Ok(record) => record.to_document(),
                Err(e) => {
                    tracing::error!(%template, error = %e, "failed to load template");
                    self.session.fail_remote_load()?;
                    self.template = None;
                    return Err(e.into());
                }
            },
        };
        self.session.finish_remote_load(document)?;
        Ok(())
    }

    /// Leave collaboration, keep unsaved work as a draft, and close
    pub async fn close(&mut self) {
        self.stop_collaboration().await;
        let draft = if self.session.is_dirty() {
            self.session.draft_for_autosave(self.now())
        } else {
            None
        };
        match draft {
            Some(draft) => self.autosave.flush(&draft),
            None => self.autosave.cancel(),
        }
        self.held_entries.clear();
        self.unlogged.clear();
        self.session.close();
        self.template = None;
    }

    // ------------------------------------------------------------------
    // Editing
    // ------------------------------------------------------------------

    /// Apply an edit. Editing on top of a held edit keeps the held one, as
    /// if it had been resolved with `Proceed`.
    pub async fn edit(&mut self, edit: Edit) -> WorkspaceResult<EditOutcome> {
        let now = self.now();
        let applied = self.session.apply(edit, now)?;
        if !self.held_entries.is_empty() {
            tracing::debug!(entries = self.held_entries.len(), "held edit superseded");
            self.unlogged.append(&mut self.held_entries);
        }

        if !self.session.collab_active() {
            if let Some(template) = self.template.clone() {
                let mut entries = std::mem::take(&mut self.unlogged);
                entries.extend_from_slice(&applied.entries);
                self.changes.record(&template, &entries).await;
            }
            self.schedule_autosave();
            return Ok(EditOutcome {
                applied,
                conflict: None,
                committed: false,
            });
        }

        let template = self.require_template()?;
        match self.store.recent_changes(&template, CONFLICT_SCAN_LIMIT).await {
            Ok(entries) => self.session.ingest_changes(entries),
            Err(e) => tracing::warn!(%template, error = %e, "could not fetch recent changes"),
        }

        if let Some(notice) = self.session.check_conflicts(&applied, now) {
            self.held_entries = applied.entries.clone();
            return Ok(EditOutcome {
                applied,
                conflict: Some(notice),
                committed: false,
            });
        }

        self.commit(&applied.entries).await?;
        Ok(EditOutcome {
            applied,
            conflict: None,
            committed: true,
        })
    }

    /// Settle a held edit. Returns true when it was committed.
    pub async fn resolve_conflict(&mut self, resolution: ConflictResolution) -> WorkspaceResult<bool> {
        let proceed = self.session.resolve_conflict(resolution)?;
        let entries = std::mem::take(&mut self.held_entries);
        if proceed {
            self.commit(&entries).await?;
        }
        Ok(proceed)
    }

    /// Local only: nothing is logged or broadcast
    pub fn undo(&mut self) -> WorkspaceResult<bool> {
        let changed = self.session.undo()?;
        if changed {
            self.schedule_autosave();
        }
        Ok(changed)
    }

    pub fn redo(&mut self) -> WorkspaceResult<bool> {
        let changed = self.session.redo()?;
        if changed {
            self.schedule_autosave();
        }
        Ok(changed)
    }

    pub fn switch_viewport(&mut self, viewport: Viewport) -> ViewportSwitch {
        if let Some(presence) = &self.presence {
            presence.switch_viewport(viewport);
        }
        self.session.switch_viewport(viewport)
    }

    pub fn select(&mut self, component_id: Option<String>) {
        if let Some(presence) = &self.presence {
            presence.select(component_id.clone());
        }
        self.session.select(component_id);
    }

    /// Write the whole document. A document without a template gets one.
    pub async fn save(&mut self) -> WorkspaceResult<TemplateRef> {
        let update = TemplateUpdate::from_document(self.require_document()?, self.session.active_viewport());

        let template = match self.template.clone() {
            Some(template) => {
                if let Err(e) = self.store.save_template(&template, &update).await {
                    tracing::error!(%template, error = %e, "save failed");
                    return Err(e.into());
                }
                template
            }
            None => {
                let template = self
                    .store
                    .create_template(&self.project_id, &update)
                    .await
                    .map_err(|e| {
                        tracing::error!(error = %e, "template creation failed");
                        e
                    })?;
                self.session.assign_document_id(template.template_id.clone());
                self.template = Some(template.clone());
                template
            }
        };

        self.flush_unlogged(&template).await;
        self.after_remote_write(&template)?;
        tracing::info!(%template, "saved template");
        Ok(template)
    }

    async fn commit(&mut self, entries: &[ChangeLogEntry]) -> WorkspaceResult<()> {
        let template = self.require_template()?;
        let update = TemplateUpdate::from_document(self.require_document()?, self.session.active_viewport());
        if let Err(e) = self.store.save_template(&template, &update).await {
            tracing::error!(%template, error = %e, "commit failed; keeping local changes");
            return Err(e.into());
        }
        self.flush_unlogged(&template).await;
        self.changes.record(&template, entries).await;
        self.after_remote_write(&template)
    }

    async fn flush_unlogged(&mut self, template: &TemplateRef) {
        if self.unlogged.is_empty() {
            return;
        }
        let entries = std::mem::take(&mut self.unlogged);
        self.changes.record(template, &entries).await;
    }

    fn after_remote_write(&mut self, template: &TemplateRef) -> WorkspaceResult<()> {
        self.autosave.cancel();
        if let Err(e) = self.drafts.clear_after_save(&template.template_id) {
            tracing::warn!(%template, error = %e, "failed to clear local drafts");
        }
        self.session.mark_saved()?;
        Ok(())
    }

    fn schedule_autosave(&mut self) {
        if let Some(draft) = self.session.draft_for_autosave(self.now()) {
            self.autosave.schedule(draft);
        }
    }

    // ------------------------------------------------------------------
    // Collaboration
    // ------------------------------------------------------------------

    /// Subscribe to remote changes and start broadcasting presence.
    ///
    /// Unsaved local work is committed first so the first remote echo does
    /// not wipe it.
    pub async fn start_collaboration(&mut self) -> WorkspaceResult<()> {
        if self.session.collab_active() {
            return Ok(());
        }
        let template = self.require_template()?;
        if self.session.is_dirty() {
            self.commit(&[]).await?;
        }

        let remote = self.store.subscribe(&template).await?;
        let presence_feed = self.store.subscribe_presence(&template).await?;
        self.session.set_collaboration(true)?;

        let actor = self.session.actor().clone();
        let record = PresenceRecord::new(
            actor.id,
            actor.display_name,
            self.session.active_viewport(),
            self.now(),
        );
        self.presence = Some(PresenceBroadcaster::start(
            self.store.clone(),
            template.clone(),
            record,
            self.clock.clone(),
            self.timings.presence_debounce(),
            self.timings.heartbeat(),
        ));
        self.remote = Some(remote);
        self.presence_feed = Some(presence_feed);
        tracing::info!(%template, "collaboration started");
        Ok(())
    }

    pub async fn stop_collaboration(&mut self) {
        if let Some(presence) = self.presence.take() {
            presence.stop().await;
        }
        if let Some(feed) = self.remote.take() {
            feed.unsubscribe();
        }
        if let Some(feed) = self.presence_feed.take() {
            feed.unsubscribe();
        }
        self.presence_records.clear();
        if self.session.collab_active() {
            if let Err(e) = self.session.set_collaboration(false) {
                tracing::warn!(template = ?self.template, error = %e, "failed to leave collaboration");
            }
            tracing::info!(template = ?self.template, "collaboration stopped");
        }
    }

    /// Apply the newest remote snapshot already delivered, if any
    pub fn sync_remote(&mut self) -> WorkspaceResult<bool> {
        let Some(record) = self.remote.as_mut().and_then(Subscription::latest) else {
            return Ok(false);
        };
        self.session.apply_remote(&record.to_document())?;
        Ok(true)
    }

    /// Wait for the next remote snapshot and apply it. `false` when not
    /// subscribed or the feed ended.
    pub async fn next_remote(&mut self) -> WorkspaceResult<bool> {
        let Some(feed) = self.remote.as_mut() else {
            return Ok(false);
        };
        match feed.next().await {
            Some(record) => {
                self.session.apply_remote(&record.to_document())?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    pub fn move_cursor(&self, cursor: NormalizedPoint) {
        if let Some(presence) = &self.presence {
            presence.move_cursor(cursor, self.session.active_viewport());
        }
    }

    fn refresh_presence(&mut self) {
        if let Some(records) = self.presence_feed.as_mut().and_then(Subscription::latest) {
            self.presence_records = records;
        }
    }

    /// Live collaborators other than us
    pub fn collaborators(&mut self) -> Vec<PresenceRecord> {
        self.refresh_presence();
        visible_collaborators(
            &self.presence_records,
            &self.session.actor().id,
            self.now(),
            self.timings.presence_ttl_ms,
        )
        .into_iter()
        .cloned()
        .collect()
    }

    /// Collaborator cursors on our active viewport
    pub fn cursors(&mut self) -> Vec<PresenceRecord> {
        self.refresh_presence();
        visible_cursors(
            &self.presence_records,
            &self.session.actor().id,
            self.session.active_viewport(),
            self.now(),
            self.timings.presence_ttl_ms,
        )
        .into_iter()
        .cloned()
        .collect()
    }

    // ------------------------------------------------------------------
    // History and versions
    // ------------------------------------------------------------------

    pub async fn recent_changes(&self, limit: usize) -> WorkspaceResult<Vec<ChangeLogEntry>> {
        let template = self.require_template()?;
        Ok(self.store.recent_changes(&template, limit).await?)
    }

    pub async fn create_version(&self, message: &str) -> WorkspaceResult<VersionSnapshot> {
        let template = self.require_template()?;
        let document = self.require_document()?;
        self.versions
            .create(&template, document, message, &self.session.actor().id, self.now())
            .await
    }

    pub async fn list_versions(&self) -> WorkspaceResult<Vec<VersionSnapshot>> {
        let template = self.require_template()?;
        self.versions.list(&template).await
    }

    /// Restore a version locally and remotely; the overwritten state is
    /// kept as a pre-restore snapshot
    pub async fn restore_version(&mut self, id: &str) -> WorkspaceResult<VersionSnapshot> {
        let template = self.require_template()?;
        let outcome = self
            .versions
            .restore(
                &template,
                id,
                self.require_document()?,
                self.session.active_viewport(),
                &self.session.actor().id,
                self.now(),
            )
            .await?;
        self.session
            .replace_document(outcome.document, format!("Restore {}", id))?;
        // Held or superseded edits were overwritten by the restore
        self.held_entries.clear();
        self.unlogged.clear();
        self.after_remote_write(&template)?;
        Ok(outcome.marker)
    }

    pub async fn compare_versions(&self, from_id: &str, to_id: &str) -> WorkspaceResult<VersionDiff> {
        let template = self.require_template()?;
        self.versions.compare(&template, from_id, to_id).await
    }
}
