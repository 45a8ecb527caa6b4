//! End-to-end editing flows across session, history, versions and drafts

use std::sync::Arc;
use wireframe_common::{KeyValueStore, MemoryKeyValueStore};
use wireframe_editor::*;

fn open_session(document: Document) -> EditSession {
    let mut session = EditSession::new(Actor::new("user-1", "Ada"));
    session.open(Some("template-1".to_string())).unwrap();
    session.offer_draft(DraftCheck::LoadRemote).unwrap();
    session.finish_remote_load(document).unwrap();
    session
}

fn button_at(x: f64, y: f64) -> Edit {
    Edit::Insert {
        viewport: Viewport::Mobile,
        rect: Rect::new(x, y, 120.0, 40.0),
        payload: ComponentPayload::default_for(ComponentKind::Button),
        style: Style::new(),
    }
}

#[test]
fn test_insert_button_then_undo_redo() {
    let mut session = open_session(Document::new(0));

    let applied = session.apply(button_at(20.0, 40.0), 1_000).unwrap();
    assert_eq!(applied.inserted_id.as_deref(), Some("generated-0"));
    assert_eq!(applied.entries.len(), 1);
    assert_eq!(applied.entries[0].action, ChangeAction::Add);

    let before = session.document().unwrap().components(Viewport::Mobile).to_vec();

    session.undo().unwrap();
    assert!(session.document().unwrap().components(Viewport::Mobile).is_empty());

    session.redo().unwrap();
    let after = session.document().unwrap().components(Viewport::Mobile);
    assert_eq!(after.len(), 1);
    assert_eq!(after[0].id, before[0].id);
    assert_eq!(after[0].rect, before[0].rect);
}

#[test]
fn test_loaded_ids_resync_allocator() {
    let mut document = Document::new(0);
    document
        .replace_components(
            Viewport::Desktop,
            vec![
                Component::new("generated-7", Rect::new(0.0, 0.0, 10.0, 10.0), ComponentPayload::Divider {}),
                Component::new("generated-12", Rect::new(0.0, 20.0, 10.0, 10.0), ComponentPayload::Divider {}),
                Component::new("hero", Rect::new(0.0, 40.0, 10.0, 10.0), ComponentPayload::Divider {}),
            ],
        )
        .unwrap();

    let mut session = open_session(document);
    let applied = session.apply(button_at(0.0, 0.0), 1).unwrap();
    assert_eq!(applied.inserted_id.as_deref(), Some("generated-13"));
}

#[test]
fn test_history_survives_many_edits() {
    let mut session = open_session(Document::new(0));
    for i in 0..150 {
        session.apply(button_at(0.0, i as f64 * 10.0), i).unwrap();
    }

    let history = session.history().unwrap();
    assert_eq!(history.len(), DEFAULT_HISTORY_LIMIT);
    assert_eq!(history.pointer(), DEFAULT_HISTORY_LIMIT - 1);

    let mut undone = 0;
    while session.undo().unwrap() {
        undone += 1;
    }
    assert_eq!(undone, DEFAULT_HISTORY_LIMIT - 1);
    assert_eq!(
        session.document().unwrap().components(Viewport::Mobile).len(),
        150 - (DEFAULT_HISTORY_LIMIT - 1)
    );
}

#[test]
fn test_canvas_grows_with_content() {
    let mut session = open_session(Document::new(0));
    session.apply(button_at(0.0, 900.0), 1).unwrap();

    let canvas = session.document().unwrap().canvas_size(Viewport::Mobile);
    assert_eq!(canvas.width, 375.0);
    assert_eq!(canvas.height, 900.0 + 40.0 + CANVAS_BOTTOM_PADDING);
}

#[test]
fn test_version_restore_round_trip() {
    let mut session = open_session(Document::new(0));
    session.apply(button_at(0.0, 0.0), 1).unwrap();

    let mut versions = VersionLog::new();
    let first = versions.create(session.document().unwrap(), "one button", "user-1", 10);

    session.apply(button_at(0.0, 60.0), 20).unwrap();
    session.apply(button_at(0.0, 120.0), 30).unwrap();
    let live_counts = session.document().unwrap().component_counts();

    let outcome = versions
        .restore(first.id(), session.document().unwrap(), "user-1", 40)
        .unwrap();
    session
        .replace_document(outcome.document, format!("Restore {}", first.id()))
        .unwrap();
    assert_eq!(session.document().unwrap().components(Viewport::Mobile).len(), 1);

    let back = versions
        .restore(outcome.marker.id(), session.document().unwrap(), "user-1", 50)
        .unwrap();
    assert_eq!(back.document.component_counts(), live_counts);

    let diff = versions.compare(first.id(), outcome.marker.id()).unwrap();
    assert_eq!(diff.viewports[&Viewport::Mobile].component_count, 2);
}

#[test]
fn test_draft_resume_flow() {
    let store: Arc<dyn KeyValueStore> = Arc::new(MemoryKeyValueStore::new());
    let drafts = Drafts::new(store.clone());

    let mut session = open_session(Document::new(0));
    session.apply(button_at(0.0, 0.0), 1_000).unwrap();
    let draft = session.draft_for_autosave(2_000).unwrap();
    drafts.save(&draft).unwrap();
    session.close();

    // Reopen within the hour: the draft short-circuits the remote load
    let key = session.open(Some("template-1".to_string())).unwrap();
    let check = drafts.check(&key, 2_000 + 30 * 60 * 1000).unwrap();
    session.offer_draft(check).unwrap();
    assert_eq!(session.phase(), SessionPhase::ResumeDraft);

    session.accept_draft().unwrap();
    assert!(session.is_dirty());
    assert_eq!(session.document().unwrap().components(Viewport::Mobile).len(), 1);

    let applied = session.apply(button_at(0.0, 60.0), 3_000).unwrap();
    assert_eq!(applied.inserted_id.as_deref(), Some("generated-1"));

    drafts.clear_after_save("template-1").unwrap();
    session.mark_saved().unwrap();
    assert!(store.keys("draft:").unwrap().is_empty());
}

#[test]
fn test_stale_draft_falls_through_to_remote() {
    let store: Arc<dyn KeyValueStore> = Arc::new(MemoryKeyValueStore::new());
    let drafts = Drafts::new(store);

    let mut session = open_session(Document::new(0));
    session.apply(button_at(0.0, 0.0), 0).unwrap();
    drafts.save(&session.draft_for_autosave(0).unwrap()).unwrap();
    session.close();

    let key = session.open(Some("template-1".to_string())).unwrap();
    let check = drafts.check(&key, DRAFT_FRESHNESS_MS + 1).unwrap();
    assert_eq!(check, DraftCheck::LoadRemote);

    session.offer_draft(check).unwrap();
    session.finish_remote_load(Document::new(0)).unwrap();
    assert!(!session.is_dirty());
}

#[test]
fn test_conflict_window_boundaries() {
    let t0 = 1_700_000_000_000;
    let mut session = open_session(Document::new(t0));
    session.set_collaboration(true).unwrap();
    let id = session
        .apply(button_at(0.0, 0.0), t0)
        .unwrap()
        .inserted_id
        .unwrap();

    session.ingest_changes(vec![ChangeLogEntry::new(
        &Actor::new("user-2", "Grace"),
        ChangeAction::Resize,
        &id,
        Viewport::Mobile,
        t0,
        serde_json::json!({}),
    )]);

    let nudge = |x: f64| Edit::Transform {
        viewport: Viewport::Mobile,
        id: id.clone(),
        rect: Rect::new(x, 0.0, 120.0, 40.0),
    };

    let applied = session.apply(nudge(10.0), t0 + 3_000).unwrap();
    let notice = session.check_conflicts(&applied, t0 + 3_000).unwrap();
    assert_eq!(notice.other_actor_name, "Grace");
    assert_eq!(notice.other_action, ChangeAction::Resize);
    assert!(session.resolve_conflict(ConflictResolution::Proceed).unwrap());

    let applied = session.apply(nudge(20.0), t0 + 6_000).unwrap();
    assert!(session.check_conflicts(&applied, t0 + 6_000).is_none());
}

#[test]
fn test_snapped_insert_lands_on_grid() {
    let session = open_session(Document::new(0));
    let canvas = session.document().unwrap().canvas_size(Viewport::Mobile);
    let transform = CanvasTransform::new(canvas, ContainerSize::new(750.0, 1334.0)).unwrap();

    let (x, y) = transform.snap_position(133.0, 287.0, DEFAULT_GRID_SIZE).unwrap();
    assert_eq!(x % DEFAULT_GRID_SIZE, 0.0);
    assert_eq!(y % DEFAULT_GRID_SIZE, 0.0);
}
