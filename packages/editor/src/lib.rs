//! # Wireframe Editor
//!
//! Synchronous core of the wireframe document engine: the component model,
//! coordinate transforms, undo history, change log, presence and conflict
//! rules, version snapshots and local draft policy. Nothing in here does
//! I/O beyond the injected key-value boundary; the async store, feeds and
//! timers live in `wireframe-workspace`.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │ UI / CLI: Edit values                       │
//! └─────────────────────────────────────────────┘
//!                     ↓
//! ┌─────────────────────────────────────────────┐
//! │ EditSession: lifecycle + reducer            │
//! │  - IdAllocator for inserts and clones       │
//! │  - HistoryStack snapshot per edit           │
//! │  - ChangeLog entries per component touched  │
//! │  - ConflictDetector before commit           │
//! └─────────────────────────────────────────────┘
//!                     ↓
//! ┌─────────────────────────────────────────────┐
//! │ Document: per-viewport Arc arrays + theme   │
//! └─────────────────────────────────────────────┘
//!          ↓                         ↓
//!   VersionLog snapshots      LocalDraft autosave
//! ```
//!
//! ## Core Principles
//!
//! 1. **Whole arrays**: an edit replaces a viewport's component array; the
//!    remote store is last-write-wins on those arrays
//! 2. **Cheap snapshots**: arrays are shared `Arc`s, so history entries and
//!    versions only copy what changed
//! 3. **Local undo**: undo/redo never reach the change log or collaborators
//! 4. **Advisory conflicts**: a notice, never a lock
//!
//! ## Usage
//!
//! ```rust
//! use wireframe_editor::{
//!     Actor, ComponentKind, ComponentPayload, Document, DraftCheck, Edit, EditSession, Rect,
//!     Style, Viewport,
//! };
//!
//! let mut session = EditSession::new(Actor::new("user-1", "Ada"));
//! session.open(Some("template-1".to_string())).unwrap();
//! session.offer_draft(DraftCheck::LoadRemote).unwrap();
//! session.finish_remote_load(Document::new(0)).unwrap();
//!
//! let applied = session
//!     .apply(
//!         Edit::Insert {
//!             viewport: Viewport::Mobile,
//!             rect: Rect::new(20.0, 40.0, 120.0, 40.0),
//!             payload: ComponentPayload::default_for(ComponentKind::Button),
//!             style: Style::new(),
//!         },
//!         1_000,
//!     )
//!     .unwrap();
//! assert_eq!(applied.inserted_id.as_deref(), Some("generated-0"));
//!
//! session.undo().unwrap();
//! assert!(session.document().unwrap().components(Viewport::Mobile).is_empty());
//! ```

mod change_log;
mod component;
mod conflict;
mod coordinates;
mod document;
mod draft;
mod errors;
mod history;
mod ids;
mod preferences;
mod presence;
mod session;
mod theme;
mod versions;
mod viewport;

pub use change_log::{newest_first, Actor, ChangeAction, ChangeLog, ChangeLogEntry};
pub use component::{Component, ComponentKind, ComponentPayload, Rect, Style};
pub use conflict::{ConflictDetector, ConflictNotice, ConflictResolution, DEFAULT_CONFLICT_WINDOW_MS};
pub use coordinates::{CanvasTransform, ContainerSize, NormalizedPoint};
pub use document::{
    canvas_height_for, CanvasSize, Document, DocumentContent, ViewportState, CANVAS_BOTTOM_PADDING,
};
pub use draft::{
    AutosaveGuard, DraftCheck, DraftKey, DraftPayload, Drafts, LocalDraft, DRAFT_FRESHNESS_MS,
    UNASSIGNED_DRAFT,
};
pub use errors::{EditorError, EditorResult};
pub use history::{HistoryEntry, HistoryStack, DEFAULT_HISTORY_LIMIT};
pub use ids::{parse_generated_suffix, IdAllocator, GENERATED_PREFIX};
pub use preferences::{AppPreferences, PreferenceStore, DEFAULT_GRID_SIZE};
pub use presence::{
    user_color, visible_collaborators, visible_cursors, PresenceRecord, PRESENCE_TTL_MS,
};
pub use session::{Applied, Edit, EditSession, SessionConfig, SessionPhase, ViewportSwitch};
pub use theme::{Theme, ThemeColors, ThemeMode};
pub use versions::{
    compare as compare_snapshots, RestoreOutcome, SnapshotKind, VersionDiff, VersionLog,
    VersionSnapshot, ViewportDelta,
};
pub use viewport::Viewport;
