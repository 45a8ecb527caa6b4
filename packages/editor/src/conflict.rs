//! # Conflict Detection
//!
//! Advisory only. Before an edit to a component is committed, recent change
//! log entries are scanned for another actor touching the same component
//! inside a short window. A hit produces a notice; nothing is locked and the
//! user decides whether to discard their edit or overwrite.

use crate::{ChangeAction, ChangeLogEntry, Viewport};
use serde::{Deserialize, Serialize};
use wireframe_common::Millis;

pub const DEFAULT_CONFLICT_WINDOW_MS: Millis = 5_000;

/// Another actor recently changed the component being edited
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConflictNotice {
    pub component_id: String,
    pub viewport: Viewport,
    pub other_actor_id: String,
    pub other_actor_name: String,
    pub other_action: ChangeAction,
    pub other_timestamp: Millis,
}

impl ConflictNotice {
    pub fn message(&self) -> String {
        let who = if self.other_actor_name.is_empty() {
            &self.other_actor_id
        } else {
            &self.other_actor_name
        };
        format!(
            "{} just made a {} change to {}",
            who, self.other_action, self.component_id
        )
    }
}

/// What the user chose when shown a [`ConflictNotice`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConflictResolution {
    /// Undo the in-flight local edit
    Discard,
    /// Commit anyway; the whole-array write overwrites remote state
    Proceed,
}

#[derive(Debug, Clone, Copy)]
pub struct ConflictDetector {
    window_ms: Millis,
}

impl ConflictDetector {
    pub fn new(window_ms: Millis) -> Self {
        Self { window_ms }
    }

    pub fn window_ms(&self) -> Millis {
        self.window_ms
    }

    /// Most recent entry on `component_id` in `viewport` by someone other
    /// than `local_actor_id`, no older than the window at `now`.
    ///
    /// Entries stamped in the future (clock skew) count as in-window.
    pub fn check<'a>(
        &self,
        entries: impl IntoIterator<Item = &'a ChangeLogEntry>,
        viewport: Viewport,
        component_id: &str,
        local_actor_id: &str,
        now: Millis,
    ) -> Option<ConflictNotice> {
        entries
            .into_iter()
            .filter(|e| e.component_id == component_id && e.viewport == viewport)
            .filter(|e| e.actor_id != local_actor_id)
            .filter(|e| now.saturating_sub(e.timestamp) <= self.window_ms)
            .max_by_key(|e| e.timestamp)
            .map(|e| ConflictNotice {
                component_id: e.component_id.clone(),
                viewport: e.viewport,
                other_actor_id: e.actor_id.clone(),
                other_actor_name: e.actor_name.clone(),
                other_action: e.action,
                other_timestamp: e.timestamp,
            })
    }
}

impl Default for ConflictDetector {
    fn default() -> Self {
        Self::new(DEFAULT_CONFLICT_WINDOW_MS)
    }
}
