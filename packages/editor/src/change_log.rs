//! # Change Log
//!
//! Append-only audit trail of named mutations. Entries are produced by the
//! edit session and persisted remotely on a best-effort basis; the log is
//! also the signal source for conflict detection.

use crate::{Rect, Viewport};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::fmt;
use wireframe_common::Millis;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeAction {
    Add,
    Update,
    Delete,
    Move,
    Resize,
}

impl ChangeAction {
    pub fn as_str(self) -> &'static str {
        match self {
            ChangeAction::Add => "add",
            ChangeAction::Update => "update",
            ChangeAction::Delete => "delete",
            ChangeAction::Move => "move",
            ChangeAction::Resize => "resize",
        }
    }

    /// Name a box change: any size change is a resize, a pure position
    /// change is a move, and no box change is a generic update.
    pub fn classify(old: &Rect, new: &Rect) -> ChangeAction {
        if new.resized_from(old) {
            ChangeAction::Resize
        } else if new.moved_from(old) {
            ChangeAction::Move
        } else {
            ChangeAction::Update
        }
    }
}

impl fmt::Display for ChangeAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Who made a change
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Actor {
    pub id: String,
    pub display_name: String,
}

impl Actor {
    pub fn new(id: impl Into<String>, display_name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            display_name: display_name.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangeLogEntry {
    pub actor_id: String,
    #[serde(default)]
    pub actor_name: String,
    pub action: ChangeAction,
    pub component_id: String,
    pub viewport: Viewport,
    pub timestamp: Millis,
    #[serde(default)]
    pub details: serde_json::Value,
}

impl ChangeLogEntry {
    pub fn new(
        actor: &Actor,
        action: ChangeAction,
        component_id: impl Into<String>,
        viewport: Viewport,
        timestamp: Millis,
        details: serde_json::Value,
    ) -> Self {
        Self {
            actor_id: actor.id.clone(),
            actor_name: actor.display_name.clone(),
            action,
            component_id: component_id.into(),
            viewport,
            timestamp,
            details,
        }
    }
}

/// Bounded in-memory view of a document's change log
///
/// Holds both this client's entries and entries fetched from the store.
/// Oldest entries fall off once `capacity` is reached.
#[derive(Debug, Clone)]
pub struct ChangeLog {
    entries: VecDeque<ChangeLogEntry>,
    capacity: usize,
}

impl ChangeLog {
    pub const DEFAULT_CAPACITY: usize = 500;

    pub fn new() -> Self {
        Self::with_capacity(Self::DEFAULT_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: VecDeque::new(),
            capacity: capacity.max(1),
        }
    }

    pub fn append(&mut self, entry: ChangeLogEntry) {
        if self.entries.len() == self.capacity {
            self.entries.pop_front();
        }
        self.entries.push_back(entry);
    }

    /// Merge entries observed elsewhere, skipping exact duplicates
    pub fn merge(&mut self, entries: impl IntoIterator<Item = ChangeLogEntry>) {
        for entry in entries {
            if !self.entries.contains(&entry) {
                self.append(entry);
            }
        }
    }

    /// Last `n` entries, newest first by timestamp
    pub fn recent(&self, n: usize) -> Vec<ChangeLogEntry> {
        newest_first(self.entries.iter().cloned().collect(), n)
    }

    pub fn iter(&self) -> impl Iterator<Item = &ChangeLogEntry> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

impl Default for ChangeLog {
    fn default() -> Self {
        Self::new()
    }
}

/// Sort by timestamp descending and keep the first `n`.
///
/// The sort is stable, so entries sharing a timestamp keep append order
/// reversed (later appends first).
pub fn newest_first(mut entries: Vec<ChangeLogEntry>, n: usize) -> Vec<ChangeLogEntry> {
    entries.reverse();
    entries.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
    entries.truncate(n);
    entries
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn entry(actor: &str, component: &str, timestamp: Millis) -> ChangeLogEntry {
        ChangeLogEntry::new(
            &Actor::new(actor, actor),
            ChangeAction::Update,
            component,
            Viewport::Desktop,
            timestamp,
            json!({}),
        )
    }

    #[test]
    fn test_classify_box_change() {
        let base = Rect::new(10.0, 10.0, 100.0, 40.0);
        assert_eq!(
            ChangeAction::classify(&base, &Rect::new(20.0, 10.0, 100.0, 40.0)),
            ChangeAction::Move
        );
        assert_eq!(
            ChangeAction::classify(&base, &Rect::new(10.0, 10.0, 120.0, 40.0)),
            ChangeAction::Resize
        );
        assert_eq!(
            ChangeAction::classify(&base, &Rect::new(0.0, 0.0, 120.0, 40.0)),
            ChangeAction::Resize
        );
        assert_eq!(ChangeAction::classify(&base, &base), ChangeAction::Update);
    }

    #[test]
    fn test_recent_orders_by_timestamp_descending() {
        let mut log = ChangeLog::new();
        log.append(entry("a", "x", 300));
        log.append(entry("b", "y", 100));
        log.append(entry("c", "z", 200));

        let recent = log.recent(2);
        assert_eq!(recent.len(), 2);
        assert_eq!(recent[0].timestamp, 300);
        assert_eq!(recent[1].timestamp, 200);
    }

    #[test]
    fn test_capacity_drops_oldest() {
        let mut log = ChangeLog::with_capacity(2);
        log.append(entry("a", "x", 1));
        log.append(entry("a", "x", 2));
        log.append(entry("a", "x", 3));

        let timestamps: Vec<_> = log.recent(10).iter().map(|e| e.timestamp).collect();
        assert_eq!(timestamps, vec![3, 2]);
    }

    #[test]
    fn test_merge_skips_duplicates() {
        let mut log = ChangeLog::new();
        log.append(entry("a", "x", 1));
        log.merge(vec![entry("a", "x", 1), entry("b", "x", 2)]);
        assert_eq!(log.len(), 2);
    }

    #[test]
    fn test_entry_wire_format() {
        let json = serde_json::to_value(entry("user-1", "generated-2", 42)).unwrap();
        assert_eq!(json["actorId"], "user-1");
        assert_eq!(json["action"], "update");
        assert_eq!(json["componentId"], "generated-2");
        assert_eq!(json["viewport"], "desktop");
    }
}
