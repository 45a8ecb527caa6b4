//! # Undo/Redo History
//!
//! Tracks full document snapshots for local undo/redo.
//!
//! ## Design
//!
//! - Every local mutation pushes a complete `{viewports, theme}` snapshot
//! - A push truncates anything after the pointer (the redo tail)
//! - Undo/redo move the pointer within `[0, len - 1]` and are no-ops at
//!   the ends
//! - Entry 0 is the state the document was loaded in
//!
//! Snapshots hold whole arrays rather than diffs. Viewport arrays are
//! `Arc`-shared with the live document, so unchanged viewports cost nothing.
//!
//! History is local to this client: moving through it emits no change-log
//! entries and is not broadcast to collaborators.
//!
//! ## Example
//!
//! ```rust,ignore
//! let mut history = HistoryStack::new(doc.content());
//!
//! doc.replace_components(Viewport::Mobile, list)?;
//! history.push(doc.content(), "Insert button");
//!
//! if let Some(entry) = history.undo() {
//!     doc.restore_content(&entry.content);
//! }
//! ```

use crate::DocumentContent;

/// Default maximum number of entries kept
pub const DEFAULT_HISTORY_LIMIT: usize = 100;

/// One immutable history snapshot
#[derive(Debug, Clone)]
pub struct HistoryEntry {
    pub content: DocumentContent,

    /// Short label for the mutation that produced this state
    pub description: Option<String>,
}

/// Pointer-based undo/redo over full snapshots
#[derive(Debug)]
pub struct HistoryStack {
    entries: Vec<HistoryEntry>,

    /// Index of the entry matching the live document
    pointer: usize,

    /// Maximum number of entries (0 = unlimited)
    max_levels: usize,
}

impl HistoryStack {
    /// Create a history rooted at `initial` with the default limit
    pub fn new(initial: DocumentContent) -> Self {
        Self::with_max_levels(initial, DEFAULT_HISTORY_LIMIT)
    }

    /// Create a history with a custom limit
    pub fn with_max_levels(initial: DocumentContent, max_levels: usize) -> Self {
        Self {
            entries: vec![HistoryEntry {
                content: initial,
                description: None,
            }],
            pointer: 0,
            max_levels,
        }
    }

    /// Record a new state after a local mutation
    pub fn push(&mut self, content: DocumentContent, description: impl Into<String>) {
        // New action invalidates the redo tail
        self.entries.truncate(self.pointer + 1);
        self.entries.push(HistoryEntry {
            content,
            description: Some(description.into()),
        });
        self.pointer = self.entries.len() - 1;

        if self.max_levels > 0 && self.entries.len() > self.max_levels {
            let excess = self.entries.len() - self.max_levels;
            self.entries.drain(..excess);
            self.pointer -= excess;
        }
    }

    /// Step back; `None` when already at the oldest entry
    pub fn undo(&mut self) -> Option<&HistoryEntry> {
        if self.pointer == 0 {
            return None;
        }
        self.pointer -= 1;
        self.entries.get(self.pointer)
    }

    /// Step forward; `None` when already at the newest entry
    pub fn redo(&mut self) -> Option<&HistoryEntry> {
        if self.pointer + 1 >= self.entries.len() {
            return None;
        }
        self.pointer += 1;
        self.entries.get(self.pointer)
    }

    /// Drop everything and start over from `initial`
    pub fn reset(&mut self, initial: DocumentContent) {
        self.entries.clear();
        self.entries.push(HistoryEntry {
            content: initial,
            description: None,
        });
        self.pointer = 0;
    }

    pub fn can_undo(&self) -> bool {
        self.pointer > 0
    }

    pub fn can_redo(&self) -> bool {
        self.pointer + 1 < self.entries.len()
    }

    pub fn pointer(&self) -> usize {
        self.pointer
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn current(&self) -> &HistoryEntry {
        &self.entries[self.pointer]
    }

    /// Description of the change `undo()` would revert
    pub fn undo_description(&self) -> Option<&str> {
        if self.pointer == 0 {
            return None;
        }
        self.entries[self.pointer].description.as_deref()
    }

    /// Description of the change `redo()` would reapply
    pub fn redo_description(&self) -> Option<&str> {
        self.entries
            .get(self.pointer + 1)
            .and_then(|entry| entry.description.as_deref())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Component, ComponentPayload, Document, Rect, Theme, Viewport};

    fn content_with(count: usize) -> DocumentContent {
        let mut doc = Document::new(0);
        let list = (0..count)
            .map(|i| {
                Component::new(
                    format!("generated-{}", i),
                    Rect::new(0.0, 0.0, 10.0, 10.0),
                    ComponentPayload::Divider {},
                )
            })
            .collect();
        doc.replace_components(Viewport::Mobile, list).unwrap();
        doc.content()
    }

    fn count(entry: &HistoryEntry) -> usize {
        entry.content.viewports[&Viewport::Mobile].components.len()
    }

    #[test]
    fn test_history_creation() {
        let history = HistoryStack::new(content_with(0));
        assert_eq!(history.len(), 1);
        assert_eq!(history.pointer(), 0);
        assert!(!history.can_undo());
        assert!(!history.can_redo());
    }

    #[test]
    fn test_undo_and_redo_move_pointer() {
        let mut history = HistoryStack::new(content_with(0));
        history.push(content_with(1), "Insert");
        history.push(content_with(2), "Insert");

        assert_eq!(history.undo_description(), Some("Insert"));
        assert_eq!(count(history.undo().unwrap()), 1);
        assert_eq!(count(history.undo().unwrap()), 0);
        assert!(history.undo().is_none());
        assert_eq!(history.pointer(), 0);

        assert_eq!(count(history.redo().unwrap()), 1);
        assert_eq!(count(history.redo().unwrap()), 2);
        assert!(history.redo().is_none());
        assert_eq!(history.pointer(), 2);
    }

    #[test]
    fn test_push_truncates_redo_tail() {
        let mut history = HistoryStack::new(content_with(0));
        history.push(content_with(1), "a");
        history.push(content_with(2), "b");
        history.undo();
        history.undo();

        history.push(content_with(5), "c");

        assert_eq!(history.len(), 2);
        assert!(!history.can_redo());
        assert_eq!(count(history.current()), 5);
    }

    #[test]
    fn test_pointer_stays_in_bounds_for_any_sequence() {
        let mut history = HistoryStack::new(content_with(0));
        // Deterministic pseudo-random op sequence
        let mut seed: u32 = 0x9e37_79b9;
        for step in 0..500 {
            seed ^= seed << 13;
            seed ^= seed >> 17;
            seed ^= seed << 5;
            match seed % 3 {
                0 => history.push(content_with(step % 4), "op"),
                1 => {
                    history.undo();
                }
                _ => {
                    history.redo();
                }
            }
            assert!(history.pointer() < history.len());
        }
    }

    #[test]
    fn test_max_levels_enforced() {
        let mut history = HistoryStack::with_max_levels(content_with(0), 3);
        for i in 1..=5 {
            history.push(content_with(i), format!("step {}", i));
        }

        assert_eq!(history.len(), 3);
        assert_eq!(history.pointer(), 2);
        assert_eq!(count(history.undo().unwrap()), 4);
        assert_eq!(count(history.undo().unwrap()), 3);
        assert!(history.undo().is_none());
    }

    #[test]
    fn test_theme_is_part_of_snapshot() {
        let mut history = HistoryStack::new(content_with(0));
        let mut dark = content_with(0);
        dark.theme = Theme::dark();
        history.push(dark, "Theme");

        assert_eq!(history.undo().unwrap().content.theme, Theme::default());
    }
}
