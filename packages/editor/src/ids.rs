//! # Component ID allocation
//!
//! Ids are `generated-<n>` from a per-client counter. The counter is resynced
//! from the highest suffix seen whenever a full document is loaded, so one
//! client never hands out an id it has already observed.
//!
//! Two clients inserting between sync rounds can still pick the same id.
//! Nothing here detects that; a later reload will surface the duplicate.

use crate::Document;

pub const GENERATED_PREFIX: &str = "generated-";

/// Monotonic id generator
#[derive(Debug, Clone, Default)]
pub struct IdAllocator {
    next: u64,
}

impl IdAllocator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start counting at `next`
    pub fn starting_at(next: u64) -> Self {
        Self { next }
    }

    /// Return the next id and advance the counter
    pub fn allocate(&mut self) -> String {
        let id = format!("{}{}", GENERATED_PREFIX, self.next);
        self.next += 1;
        id
    }

    /// The number the next `allocate()` will use
    pub fn peek(&self) -> u64 {
        self.next
    }

    /// Move the counter past every generated id in `document`.
    ///
    /// The counter never goes backwards.
    pub fn resync(&mut self, document: &Document) {
        let observed = document
            .component_ids()
            .filter_map(parse_generated_suffix)
            .max();

        if let Some(max) = observed {
            let candidate = max.saturating_add(1);
            if candidate > self.next {
                tracing::debug!(from = self.next, to = candidate, "resynced id allocator");
                self.next = candidate;
            }
        }
    }
}

/// Numeric suffix of an id in the generator's pattern
pub fn parse_generated_suffix(id: &str) -> Option<u64> {
    let digits = id.strip_prefix(GENERATED_PREFIX)?;
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    digits.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Component, ComponentPayload, Rect, Viewport};

    fn doc_with_ids(ids: &[(Viewport, &str)]) -> Document {
        let mut doc = Document::new(0);
        for viewport in Viewport::ALL {
            let list: Vec<Component> = ids
                .iter()
                .filter(|(v, _)| *v == viewport)
                .map(|(_, id)| {
                    Component::new(
                        *id,
                        Rect::new(0.0, 0.0, 10.0, 10.0),
                        ComponentPayload::Divider {},
                    )
                })
                .collect();
            doc.replace_components(viewport, list).unwrap();
        }
        doc
    }

    #[test]
    fn test_allocate_is_sequential() {
        let mut ids = IdAllocator::new();
        assert_eq!(ids.allocate(), "generated-0");
        assert_eq!(ids.allocate(), "generated-1");
        assert_eq!(ids.peek(), 2);
    }

    #[test]
    fn test_resync_takes_max_suffix_across_viewports() {
        let doc = doc_with_ids(&[
            (Viewport::Desktop, "generated-7"),
            (Viewport::Mobile, "generated-12"),
            (Viewport::Tablet, "hero-banner"),
        ]);

        let mut ids = IdAllocator::new();
        ids.resync(&doc);
        assert_eq!(ids.allocate(), "generated-13");
    }

    #[test]
    fn test_resync_never_moves_backwards() {
        let doc = doc_with_ids(&[(Viewport::Desktop, "generated-3")]);

        let mut ids = IdAllocator::starting_at(40);
        ids.resync(&doc);
        assert_eq!(ids.allocate(), "generated-40");
    }

    #[test]
    fn test_suffix_parsing() {
        assert_eq!(parse_generated_suffix("generated-0"), Some(0));
        assert_eq!(parse_generated_suffix("generated-"), None);
        assert_eq!(parse_generated_suffix("generated-1a"), None);
        assert_eq!(parse_generated_suffix("generated--1"), None);
        assert_eq!(parse_generated_suffix("button-4"), None);
    }
}
