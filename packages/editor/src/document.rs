//! # Document Model
//!
//! A Document is the complete design for one template: one ordered
//! component array per viewport plus the theme.
//!
//! ## Copy-on-write
//!
//! Each viewport's array lives behind an `Arc`. Reads borrow it, snapshots
//! (history entries, drafts, versions) clone the `Arc`, and mutation always
//! swaps in a whole new array through [`Document::replace_components`].
//! There is no partial patching of a shared array.
//!
//! ```text
//! edit ──► build new Vec<Component> ──► replace_components(viewport, list)
//!                                            │
//!                                            ├─ validate ids / boxes
//!                                            └─ recompute canvas height
//! ```

use crate::{Component, EditorError, EditorResult, IdAllocator, Theme, Viewport};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;
use wireframe_common::Millis;

/// Space kept below the lowest component so the canvas can scroll past it
pub const CANVAS_BOTTOM_PADDING: f64 = 100.0;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CanvasSize {
    pub width: f64,
    pub height: f64,
}

/// Components and canvas extent of one viewport
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ViewportState {
    pub components: Arc<Vec<Component>>,
    pub canvas_width: f64,
    pub canvas_height: f64,
}

impl ViewportState {
    pub fn empty(viewport: Viewport) -> Self {
        Self::with_components(viewport, Arc::new(Vec::new()))
    }

    fn with_components(viewport: Viewport, components: Arc<Vec<Component>>) -> Self {
        let canvas_height = canvas_height_for(viewport, &components);
        Self {
            components,
            canvas_width: viewport.width(),
            canvas_height,
        }
    }

    pub fn canvas_size(&self) -> CanvasSize {
        CanvasSize {
            width: self.canvas_width,
            height: self.canvas_height,
        }
    }
}

/// Canvas height: the nominal height, or the furthest bottom edge plus
/// padding when content runs past it
pub fn canvas_height_for(viewport: Viewport, components: &[Component]) -> f64 {
    let furthest = components
        .iter()
        .map(|c| c.rect.bottom())
        .fold(0.0_f64, f64::max);
    (furthest + CANVAS_BOTTOM_PADDING).max(viewport.height())
}

/// Snapshot form used by history: viewports and theme only
#[derive(Debug, Clone, PartialEq)]
pub struct DocumentContent {
    pub viewports: BTreeMap<Viewport, ViewportState>,
    pub theme: Theme,
}

/// The design document for one template
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", from = "RawDocument")]
pub struct Document {
    viewports: BTreeMap<Viewport, ViewportState>,
    pub theme: Theme,
    pub updated_at: Millis,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawDocument {
    #[serde(default)]
    viewports: BTreeMap<Viewport, ViewportState>,
    #[serde(default)]
    theme: Theme,
    #[serde(default)]
    updated_at: Millis,
}

impl From<RawDocument> for Document {
    fn from(raw: RawDocument) -> Self {
        Document::from_parts(raw.viewports, raw.theme, raw.updated_at)
    }
}

impl Document {
    /// Empty document with every viewport present
    pub fn new(now: Millis) -> Self {
        Self {
            viewports: Viewport::ALL
                .into_iter()
                .map(|v| (v, ViewportState::empty(v)))
                .collect(),
            theme: Theme::default(),
            updated_at: now,
        }
    }

    /// Build from stored parts. Missing viewports are filled in and canvas
    /// sizes are recomputed; ids are taken as-is, duplicates included.
    pub fn from_parts(
        viewports: BTreeMap<Viewport, ViewportState>,
        theme: Theme,
        updated_at: Millis,
    ) -> Self {
        let mut doc = Self::new(updated_at);
        doc.theme = theme;
        for (viewport, state) in viewports {
            doc.viewports
                .insert(viewport, ViewportState::with_components(viewport, state.components));
        }
        doc
    }

    pub fn components(&self, viewport: Viewport) -> &[Component] {
        self.viewport(viewport).components.as_slice()
    }

    /// Shared handle to a viewport's array (no copy)
    pub fn shared_components(&self, viewport: Viewport) -> Arc<Vec<Component>> {
        Arc::clone(&self.viewport(viewport).components)
    }

    pub fn viewport(&self, viewport: Viewport) -> &ViewportState {
        // Every constructor inserts all viewports
        &self.viewports[&viewport]
    }

    pub fn viewports(&self) -> &BTreeMap<Viewport, ViewportState> {
        &self.viewports
    }

    /// Replace a viewport's whole component array.
    ///
    /// Rejects duplicate ids and invalid boxes; on error nothing changes.
    pub fn replace_components(
        &mut self,
        viewport: Viewport,
        components: Vec<Component>,
    ) -> EditorResult<()> {
        let mut seen = HashSet::with_capacity(components.len());
        for component in &components {
            if !component.rect.is_valid() {
                return Err(EditorError::InvalidBox {
                    id: component.id.clone(),
                });
            }
            if !seen.insert(component.id.as_str()) {
                return Err(EditorError::DuplicateComponentId {
                    viewport,
                    id: component.id.clone(),
                });
            }
        }

        self.viewports.insert(
            viewport,
            ViewportState::with_components(viewport, Arc::new(components)),
        );
        Ok(())
    }

    pub fn canvas_size(&self, viewport: Viewport) -> CanvasSize {
        self.viewport(viewport).canvas_size()
    }

    pub fn find_component(&self, viewport: Viewport, id: &str) -> Option<&Component> {
        self.components(viewport).iter().find(|c| c.id == id)
    }

    /// Stacking order of a component (its array index)
    pub fn z_index(&self, viewport: Viewport, id: &str) -> Option<usize> {
        self.components(viewport).iter().position(|c| c.id == id)
    }

    pub fn component_counts(&self) -> BTreeMap<Viewport, usize> {
        self.viewports
            .iter()
            .map(|(v, state)| (*v, state.components.len()))
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.viewports.values().all(|s| s.components.is_empty())
    }

    /// Every component id across all viewports
    pub fn component_ids(&self) -> impl Iterator<Item = &str> {
        self.viewports
            .values()
            .flat_map(|s| s.components.iter().map(|c| c.id.as_str()))
    }

    /// Ids that occur more than once within a single viewport
    pub fn duplicate_ids(&self) -> Vec<(Viewport, String)> {
        let mut duplicates = Vec::new();
        for (viewport, state) in &self.viewports {
            let mut seen = HashSet::new();
            for component in state.components.iter() {
                if !seen.insert(component.id.as_str()) {
                    duplicates.push((*viewport, component.id.clone()));
                }
            }
        }
        duplicates
    }

    pub fn content(&self) -> DocumentContent {
        DocumentContent {
            viewports: self.viewports.clone(),
            theme: self.theme.clone(),
        }
    }

    pub fn restore_content(&mut self, content: &DocumentContent) {
        self.viewports = content.viewports.clone();
        self.theme = content.theme.clone();
    }

    pub fn touch(&mut self, now: Millis) {
        self.updated_at = now;
    }

    /// Fill an empty `target` viewport with rescaled copies of `source`.
    ///
    /// Boxes scale by the ratio of nominal viewport sizes per axis and every
    /// copy gets a fresh id so ids never collide across viewports.
    pub fn clone_viewport(
        &mut self,
        source: Viewport,
        target: Viewport,
        ids: &mut IdAllocator,
    ) -> EditorResult<usize> {
        if !self.components(target).is_empty() {
            return Err(EditorError::ViewportNotEmpty(target));
        }

        let sx = target.width() / source.width();
        let sy = target.height() / source.height();

        let clones: Vec<Component> = self
            .components(source)
            .iter()
            .map(|component| Component {
                id: ids.allocate(),
                rect: component.rect.scaled(sx, sy),
                ..component.clone()
            })
            .collect();

        let count = clones.len();
        self.replace_components(target, clones)?;
        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{ComponentPayload, Rect};

    fn button(id: &str, rect: Rect) -> Component {
        Component::new(id, rect, ComponentPayload::default_for(crate::ComponentKind::Button))
    }

    #[test]
    fn test_new_document_has_all_viewports() {
        let doc = Document::new(0);
        for viewport in Viewport::ALL {
            assert!(doc.components(viewport).is_empty());
            assert_eq!(
                doc.canvas_size(viewport),
                CanvasSize {
                    width: viewport.width(),
                    height: viewport.height()
                }
            );
        }
        assert!(doc.is_empty());
    }

    #[test]
    fn test_canvas_grows_past_nominal_height() {
        let mut doc = Document::new(0);
        doc.replace_components(
            Viewport::Mobile,
            vec![button("a", Rect::new(0.0, 900.0, 100.0, 50.0))],
        )
        .unwrap();

        assert_eq!(doc.canvas_size(Viewport::Mobile).height, 1050.0);

        doc.replace_components(Viewport::Mobile, vec![]).unwrap();
        assert_eq!(doc.canvas_size(Viewport::Mobile).height, 667.0);
    }

    #[test]
    fn test_replace_rejects_duplicate_ids() {
        let mut doc = Document::new(0);
        let result = doc.replace_components(
            Viewport::Desktop,
            vec![
                button("a", Rect::new(0.0, 0.0, 1.0, 1.0)),
                button("a", Rect::new(5.0, 5.0, 1.0, 1.0)),
            ],
        );

        assert!(matches!(result, Err(EditorError::DuplicateComponentId { .. })));
        assert!(doc.components(Viewport::Desktop).is_empty());
    }

    #[test]
    fn test_replace_rejects_negative_size() {
        let mut doc = Document::new(0);
        let result = doc.replace_components(
            Viewport::Desktop,
            vec![button("a", Rect::new(0.0, 0.0, -4.0, 1.0))],
        );
        assert!(matches!(result, Err(EditorError::InvalidBox { .. })));
    }

    #[test]
    fn test_snapshot_shares_arrays_until_replaced() {
        let mut doc = Document::new(0);
        doc.replace_components(
            Viewport::Tablet,
            vec![button("a", Rect::new(0.0, 0.0, 1.0, 1.0))],
        )
        .unwrap();

        let snapshot = doc.content();
        assert!(Arc::ptr_eq(
            &snapshot.viewports[&Viewport::Tablet].components,
            &doc.shared_components(Viewport::Tablet)
        ));

        doc.replace_components(Viewport::Tablet, vec![]).unwrap();
        assert_eq!(snapshot.viewports[&Viewport::Tablet].components.len(), 1);
    }

    #[test]
    fn test_clone_from_mobile_rescales_with_fresh_ids() {
        let mut doc = Document::new(0);
        doc.replace_components(
            Viewport::Mobile,
            vec![button("generated-0", Rect::new(75.0, 667.0 / 2.0, 150.0, 66.7))],
        )
        .unwrap();

        let mut ids = IdAllocator::starting_at(1);
        let count = doc
            .clone_viewport(Viewport::Mobile, Viewport::Desktop, &mut ids)
            .unwrap();

        assert_eq!(count, 1);
        let clone = &doc.components(Viewport::Desktop)[0];
        assert_eq!(clone.id, "generated-1");
        assert!((clone.rect.x - 384.0).abs() < 1e-9);
        assert!((clone.rect.y - 540.0).abs() < 1e-9);
        assert!((clone.rect.width - 768.0).abs() < 1e-9);
        assert_eq!(clone.kind(), crate::ComponentKind::Button);
    }

    #[test]
    fn test_clone_into_non_empty_viewport_fails() {
        let mut doc = Document::new(0);
        doc.replace_components(
            Viewport::Desktop,
            vec![button("x", Rect::new(0.0, 0.0, 1.0, 1.0))],
        )
        .unwrap();

        let mut ids = IdAllocator::new();
        let result = doc.clone_viewport(Viewport::Mobile, Viewport::Desktop, &mut ids);
        assert!(matches!(result, Err(EditorError::ViewportNotEmpty(Viewport::Desktop))));
    }

    #[test]
    fn test_deserialize_fills_missing_viewports_and_keeps_duplicates() {
        let json = r#"{
            "viewports": {
                "mobile": {
                    "components": [
                        { "id": "generated-1", "box": [0, 0, 10, 10], "kind": "divider" },
                        { "id": "generated-1", "box": [0, 20, 10, 10], "kind": "divider" }
                    ],
                    "canvasWidth": 1, "canvasHeight": 1
                }
            },
            "updatedAt": 5
        }"#;

        let doc: Document = serde_json::from_str(json).unwrap();
        assert_eq!(doc.components(Viewport::Desktop).len(), 0);
        assert_eq!(doc.canvas_size(Viewport::Mobile).width, 375.0);
        assert_eq!(doc.canvas_size(Viewport::Mobile).height, 667.0);
        assert_eq!(
            doc.duplicate_ids(),
            vec![(Viewport::Mobile, "generated-1".to_string())]
        );
    }
}
