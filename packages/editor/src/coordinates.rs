//! # Coordinate Transform
//!
//! The canvas is stored in viewport logical units and rendered into a
//! container of arbitrary pixel size. Scale is independent per axis:
//!
//! ```text
//! scale_x = container_width  / canvas_width
//! scale_y = container_height / canvas_height
//! ```
//!
//! Snapping happens in container space (the grid is scaled first) and the
//! result is mapped back, so the stored logical value lands exactly on a
//! multiple of the grid size.

use crate::{CanvasSize, EditorError, EditorResult, Rect};
use serde::{Deserialize, Serialize};

/// Rendered size of the editor surface in pixels
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ContainerSize {
    pub width: f64,
    pub height: f64,
}

impl ContainerSize {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }
}

/// A point normalized to the canvas, each axis in `[0, 1]`
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct NormalizedPoint {
    pub x: f64,
    pub y: f64,
}

impl NormalizedPoint {
    /// Clamp into the unit square
    pub fn new(x: f64, y: f64) -> Self {
        let clamp = |v: f64| if v.is_finite() { v.clamp(0.0, 1.0) } else { 0.0 };
        Self {
            x: clamp(x),
            y: clamp(y),
        }
    }
}

/// Logical ↔ container mapping for one canvas
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CanvasTransform {
    canvas: CanvasSize,
    container: ContainerSize,
}

impl CanvasTransform {
    pub fn new(canvas: CanvasSize, container: ContainerSize) -> EditorResult<Self> {
        let usable = |w: f64, h: f64| w.is_finite() && h.is_finite() && w > 0.0 && h > 0.0;
        if !usable(container.width, container.height) {
            return Err(EditorError::InvalidContainer {
                width: container.width,
                height: container.height,
            });
        }
        if !usable(canvas.width, canvas.height) {
            return Err(EditorError::InvalidContainer {
                width: canvas.width,
                height: canvas.height,
            });
        }
        Ok(Self { canvas, container })
    }

    pub fn scale_x(&self) -> f64 {
        self.container.width / self.canvas.width
    }

    pub fn scale_y(&self) -> f64 {
        self.container.height / self.canvas.height
    }

    pub fn to_container(&self, rect: Rect) -> Rect {
        rect.scaled(self.scale_x(), self.scale_y())
    }

    pub fn to_logical(&self, rect: Rect) -> Rect {
        rect.scaled(1.0 / self.scale_x(), 1.0 / self.scale_y())
    }

    /// Snap a dragged container position to the grid, returning the
    /// logical position to store.
    pub fn snap_position(&self, container_x: f64, container_y: f64, grid_size: f64) -> EditorResult<(f64, f64)> {
        if !(grid_size.is_finite() && grid_size > 0.0) {
            return Err(EditorError::InvalidGridSize(grid_size));
        }
        let step_x = grid_size * self.scale_x();
        let step_y = grid_size * self.scale_y();

        // Whole grid steps in container space; multiply back by the logical
        // grid so the stored value is an exact multiple.
        let steps_x = (container_x / step_x).round();
        let steps_y = (container_y / step_y).round();
        Ok((steps_x * grid_size, steps_y * grid_size))
    }

    /// Snap a dragged container box: position and size both land on the grid
    pub fn snap_rect(&self, container_rect: Rect, grid_size: f64) -> EditorResult<Rect> {
        let (x, y) = self.snap_position(container_rect.x, container_rect.y, grid_size)?;
        let (width, height) =
            self.snap_position(container_rect.width, container_rect.height, grid_size)?;
        Ok(Rect::new(x, y, width.max(0.0), height.max(0.0)))
    }

    /// Container pixel position → normalized canvas position
    pub fn normalize(&self, container_x: f64, container_y: f64) -> NormalizedPoint {
        NormalizedPoint::new(container_x / self.container.width, container_y / self.container.height)
    }

    /// Normalized canvas position → container pixel position
    pub fn denormalize(&self, point: NormalizedPoint) -> (f64, f64) {
        (point.x * self.container.width, point.y * self.container.height)
    }
}
