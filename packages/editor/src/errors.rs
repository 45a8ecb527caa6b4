//! Error types for the editor

use crate::{ComponentKind, Viewport};
use thiserror::Error;
use wireframe_common::CommonError;

#[derive(Error, Debug)]
pub enum EditorError {
    #[error("Component not found: {id} in {viewport}")]
    ComponentNotFound { viewport: Viewport, id: String },

    #[error("Duplicate component id {id} in {viewport}")]
    DuplicateComponentId { viewport: Viewport, id: String },

    #[error("Invalid box for component {id}")]
    InvalidBox { id: String },

    #[error("Cannot change component {id} from {expected} to {found}")]
    KindMismatch {
        id: String,
        expected: ComponentKind,
        found: ComponentKind,
    },

    #[error("Unknown viewport: {0}")]
    UnknownViewport(String),

    #[error("Unknown component kind: {0}")]
    UnknownKind(String),

    #[error("Unknown theme mode: {0} (expected light or dark)")]
    UnknownThemeMode(String),

    #[error("Viewport {0} already has components")]
    ViewportNotEmpty(Viewport),

    #[error("Invalid container size {width}x{height}")]
    InvalidContainer { width: f64, height: f64 },

    #[error("Grid size must be positive, got {0}")]
    InvalidGridSize(f64),

    #[error("No document is open")]
    NoDocument,

    #[error("Cannot {action} while session is {phase}")]
    InvalidTransition { phase: &'static str, action: &'static str },

    #[error("No pending conflict to resolve")]
    NoPendingConflict,

    #[error("Version snapshot not found: {0}")]
    SnapshotNotFound(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Storage error: {0}")]
    Storage(#[from] CommonError),
}

pub type EditorResult<T> = Result<T, EditorError>;
