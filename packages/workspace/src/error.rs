use crate::store::StoreError;
use std::path::PathBuf;
use thiserror::Error;
use wireframe_common::CommonError;
use wireframe_editor::EditorError;

#[derive(Error, Debug)]
pub enum WorkspaceError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Editor(#[from] EditorError),

    #[error(transparent)]
    Local(#[from] CommonError),

    #[error("Invalid config {}: {source}", path.display())]
    Config {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Document has not been saved remotely yet")]
    NoTemplate,
}

pub type WorkspaceResult<T> = Result<T, WorkspaceError>;
