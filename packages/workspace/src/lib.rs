//! Async layer of the wireframe editor: remote document stores, change feeds,
//! presence, debounced drafts and the [`WorkspaceClient`] tying them to an
//! [`wireframe_editor::EditSession`].

mod autosave;
mod changes;
mod client;
mod config;
mod error;
mod feed;
mod file_store;
mod memory_store;
mod presence;
mod store;
mod versions;
pub mod watcher;

pub use autosave::Autosaver;
pub use changes::ChangeLogWriter;
pub use client::{EditOutcome, OpenOutcome, WorkspaceClient};
pub use config::{Timings, UserConfig, WorkspaceConfig, DEFAULT_CONFIG_NAME};
pub use error::{WorkspaceError, WorkspaceResult};
pub use feed::{Subscription, FEED_BUFFER};
pub use file_store::FileStore;
pub use memory_store::MemoryStore;
pub use presence::PresenceBroadcaster;
pub use store::{
    sort_templates, DocumentStore, StoreError, StoreResult, TemplateRecord, TemplateRef,
    TemplateSort, TemplateSummary, TemplateUpdate, UNTITLED,
};
pub use versions::VersionService;
pub use watcher::{FileWatcher, WatcherError, WatcherResult};
