//! Remote document store boundary.
//!
//! Hierarchy: project → template → {versions, presence, changes}. Template
//! writes carry whole per-viewport arrays and are last-write-wins; the
//! store never merges inside an array.

use crate::feed::Subscription;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use thiserror::Error;
use wireframe_common::Millis;
use wireframe_editor::{
    ChangeLogEntry, Document, PresenceRecord, Theme, VersionSnapshot, Viewport, ViewportState,
};

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Template not found: {0}")]
    TemplateNotFound(TemplateRef),

    #[error("Version not found: {0}")]
    VersionNotFound(String),

    #[error("Invalid identifier: {0:?}")]
    InvalidId(String),

    #[error("Invalid template name: {0:?}")]
    InvalidName(String),

    #[error("Store unavailable: {0}")]
    Unavailable(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Watch error: {0}")]
    Watch(#[from] notify::Error),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Address of one template inside a project
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TemplateRef {
    pub project_id: String,
    pub template_id: String,
}

impl TemplateRef {
    pub fn new(project_id: impl Into<String>, template_id: impl Into<String>) -> Self {
        Self {
            project_id: project_id.into(),
            template_id: template_id.into(),
        }
    }
}

impl fmt::Display for TemplateRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.project_id, self.template_id)
    }
}

/// Shown for templates that were never named
pub const UNTITLED: &str = "Untitled";

const MAX_NAME_LEN: usize = 200;

/// Stored form of a template
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TemplateRecord {
    /// Empty until the template is named
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub viewports: BTreeMap<Viewport, ViewportState>,
    #[serde(default)]
    pub theme: Theme,
    #[serde(default)]
    pub canvas_width: f64,
    #[serde(default)]
    pub canvas_height: f64,
    /// Owned by other tools; carried through untouched
    #[serde(default)]
    pub tasks: serde_json::Value,
    #[serde(default)]
    pub comments: serde_json::Value,
    #[serde(default)]
    pub updated_at: Millis,
}

impl TemplateRecord {
    pub fn new(update: TemplateUpdate) -> Self {
        Self {
            name: String::new(),
            viewports: update.viewports,
            theme: update.theme,
            canvas_width: update.canvas_width,
            canvas_height: update.canvas_height,
            tasks: serde_json::Value::Array(Vec::new()),
            comments: serde_json::Value::Array(Vec::new()),
            updated_at: update.updated_at,
        }
    }

    pub fn to_document(&self) -> Document {
        Document::from_parts(self.viewports.clone(), self.theme.clone(), self.updated_at)
    }

    /// Overwrite the document fields, leaving tasks and comments alone
    pub fn apply(&mut self, update: &TemplateUpdate) {
        self.viewports = update.viewports.clone();
        self.theme = update.theme.clone();
        self.canvas_width = update.canvas_width;
        self.canvas_height = update.canvas_height;
        self.updated_at = update.updated_at;
    }

    pub fn rename(&mut self, name: &str, at: Millis) -> StoreResult<()> {
        self.name = validate_name(name)?;
        self.updated_at = at;
        Ok(())
    }
}

/// One row of a project listing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TemplateSummary {
    pub template: TemplateRef,
    pub name: String,
    pub updated_at: Millis,
}

impl TemplateSummary {
    pub fn new(template: TemplateRef, record: &TemplateRecord) -> Self {
        Self {
            template,
            name: record.name.clone(),
            updated_at: record.updated_at,
        }
    }

    pub fn display_name(&self) -> &str {
        if self.name.is_empty() {
            UNTITLED
        } else {
            &self.name
        }
    }

    /// Case-insensitive match against the name or the template id
    pub fn matches(&self, query: &str) -> bool {
        let query = query.trim().to_lowercase();
        query.is_empty()
            || self.display_name().to_lowercase().contains(&query)
            || self.template.template_id.to_lowercase().contains(&query)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TemplateSort {
    /// Most recently updated first
    #[default]
    Recent,
    /// Alphabetical by display name
    Name,
}

pub fn sort_templates(summaries: &mut [TemplateSummary], sort: TemplateSort) {
    match sort {
        TemplateSort::Recent => summaries.sort_by(|a, b| {
            b.updated_at
                .cmp(&a.updated_at)
                .then_with(|| a.template.cmp(&b.template))
        }),
        TemplateSort::Name => summaries.sort_by(|a, b| {
            a.display_name()
                .to_lowercase()
                .cmp(&b.display_name().to_lowercase())
                .then_with(|| b.updated_at.cmp(&a.updated_at))
        }),
    }
}

/// Fields a document write replaces
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TemplateUpdate {
    pub viewports: BTreeMap<Viewport, ViewportState>,
    pub theme: Theme,
    pub canvas_width: f64,
    pub canvas_height: f64,
    pub updated_at: Millis,
}

impl TemplateUpdate {
    /// Top-level canvas size follows the active viewport
    pub fn from_document(document: &Document, active: Viewport) -> Self {
        let canvas = document.canvas_size(active);
        Self {
            viewports: document.viewports().clone(),
            theme: document.theme.clone(),
            canvas_width: canvas.width,
            canvas_height: canvas.height,
            updated_at: document.updated_at,
        }
    }
}

#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Create a template under `project_id` and return its address
    async fn create_template(&self, project_id: &str, update: &TemplateUpdate) -> StoreResult<TemplateRef>;

    async fn load_template(&self, template: &TemplateRef) -> StoreResult<TemplateRecord>;

    async fn save_template(&self, template: &TemplateRef, update: &TemplateUpdate) -> StoreResult<()>;

    async fn list_templates(&self, project_id: &str) -> StoreResult<Vec<TemplateRef>>;

    /// Set the display name. Counts as an update.
    async fn rename_template(&self, template: &TemplateRef, name: &str, at: Millis) -> StoreResult<()>;

    /// Remove the template together with its changes, presence and versions
    async fn delete_template(&self, template: &TemplateRef) -> StoreResult<()>;

    /// Every template in the project, most recently updated first
    async fn recent_templates(&self, project_id: &str) -> StoreResult<Vec<TemplateSummary>> {
        let mut summaries = Vec::new();
        for template in self.list_templates(project_id).await? {
            match self.load_template(&template).await {
                Ok(record) => summaries.push(TemplateSummary::new(template, &record)),
                // Deleted since the listing
                Err(StoreError::TemplateNotFound(_)) => {}
                Err(e) => return Err(e),
            }
        }
        sort_templates(&mut summaries, TemplateSort::Recent);
        Ok(summaries)
    }

    async fn append_change(&self, template: &TemplateRef, entry: &ChangeLogEntry) -> StoreResult<()>;

    /// Newest first
    async fn recent_changes(&self, template: &TemplateRef, limit: usize) -> StoreResult<Vec<ChangeLogEntry>>;

    async fn put_presence(&self, template: &TemplateRef, record: &PresenceRecord) -> StoreResult<()>;

    async fn delete_presence(&self, template: &TemplateRef, user_id: &str) -> StoreResult<()>;

    /// Every stored record, live or not; readers apply the TTL
    async fn list_presence(&self, template: &TemplateRef) -> StoreResult<Vec<PresenceRecord>>;

    async fn put_version(&self, template: &TemplateRef, snapshot: &VersionSnapshot) -> StoreResult<()>;

    async fn get_version(&self, template: &TemplateRef, id: &str) -> StoreResult<VersionSnapshot>;

    async fn list_versions(&self, template: &TemplateRef) -> StoreResult<Vec<VersionSnapshot>>;

    /// Current record followed by every later write, including our own
    async fn subscribe(&self, template: &TemplateRef) -> StoreResult<Subscription<TemplateRecord>>;

    /// Full presence list after every presence write
    async fn subscribe_presence(
        &self,
        template: &TemplateRef,
    ) -> StoreResult<Subscription<Vec<PresenceRecord>>>;
}

/// Ids become path segments in file-backed stores
pub(crate) fn validate_id(id: &str) -> StoreResult<()> {
    let valid = !id.is_empty()
        && id.len() <= 128
        && id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
    if valid {
        Ok(())
    } else {
        Err(StoreError::InvalidId(id.to_string()))
    }
}

/// Trimmed, non-empty and bounded
pub(crate) fn validate_name(name: &str) -> StoreResult<String> {
    let trimmed = name.trim();
    if trimmed.is_empty() || trimmed.chars().count() > MAX_NAME_LEN {
        return Err(StoreError::InvalidName(name.to_string()));
    }
    Ok(trimmed.to_string())
}
