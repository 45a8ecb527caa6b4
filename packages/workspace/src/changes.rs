//! Best-effort change log persistence. The log is an audit trail and a
//! conflict signal; losing an entry must never fail an edit.

use crate::store::{DocumentStore, TemplateRef};
use std::sync::Arc;
use wireframe_editor::ChangeLogEntry;

#[derive(Clone)]
pub struct ChangeLogWriter {
    store: Arc<dyn DocumentStore>,
}

impl ChangeLogWriter {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    /// Append every entry, logging and skipping failures. Returns how many
    /// were written.
    pub async fn record(&self, template: &TemplateRef, entries: &[ChangeLogEntry]) -> usize {
        let mut written = 0;
        for entry in entries {
            match self.store.append_change(template, entry).await {
                Ok(()) => written += 1,
                Err(e) => tracing::warn!(
                    %template,
                    component = %entry.component_id,
                    action = %entry.action,
                    error = %e,
                    "dropping change log entry"
                ),
            }
        }
        written
    }
}
