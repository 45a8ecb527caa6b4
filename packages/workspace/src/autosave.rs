//! Debounced local-draft autosave.
//!
//! Each schedule call cancels the pending timer before arming a new one, so
//! a burst of edits produces one write, `debounce` after the last edit.
//! The write itself runs on the blocking pool.

use std::time::Duration;
use tokio::task::JoinHandle;
use wireframe_editor::{Drafts, LocalDraft};

pub struct Autosaver {
    drafts: Drafts,
    debounce: Duration,
    pending: Option<JoinHandle<()>>,
}

impl Autosaver {
    pub fn new(drafts: Drafts, debounce: Duration) -> Self {
        Self {
            drafts,
            debounce,
            pending: None,
        }
    }

    pub fn schedule(&mut self, draft: LocalDraft) {
        self.cancel();
        let drafts = self.drafts.clone();
        let debounce = self.debounce;
        self.pending = Some(tokio::spawn(async move {
            tokio::time::sleep(debounce).await;
            let key = draft.key.clone();
            match tokio::task::spawn_blocking(move || drafts.save(&draft)).await {
                Ok(Ok(())) => tracing::debug!(key = %key, "autosaved draft"),
                Ok(Err(e)) => tracing::warn!(key = %key, error = %e, "autosave failed"),
                Err(e) => tracing::warn!(key = %key, error = %e, "autosave task failed"),
            }
        }));
    }

    /// Drop the pending write, if any
    pub fn cancel(&mut self) {
        if let Some(task) = self.pending.take() {
            task.abort();
        }
    }

    /// Write `draft` now instead of waiting
    pub fn flush(&mut self, draft: &LocalDraft) {
        self.cancel();
        if let Err(e) = self.drafts.save(draft) {
            tracing::warn!(key = %draft.key, error = %e, "draft flush failed");
        }
    }

    pub fn is_pending(&self) -> bool {
        self.pending.as_ref().is_some_and(|task| !task.is_finished())
    }
}

impl Drop for Autosaver {
    fn drop(&mut self) {
        self.cancel();
    }
}
