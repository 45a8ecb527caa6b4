//! # Presence broadcaster
//!
//! One background task per collaborating client. It publishes the local
//! presence record shortly after the cursor settles and again on every
//! heartbeat, so a client that stops moving still counts as live.
//!
//! ```text
//! move ─► move ─► move ──100ms──► put
//!                                  ... 10s ... ─► put (heartbeat)
//! viewport ─► put (cursor reset)
//! stop ─► delete
//! ```
//!
//! Failed writes are logged and left for the next heartbeat.

use crate::store::{DocumentStore, TemplateRef};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use wireframe_common::Clock;
use wireframe_editor::{NormalizedPoint, PresenceRecord, Viewport};

enum Command {
    Cursor {
        cursor: NormalizedPoint,
        viewport: Viewport,
    },
    Select(Option<String>),
    Viewport(Viewport),
    Stop,
}

/// Handle to a running broadcaster. Dropping it stops the task without
/// deleting the record, which then expires by TTL.
pub struct PresenceBroadcaster {
    commands: mpsc::UnboundedSender<Command>,
    task: Option<JoinHandle<()>>,
}

impl PresenceBroadcaster {
    pub fn start(
        store: Arc<dyn DocumentStore>,
        template: TemplateRef,
        record: PresenceRecord,
        clock: Arc<dyn Clock>,
        debounce: Duration,
        heartbeat: Duration,
    ) -> Self {
        let (commands, rx) = mpsc::unbounded_channel();
        let task = tokio::spawn(run(store, template, record, clock, debounce, heartbeat, rx));
        Self {
            commands,
            task: Some(task),
        }
    }

    pub fn move_cursor(&self, cursor: NormalizedPoint, viewport: Viewport) {
        let _ = self.commands.send(Command::Cursor { cursor, viewport });
    }

    pub fn select(&self, component_id: Option<String>) {
        let _ = self.commands.send(Command::Select(component_id));
    }

    /// Move to another viewport. Published right away with the cursor
    /// reset, since a cursor never carries over between viewports.
    pub fn switch_viewport(&self, viewport: Viewport) {
        let _ = self.commands.send(Command::Viewport(viewport));
    }

    /// Stop broadcasting and delete the record (best-effort)
    pub async fn stop(mut self) {
        let _ = self.commands.send(Command::Stop);
        if let Some(task) = self.task.take() {
            if let Err(e) = task.await {
                tracing::warn!(error = %e, "presence task ended abnormally");
            }
        }
    }
}

impl Drop for PresenceBroadcaster {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

async fn run(
    store: Arc<dyn DocumentStore>,
    template: TemplateRef,
    mut record: PresenceRecord,
    clock: Arc<dyn Clock>,
    debounce: Duration,
    heartbeat: Duration,
    mut commands: mpsc::UnboundedReceiver<Command>,
) {
    // First tick fires immediately: that is the initial publish
    let mut ticker = tokio::time::interval(heartbeat);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let mut deadline: Option<Instant> = None;

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                publish(store.as_ref(), &template, &mut record, clock.as_ref()).await;
            }
            _ = tokio::time::sleep_until(deadline.unwrap_or_else(Instant::now)), if deadline.is_some() => {
                deadline = None;
                publish(store.as_ref(), &template, &mut record, clock.as_ref()).await;
            }
            command = commands.recv() => match command {
                Some(Command::Cursor { cursor, viewport }) => {
                    record.cursor = cursor;
                    record.viewport = viewport;
                    deadline = Some(Instant::now() + debounce);
                }
                Some(Command::Select(id)) => {
                    record.selected_component_id = id;
                    deadline = Some(Instant::now() + debounce);
                }
                Some(Command::Viewport(viewport)) => {
                    record.viewport = viewport;
                    record.cursor = NormalizedPoint::default();
                    record.selected_component_id = None;
                    deadline = None;
                    publish(store.as_ref(), &template, &mut record, clock.as_ref()).await;
                }
                Some(Command::Stop) | None => break,
            },
        }
    }

    if let Err(e) = store.delete_presence(&template, &record.user_id).await {
        tracing::warn!(%template, error = %e, "failed to delete presence record");
    } else {
        tracing::debug!(%template, user = %record.user_id, "presence removed");
    }
}

async fn publish(
    store: &dyn DocumentStore,
    template: &TemplateRef,
    record: &mut PresenceRecord,
    clock: &dyn Clock,
) {
    record.last_active = clock.now_millis();
    if let Err(e) = store.put_presence(template, record).await {
        tracing::warn!(%template, error = %e, "presence write failed; retrying on next heartbeat");
    }
}
