pub mod drafts;
pub mod init;
pub mod log;
pub mod prefs;
pub mod presence;
pub mod template;
pub mod versions;
pub mod watch;

pub use drafts::{drafts, DraftCommand};
pub use init::{init, InitArgs};
pub use log::{log, LogArgs};
pub use prefs::{prefs, PrefsCommand};
pub use presence::{presence, PresenceArgs};
pub use template::{template, TemplateCommand};
pub use versions::{versions, VersionCommand};
pub use watch::{watch, WatchArgs};

use anyhow::{bail, Result};
use wireframe_common::Millis;
use wireframe_workspace::{OpenOutcome, WorkspaceClient};

/// Local wall-clock rendering of a millisecond timestamp
pub(crate) fn format_time(ms: Millis) -> String {
    match chrono::DateTime::<chrono::Utc>::from_timestamp_millis(ms) {
        Some(at) => at
            .with_timezone(&chrono::Local)
            .format("%Y-%m-%d %H:%M:%S")
            .to_string(),
        None => ms.to_string(),
    }
}

/// Rough "3m" / "2h" style age
pub(crate) fn format_age(ms: Millis) -> String {
    let secs = ms.max(0) / 1_000;
    match secs {
        0..=59 => format!("{}s", secs),
        60..=3_599 => format!("{}m", secs / 60),
        3_600..=86_399 => format!("{}h", secs / 3_600),
        _ => format!("{}d", secs / 86_400),
    }
}

/// Open `template_id` for a write. A pending local draft would be silently
/// shadowed, so refuse instead.
pub(crate) async fn open_for_write(client: &mut WorkspaceClient, template_id: &str) -> Result<()> {
    match client.open(Some(template_id)).await? {
        OpenOutcome::Loaded => Ok(()),
        OpenOutcome::DraftOffered { age_ms } => {
            client.close().await;
            bail!(
                "{} has an unsaved local draft ({} old); run `wireframe drafts clear {}` first",
                template_id,
                format_age(age_ms),
                template_id
            )
        }
    }
}
