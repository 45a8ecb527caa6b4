//! # Presence
//!
//! Ephemeral per-user liveness and cursor records. A record is visible to
//! others while its `last_active` is within the TTL; there is no explicit
//! expiry, readers just filter.
//!
//! Colors derive from a stable hash of the user id so every client agrees
//! on a collaborator's color without coordination.

use crate::{NormalizedPoint, Viewport};
use serde::{Deserialize, Serialize};
use wireframe_common::Millis;

pub const PRESENCE_TTL_MS: Millis = 30_000;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PresenceRecord {
    pub user_id: String,
    pub display_name: String,
    pub cursor: NormalizedPoint,
    pub viewport: Viewport,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selected_component_id: Option<String>,
    pub color: String,
    pub last_active: Millis,
}

impl PresenceRecord {
    pub fn new(user_id: impl Into<String>, display_name: impl Into<String>, viewport: Viewport, now: Millis) -> Self {
        let user_id = user_id.into();
        Self {
            color: user_color(&user_id),
            user_id,
            display_name: display_name.into(),
            cursor: NormalizedPoint::default(),
            viewport,
            selected_component_id: None,
            last_active: now,
        }
    }

    pub fn is_live(&self, now: Millis, ttl_ms: Millis) -> bool {
        now.saturating_sub(self.last_active) <= ttl_ms
    }
}

/// Deterministic display color for a user: FNV-1a over the id, mapped to
/// an HSL hue.
pub fn user_color(user_id: &str) -> String {
    const FNV_OFFSET: u32 = 0x811c_9dc5;
    const FNV_PRIME: u32 = 0x0100_0193;

    let hash = user_id
        .bytes()
        .fold(FNV_OFFSET, |h, b| (h ^ u32::from(b)).wrapping_mul(FNV_PRIME));
    format!("hsl({}, 70%, 50%)", hash % 360)
}

/// Collaborators worth showing: live and not the local user
pub fn visible_collaborators<'a>(
    records: impl IntoIterator<Item = &'a PresenceRecord>,
    local_user_id: &str,
    now: Millis,
    ttl_ms: Millis,
) -> Vec<&'a PresenceRecord> {
    let mut visible: Vec<_> = records
        .into_iter()
        .filter(|r| r.user_id != local_user_id && r.is_live(now, ttl_ms))
        .collect();
    visible.sort_by(|a, b| a.display_name.cmp(&b.display_name).then(a.user_id.cmp(&b.user_id)));
    visible
}

/// Cursors to draw on the local canvas.
///
/// Collaborators on another viewport are left out rather than reprojected.
pub fn visible_cursors<'a>(
    records: impl IntoIterator<Item = &'a PresenceRecord>,
    local_user_id: &str,
    local_viewport: Viewport,
    now: Millis,
    ttl_ms: Millis,
) -> Vec<&'a PresenceRecord> {
    visible_collaborators(records, local_user_id, now, ttl_ms)
        .into_iter()
        .filter(|r| r.viewport == local_viewport)
        .collect()
}
