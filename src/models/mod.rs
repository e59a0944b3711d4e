use serde::{Deserialize, Serialize};

use crate::gesture::GestureLabel;

/// Result of the camera permission probe. Independent of whether a call
/// is running.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PermissionState {
    #[default]
    Unknown,
    Granted,
    Denied,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Info,
    Error,
}

/// Read-only view of the call session handed to the UI.
///
/// `video_enabled`, `audio_enabled` and `current_gesture` only carry
/// meaning while `call_active` is true.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SessionSnapshot {
    pub permission_state: PermissionState,
    pub call_active: bool,
    pub video_enabled: bool,
    pub audio_enabled: bool,
    pub current_gesture: Option<GestureLabel>,
    /// A permission probe (initial or retry) is waiting on the media device.
    pub probe_pending: bool,
    /// A start request is waiting on the media device.
    pub start_pending: bool,
}

impl SessionSnapshot {
    /// Whether the UI should offer the start control.
    pub fn can_start(&self) -> bool {
        self.permission_state == PermissionState::Granted
            && !self.call_active
            && !self.probe_pending
            && !self.start_pending
    }
}
