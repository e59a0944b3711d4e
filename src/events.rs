use serde::Serialize;
use tokio::sync::broadcast;

use crate::gesture::{GestureLabel, GestureTranslation};
use crate::models::{SessionSnapshot, Severity};

/// Transport-agnostic application events.
/// Emitted by the session engine, consumed by the WebSocket API.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", content = "data")]
pub enum AppEvent {
    SessionChanged(SessionSnapshot),
    GestureDetected {
        label: GestureLabel,
        translation: GestureTranslation,
    },
    Notification {
        title: String,
        body: String,
        severity: Severity,
        at: String,
    },
}

pub type EventSender = broadcast::Sender<AppEvent>;
pub type EventReceiver = broadcast::Receiver<AppEvent>;

pub fn create_event_bus() -> (EventSender, EventReceiver) {
    broadcast::channel(256)
}
