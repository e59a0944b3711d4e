use tracing::{info, warn};

use crate::events::{AppEvent, EventSender};
use crate::models::Severity;

/// User-facing toast/notification sink. Fire-and-forget.
pub trait Notifier: Send + Sync {
    fn notify(&self, title: &str, body: &str, severity: Severity);
}

/// Publishes notifications on the event bus for connected UIs.
pub struct BusNotifier {
    event_tx: EventSender,
}

impl BusNotifier {
    pub fn new(event_tx: EventSender) -> Self {
        Self { event_tx }
    }
}

impl Notifier for BusNotifier {
    fn notify(&self, title: &str, body: &str, severity: Severity) {
        match severity {
            Severity::Info => info!("Notify: {} - {}", title, body),
            Severity::Error => warn!("Notify: {} - {}", title, body),
        }
        // No subscribers is fine.
        let _ = self.event_tx.send(AppEvent::Notification {
            title: title.to_string(),
            body: body.to_string(),
            severity,
            at: chrono::Utc::now().to_rfc3339(),
        });
    }
}
