use tokio::sync::watch;

use crate::events::EventSender;
use crate::models::SessionSnapshot;
use crate::session::SessionHandle;

/// Transport-agnostic context shared by API routes.
#[derive(Clone)]
pub struct ServiceContext {
    pub session: SessionHandle,
    pub event_tx: EventSender,
    pub snapshot_rx: watch::Receiver<SessionSnapshot>,
}
