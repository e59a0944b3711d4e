use axum::{
    extract::{State, ws::{Message, WebSocket, WebSocketUpgrade}},
    response::IntoResponse,
};
use tokio::sync::broadcast;
use tracing::{debug, warn};

use crate::events::{AppEvent, EventReceiver};
use crate::state::ServiceContext;

pub async fn ws_handler(
    ws: WebSocketUpgrade,
    State(ctx): State<ServiceContext>,
) -> impl IntoResponse {
    let initial = ctx.snapshot_rx.borrow().clone();
    let event_rx = ctx.event_tx.subscribe();
    ws.on_upgrade(move |socket| handle_socket(socket, AppEvent::SessionChanged(initial), event_rx))
}

async fn send_event(socket: &mut WebSocket, event: &AppEvent) -> bool {
    match serde_json::to_string(event) {
        Ok(json) => socket.send(Message::Text(json.into())).await.is_ok(),
        Err(e) => {
            warn!("Failed to serialize event: {}", e);
            true
        }
    }
}

async fn handle_socket(mut socket: WebSocket, initial: AppEvent, mut event_rx: EventReceiver) {
    debug!("WebSocket client connected");

    // Current state first, so a fresh UI can render before anything changes.
    if !send_event(&mut socket, &initial).await {
        return;
    }

    loop {
        tokio::select! {
            result = event_rx.recv() => {
                match result {
                    Ok(event) => {
                        if !send_event(&mut socket, &event).await {
                            break;
                        }
                    }
                    Err(broadcast::error::RecvError::Lagged(n)) => {
                        warn!("WebSocket client lagged, skipped {} events", n);
                    }
                    Err(broadcast::error::RecvError::Closed) => {
                        break;
                    }
                }
            }
            msg = socket.recv() => {
                match msg {
                    Some(Ok(Message::Close(_))) | None => break,
                    Some(Ok(Message::Ping(data))) => {
                        if socket.send(Message::Pong(data)).await.is_err() {
                            break;
                        }
                    }
                    Some(Ok(_)) => {}
                    Some(Err(_)) => break,
                }
            }
        }
    }

    debug!("WebSocket client disconnected");
}
