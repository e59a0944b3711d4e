use axum::{routing::{get, post}, Router};
use tower_http::cors::CorsLayer;
use tracing::info;

use crate::api::{routes, websocket};
use crate::state::ServiceContext;

pub fn build_router(ctx: ServiceContext) -> Router {
    Router::new()
        // Session
        .route("/api/v1/session", get(routes::session::get_session))
        .route("/api/v1/session/start", post(routes::session::start_call))
        .route("/api/v1/session/end", post(routes::session::end_call))
        .route("/api/v1/session/audio/toggle", post(routes::session::toggle_audio))
        .route("/api/v1/session/video/toggle", post(routes::session::toggle_video))
        .route("/api/v1/session/permission/retry", post(routes::session::retry_permission))
        .route("/api/v1/session/gesture", post(routes::session::report_gesture))
        // Gestures
        .route("/api/v1/gestures", get(routes::gestures::list_gestures))
        .route("/api/v1/gestures/translate", get(routes::gestures::translate))
        // WebSocket
        .route("/ws", get(websocket::ws_handler))
        // Middleware
        .layer(CorsLayer::permissive())
        .with_state(ctx)
}

pub async fn start_api_server(ctx: ServiceContext, host: &str, port: u16) -> std::io::Result<()> {
    let router = build_router(ctx);
    let addr = format!("{}:{}", host, port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("API server listening on http://{}", addr);
    axum::serve(listener, router).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::create_event_bus;
    use crate::models::SessionSnapshot;
    use crate::session::{SessionCommand, SessionHandle};
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use tokio::sync::{mpsc, watch};
    use tower::ServiceExt;

    fn test_context() -> (ServiceContext, mpsc::Receiver<SessionCommand>) {
        let (command_tx, command_rx) = mpsc::channel(8);
        let (event_tx, _) = create_event_bus();
        let (_snapshot_tx, snapshot_rx) = watch::channel(SessionSnapshot::default());
        let ctx = ServiceContext {
            session: SessionHandle::new(command_tx),
            event_tx,
            snapshot_rx,
        };
        (ctx, command_rx)
    }

    async fn body_json(response: axum::response::Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_translate_route() {
        let (ctx, _rx) = test_context();
        let response = build_router(ctx)
            .oneshot(
                Request::get("/api/v1/gestures/translate?label=Open%20Palm")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        assert_eq!(json["meaning"], "Stop / Wait");
    }

    #[tokio::test]
    async fn test_translate_route_unknown_label() {
        let (ctx, _rx) = test_context();
        let response = build_router(ctx)
            .oneshot(
                Request::get("/api/v1/gestures/translate?label=Fist")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        let json = body_json(response).await;
        assert_eq!(json["meaning"], "Unknown");
        assert_eq!(json["description"], "This gesture is not in our database");
    }

    #[tokio::test]
    async fn test_list_gestures_route() {
        let (ctx, _rx) = test_context();
        let response = build_router(ctx)
            .oneshot(Request::get("/api/v1/gestures").body(Body::empty()).unwrap())
            .await
            .unwrap();

        let json = body_json(response).await;
        assert_eq!(json.as_array().unwrap().len(), 6);
        assert_eq!(json[0]["label"], "Wave");
    }

    #[tokio::test]
    async fn test_session_snapshot_route() {
        let (ctx, _rx) = test_context();
        let response = build_router(ctx)
            .oneshot(Request::get("/api/v1/session").body(Body::empty()).unwrap())
            .await
            .unwrap();

        let json = body_json(response).await;
        assert_eq!(json["permission_state"], "unknown");
        assert_eq!(json["call_active"], false);
        assert_eq!(json["probe_pending"], false);
        assert!(json["current_gesture"].is_null());
    }

    #[tokio::test]
    async fn test_start_route_forwards_command() {
        let (ctx, mut rx) = test_context();
        let response = build_router(ctx)
            .oneshot(
                Request::post("/api/v1/session/start")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert!(matches!(rx.recv().await, Some(SessionCommand::StartCall)));
    }

    #[tokio::test]
    async fn test_report_gesture_route() {
        let (ctx, mut rx) = test_context();
        let router = build_router(ctx);

        let ok = router
            .clone()
            .oneshot(
                Request::post("/api/v1/session/gesture")
                    .header("content-type", "application/json")
                    .body(Body::from(r#"{"label":"Thumbs Up"}"#))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(ok.status(), StatusCode::OK);
        assert!(matches!(
            rx.recv().await,
            Some(SessionCommand::ReportGesture(crate::gesture::GestureLabel::ThumbsUp))
        ));

        let bad = router
            .oneshot(
                Request::post("/api/v1/session/gesture")
                    .header("content-type", "application/json")
                    .body(Body::from(r#"{"label":"Fist"}"#))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(bad.status(), StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[tokio::test]
    async fn test_command_route_fails_when_engine_gone() {
        let (ctx, rx) = test_context();
        drop(rx);
        let response = build_router(ctx)
            .oneshot(
                Request::post("/api/v1/session/end")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
