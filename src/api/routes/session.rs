use axum::{
    extract::State,
    http::StatusCode,
    Json,
};
use serde::Deserialize;

use crate::gesture::GestureLabel;
use crate::models::SessionSnapshot;
use crate::state::ServiceContext;

fn accepted(result: Result<(), String>) -> Result<Json<serde_json::Value>, (StatusCode, String)> {
    result
        .map(|_| Json(serde_json::json!({"ok": true})))
        .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, e))
}

pub async fn get_session(
    State(ctx): State<ServiceContext>,
) -> Json<SessionSnapshot> {
    let snapshot = ctx.snapshot_rx.borrow().clone();
    Json(snapshot)
}

pub async fn start_call(
    State(ctx): State<ServiceContext>,
) -> Result<Json<serde_json::Value>, (StatusCode, String)> {
    accepted(ctx.session.start_call().await)
}

pub async fn end_call(
    State(ctx): State<ServiceContext>,
) -> Result<Json<serde_json::Value>, (StatusCode, String)> {
    accepted(ctx.session.end_call().await)
}

pub async fn toggle_audio(
    State(ctx): State<ServiceContext>,
) -> Result<Json<serde_json::Value>, (StatusCode, String)> {
    accepted(ctx.session.toggle_audio().await)
}

pub async fn toggle_video(
    State(ctx): State<ServiceContext>,
) -> Result<Json<serde_json::Value>, (StatusCode, String)> {
    accepted(ctx.session.toggle_video().await)
}

pub async fn retry_permission(
    State(ctx): State<ServiceContext>,
) -> Result<Json<serde_json::Value>, (StatusCode, String)> {
    accepted(ctx.session.retry_permission().await)
}

#[derive(Deserialize)]
pub struct ReportGestureRequest {
    pub label: String,
}

/// Entry point for an external detector.
pub async fn report_gesture(
    State(ctx): State<ServiceContext>,
    Json(body): Json<ReportGestureRequest>,
) -> Result<Json<serde_json::Value>, (StatusCode, String)> {
    let label: GestureLabel = body
        .label
        .parse()
        .map_err(|e: crate::gesture::UnknownGesture| (StatusCode::UNPROCESSABLE_ENTITY, e.to_string()))?;
    accepted(ctx.session.report_gesture(label).await)
}
