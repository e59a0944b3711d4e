use axum::{extract::Query, Json};
use serde::Deserialize;

use crate::gesture::{self, GestureTranslation, TranslationEntry};

pub async fn list_gestures() -> Json<Vec<TranslationEntry>> {
    Json(gesture::translation_table())
}

#[derive(Deserialize)]
pub struct TranslateQuery {
    #[serde(default)]
    pub label: String,
}

pub async fn translate(Query(query): Query<TranslateQuery>) -> Json<GestureTranslation> {
    Json(gesture::translate(&query.label))
}
