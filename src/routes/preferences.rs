use axum::{extract::State, Extension, Json};
use chrono::NaiveDate;
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;

use crate::{
    db::preferences::load_or_default,
    error::{AppError, AppResult},
    middleware::RequestId,
    models::{PreferenceList, Preferences},
    routes::AppState,
};

#[derive(Debug, Deserialize)]
pub struct ToggleRequest {
    pub list: PreferenceList,
    pub item: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PubmedDatesRequest {
    #[serde(default)]
    pub start_date: Option<NaiveDate>,
    #[serde(default)]
    pub end_date: Option<NaiveDate>,
}

/// Current preferences; defaults when the store cannot be read
pub async fn get_preferences(State(state): State<Arc<AppState>>) -> Json<Preferences> {
    Json(load_or_default(state.preferences.as_ref()).await)
}

/// Replaces the whole preferences document
pub async fn replace_preferences(
    State(state): State<Arc<AppState>>,
    Extension(request_id): Extension<RequestId>,
    Json(preferences): Json<Preferences>,
) -> AppResult<Json<Value>> {
    state.preferences.save(&preferences).await?;

    tracing::info!(request_id = %request_id, "Preferences replaced");

    Ok(Json(json!({ "success": true })))
}

/// Toggles one item in one of the preference sets and persists the result
pub async fn toggle(
    State(state): State<Arc<AppState>>,
    Extension(request_id): Extension<RequestId>,
    Json(request): Json<ToggleRequest>,
) -> AppResult<Json<Preferences>> {
    let item = request.item.trim();
    if item.is_empty() {
        return Err(AppError::InvalidInput("Item must not be empty".to_string()));
    }

    // Never save over a document that could not be read
    let current = state.preferences.load().await?;
    let next = current.toggled(request.list, item);
    state.preferences.save(&next).await?;

    tracing::info!(
        request_id = %request_id,
        list = ?request.list,
        item = %item,
        "Preference toggled"
    );

    Ok(Json(next))
}

/// Sets both PubMed date bounds; an unset bound clears it
pub async fn set_pubmed_dates(
    State(state): State<Arc<AppState>>,
    Extension(request_id): Extension<RequestId>,
    Json(request): Json<PubmedDatesRequest>,
) -> AppResult<Json<Preferences>> {
    let current = state.preferences.load().await?;
    let next = current.with_pubmed_dates(request.start_date, request.end_date)?;
    state.preferences.save(&next).await?;

    tracing::info!(
        request_id = %request_id,
        start_date = ?request.start_date,
        end_date = ?request.end_date,
        "PubMed dates updated"
    );

    Ok(Json(next))
}
