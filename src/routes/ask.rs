use axum::{extract::State, Extension, Json};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::{
    db::preferences::load_or_default,
    error::{AppError, AppResult},
    middleware::RequestId,
    routes::AppState,
    services::prompt,
};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AskRequest {
    pub prompt: String,
    #[serde(default)]
    pub max_iterations: Option<u32>,
}

#[derive(Debug, Serialize)]
pub struct AskResponse {
    pub response: String,
}

/// Enriches the prompt with the stored preferences and forwards it to the
/// answering service
pub async fn ask(
    State(state): State<Arc<AppState>>,
    Extension(request_id): Extension<RequestId>,
    Json(request): Json<AskRequest>,
) -> AppResult<Json<AskResponse>> {
    if request.prompt.trim().is_empty() {
        return Err(AppError::InvalidInput("Prompt is required".to_string()));
    }

    let preferences = load_or_default(state.preferences.as_ref()).await;
    let enriched = prompt::enrich(&request.prompt, &preferences);

    tracing::info!(
        request_id = %request_id,
        service = state.answer_service.name(),
        prompt_len = request.prompt.len(),
        enriched_len = enriched.len(),
        max_iterations = ?request.max_iterations,
        "Forwarding prompt"
    );

    let response = state
        .answer_service
        .answer(&enriched, request.max_iterations)
        .await
        .inspect_err(|e| tracing::warn!(request_id = %request_id, error = %e, "Answer failed"))?;

    Ok(Json(AskResponse { response }))
}
