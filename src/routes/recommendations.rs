use axum::{extract::State, Extension, Json};
use std::sync::Arc;

use crate::{
    db::preferences::load_or_default,
    middleware::RequestId,
    models::Recommendation,
    routes::AppState,
    services::recommendations,
};

/// Channel recommendations for the stored favorite channels
///
/// Always succeeds; an unavailable catalog yields an empty list.
pub async fn channels(
    State(state): State<Arc<AppState>>,
    Extension(request_id): Extension<RequestId>,
) -> Json<Vec<Recommendation>> {
    let preferences = load_or_default(state.preferences.as_ref()).await;

    tracing::info!(
        request_id = %request_id,
        favorites = preferences.favorite_channels.len(),
        "Processing recommendation request"
    );

    let recommendations = recommendations::channel_recommendations(
        state.catalog.as_ref(),
        &preferences.favorite_channels,
    )
    .await;

    Json(recommendations)
}
