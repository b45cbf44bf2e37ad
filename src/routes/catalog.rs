use axum::{extract::State, Json};
use std::collections::BTreeSet;
use std::sync::Arc;

use crate::{
    db::preferences::load_or_default,
    error::AppResult,
    models::Favorites,
    routes::AppState,
};

/// Lists every catalog channel
pub async fn channels(State(state): State<Arc<AppState>>) -> AppResult<Json<Vec<String>>> {
    let channels = state.catalog.list_channels().await?;
    tracing::debug!(count = channels.len(), "Listed channels");
    Ok(Json(channels))
}

/// Lists every catalog solution
pub async fn solutions(State(state): State<Arc<AppState>>) -> AppResult<Json<Vec<String>>> {
    let solutions = state.catalog.list_solutions().await?;
    tracing::debug!(count = solutions.len(), "Listed solutions");
    Ok(Json(solutions))
}

/// Lists the distinct PubMed publication types
pub async fn publication_types(
    State(state): State<Arc<AppState>>,
) -> AppResult<Json<Vec<String>>> {
    let types = state.catalog.list_publication_types().await?;
    tracing::debug!(count = types.len(), "Listed publication types");
    Ok(Json(types))
}

/// Favorite channels and solutions that still exist in the catalog
pub async fn favorites(State(state): State<Arc<AppState>>) -> AppResult<Json<Favorites>> {
    let preferences = load_or_default(state.preferences.as_ref()).await;

    let (channels, solutions) =
        tokio::try_join!(state.catalog.list_channels(), state.catalog.list_solutions())?;

    Ok(Json(Favorites {
        channels: retain_favorites(channels, &preferences.favorite_channels),
        solutions: retain_favorites(solutions, &preferences.favorite_solutions),
    }))
}

/// Keeps catalog entries that are favorites, in catalog order
fn retain_favorites(catalog: Vec<String>, favorites: &BTreeSet<String>) -> Vec<String> {
    if favorites.is_empty() {
        return Vec::new();
    }
    catalog
        .into_iter()
        .filter(|name| favorites.contains(name))
        .collect()
}
