use axum::{
    extract::{Query, State},
    Extension, Json,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::sync::Arc;

use crate::{
    db::preferences::load_or_default,
    error::{AppError, AppResult},
    middleware::RequestId,
    models::{InsightSeries, SortColumn, SortDirection, SortState, TestingResultRow},
    routes::AppState,
    services::testing_results,
};

#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
    /// Active sort column
    pub sort: Option<String>,
    /// `ASC` or `DESC`
    pub direction: Option<String>,
    /// Header click applied on top of `sort`/`direction`
    pub select: Option<String>,
    /// Comma-separated testing objects; the stored selection when absent
    pub objects: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct TestingResultsResponse {
    pub results: Vec<TestingResultRow>,
    pub sort: SortState,
}

#[derive(Debug, Deserialize)]
pub struct InsightQuery {
    pub testing_object: Option<String>,
}

impl ListQuery {
    /// Resolves the requested ordering
    pub fn sort_state(&self) -> AppResult<SortState> {
        let column = match self.sort.as_deref() {
            Some(s) if !s.is_empty() => s.parse()?,
            _ => SortColumn::default(),
        };
        let direction = match self.direction.as_deref() {
            Some(s) if !s.is_empty() => s.parse()?,
            _ => SortDirection::default(),
        };

        let state = SortState::new(column, direction);
        match self.select.as_deref() {
            Some(s) if !s.is_empty() => Ok(state.select(s.parse()?)),
            _ => Ok(state),
        }
    }

    /// Explicitly requested testing objects, if any
    pub fn objects(&self) -> Option<BTreeSet<String>> {
        self.objects.as_deref().map(|raw| {
            raw.split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect()
        })
    }
}

/// Filtered, ordered testing results
pub async fn list(
    State(state): State<Arc<AppState>>,
    Extension(request_id): Extension<RequestId>,
    Query(query): Query<ListQuery>,
) -> AppResult<Json<TestingResultsResponse>> {
    let sort = query.sort_state()?;

    let selected = match query.objects() {
        Some(objects) => objects,
        None => {
            load_or_default(state.preferences.as_ref())
                .await
                .selected_testing_objects
        }
    };

    let results = state.testing_results.fetch_testing_results().await?;
    let total = results.len();

    let rows: Vec<TestingResultRow> =
        testing_results::filter_and_sort(results, &selected, sort.column, sort.direction)
            .into_iter()
            .map(TestingResultRow::from)
            .collect();

    tracing::info!(
        request_id = %request_id,
        total,
        shown = rows.len(),
        selected = selected.len(),
        column = ?sort.column,
        direction = %sort.direction,
        "Listed testing results"
    );

    Ok(Json(TestingResultsResponse { results: rows, sort }))
}

/// Distinct testing object names
pub async fn objects(State(state): State<Arc<AppState>>) -> AppResult<Json<Vec<String>>> {
    let results = state.testing_results.fetch_testing_results().await?;
    Ok(Json(testing_results::available_objects(&results)))
}

/// Chart series for one testing object
pub async fn insights(
    State(state): State<Arc<AppState>>,
    Query(query): Query<InsightQuery>,
) -> AppResult<Json<InsightSeries>> {
    let testing_object = query
        .testing_object
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| AppError::InvalidInput("testing_object is required".to_string()))?;

    let results = state.testing_results.fetch_testing_results().await?;
    Ok(Json(testing_results::insight_series(&results, testing_object)))
}
