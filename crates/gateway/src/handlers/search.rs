//! Search handlers

use axum::{extract::State, Json};
use serde::Deserialize;
use validator::Validate;

use crate::AppState;
use dealbridge_common::{
    auth::MaybeIdentity,
    errors::{AppError, Result},
};
use dealbridge_search::{ScoredResult, SearchFilters, SearchResults};

fn default_fulltext_limit() -> usize {
    20
}

/// Relevance search request
#[derive(Debug, Deserialize, Validate)]
pub struct FullTextRequest {
    #[validate(length(min = 1, max = 200))]
    pub keywords: String,

    #[serde(default = "default_fulltext_limit")]
    #[validate(range(min = 1, max = 100))]
    pub limit: usize,
}

/// Filtered, sorted, paginated search over published proposals
pub async fn search(
    State(state): State<AppState>,
    MaybeIdentity(caller): MaybeIdentity,
    Json(filters): Json<SearchFilters>,
) -> Result<Json<SearchResults>> {
    Ok(Json(state.search.search(filters, caller.as_ref()).await?))
}

/// Relevance-scored keyword search
pub async fn full_text_search(
    State(state): State<AppState>,
    MaybeIdentity(caller): MaybeIdentity,
    Json(request): Json<FullTextRequest>,
) -> Result<Json<Vec<ScoredResult>>> {
    request.validate().map_err(|e| AppError::Validation {
        message: e.to_string(),
        field: None,
    })?;

    Ok(Json(
        state
            .search
            .full_text_search(&request.keywords, request.limit, caller.as_ref())
            .await?,
    ))
}
