//! Admin review handlers

use axum::{
    extract::{Query, State},
    Json,
};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use uuid::Uuid;

use crate::AppState;
use dealbridge_common::{
    auth::Identity,
    errors::Result,
    store::{DateRange, ReviewHistoryEntry},
};
use dealbridge_lifecycle::{BatchOutcome, PendingReviewPage, Statistics};

#[derive(Debug, Deserialize)]
pub struct BatchApproveRequest {
    pub ids: Vec<Uuid>,
    #[serde(default)]
    pub comment: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct BatchRejectRequest {
    pub ids: Vec<Uuid>,
    pub reason: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct RangeQuery {
    #[serde(default)]
    pub from: Option<DateTime<Utc>>,
    #[serde(default)]
    pub to: Option<DateTime<Utc>>,
}

impl RangeQuery {
    fn into_range(self) -> DateRange {
        DateRange {
            from: self.from,
            to: self.to,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct PendingQuery {
    #[serde(default = "default_page")]
    pub page: u64,
    #[serde(default = "default_page_size")]
    pub page_size: u64,
}

#[derive(Debug, Default, Deserialize)]
pub struct HistoryQuery {
    #[serde(default)]
    pub from: Option<DateTime<Utc>>,
    #[serde(default)]
    pub to: Option<DateTime<Utc>>,
    #[serde(default)]
    pub operator_id: Option<Uuid>,
}

fn default_page() -> u64 {
    1
}

fn default_page_size() -> u64 {
    20
}

/// Approve up to the batch limit of submissions in one call
pub async fn batch_approve(
    State(state): State<AppState>,
    caller: Identity,
    Json(request): Json<BatchApproveRequest>,
) -> Result<Json<BatchOutcome>> {
    Ok(Json(
        state
            .admin
            .batch_approve(&request.ids, &caller, request.comment)
            .await?,
    ))
}

/// Reject a batch of submissions with a shared reason
pub async fn batch_reject(
    State(state): State<AppState>,
    caller: Identity,
    Json(request): Json<BatchRejectRequest>,
) -> Result<Json<BatchOutcome>> {
    Ok(Json(
        state
            .admin
            .batch_reject(&request.ids, &caller, request.reason)
            .await?,
    ))
}

/// Platform statistics over an optional date range
pub async fn statistics(
    State(state): State<AppState>,
    caller: Identity,
    Query(range): Query<RangeQuery>,
) -> Result<Json<Statistics>> {
    Ok(Json(
        state.admin.statistics(&caller, range.into_range()).await?,
    ))
}

/// Review queue, oldest submissions first
pub async fn pending_reviews(
    State(state): State<AppState>,
    caller: Identity,
    Query(query): Query<PendingQuery>,
) -> Result<Json<PendingReviewPage>> {
    Ok(Json(
        state
            .admin
            .pending_reviews(&caller, query.page, query.page_size)
            .await?,
    ))
}

/// Past review decisions, newest first
pub async fn review_history(
    State(state): State<AppState>,
    caller: Identity,
    Query(query): Query<HistoryQuery>,
) -> Result<Json<Vec<ReviewHistoryEntry>>> {
    let range = DateRange {
        from: query.from,
        to: query.to,
    };
    Ok(Json(
        state
            .admin
            .review_history(&caller, range, query.operator_id)
            .await?,
    ))
}
