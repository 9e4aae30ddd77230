//! Proposal CRUD handlers

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::AppState;
use dealbridge_common::{
    auth::{Identity, MaybeIdentity},
    domain::Proposal,
    errors::Result,
    store::ContentPatch,
};
use dealbridge_lifecycle::{DeleteOutcome, ProposalPage};
use dealbridge_search::{project, ProposalView};

/// Request to update a proposal's content
#[derive(Debug, Deserialize)]
pub struct UpdateProposalRequest {
    /// Version the caller last read; stale values are rejected
    pub expected_version: i64,

    #[serde(flatten)]
    pub patch: ContentPatch,
}

#[derive(Debug, Default, Deserialize)]
pub struct DeleteProposalRequest {
    #[serde(default)]
    pub reason: Option<String>,
}

#[derive(Serialize)]
pub struct DeleteProposalResponse {
    pub outcome: &'static str,
}

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    /// Admin-only override; defaults to the caller
    #[serde(default)]
    pub creator_id: Option<Uuid>,
    #[serde(default = "default_page")]
    pub page: u64,
    #[serde(default = "default_page_size")]
    pub page_size: u64,
}

fn default_page() -> u64 {
    1
}

fn default_page_size() -> u64 {
    20
}

/// Create a new draft proposal
pub async fn create_proposal(
    State(state): State<AppState>,
    caller: Identity,
    Json(initial): Json<ContentPatch>,
) -> Result<(StatusCode, Json<Proposal>)> {
    let proposal = state.proposals.create(&caller, initial).await?;

    tracing::info!(
        proposal_id = %proposal.id,
        creator_id = %caller.id,
        "Proposal created"
    );

    Ok((StatusCode::CREATED, Json(proposal)))
}

/// List the caller's own proposals across every status
pub async fn list_my_proposals(
    State(state): State<AppState>,
    caller: Identity,
    Query(query): Query<ListQuery>,
) -> Result<Json<ProposalPage>> {
    Ok(Json(
        state
            .proposals
            .list_by_creator(&caller, query.creator_id, query.page, query.page_size)
            .await?,
    ))
}

/// Get a proposal at the caller's information level
pub async fn get_proposal(
    State(state): State<AppState>,
    MaybeIdentity(caller): MaybeIdentity,
    Path(id): Path<Uuid>,
) -> Result<Json<ProposalView>> {
    let proposal = state.proposals.get(id, caller.as_ref()).await?;
    let caps = state.resolver.resolve(&proposal, caller.as_ref());
    Ok(Json(project(proposal, &caps)))
}

/// Update proposal content with an optimistic concurrency guard
pub async fn update_proposal(
    State(state): State<AppState>,
    caller: Identity,
    Path(id): Path<Uuid>,
    Json(request): Json<UpdateProposalRequest>,
) -> Result<Json<Proposal>> {
    let proposal = state
        .proposals
        .update(id, &caller, request.expected_version, request.patch)
        .await?;
    Ok(Json(proposal))
}

/// Delete a proposal; drafts are removed, everything else is archived
pub async fn delete_proposal(
    State(state): State<AppState>,
    caller: Identity,
    Path(id): Path<Uuid>,
    body: Option<Json<DeleteProposalRequest>>,
) -> Result<Json<DeleteProposalResponse>> {
    let reason = body.and_then(|Json(b)| b.reason);
    let outcome = state.proposals.delete(id, &caller, reason).await?;

    let outcome = match outcome {
        DeleteOutcome::Deleted => "deleted",
        DeleteOutcome::Archived => "archived",
    };
    Ok(Json(DeleteProposalResponse { outcome }))
}

/// Record buyer interest in a published proposal
pub async fn record_interest(
    State(state): State<AppState>,
    caller: Identity,
    Path(id): Path<Uuid>,
) -> Result<StatusCode> {
    state.proposals.record_interest(id, &caller).await?;
    Ok(StatusCode::NO_CONTENT)
}
