//! Lifecycle transition handlers
//!
//! Thin wrappers over the workflow engine; every rule lives in the
//! engine, the handlers only shape requests and responses.

use axum::{
    extract::{Path, State},
    Json,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::AppState;
use dealbridge_common::{
    auth::{Identity, MaybeIdentity},
    domain::{Proposal, ProposalStatus, ReviewRecord},
    errors::{AppError, Result},
};
use dealbridge_lifecycle::TransitionCheck;

#[derive(Debug, Default, Deserialize)]
pub struct ReasonRequest {
    #[serde(default)]
    pub reason: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ApproveRequest {
    #[serde(default)]
    pub comment: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct RejectRequest {
    pub reason: String,
}

/// Submit a draft for review
pub async fn submit(
    State(state): State<AppState>,
    caller: Identity,
    Path(id): Path<Uuid>,
) -> Result<Json<Proposal>> {
    Ok(Json(state.workflow.submit(id, &caller).await?))
}

/// Reopen a rejected proposal for rework
pub async fn reopen(
    State(state): State<AppState>,
    caller: Identity,
    Path(id): Path<Uuid>,
) -> Result<Json<Proposal>> {
    Ok(Json(state.workflow.reopen(id, &caller).await?))
}

/// Withdraw a submission back to draft
pub async fn withdraw(
    State(state): State<AppState>,
    caller: Identity,
    Path(id): Path<Uuid>,
    body: Option<Json<ReasonRequest>>,
) -> Result<Json<Proposal>> {
    let reason = body.and_then(|Json(b)| b.reason);
    Ok(Json(state.workflow.withdraw(id, &caller, reason).await?))
}

/// Approve a submission (admin only)
pub async fn approve(
    State(state): State<AppState>,
    caller: Identity,
    Path(id): Path<Uuid>,
    body: Option<Json<ApproveRequest>>,
) -> Result<Json<Proposal>> {
    let comment = body.and_then(|Json(b)| b.comment);
    let auto_publish = state.config.review.auto_publish_on_approve;
    Ok(Json(
        state.workflow.approve(id, &caller, comment, auto_publish).await?,
    ))
}

/// Reject a submission with a mandatory reason (admin only)
pub async fn reject(
    State(state): State<AppState>,
    caller: Identity,
    Path(id): Path<Uuid>,
    Json(request): Json<RejectRequest>,
) -> Result<Json<Proposal>> {
    Ok(Json(state.workflow.reject(id, &caller, request.reason).await?))
}

/// Publish an approved proposal to the marketplace
pub async fn publish(
    State(state): State<AppState>,
    caller: Identity,
    Path(id): Path<Uuid>,
) -> Result<Json<Proposal>> {
    Ok(Json(state.workflow.publish(id, &caller).await?))
}

/// Archive a proposal from any non-terminal status
pub async fn archive(
    State(state): State<AppState>,
    caller: Identity,
    Path(id): Path<Uuid>,
    body: Option<Json<ReasonRequest>>,
) -> Result<Json<Proposal>> {
    let reason = body.and_then(|Json(b)| b.reason);
    Ok(Json(state.workflow.archive(id, &caller, reason).await?))
}

/// Record a teaser dispatch to a buyer
pub async fn record_dispatch(
    State(state): State<AppState>,
    caller: Identity,
    Path(id): Path<Uuid>,
) -> Result<Json<Proposal>> {
    Ok(Json(state.workflow.record_dispatch(id, &caller).await?))
}

/// Full audit trail for a proposal, newest first
pub async fn history(
    State(state): State<AppState>,
    caller: Identity,
    Path(id): Path<Uuid>,
) -> Result<Json<Vec<ReviewRecord>>> {
    // the trail includes review decisions, so it is not public
    let proposal = state.proposals.get(id, Some(&caller)).await?;
    let caps = state.resolver.resolve(&proposal, Some(&caller));
    if !caps.can_view_full {
        return Err(AppError::ProposalNotFound { id: id.to_string() });
    }
    Ok(Json(proposal.history()))
}

/// Dry-run a transition without applying it
pub async fn check_transition(
    State(state): State<AppState>,
    MaybeIdentity(caller): MaybeIdentity,
    Path((id, target)): Path<(Uuid, String)>,
) -> Result<Json<TransitionCheck>> {
    let target = ProposalStatus::parse(&target).ok_or_else(|| AppError::Validation {
        message: format!("Unknown status '{target}'"),
        field: Some("target".to_string()),
    })?;
    Ok(Json(
        state
            .workflow
            .can_transition_to(id, target, caller.as_ref())
            .await?,
    ))
}
