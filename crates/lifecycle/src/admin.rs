//! Admin operations
//!
//! Batch review decisions, platform statistics and the review queue. Batch
//! operations are best-effort: items fail independently and the batch never
//! aborts. There is no cross-item atomicity.

use crate::workflow::WorkflowEngine;
use dealbridge_common::auth::Identity;
use dealbridge_common::domain::{Proposal, ProposalStatus};
use dealbridge_common::errors::{AppError, Result};
use dealbridge_common::store::{
    DateRange, IndustryCount, ProposalFilter, ProposalStore, QuerySpec, ReviewEfficiency,
    ReviewHistoryEntry, SortKey, SortOrder, SortSpec, StatusCount,
};
use chrono::Utc;
use serde::Serialize;
use std::sync::Arc;
use uuid::Uuid;

/// Hard cap on items per batch call
pub const BATCH_LIMIT: usize = 50;

/// Top-N cutoff for the industry distribution
const INDUSTRY_TOP_N: usize = 10;

/// Per-item failure inside a batch
#[derive(Debug, Clone, Serialize)]
pub struct BatchFailure {
    pub id: Uuid,
    pub error: String,
}

/// Outcome of a batch review operation
#[derive(Debug, Clone, Default, Serialize)]
pub struct BatchOutcome {
    pub success_ids: Vec<Uuid>,
    pub failed_items: Vec<BatchFailure>,
}

/// Read-only platform statistics
#[derive(Debug, Clone, Serialize)]
pub struct Statistics {
    pub counts_by_status: Vec<StatusCount>,
    pub industry_distribution: Vec<IndustryCount>,
    pub review_efficiency: ReviewEfficiency,
}

/// A queued submission with its waiting time
#[derive(Debug, Clone, Serialize)]
pub struct PendingReview {
    pub proposal: Proposal,
    pub waiting_days: i64,
}

/// Paged review queue
#[derive(Debug, Clone, Serialize)]
pub struct PendingReviewPage {
    pub items: Vec<PendingReview>,
    pub total_count: u64,
}

/// Admin-facing operations over the store and workflow
pub struct AdminOperations<S> {
    store: Arc<S>,
    workflow: Arc<WorkflowEngine<S>>,
}

impl<S: ProposalStore> AdminOperations<S> {
    pub fn new(store: Arc<S>, workflow: Arc<WorkflowEngine<S>>) -> Self {
        Self { store, workflow }
    }

    fn check_batch(admin: &Identity, ids: &[Uuid]) -> Result<()> {
        admin.require_admin()?;
        if ids.len() > BATCH_LIMIT {
            return Err(AppError::Validation {
                message: format!("Batch size exceeds the limit of {}", BATCH_LIMIT),
                field: Some("ids".to_string()),
            });
        }
        Ok(())
    }

    /// Approve each id independently; one failure never aborts the batch
    pub async fn batch_approve(
        &self,
        ids: &[Uuid],
        admin: &Identity,
        comment: Option<String>,
    ) -> Result<BatchOutcome> {
        Self::check_batch(admin, ids)?;

        let mut outcome = BatchOutcome::default();
        for &id in ids {
            match self.workflow.approve(id, admin, comment.clone(), false).await {
                Ok(_) => outcome.success_ids.push(id),
                Err(e) => outcome.failed_items.push(BatchFailure {
                    id,
                    error: e.to_string(),
                }),
            }
        }
        Ok(outcome)
    }

    /// Reject each id independently; the reason is validated once up front
    pub async fn batch_reject(
        &self,
        ids: &[Uuid],
        admin: &Identity,
        reason: String,
    ) -> Result<BatchOutcome> {
        Self::check_batch(admin, ids)?;
        crate::validation::validate_reject_reason(&reason)?;

        let mut outcome = BatchOutcome::default();
        for &id in ids {
            match self.workflow.reject(id, admin, reason.clone()).await {
                Ok(_) => outcome.success_ids.push(id),
                Err(e) => outcome.failed_items.push(BatchFailure {
                    id,
                    error: e.to_string(),
                }),
            }
        }
        Ok(outcome)
    }

    /// Read-only aggregation; no mutation
    pub async fn statistics(&self, admin: &Identity, range: DateRange) -> Result<Statistics> {
        admin.require_admin()?;

        let counts_by_status = self.store.status_counts(&range).await?;
        let industry_distribution = self
            .store
            .industry_distribution(&range, INDUSTRY_TOP_N)
            .await?;
        let review_efficiency = self.store.review_efficiency(&range).await?;

        Ok(Statistics {
            counts_by_status,
            industry_distribution,
            review_efficiency,
        })
    }

    /// FIFO review queue: UnderReview proposals oldest-first, annotated
    /// with days spent waiting (from submission when stamped)
    pub async fn pending_reviews(
        &self,
        admin: &Identity,
        page: u64,
        page_size: u64,
    ) -> Result<PendingReviewPage> {
        admin.require_admin()?;

        let page = page.max(1);
        let page_size = page_size.clamp(1, 100);
        let spec = QuerySpec {
            filter: ProposalFilter {
                statuses: vec![ProposalStatus::UnderReview],
                ..Default::default()
            },
            sort: SortSpec {
                key: SortKey::CreatedAt,
                order: SortOrder::Asc,
            },
            skip: (page - 1) * page_size,
            limit: page_size,
        };

        let (items, total_count) = self.store.query(&spec).await?;
        let now = Utc::now();
        let items = items
            .into_iter()
            .map(|proposal| {
                let since = proposal.submitted_at.unwrap_or(proposal.created_at);
                PendingReview {
                    waiting_days: (now - since).num_days(),
                    proposal,
                }
            })
            .collect();

        Ok(PendingReviewPage { items, total_count })
    }

    /// Flattened decision audit, newest first, optionally per operator
    pub async fn review_history(
        &self,
        admin: &Identity,
        range: DateRange,
        operator_id: Option<Uuid>,
    ) -> Result<Vec<ReviewHistoryEntry>> {
        admin.require_admin()?;
        self.store.review_history(&range, operator_id).await
    }
}
