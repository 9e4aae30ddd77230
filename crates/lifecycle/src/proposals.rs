//! Proposal CRUD orchestration
//!
//! Creation, visibility-aware reads, version-guarded content updates and
//! deletion. Deletion is physical only for a creator's own Draft; anything
//! else becomes an archive transition so the audit trail survives.

use crate::permissions::PermissionResolver;
use crate::validation::validate_patch;
use crate::workflow::WorkflowEngine;
use dealbridge_common::auth::{Identity, Role};
use dealbridge_common::domain::{Proposal, ProposalStatus};
use dealbridge_common::errors::{AppError, Result};
use dealbridge_common::store::{
    ContentPatch, Counter, ProposalFilter, ProposalStore, QuerySpec, SortSpec,
};
use serde::Serialize;
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

/// How a delete request was honored
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DeleteOutcome {
    /// Draft hard-removed from storage
    Deleted,
    /// Non-draft turned into an archive transition
    Archived,
}

/// One page of a creator's own proposals
#[derive(Debug, Clone, Serialize)]
pub struct ProposalPage {
    pub proposals: Vec<Proposal>,
    pub total_count: u64,
    pub page: u64,
    pub page_size: u64,
}

/// CRUD front door for proposals
pub struct ProposalService<S> {
    store: Arc<S>,
    resolver: PermissionResolver,
    workflow: Arc<WorkflowEngine<S>>,
}

impl<S: ProposalStore> ProposalService<S> {
    pub fn new(
        store: Arc<S>,
        resolver: PermissionResolver,
        workflow: Arc<WorkflowEngine<S>>,
    ) -> Self {
        Self {
            store,
            resolver,
            workflow,
        }
    }

    async fn fetch(&self, id: Uuid) -> Result<Proposal> {
        self.store
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::ProposalNotFound { id: id.to_string() })
    }

    /// Create a fresh Draft. Sellers and admins only; buyer accounts cannot
    /// list companies.
    pub async fn create(&self, caller: &Identity, mut initial: ContentPatch) -> Result<Proposal> {
        caller.require_active()?;
        if caller.role == Role::Buyer {
            return Err(AppError::Forbidden {
                message: "Buyer accounts cannot create proposals".to_string(),
            });
        }

        validate_patch(&mut initial)?;

        let mut proposal = Proposal::new(caller.id);
        proposal.company_info = initial.company_info;
        proposal.financial_info = initial.financial_info;
        proposal.business_model = initial.business_model;
        proposal.teaser_content = initial.teaser_content;
        proposal.full_content = initial.full_content;
        if let Some(files) = initial.attached_files {
            proposal.attached_files = files;
        }

        let id = self.store.insert(&proposal).await?;
        info!(proposal_id = %id, creator_id = %caller.id, "Proposal created");
        Ok(proposal)
    }

    /// Fetch a proposal at the caller's permitted visibility.
    ///
    /// Unpublished proposals are indistinguishable from missing ones for
    /// non-owner, non-admin callers. A buyer read of a published proposal
    /// bumps the view counter.
    pub async fn get(&self, id: Uuid, caller: Option<&Identity>) -> Result<Proposal> {
        let proposal = self.fetch(id).await?;
        let caps = self.resolver.resolve(&proposal, caller);

        if !caps.can_view_teaser && !caps.can_view_full {
            // existence of unpublished proposals is itself sensitive
            return Err(AppError::ProposalNotFound { id: id.to_string() });
        }

        let is_owner = caller.is_some_and(|c| c.id == proposal.creator_id || c.role.is_admin());
        if !is_owner && proposal.status.is_buyer_visible() {
            self.store.increment_counter(id, Counter::Views, 1).await?;
        }

        Ok(proposal)
    }

    /// List a creator's proposals across every status, newest first.
    ///
    /// Callers list their own; only an admin may pass someone else's
    /// `creator_id`.
    pub async fn list_by_creator(
        &self,
        caller: &Identity,
        creator_id: Option<Uuid>,
        page: u64,
        page_size: u64,
    ) -> Result<ProposalPage> {
        caller.require_active()?;

        let creator_id = creator_id.unwrap_or(caller.id);
        if creator_id != caller.id && !caller.role.is_admin() {
            return Err(AppError::Forbidden {
                message: "Only an admin may list another creator's proposals".to_string(),
            });
        }

        let page = page.max(1);
        let page_size = page_size.clamp(1, 100);
        let spec = QuerySpec {
            filter: ProposalFilter {
                creator_id: Some(creator_id),
                ..Default::default()
            },
            sort: SortSpec::default(),
            skip: (page - 1) * page_size,
            limit: page_size,
        };

        let (proposals, total_count) = self.store.query(&spec).await?;
        Ok(ProposalPage {
            proposals,
            total_count,
            page,
            page_size,
        })
    }

    /// Apply a content patch under the optimistic-concurrency guard.
    ///
    /// Editable only by the creator (while Draft or Rejected) or an admin.
    pub async fn update(
        &self,
        id: Uuid,
        caller: &Identity,
        expected_version: i64,
        mut patch: ContentPatch,
    ) -> Result<Proposal> {
        caller.require_active()?;
        let proposal = self.fetch(id).await?;
        let caps = self.resolver.resolve(&proposal, Some(caller));

        if !caps.can_edit {
            if caller.id == proposal.creator_id {
                return Err(AppError::NotEditable {
                    status: proposal.status.to_string(),
                });
            }
            return Err(AppError::ProposalNotFound { id: id.to_string() });
        }

        if patch.is_empty() {
            return Err(AppError::Validation {
                message: "Update contains no fields".to_string(),
                field: None,
            });
        }
        validate_patch(&mut patch)?;

        self.store.update_content(id, expected_version, patch).await
    }

    /// Delete a proposal: hard for a creator's Draft, archive otherwise
    pub async fn delete(
        &self,
        id: Uuid,
        caller: &Identity,
        reason: Option<String>,
    ) -> Result<DeleteOutcome> {
        caller.require_active()?;
        let proposal = self.fetch(id).await?;

        if !caller.role.is_admin() && caller.id != proposal.creator_id {
            return Err(AppError::ProposalNotFound { id: id.to_string() });
        }

        if proposal.status == ProposalStatus::Draft {
            self.store.delete(id).await?;
            info!(proposal_id = %id, "Draft proposal hard-deleted");
            return Ok(DeleteOutcome::Deleted);
        }

        self.workflow.archive(id, caller, reason).await?;
        Ok(DeleteOutcome::Archived)
    }

    /// Record buyer interest in a published proposal
    pub async fn record_interest(&self, id: Uuid, caller: &Identity) -> Result<()> {
        caller.require_active()?;
        let proposal = self.fetch(id).await?;

        if !proposal.status.is_buyer_visible() {
            return Err(AppError::ProposalNotFound { id: id.to_string() });
        }

        self.store.increment_counter(id, Counter::Interest, 1).await
    }
}
