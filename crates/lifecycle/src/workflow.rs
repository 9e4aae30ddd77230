//! Workflow engine - the proposal state machine
//!
//! Every operation follows the same shape: fetch the proposal, resolve
//! capabilities, validate the transition, persist atomically, then fire the
//! notification without waiting on it. Concurrent attempts on the same
//! proposal are serialized by the store's version guard; the loser gets
//! `VersionConflict` and must re-fetch.
//!
//! There is no timer-driven transition: the configured review timeout is a
//! reporting threshold only.

use crate::permissions::PermissionResolver;
use crate::validation::{validate_reject_reason, validate_transition};
use dealbridge_common::auth::Identity;
use dealbridge_common::domain::{Proposal, ProposalStatus, ReviewRecord};
use dealbridge_common::errors::{AppError, Result};
use dealbridge_common::metrics::record_transition;
use dealbridge_common::notify::{spawn_notify, LifecycleEvent, Notifier};
use dealbridge_common::store::{Counter, LifecycleStamp, ProposalStore};
use serde::Serialize;
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

/// Result of a read-only transition dry run
#[derive(Debug, Clone, Serialize)]
pub struct TransitionCheck {
    pub allowed: bool,
    /// Why the transition is unavailable, when it is
    pub reason: Option<String>,
}

/// The proposal state machine.
///
/// Stateless per request; all state lives in the store.
pub struct WorkflowEngine<S> {
    store: Arc<S>,
    notifier: Arc<dyn Notifier>,
    resolver: PermissionResolver,
}

impl<S: ProposalStore> WorkflowEngine<S> {
    pub fn new(store: Arc<S>, notifier: Arc<dyn Notifier>, resolver: PermissionResolver) -> Self {
        Self {
            store,
            notifier,
            resolver,
        }
    }

    pub fn resolver(&self) -> &PermissionResolver {
        &self.resolver
    }

    async fn fetch(&self, id: Uuid) -> Result<Proposal> {
        self.store
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::ProposalNotFound { id: id.to_string() })
    }

    fn require_creator_or_admin(proposal: &Proposal, caller: &Identity) -> Result<()> {
        caller.require_active()?;
        if caller.role.is_admin() || caller.id == proposal.creator_id {
            Ok(())
        } else {
            Err(AppError::Forbidden {
                message: "Only the creator or an admin may perform this action".to_string(),
            })
        }
    }

    /// Validate against the adjacency table, then persist the transition
    /// and its audit record in one store write.
    async fn execute(
        &self,
        proposal: &Proposal,
        to: ProposalStatus,
        operator_id: Uuid,
        comment: Option<String>,
        stamp: Option<LifecycleStamp>,
    ) -> Result<Proposal> {
        validate_transition(proposal.status, to)?;

        let record = ReviewRecord::for_transition(
            proposal.status,
            to,
            operator_id,
            comment,
            serde_json::Value::Null,
        );
        let action = record.action.clone();

        match self
            .store
            .apply_transition(proposal.id, proposal.version, to, record, stamp)
            .await
        {
            Ok(updated) => {
                record_transition(&action, false);
                info!(
                    proposal_id = %updated.id,
                    action = %action,
                    version = updated.version,
                    "Transition executed"
                );
                Ok(updated)
            }
            Err(e @ AppError::VersionConflict { .. }) => {
                record_transition(&action, true);
                Err(e)
            }
            Err(e) => Err(e),
        }
    }

    /// Submit a Draft into review. Requires the creator (or an admin) and
    /// passes only when the completeness gate is satisfied.
    pub async fn submit(&self, id: Uuid, caller: &Identity) -> Result<Proposal> {
        let proposal = self.fetch(id).await?;
        Self::require_creator_or_admin(&proposal, caller)?;
        validate_transition(proposal.status, ProposalStatus::UnderReview)?;

        let report = crate::validation::check_completeness(&proposal);
        if !report.ready_for_submission {
            return Err(AppError::NotReady {
                missing: report.missing_fields,
            });
        }

        let updated = self
            .execute(
                &proposal,
                ProposalStatus::UnderReview,
                caller.id,
                None,
                Some(LifecycleStamp::Submitted),
            )
            .await?;

        spawn_notify(
            self.notifier.clone(),
            LifecycleEvent::SubmissionReceived {
                proposal_id: updated.id,
                creator_id: updated.creator_id,
            },
        );
        Ok(updated)
    }

    /// Pull a submission out of review, back into Draft.
    ///
    /// Only an UnderReview proposal can be withdrawn; a Rejected one goes
    /// back through `reopen` instead.
    pub async fn withdraw(
        &self,
        id: Uuid,
        caller: &Identity,
        reason: Option<String>,
    ) -> Result<Proposal> {
        let proposal = self.fetch(id).await?;
        Self::require_creator_or_admin(&proposal, caller)?;

        if proposal.status != ProposalStatus::UnderReview {
            return Err(AppError::InvalidTransition {
                from: proposal.status.to_string(),
                to: ProposalStatus::Draft.to_string(),
            });
        }

        self.execute(&proposal, ProposalStatus::Draft, caller.id, reason, None)
            .await
    }

    /// Take a Rejected proposal back to Draft for rework before
    /// resubmission
    pub async fn reopen(&self, id: Uuid, caller: &Identity) -> Result<Proposal> {
        let proposal = self.fetch(id).await?;
        Self::require_creator_or_admin(&proposal, caller)?;

        if proposal.status != ProposalStatus::Rejected {
            return Err(AppError::InvalidTransition {
                from: proposal.status.to_string(),
                to: ProposalStatus::Draft.to_string(),
            });
        }

        self.execute(&proposal, ProposalStatus::Draft, caller.id, None, None)
            .await
    }

    /// Admin decision: accept the submission. Optionally chains straight
    /// into publish.
    pub async fn approve(
        &self,
        id: Uuid,
        admin: &Identity,
        comment: Option<String>,
        auto_publish: bool,
    ) -> Result<Proposal> {
        admin.require_admin()?;
        let proposal = self.fetch(id).await?;

        let approved = self
            .execute(
                &proposal,
                ProposalStatus::Approved,
                admin.id,
                comment.clone(),
                Some(LifecycleStamp::Approved),
            )
            .await?;

        spawn_notify(
            self.notifier.clone(),
            LifecycleEvent::ReviewDecided {
                proposal_id: approved.id,
                creator_id: approved.creator_id,
                approved: true,
                comment,
            },
        );

        if !auto_publish {
            return Ok(approved);
        }

        let published = self
            .execute(
                &approved,
                ProposalStatus::Available,
                admin.id,
                None,
                Some(LifecycleStamp::Published),
            )
            .await?;

        spawn_notify(
            self.notifier.clone(),
            LifecycleEvent::ProposalPublished {
                proposal_id: published.id,
                creator_id: published.creator_id,
            },
        );
        Ok(published)
    }

    /// Admin decision: decline the submission with an actionable reason
    pub async fn reject(&self, id: Uuid, admin: &Identity, reason: String) -> Result<Proposal> {
        admin.require_admin()?;
        validate_reject_reason(&reason)?;
        let proposal = self.fetch(id).await?;

        let updated = self
            .execute(
                &proposal,
                ProposalStatus::Rejected,
                admin.id,
                Some(reason.clone()),
                None,
            )
            .await?;

        spawn_notify(
            self.notifier.clone(),
            LifecycleEvent::ReviewDecided {
                proposal_id: updated.id,
                creator_id: updated.creator_id,
                approved: false,
                comment: Some(reason),
            },
        );
        Ok(updated)
    }

    /// Make an Approved proposal visible to buyers
    pub async fn publish(&self, id: Uuid, caller: &Identity) -> Result<Proposal> {
        let proposal = self.fetch(id).await?;
        Self::require_creator_or_admin(&proposal, caller)?;

        let updated = self
            .execute(
                &proposal,
                ProposalStatus::Available,
                caller.id,
                None,
                Some(LifecycleStamp::Published),
            )
            .await?;

        spawn_notify(
            self.notifier.clone(),
            LifecycleEvent::ProposalPublished {
                proposal_id: updated.id,
                creator_id: updated.creator_id,
            },
        );
        Ok(updated)
    }

    /// One-way terminal transition. Archiving twice is an explicit error,
    /// not a no-op.
    pub async fn archive(
        &self,
        id: Uuid,
        caller: &Identity,
        reason: Option<String>,
    ) -> Result<Proposal> {
        let proposal = self.fetch(id).await?;
        Self::require_creator_or_admin(&proposal, caller)?;

        if proposal.status == ProposalStatus::Archived {
            return Err(AppError::AlreadyArchived { id: id.to_string() });
        }

        self.execute(&proposal, ProposalStatus::Archived, caller.id, reason, None)
            .await
    }

    /// Record a buyer dispatch: from Available this is the Available→Sent
    /// transition plus the counter; once Sent, only the counter moves.
    pub async fn record_dispatch(&self, id: Uuid, operator: &Identity) -> Result<Proposal> {
        let proposal = self.fetch(id).await?;
        Self::require_creator_or_admin(&proposal, operator)?;

        match proposal.status {
            ProposalStatus::Available => {
                self.execute(&proposal, ProposalStatus::Sent, operator.id, None, None)
                    .await?;
            }
            ProposalStatus::Sent => {}
            other => {
                return Err(AppError::InvalidTransition {
                    from: other.to_string(),
                    to: ProposalStatus::Sent.to_string(),
                })
            }
        }

        self.store.increment_counter(id, Counter::Sent, 1).await?;
        self.fetch(id).await
    }

    /// Read-only dry run used by UIs to gray out unavailable actions
    pub async fn can_transition_to(
        &self,
        id: Uuid,
        target: ProposalStatus,
        caller: Option<&Identity>,
    ) -> Result<TransitionCheck> {
        let proposal = self.fetch(id).await?;

        if let Err(e) = validate_transition(proposal.status, target) {
            return Ok(TransitionCheck {
                allowed: false,
                reason: Some(e.to_string()),
            });
        }

        let caps = self.resolver.resolve(&proposal, caller);
        let actor_ok = match target {
            ProposalStatus::UnderReview => caps.can_submit,
            ProposalStatus::Approved | ProposalStatus::Rejected => caps.can_approve,
            // withdraw, publish, dispatch and archive are creator/admin actions
            _ => caller.is_some_and(|c| {
                c.is_active && (c.role.is_admin() || c.id == proposal.creator_id)
            }),
        };

        if actor_ok {
            Ok(TransitionCheck {
                allowed: true,
                reason: None,
            })
        } else {
            Ok(TransitionCheck {
                allowed: false,
                reason: Some("Caller lacks the capability for this transition".to_string()),
            })
        }
    }

    /// Review history, newest first
    pub async fn history(&self, id: Uuid) -> Result<Vec<ReviewRecord>> {
        Ok(self.fetch(id).await?.history())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use dealbridge_common::auth::Role;
    use dealbridge_common::domain::{
        CompanyInfo, CompanySize, FinancialInfo, FullContent, Industry, TeaserContent,
    };
    use dealbridge_common::notify::NullNotifier;
    use dealbridge_common::store::{
        ContentPatch, DateRange, IndustryCount, MemoryProposalStore, QuerySpec,
        ReviewEfficiency, ReviewHistoryEntry, StatusCount,
    };

    fn identity(id: Uuid, role: Role) -> Identity {
        Identity {
            id,
            role,
            is_active: true,
            request_id: "test".into(),
        }
    }

    fn engine() -> WorkflowEngine<MemoryProposalStore> {
        WorkflowEngine::new(
            Arc::new(MemoryProposalStore::new()),
            Arc::new(NullNotifier),
            PermissionResolver::default(),
        )
    }

    fn ready_proposal(creator: Uuid) -> Proposal {
        let mut p = Proposal::new(creator);
        p.company_info = Some(CompanyInfo {
            company_name: "Northwind Robotics".into(),
            industry: Industry::Technology,
            sub_industry: None,
            founded_year: 2015,
            headquarters: "Taipei".into(),
            employee_count: 42,
            company_size: CompanySize::Medium,
            website: None,
        });
        p.financial_info = Some(FinancialInfo {
            annual_revenue: 5_000_000,
            net_profit: 750_000,
            profit_margin: None,
            growth_rate: None,
            asking_price: None,
        });
        p.teaser_content = Some(TeaserContent {
            title: "t".into(),
            tagline: None,
            summary: "s".into(),
            highlights: vec!["a".into(), "b".into(), "c".into()],
            revenue_range: None,
        });
        p.full_content = Some(FullContent {
            detailed_description: "x".repeat(250),
            business_plan: None,
            growth_strategy: None,
            risk_factors: vec![],
            financial_statements: None,
        });
        p
    }

    async fn seed(engine: &WorkflowEngine<MemoryProposalStore>, p: &Proposal) {
        engine.store.insert(p).await.unwrap();
    }

    #[tokio::test]
    async fn test_full_happy_path() {
        let engine = engine();
        let creator_id = Uuid::new_v4();
        let creator = identity(creator_id, Role::Seller);
        let admin = identity(Uuid::new_v4(), Role::Admin);
        let p = ready_proposal(creator_id);
        seed(&engine, &p).await;

        let submitted = engine.submit(p.id, &creator).await.unwrap();
        assert_eq!(submitted.status, ProposalStatus::UnderReview);
        assert!(submitted.submitted_at.is_some());

        let approved = engine.approve(p.id, &admin, Some("looks good".into()), false).await.unwrap();
        assert_eq!(approved.status, ProposalStatus::Approved);
        assert!(approved.approved_at.is_some());

        let published = engine.publish(p.id, &creator).await.unwrap();
        assert_eq!(published.status, ProposalStatus::Available);
        assert!(published.published_at.is_some());

        let sent = engine.record_dispatch(p.id, &admin).await.unwrap();
        assert_eq!(sent.status, ProposalStatus::Sent);
        assert_eq!(sent.sent_count, 1);

        // one audit record per executed transition
        assert_eq!(sent.review_records.len(), 4);
        assert_eq!(
            sent.history()[0].to_status,
            ProposalStatus::Sent
        );
    }

    #[tokio::test]
    async fn test_submit_requires_completeness() {
        let engine = engine();
        let creator_id = Uuid::new_v4();
        let creator = identity(creator_id, Role::Seller);
        let mut p = ready_proposal(creator_id);
        p.full_content = None;
        seed(&engine, &p).await;

        let err = engine.submit(p.id, &creator).await.unwrap_err();
        match err {
            AppError::NotReady { missing } => {
                assert_eq!(missing, vec!["full_content.detailed_description"]);
            }
            other => panic!("expected NotReady, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_submit_reject_fix_resubmit() {
        let engine = engine();
        let creator_id = Uuid::new_v4();
        let creator = identity(creator_id, Role::Seller);
        let admin = identity(Uuid::new_v4(), Role::Admin);
        let p = ready_proposal(creator_id);
        seed(&engine, &p).await;

        engine.submit(p.id, &creator).await.unwrap();
        let rejected = engine
            .reject(p.id, &admin, "financial statements are missing".into())
            .await
            .unwrap();
        assert_eq!(rejected.status, ProposalStatus::Rejected);
        assert_eq!(
            rejected.rejection_reason.as_deref(),
            Some("financial statements are missing")
        );

        // Rejected proposals go back to Draft through reopen, not withdraw
        let drafted = engine.withdraw(p.id, &creator, None).await;
        assert!(matches!(
            drafted.unwrap_err(),
            AppError::InvalidTransition { .. }
        ));

        let reopened = engine.reopen(p.id, &creator).await.unwrap();
        assert_eq!(reopened.status, ProposalStatus::Draft);

        let resubmitted = engine.submit(p.id, &creator).await.unwrap();
        assert_eq!(resubmitted.status, ProposalStatus::UnderReview);
        // reject, reopen and both submits all left audit records
        assert_eq!(resubmitted.review_records.len(), 4);
    }

    #[tokio::test]
    async fn test_withdraw_only_from_under_review() {
        let engine = engine();
        let creator_id = Uuid::new_v4();
        let creator = identity(creator_id, Role::Seller);
        let p = ready_proposal(creator_id);
        seed(&engine, &p).await;

        // a Draft has nothing to withdraw
        assert!(matches!(
            engine.withdraw(p.id, &creator, None).await.unwrap_err(),
            AppError::InvalidTransition { .. }
        ));

        engine.submit(p.id, &creator).await.unwrap();
        let withdrawn = engine
            .withdraw(p.id, &creator, Some("need to fix figures".into()))
            .await
            .unwrap();
        assert_eq!(withdrawn.status, ProposalStatus::Draft);

        // reopen is for Rejected only
        assert!(matches!(
            engine.reopen(p.id, &creator).await.unwrap_err(),
            AppError::InvalidTransition { .. }
        ));
    }

    #[tokio::test]
    async fn test_reject_reason_too_short() {
        let engine = engine();
        let admin = identity(Uuid::new_v4(), Role::Admin);
        let p = ready_proposal(Uuid::new_v4());
        seed(&engine, &p).await;

        let err = engine.reject(p.id, &admin, "bad".into()).await.unwrap_err();
        assert!(matches!(err, AppError::Validation { .. }));
    }

    #[tokio::test]
    async fn test_approve_is_admin_only() {
        let engine = engine();
        let creator_id = Uuid::new_v4();
        let creator = identity(creator_id, Role::Seller);
        let p = ready_proposal(creator_id);
        seed(&engine, &p).await;
        engine.submit(p.id, &creator).await.unwrap();

        let err = engine.approve(p.id, &creator, None, false).await.unwrap_err();
        assert!(matches!(err, AppError::AdminRequired));
    }

    #[tokio::test]
    async fn test_auto_publish_chains() {
        let engine = engine();
        let creator_id = Uuid::new_v4();
        let creator = identity(creator_id, Role::Seller);
        let admin = identity(Uuid::new_v4(), Role::Admin);
        let p = ready_proposal(creator_id);
        seed(&engine, &p).await;
        engine.submit(p.id, &creator).await.unwrap();

        let published = engine.approve(p.id, &admin, None, true).await.unwrap();
        assert_eq!(published.status, ProposalStatus::Available);
        assert!(published.approved_at.is_some());
        assert!(published.published_at.is_some());
        // approve and publish each leave their own audit record
        assert_eq!(published.review_records.len(), 3);
    }

    #[tokio::test]
    async fn test_concurrent_decision_race() {
        let engine = engine();
        let creator_id = Uuid::new_v4();
        let creator = identity(creator_id, Role::Seller);
        let admin_a = identity(Uuid::new_v4(), Role::Admin);
        let admin_b = identity(Uuid::new_v4(), Role::Admin);
        let p = ready_proposal(creator_id);
        seed(&engine, &p).await;
        engine.submit(p.id, &creator).await.unwrap();

        // First decision wins; second loses on the version guard before
        // it can double-apply.
        engine.approve(p.id, &admin_a, None, false).await.unwrap();
        let err = engine
            .reject(p.id, &admin_b, "duplicate decision attempt".into())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::InvalidTransition { .. }));

        let final_state = engine.history(p.id).await.unwrap();
        assert_eq!(final_state[0].to_status, ProposalStatus::Approved);
    }

    #[tokio::test]
    async fn test_dispatch_is_creator_or_admin_only() {
        let engine = engine();
        let creator_id = Uuid::new_v4();
        let creator = identity(creator_id, Role::Seller);
        let admin = identity(Uuid::new_v4(), Role::Admin);
        let buyer = identity(Uuid::new_v4(), Role::Buyer);
        let p = ready_proposal(creator_id);
        seed(&engine, &p).await;

        engine.submit(p.id, &creator).await.unwrap();
        engine.approve(p.id, &admin, None, true).await.unwrap();

        // a buyer viewing the listing cannot move it to Sent
        assert!(matches!(
            engine.record_dispatch(p.id, &buyer).await.unwrap_err(),
            AppError::Forbidden { .. }
        ));

        let sent = engine.record_dispatch(p.id, &creator).await.unwrap();
        assert_eq!(sent.status, ProposalStatus::Sent);
        assert_eq!(sent.sent_count, 1);
    }

    /// Store wrapper whose reads keep returning a pinned snapshot, so two
    /// operations can act on the same fetched version.
    struct PinnedReadStore {
        inner: Arc<MemoryProposalStore>,
        pinned: Proposal,
    }

    #[async_trait]
    impl ProposalStore for PinnedReadStore {
        async fn insert(&self, proposal: &Proposal) -> Result<Uuid> {
            self.inner.insert(proposal).await
        }

        async fn find_by_id(&self, id: Uuid) -> Result<Option<Proposal>> {
            if self.pinned.id == id {
                return Ok(Some(self.pinned.clone()));
            }
            self.inner.find_by_id(id).await
        }

        async fn update_content(
            &self,
            id: Uuid,
            expected_version: i64,
            patch: ContentPatch,
        ) -> Result<Proposal> {
            self.inner.update_content(id, expected_version, patch).await
        }

        async fn apply_transition(
            &self,
            id: Uuid,
            expected_version: i64,
            to: ProposalStatus,
            record: ReviewRecord,
            stamp: Option<LifecycleStamp>,
        ) -> Result<Proposal> {
            self.inner
                .apply_transition(id, expected_version, to, record, stamp)
                .await
        }

        async fn delete(&self, id: Uuid) -> Result<bool> {
            self.inner.delete(id).await
        }

        async fn increment_counter(&self, id: Uuid, counter: Counter, delta: i64) -> Result<()> {
            self.inner.increment_counter(id, counter, delta).await
        }

        async fn query(&self, spec: &QuerySpec) -> Result<(Vec<Proposal>, u64)> {
            self.inner.query(spec).await
        }

        async fn status_counts(&self, range: &DateRange) -> Result<Vec<StatusCount>> {
            self.inner.status_counts(range).await
        }

        async fn industry_distribution(
            &self,
            range: &DateRange,
            limit: usize,
        ) -> Result<Vec<IndustryCount>> {
            self.inner.industry_distribution(range, limit).await
        }

        async fn review_efficiency(&self, range: &DateRange) -> Result<ReviewEfficiency> {
            self.inner.review_efficiency(range).await
        }

        async fn review_history(
            &self,
            range: &DateRange,
            operator_id: Option<Uuid>,
        ) -> Result<Vec<ReviewHistoryEntry>> {
            self.inner.review_history(range, operator_id).await
        }
    }

    #[tokio::test]
    async fn test_decisions_from_shared_read_hit_version_guard() {
        let store = Arc::new(MemoryProposalStore::new());
        let engine = WorkflowEngine::new(
            store.clone(),
            Arc::new(NullNotifier),
            PermissionResolver::default(),
        );
        let creator_id = Uuid::new_v4();
        let creator = identity(creator_id, Role::Seller);
        let admin_a = identity(Uuid::new_v4(), Role::Admin);
        let admin_b = identity(Uuid::new_v4(), Role::Admin);
        let p = ready_proposal(creator_id);
        store.insert(&p).await.unwrap();

        let submitted = engine.submit(p.id, &creator).await.unwrap();

        // the second admin acts on the version both of them read
        let stale_engine = WorkflowEngine::new(
            Arc::new(PinnedReadStore {
                inner: store.clone(),
                pinned: submitted,
            }),
            Arc::new(NullNotifier),
            PermissionResolver::default(),
        );

        engine.approve(p.id, &admin_a, None, false).await.unwrap();
        let err = stale_engine
            .reject(p.id, &admin_b, "duplicate decision attempt".into())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::VersionConflict { .. }));

        let final_state = engine.history(p.id).await.unwrap();
        assert_eq!(final_state[0].to_status, ProposalStatus::Approved);
    }

    #[tokio::test]
    async fn test_archive_twice_is_an_error() {
        let engine = engine();
        let creator_id = Uuid::new_v4();
        let creator = identity(creator_id, Role::Seller);
        let p = ready_proposal(creator_id);
        seed(&engine, &p).await;

        engine.archive(p.id, &creator, None).await.unwrap();
        let err = engine.archive(p.id, &creator, None).await.unwrap_err();
        assert!(matches!(err, AppError::AlreadyArchived { .. }));
    }

    #[tokio::test]
    async fn test_stranger_cannot_drive_workflow() {
        let engine = engine();
        let stranger = identity(Uuid::new_v4(), Role::Seller);
        let p = ready_proposal(Uuid::new_v4());
        seed(&engine, &p).await;

        assert!(matches!(
            engine.submit(p.id, &stranger).await.unwrap_err(),
            AppError::Forbidden { .. }
        ));
        assert!(matches!(
            engine.archive(p.id, &stranger, None).await.unwrap_err(),
            AppError::Forbidden { .. }
        ));
    }

    #[tokio::test]
    async fn test_dry_run_reports_reason() {
        let engine = engine();
        let creator_id = Uuid::new_v4();
        let creator = identity(creator_id, Role::Seller);
        let p = ready_proposal(creator_id);
        seed(&engine, &p).await;

        let ok = engine
            .can_transition_to(p.id, ProposalStatus::UnderReview, Some(&creator))
            .await
            .unwrap();
        assert!(ok.allowed);

        let bad_target = engine
            .can_transition_to(p.id, ProposalStatus::Sent, Some(&creator))
            .await
            .unwrap();
        assert!(!bad_target.allowed);
        assert!(bad_target.reason.is_some());

        let anon = engine
            .can_transition_to(p.id, ProposalStatus::UnderReview, None)
            .await
            .unwrap();
        assert!(!anon.allowed);
    }
}
