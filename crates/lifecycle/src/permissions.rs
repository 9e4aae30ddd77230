//! Permission resolution
//!
//! Computes the capability set for one (caller, proposal) pair. Resolution
//! never fails: an unknown or disabled caller simply receives the all-false
//! set. Full-content access for non-owners goes through the NDA gate
//! collaborator, which every deployment must wire explicitly.

use crate::validation::check_completeness;
use dealbridge_common::auth::Identity;
use dealbridge_common::domain::{Proposal, ProposalStatus};
use serde::Serialize;
use std::sync::Arc;
use uuid::Uuid;

/// Resolved capability set
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Capabilities {
    pub can_view_teaser: bool,
    pub can_view_full: bool,
    pub can_edit: bool,
    pub can_delete: bool,
    pub can_submit: bool,
    pub can_approve: bool,
}

impl Capabilities {
    /// The anonymous-stranger baseline
    pub fn none() -> Self {
        Self::default()
    }

    /// The admin set
    pub fn all() -> Self {
        Self {
            can_view_teaser: true,
            can_view_full: true,
            can_edit: true,
            can_delete: true,
            can_submit: true,
            can_approve: true,
        }
    }

    /// True when every capability in `other` is also granted here
    pub fn covers(&self, other: &Capabilities) -> bool {
        (self.can_view_teaser || !other.can_view_teaser)
            && (self.can_view_full || !other.can_view_full)
            && (self.can_edit || !other.can_edit)
            && (self.can_delete || !other.can_delete)
            && (self.can_submit || !other.can_submit)
            && (self.can_approve || !other.can_approve)
    }
}

/// External predicate for NDA grants.
///
/// The NDA subsystem is specified separately; until it lands every
/// deployment wires the deny-all implementation.
pub trait NdaGate: Send + Sync {
    fn has_grant(&self, caller_id: Uuid, proposal_id: Uuid) -> bool;
}

/// Denies every grant
#[derive(Default)]
pub struct DenyAllNda;

impl NdaGate for DenyAllNda {
    fn has_grant(&self, _caller_id: Uuid, _proposal_id: Uuid) -> bool {
        false
    }
}

/// Capability resolver
#[derive(Clone)]
pub struct PermissionResolver {
    nda: Arc<dyn NdaGate>,
}

impl Default for PermissionResolver {
    fn default() -> Self {
        Self::new(Arc::new(DenyAllNda))
    }
}

impl PermissionResolver {
    pub fn new(nda: Arc<dyn NdaGate>) -> Self {
        Self { nda }
    }

    /// Resolve the capability set; never fails.
    ///
    /// Disabled accounts resolve like anonymous callers.
    pub fn resolve(&self, proposal: &Proposal, caller: Option<&Identity>) -> Capabilities {
        let Some(identity) = caller.filter(|c| c.is_active) else {
            return self.stranger(proposal, None);
        };

        if identity.role.is_admin() {
            return Capabilities::all();
        }

        if identity.id == proposal.creator_id {
            let editable = proposal.is_editable();
            return Capabilities {
                can_view_teaser: true,
                can_view_full: true,
                can_edit: editable,
                can_delete: editable,
                can_submit: proposal.status == ProposalStatus::Draft
                    && check_completeness(proposal).ready_for_submission,
                can_approve: false,
            };
        }

        self.stranger(proposal, Some(identity.id))
    }

    fn stranger(&self, proposal: &Proposal, caller_id: Option<Uuid>) -> Capabilities {
        Capabilities {
            can_view_teaser: proposal.status.is_buyer_visible(),
            can_view_full: caller_id
                .is_some_and(|id| self.nda.has_grant(id, proposal.id)),
            ..Capabilities::none()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dealbridge_common::auth::Role;
    use dealbridge_common::domain::{
        CompanyInfo, CompanySize, FinancialInfo, FullContent, Industry, TeaserContent,
    };

    fn identity(id: Uuid, role: Role) -> Identity {
        Identity {
            id,
            role,
            is_active: true,
            request_id: "test".into(),
        }
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

    #[test]
    fn test_admin_gets_everything() {
        let resolver = PermissionResolver::default();
        let p = ready_proposal(Uuid::new_v4());
        let admin = identity(Uuid::new_v4(), Role::Admin);
        assert_eq!(resolver.resolve(&p, Some(&admin)), Capabilities::all());
    }

    #[test]
    fn test_creator_can_submit_only_when_ready_draft() {
        let resolver = PermissionResolver::default();
        let creator_id = Uuid::new_v4();
        let creator = identity(creator_id, Role::Seller);

        let ready = ready_proposal(creator_id);
        let caps = resolver.resolve(&ready, Some(&creator));
        assert!(caps.can_submit);
        assert!(caps.can_edit);
        assert!(caps.can_view_full);

        let mut incomplete = ready.clone();
        incomplete.full_content = None;
        assert!(!resolver.resolve(&incomplete, Some(&creator)).can_submit);

        let mut submitted = ready;
        submitted.status = ProposalStatus::UnderReview;
        let caps = resolver.resolve(&submitted, Some(&creator));
        assert!(!caps.can_submit);
        assert!(!caps.can_edit);
        assert!(caps.can_view_full);
    }

    #[test]
    fn test_stranger_sees_teaser_only_when_published() {
        let resolver = PermissionResolver::default();
        let buyer = identity(Uuid::new_v4(), Role::Buyer);
        let mut p = ready_proposal(Uuid::new_v4());

        assert_eq!(resolver.resolve(&p, Some(&buyer)), Capabilities::none());

        p.status = ProposalStatus::Available;
        let caps = resolver.resolve(&p, Some(&buyer));
        assert!(caps.can_view_teaser);
        assert!(!caps.can_view_full); // deny-all NDA gate
        assert!(!caps.can_edit);
    }

    #[test]
    fn test_nda_gate_unlocks_full_view() {
        struct AllowAll;
        impl NdaGate for AllowAll {
            fn has_grant(&self, _c: Uuid, _p: Uuid) -> bool {
                true
            }
        }

        let resolver = PermissionResolver::new(Arc::new(AllowAll));
        let buyer = identity(Uuid::new_v4(), Role::Buyer);
        let mut p = ready_proposal(Uuid::new_v4());
        p.status = ProposalStatus::Sent;

        let caps = resolver.resolve(&p, Some(&buyer));
        assert!(caps.can_view_full);
        assert!(!caps.can_edit);
    }

    #[test]
    fn test_capability_monotonicity() {
        let resolver = PermissionResolver::default();
        let creator_id = Uuid::new_v4();
        let admin = identity(Uuid::new_v4(), Role::Admin);
        let creator = identity(creator_id, Role::Seller);
        let buyer = identity(Uuid::new_v4(), Role::Buyer);

        for status in ProposalStatus::ALL {
            let mut p = ready_proposal(creator_id);
            p.status = status;

            let admin_caps = resolver.resolve(&p, Some(&admin));
            let creator_caps = resolver.resolve(&p, Some(&creator));
            let buyer_caps = resolver.resolve(&p, Some(&buyer));
            let anon_caps = resolver.resolve(&p, None);

            assert!(admin_caps.covers(&creator_caps), "admin < creator at {status}");
            assert!(buyer_caps.covers(&anon_caps), "buyer < anon at {status}");
        }
    }

    #[test]
    fn test_disabled_account_resolves_as_stranger() {
        let resolver = PermissionResolver::default();
        let creator_id = Uuid::new_v4();
        let mut disabled = identity(creator_id, Role::Seller);
        disabled.is_active = false;

        let p = ready_proposal(creator_id);
        assert_eq!(resolver.resolve(&p, Some(&disabled)), Capabilities::none());
    }
}
