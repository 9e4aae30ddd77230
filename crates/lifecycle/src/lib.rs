//! DealBridge Proposal Lifecycle Engine
//!
//! The state machine at the core of the marketplace: validation,
//! permission resolution, workflow transitions with an append-only audit
//! trail, CRUD orchestration, and admin operations.

pub mod admin;
pub mod permissions;
pub mod proposals;
pub mod validation;
pub mod workflow;

pub use admin::{AdminOperations, BatchOutcome, PendingReview, PendingReviewPage, Statistics};
pub use permissions::{Capabilities, DenyAllNda, NdaGate, PermissionResolver};
pub use proposals::{DeleteOutcome, ProposalPage, ProposalService};
pub use validation::{check_completeness, validate_transition, CompletenessReport};
pub use workflow::{TransitionCheck, WorkflowEngine};
