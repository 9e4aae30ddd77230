//! Domain model for DealBridge
//!
//! Strongly-typed proposal entity and its content blocks. Documents are
//! decoded into these types once at the store boundary; nothing downstream
//! works with untyped JSON.

mod blocks;
mod proposal;
mod status;

pub use blocks::{
    AttachedFile, BusinessModel, CompanyInfo, CompanySize, FinancialInfo, FullContent, Industry,
    TeaserContent,
};
pub use proposal::{Proposal, ReviewRecord};
pub use status::ProposalStatus;
