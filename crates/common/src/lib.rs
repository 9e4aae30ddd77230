//! DealBridge Common Library
//!
//! Shared code for all DealBridge services including:
//! - Domain model (proposals, content blocks, review trail)
//! - Proposal store abstraction with Postgres and in-memory backends
//! - Error types and handling
//! - Configuration management
//! - Authentication utilities
//! - Lifecycle notifications
//! - Metrics and observability

pub mod auth;
pub mod config;
pub mod domain;
pub mod errors;
pub mod metrics;
pub mod notify;
pub mod store;

// Re-export commonly used types
pub use auth::{Identity, MaybeIdentity, Role};
pub use config::AppConfig;
pub use domain::{Proposal, ProposalStatus, ReviewRecord};
pub use errors::{AppError, Result};
pub use store::{MemoryProposalStore, PgProposalStore, ProposalStore};

/// Application version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
