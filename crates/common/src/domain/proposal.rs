//! Proposal entity and its audit trail

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::blocks::{
    AttachedFile, BusinessModel, CompanyInfo, FinancialInfo, FullContent, TeaserContent,
};
use super::status::ProposalStatus;

/// One append-only audit entry per executed status transition.
///
/// Entries are never edited or removed; the proposal's current status must
/// equal the `to_status` of the most recent record (or Draft if none exist).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReviewRecord {
    /// Action label, e.g. "draft_to_under_review"
    pub action: String,
    pub from_status: ProposalStatus,
    pub to_status: ProposalStatus,
    pub operator_id: Uuid,
    #[serde(default)]
    pub comment: Option<String>,
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub metadata: serde_json::Value,
}

impl ReviewRecord {
    /// Build a record for a transition executed now
    pub fn for_transition(
        from: ProposalStatus,
        to: ProposalStatus,
        operator_id: Uuid,
        comment: Option<String>,
        metadata: serde_json::Value,
    ) -> Self {
        Self {
            action: format!("{}_to_{}", from.as_str(), to.as_str()),
            from_status: from,
            to_status: to,
            operator_id,
            comment,
            timestamp: Utc::now(),
            metadata,
        }
    }
}

/// The sellable company listing at the center of the system
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Proposal {
    pub id: Uuid,
    /// Seller who created the proposal; immutable
    pub creator_id: Uuid,
    pub status: ProposalStatus,
    /// Optimistic-concurrency counter; +1 on every successful mutation
    pub version: i64,

    // Content blocks, each independently nullable until populated
    pub company_info: Option<CompanyInfo>,
    pub financial_info: Option<FinancialInfo>,
    pub business_model: Option<BusinessModel>,
    pub teaser_content: Option<TeaserContent>,
    pub full_content: Option<FullContent>,

    #[serde(default)]
    pub attached_files: Vec<AttachedFile>,
    #[serde(default)]
    pub review_records: Vec<ReviewRecord>,
    #[serde(default)]
    pub rejection_reason: Option<String>,

    // Monotonically non-decreasing counters
    pub view_count: i64,
    pub sent_count: i64,
    pub interest_count: i64,

    // Lifecycle timestamps
    #[serde(default)]
    pub submitted_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub approved_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub published_at: Option<DateTime<Utc>>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Proposal {
    /// Create a fresh Draft for the given seller
    pub fn new(creator_id: Uuid) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            creator_id,
            status: ProposalStatus::Draft,
            version: 1,
            company_info: None,
            financial_info: None,
            business_model: None,
            teaser_content: None,
            full_content: None,
            attached_files: Vec::new(),
            review_records: Vec::new(),
            rejection_reason: None,
            view_count: 0,
            sent_count: 0,
            interest_count: 0,
            submitted_at: None,
            approved_at: None,
            published_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Content is editable only while drafting or after rejection
    pub fn is_editable(&self) -> bool {
        matches!(
            self.status,
            ProposalStatus::Draft | ProposalStatus::Rejected
        )
    }

    /// Review history, newest first
    pub fn history(&self) -> Vec<ReviewRecord> {
        let mut records = self.review_records.clone();
        records.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        records
    }
}
