//! Persistence boundary for proposals
//!
//! `ProposalStore` is the only way proposal state is read or mutated. The
//! contract every backend must honor:
//!
//! - Writes that change status atomically bump `version`, set `updated_at`
//!   and append the review record in one operation; partial application is
//!   impossible by construction.
//! - All mutations are guarded by `expected_version`; a stale version loses
//!   the race with `VersionConflict` and never applies.
//! - Counter increments are commutative atomic adds and never touch
//!   `version`.

mod memory;
mod postgres;

pub use memory::MemoryProposalStore;
pub use postgres::{DbPool, PgProposalStore};

use crate::domain::{
    AttachedFile, BusinessModel, CompanyInfo, CompanySize, FinancialInfo, FullContent, Industry,
    Proposal, ProposalStatus, ReviewRecord, TeaserContent,
};
use crate::errors::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Monotonic counters on a proposal
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Counter {
    Views,
    Sent,
    Interest,
}

impl Counter {
    pub fn column(&self) -> &'static str {
        match self {
            Counter::Views => "view_count",
            Counter::Sent => "sent_count",
            Counter::Interest => "interest_count",
        }
    }
}

/// Lifecycle timestamp set alongside certain transitions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleStamp {
    Submitted,
    Approved,
    Published,
}

impl LifecycleStamp {
    pub fn column(&self) -> &'static str {
        match self {
            LifecycleStamp::Submitted => "submitted_at",
            LifecycleStamp::Approved => "approved_at",
            LifecycleStamp::Published => "published_at",
        }
    }
}

/// Partial content update; `None` fields are left untouched
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ContentPatch {
    pub company_info: Option<CompanyInfo>,
    pub financial_info: Option<FinancialInfo>,
    pub business_model: Option<BusinessModel>,
    pub teaser_content: Option<TeaserContent>,
    pub full_content: Option<FullContent>,
    pub attached_files: Option<Vec<AttachedFile>>,
}

impl ContentPatch {
    pub fn is_empty(&self) -> bool {
        self.company_info.is_none()
            && self.financial_info.is_none()
            && self.business_model.is_none()
            && self.teaser_content.is_none()
            && self.full_content.is_none()
            && self.attached_files.is_none()
    }
}

/// Typed filter for proposal queries; clauses compose by AND
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProposalFilter {
    /// Empty means no status constraint
    pub statuses: Vec<ProposalStatus>,
    pub creator_id: Option<Uuid>,
    /// Case-insensitive substring over company name, teaser title/summary
    /// and industry label
    pub keyword: Option<String>,
    pub industries: Vec<Industry>,
    pub company_sizes: Vec<CompanySize>,
    pub min_revenue: Option<i64>,
    pub max_revenue: Option<i64>,
    /// Case-insensitive substring match against headquarters
    pub locations: Vec<String>,
    pub min_founded_year: Option<i32>,
    pub max_founded_year: Option<i32>,
    pub created_from: Option<DateTime<Utc>>,
    pub created_to: Option<DateTime<Utc>>,
}

impl ProposalFilter {
    /// Evaluate the filter against a proposal.
    ///
    /// Shared semantics for every backend: the in-memory store applies this
    /// directly; the Postgres store translates it to SQL clause by clause.
    /// A range clause on an absent block never matches, mirroring a query
    /// on a missing document field.
    pub fn matches(&self, p: &Proposal) -> bool {
        if !self.statuses.is_empty() && !self.statuses.contains(&p.status) {
            return false;
        }
        if let Some(creator) = self.creator_id {
            if p.creator_id != creator {
                return false;
            }
        }
        if let Some(ref keyword) = self.keyword {
            let needle = keyword.to_lowercase();
            let mut haystacks: Vec<String> = Vec::new();
            if let Some(ref company) = p.company_info {
                haystacks.push(company.company_name.to_lowercase());
                haystacks.push(company.industry.label().to_string());
            }
            if let Some(ref teaser) = p.teaser_content {
                haystacks.push(teaser.title.to_lowercase());
                haystacks.push(teaser.summary.to_lowercase());
            }
            if !haystacks.iter().any(|h| h.contains(&needle)) {
                return false;
            }
        }
        if !self.industries.is_empty() {
            match p.company_info.as_ref() {
                Some(c) if self.industries.contains(&c.industry) => {}
                _ => return false,
            }
        }
        if !self.company_sizes.is_empty() {
            match p.company_info.as_ref() {
                Some(c) if self.company_sizes.contains(&c.company_size) => {}
                _ => return false,
            }
        }
        if self.min_revenue.is_some() || self.max_revenue.is_some() {
            let Some(revenue) = p.financial_info.as_ref().map(|f| f.annual_revenue) else {
                return false;
            };
            if self.min_revenue.is_some_and(|min| revenue < min) {
                return false;
            }
            if self.max_revenue.is_some_and(|max| revenue > max) {
                return false;
            }
        }
        if !self.locations.is_empty() {
            let Some(hq) = p.company_info.as_ref().map(|c| c.headquarters.to_lowercase())
            else {
                return false;
            };
            if !self
                .locations
                .iter()
                .any(|loc| hq.contains(&loc.to_lowercase()))
            {
                return false;
            }
        }
        if self.min_founded_year.is_some() || self.max_founded_year.is_some() {
            let Some(year) = p.company_info.as_ref().map(|c| c.founded_year) else {
                return false;
            };
            if self.min_founded_year.is_some_and(|min| year < min) {
                return false;
            }
            if self.max_founded_year.is_some_and(|max| year > max) {
                return false;
            }
        }
        if self.created_from.is_some_and(|from| p.created_at < from) {
            return false;
        }
        if self.created_to.is_some_and(|to| p.created_at > to) {
            return false;
        }
        true
    }
}

/// Whitelisted sort keys
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortKey {
    CreatedAt,
    UpdatedAt,
    ViewCount,
    Revenue,
    CompanyName,
}

impl SortKey {
    /// Parse a caller-supplied key; unknown keys return `None` so the
    /// caller can fall back to the default
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "created_at" => Some(SortKey::CreatedAt),
            "updated_at" => Some(SortKey::UpdatedAt),
            "view_count" => Some(SortKey::ViewCount),
            "revenue" => Some(SortKey::Revenue),
            "company_name" => Some(SortKey::CompanyName),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortOrder {
    Asc,
    Desc,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SortSpec {
    pub key: SortKey,
    pub order: SortOrder,
}

impl Default for SortSpec {
    fn default() -> Self {
        Self {
            key: SortKey::CreatedAt,
            order: SortOrder::Desc,
        }
    }
}

/// Complete query: filter + sort + window. A limit of 0 means unbounded.
#[derive(Debug, Clone, Default)]
pub struct QuerySpec {
    pub filter: ProposalFilter,
    pub sort: SortSpec,
    pub skip: u64,
    pub limit: u64,
}

/// Optional date window for aggregations
#[derive(Debug, Clone, Copy, Default)]
pub struct DateRange {
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
}

impl DateRange {
    pub fn contains(&self, at: DateTime<Utc>) -> bool {
        !self.from.is_some_and(|from| at < from) && !self.to.is_some_and(|to| at > to)
    }
}

/// Per-status aggregate row
#[derive(Debug, Clone, Serialize)]
pub struct StatusCount {
    pub status: ProposalStatus,
    pub count: u64,
    pub avg_view_count: f64,
}

/// Per-industry aggregate row
#[derive(Debug, Clone, Serialize)]
pub struct IndustryCount {
    pub industry: Industry,
    pub count: u64,
}

/// Reviewer throughput aggregate
#[derive(Debug, Clone, Default, Serialize)]
pub struct ReviewEfficiency {
    pub total_reviewers: u64,
    pub total_reviews: u64,
    pub avg_reviews_per_reviewer: f64,
    /// Mean hours from proposal creation to decision, when computable
    pub avg_review_hours: Option<f64>,
}

/// Flattened audit entry for admin history queries
#[derive(Debug, Clone, Serialize)]
pub struct ReviewHistoryEntry {
    pub proposal_id: Uuid,
    pub company_name: Option<String>,
    pub current_status: ProposalStatus,
    pub record: ReviewRecord,
}

/// Persistence boundary trait.
///
/// Implementations must be fully wired at construction; there is no
/// partial-capability probing at runtime.
#[async_trait]
pub trait ProposalStore: Send + Sync {
    /// Insert a new proposal, returning its id
    async fn insert(&self, proposal: &Proposal) -> Result<Uuid>;

    /// Fetch by id; `None` when absent
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Proposal>>;

    /// Apply a content patch. Bumps version by exactly 1 and sets
    /// `updated_at`; fails with `VersionConflict` on a stale version.
    async fn update_content(
        &self,
        id: Uuid,
        expected_version: i64,
        patch: ContentPatch,
    ) -> Result<Proposal>;

    /// Atomically: set status, bump version, set `updated_at`, append the
    /// review record and set the optional lifecycle timestamp.
    async fn apply_transition(
        &self,
        id: Uuid,
        expected_version: i64,
        to: ProposalStatus,
        record: ReviewRecord,
        stamp: Option<LifecycleStamp>,
    ) -> Result<Proposal>;

    /// Hard delete; `false` when the id is unknown. Callers enforce the
    /// Draft-only rule.
    async fn delete(&self, id: Uuid) -> Result<bool>;

    /// Commutative atomic counter add; never bumps version
    async fn increment_counter(&self, id: Uuid, counter: Counter, delta: i64) -> Result<()>;

    /// Filtered, sorted, windowed query with total count
    async fn query(&self, spec: &QuerySpec) -> Result<(Vec<Proposal>, u64)>;

    /// Proposal counts grouped by status within the date range
    async fn status_counts(&self, range: &DateRange) -> Result<Vec<StatusCount>>;

    /// Top industries by proposal count within the date range
    async fn industry_distribution(
        &self,
        range: &DateRange,
        limit: usize,
    ) -> Result<Vec<IndustryCount>>;

    /// Reviewer throughput over decision records within the date range
    async fn review_efficiency(&self, range: &DateRange) -> Result<ReviewEfficiency>;

    /// Flattened decision records (approve/reject), newest first, optionally
    /// restricted to a single operator
    async fn review_history(
        &self,
        range: &DateRange,
        operator_id: Option<Uuid>,
    ) -> Result<Vec<ReviewHistoryEntry>>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{CompanyInfo, CompanySize, Industry, TeaserContent};

    fn sample() -> Proposal {
        let mut p = Proposal::new(Uuid::new_v4());
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
        p.teaser_content = Some(TeaserContent {
            title: "Robotics automation leader".into(),
            tagline: None,
            summary: "Industrial automation platform with recurring revenue".into(),
            highlights: vec!["a".into(), "b".into(), "c".into()],
            revenue_range: None,
        });
        p
    }

    #[test]
    fn test_keyword_matches_name_and_summary() {
        let p = sample();
        let mut filter = ProposalFilter {
            keyword: Some("northwind".into()),
            ..Default::default()
        };
        assert!(filter.matches(&p));

        filter.keyword = Some("AUTOMATION".into());
        assert!(filter.matches(&p));

        filter.keyword = Some("bakery".into());
        assert!(!filter.matches(&p));
    }

    #[test]
    fn test_range_on_missing_block_never_matches() {
        let p = sample(); // no financial_info
        let filter = ProposalFilter {
            min_revenue: Some(1),
            ..Default::default()
        };
        assert!(!filter.matches(&p));
    }

    #[test]
    fn test_location_is_case_insensitive_substring() {
        let p = sample();
        let filter = ProposalFilter {
            locations: vec!["taipei".into()],
            ..Default::default()
        };
        assert!(filter.matches(&p));

        let filter = ProposalFilter {
            locations: vec!["osaka".into(), "TAI".into()],
            ..Default::default()
        };
        assert!(filter.matches(&p));
    }

    #[test]
    fn test_sort_key_whitelist() {
        assert_eq!(SortKey::parse("revenue"), Some(SortKey::Revenue));
        assert_eq!(SortKey::parse("profit"), None);
        assert_eq!(SortKey::parse(""), None);
    }
}
