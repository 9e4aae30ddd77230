//! Search filter building
//!
//! Turns a caller-supplied filter set into a store query with the
//! visibility baseline applied. Malformed combinations (min above max) are
//! rejected before any query runs.

use dealbridge_common::auth::Identity;
use dealbridge_common::domain::{CompanySize, Industry, ProposalStatus};
use dealbridge_common::errors::{AppError, Result};
use dealbridge_common::store::{ProposalFilter, SortKey, SortOrder, SortSpec};
use serde::{Deserialize, Serialize};

/// Caller-supplied search filters; every clause composes by AND
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SearchFilters {
    /// Free-text keyword against company name, teaser text and industry
    #[serde(default)]
    pub keyword: Option<String>,
    #[serde(default)]
    pub industries: Vec<Industry>,
    #[serde(default)]
    pub company_sizes: Vec<CompanySize>,
    #[serde(default)]
    pub min_revenue: Option<i64>,
    #[serde(default)]
    pub max_revenue: Option<i64>,
    /// Case-insensitive substring match against headquarters
    #[serde(default)]
    pub locations: Vec<String>,
    #[serde(default)]
    pub min_founded_year: Option<i32>,
    #[serde(default)]
    pub max_founded_year: Option<i32>,
    /// Whitelisted key; unknown values silently fall back to created_at
    #[serde(default)]
    pub sort_by: Option<String>,
    /// "asc" or anything else for descending
    #[serde(default)]
    pub sort_order: Option<String>,
    #[serde(default)]
    pub page: Option<u64>,
    #[serde(default)]
    pub page_size: Option<u64>,
}

impl SearchFilters {
    /// Reject combinations that can never match
    pub fn validate(&self) -> Result<()> {
        if let (Some(min), Some(max)) = (self.min_revenue, self.max_revenue) {
            if min > max {
                return Err(AppError::Validation {
                    message: "min_revenue exceeds max_revenue".to_string(),
                    field: Some("min_revenue".to_string()),
                });
            }
        }
        if let (Some(min), Some(max)) = (self.min_founded_year, self.max_founded_year) {
            if min > max {
                return Err(AppError::Validation {
                    message: "min_founded_year exceeds max_founded_year".to_string(),
                    field: Some("min_founded_year".to_string()),
                });
            }
        }
        Ok(())
    }

    /// Sort spec with silent fallback to created_at descending
    pub fn sort_spec(&self) -> SortSpec {
        let key = self
            .sort_by
            .as_deref()
            .and_then(SortKey::parse)
            .unwrap_or(SortKey::CreatedAt);
        let order = match self.sort_order.as_deref() {
            Some("asc") => SortOrder::Asc,
            _ => SortOrder::Desc,
        };
        // unknown keys fall back to the default sort entirely
        if self.sort_by.as_deref().is_some_and(|s| SortKey::parse(s).is_none()) {
            return SortSpec::default();
        }
        SortSpec { key, order }
    }

    /// Store filter with the caller's visibility baseline applied
    pub fn to_store_filter(&self, caller: Option<&Identity>) -> ProposalFilter {
        ProposalFilter {
            statuses: visibility_baseline(caller),
            keyword: self
                .keyword
                .as_ref()
                .map(|k| k.trim().to_string())
                .filter(|k| !k.is_empty()),
            industries: self.industries.clone(),
            company_sizes: self.company_sizes.clone(),
            min_revenue: self.min_revenue,
            max_revenue: self.max_revenue,
            locations: self.locations.clone(),
            min_founded_year: self.min_founded_year,
            max_founded_year: self.max_founded_year,
            ..Default::default()
        }
    }
}

/// Statuses a caller may ever see in search results.
///
/// Draft, UnderReview, Approved, Rejected and Archived are never
/// searchable, regardless of ownership.
pub fn visibility_baseline(caller: Option<&Identity>) -> Vec<ProposalStatus> {
    match caller {
        Some(c) if c.is_active => vec![ProposalStatus::Available, ProposalStatus::Sent],
        _ => vec![ProposalStatus::Available],
    }
}
