//! Proposal content blocks
//!
//! Each block is independently nullable on the proposal until the seller
//! populates it. Field-level sanity rules live in the validation engine.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Industry classification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Industry {
    Technology,
    Electronics,
    Biotechnology,
    Finance,
    Retail,
    FoodService,
    Manufacturing,
    RealEstate,
    Healthcare,
    Education,
    Logistics,
    Energy,
    Media,
    Agriculture,
    Tourism,
    Other,
}

impl Industry {
    /// Human-readable label, also used for keyword matching
    pub fn label(&self) -> &'static str {
        match self {
            Industry::Technology => "technology",
            Industry::Electronics => "electronics",
            Industry::Biotechnology => "biotechnology",
            Industry::Finance => "finance",
            Industry::Retail => "retail",
            Industry::FoodService => "food service",
            Industry::Manufacturing => "manufacturing",
            Industry::RealEstate => "real estate",
            Industry::Healthcare => "healthcare",
            Industry::Education => "education",
            Industry::Logistics => "logistics",
            Industry::Energy => "energy",
            Industry::Media => "media",
            Industry::Agriculture => "agriculture",
            Industry::Tourism => "tourism",
            Industry::Other => "other",
        }
    }
}

impl fmt::Display for Industry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Company size bracket, derived from headcount
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CompanySize {
    Micro,
    Small,
    Medium,
    Large,
    Enterprise,
}

impl CompanySize {
    /// Bracket boundaries: micro 1-4, small 5-29, medium 30-199,
    /// large 200-999, enterprise 1000+
    pub fn from_headcount(count: i32) -> Self {
        match count {
            ..=4 => CompanySize::Micro,
            5..=29 => CompanySize::Small,
            30..=199 => CompanySize::Medium,
            200..=999 => CompanySize::Large,
            _ => CompanySize::Enterprise,
        }
    }
}

/// Company basics
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompanyInfo {
    pub company_name: String,
    pub industry: Industry,
    #[serde(default)]
    pub sub_industry: Option<String>,
    pub founded_year: i32,
    pub headquarters: String,
    pub employee_count: i32,
    pub company_size: CompanySize,
    #[serde(default)]
    pub website: Option<String>,
}

/// Financials
///
/// `profit_margin` is derived from revenue and profit whenever revenue is
/// positive; a caller-supplied value is never trusted in that case.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FinancialInfo {
    /// Annual revenue in the listing currency's smallest practical unit
    pub annual_revenue: i64,
    pub net_profit: i64,
    #[serde(default)]
    pub profit_margin: Option<f64>,
    #[serde(default)]
    pub growth_rate: Option<f64>,
    #[serde(default)]
    pub asking_price: Option<i64>,
}

/// Business model description
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BusinessModel {
    pub business_type: String,
    #[serde(default)]
    pub main_products: Vec<String>,
    #[serde(default)]
    pub target_markets: Vec<String>,
    #[serde(default)]
    pub revenue_streams: Vec<String>,
    #[serde(default)]
    pub competitive_advantages: Vec<String>,
}

/// Public-safe preview shown to buyers before any NDA
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TeaserContent {
    pub title: String,
    #[serde(default)]
    pub tagline: Option<String>,
    /// Short public business overview
    pub summary: String,
    /// Core selling points; valid count is 3 to 5
    pub highlights: Vec<String>,
    #[serde(default)]
    pub revenue_range: Option<String>,
}

/// Detailed content, gated behind an NDA grant
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FullContent {
    /// Detailed company description; at least 200 characters when present
    pub detailed_description: String,
    #[serde(default)]
    pub business_plan: Option<String>,
    #[serde(default)]
    pub growth_strategy: Option<String>,
    #[serde(default)]
    pub risk_factors: Vec<String>,
    #[serde(default)]
    pub financial_statements: Option<String>,
}

/// Attachment metadata; binary storage is external
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttachedFile {
    pub file_id: Uuid,
    pub filename: String,
    pub content_type: String,
    pub size_bytes: i64,
    pub uploaded_at: DateTime<Utc>,
    #[serde(default)]
    pub is_public: bool,
    #[serde(default)]
    pub description: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_company_size_brackets() {
        assert_eq!(CompanySize::from_headcount(1), CompanySize::Micro);
        assert_eq!(CompanySize::from_headcount(4), CompanySize::Micro);
        assert_eq!(CompanySize::from_headcount(5), CompanySize::Small);
        assert_eq!(CompanySize::from_headcount(29), CompanySize::Small);
        assert_eq!(CompanySize::from_headcount(199), CompanySize::Medium);
        assert_eq!(CompanySize::from_headcount(999), CompanySize::Large);
        assert_eq!(CompanySize::from_headcount(1000), CompanySize::Enterprise);
    }
}
