//! Result projection
//!
//! Each search result is rendered at the caller's permitted information
//! level: strangers get the teaser projection with a bucketed revenue
//! range instead of financial specifics; creators, admins and NDA holders
//! get the full proposal.

use chrono::{DateTime, Utc};
use dealbridge_common::domain::{CompanySize, Industry, Proposal, ProposalStatus};
use dealbridge_lifecycle::Capabilities;
use serde::Serialize;
use uuid::Uuid;

/// Coarse revenue description shown to non-NDA callers
pub fn revenue_bucket(annual_revenue: Option<i64>) -> &'static str {
    match annual_revenue {
        None => "undisclosed",
        Some(r) if r < 1_000_000 => "< 1M",
        Some(r) if r < 10_000_000 => "1M - 10M",
        Some(r) if r < 100_000_000 => "10M - 100M",
        Some(_) => "> 100M",
    }
}

/// Public-safe rendering of a proposal
#[derive(Debug, Clone, Serialize)]
pub struct TeaserView {
    pub id: Uuid,
    pub status: ProposalStatus,
    pub title: Option<String>,
    pub tagline: Option<String>,
    pub summary: Option<String>,
    pub highlights: Vec<String>,
    pub industry: Option<Industry>,
    pub company_size: Option<CompanySize>,
    pub headquarters: Option<String>,
    pub founded_year: Option<i32>,
    /// Bucketed range string; never raw financials
    pub revenue_range: &'static str,
    pub view_count: i64,
    pub created_at: DateTime<Utc>,
}

/// A proposal rendered at the caller's information level
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "projection", rename_all = "snake_case")]
pub enum ProposalView {
    Teaser(TeaserView),
    Full(Proposal),
}

impl ProposalView {
    pub fn id(&self) -> Uuid {
        match self {
            ProposalView::Teaser(t) => t.id,
            ProposalView::Full(p) => p.id,
        }
    }
}

/// Render a proposal for the given capability set
pub fn project(proposal: Proposal, caps: &Capabilities) -> ProposalView {
    if caps.can_view_full {
        return ProposalView::Full(proposal);
    }

    let teaser = proposal.teaser_content.as_ref();
    let company = proposal.company_info.as_ref();
    ProposalView::Teaser(TeaserView {
        id: proposal.id,
        status: proposal.status,
        title: teaser.map(|t| t.title.clone()),
        tagline: teaser.and_then(|t| t.tagline.clone()),
        summary: teaser.map(|t| t.summary.clone()),
        highlights: teaser.map(|t| t.highlights.clone()).unwrap_or_default(),
        industry: company.map(|c| c.industry),
        company_size: company.map(|c| c.company_size),
        headquarters: company.map(|c| c.headquarters.clone()),
        founded_year: company.map(|c| c.founded_year),
        revenue_range: revenue_bucket(
            proposal.financial_info.as_ref().map(|f| f.annual_revenue),
        ),
        view_count: proposal.view_count,
        created_at: proposal.created_at,
    })
}
