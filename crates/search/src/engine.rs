//! Search engine
//!
//! Visibility-bounded queries over the proposal store with projection at
//! the caller's information level, plus a relevance-scored full-text
//! variant.

use crate::filters::{visibility_baseline, SearchFilters};
use crate::pagination::{PageInfo, PageWindow};
use crate::projection::{project, ProposalView};
use dealbridge_common::auth::Identity;
use dealbridge_common::config::SearchConfig;
use dealbridge_common::domain::Proposal;
use dealbridge_common::errors::Result;
use dealbridge_common::metrics::record_search;
use dealbridge_common::store::{ProposalFilter, ProposalStore, QuerySpec};
use dealbridge_lifecycle::PermissionResolver;
use serde::Serialize;
use std::sync::Arc;
use std::time::Instant;

/// Relevance weight for a company-name match
const WEIGHT_COMPANY_NAME: f64 = 2.0;

/// Relevance weight for an industry match
const WEIGHT_INDUSTRY: f64 = 1.5;

/// Relevance weight for a business-overview match
const WEIGHT_OVERVIEW: f64 = 1.0;

/// One page of search results
#[derive(Debug, Serialize)]
pub struct SearchResults {
    pub items: Vec<ProposalView>,
    pub total_count: u64,
    pub page_info: PageInfo,
    /// Echo of the filters that produced this page
    pub applied_filters: SearchFilters,
}

/// A relevance-scored full-text hit
#[derive(Debug, Serialize)]
pub struct ScoredResult {
    pub item: ProposalView,
    pub score: f64,
    pub matched_fields: Vec<&'static str>,
}

/// Search front door
pub struct SearchEngine<S> {
    store: Arc<S>,
    resolver: PermissionResolver,
    limits: SearchConfig,
}

impl<S: ProposalStore> SearchEngine<S> {
    pub fn new(store: Arc<S>, resolver: PermissionResolver, limits: SearchConfig) -> Self {
        Self {
            store,
            resolver,
            limits,
        }
    }

    /// Filtered, sorted, paginated search within the caller's visibility
    pub async fn search(
        &self,
        filters: SearchFilters,
        caller: Option<&Identity>,
    ) -> Result<SearchResults> {
        filters.validate()?;
        let started = Instant::now();

        let window = PageWindow::resolve_with(
            filters.page,
            filters.page_size,
            self.limits.default_page_size,
            self.limits.max_page_size,
        );
        let spec = QuerySpec {
            filter: filters.to_store_filter(caller),
            sort: filters.sort_spec(),
            skip: window.skip(),
            limit: window.page_size,
        };

        let (proposals, total_count) = self.store.query(&spec).await?;
        let items: Vec<ProposalView> = proposals
            .into_iter()
            .map(|p| {
                let caps = self.resolver.resolve(&p, caller);
                project(p, &caps)
            })
            .collect();

        record_search(started.elapsed().as_secs_f64(), "filtered", items.len());

        Ok(SearchResults {
            page_info: PageInfo::new(window, total_count),
            total_count,
            items,
            applied_filters: filters,
        })
    }

    /// Relevance-scored keyword search within the caller's visibility.
    ///
    /// Weights: company name 2.0, industry 1.5, business overview 1.0,
    /// summed per matched term.
    pub async fn full_text_search(
        &self,
        keywords: &str,
        limit: usize,
        caller: Option<&Identity>,
    ) -> Result<Vec<ScoredResult>> {
        let started = Instant::now();
        let spec = QuerySpec {
            filter: ProposalFilter {
                statuses: visibility_baseline(caller),
                ..Default::default()
            },
            ..Default::default()
        };
        let (candidates, _) = self.store.query(&spec).await?;

        let terms: Vec<String> = keywords
            .split_whitespace()
            .map(|t| t.to_lowercase())
            .collect();

        let mut hits: Vec<ScoredResult> = candidates
            .into_iter()
            .filter_map(|p| {
                let (score, matched_fields) = relevance(&p, &terms);
                if score <= 0.0 {
                    return None;
                }
                let caps = self.resolver.resolve(&p, caller);
                Some(ScoredResult {
                    item: project(p, &caps),
                    score,
                    matched_fields,
                })
            })
            .collect();

        hits.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        hits.truncate(limit);

        record_search(started.elapsed().as_secs_f64(), "full_text", hits.len());
        Ok(hits)
    }
}

fn relevance(proposal: &Proposal, terms: &[String]) -> (f64, Vec<&'static str>) {
    let company_name = proposal
        .company_info
        .as_ref()
        .map(|c| c.company_name.to_lowercase());
    let industry = proposal.company_info.as_ref().map(|c| c.industry.label());
    let overview = proposal
        .teaser_content
        .as_ref()
        .map(|t| t.summary.to_lowercase());

    let mut score = 0.0;
    let mut matched = Vec::new();
    for term in terms {
        if company_name.as_deref().is_some_and(|n| n.contains(term)) {
            score += WEIGHT_COMPANY_NAME;
            if !matched.contains(&"company_name") {
                matched.push("company_name");
            }
        }
        if industry.is_some_and(|i| i.contains(term.as_str())) {
            score += WEIGHT_INDUSTRY;
            if !matched.contains(&"industry") {
                matched.push("industry");
            }
        }
        if overview.as_deref().is_some_and(|o| o.contains(term)) {
            score += WEIGHT_OVERVIEW;
            if !matched.contains(&"business_overview") {
                matched.push("business_overview");
            }
        }
    }
    (score, matched)
}

#[cfg(test)]
mod tests {
    use super::*;
    use dealbridge_common::auth::Role;
    use dealbridge_common::domain::{
        CompanyInfo, CompanySize, FinancialInfo, Industry, ProposalStatus, TeaserContent,
    };
    use dealbridge_common::store::MemoryProposalStore;
    use uuid::Uuid;

    fn identity(role: Role) -> Identity {
        Identity {
            id: Uuid::new_v4(),
            role,
            is_active: true,
            request_id: "test".into(),
        }
    }

    fn listed(
        name: &str,
        industry: Industry,
        revenue: i64,
        status: ProposalStatus,
    ) -> Proposal {
        let mut p = Proposal::new(Uuid::new_v4());
        p.status = status;
        p.company_info = Some(CompanyInfo {
            company_name: name.into(),
            industry,
            sub_industry: None,
            founded_year: 2010,
            headquarters: "Osaka".into(),
            employee_count: 50,
            company_size: CompanySize::Medium,
            website: None,
        });
        p.financial_info = Some(FinancialInfo {
            annual_revenue: revenue,
            net_profit: revenue / 10,
            profit_margin: None,
            growth_rate: None,
            asking_price: None,
        });
        p.teaser_content = Some(TeaserContent {
            title: format!("{name} for sale"),
            tagline: None,
            summary: format!("{name} runs an automation platform"),
            highlights: vec!["a".into(), "b".into(), "c".into()],
            revenue_range: None,
        });
        p
    }

    async fn engine_with(
        proposals: Vec<Proposal>,
    ) -> SearchEngine<MemoryProposalStore> {
        let store = Arc::new(MemoryProposalStore::new());
        for p in &proposals {
            store.insert(p).await.unwrap();
        }
        SearchEngine::new(store, PermissionResolver::default(), SearchConfig::default())
    }

    #[tokio::test]
    async fn test_visibility_baseline_enforced() {
        let engine = engine_with(vec![
            listed("Alpha", Industry::Technology, 1_000_000, ProposalStatus::Available),
            listed("Beta", Industry::Technology, 1_000_000, ProposalStatus::Sent),
            listed("Gamma", Industry::Technology, 1_000_000, ProposalStatus::Draft),
            listed("Delta", Industry::Technology, 1_000_000, ProposalStatus::UnderReview),
        ])
        .await;

        let anon = engine.search(SearchFilters::default(), None).await.unwrap();
        assert_eq!(anon.total_count, 1);

        let buyer = identity(Role::Buyer);
        let authed = engine
            .search(SearchFilters::default(), Some(&buyer))
            .await
            .unwrap();
        assert_eq!(authed.total_count, 2);
    }

    #[tokio::test]
    async fn test_filters_compose_by_and() {
        let engine = engine_with(vec![
            listed("Alpha", Industry::Technology, 5_000_000, ProposalStatus::Available),
            listed("Beta", Industry::Finance, 5_000_000, ProposalStatus::Available),
            listed("Gamma", Industry::Technology, 500_000, ProposalStatus::Available),
        ])
        .await;

        let filters = SearchFilters {
            industries: vec![Industry::Technology],
            min_revenue: Some(1_000_000),
            ..Default::default()
        };
        let results = engine.search(filters, None).await.unwrap();
        assert_eq!(results.total_count, 1);
        match &results.items[0] {
            ProposalView::Teaser(t) => assert_eq!(t.title.as_deref(), Some("Alpha for sale")),
            other => panic!("expected teaser, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_strangers_get_teaser_projection() {
        let engine = engine_with(vec![listed(
            "Alpha",
            Industry::Technology,
            5_000_000,
            ProposalStatus::Available,
        )])
        .await;

        let buyer = identity(Role::Buyer);
        let results = engine
            .search(SearchFilters::default(), Some(&buyer))
            .await
            .unwrap();
        match &results.items[0] {
            ProposalView::Teaser(t) => assert_eq!(t.revenue_range, "1M - 10M"),
            ProposalView::Full(_) => panic!("stranger should not get full projection"),
        }
    }

    #[tokio::test]
    async fn test_admin_gets_full_projection() {
        let engine = engine_with(vec![listed(
            "Alpha",
            Industry::Technology,
            5_000_000,
            ProposalStatus::Available,
        )])
        .await;

        let admin = identity(Role::Admin);
        let results = engine
            .search(SearchFilters::default(), Some(&admin))
            .await
            .unwrap();
        assert!(matches!(results.items[0], ProposalView::Full(_)));
    }

    #[tokio::test]
    async fn test_pagination_window() {
        let proposals: Vec<Proposal> = (0..25)
            .map(|i| {
                listed(
                    &format!("Company{i}"),
                    Industry::Retail,
                    1_000_000,
                    ProposalStatus::Available,
                )
            })
            .collect();
        let engine = engine_with(proposals).await;

        let filters = SearchFilters {
            page: Some(3),
            page_size: Some(10),
            ..Default::default()
        };
        let results = engine.search(filters, None).await.unwrap();
        assert_eq!(results.items.len(), 5);
        assert_eq!(results.page_info.total_pages, 3);
        assert!(!results.page_info.has_next);
        assert!(results.page_info.has_prev);
    }

    #[tokio::test]
    async fn test_configured_page_limits_apply() {
        let store = Arc::new(MemoryProposalStore::new());
        for i in 0..12 {
            store
                .insert(&listed(
                    &format!("Company{i}"),
                    Industry::Retail,
                    1_000_000,
                    ProposalStatus::Available,
                ))
                .await
                .unwrap();
        }
        let engine = SearchEngine::new(
            store,
            PermissionResolver::default(),
            SearchConfig {
                default_page_size: 5,
                max_page_size: 8,
            },
        );

        // unspecified page size falls back to the configured default
        let results = engine.search(SearchFilters::default(), None).await.unwrap();
        assert_eq!(results.items.len(), 5);
        assert_eq!(results.page_info.page_size, 5);

        // oversized requests clamp to the configured maximum
        let filters = SearchFilters {
            page_size: Some(500),
            ..Default::default()
        };
        let results = engine.search(filters, None).await.unwrap();
        assert_eq!(results.items.len(), 8);
        assert_eq!(results.page_info.page_size, 8);
    }

    #[tokio::test]
    async fn test_full_text_weights() {
        let engine = engine_with(vec![
            listed("Quantum Robotics", Industry::Technology, 1_000_000, ProposalStatus::Available),
            listed("Plain Retailer", Industry::Retail, 1_000_000, ProposalStatus::Available),
        ])
        .await;

        // "quantum" hits both the company name (x2) and the overview (x1)
        let hits = engine.full_text_search("quantum", 10, None).await.unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].score, 3.0);
        assert_eq!(hits[0].matched_fields, vec!["company_name", "business_overview"]);

        // industry-only match scores 1.5
        let hits = engine.full_text_search("retail", 10, None).await.unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].score, 1.5);

        let none = engine.full_text_search("bakery", 10, None).await.unwrap();
        assert!(none.is_empty());
    }

    #[tokio::test]
    async fn test_full_text_respects_visibility() {
        let engine = engine_with(vec![listed(
            "Hidden Gem",
            Industry::Technology,
            1_000_000,
            ProposalStatus::Draft,
        )])
        .await;

        let hits = engine.full_text_search("hidden", 10, None).await.unwrap();
        assert!(hits.is_empty());
    }
}
