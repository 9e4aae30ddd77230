//! In-memory proposal store
//!
//! Honors the same version-guard contract as the Postgres backend. Used by
//! unit tests and local development; not intended for multi-process
//! deployments.

use super::{
    ContentPatch, Counter, DateRange, IndustryCount, LifecycleStamp, ProposalStore, QuerySpec,
    ReviewEfficiency, ReviewHistoryEntry, SortKey, SortOrder, StatusCount,
};
use crate::domain::{Industry, Proposal, ProposalStatus, ReviewRecord};
use crate::errors::{AppError, Result};
use async_trait::async_trait;
use chrono::Utc;
use std::cmp::Ordering;
use std::collections::HashMap;
use tokio::sync::RwLock;
use uuid::Uuid;

/// RwLock-backed store keyed by proposal id
#[derive(Default)]
pub struct MemoryProposalStore {
    proposals: RwLock<HashMap<Uuid, Proposal>>,
}

impl MemoryProposalStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn compare(a: &Proposal, b: &Proposal, key: SortKey) -> Ordering {
        match key {
            SortKey::CreatedAt => a.created_at.cmp(&b.created_at),
            SortKey::UpdatedAt => a.updated_at.cmp(&b.updated_at),
            SortKey::ViewCount => a.view_count.cmp(&b.view_count),
            SortKey::Revenue => {
                let ra = a.financial_info.as_ref().map(|f| f.annual_revenue);
                let rb = b.financial_info.as_ref().map(|f| f.annual_revenue);
                ra.cmp(&rb)
            }
            SortKey::CompanyName => {
                let na = a.company_info.as_ref().map(|c| c.company_name.to_lowercase());
                let nb = b.company_info.as_ref().map(|c| c.company_name.to_lowercase());
                na.cmp(&nb)
            }
        }
    }

    fn is_decision(record: &ReviewRecord) -> bool {
        matches!(
            record.to_status,
            ProposalStatus::Approved | ProposalStatus::Rejected
        )
    }
}

#[async_trait]
impl ProposalStore for MemoryProposalStore {
    async fn insert(&self, proposal: &Proposal) -> Result<Uuid> {
        let mut map = self.proposals.write().await;
        map.insert(proposal.id, proposal.clone());
        Ok(proposal.id)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Proposal>> {
        let map = self.proposals.read().await;
        Ok(map.get(&id).cloned())
    }

    async fn update_content(
        &self,
        id: Uuid,
        expected_version: i64,
        patch: ContentPatch,
    ) -> Result<Proposal> {
        let mut map = self.proposals.write().await;
        let proposal = map
            .get_mut(&id)
            .ok_or_else(|| AppError::ProposalNotFound { id: id.to_string() })?;

        if proposal.version != expected_version {
            return Err(AppError::VersionConflict {
                id: id.to_string(),
                expected: expected_version,
            });
        }

        if let Some(company) = patch.company_info {
            proposal.company_info = Some(company);
        }
        if let Some(financial) = patch.financial_info {
            proposal.financial_info = Some(financial);
        }
        if let Some(model) = patch.business_model {
            proposal.business_model = Some(model);
        }
        if let Some(teaser) = patch.teaser_content {
            proposal.teaser_content = Some(teaser);
        }
        if let Some(full) = patch.full_content {
            proposal.full_content = Some(full);
        }
        if let Some(files) = patch.attached_files {
            proposal.attached_files = files;
        }

        proposal.version += 1;
        proposal.updated_at = Utc::now();
        Ok(proposal.clone())
    }

    async fn apply_transition(
        &self,
        id: Uuid,
        expected_version: i64,
        to: ProposalStatus,
        record: ReviewRecord,
        stamp: Option<LifecycleStamp>,
    ) -> Result<Proposal> {
        let mut map = self.proposals.write().await;
        let proposal = map
            .get_mut(&id)
            .ok_or_else(|| AppError::ProposalNotFound { id: id.to_string() })?;

        if proposal.version != expected_version {
            return Err(AppError::VersionConflict {
                id: id.to_string(),
                expected: expected_version,
            });
        }

        let now = record.timestamp;
        if to == ProposalStatus::Rejected {
            proposal.rejection_reason = record.comment.clone();
        }
        match stamp {
            Some(LifecycleStamp::Submitted) => proposal.submitted_at = Some(now),
            Some(LifecycleStamp::Approved) => proposal.approved_at = Some(now),
            Some(LifecycleStamp::Published) => proposal.published_at = Some(now),
            None => {}
        }

        proposal.status = to;
        proposal.version += 1;
        proposal.updated_at = Utc::now();
        proposal.review_records.push(record);
        Ok(proposal.clone())
    }

    async fn delete(&self, id: Uuid) -> Result<bool> {
        let mut map = self.proposals.write().await;
        Ok(map.remove(&id).is_some())
    }

    async fn increment_counter(&self, id: Uuid, counter: Counter, delta: i64) -> Result<()> {
        let mut map = self.proposals.write().await;
        let proposal = map
            .get_mut(&id)
            .ok_or_else(|| AppError::ProposalNotFound { id: id.to_string() })?;

        match counter {
            Counter::Views => proposal.view_count += delta,
            Counter::Sent => proposal.sent_count += delta,
            Counter::Interest => proposal.interest_count += delta,
        }
        Ok(())
    }

    async fn query(&self, spec: &QuerySpec) -> Result<(Vec<Proposal>, u64)> {
        let map = self.proposals.read().await;
        let mut matched: Vec<Proposal> = map
            .values()
            .filter(|p| spec.filter.matches(p))
            .cloned()
            .collect();
        let total = matched.len() as u64;

        matched.sort_by(|a, b| {
            let ord = Self::compare(a, b, spec.sort.key);
            match spec.sort.order {
                SortOrder::Asc => ord,
                SortOrder::Desc => ord.reverse(),
            }
        });

        let skipped = matched.into_iter().skip(spec.skip as usize);
        let items: Vec<Proposal> = if spec.limit == 0 {
            skipped.collect()
        } else {
            skipped.take(spec.limit as usize).collect()
        };

        Ok((items, total))
    }

    async fn status_counts(&self, range: &DateRange) -> Result<Vec<StatusCount>> {
        let map = self.proposals.read().await;
        let mut buckets: HashMap<ProposalStatus, (u64, i64)> = HashMap::new();
        for p in map.values().filter(|p| range.contains(p.created_at)) {
            let entry = buckets.entry(p.status).or_insert((0, 0));
            entry.0 += 1;
            entry.1 += p.view_count;
        }

        let mut counts: Vec<StatusCount> = buckets
            .into_iter()
            .map(|(status, (count, views))| StatusCount {
                status,
                count,
                avg_view_count: views as f64 / count as f64,
            })
            .collect();
        counts.sort_by(|a, b| b.count.cmp(&a.count));
        Ok(counts)
    }

    async fn industry_distribution(
        &self,
        range: &DateRange,
        limit: usize,
    ) -> Result<Vec<IndustryCount>> {
        let map = self.proposals.read().await;
        let mut buckets: HashMap<Industry, u64> = HashMap::new();
        for p in map.values().filter(|p| range.contains(p.created_at)) {
            if let Some(ref company) = p.company_info {
                *buckets.entry(company.industry).or_insert(0) += 1;
            }
        }

        let mut counts: Vec<IndustryCount> = buckets
            .into_iter()
            .map(|(industry, count)| IndustryCount { industry, count })
            .collect();
        counts.sort_by(|a, b| b.count.cmp(&a.count));
        counts.truncate(limit);
        Ok(counts)
    }

    async fn review_efficiency(&self, range: &DateRange) -> Result<ReviewEfficiency> {
        let map = self.proposals.read().await;
        let mut per_reviewer: HashMap<Uuid, u64> = HashMap::new();
        let mut total_hours = 0.0_f64;
        let mut timed_reviews = 0u64;

        for p in map.values() {
            for record in p.review_records.iter().filter(|r| Self::is_decision(r)) {
                if !range.contains(record.timestamp) {
                    continue;
                }
                *per_reviewer.entry(record.operator_id).or_insert(0) += 1;
                let elapsed = record.timestamp - p.created_at;
                total_hours += elapsed.num_seconds() as f64 / 3600.0;
                timed_reviews += 1;
            }
        }

        let total_reviews: u64 = per_reviewer.values().sum();
        let total_reviewers = per_reviewer.len() as u64;
        Ok(ReviewEfficiency {
            total_reviewers,
            total_reviews,
            avg_reviews_per_reviewer: if total_reviewers > 0 {
                total_reviews as f64 / total_reviewers as f64
            } else {
                0.0
            },
            avg_review_hours: (timed_reviews > 0).then(|| total_hours / timed_reviews as f64),
        })
    }

    async fn review_history(
        &self,
        range: &DateRange,
        operator_id: Option<Uuid>,
    ) -> Result<Vec<ReviewHistoryEntry>> {
        let map = self.proposals.read().await;
        let mut entries: Vec<ReviewHistoryEntry> = Vec::new();

        for p in map.values() {
            for record in p.review_records.iter().filter(|r| Self::is_decision(r)) {
                if !range.contains(record.timestamp) {
                    continue;
                }
                if operator_id.is_some_and(|op| record.operator_id != op) {
                    continue;
                }
                entries.push(ReviewHistoryEntry {
                    proposal_id: p.id,
                    company_name: p.company_info.as_ref().map(|c| c.company_name.clone()),
                    current_status: p.status,
                    record: record.clone(),
                });
            }
        }

        entries.sort_by(|a, b| b.record.timestamp.cmp(&a.record.timestamp));
        Ok(entries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::ProposalFilter;

    fn draft() -> Proposal {
        Proposal::new(Uuid::new_v4())
    }

    #[tokio::test]
    async fn test_insert_and_find() {
        let store = MemoryProposalStore::new();
        let p = draft();
        let id = store.insert(&p).await.unwrap();
        assert_eq!(id, p.id);

        let found = store.find_by_id(id).await.unwrap().unwrap();
        assert_eq!(found.version, 1);
        assert!(store.find_by_id(Uuid::new_v4()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_stale_version_never_applies() {
        let store = MemoryProposalStore::new();
        let p = draft();
        store.insert(&p).await.unwrap();

        let record = ReviewRecord::for_transition(
            ProposalStatus::Draft,
            ProposalStatus::UnderReview,
            Uuid::new_v4(),
            None,
            serde_json::Value::Null,
        );
        let err = store
            .apply_transition(p.id, 99, ProposalStatus::UnderReview, record, None)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::VersionConflict { .. }));

        let unchanged = store.find_by_id(p.id).await.unwrap().unwrap();
        assert_eq!(unchanged.status, ProposalStatus::Draft);
        assert_eq!(unchanged.version, 1);
        assert!(unchanged.review_records.is_empty());
    }

    #[tokio::test]
    async fn test_transition_is_atomic_and_bumps_version() {
        let store = MemoryProposalStore::new();
        let p = draft();
        store.insert(&p).await.unwrap();

        let record = ReviewRecord::for_transition(
            ProposalStatus::Draft,
            ProposalStatus::UnderReview,
            p.creator_id,
            Some("submitting".into()),
            serde_json::Value::Null,
        );
        let updated = store
            .apply_transition(
                p.id,
                1,
                ProposalStatus::UnderReview,
                record,
                Some(LifecycleStamp::Submitted),
            )
            .await
            .unwrap();

        assert_eq!(updated.status, ProposalStatus::UnderReview);
        assert_eq!(updated.version, 2);
        assert_eq!(updated.review_records.len(), 1);
        assert!(updated.submitted_at.is_some());
    }

    #[tokio::test]
    async fn test_counter_increment_does_not_bump_version() {
        let store = MemoryProposalStore::new();
        let p = draft();
        store.insert(&p).await.unwrap();

        store.increment_counter(p.id, Counter::Views, 1).await.unwrap();
        store.increment_counter(p.id, Counter::Views, 1).await.unwrap();

        let found = store.find_by_id(p.id).await.unwrap().unwrap();
        assert_eq!(found.view_count, 2);
        assert_eq!(found.version, 1);
    }

    #[tokio::test]
    async fn test_query_pagination_window() {
        let store = MemoryProposalStore::new();
        for _ in 0..5 {
            store.insert(&draft()).await.unwrap();
        }

        let spec = QuerySpec {
            filter: ProposalFilter::default(),
            skip: 2,
            limit: 2,
            ..Default::default()
        };
        let (items, total) = store.query(&spec).await.unwrap();
        assert_eq!(total, 5);
        assert_eq!(items.len(), 2);
    }
}
