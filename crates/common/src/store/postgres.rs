//! Postgres-backed proposal store
//!
//! One row per proposal; content blocks, attachments and the review trail
//! live in JSONB columns. Version-guarded mutations are single UPDATE
//! statements so the atomicity contract holds without explicit
//! transactions.

use super::{
    ContentPatch, Counter, DateRange, IndustryCount, LifecycleStamp, ProposalStore, QuerySpec,
    ReviewEfficiency, ReviewHistoryEntry, SortKey, SortOrder, StatusCount,
};
use crate::config::DatabaseConfig;
use crate::domain::{Industry, Proposal, ProposalStatus, ReviewRecord};
use crate::errors::{AppError, Result};
use async_trait::async_trait;
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ConnectOptions, ConnectionTrait, Database, DatabaseConnection, DbBackend,
    EntityTrait, FromQueryResult, Set, Statement,
};
use serde::Serialize;
use std::time::Duration;
use tracing::info;
use uuid::Uuid;

/// Database connection pool wrapper
#[derive(Clone)]
pub struct DbPool {
    /// Primary connection (for writes)
    pub primary: DatabaseConnection,

    /// Read replica connection (optional)
    pub replica: Option<DatabaseConnection>,
}

impl DbPool {
    /// Create a new database pool from configuration
    pub async fn new(config: &DatabaseConfig) -> Result<Self> {
        info!("Connecting to primary database...");

        let primary = Database::connect(Self::options(&config.url, config))
            .await
            .map_err(|e| AppError::DatabaseConnection {
                message: format!("Failed to connect to primary: {}", e),
            })?;

        let replica = if let Some(ref read_url) = config.read_url {
            info!("Connecting to read replica...");
            let conn = Database::connect(Self::options(read_url, config))
                .await
                .map_err(|e| AppError::DatabaseConnection {
                    message: format!("Failed to connect to replica: {}", e),
                })?;
            Some(conn)
        } else {
            None
        };

        info!("Database connections established");
        Ok(Self { primary, replica })
    }

    fn options(url: &str, config: &DatabaseConfig) -> ConnectOptions {
        let mut opts = ConnectOptions::new(url);
        opts.max_connections(config.max_connections)
            .min_connections(config.min_connections)
            .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
            .idle_timeout(Duration::from_secs(config.idle_timeout_secs))
            .sqlx_logging(true);
        opts
    }

    /// Connection for reads (replica if available, otherwise primary)
    pub fn read(&self) -> &DatabaseConnection {
        self.replica.as_ref().unwrap_or(&self.primary)
    }

    /// Connection for writes (always primary)
    pub fn write(&self) -> &DatabaseConnection {
        &self.primary
    }

    /// Ping the database to check connectivity
    pub async fn ping(&self) -> Result<()> {
        self.primary
            .execute_unprepared("SELECT 1")
            .await
            .map_err(|e| AppError::DatabaseConnection {
                message: format!("Primary ping failed: {}", e),
            })?;

        if let Some(ref replica) = self.replica {
            replica
                .execute_unprepared("SELECT 1")
                .await
                .map_err(|e| AppError::DatabaseConnection {
                    message: format!("Replica ping failed: {}", e),
                })?;
        }
        Ok(())
    }
}

mod entity {
    use sea_orm::entity::prelude::*;
    use serde::{Deserialize, Serialize};

    #[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
    #[sea_orm(table_name = "proposals")]
    pub struct Model {
        #[sea_orm(primary_key, auto_increment = false)]
        pub id: Uuid,

        pub creator_id: Uuid,

        #[sea_orm(column_type = "Text")]
        pub status: String,

        pub version: i64,

        #[sea_orm(column_type = "JsonBinary", nullable)]
        pub company_info: Option<Json>,

        #[sea_orm(column_type = "JsonBinary", nullable)]
        pub financial_info: Option<Json>,

        #[sea_orm(column_type = "JsonBinary", nullable)]
        pub business_model: Option<Json>,

        #[sea_orm(column_type = "JsonBinary", nullable)]
        pub teaser_content: Option<Json>,

        #[sea_orm(column_type = "JsonBinary", nullable)]
        pub full_content: Option<Json>,

        #[sea_orm(column_type = "JsonBinary")]
        pub attached_files: Json,

        /// Append-only audit trail; only ever grown via `|| $n::jsonb`
        #[sea_orm(column_type = "JsonBinary")]
        pub review_records: Json,

        #[sea_orm(column_type = "Text", nullable)]
        pub rejection_reason: Option<String>,

        pub view_count: i64,
        pub sent_count: i64,
        pub interest_count: i64,

        pub submitted_at: Option<DateTimeWithTimeZone>,
        pub approved_at: Option<DateTimeWithTimeZone>,
        pub published_at: Option<DateTimeWithTimeZone>,

        pub created_at: DateTimeWithTimeZone,
        pub updated_at: DateTimeWithTimeZone,
    }

    #[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
    pub enum Relation {}

    impl ActiveModelBehavior for ActiveModel {}
}

fn block_to_json<T: Serialize>(block: &Option<T>) -> Result<Option<serde_json::Value>> {
    block
        .as_ref()
        .map(|b| serde_json::to_value(b).map_err(Into::into))
        .transpose()
}

fn block_from_json<T: serde::de::DeserializeOwned>(
    json: Option<serde_json::Value>,
) -> Result<Option<T>> {
    json.map(serde_json::from_value).transpose().map_err(Into::into)
}

fn to_domain(m: entity::Model) -> Result<Proposal> {
    let status = ProposalStatus::parse(&m.status).ok_or_else(|| AppError::Internal {
        message: format!("Unknown status in storage: {}", m.status),
    })?;

    Ok(Proposal {
        id: m.id,
        creator_id: m.creator_id,
        status,
        version: m.version,
        company_info: block_from_json(m.company_info)?,
        financial_info: block_from_json(m.financial_info)?,
        business_model: block_from_json(m.business_model)?,
        teaser_content: block_from_json(m.teaser_content)?,
        full_content: block_from_json(m.full_content)?,
        attached_files: serde_json::from_value(m.attached_files)?,
        review_records: serde_json::from_value(m.review_records)?,
        rejection_reason: m.rejection_reason,
        view_count: m.view_count,
        sent_count: m.sent_count,
        interest_count: m.interest_count,
        submitted_at: m.submitted_at.map(|t| t.with_timezone(&Utc)),
        approved_at: m.approved_at.map(|t| t.with_timezone(&Utc)),
        published_at: m.published_at.map(|t| t.with_timezone(&Utc)),
        created_at: m.created_at.with_timezone(&Utc),
        updated_at: m.updated_at.with_timezone(&Utc),
    })
}

/// Serde wire string for unit enums (industry, company size)
fn wire<T: Serialize>(value: &T) -> Result<String> {
    match serde_json::to_value(value)? {
        serde_json::Value::String(s) => Ok(s),
        other => Err(AppError::Internal {
            message: format!("Expected string encoding, got {}", other),
        }),
    }
}

/// Incremental builder for positional-parameter SQL
#[derive(Default)]
struct SqlParams {
    values: Vec<sea_orm::Value>,
}

impl SqlParams {
    /// Bind a value and return its `$n` placeholder
    fn bind(&mut self, value: impl Into<sea_orm::Value>) -> String {
        self.values.push(value.into());
        format!("${}", self.values.len())
    }
}

/// Translate a filter into WHERE clauses, one clause per filter field
fn filter_clauses(
    filter: &super::ProposalFilter,
    params: &mut SqlParams,
) -> Result<Vec<String>> {
    let mut clauses = Vec::new();

    if !filter.statuses.is_empty() {
        let placeholders: Vec<String> = filter
            .statuses
            .iter()
            .map(|s| params.bind(s.as_str()))
            .collect();
        clauses.push(format!("status IN ({})", placeholders.join(", ")));
    }
    if let Some(creator) = filter.creator_id {
        let p = params.bind(creator);
        clauses.push(format!("creator_id = {}", p));
    }
    if let Some(ref keyword) = filter.keyword {
        let p = params.bind(format!("%{}%", keyword));
        clauses.push(format!(
            "(company_info->>'company_name' ILIKE {p} \
             OR company_info->>'industry' ILIKE {p} \
             OR teaser_content->>'title' ILIKE {p} \
             OR teaser_content->>'summary' ILIKE {p})"
        ));
    }
    if !filter.industries.is_empty() {
        let placeholders = filter
            .industries
            .iter()
            .map(|i| Ok(params.bind(wire(i)?)))
            .collect::<Result<Vec<String>>>()?;
        clauses.push(format!(
            "company_info->>'industry' IN ({})",
            placeholders.join(", ")
        ));
    }
    if !filter.company_sizes.is_empty() {
        let placeholders = filter
            .company_sizes
            .iter()
            .map(|s| Ok(params.bind(wire(s)?)))
            .collect::<Result<Vec<String>>>()?;
        clauses.push(format!(
            "company_info->>'company_size' IN ({})",
            placeholders.join(", ")
        ));
    }
    if let Some(min) = filter.min_revenue {
        let p = params.bind(min);
        clauses.push(format!("(financial_info->>'annual_revenue')::bigint >= {}", p));
    }
    if let Some(max) = filter.max_revenue {
        let p = params.bind(max);
        clauses.push(format!("(financial_info->>'annual_revenue')::bigint <= {}", p));
    }
    if !filter.locations.is_empty() {
        let alternatives: Vec<String> = filter
            .locations
            .iter()
            .map(|loc| {
                let p = params.bind(format!("%{}%", loc));
                format!("company_info->>'headquarters' ILIKE {}", p)
            })
            .collect();
        clauses.push(format!("({})", alternatives.join(" OR ")));
    }
    if let Some(min) = filter.min_founded_year {
        let p = params.bind(min);
        clauses.push(format!("(company_info->>'founded_year')::int >= {}", p));
    }
    if let Some(max) = filter.max_founded_year {
        let p = params.bind(max);
        clauses.push(format!("(company_info->>'founded_year')::int <= {}", p));
    }
    if let Some(from) = filter.created_from {
        let p = params.bind(from);
        clauses.push(format!("created_at >= {}", p));
    }
    if let Some(to) = filter.created_to {
        let p = params.bind(to);
        clauses.push(format!("created_at <= {}", p));
    }

    Ok(clauses)
}

fn where_sql(clauses: &[String]) -> String {
    if clauses.is_empty() {
        String::new()
    } else {
        format!("WHERE {}", clauses.join(" AND "))
    }
}

fn sort_expr(key: SortKey) -> &'static str {
    match key {
        SortKey::CreatedAt => "created_at",
        SortKey::UpdatedAt => "updated_at",
        SortKey::ViewCount => "view_count",
        SortKey::Revenue => "(financial_info->>'annual_revenue')::bigint",
        SortKey::CompanyName => "lower(company_info->>'company_name')",
    }
}

fn date_clauses(range: &DateRange, column: &str, params: &mut SqlParams) -> Vec<String> {
    let mut clauses = Vec::new();
    if let Some(from) = range.from {
        let p = params.bind(from);
        clauses.push(format!("{} >= {}", column, p));
    }
    if let Some(to) = range.to {
        let p = params.bind(to);
        clauses.push(format!("{} <= {}", column, p));
    }
    clauses
}

/// Postgres implementation of the store contract
#[derive(Clone)]
pub struct PgProposalStore {
    pool: DbPool,
}

impl PgProposalStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    pub async fn ping(&self) -> Result<()> {
        self.pool.ping().await
    }

    /// Distinguish "row is gone" from "row moved on" after a guarded
    /// UPDATE touched zero rows
    async fn conflict_or_missing(&self, id: Uuid, expected_version: i64) -> AppError {
        match entity::Entity::find_by_id(id).one(self.pool.write()).await {
            Ok(Some(_)) => AppError::VersionConflict {
                id: id.to_string(),
                expected: expected_version,
            },
            Ok(None) => AppError::ProposalNotFound { id: id.to_string() },
            Err(e) => e.into(),
        }
    }
}

#[async_trait]
impl ProposalStore for PgProposalStore {
    async fn insert(&self, proposal: &Proposal) -> Result<Uuid> {
        let model = entity::ActiveModel {
            id: Set(proposal.id),
            creator_id: Set(proposal.creator_id),
            status: Set(proposal.status.as_str().to_string()),
            version: Set(proposal.version),
            company_info: Set(block_to_json(&proposal.company_info)?),
            financial_info: Set(block_to_json(&proposal.financial_info)?),
            business_model: Set(block_to_json(&proposal.business_model)?),
            teaser_content: Set(block_to_json(&proposal.teaser_content)?),
            full_content: Set(block_to_json(&proposal.full_content)?),
            attached_files: Set(serde_json::to_value(&proposal.attached_files)?),
            review_records: Set(serde_json::to_value(&proposal.review_records)?),
            rejection_reason: Set(proposal.rejection_reason.clone()),
            view_count: Set(proposal.view_count),
            sent_count: Set(proposal.sent_count),
            interest_count: Set(proposal.interest_count),
            submitted_at: Set(proposal.submitted_at.map(Into::into)),
            approved_at: Set(proposal.approved_at.map(Into::into)),
            published_at: Set(proposal.published_at.map(Into::into)),
            created_at: Set(proposal.created_at.into()),
            updated_at: Set(proposal.updated_at.into()),
        };

        model.insert(self.pool.write()).await?;
        Ok(proposal.id)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Proposal>> {
        entity::Entity::find_by_id(id)
            .one(self.pool.read())
            .await?
            .map(to_domain)
            .transpose()
    }

    async fn update_content(
        &self,
        id: Uuid,
        expected_version: i64,
        patch: ContentPatch,
    ) -> Result<Proposal> {
        let mut params = SqlParams::default();
        let id_param = params.bind(id);
        let version_param = params.bind(expected_version);

        let mut sets = vec!["version = version + 1".to_string(), "updated_at = NOW()".to_string()];
        if let Some(json) = block_to_json(&patch.company_info)? {
            let p = params.bind(json);
            sets.push(format!("company_info = {}", p));
        }
        if let Some(json) = block_to_json(&patch.financial_info)? {
            let p = params.bind(json);
            sets.push(format!("financial_info = {}", p));
        }
        if let Some(json) = block_to_json(&patch.business_model)? {
            let p = params.bind(json);
            sets.push(format!("business_model = {}", p));
        }
        if let Some(json) = block_to_json(&patch.teaser_content)? {
            let p = params.bind(json);
            sets.push(format!("teaser_content = {}", p));
        }
        if let Some(json) = block_to_json(&patch.full_content)? {
            let p = params.bind(json);
            sets.push(format!("full_content = {}", p));
        }
        if let Some(ref files) = patch.attached_files {
            let p = params.bind(serde_json::to_value(files)?);
            sets.push(format!("attached_files = {}", p));
        }

        let sql = format!(
            "UPDATE proposals SET {} WHERE id = {} AND version = {} RETURNING *",
            sets.join(", "),
            id_param,
            version_param,
        );
        let stmt = Statement::from_sql_and_values(DbBackend::Postgres, &sql, params.values);

        match self.pool.write().query_one(stmt).await? {
            Some(row) => to_domain(entity::Model::from_query_result(&row, "")?),
            None => Err(self.conflict_or_missing(id, expected_version).await),
        }
    }

    async fn apply_transition(
        &self,
        id: Uuid,
        expected_version: i64,
        to: ProposalStatus,
        record: ReviewRecord,
        stamp: Option<LifecycleStamp>,
    ) -> Result<Proposal> {
        let mut params = SqlParams::default();
        let id_param = params.bind(id);
        let version_param = params.bind(expected_version);
        let status_param = params.bind(to.as_str());
        let record_param = params.bind(serde_json::to_value(&record)?);

        let mut sets = vec![
            format!("status = {}", status_param),
            "version = version + 1".to_string(),
            "updated_at = NOW()".to_string(),
            format!("review_records = review_records || {}::jsonb", record_param),
        ];
        if to == ProposalStatus::Rejected {
            let p = params.bind(record.comment.clone());
            sets.push(format!("rejection_reason = {}", p));
        }
        if let Some(stamp) = stamp {
            let p = params.bind(record.timestamp);
            sets.push(format!("{} = {}", stamp.column(), p));
        }

        let sql = format!(
            "UPDATE proposals SET {} WHERE id = {} AND version = {} RETURNING *",
            sets.join(", "),
            id_param,
            version_param,
        );
        let stmt = Statement::from_sql_and_values(DbBackend::Postgres, &sql, params.values);

        match self.pool.write().query_one(stmt).await? {
            Some(row) => to_domain(entity::Model::from_query_result(&row, "")?),
            None => Err(self.conflict_or_missing(id, expected_version).await),
        }
    }

    async fn delete(&self, id: Uuid) -> Result<bool> {
        let result = entity::Entity::delete_by_id(id)
            .exec(self.pool.write())
            .await?;
        Ok(result.rows_affected > 0)
    }

    async fn increment_counter(&self, id: Uuid, counter: Counter, delta: i64) -> Result<()> {
        // counter.column() is a static whitelist, safe to interpolate
        let sql = format!(
            "UPDATE proposals SET {col} = {col} + $2 WHERE id = $1",
            col = counter.column()
        );
        let stmt = Statement::from_sql_and_values(
            DbBackend::Postgres,
            &sql,
            vec![id.into(), delta.into()],
        );

        let result = self.pool.write().execute(stmt).await?;
        if result.rows_affected() == 0 {
            return Err(AppError::ProposalNotFound { id: id.to_string() });
        }
        Ok(())
    }

    async fn query(&self, spec: &QuerySpec) -> Result<(Vec<Proposal>, u64)> {
        let mut params = SqlParams::default();
        let clauses = filter_clauses(&spec.filter, &mut params)?;
        let where_part = where_sql(&clauses);

        let count_sql = format!("SELECT COUNT(*)::bigint FROM proposals {}", where_part);
        let count_stmt =
            Statement::from_sql_and_values(DbBackend::Postgres, &count_sql, params.values.clone());
        let total = match self.pool.read().query_one(count_stmt).await? {
            Some(row) => row.try_get_by_index::<i64>(0)? as u64,
            None => 0,
        };

        let order = match spec.sort.order {
            SortOrder::Asc => "ASC",
            SortOrder::Desc => "DESC",
        };
        let mut sql = format!(
            "SELECT * FROM proposals {} ORDER BY {} {}",
            where_part,
            sort_expr(spec.sort.key),
            order,
        );
        if spec.limit > 0 {
            let p = params.bind(spec.limit as i64);
            sql.push_str(&format!(" LIMIT {}", p));
        }
        if spec.skip > 0 {
            let p = params.bind(spec.skip as i64);
            sql.push_str(&format!(" OFFSET {}", p));
        }

        let stmt = Statement::from_sql_and_values(DbBackend::Postgres, &sql, params.values);
        let rows = self.pool.read().query_all(stmt).await?;
        let proposals = rows
            .iter()
            .map(|row| to_domain(entity::Model::from_query_result(row, "")?))
            .collect::<Result<Vec<Proposal>>>()?;

        Ok((proposals, total))
    }

    async fn status_counts(&self, range: &DateRange) -> Result<Vec<StatusCount>> {
        let mut params = SqlParams::default();
        let clauses = date_clauses(range, "created_at", &mut params);
        let sql = format!(
            "SELECT status, COUNT(*)::bigint, AVG(view_count)::float8 \
             FROM proposals {} GROUP BY status ORDER BY 2 DESC",
            where_sql(&clauses),
        );

        let stmt = Statement::from_sql_and_values(DbBackend::Postgres, &sql, params.values);
        let rows = self.pool.read().query_all(stmt).await?;

        let mut counts = Vec::with_capacity(rows.len());
        for row in rows {
            let raw: String = row.try_get_by_index(0)?;
            let status = ProposalStatus::parse(&raw).ok_or_else(|| AppError::Internal {
                message: format!("Unknown status in storage: {}", raw),
            })?;
            counts.push(StatusCount {
                status,
                count: row.try_get_by_index::<i64>(1)? as u64,
                avg_view_count: row.try_get_by_index::<f64>(2)?,
            });
        }
        Ok(counts)
    }

    async fn industry_distribution(
        &self,
        range: &DateRange,
        limit: usize,
    ) -> Result<Vec<IndustryCount>> {
        let mut params = SqlParams::default();
        let mut clauses = date_clauses(range, "created_at", &mut params);
        clauses.push("company_info IS NOT NULL".to_string());
        let limit_param = params.bind(limit as i64);

        let sql = format!(
            "SELECT company_info->>'industry', COUNT(*)::bigint \
             FROM proposals {} GROUP BY 1 ORDER BY 2 DESC LIMIT {}",
            where_sql(&clauses),
            limit_param,
        );

        let stmt = Statement::from_sql_and_values(DbBackend::Postgres, &sql, params.values);
        let rows = self.pool.read().query_all(stmt).await?;

        let mut counts = Vec::with_capacity(rows.len());
        for row in rows {
            let raw: String = row.try_get_by_index(0)?;
            let industry: Industry = serde_json::from_value(serde_json::Value::String(raw))?;
            counts.push(IndustryCount {
                industry,
                count: row.try_get_by_index::<i64>(1)? as u64,
            });
        }
        Ok(counts)
    }

    async fn review_efficiency(&self, range: &DateRange) -> Result<ReviewEfficiency> {
        let mut params = SqlParams::default();
        let mut clauses = date_clauses(range, "(r.value->>'timestamp')::timestamptz", &mut params);
        clauses.push("r.value->>'to_status' IN ('approved', 'rejected')".to_string());

        let sql = format!(
            "SELECT (r.value->>'operator_id')::uuid, COUNT(*)::bigint, \
                    SUM(EXTRACT(EPOCH FROM ((r.value->>'timestamp')::timestamptz - p.created_at)))::float8 / 3600.0 \
             FROM proposals p, jsonb_array_elements(p.review_records) AS r {} \
             GROUP BY 1",
            where_sql(&clauses),
        );

        let stmt = Statement::from_sql_and_values(DbBackend::Postgres, &sql, params.values);
        let rows = self.pool.read().query_all(stmt).await?;

        let mut total_reviews = 0u64;
        let mut total_hours = 0.0_f64;
        let total_reviewers = rows.len() as u64;
        for row in &rows {
            total_reviews += row.try_get_by_index::<i64>(1)? as u64;
            total_hours += row.try_get_by_index::<f64>(2)?;
        }

        Ok(ReviewEfficiency {
            total_reviewers,
            total_reviews,
            avg_reviews_per_reviewer: if total_reviewers > 0 {
                total_reviews as f64 / total_reviewers as f64
            } else {
                0.0
            },
            avg_review_hours: (total_reviews > 0).then(|| total_hours / total_reviews as f64),
        })
    }

    async fn review_history(
        &self,
        range: &DateRange,
        operator_id: Option<Uuid>,
    ) -> Result<Vec<ReviewHistoryEntry>> {
        let mut params = SqlParams::default();
        let mut clauses = date_clauses(range, "(r.value->>'timestamp')::timestamptz", &mut params);
        clauses.push("r.value->>'to_status' IN ('approved', 'rejected')".to_string());
        if let Some(op) = operator_id {
            let p = params.bind(op);
            clauses.push(format!("(r.value->>'operator_id')::uuid = {}", p));
        }

        let sql = format!(
            "SELECT p.id, p.company_info->>'company_name', p.status, r.value \
             FROM proposals p, jsonb_array_elements(p.review_records) AS r {} \
             ORDER BY (r.value->>'timestamp')::timestamptz DESC",
            where_sql(&clauses),
        );

        let stmt = Statement::from_sql_and_values(DbBackend::Postgres, &sql, params.values);
        let rows = self.pool.read().query_all(stmt).await?;

        let mut entries = Vec::with_capacity(rows.len());
        for row in rows {
            let raw_status: String = row.try_get_by_index(2)?;
            let current_status =
                ProposalStatus::parse(&raw_status).ok_or_else(|| AppError::Internal {
                    message: format!("Unknown status in storage: {}", raw_status),
                })?;
            let record: ReviewRecord =
                serde_json::from_value(row.try_get_by_index::<serde_json::Value>(3)?)?;
            entries.push(ReviewHistoryEntry {
                proposal_id: row.try_get_by_index(0)?,
                company_name: row.try_get_by_index(1)?,
                current_status,
                record,
            });
        }
        Ok(entries)
    }
}
