//! Validation engine
//!
//! Pure, side-effect-free checks: the transition adjacency table, content
//! completeness scoring, and per-block field semantics. Errors distinguish
//! malformed input (the caller can fix the request) from business-rule
//! violations (the caller must re-fetch state).

use chrono::{Datelike, Utc};
use dealbridge_common::domain::{
    CompanyInfo, FinancialInfo, FullContent, Proposal, ProposalStatus, TeaserContent,
};
use dealbridge_common::errors::{AppError, Result};
use dealbridge_common::store::ContentPatch;
use serde::Serialize;

/// Minimum length for a company name
const MIN_COMPANY_NAME_CHARS: usize = 2;

/// Earliest accepted founding year
const MIN_FOUNDED_YEAR: i32 = 1900;

/// Highlight count bounds on teaser content
const HIGHLIGHT_RANGE: std::ops::RangeInclusive<usize> = 3..=5;

/// Minimum length for a detailed description
const MIN_DESCRIPTION_CHARS: usize = 200;

/// Minimum length for a rejection reason
const MIN_REJECT_REASON_CHARS: usize = 10;

/// Allowed targets per status; Archived is terminal
pub fn allowed_targets(from: ProposalStatus) -> &'static [ProposalStatus] {
    use ProposalStatus::*;
    match from {
        Draft => &[UnderReview, Archived],
        UnderReview => &[Approved, Rejected, Draft],
        Approved => &[Available, Archived],
        Available => &[Sent, Archived],
        Sent => &[Archived],
        Rejected => &[Draft, Archived],
        Archived => &[],
    }
}

/// Check a transition against the adjacency table
pub fn validate_transition(current: ProposalStatus, target: ProposalStatus) -> Result<()> {
    if allowed_targets(current).contains(&target) {
        Ok(())
    } else {
        Err(AppError::InvalidTransition {
            from: current.to_string(),
            to: target.to_string(),
        })
    }
}

/// Outcome of a completeness check
#[derive(Debug, Clone, Serialize)]
pub struct CompletenessReport {
    /// Fraction of required fields present, 0 to 100
    pub score: f64,
    pub missing_fields: Vec<String>,
    pub ready_for_submission: bool,
}

/// Score the proposal against the fields required for review.
///
/// Required: company name of at least 2 characters, founding year within
/// [1900, current year], non-negative revenue, at least 3 highlights, and
/// full content with a detailed description of at least 200 characters.
pub fn check_completeness(proposal: &Proposal) -> CompletenessReport {
    let current_year = Utc::now().year();
    let mut missing = Vec::new();
    let mut satisfied = 0usize;
    let mut check = |ok: bool, field: &str| {
        if ok {
            satisfied += 1;
        } else {
            missing.push(field.to_string());
        }
    };

    check(
        proposal
            .company_info
            .as_ref()
            .is_some_and(|c| c.company_name.chars().count() >= MIN_COMPANY_NAME_CHARS),
        "company_info.company_name",
    );
    check(
        proposal
            .company_info
            .as_ref()
            .is_some_and(|c| (MIN_FOUNDED_YEAR..=current_year).contains(&c.founded_year)),
        "company_info.founded_year",
    );
    check(
        proposal
            .financial_info
            .as_ref()
            .is_some_and(|f| f.annual_revenue >= 0),
        "financial_info.annual_revenue",
    );
    check(
        proposal
            .teaser_content
            .as_ref()
            .is_some_and(|t| t.highlights.len() >= *HIGHLIGHT_RANGE.start()),
        "teaser_content.highlights",
    );
    check(
        proposal
            .full_content
            .as_ref()
            .is_some_and(|f| f.detailed_description.chars().count() >= MIN_DESCRIPTION_CHARS),
        "full_content.detailed_description",
    );

    let total = satisfied + missing.len();
    CompletenessReport {
        score: satisfied as f64 / total as f64 * 100.0,
        ready_for_submission: missing.is_empty(),
        missing_fields: missing,
    }
}

/// Company block sanity
pub fn validate_company_info(info: &CompanyInfo) -> Result<()> {
    if info.company_name.chars().count() < MIN_COMPANY_NAME_CHARS {
        return Err(AppError::Validation {
            message: format!("Company name must be at least {} characters", MIN_COMPANY_NAME_CHARS),
            field: Some("company_info.company_name".to_string()),
        });
    }
    let current_year = Utc::now().year();
    if !(MIN_FOUNDED_YEAR..=current_year).contains(&info.founded_year) {
        return Err(AppError::Validation {
            message: format!(
                "Founded year must be between {} and {}",
                MIN_FOUNDED_YEAR, current_year
            ),
            field: Some("company_info.founded_year".to_string()),
        });
    }
    if info.employee_count < 1 {
        return Err(AppError::Validation {
            message: "Employee count must be positive".to_string(),
            field: Some("company_info.employee_count".to_string()),
        });
    }
    Ok(())
}

/// Financial block sanity.
///
/// Recomputes `profit_margin` from revenue and profit whenever revenue is
/// positive; a caller-supplied margin is never trusted in that case.
pub fn validate_financial_info(info: &mut FinancialInfo) -> Result<()> {
    if info.annual_revenue < 0 {
        return Err(AppError::Validation {
            message: "Annual revenue cannot be negative".to_string(),
            field: Some("financial_info.annual_revenue".to_string()),
        });
    }
    if info.asking_price.is_some_and(|p| p < 0) {
        return Err(AppError::Validation {
            message: "Asking price cannot be negative".to_string(),
            field: Some("financial_info.asking_price".to_string()),
        });
    }
    if info.annual_revenue > 0 {
        let margin = info.net_profit as f64 / info.annual_revenue as f64 * 100.0;
        info.profit_margin = Some((margin * 100.0).round() / 100.0);
    }
    Ok(())
}

/// Teaser block sanity
pub fn validate_teaser_content(teaser: &TeaserContent) -> Result<()> {
    if teaser.title.trim().is_empty() {
        return Err(AppError::Validation {
            message: "Teaser title cannot be empty".to_string(),
            field: Some("teaser_content.title".to_string()),
        });
    }
    if !HIGHLIGHT_RANGE.contains(&teaser.highlights.len()) {
        return Err(AppError::Validation {
            message: format!(
                "Highlights must contain {} to {} entries",
                HIGHLIGHT_RANGE.start(),
                HIGHLIGHT_RANGE.end()
            ),
            field: Some("teaser_content.highlights".to_string()),
        });
    }
    Ok(())
}

/// Full-content block sanity
pub fn validate_full_content(full: &FullContent) -> Result<()> {
    if full.detailed_description.chars().count() < MIN_DESCRIPTION_CHARS {
        return Err(AppError::Validation {
            message: format!(
                "Detailed description must be at least {} characters",
                MIN_DESCRIPTION_CHARS
            ),
            field: Some("full_content.detailed_description".to_string()),
        });
    }
    Ok(())
}

/// Rejection reasons must carry enough substance for the seller to act on
pub fn validate_reject_reason(reason: &str) -> Result<()> {
    if reason.trim().chars().count() < MIN_REJECT_REASON_CHARS {
        return Err(AppError::Validation {
            message: format!(
                "Rejection reason must be at least {} characters",
                MIN_REJECT_REASON_CHARS
            ),
            field: Some("reason".to_string()),
        });
    }
    Ok(())
}

/// Run field semantics over every block present in a patch.
///
/// Mutates the patch where a derived field is recomputed (profit margin).
pub fn validate_patch(patch: &mut ContentPatch) -> Result<()> {
    if let Some(ref company) = patch.company_info {
        validate_company_info(company)?;
    }
    if let Some(ref mut financial) = patch.financial_info {
        validate_financial_info(financial)?;
    }
    if let Some(ref teaser) = patch.teaser_content {
        validate_teaser_content(teaser)?;
    }
    if let Some(ref full) = patch.full_content {
        validate_full_content(full)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use dealbridge_common::domain::{CompanySize, Industry};
    use uuid::Uuid;

    fn company() -> CompanyInfo {
        CompanyInfo {
            company_name: "Northwind Robotics".into(),
            industry: Industry::Technology,
            sub_industry: None,
            founded_year: 2015,
            headquarters: "Taipei".into(),
            employee_count: 42,
            company_size: CompanySize::Medium,
            website: None,
        }
    }

    fn complete_proposal() -> Proposal {
        let mut p = Proposal::new(Uuid::new_v4());
        p.company_info = Some(company());
        p.financial_info = Some(FinancialInfo {
            annual_revenue: 5_000_000,
            net_profit: 750_000,
            profit_margin: None,
            growth_rate: None,
            asking_price: None,
        });
        p.teaser_content = Some(TeaserContent {
            title: "Robotics automation leader".into(),
            tagline: None,
            summary: "Industrial automation platform".into(),
            highlights: vec!["a".into(), "b".into(), "c".into()],
            revenue_range: None,
        });
        p.full_content = Some(FullContent {
            detailed_description: "x".repeat(250),
            business_plan: None,
            growth_strategy: None,
            risk_factors: vec![],
            financial_statements: None,
        });
        p
    }

    #[test]
    fn test_transition_table_closure() {
        use ProposalStatus::*;
        // every listed target is itself a known status with its own row
        for from in ProposalStatus::ALL {
            for target in allowed_targets(from) {
                assert!(ProposalStatus::ALL.contains(target));
            }
        }
        // terminal state has no exits
        assert!(allowed_targets(Archived).is_empty());
        // spot checks
        assert!(validate_transition(Draft, UnderReview).is_ok());
        assert!(validate_transition(UnderReview, Draft).is_ok());
        assert!(validate_transition(Draft, Available).is_err());
        assert!(validate_transition(Archived, Draft).is_err());
        assert!(validate_transition(Sent, Available).is_err());
    }

    #[test]
    fn test_complete_proposal_is_ready() {
        let report = check_completeness(&complete_proposal());
        assert!(report.ready_for_submission);
        assert!(report.missing_fields.is_empty());
        assert_eq!(report.score, 100.0);
    }

    #[test]
    fn test_missing_full_content_blocks_submission() {
        let mut p = complete_proposal();
        p.full_content = None;
        let report = check_completeness(&p);
        assert!(!report.ready_for_submission);
        assert_eq!(
            report.missing_fields,
            vec!["full_content.detailed_description"]
        );
        assert!(report.score < 100.0);
    }

    #[test]
    fn test_short_description_blocks_submission() {
        let mut p = complete_proposal();
        p.full_content.as_mut().unwrap().detailed_description = "too short".into();
        assert!(!check_completeness(&p).ready_for_submission);
    }

    #[test]
    fn test_profit_margin_is_recomputed() {
        let mut info = FinancialInfo {
            annual_revenue: 3_000_000,
            net_profit: 1_000_000,
            profit_margin: Some(99.0), // caller-supplied value is ignored
            growth_rate: None,
            asking_price: None,
        };
        validate_financial_info(&mut info).unwrap();
        assert_eq!(info.profit_margin, Some(33.33));
    }

    #[test]
    fn test_zero_revenue_keeps_supplied_margin() {
        let mut info = FinancialInfo {
            annual_revenue: 0,
            net_profit: 0,
            profit_margin: Some(12.5),
            growth_rate: None,
            asking_price: None,
        };
        validate_financial_info(&mut info).unwrap();
        assert_eq!(info.profit_margin, Some(12.5));
    }

    #[test]
    fn test_negative_revenue_rejected() {
        let mut info = FinancialInfo {
            annual_revenue: -1,
            net_profit: 0,
            profit_margin: None,
            growth_rate: None,
            asking_price: None,
        };
        assert!(matches!(
            validate_financial_info(&mut info),
            Err(AppError::Validation { .. })
        ));
    }

    #[test]
    fn test_highlight_bounds() {
        let mut teaser = TeaserContent {
            title: "t".into(),
            tagline: None,
            summary: "s".into(),
            highlights: vec!["a".into(), "b".into()],
            revenue_range: None,
        };
        assert!(validate_teaser_content(&teaser).is_err());

        teaser.highlights.push("c".into());
        assert!(validate_teaser_content(&teaser).is_ok());

        teaser.highlights.extend(["d".into(), "e".into(), "f".into()]);
        assert!(validate_teaser_content(&teaser).is_err());
    }

    #[test]
    fn test_reject_reason_length() {
        assert!(validate_reject_reason("too short").is_err());
        assert!(validate_reject_reason("   padded   ").is_err());
        assert!(validate_reject_reason("missing financial statements").is_ok());
    }

    #[test]
    fn test_founded_year_bounds() {
        let mut info = company();
        info.founded_year = 1899;
        assert!(validate_company_info(&info).is_err());

        info.founded_year = Utc::now().year() + 1;
        assert!(validate_company_info(&info).is_err());

        info.founded_year = 1900;
        assert!(validate_company_info(&info).is_ok());
    }
}
