//! Proposal lifecycle status

use serde::{Deserialize, Serialize};
use std::fmt;

/// Lifecycle status of a proposal
///
/// Exactly one value at any time; status only ever changes through a
/// workflow transition, never by direct field writes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProposalStatus {
    /// Being drafted by the seller; freely editable
    Draft,
    /// Submitted, waiting for an admin decision
    UnderReview,
    /// Accepted by an admin, not yet visible to buyers
    Approved,
    /// Published; visible and dispatchable to buyers
    Available,
    /// Dispatched to at least one buyer
    Sent,
    /// Declined by an admin; editable again
    Rejected,
    /// Terminal state; no further transitions
    Archived,
}

impl ProposalStatus {
    /// All statuses, in lifecycle order
    pub const ALL: [ProposalStatus; 7] = [
        ProposalStatus::Draft,
        ProposalStatus::UnderReview,
        ProposalStatus::Approved,
        ProposalStatus::Available,
        ProposalStatus::Sent,
        ProposalStatus::Rejected,
        ProposalStatus::Archived,
    ];

    /// Snake-case wire representation
    pub fn as_str(&self) -> &'static str {
        match self {
            ProposalStatus::Draft => "draft",
            ProposalStatus::UnderReview => "under_review",
            ProposalStatus::Approved => "approved",
            ProposalStatus::Available => "available",
            ProposalStatus::Sent => "sent",
            ProposalStatus::Rejected => "rejected",
            ProposalStatus::Archived => "archived",
        }
    }

    /// Parse the wire representation
    pub fn parse(s: &str) -> Option<Self> {
        ProposalStatus::ALL.into_iter().find(|v| v.as_str() == s)
    }

    /// True for the terminal state
    pub fn is_terminal(&self) -> bool {
        matches!(self, ProposalStatus::Archived)
    }

    /// Statuses visible to buyers in search results
    pub fn is_buyer_visible(&self) -> bool {
        matches!(self, ProposalStatus::Available | ProposalStatus::Sent)
    }
}

impl fmt::Display for ProposalStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_roundtrip() {
        for status in ProposalStatus::ALL {
            assert_eq!(ProposalStatus::parse(status.as_str()), Some(status));
        }
        assert_eq!(ProposalStatus::parse("bogus"), None);
    }

    #[test]
    fn test_buyer_visibility() {
        assert!(ProposalStatus::Available.is_buyer_visible());
        assert!(ProposalStatus::Sent.is_buyer_visible());
        assert!(!ProposalStatus::Draft.is_buyer_visible());
        assert!(!ProposalStatus::Approved.is_buyer_visible());
    }
}
