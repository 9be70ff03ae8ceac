//! Referral status machine and the derived pipeline stage shown on dashboards.
//!
//! Stored statuses only move forward:
//!
//! ```text
//! submitted → reviewed → shortlisted → interviewing → hired
//!      └──────────┴───────────┴─────────────┴──────→ rejected
//! ```
//!
//! `hired` and `rejected` are terminal. A forward move may skip intermediate
//! review stages (a client can shortlist straight from `submitted`).

use std::fmt;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Days after which an unattended `reviewed`/`shortlisted` referral is
/// reported as `interviewing`.
pub const STAGE_AGING_DAYS: i64 = 14;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReferralStatus {
    Submitted,
    Reviewed,
    Shortlisted,
    Interviewing,
    Hired,
    Rejected,
}

impl ReferralStatus {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim() {
            "submitted" => Some(ReferralStatus::Submitted),
            "reviewed" => Some(ReferralStatus::Reviewed),
            "shortlisted" => Some(ReferralStatus::Shortlisted),
            "interviewing" => Some(ReferralStatus::Interviewing),
            "hired" => Some(ReferralStatus::Hired),
            "rejected" => Some(ReferralStatus::Rejected),
            _ => None,
        }
    }

    /// Reads a status column. Unrecognized values are handled as `submitted`.
    pub fn from_stored(raw: &str) -> Self {
        Self::parse(raw).unwrap_or(ReferralStatus::Submitted)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ReferralStatus::Submitted => "submitted",
            ReferralStatus::Reviewed => "reviewed",
            ReferralStatus::Shortlisted => "shortlisted",
            ReferralStatus::Interviewing => "interviewing",
            ReferralStatus::Hired => "hired",
            ReferralStatus::Rejected => "rejected",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, ReferralStatus::Hired | ReferralStatus::Rejected)
    }

    /// Position along the forward pipeline. `rejected` sits off the line.
    fn rank(&self) -> Option<u8> {
        match self {
            ReferralStatus::Submitted => Some(0),
            ReferralStatus::Reviewed => Some(1),
            ReferralStatus::Shortlisted => Some(2),
            ReferralStatus::Interviewing => Some(3),
            ReferralStatus::Hired => Some(4),
            ReferralStatus::Rejected => None,
        }
    }

    pub fn can_transition_to(&self, next: ReferralStatus) -> bool {
        if self.is_terminal() {
            return false;
        }
        match (self.rank(), next.rank()) {
            (_, None) => true, // rejected is reachable from any open state
            (Some(from), Some(to)) => to > from,
            (None, Some(_)) => false,
        }
    }
}

impl fmt::Display for ReferralStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Display/aggregation bucket for a referral. Never written back to storage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PipelineStage {
    Submitted,
    Reviewed,
    Shortlisted,
    Interviewing,
    Hired,
    Rejected,
}

/// Derives the pipeline stage for a referral as of `now`.
///
/// `reviewed` and `shortlisted` referrals older than [`STAGE_AGING_DAYS`]
/// are reported as `interviewing`.
pub fn pipeline_stage(
    status: ReferralStatus,
    created_at: DateTime<Utc>,
    now: DateTime<Utc>,
) -> PipelineStage {
    let aged = now - created_at > Duration::days(STAGE_AGING_DAYS);
    match status {
        ReferralStatus::Submitted => PipelineStage::Submitted,
        ReferralStatus::Reviewed | ReferralStatus::Shortlisted if aged => {
            PipelineStage::Interviewing
        }
        ReferralStatus::Reviewed => PipelineStage::Reviewed,
        ReferralStatus::Shortlisted => PipelineStage::Shortlisted,
        ReferralStatus::Interviewing => PipelineStage::Interviewing,
        ReferralStatus::Hired => PipelineStage::Hired,
        ReferralStatus::Rejected => PipelineStage::Rejected,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL: [ReferralStatus; 6] = [
        ReferralStatus::Submitted,
        ReferralStatus::Reviewed,
        ReferralStatus::Shortlisted,
        ReferralStatus::Interviewing,
        ReferralStatus::Hired,
        ReferralStatus::Rejected,
    ];

    #[test]
    fn test_forward_steps_allowed() {
        assert!(ReferralStatus::Submitted.can_transition_to(ReferralStatus::Reviewed));
        assert!(ReferralStatus::Reviewed.can_transition_to(ReferralStatus::Shortlisted));
        assert!(ReferralStatus::Shortlisted.can_transition_to(ReferralStatus::Interviewing));
        assert!(ReferralStatus::Interviewing.can_transition_to(ReferralStatus::Hired));
        assert!(ReferralStatus::Submitted.can_transition_to(ReferralStatus::Shortlisted));
    }

    #[test]
    fn test_backward_and_same_state_rejected() {
        assert!(!ReferralStatus::Shortlisted.can_transition_to(ReferralStatus::Reviewed));
        assert!(!ReferralStatus::Interviewing.can_transition_to(ReferralStatus::Submitted));
        assert!(!ReferralStatus::Reviewed.can_transition_to(ReferralStatus::Reviewed));
    }

    #[test]
    fn test_rejected_reachable_from_every_open_state() {
        for from in ALL.iter().filter(|s| !s.is_terminal()) {
            assert!(from.can_transition_to(ReferralStatus::Rejected), "{from}");
        }
    }

    #[test]
    fn test_nothing_leaves_a_terminal_state() {
        for from in [ReferralStatus::Hired, ReferralStatus::Rejected] {
            for to in ALL {
                assert!(!from.can_transition_to(to), "{from} -> {to}");
            }
        }
    }

    #[test]
    fn test_unknown_stored_status_reads_as_submitted() {
        assert_eq!(ReferralStatus::from_stored("pending"), ReferralStatus::Submitted);
        assert_eq!(ReferralStatus::from_stored(""), ReferralStatus::Submitted);
        assert_eq!(ReferralStatus::from_stored("hired"), ReferralStatus::Hired);
    }

    #[test]
    fn test_aged_reviewed_reports_interviewing() {
        let now = Utc::now();
        let created = now - Duration::days(20);
        assert_eq!(
            pipeline_stage(ReferralStatus::Reviewed, created, now),
            PipelineStage::Interviewing
        );
        assert_eq!(
            pipeline_stage(ReferralStatus::Shortlisted, created, now),
            PipelineStage::Interviewing
        );
    }

    #[test]
    fn test_aging_needs_more_than_fourteen_days() {
        let now = Utc::now();
        let exactly = now - Duration::days(STAGE_AGING_DAYS);
        assert_eq!(
            pipeline_stage(ReferralStatus::Reviewed, exactly, now),
            PipelineStage::Reviewed
        );
        let just_over = exactly - Duration::seconds(1);
        assert_eq!(
            pipeline_stage(ReferralStatus::Reviewed, just_over, now),
            PipelineStage::Interviewing
        );
    }

    #[test]
    fn test_aging_ignores_other_statuses() {
        let now = Utc::now();
        let old = now - Duration::days(90);
        assert_eq!(
            pipeline_stage(ReferralStatus::Submitted, old, now),
            PipelineStage::Submitted
        );
        assert_eq!(pipeline_stage(ReferralStatus::Hired, old, now), PipelineStage::Hired);
        assert_eq!(
            pipeline_stage(ReferralStatus::Rejected, old, now),
            PipelineStage::Rejected
        );
    }
}
