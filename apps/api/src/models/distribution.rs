use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use crate::revenue::split::SplitPolicy;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DistributionStatus {
    Calculated,
    Paid,
}

impl DistributionStatus {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "calculated" => Some(DistributionStatus::Calculated),
            "paid" => Some(DistributionStatus::Paid),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            DistributionStatus::Calculated => "calculated",
            DistributionStatus::Paid => "paid",
        }
    }
}

/// Persisted split of one placement fee. At most one row per referral.
///
/// The split percentages in force at creation are copied into the row
/// (`split_version` and the three `*_bps` columns) so a later policy change
/// never rewrites history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct RevenueDistributionRow {
    pub id: Uuid,
    pub referral_id: Uuid,
    pub founding_member_id: Option<Uuid>,
    pub select_member_id: Option<Uuid>,
    pub placement_fee: i64,
    pub currency: String,
    pub platform_share: i64,
    pub select_share: i64,
    pub founding_share: i64,
    pub split_version: i32,
    pub platform_bps: i32,
    pub select_bps: i32,
    pub founding_bps: i32,
    pub status: String,
    pub created_at: DateTime<Utc>,
}

impl RevenueDistributionRow {
    /// The policy that produced this row, rebuilt from its captured columns.
    pub fn policy(&self) -> SplitPolicy {
        SplitPolicy {
            version: self.split_version as u16,
            platform_bps: self.platform_bps as u32,
            select_bps: self.select_bps as u32,
            founding_bps: self.founding_bps as u32,
        }
    }

    pub fn involves(&self, user_id: Uuid) -> bool {
        self.founding_member_id == Some(user_id) || self.select_member_id == Some(user_id)
    }
}
