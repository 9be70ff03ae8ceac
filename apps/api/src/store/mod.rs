//! Data-access seam for the referral engine.
//!
//! Handlers and services talk to `ReferralStore`; `AppState` carries it as
//! `Arc<dyn ReferralStore>`. Production uses `PgReferralStore`, tests use the
//! in-memory store.

#[cfg(test)]
pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use serde_json::Value;
use uuid::Uuid;

use crate::access::policy::Role;
use crate::errors::AppError;
use crate::models::distribution::{DistributionStatus, RevenueDistributionRow};
use crate::models::profile::ProfileRow;
use crate::models::referral::{JobRow, ReferralRow, ReferralWithJobRow};
use crate::referrals::status::ReferralStatus;

pub use postgres::PgReferralStore;

/// Everything written when a referral is hired: the new distribution row and
/// the metadata merged into the referral.
#[derive(Debug, Clone)]
pub struct HireCommit {
    pub distribution: RevenueDistributionRow,
    pub referral_metadata: Value,
}

#[derive(Debug, Clone)]
pub enum HireOutcome {
    /// The distribution was written and the referral is now `hired`.
    Created(RevenueDistributionRow),
    /// Another writer already recorded a distribution for this referral.
    Existing(RevenueDistributionRow),
    /// The referral's current status does not allow a move to `hired`.
    Blocked(ReferralStatus),
}

#[async_trait]
pub trait ReferralStore: Send + Sync {
    async fn get_referral(&self, id: Uuid) -> Result<Option<ReferralRow>, AppError>;

    async fn get_job(&self, id: Uuid) -> Result<Option<JobRow>, AppError>;

    async fn get_profile(&self, id: Uuid) -> Result<Option<ProfileRow>, AppError>;

    async fn get_distribution(&self, id: Uuid) -> Result<Option<RevenueDistributionRow>, AppError>;

    async fn get_distribution_for_referral(
        &self,
        referral_id: Uuid,
    ) -> Result<Option<RevenueDistributionRow>, AppError>;

    /// Deterministic recipient lookup: the lowest profile id holding `role`.
    async fn lowest_member_with_role(&self, role: Role) -> Result<Option<Uuid>, AppError>;

    /// Moves `referral_id` to `next` if its stored status still equals
    /// `expected` (the raw column value as read, legacy values included).
    /// Returns `false` when another writer got there first.
    async fn compare_and_set_status(
        &self,
        referral_id: Uuid,
        expected: &str,
        next: ReferralStatus,
    ) -> Result<bool, AppError>;

    /// Writes the distribution and flips the referral to `hired` as one unit.
    /// Either both writes land or neither does.
    async fn commit_hire(&self, commit: HireCommit) -> Result<HireOutcome, AppError>;

    async fn list_referrals_for_referrer(
        &self,
        referrer_id: Uuid,
    ) -> Result<Vec<ReferralWithJobRow>, AppError>;

    async fn list_distributions_for_referrals(
        &self,
        referral_ids: &[Uuid],
    ) -> Result<Vec<RevenueDistributionRow>, AppError>;

    /// Distributions where `member_id` is the resolved founding or select member.
    async fn list_distributions_for_member(
        &self,
        member_id: Uuid,
        status: Option<DistributionStatus>,
    ) -> Result<Vec<RevenueDistributionRow>, AppError>;
}
