//! Revenue distribution: splits a realized placement fee when a referral is hired.
//!
//! Flow: validate → replay check → load referral, job, referrer → split fee →
//!       resolve recipients → commit distribution + `hired` status atomically.
//!
//! Calling `distribute` again for the same referral returns the stored
//! distribution instead of creating another one.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{info, warn};
use uuid::Uuid;

use crate::access::policy::{Role, Tier};
use crate::errors::AppError;
use crate::models::distribution::{DistributionStatus, RevenueDistributionRow};
use crate::referrals::status::ReferralStatus;
use crate::revenue::split::{SplitPolicy, BPS_DENOMINATOR};
use crate::store::{HireCommit, HireOutcome, ReferralStore};

pub const DEFAULT_CURRENCY: &str = "USD";

// ────────────────────────────────────────────────────────────────────────────
// Request / result types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Deserialize)]
pub struct DistributionRequest {
    pub referral_id: Option<Uuid>,
    pub placement_fee: Option<i64>,
    pub currency: Option<String>,
}

/// A request that passed input validation. Built without touching storage.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidDistribution {
    pub referral_id: Uuid,
    pub placement_fee: i64,
    pub currency: String,
}

#[derive(Debug, Clone)]
pub struct DistributionOutcome {
    pub distribution: RevenueDistributionRow,
    /// False when an earlier call already recorded this distribution.
    pub created: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ShareLine {
    pub amount: i64,
    pub pct: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MemberShareLine {
    pub amount: i64,
    pub pct: f64,
    pub member_id: Option<Uuid>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DistributionBreakdown {
    pub platform: ShareLine,
    pub select: MemberShareLine,
    pub founding: MemberShareLine,
}

impl From<&RevenueDistributionRow> for DistributionBreakdown {
    fn from(row: &RevenueDistributionRow) -> Self {
        // Percentages come from the row, not the live policy
        let policy = row.policy();
        let pct = |bps: u32| bps as f64 * 100.0 / BPS_DENOMINATOR as f64;
        DistributionBreakdown {
            platform: ShareLine {
                amount: row.platform_share,
                pct: pct(policy.platform_bps),
            },
            select: MemberShareLine {
                amount: row.select_share,
                pct: pct(policy.select_bps),
                member_id: row.select_member_id,
            },
            founding: MemberShareLine {
                amount: row.founding_share,
                pct: pct(policy.founding_bps),
                member_id: row.founding_member_id,
            },
        }
    }
}

/// Which member fills each paid slot of a distribution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Recipients {
    pub founding_member_id: Option<Uuid>,
    pub select_member_id: Option<Uuid>,
}

// ────────────────────────────────────────────────────────────────────────────
// Validation
// ────────────────────────────────────────────────────────────────────────────

pub fn validate_request(request: &DistributionRequest) -> Result<ValidDistribution, AppError> {
    let referral_id = request
        .referral_id
        .ok_or_else(|| AppError::Validation("referral_id is required".to_string()))?;

    let placement_fee = match request.placement_fee {
        Some(fee) if fee > 0 => fee,
        Some(fee) => {
            return Err(AppError::Validation(format!(
                "placement_fee must be positive, got {fee}"
            )))
        }
        None => return Err(AppError::Validation("placement_fee is required".to_string())),
    };

    let currency = match request.currency.as_deref().map(str::trim) {
        None | Some("") => DEFAULT_CURRENCY.to_string(),
        Some(code) if code.len() == 3 && code.chars().all(|c| c.is_ascii_alphabetic()) => {
            code.to_ascii_uppercase()
        }
        Some(code) => {
            return Err(AppError::Validation(format!(
                "currency must be a three-letter code, got '{code}'"
            )))
        }
    };

    Ok(ValidDistribution {
        referral_id,
        placement_fee,
        currency,
    })
}

// ────────────────────────────────────────────────────────────────────────────
// Recipient resolution
// ────────────────────────────────────────────────────────────────────────────

/// Places the referrer in the slot matching its role and fills the other
/// slot(s) with the lowest-id member of the required role.
///
/// Referrers outside the two circles receive nothing; both slots are
/// resolved independently.
pub async fn resolve_recipients(
    store: &dyn ReferralStore,
    referrer_id: Uuid,
    referrer_role: Option<Role>,
) -> Result<Recipients, AppError> {
    let recipients = match referrer_role {
        Some(Role::FoundingCircle) => Recipients {
            founding_member_id: Some(referrer_id),
            select_member_id: store.lowest_member_with_role(Role::SelectCircle).await?,
        },
        Some(Role::SelectCircle) => Recipients {
            founding_member_id: store.lowest_member_with_role(Role::FoundingCircle).await?,
            select_member_id: Some(referrer_id),
        },
        Some(Role::Client) | Some(Role::Candidate) | None => Recipients {
            founding_member_id: store.lowest_member_with_role(Role::FoundingCircle).await?,
            select_member_id: store.lowest_member_with_role(Role::SelectCircle).await?,
        },
    };

    if recipients.founding_member_id.is_none() {
        warn!("No founding_circle member available; founding share has no recipient");
    }
    if recipients.select_member_id.is_none() {
        warn!("No select_circle member available; select share has no recipient");
    }

    Ok(recipients)
}

// ────────────────────────────────────────────────────────────────────────────
// Distribution
// ────────────────────────────────────────────────────────────────────────────

/// Records the split of `request.placement_fee` and marks the referral hired.
pub async fn distribute(
    store: &dyn ReferralStore,
    policy: SplitPolicy,
    request: ValidDistribution,
) -> Result<DistributionOutcome, AppError> {
    policy
        .validate()
        .map_err(|e| AppError::Internal(anyhow::anyhow!(e)))?;

    let ValidDistribution {
        referral_id,
        placement_fee,
        currency,
    } = request;

    // Replays return the stored record untouched
    if let Some(existing) = store.get_distribution_for_referral(referral_id).await? {
        info!(
            "Distribution {} already exists for referral {referral_id}",
            existing.id
        );
        return Ok(DistributionOutcome {
            distribution: existing,
            created: false,
        });
    }

    let referral = store
        .get_referral(referral_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Referral {referral_id} not found")))?;

    let job = store
        .get_job(referral.job_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Job {} not found", referral.job_id)))?;

    if Tier::parse(&job.subscription_tier).is_none() {
        return Err(AppError::Validation(format!(
            "Job {} has unrecognized subscription tier '{}'",
            job.id, job.subscription_tier
        )));
    }

    let referrer = store
        .get_profile(referral.referrer_id)
        .await?
        .ok_or_else(|| {
            AppError::NotFound(format!("Referrer {} not found", referral.referrer_id))
        })?;

    let current = referral.status();
    if !current.can_transition_to(ReferralStatus::Hired) {
        return Err(AppError::InvalidTransition {
            from: current,
            to: ReferralStatus::Hired,
        });
    }

    let shares = policy.split(placement_fee);
    debug_assert_eq!(shares.total(), placement_fee);
    let recipients = resolve_recipients(store, referrer.id, referrer.role()).await?;

    let distribution = RevenueDistributionRow {
        id: Uuid::new_v4(),
        referral_id,
        founding_member_id: recipients.founding_member_id,
        select_member_id: recipients.select_member_id,
        placement_fee,
        currency: currency.clone(),
        platform_share: shares.platform,
        select_share: shares.select,
        founding_share: shares.founding,
        split_version: policy.version as i32,
        platform_bps: policy.platform_bps as i32,
        select_bps: policy.select_bps as i32,
        founding_bps: policy.founding_bps as i32,
        status: DistributionStatus::Calculated.as_str().to_string(),
        created_at: Utc::now(),
    };

    let commit = HireCommit {
        referral_metadata: json!({
            "placement_fee": placement_fee,
            "currency": currency,
            "distribution_id": distribution.id,
        }),
        distribution,
    };

    match store.commit_hire(commit).await? {
        HireOutcome::Created(row) => {
            info!(
                "Created distribution {} for referral {referral_id}: fee={} {} platform={} select={} founding={}",
                row.id,
                row.placement_fee,
                row.currency,
                row.platform_share,
                row.select_share,
                row.founding_share
            );
            Ok(DistributionOutcome {
                distribution: row,
                created: true,
            })
        }
        HireOutcome::Existing(row) => {
            info!(
                "Concurrent hire of referral {referral_id} resolved to distribution {}",
                row.id
            );
            Ok(DistributionOutcome {
                distribution: row,
                created: false,
            })
        }
        HireOutcome::Blocked(status) => Err(AppError::InvalidTransition {
            from: status,
            to: ReferralStatus::Hired,
        }),
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────
