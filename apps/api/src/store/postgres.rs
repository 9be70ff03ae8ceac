use async_trait::async_trait;
use sqlx::PgPool;
use tracing::{info, warn};
use uuid::Uuid;

use crate::access::policy::Role;
use crate::errors::AppError;
use crate::models::distribution::{DistributionStatus, RevenueDistributionRow};
use crate::models::profile::ProfileRow;
use crate::models::referral::{JobRow, ReferralRow, ReferralWithJobRow};
use crate::referrals::status::ReferralStatus;
use crate::store::{HireCommit, HireOutcome, ReferralStore};

/// Sets the hired status and merges hire details into the referral metadata.
/// Stored metadata that is not a JSON object is replaced, not appended to.
const MARK_HIRED_SQL: &str = r#"
    UPDATE referrals
    SET status = $1,
        metadata = CASE
            WHEN jsonb_typeof(metadata) = 'object' THEN metadata
            ELSE '{}'::jsonb
        END || $2
    WHERE id = $3
"#;

/// `ReferralStore` backed by PostgreSQL.
///
/// The one-distribution-per-referral guarantee rests on the
/// `UNIQUE (referral_id)` constraint of `revenue_distributions` plus a row
/// lock on the referral while hiring.
#[derive(Clone)]
pub struct PgReferralStore {
    pool: PgPool,
}

impl PgReferralStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ReferralStore for PgReferralStore {
    async fn get_referral(&self, id: Uuid) -> Result<Option<ReferralRow>, AppError> {
        Ok(
            sqlx::query_as::<_, ReferralRow>("SELECT * FROM referrals WHERE id = $1")
                .bind(id)
                .fetch_optional(&self.pool)
                .await?,
        )
    }

    async fn get_job(&self, id: Uuid) -> Result<Option<JobRow>, AppError> {
        Ok(sqlx::query_as::<_, JobRow>("SELECT * FROM jobs WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn get_profile(&self, id: Uuid) -> Result<Option<ProfileRow>, AppError> {
        Ok(
            sqlx::query_as::<_, ProfileRow>("SELECT id, role, full_name FROM profiles WHERE id = $1")
                .bind(id)
                .fetch_optional(&self.pool)
                .await?,
        )
    }

    async fn get_distribution(&self, id: Uuid) -> Result<Option<RevenueDistributionRow>, AppError> {
        Ok(sqlx::query_as::<_, RevenueDistributionRow>(
            "SELECT * FROM revenue_distributions WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?)
    }

    async fn get_distribution_for_referral(
        &self,
        referral_id: Uuid,
    ) -> Result<Option<RevenueDistributionRow>, AppError> {
        Ok(sqlx::query_as::<_, RevenueDistributionRow>(
            "SELECT * FROM revenue_distributions WHERE referral_id = $1",
        )
        .bind(referral_id)
        .fetch_optional(&self.pool)
        .await?)
    }

    async fn lowest_member_with_role(&self, role: Role) -> Result<Option<Uuid>, AppError> {
        Ok(sqlx::query_scalar::<_, Uuid>(
            "SELECT id FROM profiles WHERE role = $1 ORDER BY id ASC LIMIT 1",
        )
        .bind(role.as_str())
        .fetch_optional(&self.pool)
        .await?)
    }

    async fn compare_and_set_status(
        &self,
        referral_id: Uuid,
        expected: &str,
        next: ReferralStatus,
    ) -> Result<bool, AppError> {
        let result = sqlx::query("UPDATE referrals SET status = $1 WHERE id = $2 AND status = $3")
            .bind(next.as_str())
            .bind(referral_id)
            .bind(expected)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() == 1)
    }

    async fn commit_hire(&self, commit: HireCommit) -> Result<HireOutcome, AppError> {
        let HireCommit {
            distribution,
            referral_metadata,
        } = commit;
        let referral_id = distribution.referral_id;

        let mut tx = self.pool.begin().await?;

        // 1. Serialize concurrent hires of the same referral
        let current: Option<String> =
            sqlx::query_scalar("SELECT status FROM referrals WHERE id = $1 FOR UPDATE")
                .bind(referral_id)
                .fetch_optional(&mut *tx)
                .await?;
        let current = match current {
            Some(status) => ReferralStatus::from_stored(&status),
            None => {
                tx.rollback().await?;
                return Err(AppError::NotFound(format!(
                    "Referral {referral_id} not found"
                )));
            }
        };

        // 2. A previous writer may have finished while we waited on the lock
        let existing = sqlx::query_as::<_, RevenueDistributionRow>(
            "SELECT * FROM revenue_distributions WHERE referral_id = $1",
        )
        .bind(referral_id)
        .fetch_optional(&mut *tx)
        .await?;
        if let Some(existing) = existing {
            tx.rollback().await?;
            return Ok(HireOutcome::Existing(existing));
        }

        if !current.can_transition_to(ReferralStatus::Hired) {
            tx.rollback().await?;
            return Ok(HireOutcome::Blocked(current));
        }

        // 3. Insert, relying on the unique constraint as the last line
        let inserted = sqlx::query_as::<_, RevenueDistributionRow>(
            r#"
            INSERT INTO revenue_distributions
                (id, referral_id, founding_member_id, select_member_id, placement_fee, currency,
                 platform_share, select_share, founding_share,
                 split_version, platform_bps, select_bps, founding_bps, status, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15)
            ON CONFLICT (referral_id) DO NOTHING
            RETURNING *
            "#,
        )
        .bind(distribution.id)
        .bind(distribution.referral_id)
        .bind(distribution.founding_member_id)
        .bind(distribution.select_member_id)
        .bind(distribution.placement_fee)
        .bind(&distribution.currency)
        .bind(distribution.platform_share)
        .bind(distribution.select_share)
        .bind(distribution.founding_share)
        .bind(distribution.split_version)
        .bind(distribution.platform_bps)
        .bind(distribution.select_bps)
        .bind(distribution.founding_bps)
        .bind(&distribution.status)
        .bind(distribution.created_at)
        .fetch_optional(&mut *tx)
        .await?;

        let inserted = match inserted {
            Some(row) => row,
            None => {
                tx.rollback().await?;
                warn!("Distribution insert for referral {referral_id} lost a uniqueness race");
                return match self.get_distribution_for_referral(referral_id).await? {
                    Some(winner) => Ok(HireOutcome::Existing(winner)),
                    None => Err(AppError::Conflict(format!(
                        "Concurrent distribution for referral {referral_id} could not be resolved"
                    ))),
                };
            }
        };

        // 4. Status and metadata in the same transaction
        sqlx::query(MARK_HIRED_SQL)
        .bind(ReferralStatus::Hired.as_str())
        .bind(&referral_metadata)
        .bind(referral_id)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        info!(
            "Committed distribution {} and hired status for referral {referral_id}",
            inserted.id
        );

        Ok(HireOutcome::Created(inserted))
    }

    async fn list_referrals_for_referrer(
        &self,
        referrer_id: Uuid,
    ) -> Result<Vec<ReferralWithJobRow>, AppError> {
        Ok(sqlx::query_as::<_, ReferralWithJobRow>(
            r#"
            SELECT r.id, r.job_id, r.referrer_id, r.status, r.created_at,
                   j.title AS job_title, j.salary_min, j.salary_max, j.subscription_tier
            FROM referrals r
            JOIN jobs j ON j.id = r.job_id
            WHERE r.referrer_id = $1
            ORDER BY r.created_at ASC
            "#,
        )
        .bind(referrer_id)
        .fetch_all(&self.pool)
        .await?)
    }

    async fn list_distributions_for_referrals(
        &self,
        referral_ids: &[Uuid],
    ) -> Result<Vec<RevenueDistributionRow>, AppError> {
        if referral_ids.is_empty() {
            return Ok(Vec::new());
        }
        Ok(sqlx::query_as::<_, RevenueDistributionRow>(
            "SELECT * FROM revenue_distributions WHERE referral_id = ANY($1)",
        )
        .bind(referral_ids)
        .fetch_all(&self.pool)
        .await?)
    }

    async fn list_distributions_for_member(
        &self,
        member_id: Uuid,
        status: Option<DistributionStatus>,
    ) -> Result<Vec<RevenueDistributionRow>, AppError> {
        Ok(sqlx::query_as::<_, RevenueDistributionRow>(
            r#"
            SELECT * FROM revenue_distributions
            WHERE (founding_member_id = $1 OR select_member_id = $1)
              AND ($2::text IS NULL OR status = $2)
            ORDER BY created_at DESC
            "#,
        )
        .bind(member_id)
        .bind(status.map(|s| s.as_str()))
        .fetch_all(&self.pool)
        .await?)
    }
}
