//! In-memory `ReferralStore` for unit and router tests.
//!
//! All state sits behind one mutex, so `commit_hire` is atomic for free.
//! `fail_next_hire` injects a storage failure to exercise rollback paths.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::Value;
use uuid::Uuid;

use crate::access::policy::Role;
use crate::errors::AppError;
use crate::models::distribution::{DistributionStatus, RevenueDistributionRow};
use crate::models::profile::ProfileRow;
use crate::models::referral::{JobRow, ReferralRow, ReferralWithJobRow};
use crate::referrals::status::ReferralStatus;
use crate::store::{HireCommit, HireOutcome, ReferralStore};

#[derive(Default)]
struct Tables {
    profiles: BTreeMap<Uuid, ProfileRow>,
    jobs: BTreeMap<Uuid, JobRow>,
    referrals: BTreeMap<Uuid, ReferralRow>,
    distributions: BTreeMap<Uuid, RevenueDistributionRow>,
}

#[derive(Default)]
pub struct InMemoryStore {
    tables: Mutex<Tables>,
    fail_next_hire: AtomicBool,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_profile(&self, role: &str) -> Uuid {
        self.add_profile_with_id(Uuid::new_v4(), role)
    }

    pub fn add_profile_with_id(&self, id: Uuid, role: &str) -> Uuid {
        self.tables.lock().unwrap().profiles.insert(
            id,
            ProfileRow {
                id,
                role: role.to_string(),
                full_name: None,
            },
        );
        id
    }

    pub fn add_job(
        &self,
        client_id: Uuid,
        salary_min: Option<i64>,
        salary_max: Option<i64>,
        tier: &str,
    ) -> Uuid {
        let id = Uuid::new_v4();
        self.tables.lock().unwrap().jobs.insert(
            id,
            JobRow {
                id,
                client_id,
                title: "Staff Engineer".to_string(),
                salary_min,
                salary_max,
                subscription_tier: tier.to_string(),
                created_at: Utc::now(),
            },
        );
        id
    }

    pub fn add_referral(
        &self,
        job_id: Uuid,
        referrer_id: Uuid,
        status: &str,
        created_at: DateTime<Utc>,
    ) -> Uuid {
        let id = Uuid::new_v4();
        self.tables.lock().unwrap().referrals.insert(
            id,
            ReferralRow {
                id,
                job_id,
                referrer_id,
                candidate_name: "Ada Candidate".to_string(),
                candidate_email: "ada@example.com".to_string(),
                candidate_phone: None,
                status: status.to_string(),
                created_at,
                metadata: None,
            },
        );
        id
    }

    pub fn set_referral_metadata(&self, id: Uuid, metadata: Option<Value>) {
        if let Some(row) = self.tables.lock().unwrap().referrals.get_mut(&id) {
            row.metadata = metadata;
        }
    }

    pub fn referral(&self, id: Uuid) -> Option<ReferralRow> {
        self.tables.lock().unwrap().referrals.get(&id).cloned()
    }

    pub fn distribution_count(&self) -> usize {
        self.tables.lock().unwrap().distributions.len()
    }

    pub fn set_distribution_status(&self, id: Uuid, status: DistributionStatus) {
        if let Some(row) = self.tables.lock().unwrap().distributions.get_mut(&id) {
            row.status = status.as_str().to_string();
        }
    }

    pub fn fail_next_hire(&self) {
        self.fail_next_hire.store(true, Ordering::SeqCst);
    }
}

fn merge_metadata(existing: Option<Value>, patch: Value) -> Value {
    match (existing, patch) {
        (Some(Value::Object(mut base)), Value::Object(extra)) => {
            base.extend(extra);
            Value::Object(base)
        }
        (_, patch) => patch,
    }
}

#[async_trait]
impl ReferralStore for InMemoryStore {
    async fn get_referral(&self, id: Uuid) -> Result<Option<ReferralRow>, AppError> {
        Ok(self.tables.lock().unwrap().referrals.get(&id).cloned())
    }

    async fn get_job(&self, id: Uuid) -> Result<Option<JobRow>, AppError> {
        Ok(self.tables.lock().unwrap().jobs.get(&id).cloned())
    }

    async fn get_profile(&self, id: Uuid) -> Result<Option<ProfileRow>, AppError> {
        Ok(self.tables.lock().unwrap().profiles.get(&id).cloned())
    }

    async fn get_distribution(&self, id: Uuid) -> Result<Option<RevenueDistributionRow>, AppError> {
        Ok(self.tables.lock().unwrap().distributions.get(&id).cloned())
    }

    async fn get_distribution_for_referral(
        &self,
        referral_id: Uuid,
    ) -> Result<Option<RevenueDistributionRow>, AppError> {
        Ok(self
            .tables
            .lock()
            .unwrap()
            .distributions
            .values()
            .find(|d| d.referral_id == referral_id)
            .cloned())
    }

    async fn lowest_member_with_role(&self, role: Role) -> Result<Option<Uuid>, AppError> {
        Ok(self
            .tables
            .lock()
            .unwrap()
            .profiles
            .values()
            .find(|p| p.role == role.as_str())
            .map(|p| p.id))
    }

    async fn compare_and_set_status(
        &self,
        referral_id: Uuid,
        expected: &str,
        next: ReferralStatus,
    ) -> Result<bool, AppError> {
        let mut tables = self.tables.lock().unwrap();
        match tables.referrals.get_mut(&referral_id) {
            Some(row) if row.status == expected => {
                row.status = next.as_str().to_string();
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn commit_hire(&self, commit: HireCommit) -> Result<HireOutcome, AppError> {
        let mut tables = self.tables.lock().unwrap();
        let referral_id = commit.distribution.referral_id;

        let current = match tables.referrals.get(&referral_id) {
            Some(row) => row.status(),
            None => {
                return Err(AppError::NotFound(format!(
                    "Referral {referral_id} not found"
                )))
            }
        };
        if let Some(existing) = tables
            .distributions
            .values()
            .find(|d| d.referral_id == referral_id)
        {
            return Ok(HireOutcome::Existing(existing.clone()));
        }
        if !current.can_transition_to(ReferralStatus::Hired) {
            return Ok(HireOutcome::Blocked(current));
        }
        if self.fail_next_hire.swap(false, Ordering::SeqCst) {
            return Err(AppError::Internal(anyhow::anyhow!(
                "injected storage failure"
            )));
        }

        let row = commit.distribution;
        tables.distributions.insert(row.id, row.clone());
        if let Some(referral) = tables.referrals.get_mut(&referral_id) {
            referral.status = ReferralStatus::Hired.as_str().to_string();
            referral.metadata = Some(merge_metadata(
                referral.metadata.take(),
                commit.referral_metadata,
            ));
        }
        Ok(HireOutcome::Created(row))
    }

    async fn list_referrals_for_referrer(
        &self,
        referrer_id: Uuid,
    ) -> Result<Vec<ReferralWithJobRow>, AppError> {
        let tables = self.tables.lock().unwrap();
        let mut rows: Vec<ReferralWithJobRow> = tables
            .referrals
            .values()
            .filter(|r| r.referrer_id == referrer_id)
            .filter_map(|r| {
                tables.jobs.get(&r.job_id).map(|job| ReferralWithJobRow {
                    id: r.id,
                    job_id: r.job_id,
                    referrer_id: r.referrer_id,
                    status: r.status.clone(),
                    created_at: r.created_at,
                    job_title: job.title.clone(),
                    salary_min: job.salary_min,
                    salary_max: job.salary_max,
                    subscription_tier: job.subscription_tier.clone(),
                })
            })
            .collect();
        rows.sort_by_key(|r| r.created_at);
        Ok(rows)
    }

    async fn list_distributions_for_referrals(
        &self,
        referral_ids: &[Uuid],
    ) -> Result<Vec<RevenueDistributionRow>, AppError> {
        Ok(self
            .tables
            .lock()
            .unwrap()
            .distributions
            .values()
            .filter(|d| referral_ids.contains(&d.referral_id))
            .cloned()
            .collect())
    }

    async fn list_distributions_for_member(
        &self,
        member_id: Uuid,
        status: Option<DistributionStatus>,
    ) -> Result<Vec<RevenueDistributionRow>, AppError> {
        let mut rows: Vec<RevenueDistributionRow> = self
            .tables
            .lock()
            .unwrap()
            .distributions
            .values()
            .filter(|d| d.involves(member_id))
            .filter(|d| status.map_or(true, |s| d.status == s.as_str()))
            .cloned()
            .collect();
        rows.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(rows)
    }
}
