use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::FromRow;
use uuid::Uuid;

use crate::referrals::status::ReferralStatus;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ReferralRow {
    pub id: Uuid,
    pub job_id: Uuid,
    pub referrer_id: Uuid,
    pub candidate_name: String,
    pub candidate_email: String,
    pub candidate_phone: Option<String>,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub metadata: Option<Value>,
}

impl ReferralRow {
    pub fn status(&self) -> ReferralStatus {
        ReferralStatus::from_stored(&self.status)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct JobRow {
    pub id: Uuid,
    pub client_id: Uuid,
    pub title: String,
    pub salary_min: Option<i64>,
    pub salary_max: Option<i64>,
    pub subscription_tier: String,
    pub created_at: DateTime<Utc>,
}

/// A referral joined with the salary fields of its job, as read for earnings.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ReferralWithJobRow {
    pub id: Uuid,
    pub job_id: Uuid,
    pub referrer_id: Uuid,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub job_title: String,
    pub salary_min: Option<i64>,
    pub salary_max: Option<i64>,
    pub subscription_tier: String,
}

impl ReferralWithJobRow {
    pub fn status(&self) -> ReferralStatus {
        ReferralStatus::from_stored(&self.status)
    }
}
