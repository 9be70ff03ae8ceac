//! Earnings aggregation for member dashboards.
//!
//! Pure computation over a member's referrals and the distributions recorded
//! for them. Hired referrals with a stored distribution report the member's
//! realized share; everything else falls back to the salary-based estimate
//! times the role's split percentage.

use std::collections::{BTreeMap, HashMap};

use chrono::{DateTime, Datelike, Months, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::access::policy::Role;
use crate::models::distribution::RevenueDistributionRow;
use crate::models::referral::ReferralWithJobRow;
use crate::referrals::status::{pipeline_stage, PipelineStage, ReferralStatus};
use crate::revenue::fee::estimate_fee;
use crate::revenue::split::SplitPolicy;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EarningsWindow {
    #[default]
    AllTime,
    YearToDate,
    #[serde(rename = "last_12_months")]
    Last12Months,
}

impl EarningsWindow {
    /// Earliest `created_at` included in the window, `None` for all time.
    pub fn start(&self, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
        match self {
            EarningsWindow::AllTime => None,
            EarningsWindow::YearToDate => start_of_year(now),
            EarningsWindow::Last12Months => now.checked_sub_months(Months::new(12)),
        }
    }

    fn contains(&self, at: DateTime<Utc>, now: DateTime<Utc>) -> bool {
        self.start(now).map_or(true, |start| at >= start)
    }
}

fn start_of_year(now: DateTime<Utc>) -> Option<DateTime<Utc>> {
    Utc.with_ymd_and_hms(now.year(), 1, 1, 0, 0, 0).single()
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonthlyEarnings {
    /// `YYYY-MM`
    pub month: String,
    pub earnings: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PipelineItem {
    pub referral_id: Uuid,
    pub job_id: Uuid,
    pub job_title: String,
    pub status: ReferralStatus,
    pub stage: PipelineStage,
    pub created_at: DateTime<Utc>,
    pub estimated_fee: f64,
    pub earnings: f64,
    /// True when `earnings` comes from a recorded distribution.
    pub realized: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EarningsSummary {
    pub window: EarningsWindow,
    pub total_earnings: f64,
    pub all_time_earnings: f64,
    pub year_to_date_earnings: f64,
    pub pipeline_value: f64,
    pub success_rate: f64,
    pub referral_count: usize,
    pub hired_count: usize,
    pub monthly_series: Vec<MonthlyEarnings>,
    pub pipeline: Vec<PipelineItem>,
}

/// Fraction of a placement fee that a referrer of `role` earns.
pub fn share_fraction_for_role(role: Option<Role>, policy: &SplitPolicy) -> f64 {
    match role {
        Some(Role::SelectCircle) => policy.select_fraction(),
        Some(Role::FoundingCircle) => policy.founding_fraction(),
        Some(Role::Client) | Some(Role::Candidate) | None => 0.0,
    }
}

/// The part of a distribution paid to `member_id`.
pub fn member_share(row: &RevenueDistributionRow, member_id: Uuid) -> i64 {
    let mut share = 0;
    if row.select_member_id == Some(member_id) {
        share += row.select_share;
    }
    if row.founding_member_id == Some(member_id) {
        share += row.founding_share;
    }
    share
}

pub fn aggregate(
    user_id: Uuid,
    role: Option<Role>,
    referrals: &[ReferralWithJobRow],
    distributions: &[RevenueDistributionRow],
    window: EarningsWindow,
    policy: &SplitPolicy,
    now: DateTime<Utc>,
) -> EarningsSummary {
    let fraction = share_fraction_for_role(role, policy);
    let by_referral: HashMap<Uuid, &RevenueDistributionRow> =
        distributions.iter().map(|d| (d.referral_id, d)).collect();
    let year_start = start_of_year(now);

    let mut all_time_earnings = 0.0;
    let mut year_to_date_earnings = 0.0;
    let mut total_earnings = 0.0;
    let mut pipeline_value = 0.0;
    let mut referral_count = 0;
    let mut hired_count = 0;
    let mut monthly: BTreeMap<String, f64> = BTreeMap::new();
    let mut pipeline = Vec::new();

    for referral in referrals {
        let status = referral.status();
        let estimated_fee = estimate_fee(referral.salary_min, referral.salary_max);
        let (earnings, realized) = match by_referral.get(&referral.id) {
            Some(d) if status == ReferralStatus::Hired => (member_share(d, user_id) as f64, true),
            _ => (estimated_fee * fraction, false),
        };

        if status == ReferralStatus::Hired {
            all_time_earnings += earnings;
            if year_start.map_or(true, |start| referral.created_at >= start) {
                year_to_date_earnings += earnings;
            }
        }

        if !window.contains(referral.created_at, now) {
            continue;
        }

        referral_count += 1;
        match status {
            ReferralStatus::Hired => {
                hired_count += 1;
                total_earnings += earnings;
                *monthly
                    .entry(referral.created_at.format("%Y-%m").to_string())
                    .or_insert(0.0) += earnings;
            }
            ReferralStatus::Rejected => {}
            _ => pipeline_value += earnings,
        }

        pipeline.push(PipelineItem {
            referral_id: referral.id,
            job_id: referral.job_id,
            job_title: referral.job_title.clone(),
            status,
            stage: pipeline_stage(status, referral.created_at, now),
            created_at: referral.created_at,
            estimated_fee,
            earnings,
            realized,
        });
    }

    pipeline.sort_by(|a, b| b.created_at.cmp(&a.created_at));

    let success_rate = if referral_count == 0 {
        0.0
    } else {
        hired_count as f64 / referral_count as f64
    };

    EarningsSummary {
        window,
        total_earnings,
        all_time_earnings,
        year_to_date_earnings,
        pipeline_value,
        success_rate,
        referral_count,
        hired_count,
        monthly_series: monthly
            .into_iter()
            .map(|(month, earnings)| MonthlyEarnings { month, earnings })
            .collect(),
        pipeline,
    }
}

#[cfg(test)]
mod tests {
    use chrono::Duration;

    use super::*;
    use crate::models::distribution::DistributionStatus;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 6, 15, 12, 0, 0).unwrap()
    }

    fn referral(
        referrer: Uuid,
        status: &str,
        created_at: DateTime<Utc>,
        salary: (Option<i64>, Option<i64>),
    ) -> ReferralWithJobRow {
        ReferralWithJobRow {
            id: Uuid::new_v4(),
            job_id: Uuid::new_v4(),
            referrer_id: referrer,
            status: status.to_string(),
            created_at,
            job_title: "Platform Engineer".to_string(),
            salary_min: salary.0,
            salary_max: salary.1,
            subscription_tier: "connect".to_string(),
        }
    }

    fn distribution(referral_id: Uuid, select: Option<Uuid>, fee: i64) -> RevenueDistributionRow {
        let policy = SplitPolicy::CURRENT;
        let shares = policy.split(fee);
        RevenueDistributionRow {
            id: Uuid::new_v4(),
            referral_id,
            founding_member_id: None,
            select_member_id: select,
            placement_fee: fee,
            currency: "USD".to_string(),
            platform_share: shares.platform,
            select_share: shares.select,
            founding_share: shares.founding,
            split_version: policy.version as i32,
            platform_bps: policy.platform_bps as i32,
            select_bps: policy.select_bps as i32,
            founding_bps: policy.founding_bps as i32,
            status: DistributionStatus::Calculated.as_str().to_string(),
            created_at: now(),
        }
    }

    const RANGE: (Option<i64>, Option<i64>) = (Some(100_000), Some(200_000));

    #[test]
    fn test_no_referrals_yields_zeroes() {
        let summary = aggregate(
            Uuid::new_v4(),
            Some(Role::SelectCircle),
            &[],
            &[],
            EarningsWindow::AllTime,
            &SplitPolicy::CURRENT,
            now(),
        );
        assert_eq!(summary.success_rate, 0.0);
        assert_eq!(summary.total_earnings, 0.0);
        assert_eq!(summary.pipeline_value, 0.0);
        assert!(summary.monthly_series.is_empty());
        assert!(summary.pipeline.is_empty());
    }

    #[test]
    fn test_select_member_mixes_realized_and_estimated() {
        let user = Uuid::new_v4();
        let t = now() - Duration::days(30);
        let hired_with_split = referral(user, "hired", t, RANGE);
        let hired_without_split = referral(user, "hired", t, RANGE);
        let open = referral(user, "interviewing", t, RANGE);
        let rejected = referral(user, "rejected", t, RANGE);
        let dists = vec![distribution(hired_with_split.id, Some(user), 10_000)];

        let summary = aggregate(
            user,
            Some(Role::SelectCircle),
            &[hired_with_split, hired_without_split, open, rejected],
            &dists,
            EarningsWindow::AllTime,
            &SplitPolicy::CURRENT,
            now(),
        );

        // realized 4_000 + estimated 30_000 * 0.40
        assert_eq!(summary.total_earnings, 16_000.0);
        assert_eq!(summary.pipeline_value, 12_000.0);
        assert_eq!(summary.hired_count, 2);
        assert_eq!(summary.referral_count, 4);
        assert_eq!(summary.success_rate, 0.5);
        assert_eq!(summary.pipeline.iter().filter(|p| p.realized).count(), 1);
    }

    #[test]
    fn test_founding_member_estimate_uses_fifteen_percent() {
        let user = Uuid::new_v4();
        let refs = vec![referral(user, "hired", now() - Duration::days(2), RANGE)];
        let summary = aggregate(
            user,
            Some(Role::FoundingCircle),
            &refs,
            &[],
            EarningsWindow::AllTime,
            &SplitPolicy::CURRENT,
            now(),
        );
        assert!((summary.total_earnings - 4_500.0).abs() < 1e-9);
    }

    #[test]
    fn test_non_circle_roles_earn_nothing() {
        let user = Uuid::new_v4();
        let refs = vec![
            referral(user, "hired", now(), RANGE),
            referral(user, "submitted", now(), RANGE),
        ];
        let summary = aggregate(
            user,
            Some(Role::Client),
            &refs,
            &[],
            EarningsWindow::AllTime,
            &SplitPolicy::CURRENT,
            now(),
        );
        assert_eq!(summary.total_earnings, 0.0);
        assert_eq!(summary.pipeline_value, 0.0);
        assert_eq!(summary.success_rate, 0.5);
    }

    #[test]
    fn test_monthly_series_sorted_by_month() {
        let user = Uuid::new_v4();
        let march = Utc.with_ymd_and_hms(2026, 3, 10, 0, 0, 0).unwrap();
        let january = Utc.with_ymd_and_hms(2026, 1, 20, 0, 0, 0).unwrap();
        let december = Utc.with_ymd_and_hms(2025, 12, 31, 23, 0, 0).unwrap();
        let refs = vec![
            referral(user, "hired", march, RANGE),
            referral(user, "hired", december, RANGE),
            referral(user, "hired", january, RANGE),
            referral(user, "hired", march, (Some(50_000), None)),
        ];
        let summary = aggregate(
            user,
            Some(Role::SelectCircle),
            &refs,
            &[],
            EarningsWindow::AllTime,
            &SplitPolicy::CURRENT,
            now(),
        );
        let months: Vec<&str> = summary
            .monthly_series
            .iter()
            .map(|m| m.month.as_str())
            .collect();
        assert_eq!(months, vec!["2025-12", "2026-01", "2026-03"]);
        // 12_000 + 50_000 * 0.2 * 0.4
        assert!((summary.monthly_series[2].earnings - 16_000.0).abs() < 1e-9);
    }

    #[test]
    fn test_year_to_date_window_filters_old_referrals() {
        let user = Uuid::new_v4();
        let last_year = Utc.with_ymd_and_hms(2025, 11, 1, 0, 0, 0).unwrap();
        let this_year = Utc.with_ymd_and_hms(2026, 2, 1, 0, 0, 0).unwrap();
        let refs = vec![
            referral(user, "hired", last_year, RANGE),
            referral(user, "hired", this_year, RANGE),
            referral(user, "submitted", last_year, RANGE),
        ];
        let summary = aggregate(
            user,
            Some(Role::SelectCircle),
            &refs,
            &[],
            EarningsWindow::YearToDate,
            &SplitPolicy::CURRENT,
            now(),
        );
        assert_eq!(summary.referral_count, 1);
        assert_eq!(summary.total_earnings, 12_000.0);
        assert_eq!(summary.year_to_date_earnings, 12_000.0);
        assert_eq!(summary.all_time_earnings, 24_000.0);
        assert_eq!(summary.pipeline_value, 0.0);
    }

    #[test]
    fn test_last_12_months_window_cuts_at_same_day_last_year() {
        let user = Uuid::new_v4();
        let inside = Utc.with_ymd_and_hms(2025, 6, 15, 12, 0, 0).unwrap();
        let outside = Utc.with_ymd_and_hms(2025, 6, 15, 11, 59, 59).unwrap();
        let refs = vec![
            referral(user, "hired", inside, RANGE),
            referral(user, "hired", outside, RANGE),
            referral(user, "submitted", outside, RANGE),
        ];
        let summary = aggregate(
            user,
            Some(Role::SelectCircle),
            &refs,
            &[],
            EarningsWindow::Last12Months,
            &SplitPolicy::CURRENT,
            now(),
        );
        assert_eq!(EarningsWindow::Last12Months.start(now()), Some(inside));
        assert_eq!(summary.referral_count, 1);
        assert_eq!(summary.hired_count, 1);
        assert_eq!(summary.total_earnings, 12_000.0);
        assert_eq!(summary.all_time_earnings, 24_000.0);
        let months: Vec<&str> = summary
            .monthly_series
            .iter()
            .map(|m| m.month.as_str())
            .collect();
        assert_eq!(months, vec!["2025-06"]);
    }

    #[test]
    fn test_window_names_on_the_wire() {
        let parsed: EarningsWindow = serde_json::from_str("\"last_12_months\"").unwrap();
        assert_eq!(parsed, EarningsWindow::Last12Months);
        assert_eq!(
            serde_json::to_value(EarningsWindow::YearToDate).unwrap(),
            serde_json::json!("year_to_date")
        );
        assert!(serde_json::from_str::<EarningsWindow>("\"last12_months\"").is_err());
    }

    #[test]
    fn test_aged_review_shows_as_interviewing_without_touching_status() {
        let user = Uuid::new_v4();
        let refs = vec![referral(user, "reviewed", now() - Duration::days(20), RANGE)];
        let summary = aggregate(
            user,
            Some(Role::SelectCircle),
            &refs,
            &[],
            EarningsWindow::AllTime,
            &SplitPolicy::CURRENT,
            now(),
        );
        let item = &summary.pipeline[0];
        assert_eq!(item.stage, PipelineStage::Interviewing);
        assert_eq!(item.status, ReferralStatus::Reviewed);
        assert_eq!(refs[0].status, "reviewed");
    }

    #[test]
    fn test_distribution_ignored_for_unhired_referral() {
        let user = Uuid::new_v4();
        let open = referral(user, "shortlisted", now(), RANGE);
        let dists = vec![distribution(open.id, Some(user), 1_000_000)];
        let summary = aggregate(
            user,
            Some(Role::SelectCircle),
            &[open],
            &dists,
            EarningsWindow::AllTime,
            &SplitPolicy::CURRENT,
            now(),
        );
        assert_eq!(summary.pipeline_value, 12_000.0);
        assert!(!summary.pipeline[0].realized);
    }

    #[test]
    fn test_member_share_sums_both_slots() {
        let user = Uuid::new_v4();
        let mut row = distribution(Uuid::new_v4(), Some(user), 10_000);
        assert_eq!(member_share(&row, user), 4_000);
        row.founding_member_id = Some(user);
        assert_eq!(member_share(&row, user), 5_500);
        assert_eq!(member_share(&row, Uuid::new_v4()), 0);
    }
}
