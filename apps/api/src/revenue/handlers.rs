//! Axum route handlers for revenue distributions.

use axum::{
    extract::State,
    http::StatusCode,
    Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::access::caller::Caller;
use crate::access::policy::Feature;
use crate::earnings::aggregator::member_share;
use crate::errors::AppError;
use crate::extract::{ApiJson, ApiPath, ApiQuery};
use crate::models::distribution::{DistributionStatus, RevenueDistributionRow};
use crate::referrals::handlers::load_referral_and_job;
use crate::revenue::distributor::{
    distribute, validate_request, DistributionBreakdown, DistributionRequest,
};
use crate::state::AppState;

// ────────────────────────────────────────────────────────────────────────────
// Request / Response types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
pub struct DistributionResponse {
    pub distribution_id: Uuid,
    pub referral_id: Uuid,
    pub placement_fee: i64,
    pub currency: String,
    pub split_version: i32,
    pub breakdown: DistributionBreakdown,
    pub status: String,
    pub created_at: DateTime<Utc>,
}

impl From<&RevenueDistributionRow> for DistributionResponse {
    fn from(row: &RevenueDistributionRow) -> Self {
        DistributionResponse {
            distribution_id: row.id,
            referral_id: row.referral_id,
            placement_fee: row.placement_fee,
            currency: row.currency.clone(),
            split_version: row.split_version,
            breakdown: DistributionBreakdown::from(row),
            status: row.status.clone(),
            created_at: row.created_at,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct ListDistributionsQuery {
    pub status: Option<String>,
}

/// One distribution as seen by a member who receives part of it.
#[derive(Debug, Serialize)]
pub struct DistributionSummary {
    pub distribution_id: Uuid,
    pub referral_id: Uuid,
    pub placement_fee: i64,
    pub currency: String,
    /// The caller's own share: select and/or founding slot.
    pub member_share: i64,
    pub status: String,
    pub created_at: DateTime<Utc>,
}

impl DistributionSummary {
    fn for_member(row: &RevenueDistributionRow, member_id: Uuid) -> Self {
        DistributionSummary {
            distribution_id: row.id,
            referral_id: row.referral_id,
            placement_fee: row.placement_fee,
            currency: row.currency.clone(),
            member_share: member_share(row, member_id),
            status: row.status.clone(),
            created_at: row.created_at,
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Handlers
// ────────────────────────────────────────────────────────────────────────────

/// POST /api/v1/distributions
///
/// Splits the negotiated placement fee and marks the referral hired.
/// 201 on first creation, 200 when the referral already had a distribution.
pub async fn handle_create_distribution(
    State(state): State<AppState>,
    caller: Caller,
    ApiJson(request): ApiJson<DistributionRequest>,
) -> Result<(StatusCode, Json<DistributionResponse>), AppError> {
    let request = validate_request(&request)?;

    caller
        .require(state.store.as_ref(), Feature::CreateDistributions)
        .await?;
    let (_, job) = load_referral_and_job(state.store.as_ref(), request.referral_id).await?;
    if job.client_id != caller.user_id {
        return Err(AppError::Forbidden);
    }

    let outcome = distribute(state.store.as_ref(), state.split_policy, request).await?;
    let status = if outcome.created {
        StatusCode::CREATED
    } else {
        StatusCode::OK
    };

    Ok((status, Json(DistributionResponse::from(&outcome.distribution))))
}

/// GET /api/v1/distributions?status=calculated|paid
///
/// Distributions where the caller is the resolved founding or select member.
pub async fn handle_list_distributions(
    State(state): State<AppState>,
    caller: Caller,
    ApiQuery(query): ApiQuery<ListDistributionsQuery>,
) -> Result<Json<Vec<DistributionSummary>>, AppError> {
    let status = match query.status.as_deref() {
        None | Some("") => None,
        Some(raw) => Some(DistributionStatus::parse(raw).ok_or_else(|| {
            AppError::Validation(format!("Unknown distribution status '{raw}'"))
        })?),
    };

    caller
        .require(state.store.as_ref(), Feature::ViewDistributions)
        .await?;

    let rows = state
        .store
        .list_distributions_for_member(caller.user_id, status)
        .await?;

    Ok(Json(
        rows.iter()
            .map(|row| DistributionSummary::for_member(row, caller.user_id))
            .collect(),
    ))
}

/// GET /api/v1/distributions/:id
///
/// Visible to the resolved members and to the client who owns the job.
pub async fn handle_get_distribution(
    State(state): State<AppState>,
    caller: Caller,
    ApiPath(distribution_id): ApiPath<Uuid>,
) -> Result<Json<DistributionResponse>, AppError> {
    caller.profile(state.store.as_ref()).await?;

    let row = state
        .store
        .get_distribution(distribution_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Distribution {distribution_id} not found")))?;

    if !row.involves(caller.user_id) {
        let (_, job) = load_referral_and_job(state.store.as_ref(), row.referral_id).await?;
        if job.client_id != caller.user_id {
            return Err(AppError::Forbidden);
        }
    }

    Ok(Json(DistributionResponse::from(&row)))
}
