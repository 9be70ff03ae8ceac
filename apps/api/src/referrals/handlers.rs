//! Axum route handlers for referral status.

use axum::{
    extract::State,
    Json,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::access::caller::Caller;
use crate::access::policy::Feature;
use crate::errors::AppError;
use crate::extract::{ApiJson, ApiPath};
use crate::models::referral::{JobRow, ReferralRow};
use crate::referrals::service::transition_referral;
use crate::referrals::status::{pipeline_stage, PipelineStage, ReferralStatus};
use crate::state::AppState;
use crate::store::ReferralStore;

#[derive(Debug, Serialize)]
pub struct ReferralDetailResponse {
    pub referral: ReferralRow,
    pub pipeline_stage: PipelineStage,
}

#[derive(Debug, Deserialize)]
pub struct TransitionRequest {
    pub status: String,
}

#[derive(Debug, Serialize)]
pub struct TransitionResponse {
    pub ok: bool,
    pub referral_id: Uuid,
    pub status: ReferralStatus,
}

/// Loads a referral together with its job, or `NotFound`.
pub async fn load_referral_and_job(
    store: &dyn ReferralStore,
    referral_id: Uuid,
) -> Result<(ReferralRow, JobRow), AppError> {
    let referral = store
        .get_referral(referral_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Referral {referral_id} not found")))?;
    let job = store
        .get_job(referral.job_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Job {} not found", referral.job_id)))?;
    Ok((referral, job))
}

/// GET /api/v1/referrals/:id
///
/// Visible to the referrer and to the client who owns the job.
pub async fn handle_get_referral(
    State(state): State<AppState>,
    caller: Caller,
    ApiPath(referral_id): ApiPath<Uuid>,
) -> Result<Json<ReferralDetailResponse>, AppError> {
    caller.profile(state.store.as_ref()).await?;
    let (referral, job) = load_referral_and_job(state.store.as_ref(), referral_id).await?;

    if referral.referrer_id != caller.user_id && job.client_id != caller.user_id {
        return Err(AppError::Forbidden);
    }

    let stage = pipeline_stage(referral.status(), referral.created_at, Utc::now());
    Ok(Json(ReferralDetailResponse {
        referral,
        pipeline_stage: stage,
    }))
}

/// POST /api/v1/referrals/:id/status
///
/// Client review step. `hired` is rejected here; use POST /api/v1/distributions.
pub async fn handle_transition(
    State(state): State<AppState>,
    caller: Caller,
    ApiPath(referral_id): ApiPath<Uuid>,
    ApiJson(request): ApiJson<TransitionRequest>,
) -> Result<Json<TransitionResponse>, AppError> {
    let next = ReferralStatus::parse(&request.status).ok_or_else(|| {
        AppError::Validation(format!("Unknown referral status '{}'", request.status))
    })?;

    caller
        .require(state.store.as_ref(), Feature::ReviewReferrals)
        .await?;
    let (referral, job) = load_referral_and_job(state.store.as_ref(), referral_id).await?;
    if job.client_id != caller.user_id {
        return Err(AppError::Forbidden);
    }

    let status = transition_referral(state.store.as_ref(), &referral, next).await?;

    Ok(Json(TransitionResponse {
        ok: true,
        referral_id,
        status,
    }))
}
