use axum::{
    extract::State,
    Json,
};
use chrono::Utc;
use serde::Deserialize;
use uuid::Uuid;

use crate::access::caller::Caller;
use crate::access::policy::Feature;
use crate::earnings::aggregator::{aggregate, EarningsSummary, EarningsWindow};
use crate::errors::AppError;
use crate::extract::ApiQuery;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct DashboardQuery {
    #[serde(default)]
    pub window: EarningsWindow,
}

/// GET /api/v1/earnings/dashboard?window=all_time|year_to_date|last_12_months
pub async fn handle_dashboard(
    State(state): State<AppState>,
    caller: Caller,
    ApiQuery(query): ApiQuery<DashboardQuery>,
) -> Result<Json<EarningsSummary>, AppError> {
    let authorized = caller
        .require(state.store.as_ref(), Feature::ViewEarnings)
        .await?;

    let referrals = state
        .store
        .list_referrals_for_referrer(caller.user_id)
        .await?;
    let ids: Vec<Uuid> = referrals.iter().map(|r| r.id).collect();
    let distributions = state.store.list_distributions_for_referrals(&ids).await?;

    Ok(Json(aggregate(
        caller.user_id,
        Some(authorized.role),
        &referrals,
        &distributions,
        query.window,
        &state.split_policy,
        Utc::now(),
    )))
}
