use axum::{
    extract::State,
    Json,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::access::caller::Caller;
use crate::access::policy::{can_access_tier, can_use_feature, Feature, Role, Tier};
use crate::errors::AppError;
use crate::extract::ApiQuery;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct AccessQuery {
    pub tier: Option<String>,
    pub feature: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct AccessResponse {
    pub user_id: Uuid,
    pub role: Option<Role>,
    pub tiers: Vec<Tier>,
    pub features: Vec<Feature>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tier_allowed: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub feature_allowed: Option<bool>,
}

/// GET /api/v1/access?tier=&feature=
///
/// What the caller's role may see and do. Unknown roles get empty lists and
/// every tier or feature check answers `false`.
pub async fn handle_get_access(
    State(state): State<AppState>,
    caller: Caller,
    ApiQuery(query): ApiQuery<AccessQuery>,
) -> Result<Json<AccessResponse>, AppError> {
    let profile = caller.profile(state.store.as_ref()).await?;
    let role = profile.role();

    Ok(Json(AccessResponse {
        user_id: caller.user_id,
        role,
        tiers: role.map(|r| r.tiers().to_vec()).unwrap_or_default(),
        features: role.map(|r| r.features().to_vec()).unwrap_or_default(),
        tier_allowed: query
            .tier
            .as_deref()
            .map(|tier| can_access_tier(&profile.role, tier)),
        feature_allowed: query
            .feature
            .as_deref()
            .map(|feature| can_use_feature(&profile.role, feature)),
    }))
}
