use axum::{async_trait, extract::FromRequestParts, http::request::Parts};
use uuid::Uuid;

use crate::access::policy::{Feature, Role};
use crate::errors::AppError;
use crate::models::profile::ProfileRow;
use crate::store::ReferralStore;

/// Header carrying the authenticated user id, set by the upstream session layer.
pub const USER_ID_HEADER: &str = "x-user-id";

/// The identity making the request. Extraction fails with `Unauthorized`
/// when the header is missing or not a UUID.
#[derive(Debug, Clone, Copy)]
pub struct Caller {
    pub user_id: Uuid,
}

#[async_trait]
impl<S> FromRequestParts<S> for Caller
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let raw = parts
            .headers
            .get(USER_ID_HEADER)
            .ok_or(AppError::Unauthorized)?
            .to_str()
            .map_err(|_| AppError::Unauthorized)?;
        let user_id = Uuid::parse_str(raw.trim()).map_err(|_| AppError::Unauthorized)?;
        Ok(Caller { user_id })
    }
}

/// A caller whose profile was found and whose role passed a feature check.
#[derive(Debug, Clone, Copy)]
pub struct Authorized {
    pub role: Role,
}

impl Caller {
    /// Loads the caller's profile. An id with no profile is `Unauthorized`.
    pub async fn profile(&self, store: &dyn ReferralStore) -> Result<ProfileRow, AppError> {
        store
            .get_profile(self.user_id)
            .await?
            .ok_or(AppError::Unauthorized)
    }

    /// Loads the profile and requires `feature`. Unknown roles are `Forbidden`.
    pub async fn require(
        &self,
        store: &dyn ReferralStore,
        feature: Feature,
    ) -> Result<Authorized, AppError> {
        let profile = self.profile(store).await?;
        let role = profile.role().ok_or(AppError::Forbidden)?;
        if !role.has_feature(feature) {
            return Err(AppError::Forbidden);
        }
        Ok(Authorized { role })
    }
}
