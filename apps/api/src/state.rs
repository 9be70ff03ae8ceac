use std::sync::Arc;

use crate::revenue::split::SplitPolicy;
use crate::store::ReferralStore;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    /// Data access. `PgReferralStore` in production.
    pub store: Arc<dyn ReferralStore>,
    /// Split percentages copied into every new distribution.
    pub split_policy: SplitPolicy,
}
