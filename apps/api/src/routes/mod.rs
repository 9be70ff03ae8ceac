pub mod health;

use axum::{
    routing::{get, post},
    Router,
};

use crate::access::handlers as access;
use crate::earnings::handlers as earnings;
use crate::referrals::handlers as referrals;
use crate::revenue::handlers as revenue;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        .route("/api/v1/access", get(access::handle_get_access))
        // Referral lifecycle
        .route("/api/v1/referrals/:id", get(referrals::handle_get_referral))
        .route(
            "/api/v1/referrals/:id/status",
            post(referrals::handle_transition),
        )
        // Revenue distributions
        .route(
            "/api/v1/distributions",
            post(revenue::handle_create_distribution).get(revenue::handle_list_distributions),
        )
        .route(
            "/api/v1/distributions/:id",
            get(revenue::handle_get_distribution),
        )
        // Earnings
        .route("/api/v1/earnings/dashboard", get(earnings::handle_dashboard))
        .with_state(state)
}
