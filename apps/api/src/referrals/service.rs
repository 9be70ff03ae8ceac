use tracing::info;

use crate::errors::AppError;
use crate::models::referral::ReferralRow;
use crate::referrals::status::ReferralStatus;
use crate::store::ReferralStore;

/// Moves a referral to `next` along the status graph.
///
/// `hired` is refused here: a hire only happens through distribution
/// creation, which writes the status together with the revenue split.
pub async fn transition_referral(
    store: &dyn ReferralStore,
    referral: &ReferralRow,
    next: ReferralStatus,
) -> Result<ReferralStatus, AppError> {
    let current = referral.status();

    if next == ReferralStatus::Hired || !current.can_transition_to(next) {
        return Err(AppError::InvalidTransition {
            from: current,
            to: next,
        });
    }

    let updated = store
        .compare_and_set_status(referral.id, &referral.status, next)
        .await?;
    if !updated {
        return Err(AppError::Conflict(format!(
            "Referral {} changed status while updating; reload and retry",
            referral.id
        )));
    }

    info!("Referral {} moved {current} -> {next}", referral.id);
    Ok(next)
}
