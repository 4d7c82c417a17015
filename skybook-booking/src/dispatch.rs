use skybook_core::collaborators::{LoyaltyService, NotificationDispatcher};
use skybook_core::effects::SideEffect;
use std::sync::Arc;
use tracing::{info, warn};

/// Drains the side effects a committed reservation deferred. Every effect is
/// best-effort: a failing collaborator is logged and skipped, the booking
/// stands either way.
pub async fn dispatch_effects(
    effects: Vec<SideEffect>,
    loyalty: Arc<dyn LoyaltyService>,
    notifier: Arc<dyn NotificationDispatcher>,
) {
    for effect in effects {
        match effect {
            SideEffect::RedeemPoints(redemption) => {
                if let Err(e) = loyalty.redeem(&redemption).await {
                    warn!(
                        booking_id = %redemption.booking_id,
                        points = redemption.points,
                        error = %e,
                        "loyalty redemption failed, booking stands"
                    );
                }
            }
            SideEffect::CreditPoints(credit) => match loyalty.credit(&credit).await {
                Ok(points) => info!(
                    booking_id = %credit.booking_id,
                    points,
                    "loyalty points credited"
                ),
                Err(e) => warn!(
                    booking_id = %credit.booking_id,
                    error = %e,
                    "loyalty credit failed, booking stands"
                ),
            },
            SideEffect::Notify(confirmation) => {
                if let Err(e) = notifier.dispatch_booking_confirmation(&confirmation).await {
                    warn!(
                        booking_reference = %confirmation.booking_reference,
                        error = %e,
                        "booking confirmation dispatch failed"
                    );
                }
            }
        }
    }
}
