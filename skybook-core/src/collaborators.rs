use crate::effects::BookingConfirmation;
use crate::CoreResult;
use async_trait::async_trait;
use uuid::Uuid;

/// Points credited for a completed journey: 1 point per flown minute per
/// passenger, recorded in the loyalty ledger by the collaborator.
#[derive(Debug, Clone)]
pub struct LoyaltyCredit {
    pub member_id: Uuid,
    pub booking_id: Uuid,
    pub flight_id: Uuid,
    pub duration_minutes: i64,
    pub passenger_count: i32,
}

#[derive(Debug, Clone)]
pub struct LoyaltyRedemption {
    pub member_id: Uuid,
    pub booking_id: Uuid,
    pub flight_id: Uuid,
    pub points: i64,
    pub booking_reference: String,
}

/// External loyalty ledger. Credit and redemption run after commit and are
/// best-effort from the reservation's point of view; only the balance check
/// sits on the critical path.
#[async_trait]
pub trait LoyaltyService: Send + Sync {
    async fn balance(&self, member_id: Uuid) -> CoreResult<i64>;

    /// Returns the number of points credited.
    async fn credit(&self, credit: &LoyaltyCredit) -> CoreResult<i64>;

    async fn redeem(&self, redemption: &LoyaltyRedemption) -> CoreResult<()>;
}

/// Fire-and-forget delivery of booking confirmations to the messaging
/// transport. Failures are logged by callers and never fail a booking.
#[async_trait]
pub trait NotificationDispatcher: Send + Sync {
    async fn dispatch_booking_confirmation(
        &self,
        confirmation: &BookingConfirmation,
    ) -> CoreResult<()>;
}
