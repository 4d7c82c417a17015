use crate::collaborators::{LoyaltyCredit, LoyaltyRedemption};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use skybook_shared::Masked;
use uuid::Uuid;

/// Payload handed to the notification dispatcher after a reservation commits.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookingConfirmation {
    pub booking_id: Uuid,
    pub booking_reference: String,
    pub contact_email: Masked<String>,
    pub flight_numbers: String,
    pub origin_code: String,
    pub origin_city: String,
    pub destination_code: String,
    pub destination_city: String,
    pub departure_time: DateTime<Utc>,
    pub passenger_count: i32,
    pub passenger_names: Vec<String>,
    pub total_price: f64,
    pub is_connecting: bool,
}

/// Work the coordinator defers until after its transaction commits. The
/// transport layer drains the list through message-passing; none of these
/// can fail the booking they belong to.
#[derive(Debug, Clone)]
pub enum SideEffect {
    RedeemPoints(LoyaltyRedemption),
    CreditPoints(LoyaltyCredit),
    Notify(BookingConfirmation),
}
