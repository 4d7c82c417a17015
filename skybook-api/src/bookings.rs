use crate::error::AppError;
use crate::state::AppState;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;
use serde_json::{json, Value};
use skybook_booking::{dispatch_effects, PaymentIntent, ReservationRequest};
use skybook_core::itinerary::ItinerarySelector;
use skybook_core::model::PassengerInput;
use skybook_core::CoreError;
use tracing::info;
use uuid::Uuid;

#[derive(Debug, Deserialize)]
pub struct CreateBookingRequest {
    #[serde(default)]
    pub flight_id: Option<Uuid>,
    #[serde(default)]
    pub flight_segments: Option<Vec<Uuid>>,
    pub passengers: Vec<PassengerInput>,
    pub contact_email: String,
    #[serde(default)]
    pub contact_phone: Option<String>,
    #[serde(default)]
    pub use_miles: bool,
    #[serde(default)]
    pub miles_member_id: Option<Uuid>,
}

impl CreateBookingRequest {
    /// Boundary translation into the tagged selector the core carries.
    fn selector(&self) -> Result<ItinerarySelector, CoreError> {
        match (&self.flight_segments, self.flight_id) {
            (Some(segments), _) if !segments.is_empty() => {
                if segments.len() == 1 {
                    Ok(ItinerarySelector::Direct(segments[0]))
                } else {
                    Ok(ItinerarySelector::Connection(segments.clone()))
                }
            }
            (_, Some(flight_id)) => Ok(ItinerarySelector::Direct(flight_id)),
            _ => Err(CoreError::ValidationError(
                "Missing required field: flight_id or flight_segments".into(),
            )),
        }
    }

    fn payment(&self) -> Result<PaymentIntent, CoreError> {
        match (self.use_miles, self.miles_member_id) {
            (true, Some(member_id)) => Ok(PaymentIntent::Miles {
                loyalty_member_id: member_id,
            }),
            (true, None) => Err(CoreError::ValidationError(
                "miles_member_id is required when paying with miles".into(),
            )),
            (false, member_id) => Ok(PaymentIntent::Cash {
                loyalty_member_id: member_id,
            }),
        }
    }
}

pub async fn create_booking(
    State(state): State<AppState>,
    Json(request): Json<CreateBookingRequest>,
) -> Result<(StatusCode, Json<Value>), AppError> {
    let reservation = ReservationRequest {
        selector: request.selector()?,
        passengers: request.passengers.clone(),
        contact_email: request.contact_email.clone(),
        contact_phone: request.contact_phone.clone(),
        payment: request.payment()?,
    };

    let outcome = state.coordinator.reserve(&reservation).await?;

    info!(
        booking_reference = %outcome.booking.booking_reference,
        effects = outcome.effects.len(),
        "dispatching post-commit effects"
    );
    tokio::spawn(dispatch_effects(
        outcome.effects,
        state.loyalty.clone(),
        state.notifier.clone(),
    ));

    Ok((
        StatusCode::CREATED,
        Json(json!({ "message": "Booking confirmed", "booking": outcome.booking })),
    ))
}

pub async fn get_booking(
    State(state): State<AppState>,
    Path(reference): Path<String>,
) -> Result<Json<Value>, AppError> {
    let detail = state
        .bookings
        .find_by_reference(&reference)
        .await?
        .ok_or_else(|| CoreError::NotFound(format!("Booking not found: {}", reference)))?;
    Ok(Json(json!({ "booking": detail })))
}
