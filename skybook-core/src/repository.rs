use crate::model::{Airport, Booking, BookingDetail, Flight, NewFlight, PassengerInput};
use crate::CoreResult;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

/// Inclusive UTC departure window a search resolves its date spec into.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimeWindow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    /// True for explicit start/end range queries, which skip SQL pagination.
    pub ranged: bool,
}

#[derive(Debug, Clone, Copy)]
pub struct Page {
    pub offset: u64,
    pub limit: u64,
}

/// Parameters for one leg query (direct search or a fan-out leg).
#[derive(Debug, Clone)]
pub struct LegQuery {
    pub origin_airport_id: Uuid,
    pub destination_airport_id: Uuid,
    pub window: TimeWindow,
    pub min_seats: u32,
    pub page: Option<Page>,
}

/// Repository trait for airport reference data. Codes resolve case-insensitively.
#[async_trait]
pub trait AirportRepository: Send + Sync {
    async fn find_by_code(&self, code: &str) -> CoreResult<Option<Airport>>;

    async fn find_by_codes(&self, codes: &[String]) -> CoreResult<Vec<Airport>>;

    async fn list_all(&self) -> CoreResult<Vec<Airport>>;
}

/// Repository trait for flight data access.
///
/// `available_capacity` is only ever mutated through the guarded
/// `try_decrement_capacity` / `restore_capacity` pair; there is no
/// unconditional write path.
#[async_trait]
pub trait FlightRepository: Send + Sync {
    async fn find_by_id(&self, id: Uuid) -> CoreResult<Option<Flight>>;

    /// Matching flights sorted by departure ascending, plus the total match
    /// count before pagination.
    async fn find_direct(&self, query: &LegQuery) -> CoreResult<(Vec<Flight>, u64)>;

    /// Candidate legs for connection building, departure ascending, capped by
    /// `limit`. No count; fan-out only needs the rows.
    async fn find_legs(&self, query: &LegQuery, limit: u32) -> CoreResult<Vec<Flight>>;

    /// Conditional decrement guarded by the availability the caller observed.
    /// Returns false when zero rows matched (the seat count moved underneath
    /// the caller, or the flight left SCHEDULED status).
    async fn try_decrement_capacity(
        &self,
        flight_id: Uuid,
        expected_available: i32,
        seats: i32,
    ) -> CoreResult<bool>;

    /// Compensating increment used when a later segment of the same
    /// reservation fails.
    async fn restore_capacity(&self, flight_id: Uuid, seats: i32) -> CoreResult<()>;

    async fn insert(&self, flight: &NewFlight) -> CoreResult<Flight>;
}

/// Repository trait for bookings and their passenger rows.
#[async_trait]
pub trait BookingRepository: Send + Sync {
    /// Inserts the booking row. A duplicate booking_reference surfaces as
    /// `ConcurrencyConflict` so the coordinator can regenerate and retry.
    async fn insert_booking(&self, booking: &Booking) -> CoreResult<()>;

    async fn insert_passengers(
        &self,
        booking_id: Uuid,
        passengers: &[PassengerInput],
    ) -> CoreResult<()>;

    /// Compensating hard delete; removes passenger rows with the booking.
    async fn delete_booking(&self, booking_id: Uuid) -> CoreResult<()>;

    async fn find_by_reference(&self, reference: &str) -> CoreResult<Option<BookingDetail>>;
}
