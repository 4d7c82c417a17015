use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Immutable reference entity, loaded by an administrative process outside this core.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Airport {
    pub id: Uuid,
    pub code: String,
    pub name: String,
    pub city: String,
    pub country: String,
}

/// Compact airport view embedded in flight and itinerary payloads.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AirportRef {
    pub id: Uuid,
    pub code: String,
    pub name: String,
    pub city: String,
    pub country: String,
}

impl From<Airport> for AirportRef {
    fn from(a: Airport) -> Self {
        Self {
            id: a.id,
            code: a.code,
            name: a.name,
            city: a.city,
            country: a.country,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum FlightStatus {
    SCHEDULED,
    CANCELLED,
    COMPLETED,
    DELAYED,
}

impl FlightStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            FlightStatus::SCHEDULED => "SCHEDULED",
            FlightStatus::CANCELLED => "CANCELLED",
            FlightStatus::COMPLETED => "COMPLETED",
            FlightStatus::DELAYED => "DELAYED",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "SCHEDULED" => Some(FlightStatus::SCHEDULED),
            "CANCELLED" => Some(FlightStatus::CANCELLED),
            "COMPLETED" => Some(FlightStatus::COMPLETED),
            "DELAYED" => Some(FlightStatus::DELAYED),
            _ => None,
        }
    }
}

/// A stored, schedulable flight. Multi-leg structure is a search-time construct;
/// every persisted flight is a single direct segment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Flight {
    pub id: Uuid,
    pub flight_number: String,
    pub origin: AirportRef,
    pub destination: AirportRef,
    pub departure_time: DateTime<Utc>,
    pub arrival_time: DateTime<Utc>,
    pub duration_minutes: i32,
    pub total_capacity: i32,
    pub available_capacity: i32,
    pub base_price: f64,
    pub predicted_price: Option<f64>,
    pub status: FlightStatus,
    pub is_direct: bool,
}

/// Insert payload for the administrative flight-creation flow.
#[derive(Debug, Clone)]
pub struct NewFlight {
    pub flight_number: String,
    pub origin_airport_id: Uuid,
    pub destination_airport_id: Uuid,
    pub departure_time: DateTime<Utc>,
    pub arrival_time: DateTime<Utc>,
    pub duration_minutes: i32,
    pub total_capacity: i32,
    pub base_price: f64,
    pub predicted_price: f64,
    pub is_direct: bool,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum PaymentMethod {
    CASH,
    MILES,
}

impl PaymentMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentMethod::CASH => "CASH",
            PaymentMethod::MILES => "MILES",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "CASH" => Some(PaymentMethod::CASH),
            "MILES" => Some(PaymentMethod::MILES),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum BookingStatus {
    CONFIRMED,
    CANCELLED,
}

impl BookingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            BookingStatus::CONFIRMED => "CONFIRMED",
            BookingStatus::CANCELLED => "CANCELLED",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "CONFIRMED" => Some(BookingStatus::CONFIRMED),
            "CANCELLED" => Some(BookingStatus::CANCELLED),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Booking {
    pub id: Uuid,
    pub booking_reference: String,
    /// Primary flight id (first segment for connections).
    pub flight_id: Uuid,
    /// All segment ids in travel order; single element for direct bookings.
    pub flight_segments: Vec<Uuid>,
    pub miles_member_id: Option<Uuid>,
    pub passenger_count: i32,
    pub total_price: f64,
    pub points_used: i64,
    pub payment_method: PaymentMethod,
    pub status: BookingStatus,
    pub contact_email: String,
    pub contact_phone: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Passenger fields accepted at the reservation boundary. Unknown-shape input
/// is rejected before any state changes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PassengerInput {
    pub first_name: String,
    pub last_name: String,
    #[serde(default)]
    pub date_of_birth: Option<NaiveDate>,
    #[serde(default)]
    pub passport_number: Option<String>,
    #[serde(default)]
    pub nationality: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Passenger {
    pub id: Uuid,
    pub booking_id: Uuid,
    pub first_name: String,
    pub last_name: String,
    pub date_of_birth: Option<NaiveDate>,
    pub passport_number: Option<String>,
    pub nationality: Option<String>,
}

/// Booking plus the detail a lookup-by-reference response carries.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookingDetail {
    pub booking: Booking,
    pub flight: Flight,
    pub passengers: Vec<Passenger>,
}

/// Round a monetary amount to 2 decimals, applied at every persistence point.
pub fn round_money(amount: f64) -> f64 {
    (amount * 100.0).round() / 100.0
}
