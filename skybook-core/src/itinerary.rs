use crate::model::{AirportRef, Flight};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Requested travel date(s). A single date may be flexible (searched across
/// a surrounding window); an explicit range is bounded to 30 days.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum DateSpec {
    Single { date: NaiveDate, flexible: bool },
    Range { start: NaiveDate, end: NaiveDate },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchQuery {
    pub origin: String,
    pub destination: String,
    pub date: DateSpec,
    pub passengers: u32,
    pub direct_only: bool,
    pub page: u32,
    pub limit: u32,
}

/// One leg of a connecting itinerary as presented to clients.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SegmentView {
    pub flight_id: Uuid,
    pub flight_number: String,
    pub origin: AirportRef,
    pub destination: AirportRef,
    pub departure_time: DateTime<Utc>,
    pub arrival_time: DateTime<Utc>,
    pub duration_minutes: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub layover_minutes: Option<i64>,
}

impl SegmentView {
    pub fn from_flight(f: &Flight, layover_minutes: Option<i64>) -> Self {
        Self {
            flight_id: f.id,
            flight_number: f.flight_number.clone(),
            origin: f.origin.clone(),
            destination: f.destination.clone(),
            departure_time: f.departure_time,
            arrival_time: f.arrival_time,
            duration_minutes: f.duration_minutes,
            layover_minutes,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DirectItinerary {
    pub flight_id: Uuid,
    pub flight_number: String,
    pub origin: AirportRef,
    pub destination: AirportRef,
    pub departure_time: DateTime<Utc>,
    pub arrival_time: DateTime<Utc>,
    pub duration_minutes: i32,
    pub available_capacity: i32,
    pub base_price: f64,
    pub predicted_price: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ConnectionItinerary {
    pub segment_ids: Vec<Uuid>,
    pub flight_number: String,
    pub origin: AirportRef,
    pub destination: AirportRef,
    pub departure_time: DateTime<Utc>,
    pub arrival_time: DateTime<Utc>,
    pub duration_minutes: i64,
    pub available_capacity: i32,
    pub base_price: f64,
    pub predicted_price: f64,
    pub connection_airport: AirportRef,
    pub layover_minutes: i64,
    pub segments: Vec<SegmentView>,
    /// Lower is better: price + 0.1 * duration + 0.05 * layover.
    pub score: f64,
}

/// A search-time travel option. Connections are assembled from two stored
/// flights sharing a hub; nothing here is ever persisted.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Itinerary {
    Direct(DirectItinerary),
    Connection(ConnectionItinerary),
}

impl Itinerary {
    pub fn is_direct(&self) -> bool {
        matches!(self, Itinerary::Direct(_))
    }

    pub fn departure_time(&self) -> DateTime<Utc> {
        match self {
            Itinerary::Direct(d) => d.departure_time,
            Itinerary::Connection(c) => c.departure_time,
        }
    }

    pub fn available_capacity(&self) -> i32 {
        match self {
            Itinerary::Direct(d) => d.available_capacity,
            Itinerary::Connection(c) => c.available_capacity,
        }
    }

    pub fn selector(&self) -> ItinerarySelector {
        match self {
            Itinerary::Direct(d) => ItinerarySelector::Direct(d.flight_id),
            Itinerary::Connection(c) => ItinerarySelector::Connection(c.segment_ids.clone()),
        }
    }
}

/// The itinerary a client asks to reserve, carried end to end as a tagged
/// union instead of a parsed composite string id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ItinerarySelector {
    Direct(Uuid),
    Connection(Vec<Uuid>),
}

impl ItinerarySelector {
    pub fn flight_ids(&self) -> Vec<Uuid> {
        match self {
            ItinerarySelector::Direct(id) => vec![*id],
            ItinerarySelector::Connection(ids) => ids.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Pagination {
    pub page: u32,
    pub limit: u32,
    pub total: u64,
    pub total_pages: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchResponse {
    pub itineraries: Vec<Itinerary>,
    pub pagination: Pagination,
    pub cached: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn selector_is_tagged_in_json() {
        let sel = ItinerarySelector::Direct(Uuid::nil());
        let json = serde_json::to_value(&sel).unwrap();
        assert_eq!(json["kind"], "direct");

        let sel = ItinerarySelector::Connection(vec![Uuid::nil(), Uuid::nil()]);
        let json = serde_json::to_value(&sel).unwrap();
        assert_eq!(json["kind"], "connection");
    }

    #[test]
    fn selector_flight_ids_preserve_order() {
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        let sel = ItinerarySelector::Connection(vec![a, b]);
        assert_eq!(sel.flight_ids(), vec![a, b]);
    }
}
