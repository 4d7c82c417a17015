use skybook_booking::ReservationCoordinator;
use skybook_core::cache::Cache;
use skybook_core::collaborators::{LoyaltyService, NotificationDispatcher};
use skybook_core::repository::{AirportRepository, BookingRepository, FlightRepository};
use skybook_fare::FareEstimator;
use skybook_search::SearchEngine;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub search: Arc<SearchEngine>,
    pub coordinator: Arc<ReservationCoordinator>,
    pub airports: Arc<dyn AirportRepository>,
    pub flights: Arc<dyn FlightRepository>,
    pub bookings: Arc<dyn BookingRepository>,
    pub loyalty: Arc<dyn LoyaltyService>,
    pub notifier: Arc<dyn NotificationDispatcher>,
    pub cache: Arc<dyn Cache>,
    pub estimator: FareEstimator,
}
