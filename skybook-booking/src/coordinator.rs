use crate::reference;
use chrono::Utc;
use skybook_core::cache::{flight_detail_key, Cache, SEARCH_KEY_PREFIX};
use skybook_core::collaborators::{LoyaltyCredit, LoyaltyRedemption, LoyaltyService};
use skybook_core::effects::{BookingConfirmation, SideEffect};
use skybook_core::itinerary::ItinerarySelector;
use skybook_core::model::{
    round_money, Booking, BookingStatus, Flight, FlightStatus, PassengerInput, PaymentMethod,
};
use skybook_core::repository::{BookingRepository, FlightRepository};
use skybook_core::{CoreError, CoreResult};
use skybook_fare::{FareEstimator, FareInput};
use skybook_shared::Masked;
use std::sync::Arc;
use tracing::{error, info, warn};
use uuid::Uuid;

/// How many reference collisions we tolerate before giving up on the insert.
const REFERENCE_ATTEMPTS: usize = 5;

/// One currency unit equals 100 loyalty points; requirements round up.
const POINTS_PER_CURRENCY_UNIT: f64 = 100.0;

#[derive(Debug, Clone, PartialEq)]
pub enum PaymentIntent {
    Cash { loyalty_member_id: Option<Uuid> },
    Miles { loyalty_member_id: Uuid },
}

impl PaymentIntent {
    pub fn loyalty_member_id(&self) -> Option<Uuid> {
        match self {
            PaymentIntent::Cash { loyalty_member_id } => *loyalty_member_id,
            PaymentIntent::Miles { loyalty_member_id } => Some(*loyalty_member_id),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ReservationRequest {
    pub selector: ItinerarySelector,
    pub passengers: Vec<PassengerInput>,
    pub contact_email: String,
    pub contact_phone: Option<String>,
    pub payment: PaymentIntent,
}

#[derive(Debug)]
pub struct ReservationOutcome {
    pub booking: Booking,
    /// Post-commit work for the transport layer, in dispatch order.
    pub effects: Vec<SideEffect>,
}

/// Converts a selected itinerary into a durable booking.
///
/// Per segment the reservation walks available -> locked (validation read)
/// -> decremented (guarded update) -> committed; any failure past the first
/// decrement compensates every prior decrement and removes the booking and
/// passenger rows before the error reaches the caller. Capacity reads always
/// hit the repository, never the cache.
pub struct ReservationCoordinator {
    flights: Arc<dyn FlightRepository>,
    bookings: Arc<dyn BookingRepository>,
    loyalty: Arc<dyn LoyaltyService>,
    cache: Arc<dyn Cache>,
    estimator: FareEstimator,
}

impl ReservationCoordinator {
    pub fn new(
        flights: Arc<dyn FlightRepository>,
        bookings: Arc<dyn BookingRepository>,
        loyalty: Arc<dyn LoyaltyService>,
        cache: Arc<dyn Cache>,
        estimator: FareEstimator,
    ) -> Self {
        Self {
            flights,
            bookings,
            loyalty,
            cache,
            estimator,
        }
    }

    pub async fn reserve(&self, request: &ReservationRequest) -> CoreResult<ReservationOutcome> {
        let passengers = validate_passengers(&request.passengers)?;
        let contact_email = validate_contact_email(&request.contact_email)?;
        let passenger_count = passengers.len() as i32;

        let flight_ids = request.selector.flight_ids();
        if flight_ids.is_empty() {
            return Err(CoreError::ValidationError(
                "Itinerary has no flight segments".to_string(),
            ));
        }

        // Fresh reads; whatever a search cached earlier is irrelevant here.
        let mut segments: Vec<Flight> = Vec::with_capacity(flight_ids.len());
        for id in &flight_ids {
            let flight = self
                .flights
                .find_by_id(*id)
                .await?
                .ok_or_else(|| CoreError::NotFound(format!("Flight not found: {}", id)))?;
            if flight.status != FlightStatus::SCHEDULED {
                return Err(CoreError::ValidationError(format!(
                    "Flight {} is not available for booking",
                    flight.flight_number
                )));
            }
            if flight.available_capacity < passenger_count {
                return Err(CoreError::ValidationError(format!(
                    "Not enough seats on flight {}: {} available, {} requested",
                    flight.flight_number, flight.available_capacity, passenger_count
                )));
            }
            segments.push(flight);
        }

        let per_passenger: f64 = segments.iter().map(|f| self.segment_fare(f)).sum();
        let mut total_price = round_money(per_passenger * passenger_count as f64);
        let mut points_used: i64 = 0;
        let mut payment_method = PaymentMethod::CASH;

        if let PaymentIntent::Miles { loyalty_member_id } = request.payment {
            let points_needed = (total_price * POINTS_PER_CURRENCY_UNIT).ceil() as i64;
            let balance = self.loyalty.balance(loyalty_member_id).await?;
            if balance < points_needed {
                return Err(CoreError::ValidationError(format!(
                    "Not enough loyalty points: {} available, {} required",
                    balance, points_needed
                )));
            }
            points_used = points_needed;
            payment_method = PaymentMethod::MILES;
            total_price = 0.0;
        }

        let booking = self
            .insert_with_unique_reference(
                &flight_ids,
                request,
                &contact_email,
                passenger_count,
                total_price,
                points_used,
                payment_method,
            )
            .await?;

        if let Err(e) = self.bookings.insert_passengers(booking.id, &passengers).await {
            warn!(booking_id = %booking.id, error = %e, "passenger insert failed, removing booking");
            if let Err(del) = self.bookings.delete_booking(booking.id).await {
                error!(booking_id = %booking.id, error = %del, "compensating booking delete failed");
            }
            return Err(e);
        }

        let mut decremented: Vec<&Flight> = Vec::new();
        for flight in &segments {
            match self
                .flights
                .try_decrement_capacity(flight.id, flight.available_capacity, passenger_count)
                .await
            {
                Ok(true) => decremented.push(flight),
                Ok(false) => {
                    self.roll_back(&booking, &decremented, passenger_count).await;
                    return Err(CoreError::ConcurrencyConflict(format!(
                        "Seat availability changed on flight {}, please retry the booking",
                        flight.flight_number
                    )));
                }
                Err(e) => {
                    self.roll_back(&booking, &decremented, passenger_count).await;
                    return Err(e);
                }
            }
        }

        for flight in &segments {
            self.cache.del(&flight_detail_key(flight.id)).await;
        }
        self.cache.del_by_prefix(SEARCH_KEY_PREFIX).await;

        info!(
            booking_reference = %booking.booking_reference,
            segments = segments.len(),
            passengers = passenger_count,
            total_price = booking.total_price,
            "booking confirmed"
        );

        let effects = self.build_effects(&booking, &segments, &passengers, request);
        Ok(ReservationOutcome { booking, effects })
    }

    #[allow(clippy::too_many_arguments)]
    async fn insert_with_unique_reference(
        &self,
        flight_ids: &[Uuid],
        request: &ReservationRequest,
        contact_email: &str,
        passenger_count: i32,
        total_price: f64,
        points_used: i64,
        payment_method: PaymentMethod,
    ) -> CoreResult<Booking> {
        for attempt in 1..=REFERENCE_ATTEMPTS {
            let booking = Booking {
                id: Uuid::new_v4(),
                booking_reference: reference::generate(),
                flight_id: flight_ids[0],
                flight_segments: flight_ids.to_vec(),
                miles_member_id: request.payment.loyalty_member_id(),
                passenger_count,
                total_price,
                points_used,
                payment_method,
                status: BookingStatus::CONFIRMED,
                contact_email: contact_email.to_string(),
                contact_phone: request
                    .contact_phone
                    .as_deref()
                    .map(|p| p.trim().to_string())
                    .filter(|p| !p.is_empty()),
                created_at: Utc::now(),
            };
            match self.bookings.insert_booking(&booking).await {
                Ok(()) => return Ok(booking),
                Err(CoreError::ConcurrencyConflict(_)) if attempt < REFERENCE_ATTEMPTS => {
                    warn!(attempt, "booking reference collision, regenerating");
                }
                Err(e) => return Err(e),
            }
        }
        Err(CoreError::InternalError(
            "Could not allocate a unique booking reference".to_string(),
        ))
    }

    async fn roll_back(&self, booking: &Booking, decremented: &[&Flight], seats: i32) {
        for flight in decremented {
            if let Err(e) = self.flights.restore_capacity(flight.id, seats).await {
                error!(
                    flight_id = %flight.id,
                    error = %e,
                    "compensating capacity restore failed"
                );
            }
        }
        if let Err(e) = self.bookings.delete_booking(booking.id).await {
            error!(booking_id = %booking.id, error = %e, "compensating booking delete failed");
        }
    }

    fn build_effects(
        &self,
        booking: &Booking,
        segments: &[Flight],
        passengers: &[PassengerInput],
        request: &ReservationRequest,
    ) -> Vec<SideEffect> {
        let mut effects = Vec::new();

        if booking.points_used > 0 {
            if let Some(member_id) = request.payment.loyalty_member_id() {
                effects.push(SideEffect::RedeemPoints(LoyaltyRedemption {
                    member_id,
                    booking_id: booking.id,
                    flight_id: booking.flight_id,
                    points: booking.points_used,
                    booking_reference: booking.booking_reference.clone(),
                }));
            }
        }

        if let Some(member_id) = request.payment.loyalty_member_id() {
            let duration_minutes: i64 = segments
                .iter()
                .map(|f| f.duration_minutes as i64)
                .sum();
            effects.push(SideEffect::CreditPoints(LoyaltyCredit {
                member_id,
                booking_id: booking.id,
                flight_id: booking.flight_id,
                duration_minutes,
                passenger_count: booking.passenger_count,
            }));
        }

        let first = &segments[0];
        let last = &segments[segments.len() - 1];
        effects.push(SideEffect::Notify(BookingConfirmation {
            booking_id: booking.id,
            booking_reference: booking.booking_reference.clone(),
            contact_email: Masked(booking.contact_email.clone()),
            flight_numbers: segments
                .iter()
                .map(|f| f.flight_number.as_str())
                .collect::<Vec<_>>()
                .join(" + "),
            origin_code: first.origin.code.clone(),
            origin_city: first.origin.city.clone(),
            destination_code: last.destination.code.clone(),
            destination_city: last.destination.city.clone(),
            departure_time: first.departure_time,
            passenger_count: booking.passenger_count,
            passenger_names: passengers
                .iter()
                .map(|p| format!("{} {}", p.first_name, p.last_name))
                .collect(),
            total_price: booking.total_price,
            is_connecting: segments.len() > 1,
        }));

        effects
    }

    fn segment_fare(&self, flight: &Flight) -> f64 {
        let input = FareInput {
            duration_minutes: flight.duration_minutes as i64,
            departure_time: flight.departure_time,
            is_direct: flight.is_direct,
            origin: flight.origin.code.clone(),
            destination: flight.destination.code.clone(),
            base_price: Some(flight.base_price).filter(|p| *p > 0.0),
        };
        match self.estimator.estimate(&input) {
            Ok(estimate) => estimate.predicted_price,
            Err(e) => {
                warn!(flight = %flight.flight_number, error = %e, "fare estimate failed, using base price");
                flight.base_price
            }
        }
    }
}

fn validate_passengers(passengers: &[PassengerInput]) -> CoreResult<Vec<PassengerInput>> {
    if passengers.is_empty() {
        return Err(CoreError::ValidationError(
            "Missing required field: passengers".to_string(),
        ));
    }
    let mut cleaned = Vec::with_capacity(passengers.len());
    for (index, passenger) in passengers.iter().enumerate() {
        let first_name = passenger.first_name.trim();
        let last_name = passenger.last_name.trim();
        if first_name.is_empty() || last_name.is_empty() {
            return Err(CoreError::ValidationError(format!(
                "Passenger {}: first_name and last_name are required",
                index + 1
            )));
        }
        cleaned.push(PassengerInput {
            first_name: first_name.to_string(),
            last_name: last_name.to_string(),
            date_of_birth: passenger.date_of_birth,
            passport_number: passenger.passport_number.clone(),
            nationality: passenger.nationality.clone(),
        });
    }
    Ok(cleaned)
}

fn validate_contact_email(raw: &str) -> CoreResult<String> {
    let email = raw.trim();
    if email.is_empty() {
        return Err(CoreError::ValidationError(
            "Missing required field: contact_email".to_string(),
        ));
    }
    if !email.contains('@') {
        return Err(CoreError::ValidationError(format!(
            "Invalid contact_email: {}",
            email
        )));
    }
    Ok(email.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use chrono::{DateTime, Duration};
    use skybook_core::model::{Airport, BookingDetail, NewFlight};
    use skybook_core::repository::LegQuery;
    use std::collections::{HashMap, HashSet};
    use std::sync::Mutex;

    struct MemoryFlights {
        flights: Mutex<HashMap<Uuid, Flight>>,
        /// Decrements against these flights report zero affected rows.
        conflicted: HashSet<Uuid>,
    }

    impl MemoryFlights {
        fn new(flights: Vec<Flight>) -> Self {
            Self {
                flights: Mutex::new(flights.into_iter().map(|f| (f.id, f)).collect()),
                conflicted: HashSet::new(),
            }
        }

        fn available(&self, id: Uuid) -> i32 {
            self.flights.lock().unwrap()[&id].available_capacity
        }
    }

    #[async_trait]
    impl FlightRepository for MemoryFlights {
        async fn find_by_id(&self, id: Uuid) -> CoreResult<Option<Flight>> {
            Ok(self.flights.lock().unwrap().get(&id).cloned())
        }

        async fn find_direct(&self, _query: &LegQuery) -> CoreResult<(Vec<Flight>, u64)> {
            unreachable!("reservation never searches")
        }

        async fn find_legs(&self, _query: &LegQuery, _limit: u32) -> CoreResult<Vec<Flight>> {
            unreachable!("reservation never searches")
        }

        async fn try_decrement_capacity(
            &self,
            flight_id: Uuid,
            expected_available: i32,
            seats: i32,
        ) -> CoreResult<bool> {
            if self.conflicted.contains(&flight_id) {
                return Ok(false);
            }
            let mut flights = self.flights.lock().unwrap();
            let flight = flights
                .get_mut(&flight_id)
                .ok_or_else(|| CoreError::NotFound(flight_id.to_string()))?;
            if flight.available_capacity != expected_available
                || flight.status != FlightStatus::SCHEDULED
            {
                return Ok(false);
            }
            flight.available_capacity -= seats;
            Ok(true)
        }

        async fn restore_capacity(&self, flight_id: Uuid, seats: i32) -> CoreResult<()> {
            let mut flights = self.flights.lock().unwrap();
            if let Some(flight) = flights.get_mut(&flight_id) {
                flight.available_capacity += seats;
            }
            Ok(())
        }

        async fn insert(&self, _flight: &NewFlight) -> CoreResult<Flight> {
            unreachable!("reservation never inserts flights")
        }
    }

    #[derive(Default)]
    struct MemoryBookings {
        bookings: Mutex<HashMap<Uuid, Booking>>,
        passengers: Mutex<HashMap<Uuid, Vec<PassengerInput>>>,
        fail_passenger_insert: bool,
        reference_rejections: Mutex<usize>,
    }

    #[async_trait]
    impl BookingRepository for MemoryBookings {
        async fn insert_booking(&self, booking: &Booking) -> CoreResult<()> {
            {
                let mut rejections = self.reference_rejections.lock().unwrap();
                if *rejections > 0 {
                    *rejections -= 1;
                    return Err(CoreError::ConcurrencyConflict(
                        "duplicate booking_reference".to_string(),
                    ));
                }
            }
            self.bookings
                .lock()
                .unwrap()
                .insert(booking.id, booking.clone());
            Ok(())
        }

        async fn insert_passengers(
            &self,
            booking_id: Uuid,
            passengers: &[PassengerInput],
        ) -> CoreResult<()> {
            if self.fail_passenger_insert {
                return Err(CoreError::InternalError(
                    "passenger insert failed".to_string(),
                ));
            }
            self.passengers
                .lock()
                .unwrap()
                .insert(booking_id, passengers.to_vec());
            Ok(())
        }

        async fn delete_booking(&self, booking_id: Uuid) -> CoreResult<()> {
            self.bookings.lock().unwrap().remove(&booking_id);
            self.passengers.lock().unwrap().remove(&booking_id);
            Ok(())
        }

        async fn find_by_reference(&self, _reference: &str) -> CoreResult<Option<BookingDetail>> {
            Ok(None)
        }
    }

    #[derive(Default)]
    struct MemoryLoyalty {
        balances: Mutex<HashMap<Uuid, i64>>,
        credited: Mutex<Vec<LoyaltyCredit>>,
    }

    #[async_trait]
    impl LoyaltyService for MemoryLoyalty {
        async fn balance(&self, member_id: Uuid) -> CoreResult<i64> {
            Ok(*self.balances.lock().unwrap().get(&member_id).unwrap_or(&0))
        }

        async fn credit(&self, credit: &LoyaltyCredit) -> CoreResult<i64> {
            let points = credit.duration_minutes * credit.passenger_count as i64;
            self.credited.lock().unwrap().push(credit.clone());
            Ok(points)
        }

        async fn redeem(&self, redemption: &LoyaltyRedemption) -> CoreResult<()> {
            let mut balances = self.balances.lock().unwrap();
            let balance = balances.entry(redemption.member_id).or_insert(0);
            *balance -= redemption.points;
            Ok(())
        }
    }

    fn airport(code: &str, city: &str, country: &str) -> Airport {
        Airport {
            id: Uuid::new_v4(),
            code: code.to_string(),
            name: format!("{} Airport", city),
            city: city.to_string(),
            country: country.to_string(),
        }
    }

    fn flight(
        number: &str,
        origin: &Airport,
        destination: &Airport,
        departure: &str,
        duration_minutes: i32,
        available: i32,
        base_price: f64,
    ) -> Flight {
        let departure_time: DateTime<Utc> = departure.parse().unwrap();
        Flight {
            id: Uuid::new_v4(),
            flight_number: number.to_string(),
            origin: origin.clone().into(),
            destination: destination.clone().into(),
            departure_time,
            arrival_time: departure_time + Duration::minutes(duration_minutes as i64),
            duration_minutes,
            total_capacity: 180,
            available_capacity: available,
            base_price,
            predicted_price: None,
            status: FlightStatus::SCHEDULED,
            is_direct: true,
        }
    }

    fn passenger(first: &str, last: &str) -> PassengerInput {
        PassengerInput {
            first_name: first.to_string(),
            last_name: last.to_string(),
            date_of_birth: None,
            passport_number: None,
            nationality: None,
        }
    }

    fn coordinator(
        flights: Arc<MemoryFlights>,
        bookings: Arc<MemoryBookings>,
        loyalty: Arc<MemoryLoyalty>,
    ) -> ReservationCoordinator {
        ReservationCoordinator::new(
            flights,
            bookings,
            loyalty,
            Arc::new(skybook_core::cache::NullCache),
            FareEstimator::default(),
        )
    }

    fn request(selector: ItinerarySelector, passengers: Vec<PassengerInput>) -> ReservationRequest {
        ReservationRequest {
            selector,
            passengers,
            contact_email: "traveler@example.com".to_string(),
            contact_phone: None,
            payment: PaymentIntent::Cash {
                loyalty_member_id: None,
            },
        }
    }

    #[tokio::test]
    async fn direct_reservation_decrements_capacity_and_emits_notification() {
        let ist = airport("IST", "Istanbul", "Turkey");
        let dxb = airport("DXB", "Dubai", "UAE");
        let f = flight("TK760", &ist, &dxb, "2027-06-10T08:00:00Z", 240, 10, 300.0);
        let flight_id = f.id;
        let flights = Arc::new(MemoryFlights::new(vec![f]));
        let bookings = Arc::new(MemoryBookings::default());
        let loyalty = Arc::new(MemoryLoyalty::default());
        let coordinator = coordinator(flights.clone(), bookings.clone(), loyalty);

        let outcome = coordinator
            .reserve(&request(
                ItinerarySelector::Direct(flight_id),
                vec![passenger("Ada", "Yilmaz"), passenger("Can", "Yilmaz")],
            ))
            .await
            .unwrap();

        assert_eq!(flights.available(flight_id), 8);
        assert_eq!(outcome.booking.status, BookingStatus::CONFIRMED);
        assert_eq!(outcome.booking.passenger_count, 2);
        assert_eq!(outcome.booking.payment_method, PaymentMethod::CASH);
        assert!(outcome.booking.total_price > 0.0);
        assert_eq!(outcome.booking.booking_reference.len(), 6);
        assert_eq!(bookings.bookings.lock().unwrap().len(), 1);
        assert_eq!(outcome.effects.len(), 1);
        match &outcome.effects[0] {
            SideEffect::Notify(confirmation) => {
                assert_eq!(confirmation.origin_code, "IST");
                assert_eq!(confirmation.destination_code, "DXB");
                assert_eq!(
                    confirmation.passenger_names,
                    vec!["Ada Yilmaz".to_string(), "Can Yilmaz".to_string()]
                );
                assert!(!confirmation.is_connecting);
            }
            other => panic!("expected a notification effect, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn empty_second_segment_fails_validation_without_touching_the_first() {
        let adb = airport("ADB", "Izmir", "Turkey");
        let ist = airport("IST", "Istanbul", "Turkey");
        let doh = airport("DOH", "Doha", "Qatar");
        let a = flight("TK201", &adb, &ist, "2027-06-10T08:00:00Z", 70, 5, 90.0);
        let b = flight("TK790", &ist, &doh, "2027-06-10T11:10:00Z", 240, 0, 320.0);
        let (a_id, b_id) = (a.id, b.id);
        let flights = Arc::new(MemoryFlights::new(vec![a, b]));
        let bookings = Arc::new(MemoryBookings::default());
        let coordinator = coordinator(flights.clone(), bookings.clone(), Arc::new(MemoryLoyalty::default()));

        let err = coordinator
            .reserve(&request(
                ItinerarySelector::Connection(vec![a_id, b_id]),
                vec![passenger("Ada", "Yilmaz")],
            ))
            .await
            .unwrap_err();

        assert!(matches!(err, CoreError::ValidationError(_)));
        assert_eq!(flights.available(a_id), 5);
        assert!(bookings.bookings.lock().unwrap().is_empty());
        assert!(bookings.passengers.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn conflict_on_second_segment_rolls_back_first_and_booking() {
        let adb = airport("ADB", "Izmir", "Turkey");
        let ist = airport("IST", "Istanbul", "Turkey");
        let doh = airport("DOH", "Doha", "Qatar");
        let a = flight("TK201", &adb, &ist, "2027-06-10T08:00:00Z", 70, 5, 90.0);
        let b = flight("TK790", &ist, &doh, "2027-06-10T11:10:00Z", 240, 5, 320.0);
        let (a_id, b_id) = (a.id, b.id);
        let mut flights = MemoryFlights::new(vec![a, b]);
        flights.conflicted.insert(b_id);
        let flights = Arc::new(flights);
        let bookings = Arc::new(MemoryBookings::default());
        let coordinator = coordinator(flights.clone(), bookings.clone(), Arc::new(MemoryLoyalty::default()));

        let err = coordinator
            .reserve(&request(
                ItinerarySelector::Connection(vec![a_id, b_id]),
                vec![passenger("Ada", "Yilmaz"), passenger("Can", "Yilmaz")],
            ))
            .await
            .unwrap_err();

        assert!(matches!(err, CoreError::ConcurrencyConflict(_)));
        assert!(err.is_retryable());
        assert_eq!(flights.available(a_id), 5);
        assert_eq!(flights.available(b_id), 5);
        assert!(bookings.bookings.lock().unwrap().is_empty());
        assert!(bookings.passengers.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn concurrent_reservations_win_at_most_the_available_seats() {
        let ist = airport("IST", "Istanbul", "Turkey");
        let dxb = airport("DXB", "Dubai", "UAE");
        let f = flight("TK760", &ist, &dxb, "2027-06-10T08:00:00Z", 240, 4, 300.0);
        let flight_id = f.id;
        let flights = Arc::new(MemoryFlights::new(vec![f]));
        let bookings = Arc::new(MemoryBookings::default());
        let coordinator = Arc::new(coordinator(
            flights.clone(),
            bookings.clone(),
            Arc::new(MemoryLoyalty::default()),
        ));

        let mut tasks = Vec::new();
        for i in 0..5 {
            let coordinator = Arc::clone(&coordinator);
            tasks.push(tokio::spawn(async move {
                // A conflict means availability moved; retry the whole flow
                // until it either books or runs out of seats.
                loop {
                    match coordinator
                        .reserve(&request(
                            ItinerarySelector::Direct(flight_id),
                            vec![
                                passenger("Ada", &format!("Traveler{}", i)),
                                passenger("Can", &format!("Traveler{}", i)),
                            ],
                        ))
                        .await
                    {
                        Err(CoreError::ConcurrencyConflict(_)) => continue,
                        outcome => break outcome,
                    }
                }
            }));
        }

        let mut successes = 0;
        let mut failures = 0;
        for task in tasks {
            match task.await.unwrap() {
                Ok(_) => successes += 1,
                Err(CoreError::ValidationError(_)) => failures += 1,
                Err(other) => panic!("unexpected error: {:?}", other),
            }
        }

        assert_eq!(successes, 2);
        assert_eq!(failures, 3);
        assert_eq!(flights.available(flight_id), 0);
        assert_eq!(bookings.bookings.lock().unwrap().len(), 2);
        assert_eq!(bookings.passengers.lock().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn miles_payment_zeroes_cash_price_and_schedules_redemption() {
        let ist = airport("IST", "Istanbul", "Turkey");
        let dxb = airport("DXB", "Dubai", "UAE");
        let f = flight("TK760", &ist, &dxb, "2027-06-10T08:00:00Z", 240, 10, 300.0);
        let flight_id = f.id;
        let member_id = Uuid::new_v4();
        let flights = Arc::new(MemoryFlights::new(vec![f]));
        let bookings = Arc::new(MemoryBookings::default());
        let loyalty = Arc::new(MemoryLoyalty::default());
        loyalty
            .balances
            .lock()
            .unwrap()
            .insert(member_id, 100_000_000);
        let coordinator = coordinator(flights, bookings, loyalty);

        let mut req = request(
            ItinerarySelector::Direct(flight_id),
            vec![passenger("Ada", "Yilmaz")],
        );
        req.payment = PaymentIntent::Miles {
            loyalty_member_id: member_id,
        };
        let outcome = coordinator.reserve(&req).await.unwrap();

        assert_eq!(outcome.booking.total_price, 0.0);
        assert_eq!(outcome.booking.payment_method, PaymentMethod::MILES);
        assert!(outcome.booking.points_used > 0);
        let kinds: Vec<&str> = outcome
            .effects
            .iter()
            .map(|e| match e {
                SideEffect::RedeemPoints(_) => "redeem",
                SideEffect::CreditPoints(_) => "credit",
                SideEffect::Notify(_) => "notify",
            })
            .collect();
        assert_eq!(kinds, vec!["redeem", "credit", "notify"]);
    }

    #[tokio::test]
    async fn insufficient_points_reject_the_reservation_untouched() {
        let ist = airport("IST", "Istanbul", "Turkey");
        let dxb = airport("DXB", "Dubai", "UAE");
        let f = flight("TK760", &ist, &dxb, "2027-06-10T08:00:00Z", 240, 10, 300.0);
        let flight_id = f.id;
        let member_id = Uuid::new_v4();
        let flights = Arc::new(MemoryFlights::new(vec![f]));
        let bookings = Arc::new(MemoryBookings::default());
        let loyalty = Arc::new(MemoryLoyalty::default());
        loyalty.balances.lock().unwrap().insert(member_id, 10);
        let coordinator = coordinator(flights.clone(), bookings.clone(), loyalty);

        let mut req = request(
            ItinerarySelector::Direct(flight_id),
            vec![passenger("Ada", "Yilmaz")],
        );
        req.payment = PaymentIntent::Miles {
            loyalty_member_id: member_id,
        };
        let err = coordinator.reserve(&req).await.unwrap_err();

        assert!(matches!(err, CoreError::ValidationError(_)));
        assert_eq!(flights.available(flight_id), 10);
        assert!(bookings.bookings.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn blank_passenger_name_fails_before_any_write() {
        let ist = airport("IST", "Istanbul", "Turkey");
        let dxb = airport("DXB", "Dubai", "UAE");
        let f = flight("TK760", &ist, &dxb, "2027-06-10T08:00:00Z", 240, 10, 300.0);
        let flight_id = f.id;
        let flights = Arc::new(MemoryFlights::new(vec![f]));
        let bookings = Arc::new(MemoryBookings::default());
        let coordinator = coordinator(flights.clone(), bookings.clone(), Arc::new(MemoryLoyalty::default()));

        let err = coordinator
            .reserve(&request(
                ItinerarySelector::Direct(flight_id),
                vec![passenger("Ada", "  ")],
            ))
            .await
            .unwrap_err();

        assert!(matches!(err, CoreError::ValidationError(_)));
        assert_eq!(flights.available(flight_id), 10);
        assert!(bookings.bookings.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn reference_collision_is_retried_transparently() {
        let ist = airport("IST", "Istanbul", "Turkey");
        let dxb = airport("DXB", "Dubai", "UAE");
        let f = flight("TK760", &ist, &dxb, "2027-06-10T08:00:00Z", 240, 10, 300.0);
        let flight_id = f.id;
        let flights = Arc::new(MemoryFlights::new(vec![f]));
        let bookings = Arc::new(MemoryBookings::default());
        *bookings.reference_rejections.lock().unwrap() = 1;
        let coordinator = coordinator(flights, bookings.clone(), Arc::new(MemoryLoyalty::default()));

        let outcome = coordinator
            .reserve(&request(
                ItinerarySelector::Direct(flight_id),
                vec![passenger("Ada", "Yilmaz")],
            ))
            .await
            .unwrap();

        assert_eq!(outcome.booking.booking_reference.len(), 6);
        assert_eq!(bookings.bookings.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn passenger_insert_failure_removes_the_booking() {
        let ist = airport("IST", "Istanbul", "Turkey");
        let dxb = airport("DXB", "Dubai", "UAE");
        let f = flight("TK760", &ist, &dxb, "2027-06-10T08:00:00Z", 240, 10, 300.0);
        let flight_id = f.id;
        let flights = Arc::new(MemoryFlights::new(vec![f]));
        let bookings = Arc::new(MemoryBookings {
            fail_passenger_insert: true,
            ..MemoryBookings::default()
        });
        let coordinator = coordinator(flights.clone(), bookings.clone(), Arc::new(MemoryLoyalty::default()));

        let err = coordinator
            .reserve(&request(
                ItinerarySelector::Direct(flight_id),
                vec![passenger("Ada", "Yilmaz")],
            ))
            .await
            .unwrap_err();

        assert!(matches!(err, CoreError::InternalError(_)));
        assert!(bookings.bookings.lock().unwrap().is_empty());
        assert_eq!(flights.available(flight_id), 10);
    }

    #[tokio::test]
    async fn connection_booking_decrements_every_segment() {
        let adb = airport("ADB", "Izmir", "Turkey");
        let ist = airport("IST", "Istanbul", "Turkey");
        let doh = airport("DOH", "Doha", "Qatar");
        let a = flight("TK201", &adb, &ist, "2027-06-10T08:00:00Z", 70, 5, 90.0);
        let b = flight("TK790", &ist, &doh, "2027-06-10T11:10:00Z", 240, 5, 320.0);
        let (a_id, b_id) = (a.id, b.id);
        let flights = Arc::new(MemoryFlights::new(vec![a, b]));
        let bookings = Arc::new(MemoryBookings::default());
        let coordinator = coordinator(flights.clone(), bookings.clone(), Arc::new(MemoryLoyalty::default()));

        let outcome = coordinator
            .reserve(&request(
                ItinerarySelector::Connection(vec![a_id, b_id]),
                vec![passenger("Ada", "Yilmaz"), passenger("Can", "Yilmaz")],
            ))
            .await
            .unwrap();

        assert_eq!(flights.available(a_id), 3);
        assert_eq!(flights.available(b_id), 3);
        assert_eq!(outcome.booking.flight_segments, vec![a_id, b_id]);
        assert_eq!(outcome.booking.flight_id, a_id);
        match outcome.effects.last().unwrap() {
            SideEffect::Notify(confirmation) => {
                assert!(confirmation.is_connecting);
                assert_eq!(confirmation.flight_numbers, "TK201 + TK790");
                assert_eq!(confirmation.origin_code, "ADB");
                assert_eq!(confirmation.destination_code, "DOH");
            }
            other => panic!("expected a notification effect, got {:?}", other),
        }
    }
}
