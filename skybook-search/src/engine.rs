use crate::{key, window};
use chrono::Duration;
use serde::Deserialize;
use skybook_core::cache::{Cache, SEARCH_TTL_SECONDS};
use skybook_core::itinerary::{
    ConnectionItinerary, DirectItinerary, Itinerary, Pagination, SearchQuery, SearchResponse,
    SegmentView,
};
use skybook_core::model::{round_money, Airport, Flight};
use skybook_core::repository::{AirportRepository, FlightRepository, LegQuery, Page, TimeWindow};
use skybook_core::{CoreError, CoreResult};
use skybook_fare::{FareEstimator, FareInput};
use std::sync::Arc;
use tracing::{debug, warn};

const MIN_LAYOVER_MINUTES: i64 = 60;
const MAX_LAYOVER_MINUTES: i64 = 720;

/// Fan-out bounds. Hub queries and emitted connections are capped so one
/// search cannot amplify into unbounded storage traffic.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SearchRules {
    pub hub_codes: Vec<String>,
    pub max_connections: usize,
    pub first_leg_limit: u32,
    pub second_leg_limit: u32,
    pub max_first_legs: usize,
    pub page_size_cap: u32,
}

impl Default for SearchRules {
    fn default() -> Self {
        Self {
            hub_codes: ["IST", "SAW", "DXB", "LHR", "FRA", "CDG"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            max_connections: 20,
            first_leg_limit: 5,
            second_leg_limit: 3,
            max_first_legs: 30,
            page_size_cap: 100,
        }
    }
}

/// Builds ranked direct and one-stop itineraries from the flat flight table.
///
/// Results are deterministic for fixed inputs: direct flights come back in
/// departure order, connections in score order, and ties keep discovery
/// order (configured hub order, then second-leg order).
pub struct SearchEngine {
    airports: Arc<dyn AirportRepository>,
    flights: Arc<dyn FlightRepository>,
    cache: Arc<dyn Cache>,
    estimator: FareEstimator,
    rules: SearchRules,
}

impl SearchEngine {
    pub fn new(
        airports: Arc<dyn AirportRepository>,
        flights: Arc<dyn FlightRepository>,
        cache: Arc<dyn Cache>,
        estimator: FareEstimator,
        rules: SearchRules,
    ) -> Self {
        Self {
            airports,
            flights,
            cache,
            estimator,
            rules,
        }
    }

    pub async fn search(&self, query: &SearchQuery) -> CoreResult<SearchResponse> {
        if query.passengers == 0 {
            return Err(CoreError::InvalidInput(
                "Passenger count must be at least 1".to_string(),
            ));
        }
        let page = query.page.max(1);
        let limit = query.limit.clamp(1, self.rules.page_size_cap);

        let origin = self.resolve_airport(&query.origin).await?;
        let destination = self.resolve_airport(&query.destination).await?;
        let window = window::build_window(&query.date)?;

        let cache_key = key::search_key(query);
        if let Some(value) = self.cache.get(&cache_key).await {
            match serde_json::from_value::<SearchResponse>(value) {
                Ok(mut cached) => {
                    debug!(key = %cache_key, "search cache hit");
                    cached.cached = true;
                    return Ok(cached);
                }
                Err(e) => warn!(key = %cache_key, error = %e, "discarding undecodable cache entry"),
            }
        }

        // Range queries return the full direct set; when connections are in
        // play, pagination happens over the merged list instead of in SQL.
        let sql_page = if query.direct_only && !window.ranged {
            Some(Page {
                offset: ((page - 1) * limit) as u64,
                limit: limit as u64,
            })
        } else {
            None
        };
        let leg_query = LegQuery {
            origin_airport_id: origin.id,
            destination_airport_id: destination.id,
            window,
            min_seats: query.passengers,
            page: sql_page,
        };
        let (direct_flights, direct_total) = self.flights.find_direct(&leg_query).await?;

        let mut itineraries: Vec<Itinerary> = direct_flights
            .iter()
            .map(|f| Itinerary::Direct(self.direct_itinerary(f)))
            .collect();
        let mut total = direct_total;

        if !query.direct_only {
            let connections = self
                .fan_out(&origin, &destination, &window, query.passengers)
                .await;
            debug!(
                origin = %origin.code,
                destination = %destination.code,
                connections = connections.len(),
                "hub fan-out complete"
            );
            total += connections.len() as u64;
            itineraries.extend(connections.into_iter().map(Itinerary::Connection));

            let offset = ((page - 1) * limit) as usize;
            itineraries = itineraries
                .into_iter()
                .skip(offset)
                .take(limit as usize)
                .collect();
        }

        let response = SearchResponse {
            itineraries,
            pagination: Pagination {
                page,
                limit,
                total,
                total_pages: total.div_ceil(limit as u64),
            },
            cached: false,
        };

        if let Ok(value) = serde_json::to_value(&response) {
            self.cache.set(&cache_key, &value, SEARCH_TTL_SECONDS).await;
        }
        Ok(response)
    }

    async fn resolve_airport(&self, code: &str) -> CoreResult<Airport> {
        let normalized = code.trim().to_ascii_uppercase();
        self.airports
            .find_by_code(&normalized)
            .await?
            .ok_or(CoreError::UnknownAirport(normalized))
    }

    /// One-stop candidates through the configured hubs. Each sub-query may
    /// fail independently; a lost hub only shrinks the candidate set.
    async fn fan_out(
        &self,
        origin: &Airport,
        destination: &Airport,
        window: &TimeWindow,
        passengers: u32,
    ) -> Vec<ConnectionItinerary> {
        let hub_codes: Vec<String> = self
            .rules
            .hub_codes
            .iter()
            .map(|c| c.to_ascii_uppercase())
            .collect();
        let mut hubs = match self.airports.find_by_codes(&hub_codes).await {
            Ok(list) => list,
            Err(e) => {
                warn!(error = %e, "hub airport lookup failed, returning direct results only");
                return Vec::new();
            }
        };
        hubs.retain(|h| h.id != origin.id && h.id != destination.id);
        // Repository order is unspecified; discovery order follows config.
        hubs.sort_by_key(|h| hub_codes.iter().position(|c| *c == h.code));

        let mut first_leg_tasks = Vec::with_capacity(hubs.len());
        for hub in &hubs {
            let flights = Arc::clone(&self.flights);
            let leg_query = LegQuery {
                origin_airport_id: origin.id,
                destination_airport_id: hub.id,
                window: *window,
                min_seats: passengers,
                page: None,
            };
            let limit = self.rules.first_leg_limit;
            first_leg_tasks.push(tokio::spawn(async move {
                flights.find_legs(&leg_query, limit).await
            }));
        }

        let mut first_legs: Vec<Flight> = Vec::new();
        for (hub, task) in hubs.iter().zip(first_leg_tasks) {
            match task.await {
                Ok(Ok(legs)) => first_legs.extend(legs),
                Ok(Err(e)) => warn!(hub = %hub.code, error = %e, "first-leg query failed, skipping hub"),
                Err(e) => warn!(hub = %hub.code, error = %e, "first-leg task aborted, skipping hub"),
            }
        }
        first_legs.truncate(self.rules.max_first_legs);

        let mut second_leg_tasks = Vec::with_capacity(first_legs.len());
        for first in &first_legs {
            let flights = Arc::clone(&self.flights);
            let earliest = first.arrival_time + Duration::minutes(MIN_LAYOVER_MINUTES);
            let latest = std::cmp::min(
                first.arrival_time + Duration::minutes(MAX_LAYOVER_MINUTES),
                window.end,
            );
            let leg_query = LegQuery {
                origin_airport_id: first.destination.id,
                destination_airport_id: destination.id,
                window: TimeWindow {
                    start: earliest,
                    end: latest,
                    ranged: false,
                },
                min_seats: passengers,
                page: None,
            };
            let limit = self.rules.second_leg_limit;
            second_leg_tasks.push(tokio::spawn(async move {
                flights.find_legs(&leg_query, limit).await
            }));
        }

        let mut connections = Vec::new();
        'fanout: for (first, task) in first_legs.iter().zip(second_leg_tasks) {
            let second_legs = match task.await {
                Ok(Ok(legs)) => legs,
                Ok(Err(e)) => {
                    warn!(first_leg = %first.flight_number, error = %e, "second-leg query failed, skipping leg");
                    continue;
                }
                Err(e) => {
                    warn!(first_leg = %first.flight_number, error = %e, "second-leg task aborted, skipping leg");
                    continue;
                }
            };
            for second in second_legs {
                if connections.len() >= self.rules.max_connections {
                    break 'fanout;
                }
                let layover = (second.departure_time - first.arrival_time).num_minutes();
                if !(MIN_LAYOVER_MINUTES..=MAX_LAYOVER_MINUTES).contains(&layover) {
                    continue;
                }
                connections.push(self.connection_itinerary(first, &second, layover));
            }
        }

        // Stable sort keeps discovery order on equal scores.
        connections.sort_by(|a, b| a.score.total_cmp(&b.score));
        connections
    }

    fn direct_itinerary(&self, flight: &Flight) -> DirectItinerary {
        DirectItinerary {
            flight_id: flight.id,
            flight_number: flight.flight_number.clone(),
            origin: flight.origin.clone(),
            destination: flight.destination.clone(),
            departure_time: flight.departure_time,
            arrival_time: flight.arrival_time,
            duration_minutes: flight.duration_minutes,
            available_capacity: flight.available_capacity,
            base_price: flight.base_price,
            predicted_price: round_money(self.segment_fare(flight)),
        }
    }

    fn connection_itinerary(
        &self,
        first: &Flight,
        second: &Flight,
        layover_minutes: i64,
    ) -> ConnectionItinerary {
        let duration_minutes = (second.arrival_time - first.departure_time).num_minutes();
        let predicted_price = round_money(self.segment_fare(first) + self.segment_fare(second));
        let score = predicted_price
            + 0.1 * duration_minutes as f64
            + 0.05 * layover_minutes as f64;
        ConnectionItinerary {
            segment_ids: vec![first.id, second.id],
            flight_number: format!("{} + {}", first.flight_number, second.flight_number),
            origin: first.origin.clone(),
            destination: second.destination.clone(),
            departure_time: first.departure_time,
            arrival_time: second.arrival_time,
            duration_minutes,
            available_capacity: first.available_capacity.min(second.available_capacity),
            base_price: round_money(first.base_price + second.base_price),
            predicted_price,
            connection_airport: first.destination.clone(),
            layover_minutes,
            segments: vec![
                SegmentView::from_flight(first, None),
                SegmentView::from_flight(second, Some(layover_minutes)),
            ],
            score,
        }
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

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use chrono::{DateTime, NaiveDate, Utc};
    use serde_json::Value;
    use skybook_core::cache::NullCache;
    use skybook_core::itinerary::DateSpec;
    use skybook_core::model::{FlightStatus, NewFlight};
    use std::collections::{HashMap, HashSet};
    use std::sync::Mutex;
    use uuid::Uuid;

    struct MemoryAirports {
        airports: Vec<Airport>,
    }

    #[async_trait]
    impl AirportRepository for MemoryAirports {
        async fn find_by_code(&self, code: &str) -> CoreResult<Option<Airport>> {
            Ok(self
                .airports
                .iter()
                .find(|a| a.code.eq_ignore_ascii_case(code))
                .cloned())
        }

        async fn find_by_codes(&self, codes: &[String]) -> CoreResult<Vec<Airport>> {
            Ok(self
                .airports
                .iter()
                .filter(|a| codes.iter().any(|c| c.eq_ignore_ascii_case(&a.code)))
                .cloned()
                .collect())
        }

        async fn list_all(&self) -> CoreResult<Vec<Airport>> {
            Ok(self.airports.clone())
        }
    }

    struct MemoryFlights {
        flights: Vec<Flight>,
        /// Leg queries from these origin airports fail, simulating a dead hub.
        failing_origins: HashSet<Uuid>,
    }

    impl MemoryFlights {
        fn matching(&self, query: &LegQuery) -> Vec<Flight> {
            let mut rows: Vec<Flight> = self
                .flights
                .iter()
                .filter(|f| {
                    f.origin.id == query.origin_airport_id
                        && f.destination.id == query.destination_airport_id
                        && f.status == FlightStatus::SCHEDULED
                        && f.departure_time >= query.window.start
                        && f.departure_time <= query.window.end
                        && f.available_capacity >= query.min_seats as i32
                })
                .cloned()
                .collect();
            rows.sort_by_key(|f| f.departure_time);
            rows
        }
    }

    #[async_trait]
    impl FlightRepository for MemoryFlights {
        async fn find_by_id(&self, id: Uuid) -> CoreResult<Option<Flight>> {
            Ok(self.flights.iter().find(|f| f.id == id).cloned())
        }

        async fn find_direct(&self, query: &LegQuery) -> CoreResult<(Vec<Flight>, u64)> {
            let rows = self.matching(query);
            let total = rows.len() as u64;
            let rows = match query.page {
                Some(page) => rows
                    .into_iter()
                    .skip(page.offset as usize)
                    .take(page.limit as usize)
                    .collect(),
                None => rows,
            };
            Ok((rows, total))
        }

        async fn find_legs(&self, query: &LegQuery, limit: u32) -> CoreResult<Vec<Flight>> {
            if self.failing_origins.contains(&query.origin_airport_id) {
                return Err(CoreError::DependencyUnavailable(
                    "leg query timed out".to_string(),
                ));
            }
            let mut rows = self.matching(query);
            rows.truncate(limit as usize);
            Ok(rows)
        }

        async fn try_decrement_capacity(
            &self,
            _flight_id: Uuid,
            _expected_available: i32,
            _seats: i32,
        ) -> CoreResult<bool> {
            unreachable!("search never mutates capacity")
        }

        async fn restore_capacity(&self, _flight_id: Uuid, _seats: i32) -> CoreResult<()> {
            unreachable!("search never mutates capacity")
        }

        async fn insert(&self, _flight: &NewFlight) -> CoreResult<Flight> {
            unreachable!("search never inserts flights")
        }
    }

    struct MemoryCache {
        entries: Mutex<HashMap<String, Value>>,
    }

    #[async_trait]
    impl Cache for MemoryCache {
        async fn get(&self, key: &str) -> Option<Value> {
            self.entries.lock().unwrap().get(key).cloned()
        }

        async fn set(&self, key: &str, value: &Value, _ttl_seconds: u64) -> bool {
            self.entries
                .lock()
                .unwrap()
                .insert(key.to_string(), value.clone());
            true
        }

        async fn del(&self, key: &str) -> bool {
            self.entries.lock().unwrap().remove(key).is_some()
        }

        async fn del_by_prefix(&self, prefix: &str) -> u64 {
            let mut entries = self.entries.lock().unwrap();
            let doomed: Vec<String> = entries
                .keys()
                .filter(|k| k.starts_with(prefix))
                .cloned()
                .collect();
            for key in &doomed {
                entries.remove(key);
            }
            doomed.len() as u64
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

    fn engine(
        airports: Vec<Airport>,
        flights: Vec<Flight>,
        cache: Arc<dyn Cache>,
        rules: SearchRules,
    ) -> SearchEngine {
        SearchEngine::new(
            Arc::new(MemoryAirports { airports }),
            Arc::new(MemoryFlights {
                flights,
                failing_origins: HashSet::new(),
            }),
            cache,
            FareEstimator::default(),
            rules,
        )
    }

    fn query(origin: &str, destination: &str, day: &str, passengers: u32) -> SearchQuery {
        SearchQuery {
            origin: origin.to_string(),
            destination: destination.to_string(),
            date: DateSpec::Single {
                date: NaiveDate::parse_from_str(day, "%Y-%m-%d").unwrap(),
                flexible: false,
            },
            passengers,
            direct_only: false,
            page: 1,
            limit: 20,
        }
    }

    #[tokio::test]
    async fn direct_search_filters_by_capacity_and_prices_results() {
        let ist = airport("IST", "Istanbul", "Turkey");
        let dxb = airport("DXB", "Dubai", "UAE");
        let flights = vec![
            flight("TK760", &ist, &dxb, "2025-06-10T08:00:00Z", 240, 10, 300.0),
            flight("TK762", &ist, &dxb, "2025-06-10T15:00:00Z", 240, 1, 250.0),
        ];
        let engine = engine(
            vec![ist, dxb],
            flights,
            Arc::new(NullCache),
            SearchRules::default(),
        );

        let response = engine.search(&query("IST", "DXB", "2025-06-10", 2)).await.unwrap();
        assert_eq!(response.itineraries.len(), 1);
        match &response.itineraries[0] {
            Itinerary::Direct(d) => {
                assert_eq!(d.flight_number, "TK760");
                assert!(d.available_capacity >= 2);
                assert!(d.predicted_price > 0.0);
            }
            other => panic!("expected a direct itinerary, got {:?}", other),
        }
        assert!(!response.cached);
    }

    #[tokio::test]
    async fn unknown_airport_code_is_reported_by_name() {
        let ist = airport("IST", "Istanbul", "Turkey");
        let engine = engine(vec![ist], vec![], Arc::new(NullCache), SearchRules::default());

        let err = engine
            .search(&query("IST", "XXX", "2025-06-10", 1))
            .await
            .unwrap_err();
        match err {
            CoreError::UnknownAirport(code) => assert_eq!(code, "XXX"),
            other => panic!("expected UnknownAirport, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn connections_join_legs_at_a_hub_within_layover_bounds() {
        let adb = airport("ADB", "Izmir", "Turkey");
        let ist = airport("IST", "Istanbul", "Turkey");
        let doh = airport("DOH", "Doha", "Qatar");
        let flights = vec![
            // Direct option so class ordering is observable.
            flight("QR001", &adb, &doh, "2025-06-10T06:00:00Z", 260, 20, 400.0),
            // First leg arrives 09:10; second leg departs 11:10 (120 min layover).
            flight("TK201", &adb, &ist, "2025-06-10T08:00:00Z", 70, 20, 90.0),
            flight("TK790", &ist, &doh, "2025-06-10T11:10:00Z", 240, 8, 320.0),
            // Departs 40 minutes after arrival: below the minimum layover.
            flight("TK791", &ist, &doh, "2025-06-10T09:50:00Z", 240, 8, 320.0),
        ];
        let engine = engine(
            vec![adb, ist, doh],
            flights,
            Arc::new(NullCache),
            SearchRules::default(),
        );

        let response = engine.search(&query("ADB", "DOH", "2025-06-10", 2)).await.unwrap();
        assert_eq!(response.itineraries.len(), 2);
        assert!(response.itineraries[0].is_direct());
        match &response.itineraries[1] {
            Itinerary::Connection(c) => {
                assert_eq!(c.segments.len(), 2);
                assert_eq!(c.segments[0].destination, c.segments[1].origin);
                assert_eq!(c.layover_minutes, 120);
                assert_eq!(c.connection_airport.code, "IST");
                assert_eq!(c.available_capacity, 8);
                assert!(c.score > 0.0);
            }
            other => panic!("expected a connection itinerary, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn connection_count_respects_the_cap() {
        let adb = airport("ADB", "Izmir", "Turkey");
        let ist = airport("IST", "Istanbul", "Turkey");
        let doh = airport("DOH", "Doha", "Qatar");
        let mut flights = vec![flight("TK201", &adb, &ist, "2025-06-10T06:00:00Z", 70, 20, 90.0)];
        for i in 0..3 {
            flights.push(flight(
                &format!("TK79{}", i),
                &ist,
                &doh,
                &format!("2025-06-10T{:02}:30:00Z", 9 + i),
                240,
                8,
                320.0,
            ));
        }
        let rules = SearchRules {
            max_connections: 2,
            ..SearchRules::default()
        };
        let engine = engine(vec![adb, ist, doh], flights, Arc::new(NullCache), rules);

        let response = engine.search(&query("ADB", "DOH", "2025-06-10", 1)).await.unwrap();
        let connections = response
            .itineraries
            .iter()
            .filter(|i| !i.is_direct())
            .count();
        assert_eq!(connections, 2);
    }

    #[tokio::test]
    async fn failed_hub_query_still_returns_direct_results() {
        let adb = airport("ADB", "Izmir", "Turkey");
        let ist = airport("IST", "Istanbul", "Turkey");
        let doh = airport("DOH", "Doha", "Qatar");
        let flights = vec![flight(
            "QR001",
            &adb,
            &doh,
            "2025-06-10T06:00:00Z",
            260,
            20,
            400.0,
        )];
        let engine = SearchEngine::new(
            Arc::new(MemoryAirports {
                airports: vec![adb.clone(), ist, doh],
            }),
            Arc::new(MemoryFlights {
                flights,
                failing_origins: HashSet::from([adb.id]),
            }),
            Arc::new(NullCache),
            FareEstimator::default(),
            SearchRules::default(),
        );

        let response = engine.search(&query("ADB", "DOH", "2025-06-10", 1)).await.unwrap();
        assert_eq!(response.itineraries.len(), 1);
        assert!(response.itineraries[0].is_direct());
    }

    #[tokio::test]
    async fn repeated_search_within_ttl_hits_the_cache_unchanged() {
        let ist = airport("IST", "Istanbul", "Turkey");
        let dxb = airport("DXB", "Dubai", "UAE");
        let flights = vec![flight(
            "TK760",
            &ist,
            &dxb,
            "2025-06-10T08:00:00Z",
            240,
            10,
            300.0,
        )];
        let cache = Arc::new(MemoryCache {
            entries: Mutex::new(HashMap::new()),
        });
        let engine = engine(vec![ist, dxb], flights, cache, SearchRules::default());

        let q = query("IST", "DXB", "2025-06-10", 2);
        let first = engine.search(&q).await.unwrap();
        let second = engine.search(&q).await.unwrap();
        assert!(!first.cached);
        assert!(second.cached);
        assert_eq!(
            serde_json::to_value(&first.itineraries).unwrap(),
            serde_json::to_value(&second.itineraries).unwrap()
        );
    }

    #[tokio::test]
    async fn thirty_one_day_range_is_rejected() {
        let ist = airport("IST", "Istanbul", "Turkey");
        let dxb = airport("DXB", "Dubai", "UAE");
        let engine = engine(
            vec![ist, dxb],
            vec![],
            Arc::new(NullCache),
            SearchRules::default(),
        );

        let mut q = query("IST", "DXB", "2025-06-01", 1);
        q.date = DateSpec::Range {
            start: NaiveDate::from_ymd_opt(2025, 6, 1).unwrap(),
            end: NaiveDate::from_ymd_opt(2025, 7, 1).unwrap(),
        };
        let err = engine.search(&q).await.unwrap_err();
        assert!(matches!(err, CoreError::InvalidInput(_)));
    }

    #[tokio::test]
    async fn connections_rank_by_score_ascending() {
        let adb = airport("ADB", "Izmir", "Turkey");
        let ist = airport("IST", "Istanbul", "Turkey");
        let doh = airport("DOH", "Doha", "Qatar");
        let flights = vec![
            flight("TK201", &adb, &ist, "2025-06-10T06:00:00Z", 70, 20, 90.0),
            // Longer layover scores worse than the tight one.
            flight("TK792", &ist, &doh, "2025-06-10T16:00:00Z", 240, 8, 320.0),
            flight("TK790", &ist, &doh, "2025-06-10T09:00:00Z", 240, 8, 320.0),
        ];
        let engine = engine(
            vec![adb, ist, doh],
            flights,
            Arc::new(NullCache),
            SearchRules::default(),
        );

        let response = engine.search(&query("ADB", "DOH", "2025-06-10", 1)).await.unwrap();
        let scores: Vec<f64> = response
            .itineraries
            .iter()
            .filter_map(|i| match i {
                Itinerary::Connection(c) => Some(c.score),
                Itinerary::Direct(_) => None,
            })
            .collect();
        assert_eq!(scores.len(), 2);
        assert!(scores[0] < scores[1]);
    }
}
