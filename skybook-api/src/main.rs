use skybook_api::{app, AppState};
use skybook_booking::ReservationCoordinator;
use skybook_core::cache::Cache;
use skybook_core::collaborators::{LoyaltyService, NotificationDispatcher};
use skybook_core::repository::{AirportRepository, BookingRepository, FlightRepository};
use skybook_fare::{FareCoefficients, FareEstimator};
use skybook_search::{SearchEngine, SearchRules};
use skybook_store::{
    DbClient, EventProducer, PostgresAirportRepository, PostgresBookingRepository,
    PostgresFlightRepository, PostgresLoyaltyService, RedisCache,
};
use std::net::SocketAddr;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "skybook_api=debug,tower_http=debug,axum::rejection=trace".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = skybook_store::app_config::Config::load().expect("Failed to load config");
    tracing::info!("Starting Skybook API on port {}", config.server.port);

    let db = DbClient::connect(&config.database)
        .await
        .expect("Failed to connect to Postgres");
    if config.database.run_migrations {
        db.run_migrations().await.expect("Failed to run migrations");
    }

    let cache: Arc<dyn Cache> =
        Arc::new(RedisCache::new(&config.redis.url).expect("Failed to create Redis client"));
    let notifier: Arc<dyn NotificationDispatcher> =
        Arc::new(EventProducer::new(&config.kafka.brokers).expect("Failed to create Kafka producer"));

    let airports: Arc<dyn AirportRepository> = Arc::new(PostgresAirportRepository {
        pool: db.pool.clone(),
    });
    let flights: Arc<dyn FlightRepository> = Arc::new(PostgresFlightRepository {
        pool: db.pool.clone(),
    });
    let bookings: Arc<dyn BookingRepository> = Arc::new(PostgresBookingRepository {
        pool: db.pool.clone(),
    });
    let loyalty: Arc<dyn LoyaltyService> = Arc::new(PostgresLoyaltyService {
        pool: db.pool.clone(),
    });

    let mut coefficients = FareCoefficients::default();
    if let Some(rate) = config.fare.duration_coef {
        coefficients.duration_coef = rate;
    }
    let estimator = FareEstimator::new(coefficients, config.fare.base_price_blend);

    let rules = SearchRules {
        hub_codes: config.search.hub_codes.clone(),
        max_connections: config.search.max_connections,
        first_leg_limit: config.search.first_leg_limit,
        second_leg_limit: config.search.second_leg_limit,
        max_first_legs: config.search.max_first_legs,
        page_size_cap: config.search.page_size_cap,
    };
    let search = Arc::new(SearchEngine::new(
        airports.clone(),
        flights.clone(),
        cache.clone(),
        estimator.clone(),
        rules,
    ));
    let coordinator = Arc::new(ReservationCoordinator::new(
        flights.clone(),
        bookings.clone(),
        loyalty.clone(),
        cache.clone(),
        estimator.clone(),
    ));

    let app_state = AppState {
        search,
        coordinator,
        airports,
        flights,
        bookings,
        loyalty,
        notifier,
        cache,
        estimator,
    };

    let app = app(app_state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.server.port));
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await.unwrap();
    axum::serve(listener, app).await.unwrap();
}
