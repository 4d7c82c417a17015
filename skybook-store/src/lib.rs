pub mod airport_repo;
pub mod app_config;
pub mod booking_repo;
pub mod database;
pub mod events;
pub mod flight_repo;
pub mod loyalty_repo;
pub mod redis_repo;

pub use airport_repo::PostgresAirportRepository;
pub use booking_repo::PostgresBookingRepository;
pub use database::DbClient;
pub use events::EventProducer;
pub use flight_repo::PostgresFlightRepository;
pub use loyalty_repo::PostgresLoyaltyService;
pub use redis_repo::RedisCache;
