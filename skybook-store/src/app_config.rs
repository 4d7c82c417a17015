use serde::Deserialize;
use std::env;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub redis: RedisConfig,
    pub kafka: KafkaConfig,
    #[serde(default)]
    pub search: SearchConfig,
    #[serde(default)]
    pub fare: FareConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub port: u16,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    #[serde(default = "default_acquire_timeout")]
    pub acquire_timeout_seconds: u64,
    #[serde(default)]
    pub run_migrations: bool,
}

fn default_max_connections() -> u32 {
    10
}

fn default_acquire_timeout() -> u64 {
    5
}

#[derive(Debug, Deserialize, Clone)]
pub struct RedisConfig {
    pub url: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct KafkaConfig {
    pub brokers: String,
}

/// Fan-out bounds for the itinerary search, mapped onto the engine's rules
/// at wiring time.
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct SearchConfig {
    pub hub_codes: Vec<String>,
    pub max_connections: usize,
    pub first_leg_limit: u32,
    pub second_leg_limit: u32,
    pub max_first_legs: usize,
    pub page_size_cap: u32,
}

impl Default for SearchConfig {
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

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct FareConfig {
    /// Optional override for the estimator's per-minute rate. Only applied
    /// by the estimator when it falls in its accepted range.
    pub duration_coef: Option<f64>,
    /// Weight of an operator-supplied base price in the blended estimate.
    pub base_price_blend: f64,
}

impl Default for FareConfig {
    fn default() -> Self {
        Self {
            duration_coef: None,
            base_price_blend: 0.4,
        }
    }
}

impl Config {
    pub fn load() -> Result<Self, config::ConfigError> {
        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".into());

        let s = config::Config::builder()
            // Start off by merging in the "default" configuration file
            .add_source(config::File::with_name("config/default"))
            // Add in the current environment file (optional)
            .add_source(config::File::with_name(&format!("config/{}", run_mode)).required(false))
            // Local overrides, not checked in
            .add_source(config::File::with_name("config/local").required(false))
            // Environment variables with a prefix of SKYBOOK
            // Eg. `SKYBOOK__SERVER__PORT=8080` sets server.port
            .add_source(config::Environment::with_prefix("SKYBOOK").separator("__"))
            .build()?;

        s.try_deserialize()
    }
}
