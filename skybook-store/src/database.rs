use crate::app_config::DatabaseConfig;
use skybook_core::{CoreError, CoreResult};
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use std::future::Future;
use std::time::Duration;
use tracing::warn;

/// Read queries get a small fixed budget before the store is reported
/// unavailable; guarded writes are never blind-retried.
const READ_RETRY_ATTEMPTS: u32 = 3;

pub struct DbClient {
    pub pool: PgPool,
}

impl DbClient {
    pub async fn connect(config: &DatabaseConfig) -> Result<Self, sqlx::Error> {
        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(Duration::from_secs(config.acquire_timeout_seconds))
            .connect(&config.url)
            .await?;
        Ok(Self { pool })
    }

    pub async fn run_migrations(&self) -> Result<(), sqlx::migrate::MigrateError> {
        sqlx::migrate!("./migrations").run(&self.pool).await
    }
}

pub(crate) fn map_db_err(e: sqlx::Error) -> CoreError {
    if is_transient(&e) {
        CoreError::DependencyUnavailable(e.to_string())
    } else {
        CoreError::InternalError(e.to_string())
    }
}

pub(crate) fn is_transient(e: &sqlx::Error) -> bool {
    matches!(e, sqlx::Error::PoolTimedOut | sqlx::Error::Io(_))
}

pub(crate) fn is_unique_violation(e: &sqlx::Error) -> bool {
    e.as_database_error()
        .map(|db| db.is_unique_violation())
        .unwrap_or(false)
}

/// Runs a read query with the fixed retry budget, backing off briefly
/// between transient failures.
pub(crate) async fn with_read_retry<T, F, Fut>(operation: &str, mut run: F) -> CoreResult<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, sqlx::Error>>,
{
    let mut attempt = 0;
    loop {
        attempt += 1;
        match run().await {
            Ok(value) => return Ok(value),
            Err(e) if is_transient(&e) && attempt < READ_RETRY_ATTEMPTS => {
                warn!(operation, attempt, error = %e, "transient database error, retrying");
                tokio::time::sleep(Duration::from_millis(100 * attempt as u64)).await;
            }
            Err(e) => return Err(map_db_err(e)),
        }
    }
}
