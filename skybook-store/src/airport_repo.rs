use crate::database::with_read_retry;
use async_trait::async_trait;
use skybook_core::model::Airport;
use skybook_core::repository::AirportRepository;
use skybook_core::CoreResult;
use uuid::Uuid;

pub struct PostgresAirportRepository {
    pub pool: sqlx::PgPool,
}

#[derive(sqlx::FromRow)]
struct AirportRow {
    id: Uuid,
    code: String,
    name: String,
    city: String,
    country: String,
}

impl From<AirportRow> for Airport {
    fn from(row: AirportRow) -> Self {
        Airport {
            id: row.id,
            code: row.code,
            name: row.name,
            city: row.city,
            country: row.country,
        }
    }
}

#[async_trait]
impl AirportRepository for PostgresAirportRepository {
    async fn find_by_code(&self, code: &str) -> CoreResult<Option<Airport>> {
        let pool = self.pool.clone();
        let code = code.to_ascii_uppercase();
        let row = with_read_retry("airports.find_by_code", || {
            sqlx::query_as::<_, AirportRow>(
                "SELECT id, code, name, city, country FROM airports WHERE code = $1",
            )
            .bind(&code)
            .fetch_optional(&pool)
        })
        .await?;
        Ok(row.map(Airport::from))
    }

    async fn find_by_codes(&self, codes: &[String]) -> CoreResult<Vec<Airport>> {
        let pool = self.pool.clone();
        let codes: Vec<String> = codes.iter().map(|c| c.to_ascii_uppercase()).collect();
        let rows = with_read_retry("airports.find_by_codes", || {
            sqlx::query_as::<_, AirportRow>(
                "SELECT id, code, name, city, country FROM airports WHERE code = ANY($1)",
            )
            .bind(&codes)
            .fetch_all(&pool)
        })
        .await?;
        Ok(rows.into_iter().map(Airport::from).collect())
    }

    async fn list_all(&self) -> CoreResult<Vec<Airport>> {
        let pool = self.pool.clone();
        let rows = with_read_retry("airports.list_all", || {
            sqlx::query_as::<_, AirportRow>(
                "SELECT id, code, name, city, country FROM airports ORDER BY city ASC",
            )
            .fetch_all(&pool)
        })
        .await?;
        Ok(rows.into_iter().map(Airport::from).collect())
    }
}
