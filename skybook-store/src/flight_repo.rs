use crate::database::{map_db_err, with_read_retry};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use skybook_core::model::{AirportRef, Flight, FlightStatus, NewFlight};
use skybook_core::repository::{FlightRepository, LegQuery};
use skybook_core::{CoreError, CoreResult};
use uuid::Uuid;

/// Flight projection with both airports joined in; every read path shares it.
pub(crate) const FLIGHT_SELECT: &str = r#"
SELECT f.id, f.flight_number, f.departure_time, f.arrival_time, f.duration_minutes,
       f.total_capacity, f.available_capacity, f.base_price, f.predicted_price,
       f.status, f.is_direct,
       o.id AS origin_id, o.code AS origin_code, o.name AS origin_name,
       o.city AS origin_city, o.country AS origin_country,
       d.id AS destination_id, d.code AS destination_code, d.name AS destination_name,
       d.city AS destination_city, d.country AS destination_country
FROM flights f
JOIN airports o ON o.id = f.origin_airport_id
JOIN airports d ON d.id = f.destination_airport_id
"#;

const LEG_FILTER: &str = r#"
WHERE f.origin_airport_id = $1
  AND f.destination_airport_id = $2
  AND f.departure_time >= $3
  AND f.departure_time <= $4
  AND f.available_capacity >= $5
  AND f.status = 'SCHEDULED'
"#;

pub struct PostgresFlightRepository {
    pub pool: sqlx::PgPool,
}

#[derive(sqlx::FromRow)]
pub(crate) struct FlightRow {
    id: Uuid,
    flight_number: String,
    departure_time: DateTime<Utc>,
    arrival_time: DateTime<Utc>,
    duration_minutes: i32,
    total_capacity: i32,
    available_capacity: i32,
    base_price: f64,
    predicted_price: Option<f64>,
    status: String,
    is_direct: bool,
    origin_id: Uuid,
    origin_code: String,
    origin_name: String,
    origin_city: String,
    origin_country: String,
    destination_id: Uuid,
    destination_code: String,
    destination_name: String,
    destination_city: String,
    destination_country: String,
}

impl FlightRow {
    pub(crate) fn into_flight(self) -> CoreResult<Flight> {
        let status = FlightStatus::parse(&self.status).ok_or_else(|| {
            CoreError::InternalError(format!("Unknown flight status in store: {}", self.status))
        })?;
        Ok(Flight {
            id: self.id,
            flight_number: self.flight_number,
            origin: AirportRef {
                id: self.origin_id,
                code: self.origin_code,
                name: self.origin_name,
                city: self.origin_city,
                country: self.origin_country,
            },
            destination: AirportRef {
                id: self.destination_id,
                code: self.destination_code,
                name: self.destination_name,
                city: self.destination_city,
                country: self.destination_country,
            },
            departure_time: self.departure_time,
            arrival_time: self.arrival_time,
            duration_minutes: self.duration_minutes,
            total_capacity: self.total_capacity,
            available_capacity: self.available_capacity,
            base_price: self.base_price,
            predicted_price: self.predicted_price,
            status,
            is_direct: self.is_direct,
        })
    }
}

#[async_trait]
impl FlightRepository for PostgresFlightRepository {
    async fn find_by_id(&self, id: Uuid) -> CoreResult<Option<Flight>> {
        let pool = self.pool.clone();
        let sql = format!("{} WHERE f.id = $1", FLIGHT_SELECT);
        let row = with_read_retry("flights.find_by_id", || {
            sqlx::query_as::<_, FlightRow>(&sql)
                .bind(id)
                .fetch_optional(&pool)
        })
        .await?;
        row.map(FlightRow::into_flight).transpose()
    }

    async fn find_direct(&self, query: &LegQuery) -> CoreResult<(Vec<Flight>, u64)> {
        let pool = self.pool.clone();

        let count_sql = format!("SELECT COUNT(*) FROM flights f {}", LEG_FILTER);
        let total: i64 = with_read_retry("flights.count_direct", || {
            sqlx::query_scalar(&count_sql)
                .bind(query.origin_airport_id)
                .bind(query.destination_airport_id)
                .bind(query.window.start)
                .bind(query.window.end)
                .bind(query.min_seats as i32)
                .fetch_one(&pool)
        })
        .await?;

        let mut sql = format!(
            "{} {} ORDER BY f.departure_time ASC, f.id ASC",
            FLIGHT_SELECT, LEG_FILTER
        );
        if query.page.is_some() {
            sql.push_str(" LIMIT $6 OFFSET $7");
        }
        let rows = with_read_retry("flights.find_direct", || {
            let mut q = sqlx::query_as::<_, FlightRow>(&sql)
                .bind(query.origin_airport_id)
                .bind(query.destination_airport_id)
                .bind(query.window.start)
                .bind(query.window.end)
                .bind(query.min_seats as i32);
            if let Some(page) = query.page {
                q = q.bind(page.limit as i64).bind(page.offset as i64);
            }
            q.fetch_all(&pool)
        })
        .await?;

        let flights = rows
            .into_iter()
            .map(FlightRow::into_flight)
            .collect::<CoreResult<Vec<_>>>()?;
        Ok((flights, total.max(0) as u64))
    }

    async fn find_legs(&self, query: &LegQuery, limit: u32) -> CoreResult<Vec<Flight>> {
        let pool = self.pool.clone();
        let sql = format!(
            "{} {} ORDER BY f.departure_time ASC, f.id ASC LIMIT $6",
            FLIGHT_SELECT, LEG_FILTER
        );
        let rows = with_read_retry("flights.find_legs", || {
            sqlx::query_as::<_, FlightRow>(&sql)
                .bind(query.origin_airport_id)
                .bind(query.destination_airport_id)
                .bind(query.window.start)
                .bind(query.window.end)
                .bind(query.min_seats as i32)
                .bind(limit as i64)
                .fetch_all(&pool)
        })
        .await?;
        rows.into_iter().map(FlightRow::into_flight).collect()
    }

    async fn try_decrement_capacity(
        &self,
        flight_id: Uuid,
        expected_available: i32,
        seats: i32,
    ) -> CoreResult<bool> {
        // Single conditional update; the guard on the observed value is the
        // whole concurrency story for seat inventory.
        let result = sqlx::query(
            r#"
            UPDATE flights
            SET available_capacity = available_capacity - $1
            WHERE id = $2 AND available_capacity = $3 AND status = 'SCHEDULED'
            "#,
        )
        .bind(seats)
        .bind(flight_id)
        .bind(expected_available)
        .execute(&self.pool)
        .await
        .map_err(map_db_err)?;
        Ok(result.rows_affected() == 1)
    }

    async fn restore_capacity(&self, flight_id: Uuid, seats: i32) -> CoreResult<()> {
        sqlx::query("UPDATE flights SET available_capacity = available_capacity + $1 WHERE id = $2")
            .bind(seats)
            .bind(flight_id)
            .execute(&self.pool)
            .await
            .map_err(map_db_err)?;
        Ok(())
    }

    async fn insert(&self, flight: &NewFlight) -> CoreResult<Flight> {
        let id = Uuid::new_v4();
        sqlx::query(
            r#"
            INSERT INTO flights
                (id, flight_number, origin_airport_id, destination_airport_id,
                 departure_time, arrival_time, duration_minutes,
                 total_capacity, available_capacity, base_price, predicted_price,
                 status, is_direct)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $8, $9, $10, 'SCHEDULED', $11)
            "#,
        )
        .bind(id)
        .bind(&flight.flight_number)
        .bind(flight.origin_airport_id)
        .bind(flight.destination_airport_id)
        .bind(flight.departure_time)
        .bind(flight.arrival_time)
        .bind(flight.duration_minutes)
        .bind(flight.total_capacity)
        .bind(flight.base_price)
        .bind(flight.predicted_price)
        .bind(flight.is_direct)
        .execute(&self.pool)
        .await
        .map_err(map_db_err)?;

        self.find_by_id(id).await?.ok_or_else(|| {
            CoreError::InternalError("Inserted flight could not be read back".to_string())
        })
    }
}
