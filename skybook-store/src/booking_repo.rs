use crate::database::{is_unique_violation, map_db_err, with_read_retry};
use crate::flight_repo::{FlightRow, FLIGHT_SELECT};
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use skybook_core::model::{
    Booking, BookingDetail, BookingStatus, Passenger, PassengerInput, PaymentMethod,
};
use skybook_core::repository::BookingRepository;
use skybook_core::{CoreError, CoreResult};
use uuid::Uuid;

pub struct PostgresBookingRepository {
    pub pool: sqlx::PgPool,
}

#[derive(sqlx::FromRow)]
struct BookingRow {
    id: Uuid,
    booking_reference: String,
    flight_id: Uuid,
    flight_segments: Vec<Uuid>,
    miles_member_id: Option<Uuid>,
    passenger_count: i32,
    total_price: f64,
    points_used: i64,
    payment_method: String,
    status: String,
    contact_email: String,
    contact_phone: Option<String>,
    created_at: DateTime<Utc>,
}

impl BookingRow {
    fn into_booking(self) -> CoreResult<Booking> {
        let payment_method = PaymentMethod::parse(&self.payment_method).ok_or_else(|| {
            CoreError::InternalError(format!(
                "Unknown payment method in store: {}",
                self.payment_method
            ))
        })?;
        let status = BookingStatus::parse(&self.status).ok_or_else(|| {
            CoreError::InternalError(format!("Unknown booking status in store: {}", self.status))
        })?;
        Ok(Booking {
            id: self.id,
            booking_reference: self.booking_reference,
            flight_id: self.flight_id,
            flight_segments: self.flight_segments,
            miles_member_id: self.miles_member_id,
            passenger_count: self.passenger_count,
            total_price: self.total_price,
            points_used: self.points_used,
            payment_method,
            status,
            contact_email: self.contact_email,
            contact_phone: self.contact_phone,
            created_at: self.created_at,
        })
    }
}

#[derive(sqlx::FromRow)]
struct PassengerRow {
    id: Uuid,
    booking_id: Uuid,
    first_name: String,
    last_name: String,
    date_of_birth: Option<NaiveDate>,
    passport_number: Option<String>,
    nationality: Option<String>,
}

#[async_trait]
impl BookingRepository for PostgresBookingRepository {
    async fn insert_booking(&self, booking: &Booking) -> CoreResult<()> {
        sqlx::query(
            r#"
            INSERT INTO bookings
                (id, booking_reference, flight_id, flight_segments, miles_member_id,
                 passenger_count, total_price, points_used, payment_method, status,
                 contact_email, contact_phone, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $13)
            "#,
        )
        .bind(booking.id)
        .bind(&booking.booking_reference)
        .bind(booking.flight_id)
        .bind(&booking.flight_segments)
        .bind(booking.miles_member_id)
        .bind(booking.passenger_count)
        .bind(booking.total_price)
        .bind(booking.points_used)
        .bind(booking.payment_method.as_str())
        .bind(booking.status.as_str())
        .bind(&booking.contact_email)
        .bind(&booking.contact_phone)
        .bind(booking.created_at)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                CoreError::ConcurrencyConflict(format!(
                    "Booking reference already in use: {}",
                    booking.booking_reference
                ))
            } else {
                map_db_err(e)
            }
        })?;
        Ok(())
    }

    async fn insert_passengers(
        &self,
        booking_id: Uuid,
        passengers: &[PassengerInput],
    ) -> CoreResult<()> {
        let mut tx = self.pool.begin().await.map_err(map_db_err)?;
        for passenger in passengers {
            sqlx::query(
                r#"
                INSERT INTO passengers
                    (id, booking_id, first_name, last_name, date_of_birth,
                     passport_number, nationality, created_at)
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
                "#,
            )
            .bind(Uuid::new_v4())
            .bind(booking_id)
            .bind(&passenger.first_name)
            .bind(&passenger.last_name)
            .bind(passenger.date_of_birth)
            .bind(&passenger.passport_number)
            .bind(&passenger.nationality)
            .bind(Utc::now())
            .execute(&mut *tx)
            .await
            .map_err(map_db_err)?;
        }
        tx.commit().await.map_err(map_db_err)?;
        Ok(())
    }

    async fn delete_booking(&self, booking_id: Uuid) -> CoreResult<()> {
        // Passenger rows go with it through the cascade.
        sqlx::query("DELETE FROM bookings WHERE id = $1")
            .bind(booking_id)
            .execute(&self.pool)
            .await
            .map_err(map_db_err)?;
        Ok(())
    }

    async fn find_by_reference(&self, reference: &str) -> CoreResult<Option<BookingDetail>> {
        let pool = self.pool.clone();
        let reference = reference.to_ascii_uppercase();
        let row = with_read_retry("bookings.find_by_reference", || {
            sqlx::query_as::<_, BookingRow>(
                r#"
                SELECT id, booking_reference, flight_id, flight_segments, miles_member_id,
                       passenger_count, total_price, points_used, payment_method, status,
                       contact_email, contact_phone, created_at
                FROM bookings
                WHERE booking_reference = $1
                "#,
            )
            .bind(&reference)
            .fetch_optional(&pool)
        })
        .await?;

        let booking = match row {
            Some(row) => row.into_booking()?,
            None => return Ok(None),
        };

        let flight_sql = format!("{} WHERE f.id = $1", FLIGHT_SELECT);
        let flight = sqlx::query_as::<_, FlightRow>(&flight_sql)
            .bind(booking.flight_id)
            .fetch_one(&self.pool)
            .await
            .map_err(map_db_err)?
            .into_flight()?;

        let passengers = sqlx::query_as::<_, PassengerRow>(
            r#"
            SELECT id, booking_id, first_name, last_name, date_of_birth,
                   passport_number, nationality
            FROM passengers
            WHERE booking_id = $1
            ORDER BY created_at ASC
            "#,
        )
        .bind(booking.id)
        .fetch_all(&self.pool)
        .await
        .map_err(map_db_err)?
        .into_iter()
        .map(|p| Passenger {
            id: p.id,
            booking_id: p.booking_id,
            first_name: p.first_name,
            last_name: p.last_name,
            date_of_birth: p.date_of_birth,
            passport_number: p.passport_number,
            nationality: p.nationality,
        })
        .collect();

        Ok(Some(BookingDetail {
            booking,
            flight,
            passengers,
        }))
    }
}
