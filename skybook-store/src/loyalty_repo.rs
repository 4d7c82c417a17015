use crate::database::map_db_err;
use async_trait::async_trait;
use chrono::Utc;
use skybook_core::collaborators::{LoyaltyCredit, LoyaltyRedemption, LoyaltyService};
use skybook_core::{CoreError, CoreResult};
use tracing::info;
use uuid::Uuid;

/// Loyalty ledger backed by the relational store. Credits award one point
/// per flown minute per passenger; redemptions burn the points a booking
/// was paid with.
pub struct PostgresLoyaltyService {
    pub pool: sqlx::PgPool,
}

#[async_trait]
impl LoyaltyService for PostgresLoyaltyService {
    async fn balance(&self, member_id: Uuid) -> CoreResult<i64> {
        let points: Option<i64> =
            sqlx::query_scalar("SELECT total_points FROM miles_members WHERE id = $1")
                .bind(member_id)
                .fetch_optional(&self.pool)
                .await
                .map_err(map_db_err)?;
        points.ok_or_else(|| CoreError::NotFound(format!("Miles member not found: {}", member_id)))
    }

    async fn credit(&self, credit: &LoyaltyCredit) -> CoreResult<i64> {
        let points = credit.duration_minutes * credit.passenger_count as i64;

        let new_total: Option<i64> = sqlx::query_scalar(
            "UPDATE miles_members SET total_points = total_points + $1 WHERE id = $2 RETURNING total_points",
        )
        .bind(points)
        .bind(credit.member_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_db_err)?;
        let new_total = new_total.ok_or_else(|| {
            CoreError::NotFound(format!("Miles member not found: {}", credit.member_id))
        })?;

        sqlx::query(
            r#"
            INSERT INTO miles_ledger
                (id, member_id, transaction_type, points, description,
                 flight_id, booking_id, source, created_at)
            VALUES ($1, $2, 'EARNED', $3, $4, $5, $6, 'Booking Credit', $7)
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(credit.member_id)
        .bind(points)
        .bind(format!(
            "Earned from booking ({} passenger{})",
            credit.passenger_count,
            if credit.passenger_count > 1 { "s" } else { "" }
        ))
        .bind(credit.flight_id)
        .bind(credit.booking_id)
        .bind(Utc::now())
        .execute(&self.pool)
        .await
        .map_err(map_db_err)?;

        info!(
            member_id = %credit.member_id,
            booking_id = %credit.booking_id,
            points,
            new_total,
            "loyalty points credited"
        );
        Ok(points)
    }

    async fn redeem(&self, redemption: &LoyaltyRedemption) -> CoreResult<()> {
        let result = sqlx::query(
            "UPDATE miles_members SET total_points = total_points - $1 WHERE id = $2 AND total_points >= $1",
        )
        .bind(redemption.points)
        .bind(redemption.member_id)
        .execute(&self.pool)
        .await
        .map_err(map_db_err)?;
        if result.rows_affected() == 0 {
            return Err(CoreError::ValidationError(format!(
                "Member {} no longer holds {} points",
                redemption.member_id, redemption.points
            )));
        }

        sqlx::query(
            r#"
            INSERT INTO miles_ledger
                (id, member_id, transaction_type, points, description,
                 flight_id, booking_id, source, created_at)
            VALUES ($1, $2, 'REDEEMED', $3, $4, $5, $6, 'Flight Booking', $7)
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(redemption.member_id)
        .bind(-redemption.points)
        .bind(format!(
            "Redeemed for booking {}",
            redemption.booking_reference
        ))
        .bind(redemption.flight_id)
        .bind(redemption.booking_id)
        .bind(Utc::now())
        .execute(&self.pool)
        .await
        .map_err(map_db_err)?;

        Ok(())
    }
}
