use crate::error::AppError;
use crate::state::AppState;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::{json, Value};
use skybook_core::cache::{
    AIRPORTS_KEY, AIRPORTS_TTL_SECONDS, FLIGHT_DETAIL_TTL_SECONDS, SEARCH_KEY_PREFIX,
    flight_detail_key,
};
use skybook_core::itinerary::{DateSpec, SearchQuery, SearchResponse};
use skybook_core::model::{round_money, Airport, Flight, NewFlight};
use skybook_core::CoreError;
use skybook_fare::FareInput;
use skybook_search::window::parse_date;
use tracing::info;
use uuid::Uuid;

fn default_passengers() -> u32 {
    1
}

fn default_page() -> u32 {
    1
}

fn default_limit() -> u32 {
    100
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Deserialize)]
pub struct SearchParams {
    pub from: Option<String>,
    pub to: Option<String>,
    pub date: Option<String>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    #[serde(default = "default_passengers")]
    pub passengers: u32,
    #[serde(default)]
    pub flexible: bool,
    #[serde(default)]
    pub direct_only: bool,
    #[serde(default = "default_page")]
    pub page: u32,
    #[serde(default = "default_limit")]
    pub limit: u32,
}

pub async fn search_flights(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> Result<Json<SearchResponse>, AppError> {
    let from = params
        .from
        .filter(|s| !s.trim().is_empty())
        .ok_or_else(|| CoreError::InvalidInput("Missing required parameters: from, to".into()))?;
    let to = params
        .to
        .filter(|s| !s.trim().is_empty())
        .ok_or_else(|| CoreError::InvalidInput("Missing required parameters: from, to".into()))?;

    let date = match (&params.date, &params.start_date, &params.end_date) {
        (_, Some(start), Some(end)) => DateSpec::Range {
            start: parse_date(start)?,
            end: parse_date(end)?,
        },
        (Some(date), _, _) => DateSpec::Single {
            date: parse_date(date)?,
            flexible: params.flexible,
        },
        _ => {
            return Err(CoreError::InvalidInput(
                "Missing required parameter: date or (start_date and end_date)".into(),
            )
            .into())
        }
    };

    let query = SearchQuery {
        origin: from,
        destination: to,
        date,
        passengers: params.passengers,
        direct_only: params.direct_only,
        page: params.page,
        limit: params.limit,
    };
    let response = state.search.search(&query).await?;
    Ok(Json(response))
}

pub async fn list_airports(State(state): State<AppState>) -> Result<Json<Value>, AppError> {
    if let Some(value) = state.cache.get(AIRPORTS_KEY).await {
        if let Ok(airports) = serde_json::from_value::<Vec<Airport>>(value) {
            return Ok(Json(json!({ "airports": airports, "cached": true })));
        }
    }

    let airports = state.airports.list_all().await?;
    if let Ok(value) = serde_json::to_value(&airports) {
        state
            .cache
            .set(AIRPORTS_KEY, &value, AIRPORTS_TTL_SECONDS)
            .await;
    }
    Ok(Json(json!({ "airports": airports, "cached": false })))
}

pub async fn get_flight(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Value>, AppError> {
    let key = flight_detail_key(id);
    if let Some(value) = state.cache.get(&key).await {
        if let Ok(flight) = serde_json::from_value::<Flight>(value) {
            return Ok(Json(json!({ "flight": flight, "cached": true })));
        }
    }

    let flight = state
        .flights
        .find_by_id(id)
        .await?
        .ok_or_else(|| CoreError::NotFound(format!("Flight not found: {}", id)))?;
    if let Ok(value) = serde_json::to_value(&flight) {
        state.cache.set(&key, &value, FLIGHT_DETAIL_TTL_SECONDS).await;
    }
    Ok(Json(json!({ "flight": flight, "cached": false })))
}

#[derive(Debug, Deserialize)]
pub struct EstimateRequest {
    pub origin_airport_code: String,
    pub destination_airport_code: String,
    pub departure_time: DateTime<Utc>,
    pub duration_minutes: i64,
    #[serde(default = "default_true")]
    pub is_direct: bool,
    #[serde(default)]
    pub base_price: Option<f64>,
}

pub async fn estimate_price(
    State(state): State<AppState>,
    Json(request): Json<EstimateRequest>,
) -> Result<Json<Value>, AppError> {
    let input = FareInput {
        duration_minutes: request.duration_minutes,
        departure_time: request.departure_time,
        is_direct: request.is_direct,
        origin: request.origin_airport_code,
        destination: request.destination_airport_code,
        base_price: request.base_price,
    };
    let prediction = state
        .estimator
        .estimate(&input)
        .map_err(|e| CoreError::InvalidInput(e.to_string()))?;
    Ok(Json(
        json!({ "message": "Price prediction successful", "prediction": prediction }),
    ))
}

#[derive(Debug, Deserialize)]
pub struct CreateFlightRequest {
    pub flight_number: String,
    pub origin_airport_code: String,
    pub destination_airport_code: String,
    pub departure_time: DateTime<Utc>,
    pub arrival_time: DateTime<Utc>,
    pub total_capacity: i32,
    pub base_price: f64,
    #[serde(default = "default_true")]
    pub is_direct: bool,
}

/// Administrative creation flow. The predicted price is computed up front so
/// search never has to price a flight without an estimate on record.
pub async fn create_flight(
    State(state): State<AppState>,
    Json(request): Json<CreateFlightRequest>,
) -> Result<(StatusCode, Json<Value>), AppError> {
    let flight_number = request.flight_number.trim().to_ascii_uppercase();
    if !is_valid_flight_number(&flight_number) {
        return Err(CoreError::InvalidInput(
            "Invalid flight number format. Expected format: XX123 (e.g. TK123)".into(),
        )
        .into());
    }
    if request
        .origin_airport_code
        .eq_ignore_ascii_case(&request.destination_airport_code)
    {
        return Err(CoreError::InvalidInput(
            "Origin and destination airports must be different".into(),
        )
        .into());
    }
    if request.total_capacity <= 0 || request.total_capacity > 1000 {
        return Err(
            CoreError::InvalidInput("Total capacity must be between 1 and 1000".into()).into(),
        );
    }
    if request.base_price <= 0.0 {
        return Err(CoreError::InvalidInput("Base price must be a positive number".into()).into());
    }

    let origin = resolve_airport(&state, &request.origin_airport_code).await?;
    let destination = resolve_airport(&state, &request.destination_airport_code).await?;

    let duration_minutes = (request.arrival_time - request.departure_time).num_minutes();
    if duration_minutes <= 0 {
        return Err(
            CoreError::InvalidInput("Arrival time must be after departure time".into()).into(),
        );
    }

    let prediction = state
        .estimator
        .estimate(&FareInput {
            duration_minutes,
            departure_time: request.departure_time,
            is_direct: request.is_direct,
            origin: origin.code.clone(),
            destination: destination.code.clone(),
            base_price: Some(request.base_price),
        })
        .map_err(|e| CoreError::InvalidInput(e.to_string()))?;

    let flight = state
        .flights
        .insert(&NewFlight {
            flight_number,
            origin_airport_id: origin.id,
            destination_airport_id: destination.id,
            departure_time: request.departure_time,
            arrival_time: request.arrival_time,
            duration_minutes: duration_minutes as i32,
            total_capacity: request.total_capacity,
            base_price: round_money(request.base_price),
            predicted_price: prediction.predicted_price,
            is_direct: request.is_direct,
        })
        .await?;

    // Cached search pages may now miss the new flight; drop them all.
    state.cache.del_by_prefix(SEARCH_KEY_PREFIX).await;
    info!(flight_number = %flight.flight_number, "flight created, search cache invalidated");

    Ok((
        StatusCode::CREATED,
        Json(json!({ "message": "Flight created successfully", "flight": flight })),
    ))
}

async fn resolve_airport(state: &AppState, code: &str) -> Result<Airport, AppError> {
    let normalized = code.trim().to_ascii_uppercase();
    Ok(state
        .airports
        .find_by_code(&normalized)
        .await?
        .ok_or(CoreError::UnknownAirport(normalized))?)
}

/// Two-letter carrier code followed by one to four digits.
fn is_valid_flight_number(number: &str) -> bool {
    let (carrier, digits) = match number.char_indices().nth(2) {
        Some((index, _)) => number.split_at(index),
        None => return false,
    };
    carrier.chars().all(|c| c.is_ascii_alphabetic())
        && !digits.is_empty()
        && digits.len() <= 4
        && digits.chars().all(|c| c.is_ascii_digit())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flight_number_shape_is_enforced() {
        assert!(is_valid_flight_number("TK123"));
        assert!(is_valid_flight_number("AA1"));
        assert!(is_valid_flight_number("QR9999"));
        assert!(!is_valid_flight_number("T123"));
        assert!(!is_valid_flight_number("TKA123"));
        assert!(!is_valid_flight_number("TK12345"));
        assert!(!is_valid_flight_number("TK"));
    }
}
