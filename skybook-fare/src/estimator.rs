use crate::routes;
use crate::FareError;
use chrono::{DateTime, Datelike, Timelike, Utc, Weekday};
use serde::{Deserialize, Serialize};

/// Surcharge applied to high-demand business routes.
const PREMIUM_ROUTE_SURCHARGE: f64 = 1.22;

/// Per-minute fare slopes by route class, used unless a configured
/// coefficient falls inside the accepted range.
const DOMESTIC_MINUTE_RATE: f64 = 0.30;
const INTERNATIONAL_MINUTE_RATE: f64 = 0.40;
const PREMIUM_INTERNATIONAL_MINUTE_RATE: f64 = 0.60;

#[derive(Debug, Clone)]
pub struct FareInput {
    pub duration_minutes: i64,
    pub departure_time: DateTime<Utc>,
    pub is_direct: bool,
    pub origin: String,
    pub destination: String,
    /// Optional operator-set price blended into the estimate.
    pub base_price: Option<f64>,
}

/// Tunable model coefficients. Defaults come from the trained pricing model;
/// config overrides only take effect where noted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FareCoefficients {
    /// Replaces the route-class minute rate only when it lands in
    /// [0.20, 0.70] after scaling values above 10 by 1/100.
    pub duration_coef: f64,
    pub peak_hour_coef: f64,
    pub weekend_coef: f64,
    pub last_minute_coef: f64,
    pub advance_booking_discount: f64,
    pub direct_flight_premium: f64,
    pub international_multiplier: f64,
    pub busy_month_multiplier: f64,
    pub off_peak_discount: f64,
}

impl Default for FareCoefficients {
    fn default() -> Self {
        Self {
            duration_coef: 0.18,
            peak_hour_coef: 30.0,
            weekend_coef: 40.0,
            last_minute_coef: 0.85,
            advance_booking_discount: 0.015,
            direct_flight_premium: 50.0,
            international_multiplier: 1.9,
            busy_month_multiplier: 1.15,
            off_peak_discount: 0.15,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FareFactors {
    pub base_cost: f64,
    pub duration_cost: f64,
    pub route_distance_km: f64,
    pub is_premium_route: bool,
    pub peak_hour_premium: f64,
    pub off_peak_discount: f64,
    pub weekend_premium: f64,
    pub direct_flight_premium: f64,
    pub busy_month_multiplier: f64,
    pub international_multiplier: f64,
    pub days_until_departure: i64,
    pub is_last_minute: bool,
    pub route_type: String,
    pub known_route: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FareEstimate {
    pub predicted_price: f64,
    pub currency: String,
    pub confidence: f64,
    pub factors: FareFactors,
}

/// Deterministic rule-based fare estimator. Stateless and side-effect free:
/// the same input and clock always produce the same price and breakdown.
#[derive(Debug, Clone)]
pub struct FareEstimator {
    coefficients: FareCoefficients,
    /// Weight given to a caller-supplied base price when blending. Tunable;
    /// the historical value is 0.4.
    base_price_weight: f64,
    model_confidence: f64,
}

impl Default for FareEstimator {
    fn default() -> Self {
        Self::new(FareCoefficients::default(), 0.4)
    }
}

impl FareEstimator {
    pub fn new(coefficients: FareCoefficients, base_price_weight: f64) -> Self {
        Self {
            coefficients,
            base_price_weight,
            model_confidence: 0.95,
        }
    }

    pub fn estimate(&self, input: &FareInput) -> Result<FareEstimate, FareError> {
        self.estimate_at(input, Utc::now())
    }

    /// Estimate against an explicit clock. Order of adjustments matters and
    /// must stay stable for reproducibility.
    pub fn estimate_at(
        &self,
        input: &FareInput,
        now: DateTime<Utc>,
    ) -> Result<FareEstimate, FareError> {
        if input.duration_minutes <= 0 {
            return Err(FareError::InvalidInput(
                "duration must be a positive number of minutes".to_string(),
            ));
        }

        let duration = input.duration_minutes as f64;
        let dep = input.departure_time;
        let days_until = (dep - now).num_days().max(0);
        let hour = dep.hour();
        let is_weekend = matches!(dep.weekday(), Weekday::Sat | Weekday::Sun);
        let is_peak_hour = (6..=9).contains(&hour) || (17..=20).contains(&hour);
        let is_off_peak = hour >= 22 || hour < 5;
        let is_busy_month = matches!(dep.month(), 1 | 7 | 8 | 12);

        let origin = input.origin.to_ascii_uppercase();
        let destination = input.destination.to_ascii_uppercase();
        let origin_country = routes::country_of(&origin);
        let destination_country = routes::country_of(&destination);
        let known_route = origin_country.is_some() && destination_country.is_some();

        // Unknown routes fall back to a duration heuristic: anything over
        // three hours is treated as international.
        let is_international = match (origin_country, destination_country) {
            (Some(a), Some(b)) => a != b,
            _ => input.duration_minutes > 180,
        };

        // ~800 km/h cruise speed when the route is not in the table.
        let route_distance =
            routes::route_distance(&origin, &destination).unwrap_or(duration / 60.0 * 800.0);
        let is_premium_route = routes::is_premium_route(&origin, &destination);

        let mut base_cost = (route_distance * 0.08).max(120.0);
        if is_premium_route {
            base_cost = (route_distance * 0.13).max(200.0);
        }
        if input.duration_minutes < 120 {
            base_cost = (duration * 0.8).max(80.0);
        }

        let mut price = base_cost;

        let mut minute_rate = if is_international {
            if is_premium_route {
                PREMIUM_INTERNATIONAL_MINUTE_RATE
            } else {
                INTERNATIONAL_MINUTE_RATE
            }
        } else {
            DOMESTIC_MINUTE_RATE
        };
        let mut configured_rate = self.coefficients.duration_coef;
        if configured_rate > 10.0 {
            // Large values are feature importances, not dollar rates.
            configured_rate /= 100.0;
        }
        if (0.2..=0.7).contains(&configured_rate) {
            minute_rate = configured_rate;
        }

        let duration_cost = duration * minute_rate;
        price += duration_cost;

        if is_premium_route {
            price *= PREMIUM_ROUTE_SURCHARGE;
        }

        // Coefficients below 10 are percentage multipliers, otherwise flat
        // dollar adjustments. The breakdown records the delta either way.
        let mut peak_hour_premium = 0.0;
        if is_peak_hour {
            let before = price;
            price = apply_additive_or_percent(price, self.coefficients.peak_hour_coef);
            peak_hour_premium = price - before;
        }

        let mut off_peak_discount = 0.0;
        if is_off_peak {
            price *= 1.0 - self.coefficients.off_peak_discount;
            off_peak_discount = self.coefficients.off_peak_discount;
        }

        let mut weekend_premium = 0.0;
        if is_weekend {
            let before = price;
            price = apply_additive_or_percent(price, self.coefficients.weekend_coef);
            weekend_premium = price - before;
        }

        let mut direct_flight_premium = 0.0;
        if input.is_direct {
            let before = price;
            price = apply_additive_or_percent(price, self.coefficients.direct_flight_premium);
            direct_flight_premium = price - before;
        }

        let busy_month_multiplier = if is_busy_month {
            self.coefficients.busy_month_multiplier
        } else {
            1.0
        };
        price *= busy_month_multiplier;

        let is_last_minute = days_until < 7;
        if is_last_minute {
            let urgency = (7 - days_until) as f64 / 7.0;
            price *= 1.0 + self.coefficients.last_minute_coef * urgency;
        }
        if days_until > 7 && days_until <= 30 {
            let discount_days = (days_until - 7).min(23) as f64;
            price *= 1.0 - self.coefficients.advance_booking_discount * discount_days;
        }

        let mut international_multiplier = 1.0;
        if is_international {
            let configured = self.coefficients.international_multiplier;
            international_multiplier = if is_premium_route {
                if configured >= 1.8 {
                    configured
                } else {
                    1.95
                }
            } else if configured >= 1.3 {
                configured
            } else {
                1.7
            };
            price *= international_multiplier;
        }

        if let Some(base) = input.base_price {
            if base > 0.0 {
                price = price * (1.0 - self.base_price_weight) + base * self.base_price_weight;
            }
        }

        price = (price * 100.0).round() / 100.0;

        let floor = if is_international {
            (duration * 0.5).max(150.0)
        } else {
            (duration * 0.4).max(80.0)
        };
        price = price.max(floor);

        let per_minute_ceiling = if is_international { 8.0 } else { 5.0 };
        price = price.min(duration * per_minute_ceiling);

        let mut confidence = self.model_confidence;
        if !known_route {
            confidence *= 0.95;
        }
        if input.duration_minutes < 60 || input.duration_minutes > 720 {
            confidence *= 0.92;
        }
        let price_per_minute = price / duration;
        if !(0.2..=3.0).contains(&price_per_minute) {
            confidence *= 0.90;
        }
        confidence = confidence.clamp(0.75, 0.98);
        confidence = (confidence * 100.0).round() / 100.0;

        Ok(FareEstimate {
            predicted_price: price,
            currency: "USD".to_string(),
            confidence,
            factors: FareFactors {
                base_cost: round2(base_cost),
                duration_cost: round2(duration_cost),
                route_distance_km: route_distance.round(),
                is_premium_route,
                peak_hour_premium: round2(peak_hour_premium),
                off_peak_discount,
                weekend_premium: round2(weekend_premium),
                direct_flight_premium: round2(direct_flight_premium),
                busy_month_multiplier,
                international_multiplier,
                days_until_departure: days_until,
                is_last_minute,
                route_type: if is_international {
                    "international".to_string()
                } else {
                    "domestic".to_string()
                },
                known_route,
            },
        })
    }
}

fn apply_additive_or_percent(price: f64, coef: f64) -> f64 {
    if coef < 10.0 {
        price * (1.0 + coef / 100.0)
    } else {
        price + coef
    }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
