use chrono::{Days, NaiveDate, NaiveTime, TimeZone, Utc};
use skybook_core::itinerary::DateSpec;
use skybook_core::repository::TimeWindow;
use skybook_core::{CoreError, CoreResult};

/// Explicit date ranges are capped so one query cannot sweep the whole table.
const MAX_RANGE_DAYS: i64 = 30;

pub fn parse_date(raw: &str) -> CoreResult<NaiveDate> {
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .or_else(|_| NaiveDate::parse_from_str(raw, "%d.%m.%Y"))
        .map_err(|_| {
            CoreError::InvalidInput(format!(
                "Invalid date format: {}. Expected YYYY-MM-DD or DD.MM.YYYY",
                raw
            ))
        })
}

/// Resolves a date spec into the inclusive UTC departure window a search
/// queries against. Flexible single-date searches widen to three days on
/// each side.
pub fn build_window(spec: &DateSpec) -> CoreResult<TimeWindow> {
    match spec {
        DateSpec::Single { date, flexible } => {
            let (first, last) = if *flexible {
                (
                    date.checked_sub_days(Days::new(3)).unwrap_or(*date),
                    date.checked_add_days(Days::new(3)).unwrap_or(*date),
                )
            } else {
                (*date, *date)
            };
            Ok(TimeWindow {
                start: day_start(first),
                end: day_end(last),
                ranged: false,
            })
        }
        DateSpec::Range { start, end } => {
            if start > end {
                return Err(CoreError::InvalidInput(
                    "Start date must be before or equal to end date".to_string(),
                ));
            }
            let span_days = (*end - *start).num_days() + 1;
            if span_days > MAX_RANGE_DAYS {
                return Err(CoreError::InvalidInput(format!(
                    "Date range cannot exceed {} days",
                    MAX_RANGE_DAYS
                )));
            }
            Ok(TimeWindow {
                start: day_start(*start),
                end: day_end(*end),
                ranged: true,
            })
        }
    }
}

fn day_start(date: NaiveDate) -> chrono::DateTime<Utc> {
    Utc.from_utc_datetime(&date.and_time(NaiveTime::MIN))
}

fn day_end(date: NaiveDate) -> chrono::DateTime<Utc> {
    let end = NaiveTime::from_hms_opt(23, 59, 59).unwrap();
    Utc.from_utc_datetime(&date.and_time(end))
}
