use skybook_core::cache::SEARCH_KEY_PREFIX;
use skybook_core::itinerary::{DateSpec, SearchQuery};

/// Canonical cache key for a search. Parameters are normalized (codes
/// uppercased, dates ISO) so textually different but equivalent queries
/// collide on the same entry.
pub fn search_key(query: &SearchQuery) -> String {
    let date_part = match &query.date {
        DateSpec::Single { date, flexible } => format!("{}:{}", date, flexible),
        DateSpec::Range { start, end } => format!("{}_{}", start, end),
    };
    format!(
        "{}{}:{}:{}:{}:{}:{}:{}",
        SEARCH_KEY_PREFIX,
        query.origin.to_ascii_uppercase(),
        query.destination.to_ascii_uppercase(),
        date_part,
        query.passengers,
        query.direct_only,
        query.page,
        query.limit
    )
}
