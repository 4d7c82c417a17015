//! Static route knowledge backing the estimator. Airports outside these
//! tables still price: country falls back to a duration heuristic and
//! distance is derived from flight time.

const AIRPORT_COUNTRIES: &[(&str, &str)] = &[
    // Turkey
    ("IST", "Turkey"),
    ("SAW", "Turkey"),
    ("ESB", "Turkey"),
    ("ADB", "Turkey"),
    ("AYT", "Turkey"),
    // USA
    ("JFK", "USA"),
    ("LAX", "USA"),
    ("ORD", "USA"),
    ("DFW", "USA"),
    ("MIA", "USA"),
    ("SFO", "USA"),
    // Europe
    ("LHR", "UK"),
    ("CDG", "France"),
    ("FRA", "Germany"),
    ("AMS", "Netherlands"),
    ("MAD", "Spain"),
    ("FCO", "Italy"),
    ("VIE", "Austria"),
    ("ZUR", "Switzerland"),
    ("CPH", "Denmark"),
    // Middle East
    ("DXB", "UAE"),
    ("AUH", "UAE"),
    ("DOH", "Qatar"),
    ("RUH", "Saudi Arabia"),
    // Asia
    ("SIN", "Singapore"),
    ("BKK", "Thailand"),
    ("HKG", "Hong Kong"),
    ("NRT", "Japan"),
    ("ICN", "South Korea"),
    ("PEK", "China"),
    ("BOM", "India"),
    ("DEL", "India"),
];

/// Great-circle-ish distances in kilometers for routes we price often.
const ROUTE_DISTANCES: &[(&str, &str, f64)] = &[
    ("IST", "DXB", 3100.0),
    ("SAW", "DXB", 3100.0),
    ("IST", "JFK", 7800.0),
    ("IST", "LHR", 2500.0),
    ("IST", "FRA", 1900.0),
    ("IST", "CDG", 2400.0),
    ("IST", "AMS", 2200.0),
    ("IST", "AYT", 480.0),
    ("IST", "ADB", 350.0),
    ("IST", "ESB", 350.0),
    ("LHR", "CDG", 340.0),
    ("LHR", "FRA", 650.0),
    ("LHR", "AMS", 360.0),
    ("CDG", "FRA", 450.0),
    ("DXB", "LHR", 5500.0),
    ("DXB", "SIN", 6200.0),
    ("DXB", "BKK", 4600.0),
    ("JFK", "LAX", 4000.0),
    ("JFK", "SFO", 4100.0),
    ("JFK", "MIA", 1800.0),
    ("JFK", "LHR", 5500.0),
    ("JFK", "CDG", 5800.0),
];

/// High-demand business routes carrying a base-cost and multiplier premium.
const PREMIUM_ROUTES: &[(&str, &str)] = &[
    ("IST", "DXB"),
    ("SAW", "DXB"),
    ("IST", "JFK"),
    ("IST", "LHR"),
    ("IST", "FRA"),
    ("JFK", "LAX"),
    ("JFK", "LHR"),
    ("LHR", "CDG"),
    ("DXB", "LHR"),
];

pub fn country_of(code: &str) -> Option<&'static str> {
    AIRPORT_COUNTRIES
        .iter()
        .find(|(c, _)| *c == code)
        .map(|(_, country)| *country)
}

/// Distance for the route in either direction, if known.
pub fn route_distance(origin: &str, destination: &str) -> Option<f64> {
    ROUTE_DISTANCES
        .iter()
        .find(|(a, b, _)| (*a == origin && *b == destination) || (*a == destination && *b == origin))
        .map(|(_, _, km)| *km)
}

pub fn is_premium_route(origin: &str, destination: &str) -> bool {
    PREMIUM_ROUTES
        .iter()
        .any(|(a, b)| (*a == origin && *b == destination) || (*a == destination && *b == origin))
}
