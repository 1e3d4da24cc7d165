//!  Wayfarer Trip Planner
//!
//!  Copyright (C) 2026  The Wayfarer Developers
//!
//!  This program is free software: you can redistribute it and/or modify
//!  it under the terms of the GNU Affero General Public License as published by
//!  the Free Software Foundation, either version 3 of the License, or
//!  (at your option) any later version.
//!
//!  This program is distributed in the hope that it will be useful,
//!  but WITHOUT ANY WARRANTY; without even the implied warranty of
//!  MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
//!  GNU Affero General Public License for more details.
//!
//!  You should have received a copy of the GNU Affero General Public License
//!  along with this program.  If not, see <http://www.gnu.org/licenses/>.

//! City lookups: IATA codes for flight searches and countries for travel info.

struct KnownCity {
    name: &'static str,
    airport: &'static str,
    country: &'static str,
}

const fn city(name: &'static str, airport: &'static str, country: &'static str) -> KnownCity {
    KnownCity {
        name,
        airport,
        country,
    }
}

static KNOWN_CITIES: &[KnownCity] = &[
    city("new york", "JFK", "United States"),
    city("los angeles", "LAX", "United States"),
    city("chicago", "ORD", "United States"),
    city("san francisco", "SFO", "United States"),
    city("miami", "MIA", "United States"),
    city("boston", "BOS", "United States"),
    city("seattle", "SEA", "United States"),
    city("washington", "IAD", "United States"),
    city("toronto", "YYZ", "Canada"),
    city("vancouver", "YVR", "Canada"),
    city("mexico city", "MEX", "Mexico"),
    city("london", "LHR", "United Kingdom"),
    city("paris", "CDG", "France"),
    city("nice", "NCE", "France"),
    city("rome", "FCO", "Italy"),
    city("venice", "VCE", "Italy"),
    city("milan", "MXP", "Italy"),
    city("madrid", "MAD", "Spain"),
    city("barcelona", "BCN", "Spain"),
    city("lisbon", "LIS", "Portugal"),
    city("amsterdam", "AMS", "Netherlands"),
    city("berlin", "BER", "Germany"),
    city("munich", "MUC", "Germany"),
    city("frankfurt", "FRA", "Germany"),
    city("zurich", "ZRH", "Switzerland"),
    city("vienna", "VIE", "Austria"),
    city("prague", "PRG", "Czech Republic"),
    city("athens", "ATH", "Greece"),
    city("istanbul", "IST", "Turkey"),
    city("dubai", "DXB", "United Arab Emirates"),
    city("cairo", "CAI", "Egypt"),
    city("cape town", "CPT", "South Africa"),
    city("tokyo", "HND", "Japan"),
    city("osaka", "KIX", "Japan"),
    city("seoul", "ICN", "South Korea"),
    city("beijing", "PEK", "China"),
    city("shanghai", "PVG", "China"),
    city("hong kong", "HKG", "Hong Kong"),
    city("singapore", "SIN", "Singapore"),
    city("bangkok", "BKK", "Thailand"),
    city("bali", "DPS", "Indonesia"),
    city("delhi", "DEL", "India"),
    city("new delhi", "DEL", "India"),
    city("mumbai", "BOM", "India"),
    city("bangalore", "BLR", "India"),
    city("hyderabad", "HYD", "India"),
    city("chennai", "MAA", "India"),
    city("sydney", "SYD", "Australia"),
    city("melbourne", "MEL", "Australia"),
    city("auckland", "AKL", "New Zealand"),
    city("rio de janeiro", "GIG", "Brazil"),
    city("buenos aires", "EZE", "Argentina"),
];

fn normalize_city(name: &str) -> String {
    // "Paris, France" -> "paris"
    name.split(',')
        .next()
        .unwrap_or(name)
        .trim()
        .to_lowercase()
}

fn find_city(name: &str) -> Option<&'static KnownCity> {
    let key = normalize_city(name);
    if key.is_empty() {
        return None;
    }
    KNOWN_CITIES
        .iter()
        .find(|c| c.name == key)
        .or_else(|| {
            if key.len() < 4 {
                return None;
            }
            KNOWN_CITIES
                .iter()
                .find(|c| key.contains(c.name) || c.name.contains(key.as_str()))
        })
}

/// IATA code for a city; falls back to the first three letters upper-cased
pub fn airport_code(city_name: &str) -> String {
    let trimmed = city_name.trim();
    if trimmed.len() == 3 && trimmed.chars().all(|c| c.is_ascii_uppercase()) {
        return trimmed.to_string();
    }
    match find_city(trimmed) {
        Some(c) => c.airport.to_string(),
        None => normalize_city(trimmed)
            .chars()
            .filter(|c| c.is_alphabetic())
            .take(3)
            .collect::<String>()
            .to_uppercase(),
    }
}

/// Country for a well-known city, if the table has it
pub fn country_of_city(city_name: &str) -> Option<&'static str> {
    if let Some((_, country)) = city_name.rsplit_once(',') {
        let country = country.trim();
        if let Some(known) = KNOWN_CITIES
            .iter()
            .find(|c| c.country.eq_ignore_ascii_case(country))
        {
            return Some(known.country);
        }
    }
    find_city(city_name).map(|c| c.country)
}

/// Lowercase, dash-separated country slug as used in government site URLs
pub fn country_slug(country: &str) -> String {
    country
        .trim()
        .to_lowercase()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join("-")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_airports() {
        assert_eq!(airport_code("New York"), "JFK");
        assert_eq!(airport_code("paris"), "CDG");
        assert_eq!(airport_code("Paris, France"), "CDG");
        assert_eq!(airport_code("LHR"), "LHR");
    }

    #[test]
    fn partial_match_and_fallback() {
        assert_eq!(airport_code("Greater London"), "LHR");
        assert_eq!(airport_code("Reykjavik"), "REY");
    }

    #[test]
    fn countries() {
        assert_eq!(country_of_city("Paris"), Some("France"));
        assert_eq!(country_of_city("Kyoto, Japan"), Some("Japan"));
        assert_eq!(country_of_city("Atlantis"), None);
        assert_eq!(country_of_city(""), None);
    }

    #[test]
    fn slugs() {
        assert_eq!(country_slug("United Kingdom"), "united-kingdom");
        assert_eq!(country_slug(" France "), "france");
    }
}
