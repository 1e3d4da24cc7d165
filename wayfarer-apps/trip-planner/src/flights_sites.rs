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

//! # Flight Site Scrapers
//!
//! Side-effect free URL building and HTML parsing for Google Flights,
//! Skyscanner and Kayak result pages.

use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{ElementRef, Html, Selector};

use crate::consent_cookie::consent_cookie_header;
use crate::offer::{Category, Layover, Offer, OfferDetails};
use crate::site_adapter::{FlightSearch, SearchParams, SiteFetchFailure, SiteScraper};
use crate::text_extract::{
    element_text, extract_price, normalize_time, parse_duration_minutes, parse_stops,
};
use crate::trip_query::FlightClass;

static LAYOVER_ARIA_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(\d+)\s*hr\s*(?:(\d+)\s*min)?[^.]*?in\s+([A-Za-z][A-Za-z\s]*)").unwrap()
});

fn first_text(card: ElementRef, selector: &Selector) -> Option<String> {
    card.select(selector)
        .next()
        .map(element_text)
        .filter(|s| !s.is_empty())
}

fn flight_title(airline: &str, search: &FlightSearch, departure: Option<&str>) -> String {
    match departure {
        Some(dep) => format!(
            "{} {}-{} {}",
            airline, search.origin_code, search.destination_code, dep
        ),
        None => format!("{} {}-{}", airline, search.origin_code, search.destination_code),
    }
}

// =============================================================================
// Google Flights
// =============================================================================

struct GoogleFlightsSelectors {
    results_list: Selector,
    flight_card: Selector,
    airline: Selector,
    times: Selector,
    duration: Selector,
    stops: Selector,
    stops_container: Selector,
    arrives_next_day: Selector,
    price: Selector,
}

impl GoogleFlightsSelectors {
    fn new() -> Self {
        Self {
            results_list: Selector::parse(r#"div[jsname="YdtKid"]"#).unwrap(),
            flight_card: Selector::parse(r#"ul.Rk10dc li"#).unwrap(),
            airline: Selector::parse(r#"div.sSHqwe.tPgKwe.ogfYpf span"#).unwrap(),
            times: Selector::parse(r#"span.mv1WYe div"#).unwrap(),
            duration: Selector::parse(r#"div.Ak5kof div"#).unwrap(),
            stops: Selector::parse(r#".BbR8Ec .ogfYpf"#).unwrap(),
            stops_container: Selector::parse(r#".BbR8Ec .sSHqwe"#).unwrap(),
            arrives_next_day: Selector::parse(r#"span.bOzv6"#).unwrap(),
            price: Selector::parse(r#".YMlIz.FpEdX"#).unwrap(),
        }
    }
}

#[derive(Debug, Default, Clone)]
pub struct GoogleFlights;

impl GoogleFlights {
    pub const SITE: &'static str = "google_flights";
}

/// Layovers from the stops container's aria-label
fn google_layovers(card: ElementRef, selectors: &GoogleFlightsSelectors) -> Vec<Layover> {
    card.select(&selectors.stops_container)
        .filter_map(|el| el.value().attr("aria-label"))
        .flat_map(|label| {
            LAYOVER_ARIA_RE
                .captures_iter(label)
                .map(|cap| {
                    let hours: u32 = cap.get(1).and_then(|m| m.as_str().parse().ok()).unwrap_or(0);
                    let mins: u32 = cap.get(2).and_then(|m| m.as_str().parse().ok()).unwrap_or(0);
                    Layover {
                        airport: cap.get(3).map(|m| m.as_str().trim().to_string()).unwrap_or_default(),
                        duration_minutes: Some(hours * 60 + mins),
                    }
                })
                .collect::<Vec<_>>()
        })
        .collect()
}

impl SiteScraper for GoogleFlights {
    fn site(&self) -> &'static str {
        Self::SITE
    }

    fn category(&self) -> Category {
        Category::Flights
    }

    fn search_url(&self, params: &SearchParams) -> Result<String, SiteFetchFailure> {
        let f = params.as_flights()?;
        let mut q = format!(
            "Flights to {} from {} on {}",
            f.destination_code, f.origin_code, f.departure_date
        );
        match f.return_date {
            Some(ret) => q.push_str(&format!(" through {ret}")),
            None => q.push_str(" one way"),
        }
        q.push_str(&format!(" {} {} adults", f.cabin.label(), f.travelers));
        Ok(format!(
            "https://www.google.com/travel/flights?q={}&curr={}&hl=en",
            urlencoding::encode(&q),
            f.currency
        ))
    }

    fn cookie(&self) -> Option<String> {
        Some(consent_cookie_header())
    }

    fn parse(&self, html: &str, params: &SearchParams) -> anyhow::Result<Vec<Offer>> {
        let search = params.as_flights()?;
        let selectors = GoogleFlightsSelectors::new();
        let document = Html::parse_document(html);
        let mut offers = Vec::new();

        for list in document.select(&selectors.results_list) {
            for card in list.select(&selectors.flight_card) {
                let Some(airline) = first_text(card, &selectors.airline) else {
                    continue;
                };
                let times: Vec<String> = card
                    .select(&selectors.times)
                    .map(|e| normalize_time(&element_text(e)))
                    .collect();
                if times.len() < 2 {
                    continue;
                }
                let plus_days = first_text(card, &selectors.arrives_next_day);
                let arrival = match plus_days {
                    Some(d) => format!("{} {}", times[1], d.trim()),
                    None => times[1].clone(),
                };
                let price = first_text(card, &selectors.price)
                    .and_then(|p| extract_price(&p, &search.currency));

                let mut offer = Offer::new(
                    Self::SITE,
                    flight_title(&airline, search, Some(times[0].as_str())),
                    OfferDetails::Flight {
                        airline: Some(airline),
                        departure_time: Some(times[0].clone()),
                        arrival_time: Some(arrival),
                        duration_minutes: first_text(card, &selectors.duration)
                            .and_then(|d| parse_duration_minutes(&d)),
                        stops: first_text(card, &selectors.stops).and_then(|s| parse_stops(&s)),
                        layovers: google_layovers(card, &selectors),
                    },
                );
                offer.price = price;
                offer.url = self.search_url(params).ok();
                offers.push(offer);
            }
        }
        Ok(offers)
    }
}

// =============================================================================
// Skyscanner
// =============================================================================

struct SkyscannerSelectors {
    card: Selector,
    airline: Selector,
    price: Selector,
    duration: Selector,
    times: Selector,
    stops: Selector,
    link: Selector,
}

impl SkyscannerSelectors {
    fn new() -> Self {
        Self {
            card: Selector::parse(r#"div[data-testid="itinerary-card"]"#).unwrap(),
            airline: Selector::parse(r#"div[data-testid="flight-info"] span"#).unwrap(),
            price: Selector::parse(r#"span[data-testid="price"]"#).unwrap(),
            duration: Selector::parse(r#"span[data-testid="duration"]"#).unwrap(),
            times: Selector::parse(r#"span[data-testid="flight-times"]"#).unwrap(),
            stops: Selector::parse(r#"span[data-testid="stops"]"#).unwrap(),
            link: Selector::parse(r#"a[href]"#).unwrap(),
        }
    }
}

#[derive(Debug, Default, Clone)]
pub struct Skyscanner;

impl Skyscanner {
    pub const SITE: &'static str = "skyscanner";
    const BASE: &'static str = "https://www.skyscanner.com";

    fn cabin_param(cabin: FlightClass) -> &'static str {
        match cabin {
            FlightClass::Economy => "economy",
            FlightClass::PremiumEconomy => "premiumeconomy",
            FlightClass::Business => "business",
            FlightClass::First => "first",
        }
    }
}

impl SiteScraper for Skyscanner {
    fn site(&self) -> &'static str {
        Self::SITE
    }

    fn category(&self) -> Category {
        Category::Flights
    }

    fn search_url(&self, params: &SearchParams) -> Result<String, SiteFetchFailure> {
        let f = params.as_flights()?;
        let mut url = format!(
            "{}/transport/flights/{}/{}/{}/",
            Self::BASE,
            f.origin_code.to_lowercase(),
            f.destination_code.to_lowercase(),
            f.departure_date.format("%y%m%d")
        );
        if let Some(ret) = f.return_date {
            url.push_str(&format!("{}/", ret.format("%y%m%d")));
        }
        url.push_str(&format!(
            "?adults={}&cabinclass={}&currency={}",
            f.travelers,
            Self::cabin_param(f.cabin),
            f.currency
        ));
        Ok(url)
    }

    fn parse(&self, html: &str, params: &SearchParams) -> anyhow::Result<Vec<Offer>> {
        let search = params.as_flights()?;
        let selectors = SkyscannerSelectors::new();
        let document = Html::parse_document(html);
        let mut offers = Vec::new();

        for card in document.select(&selectors.card) {
            let Some(airline) = first_text(card, &selectors.airline) else {
                continue;
            };
            let times = first_text(card, &selectors.times).unwrap_or_default();
            let mut parts = times.split(['-', '–']).map(str::trim).filter(|s| !s.is_empty());
            let departure = parts.next().map(str::to_string);
            let arrival = parts.next().map(str::to_string);

            let mut offer = Offer::new(
                Self::SITE,
                flight_title(&airline, search, departure.as_deref()),
                OfferDetails::Flight {
                    airline: Some(airline),
                    departure_time: departure,
                    arrival_time: arrival,
                    duration_minutes: first_text(card, &selectors.duration)
                        .and_then(|d| parse_duration_minutes(&d)),
                    stops: first_text(card, &selectors.stops).and_then(|s| parse_stops(&s)),
                    layovers: Vec::new(),
                },
            );
            offer.price = first_text(card, &selectors.price)
                .and_then(|p| extract_price(&p, &search.currency));
            offer.url = card
                .select(&selectors.link)
                .next()
                .and_then(|a| a.value().attr("href"))
                .map(|h| crate::text_extract::absolute_url(Self::BASE, h))
                .or_else(|| self.search_url(params).ok());
            offers.push(offer);
        }
        Ok(offers)
    }
}

// =============================================================================
// Kayak
// =============================================================================

struct KayakSelectors {
    card: Selector,
    airline: Selector,
    price: Selector,
    duration: Selector,
    depart: Selector,
    arrive: Selector,
    stops: Selector,
}

impl KayakSelectors {
    fn new() -> Self {
        Self {
            card: Selector::parse(r#"div[class*="resultWrapper"]"#).unwrap(),
            airline: Selector::parse(r#"div[class*="codeshares-airline-names"]"#).unwrap(),
            price: Selector::parse(r#"span[class*="price-text"]"#).unwrap(),
            duration: Selector::parse(r#"div[class*="duration"]"#).unwrap(),
            depart: Selector::parse(r#"span[class*="depart-time"]"#).unwrap(),
            arrive: Selector::parse(r#"span[class*="arrival-time"]"#).unwrap(),
            stops: Selector::parse(r#"span[class*="stops-text"]"#).unwrap(),
        }
    }
}

#[derive(Debug, Default, Clone)]
pub struct Kayak;

impl Kayak {
    pub const SITE: &'static str = "kayak";

    fn cabin_segment(cabin: FlightClass) -> &'static str {
        match cabin {
            FlightClass::Economy => "",
            FlightClass::PremiumEconomy => "/premium",
            FlightClass::Business => "/business",
            FlightClass::First => "/first",
        }
    }
}

impl SiteScraper for Kayak {
    fn site(&self) -> &'static str {
        Self::SITE
    }

    fn category(&self) -> Category {
        Category::Flights
    }

    fn search_url(&self, params: &SearchParams) -> Result<String, SiteFetchFailure> {
        let f = params.as_flights()?;
        let mut url = format!(
            "https://www.kayak.com/flights/{}-{}/{}",
            f.origin_code, f.destination_code, f.departure_date
        );
        if let Some(ret) = f.return_date {
            url.push_str(&format!("/{ret}"));
        }
        url.push_str(Self::cabin_segment(f.cabin));
        url.push_str(&format!("/{}adults?sort=bestflight_a", f.travelers));
        Ok(url)
    }

    fn parse(&self, html: &str, params: &SearchParams) -> anyhow::Result<Vec<Offer>> {
        let search = params.as_flights()?;
        let selectors = KayakSelectors::new();
        let document = Html::parse_document(html);
        let mut offers = Vec::new();

        for card in document.select(&selectors.card) {
            let Some(airline) = first_text(card, &selectors.airline) else {
                continue;
            };
            let departure = first_text(card, &selectors.depart).map(|t| normalize_time(&t));
            let arrival = first_text(card, &selectors.arrive).map(|t| normalize_time(&t));

            let mut offer = Offer::new(
                Self::SITE,
                flight_title(&airline, search, departure.as_deref()),
                OfferDetails::Flight {
                    airline: Some(airline),
                    departure_time: departure,
                    arrival_time: arrival,
                    duration_minutes: first_text(card, &selectors.duration)
                        .and_then(|d| parse_duration_minutes(&d)),
                    stops: first_text(card, &selectors.stops).and_then(|s| parse_stops(&s)),
                    layovers: Vec::new(),
                },
            );
            offer.price = first_text(card, &selectors.price)
                .and_then(|p| extract_price(&p, &search.currency));
            offer.url = self.search_url(params).ok();
            offers.push(offer);
        }
        Ok(offers)
    }
}
