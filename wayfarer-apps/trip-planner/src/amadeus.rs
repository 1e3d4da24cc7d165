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

//! # Amadeus Self-Service APIs
//!
//! JSON adapters for flight offers and hotel offers, the sources that do not
//! scrape. Both share one [`AmadeusSession`], so one OAuth2 token serves
//! every request. Without API credentials neither is registered.

use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{Context, Result, bail};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;
use tokio::sync::Mutex;
use wayfarer_fetch_queues::{AttemptError, FetchQueue};

use crate::offer::{Category, Offer, OfferDetails, Price};
use crate::site_adapter::{FlightSearch, HotelSearch, SearchParams, SiteAdapter, SiteFetchFailure};
use crate::text_extract::parse_duration_minutes;
use crate::trip_query::FlightClass;

pub const DEFAULT_AMADEUS_BASE_URL: &str = "https://test.api.amadeus.com";
const MAX_OFFERS: usize = 10;
const MAX_AMENITIES: usize = 5;
/// Hotels asked for per wanted offer; many listed hotels have no availability
const HOTELS_PER_OFFER: usize = 3;

#[derive(Clone)]
pub struct AmadeusCredentials {
    pub api_key: String,
    pub api_secret: String,
    pub base_url: String,
}

impl std::fmt::Debug for AmadeusCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AmadeusCredentials")
            .field("api_key", &"<redacted>")
            .field("base_url", &self.base_url)
            .finish()
    }
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
    expires_in: u64,
}

struct CachedToken {
    value: String,
    expires_at: Instant,
}

// =============================================================================
// Session
// =============================================================================

/// Client, fetch queue and cached access token shared by the Amadeus adapters
pub struct AmadeusSession {
    client: Arc<wreq::Client>,
    queue: FetchQueue,
    credentials: AmadeusCredentials,
    token: Mutex<Option<CachedToken>>,
}

impl AmadeusSession {
    pub fn new(client: Arc<wreq::Client>, queue: FetchQueue, credentials: AmadeusCredentials) -> Self {
        Self {
            client,
            queue,
            credentials,
            token: Mutex::new(None),
        }
    }

    fn url(&self, path_and_query: &str) -> String {
        format!("{}{}", self.credentials.base_url, path_and_query)
    }

    /// Rejected credentials are `Disabled`; anything else is `Unreachable`
    async fn access_token(&self) -> Result<String, SiteFetchFailure> {
        {
            let cached = self.token.lock().await;
            if let Some(token) = cached.as_ref().filter(|t| t.expires_at > Instant::now()) {
                return Ok(token.value.clone());
            }
        }

        let url = self.url("/v1/security/oauth2/token");
        let body = format!(
            "grant_type=client_credentials&client_id={}&client_secret={}",
            urlencoding::encode(&self.credentials.api_key),
            urlencoding::encode(&self.credentials.api_secret)
        );
        let resp = self
            .client
            .post(&url)
            .header("Content-Type", "application/x-www-form-urlencoded")
            .body(body)
            .send()
            .await
            .map_err(|e| SiteFetchFailure::Unreachable(format!("Token request failed: {e}")))?;
        let status = resp.status();
        if matches!(status.as_u16(), 400 | 401 | 403) {
            return Err(SiteFetchFailure::Disabled(format!(
                "credentials rejected: HTTP {}",
                status.as_u16()
            )));
        }
        if !status.is_success() {
            return Err(SiteFetchFailure::Unreachable(format!(
                "Token request failed: HTTP {}",
                status.as_u16()
            )));
        }
        let token: TokenResponse = resp
            .json()
            .await
            .map_err(|e| SiteFetchFailure::Parse(format!("Token response: {e}")))?;

        let value = token.access_token.clone();
        // refresh a minute early
        let ttl = Duration::from_secs(token.expires_in.saturating_sub(60));
        *self.token.lock().await = Some(CachedToken {
            value: token.access_token,
            expires_at: Instant::now() + ttl,
        });
        Ok(value)
    }

    /// Authorized GET through the fetch queue. 4xx answers are not retried.
    async fn get_json(&self, path_and_query: &str, what: &str) -> Result<Value, SiteFetchFailure> {
        let token = self.access_token().await?;
        let url = self.url(path_and_query);
        tracing::debug!("[amadeus] GET {}", path_and_query);

        self.queue
            .run(|| {
                let client = Arc::clone(&self.client);
                let url = url.clone();
                let auth = format!("Bearer {token}");
                let what = what.to_string();
                async move {
                    let resp = client
                        .get(&url)
                        .header("Authorization", auth)
                        .send()
                        .await
                        .with_context(|| format!("{what} request failed"))?;
                    let status = resp.status();
                    if status.is_client_error() {
                        return Err(AttemptError::abort(anyhow::anyhow!(
                            "{} rejected: HTTP {}",
                            what,
                            status.as_u16()
                        )));
                    }
                    if !status.is_success() {
                        return Err(anyhow::anyhow!("HTTP {}", status.as_u16()).into());
                    }
                    Ok(resp.json::<Value>().await.with_context(|| format!("{what} body"))?)
                }
            })
            .await
            .map_err(|e| SiteFetchFailure::Unreachable(format!("{e:#}")))
    }
}

// =============================================================================
// Flights
// =============================================================================

pub struct AmadeusFlights {
    session: Arc<AmadeusSession>,
}

impl AmadeusFlights {
    pub const SITE: &'static str = "amadeus";

    pub fn new(session: Arc<AmadeusSession>) -> Self {
        Self { session }
    }
}

fn flight_offers_query(f: &FlightSearch) -> String {
    let mut query = format!(
        "/v2/shopping/flight-offers?originLocationCode={}&destinationLocationCode={}&departureDate={}&adults={}&travelClass={}&currencyCode={}&max={}",
        f.origin_code,
        f.destination_code,
        f.departure_date,
        f.travelers,
        travel_class(f.cabin),
        f.currency,
        MAX_OFFERS
    );
    if let Some(ret) = f.return_date {
        query.push_str(&format!("&returnDate={ret}"));
    }
    query
}

fn travel_class(cabin: FlightClass) -> &'static str {
    match cabin {
        FlightClass::Economy => "ECONOMY",
        FlightClass::PremiumEconomy => "PREMIUM_ECONOMY",
        FlightClass::Business => "BUSINESS",
        FlightClass::First => "FIRST",
    }
}

/// `2025-06-01T19:30:00` -> `19:30`
fn clock_time(at: &str) -> Option<String> {
    at.split_once('T').map(|(_, t)| t.chars().take(5).collect())
}

/// Offers from a `/v2/shopping/flight-offers` response body
pub fn parse_flight_offers(body: &Value, search: &FlightSearch) -> Result<Vec<Offer>> {
    let Some(data) = body.get("data").and_then(Value::as_array) else {
        bail!("response has no data array");
    };
    let carriers = body.pointer("/dictionaries/carriers");

    let offers = data
        .iter()
        .filter_map(|item| {
            let itinerary = item.pointer("/itineraries/0")?;
            let segments = itinerary.get("segments")?.as_array()?;
            let first = segments.first()?;
            let last = segments.last()?;
            let code = first.get("carrierCode")?.as_str()?;
            let airline = carriers
                .and_then(|c| c.get(code))
                .and_then(Value::as_str)
                .unwrap_or(code)
                .to_string();
            let departure = first.pointer("/departure/at").and_then(Value::as_str).and_then(clock_time);
            let arrival = last.pointer("/arrival/at").and_then(Value::as_str).and_then(clock_time);
            let duration = itinerary
                .get("duration")
                .and_then(Value::as_str)
                .and_then(|d| parse_duration_minutes(&d.to_lowercase()));
            let price = item.pointer("/price/grandTotal").and_then(Value::as_str).and_then(|total| {
                let currency = item.pointer("/price/currency").and_then(Value::as_str)?;
                Some(Price::new(total.parse().ok()?, currency))
            });

            let title = match &departure {
                Some(dep) => format!("{} {}-{} {}", airline, search.origin_code, search.destination_code, dep),
                None => format!("{} {}-{}", airline, search.origin_code, search.destination_code),
            };
            let mut offer = Offer::new(
                AmadeusFlights::SITE,
                title,
                OfferDetails::Flight {
                    airline: Some(airline),
                    departure_time: departure,
                    arrival_time: arrival,
                    duration_minutes: duration,
                    stops: Some(segments.len().saturating_sub(1) as u32),
                    layovers: Vec::new(),
                },
            );
            offer.price = price;
            Some(offer)
        })
        .collect();
    Ok(offers)
}

#[async_trait]
impl SiteAdapter for AmadeusFlights {
    fn site(&self) -> &str {
        Self::SITE
    }

    fn category(&self) -> Category {
        Category::Flights
    }

    async fn fetch(&self, params: &SearchParams) -> Result<Vec<Offer>, SiteFetchFailure> {
        let search = params.as_flights()?;
        let body = self.session.get_json(&flight_offers_query(search), "Flight offers").await?;

        let offers = parse_flight_offers(&body, search)
            .map_err(|e| SiteFetchFailure::Parse(format!("{e:#}")))?;
        if offers.is_empty() {
            return Err(SiteFetchFailure::NoResults);
        }
        Ok(offers)
    }
}

// =============================================================================
// Hotels
// =============================================================================

/// Hotel offers in three calls: city code, hotels in the city, then
/// best-rate offers for a batch of those hotels
pub struct AmadeusHotels {
    session: Arc<AmadeusSession>,
    max_offers: usize,
}

impl AmadeusHotels {
    pub const SITE: &'static str = "amadeus";

    pub fn new(session: Arc<AmadeusSession>, max_offers: usize) -> Self {
        Self {
            session,
            max_offers: max_offers.max(1),
        }
    }
}

/// IATA city code from a `/v1/reference-data/locations/cities` response
pub fn parse_city_code(body: &Value) -> Option<String> {
    body.pointer("/data/0/iataCode")
        .and_then(Value::as_str)
        .filter(|code| !code.is_empty())
        .map(str::to_string)
}

/// Up to `limit` hotel ids from a `hotels/by-city` response
pub fn parse_hotel_ids(body: &Value, limit: usize) -> Vec<String> {
    body.get("data")
        .and_then(Value::as_array)
        .map(|hotels| {
            hotels
                .iter()
                .filter_map(|h| h.get("hotelId").and_then(Value::as_str))
                .take(limit)
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}

/// Offers from a `/v3/shopping/hotel-offers` response; totals become nightly
pub fn parse_hotel_offers(body: &Value, nights: u32) -> Result<Vec<Offer>> {
    let Some(data) = body.get("data").and_then(Value::as_array) else {
        bail!("response has no data array");
    };
    let nights = nights.max(1);

    let offers = data
        .iter()
        .filter_map(|item| {
            let hotel = item.get("hotel")?;
            let name = hotel.get("name").and_then(Value::as_str)?.trim();
            if name.is_empty() {
                return None;
            }
            let best = item.pointer("/offers/0")?;
            let price = best.pointer("/price/total").and_then(Value::as_str).and_then(|total| {
                let total: f64 = total.parse().ok()?;
                let currency = best.pointer("/price/currency").and_then(Value::as_str)?;
                Some((total, Price::new(((total / nights as f64) * 100.0).round() / 100.0, currency)))
            });
            let amenities = hotel
                .get("amenities")
                .and_then(Value::as_array)
                .map(|list| {
                    list.iter()
                        .filter_map(Value::as_str)
                        .take(MAX_AMENITIES)
                        .map(|a| a.replace('_', " ").to_lowercase())
                        .collect()
                })
                .unwrap_or_default();
            let star_class = hotel
                .get("rating")
                .and_then(|r| r.as_str().map(str::to_string).or_else(|| r.as_u64().map(|n| n.to_string())))
                .map(|stars| format!("{stars}-star hotel"));
            let room = best
                .pointer("/room/typeEstimated/category")
                .and_then(Value::as_str)
                .map(|c| c.replace('_', " ").to_lowercase());

            let mut offer = Offer::new(
                AmadeusHotels::SITE,
                name,
                OfferDetails::Hotel {
                    amenities,
                    star_class,
                    address: None,
                },
            );
            if let Some((total, nightly)) = price {
                offer.description = Some(match room {
                    Some(room) => format!("{}, {:.2} {} for {} night(s)", room, total, nightly.currency, nights),
                    None => format!("{:.2} {} for {} night(s)", total, nightly.currency, nights),
                });
                offer.price = Some(nightly);
            }
            Some(offer)
        })
        .collect();
    Ok(offers)
}

fn hotel_offers_query(search: &HotelSearch, hotel_ids: &[String]) -> String {
    let rooms = search.rooms.max(1);
    format!(
        "/v3/shopping/hotel-offers?hotelIds={}&adults={}&roomQuantity={}&checkInDate={}&checkOutDate={}&currency={}&bestRateOnly=true",
        hotel_ids.join(","),
        search.guests.div_ceil(rooms).max(1),
        rooms,
        search.check_in,
        search.check_out,
        search.currency
    )
}

#[async_trait]
impl SiteAdapter for AmadeusHotels {
    fn site(&self) -> &str {
        Self::SITE
    }

    fn category(&self) -> Category {
        Category::Accommodations
    }

    async fn fetch(&self, params: &SearchParams) -> Result<Vec<Offer>, SiteFetchFailure> {
        let search = params.as_hotels()?;

        let cities = self
            .session
            .get_json(
                &format!(
                    "/v1/reference-data/locations/cities?keyword={}&max=1",
                    urlencoding::encode(&search.location)
                ),
                "City lookup",
            )
            .await?;
        let Some(city_code) = parse_city_code(&cities) else {
            tracing::debug!("[amadeus] no city code for {}", search.location);
            return Err(SiteFetchFailure::NoResults);
        };

        let listed = self
            .session
            .get_json(
                &format!(
                    "/v1/reference-data/locations/hotels/by-city?cityCode={city_code}&radius=20&radiusUnit=KM&hotelSource=ALL"
                ),
                "Hotel list",
            )
            .await?;
        let hotel_ids = parse_hotel_ids(&listed, self.max_offers * HOTELS_PER_OFFER);
        if hotel_ids.is_empty() {
            return Err(SiteFetchFailure::NoResults);
        }

        let body = self
            .session
            .get_json(&hotel_offers_query(search, &hotel_ids), "Hotel offers")
            .await?;
        let nights = (search.check_out - search.check_in).num_days().max(1) as u32;
        let mut offers =
            parse_hotel_offers(&body, nights).map_err(|e| SiteFetchFailure::Parse(format!("{e:#}")))?;
        offers.truncate(self.max_offers);
        if offers.is_empty() {
            return Err(SiteFetchFailure::NoResults);
        }
        Ok(offers)
    }
}
