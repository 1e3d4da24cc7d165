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

//! # Hotel Site Scrapers
//!
//! Side-effect free URL building and HTML parsing for Google Hotels,
//! Booking.com and Agoda. Prices are nightly; ratings are normalized to 0-5.

use scraper::{ElementRef, Html, Selector};

use crate::consent_cookie::consent_cookie_header;
use crate::offer::{Category, Offer, OfferDetails, Price, normalize_rating};
use crate::site_adapter::{HotelSearch, SearchParams, SiteFetchFailure, SiteScraper};
use crate::text_extract::{absolute_url, element_text, extract_count, extract_decimal, extract_price};

fn first_text(card: ElementRef, selector: &Selector) -> Option<String> {
    card.select(selector)
        .next()
        .map(element_text)
        .filter(|s| !s.is_empty())
}

fn first_href(card: ElementRef, selector: &Selector) -> Option<String> {
    card.select(selector)
        .next()
        .and_then(|e| e.value().attr("href"))
        .map(str::to_string)
}

fn nights(search: &HotelSearch) -> u32 {
    (search.check_out - search.check_in).num_days().max(1) as u32
}

fn hotel_query(search: &HotelSearch) -> String {
    match &search.accommodation_type {
        Some(kind) => format!("{} in {}", kind, search.location),
        None => format!("hotels in {}", search.location),
    }
}

// =============================================================================
// Google Hotels
// =============================================================================

struct GoogleHotelsSelectors {
    hotel_card: Selector,
    name: Selector,
    rating: Selector,
    rating_aria: Selector,
    reviews: Selector,
    price: Selector,
    amenities: Selector,
    star_class: Selector,
    link: Selector,
}

impl GoogleHotelsSelectors {
    fn new() -> Self {
        Self {
            hotel_card: Selector::parse(r#"div.uaTTDe"#).unwrap(),
            name: Selector::parse(r#"h2.BgYkof"#).unwrap(),
            rating: Selector::parse(r#"span.KFi5wf.lA0BZ"#).unwrap(),
            rating_aria: Selector::parse(r#"span[aria-label*="out of 5 stars"]"#).unwrap(),
            reviews: Selector::parse(r#"span.jdzyld"#).unwrap(),
            price: Selector::parse(r#"span.qQOQpe"#).unwrap(),
            amenities: Selector::parse(r#"span.LtjZ2d"#).unwrap(),
            star_class: Selector::parse(r#"span.UqrZme"#).unwrap(),
            link: Selector::parse(r#"a[href]"#).unwrap(),
        }
    }
}

#[derive(Debug, Default, Clone)]
pub struct GoogleHotels;

impl GoogleHotels {
    pub const SITE: &'static str = "google_hotels";
}

impl SiteScraper for GoogleHotels {
    fn site(&self) -> &'static str {
        Self::SITE
    }

    fn category(&self) -> Category {
        Category::Accommodations
    }

    fn search_url(&self, params: &SearchParams) -> Result<String, SiteFetchFailure> {
        let h = params.as_hotels()?;
        Ok(format!(
            "https://www.google.com/travel/search?q={}&checkin={}&checkout={}&adults={}&curr={}&hl=en",
            urlencoding::encode(&hotel_query(h)),
            h.check_in,
            h.check_out,
            h.guests,
            h.currency
        ))
    }

    fn cookie(&self) -> Option<String> {
        Some(consent_cookie_header())
    }

    fn parse(&self, html: &str, params: &SearchParams) -> anyhow::Result<Vec<Offer>> {
        let search = params.as_hotels()?;
        let selectors = GoogleHotelsSelectors::new();
        let document = Html::parse_document(html);
        let mut offers = Vec::new();

        for card in document.select(&selectors.hotel_card) {
            let Some(name) = first_text(card, &selectors.name) else {
                continue;
            };
            let rating = card
                .select(&selectors.rating)
                .next()
                .or_else(|| card.select(&selectors.rating_aria).next())
                .and_then(|e| extract_decimal(&element_text(e)))
                .and_then(|r| normalize_rating(r, 5.0));
            let amenities: Vec<String> = card
                .select(&selectors.amenities)
                .map(element_text)
                .filter(|s| s.len() > 2)
                .collect();
            let url = first_href(card, &selectors.link)
                .map(|h| absolute_url("https://www.google.com", &h));

            let mut offer = Offer::new(
                Self::SITE,
                name,
                OfferDetails::Hotel {
                    amenities,
                    star_class: first_text(card, &selectors.star_class),
                    address: None,
                },
            );
            offer.price = first_text(card, &selectors.price)
                .and_then(|p| extract_price(&p, &search.currency));
            offer.rating = rating;
            offer.reviews = first_text(card, &selectors.reviews).and_then(|r| extract_count(&r));
            offer.url = url;
            offers.push(offer);
        }
        Ok(offers)
    }
}

// =============================================================================
// Booking.com
// =============================================================================

struct BookingSelectors {
    card: Selector,
    name: Selector,
    link: Selector,
    price: Selector,
    rating: Selector,
    address: Selector,
}

impl BookingSelectors {
    fn new() -> Self {
        Self {
            card: Selector::parse(r#"div.sr_property_block, div[data-testid="property-card"]"#)
                .unwrap(),
            name: Selector::parse(r#"span.sr-hotel__name, div[data-testid="title"]"#).unwrap(),
            link: Selector::parse(r#"a.hotel_name_link, a[data-testid="title-link"]"#).unwrap(),
            price: Selector::parse(
                r#"div.bui-price-display__value, span[data-testid="price-and-discounted-price"]"#,
            )
            .unwrap(),
            rating: Selector::parse(
                r#"div.bui-review-score__badge, div[data-testid="review-score"] div[aria-hidden="true"]"#,
            )
            .unwrap(),
            address: Selector::parse(r#"div.sr_card_address_line, span[data-testid="address"]"#)
                .unwrap(),
        }
    }
}

#[derive(Debug, Default, Clone)]
pub struct Booking;

impl Booking {
    pub const SITE: &'static str = "booking";
    const BASE: &'static str = "https://www.booking.com";
}

impl SiteScraper for Booking {
    fn site(&self) -> &'static str {
        Self::SITE
    }

    fn category(&self) -> Category {
        Category::Accommodations
    }

    fn search_url(&self, params: &SearchParams) -> Result<String, SiteFetchFailure> {
        let h = params.as_hotels()?;
        Ok(format!(
            "{}/searchresults.html?ss={}&checkin={}&checkout={}&group_adults={}&no_rooms={}&selected_currency={}&lang=en-us",
            Self::BASE,
            urlencoding::encode(&h.location),
            h.check_in,
            h.check_out,
            h.guests,
            h.rooms,
            h.currency
        ))
    }

    fn parse(&self, html: &str, params: &SearchParams) -> anyhow::Result<Vec<Offer>> {
        let search = params.as_hotels()?;
        let selectors = BookingSelectors::new();
        let document = Html::parse_document(html);
        let stay_nights = nights(search);
        let mut offers = Vec::new();

        for card in document.select(&selectors.card) {
            let Some(name) = first_text(card, &selectors.name) else {
                continue;
            };
            let mut offer = Offer::new(
                Self::SITE,
                name,
                OfferDetails::Hotel {
                    amenities: Vec::new(),
                    star_class: None,
                    address: first_text(card, &selectors.address),
                },
            );
            // Booking displays the total for the stay
            if let Some(total) = first_text(card, &selectors.price)
                .and_then(|p| extract_price(&p, &search.currency))
            {
                offer.price = Some(Price::new(
                    (total.amount / stay_nights as f64 * 100.0).round() / 100.0,
                    total.currency.clone(),
                ));
                offer.description = Some(format!("{} for {} night(s)", total, stay_nights));
            }
            offer.rating = first_text(card, &selectors.rating)
                .and_then(|r| extract_decimal(&r))
                .and_then(|r| normalize_rating(r, 10.0));
            offer.url = first_href(card, &selectors.link).map(|h| absolute_url(Self::BASE, &h));
            offers.push(offer);
        }
        Ok(offers)
    }
}

// =============================================================================
// Agoda
// =============================================================================

struct AgodaSelectors {
    card: Selector,
    name: Selector,
    link: Selector,
    price: Selector,
    rating: Selector,
}

impl AgodaSelectors {
    fn new() -> Self {
        Self {
            card: Selector::parse(r#"div.PropertyCard"#).unwrap(),
            name: Selector::parse(r#"h3.PropertyCard__HotelName"#).unwrap(),
            link: Selector::parse(r#"a.PropertyCard__Link"#).unwrap(),
            price: Selector::parse(r#"span.PropertyCardPrice__Value"#).unwrap(),
            rating: Selector::parse(r#"div.ReviewScore-Number"#).unwrap(),
        }
    }
}

#[derive(Debug, Default, Clone)]
pub struct Agoda;

impl Agoda {
    pub const SITE: &'static str = "agoda";
    const BASE: &'static str = "https://www.agoda.com";
}

impl SiteScraper for Agoda {
    fn site(&self) -> &'static str {
        Self::SITE
    }

    fn category(&self) -> Category {
        Category::Accommodations
    }

    fn search_url(&self, params: &SearchParams) -> Result<String, SiteFetchFailure> {
        let h = params.as_hotels()?;
        Ok(format!(
            "{}/en-us/search?city={}&checkIn={}&checkOut={}&rooms={}&adults={}&currencyCode={}",
            Self::BASE,
            urlencoding::encode(&h.location),
            h.check_in.format("%d-%m-%Y"),
            h.check_out.format("%d-%m-%Y"),
            h.rooms,
            h.guests,
            h.currency
        ))
    }

    fn parse(&self, html: &str, params: &SearchParams) -> anyhow::Result<Vec<Offer>> {
        let search = params.as_hotels()?;
        let selectors = AgodaSelectors::new();
        let document = Html::parse_document(html);
        let mut offers = Vec::new();

        for card in document.select(&selectors.card) {
            let Some(name) = first_text(card, &selectors.name) else {
                continue;
            };
            let mut offer = Offer::new(Self::SITE, name, OfferDetails::empty_hotel());
            offer.price = first_text(card, &selectors.price)
                .and_then(|p| extract_price(&p, &search.currency));
            offer.rating = first_text(card, &selectors.rating)
                .and_then(|r| extract_decimal(&r))
                .and_then(|r| normalize_rating(r, 10.0));
            offer.url = first_href(card, &selectors.link).map(|h| absolute_url(Self::BASE, &h));
            offers.push(offer);
        }
        Ok(offers)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::trip_query::TripQueryInput;

    fn params() -> SearchParams {
        let q = TripQueryInput::new("New York", "Paris", "2025-06-01", "2025-06-05")
            .validate()
            .unwrap();
        SearchParams::for_category(&q, Category::Accommodations, "USD")
    }

    #[test]
    fn google_hotels_cards() {
        let html = r#"
        <div class="uaTTDe">
          <h2 class="BgYkof">Hotel Le Marais</h2>
          <span class="KFi5wf lA0BZ">4.4</span>
          <span class="jdzyld">(2,031)</span>
          <span class="qQOQpe">$212</span>
          <span class="LtjZ2d">Free Wi-Fi</span><span class="LtjZ2d">AC</span>
          <span class="UqrZme">4-star hotel</span>
          <a href="/travel/hotels/entity/abc">View</a>
        </div>
        <div class="uaTTDe"><span class="qQOQpe">$1</span></div>"#;
        let offers = GoogleHotels.parse(html, &params()).unwrap();
        assert_eq!(offers.len(), 1);
        let o = &offers[0];
        assert_eq!(o.title, "Hotel Le Marais");
        assert_eq!(o.rating, Some(4.4));
        assert_eq!(o.reviews, Some(2031));
        assert_eq!(o.price_amount(), Some(212.0));
        assert_eq!(
            o.url.as_deref(),
            Some("https://www.google.com/travel/hotels/entity/abc")
        );
        match &o.details {
            OfferDetails::Hotel {
                amenities,
                star_class,
                ..
            } => {
                assert_eq!(amenities, &vec!["Free Wi-Fi".to_string()]);
                assert_eq!(star_class.as_deref(), Some("4-star hotel"));
            }
            other => panic!("unexpected details {other:?}"),
        }
    }

    #[test]
    fn booking_cards_are_nightly_and_rescaled() {
        let html = r#"
        <div data-testid="property-card">
          <div data-testid="title">Hôtel des Arts</div>
          <a data-testid="title-link" href="/hotel/fr/des-arts.html">Hôtel des Arts</a>
          <span data-testid="address">Montmartre, Paris</span>
          <span data-testid="price-and-discounted-price">US$800</span>
          <div data-testid="review-score"><div aria-hidden="true">8.6</div><div>Excellent</div></div>
        </div>"#;
        let offers = Booking.parse(html, &params()).unwrap();
        assert_eq!(offers.len(), 1);
        let o = &offers[0];
        assert_eq!(o.price_amount(), Some(200.0));
        assert_eq!(o.rating, Some(4.3));
        assert_eq!(
            o.url.as_deref(),
            Some("https://www.booking.com/hotel/fr/des-arts.html")
        );
        assert!(o.description.as_deref().unwrap().contains("4 night"));
    }

    #[test]
    fn agoda_cards() {
        let html = r#"
        <div class="PropertyCard">
          <h3 class="PropertyCard__HotelName">Citadines Saint-Germain</h3>
          <a class="PropertyCard__Link" href="/citadines/hotel/paris-fr.html">go</a>
          <span class="PropertyCardPrice__Value">189</span>
          <div class="ReviewScore-Number">9.0</div>
        </div>"#;
        let offers = Agoda.parse(html, &params()).unwrap();
        assert_eq!(offers[0].price_amount(), Some(189.0));
        assert_eq!(offers[0].rating, Some(4.5));
    }

    #[test]
    fn urls() {
        let p = params();
        assert!(
            GoogleHotels
                .search_url(&p)
                .unwrap()
                .starts_with("https://www.google.com/travel/search?q=hotels%20in%20Paris&checkin=2025-06-01")
        );
        assert_eq!(
            Booking.search_url(&p).unwrap(),
            "https://www.booking.com/searchresults.html?ss=Paris&checkin=2025-06-01&checkout=2025-06-05&group_adults=2&no_rooms=1&selected_currency=USD&lang=en-us"
        );
        assert!(Agoda.search_url(&p).unwrap().contains("checkIn=01-06-2025"));
    }
}
