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

//! # Activity Site Scrapers
//!
//! Viator and GetYourGuide listings, plus DuckDuckGo's HTML results as a
//! price-less fallback for destinations the tour sites do not cover.

use scraper::{ElementRef, Html, Selector};

use crate::locations::country_slug;
use crate::offer::{Category, Offer, OfferDetails, normalize_rating};
use crate::site_adapter::{SearchParams, SiteFetchFailure, SiteScraper};
use crate::text_extract::{absolute_url, element_text, extract_decimal, extract_price, truncate_chars};

const MAX_DESCRIPTION_CHARS: usize = 300;

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

// =============================================================================
// Viator
// =============================================================================

struct ViatorSelectors {
    card: Selector,
    title: Selector,
    link: Selector,
    price: Selector,
    rating: Selector,
    description: Selector,
    duration: Selector,
}

impl ViatorSelectors {
    fn new() -> Self {
        Self {
            card: Selector::parse("div.product-card-main").unwrap(),
            title: Selector::parse("h2").unwrap(),
            link: Selector::parse("a[href]").unwrap(),
            price: Selector::parse("span.basePrice").unwrap(),
            rating: Selector::parse("span.rating-star").unwrap(),
            description: Selector::parse("div.product-card-description").unwrap(),
            duration: Selector::parse("div.product-card-duration").unwrap(),
        }
    }
}

#[derive(Debug, Default, Clone)]
pub struct Viator;

impl Viator {
    pub const SITE: &'static str = "viator";
    const BASE: &'static str = "https://www.viator.com";
}

impl SiteScraper for Viator {
    fn site(&self) -> &'static str {
        Self::SITE
    }

    fn category(&self) -> Category {
        Category::Activities
    }

    fn search_url(&self, params: &SearchParams) -> Result<String, SiteFetchFailure> {
        let a = params.as_activities()?;
        Ok(format!(
            "{}/search/{}?currency={}",
            Self::BASE,
            urlencoding::encode(&a.location),
            a.currency
        ))
    }

    fn parse(&self, html: &str, params: &SearchParams) -> anyhow::Result<Vec<Offer>> {
        let search = params.as_activities()?;
        let selectors = ViatorSelectors::new();
        let document = Html::parse_document(html);
        let mut offers = Vec::new();

        for card in document.select(&selectors.card) {
            let Some(title) = first_text(card, &selectors.title) else {
                continue;
            };
            // aria-label reads "4.5 of 5 stars"
            let rating = card
                .select(&selectors.rating)
                .next()
                .and_then(|e| e.value().attr("aria-label").map(str::to_string))
                .and_then(|label| extract_decimal(&label))
                .and_then(|r| normalize_rating(r, 5.0));

            let mut offer = Offer::new(
                Self::SITE,
                title,
                OfferDetails::Activity {
                    duration: first_text(card, &selectors.duration),
                    activity_type: search.trip_type.clone(),
                },
            );
            offer.price = first_text(card, &selectors.price)
                .and_then(|p| extract_price(&p, &search.currency));
            offer.rating = rating;
            offer.description = first_text(card, &selectors.description)
                .map(|d| truncate_chars(&d, MAX_DESCRIPTION_CHARS));
            offer.url = first_href(card, &selectors.link).map(|h| absolute_url(Self::BASE, &h));
            offers.push(offer);
        }
        Ok(offers)
    }
}

// =============================================================================
// GetYourGuide
// =============================================================================

struct GetYourGuideSelectors {
    card: Selector,
    title: Selector,
    link: Selector,
    price: Selector,
    rating: Selector,
    duration: Selector,
}

impl GetYourGuideSelectors {
    fn new() -> Self {
        Self {
            card: Selector::parse("div.activity-card-body").unwrap(),
            title: Selector::parse("h3").unwrap(),
            link: Selector::parse("a[href]").unwrap(),
            price: Selector::parse("div.price-text").unwrap(),
            rating: Selector::parse("span.rating-overall").unwrap(),
            duration: Selector::parse("div.activity-card-attributes-duration").unwrap(),
        }
    }
}

#[derive(Debug, Default, Clone)]
pub struct GetYourGuide;

impl GetYourGuide {
    pub const SITE: &'static str = "getyourguide";
    const BASE: &'static str = "https://www.getyourguide.com";
}

impl SiteScraper for GetYourGuide {
    fn site(&self) -> &'static str {
        Self::SITE
    }

    fn category(&self) -> Category {
        Category::Activities
    }

    fn search_url(&self, params: &SearchParams) -> Result<String, SiteFetchFailure> {
        let a = params.as_activities()?;
        let slug = country_slug(&a.location);
        if slug.is_empty() {
            return Err(SiteFetchFailure::InvalidParams("empty location".into()));
        }
        Ok(format!(
            "{}/{}-l/?date_from={}&date_to={}&currency={}",
            Self::BASE,
            urlencoding::encode(&slug),
            a.start_date,
            a.end_date,
            a.currency
        ))
    }

    fn parse(&self, html: &str, params: &SearchParams) -> anyhow::Result<Vec<Offer>> {
        let search = params.as_activities()?;
        let selectors = GetYourGuideSelectors::new();
        let document = Html::parse_document(html);
        let mut offers = Vec::new();

        for card in document.select(&selectors.card) {
            let Some(title) = first_text(card, &selectors.title) else {
                continue;
            };
            let mut offer = Offer::new(
                Self::SITE,
                title,
                OfferDetails::Activity {
                    duration: first_text(card, &selectors.duration),
                    activity_type: search.trip_type.clone(),
                },
            );
            offer.price = first_text(card, &selectors.price)
                .and_then(|p| extract_price(&p, &search.currency));
            offer.rating = first_text(card, &selectors.rating)
                .and_then(|r| extract_decimal(&r))
                .and_then(|r| normalize_rating(r, 5.0));
            offer.url = first_href(card, &selectors.link)
                .map(|h| absolute_url(Self::BASE, &h))
                .or_else(|| self.search_url(params).ok());
            offers.push(offer);
        }
        Ok(offers)
    }
}

// =============================================================================
// DuckDuckGo
// =============================================================================

struct DuckDuckGoSelectors {
    result: Selector,
    title_link: Selector,
    snippet: Selector,
}

impl DuckDuckGoSelectors {
    fn new() -> Self {
        Self {
            result: Selector::parse(".result").unwrap(),
            title_link: Selector::parse(".result__title a").unwrap(),
            snippet: Selector::parse(".result__snippet").unwrap(),
        }
    }
}

/// DuckDuckGo wraps targets as `//duckduckgo.com/l/?uddg=<encoded>&rut=...`
fn unwrap_redirect(href: &str) -> String {
    href.split(['?', '&'])
        .find_map(|part| part.strip_prefix("uddg="))
        .and_then(|encoded| urlencoding::decode(encoded).ok())
        .map(|decoded| decoded.into_owned())
        .unwrap_or_else(|| absolute_url("https://duckduckgo.com", href))
}

#[derive(Debug, Default, Clone)]
pub struct DuckDuckGo;

impl DuckDuckGo {
    pub const SITE: &'static str = "duckduckgo";
}

impl SiteScraper for DuckDuckGo {
    fn site(&self) -> &'static str {
        Self::SITE
    }

    fn category(&self) -> Category {
        Category::Activities
    }

    fn search_url(&self, params: &SearchParams) -> Result<String, SiteFetchFailure> {
        let a = params.as_activities()?;
        let q = match &a.trip_type {
            Some(kind) => format!("top {} things to do in {}", kind, a.location),
            None => format!("top things to do in {}", a.location),
        };
        Ok(format!(
            "https://html.duckduckgo.com/html/?q={}",
            urlencoding::encode(&q)
        ))
    }

    fn parse(&self, html: &str, params: &SearchParams) -> anyhow::Result<Vec<Offer>> {
        let search = params.as_activities()?;
        let selectors = DuckDuckGoSelectors::new();
        let document = Html::parse_document(html);
        let mut offers = Vec::new();

        for result in document.select(&selectors.result) {
            let Some(link) = result.select(&selectors.title_link).next() else {
                continue;
            };
            let title = element_text(link);
            if title.is_empty() {
                continue;
            }
            let mut offer = Offer::new(
                Self::SITE,
                title,
                OfferDetails::Activity {
                    duration: None,
                    activity_type: search.trip_type.clone(),
                },
            );
            offer.description = first_text(result, &selectors.snippet)
                .map(|d| truncate_chars(&d, MAX_DESCRIPTION_CHARS));
            offer.url = link.value().attr("href").map(unwrap_redirect);
            offers.push(offer);
        }
        Ok(offers)
    }
}
