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

//! # Site Adapters
//!
//! One adapter per travel site. An adapter turns category-specific
//! [`SearchParams`] into offers in the site's native order, or a
//! [`SiteFetchFailure`] explaining why it could not. A failure is data: the
//! aggregator records it next to an empty list and moves on.
//!
//! Most adapters scrape HTML. Those implement the synchronous [`SiteScraper`]
//! (URL building plus parsing) and are lifted into [`SiteAdapter`] by
//! [`ScrapingAdapter`], which owns the network side.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::locations::airport_code;
use crate::offer::{Category, Offer};
use crate::page_fetch::PageSource;
use crate::trip_query::{BudgetLevel, FlightClass, TripQuery};

/// Why a single site produced no offers
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[serde(tag = "kind", content = "detail", rename_all = "snake_case")]
pub enum SiteFetchFailure {
    #[error("site unreachable: {0}")]
    Unreachable(String),
    #[error("blocked by site: {0}")]
    Blocked(String),
    #[error("could not parse results: {0}")]
    Parse(String),
    #[error("no results")]
    NoResults,
    #[error("timed out after {0} ms")]
    Timeout(u64),
    #[error("invalid parameters: {0}")]
    InvalidParams(String),
    #[error("disabled: {0}")]
    Disabled(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlightSearch {
    pub origin_city: String,
    pub destination_city: String,
    pub origin_code: String,
    pub destination_code: String,
    pub departure_date: NaiveDate,
    /// `None` for a one-way search
    pub return_date: Option<NaiveDate>,
    pub travelers: u32,
    pub cabin: FlightClass,
    pub currency: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HotelSearch {
    pub location: String,
    pub check_in: NaiveDate,
    pub check_out: NaiveDate,
    pub guests: u32,
    pub rooms: u32,
    pub budget_level: BudgetLevel,
    pub accommodation_type: Option<String>,
    pub currency: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActivitySearch {
    pub location: String,
    pub trip_type: Option<String>,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub currency: String,
}

/// Normalized search parameters for one category, echoed back as `search_params`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "category", rename_all = "snake_case")]
pub enum SearchParams {
    Flights(FlightSearch),
    Accommodations(HotelSearch),
    Activities(ActivitySearch),
}

impl SearchParams {
    pub fn for_category(query: &TripQuery, category: Category, currency: &str) -> Self {
        match category {
            Category::Flights => SearchParams::Flights(FlightSearch {
                origin_city: query.origin_city().to_string(),
                destination_city: query.destination_city().to_string(),
                origin_code: airport_code(query.origin_city()),
                destination_code: airport_code(query.destination_city()),
                departure_date: query.start_date(),
                return_date: (!query.is_one_way()).then(|| query.end_date()),
                travelers: query.travelers(),
                cabin: query.flight_class(),
                currency: currency.to_string(),
            }),
            Category::Accommodations => SearchParams::Accommodations(HotelSearch {
                location: query.destination_city().to_string(),
                check_in: query.start_date(),
                check_out: query.end_date().max(query.start_date().succ_opt().unwrap_or(query.end_date())),
                guests: query.travelers(),
                rooms: query.rooms(),
                budget_level: query.budget_level(),
                accommodation_type: query.accommodation_type().map(str::to_string),
                currency: currency.to_string(),
            }),
            Category::Activities => SearchParams::Activities(ActivitySearch {
                location: query.destination_city().to_string(),
                trip_type: query.trip_type().map(str::to_string),
                start_date: query.start_date(),
                end_date: query.end_date(),
                currency: currency.to_string(),
            }),
        }
    }

    pub fn category(&self) -> Category {
        match self {
            SearchParams::Flights(_) => Category::Flights,
            SearchParams::Accommodations(_) => Category::Accommodations,
            SearchParams::Activities(_) => Category::Activities,
        }
    }

    pub fn currency(&self) -> &str {
        match self {
            SearchParams::Flights(p) => &p.currency,
            SearchParams::Accommodations(p) => &p.currency,
            SearchParams::Activities(p) => &p.currency,
        }
    }

    pub fn as_flights(&self) -> Result<&FlightSearch, SiteFetchFailure> {
        match self {
            SearchParams::Flights(p) => Ok(p),
            other => Err(mismatch(Category::Flights, other)),
        }
    }

    pub fn as_hotels(&self) -> Result<&HotelSearch, SiteFetchFailure> {
        match self {
            SearchParams::Accommodations(p) => Ok(p),
            other => Err(mismatch(Category::Accommodations, other)),
        }
    }

    pub fn as_activities(&self) -> Result<&ActivitySearch, SiteFetchFailure> {
        match self {
            SearchParams::Activities(p) => Ok(p),
            other => Err(mismatch(Category::Activities, other)),
        }
    }
}

fn mismatch(expected: Category, got: &SearchParams) -> SiteFetchFailure {
    SiteFetchFailure::InvalidParams(format!(
        "expected {expected} parameters, got {}",
        got.category()
    ))
}

/// A travel site queried for one category
#[async_trait]
pub trait SiteAdapter: Send + Sync {
    /// Stable site identifier, used as the `by_site` key
    fn site(&self) -> &str;

    fn category(&self) -> Category;

    async fn fetch(&self, params: &SearchParams) -> Result<Vec<Offer>, SiteFetchFailure>;

    /// Page the adapter would request, for dry runs. `None` for API adapters.
    fn preview_url(&self, _params: &SearchParams) -> Option<String> {
        None
    }
}

/// What one site fetch produced, success or not
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SiteOutcome {
    pub site: String,
    pub offers: Vec<Offer>,
    pub failure: Option<SiteFetchFailure>,
    pub elapsed_ms: u64,
}

impl SiteOutcome {
    pub fn from_result(
        site: impl Into<String>,
        result: Result<Vec<Offer>, SiteFetchFailure>,
        elapsed_ms: u64,
    ) -> Self {
        let (offers, failure) = match result {
            Ok(offers) => (offers, None),
            Err(failure) => (Vec::new(), Some(failure)),
        };
        Self {
            site: site.into(),
            offers,
            failure,
            elapsed_ms,
        }
    }

    pub fn failed(site: impl Into<String>, failure: SiteFetchFailure, elapsed_ms: u64) -> Self {
        Self::from_result(site, Err(failure), elapsed_ms)
    }
}

/// URL building and HTML parsing for one scraped site. No I/O.
pub trait SiteScraper: Send + Sync {
    fn site(&self) -> &'static str;

    fn category(&self) -> Category;

    fn search_url(&self, params: &SearchParams) -> Result<String, SiteFetchFailure>;

    /// `Cookie` header to send along, if the site needs one
    fn cookie(&self) -> Option<String> {
        None
    }

    /// Offers found in `html`, in page order. An empty vec means the page had no listings.
    fn parse(&self, html: &str, params: &SearchParams) -> anyhow::Result<Vec<Offer>>;
}

/// Lifts a [`SiteScraper`] into a [`SiteAdapter`] over a shared [`PageSource`]
pub struct ScrapingAdapter<S> {
    scraper: S,
    pages: Arc<dyn PageSource>,
    max_offers: usize,
}

impl<S: SiteScraper> ScrapingAdapter<S> {
    pub fn new(scraper: S, pages: Arc<dyn PageSource>, max_offers: usize) -> Self {
        Self {
            scraper,
            pages,
            max_offers: max_offers.max(1),
        }
    }
}

#[async_trait]
impl<S: SiteScraper> SiteAdapter for ScrapingAdapter<S> {
    fn site(&self) -> &str {
        self.scraper.site()
    }

    fn category(&self) -> Category {
        self.scraper.category()
    }

    async fn fetch(&self, params: &SearchParams) -> Result<Vec<Offer>, SiteFetchFailure> {
        if params.category() != self.scraper.category() {
            return Err(mismatch(self.scraper.category(), params));
        }
        let url = self.scraper.search_url(params)?;
        let cookie = self.scraper.cookie();
        let html = self.pages.fetch_page(&url, cookie.as_deref()).await?;
        let mut offers = self
            .scraper
            .parse(&html, params)
            .map_err(|e| SiteFetchFailure::Parse(format!("{e:#}")))?;
        if offers.is_empty() {
            return Err(SiteFetchFailure::NoResults);
        }
        offers.truncate(self.max_offers);
        tracing::debug!(site = self.scraper.site(), count = offers.len(), "[scrape] parsed offers");
        Ok(offers)
    }

    fn preview_url(&self, params: &SearchParams) -> Option<String> {
        self.scraper.search_url(params).ok()
    }
}
