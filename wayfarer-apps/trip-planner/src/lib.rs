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

// Library for wayfarer-trip-planner
// Trip-planning aggregation: flights, hotels, activities, travel info

pub mod activities_sites;
pub mod aggregator;
pub mod amadeus;
pub mod config;
pub mod consent_cookie;
pub mod error;
pub mod flights_sites;
pub mod gov_sources;
pub mod hotels_sites;
pub mod locations;
pub mod offer;
pub mod page_fetch;
pub mod result_merger;
pub mod site_adapter;
pub mod summarizer;
pub mod text_extract;
pub mod travel_info;
pub mod trip_plan;
pub mod trip_query;

#[cfg(feature = "server")]
pub mod rest_api;

// Re-export the request/response surface
pub use aggregator::{SitePreview, SiteRegistry, TripAggregator, TripAggregatorBuilder};
pub use config::{LlmSettings, PlannerConfig};
pub use error::PlannerError;
pub use offer::{Category, Offer, OfferDetails, Price};
pub use result_merger::{CategoryResult, MergeOptions, ResultMerger, SiteFailureReport};
pub use site_adapter::{SearchParams, SiteAdapter, SiteFetchFailure, SiteOutcome};
pub use summarizer::{Summarizer, SummaryError, TripDigest};
pub use travel_info::{CountryResolver, TravelInfo, TravelInfoLookup, TravelInfoSource};
pub use trip_plan::{PlanStatus, Summary, SummarySource, TripPlanResult};
pub use trip_query::{BudgetLevel, FlightClass, TripQuery, TripQueryInput};

#[cfg(feature = "cli")]
pub use config::PlannerArgs;

// Runtime pieces integration tests and binaries build on
pub use tokio_util::sync::CancellationToken;
pub use wayfarer_fetch_queues::{Backoff, FetchQueue};
