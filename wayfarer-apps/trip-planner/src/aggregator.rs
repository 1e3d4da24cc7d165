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

//! # Trip Aggregator
//!
//! Fans a validated [`TripQuery`] out to every registered site adapter and to
//! the travel-info lookup, all at once, then merges each category and builds
//! the [`TripPlanResult`] envelope.
//!
//! Every fetch is bounded by the earlier of its own site timeout and the
//! request deadline. Outcomes are collected in registration order, so the
//! merged result never depends on which site answered first. Nothing here
//! fails: missing data shows up as failures, `metadata.errors` and the
//! envelope status.

use std::sync::Arc;

use futures::future::join_all;
use tokio::time::{Instant, timeout_at};
use tokio_util::sync::CancellationToken;
use wayfarer_fetch_queues::FetchQueue;

use crate::activities_sites::{DuckDuckGo, GetYourGuide, Viator};
use crate::amadeus::{AmadeusFlights, AmadeusHotels, AmadeusSession};
use crate::config::PlannerConfig;
use crate::error::PlannerError;
use crate::flights_sites::{GoogleFlights, Kayak, Skyscanner};
use crate::gov_sources::GovernmentSources;
use crate::hotels_sites::{Agoda, Booking, GoogleHotels};
use crate::offer::Category;
use crate::page_fetch::{PageFetcher, PageSource, build_http_client};
use crate::result_merger::{CategoryResult, ResultMerger};
use crate::site_adapter::{ScrapingAdapter, SearchParams, SiteAdapter, SiteFetchFailure, SiteOutcome, SiteScraper};
use crate::summarizer::{OpenAiSummarizer, Summarizer, TripDigest, templated_summary};
use crate::travel_info::{KnownCities, TravelInfo, TravelInfoLookup};
use crate::trip_plan::{PlanMetadata, PlanStatus, SummarySource, TripPlanResult};
use crate::trip_query::TripQuery;

// =============================================================================
// Site registry
// =============================================================================

/// Site adapters in registration order, keyed by site name within a category
#[derive(Clone, Default)]
pub struct SiteRegistry {
    adapters: Vec<Arc<dyn SiteAdapter>>,
}

/// Where a site would be queried, for dry runs
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SitePreview {
    pub category: Category,
    pub site: String,
    pub url: Option<String>,
}

fn scraped<S: SiteScraper + 'static>(scraper: S, pages: &Arc<dyn PageSource>, max_offers: usize) -> Arc<dyn SiteAdapter> {
    Arc::new(ScrapingAdapter::new(scraper, Arc::clone(pages), max_offers))
}

impl SiteRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an adapter; one registered earlier under the same category and
    /// site name is replaced in place.
    pub fn register(&mut self, adapter: Arc<dyn SiteAdapter>) -> &mut Self {
        let existing = self
            .adapters
            .iter()
            .position(|a| a.category() == adapter.category() && a.site() == adapter.site());
        match existing {
            Some(idx) => {
                tracing::debug!(site = adapter.site(), "[registry] replacing adapter");
                self.adapters[idx] = adapter;
            }
            None => self.adapters.push(adapter),
        }
        self
    }

    pub fn for_category(&self, category: Category) -> impl Iterator<Item = &Arc<dyn SiteAdapter>> {
        self.adapters.iter().filter(move |a| a.category() == category)
    }

    pub fn sites(&self, category: Category) -> Vec<&str> {
        self.for_category(category).map(|a| a.site()).collect()
    }

    pub fn len(&self) -> usize {
        self.adapters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.adapters.is_empty()
    }

    /// The built-in sites. Amadeus flights and hotels only join when
    /// credentials are configured, and share one session.
    pub fn default_sites(
        pages: Arc<dyn PageSource>,
        client: Arc<wreq::Client>,
        queue: FetchQueue,
        config: &PlannerConfig,
    ) -> Self {
        let max = config.max_offers_per_site;
        let amadeus = config
            .amadeus
            .as_ref()
            .map(|credentials| Arc::new(AmadeusSession::new(client, queue, credentials.clone())));
        let mut registry = Self::new();
        registry
            .register(scraped(GoogleFlights, &pages, max))
            .register(scraped(Skyscanner, &pages, max))
            .register(scraped(Kayak, &pages, max));
        if let Some(session) = &amadeus {
            registry.register(Arc::new(AmadeusFlights::new(Arc::clone(session))));
        }
        registry
            .register(scraped(GoogleHotels, &pages, max))
            .register(scraped(Booking, &pages, max))
            .register(scraped(Agoda, &pages, max));
        if let Some(session) = &amadeus {
            registry.register(Arc::new(AmadeusHotels::new(Arc::clone(session), max)));
        }
        registry
            .register(scraped(Viator, &pages, max))
            .register(scraped(GetYourGuide, &pages, max))
            .register(scraped(DuckDuckGo, &pages, max));
        registry
    }
}

// =============================================================================
// Aggregator
// =============================================================================

pub struct TripAggregator {
    registry: SiteRegistry,
    travel_info: TravelInfoLookup,
    summarizer: Option<Arc<dyn Summarizer>>,
    config: PlannerConfig,
}

#[derive(Default)]
pub struct TripAggregatorBuilder {
    registry: SiteRegistry,
    travel_info: Option<TravelInfoLookup>,
    summarizer: Option<Arc<dyn Summarizer>>,
    config: PlannerConfig,
}

impl TripAggregatorBuilder {
    pub fn config(mut self, config: PlannerConfig) -> Self {
        self.config = config;
        self
    }

    pub fn registry(mut self, registry: SiteRegistry) -> Self {
        self.registry = registry;
        self
    }

    pub fn adapter(mut self, adapter: Arc<dyn SiteAdapter>) -> Self {
        self.registry.register(adapter);
        self
    }

    pub fn travel_info(mut self, lookup: TravelInfoLookup) -> Self {
        self.travel_info = Some(lookup);
        self
    }

    pub fn summarizer(mut self, summarizer: Arc<dyn Summarizer>) -> Self {
        self.summarizer = Some(summarizer);
        self
    }

    pub fn build(self) -> Result<TripAggregator, PlannerError> {
        self.config.validate()?;
        let travel_info = self
            .travel_info
            .ok_or_else(|| PlannerError::config("a travel info lookup is required"))?;
        Ok(TripAggregator {
            registry: self.registry,
            travel_info,
            summarizer: self.summarizer,
            config: self.config,
        })
    }
}

/// What the category and travel-info fetches of one request produced
struct Gathered {
    flights: CategoryResult,
    accommodations: CategoryResult,
    activities: Option<CategoryResult>,
    travel_info: TravelInfo,
}

fn elapsed_ms(since: Instant) -> u64 {
    since.elapsed().as_millis() as u64
}

fn category_errors(category: Category, result: &CategoryResult, errors: &mut Vec<String>) {
    if !result.failures.is_empty() {
        let detail = result
            .failures
            .iter()
            .map(|f| format!("{}: {}", f.site, f.reason))
            .collect::<Vec<_>>()
            .join("; ");
        errors.push(format!(
            "{category}: {} of {} sites failed ({detail})",
            result.failures.len(),
            result.by_site.len()
        ));
    }
    if result.is_empty() {
        errors.push(format!("{category}: no offers found"));
    }
}

impl TripAggregator {
    pub fn builder() -> TripAggregatorBuilder {
        TripAggregatorBuilder::default()
    }

    /// Wire the real network stack: shared browser client, fetch queue,
    /// built-in sites, government travel-info sources and the optional LLM.
    pub fn from_config(config: PlannerConfig) -> Result<Self, PlannerError> {
        config.validate()?;
        let client = Arc::new(build_http_client().map_err(|e| PlannerError::Http(format!("{e:#}")))?);
        let queue = FetchQueue::new(config.max_concurrent_fetches).with_backoff(config.backoff());
        let pages: Arc<dyn PageSource> = Arc::new(
            PageFetcher::with_client(Arc::clone(&client), queue.clone())
                .with_accept_language(config.accept_language()),
        );
        let registry = SiteRegistry::default_sites(Arc::clone(&pages), Arc::clone(&client), queue, &config);
        let travel_info = TravelInfoLookup::new(
            Arc::new(GovernmentSources::new(pages)),
            Arc::new(KnownCities),
            config.site_timeout,
        );

        let mut builder = Self::builder().registry(registry).travel_info(travel_info);
        if let Some(llm) = config.llm.clone() {
            builder = builder.summarizer(Arc::new(OpenAiSummarizer::new(client, llm)));
        }
        tracing::info!(
            sites = builder.registry.len(),
            llm = config.llm.is_some(),
            "[aggregator] configured"
        );
        builder.config(config).build()
    }

    pub fn config(&self) -> &PlannerConfig {
        &self.config
    }

    pub fn registry(&self) -> &SiteRegistry {
        &self.registry
    }

    fn search_params(&self, query: &TripQuery, category: Category) -> SearchParams {
        SearchParams::for_category(query, category, &self.config.currency)
    }

    /// Search URLs each registered site would request, without fetching
    pub fn preview(&self, query: &TripQuery) -> Vec<SitePreview> {
        let mut categories = vec![Category::Flights, Category::Accommodations];
        if query.include_activities() {
            categories.push(Category::Activities);
        }
        categories
            .into_iter()
            .flat_map(|category| {
                let params = self.search_params(query, category);
                self.registry
                    .for_category(category)
                    .map(|adapter| SitePreview {
                        category,
                        site: adapter.site().to_string(),
                        url: adapter.preview_url(&params),
                    })
                    .collect::<Vec<_>>()
            })
            .collect()
    }

    async fn fetch_site(
        &self,
        adapter: &Arc<dyn SiteAdapter>,
        params: &SearchParams,
        deadline: Instant,
        cancel: &CancellationToken,
    ) -> SiteOutcome {
        let start = Instant::now();
        let site_deadline = (start + self.config.site_timeout).min(deadline);
        let result = tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(SiteFetchFailure::Timeout(elapsed_ms(start))),
            fetched = timeout_at(site_deadline, adapter.fetch(params)) => {
                fetched.unwrap_or_else(|_| Err(SiteFetchFailure::Timeout(elapsed_ms(start))))
            }
        };
        let outcome = SiteOutcome::from_result(adapter.site(), result, elapsed_ms(start));
        match &outcome.failure {
            Some(failure) => tracing::warn!(
                site = %outcome.site,
                elapsed_ms = outcome.elapsed_ms,
                "[aggregator] site failed: {}",
                failure
            ),
            None => tracing::debug!(
                site = %outcome.site,
                count = outcome.offers.len(),
                elapsed_ms = outcome.elapsed_ms,
                "[aggregator] site answered"
            ),
        }
        outcome
    }

    async fn run_category(
        &self,
        query: &TripQuery,
        category: Category,
        deadline: Instant,
        cancel: &CancellationToken,
    ) -> CategoryResult {
        let params = self.search_params(query, category);
        let outcomes = join_all(
            self.registry
                .for_category(category)
                .map(|adapter| self.fetch_site(adapter, &params, deadline, cancel)),
        )
        .await;
        let merger = ResultMerger::new(self.config.merge_options(
            category,
            query.budget_level(),
            query.accommodation_type(),
        ));
        merger.merge_outcomes(outcomes, params)
    }

    async fn run_travel_info(&self, query: &TripQuery, deadline: Instant, cancel: &CancellationToken) -> TravelInfo {
        let lookup = self.travel_info.lookup(
            query.origin_country(),
            query.destination_country(),
            query.destination_city(),
        );
        tokio::select! {
            biased;
            _ = cancel.cancelled() => TravelInfo::unresolved(
                query.origin_country(),
                query.destination_country(),
                "travel info: request cancelled",
            ),
            info = timeout_at(deadline, lookup) => info.unwrap_or_else(|_| TravelInfo::unresolved(
                query.origin_country(),
                query.destination_country(),
                "travel info: request deadline reached",
            )),
        }
    }

    async fn gather(&self, query: &TripQuery, deadline: Instant, cancel: &CancellationToken) -> Gathered {
        let activities = async {
            if query.include_activities() {
                Some(self.run_category(query, Category::Activities, deadline, cancel).await)
            } else {
                None
            }
        };
        let (flights, accommodations, activities, travel_info) = tokio::join!(
            self.run_category(query, Category::Flights, deadline, cancel),
            self.run_category(query, Category::Accommodations, deadline, cancel),
            activities,
            self.run_travel_info(query, deadline, cancel),
        );
        Gathered {
            flights,
            accommodations,
            activities,
            travel_info,
        }
    }

    pub async fn plan(&self, query: &TripQuery) -> TripPlanResult {
        self.plan_with_cancel(query, CancellationToken::new()).await
    }

    /// Plan a trip. Cancelling `cancel` turns every unfinished fetch into a
    /// timeout and returns what has completed so far.
    pub async fn plan_with_cancel(&self, query: &TripQuery, cancel: CancellationToken) -> TripPlanResult {
        let start = Instant::now();
        let deadline = start + self.config.request_timeout;
        tracing::info!(
            origin = query.origin_city(),
            destination = query.destination_city(),
            "[aggregator] planning trip"
        );

        let gathered = self.gather(query, deadline, &cancel).await;
        let cancelled = cancel.is_cancelled();
        let deadline_hit = cancelled || Instant::now() >= deadline;

        let mut metadata = PlanMetadata::for_query(query);
        let mut errors = Vec::new();
        category_errors(Category::Flights, &gathered.flights, &mut errors);
        category_errors(Category::Accommodations, &gathered.accommodations, &mut errors);
        if let Some(activities) = &gathered.activities {
            category_errors(Category::Activities, activities, &mut errors);
        }
        errors.extend(gathered.travel_info.failures.iter().map(|f| format!("travel info: {f}")));
        if deadline_hit {
            errors.push(if cancelled {
                "request cancelled; unfinished lookups were dropped".to_string()
            } else {
                format!(
                    "request deadline of {} s reached; unfinished lookups were dropped",
                    self.config.request_timeout.as_secs()
                )
            });
        }

        let categories = [Some(&gathered.flights), Some(&gathered.accommodations), gathered.activities.as_ref()];
        let status = PlanStatus::decide(categories.into_iter().flatten(), &gathered.travel_info, deadline_hit);
        if status == PlanStatus::Error {
            errors.push("no results from any source".to_string());
        }

        let template = templated_summary(query.origin_city(), query.destination_city(), query.nights());
        let summary = match (&self.summarizer, status, deadline_hit) {
            (Some(summarizer), PlanStatus::Success | PlanStatus::Partial, false) => {
                let digest = TripDigest::new(
                    query,
                    &gathered.flights,
                    &gathered.accommodations,
                    &gathered.travel_info,
                    &errors,
                );
                let summary_deadline = (Instant::now() + self.config.summary_timeout).min(deadline);
                let summarized = tokio::select! {
                    biased;
                    _ = cancel.cancelled() => None,
                    result = timeout_at(summary_deadline, summarizer.summarize(&digest)) => Some(result),
                };
                match summarized {
                    Some(Ok(Ok(summary))) => {
                        metadata.summary_source = SummarySource::Llm;
                        summary
                    }
                    Some(Ok(Err(e))) => {
                        tracing::warn!("[aggregator] summary failed: {}", e);
                        errors.push(format!("summary: {e}"));
                        template
                    }
                    Some(Err(_)) => {
                        tracing::warn!("[aggregator] summary timed out");
                        errors.push("summary: timed out".to_string());
                        template
                    }
                    None => {
                        tracing::warn!("[aggregator] summary cancelled");
                        errors.push("summary: request cancelled".to_string());
                        template
                    }
                }
            }
            _ => template,
        };

        metadata.errors = errors;
        metadata.elapsed_ms = elapsed_ms(start);
        metadata.deadline_hit = deadline_hit;
        tracing::info!(
            status = status.as_str(),
            elapsed_ms = metadata.elapsed_ms,
            errors = metadata.errors.len(),
            "[aggregator] plan ready"
        );

        TripPlanResult {
            flights: gathered.flights,
            accommodations: gathered.accommodations,
            activities: gathered.activities,
            travel_info: gathered.travel_info,
            summary,
            metadata,
            status,
        }
    }

    /// One category on its own, under the request deadline
    pub async fn search_category(&self, query: &TripQuery, category: Category) -> CategoryResult {
        let deadline = Instant::now() + self.config.request_timeout;
        self.run_category(query, category, deadline, &CancellationToken::new())
            .await
    }

    pub async fn travel_info(
        &self,
        origin_country: &str,
        destination_country: Option<&str>,
        destination_city: &str,
    ) -> TravelInfo {
        let deadline = Instant::now() + self.config.request_timeout;
        let lookup = self
            .travel_info
            .lookup(origin_country, destination_country, destination_city);
        timeout_at(deadline, lookup).await.unwrap_or_else(|_| {
            TravelInfo::unresolved(
                origin_country,
                destination_country,
                "travel info: request deadline reached",
            )
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::offer::{Offer, OfferDetails};
    use crate::summarizer::SummaryError;
    use crate::travel_info::{HealthInfo, TravelInfoSource, VisaInfo};
    use crate::trip_plan::Summary;
    use crate::trip_query::TripQueryInput;
    use async_trait::async_trait;
    use std::time::Duration;

    struct Fixed {
        site: &'static str,
        category: Category,
        delay: Duration,
    }

    #[async_trait]
    impl SiteAdapter for Fixed {
        fn site(&self) -> &str {
            self.site
        }
        fn category(&self) -> Category {
            self.category
        }
        async fn fetch(&self, _params: &SearchParams) -> Result<Vec<Offer>, SiteFetchFailure> {
            tokio::time::sleep(self.delay).await;
            Ok(vec![
                Offer::new(self.site, format!("{} offer", self.site), OfferDetails::empty_hotel())
                    .with_price(120.0, "USD"),
            ])
        }
    }

    struct NoInfo;

    #[async_trait]
    impl TravelInfoSource for NoInfo {
        async fn visa(&self, _o: &str, _d: &str) -> anyhow::Result<VisaInfo> {
            Ok(VisaInfo::unknown())
        }
        async fn advisories(&self, _d: &str) -> anyhow::Result<Vec<String>> {
            Ok(Vec::new())
        }
        async fn health(&self, _d: &str) -> anyhow::Result<HealthInfo> {
            Ok(HealthInfo::unknown())
        }
    }

    fn lookup() -> TravelInfoLookup {
        TravelInfoLookup::new(Arc::new(NoInfo), Arc::new(KnownCities), Duration::from_secs(1))
    }

    fn fixed(site: &'static str, category: Category, delay_ms: u64) -> Arc<dyn SiteAdapter> {
        Arc::new(Fixed {
            site,
            category,
            delay: Duration::from_millis(delay_ms),
        })
    }

    fn query() -> TripQuery {
        TripQueryInput::new("New York", "Paris", "2025-06-01", "2025-06-07")
            .validate()
            .unwrap()
    }

    #[test]
    fn registry_replaces_same_site() {
        let mut registry = SiteRegistry::new();
        registry
            .register(fixed("a", Category::Flights, 0))
            .register(fixed("b", Category::Flights, 0))
            .register(fixed("a", Category::Accommodations, 0))
            .register(fixed("a", Category::Flights, 5));
        assert_eq!(registry.len(), 3);
        assert_eq!(registry.sites(Category::Flights), vec!["a", "b"]);
    }

    #[tokio::test]
    async fn amadeus_joins_flights_and_hotels_with_credentials() {
        let client = Arc::new(build_http_client().unwrap());
        let queue = FetchQueue::new(2);
        let pages: Arc<dyn PageSource> = Arc::new(PageFetcher::with_client(Arc::clone(&client), queue.clone()));

        let without = SiteRegistry::default_sites(
            Arc::clone(&pages),
            Arc::clone(&client),
            queue.clone(),
            &PlannerConfig::default(),
        );
        assert!(!without.sites(Category::Flights).contains(&"amadeus"));
        assert!(!without.sites(Category::Accommodations).contains(&"amadeus"));

        let config = PlannerConfig {
            amadeus: Some(crate::amadeus::AmadeusCredentials {
                api_key: "key".into(),
                api_secret: "secret".into(),
                base_url: crate::amadeus::DEFAULT_AMADEUS_BASE_URL.into(),
            }),
            ..Default::default()
        };
        let with = SiteRegistry::default_sites(pages, client, queue, &config);
        assert_eq!(with.sites(Category::Flights), vec!["google_flights", "skyscanner", "kayak", "amadeus"]);
        assert_eq!(
            with.sites(Category::Accommodations),
            vec!["google_hotels", "booking", "agoda", "amadeus"]
        );
        assert_eq!(with.len(), without.len() + 2);
    }

    #[test]
    fn builder_requires_travel_info() {
        assert!(matches!(TripAggregator::builder().build(), Err(PlannerError::Config(_))));
    }

    #[tokio::test]
    async fn slow_site_times_out_alone() {
        let aggregator = TripAggregator::builder()
            .config(PlannerConfig {
                site_timeout: Duration::from_millis(100),
                ..Default::default()
            })
            .adapter(fixed("slow", Category::Accommodations, 5_000))
            .adapter(fixed("fast", Category::Accommodations, 0))
            .travel_info(lookup())
            .build()
            .unwrap();
        let result = aggregator.search_category(&query(), Category::Accommodations).await;
        assert_eq!(result.by_site["slow"], Vec::new());
        assert_eq!(result.by_site["fast"].len(), 1);
        assert!(matches!(result.failures[0].reason, SiteFetchFailure::Timeout(_)));
    }

    #[tokio::test]
    async fn cancellation_keeps_finished_sites() {
        let aggregator = TripAggregator::builder()
            .adapter(fixed("fast", Category::Flights, 0))
            .adapter(fixed("slow", Category::Flights, 10_000))
            .travel_info(lookup())
            .build()
            .unwrap();
        let cancel = CancellationToken::new();
        let trigger = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(200)).await;
            trigger.cancel();
        });
        let plan = aggregator.plan_with_cancel(&query(), cancel).await;
        assert!(plan.metadata.deadline_hit);
        assert_eq!(plan.flights.by_site["fast"].len(), 1);
        assert_eq!(plan.flights.failures.len(), 1);
        assert_eq!(plan.status, PlanStatus::Partial);
    }

    struct Stalled;

    #[async_trait]
    impl Summarizer for Stalled {
        async fn summarize(&self, _digest: &TripDigest) -> Result<Summary, SummaryError> {
            tokio::time::sleep(Duration::from_secs(30)).await;
            Err(SummaryError::Network("never answered".into()))
        }
    }

    #[tokio::test]
    async fn cancellation_stops_a_pending_summary() {
        let aggregator = TripAggregator::builder()
            .config(PlannerConfig {
                summary_timeout: Duration::from_secs(60),
                ..Default::default()
            })
            .adapter(fixed("fast", Category::Flights, 0))
            .adapter(fixed("hotel", Category::Accommodations, 0))
            .travel_info(lookup())
            .summarizer(Arc::new(Stalled))
            .build()
            .unwrap();
        let cancel = CancellationToken::new();
        let trigger = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(300)).await;
            trigger.cancel();
        });

        let started = std::time::Instant::now();
        let plan = aggregator.plan_with_cancel(&query(), cancel).await;

        assert!(started.elapsed() < Duration::from_secs(5));
        assert_eq!(plan.metadata.summary_source, SummarySource::Template);
        assert_eq!(plan.summary.headline, "Trip to Paris");
        assert!(plan.metadata.errors.iter().any(|e| e == "summary: request cancelled"));
        assert_eq!(plan.flights.by_site["fast"].len(), 1);
    }

    #[test]
    fn preview_lists_every_site() {
        let aggregator = TripAggregator::builder()
            .adapter(fixed("a", Category::Flights, 0))
            .adapter(fixed("b", Category::Activities, 0))
            .travel_info(lookup())
            .build()
            .unwrap();
        let previews = aggregator.preview(&query());
        assert_eq!(previews.len(), 2);
        assert_eq!(previews[1].category, Category::Activities);
        assert_eq!(previews[1].url, None);
    }
}
