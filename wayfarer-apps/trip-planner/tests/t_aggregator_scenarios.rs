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

//! End-to-end planning scenarios against in-process fake sites, travel info
//! sources and summarizers. Nothing here touches the network.
//!
//! Run with:
//!     cargo test --test t_aggregator_scenarios

#![cfg(test)]

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde_json::Value;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use wayfarer_trip_planner::summarizer::templated_summary;
use wayfarer_trip_planner::travel_info::{HealthInfo, KnownCities, VisaInfo};
use wayfarer_trip_planner::{
    Category, Offer, OfferDetails, PlanStatus, PlannerConfig, SearchParams, SiteAdapter,
    SiteFetchFailure, Summarizer, Summary, SummaryError, SummarySource, TravelInfoLookup,
    TravelInfoSource, TripAggregator, TripDigest, TripQuery, TripQueryInput,
};

// ---- fakes ----

enum Behavior {
    Answer(Vec<(&'static str, f64)>),
    Fail,
    Hang,
}

struct FakeSite {
    site: &'static str,
    category: Category,
    behavior: Behavior,
}

#[async_trait]
impl SiteAdapter for FakeSite {
    fn site(&self) -> &str {
        self.site
    }

    fn category(&self) -> Category {
        self.category
    }

    async fn fetch(&self, _params: &SearchParams) -> Result<Vec<Offer>, SiteFetchFailure> {
        let details = match self.category {
            Category::Flights => OfferDetails::empty_flight(),
            Category::Accommodations => OfferDetails::empty_hotel(),
            Category::Activities => OfferDetails::empty_activity(),
        };
        match &self.behavior {
            Behavior::Answer(offers) => Ok(offers
                .iter()
                .map(|(title, price)| {
                    Offer::new(self.site, *title, details.clone())
                        .with_price(*price, "USD")
                        .with_rating(4.2)
                        .with_url(format!("https://{}.example/{}", self.site, title.len()))
                })
                .collect()),
            Behavior::Fail => Err(SiteFetchFailure::Blocked("captcha".into())),
            Behavior::Hang => {
                tokio::time::sleep(Duration::from_secs(30)).await;
                Ok(Vec::new())
            }
        }
    }
}

fn site(site: &'static str, category: Category, behavior: Behavior) -> Arc<dyn SiteAdapter> {
    Arc::new(FakeSite {
        site,
        category,
        behavior,
    })
}

struct FakeTravelInfo {
    answers: bool,
}

#[async_trait]
impl TravelInfoSource for FakeTravelInfo {
    async fn visa(&self, origin: &str, destination: &str) -> anyhow::Result<VisaInfo> {
        anyhow::ensure!(self.answers, "visa sites unreachable");
        Ok(VisaInfo {
            requirement: "Visa-free".into(),
            description: format!("{} citizens can stay in {} for 90 days", origin, destination),
            source: Some("VisaHQ".into()),
        })
    }

    async fn advisories(&self, destination: &str) -> anyhow::Result<Vec<String>> {
        anyhow::ensure!(self.answers, "advisory sites unreachable");
        Ok(vec![format!(
            "US State Department: Level 2 - Exercise increased caution in {}",
            destination
        )])
    }

    async fn health(&self, _destination: &str) -> anyhow::Result<HealthInfo> {
        anyhow::ensure!(self.answers, "cdc unreachable");
        Ok(HealthInfo {
            summary: "Routine vaccines recommended.".into(),
            vaccinations: vec!["Measles".into(), "Hepatitis A".into()],
            health_risks: Vec::new(),
            source: Some("CDC".into()),
        })
    }
}

enum SummaryBehavior {
    Answer,
    Fail,
    Hang,
}

struct FakeSummarizer {
    behavior: SummaryBehavior,
    calls: AtomicUsize,
}

impl FakeSummarizer {
    fn new(behavior: SummaryBehavior) -> Arc<Self> {
        Arc::new(Self {
            behavior,
            calls: AtomicUsize::new(0),
        })
    }
}

#[async_trait]
impl Summarizer for FakeSummarizer {
    async fn summarize(&self, digest: &TripDigest) -> Result<Summary, SummaryError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match self.behavior {
            SummaryBehavior::Answer => Ok(Summary {
                headline: format!("Springtime in {}", digest.destination),
                overview: format!("{} days, {}", digest.days, digest.best_flight),
            }),
            SummaryBehavior::Fail => Err(SummaryError::Api {
                status: 429,
                message: "rate limited".into(),
            }),
            SummaryBehavior::Hang => {
                tokio::time::sleep(Duration::from_secs(30)).await;
                Err(SummaryError::Network("unreachable".into()))
            }
        }
    }
}

// ---- helpers ----

fn lookup(answers: bool) -> TravelInfoLookup {
    TravelInfoLookup::new(
        Arc::new(FakeTravelInfo { answers }),
        Arc::new(KnownCities),
        Duration::from_secs(2),
    )
}

fn paris_query(include_activities: bool) -> TripQuery {
    TripQueryInput {
        travelers: Some(2),
        include_activities: Some(include_activities),
        ..TripQueryInput::new("New York", "Paris", "2025-06-01", "2025-06-07")
    }
    .validate()
    .expect("valid query")
}

fn flights_ok() -> Vec<Arc<dyn SiteAdapter>> {
    vec![
        site("google_flights", Category::Flights, Behavior::Answer(vec![("Air France AF23", 612.0), ("Delta DL264", 580.0)])),
        site("kayak", Category::Flights, Behavior::Answer(vec![("Delta DL264", 575.0)])),
    ]
}

fn flights_failing() -> Vec<Arc<dyn SiteAdapter>> {
    vec![
        site("google_flights", Category::Flights, Behavior::Fail),
        site("kayak", Category::Flights, Behavior::Fail),
    ]
}

fn rest_ok() -> Vec<Arc<dyn SiteAdapter>> {
    vec![
        site("booking", Category::Accommodations, Behavior::Answer(vec![("Hotel Lutetia", 180.0), ("Le Marais Inn", 140.0)])),
        site("agoda", Category::Accommodations, Behavior::Answer(vec![("Le Marais Inn", 138.0)])),
        site("viator", Category::Activities, Behavior::Answer(vec![("Seine River Cruise", 35.0)])),
    ]
}

fn aggregator(
    config: PlannerConfig,
    adapters: Vec<Arc<dyn SiteAdapter>>,
    travel_info: bool,
    summarizer: Option<Arc<FakeSummarizer>>,
) -> TripAggregator {
    let mut builder = TripAggregator::builder().config(config).travel_info(lookup(travel_info));
    for adapter in adapters {
        builder = builder.adapter(adapter);
    }
    if let Some(summarizer) = summarizer {
        builder = builder.summarizer(summarizer);
    }
    builder.build().expect("aggregator builds")
}

fn all(groups: Vec<Vec<Arc<dyn SiteAdapter>>>) -> Vec<Arc<dyn SiteAdapter>> {
    groups.into_iter().flatten().collect()
}

fn load_schema_from_file(name: &str) -> Result<Value> {
    let manifest_dir = PathBuf::from(
        std::env::var("CARGO_MANIFEST_DIR")
            .map_err(|e| anyhow::anyhow!("CARGO_MANIFEST_DIR not set: {}", e))?,
    );
    let schema_path = manifest_dir.join("tests").join("schemas").join(name);
    let content = std::fs::read_to_string(&schema_path)
        .context(format!("Failed to read schema file: {:?}", schema_path))?;
    serde_json::from_str(&content).context(format!("Failed to parse schema file: {:?}", schema_path))
}

fn validate_json_schema(instance: &Value, schema: &Value, schema_name: &str) -> Result<()> {
    let validator = jsonschema::Validator::new(schema)
        .context(format!("Failed to create validator for {}", schema_name))?;
    let errors: Vec<String> = validator
        .iter_errors(instance)
        .map(|e| format!("{}: {}", schema_name, e))
        .collect();
    if errors.is_empty() {
        Ok(())
    } else {
        anyhow::bail!("Schema validation failed for {}:\n{}", schema_name, errors.join("\n"))
    }
}

// ---- scenarios ----

#[tokio::test]
async fn all_sites_answering_gives_success() {
    let summarizer = FakeSummarizer::new(SummaryBehavior::Answer);
    let planner = aggregator(
        PlannerConfig::default(),
        all(vec![flights_ok(), rest_ok()]),
        true,
        Some(Arc::clone(&summarizer)),
    );
    let plan = planner.plan(&paris_query(true)).await;

    assert_eq!(plan.status, PlanStatus::Success, "errors: {:?}", plan.metadata.errors);
    assert!(!plan.flights.best_overall.is_empty());
    assert!(!plan.accommodations.best_overall.is_empty());
    assert_eq!(plan.flights.best_overall[0].price_amount(), Some(575.0));
    // Delta appears on both flight sites but once in best_overall
    let deltas = plan.flights.best_overall.iter().filter(|o| o.title == "Delta DL264").count();
    assert_eq!(deltas, 1);
    assert_eq!(plan.travel_info.destination_country.as_deref(), Some("France"));
    assert_eq!(plan.travel_info.visa.requirement, "Visa-free");
    assert_eq!(plan.metadata.summary_source, SummarySource::Llm);
    assert_eq!(plan.summary.headline, "Springtime in Paris");
    assert_eq!(summarizer.calls.load(Ordering::SeqCst), 1);
    assert!(plan.metadata.errors.is_empty());
    assert!(!plan.metadata.deadline_hit);
}

#[tokio::test]
async fn failing_flight_sites_degrade_to_partial() {
    let planner = aggregator(PlannerConfig::default(), all(vec![flights_failing(), rest_ok()]), true, None);
    let plan = planner.plan(&paris_query(true)).await;

    assert_eq!(plan.status, PlanStatus::Partial);
    assert_eq!(plan.flights.by_site.len(), 2);
    assert!(plan.flights.by_site.values().all(Vec::is_empty));
    assert!(plan.flights.best_overall.is_empty());
    assert_eq!(plan.flights.failures.len(), 2);
    assert!(!plan.accommodations.best_overall.is_empty());
    assert!(plan.activities.as_ref().is_some_and(|a| !a.best_overall.is_empty()));
    assert!(plan.metadata.errors.iter().any(|e| e.starts_with("flights:")));
}

#[tokio::test]
async fn activities_can_be_left_out() {
    let planner = aggregator(PlannerConfig::default(), all(vec![flights_ok(), rest_ok()]), true, None);
    let plan = planner.plan(&paris_query(false)).await;

    assert!(plan.activities.is_none());
    assert!(!plan.flights.best_overall.is_empty());
    assert!(!plan.accommodations.best_overall.is_empty());
    assert!(plan.travel_info.is_resolved());
    assert_eq!(plan.status, PlanStatus::Success);

    let json = serde_json::to_value(&plan).expect("serializes");
    assert!(json.get("activities").is_none());
}

#[tokio::test]
async fn summary_timeout_falls_back_to_template() {
    let config = PlannerConfig {
        summary_timeout: Duration::from_millis(200),
        ..Default::default()
    };
    let planner = aggregator(
        config,
        all(vec![flights_ok(), rest_ok()]),
        true,
        Some(FakeSummarizer::new(SummaryBehavior::Hang)),
    );
    let plan = planner.plan(&paris_query(true)).await;

    assert_eq!(plan.summary, templated_summary("New York", "Paris", 6));
    assert_eq!(plan.metadata.summary_source, SummarySource::Template);
    assert_eq!(plan.status, PlanStatus::Success);
    assert!(plan.metadata.errors.iter().any(|e| e == "summary: timed out"));
}

#[tokio::test]
async fn summary_error_falls_back_to_template() {
    let planner = aggregator(
        PlannerConfig::default(),
        all(vec![flights_ok(), rest_ok()]),
        true,
        Some(FakeSummarizer::new(SummaryBehavior::Fail)),
    );
    let plan = planner.plan(&paris_query(true)).await;

    assert_eq!(plan.summary.headline, "Trip to Paris");
    assert_eq!(plan.status, PlanStatus::Success);
    assert!(plan.metadata.errors.iter().any(|e| e.starts_with("summary: API error 429")));
}

#[tokio::test]
async fn nothing_anywhere_is_an_error_and_skips_the_summarizer() {
    let summarizer = FakeSummarizer::new(SummaryBehavior::Answer);
    let adapters = vec![
        site("google_flights", Category::Flights, Behavior::Fail),
        site("booking", Category::Accommodations, Behavior::Fail),
    ];
    let planner = aggregator(PlannerConfig::default(), adapters, false, Some(Arc::clone(&summarizer)));
    let plan = planner.plan(&paris_query(false)).await;

    assert_eq!(plan.status, PlanStatus::Error);
    assert_eq!(summarizer.calls.load(Ordering::SeqCst), 0);
    assert_eq!(plan.summary.headline, "Trip to Paris");
    assert_eq!(plan.travel_info.failures.len(), 3);
    assert!(plan.metadata.errors.iter().any(|e| e == "no results from any source"));
}

#[tokio::test]
async fn travel_info_alone_keeps_the_plan_partial() {
    let adapters = vec![
        site("google_flights", Category::Flights, Behavior::Fail),
        site("booking", Category::Accommodations, Behavior::Fail),
    ];
    let planner = aggregator(PlannerConfig::default(), adapters, true, None);
    let plan = planner.plan(&paris_query(false)).await;

    assert_eq!(plan.status, PlanStatus::Partial);
    assert_eq!(plan.travel_info.advisories.len(), 1);
}

#[tokio::test]
async fn request_deadline_returns_what_finished() {
    let config = PlannerConfig {
        request_timeout: Duration::from_millis(300),
        ..Default::default()
    };
    let mut adapters = flights_ok();
    adapters.push(site("skyscanner", Category::Flights, Behavior::Hang));
    adapters.extend(rest_ok());
    let summarizer = FakeSummarizer::new(SummaryBehavior::Answer);
    let planner = aggregator(config, adapters, true, Some(Arc::clone(&summarizer)));

    let started = std::time::Instant::now();
    let plan = planner.plan(&paris_query(true)).await;

    assert!(started.elapsed() < Duration::from_secs(5));
    assert!(plan.metadata.deadline_hit);
    assert_eq!(plan.status, PlanStatus::Partial);
    assert_eq!(plan.flights.by_site["skyscanner"], Vec::<Offer>::new());
    assert!(matches!(plan.flights.failures[0].reason, SiteFetchFailure::Timeout(_)));
    assert_eq!(plan.flights.by_site["kayak"].len(), 1);
    // no summary attempt once the deadline is gone
    assert_eq!(summarizer.calls.load(Ordering::SeqCst), 0);
    assert!(plan.metadata.errors.iter().any(|e| e.contains("deadline")));
}

#[tokio::test]
async fn unknown_destination_leaves_travel_info_unresolved() {
    let planner = aggregator(PlannerConfig::default(), all(vec![flights_ok(), rest_ok()]), true, None);
    let query = TripQueryInput::new("New York", "Atlantis", "2025-06-01", "2025-06-07")
        .validate()
        .expect("valid query");
    let plan = planner.plan(&query).await;

    assert_eq!(plan.travel_info.destination_country, None);
    assert_eq!(plan.travel_info.visa.requirement, "Unknown");
    assert_eq!(plan.status, PlanStatus::Partial);
}

#[tokio::test]
async fn plan_envelope_matches_schema() -> Result<()> {
    let schema = load_schema_from_file("trip-plan.json")?;
    let planner = aggregator(
        PlannerConfig::default(),
        all(vec![flights_ok(), rest_ok(), vec![site("getyourguide", Category::Activities, Behavior::Fail)]]),
        true,
        None,
    );
    let plan = planner.plan(&paris_query(true)).await;
    let json = serde_json::to_value(&plan)?;
    validate_json_schema(&json, &schema, "trip-plan.json")?;

    let empty = aggregator(PlannerConfig::default(), Vec::new(), false, None)
        .plan(&paris_query(false))
        .await;
    validate_json_schema(&serde_json::to_value(&empty)?, &schema, "trip-plan.json")?;
    Ok(())
}

#[tokio::test]
async fn single_category_search_uses_the_same_merge() {
    let planner = aggregator(PlannerConfig::default(), all(vec![flights_ok(), rest_ok()]), true, None);
    let hotels = planner.search_category(&paris_query(true), Category::Accommodations).await;

    assert_eq!(hotels.by_site.len(), 2);
    assert_eq!(hotels.best_overall.len(), 2);
    assert_eq!(hotels.best_overall[0].title, "Le Marais Inn");
    assert_eq!(hotels.best_overall[0].site, "agoda");
    assert_eq!(hotels.search_params.category(), Category::Accommodations);
}
