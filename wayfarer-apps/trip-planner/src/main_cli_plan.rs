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

//! # Examples
//!
//! ## Weekend trip
//!
//! ```bash
//! wayfarer-plan -F "New York" -T "Paris" -d 2026-05-01 -r 2026-05-04
//! ```
//!
//! ## Luxury trip in business class, no activities
//!
//! ```bash
//! wayfarer-plan -F London -T Tokyo -d 2026-09-10 -r 2026-09-20 -b luxury --flight-class business --no-activities
//! ```
//!
//! ## Dry run (show the URL each site would be queried with)
//!
//! ```bash
//! wayfarer-plan -F Berlin -T Rome -d 2026-06-01 -r 2026-06-05 --dry-run
//! ```
//!
//! ## Machine-readable envelope
//!
//! ```bash
//! wayfarer-plan -F Berlin -T Rome -d 2026-06-01 -r 2026-06-05 --json | jq .status
//! ```

use anyhow::{Context, Result};
use clap::Parser;
use std::cmp::max;
use wayfarer_trip_planner::{
    CategoryResult, Offer, OfferDetails, PlanStatus, PlannerArgs, TripAggregator,
    TripPlanResult, TripQuery, TripQueryInput,
};

#[derive(Parser, Debug)]
#[command(name = "wayfarer-plan")]
#[command(version = "0.1.0")]
#[command(about = "Plan a trip: flights, stays, activities and travel advisories from many sites")]
struct Args {
    #[arg(short = 'F', long)]
    from: String,
    #[arg(short = 'T', long)]
    to: String,
    #[arg(short = 'd', long, help = "Departure date (YYYY-MM-DD)")]
    depart: String,
    #[arg(short = 'r', long = "return", help = "Return date (YYYY-MM-DD)")]
    return_date: String,
    #[arg(long, help = "Origin country (default: United States)")]
    origin_country: Option<String>,
    #[arg(long, help = "Destination country (looked up from the city when omitted)")]
    destination_country: Option<String>,
    #[arg(short = 'n', long)]
    travelers: Option<u32>,
    #[arg(short = 'b', long, help = "budget, moderate, luxury")]
    budget: Option<String>,
    #[arg(long, help = "economy, premium_economy, business, first")]
    flight_class: Option<String>,
    #[arg(long, help = "leisure, business, adventure...")]
    trip_type: Option<String>,
    #[arg(long, help = "hotel, hostel, apartment...")]
    accommodation_type: Option<String>,
    #[arg(long)]
    no_activities: bool,
    #[arg(short = 'l', long, default_value = "5", help = "Rows shown per category")]
    limit: usize,
    #[arg(long, help = "Print the full result envelope as JSON")]
    json: bool,
    #[arg(long, help = "Show the search URLs without making requests")]
    dry_run: bool,
    #[arg(short, long, help = "Debug logging")]
    verbose: bool,

    #[command(flatten)]
    planner: PlannerArgs,
}

impl Args {
    fn query_input(&self) -> TripQueryInput {
        TripQueryInput {
            origin_country: self.origin_country.clone(),
            destination_country: self.destination_country.clone(),
            travelers: self.travelers,
            budget_level: self.budget.clone(),
            trip_type: self.trip_type.clone(),
            accommodation_type: self.accommodation_type.clone(),
            flight_class: self.flight_class.clone(),
            include_activities: Some(!self.no_activities),
            ..TripQueryInput::new(
                self.from.clone(),
                self.to.clone(),
                self.depart.clone(),
                self.return_date.clone(),
            )
        }
    }
}

fn setup_logging(verbose: bool) {
    let level = if verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::WARN
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .init();
}

/// Get terminal width for responsive tables
fn get_terminal_width() -> usize {
    term_size::dimensions().map(|(w, _)| w).unwrap_or(100)
}

fn dash_bar() -> String {
    "-".repeat(get_terminal_width().min(100))
}

fn truncate(s: &str, width: usize) -> String {
    if s.chars().count() <= width {
        s.to_string()
    } else {
        let cut: String = s.chars().take(width.saturating_sub(1)).collect();
        format!("{}…", cut)
    }
}

fn fmt_duration(minutes: u32) -> String {
    let hrs = minutes / 60;
    let mins = minutes % 60;
    if mins == 0 {
        format!("{}h", hrs)
    } else if hrs == 0 {
        format!("{}m", mins)
    } else {
        format!("{}h {:02}m", hrs, mins)
    }
}

/// Category-specific column: airline and stops, stars, or duration
fn detail_cell(offer: &Offer) -> String {
    match &offer.details {
        OfferDetails::Flight {
            airline,
            duration_minutes,
            stops,
            ..
        } => {
            let stops = match stops {
                Some(0) => "direct".to_string(),
                Some(1) => "1 stop".to_string(),
                Some(n) => format!("{} stops", n),
                None => "?".to_string(),
            };
            let duration = duration_minutes.map(fmt_duration).unwrap_or_default();
            format!("{} {} {}", airline.as_deref().unwrap_or("??"), duration, stops)
        }
        OfferDetails::Hotel { star_class, .. } => star_class.clone().unwrap_or_default(),
        OfferDetails::Activity { duration, .. } => duration.clone().unwrap_or_default(),
    }
}

fn render_category(label: &str, result: &CategoryResult, limit: usize) {
    println!("\n{} ({} offers from {} sites)", label, result.offer_count(), result.by_site.len());
    println!("{}", dash_bar());
    if result.best_overall.is_empty() {
        println!("  No offers found.");
    }

    let terminal_width = get_terminal_width();
    let (rank_w, site_w, price_w, rating_w) = (4, 14, 12, 6);
    let rest = terminal_width.saturating_sub(rank_w + site_w + price_w + rating_w + 10);
    let title_w = max(rest * 3 / 5, 20);
    let detail_w = max(rest.saturating_sub(title_w), 10);

    for (i, offer) in result.best_overall.iter().take(limit).enumerate() {
        let price = offer.price.as_ref().map(|p| p.to_string()).unwrap_or_else(|| "-".into());
        let rating = offer.rating.map(|r| format!("{:.1}", r)).unwrap_or_else(|| "-".into());
        println!(
            "  {:>rw$}  {:<sw$}  {:<tw$}  {:<dw$}  {:>pw$}  {:>aw$}",
            i + 1,
            truncate(&offer.site, site_w),
            truncate(&offer.title, title_w),
            truncate(&detail_cell(offer), detail_w),
            price,
            rating,
            rw = rank_w,
            sw = site_w,
            tw = title_w,
            dw = detail_w,
            pw = price_w,
            aw = rating_w,
        );
    }
    for failure in &result.failures {
        println!("  ⚠️  {}: {}", failure.site, failure.reason);
    }
}

fn render_plan(plan: &TripPlanResult, limit: usize) {
    let meta = &plan.metadata;
    println!("\n{}", "=".repeat(get_terminal_width().min(100)));
    println!("  ✈️  {}", plan.summary.headline);
    println!("{}", "=".repeat(get_terminal_width().min(100)));
    println!("{}", plan.summary.overview);
    println!(
        "\nStatus: {}   ({} ms{})",
        plan.status.as_str(),
        meta.elapsed_ms,
        if meta.deadline_hit { ", deadline hit" } else { "" }
    );

    render_category("🛫 Flights", &plan.flights, limit);
    render_category("🏨 Stays", &plan.accommodations, limit);
    if let Some(activities) = &plan.activities {
        render_category("🎟️  Activities", activities, limit);
    }

    let info = &plan.travel_info;
    println!("\n🛂 Travel info");
    println!("{}", dash_bar());
    println!(
        "  {} → {}",
        info.origin_country,
        info.destination_country.as_deref().unwrap_or("unknown destination")
    );
    println!("  Visa: {}", info.visa.requirement);
    if !info.visa.description.is_empty() {
        println!("        {}", info.visa.description);
    }
    for advisory in &info.advisories {
        println!("  Advisory: {}", advisory);
    }
    if !info.health.vaccinations.is_empty() {
        println!("  Vaccinations: {}", info.health.vaccinations.join(", "));
    }

    if !meta.errors.is_empty() {
        println!("\nIssues:");
        for e in &meta.errors {
            println!("  - {}", e);
        }
    }
}

fn print_preview(aggregator: &TripAggregator, query: &TripQuery) {
    println!("\n🔗 Search URLs:");
    for preview in aggregator.preview(query) {
        let url = preview.url.as_deref().unwrap_or("(API request)");
        println!("  [{}] {}: {}", preview.category, preview.site, url);
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    setup_logging(args.verbose);

    let query = match args.query_input().validate() {
        Ok(query) => query,
        Err(e) => {
            eprintln!("Invalid trip: {}", e);
            std::process::exit(1);
        }
    };
    let config = args.planner.into_config().context("Invalid configuration")?;
    let aggregator = TripAggregator::from_config(config).context("Failed to create trip aggregator")?;

    if !args.json {
        println!("\n🧭 Trip Planner");
        println!("==============");
        println!("Route: {} → {}", query.origin_city(), query.destination_city());
        println!(
            "Dates: {} to {} ({} nights)",
            query.start_date(),
            query.end_date(),
            query.nights()
        );
        println!("Travelers: {}", query.travelers());
        println!("Budget: {}", query.budget_level().as_str());
        println!("Cabin: {}", query.flight_class().label());
        println!("==============");
    }

    if args.dry_run {
        print_preview(&aggregator, &query);
        return Ok(());
    }

    let plan = aggregator.plan(&query).await;
    tracing::info!(
        "Plan finished: status={}, {} flights, {} stays",
        plan.status.as_str(),
        plan.flights.offer_count(),
        plan.accommodations.offer_count()
    );

    if args.json {
        println!("{}", serde_json::to_string_pretty(&plan)?);
    } else {
        render_plan(&plan, args.limit);
    }

    if plan.status == PlanStatus::Error {
        std::process::exit(1);
    }
    Ok(())
}
