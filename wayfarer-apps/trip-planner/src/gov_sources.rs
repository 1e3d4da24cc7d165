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

//! # Government and Visa Sites
//!
//! [`TravelInfoSource`] over scraped pages:
//! - visa: VisaHQ, then Passport Index, then travel.state.gov for US citizens
//! - advisories: US State Department and UK FCDO
//! - health: CDC Travelers' Health

use std::sync::Arc;

use anyhow::{Result, anyhow, bail};
use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{ElementRef, Html, Selector};

use crate::locations::country_slug;
use crate::page_fetch::PageSource;
use crate::text_extract::{clean_text, element_text, truncate_chars};
use crate::travel_info::{HealthInfo, TravelInfoSource, VisaInfo};

const MAX_ADVISORY_CHARS: usize = 200;
const MAX_DESCRIPTION_CHARS: usize = 300;
const MAX_VACCINATIONS: usize = 5;

static ADVISORY_LEVEL_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"Level (\d+)").unwrap());

struct GovSelectors {
    visahq_requirement: Selector,
    visahq_details: Selector,
    passport_row: Selector,
    passport_country: Selector,
    passport_requirement: Selector,
    headings: Selector,
    us_alert: Selector,
    us_detail: Selector,
    uk_summary: Selector,
    cdc_vaccines: Selector,
    cdc_risks: Selector,
    cdc_summary: Selector,
    list_item: Selector,
}

impl GovSelectors {
    fn new() -> Self {
        Self {
            visahq_requirement: Selector::parse("div.requirement span.center").unwrap(),
            visahq_details: Selector::parse("div.requirement-text").unwrap(),
            passport_row: Selector::parse("table.visa-requirements tr").unwrap(),
            passport_country: Selector::parse("td.country").unwrap(),
            passport_requirement: Selector::parse("td.requirement").unwrap(),
            headings: Selector::parse("h2, h3").unwrap(),
            us_alert: Selector::parse("div.tsg-alert-content").unwrap(),
            us_detail: Selector::parse("div#detailed-advisory-content").unwrap(),
            uk_summary: Selector::parse("div.govuk-summary-card__content").unwrap(),
            cdc_vaccines: Selector::parse("#vaccines-and-medicines").unwrap(),
            cdc_risks: Selector::parse("#non-vaccine-recommendations").unwrap(),
            cdc_summary: Selector::parse("#destination-content p").unwrap(),
            list_item: Selector::parse("li").unwrap(),
        }
    }
}

fn first_text(document: &Html, selector: &Selector) -> Option<String> {
    document
        .select(selector)
        .next()
        .map(element_text)
        .filter(|s| !s.is_empty())
}

// =============================================================================
// Parsers
// =============================================================================

pub fn parse_visahq(html: &str) -> Option<VisaInfo> {
    let selectors = GovSelectors::new();
    let document = Html::parse_document(html);
    let requirement = first_text(&document, &selectors.visahq_requirement)?;
    let description = first_text(&document, &selectors.visahq_details).unwrap_or_default();
    Some(VisaInfo {
        requirement,
        description: truncate_chars(&description, MAX_DESCRIPTION_CHARS),
        source: Some("VisaHQ".to_string()),
    })
}

pub fn parse_passport_index(html: &str, destination_country: &str) -> Option<VisaInfo> {
    let selectors = GovSelectors::new();
    let document = Html::parse_document(html);
    let wanted = destination_country.to_lowercase();
    document.select(&selectors.passport_row).find_map(|row| {
        let country = row.select(&selectors.passport_country).next().map(element_text)?;
        if !country.to_lowercase().contains(&wanted) {
            return None;
        }
        let requirement = row
            .select(&selectors.passport_requirement)
            .next()
            .map(element_text)
            .filter(|s| !s.is_empty())?;
        Some(VisaInfo {
            description: format!("Passport Index lists the requirement for {destination_country} as: {requirement}"),
            requirement,
            source: Some("Passport Index".to_string()),
        })
    })
}

/// Paragraphs and list items between `heading` and the next h2/h3
fn section_text(heading: ElementRef) -> Vec<String> {
    let mut content = Vec::new();
    for sibling in heading.next_siblings().filter_map(ElementRef::wrap) {
        let name = sibling.value().name();
        if name == "h2" || name == "h3" {
            break;
        }
        match name {
            "p" | "li" => content.push(element_text(sibling)),
            _ => content.extend(
                sibling
                    .descendants()
                    .filter_map(ElementRef::wrap)
                    .filter(|e| matches!(e.value().name(), "p" | "li"))
                    .map(element_text),
            ),
        }
    }
    content.retain(|s| !s.is_empty());
    content
}

/// Entry requirements for US citizens from a travel.state.gov country page
pub fn parse_state_gov_entry(html: &str) -> Option<VisaInfo> {
    let selectors = GovSelectors::new();
    let document = Html::parse_document(html);
    let heading = document.select(&selectors.headings).find(|h| {
        let text = element_text(*h).to_lowercase();
        text.contains("entry") && text.contains("requirements")
    })?;
    let content = section_text(heading);
    if content.is_empty() {
        return None;
    }
    let joined = content.join(" ");
    let lower = joined.to_lowercase();
    let requirement = if lower.contains("not require a visa") || lower.contains("visa is not required") {
        "Visa-free"
    } else if lower.contains("visa on arrival") {
        "Visa on arrival"
    } else if lower.contains("electronic visa") || lower.contains("e-visa") {
        "e-Visa available"
    } else {
        "Required"
    };
    Some(VisaInfo {
        requirement: requirement.to_string(),
        description: truncate_chars(&joined, MAX_DESCRIPTION_CHARS),
        source: Some("US Department of State".to_string()),
    })
}

fn advisory_line(source: &str, level: &str, summary: &str) -> String {
    format!("{source}: {level} - {}", truncate_chars(summary, MAX_ADVISORY_CHARS))
}

pub fn parse_us_advisory(html: &str) -> Option<String> {
    let selectors = GovSelectors::new();
    let document = Html::parse_document(html);
    let alert = first_text(&document, &selectors.us_alert)?;
    let level = ADVISORY_LEVEL_RE
        .find(&alert)
        .map(|m| m.as_str().to_string())
        .unwrap_or_else(|| "Unknown".to_string());
    let summary = first_text(&document, &selectors.us_detail).unwrap_or(alert);
    Some(advisory_line("US Department of State", &level, &summary))
}

pub fn parse_uk_advisory(html: &str) -> Option<String> {
    let selectors = GovSelectors::new();
    let document = Html::parse_document(html);
    let summary = first_text(&document, &selectors.uk_summary)?;
    let lower = summary.to_lowercase();
    // "all but essential" contains "all travel" too, test it first
    let level = if lower.contains("advise against all but essential travel") {
        "Advise against all but essential travel"
    } else if lower.contains("advise against all travel") {
        "Advise against all travel"
    } else {
        "See summary"
    };
    Some(advisory_line("UK Foreign Office", level, &summary))
}

/// Items of the first list inside or after the element with the section id
fn section_list(document: &Html, section: &Selector, item: &Selector) -> Vec<String> {
    let Some(anchor) = document.select(section).next() else {
        return Vec::new();
    };
    let inside: Vec<String> = anchor.select(item).map(element_text).collect();
    if !inside.is_empty() {
        return inside;
    }
    anchor
        .next_siblings()
        .filter_map(ElementRef::wrap)
        .find_map(|sibling| {
            let items: Vec<String> = sibling.select(item).map(element_text).collect();
            (!items.is_empty()).then_some(items)
        })
        .unwrap_or_default()
}

pub fn parse_cdc_health(html: &str) -> Option<HealthInfo> {
    let selectors = GovSelectors::new();
    let document = Html::parse_document(html);
    let mut vaccinations = section_list(&document, &selectors.cdc_vaccines, &selectors.list_item);
    vaccinations.retain(|v| !v.is_empty());
    vaccinations.truncate(MAX_VACCINATIONS);
    let mut health_risks = section_list(&document, &selectors.cdc_risks, &selectors.list_item);
    health_risks.retain(|r| !r.is_empty());
    let summary = clean_text(
        &document
            .select(&selectors.cdc_summary)
            .take(2)
            .map(element_text)
            .collect::<Vec<_>>()
            .join(" "),
    );

    if vaccinations.is_empty() && health_risks.is_empty() && summary.is_empty() {
        return None;
    }
    Some(HealthInfo {
        summary: truncate_chars(&summary, MAX_DESCRIPTION_CHARS),
        vaccinations,
        health_risks,
        source: Some("CDC Travelers' Health".to_string()),
    })
}

// =============================================================================
// Source
// =============================================================================

#[derive(Clone)]
pub struct GovernmentSources {
    pages: Arc<dyn PageSource>,
}

impl GovernmentSources {
    pub fn new(pages: Arc<dyn PageSource>) -> Self {
        Self { pages }
    }

    async fn page(&self, url: &str) -> Result<String> {
        self.pages
            .fetch_page(url, None)
            .await
            .map_err(|e| anyhow!("{url}: {e}"))
    }
}

fn is_united_states(country: &str) -> bool {
    matches!(
        country.trim().to_lowercase().as_str(),
        "united states" | "united states of america" | "usa" | "us"
    )
}

#[async_trait]
impl TravelInfoSource for GovernmentSources {
    async fn visa(&self, origin_country: &str, destination_country: &str) -> Result<VisaInfo> {
        let from = country_slug(origin_country);
        let to = country_slug(destination_country);
        let mut errors = Vec::new();

        match self
            .page(&format!("https://www.visahq.com/{from}/visa-requirements-to-{to}"))
            .await
        {
            Ok(html) => {
                if let Some(info) = parse_visahq(&html) {
                    return Ok(info);
                }
            }
            Err(e) => errors.push(e.to_string()),
        }

        match self
            .page(&format!("https://www.passportindex.org/passport/{from}/"))
            .await
        {
            Ok(html) => {
                if let Some(info) = parse_passport_index(&html, destination_country) {
                    return Ok(info);
                }
            }
            Err(e) => errors.push(e.to_string()),
        }

        if is_united_states(origin_country) {
            let url = format!(
                "https://travel.state.gov/content/travel/en/international-travel/International-Travel-Country-Information-Pages/{}.html",
                to.replace('.', "")
            );
            match self.page(&url).await {
                Ok(html) => {
                    if let Some(info) = parse_state_gov_entry(&html) {
                        return Ok(info);
                    }
                }
                Err(e) => errors.push(e.to_string()),
            }
        }

        if errors.is_empty() {
            bail!("no visa requirement found for {origin_country} to {destination_country}");
        }
        bail!("no visa requirement found ({})", errors.join("; "))
    }

    async fn advisories(&self, destination_country: &str) -> Result<Vec<String>> {
        let slug = country_slug(destination_country);
        let us_url = format!(
            "https://travel.state.gov/content/travel/en/traveladvisories/traveladvisories/{slug}-travel-advisory.html"
        );
        let uk_url = format!("https://www.gov.uk/foreign-travel-advice/{slug}");
        let (us, uk) = futures::join!(self.page(&us_url), self.page(&uk_url));

        let mut lines = Vec::new();
        let mut errors = Vec::new();
        match us {
            Ok(html) => lines.extend(parse_us_advisory(&html)),
            Err(e) => errors.push(e.to_string()),
        }
        match uk {
            Ok(html) => lines.extend(parse_uk_advisory(&html)),
            Err(e) => errors.push(e.to_string()),
        }

        if lines.is_empty() && !errors.is_empty() {
            bail!("no advisory available ({})", errors.join("; "));
        }
        Ok(lines)
    }

    async fn health(&self, destination_country: &str) -> Result<HealthInfo> {
        let url = format!(
            "https://wwwnc.cdc.gov/travel/destinations/traveler/none/{}",
            country_slug(destination_country)
        );
        let html = self.page(&url).await?;
        parse_cdc_health(&html).ok_or_else(|| anyhow!("no health information on {url}"))
    }
}
