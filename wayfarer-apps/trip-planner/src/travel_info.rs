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

//! # Travel Information
//!
//! Visa requirements, travel advisories and health notes for a destination
//! country. The three sub-lookups are independent: each runs under its own
//! timeout, and one failing leaves only its own field unknown.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::locations::country_of_city;

pub const UNKNOWN_REQUIREMENT: &str = "Unknown";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VisaInfo {
    pub requirement: String,
    pub description: String,
    /// Site the requirement was read from; `None` when unresolved
    pub source: Option<String>,
}

impl VisaInfo {
    pub fn unknown() -> Self {
        Self {
            requirement: UNKNOWN_REQUIREMENT.to_string(),
            description: "Could not find visa requirement information. Check with the embassy or consulate of the destination country.".to_string(),
            source: None,
        }
    }

    pub fn is_known(&self) -> bool {
        self.source.is_some() && self.requirement != UNKNOWN_REQUIREMENT
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthInfo {
    pub summary: String,
    pub vaccinations: Vec<String>,
    pub health_risks: Vec<String>,
    pub source: Option<String>,
}

impl HealthInfo {
    pub fn unknown() -> Self {
        Self {
            summary: "Could not find specific health information. Consult a travel health specialist before traveling.".to_string(),
            vaccinations: Vec::new(),
            health_risks: Vec::new(),
            source: None,
        }
    }

    pub fn is_known(&self) -> bool {
        self.source.is_some()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TravelInfo {
    pub origin_country: String,
    pub destination_country: Option<String>,
    pub visa: VisaInfo,
    pub advisories: Vec<String>,
    pub health: HealthInfo,
    /// One entry per sub-lookup that failed
    #[serde(default)]
    pub failures: Vec<String>,
}

impl TravelInfo {
    /// Everything unknown, with `reason` recorded as the failure
    pub fn unresolved(origin_country: &str, destination_country: Option<&str>, reason: impl Into<String>) -> Self {
        Self {
            origin_country: origin_country.to_string(),
            destination_country: destination_country.map(str::to_string),
            visa: VisaInfo::unknown(),
            advisories: Vec::new(),
            health: HealthInfo::unknown(),
            failures: vec![reason.into()],
        }
    }

    /// Destination known and every sub-lookup answered
    pub fn is_resolved(&self) -> bool {
        self.destination_country.is_some() && self.failures.is_empty()
    }

    pub fn has_any_data(&self) -> bool {
        self.visa.is_known() || !self.advisories.is_empty() || self.health.is_known()
    }
}

/// Where visa, advisory and health data come from
#[async_trait]
pub trait TravelInfoSource: Send + Sync {
    async fn visa(&self, origin_country: &str, destination_country: &str) -> anyhow::Result<VisaInfo>;

    /// Advisory lines, one per issuing authority
    async fn advisories(&self, destination_country: &str) -> anyhow::Result<Vec<String>>;

    async fn health(&self, destination_country: &str) -> anyhow::Result<HealthInfo>;
}

/// City to country resolution
pub trait CountryResolver: Send + Sync {
    fn resolve(&self, city: &str) -> Option<String>;
}

/// Resolver backed by the built-in city table
#[derive(Debug, Default, Clone, Copy)]
pub struct KnownCities;

impl CountryResolver for KnownCities {
    fn resolve(&self, city: &str) -> Option<String> {
        country_of_city(city).map(str::to_string)
    }
}

#[derive(Clone)]
pub struct TravelInfoLookup {
    source: Arc<dyn TravelInfoSource>,
    resolver: Arc<dyn CountryResolver>,
    timeout: Duration,
}

async fn bounded<T>(
    name: &str,
    timeout: Duration,
    fut: impl std::future::Future<Output = anyhow::Result<T>>,
) -> Result<T, String> {
    match tokio::time::timeout(timeout, fut).await {
        Ok(Ok(value)) => Ok(value),
        Ok(Err(e)) => Err(format!("{name}: {e:#}")),
        Err(_) => Err(format!("{name}: timed out after {} ms", timeout.as_millis())),
    }
}

impl TravelInfoLookup {
    pub fn new(source: Arc<dyn TravelInfoSource>, resolver: Arc<dyn CountryResolver>, timeout: Duration) -> Self {
        Self {
            source,
            resolver,
            timeout,
        }
    }

    pub async fn lookup(
        &self,
        origin_country: &str,
        destination_country: Option<&str>,
        destination_city: &str,
    ) -> TravelInfo {
        let resolved = destination_country
            .map(str::to_string)
            .filter(|c| !c.trim().is_empty())
            .or_else(|| self.resolver.resolve(destination_city));
        let Some(destination) = resolved else {
            tracing::info!("[travel_info] no country known for {}", destination_city);
            return TravelInfo::unresolved(
                origin_country,
                None,
                format!("destination country: could not resolve a country for '{destination_city}'"),
            );
        };

        let (visa, advisories, health) = tokio::join!(
            bounded("visa", self.timeout, self.source.visa(origin_country, &destination)),
            bounded("advisories", self.timeout, self.source.advisories(&destination)),
            bounded("health", self.timeout, self.source.health(&destination)),
        );

        let mut failures = Vec::new();
        let visa = visa.unwrap_or_else(|e| {
            failures.push(e);
            VisaInfo::unknown()
        });
        let advisories = advisories.unwrap_or_else(|e| {
            failures.push(e);
            Vec::new()
        });
        let health = health.unwrap_or_else(|e| {
            failures.push(e);
            HealthInfo::unknown()
        });
        if !failures.is_empty() {
            tracing::warn!(?failures, "[travel_info] incomplete lookup for {}", destination);
        }

        TravelInfo {
            origin_country: origin_country.to_string(),
            destination_country: Some(destination),
            visa,
            advisories,
            health,
            failures,
        }
    }
}
