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

//! # Planner Configuration
//!
//! [`PlannerConfig`] holds every tunable of a planning request. Binaries fill
//! it from [`PlannerArgs`], where each flag can also come from a
//! `WAYFARER_*` environment variable. Secrets are read from the environment
//! only.

use std::time::Duration;

use wayfarer_fetch_queues::Backoff;

use crate::amadeus::{AmadeusCredentials, DEFAULT_AMADEUS_BASE_URL};
use crate::error::PlannerError;
use crate::offer::Category;
use crate::result_merger::{DEFAULT_BEST_OVERALL_CAP, DEFAULT_PRICE_TOLERANCE, MergeOptions, PriceBand};
use crate::trip_query::BudgetLevel;

pub const DEFAULT_SITE_TIMEOUT: Duration = Duration::from_secs(15);
pub const DEFAULT_SUMMARY_TIMEOUT: Duration = Duration::from_secs(20);
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(45);
pub const DEFAULT_MAX_CONCURRENT_FETCHES: usize = 8;
pub const DEFAULT_MAX_RETRIES: u32 = 2;
pub const DEFAULT_MAX_OFFERS_PER_SITE: usize = 20;
pub const DEFAULT_CURRENCY: &str = "USD";
pub const DEFAULT_LANGUAGE: &str = "en";
pub const DEFAULT_LLM_MODEL: &str = "gpt-4o-mini";
pub const DEFAULT_LLM_BASE_URL: &str = "https://api.openai.com/v1";

/// OpenAI-compatible chat-completions endpoint
#[derive(Clone)]
pub struct LlmSettings {
    pub api_key: String,
    pub model: String,
    pub base_url: String,
}

impl std::fmt::Debug for LlmSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LlmSettings")
            .field("api_key", &"<redacted>")
            .field("model", &self.model)
            .field("base_url", &self.base_url)
            .finish()
    }
}

#[derive(Debug, Clone)]
pub struct PlannerConfig {
    /// Bound on a single site fetch and on each travel-info sub-lookup
    pub site_timeout: Duration,
    pub summary_timeout: Duration,
    /// Global deadline of one planning request
    pub request_timeout: Duration,
    pub best_overall_cap: usize,
    pub price_tolerance: f64,
    pub max_concurrent_fetches: usize,
    pub max_retries: u32,
    pub max_offers_per_site: usize,
    pub currency: String,
    pub language: String,
    /// `None` disables the language-model summary
    pub llm: Option<LlmSettings>,
    /// `None` leaves the Amadeus flight adapter unregistered
    pub amadeus: Option<AmadeusCredentials>,
}

impl Default for PlannerConfig {
    fn default() -> Self {
        Self {
            site_timeout: DEFAULT_SITE_TIMEOUT,
            summary_timeout: DEFAULT_SUMMARY_TIMEOUT,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            best_overall_cap: DEFAULT_BEST_OVERALL_CAP,
            price_tolerance: DEFAULT_PRICE_TOLERANCE,
            max_concurrent_fetches: DEFAULT_MAX_CONCURRENT_FETCHES,
            max_retries: DEFAULT_MAX_RETRIES,
            max_offers_per_site: DEFAULT_MAX_OFFERS_PER_SITE,
            currency: DEFAULT_CURRENCY.to_string(),
            language: DEFAULT_LANGUAGE.to_string(),
            llm: None,
            amadeus: None,
        }
    }
}

impl PlannerConfig {
    pub fn validate(&self) -> Result<(), PlannerError> {
        if self.site_timeout.is_zero() || self.summary_timeout.is_zero() || self.request_timeout.is_zero() {
            return Err(PlannerError::config("timeouts must be positive"));
        }
        if self.best_overall_cap == 0 {
            return Err(PlannerError::config("best_overall_cap must be at least 1"));
        }
        if !(0.0..1.0).contains(&self.price_tolerance) {
            return Err(PlannerError::config(format!(
                "price_tolerance must be in [0, 1), got {}",
                self.price_tolerance
            )));
        }
        if self.max_concurrent_fetches == 0 {
            return Err(PlannerError::config("max_concurrent_fetches must be at least 1"));
        }
        let currency = self.currency.trim();
        if currency.len() != 3 || !currency.chars().all(|c| c.is_ascii_alphabetic()) {
            return Err(PlannerError::config(format!(
                "currency must be a 3-letter ISO code, got '{}'",
                self.currency
            )));
        }
        Ok(())
    }

    /// Merge rules for one category; only accommodations get a price band
    /// Budget band and lodging kind only shape accommodations
    pub fn merge_options(
        &self,
        category: Category,
        budget: BudgetLevel,
        accommodation_type: Option<&str>,
    ) -> MergeOptions {
        let lodging = category == Category::Accommodations;
        let price_band = lodging.then(|| {
            let (min, max) = budget.nightly_price_band();
            PriceBand { min, max }
        });
        MergeOptions {
            best_overall_cap: self.best_overall_cap,
            price_tolerance: self.price_tolerance,
            price_band,
            accommodation_type: accommodation_type.filter(|_| lodging).map(str::to_string),
        }
    }

    pub fn backoff(&self) -> Backoff {
        Backoff {
            max_retries: self.max_retries,
            ..Backoff::default()
        }
    }

    /// `Accept-Language` sent with every scraped page
    pub fn accept_language(&self) -> String {
        let lang = self.language.trim();
        if lang.is_empty() || lang == "en" {
            "en-US,en;q=0.9".to_string()
        } else {
            format!("{lang},en;q=0.8")
        }
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

/// Planner flags shared by the binaries
#[cfg(feature = "cli")]
#[derive(clap::Args, Debug, Clone)]
pub struct PlannerArgs {
    #[arg(long, env = "WAYFARER_SITE_TIMEOUT_SECS", default_value_t = DEFAULT_SITE_TIMEOUT.as_secs())]
    pub site_timeout_secs: u64,

    #[arg(long, env = "WAYFARER_SUMMARY_TIMEOUT_SECS", default_value_t = DEFAULT_SUMMARY_TIMEOUT.as_secs())]
    pub summary_timeout_secs: u64,

    #[arg(long, env = "WAYFARER_REQUEST_TIMEOUT_SECS", default_value_t = DEFAULT_REQUEST_TIMEOUT.as_secs())]
    pub request_timeout_secs: u64,

    #[arg(long, env = "WAYFARER_BEST_OVERALL_CAP", default_value_t = DEFAULT_BEST_OVERALL_CAP)]
    pub best_overall_cap: usize,

    #[arg(long, env = "WAYFARER_PRICE_TOLERANCE", default_value_t = DEFAULT_PRICE_TOLERANCE)]
    pub price_tolerance: f64,

    #[arg(long, env = "WAYFARER_MAX_CONCURRENT_FETCHES", default_value_t = DEFAULT_MAX_CONCURRENT_FETCHES)]
    pub max_concurrent_fetches: usize,

    #[arg(long, env = "WAYFARER_MAX_RETRIES", default_value_t = DEFAULT_MAX_RETRIES)]
    pub max_retries: u32,

    #[arg(long, env = "WAYFARER_MAX_OFFERS_PER_SITE", default_value_t = DEFAULT_MAX_OFFERS_PER_SITE)]
    pub max_offers_per_site: usize,

    #[arg(short = 'C', long, env = "WAYFARER_CURRENCY", default_value = DEFAULT_CURRENCY)]
    pub currency: String,

    #[arg(long, env = "WAYFARER_LANGUAGE", default_value = DEFAULT_LANGUAGE)]
    pub language: String,

    #[arg(long, help = "Skip the language-model summary")]
    pub no_llm: bool,

    #[arg(long, env = "OPENAI_API_KEY", hide_env_values = true)]
    pub openai_api_key: Option<String>,

    #[arg(long, env = "WAYFARER_LLM_MODEL", default_value = DEFAULT_LLM_MODEL)]
    pub llm_model: String,

    #[arg(long, env = "WAYFARER_LLM_BASE_URL", default_value = DEFAULT_LLM_BASE_URL)]
    pub llm_base_url: String,

    #[arg(long, env = "AMADEUS_API_KEY", hide_env_values = true)]
    pub amadeus_api_key: Option<String>,

    #[arg(long, env = "AMADEUS_API_SECRET", hide_env_values = true)]
    pub amadeus_api_secret: Option<String>,

    #[arg(long, env = "WAYFARER_AMADEUS_BASE_URL", default_value = DEFAULT_AMADEUS_BASE_URL)]
    pub amadeus_base_url: String,
}

#[cfg(feature = "cli")]
impl PlannerArgs {
    pub fn into_config(self) -> Result<PlannerConfig, PlannerError> {
        let llm = if self.no_llm {
            None
        } else {
            non_empty(self.openai_api_key).map(|api_key| LlmSettings {
                api_key,
                model: self.llm_model,
                base_url: self.llm_base_url,
            })
        };
        let amadeus = match (non_empty(self.amadeus_api_key), non_empty(self.amadeus_api_secret)) {
            (Some(api_key), Some(api_secret)) => Some(AmadeusCredentials {
                api_key,
                api_secret,
                base_url: self.amadeus_base_url,
            }),
            (None, None) => None,
            _ => {
                return Err(PlannerError::config(
                    "AMADEUS_API_KEY and AMADEUS_API_SECRET must be set together",
                ));
            }
        };

        let config = PlannerConfig {
            site_timeout: Duration::from_secs(self.site_timeout_secs),
            summary_timeout: Duration::from_secs(self.summary_timeout_secs),
            request_timeout: Duration::from_secs(self.request_timeout_secs),
            best_overall_cap: self.best_overall_cap,
            price_tolerance: self.price_tolerance,
            max_concurrent_fetches: self.max_concurrent_fetches,
            max_retries: self.max_retries,
            max_offers_per_site: self.max_offers_per_site,
            currency: self.currency.trim().to_uppercase(),
            language: self.language,
            llm,
            amadeus,
        };
        config.validate()?;
        Ok(config)
    }
}
