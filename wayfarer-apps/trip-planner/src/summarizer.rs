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

//! # Trip Summaries
//!
//! A headline and short overview for a plan. The language-model summarizer
//! is optional; [`templated_summary`] is what every failure falls back to.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::NaiveDate;
use serde_json::{Value, json};
use thiserror::Error;

use crate::config::LlmSettings;
use crate::offer::Offer;
use crate::result_merger::CategoryResult;
use crate::travel_info::TravelInfo;
use crate::trip_plan::Summary;
use crate::trip_query::TripQuery;

const SYSTEM_PROMPT: &str =
    "You are a travel assistant that creates concise, informative trip summaries in JSON format.";
const TEMPERATURE: f64 = 0.7;
const MAX_TOKENS: u32 = 400;

#[derive(Debug, Error)]
pub enum SummaryError {
    #[error("API error {status}: {message}")]
    Api { status: u16, message: String },

    #[error("network error: {0}")]
    Network(String),

    #[error("invalid response: {0}")]
    InvalidResponse(String),
}

/// Condensed view of a plan, all a summarizer gets to see
#[derive(Debug, Clone, PartialEq)]
pub struct TripDigest {
    pub origin: String,
    pub destination: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub days: u32,
    pub travelers: u32,
    pub best_flight: String,
    pub best_accommodation: String,
    pub visa: String,
    pub errors: Vec<String>,
}

fn price_text(offer: &Offer) -> String {
    offer
        .price
        .as_ref()
        .map(|p| p.to_string())
        .unwrap_or_else(|| "price unknown".to_string())
}

impl TripDigest {
    pub fn new(
        query: &TripQuery,
        flights: &CategoryResult,
        accommodations: &CategoryResult,
        travel_info: &TravelInfo,
        errors: &[String],
    ) -> Self {
        let best_flight = flights
            .best_overall
            .first()
            .map(|f| format!("{} for {}", f.title, price_text(f)))
            .unwrap_or_else(|| "No flight information available.".to_string());
        let best_accommodation = accommodations
            .best_overall
            .first()
            .map(|h| {
                let rating = h
                    .rating
                    .map(|r| format!("{r}/5"))
                    .unwrap_or_else(|| "rating unknown".to_string());
                format!("{} ({}) for {} per night", h.title, rating, price_text(h))
            })
            .unwrap_or_else(|| "No accommodation information available.".to_string());
        let visa = if travel_info.visa.is_known() {
            format!("Visa requirement: {}", travel_info.visa.requirement)
        } else {
            "Unknown visa requirements.".to_string()
        };

        Self {
            origin: query.origin_city().to_string(),
            destination: query.destination_city().to_string(),
            start_date: query.start_date(),
            end_date: query.end_date(),
            days: query.nights(),
            travelers: query.travelers(),
            best_flight,
            best_accommodation,
            visa,
            errors: errors.to_vec(),
        }
    }

    pub fn prompt(&self) -> String {
        let mut prompt = format!(
            "Create a JSON summary of this trip plan with two fields:\n\
             1. \"headline\": A catchy headline for this trip\n\
             2. \"overview\": A brief 2-3 sentence overview that summarizes the key details\n\n\
             Trip details:\n\
             - Trip from {} to {}\n\
             - Dates: {} to {}\n\
             - Number of travelers: {}\n\
             - Best flight option: {}\n\
             - Best accommodation: {}\n\
             - {}\n",
            self.origin,
            self.destination,
            self.start_date,
            self.end_date,
            self.travelers,
            self.best_flight,
            self.best_accommodation,
            self.visa
        );
        if !self.errors.is_empty() {
            prompt.push_str(&format!(
                "\nNote: some information could not be retrieved: {}",
                self.errors.join(", ")
            ));
        }
        prompt
    }
}

#[async_trait]
pub trait Summarizer: Send + Sync {
    async fn summarize(&self, digest: &TripDigest) -> Result<Summary, SummaryError>;
}

/// The fallback summary, built from the request alone
pub fn templated_summary(origin: &str, destination: &str, days: u32) -> Summary {
    Summary {
        headline: format!("Trip to {destination}"),
        overview: format!("A {days}-day trip from {origin} to {destination}."),
    }
}

/// Parse the model's JSON message into a summary
pub fn parse_summary(content: &str) -> Result<Summary, SummaryError> {
    let value: Value =
        serde_json::from_str(content).map_err(|e| SummaryError::InvalidResponse(format!("not JSON: {e}")))?;
    let field = |name: &str| {
        value
            .get(name)
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .ok_or_else(|| SummaryError::InvalidResponse(format!("missing \"{name}\"")))
    };
    Ok(Summary {
        headline: field("headline")?,
        overview: field("overview")?,
    })
}

/// Chat-completions summarizer for OpenAI-compatible endpoints
pub struct OpenAiSummarizer {
    client: Arc<wreq::Client>,
    settings: LlmSettings,
}

impl OpenAiSummarizer {
    pub fn new(client: Arc<wreq::Client>, settings: LlmSettings) -> Self {
        Self { client, settings }
    }

    fn request_body(&self, digest: &TripDigest) -> Value {
        json!({
            "model": self.settings.model,
            "messages": [
                {"role": "system", "content": SYSTEM_PROMPT},
                {"role": "user", "content": digest.prompt()},
            ],
            "response_format": {"type": "json_object"},
            "temperature": TEMPERATURE,
            "max_tokens": MAX_TOKENS,
        })
    }
}

#[async_trait]
impl Summarizer for OpenAiSummarizer {
    async fn summarize(&self, digest: &TripDigest) -> Result<Summary, SummaryError> {
        let url = format!("{}/chat/completions", self.settings.base_url.trim_end_matches('/'));
        tracing::debug!(model = %self.settings.model, "[summarizer] POST {}", url);

        let resp = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.settings.api_key))
            .json(&self.request_body(digest))
            .send()
            .await
            .map_err(|e| SummaryError::Network(e.to_string()))?;
        let status = resp.status();
        if !status.is_success() {
            let message = resp.text().await.unwrap_or_default();
            return Err(SummaryError::Api {
                status: status.as_u16(),
                message: crate::text_extract::truncate_chars(&message, 200),
            });
        }
        let body: Value = resp
            .json()
            .await
            .map_err(|e| SummaryError::InvalidResponse(e.to_string()))?;
        let content = body
            .pointer("/choices/0/message/content")
            .and_then(Value::as_str)
            .ok_or_else(|| SummaryError::InvalidResponse("no message content".to_string()))?;
        parse_summary(content)
    }
}
