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

//! # Trip Query
//!
//! Raw request input and the validated, immutable [`TripQuery`] built from it.
//! Validation happens once, here; everything downstream reads typed fields.

use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::PlannerError;

pub const DEFAULT_TRAVELERS: u32 = 2;
pub const DEFAULT_ORIGIN_COUNTRY: &str = "United States";
const DATE_FORMAT: &str = "%Y-%m-%d";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BudgetLevel {
    Budget,
    #[default]
    Moderate,
    Luxury,
}

impl BudgetLevel {
    /// Nightly price band used to favour matching accommodations
    pub fn nightly_price_band(&self) -> (f64, Option<f64>) {
        match self {
            BudgetLevel::Budget => (0.0, Some(100.0)),
            BudgetLevel::Moderate => (100.0, Some(300.0)),
            BudgetLevel::Luxury => (300.0, None),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            BudgetLevel::Budget => "budget",
            BudgetLevel::Moderate => "moderate",
            BudgetLevel::Luxury => "luxury",
        }
    }
}

impl fmt::Display for BudgetLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BudgetLevel {
    type Err = PlannerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "budget" => Ok(BudgetLevel::Budget),
            "moderate" => Ok(BudgetLevel::Moderate),
            "luxury" => Ok(BudgetLevel::Luxury),
            other => Err(PlannerError::invalid(format!(
                "budget_level must be one of budget|moderate|luxury, got '{other}'"
            ))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FlightClass {
    #[default]
    Economy,
    PremiumEconomy,
    Business,
    First,
}

impl FlightClass {
    pub fn as_str(&self) -> &'static str {
        match self {
            FlightClass::Economy => "economy",
            FlightClass::PremiumEconomy => "premium_economy",
            FlightClass::Business => "business",
            FlightClass::First => "first",
        }
    }

    /// Human wording, as typed into a search box
    pub fn label(&self) -> &'static str {
        match self {
            FlightClass::Economy => "economy",
            FlightClass::PremiumEconomy => "premium economy",
            FlightClass::Business => "business class",
            FlightClass::First => "first class",
        }
    }
}

impl fmt::Display for FlightClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FlightClass {
    type Err = PlannerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_lowercase().replace(['-', ' '], "_");
        match normalized.as_str() {
            "economy" => Ok(FlightClass::Economy),
            "premium_economy" | "premium" => Ok(FlightClass::PremiumEconomy),
            "business" => Ok(FlightClass::Business),
            "first" => Ok(FlightClass::First),
            _ => Err(PlannerError::invalid(format!(
                "flight_class must be one of economy|premium_economy|business|first, got '{}'",
                s.trim()
            ))),
        }
    }
}

/// Request body as received from a client, before validation
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "server", derive(schemars::JsonSchema))]
#[serde(rename_all = "snake_case")]
pub struct TripQueryInput {
    pub origin_city: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub origin_country: Option<String>,
    pub destination_city: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub destination_country: Option<String>,
    /// YYYY-MM-DD
    pub start_date: String,
    /// YYYY-MM-DD
    pub end_date: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub travelers: Option<u32>,
    /// budget | moderate | luxury
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub budget_level: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trip_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub accommodation_type: Option<String>,
    /// economy | premium_economy | business | first
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub flight_class: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub include_activities: Option<bool>,
}

impl TripQueryInput {
    pub fn new(
        origin_city: impl Into<String>,
        destination_city: impl Into<String>,
        start_date: impl Into<String>,
        end_date: impl Into<String>,
    ) -> Self {
        Self {
            origin_city: origin_city.into(),
            destination_city: destination_city.into(),
            start_date: start_date.into(),
            end_date: end_date.into(),
            ..Default::default()
        }
    }

    pub fn validate(self) -> Result<TripQuery, PlannerError> {
        let origin_city = required_text("origin_city", &self.origin_city)?;
        let destination_city = required_text("destination_city", &self.destination_city)?;
        let start_date = parse_date("start_date", &self.start_date)?;
        let end_date = parse_date("end_date", &self.end_date)?;
        if end_date < start_date {
            return Err(PlannerError::invalid(format!(
                "end_date ({end_date}) must not be before start_date ({start_date})"
            )));
        }

        let travelers = self.travelers.unwrap_or(DEFAULT_TRAVELERS);
        if travelers < 1 {
            return Err(PlannerError::invalid("travelers must be at least 1"));
        }

        let budget_level = self
            .budget_level
            .as_deref()
            .filter(|s| !s.trim().is_empty())
            .map(BudgetLevel::from_str)
            .transpose()?
            .unwrap_or_default();
        let flight_class = self
            .flight_class
            .as_deref()
            .filter(|s| !s.trim().is_empty())
            .map(FlightClass::from_str)
            .transpose()?
            .unwrap_or_default();

        Ok(TripQuery {
            origin_city,
            origin_country: optional_text(self.origin_country)
                .unwrap_or_else(|| DEFAULT_ORIGIN_COUNTRY.to_string()),
            destination_city,
            destination_country: optional_text(self.destination_country),
            start_date,
            end_date,
            travelers,
            budget_level,
            trip_type: optional_text(self.trip_type),
            accommodation_type: optional_text(self.accommodation_type),
            flight_class,
            include_activities: self.include_activities.unwrap_or(true),
        })
    }
}

fn required_text(field: &str, value: &str) -> Result<String, PlannerError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(PlannerError::invalid(format!("{field} is required")));
    }
    Ok(trimmed.to_string())
}

fn optional_text(value: Option<String>) -> Option<String> {
    value
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

fn parse_date(field: &str, value: &str) -> Result<NaiveDate, PlannerError> {
    NaiveDate::parse_from_str(value.trim(), DATE_FORMAT)
        .map_err(|_| PlannerError::invalid(format!("{field} must be YYYY-MM-DD, got '{value}'")))
}

/// A validated trip request. Immutable once built.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct TripQuery {
    origin_city: String,
    origin_country: String,
    destination_city: String,
    destination_country: Option<String>,
    start_date: NaiveDate,
    end_date: NaiveDate,
    travelers: u32,
    budget_level: BudgetLevel,
    trip_type: Option<String>,
    accommodation_type: Option<String>,
    flight_class: FlightClass,
    include_activities: bool,
}

impl TripQuery {
    pub fn origin_city(&self) -> &str {
        &self.origin_city
    }

    pub fn origin_country(&self) -> &str {
        &self.origin_country
    }

    pub fn destination_city(&self) -> &str {
        &self.destination_city
    }

    pub fn destination_country(&self) -> Option<&str> {
        self.destination_country.as_deref()
    }

    pub fn start_date(&self) -> NaiveDate {
        self.start_date
    }

    pub fn end_date(&self) -> NaiveDate {
        self.end_date
    }

    pub fn travelers(&self) -> u32 {
        self.travelers
    }

    pub fn budget_level(&self) -> BudgetLevel {
        self.budget_level
    }

    pub fn trip_type(&self) -> Option<&str> {
        self.trip_type.as_deref()
    }

    pub fn accommodation_type(&self) -> Option<&str> {
        self.accommodation_type.as_deref()
    }

    pub fn flight_class(&self) -> FlightClass {
        self.flight_class
    }

    pub fn include_activities(&self) -> bool {
        self.include_activities
    }

    /// Day count between start and end; 0 for a same-day trip
    pub fn nights(&self) -> u32 {
        (self.end_date - self.start_date).num_days().max(0) as u32
    }

    /// A one-way trip has no distinct return leg
    pub fn is_one_way(&self) -> bool {
        self.start_date == self.end_date
    }

    /// Rooms needed, two travelers per room
    pub fn rooms(&self) -> u32 {
        self.travelers.div_ceil(2)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn paris() -> TripQueryInput {
        TripQueryInput::new("New York", "Paris", "2025-06-01", "2025-06-07")
    }

    #[test]
    fn defaults_are_applied() {
        let q = paris().validate().unwrap();
        assert_eq!(q.travelers(), 2);
        assert_eq!(q.budget_level(), BudgetLevel::Moderate);
        assert_eq!(q.flight_class(), FlightClass::Economy);
        assert_eq!(q.origin_country(), "United States");
        assert_eq!(q.destination_country(), None);
        assert!(q.include_activities());
        assert_eq!(q.nights(), 6);
        assert_eq!(q.rooms(), 1);
    }

    #[test]
    fn end_before_start_is_rejected() {
        let mut input = paris();
        input.end_date = "2025-05-30".into();
        let err = input.validate().unwrap_err();
        assert!(matches!(err, PlannerError::InvalidQuery(_)));
    }

    #[test]
    fn same_day_trip_is_allowed() {
        let mut input = paris();
        input.end_date = input.start_date.clone();
        let q = input.validate().unwrap();
        assert_eq!(q.nights(), 0);
        assert!(q.is_one_way());
    }

    #[test]
    fn zero_travelers_is_rejected() {
        let mut input = paris();
        input.travelers = Some(0);
        assert!(input.validate().is_err());
    }

    #[test]
    fn malformed_date_is_rejected() {
        let mut input = paris();
        input.start_date = "06/01/2025".into();
        let err = input.validate().unwrap_err();
        assert!(err.to_string().contains("start_date"));
    }

    #[test]
    fn blank_city_is_rejected() {
        let mut input = paris();
        input.destination_city = "   ".into();
        assert!(input.validate().is_err());
    }

    #[test]
    fn enums_parse_loosely() {
        let mut input = paris();
        input.budget_level = Some("Luxury".into());
        input.flight_class = Some("premium-economy".into());
        input.travelers = Some(5);
        let q = input.validate().unwrap();
        assert_eq!(q.budget_level(), BudgetLevel::Luxury);
        assert_eq!(q.flight_class(), FlightClass::PremiumEconomy);
        assert_eq!(q.rooms(), 3);
    }

    #[test]
    fn unknown_budget_is_rejected() {
        let mut input = paris();
        input.budget_level = Some("shoestring".into());
        assert!(input.validate().is_err());
    }

    #[test]
    fn input_deserializes_from_request_json() {
        let input: TripQueryInput = serde_json::from_str(
            r#"{"origin_city":"New York","destination_city":"Paris",
                "start_date":"2025-06-01","end_date":"2025-06-07","travelers":2,
                "include_activities":false}"#,
        )
        .unwrap();
        let q = input.validate().unwrap();
        assert!(!q.include_activities());
    }
}
