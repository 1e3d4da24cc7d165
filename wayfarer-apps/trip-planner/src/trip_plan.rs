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

//! The envelope returned for one trip request.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::result_merger::CategoryResult;
use crate::travel_info::TravelInfo;
use crate::trip_query::{BudgetLevel, FlightClass, TripQuery};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlanStatus {
    Success,
    Partial,
    Error,
}

impl PlanStatus {
    /// `Success` needs every requested category non-empty, travel info
    /// resolved and no deadline hit. `Error` needs every category empty and
    /// travel info failed: unresolved with nothing salvaged.
    pub fn decide<'a>(
        categories: impl IntoIterator<Item = &'a CategoryResult>,
        travel_info: &TravelInfo,
        deadline_hit: bool,
    ) -> Self {
        let (mut filled, mut total) = (0, 0);
        for category in categories {
            total += 1;
            if !category.is_empty() {
                filled += 1;
            }
        }
        if filled == total && travel_info.is_resolved() && !deadline_hit {
            PlanStatus::Success
        } else if filled == 0 && !travel_info.is_resolved() && !travel_info.has_any_data() {
            PlanStatus::Error
        } else {
            PlanStatus::Partial
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            PlanStatus::Success => "success",
            PlanStatus::Partial => "partial",
            PlanStatus::Error => "error",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Summary {
    pub headline: String,
    pub overview: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SummarySource {
    Llm,
    Template,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanMetadata {
    pub origin_city: String,
    pub destination_city: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub nights: u32,
    pub travelers: u32,
    pub budget_level: BudgetLevel,
    pub trip_type: Option<String>,
    pub accommodation_type: Option<String>,
    pub flight_class: FlightClass,
    /// Human-readable notes on everything that went missing
    pub errors: Vec<String>,
    pub summary_source: SummarySource,
    pub created_at: DateTime<Utc>,
    pub elapsed_ms: u64,
    pub deadline_hit: bool,
}

impl PlanMetadata {
    pub fn for_query(query: &TripQuery) -> Self {
        Self {
            origin_city: query.origin_city().to_string(),
            destination_city: query.destination_city().to_string(),
            start_date: query.start_date(),
            end_date: query.end_date(),
            nights: query.nights(),
            travelers: query.travelers(),
            budget_level: query.budget_level(),
            trip_type: query.trip_type().map(str::to_string),
            accommodation_type: query.accommodation_type().map(str::to_string),
            flight_class: query.flight_class(),
            errors: Vec::new(),
            summary_source: SummarySource::Template,
            created_at: Utc::now(),
            elapsed_ms: 0,
            deadline_hit: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TripPlanResult {
    pub flights: CategoryResult,
    pub accommodations: CategoryResult,
    /// Absent when activities were not requested
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub activities: Option<CategoryResult>,
    pub travel_info: TravelInfo,
    pub summary: Summary,
    pub metadata: PlanMetadata,
    pub status: PlanStatus,
}

impl TripPlanResult {
    /// Requested categories, activities last
    pub fn categories(&self) -> impl Iterator<Item = &CategoryResult> {
        [Some(&self.flights), Some(&self.accommodations), self.activities.as_ref()]
            .into_iter()
            .flatten()
    }
}
