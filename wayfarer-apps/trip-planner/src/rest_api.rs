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

//! # REST API
//!
//! | Route                         | Body / query          | Answer           |
//! |-------------------------------|-----------------------|------------------|
//! | `POST /api/plan-trip`         | `TripQueryInput`      | `TripPlanResult` |
//! | `POST /api/search-flights`    | `TripQueryInput`      | `CategoryResult` |
//! | `POST /api/search-hotels`     | `TripQueryInput`      | `CategoryResult` |
//! | `POST /api/search-activities` | `TripQueryInput`      | `CategoryResult` |
//! | `GET /api/travel-info`        | `?destination_city=…` | `TravelInfo`     |
//! | `GET /health`                 |                       | `{status: "ok"}` |
//!
//! A request that fails validation gets `400 {status: "error", error}` and
//! never reaches the aggregator.

use std::sync::Arc;

use axum::{Json, Router};
use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Query, State};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use http::StatusCode;
use serde::Deserialize;
use serde_json::json;
use tower_http::cors::CorsLayer;

use crate::aggregator::TripAggregator;
use crate::error::PlannerError;
use crate::offer::Category;
use crate::result_merger::CategoryResult;
use crate::travel_info::TravelInfo;
use crate::trip_plan::TripPlanResult;
use crate::trip_query::{DEFAULT_ORIGIN_COUNTRY, TripQuery, TripQueryInput};

type Shared = Arc<TripAggregator>;

/// JSON error body with the status the error maps to
pub struct ApiError(PlannerError);

impl From<PlannerError> for ApiError {
    fn from(e: PlannerError) -> Self {
        Self(e)
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self(PlannerError::invalid(rejection.body_text()))
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        Self(PlannerError::invalid(rejection.body_text()))
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.0.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        if status.is_server_error() {
            tracing::error!("[rest_api] {}", self.0);
        } else {
            tracing::info!("[rest_api] rejected request: {}", self.0);
        }
        let body = json!({"status": "error", "error": self.0.user_message()});
        (status, Json(body)).into_response()
    }
}

fn validated(body: Result<Json<TripQueryInput>, JsonRejection>) -> Result<TripQuery, ApiError> {
    let Json(input) = body?;
    Ok(input.validate()?)
}

pub fn router(aggregator: Arc<TripAggregator>) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api/plan-trip", post(plan_trip))
        .route("/api/search-flights", post(search_flights))
        .route("/api/search-hotels", post(search_hotels))
        .route("/api/search-activities", post(search_activities))
        .route("/api/travel-info", get(travel_info))
        .layer(CorsLayer::permissive())
        .with_state(aggregator)
}

async fn health() -> Json<serde_json::Value> {
    Json(json!({"status": "ok"}))
}

async fn plan_trip(
    State(aggregator): State<Shared>,
    body: Result<Json<TripQueryInput>, JsonRejection>,
) -> Result<Json<TripPlanResult>, ApiError> {
    let query = validated(body)?;
    Ok(Json(aggregator.plan(&query).await))
}

async fn search(aggregator: &TripAggregator, query: &TripQuery, category: Category) -> Json<CategoryResult> {
    Json(aggregator.search_category(query, category).await)
}

async fn search_flights(
    State(aggregator): State<Shared>,
    body: Result<Json<TripQueryInput>, JsonRejection>,
) -> Result<Json<CategoryResult>, ApiError> {
    let query = validated(body)?;
    Ok(search(&aggregator, &query, Category::Flights).await)
}

async fn search_hotels(
    State(aggregator): State<Shared>,
    body: Result<Json<TripQueryInput>, JsonRejection>,
) -> Result<Json<CategoryResult>, ApiError> {
    let query = validated(body)?;
    Ok(search(&aggregator, &query, Category::Accommodations).await)
}

async fn search_activities(
    State(aggregator): State<Shared>,
    body: Result<Json<TripQueryInput>, JsonRejection>,
) -> Result<Json<CategoryResult>, ApiError> {
    let query = validated(body)?;
    Ok(search(&aggregator, &query, Category::Activities).await)
}

#[derive(Debug, Deserialize)]
pub struct TravelInfoParams {
    #[serde(default)]
    pub origin_country: Option<String>,
    #[serde(default)]
    pub destination_country: Option<String>,
    #[serde(default)]
    pub destination_city: Option<String>,
}

async fn travel_info(
    State(aggregator): State<Shared>,
    params: Result<Query<TravelInfoParams>, QueryRejection>,
) -> Result<Json<TravelInfo>, ApiError> {
    let Query(params) = params?;
    let trimmed = |v: Option<String>| v.map(|s| s.trim().to_string()).filter(|s| !s.is_empty());
    let destination_country = trimmed(params.destination_country);
    let destination_city = trimmed(params.destination_city);
    if destination_country.is_none() && destination_city.is_none() {
        return Err(PlannerError::invalid("destination_city or destination_country is required").into());
    }
    let origin_country = trimmed(params.origin_country).unwrap_or_else(|| DEFAULT_ORIGIN_COUNTRY.to_string());
    let info = aggregator
        .travel_info(
            &origin_country,
            destination_country.as_deref(),
            destination_city.as_deref().unwrap_or_default(),
        )
        .await;
    Ok(Json(info))
}
