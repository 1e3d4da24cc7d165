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

//! Boundary-level errors.
//!
//! Everything below the boundary degrades into data (site failures, unknown
//! travel info, templated summaries). Only these reach a caller as an error.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum PlannerError {
    /// The request failed validation and never reached the aggregator
    #[error("invalid query: {0}")]
    InvalidQuery(String),

    #[error("configuration error: {0}")]
    Config(String),

    /// Outbound client could not be constructed
    #[error("http client error: {0}")]
    Http(String),
}

impl PlannerError {
    pub fn invalid<S: Into<String>>(message: S) -> Self {
        Self::InvalidQuery(message.into())
    }

    pub fn config<S: Into<String>>(message: S) -> Self {
        Self::Config(message.into())
    }

    /// HTTP status the REST boundary answers with
    pub fn status_code(&self) -> u16 {
        match self {
            PlannerError::InvalidQuery(_) => 400,
            _ => 500,
        }
    }

    /// Message safe to show to an end user
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            PlannerError::InvalidQuery(message) => format!("Invalid trip request: {message}"),
            PlannerError::Config(_) => {
                "The trip planner is misconfigured. Please contact the operator.".to_string()
            }
            PlannerError::Http(_) => {
                "The trip planner could not reach its data sources.".to_string()
            }
        }
    }
}
