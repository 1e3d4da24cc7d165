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

//! # Offers
//!
//! One listing (flight, hotel or activity) normalized across sites.

use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Flights,
    Accommodations,
    Activities,
}

impl Category {
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Flights => "flights",
            Category::Accommodations => "accommodations",
            Category::Activities => "activities",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Price {
    pub amount: f64,
    pub currency: String,
}

impl Price {
    pub fn new(amount: f64, currency: impl Into<String>) -> Self {
        Self {
            amount,
            currency: currency.into(),
        }
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.0} {}", self.amount, self.currency)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Layover {
    pub airport: String,
    pub duration_minutes: Option<u32>,
}

/// Category-specific payload of an [`Offer`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum OfferDetails {
    Flight {
        airline: Option<String>,
        departure_time: Option<String>,
        arrival_time: Option<String>,
        duration_minutes: Option<u32>,
        stops: Option<u32>,
        #[serde(default)]
        layovers: Vec<Layover>,
    },
    Hotel {
        #[serde(default)]
        amenities: Vec<String>,
        star_class: Option<String>,
        address: Option<String>,
    },
    Activity {
        duration: Option<String>,
        activity_type: Option<String>,
    },
}

impl OfferDetails {
    pub fn empty_flight() -> Self {
        OfferDetails::Flight {
            airline: None,
            departure_time: None,
            arrival_time: None,
            duration_minutes: None,
            stops: None,
            layovers: Vec::new(),
        }
    }

    pub fn empty_hotel() -> Self {
        OfferDetails::Hotel {
            amenities: Vec::new(),
            star_class: None,
            address: None,
        }
    }

    pub fn empty_activity() -> Self {
        OfferDetails::Activity {
            duration: None,
            activity_type: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Offer {
    /// Site identifier the offer was scraped from
    pub site: String,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub price: Option<Price>,
    /// Normalized to 0..=5 whatever the site's own scale
    pub rating: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reviews: Option<u32>,
    pub url: Option<String>,
    pub details: OfferDetails,
}

impl Offer {
    pub fn new(site: impl Into<String>, title: impl Into<String>, details: OfferDetails) -> Self {
        Self {
            site: site.into(),
            title: title.into(),
            description: None,
            price: None,
            rating: None,
            reviews: None,
            url: None,
            details,
        }
    }

    pub fn with_price(mut self, amount: f64, currency: impl Into<String>) -> Self {
        self.price = Some(Price::new(amount, currency));
        self
    }

    pub fn with_rating(mut self, rating: f64) -> Self {
        self.rating = Some(rating);
        self
    }

    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn price_amount(&self) -> Option<f64> {
        self.price.as_ref().map(|p| p.amount)
    }

    /// Carries a price or rating signal the merger can rank on
    pub fn is_rankable(&self) -> bool {
        self.price.is_some() || self.rating.is_some()
    }
}

/// Clamp a rating given on a `0..=scale` scale onto 0..=5
pub fn normalize_rating(raw: f64, scale: f64) -> Option<f64> {
    if !raw.is_finite() || scale <= 0.0 || raw < 0.0 {
        return None;
    }
    let normalized = raw / scale * 5.0;
    Some((normalized.min(5.0) * 100.0).round() / 100.0)
}
