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

//! Side-effect free helpers that pull numbers out of scraped text.

use once_cell::sync::Lazy;
use regex::Regex;
use scraper::ElementRef;

use crate::offer::Price;

static WHITESPACE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());
static PRICE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"[$€£₹]?\s*?(\d+[,.\d]*)").unwrap());
static DURATION_H_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(\d+)\s*h").unwrap());
static DURATION_M_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(\d+)\s*m").unwrap());
static DECIMAL_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\d+(?:[.,]\d+)?").unwrap());
static NON_ALNUM_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"[\W_]+").unwrap());

/// Concatenated text of an element with whitespace collapsed
pub fn element_text(el: ElementRef) -> String {
    clean_text(&el.text().collect::<String>())
}

pub fn clean_text(s: &str) -> String {
    WHITESPACE_RE.replace_all(s.trim(), " ").into_owned()
}

/// Cut to at most `max_chars` characters
pub fn truncate_chars(s: &str, max_chars: usize) -> String {
    match s.char_indices().nth(max_chars) {
        Some((idx, _)) => s[..idx].to_string(),
        None => s.to_string(),
    }
}

fn currency_of(s: &str, default_currency: &str) -> String {
    let code = if s.contains('€') || s.contains("EUR") {
        "EUR"
    } else if s.contains('£') || s.contains("GBP") {
        "GBP"
    } else if s.contains('₹') || s.contains("INR") {
        "INR"
    } else if s.contains('$') || s.contains("USD") {
        "USD"
    } else {
        default_currency
    };
    code.to_string()
}

/// `"1.234,56"` -> `"1234.56"`, `"1,234.50"` -> `"1234.50"`.
///
/// A comma followed by one or two trailing digits is a decimal comma; the
/// dots before it are then thousands separators, as are repeated dots.
fn normalize_amount(raw: &str) -> String {
    let raw = raw.trim_end_matches(['.', ',']);
    let decimal_comma = raw
        .rsplit_once(',')
        .is_some_and(|(_, tail)| (1..=2).contains(&tail.len()) && !tail.contains('.'));
    if decimal_comma {
        raw.replace('.', "").replace(',', ".")
    } else if raw.matches('.').count() > 1 {
        raw.replace(['.', ','], "")
    } else {
        raw.replace(',', "")
    }
}

/// Parse a displayed price such as `"$1,234"`, `"€ 89.50"` or `"1.234,56 €"`.
///
/// Thousands separators are dropped; the currency comes from the symbol when
/// present, else `default_currency`.
pub fn extract_price(s: &str, default_currency: &str) -> Option<Price> {
    let caps = PRICE_RE.captures(s)?;
    let amount: f64 = normalize_amount(caps.get(1)?.as_str()).parse().ok()?;
    Some(Price::new(amount, currency_of(s, default_currency)))
}

/// First decimal number in `s`; accepts a comma decimal separator
pub fn extract_decimal(s: &str) -> Option<f64> {
    DECIMAL_RE
        .find(s)
        .and_then(|m| m.as_str().replace(',', ".").parse().ok())
}

/// Digits only, e.g. `"(1,234 reviews)"` -> 1234
pub fn extract_count(s: &str) -> Option<u32> {
    let digits: String = s.chars().filter(|c| c.is_ascii_digit()).collect();
    digits.parse().ok()
}

/// `"6h 30m"` / `"6 hr 30 min"` -> 390. `None` when nothing matched.
pub fn parse_duration_minutes(s: &str) -> Option<u32> {
    let s = s.trim();
    let hours = DURATION_H_RE
        .captures(s)
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse::<u32>().ok());
    let minutes = DURATION_M_RE
        .captures(s)
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse::<u32>().ok());
    if hours.is_none() && minutes.is_none() {
        tracing::debug!("Could not parse duration from: '{}'", s);
        return None;
    }
    Some(hours.unwrap_or(0) * 60 + minutes.unwrap_or(0))
}

/// `"Nonstop"` / `"Direct"` -> 0, `"2 stops"` -> 2
pub fn parse_stops(s: &str) -> Option<u32> {
    let lower = s.to_lowercase();
    if lower.contains("nonstop") || lower.contains("non-stop") || lower.contains("direct") {
        return Some(0);
    }
    lower
        .split_whitespace()
        .next()
        .and_then(|first| first.parse().ok())
}

/// Keep the leading clock time of `"10:30 AM"`-style labels
pub fn normalize_time(s: &str) -> String {
    let s = s.trim();
    s.split_whitespace().next().unwrap_or(s).to_string()
}

/// Title key used for cross-site duplicate detection
pub fn normalize_title(s: &str) -> String {
    NON_ALNUM_RE
        .replace_all(&s.to_lowercase(), " ")
        .trim()
        .to_string()
}

/// Make a scraped `href` absolute against `base`
pub fn absolute_url(base: &str, href: &str) -> String {
    if href.starts_with("http://") || href.starts_with("https://") {
        href.to_string()
    } else if let Some(rest) = href.strip_prefix("//") {
        format!("https://{rest}")
    } else if href.starts_with('/') {
        format!("{}{}", base.trim_end_matches('/'), href)
    } else {
        format!("{}/{}", base.trim_end_matches('/'), href)
    }
}
