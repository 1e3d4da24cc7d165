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

//! # Result Merger
//!
//! Turns the per-site offer lists of one category into a [`CategoryResult`]:
//! the raw lists are kept untouched under `by_site`, and `best_overall` is a
//! deduplicated, ranked and capped selection of those same offers.
//!
//! Duplicates are offers whose normalized titles are equal and whose prices
//! are within `price_tolerance` of each other in the same currency (or both
//! unpriced). Each candidate is compared against the first offer of a group,
//! never against later members, so groups do not drift. Within a group the
//! lowest price wins, then the higher rating, then the first seen.
//!
//! Ranking is a stable sort: priced offers by price ascending then rating
//! descending, followed by unpriced offers by rating descending. Offers with
//! neither signal are left out unless no offer has one, in which case the
//! deduplicated offers are returned in their original order.

use std::cmp::Ordering;
use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::offer::{Offer, OfferDetails};
use crate::site_adapter::{SearchParams, SiteFetchFailure, SiteOutcome};
use crate::text_extract::normalize_title;

pub const DEFAULT_BEST_OVERALL_CAP: usize = 10;
pub const DEFAULT_PRICE_TOLERANCE: f64 = 0.05;

/// Inclusive price window; `max: None` is open-ended
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PriceBand {
    pub min: f64,
    pub max: Option<f64>,
}

impl PriceBand {
    pub fn contains(&self, amount: f64) -> bool {
        amount >= self.min && self.max.is_none_or(|max| amount <= max)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct MergeOptions {
    pub best_overall_cap: usize,
    /// Relative price distance under which same-titled offers are duplicates
    pub price_tolerance: f64,
    /// Preferred price window for `best_overall`; ignored if nothing falls in it
    pub price_band: Option<PriceBand>,
    /// Requested lodging kind (`"hostel"`, `"apartment"`); `best_overall`
    /// keeps only offers naming it, unless none does
    pub accommodation_type: Option<String>,
}

impl Default for MergeOptions {
    fn default() -> Self {
        Self {
            best_overall_cap: DEFAULT_BEST_OVERALL_CAP,
            price_tolerance: DEFAULT_PRICE_TOLERANCE,
            price_band: None,
            accommodation_type: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SiteFailureReport {
    pub site: String,
    pub reason: SiteFetchFailure,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryResult {
    pub best_overall: Vec<Offer>,
    pub by_site: BTreeMap<String, Vec<Offer>>,
    pub search_params: SearchParams,
    #[serde(default)]
    pub failures: Vec<SiteFailureReport>,
}

impl CategoryResult {
    /// No site contributed a single offer
    pub fn is_empty(&self) -> bool {
        self.by_site.values().all(Vec::is_empty)
    }

    pub fn offer_count(&self) -> usize {
        self.by_site.values().map(Vec::len).sum()
    }
}

#[derive(Debug, Clone, Default)]
pub struct ResultMerger {
    options: MergeOptions,
}

struct Group<'a> {
    key: String,
    anchor: &'a Offer,
    winner: &'a Offer,
}

impl ResultMerger {
    pub fn new(options: MergeOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &MergeOptions {
        &self.options
    }

    /// Merge site outcomes, recording failed sites next to their empty lists
    pub fn merge_outcomes(&self, outcomes: Vec<SiteOutcome>, search_params: SearchParams) -> CategoryResult {
        let mut failures = Vec::new();
        let mut sites = Vec::with_capacity(outcomes.len());
        for outcome in outcomes {
            if let Some(reason) = outcome.failure {
                failures.push(SiteFailureReport {
                    site: outcome.site.clone(),
                    reason,
                });
            }
            sites.push((outcome.site, outcome.offers));
        }
        let mut result = self.merge(sites, search_params);
        result.failures = failures;
        result
    }

    /// Merge per-site lists given in site-list order
    pub fn merge(&self, sites: Vec<(String, Vec<Offer>)>, search_params: SearchParams) -> CategoryResult {
        let best_overall = self.best_overall(&sites);
        let mut by_site: BTreeMap<String, Vec<Offer>> = BTreeMap::new();
        for (site, offers) in sites {
            by_site.entry(site).or_default().extend(offers);
        }
        CategoryResult {
            best_overall,
            by_site,
            search_params,
            failures: Vec::new(),
        }
    }

    /// Deduplicated, ranked and capped selection of the offers in `sites`
    pub fn best_overall(&self, sites: &[(String, Vec<Offer>)]) -> Vec<Offer> {
        let winners = self.dedup(sites.iter().flat_map(|(_, offers)| offers.iter()));

        let rankable: Vec<&Offer> = winners.iter().copied().filter(|o| o.is_rankable()).collect();
        if rankable.is_empty() {
            return winners
                .into_iter()
                .take(self.options.best_overall_cap)
                .cloned()
                .collect();
        }

        // the band only applies once some priced offer falls inside it
        let mut candidates = match self.options.price_band {
            Some(band) if rankable.iter().any(|o| o.price_amount().is_some_and(|p| band.contains(p))) => rankable
                .into_iter()
                .filter(|o| o.price_amount().is_none_or(|p| band.contains(p)))
                .collect(),
            _ => rankable,
        };

        if let Some(kind) = self.options.accommodation_type.as_deref() {
            let kind = kind.to_lowercase();
            if candidates.iter().any(|o| names_kind(o, &kind)) {
                candidates.retain(|o| names_kind(o, &kind));
            }
        }

        candidates.sort_by(|a, b| rank_order(a, b));
        candidates
            .into_iter()
            .take(self.options.best_overall_cap)
            .cloned()
            .collect()
    }

    /// Group winners in first-seen group order
    fn dedup<'a>(&self, offers: impl Iterator<Item = &'a Offer>) -> Vec<&'a Offer> {
        let mut groups: Vec<Group<'a>> = Vec::new();
        for offer in offers {
            let key = normalize_title(&offer.title);
            let existing = groups
                .iter_mut()
                .find(|g| g.key == key && self.prices_match(g.anchor, offer));
            match existing {
                Some(group) => {
                    if beats(offer, group.winner) {
                        group.winner = offer;
                    }
                }
                None => groups.push(Group {
                    key,
                    anchor: offer,
                    winner: offer,
                }),
            }
        }
        groups.into_iter().map(|g| g.winner).collect()
    }

    fn prices_match(&self, a: &Offer, b: &Offer) -> bool {
        match (&a.price, &b.price) {
            (None, None) => true,
            (Some(pa), Some(pb)) if pa.currency == pb.currency => {
                let tolerance = self.options.price_tolerance * pa.amount.min(pb.amount);
                (pa.amount - pb.amount).abs() <= tolerance
            }
            _ => false,
        }
    }
}

/// Title or hotel class mentions `kind` (already lowercase)
fn names_kind(offer: &Offer, kind: &str) -> bool {
    offer.title.to_lowercase().contains(kind)
        || matches!(&offer.details, OfferDetails::Hotel { star_class: Some(class), .. } if class.to_lowercase().contains(kind))
}

fn rating_desc(a: &Offer, b: &Offer) -> Ordering {
    let ra = a.rating.unwrap_or(f64::NEG_INFINITY);
    let rb = b.rating.unwrap_or(f64::NEG_INFINITY);
    rb.total_cmp(&ra)
}

/// Priced first (price asc, rating desc), then unpriced (rating desc)
fn rank_order(a: &Offer, b: &Offer) -> Ordering {
    match (a.price_amount(), b.price_amount()) {
        (Some(pa), Some(pb)) => pa.total_cmp(&pb).then_with(|| rating_desc(a, b)),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => rating_desc(a, b),
    }
}

/// `challenger` replaces `incumbent` only when strictly better
fn beats(challenger: &Offer, incumbent: &Offer) -> bool {
    if let (Some(pc), Some(pi)) = (challenger.price_amount(), incumbent.price_amount()) {
        match pc.total_cmp(&pi) {
            Ordering::Less => return true,
            Ordering::Greater => return false,
            Ordering::Equal => {}
        }
    }
    rating_desc(challenger, incumbent) == Ordering::Less
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::offer::{Category, OfferDetails};
    use crate::trip_query::TripQueryInput;

    fn params() -> SearchParams {
        let q = TripQueryInput::new("New York", "Paris", "2025-06-01", "2025-06-07")
            .validate()
            .unwrap();
        SearchParams::for_category(&q, Category::Accommodations, "USD")
    }

    fn hotel(site: &str, title: &str, price: Option<f64>, rating: Option<f64>) -> Offer {
        let mut o = Offer::new(site, title, OfferDetails::empty_hotel());
        if let Some(p) = price {
            o = o.with_price(p, "USD");
        }
        if let Some(r) = rating {
            o = o.with_rating(r);
        }
        o
    }

    fn titles(offers: &[Offer]) -> Vec<(&str, &str)> {
        offers.iter().map(|o| (o.site.as_str(), o.title.as_str())).collect()
    }

    #[test]
    fn duplicates_keep_lowest_price() {
        let merger = ResultMerger::default();
        let sites = vec![
            ("booking".to_string(), vec![hotel("booking", "Hotel Lutetia", Some(410.0), Some(4.5))]),
            ("agoda".to_string(), vec![hotel("agoda", "hotel lutetia!", Some(399.0), Some(4.0))]),
        ];
        let best = merger.best_overall(&sites);
        assert_eq!(best.len(), 1);
        assert_eq!(best[0].site, "agoda");
    }

    #[test]
    fn price_tie_goes_to_rating_then_first_seen() {
        let merger = ResultMerger::default();
        let sites = vec![
            ("a".to_string(), vec![hotel("a", "Ibis", Some(100.0), Some(3.0))]),
            ("b".to_string(), vec![hotel("b", "Ibis", Some(100.0), Some(4.0))]),
            ("c".to_string(), vec![hotel("c", "Ibis", Some(100.0), Some(4.0))]),
        ];
        assert_eq!(titles(&merger.best_overall(&sites)), vec![("b", "Ibis")]);
    }

    #[test]
    fn prices_outside_tolerance_are_distinct() {
        let merger = ResultMerger::default();
        let sites = vec![(
            "a".to_string(),
            vec![
                hotel("a", "Ibis", Some(100.0), None),
                hotel("a", "Ibis", Some(106.0), None),
                hotel("a", "Ibis", Some(104.0), None),
            ],
        )];
        let best = merger.best_overall(&sites);
        // 104 is within 5% of the 100 anchor, 106 is not
        assert_eq!(
            best.iter().map(|o| o.price_amount().unwrap()).collect::<Vec<_>>(),
            vec![100.0, 106.0]
        );
    }

    #[test]
    fn different_currencies_never_merge() {
        let merger = ResultMerger::default();
        let eur = Offer::new("b", "Ibis", OfferDetails::empty_hotel()).with_price(100.0, "EUR");
        let sites = vec![
            ("a".to_string(), vec![hotel("a", "Ibis", Some(100.0), None)]),
            ("b".to_string(), vec![eur]),
        ];
        assert_eq!(merger.best_overall(&sites).len(), 2);
    }

    #[test]
    fn ranking_prices_first_then_ratings() {
        let merger = ResultMerger::default();
        let sites = vec![(
            "s".to_string(),
            vec![
                hotel("s", "Rated only low", None, Some(3.0)),
                hotel("s", "Expensive", Some(300.0), Some(5.0)),
                hotel("s", "Nothing", None, None),
                hotel("s", "Cheap", Some(90.0), None),
                hotel("s", "Rated only high", None, Some(4.8)),
                hotel("s", "Cheap well rated", Some(90.0), Some(4.1)),
            ],
        )];
        let best = merger.best_overall(&sites);
        let order: Vec<&str> = best.iter().map(|o| o.title.as_str()).collect();
        assert_eq!(
            order,
            vec!["Cheap well rated", "Cheap", "Expensive", "Rated only high", "Rated only low"]
        );
    }

    #[test]
    fn unrankable_only_falls_back_to_original_order() {
        let merger = ResultMerger::default();
        let sites = vec![
            ("ddg".to_string(), vec![hotel("ddg", "Zebra", None, None), hotel("ddg", "Apple", None, None)]),
            ("x".to_string(), vec![hotel("x", "zebra", None, None), hotel("x", "Mango", None, None)]),
        ];
        assert_eq!(
            titles(&merger.best_overall(&sites)),
            vec![("ddg", "Zebra"), ("ddg", "Apple"), ("x", "Mango")]
        );
    }

    #[test]
    fn cap_is_applied() {
        let merger = ResultMerger::new(MergeOptions {
            best_overall_cap: 3,
            ..Default::default()
        });
        let offers = (0..8)
            .map(|i| hotel("s", &format!("Hotel {i}"), Some(100.0 + i as f64 * 20.0), None))
            .collect();
        let best = merger.best_overall(&[("s".to_string(), offers)]);
        assert_eq!(best.len(), 3);
        assert_eq!(best[2].title, "Hotel 2");
    }

    #[test]
    fn price_band_prefers_matching_offers() {
        let merger = ResultMerger::new(MergeOptions {
            price_band: Some(PriceBand {
                min: 100.0,
                max: Some(300.0),
            }),
            ..Default::default()
        });
        let sites = vec![(
            "s".to_string(),
            vec![
                hotel("s", "Hostel", Some(30.0), None),
                hotel("s", "Mid", Some(180.0), None),
                hotel("s", "Palace", Some(900.0), None),
                hotel("s", "Unpriced", None, Some(4.0)),
            ],
        )];
        let best = merger.best_overall(&sites);
        assert_eq!(
            best.iter().map(|o| o.title.as_str()).collect::<Vec<_>>(),
            vec!["Mid", "Unpriced"]
        );

        // nothing in band: band ignored
        let sites = vec![(
            "s".to_string(),
            vec![
                hotel("s", "Hostel", Some(30.0), None),
                hotel("s", "Unpriced", None, Some(4.0)),
            ],
        )];
        assert_eq!(merger.best_overall(&sites).len(), 2);
    }

    #[test]
    fn accommodation_type_narrows_best_overall_only() {
        let merger = ResultMerger::new(MergeOptions {
            accommodation_type: Some("Hostel".into()),
            ..Default::default()
        });
        let classed = Offer::new(
            "s",
            "Loft Canal",
            OfferDetails::Hotel {
                amenities: Vec::new(),
                star_class: Some("Hostel".into()),
                address: None,
            },
        )
        .with_price(45.0, "USD");
        let sites = vec![(
            "s".to_string(),
            vec![
                hotel("s", "Generator Hostel", Some(60.0), Some(4.1)),
                hotel("s", "Hotel Lutetia", Some(510.0), Some(4.8)),
                classed,
            ],
        )];
        let result = merger.merge(sites, params());
        assert_eq!(
            result.best_overall.iter().map(|o| o.title.as_str()).collect::<Vec<_>>(),
            vec!["Loft Canal", "Generator Hostel"]
        );
        assert_eq!(result.by_site["s"].len(), 3);

        // no listing names the kind: keep everything
        let sites = vec![(
            "s".to_string(),
            vec![
                hotel("s", "Hotel Lutetia", Some(510.0), Some(4.8)),
                hotel("s", "Ibis Bastille", Some(99.0), None),
            ],
        )];
        assert_eq!(merger.best_overall(&sites).len(), 2);
    }

    #[test]
    fn empty_mapping_yields_empty_result() {
        let result = ResultMerger::default().merge(Vec::new(), params());
        assert!(result.best_overall.is_empty());
        assert!(result.by_site.is_empty());
        assert!(result.is_empty());
    }

    #[test]
    fn empty_site_keeps_its_key() {
        let result = ResultMerger::default().merge(
            vec![
                ("booking".to_string(), Vec::new()),
                ("agoda".to_string(), vec![hotel("agoda", "Ibis", Some(80.0), None)]),
            ],
            params(),
        );
        assert_eq!(result.by_site.get("booking"), Some(&Vec::new()));
        assert_eq!(result.best_overall.len(), 1);
        assert!(!result.is_empty());
    }

    #[test]
    fn outcomes_record_failures() {
        let outcomes = vec![
            SiteOutcome::failed("booking", SiteFetchFailure::Timeout(15_000), 15_000),
            SiteOutcome::from_result("agoda", Ok(vec![hotel("agoda", "Ibis", Some(80.0), None)]), 120),
        ];
        let result = ResultMerger::default().merge_outcomes(outcomes, params());
        assert_eq!(result.failures.len(), 1);
        assert_eq!(result.failures[0].site, "booking");
        assert_eq!(result.by_site["booking"], Vec::new());
        assert_eq!(result.offer_count(), 1);
    }

    #[test]
    fn band_bounds_are_inclusive() {
        let band = PriceBand {
            min: 100.0,
            max: Some(300.0),
        };
        assert!(band.contains(100.0) && band.contains(300.0));
        assert!(!band.contains(99.99) && !band.contains(300.01));
        assert!(PriceBand { min: 300.0, max: None }.contains(10_000.0));
    }
}
