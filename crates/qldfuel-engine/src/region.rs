//! Per-fuel index answering "cheapest price of this fuel at any other
//! tracked station".

use std::collections::{BTreeMap, HashMap};

use crate::model::FilteredSite;

/// The two lowest `(price, site_id)` pairs per fuel among the filtered sites.
///
/// Each site contributes the first price it lists for a fuel, the same value
/// its fuel price sensor reports.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RegionIndex {
    lowest: HashMap<String, Vec<(f64, String)>>,
}

impl RegionIndex {
    #[must_use]
    pub fn build(sites: &BTreeMap<String, FilteredSite>) -> Self {
        let mut index = Self::default();
        for (site_id, site) in sites {
            let mut seen: Vec<&str> = Vec::new();
            for p in &site.prices {
                if seen.contains(&p.fuel_id.as_str()) {
                    continue;
                }
                seen.push(&p.fuel_id);
                index.insert(&p.fuel_id, p.price, site_id);
            }
        }
        index
    }

    fn insert(&mut self, fuel_id: &str, price: f64, site_id: &str) {
        let slots = self.lowest.entry(fuel_id.to_string()).or_default();
        let at = slots
            .iter()
            .position(|(p, _)| price < *p)
            .unwrap_or(slots.len());
        if at < 2 {
            slots.insert(at, (price, site_id.to_string()));
            slots.truncate(2);
        }
    }

    /// Cheapest price of `fuel_id` at a tracked station other than
    /// `site_id`.
    #[must_use]
    pub fn cheapest_excluding(&self, fuel_id: &str, site_id: &str) -> Option<f64> {
        self.lowest
            .get(fuel_id)?
            .iter()
            .find(|(_, id)| id != site_id)
            .map(|(price, _)| *price)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::SitePrice;

    fn site_with(prices: &[(&str, f64)]) -> FilteredSite {
        FilteredSite {
            name: None,
            address: None,
            postcode: None,
            distance_km: 0.0,
            prices: prices
                .iter()
                .map(|(fuel, price)| SitePrice {
                    site_id: String::new(),
                    fuel_id: (*fuel).to_string(),
                    price: *price,
                    transaction_date: None,
                })
                .collect(),
            stats: BTreeMap::new(),
        }
    }

    fn index() -> RegionIndex {
        let mut sites = BTreeMap::new();
        sites.insert("a".to_string(), site_with(&[("12", 170.0), ("3", 199.0)]));
        sites.insert("b".to_string(), site_with(&[("12", 175.0)]));
        sites.insert("c".to_string(), site_with(&[("12", 180.0), ("12", 100.0)]));
        RegionIndex::build(&sites)
    }

    #[test]
    fn cheapest_other_station_skips_self() {
        let index = index();
        assert_eq!(index.cheapest_excluding("12", "a"), Some(175.0));
        assert_eq!(index.cheapest_excluding("12", "b"), Some(170.0));
        assert_eq!(index.cheapest_excluding("12", "c"), Some(170.0));
    }

    #[test]
    fn only_first_price_per_site_counts() {
        // site c lists 100.0 second; it must not become the regional low
        assert_eq!(index().cheapest_excluding("12", "zzz"), Some(170.0));
    }

    #[test]
    fn sole_station_has_no_comparison() {
        let index = index();
        assert_eq!(index.cheapest_excluding("3", "a"), None);
        assert_eq!(index.cheapest_excluding("3", "b"), Some(199.0));
        assert_eq!(index.cheapest_excluding("8", "a"), None);
    }
}
