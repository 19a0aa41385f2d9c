//! Shared output types of the aggregation and geofilter passes.

use std::collections::BTreeMap;

use serde::Serialize;

/// Prices at or above this many cents per litre are placeholders the API
/// uses for "not sold here".
pub const MAX_VALID_PRICE: f64 = 999.0;

/// Whether a normalized price (cents per litre) is a real price.
#[must_use]
pub fn is_valid_price(price: f64) -> bool {
    price > 0.0 && price < MAX_VALID_PRICE
}

/// Converts a raw API price (tenths of a cent) to cents per litre, returning
/// `None` for missing or invalid prices.
#[must_use]
pub fn normalize_price(raw: Option<f64>) -> Option<f64> {
    raw.map(|tenths| tenths / 10.0).filter(|p| is_valid_price(*p))
}

/// A single valid price at a site, in cents per litre.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SitePrice {
    pub site_id: String,
    pub fuel_id: String,
    pub price: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transaction_date: Option<String>,
}

/// The cheapest offer for one fuel within some scope.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CheapestEntry {
    pub price: f64,
    pub site_id: String,
    pub name: Option<String>,
    pub address: Option<String>,
    pub postcode: Option<String>,
    /// Only recorded for the statewide scope.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub brand_id: Option<String>,
    /// Only recorded for the local scope.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub distance_km: Option<f64>,
}

/// Cheapest entry per fuel id.
pub type CheapestMap = BTreeMap<String, CheapestEntry>;

/// Offers `price` for `fuel_id`; the entry is replaced only when strictly
/// cheaper, so ties keep the first record seen.
pub(crate) fn offer_cheapest(
    map: &mut CheapestMap,
    fuel_id: &str,
    price: f64,
    entry: impl FnOnce() -> CheapestEntry,
) {
    if map.get(fuel_id).is_some_and(|current| current.price <= price) {
        return;
    }
    map.insert(fuel_id.to_string(), entry());
}

/// Per-fuel statistics for a site inside the radius.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SiteFuelStats {
    /// Site price minus the statewide cheapest, 1 dp.
    pub qld_delta: f64,
}

/// A site within the configured radius of home.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FilteredSite {
    pub name: Option<String>,
    pub address: Option<String>,
    pub postcode: Option<String>,
    pub distance_km: f64,
    pub prices: Vec<SitePrice>,
    pub stats: BTreeMap<String, SiteFuelStats>,
}

impl FilteredSite {
    /// The first listed price for `fuel_id`.
    #[must_use]
    pub fn price_for(&self, fuel_id: &str) -> Option<f64> {
        self.prices
            .iter()
            .find(|p| p.fuel_id == fuel_id)
            .map(|p| p.price)
    }

    #[must_use]
    pub fn qld_delta(&self, fuel_id: &str) -> Option<f64> {
        self.stats.get(fuel_id).map(|s| s.qld_delta)
    }

    /// Street address and postcode joined for display.
    #[must_use]
    pub fn display_address(&self) -> String {
        join_address(self.address.as_deref(), self.postcode.as_deref())
    }
}

pub(crate) fn join_address(address: Option<&str>, postcode: Option<&str>) -> String {
    [address, postcode]
        .into_iter()
        .flatten()
        .collect::<Vec<_>>()
        .join(" ")
}
