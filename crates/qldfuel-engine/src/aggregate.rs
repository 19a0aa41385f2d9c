//! Statewide aggregation: price normalization, global cheapest per fuel and
//! per-site price buckets.

use std::collections::HashMap;

use qldfuel_client::{RawPrice, RawSite};

use crate::model::{normalize_price, offer_cheapest, CheapestEntry, CheapestMap, SitePrice};

/// Output of [`aggregate`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Aggregation {
    /// Valid prices bucketed by site id, in input order.
    pub prices_by_site: HashMap<String, Vec<SitePrice>>,
    /// Cheapest valid price per fuel id across the whole state.
    pub global_cheapest: CheapestMap,
    /// Price records dropped for being missing or outside the valid range.
    pub discarded: usize,
}

/// Normalizes every price and computes the statewide cheapest per fuel.
///
/// Prices whose site is not in `sites` still count; the cheapest entry then
/// carries no name, address, postcode or brand.
#[must_use]
pub fn aggregate(sites: &[RawSite], prices: &[RawPrice]) -> Aggregation {
    let lookup: HashMap<&str, &RawSite> = sites.iter().map(|s| (s.site_id.as_str(), s)).collect();
    let mut out = Aggregation::default();

    for raw in prices {
        let Some(price) = normalize_price(raw.price) else {
            out.discarded += 1;
            continue;
        };

        offer_cheapest(&mut out.global_cheapest, &raw.fuel_id, price, || {
            let site = lookup.get(raw.site_id.as_str());
            CheapestEntry {
                price,
                site_id: raw.site_id.clone(),
                name: site.and_then(|s| s.name.clone()),
                address: site.and_then(|s| s.address.clone()),
                postcode: site.and_then(|s| s.postcode.clone()),
                brand_id: site.and_then(|s| s.brand_id.clone()),
                distance_km: None,
            }
        });

        out.prices_by_site
            .entry(raw.site_id.clone())
            .or_default()
            .push(SitePrice {
                site_id: raw.site_id.clone(),
                fuel_id: raw.fuel_id.clone(),
                price,
                transaction_date: raw.transaction_date.clone(),
            });
    }

    if out.discarded > 0 {
        tracing::debug!(discarded = out.discarded, "aggregate: dropped invalid prices");
    }
    out
}
