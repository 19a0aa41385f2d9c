//! Radius filter around the home coordinate and local aggregation.

use std::collections::BTreeMap;

use qldfuel_client::RawSite;
use qldfuel_core::{distance_m, round1, Coordinate};

use crate::aggregate::Aggregation;
use crate::model::{offer_cheapest, CheapestEntry, CheapestMap, FilteredSite, SiteFuelStats};

/// Output of [`geofilter`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Geofiltered {
    pub sites: BTreeMap<String, FilteredSite>,
    pub local_cheapest: CheapestMap,
}

/// Keeps the sites within `radius_km` of `home` (inclusive) and derives the
/// per-site deltas and the local cheapest per fuel.
///
/// Sites without usable coordinates are skipped. An empty result is logged
/// but is not an error.
#[must_use]
pub fn geofilter(
    sites: &[RawSite],
    aggregation: &Aggregation,
    home: Coordinate,
    radius_km: f64,
) -> Geofiltered {
    let mut out = Geofiltered::default();
    let mut unlocated = 0_usize;

    for site in sites {
        let Some(location) = site_location(site) else {
            unlocated += 1;
            continue;
        };
        let distance_km = distance_m(home, location) / 1000.0;
        if distance_km > radius_km {
            continue;
        }

        let prices = aggregation
            .prices_by_site
            .get(&site.site_id)
            .cloned()
            .unwrap_or_default();
        let mut stats = BTreeMap::new();

        for p in &prices {
            let baseline = aggregation
                .global_cheapest
                .get(&p.fuel_id)
                .map_or(p.price, |c| c.price);
            stats.insert(
                p.fuel_id.clone(),
                SiteFuelStats {
                    qld_delta: round1(p.price - baseline),
                },
            );

            offer_cheapest(&mut out.local_cheapest, &p.fuel_id, p.price, || CheapestEntry {
                price: p.price,
                site_id: site.site_id.clone(),
                name: site.name.clone(),
                address: site.address.clone(),
                postcode: site.postcode.clone(),
                brand_id: None,
                distance_km: Some(round1(distance_km)),
            });
        }

        out.sites.insert(
            site.site_id.clone(),
            FilteredSite {
                name: site.name.clone(),
                address: site.address.clone(),
                postcode: site.postcode.clone(),
                distance_km: round1(distance_km),
                prices,
                stats,
            },
        );
    }

    if unlocated > 0 {
        tracing::debug!(unlocated, "geofilter: skipped sites without coordinates");
    }
    if out.sites.is_empty() {
        tracing::warn!(
            radius_km,
            lat = home.lat,
            lng = home.lng,
            "geofilter: no sites within radius"
        );
    }
    out
}

fn site_location(site: &RawSite) -> Option<Coordinate> {
    let (lat, lng) = site.latitude.zip(site.longitude)?;
    Coordinate::new(lat, lng).ok()
}
