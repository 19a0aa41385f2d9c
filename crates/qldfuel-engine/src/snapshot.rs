//! The immutable result of one successful refresh.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use qldfuel_client::PricePayload;
use qldfuel_core::{Coordinate, IntegrationSettings};
use serde::{Deserialize, Serialize};

use crate::aggregate::aggregate;
use crate::geofilter::geofilter;
use crate::model::{CheapestEntry, CheapestMap, FilteredSite};
use crate::region::RegionIndex;

/// Which cheapest map a lookup targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Scope {
    Global,
    Local,
}

impl Scope {
    pub const ALL: [Scope; 2] = [Scope::Global, Scope::Local];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Global => "global",
            Self::Local => "local",
        }
    }

    /// Human label used in sensor names.
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::Global => "QLD",
            Self::Local => "Local",
        }
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Scope {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "global" | "qld" => Ok(Self::Global),
            "local" => Ok(Self::Local),
            other => Err(format!("unknown scope '{other}' (expected global or local)")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Snapshot {
    pub sites: BTreeMap<String, FilteredSite>,
    pub global_cheapest: CheapestMap,
    pub local_cheapest: CheapestMap,
    #[serde(skip)]
    pub region: RegionIndex,
    /// Settings the snapshot was built with.
    pub settings: IntegrationSettings,
    pub fetched_at: DateTime<Utc>,
}

impl Snapshot {
    /// Runs aggregation and the geofilter over one fetched payload.
    #[must_use]
    pub fn build(
        payload: &PricePayload,
        home: Coordinate,
        settings: IntegrationSettings,
        fetched_at: DateTime<Utc>,
    ) -> Self {
        let aggregation = aggregate(&payload.sites, &payload.prices);
        let local = geofilter(
            &payload.sites,
            &aggregation,
            home,
            f64::from(settings.radius_km()),
        );
        let region = RegionIndex::build(&local.sites);

        Self {
            sites: local.sites,
            global_cheapest: aggregation.global_cheapest,
            local_cheapest: local.local_cheapest,
            region,
            settings,
            fetched_at,
        }
    }

    #[must_use]
    pub fn cheapest(&self, scope: Scope, fuel_id: &str) -> Option<&CheapestEntry> {
        match scope {
            Scope::Global => self.global_cheapest.get(fuel_id),
            Scope::Local => self.local_cheapest.get(fuel_id),
        }
    }

    #[must_use]
    pub fn site(&self, site_id: &str) -> Option<&FilteredSite> {
        self.sites.get(site_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregate::tests::{price, site};

    fn payload() -> PricePayload {
        PricePayload {
            sites: vec![site("near", "Near", 0.0, 0.0), site("far", "Far", 1.0, 0.0)],
            prices: vec![price("near", "12", 1800.0), price("far", "12", 1700.0)],
        }
    }

    #[test]
    fn build_combines_global_and_local_views() {
        let snapshot = Snapshot::build(
            &payload(),
            Coordinate::new(0.0, 0.0).unwrap(),
            IntegrationSettings::default(),
            Utc::now(),
        );

        assert_eq!(snapshot.cheapest(Scope::Global, "12").unwrap().site_id, "far");
        assert_eq!(snapshot.cheapest(Scope::Local, "12").unwrap().site_id, "near");
        assert_eq!(snapshot.site("near").unwrap().qld_delta("12"), Some(10.0));
        assert!(snapshot.site("far").is_none());
        assert_eq!(snapshot.region.cheapest_excluding("12", "near"), None);
    }

    #[test]
    fn scope_parses_and_labels() {
        assert_eq!("QLD".parse::<Scope>().unwrap(), Scope::Global);
        assert_eq!(" local ".parse::<Scope>().unwrap(), Scope::Local);
        assert!("state".parse::<Scope>().is_err());
        assert_eq!(Scope::Global.label(), "QLD");
        assert_eq!(Scope::Local.to_string(), "local");
    }

    #[test]
    fn snapshot_serializes_without_the_region_index() {
        let snapshot = Snapshot::build(
            &payload(),
            Coordinate::new(0.0, 0.0).unwrap(),
            IntegrationSettings::default(),
            Utc::now(),
        );
        let json = serde_json::to_value(&snapshot).unwrap();

        assert!(json.get("region").is_none());
        assert_eq!(json["local_cheapest"]["12"]["price"], 180.0);
        assert_eq!(json["settings"]["radius_km"], 5);
    }
}
