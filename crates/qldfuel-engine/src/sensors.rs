//! Sensor presentation model over published snapshots.
//!
//! A [`FuelPriceSensor`] exists per (site, tracked fuel) pair that has a
//! price in the snapshot, and a [`BestPriceSensor`] per tracked fuel and
//! [`Scope`]. [`SensorHub`] keeps the set in step with each published
//! snapshot and fans out history updates.

use std::collections::BTreeMap;
use std::sync::{Arc, PoisonError, RwLock};

use chrono::Utc;
use qldfuel_core::{round1, FuelType};
use serde::Serialize;
use tokio::sync::broadcast::{self, error::RecvError};
use tokio::task::JoinHandle;

use crate::coordinator::CoordinatorEvent;
use crate::history::{HistoryStore, HistoryTracker, HistoryUpdate};
use crate::model::{is_valid_price, join_address};
use crate::shutdown::ShutdownFlag;
use crate::snapshot::{Scope, Snapshot};

pub const PRICE_UNIT: &str = "¢/L";

/// Recorded state for a sensor without a usable price.
const UNAVAILABLE: &str = "unavailable";

#[derive(Debug)]
pub struct FuelPriceSensor {
    unique_id: String,
    name: String,
    site_id: String,
    fuel: FuelType,
    history: HistoryTracker,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FuelPriceReading {
    pub unique_id: String,
    pub name: String,
    pub site_id: String,
    pub fuel_id: String,
    pub price: Option<f64>,
    pub available: bool,
    pub unit: &'static str,
    pub attributes: FuelPriceAttributes,
}

/// Comparison figures for a fuel price sensor, all in cents per litre
/// except distance and ages. Rolling statistics appear once computed.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FuelPriceAttributes {
    pub difference_to_qld_cheapest: f64,
    pub difference_to_region_cheapest: f64,
    pub address: String,
    pub distance_km: Option<f64>,
    pub fuel_id: String,
    #[serde(rename = "7_day_low", skip_serializing_if = "Option::is_none")]
    pub seven_day_low: Option<f64>,
    #[serde(rename = "7_day_low_difference", skip_serializing_if = "Option::is_none")]
    pub seven_day_low_difference: Option<f64>,
    #[serde(rename = "14_day_low", skip_serializing_if = "Option::is_none")]
    pub fourteen_day_low: Option<f64>,
    #[serde(rename = "14_day_low_difference", skip_serializing_if = "Option::is_none")]
    pub fourteen_day_low_difference: Option<f64>,
    #[serde(rename = "7_day_average", skip_serializing_if = "Option::is_none")]
    pub seven_day_average: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub difference_to_7_day_average: Option<f64>,
    #[serde(rename = "14_day_average", skip_serializing_if = "Option::is_none")]
    pub fourteen_day_average: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub difference_to_14_day_average: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub days_since_7_day_low: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub days_since_14_day_low: Option<i64>,
}

impl FuelPriceSensor {
    #[must_use]
    pub fn new(site_id: &str, fuel: FuelType, site_name: Option<&str>) -> Self {
        let unique_id = format!("{}_{site_id}", fuel.id());
        Self {
            name: format!("{} {}", site_name.unwrap_or("Unknown"), fuel.label()),
            history: HistoryTracker::new(unique_id.clone()),
            unique_id,
            site_id: site_id.to_string(),
            fuel,
        }
    }

    #[must_use]
    pub fn unique_id(&self) -> &str {
        &self.unique_id
    }

    #[must_use]
    pub fn site_id(&self) -> &str {
        &self.site_id
    }

    #[must_use]
    pub fn fuel(&self) -> FuelType {
        self.fuel
    }

    #[must_use]
    pub fn history(&self) -> &HistoryTracker {
        &self.history
    }

    #[must_use]
    pub fn native_value(&self, snapshot: &Snapshot) -> Option<f64> {
        snapshot.site(&self.site_id)?.price_for(self.fuel.id())
    }

    #[must_use]
    pub fn available(&self, snapshot: &Snapshot) -> bool {
        self.native_value(snapshot).is_some_and(is_valid_price)
    }

    #[must_use]
    pub fn reading(&self, snapshot: &Snapshot) -> FuelPriceReading {
        let price = self.native_value(snapshot);
        FuelPriceReading {
            unique_id: self.unique_id.clone(),
            name: self.name.clone(),
            site_id: self.site_id.clone(),
            fuel_id: self.fuel.id().to_string(),
            price,
            available: price.is_some_and(is_valid_price),
            unit: PRICE_UNIT,
            attributes: self.attributes(snapshot, price.unwrap_or(0.0)),
        }
    }

    fn attributes(&self, snapshot: &Snapshot, current: f64) -> FuelPriceAttributes {
        let fuel_id = self.fuel.id();
        let site = snapshot.site(&self.site_id);
        let stats = self.history.stats();
        let diff = |baseline: f64| round1(current - baseline);

        let seven = stats.seven_day;
        let fourteen = stats.fourteen_day;

        FuelPriceAttributes {
            difference_to_qld_cheapest: site.and_then(|s| s.qld_delta(fuel_id)).unwrap_or(0.0),
            difference_to_region_cheapest: snapshot
                .region
                .cheapest_excluding(fuel_id, &self.site_id)
                .map_or(0.0, diff),
            address: site.map(|s| s.display_address()).unwrap_or_default(),
            distance_km: site.map(|s| s.distance_km),
            fuel_id: fuel_id.to_string(),
            seven_day_low: seven.map(|w| w.low),
            seven_day_low_difference: seven.map(|w| diff(w.low)),
            fourteen_day_low: fourteen.map(|w| w.low),
            fourteen_day_low_difference: fourteen.map(|w| diff(w.low)),
            seven_day_average: seven.map(|w| w.average),
            difference_to_7_day_average: seven.map(|w| diff(w.average)),
            fourteen_day_average: fourteen.map(|w| w.average),
            difference_to_14_day_average: fourteen.map(|w| diff(w.average)),
            days_since_7_day_low: seven.map(|w| w.low_age_days),
            days_since_14_day_low: fourteen.map(|w| w.low_age_days),
        }
    }

    /// State string as a recorder would store it.
    fn recorded_state(&self, snapshot: &Snapshot) -> String {
        match self.native_value(snapshot) {
            Some(price) if is_valid_price(price) => price.to_string(),
            _ => UNAVAILABLE.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BestPriceSensor {
    unique_id: String,
    name: String,
    fuel: FuelType,
    scope: Scope,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BestPriceReading {
    pub unique_id: String,
    pub name: String,
    pub fuel_id: String,
    pub scope: Scope,
    pub price: Option<f64>,
    pub unit: &'static str,
    pub station_name: Option<String>,
    pub site_id: Option<String>,
    pub address: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub distance_km: Option<f64>,
}

impl BestPriceSensor {
    #[must_use]
    pub fn new(fuel: FuelType, scope: Scope) -> Self {
        Self {
            unique_id: format!("best_price_{scope}_{}", fuel.id()),
            name: format!("Best {} ({})", fuel.label(), scope.label()),
            fuel,
            scope,
        }
    }

    #[must_use]
    pub fn unique_id(&self) -> &str {
        &self.unique_id
    }

    #[must_use]
    pub fn reading(&self, snapshot: &Snapshot) -> BestPriceReading {
        let entry = snapshot.cheapest(self.scope, self.fuel.id());
        BestPriceReading {
            unique_id: self.unique_id.clone(),
            name: self.name.clone(),
            fuel_id: self.fuel.id().to_string(),
            scope: self.scope,
            price: entry.map(|e| e.price),
            unit: PRICE_UNIT,
            station_name: entry.and_then(|e| e.name.clone()),
            site_id: entry.map(|e| e.site_id.clone()),
            address: entry.map(|e| join_address(e.address.as_deref(), e.postcode.as_deref())),
            distance_km: entry.and_then(|e| e.distance_km),
        }
    }
}

/// Unique ids added and removed by one [`SensorRegistry::sync`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncReport {
    pub added: Vec<String>,
    pub removed: Vec<String>,
}

impl SyncReport {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty()
    }
}

#[derive(Debug, Default)]
pub struct SensorRegistry {
    fuel: BTreeMap<String, Arc<FuelPriceSensor>>,
    best: BTreeMap<String, BestPriceSensor>,
}

impl SensorRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Brings the sensor set in line with `snapshot` and the fuels it was
    /// built for. Sensors that survive keep their history.
    pub fn sync(&mut self, snapshot: &Snapshot) -> SyncReport {
        let fuels = snapshot.settings.fuel_types();
        let mut report = SyncReport::default();

        let mut wanted: BTreeMap<String, (&str, FuelType, Option<&str>)> = BTreeMap::new();
        for (site_id, site) in &snapshot.sites {
            for p in &site.prices {
                let Some(fuel) = FuelType::from_id(&p.fuel_id) else {
                    continue;
                };
                if fuels.contains(&fuel) {
                    wanted
                        .entry(format!("{}_{site_id}", fuel.id()))
                        .or_insert((site_id.as_str(), fuel, site.name.as_deref()));
                }
            }
        }

        self.fuel.retain(|id, _| {
            let keep = wanted.contains_key(id);
            if !keep {
                report.removed.push(id.clone());
            }
            keep
        });
        for (id, (site_id, fuel, name)) in wanted {
            if !self.fuel.contains_key(&id) {
                self.fuel
                    .insert(id.clone(), Arc::new(FuelPriceSensor::new(site_id, fuel, name)));
                report.added.push(id);
            }
        }

        let best_wanted: BTreeMap<String, BestPriceSensor> = fuels
            .iter()
            .flat_map(|fuel| Scope::ALL.map(|scope| BestPriceSensor::new(*fuel, scope)))
            .map(|sensor| (sensor.unique_id.clone(), sensor))
            .collect();
        report.removed.extend(
            self.best
                .keys()
                .filter(|id| !best_wanted.contains_key(*id))
                .cloned(),
        );
        report.added.extend(
            best_wanted
                .keys()
                .filter(|id| !self.best.contains_key(*id))
                .cloned(),
        );
        self.best = best_wanted;

        report
    }

    pub fn fuel_sensors(&self) -> impl Iterator<Item = &Arc<FuelPriceSensor>> {
        self.fuel.values()
    }

    pub fn best_price_sensors(&self) -> impl Iterator<Item = &BestPriceSensor> {
        self.best.values()
    }

    #[must_use]
    pub fn get(&self, unique_id: &str) -> Option<&Arc<FuelPriceSensor>> {
        self.fuel.get(unique_id)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.fuel.len() + self.best.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Owns the sensor registry and the history store, and reacts to
/// coordinator events.
pub struct SensorHub {
    registry: RwLock<SensorRegistry>,
    store: Arc<dyn HistoryStore>,
    shutdown: ShutdownFlag,
}

impl SensorHub {
    #[must_use]
    pub fn new(store: Arc<dyn HistoryStore>, shutdown: ShutdownFlag) -> Self {
        Self {
            registry: RwLock::new(SensorRegistry::new()),
            store,
            shutdown,
        }
    }

    /// Syncs the registry with `snapshot`, offers each sensor's state to the
    /// store and spawns one history update per fuel price sensor.
    pub fn apply(&self, snapshot: &Snapshot) -> Vec<JoinHandle<HistoryUpdate>> {
        let sensors: Vec<Arc<FuelPriceSensor>> = {
            let mut registry = self.registry.write().unwrap_or_else(PoisonError::into_inner);
            let report = registry.sync(snapshot);
            if !report.is_empty() {
                tracing::debug!(
                    added = report.added.len(),
                    removed = report.removed.len(),
                    total = registry.len(),
                    "sensors: registry synced"
                );
            }
            registry.fuel_sensors().cloned().collect()
        };

        for sensor in &sensors {
            self.store.observe(
                sensor.unique_id(),
                Some(sensor.recorded_state(snapshot)),
                snapshot.fetched_at,
            );
        }

        sensors
            .into_iter()
            .map(|sensor| {
                let store = Arc::clone(&self.store);
                let shutdown = self.shutdown.clone();
                tokio::spawn(async move {
                    sensor
                        .history()
                        .update(store.as_ref(), Utc::now(), &shutdown)
                        .await
                })
            })
            .collect()
    }

    /// Applies every published snapshot until the channel closes.
    pub async fn run(self: Arc<Self>, mut events: broadcast::Receiver<CoordinatorEvent>) {
        loop {
            match events.recv().await {
                Ok(CoordinatorEvent::Updated(snapshot)) => {
                    drop(self.apply(&snapshot));
                }
                Ok(CoordinatorEvent::UpdateFailed { reason }) => {
                    tracing::debug!(reason = %reason, "sensors: update failed, keeping readings");
                }
                Err(RecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, "sensors: lagged behind coordinator events");
                }
                Err(RecvError::Closed) => break,
            }
        }
        tracing::debug!("sensors: event channel closed");
    }

    #[must_use]
    pub fn fuel_readings(&self, snapshot: &Snapshot) -> Vec<FuelPriceReading> {
        self.registry
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .fuel_sensors()
            .map(|s| s.reading(snapshot))
            .collect()
    }

    #[must_use]
    pub fn best_price_readings(&self, snapshot: &Snapshot) -> Vec<BestPriceReading> {
        self.registry
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .best_price_sensors()
            .map(|s| s.reading(snapshot))
            .collect()
    }

    #[must_use]
    pub fn sensor_count(&self) -> usize {
        self.registry
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}

#[cfg(test)]
#[path = "sensors_test.rs"]
mod tests;
