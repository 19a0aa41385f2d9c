//! The reconfigurable part of the integration: radius, tracked fuels and
//! polling interval. The subscriber token lives in [`crate::AppConfig`] and
//! is never part of a reconfiguration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::fuel::FuelType;
use crate::ConfigError;

pub const MIN_RADIUS_KM: u32 = 1;
pub const MAX_RADIUS_KM: u32 = 100;
pub const DEFAULT_RADIUS_KM: u32 = 5;

pub const MIN_SCAN_INTERVAL_HOURS: u32 = 1;
pub const MAX_SCAN_INTERVAL_HOURS: u32 = 24;
pub const DEFAULT_SCAN_INTERVAL_HOURS: u32 = 6;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawSettings")]
pub struct IntegrationSettings {
    radius_km: u32,
    fuel_types: Vec<FuelType>,
    scan_interval_hours: u32,
}

/// Unvalidated wire form, used so that deserialization goes through
/// [`IntegrationSettings::new`].
#[derive(Deserialize)]
struct RawSettings {
    radius_km: u32,
    fuel_types: Vec<FuelType>,
    scan_interval_hours: u32,
}

impl TryFrom<RawSettings> for IntegrationSettings {
    type Error = ConfigError;

    fn try_from(raw: RawSettings) -> Result<Self, Self::Error> {
        Self::new(raw.radius_km, raw.fuel_types, raw.scan_interval_hours)
    }
}

impl IntegrationSettings {
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidSetting`] if the radius is outside
    /// 1–100 km, the interval is outside 1–24 hours, or no fuel is selected.
    pub fn new(
        radius_km: u32,
        mut fuel_types: Vec<FuelType>,
        scan_interval_hours: u32,
    ) -> Result<Self, ConfigError> {
        if !(MIN_RADIUS_KM..=MAX_RADIUS_KM).contains(&radius_km) {
            return Err(ConfigError::InvalidSetting {
                field: "radius_km".to_string(),
                reason: format!("{radius_km} is outside {MIN_RADIUS_KM}-{MAX_RADIUS_KM} km"),
            });
        }
        if !(MIN_SCAN_INTERVAL_HOURS..=MAX_SCAN_INTERVAL_HOURS).contains(&scan_interval_hours) {
            return Err(ConfigError::InvalidSetting {
                field: "scan_interval_hours".to_string(),
                reason: format!(
                    "{scan_interval_hours} is outside \
                     {MIN_SCAN_INTERVAL_HOURS}-{MAX_SCAN_INTERVAL_HOURS} hours"
                ),
            });
        }
        let mut seen = Vec::with_capacity(fuel_types.len());
        fuel_types.retain(|f| {
            if seen.contains(f) {
                false
            } else {
                seen.push(*f);
                true
            }
        });
        if fuel_types.is_empty() {
            return Err(ConfigError::InvalidSetting {
                field: "fuel_types".to_string(),
                reason: "at least one fuel type must be selected".to_string(),
            });
        }
        Ok(Self {
            radius_km,
            fuel_types,
            scan_interval_hours,
        })
    }

    #[must_use]
    pub fn radius_km(&self) -> u32 {
        self.radius_km
    }

    #[must_use]
    pub fn fuel_types(&self) -> &[FuelType] {
        &self.fuel_types
    }

    #[must_use]
    pub fn scan_interval_hours(&self) -> u32 {
        self.scan_interval_hours
    }

    #[must_use]
    pub fn scan_interval(&self) -> Duration {
        Duration::from_secs(u64::from(self.scan_interval_hours) * 3600)
    }

    #[must_use]
    pub fn tracks(&self, fuel: FuelType) -> bool {
        self.fuel_types.contains(&fuel)
    }
}

impl Default for IntegrationSettings {
    fn default() -> Self {
        Self {
            radius_km: DEFAULT_RADIUS_KM,
            fuel_types: FuelType::DEFAULT_SELECTION.to_vec(),
            scan_interval_hours: DEFAULT_SCAN_INTERVAL_HOURS,
        }
    }
}
