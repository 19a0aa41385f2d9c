//! Fuel-type catalog published by the Queensland Fuel Price Reporting API.
//!
//! The API identifies fuels by numeric id. Only the eight ids below can be
//! selected for tracking; prices for any other id still flow through the
//! aggregation pipeline but never get a sensor.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::ConfigError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum FuelType {
    E10,
    Unleaded91,
    Unleaded95,
    Unleaded98,
    Diesel,
    PremiumDiesel,
    Lpg,
    E85,
}

impl FuelType {
    /// Every selectable fuel, in the order the catalog lists them.
    pub const ALL: [FuelType; 8] = [
        FuelType::E10,
        FuelType::Unleaded91,
        FuelType::Unleaded95,
        FuelType::Unleaded98,
        FuelType::Diesel,
        FuelType::PremiumDiesel,
        FuelType::Lpg,
        FuelType::E85,
    ];

    /// Fuels selected when the operator does not choose any.
    pub const DEFAULT_SELECTION: [FuelType; 3] =
        [FuelType::E10, FuelType::Unleaded95, FuelType::Diesel];

    /// The API's `FuelId` for this fuel.
    #[must_use]
    pub fn id(self) -> &'static str {
        match self {
            FuelType::E10 => "12",
            FuelType::Unleaded91 => "2",
            FuelType::Unleaded95 => "5",
            FuelType::Unleaded98 => "8",
            FuelType::Diesel => "3",
            FuelType::PremiumDiesel => "14",
            FuelType::Lpg => "4",
            FuelType::E85 => "19",
        }
    }

    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            FuelType::E10 => "E10",
            FuelType::Unleaded91 => "Unleaded 91",
            FuelType::Unleaded95 => "Unleaded 95",
            FuelType::Unleaded98 => "Unleaded 98",
            FuelType::Diesel => "Diesel",
            FuelType::PremiumDiesel => "Premium Diesel",
            FuelType::Lpg => "LPG",
            FuelType::E85 => "E85",
        }
    }

    /// Look up a catalog entry by its API id. Returns `None` for ids outside
    /// the catalog.
    #[must_use]
    pub fn from_id(id: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|f| f.id() == id.trim())
    }
}

impl fmt::Display for FuelType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for FuelType {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_id(s).ok_or_else(|| ConfigError::InvalidSetting {
            field: "fuel_types".to_string(),
            reason: format!("unknown fuel id \"{s}\""),
        })
    }
}

impl TryFrom<String> for FuelType {
    type Error = ConfigError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<FuelType> for String {
    fn from(value: FuelType) -> Self {
        value.id().to_string()
    }
}

/// Parse a comma-separated list of fuel ids (e.g. `"12,5,3"`).
///
/// Duplicates are dropped while keeping first-seen order; blank entries are
/// ignored.
///
/// # Errors
///
/// Returns [`ConfigError::InvalidSetting`] for any id outside the catalog or
/// when the list is empty.
pub fn parse_fuel_list(raw: &str) -> Result<Vec<FuelType>, ConfigError> {
    let mut fuels: Vec<FuelType> = Vec::new();
    for part in raw.split(',').map(str::trim).filter(|p| !p.is_empty()) {
        let fuel: FuelType = part.parse()?;
        if !fuels.contains(&fuel) {
            fuels.push(fuel);
        }
    }
    if fuels.is_empty() {
        return Err(ConfigError::InvalidSetting {
            field: "fuel_types".to_string(),
            reason: "at least one fuel type must be selected".to_string(),
        });
    }
    Ok(fuels)
}
