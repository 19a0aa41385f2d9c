//! Aggregation, geofiltering, refresh orchestration and historical
//! statistics for Queensland fuel prices.

pub mod aggregate;
pub mod coordinator;
pub mod geofilter;
pub mod history;
pub mod model;
pub mod region;
pub mod sensors;
pub mod shutdown;
pub mod snapshot;

pub use aggregate::{aggregate, Aggregation};
pub use coordinator::{
    Coordinator, CoordinatorError, CoordinatorEvent, CoordinatorStatus, PriceSource, RefreshError,
};
pub use geofilter::{geofilter, Geofiltered};
pub use history::{
    compute_stats, HistoricalStats, HistoryError, HistorySample, HistoryStore, HistoryTracker,
    HistoryUpdate, MemoryHistoryStore, WindowStats,
};
pub use model::{
    is_valid_price, normalize_price, CheapestEntry, CheapestMap, FilteredSite, SiteFuelStats,
    SitePrice, MAX_VALID_PRICE,
};
pub use region::RegionIndex;
pub use sensors::{
    BestPriceReading, BestPriceSensor, FuelPriceAttributes, FuelPriceReading, FuelPriceSensor,
    SensorHub, SensorRegistry, SyncReport, PRICE_UNIT,
};
pub use shutdown::ShutdownFlag;
pub use snapshot::{Scope, Snapshot};
