pub mod app_config;
pub mod config;
pub mod fuel;
pub mod geo;
pub mod settings;

pub use app_config::{AppConfig, Environment};
pub use config::{load_app_config, load_app_config_from_env, DEFAULT_API_BASE_URL};
pub use fuel::{parse_fuel_list, FuelType};
pub use geo::{distance_m, round1, Coordinate};
pub use settings::IntegrationSettings;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("invalid value for {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },

    #[error("invalid setting {field}: {reason}")]
    InvalidSetting { field: String, reason: String },
}
