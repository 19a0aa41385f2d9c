pub mod client;
pub mod error;
pub mod types;

pub use client::FuelPriceClient;
pub use error::FuelApiError;
pub use types::{PricePayload, RawPrice, RawSite};
