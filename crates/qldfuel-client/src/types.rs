//! Fuel Price Reporting API response types.
//!
//! ## Observed shape
//!
//! `GetFullSiteDetails` wraps sites under `"S"`; each site uses single-letter
//! keys (`S` id, `N` name, `A` address, `P` postcode, `B` brand id) plus
//! `Lat`/`Lng`. `GetSitesPrices` wraps prices under `"SitePrices"` with
//! `SiteId`, `FuelId`, `Price` (tenths of a cent) and `TransactionDateUtc`.
//!
//! Ids arrive as numbers but are treated as opaque strings. Coordinates and
//! postcodes are occasionally strings or `null`; they are parsed leniently so
//! that one odd record never fails a whole refresh. A record that cannot be
//! decoded at all is skipped on its own (see [`decode_records`]).

use serde::de::{DeserializeOwned, Error as _};
use serde::{Deserialize, Deserializer};
use serde_json::Value;

/// A fuel station from the site directory.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RawSite {
    #[serde(rename = "S", deserialize_with = "id")]
    pub site_id: String,
    #[serde(rename = "N", default)]
    pub name: Option<String>,
    #[serde(rename = "A", default)]
    pub address: Option<String>,
    #[serde(rename = "P", default, deserialize_with = "opt_text")]
    pub postcode: Option<String>,
    #[serde(rename = "Lat", default, deserialize_with = "opt_f64")]
    pub latitude: Option<f64>,
    #[serde(rename = "Lng", default, deserialize_with = "opt_f64")]
    pub longitude: Option<f64>,
    #[serde(rename = "B", default, deserialize_with = "opt_text")]
    pub brand_id: Option<String>,
}

/// One site/fuel price as reported by the API, in tenths of a cent.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RawPrice {
    #[serde(rename = "SiteId", deserialize_with = "id")]
    pub site_id: String,
    #[serde(rename = "FuelId", deserialize_with = "id")]
    pub fuel_id: String,
    #[serde(rename = "Price", default, deserialize_with = "opt_f64")]
    pub price: Option<f64>,
    #[serde(rename = "TransactionDateUtc", default)]
    pub transaction_date: Option<String>,
}

/// Envelope for `GetFullSiteDetails`. Records stay as raw JSON until
/// [`decode_records`] runs so a single bad entry can be dropped.
#[derive(Debug, Default, Deserialize)]
pub struct SiteDetailsResponse {
    #[serde(rename = "S", default)]
    pub sites: Vec<Value>,
}

/// Envelope for `GetSitesPrices`.
#[derive(Debug, Default, Deserialize)]
pub struct SitePricesResponse {
    #[serde(rename = "SitePrices", default)]
    pub prices: Vec<Value>,
}

/// The decoded result of one successful fetch of both endpoints.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PricePayload {
    pub sites: Vec<RawSite>,
    pub prices: Vec<RawPrice>,
}

/// Decodes each record independently, dropping the ones that do not match
/// `T`. Returns the decoded records and the number skipped.
pub fn decode_records<T: DeserializeOwned>(records: Vec<Value>) -> (Vec<T>, usize) {
    let total = records.len();
    let decoded: Vec<T> = records
        .into_iter()
        .filter_map(|v| serde_json::from_value::<T>(v).ok())
        .collect();
    let skipped = total - decoded.len();
    (decoded, skipped)
}

fn id<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    match Value::deserialize(deserializer)? {
        Value::String(s) if !s.trim().is_empty() => Ok(s.trim().to_string()),
        Value::Number(n) => Ok(n.to_string()),
        other => Err(D::Error::custom(format!(
            "expected a string or numeric id, got {other}"
        ))),
    }
}

fn opt_text<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<String>, D::Error> {
    Ok(match Value::deserialize(deserializer)? {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    })
}

fn opt_f64<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<f64>, D::Error> {
    let parsed = match Value::deserialize(deserializer)? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    Ok(parsed.filter(|v| v.is_finite()))
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn site_parses_numeric_ids_and_coordinates() {
        let site: RawSite = serde_json::from_value(json!({
            "S": 61_401_007,
            "N": "Shell Coles Express Toowong",
            "A": "120 High St",
            "P": 4066,
            "Lat": -27.4845,
            "Lng": 152.9918,
            "B": 5
        }))
        .unwrap();
        assert_eq!(site.site_id, "61401007");
        assert_eq!(site.postcode.as_deref(), Some("4066"));
        assert_eq!(site.brand_id.as_deref(), Some("5"));
        assert_eq!(site.latitude, Some(-27.4845));
    }

    #[test]
    fn site_parses_string_coordinates() {
        let site: RawSite = serde_json::from_value(json!({
            "S": "7", "Lat": " -27.5 ", "Lng": "153.1"
        }))
        .unwrap();
        assert_eq!(site.latitude, Some(-27.5));
        assert_eq!(site.longitude, Some(153.1));
    }

    #[test]
    fn site_tolerates_garbage_coordinates() {
        let site: RawSite = serde_json::from_value(json!({
            "S": 8, "N": "No Coords", "Lat": "n/a", "Lng": null
        }))
        .unwrap();
        assert_eq!(site.latitude, None);
        assert_eq!(site.longitude, None);
        assert_eq!(site.address, None);
    }

    #[test]
    fn price_accepts_null_price() {
        let price: RawPrice = serde_json::from_value(json!({
            "SiteId": 1, "FuelId": 12, "Price": null
        }))
        .unwrap();
        assert_eq!(price.price, None);
        assert_eq!(price.fuel_id, "12");
    }

    #[test]
    fn price_requires_site_and_fuel() {
        let result = serde_json::from_value::<RawPrice>(json!({ "Price": 1899 }));
        assert!(result.is_err());
    }

    #[test]
    fn decode_records_skips_bad_entries() {
        let (prices, skipped) = decode_records::<RawPrice>(vec![
            json!({ "SiteId": 1, "FuelId": 2, "Price": 1899 }),
            json!({ "SiteId": null, "FuelId": 2, "Price": 1899 }),
            json!("not an object"),
        ]);
        assert_eq!(prices.len(), 1);
        assert_eq!(skipped, 2);
    }

    #[test]
    fn envelopes_default_to_empty_when_key_missing() {
        let sites: SiteDetailsResponse = serde_json::from_value(json!({})).unwrap();
        let prices: SitePricesResponse = serde_json::from_value(json!({})).unwrap();
        assert!(sites.sites.is_empty());
        assert!(prices.prices.is_empty());
    }
}
