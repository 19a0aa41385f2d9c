//! HTTP client for the Queensland Fuel Price Reporting API.
//!
//! Wraps `reqwest` with subscriber-token auth, a single deadline covering
//! both endpoint requests, and typed response decoding. Any non-200 answer
//! fails the whole fetch; there is no partial result.

use std::time::Duration;

use reqwest::header::AUTHORIZATION;
use reqwest::{Client, StatusCode, Url};
use serde::de::DeserializeOwned;

use crate::error::FuelApiError;
use crate::types::{
    decode_records, PricePayload, RawPrice, RawSite, SiteDetailsResponse, SitePricesResponse,
};

const DEFAULT_BASE_URL: &str = "https://fppdirectapi-prod.fuelpricesqld.com.au";

const SITES_PATH: &str = "Subscriber/GetFullSiteDetails";
const PRICES_PATH: &str = "Price/GetSitesPrices";

/// Queensland, whole-of-state region.
const REGION_QUERY: [(&str, &str); 3] = [
    ("countryId", "21"),
    ("geoRegionLevel", "3"),
    ("geoRegionId", "1"),
];

/// Client for the fuel price API.
///
/// Use [`FuelPriceClient::new`] for production or
/// [`FuelPriceClient::with_base_url`] to point at a mock server in tests.
pub struct FuelPriceClient {
    client: Client,
    auth_header: String,
    has_token: bool,
    base_url: Url,
    deadline: Duration,
}

impl FuelPriceClient {
    /// Creates a new client pointed at the production API.
    ///
    /// `deadline_secs` bounds the whole [`FuelPriceClient::fetch_all`]
    /// operation, not each request.
    ///
    /// # Errors
    ///
    /// Returns [`FuelApiError::Http`] if the underlying `reqwest::Client`
    /// cannot be constructed.
    pub fn new(token: &str, deadline_secs: u64) -> Result<Self, FuelApiError> {
        Self::with_base_url(token, deadline_secs, DEFAULT_BASE_URL)
    }

    /// Creates a new client with a custom base URL (for testing with wiremock).
    ///
    /// # Errors
    ///
    /// Returns [`FuelApiError::Http`] if the underlying `reqwest::Client`
    /// cannot be constructed, or [`FuelApiError::InvalidBaseUrl`] if
    /// `base_url` does not parse.
    pub fn with_base_url(
        token: &str,
        deadline_secs: u64,
        base_url: &str,
    ) -> Result<Self, FuelApiError> {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .user_agent("qldfuel/0.1 (fuel-price-tracking)")
            .build()?;

        // Exactly one trailing slash, so joining a relative path appends to
        // the base instead of replacing its last segment.
        let normalised = format!("{}/", base_url.trim_end_matches('/'));
        let base_url = Url::parse(&normalised)
            .map_err(|e| FuelApiError::InvalidBaseUrl(format!("'{base_url}': {e}")))?;

        Ok(Self {
            client,
            auth_header: auth_header_value(token),
            has_token: !token.trim().is_empty(),
            base_url,
            deadline: Duration::from_secs(deadline_secs),
        })
    }

    /// Whether a non-blank subscriber token was supplied.
    #[must_use]
    pub fn has_token(&self) -> bool {
        self.has_token
    }

    /// Fetches the site directory and the site price list concurrently.
    ///
    /// The deadline covers both requests and record decoding. Aggregation
    /// and geofiltering run afterwards in the engine, outside it; they are
    /// synchronous and bounded by the payload size.
    ///
    /// # Errors
    ///
    /// - [`FuelApiError::UnexpectedStatus`] if either endpoint answers with a
    ///   status other than 200.
    /// - [`FuelApiError::Timeout`] if both requests have not completed within
    ///   the client's deadline.
    /// - [`FuelApiError::Http`] on network failure.
    /// - [`FuelApiError::Deserialize`] if a body is not the expected JSON.
    pub async fn fetch_all(&self) -> Result<PricePayload, FuelApiError> {
        let secs = self.deadline.as_secs();
        tokio::time::timeout(self.deadline, self.fetch_both())
            .await
            .map_err(|_| FuelApiError::Timeout { secs })?
    }

    async fn fetch_both(&self) -> Result<PricePayload, FuelApiError> {
        let sites_url = self.endpoint(SITES_PATH)?;
        let prices_url = self.endpoint(PRICES_PATH)?;

        let (sites, prices) = tokio::try_join!(
            self.request_json::<SiteDetailsResponse>(&sites_url),
            self.request_json::<SitePricesResponse>(&prices_url),
        )?;

        let (sites, skipped_sites) = decode_records::<RawSite>(sites.sites);
        let (prices, skipped_prices) = decode_records::<RawPrice>(prices.prices);
        if skipped_sites > 0 || skipped_prices > 0 {
            tracing::debug!(
                skipped_sites,
                skipped_prices,
                "fuel api: dropped undecodable records"
            );
        }
        tracing::debug!(
            sites = sites.len(),
            prices = prices.len(),
            "fuel api: fetch complete"
        );

        Ok(PricePayload { sites, prices })
    }

    /// Builds the full URL for `path` with the fixed region query.
    fn endpoint(&self, path: &str) -> Result<Url, FuelApiError> {
        let mut url = self
            .base_url
            .join(path)
            .map_err(|e| FuelApiError::InvalidBaseUrl(format!("'{path}': {e}")))?;
        {
            let mut pairs = url.query_pairs_mut();
            for (k, v) in REGION_QUERY {
                pairs.append_pair(k, v);
            }
        }
        Ok(url)
    }

    /// Sends an authorised GET, requires `200 OK`, and decodes the body.
    async fn request_json<T: DeserializeOwned>(&self, url: &Url) -> Result<T, FuelApiError> {
        let response = self
            .client
            .get(url.clone())
            .header(AUTHORIZATION, &self.auth_header)
            .send()
            .await?;
        let status = response.status();
        let body = response.text().await?;

        if status != StatusCode::OK {
            return Err(FuelApiError::unexpected_status(
                status.as_u16(),
                url.as_str(),
                &body,
            ));
        }

        serde_json::from_str(&body).map_err(|e| FuelApiError::Deserialize {
            context: url.path().to_string(),
            source: e,
        })
    }
}

fn auth_header_value(token: &str) -> String {
    format!("FPDAPI SubscriberToken={token}")
}

#[cfg(test)]
#[path = "client_test.rs"]
mod tests;
