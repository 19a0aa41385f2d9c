use thiserror::Error;

/// Longest slice of an error response body kept in [`FuelApiError::UnexpectedStatus`].
const MAX_ERROR_BODY_CHARS: usize = 512;

/// Errors returned by the fuel price API client.
#[derive(Debug, Error)]
pub enum FuelApiError {
    /// Network or TLS failure from the underlying HTTP client.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The API answered with anything other than `200 OK`.
    #[error("API Error {status}: {body}")]
    UnexpectedStatus {
        status: u16,
        url: String,
        body: String,
    },

    /// The combined fetch did not finish inside its deadline.
    #[error("fetch deadline of {secs}s exceeded")]
    Timeout { secs: u64 },

    /// The response body could not be deserialized into the expected type.
    #[error("JSON deserialization error for {context}: {source}")]
    Deserialize {
        context: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid base URL: {0}")]
    InvalidBaseUrl(String),
}

impl FuelApiError {
    pub(crate) fn unexpected_status(status: u16, url: &str, body: &str) -> Self {
        let body = match body.char_indices().nth(MAX_ERROR_BODY_CHARS) {
            Some((idx, _)) => format!("{}…", &body[..idx]),
            None => body.to_string(),
        };
        Self::UnexpectedStatus {
            status,
            url: url.to_string(),
            body,
        }
    }
}
