//! Shared construction of outbound HTTP clients

use reqwest::{Client, header};

use crate::config::HttpConfig;
use crate::error::{Result, SyncError};

/// Build a client carrying the configured user agent, timeout and any extra default headers.
pub fn build_client(config: &HttpConfig, extra_headers: header::HeaderMap) -> Result<Client> {
    let mut headers = extra_headers;
    let user_agent = header::HeaderValue::from_str(&config.user_agent).map_err(|e| {
        SyncError::Configuration(format!("invalid user agent {:?}: {}", config.user_agent, e))
    })?;
    headers.insert(header::USER_AGENT, user_agent);

    Client::builder()
        .default_headers(headers)
        .timeout(config.http_timeout)
        .gzip(true)
        .build()
        .map_err(|e| SyncError::Configuration(format!("failed to build HTTP client: {}", e)))
}

/// Status code to report for a transport-level failure (0 when no response arrived)
pub(crate) fn transport_status(err: &reqwest::Error) -> u16 {
    err.status().map(|s| s.as_u16()).unwrap_or(0)
}
