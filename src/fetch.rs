//! Fetching remote images over HTTP(S).

use std::time::Duration;

use tracing::debug;

use crate::error::{Error, Result};

/// Seam between the localizer and the network.
///
/// The pipeline only needs "bytes for a URL", so tests can substitute an
/// in-memory implementation and never touch the network.
pub trait ImageFetcher {
    /// Fetch `url` and return the response body.
    fn fetch(&self, url: &str) -> Result<Vec<u8>>;
}

/// Blocking HTTP(S) fetcher. No authentication, no retries.
pub struct HttpFetcher {
    client: reqwest::blocking::Client,
}

impl HttpFetcher {
    pub fn new() -> Self {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .unwrap_or_else(|_| reqwest::blocking::Client::new());
        Self { client }
    }
}

impl Default for HttpFetcher {
    fn default() -> Self {
        Self::new()
    }
}

impl ImageFetcher for HttpFetcher {
    fn fetch(&self, url: &str) -> Result<Vec<u8>> {
        debug!(%url, "fetching image");
        let response = self.client.get(url).send().map_err(|e| Error::Fetch {
            url: url.to_string(),
            source: e,
        })?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::HttpStatus {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let body = response.bytes().map_err(|e| Error::Fetch {
            url: url.to_string(),
            source: e,
        })?;
        debug!(%url, bytes = body.len(), "image fetched");
        Ok(body.to_vec())
    }
}
