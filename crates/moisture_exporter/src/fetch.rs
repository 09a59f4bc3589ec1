use std::time::Duration;

use async_trait::async_trait;
use reqwest::StatusCode;

use crate::config::DeviceConfig;

/// Path on the device that serves every pump and sensor in one document
pub const RESOURCES_PATH: &str = "/allResources";

#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("Request to {url} failed: {source}")]
    Request {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("Device at {url} answered with status {status}")]
    Status { url: String, status: StatusCode },
}

/// Somewhere a raw resource document can be pulled from.
///
/// This trait allows the scrape pipeline to be driven without a real device
/// for testing purposes.
#[async_trait]
pub trait ResourceSource: Send + Sync {
    /// Fetch the raw `/allResources` body
    async fn fetch(&self) -> Result<Vec<u8>, FetchError>;
}

/// Pulls resources from the device over plain HTTP.
///
/// One GET per call and no retries. Without a configured timeout the
/// transport default applies.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: reqwest::Client,
    url: String,
}

impl HttpFetcher {
    pub fn new(config: &DeviceConfig) -> Result<Self, FetchError> {
        let url = resources_url(&config.address);

        // The device lives on the local network
        let mut builder = reqwest::Client::builder().no_proxy();
        if let Some(secs) = config.timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }
        let client = builder.build().map_err(|source| FetchError::Request {
            url: url.clone(),
            source,
        })?;

        Ok(Self { client, url })
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl ResourceSource for HttpFetcher {
    #[tracing::instrument(skip(self), fields(url = %self.url))]
    async fn fetch(&self) -> Result<Vec<u8>, FetchError> {
        let request_error = |source: reqwest::Error| FetchError::Request {
            url: self.url.clone(),
            source,
        };

        let response = self
            .client
            .get(&self.url)
            .send()
            .await
            .map_err(request_error)?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                url: self.url.clone(),
                status,
            });
        }

        let body = response.bytes().await.map_err(request_error)?;
        tracing::trace!(bytes = body.len(), "Fetched resources");

        Ok(body.to_vec())
    }
}

/// Build the resource URL for a device given as `host` or `host:port`
pub fn resources_url(address: &str) -> String {
    format!("http://{}{}", address, RESOURCES_PATH)
}
