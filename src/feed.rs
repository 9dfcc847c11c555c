//! Feed client implementation

use async_trait::async_trait;
use serde::Deserialize;
use tracing::debug;

use crate::{config::FeedConfig, errors::FetchError, models::RawAircraft};

/// Source of full aircraft snapshots
///
/// One call is one retrieval, no retries. Order of the returned records is
/// not stable between calls.
#[async_trait]
pub trait FeedSource: Send + Sync {
    async fn fetch_snapshot(&self) -> Result<Vec<RawAircraft>, FetchError>;
}

/// Snapshot document returned by the feed
#[derive(Debug, Deserialize)]
struct AircraftList {
    #[serde(rename = "acList")]
    ac_list: Vec<RawAircraft>,
}

/// HTTP client for the aircraft feed
#[derive(Debug, Clone)]
pub struct FeedClient {
    http_client: reqwest::Client,
    url: String,
}

impl FeedClient {
    /// Create a new feed client
    pub fn new(config: &FeedConfig) -> Result<Self, FetchError> {
        let http_client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()?;

        Ok(Self {
            http_client,
            url: config.url.clone(),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    fn parse_snapshot(payload: &[u8]) -> Result<Vec<RawAircraft>, FetchError> {
        let list: AircraftList = serde_json::from_slice(payload)?;
        Ok(list.ac_list)
    }
}

#[async_trait]
impl FeedSource for FeedClient {
    async fn fetch_snapshot(&self) -> Result<Vec<RawAircraft>, FetchError> {
        let response = self.http_client.get(&self.url).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status(status));
        }

        let body = response.bytes().await?;
        let snapshot = Self::parse_snapshot(&body)?;
        debug!(url = %self.url, count = snapshot.len(), "Fetched snapshot");
        Ok(snapshot)
    }
}
