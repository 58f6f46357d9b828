//! Dexscreener REST client

use std::time::Duration;

use serde::de::DeserializeOwned;
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, warn};
use url::Url;

use super::messages::{CandlesResponse, SearchResponse};
use crate::config;
use crate::models::{Candle, CandleSeries};
use crate::services::market_data::MarketDataProvider;

#[derive(Debug, Error)]
pub enum DexError {
    #[error("failed to build HTTP client: {0}")]
    Client(#[source] reqwest::Error),

    #[error("invalid base URL {0}")]
    BaseUrl(String),

    #[error("invalid upstream URL: {0}")]
    Url(#[from] url::ParseError),

    #[error("request to {url} failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("upstream HTTP {status} for {url}")]
    Status { status: u16, url: String },

    #[error("invalid upstream payload from {url}: {reason}")]
    InvalidPayload { url: String, reason: String },
}

pub struct DexscreenerClient {
    base_url: String,
    http: reqwest::Client,
}

impl DexscreenerClient {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, DexError> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(DexError::Client)?;
        Ok(Self::with_client(base_url, http))
    }

    /// Build on top of an existing `reqwest::Client` (shared pools, tests).
    pub fn with_client(base_url: impl Into<String>, http: reqwest::Client) -> Self {
        Self {
            base_url: base_url.into(),
            http,
        }
    }

    pub fn from_env() -> Result<Self, DexError> {
        Self::new(config::get_dex_api_base(), config::get_upstream_timeout())
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn endpoint(&self, segments: &[&str]) -> Result<Url, DexError> {
        let mut url = Url::parse(&self.base_url)?;
        url.path_segments_mut()
            .map_err(|_| DexError::BaseUrl(self.base_url.clone()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    pub fn candles_url(
        &self,
        chain: &str,
        pair: &str,
        timeframe: &str,
        limit: usize,
    ) -> Result<Url, DexError> {
        let mut url = self.endpoint(&["latest", "dex", "candles", chain, pair])?;
        url.query_pairs_mut()
            .append_pair("timeframe", timeframe)
            .append_pair("limit", &limit.to_string());
        Ok(url)
    }

    pub fn search_url(&self, query: &str) -> Result<Url, DexError> {
        let mut url = self.endpoint(&["latest", "dex", "search"])?;
        url.query_pairs_mut().append_pair("q", query);
        Ok(url)
    }

    async fn get_json<T: DeserializeOwned>(&self, url: Url) -> Result<T, DexError> {
        debug!(url = %url, "Dexscreener request");

        let response = self
            .http
            .get(url.clone())
            .send()
            .await
            .map_err(|source| DexError::Transport {
                url: url.to_string(),
                source,
            })?;

        let status = response.status();
        if !status.is_success() {
            warn!(url = %url, status = status.as_u16(), "Dexscreener returned an error status");
            return Err(DexError::Status {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }

        response
            .json::<T>()
            .await
            .map_err(|e| DexError::InvalidPayload {
                url: url.to_string(),
                reason: e.to_string(),
            })
    }
}

#[async_trait::async_trait]
impl MarketDataProvider for DexscreenerClient {
    async fn get_candles(
        &self,
        chain: &str,
        pair: &str,
        timeframe: &str,
        limit: usize,
    ) -> Result<CandleSeries, DexError> {
        let url = self.candles_url(chain, pair, timeframe, limit)?;
        let source = url.to_string();
        let body: CandlesResponse = self.get_json(url).await?;

        let series = body
            .candles
            .iter()
            .enumerate()
            .map(|(i, entry)| {
                entry
                    .c
                    .to_finite()
                    .map(|close| Candle::new(entry.t, close))
                    .ok_or_else(|| DexError::InvalidPayload {
                        url: source.clone(),
                        reason: format!("candle {} has no finite close", i),
                    })
            })
            .collect::<Result<CandleSeries, DexError>>()?;

        debug!(
            chain = %chain,
            pair = %pair,
            timeframe = %timeframe,
            candles = series.len(),
            "Fetched candles"
        );
        Ok(series)
    }

    async fn search_pairs(&self, query: &str) -> Result<Vec<Value>, DexError> {
        let url = self.search_url(query)?;
        let body: SearchResponse = self.get_json(url).await?;
        Ok(body.into_entries())
    }
}
