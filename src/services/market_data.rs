//! Market data provider interface.

use serde_json::Value;

use crate::models::CandleSeries;
use crate::services::dexscreener::DexError;

#[async_trait::async_trait]
pub trait MarketDataProvider: Send + Sync {
    /// Get historical candles for a pair on a chain, oldest first.
    async fn get_candles(
        &self,
        chain: &str,
        pair: &str,
        timeframe: &str,
        limit: usize,
    ) -> Result<CandleSeries, DexError>;

    /// Free-text search for pairs/tokens. Entries are passed through as-is.
    async fn search_pairs(&self, query: &str) -> Result<Vec<Value>, DexError>;
}
