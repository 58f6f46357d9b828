//! External data sources.

pub mod dexscreener;
pub mod market_data;

pub use dexscreener::{DexError, DexscreenerClient};
pub use market_data::MarketDataProvider;
