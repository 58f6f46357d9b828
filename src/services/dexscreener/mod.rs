//! Dexscreener REST market data provider

pub mod client;
pub mod messages;

pub use client::{DexError, DexscreenerClient};
pub use messages::{CandleEntry, CandlesResponse, PriceValue, SearchResponse};
