//! Technical indicators computed over close prices.

pub mod trend;

pub use trend::*;
