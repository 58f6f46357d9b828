//! MasterDex: EMA crossover signals and pre-alerts for DEX pairs.

pub mod chart;
pub mod config;
pub mod core;
pub mod indicators;
pub mod logging;
pub mod metrics;
pub mod models;
pub mod services;
pub mod signals;
