//! HTTP surface: router, handlers and API errors

pub mod error;
pub mod http;

pub use error::ApiError;
pub use http::*;
