//! Client for the CFTC public reporting (Socrata) API.
//!
//! This crate provides:
//! - SoQL query building with safe literal quoting
//! - A paged, paced download client
//! - Universe downloads by market name and contract code

pub mod client;
pub mod error;
pub mod query;
pub mod universe;

pub use client::SodaClient;
pub use error::FetchError;
pub use query::SodaQuery;
pub use universe::{resolve_mapped_targets, resolve_targets, MarketTarget};
