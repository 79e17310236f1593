//! Data handling for the CoT positioning pipeline.
//!
//! This crate provides:
//! - Raw report tables as delivered by the upstream API
//! - The panel normalizer for both report programs
//! - Market taxonomy and API name reconciliation
//! - CSV and Parquet storage utilities

pub mod csv_storage;
pub mod name_match;
pub mod normalize;
pub mod parquet_storage;
pub mod raw;
pub mod taxonomy;

pub use csv_storage::CsvStorage;
pub use name_match::{
    build_market_name_map, normalize_name, similarity, ExactMatcher, FuzzyMatcher, NameCatalog,
    NameMatcher,
};
pub use normalize::{normalize, SourceProgram, TraderGroup};
pub use parquet_storage::ParquetStorage;
pub use raw::{RawRow, RawTable};
pub use taxonomy::{base_name, AssetClass, MarketTaxonomy};
