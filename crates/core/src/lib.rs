//! Core types for the CoT positioning pipeline.
//!
//! This crate provides:
//! - Series identity and the panel table passed between stages
//! - Column naming for change, score and score-change columns
//! - Undefined-value arithmetic over `Option<f64>`
//! - Layered configuration and the error taxonomy

pub mod columns;
pub mod config;
pub mod config_loader;
pub mod error;
pub mod panel;
pub mod series;
pub mod value;

pub use columns::{Horizon, Statistic};
pub use config::{
    AppConfig, ExpandingSpec, MetricsConfig, SourceConfig, StorageConfig, UniverseConfig,
    WindowSpec,
};
pub use config_loader::ConfigLoader;
pub use error::CotError;
pub use panel::{Column, Panel, RowMeta};
pub use series::SeriesKey;
