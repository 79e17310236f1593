//! Positioning metrics for CoT panels.
//!
//! This crate provides:
//! - Rolling and expanding window scores (percentile, min-max, z-score)
//! - The [`MetricsEngine`] producing change, score and score-change columns
//! - The [`SnapshotReducer`] keeping the latest row per series
//! - Crowding flags and a sector screen over a snapshot

pub mod engine;
pub mod flags;
pub mod rolling;
pub mod screen;
pub mod snapshot;

pub use engine::MetricsEngine;
pub use flags::{evaluate as evaluate_flags, Flag, FlagThresholds};
pub use rolling::WindowPolicy;
pub use screen::{screen, ScreenFormatter, ScreenQuery, ScreenRow};
pub use snapshot::SnapshotReducer;
