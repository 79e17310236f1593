//! CLI commands for the CoT positioning pipeline.

pub mod build_all;
pub mod build_tidy;
pub mod fetch;
pub mod list_markets;
pub mod metrics;
pub mod normalize;
pub mod screen;

pub use build_all::{run_build_all, BuildAllArgs};
pub use build_tidy::run_build_tidy;
pub use fetch::{run_fetch, FetchArgs};
pub use list_markets::{run_list_markets, ListMarketsArgs};
pub use metrics::run_metrics;
pub use normalize::{run_normalize, NormalizeArgs};
pub use screen::{run_screen, ScreenArgs};
