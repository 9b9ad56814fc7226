//! Housing affordability time series built from per-year census exports,
//! with optional HUD Fair Market Rent benchmarks.

pub mod check;
pub mod config;
pub mod document;
pub mod error;
pub mod extract;
pub mod merge;
pub mod output;
pub mod pipeline;
pub mod secondary;

pub use config::Config;
pub use error::{Error, Result};
pub use pipeline::{build_dataset, Dataset};
