//! Flight Crash Pipeline - accident CSV normalization, filtering & aggregation
//!
//! Pure pipeline stages (`load`, `normalize`, `filter`, `aggregate`) that any
//! presentation layer can drive, plus the geocode cache and upload
//! extraction helpers.

pub mod config;
pub mod data;
pub mod extract;
pub mod geo;
pub mod pipeline;
pub mod stats;

pub use config::{Delimiter, GeocoderConfig, PipelineConfig};
pub use data::{Dataset, FilterOptions, FilterSelection, Record};
pub use pipeline::{load_dataset, load_with_geocodes, LoadedDataset, PipelineError};
pub use stats::{Aggregator, DashboardReport, GroupKey};
