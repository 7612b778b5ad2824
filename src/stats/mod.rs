//! Stats module - Aggregations and descriptive statistics

mod aggregator;
mod descriptive;
mod report;

pub use aggregator::{
    Aggregator, FatalityRange, GroupFatalities, GroupKey, OperatorDamageMatrix, Overview,
};
pub use descriptive::{FatalityStats, StatsCalculator};
pub use report::{DashboardReport, HistogramBin};
