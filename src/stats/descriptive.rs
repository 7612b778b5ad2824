//! Descriptive Statistics Module
//! Per-group fatality statistics, computed across groups in parallel.

use super::aggregator::GroupKey;
use crate::data::Record;
use rayon::prelude::*;
use serde::Serialize;
use statrs::statistics::Statistics;
use std::collections::{BTreeMap, HashMap};

/// Fatality statistics for a single group.
#[derive(Debug, Clone, Serialize)]
pub struct FatalityStats {
    pub group: String,
    pub count: usize,
    pub mean: f64,
    pub median: f64,
    pub std_dev: f64,
    pub max: u32,
}

impl Default for FatalityStats {
    fn default() -> Self {
        Self {
            group: String::new(),
            count: 0,
            mean: f64::NAN,
            median: f64::NAN,
            std_dev: f64::NAN,
            max: 0,
        }
    }
}

/// Handles descriptive statistics with multi-threading support.
pub struct StatsCalculator;

impl StatsCalculator {
    /// Compute descriptive statistics for one group's fatality counts.
    pub fn compute_descriptive_stats(fatalities: &[u32]) -> FatalityStats {
        let n = fatalities.len();
        if n == 0 {
            return FatalityStats::default();
        }

        let values: Vec<f64> = fatalities.iter().map(|&f| f64::from(f)).collect();
        let mut sorted = values.clone();
        sorted.sort_by(|a, b| a.total_cmp(b));

        let median = if n % 2 == 0 {
            (sorted[n / 2 - 1] + sorted[n / 2]) / 2.0
        } else {
            sorted[n / 2]
        };

        // Sample standard deviation is undefined for a single value
        let std_dev = if n > 1 { values.iter().std_dev() } else { 0.0 };

        FatalityStats {
            group: String::new(),
            count: n,
            mean: values.iter().mean(),
            median,
            std_dev,
            max: Iterator::max(fatalities.iter().copied()).unwrap_or(0),
        }
    }

    /// Compute statistics for every group of `key` in parallel.
    pub fn compute_group_stats_parallel(
        view: &[&Record],
        key: GroupKey,
    ) -> BTreeMap<String, FatalityStats> {
        let mut groups: HashMap<&str, Vec<u32>> = HashMap::new();
        for record in view {
            if let Some(group) = key.value(record) {
                groups.entry(group).or_default().push(record.fatalities);
            }
        }

        groups
            .into_par_iter()
            .map(|(group, fatalities)| {
                let mut stats = Self::compute_descriptive_stats(&fatalities);
                stats.group = group.to_string();
                (group.to_string(), stats)
            })
            .collect()
    }
}
