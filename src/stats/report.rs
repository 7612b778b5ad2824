//! Dashboard Report Module
//! Every aggregation the dashboard renders, bundled for a presentation layer.

use super::aggregator::{Aggregator, GroupFatalities, GroupKey, OperatorDamageMatrix, Overview};
use super::descriptive::{FatalityStats, StatsCalculator};
use crate::data::Record;
use serde::Serialize;
use std::collections::BTreeMap;

/// Number of rows in the deadliest-accidents table.
const TOP_FATAL_ACCIDENTS: usize = 10;
/// Number of rows in the aircraft summary table.
const AIRCRAFT_SUMMARY_ROWS: usize = 20;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HistogramBin {
    pub range: &'static str,
    pub count: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct DashboardReport {
    pub overview: Overview,
    pub accidents_by_year: Vec<(i32, usize)>,
    pub damage_levels: Vec<(String, usize)>,
    pub year_damage_breakdown: Vec<(i32, String, usize)>,
    pub top_operators: Vec<(String, usize)>,
    pub top_aircraft_types: Vec<(String, usize)>,
    pub top_locations: Vec<(String, usize)>,
    pub operators_by_fatalities: Vec<GroupFatalities>,
    pub aircraft_by_mean_fatalities: Vec<GroupFatalities>,
    pub aircraft_summary: Vec<GroupFatalities>,
    pub fatality_histogram: Vec<HistogramBin>,
    pub deadliest_accidents: Vec<Record>,
    pub operator_damage_matrix: OperatorDamageMatrix,
    pub operator_stats: BTreeMap<String, FatalityStats>,
}

impl DashboardReport {
    /// Compute every aggregation for a filtered view. `top_n` bounds the
    /// ranking lists.
    pub fn build(view: &[&Record], top_n: usize) -> Self {
        Self {
            overview: Aggregator::overview(view),
            accidents_by_year: Aggregator::accidents_by_year(view),
            damage_levels: Aggregator::damage_level_counts(view),
            year_damage_breakdown: Aggregator::year_damage_breakdown(view),
            top_operators: Aggregator::top_by_count(view, GroupKey::Operator, top_n),
            top_aircraft_types: Aggregator::top_by_count(view, GroupKey::AircraftType, top_n),
            top_locations: Aggregator::top_by_count(view, GroupKey::Location, top_n),
            operators_by_fatalities: Aggregator::top_by_total_fatalities(
                view,
                GroupKey::Operator,
                top_n,
            ),
            aircraft_by_mean_fatalities: Aggregator::top_by_mean_fatalities(
                view,
                GroupKey::AircraftType,
                top_n,
            ),
            aircraft_summary: Aggregator::aircraft_summary(view, AIRCRAFT_SUMMARY_ROWS),
            fatality_histogram: Aggregator::fatality_histogram(view)
                .into_iter()
                .map(|(bin, count)| HistogramBin {
                    range: bin.label(),
                    count,
                })
                .collect(),
            deadliest_accidents: Aggregator::top_fatal_accidents(view, TOP_FATAL_ACCIDENTS)
                .into_iter()
                .cloned()
                .collect(),
            operator_damage_matrix: Aggregator::operator_damage_matrix(view),
            operator_stats: StatsCalculator::compute_group_stats_parallel(view, GroupKey::Operator),
        }
    }
}
