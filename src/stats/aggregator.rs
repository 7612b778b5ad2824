//! Aggregation Module
//! Grouped counts, fatality sums/means, rankings and histograms over a filtered view.

use crate::data::Record;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet, HashMap};

/// Categorical dimension to group records by.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GroupKey {
    Operator,
    AircraftType,
    Location,
    DamageLevel,
}

impl GroupKey {
    /// Group value of a record. Records with no value are left out of groupings.
    pub fn value<'a>(&self, record: &'a Record) -> Option<&'a str> {
        match self {
            GroupKey::Operator => Some(record.operator.as_str()),
            GroupKey::AircraftType => record.aircraft_type.as_deref(),
            GroupKey::Location => record.location.as_deref(),
            GroupKey::DamageLevel => Some(record.damage_level.as_str()),
        }
    }
}

/// Fatality histogram bin. Each non-negative count falls in exactly one bin.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum FatalityRange {
    Zero,
    OneToFive,
    SixToTen,
    ElevenToTwenty,
    TwentyOneToFifty,
    FiftyOneToHundred,
    OverHundred,
}

impl FatalityRange {
    pub const ALL: [FatalityRange; 7] = [
        FatalityRange::Zero,
        FatalityRange::OneToFive,
        FatalityRange::SixToTen,
        FatalityRange::ElevenToTwenty,
        FatalityRange::TwentyOneToFifty,
        FatalityRange::FiftyOneToHundred,
        FatalityRange::OverHundred,
    ];

    pub fn for_count(fatalities: u32) -> Self {
        match fatalities {
            0 => FatalityRange::Zero,
            1..=5 => FatalityRange::OneToFive,
            6..=10 => FatalityRange::SixToTen,
            11..=20 => FatalityRange::ElevenToTwenty,
            21..=50 => FatalityRange::TwentyOneToFifty,
            51..=100 => FatalityRange::FiftyOneToHundred,
            _ => FatalityRange::OverHundred,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            FatalityRange::Zero => "0",
            FatalityRange::OneToFive => "1-5",
            FatalityRange::SixToTen => "6-10",
            FatalityRange::ElevenToTwenty => "11-20",
            FatalityRange::TwentyOneToFifty => "21-50",
            FatalityRange::FiftyOneToHundred => "51-100",
            FatalityRange::OverHundred => "100+",
        }
    }
}

/// Headline numbers for a view.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Overview {
    pub total_accidents: usize,
    pub total_fatalities: u64,
    pub unique_operators: usize,
    pub max_fatalities: u32,
}

/// Accident count and fatality totals for one group.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GroupFatalities {
    pub group: String,
    pub accidents: usize,
    pub total_fatalities: u64,
    pub mean_fatalities: f64,
}

/// Operator x damage-level accident counts.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct OperatorDamageMatrix {
    /// Sorted row labels.
    pub operators: Vec<String>,
    /// Sorted column labels.
    pub damage_levels: Vec<String>,
    /// `counts[row][col]`
    pub counts: Vec<Vec<usize>>,
}

impl OperatorDamageMatrix {
    pub fn count(&self, operator: &str, damage_level: &str) -> Option<usize> {
        let row = self.operators.iter().position(|o| o == operator)?;
        let col = self.damage_levels.iter().position(|d| d == damage_level)?;
        Some(self.counts[row][col])
    }
}

/// Aggregations over filtered views. Every function accepts an empty view
/// and returns an empty (or zeroed) result for it.
pub struct Aggregator;

impl Aggregator {
    pub fn overview(view: &[&Record]) -> Overview {
        let operators: BTreeSet<&str> = view.iter().map(|r| r.operator.as_str()).collect();
        Overview {
            total_accidents: view.len(),
            total_fatalities: view.iter().map(|r| u64::from(r.fatalities)).sum(),
            unique_operators: operators.len(),
            max_fatalities: view.iter().map(|r| r.fatalities).max().unwrap_or(0),
        }
    }

    /// Accidents per year, ascending. Records with unknown year are skipped.
    pub fn accidents_by_year(view: &[&Record]) -> Vec<(i32, usize)> {
        let mut counts: BTreeMap<i32, usize> = BTreeMap::new();
        for year in view.iter().filter_map(|r| r.year) {
            *counts.entry(year).or_default() += 1;
        }
        counts.into_iter().collect()
    }

    /// Accidents per (year, damage level), ordered by year then damage level.
    pub fn year_damage_breakdown(view: &[&Record]) -> Vec<(i32, String, usize)> {
        let mut counts: BTreeMap<(i32, &str), usize> = BTreeMap::new();
        for record in view {
            if let Some(year) = record.year {
                *counts.entry((year, record.damage_level.as_str())).or_default() += 1;
            }
        }
        counts
            .into_iter()
            .map(|((year, damage), n)| (year, damage.to_string(), n))
            .collect()
    }

    /// Group sizes, largest first. Ties keep first-appearance order.
    pub fn count_by(view: &[&Record], key: GroupKey) -> Vec<(String, usize)> {
        let mut index: HashMap<&str, usize> = HashMap::new();
        let mut counts: Vec<(&str, usize)> = Vec::new();
        for value in view.iter().filter_map(|r| key.value(r)) {
            let slot = *index.entry(value).or_insert_with(|| {
                counts.push((value, 0));
                counts.len() - 1
            });
            counts[slot].1 += 1;
        }
        counts.sort_by(|a, b| b.1.cmp(&a.1));
        counts
            .into_iter()
            .map(|(group, n)| (group.to_string(), n))
            .collect()
    }

    /// Damage-level distribution, largest first.
    pub fn damage_level_counts(view: &[&Record]) -> Vec<(String, usize)> {
        Self::count_by(view, GroupKey::DamageLevel)
    }

    /// The `n` largest groups by accident count.
    pub fn top_by_count(view: &[&Record], key: GroupKey, n: usize) -> Vec<(String, usize)> {
        let mut counts = Self::count_by(view, key);
        counts.truncate(n);
        counts
    }

    /// Accidents, total and mean fatalities per group, in first-appearance order.
    pub fn fatalities_by(view: &[&Record], key: GroupKey) -> Vec<GroupFatalities> {
        let mut index: HashMap<&str, usize> = HashMap::new();
        let mut groups: Vec<(&str, usize, u64)> = Vec::new();
        for record in view {
            let Some(value) = key.value(record) else {
                continue;
            };
            let slot = *index.entry(value).or_insert_with(|| {
                groups.push((value, 0, 0));
                groups.len() - 1
            });
            groups[slot].1 += 1;
            groups[slot].2 += u64::from(record.fatalities);
        }
        groups
            .into_iter()
            .map(|(group, accidents, total)| GroupFatalities {
                group: group.to_string(),
                accidents,
                total_fatalities: total,
                mean_fatalities: total as f64 / accidents as f64,
            })
            .collect()
    }

    /// Sum of fatalities per group.
    pub fn total_fatalities_by(view: &[&Record], key: GroupKey) -> BTreeMap<String, u64> {
        Self::fatalities_by(view, key)
            .into_iter()
            .map(|g| (g.group, g.total_fatalities))
            .collect()
    }

    /// Mean fatalities per group.
    pub fn mean_fatalities_by(view: &[&Record], key: GroupKey) -> BTreeMap<String, f64> {
        Self::fatalities_by(view, key)
            .into_iter()
            .map(|g| (g.group, g.mean_fatalities))
            .collect()
    }

    /// The `n` groups with the most fatalities in total.
    pub fn top_by_total_fatalities(
        view: &[&Record],
        key: GroupKey,
        n: usize,
    ) -> Vec<GroupFatalities> {
        let mut groups = Self::fatalities_by(view, key);
        groups.sort_by(|a, b| b.total_fatalities.cmp(&a.total_fatalities));
        groups.truncate(n);
        groups
    }

    /// The `n` groups with the highest mean fatalities per accident.
    pub fn top_by_mean_fatalities(
        view: &[&Record],
        key: GroupKey,
        n: usize,
    ) -> Vec<GroupFatalities> {
        let mut groups = Self::fatalities_by(view, key);
        groups.sort_by(|a, b| b.mean_fatalities.total_cmp(&a.mean_fatalities));
        groups.truncate(n);
        groups
    }

    /// Per aircraft type: accidents and mean fatalities, most accidents first.
    pub fn aircraft_summary(view: &[&Record], n: usize) -> Vec<GroupFatalities> {
        let mut groups = Self::fatalities_by(view, GroupKey::AircraftType);
        groups.sort_by(|a, b| b.accidents.cmp(&a.accidents));
        groups.truncate(n);
        groups
    }

    /// Accident counts in each of the seven fatality bins, in bin order.
    pub fn fatality_histogram(view: &[&Record]) -> Vec<(FatalityRange, usize)> {
        let mut counts = [0usize; 7];
        for record in view {
            let bin = FatalityRange::for_count(record.fatalities);
            counts[bin as usize] += 1;
        }
        FatalityRange::ALL.into_iter().zip(counts).collect()
    }

    /// The `n` deadliest accidents. Ties keep view order.
    pub fn top_fatal_accidents<'a>(view: &[&'a Record], n: usize) -> Vec<&'a Record> {
        let mut sorted = view.to_vec();
        sorted.sort_by(|a, b| b.fatalities.cmp(&a.fatalities));
        sorted.truncate(n);
        sorted
    }

    pub fn operator_damage_matrix(view: &[&Record]) -> OperatorDamageMatrix {
        let mut cells: BTreeMap<(&str, &str), usize> = BTreeMap::new();
        let mut damage_levels: BTreeSet<&str> = BTreeSet::new();
        for record in view {
            damage_levels.insert(record.damage_level.as_str());
            *cells
                .entry((record.operator.as_str(), record.damage_level.as_str()))
                .or_default() += 1;
        }

        let operators: BTreeSet<&str> = cells.keys().map(|(op, _)| *op).collect();
        let counts = operators
            .iter()
            .map(|op| {
                damage_levels
                    .iter()
                    .map(|dmg| cells.get(&(*op, *dmg)).copied().unwrap_or(0))
                    .collect()
            })
            .collect();

        OperatorDamageMatrix {
            operators: operators.into_iter().map(str::to_string).collect(),
            damage_levels: damage_levels.into_iter().map(str::to_string).collect(),
            counts,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{Dataset, FilterSelection};
    use chrono::NaiveDate;

    fn date(y: i32, m: u32, d: u32) -> Option<NaiveDate> {
        NaiveDate::from_ymd_opt(y, m, d)
    }

    fn sample() -> Vec<Record> {
        vec![
            Record::new(date(2020, 3, 1), "Acme Air", 5, "Substantial")
                .with_aircraft_type("B737")
                .with_location("Springfield"),
            Record::new(date(2021, 7, 4), "Acme Air", 0, "None")
                .with_aircraft_type("A320")
                .with_location("Springfield"),
            Record::new(date(2020, 9, 9), "Globex", 150, "Destroyed")
                .with_aircraft_type("B737")
                .with_location("Oslo"),
            Record::new(date(2019, 1, 2), "Initech", 12, "None").with_aircraft_type("DC-3"),
            Record::new(None, "Globex", 5, "Destroyed"),
        ]
    }

    #[test]
    fn example_sum_by_operator() {
        let ds = Dataset::new(sample().into_iter().take(2).collect(), false);
        let view = FilterSelection::new().with_years([2020]).apply(&ds);
        assert_eq!(view.len(), 1);
        let sums = Aggregator::total_fatalities_by(&view, GroupKey::Operator);
        assert_eq!(sums, BTreeMap::from([("Acme Air".to_string(), 5)]));
    }

    #[test]
    fn overview_numbers() {
        let records = sample();
        let view: Vec<&Record> = records.iter().collect();
        let overview = Aggregator::overview(&view);
        assert_eq!(overview.total_accidents, 5);
        assert_eq!(overview.total_fatalities, 172);
        assert_eq!(overview.unique_operators, 3);
        assert_eq!(overview.max_fatalities, 150);
    }

    #[test]
    fn counts_by_year_skip_unknown() {
        let records = sample();
        let view: Vec<&Record> = records.iter().collect();
        assert_eq!(
            Aggregator::accidents_by_year(&view),
            vec![(2019, 1), (2020, 2), (2021, 1)]
        );
        assert_eq!(
            Aggregator::year_damage_breakdown(&view),
            vec![
                (2019, "None".to_string(), 1),
                (2020, "Destroyed".to_string(), 1),
                (2020, "Substantial".to_string(), 1),
                (2021, "None".to_string(), 1),
            ]
        );
    }

    #[test]
    fn count_ties_keep_first_appearance() {
        let records = sample();
        let view: Vec<&Record> = records.iter().collect();
        assert_eq!(
            Aggregator::damage_level_counts(&view),
            vec![
                ("None".to_string(), 2),
                ("Destroyed".to_string(), 2),
                ("Substantial".to_string(), 1),
            ]
        );
        assert_eq!(
            Aggregator::top_by_count(&view, GroupKey::Operator, 2),
            vec![("Acme Air".to_string(), 2), ("Globex".to_string(), 2)]
        );
        assert_eq!(
            Aggregator::top_by_count(&view, GroupKey::Location, 10),
            vec![("Springfield".to_string(), 2), ("Oslo".to_string(), 1)]
        );
    }

    #[test]
    fn fatality_rankings() {
        let records = sample();
        let view: Vec<&Record> = records.iter().collect();

        let top = Aggregator::top_by_total_fatalities(&view, GroupKey::Operator, 2);
        assert_eq!(top[0].group, "Globex");
        assert_eq!(top[0].total_fatalities, 155);
        assert_eq!(top[1].group, "Initech");

        let means = Aggregator::mean_fatalities_by(&view, GroupKey::AircraftType);
        assert_eq!(means["B737"], 77.5);
        assert_eq!(means["A320"], 0.0);

        let by_mean = Aggregator::top_by_mean_fatalities(&view, GroupKey::AircraftType, 1);
        assert_eq!(by_mean[0].group, "B737");

        let summary = Aggregator::aircraft_summary(&view, 20);
        assert_eq!(summary[0].group, "B737");
        assert_eq!(summary[0].accidents, 2);
        assert_eq!(summary.len(), 3);
    }

    #[test]
    fn histogram_partitions_counts() {
        let fatalities = [0, 1, 5, 6, 10, 11, 20, 21, 50, 51, 100, 101, 5000];
        let records: Vec<Record> = fatalities
            .iter()
            .map(|&f| Record::new(None, "Acme Air", f, "None"))
            .collect();
        let view: Vec<&Record> = records.iter().collect();

        let histogram = Aggregator::fatality_histogram(&view);
        let counts: Vec<usize> = histogram.iter().map(|(_, n)| *n).collect();
        assert_eq!(counts, vec![1, 2, 2, 2, 2, 2, 2]);
        assert_eq!(counts.iter().sum::<usize>(), view.len());

        let labels: Vec<&str> = histogram.iter().map(|(bin, _)| bin.label()).collect();
        assert_eq!(labels, vec!["0", "1-5", "6-10", "11-20", "21-50", "51-100", "100+"]);
    }

    #[test]
    fn top_fatal_accidents_is_stable() {
        let records = sample();
        let view: Vec<&Record> = records.iter().collect();
        let top = Aggregator::top_fatal_accidents(&view, 4);
        let fatalities: Vec<u32> = top.iter().map(|r| r.fatalities).collect();
        assert_eq!(fatalities, vec![150, 12, 5, 5]);
        assert_eq!(top[2].operator, "Acme Air");
        assert_eq!(top[3].operator, "Globex");
    }

    #[test]
    fn operator_damage_matrix_counts() {
        let records = sample();
        let view: Vec<&Record> = records.iter().collect();
        let matrix = Aggregator::operator_damage_matrix(&view);
        assert_eq!(matrix.operators, vec!["Acme Air", "Globex", "Initech"]);
        assert_eq!(matrix.damage_levels, vec!["Destroyed", "None", "Substantial"]);
        assert_eq!(matrix.count("Globex", "Destroyed"), Some(2));
        assert_eq!(matrix.count("Acme Air", "Destroyed"), Some(0));
        assert_eq!(matrix.count("Nobody", "None"), None);
    }

    #[test]
    fn empty_view_yields_empty_results() {
        let view: Vec<&Record> = Vec::new();
        assert_eq!(Aggregator::overview(&view), Overview::default());
        assert!(Aggregator::accidents_by_year(&view).is_empty());
        assert!(Aggregator::count_by(&view, GroupKey::Operator).is_empty());
        assert!(Aggregator::fatalities_by(&view, GroupKey::AircraftType).is_empty());
        assert!(Aggregator::top_fatal_accidents(&view, 10).is_empty());
        assert!(Aggregator::operator_damage_matrix(&view).operators.is_empty());
        let histogram = Aggregator::fatality_histogram(&view);
        assert_eq!(histogram.iter().map(|(_, n)| n).sum::<usize>(), 0);
    }
}
