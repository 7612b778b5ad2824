//! Record Filter Module
//! Set-membership selections over year, damage level and operator.

use super::record::{Dataset, Record};
use std::collections::BTreeSet;

/// Number of operators offered as selectable options.
pub const OPERATOR_OPTION_LIMIT: usize = 50;

/// User selections. An empty set means no filtering on that dimension.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterSelection {
    pub years: BTreeSet<i32>,
    pub damage_levels: BTreeSet<String>,
    pub operators: BTreeSet<String>,
}

impl FilterSelection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_years(mut self, years: impl IntoIterator<Item = i32>) -> Self {
        self.years.extend(years);
        self
    }

    pub fn with_damage_levels<S: Into<String>>(
        mut self,
        levels: impl IntoIterator<Item = S>,
    ) -> Self {
        self.damage_levels.extend(levels.into_iter().map(Into::into));
        self
    }

    pub fn with_operators<S: Into<String>>(
        mut self,
        operators: impl IntoIterator<Item = S>,
    ) -> Self {
        self.operators.extend(operators.into_iter().map(Into::into));
        self
    }

    /// True when no dimension is restricted.
    pub fn is_pass_through(&self) -> bool {
        self.years.is_empty() && self.damage_levels.is_empty() && self.operators.is_empty()
    }

    /// Whether a record satisfies every non-empty selection.
    ///
    /// A record with an unknown year never matches a non-empty year selection.
    pub fn matches(&self, record: &Record) -> bool {
        let year_ok = self.years.is_empty()
            || record.year.is_some_and(|y| self.years.contains(&y));
        let damage_ok =
            self.damage_levels.is_empty() || self.damage_levels.contains(&record.damage_level);
        let operator_ok = self.operators.is_empty() || self.operators.contains(&record.operator);
        year_ok && damage_ok && operator_ok
    }

    /// The sub-sequence of records matching the selection, in input order.
    pub fn apply<'a, I>(&self, records: I) -> Vec<&'a Record>
    where
        I: IntoIterator<Item = &'a Record>,
    {
        records.into_iter().filter(|r| self.matches(r)).collect()
    }
}

/// Values offered for selection, derived from a full dataset.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterOptions {
    pub years: Vec<i32>,
    pub damage_levels: Vec<String>,
    /// First [`OPERATOR_OPTION_LIMIT`] operators in sorted order.
    pub operators: Vec<String>,
}

impl FilterOptions {
    pub fn from_dataset(dataset: &Dataset) -> Self {
        let years: BTreeSet<i32> = dataset.records().iter().filter_map(|r| r.year).collect();
        let damage_levels: BTreeSet<&str> = dataset
            .records()
            .iter()
            .map(|r| r.damage_level.as_str())
            .collect();
        let operators: BTreeSet<&str> = dataset
            .records()
            .iter()
            .map(|r| r.operator.as_str())
            .collect();

        Self {
            years: years.into_iter().collect(),
            damage_levels: damage_levels.into_iter().map(str::to_string).collect(),
            operators: operators
                .into_iter()
                .take(OPERATOR_OPTION_LIMIT)
                .map(str::to_string)
                .collect(),
        }
    }
}
