//! Data Normalizer Module
//! Turns raw string tables into records: column renames, date parsing and defaults.

use super::loader::RawTable;
use super::record::{Dataset, Record};
use crate::config::PipelineConfig;
use chrono::{Datelike, NaiveDate};
use std::collections::{BTreeMap, HashMap};

/// Sentinel substituted for missing categorical values.
pub const UNKNOWN: &str = "Unknown";

/// Maximum number of unparseable date samples kept in a report.
const MAX_DATE_SAMPLES: usize = 5;

const DAYFIRST_FORMATS: [&str; 3] = ["%d/%m/%Y", "%d-%m-%Y", "%d.%m.%Y"];
const MONTHFIRST_FORMATS: [&str; 3] = ["%m/%d/%Y", "%m-%d-%Y", "%m.%d.%Y"];
const DAYFIRST_SHORT_YEAR: [&str; 4] = ["%d/%m/%y", "%d-%m-%y", "%d.%m.%y", "%d-%b-%y"];
const MONTHFIRST_SHORT_YEAR: [&str; 4] = ["%m/%d/%y", "%m-%d-%y", "%m.%d.%y", "%d-%b-%y"];
const NAMED_MONTH_FORMATS: [&str; 7] = [
    "%Y-%m-%d",
    "%Y/%m/%d",
    "%d-%b-%Y",
    "%d %b %Y",
    "%d %B %Y",
    "%b %d, %Y",
    "%B %d, %Y",
];

/// Outcome of a normalization pass.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NormalizeReport {
    pub rows: usize,
    /// Non-empty date values that could not be parsed.
    pub unparsed_dates: usize,
    pub unparsed_date_samples: Vec<String>,
    /// Fatality values that were missing or not a non-negative number.
    pub coerced_fatalities: usize,
    /// Canonical columns absent from the source.
    pub missing_columns: Vec<String>,
}

impl NormalizeReport {
    pub fn has_date_warnings(&self) -> bool {
        self.unparsed_dates > 0
    }
}

/// Trim and lower-case a column name.
pub fn normalize_column_name(name: &str) -> String {
    name.trim().to_lowercase()
}

/// Rename synonym columns to their canonical names.
///
/// A rename is skipped when the source column is absent or the canonical
/// column already exists.
pub fn apply_synonyms(columns: &mut [String], synonyms: &BTreeMap<String, String>) {
    for (from, to) in synonyms {
        if columns.iter().any(|c| c == to) {
            continue;
        }
        if let Some(col) = columns.iter_mut().find(|c| *c == from) {
            *col = to.clone();
        }
    }
}

/// First letter upper-case, remainder lower-case.
pub fn capitalize(value: &str) -> String {
    let mut chars = value.chars();
    match chars.next() {
        Some(first) => first
            .to_uppercase()
            .chain(chars.flat_map(char::to_lowercase))
            .collect(),
        None => String::new(),
    }
}

/// Coerce a raw fatality value to a non-negative count.
///
/// Returns `None` when the value is missing, non-numeric or negative, in
/// which case the caller substitutes zero. Counts beyond `u32::MAX` saturate.
pub fn coerce_fatalities(raw: Option<&str>) -> Option<u32> {
    let value = raw?.trim();
    if let Ok(n) = value.parse::<i64>() {
        return (n >= 0).then(|| u32::try_from(n).unwrap_or(u32::MAX));
    }
    let f = value.parse::<f64>().ok()?;
    if f.is_finite() && f >= 0.0 {
        Some(f.trunc().min(f64::from(u32::MAX)) as u32)
    } else {
        None
    }
}

/// Parse a date string. Numeric forms are read day-first when `dayfirst` is set;
/// ISO `yyyy-mm-dd` is always year-first. A trailing time component is ignored.
pub fn parse_date(raw: &str, dayfirst: bool) -> Option<NaiveDate> {
    let value = raw.trim();
    if value.is_empty() {
        return None;
    }
    parse_date_only(value, dayfirst).or_else(|| {
        // "2020-03-01 10:15:00" / "2020-03-01T10:15:00"
        let head = value.split([' ', 'T']).next()?;
        if head.len() < value.len() {
            parse_date_only(head, dayfirst)
        } else {
            None
        }
    })
}

fn parse_date_only(value: &str, dayfirst: bool) -> Option<NaiveDate> {
    let short_year = value
        .rsplit(['/', '-', '.'])
        .next()
        .is_some_and(|tail| tail.len() == 2 && tail.bytes().all(|b| b.is_ascii_digit()));

    let numeric: &[&str] = match (dayfirst, short_year) {
        (true, false) => &DAYFIRST_FORMATS,
        (false, false) => &MONTHFIRST_FORMATS,
        (true, true) => &DAYFIRST_SHORT_YEAR,
        (false, true) => &MONTHFIRST_SHORT_YEAR,
    };

    numeric
        .iter()
        .chain(NAMED_MONTH_FORMATS.iter())
        .find_map(|fmt| NaiveDate::parse_from_str(value, fmt).ok())
}

/// Non-empty trimmed string, or `None`.
fn clean(value: Option<&String>) -> Option<String> {
    value
        .map(|v| v.trim())
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

fn cell(column: Option<&Vec<Option<String>>>, row: usize) -> Option<&String> {
    column.and_then(|values| values[row].as_ref())
}

fn parse_coordinate(value: Option<&String>) -> Option<f64> {
    value?.trim().parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Applies the normalization steps to raw tables.
pub struct Normalizer {
    synonyms: BTreeMap<String, String>,
    dayfirst: bool,
}

impl Default for Normalizer {
    fn default() -> Self {
        Self::from_config(&PipelineConfig::default())
    }
}

impl Normalizer {
    pub fn new(synonyms: BTreeMap<String, String>, dayfirst: bool) -> Self {
        Self { synonyms, dayfirst }
    }

    pub fn from_config(config: &PipelineConfig) -> Self {
        Self::new(config.synonym_table(), config.date_dayfirst)
    }

    /// Produce a dataset from a raw table, with a report of every value that
    /// had to be defaulted or could not be parsed.
    pub fn normalize(&self, table: &RawTable) -> (Dataset, NormalizeReport) {
        let mut names: Vec<String> = table
            .columns
            .iter()
            .map(|c| normalize_column_name(&c.name))
            .collect();
        apply_synonyms(&mut names, &self.synonyms);

        // Last column wins if two source columns normalize to the same name
        let index: HashMap<&str, usize> = names
            .iter()
            .enumerate()
            .map(|(i, n)| (n.as_str(), i))
            .collect();
        let column = |name: &str| index.get(name).copied();

        let mut report = NormalizeReport {
            rows: table.height(),
            ..Default::default()
        };
        for name in [
            "date",
            "operator",
            "aircraft_type",
            "fatalities",
            "damage_level",
            "location",
        ] {
            if !index.contains_key(name) {
                report.missing_columns.push(name.to_string());
            }
        }
        if !report.missing_columns.is_empty() {
            log::warn!("Missing columns: {}", report.missing_columns.join(", "));
        }

        let dates = column("date").map(|i| &table.columns[i].values);
        let operators = column("operator").map(|i| &table.columns[i].values);
        let aircraft = column("aircraft_type").map(|i| &table.columns[i].values);
        let fatality_values = column("fatalities").map(|i| &table.columns[i].values);
        let damage = column("damage_level").map(|i| &table.columns[i].values);
        let locations = column("location").map(|i| &table.columns[i].values);
        let latitudes = column("latitude").map(|i| &table.columns[i].values);
        let longitudes = column("longitude").map(|i| &table.columns[i].values);
        let has_coordinates = latitudes.is_some() && longitudes.is_some();

        let mut records = Vec::with_capacity(table.height());
        for row in 0..table.height() {
            let raw_date = cell(dates, row);
            let date = raw_date.and_then(|d| parse_date(d, self.dayfirst));
            if let (Some(raw), None) = (raw_date, date) {
                if !raw.trim().is_empty() {
                    report.unparsed_dates += 1;
                    if report.unparsed_date_samples.len() < MAX_DATE_SAMPLES {
                        report.unparsed_date_samples.push(raw.clone());
                    }
                }
            }

            let raw_fatalities = cell(fatality_values, row).map(String::as_str);
            let fatalities = match coerce_fatalities(raw_fatalities) {
                Some(n) => n,
                None => {
                    report.coerced_fatalities += 1;
                    0
                }
            };

            let damage_level = clean(cell(damage, row))
                .map(|d| capitalize(&d))
                .unwrap_or_else(|| UNKNOWN.to_string());

            records.push(Record {
                date,
                year: date.map(|d| d.year()),
                aircraft_type: clean(cell(aircraft, row)),
                operator: clean(cell(operators, row)).unwrap_or_else(|| UNKNOWN.to_string()),
                fatalities,
                damage_level,
                location: clean(cell(locations, row)),
                latitude: parse_coordinate(cell(latitudes, row)),
                longitude: parse_coordinate(cell(longitudes, row)),
            });
        }

        if report.has_date_warnings() {
            log::warn!(
                "{} of {} date values could not be parsed and are treated as unknown (e.g. {:?})",
                report.unparsed_dates,
                report.rows,
                report.unparsed_date_samples
            );
        }
        if report.coerced_fatalities > 0 {
            log::debug!(
                "{} fatality values missing or non-numeric, defaulted to 0",
                report.coerced_fatalities
            );
        }

        (Dataset::new(records, has_coordinates), report)
    }
}
