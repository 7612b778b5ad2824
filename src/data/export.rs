//! Data Explorer Export Module
//! Converts record views to Polars DataFrames and writes them as delimited files.

use super::record::Record;
use crate::config::Delimiter;
use polars::prelude::*;
use std::fs::{self, File};
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ExportError {
    #[error("Polars error: {0}")]
    PolarsError(#[from] PolarsError),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Build a DataFrame with the canonical columns, one row per record.
pub fn to_dataframe(view: &[&Record]) -> PolarsResult<DataFrame> {
    let dates: Vec<Option<String>> = view
        .iter()
        .map(|r| r.date.map(|d| d.format("%Y-%m-%d").to_string()))
        .collect();
    let years: Vec<Option<i32>> = view.iter().map(|r| r.year).collect();
    let aircraft: Vec<Option<&str>> = view.iter().map(|r| r.aircraft_type.as_deref()).collect();
    let operators: Vec<&str> = view.iter().map(|r| r.operator.as_str()).collect();
    let fatalities: Vec<u32> = view.iter().map(|r| r.fatalities).collect();
    let damage: Vec<&str> = view.iter().map(|r| r.damage_level.as_str()).collect();
    let locations: Vec<Option<&str>> = view.iter().map(|r| r.location.as_deref()).collect();
    let latitudes: Vec<Option<f64>> = view.iter().map(|r| r.latitude).collect();
    let longitudes: Vec<Option<f64>> = view.iter().map(|r| r.longitude).collect();

    DataFrame::new(vec![
        Column::new("date".into(), dates),
        Column::new("year".into(), years),
        Column::new("aircraft_type".into(), aircraft),
        Column::new("operator".into(), operators),
        Column::new("fatalities".into(), fatalities),
        Column::new("damage_level".into(), damage),
        Column::new("location".into(), locations),
        Column::new("latitude".into(), latitudes),
        Column::new("longitude".into(), longitudes),
    ])
}

/// Write a view sorted by date, newest first. Unknown dates go last;
/// ties keep view order.
pub fn write_view_csv(
    view: &[&Record],
    path: &Path,
    delimiter: Delimiter,
) -> Result<(), ExportError> {
    let mut sorted = view.to_vec();
    sorted.sort_by(|a, b| match (a.date, b.date) {
        (Some(x), Some(y)) => y.cmp(&x),
        (Some(_), None) => std::cmp::Ordering::Less,
        (None, Some(_)) => std::cmp::Ordering::Greater,
        (None, None) => std::cmp::Ordering::Equal,
    });

    let mut df = to_dataframe(&sorted)?;

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    let mut file = File::create(path)?;
    CsvWriter::new(&mut file)
        .include_header(true)
        .with_separator(delimiter.as_byte())
        .finish(&mut df)?;

    log::info!("Exported {} rows to {}", df.height(), path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn dataframe_has_canonical_columns() {
        let record = Record::new(NaiveDate::from_ymd_opt(2020, 3, 1), "Acme Air", 5, "Substantial")
            .with_location("Springfield");
        let df = to_dataframe(&[&record]).unwrap();
        let names: Vec<String> = df.get_column_names().iter().map(|s| s.to_string()).collect();
        assert_eq!(
            names,
            vec![
                "date",
                "year",
                "aircraft_type",
                "operator",
                "fatalities",
                "damage_level",
                "location",
                "latitude",
                "longitude"
            ]
        );
        assert_eq!(df.height(), 1);
    }

    #[test]
    fn writes_newest_first() {
        let dir = std::env::temp_dir().join("fcp_export_newest_first");
        let _ = fs::remove_dir_all(&dir);
        let path = dir.join("out.csv");

        let old = Record::new(NaiveDate::from_ymd_opt(2019, 1, 1), "Old Air", 1, "None");
        let undated = Record::new(None, "Mystery", 2, "Unknown");
        let new = Record::new(NaiveDate::from_ymd_opt(2021, 1, 1), "New Air", 3, "Minor");
        write_view_csv(&[&old, &undated, &new], &path, Delimiter::Comma).unwrap();

        let text = fs::read_to_string(&path).unwrap();
        let operators: Vec<&str> = text
            .lines()
            .skip(1)
            .map(|line| line.split(',').nth(3).unwrap())
            .collect();
        assert_eq!(operators, vec!["New Air", "Old Air", "Mystery"]);

        let _ = fs::remove_dir_all(&dir);
    }
}
