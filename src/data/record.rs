//! Record Module
//! Normalized accident entries and the immutable dataset that holds them.

use chrono::{Datelike, NaiveDate};
use serde::Serialize;

/// One normalized accident entry.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Record {
    pub date: Option<NaiveDate>,
    pub year: Option<i32>,
    pub aircraft_type: Option<String>,
    pub operator: String,
    pub fatalities: u32,
    pub damage_level: String,
    pub location: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

impl Record {
    /// Build a record with defaults applied, deriving `year` from `date`.
    pub fn new(
        date: Option<NaiveDate>,
        operator: impl Into<String>,
        fatalities: u32,
        damage_level: impl Into<String>,
    ) -> Self {
        Self {
            date,
            year: date.map(|d| d.year()),
            aircraft_type: None,
            operator: operator.into(),
            fatalities,
            damage_level: damage_level.into(),
            location: None,
            latitude: None,
            longitude: None,
        }
    }

    pub fn with_aircraft_type(mut self, aircraft_type: impl Into<String>) -> Self {
        self.aircraft_type = Some(aircraft_type.into());
        self
    }

    pub fn with_location(mut self, location: impl Into<String>) -> Self {
        self.location = Some(location.into());
        self
    }

    pub fn with_coordinates(mut self, latitude: Option<f64>, longitude: Option<f64>) -> Self {
        self.latitude = latitude;
        self.longitude = longitude;
        self
    }

    /// Both coordinates are known.
    pub fn has_coordinates(&self) -> bool {
        self.latitude.is_some() && self.longitude.is_some()
    }
}

/// The full ordered collection of records loaded from one source file.
///
/// Constructed once at load time; filtering borrows from it and never
/// mutates it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Dataset {
    records: Vec<Record>,
    has_coordinate_columns: bool,
}

impl Dataset {
    pub fn new(records: Vec<Record>, has_coordinate_columns: bool) -> Self {
        Self {
            records,
            has_coordinate_columns,
        }
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    /// Borrowed view over every record, in source order.
    pub fn view(&self) -> Vec<&Record> {
        self.records.iter().collect()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Whether latitude/longitude were available as columns (from the
    /// source file or a geocode cache merge).
    pub fn has_coordinate_columns(&self) -> bool {
        self.has_coordinate_columns
    }

    pub fn into_records(self) -> Vec<Record> {
        self.records
    }
}

impl<'a> IntoIterator for &'a Dataset {
    type Item = &'a Record;
    type IntoIter = std::slice::Iter<'a, Record>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}
