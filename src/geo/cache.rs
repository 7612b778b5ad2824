//! Geocode Cache Module
//! Location-keyed store of resolved (or failed) coordinate lookups, persisted as CSV.

use crate::data::{normalize_column_name, DataLoader, LoaderError};
use polars::prelude::*;
use std::collections::BTreeMap;
use std::fs::{self, File};
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CacheError {
    #[error(transparent)]
    Load(#[from] LoaderError),
    #[error("Geocode cache is missing the {0:?} column")]
    MissingColumn(&'static str),
    #[error("Polars error: {0}")]
    PolarsError(#[from] PolarsError),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Cached lookup result. Both coordinates `None` means the lookup was
/// attempted and found nothing.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct GeoPoint {
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

impl GeoPoint {
    pub const UNRESOLVED: GeoPoint = GeoPoint {
        latitude: None,
        longitude: None,
    };

    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude: Some(latitude),
            longitude: Some(longitude),
        }
    }

    pub fn is_resolved(&self) -> bool {
        self.latitude.is_some() && self.longitude.is_some()
    }
}

/// Geocode cache keyed by location string. Keys are unique and stored
/// trimmed, the same way record locations are normalized.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GeocodeCache {
    entries: BTreeMap<String, GeoPoint>,
}

impl GeocodeCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace an entry (last write wins).
    pub fn insert(&mut self, location: impl Into<String>, point: GeoPoint) {
        let location = location.into();
        let key = if location.trim().len() == location.len() {
            location
        } else {
            location.trim().to_string()
        };
        self.entries.insert(key, point);
    }

    pub fn get(&self, location: &str) -> Option<&GeoPoint> {
        self.entries.get(location.trim())
    }

    pub fn contains(&self, location: &str) -> bool {
        self.entries.contains_key(location.trim())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &GeoPoint)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Read a cache file with `location, latitude, longitude` columns.
    ///
    /// Locations are trimmed and blank ones skipped. Duplicate locations keep
    /// the last row. Unparseable coordinates are read as missing.
    pub fn load(path: &Path) -> Result<Self, CacheError> {
        let table = DataLoader::default().load(path)?;

        let find = |name: &'static str| {
            table
                .columns
                .iter()
                .find(|c| normalize_column_name(&c.name) == name)
                .ok_or(CacheError::MissingColumn(name))
        };
        let locations = find("location")?;
        let latitudes = find("latitude")?;
        let longitudes = find("longitude")?;

        let parse = |v: &Option<String>| v.as_deref().and_then(|s| s.trim().parse::<f64>().ok());

        let mut cache = Self::new();
        for row in 0..table.height() {
            let Some(location) = locations.values[row]
                .as_deref()
                .map(str::trim)
                .filter(|l| !l.is_empty())
            else {
                continue;
            };
            cache.insert(
                location,
                GeoPoint {
                    latitude: parse(&latitudes.values[row]),
                    longitude: parse(&longitudes.values[row]),
                },
            );
        }

        log::info!("Loaded {} geocode cache entries from {}", cache.len(), path.display());
        Ok(cache)
    }

    /// Like [`GeocodeCache::load`], but a missing file yields `None`.
    pub fn load_if_exists(path: &Path) -> Result<Option<Self>, CacheError> {
        match Self::load(path) {
            Ok(cache) => Ok(Some(cache)),
            Err(CacheError::Load(LoaderError::FileNotFound(_))) => {
                log::info!("No geocode cache at {}", path.display());
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }

    /// Overwrite `path` with every entry, creating parent directories.
    pub fn save(&self, path: &Path) -> Result<(), CacheError> {
        let locations: Vec<&str> = self.entries.keys().map(String::as_str).collect();
        let latitudes: Vec<Option<f64>> = self.entries.values().map(|p| p.latitude).collect();
        let longitudes: Vec<Option<f64>> = self.entries.values().map(|p| p.longitude).collect();

        let mut df = DataFrame::new(vec![
            Column::new("location".into(), locations),
            Column::new("latitude".into(), latitudes),
            Column::new("longitude".into(), longitudes),
        ])?;

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        let mut file = File::create(path)?;
        CsvWriter::new(&mut file).include_header(true).finish(&mut df)?;

        log::info!("Saved {} geocode cache entries to {}", self.len(), path.display());
        Ok(())
    }
}

impl FromIterator<(String, GeoPoint)> for GeocodeCache {
    fn from_iter<I: IntoIterator<Item = (String, GeoPoint)>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}
