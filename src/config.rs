//! Pipeline Configuration Module
//! One configurable pipeline: delimiter, column synonyms, date convention and file paths.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use thiserror::Error;

pub const DEFAULT_DATA_PATH: &str = "data/flight_crash_data.csv";
pub const DEFAULT_GEOCODE_CACHE_PATH: &str = "data/geocoded_locations.csv";
pub const DEFAULT_NOMINATIM_URL: &str = "https://nominatim.openstreetmap.org/search";
pub const DEFAULT_USER_AGENT: &str = "flight-crash-dashboard";

/// Canonical synonym table (source column -> canonical column).
pub const DEFAULT_SYNONYMS: [(&str, &str); 9] = [
    ("type", "aircraft_type"),
    ("aircraft", "aircraft_type"),
    ("fat", "fatalities"),
    ("dmg_level", "damage_level"),
    ("damage", "damage_level"),
    ("acc.date", "date"),
    ("lat", "latitude"),
    ("lon", "longitude"),
    ("lng", "longitude"),
];

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Invalid config: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Unsupported delimiter {0:?} (expected \",\" or \"\\t\")")]
    InvalidDelimiter(String),
}

/// Field separator of the source file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Delimiter {
    #[default]
    Comma,
    Tab,
}

impl Delimiter {
    pub fn as_byte(self) -> u8 {
        match self {
            Delimiter::Comma => b',',
            Delimiter::Tab => b'\t',
        }
    }
}

impl FromStr for Delimiter {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "," | "comma" => Ok(Delimiter::Comma),
            "\t" | "\\t" | "tab" => Ok(Delimiter::Tab),
            other => Err(ConfigError::InvalidDelimiter(other.to_string())),
        }
    }
}

impl TryFrom<String> for Delimiter {
    type Error = ConfigError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Delimiter> for String {
    fn from(value: Delimiter) -> Self {
        value.to_string()
    }
}

impl fmt::Display for Delimiter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Delimiter::Comma => f.write_str(","),
            Delimiter::Tab => f.write_str("\t"),
        }
    }
}

/// Settings for the external geocoding lookup.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeocoderConfig {
    pub base_url: String,
    pub user_agent: String,
    /// Minimum delay between successive lookups.
    pub min_delay_ms: u64,
    /// Per-request timeout.
    pub timeout_secs: u64,
}

impl Default for GeocoderConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_NOMINATIM_URL.to_string(),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            min_delay_ms: 1000,
            timeout_secs: 10,
        }
    }
}

/// Full pipeline configuration, loadable from TOML.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub data_path: PathBuf,
    pub geocode_cache_path: PathBuf,
    pub delimiter: Delimiter,
    pub date_dayfirst: bool,
    /// Extra synonyms, merged over [`DEFAULT_SYNONYMS`].
    pub column_synonyms: BTreeMap<String, String>,
    pub geocoder: GeocoderConfig,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            data_path: PathBuf::from(DEFAULT_DATA_PATH),
            geocode_cache_path: PathBuf::from(DEFAULT_GEOCODE_CACHE_PATH),
            delimiter: Delimiter::Comma,
            date_dayfirst: true,
            column_synonyms: BTreeMap::new(),
            geocoder: GeocoderConfig::default(),
        }
    }
}

impl PipelineConfig {
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(s)?)
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&text)
    }

    /// Default synonyms with user entries applied on top. Keys are lower-cased.
    pub fn synonym_table(&self) -> BTreeMap<String, String> {
        let mut table: BTreeMap<String, String> = DEFAULT_SYNONYMS
            .iter()
            .map(|(from, to)| (from.to_string(), to.to_string()))
            .collect();
        for (from, to) in &self.column_synonyms {
            table.insert(from.trim().to_lowercase(), to.trim().to_lowercase());
        }
        table
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_dashboard_paths() {
        let config = PipelineConfig::default();
        assert_eq!(config.data_path, PathBuf::from("data/flight_crash_data.csv"));
        assert_eq!(config.delimiter, Delimiter::Comma);
        assert!(config.date_dayfirst);
        assert_eq!(config.geocoder.min_delay_ms, 1000);
    }

    #[test]
    fn parses_partial_toml() {
        let config = PipelineConfig::from_toml_str(
            r#"
            delimiter = "\t"
            date_dayfirst = false

            [column_synonyms]
            "Carrier" = "operator"

            [geocoder]
            min_delay_ms = 1500
            "#,
        )
        .unwrap();

        assert_eq!(config.delimiter, Delimiter::Tab);
        assert!(!config.date_dayfirst);
        assert_eq!(config.geocoder.min_delay_ms, 1500);
        assert_eq!(config.geocoder.timeout_secs, 10);

        let table = config.synonym_table();
        assert_eq!(table.get("carrier").map(String::as_str), Some("operator"));
        assert_eq!(table.get("type").map(String::as_str), Some("aircraft_type"));
    }

    #[test]
    fn rejects_unknown_delimiter() {
        let err = PipelineConfig::from_toml_str(r#"delimiter = ";""#).unwrap_err();
        assert!(err.to_string().contains("Unsupported delimiter"));
        assert!(matches!("|".parse::<Delimiter>(), Err(ConfigError::InvalidDelimiter(_))));
    }

    #[test]
    fn delimiter_accepts_names() {
        assert_eq!("tab".parse::<Delimiter>().unwrap(), Delimiter::Tab);
        assert_eq!("\\t".parse::<Delimiter>().unwrap(), Delimiter::Tab);
        assert_eq!(",".parse::<Delimiter>().unwrap().as_byte(), b',');
    }
}
