//! Pipeline Module
//! Load -> normalize -> geo-merge, producing the session's dataset.

use crate::config::PipelineConfig;
use crate::data::{DataLoader, Dataset, LoaderError, NormalizeReport, Normalizer};
use crate::geo::{merge_geocodes, CacheError, GeocodeCache};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error(transparent)]
    Load(#[from] LoaderError),
    #[error("Failed to read geocode cache: {0}")]
    Cache(#[from] CacheError),
}

/// Dataset loaded for a session, with what normalization had to fix up.
#[derive(Debug, Clone)]
pub struct LoadedDataset {
    pub dataset: Dataset,
    pub report: NormalizeReport,
}

/// Load and normalize the configured source file without touching the
/// geocode cache.
pub fn load_dataset(config: &PipelineConfig) -> Result<LoadedDataset, PipelineError> {
    let table = DataLoader::new(config.delimiter).load(&config.data_path)?;
    let (dataset, report) = Normalizer::from_config(config).normalize(&table);
    Ok(LoadedDataset { dataset, report })
}

/// Load, normalize, then merge coordinates from the geocode cache when the
/// source has none. A missing cache file is not an error.
pub fn load_with_geocodes(config: &PipelineConfig) -> Result<LoadedDataset, PipelineError> {
    let LoadedDataset { dataset, report } = load_dataset(config)?;
    if dataset.has_coordinate_columns() {
        return Ok(LoadedDataset { dataset, report });
    }

    let dataset = match GeocodeCache::load_if_exists(&config.geocode_cache_path)? {
        Some(cache) => merge_geocodes(dataset, &cache),
        None => dataset,
    };
    Ok(LoadedDataset { dataset, report })
}
