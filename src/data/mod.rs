//! Data module - CSV loading, normalization, filtering and export

mod export;
mod filter;
mod loader;
mod normalizer;
mod record;

pub use export::{to_dataframe, write_view_csv, ExportError};
pub use filter::{FilterOptions, FilterSelection, OPERATOR_OPTION_LIMIT};
pub use loader::{DataLoader, LoaderError, RawColumn, RawTable};
pub use normalizer::{
    apply_synonyms, capitalize, coerce_fatalities, normalize_column_name, parse_date,
    NormalizeReport, Normalizer, UNKNOWN,
};
pub use record::{Dataset, Record};
