//! CSV Data Loader Module
//! Reads delimited files into raw string tables using Polars.

use crate::config::Delimiter;
use polars::prelude::*;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum LoaderError {
    #[error("Dataset not found at {0}")]
    FileNotFound(PathBuf),
    #[error("Failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: PolarsError,
    },
}

/// One column of raw cell values, exactly as read (nulls for empty cells).
#[derive(Debug, Clone, PartialEq)]
pub struct RawColumn {
    pub name: String,
    pub values: Vec<Option<String>>,
}

/// Column-major table of untyped cells, before normalization.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawTable {
    pub columns: Vec<RawColumn>,
    height: usize,
}

impl RawTable {
    /// Build a table from columns. All columns must share one height.
    pub fn new(columns: Vec<RawColumn>) -> Self {
        let height = columns.first().map(|c| c.values.len()).unwrap_or(0);
        debug_assert!(columns.iter().all(|c| c.values.len() == height));
        Self { columns, height }
    }

    /// Build a table from a header row and string rows. Empty cells become nulls.
    pub fn from_rows(headers: &[&str], rows: &[&[&str]]) -> Self {
        let columns = headers
            .iter()
            .enumerate()
            .map(|(idx, name)| RawColumn {
                name: name.to_string(),
                values: rows
                    .iter()
                    .map(|row| {
                        row.get(idx)
                            .filter(|cell| !cell.is_empty())
                            .map(|cell| cell.to_string())
                    })
                    .collect(),
            })
            .collect();
        Self {
            columns,
            height: rows.len(),
        }
    }

    /// Number of data rows.
    pub fn height(&self) -> usize {
        self.height
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    pub fn column(&self, name: &str) -> Option<&RawColumn> {
        self.columns.iter().find(|c| c.name == name)
    }
}

/// Handles delimited file loading with Polars.
pub struct DataLoader {
    delimiter: Delimiter,
}

impl Default for DataLoader {
    fn default() -> Self {
        Self::new(Delimiter::Comma)
    }
}

impl DataLoader {
    pub fn new(delimiter: Delimiter) -> Self {
        Self { delimiter }
    }

    /// Load a delimited file, keeping every cell as a string.
    ///
    /// A missing file is reported as [`LoaderError::FileNotFound`]; anything
    /// Polars rejects (empty file, ragged rows, bad quoting) as
    /// [`LoaderError::Parse`].
    pub fn load(&self, path: &Path) -> Result<RawTable, LoaderError> {
        if !path.is_file() {
            return Err(LoaderError::FileNotFound(path.to_path_buf()));
        }

        let parse_err = |source| LoaderError::Parse {
            path: path.to_path_buf(),
            source,
        };

        // Schema inference disabled: every column is read as String
        let df = LazyCsvReader::new(path)
            .with_separator(self.delimiter.as_byte())
            .with_has_header(true)
            .with_infer_schema_length(Some(0))
            .finish()
            .and_then(|lazy| lazy.collect())
            .map_err(parse_err)?;

        let table = Self::to_raw_table(&df).map_err(parse_err)?;
        log::info!(
            "Loaded {} rows, {} columns from {}",
            table.height(),
            table.columns.len(),
            path.display()
        );
        Ok(table)
    }

    fn to_raw_table(df: &DataFrame) -> PolarsResult<RawTable> {
        let columns = df
            .get_columns()
            .iter()
            .map(|col| {
                let series = col.as_materialized_series().cast(&DataType::String)?;
                let values = series
                    .str()?
                    .into_iter()
                    .map(|v| v.map(|s| s.to_string()))
                    .collect();
                Ok(RawColumn {
                    name: col.name().to_string(),
                    values,
                })
            })
            .collect::<PolarsResult<Vec<_>>>()?;

        Ok(RawTable {
            columns,
            height: df.height(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn temp_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("fcp_loader_{name}"));
        let _ = fs::remove_dir_all(&dir);
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn missing_file_is_reported() {
        let err = DataLoader::default()
            .load(Path::new("/definitely/not/here.csv"))
            .unwrap_err();
        assert!(matches!(err, LoaderError::FileNotFound(_)));
    }

    #[test]
    fn loads_comma_file_as_strings() {
        let dir = temp_dir("comma");
        let path = dir.join("data.csv");
        fs::write(&path, "Date,Operator,Fat\n01/03/2020,Acme Air,5\n04/07/2021,,\n").unwrap();

        let table = DataLoader::default().load(&path).unwrap();
        assert_eq!(table.height(), 2);
        assert_eq!(table.column_names(), vec!["Date", "Operator", "Fat"]);
        let fat = table.column("Fat").unwrap();
        assert_eq!(fat.values, vec![Some("5".to_string()), None]);
        let operator = table.column("Operator").unwrap();
        assert_eq!(operator.values[1], None);

        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn loads_tab_file() {
        let dir = temp_dir("tab");
        let path = dir.join("data.tsv");
        fs::write(&path, "date\toperator\n2020-03-01\tAcme, Inc\n").unwrap();

        let table = DataLoader::new(Delimiter::Tab).load(&path).unwrap();
        assert_eq!(table.height(), 1);
        assert_eq!(
            table.column("operator").unwrap().values,
            vec![Some("Acme, Inc".to_string())]
        );

        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn header_only_file_has_no_rows() {
        let dir = temp_dir("header_only");
        let path = dir.join("data.csv");
        fs::write(&path, "date,operator,fatalities\n").unwrap();

        let table = DataLoader::default().load(&path).unwrap();
        assert_eq!(table.height(), 0);
        assert_eq!(table.columns.len(), 3);

        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn ragged_rows_are_a_parse_error() {
        let dir = temp_dir("ragged");
        let path = dir.join("data.csv");
        fs::write(&path, "a,b\n1,2,3\n4\n").unwrap();

        let err = DataLoader::default().load(&path).unwrap_err();
        assert!(matches!(err, LoaderError::Parse { .. }));
        assert!(err.to_string().contains("data.csv"));

        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn empty_file_is_a_parse_error() {
        let dir = temp_dir("zero_bytes");
        let path = dir.join("data.csv");
        fs::write(&path, "").unwrap();

        let err = DataLoader::default().load(&path).unwrap_err();
        assert!(matches!(err, LoaderError::Parse { .. }));

        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn from_rows_treats_empty_cells_as_null() {
        let table = RawTable::from_rows(&["a", "b"], &[&["1", ""], &["", "x"]]);
        assert_eq!(table.height(), 2);
        assert_eq!(table.column("a").unwrap().values, vec![Some("1".into()), None]);
        assert_eq!(table.column("b").unwrap().values, vec![None, Some("x".into())]);
    }
}
