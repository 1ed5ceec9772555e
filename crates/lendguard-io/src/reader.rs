//! CSV dataset reader with full input validation.

use std::path::{Path, PathBuf};

use lendguard_tree::FeatureVector;
use tracing::{debug, info, instrument};

use crate::domain::{LabelledDataset, NumericTable};
use crate::IoError;

/// Reads numeric datasets from a CSV file.
///
/// Expected CSV format:
/// - Header row required, one name per column
/// - Every cell a finite float, every row as wide as the header
///
/// The same file can be viewed as raw feature rows ([`DatasetReader::read_features`]),
/// features plus a trailing target ([`DatasetReader::read_labelled`]) or a
/// single named series ([`DatasetReader::read_series`]).
///
/// # Errors
///
/// | Variant | Condition |
/// |---|---|
/// | [`IoError::FileNotFound`] | File doesn't exist or is unreadable |
/// | [`IoError::CsvParse`] | Malformed CSV record |
/// | [`IoError::EmptyDataset`] | Zero data rows after header |
/// | [`IoError::InconsistentRowLength`] | Row has different column count than header |
/// | [`IoError::NonFiniteValue`] | Cell is NaN, Inf, or unparseable float |
#[derive(Debug, Clone)]
pub struct DatasetReader {
    path: PathBuf,
}

impl DatasetReader {
    /// A reader for the CSV file at `path`; nothing is opened until a read.
    pub fn new(path: &Path) -> Self {
        Self {
            path: path.to_path_buf(),
        }
    }

    /// Read and validate every column as a float.
    #[instrument(skip(self), fields(path = %self.path.display()))]
    pub fn read_table(&self) -> Result<NumericTable, IoError> {
        let file = std::fs::File::open(&self.path).map_err(|e| IoError::FileNotFound {
            path: self.path.clone(),
            source: e,
        })?;

        // flexible(true) so short rows reach InconsistentRowLength instead of CsvParse.
        let mut rdr = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .trim(csv::Trim::All)
            .from_reader(file);

        let header = rdr.headers().map_err(|e| self.csv_error(e))?;
        let columns: Vec<String> = header.iter().map(str::to_string).collect();
        let expected = columns.len();
        debug!(expected, "read CSV header");

        let mut rows = Vec::new();
        for (row_index, result) in rdr.records().enumerate() {
            let record = result.map_err(|e| self.csv_error(e))?;
            if record.len() != expected {
                return Err(IoError::InconsistentRowLength {
                    path: self.path.clone(),
                    row_index,
                    expected,
                    got: record.len(),
                });
            }

            let mut values = Vec::with_capacity(expected);
            for (col_index, raw) in record.iter().enumerate() {
                let value = raw
                    .parse::<f64>()
                    .ok()
                    .filter(|v| v.is_finite())
                    .ok_or_else(|| IoError::NonFiniteValue {
                        path: self.path.clone(),
                        row_index,
                        col_index,
                        raw: raw.to_string(),
                    })?;
                values.push(value);
            }
            rows.push(values);
        }

        if rows.is_empty() {
            return Err(IoError::EmptyDataset {
                path: self.path.clone(),
            });
        }

        info!(n_rows = rows.len(), n_columns = expected, "dataset loaded");
        Ok(NumericTable { columns, rows })
    }

    /// Read rows as feature vectors, requiring exactly `n_columns` columns.
    ///
    /// # Errors
    ///
    /// Returns [`IoError::ColumnCount`] on a width mismatch, or any
    /// [`DatasetReader::read_table`] error.
    pub fn read_features(&self, n_columns: usize) -> Result<Vec<FeatureVector>, IoError> {
        let table = self.read_table()?;
        if table.n_columns() != n_columns {
            return Err(IoError::ColumnCount {
                path: self.path.clone(),
                expected: n_columns,
                got: table.n_columns(),
            });
        }
        table
            .rows
            .into_iter()
            .map(|row| FeatureVector::new(row).map_err(IoError::from))
            .collect()
    }

    /// Read features and a target from the last column.
    ///
    /// # Errors
    ///
    /// Returns [`IoError::ColumnCount`] when the file has fewer than two
    /// columns, or any [`DatasetReader::read_table`] error.
    pub fn read_labelled(&self) -> Result<LabelledDataset, IoError> {
        let NumericTable { mut columns, rows } = self.read_table()?;
        if columns.len() < 2 {
            return Err(IoError::ColumnCount {
                path: self.path.clone(),
                expected: 2,
                got: columns.len(),
            });
        }
        let target_name = columns.pop().unwrap_or_default();

        let mut features = Vec::with_capacity(rows.len());
        let mut targets = Vec::with_capacity(rows.len());
        for mut row in rows {
            // Width was checked against the header, so the row is non-empty.
            let target = row.pop().unwrap_or_default();
            features.push(FeatureVector::new(row)?);
            targets.push(target);
        }
        debug!(n_features = columns.len(), target = %target_name, "split target column");
        Ok(LabelledDataset::new(columns, target_name, features, targets))
    }

    /// Read one named column as an ordered series.
    ///
    /// # Errors
    ///
    /// Returns [`IoError::MissingColumn`] when `column` is not in the header,
    /// or any [`DatasetReader::read_table`] error.
    pub fn read_series(&self, column: &str) -> Result<Vec<f64>, IoError> {
        let table = self.read_table()?;
        let index = table
            .column_index(column)
            .ok_or_else(|| IoError::MissingColumn {
                path: self.path.clone(),
                column: column.to_string(),
            })?;
        Ok(table.rows.iter().map(|row| row[index]).collect())
    }

    fn csv_error(&self, e: csv::Error) -> IoError {
        IoError::CsvParse {
            path: self.path.clone(),
            offset: e.position().map_or(0, |p| p.byte()),
            source: e,
        }
    }
}
