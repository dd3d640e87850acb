use thiserror::Error;
use tracing::{debug, warn};

use std::{collections::HashMap, fs::File, io::Read, path::Path};

use crate::columns::{ColumnMap, Columns, Field};

/// Reasons a data file could not be loaded.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("cannot open data file: {0}")]
    Io(#[from] std::io::Error),
    #[error("cannot parse data file: {0}")]
    Csv(#[from] csv::Error),
}

/// One row of the data file, as a mapping from column name to raw value.
///
/// No conversion is done on the values; a row that was shorter than the
/// header simply lacks the trailing columns. If a column name appears more
/// than once in the header, the first column with that name is kept.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Record(HashMap<String, String>);

impl Record {
    #[must_use]
    pub fn get(&self, column: &str) -> Option<&str> {
        self.0.get(column).map(String::as_str)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Record {
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        let mut fields = HashMap::new();
        for (k, v) in iter {
            fields.entry(k.into()).or_insert_with(|| v.into());
        }
        Self(fields)
    }
}

/// The records of a pipe-delimited data file, in file order.
///
/// Holds the header names and the [`ColumnMap`] they resolved to, so that
/// values can be looked up by [`Field`] rather than by column name.
#[derive(Debug, Clone, Default)]
pub struct Dataset {
    headers: Vec<String>,
    columns: ColumnMap,
    records: Vec<Record>,
}

impl Dataset {
    /// Loads the data file at `path`.
    ///
    /// Any failure to open or parse the file is logged, and yields an empty
    /// dataset, so callers need only check [`Dataset::is_empty`].
    pub fn load(path: impl AsRef<Path>, columns: &Columns) -> Self {
        let path = path.as_ref();
        match Self::read(path, columns) {
            Ok(dataset) => dataset,
            Err(e) => {
                warn!(path = %path.display(), "{e}");
                Self::default()
            }
        }
    }

    /// Loads the data file at `path`, reporting why it failed if it did.
    ///
    /// # Errors
    ///
    /// Returns [`LoadError`] if the file cannot be opened, or is not valid
    /// UTF-8 delimited text.
    pub fn read(path: impl AsRef<Path>, columns: &Columns) -> Result<Self, LoadError> {
        let path = path.as_ref();
        let dataset = Self::from_reader(File::open(path)?, columns)?;
        debug!(
            path = %path.display(),
            records = dataset.len(),
            "loaded data file"
        );
        Ok(dataset)
    }

    /// Parses pipe-delimited data from `rdr`. The first line names the
    /// columns.
    ///
    /// # Errors
    ///
    /// Returns [`LoadError`] if reading fails or the data is not valid UTF-8.
    pub fn from_reader(rdr: impl Read, columns: &Columns) -> Result<Self, LoadError> {
        let mut rdr = csv::ReaderBuilder::new()
            .delimiter(b'|')
            .flexible(true)
            .quoting(false)
            .from_reader(rdr);
        let headers: Vec<String> = rdr
            .headers()?
            .iter()
            .map(|h| h.trim_start_matches('\u{feff}').trim().to_string())
            .collect();
        let mut records: Vec<Record> = Vec::new();
        let mut ragged = 0;
        for result in rdr.records() {
            let row = result?;
            if row.len() != headers.len() {
                ragged += 1;
            }
            records.push(
                headers
                    .iter()
                    .zip(row.iter())
                    .map(|(h, v)| (h.as_str(), v))
                    .collect(),
            );
        }
        if ragged > 0 {
            debug!(ragged, "rows with a different field count than the header");
        }
        let resolved = columns.resolve(&headers);
        for field in resolved.missing() {
            debug!(%field, "no column found");
        }
        Ok(Self {
            headers,
            columns: resolved,
            records,
        })
    }

    #[must_use]
    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    #[must_use]
    pub fn columns(&self) -> &ColumnMap {
        &self.columns
    }

    #[must_use]
    pub fn records(&self) -> &[Record] {
        &self.records
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Returns the raw value of `field` in `record`, if the file has a column
    /// for it and the row reaches that column.
    #[must_use]
    pub fn value<'a>(&self, record: &'a Record, field: Field) -> Option<&'a str> {
        record.get(self.columns.get(field)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn read_fn_correctly_parses_sample_data() {
        let data = Dataset::read("testdata/ventas.csv", &Columns::default()).unwrap();
        assert_eq!(data.len(), 10, "wrong record count");
        assert_eq!(data.headers()[0], "AÑO");
        let first = &data.records()[0];
        assert_eq!(first.get("PROVINCIA"), Some("PICHINCHA"));
        assert_eq!(data.value(first, Field::TotalSales), Some("1000.0"));
        assert_eq!(data.columns().get(Field::ZeroRateSales), Some("VENTAS_NETAS_TARIFA_0"));
    }

    #[test]
    fn read_fn_returns_error_for_missing_file() {
        let err = Dataset::read("testdata/bogus.csv", &Columns::default()).unwrap_err();
        assert!(matches!(err, LoadError::Io(_)));
    }

    #[test]
    fn load_fn_returns_empty_dataset_for_missing_file() {
        let data = Dataset::load("testdata/bogus.csv", &Columns::default());
        assert!(data.is_empty());
        assert!(data.headers().is_empty());
    }

    #[test]
    fn load_fn_returns_empty_dataset_for_header_only_file() {
        let data = Dataset::load("testdata/header_only.csv", &Columns::default());
        assert!(data.is_empty());
        assert_eq!(data.columns().get(Field::Province), Some("PROVINCIA"));
    }

    #[test]
    fn from_reader_fn_tolerates_ragged_rows() {
        let input = "PROVINCIA|TOTAL_VENTAS|IMPORTACIONES\nAZUAY|10\nLOJA|5|1|extra\n";
        let data = Dataset::from_reader(input.as_bytes(), &Columns::default()).unwrap();
        assert_eq!(data.len(), 2);
        let short = &data.records()[0];
        assert_eq!(short.len(), 2);
        assert_eq!(data.value(short, Field::Imports), None);
        let long = &data.records()[1];
        assert_eq!(long.len(), 3);
        assert_eq!(data.value(long, Field::Imports), Some("1"));
    }

    #[test]
    fn from_reader_fn_keeps_first_of_repeated_columns() {
        let input = "PROVINCIA|TOTAL_VENTAS|TOTAL_VENTAS\nNAPO|5|7\n";
        let data = Dataset::from_reader(input.as_bytes(), &Columns::default()).unwrap();
        let record = &data.records()[0];
        assert_eq!(record.len(), 2);
        assert_eq!(data.value(record, Field::TotalSales), Some("5"));
    }

    #[test]
    fn from_reader_fn_strips_bom_and_padding_from_headers() {
        let input = "\u{feff}PROVINCIA | TOTAL_VENTAS\nAZUAY|10\n";
        let data = Dataset::from_reader(input.as_bytes(), &Columns::default()).unwrap();
        assert_eq!(data.headers(), ["PROVINCIA", "TOTAL_VENTAS"]);
        assert_eq!(data.value(&data.records()[0], Field::Province), Some("AZUAY"));
    }

    #[test]
    fn from_reader_fn_keeps_quotes_literally() {
        let input = "PROVINCIA|TOTAL_VENTAS\n\"EL ORO|7\n";
        let data = Dataset::from_reader(input.as_bytes(), &Columns::default()).unwrap();
        assert_eq!(data.records()[0].get("PROVINCIA"), Some("\"EL ORO"));
    }

    #[test]
    fn from_reader_fn_returns_error_for_invalid_utf8() {
        let input: &[u8] = b"PROVINCIA|TOTAL_VENTAS\nAZUAY|\xff\xfe\n";
        assert!(matches!(
            Dataset::from_reader(input, &Columns::default()),
            Err(LoadError::Csv(_))
        ));
    }
}
