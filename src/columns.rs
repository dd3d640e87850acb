use anyhow::{anyhow, bail, Context, Result};
use regex::Regex;

use std::{
    collections::BTreeMap,
    fmt::Display,
    fs::File,
    io::{BufRead, BufReader},
    path::Path,
    str::FromStr,
};

/// A logical column the report reads, independent of what the data file
/// happens to call it.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub enum Field {
    Province,
    TotalSales,
    Exports,
    Imports,
    ZeroRateSales,
    Month,
    Date,
}

impl Field {
    pub const ALL: [Field; 7] = [
        Field::Province,
        Field::TotalSales,
        Field::Exports,
        Field::Imports,
        Field::ZeroRateSales,
        Field::Month,
        Field::Date,
    ];

    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Field::Province => "PROVINCE",
            Field::TotalSales => "TOTAL_SALES",
            Field::Exports => "EXPORTS",
            Field::Imports => "IMPORTS",
            Field::ZeroRateSales => "ZERO_RATE_SALES",
            Field::Month => "MONTH",
            Field::Date => "DATE",
        }
    }

    fn default_pattern(self) -> &'static str {
        match self {
            Field::Province => "(?i)^PROVINCIA$",
            Field::TotalSales => "(?i)^TOTAL_VENTAS$",
            Field::Exports => "(?i)^EXPORTACIONES$",
            Field::Imports => "(?i)^IMPORTACIONES$",
            Field::ZeroRateSales => "(?i)^VENTAS(_NETAS)?_TARIFA_0$",
            Field::Month => "(?i)^MES$",
            Field::Date => "(?i)^FECHA$",
        }
    }
}

impl Display for Field {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Field {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let s = s.trim();
        Field::ALL
            .into_iter()
            .find(|f| f.name().eq_ignore_ascii_case(s))
            .ok_or_else(|| anyhow!("unknown field {s:?}"))
    }
}

/// Maps each [`Field`] to a pattern matching the column name(s) it may appear
/// under.
///
/// [`Columns::default`] knows the SRI dataset's column names, in any case,
/// including both spellings of the zero-rate sales column (`VENTAS_TARIFA_0`
/// and `VENTAS_NETAS_TARIFA_0`). Use [`Columns::set`] or [`Columns::read_file`]
/// to override individual fields.
#[derive(Debug, Clone)]
pub struct Columns(BTreeMap<Field, Regex>);

impl Default for Columns {
    fn default() -> Self {
        Self(
            Field::ALL
                .into_iter()
                .map(|f| {
                    let regex = Regex::new(f.default_pattern())
                        .expect("built-in column patterns are valid");
                    (f, regex)
                })
                .collect(),
        )
    }
}

impl Columns {
    /// Reads column overrides from `path`, on top of the defaults.
    ///
    /// The file holds one override per line, in the following format:
    ///
    /// ```txt
    /// FIELD | COLUMN_REGEX
    /// ```
    ///
    /// For example, to read zero-rate sales from a column called `TARIFA_CERO`:
    ///
    /// ```txt
    /// ZERO_RATE_SALES | ^TARIFA_CERO$
    /// ```
    ///
    /// Blank lines and lines starting with `#` are ignored.
    ///
    /// # Errors
    ///
    /// Returns errors if:
    /// * The file cannot be opened
    /// * The file cannot be read
    /// * There is a line with an invalid format (no `|` character)
    /// * `FIELD` is not one of the names listed in [`Field::name`]
    /// * `COLUMN_REGEX` is an invalid regular expression
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let mut columns = Self::default();
        columns.read_file(path)?;
        Ok(columns)
    }

    /// Applies the overrides in `path` to this configuration. See
    /// [`Columns::from_file`] for the format.
    ///
    /// # Errors
    ///
    /// As for [`Columns::from_file`].
    pub fn read_file(&mut self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let file = BufReader::new(
            File::open(path).with_context(|| format!("opening {}", path.display()))?,
        );
        for line in file.lines() {
            let line = line?;
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let Some((field, regex_str)) = line.split_once(" | ") else {
                bail!("reading {path:?}: bad line format (missing |): {line}");
            };
            let field = field
                .parse()
                .with_context(|| format!("reading {path:?}: {line}"))?;
            self.set(field, regex_str)
                .with_context(|| format!("reading {path:?}: {line}"))?;
        }
        Ok(())
    }

    /// Makes `field` match columns whose name matches `regex_str`.
    ///
    /// # Errors
    ///
    /// Returns any errors from compiling `regex_str` with [`Regex::new`].
    pub fn set(&mut self, field: Field, regex_str: &str) -> Result<()> {
        self.0.insert(field, Regex::new(regex_str.trim())?);
        Ok(())
    }

    /// Returns the first header, in header order, that `field` matches.
    ///
    /// # Examples
    ///
    /// ```
    /// # use sri_sales::{Columns, Field};
    /// let columns = Columns::default();
    /// let headers = ["PROVINCIA", "VENTAS_TARIFA_0"];
    /// assert_eq!(columns.column_for(Field::ZeroRateSales, headers), Some("VENTAS_TARIFA_0"));
    /// assert_eq!(columns.column_for(Field::Imports, headers), None);
    /// ```
    #[must_use]
    pub fn column_for<'h, I>(&self, field: Field, headers: I) -> Option<&'h str>
    where
        I: IntoIterator<Item = &'h str>,
    {
        let regex = self.0.get(&field)?;
        headers.into_iter().find(|h| regex.is_match(h))
    }

    /// Resolves every field against `headers` at once.
    #[must_use]
    pub fn resolve(&self, headers: &[String]) -> ColumnMap {
        ColumnMap(
            Field::ALL
                .into_iter()
                .filter_map(|f| {
                    self.column_for(f, headers.iter().map(String::as_str))
                        .map(|h| (f, h.to_string()))
                })
                .collect(),
        )
    }
}

/// The column name each [`Field`] was found under in a particular file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ColumnMap(BTreeMap<Field, String>);

impl ColumnMap {
    #[must_use]
    pub fn get(&self, field: Field) -> Option<&str> {
        self.0.get(&field).map(String::as_str)
    }

    #[must_use]
    pub fn contains(&self, field: Field) -> bool {
        self.0.contains_key(&field)
    }

    /// Fields that no header matched.
    pub fn missing(&self) -> impl Iterator<Item = Field> + '_ {
        Field::ALL.into_iter().filter(|f| !self.contains(*f))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn headers(names: &[&str]) -> Vec<String> {
        names.iter().map(ToString::to_string).collect()
    }

    #[test]
    fn default_columns_resolve_both_zero_rate_spellings() {
        let columns = Columns::default();
        let map = columns.resolve(&headers(&["PROVINCIA", "VENTAS_NETAS_TARIFA_0"]));
        assert_eq!(map.get(Field::ZeroRateSales), Some("VENTAS_NETAS_TARIFA_0"));
        let map = columns.resolve(&headers(&["PROVINCIA", "VENTAS_TARIFA_0"]));
        assert_eq!(map.get(Field::ZeroRateSales), Some("VENTAS_TARIFA_0"));
    }

    #[test]
    fn default_columns_ignore_header_case() {
        let map = Columns::default().resolve(&headers(&["Provincia", "total_ventas"]));
        assert_eq!(map.get(Field::Province), Some("Provincia"));
        assert_eq!(map.get(Field::TotalSales), Some("total_ventas"));
    }

    #[test]
    fn resolve_fn_picks_first_matching_header() {
        let mut columns = Columns::default();
        columns.set(Field::TotalSales, "^TOTAL").unwrap();
        let map = columns.resolve(&headers(&["PROVINCIA", "TOTAL_COMPRAS", "TOTAL_VENTAS"]));
        assert_eq!(map.get(Field::TotalSales), Some("TOTAL_COMPRAS"));
    }

    #[test]
    fn resolve_fn_leaves_unmatched_fields_missing() {
        let map = Columns::default().resolve(&headers(&["PROVINCIA", "FECHA"]));
        assert!(map.contains(Field::Date));
        assert!(!map.contains(Field::Month));
        let missing: Vec<_> = map.missing().collect();
        assert!(missing.contains(&Field::TotalSales));
        assert!(!missing.contains(&Field::Province));
    }

    #[test]
    fn from_file_fn_applies_overrides_on_top_of_defaults() {
        let columns = Columns::from_file("testdata/columns").unwrap();
        let map = columns.resolve(&headers(&["PROVINCIA", "TARIFA_CERO", "MES"]));
        assert_eq!(map.get(Field::ZeroRateSales), Some("TARIFA_CERO"));
        assert_eq!(map.get(Field::Province), Some("PROVINCIA"));
        assert_eq!(map.get(Field::Month), None);
    }

    #[test]
    fn from_file_fn_returns_error_for_bad_line_format() {
        assert!(Columns::from_file("testdata/columns.bad").is_err());
    }

    #[test]
    fn from_file_fn_returns_error_for_missing_file() {
        assert!(Columns::from_file("testdata/bogus").is_err());
    }

    #[test]
    fn field_names_parse_case_insensitively() {
        assert_eq!("zero_rate_sales".parse::<Field>().unwrap(), Field::ZeroRateSales);
        assert!("VOLUME".parse::<Field>().is_err());
    }

    #[test]
    fn set_fn_rejects_invalid_regex() {
        let mut columns = Columns::default();
        assert!(columns.set(Field::Exports, "(unclosed").is_err());
    }
}
