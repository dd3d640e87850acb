use tracing::debug;

use std::collections::{BTreeMap, HashMap};

use crate::{
    amount::Amount,
    columns::Field,
    dataset::{Dataset, Record},
    month::Month,
    summary::{ProvinceQuery, Summary},
};

/// Literal header token that sometimes turns up again as data, for example
/// when files are concatenated.
const PROVINCE_HEADER: &str = "PROVINCIA";

/// Normalizes a province name for grouping: trimmed and upper-cased.
///
/// Returns `None` for names that don't identify a province: empty ones, and
/// the repeated header token `PROVINCIA`.
///
/// # Examples
///
/// ```
/// # use sri_sales::normalize_province;
/// assert_eq!(normalize_province(" Pichincha "), Some("PICHINCHA".into()));
/// assert_eq!(normalize_province("   "), None);
/// assert_eq!(normalize_province("provincia"), None);
/// ```
#[must_use]
pub fn normalize_province(name: &str) -> Option<String> {
    let name = name.trim().to_uppercase();
    (!name.is_empty() && name != PROVINCE_HEADER).then_some(name)
}

/// Answers questions about a loaded [`Dataset`].
///
/// Every query folds over the records afresh and returns its own result, so
/// queries can be made in any order, any number of times. Values that don't
/// parse count as zero; they never cause a query to fail.
///
/// To get a printable version of all the statistics at once, use
/// [`Report::summary`].
#[derive(Debug, Default)]
pub struct Report {
    data: Dataset,
}

impl Report {
    #[must_use]
    pub fn new(data: Dataset) -> Self {
        Self { data }
    }

    #[must_use]
    pub fn dataset(&self) -> &Dataset {
        &self.data
    }

    /// Returns the normalized province of `record`, if it has one. A repeated
    /// header row has none, whatever the province column is called.
    fn province(&self, record: &Record) -> Option<String> {
        let column = self.data.columns().get(Field::Province)?;
        let province = normalize_province(record.get(column)?)?;
        (province != column.to_uppercase()).then_some(province)
    }

    fn amount(&self, record: &Record, field: Field) -> Amount {
        Amount::parse_or_zero(self.data.value(record, field))
    }

    /// Returns total sales for each province.
    ///
    /// Rows without a province are left out. A row whose sales figure doesn't
    /// parse still puts its province in the result, contributing zero.
    #[must_use]
    pub fn sales_by_province(&self) -> BTreeMap<String, Amount> {
        let mut totals: BTreeMap<String, Amount> = BTreeMap::new();
        for record in self.data.records() {
            let Some(province) = self.province(record) else {
                continue;
            };
            *totals.entry(province).or_default() += self.amount(record, Field::TotalSales);
        }
        totals
    }

    /// Returns total sales for the province `name`, normalized the same way
    /// as the data.
    ///
    /// A province with no rows at all has sales of zero; use
    /// [`Report::has_province`] to tell that apart from a province whose rows
    /// add up to zero.
    #[must_use]
    pub fn sales_for_province(&self, name: &str) -> Amount {
        let Some(wanted) = normalize_province(name) else {
            return Amount::default();
        };
        self.data
            .records()
            .iter()
            .filter(|r| self.province(r).as_deref() == Some(wanted.as_str()))
            .map(|r| self.amount(r, Field::TotalSales))
            .sum()
    }

    /// Reports whether any row belongs to the province `name`.
    #[must_use]
    pub fn has_province(&self, name: &str) -> bool {
        let Some(wanted) = normalize_province(name) else {
            return false;
        };
        self.data
            .records()
            .iter()
            .any(|r| self.province(r).as_deref() == Some(wanted.as_str()))
    }

    /// Returns total exports for each month, in month order.
    ///
    /// The month comes from the month column if the file has one, and
    /// otherwise from the `YYYY-MM-DD` date column. Rows with no valid month
    /// are left out.
    #[must_use]
    pub fn exports_by_month(&self) -> BTreeMap<Month, Amount> {
        let by_month_column = self.data.columns().contains(Field::Month);
        let mut totals: BTreeMap<Month, Amount> = BTreeMap::new();
        let mut dropped = 0;
        for record in self.data.records() {
            let month = if by_month_column {
                self.data
                    .value(record, Field::Month)
                    .and_then(Month::from_field)
            } else {
                self.data.value(record, Field::Date).and_then(Month::from_date)
            };
            let Some(month) = month else {
                dropped += 1;
                continue;
            };
            *totals.entry(month).or_default() += self.amount(record, Field::Exports);
        }
        if dropped > 0 {
            debug!(dropped, "rows without a valid month");
        }
        totals
    }

    /// Returns the province with the largest total imports, and that total.
    ///
    /// When several provinces share the largest total, the one that appears
    /// first in the file wins. Only provinces with at least one usable import
    /// figure take part. If there are none, or the largest total is negative,
    /// the result is `("", 0.0)`.
    #[must_use]
    pub fn top_importer(&self) -> (String, Amount) {
        let mut totals: Vec<(String, Amount)> = Vec::new();
        let mut index: HashMap<String, usize> = HashMap::new();
        for record in self.data.records() {
            let Some(province) = self.province(record) else {
                continue;
            };
            let Some(imports) = self
                .data
                .value(record, Field::Imports)
                .and_then(|v| v.parse::<Amount>().ok())
            else {
                continue;
            };
            let i = *index.entry(province.clone()).or_insert_with(|| {
                totals.push((province, Amount::default()));
                totals.len() - 1
            });
            totals[i].1 += imports;
        }
        let mut best: Option<(String, Amount)> = None;
        for (province, total) in totals {
            if best.as_ref().map_or(true, |(_, max)| total > *max) {
                best = Some((province, total));
            }
        }
        match best {
            Some((province, total)) if total >= Amount::default() => (province, total),
            _ => (String::new(), Amount::default()),
        }
    }

    /// Returns, for each province, zero-rate sales as a percentage of total
    /// sales.
    ///
    /// A province whose total sales are zero or less gets 0%. Percentages are
    /// kept within `0..=100` even if the figures are inconsistent.
    #[must_use]
    pub fn zero_rate_share_by_province(&self) -> BTreeMap<String, f64> {
        let mut sums: BTreeMap<String, (Amount, Amount)> = BTreeMap::new();
        for record in self.data.records() {
            let Some(province) = self.province(record) else {
                continue;
            };
            let (zero_rate, total) = sums.entry(province).or_default();
            *zero_rate += self.amount(record, Field::ZeroRateSales);
            *total += self.amount(record, Field::TotalSales);
        }
        sums.into_iter()
            .map(|(province, (zero_rate, total))| (province, percentage(zero_rate, total)))
            .collect()
    }

    /// Returns provinces sorted by total sales, descending.
    ///
    /// Provinces with identical sales are sorted alphabetically.
    #[must_use]
    pub fn provinces_by_sales(&self) -> Vec<(String, Amount)> {
        let mut provinces: Vec<_> = self.sales_by_province().into_iter().collect();
        provinces.sort_by(|(_, a), (_, b)| b.value().total_cmp(&a.value()));
        provinces
    }

    /// Returns the `n` provinces with the highest zero-rate percentage,
    /// descending.
    ///
    /// Provinces with identical percentages are sorted alphabetically.
    #[must_use]
    pub fn top_zero_rate(&self, n: usize) -> Vec<(String, f64)> {
        let mut shares: Vec<_> = self.zero_rate_share_by_province().into_iter().collect();
        shares.sort_by(|(_, a), (_, b)| b.total_cmp(a));
        shares.truncate(n);
        shares
    }

    /// Gathers every statistic into a [`Summary`], looking up each of
    /// `queries` by name and keeping the `top` highest zero-rate percentages.
    #[must_use]
    pub fn summary<S: AsRef<str>>(&self, queries: &[S], top: usize) -> Summary {
        Summary {
            sales_by_province: self
                .provinces_by_sales()
                .into_iter()
                .map(Into::into)
                .collect(),
            queries: queries
                .iter()
                .map(|q| {
                    let query = q.as_ref();
                    ProvinceQuery {
                        query: query.trim().to_string(),
                        province: normalize_province(query).unwrap_or_default(),
                        sales: self.sales_for_province(query),
                        found: self.has_province(query),
                    }
                })
                .collect(),
            exports_by_month: self
                .exports_by_month()
                .into_iter()
                .map(Into::into)
                .collect(),
            top_importer: self.top_importer().into(),
            zero_rate_top: self.top_zero_rate(top).into_iter().map(Into::into).collect(),
        }
    }
}

/// `part` as a percentage of `whole`, within `0..=100`. Zero when `whole` is
/// not positive or the sums have overflowed into something meaningless.
fn percentage(part: Amount, whole: Amount) -> f64 {
    let (part, whole) = (part.value(), whole.value());
    if whole <= 0.0 || whole.is_nan() {
        return 0.0;
    }
    let share = part * 100.0 / whole;
    if share.is_nan() {
        0.0
    } else {
        share.clamp(0.0, 100.0)
    }
}
