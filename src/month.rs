use chrono::{Datelike, NaiveDate};
use serde::Serialize;

use std::fmt::Display;

/// A calendar month, numbered 1 (January) to 12 (December).
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
#[serde(transparent)]
pub struct Month(u32);

impl Month {
    /// Returns the month numbered `n`, or `None` if `n` is outside `1..=12`.
    #[must_use]
    pub fn new(n: u32) -> Option<Self> {
        (1..=12).contains(&n).then_some(Self(n))
    }

    #[must_use]
    pub fn number(self) -> u32 {
        self.0
    }

    /// Reads a month from a numeric month field such as `MES`.
    ///
    /// ```
    /// # use sri_sales::Month;
    /// assert_eq!(Month::from_field(" 3 ").map(Month::number), Some(3));
    /// assert_eq!(Month::from_field("13"), None);
    /// assert_eq!(Month::from_field("marzo"), None);
    /// ```
    #[must_use]
    pub fn from_field(field: &str) -> Option<Self> {
        field.trim().parse().ok().and_then(Self::new)
    }

    /// Reads the month out of a `YYYY-MM-DD` date field such as `FECHA`.
    ///
    /// ```
    /// # use sri_sales::Month;
    /// assert_eq!(Month::from_date("2024-07-15").map(Month::number), Some(7));
    /// assert_eq!(Month::from_date("2024-02-30"), None);
    /// assert_eq!(Month::from_date("15/07/2024"), None);
    /// ```
    #[must_use]
    pub fn from_date(field: &str) -> Option<Self> {
        NaiveDate::parse_from_str(field.trim(), "%Y-%m-%d")
            .ok()
            .and_then(|date| Self::new(date.month()))
    }
}

impl Display for Month {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        Display::fmt(&self.0, f)
    }
}
