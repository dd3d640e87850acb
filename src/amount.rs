use anyhow::bail;
use serde::Serialize;

use std::{
    fmt::{Debug, Display},
    iter::Sum,
    ops::AddAssign,
    str::FromStr,
};

/// Represents an amount of money, as reported in the SRI dataset.
///
/// The amount is stored as a floating-point number of dollars. The [`Display`]
/// implementation formats it with a `$` sign, thousands separators and 2
/// decimal places, and honours any width or alignment given in the format
/// string.
#[derive(Clone, Copy, Default, PartialEq, PartialOrd, Serialize)]
#[serde(transparent)]
pub struct Amount(f64);

impl Amount {
    #[must_use]
    pub fn new(value: f64) -> Self {
        Self(value)
    }

    #[must_use]
    pub fn value(self) -> f64 {
        self.0
    }

    /// Parses a raw field value, treating a missing or unparseable field as
    /// zero.
    ///
    /// # Examples
    ///
    /// ```
    /// # use sri_sales::Amount;
    /// assert_eq!(Amount::parse_or_zero(Some(" 12.5 ")), Amount::new(12.5));
    /// assert_eq!(Amount::parse_or_zero(Some("abc")), Amount::default());
    /// assert_eq!(Amount::parse_or_zero(None), Amount::default());
    /// ```
    #[must_use]
    pub fn parse_or_zero(field: Option<&str>) -> Self {
        field.and_then(|s| s.parse().ok()).unwrap_or_default()
    }
}

impl Debug for Amount {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        Display::fmt(self, f)
    }
}

impl Display for Amount {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let fixed = format!("{:.2}", self.0.abs());
        let (whole, cents) = fixed.split_once('.').unwrap_or((fixed.as_str(), "00"));
        let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
        for (i, digit) in whole.chars().enumerate() {
            if i > 0 && (whole.len() - i) % 3 == 0 {
                grouped.push(',');
            }
            grouped.push(digit);
        }
        let sign = if self.0 < 0.0 && fixed != "0.00" { "-" } else { "" };
        f.pad(&format!("{sign}${grouped}.{cents}"))
    }
}

impl FromStr for Amount {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let value: f64 = s.trim().parse()?;
        if !value.is_finite() {
            bail!("amount is not a finite number: {s:?}");
        }
        Ok(Self(value))
    }
}

impl AddAssign for Amount {
    fn add_assign(&mut self, rhs: Self) {
        self.0 += rhs.0;
    }
}

impl Sum for Amount {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::default(), |mut acc, a| {
            acc += a;
            acc
        })
    }
}
