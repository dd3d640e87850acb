#![doc = include_str!("../README.md")]

mod amount;
mod columns;
mod dataset;
mod month;
mod report;
mod summary;

pub use amount::Amount;
pub use columns::{ColumnMap, Columns, Field};
pub use dataset::{Dataset, LoadError, Record};
pub use month::Month;
pub use report::{normalize_province, Report};
pub use summary::{
    MonthlyExports, ProvinceQuery, ProvinceSales, Summary, TopImporter, ZeroRateShare,
};
