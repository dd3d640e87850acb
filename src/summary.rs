use serde::Serialize;

use std::fmt::{self, Display, Formatter};

use crate::{amount::Amount, month::Month};

/// Every statistic a [`Report`](crate::Report) produces, ready for printing.
///
/// The [`Display`] implementation prints one aligned table per section; the
/// [`Serialize`] implementation gives the same data as JSON.
#[derive(Debug, Default, Serialize)]
pub struct Summary {
    pub sales_by_province: Vec<ProvinceSales>,
    pub queries: Vec<ProvinceQuery>,
    pub exports_by_month: Vec<MonthlyExports>,
    pub top_importer: TopImporter,
    pub zero_rate_top: Vec<ZeroRateShare>,
}

#[derive(Debug, Serialize)]
pub struct ProvinceSales {
    pub province: String,
    pub sales: Amount,
}

impl From<(String, Amount)> for ProvinceSales {
    fn from((province, sales): (String, Amount)) -> Self {
        Self { province, sales }
    }
}

/// The result of looking up one province by name.
#[derive(Debug, Serialize)]
pub struct ProvinceQuery {
    /// The name as it was asked for.
    pub query: String,
    /// The normalized name that was looked up.
    pub province: String,
    pub sales: Amount,
    /// Whether the data has any rows for this province at all.
    pub found: bool,
}

#[derive(Debug, Serialize)]
pub struct MonthlyExports {
    pub month: Month,
    pub exports: Amount,
}

impl From<(Month, Amount)> for MonthlyExports {
    fn from((month, exports): (Month, Amount)) -> Self {
        Self { month, exports }
    }
}

/// The province with the largest imports; `province` is empty if there was no
/// import data.
#[derive(Debug, Default, Serialize)]
pub struct TopImporter {
    pub province: String,
    pub imports: Amount,
}

impl From<(String, Amount)> for TopImporter {
    fn from((province, imports): (String, Amount)) -> Self {
        Self { province, imports }
    }
}

#[derive(Debug, Serialize)]
pub struct ZeroRateShare {
    pub province: String,
    pub percent: f64,
}

impl From<(String, f64)> for ZeroRateShare {
    fn from((province, percent): (String, f64)) -> Self {
        Self { province, percent }
    }
}

const AMOUNT_WIDTH: usize = 18;

/// Writes a two-column table: a left-aligned label and a right-aligned value.
fn table<'a, I>(f: &mut Formatter<'_>, title: &str, heads: (&str, &str), rows: I) -> fmt::Result
where
    I: IntoIterator<Item = (&'a str, String)>,
{
    let rows: Vec<_> = rows.into_iter().collect();
    writeln!(f, "{title}")?;
    if rows.is_empty() {
        return writeln!(f, "N/A: no data");
    }
    let width = rows
        .iter()
        .map(|(label, _)| label.chars().count())
        .chain([heads.0.len()])
        .max()
        .unwrap_or_default();
    writeln!(f, "{:width$} {:>AMOUNT_WIDTH$}", heads.0, heads.1)?;
    let length = width + AMOUNT_WIDTH + 1;
    writeln!(f, "{:-<length$}", "")?;
    for (label, value) in rows {
        writeln!(f, "{label:width$} {value:>AMOUNT_WIDTH$}")?;
    }
    Ok(())
}

impl Display for Summary {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        table(
            f,
            "Total sales by province",
            ("Province", "Sales"),
            self.sales_by_province
                .iter()
                .map(|p| (p.province.as_str(), p.sales.to_string())),
        )?;
        if !self.queries.is_empty() {
            writeln!(f)?;
            table(
                f,
                "Sales for selected provinces",
                ("Province", "Sales"),
                self.queries.iter().map(|q| {
                    let label = if q.found { &q.province } else { &q.query };
                    (label.as_str(), q.sales.to_string())
                }),
            )?;
            for q in self.queries.iter().filter(|q| !q.found) {
                writeln!(f, "warning: no data for province {:?}", q.query)?;
            }
        }
        writeln!(f)?;
        table(
            f,
            "Exports by month",
            ("Month", "Exports"),
            self.exports_by_month
                .iter()
                .map(|m| (month_name(m.month), m.exports.to_string())),
        )?;
        writeln!(f)?;
        writeln!(f, "Province with the largest imports")?;
        if self.top_importer.province.is_empty() {
            writeln!(f, "N/A: no import data")?;
        } else {
            writeln!(
                f,
                "{} {}",
                self.top_importer.province, self.top_importer.imports
            )?;
        }
        writeln!(f)?;
        table(
            f,
            "Zero-rate sales share by province",
            ("Province", "Share"),
            self.zero_rate_top
                .iter()
                .map(|z| (z.province.as_str(), format!("{:.2}%", z.percent))),
        )
    }
}

fn month_name(month: Month) -> &'static str {
    const NAMES: [&str; 12] = [
        "January",
        "February",
        "March",
        "April",
        "May",
        "June",
        "July",
        "August",
        "September",
        "October",
        "November",
        "December",
    ];
    NAMES[month.number() as usize - 1]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Summary {
        Summary {
            sales_by_province: vec![
                ("GUAYAS".to_string(), Amount::new(2000.0)).into(),
                ("LOJA".to_string(), Amount::new(300.0)).into(),
            ],
            queries: vec![
                ProvinceQuery {
                    query: "loja".into(),
                    province: "LOJA".into(),
                    sales: Amount::new(300.0),
                    found: true,
                },
                ProvinceQuery {
                    query: "Narnia".into(),
                    province: "NARNIA".into(),
                    sales: Amount::default(),
                    found: false,
                },
            ],
            exports_by_month: vec![(Month::new(3).unwrap(), Amount::new(25.5)).into()],
            top_importer: ("GUAYAS".to_string(), Amount::new(500.0)).into(),
            zero_rate_top: vec![("LOJA".to_string(), 12.345).into()],
        }
    }

    #[test]
    fn display_prints_every_section() {
        let text = sample().to_string();
        assert!(text.contains("Total sales by province"), "{text}");
        assert!(text.contains("GUAYAS"), "{text}");
        assert!(text.contains("$2,000.00"), "{text}");
        assert!(text.contains("March"), "{text}");
        assert!(text.contains("GUAYAS $500.00"), "{text}");
        assert!(text.contains("12.35%"), "{text}");
        assert!(text.contains("warning: no data for province \"Narnia\""), "{text}");
    }

    #[test]
    fn display_aligns_table_columns() {
        let text = sample().to_string();
        let rows: Vec<&str> = text
            .lines()
            .skip_while(|l| !l.starts_with("Province "))
            .take(4)
            .collect();
        assert_eq!(rows[0].len(), rows[2].len(), "{rows:?}");
        assert_eq!(rows[2].len(), rows[3].len(), "{rows:?}");
    }

    #[test]
    fn display_marks_empty_sections() {
        let text = Summary::default().to_string();
        assert!(text.contains("N/A: no data"), "{text}");
        assert!(text.contains("N/A: no import data"), "{text}");
        assert!(!text.contains("Sales for selected provinces"), "{text}");
    }

    #[test]
    fn serializes_to_json_numbers() {
        let json = serde_json::to_value(sample()).unwrap();
        assert_eq!(json["sales_by_province"][0]["sales"], 2000.0);
        assert_eq!(json["exports_by_month"][0]["month"], 3);
        assert_eq!(json["top_importer"]["province"], "GUAYAS");
        assert_eq!(json["queries"][1]["found"], false);
    }
}
