use bigdecimal::BigDecimal;
use chrono::{DateTime, NaiveDate, NaiveDateTime};

use crate::decimal::{decimal_to_f64, parse_amount};

/// Text tokens that spreadsheets and CSV exporters use for "no value".
const MISSING_TOKENS: &[&str] = &["", "na", "n/a", "nan", "null", "none", "nat", "-", "#n/a"];

static EMPTY_CELL: CellValue = CellValue::Empty;

const DATE_FORMATS: &[&str] = &[
    "%Y-%m-%d",
    "%Y/%m/%d",
    "%m/%d/%Y",
    "%d.%m.%Y",
    "%d-%b-%Y",
    "%d %b %Y",
    "%d %B %Y",
    "%b %d, %Y",
    "%B %d, %Y",
];

const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%m/%d/%Y %H:%M:%S",
    "%m/%d/%Y %H:%M",
];

/// One decoded cell of an uploaded table.
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    Empty,
    Text(String),
    Number(f64),
    /// Exact amount as produced by spreadsheet decoders.
    Decimal(BigDecimal),
    Date(NaiveDate),
    DateTime(NaiveDateTime),
}

impl CellValue {
    pub fn text(s: impl Into<String>) -> Self {
        CellValue::Text(s.into())
    }

    pub fn is_missing(&self) -> bool {
        match self {
            CellValue::Empty => true,
            CellValue::Number(v) => v.is_nan(),
            CellValue::Text(s) => {
                let lowered = s.trim().to_ascii_lowercase();
                MISSING_TOKENS.contains(&lowered.as_str())
            }
            _ => false,
        }
    }

    /// Numeric coercion. Missing cells, dates and non-numeric text yield `None`.
    pub fn as_f64(&self) -> Option<f64> {
        if self.is_missing() {
            return None;
        }
        match self {
            CellValue::Number(v) if v.is_finite() => Some(*v),
            CellValue::Decimal(d) => decimal_to_f64(d).ok(),
            CellValue::Text(s) => parse_amount(s).ok(),
            _ => None,
        }
    }

    /// Calendar-day coercion. Numbers are never interpreted as dates.
    pub fn as_date(&self) -> Option<NaiveDate> {
        match self {
            CellValue::Date(d) => Some(*d),
            CellValue::DateTime(dt) => Some(dt.date()),
            CellValue::Text(s) if !self.is_missing() => parse_date_text(s),
            _ => None,
        }
    }
}

impl From<f64> for CellValue {
    fn from(v: f64) -> Self {
        CellValue::Number(v)
    }
}

impl From<&str> for CellValue {
    fn from(s: &str) -> Self {
        CellValue::Text(s.to_string())
    }
}

impl From<NaiveDate> for CellValue {
    fn from(d: NaiveDate) -> Self {
        CellValue::Date(d)
    }
}

/// Parse a date-like token into a calendar day.
pub fn parse_date_text(raw: &str) -> Option<NaiveDate> {
    let s = raw.trim();
    if s.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.date_naive());
    }
    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(s, fmt).ok())
        .or_else(|| {
            DATETIME_FORMATS
                .iter()
                .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
                .map(|dt| dt.date())
        })
}

/// A named column of heterogeneous cells.
#[derive(Debug, Clone, PartialEq)]
pub struct RawColumn {
    pub name: String,
    pub cells: Vec<CellValue>,
}

impl RawColumn {
    pub fn new(name: impl Into<String>, cells: Vec<CellValue>) -> Self {
        Self {
            name: name.into(),
            cells,
        }
    }

    pub fn missing_count(&self) -> usize {
        self.cells.iter().filter(|c| c.is_missing()).count()
    }

    fn present(&self) -> impl Iterator<Item = &CellValue> {
        self.cells.iter().filter(|c| !c.is_missing())
    }

    /// True when every non-missing cell coerces to a number and at least one
    /// cell is present.
    pub fn is_numeric(&self) -> bool {
        let mut seen = false;
        for cell in self.present() {
            if cell.as_f64().is_none() {
                return false;
            }
            seen = true;
        }
        seen
    }

    /// True when the first `sample_size` non-missing cells all parse as dates
    /// and at least one exists.
    pub fn sample_parses_as_dates(&self, sample_size: usize) -> bool {
        let mut seen = false;
        for cell in self.present().take(sample_size.max(1)) {
            if cell.as_date().is_none() {
                return false;
            }
            seen = true;
        }
        seen
    }

    pub fn numeric_values(&self) -> Vec<Option<f64>> {
        self.cells.iter().map(CellValue::as_f64).collect()
    }

    pub fn date_values(&self) -> Vec<Option<NaiveDate>> {
        self.cells.iter().map(CellValue::as_date).collect()
    }
}

/// An ordered sequence of named columns as decoded from CSV or a spreadsheet.
///
/// Columns may have different lengths; the table's row count is the longest
/// column and shorter columns read as missing past their end.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawTable {
    pub columns: Vec<RawColumn>,
}

impl RawTable {
    pub fn new(columns: Vec<RawColumn>) -> Self {
        Self { columns }
    }

    /// Build a table from a header row and row-major cells.
    pub fn from_rows(headers: &[&str], rows: Vec<Vec<CellValue>>) -> Self {
        let mut columns: Vec<RawColumn> = headers
            .iter()
            .map(|h| RawColumn::new(*h, Vec::with_capacity(rows.len())))
            .collect();
        for row in rows {
            let mut cells = row.into_iter();
            for column in columns.iter_mut() {
                column.cells.push(cells.next().unwrap_or(CellValue::Empty));
            }
        }
        Self { columns }
    }

    pub fn row_count(&self) -> usize {
        self.columns.iter().map(|c| c.cells.len()).max().unwrap_or(0)
    }

    pub fn column(&self, name: &str) -> Option<&RawColumn> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|c| c.name.as_str())
    }

    /// Cell at `(row, column)`, reading past a short column as `Empty`.
    pub fn cell<'a>(&'a self, column: &'a RawColumn, row: usize) -> &'a CellValue {
        column.cells.get(row).unwrap_or(&EMPTY_CELL)
    }
}
