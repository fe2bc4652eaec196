use chrono::NaiveDate;
use common::stats::consistency_score;
use common::{ColumnMap, RawTable, ValidationConfig, ValidationVerdict};
use tracing::{info, warn};

const COMPLETENESS_WEIGHT: f64 = 0.30;
const CONSISTENCY_WEIGHT: f64 = 0.25;
const VALIDITY_WEIGHT: f64 = 0.25;
const VOLUME_WEIGHT: f64 = 0.20;

/// Rows at which the volume component of the quality score saturates.
const FULL_VOLUME_ROWS: f64 = 100.0;
const MAX_ANALYSIS_CONFIDENCE: f64 = 0.95;

/// Read-only structural and statistical checks run before normalization.
pub struct ValidationGate {
    min_rows: usize,
    min_span_days: i64,
}

/// Facts about the sales column gathered in one pass.
struct SalesProfile {
    values: Vec<f64>,
    missing: usize,
    negatives: usize,
}

impl ValidationGate {
    pub fn new(config: &ValidationConfig) -> Self {
        Self {
            min_rows: config.min_rows,
            min_span_days: config.min_span_days,
        }
    }

    pub fn validate(&self, table: &RawTable, columns: &ColumnMap) -> ValidationVerdict {
        let mut issues = Vec::new();
        let mut warnings = Vec::new();
        let rows = table.row_count();

        let Some(sales_name) = columns.sales_column.as_deref() else {
            issues.push("Sales column not detected".to_string());
            return rejected(issues, warnings);
        };
        let Some(sales_column) = table.column(sales_name) else {
            issues.push(format!("Sales column '{sales_name}' not found in table"));
            return rejected(issues, warnings);
        };

        let sales = profile_sales(table, sales_column, rows);
        let present = rows - sales.missing;

        if sales.values.is_empty() {
            issues.push(format!("Sales column '{sales_name}' must contain numeric values"));
        } else if sales.values.len() < present {
            warnings.push(format!(
                "Sales column contains {} non-numeric values that will be dropped",
                present - sales.values.len()
            ));
        }
        if sales.missing > 0 {
            warnings.push(format!("Sales column contains {} missing values", sales.missing));
        }
        if sales.negatives > 0 {
            warnings.push(format!("Sales column contains {} negative values", sales.negatives));
        }

        let span_days = if columns.date_synthesized {
            Some(rows.saturating_sub(1) as i64)
        } else {
            self.check_dates(table, columns, rows, &mut issues, &mut warnings)
        };

        if rows < self.min_rows {
            warnings.push(format!(
                "Limited historical data (less than {} days)",
                self.min_rows
            ));
        }
        if let Some(span) = span_days.filter(|_| rows > 1) {
            if span < self.min_span_days {
                warnings.push(format!(
                    "Short historical period (less than {} days)",
                    self.min_span_days
                ));
            }
        }

        let data_quality_score = quality_score(&sales, rows);
        let is_valid = issues.is_empty();

        if is_valid {
            info!(
                rows = rows,
                warnings = warnings.len(),
                quality = format!("{:.3}", data_quality_score),
                "Validation passed"
            );
        } else {
            warn!(issues = ?issues, "Validation failed");
        }

        ValidationVerdict {
            is_valid,
            issues,
            warnings,
            data_quality_score,
            analysis_confidence: (data_quality_score * 1.2).min(MAX_ANALYSIS_CONFIDENCE),
        }
    }

    /// Date-column checks; returns the span in days when any date parsed.
    fn check_dates(
        &self,
        table: &RawTable,
        columns: &ColumnMap,
        rows: usize,
        issues: &mut Vec<String>,
        warnings: &mut Vec<String>,
    ) -> Option<i64> {
        let name = columns.date_column.as_str();
        let Some(column) = table.column(name) else {
            issues.push(format!("Date column '{name}' not found in table"));
            return None;
        };

        let mut missing = 0usize;
        let mut parsed: Vec<NaiveDate> = Vec::with_capacity(rows);
        for row in 0..rows {
            let cell = table.cell(column, row);
            if cell.is_missing() {
                missing += 1;
            } else if let Some(date) = cell.as_date() {
                parsed.push(date);
            }
        }
        let present = rows - missing;

        if parsed.is_empty() {
            issues.push(format!("Date column '{name}' contains invalid date formats"));
        } else if parsed.len() < present {
            warnings.push(format!(
                "Date column contains {} unparseable values that will be dropped",
                present - parsed.len()
            ));
        }
        if missing > 0 {
            warnings.push(format!("Date column contains {missing} missing values"));
        }

        let min = parsed.iter().min()?;
        let max = parsed.iter().max()?;
        Some((*max - *min).num_days())
    }
}

impl Default for ValidationGate {
    fn default() -> Self {
        Self::new(&ValidationConfig::default())
    }
}

fn profile_sales(table: &RawTable, column: &common::RawColumn, rows: usize) -> SalesProfile {
    let mut values = Vec::with_capacity(rows);
    let mut missing = 0usize;
    for row in 0..rows {
        let cell = table.cell(column, row);
        if cell.is_missing() {
            missing += 1;
        } else if let Some(v) = cell.as_f64() {
            values.push(v);
        }
    }
    let negatives = values.iter().filter(|v| **v < 0.0).count();
    SalesProfile {
        values,
        missing,
        negatives,
    }
}

/// Weighted completeness, consistency, validity and volume, in [0, 1].
fn quality_score(sales: &SalesProfile, rows: usize) -> f64 {
    if rows == 0 {
        return 0.0;
    }
    let completeness = 1.0 - sales.missing as f64 / rows as f64;
    let consistency = consistency_score(&sales.values);
    let validity = if sales.negatives == 0 { 1.0 } else { 0.7 };
    let volume = (rows as f64 / FULL_VOLUME_ROWS).min(1.0);

    let score = completeness * COMPLETENESS_WEIGHT
        + consistency * CONSISTENCY_WEIGHT
        + validity * VALIDITY_WEIGHT
        + volume * VOLUME_WEIGHT;
    score.clamp(0.0, 1.0)
}

fn rejected(issues: Vec<String>, warnings: Vec<String>) -> ValidationVerdict {
    warn!(issues = ?issues, "Validation failed");
    ValidationVerdict {
        is_valid: false,
        issues,
        warnings,
        data_quality_score: 0.0,
        analysis_confidence: 0.0,
    }
}
