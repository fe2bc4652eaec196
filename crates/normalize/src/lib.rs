use std::collections::BTreeMap;

use chrono::NaiveDate;
use common::stats::iqr_bounds;
use common::{
    add_days, ColumnMap, NormalizationConfig, NormalizationSummary, RawTable, Result, SalesError,
    Series,
};
use tracing::{debug, info};

/// Turns the detected columns of a raw table into a gap-free daily series.
///
/// Steps, in order:
/// 1. Coerce the sales column to numbers, dropping rows that fail.
/// 2. Coerce the date column to calendar days, dropping rows that fail.
///    When the axis is synthesized, or no date parses at all, the surviving
///    rows are laid out on consecutive days from the configured epoch.
/// 3. Cap values outside the IQR fences to the fence (rows are never dropped).
///    The fences come from data-point quartiles, so capping an already
///    capped series changes nothing. Date ranges wider than
///    `max_span_days` are rejected before any work.
/// 4. Average rows sharing a date.
/// 5. Sort ascending by date.
/// 6. Reindex to every calendar day between the first and last date,
///    forward-filling then backward-filling the inserted days.
pub struct SeriesNormalizer {
    iqr_multiplier: f64,
    max_span_days: i64,
    synthetic_epoch: NaiveDate,
}

impl SeriesNormalizer {
    pub fn new(config: &NormalizationConfig, synthetic_epoch: NaiveDate) -> Self {
        Self {
            iqr_multiplier: config.iqr_multiplier,
            max_span_days: config.max_span_days,
            synthetic_epoch,
        }
    }

    pub fn normalize(
        &self,
        table: &RawTable,
        columns: &ColumnMap,
    ) -> Result<(Series, NormalizationSummary)> {
        let sales_name = columns
            .sales_column
            .as_deref()
            .ok_or_else(|| SalesError::InvalidInput("sales column not detected".into()))?;
        let sales = table.column(sales_name).ok_or_else(|| {
            SalesError::InvalidInput(format!("sales column '{sales_name}' not found"))
        })?;

        let input_rows = table.row_count();
        let mut summary = NormalizationSummary {
            input_rows,
            ..NormalizationSummary::default()
        };

        // (row, value) pairs whose value coerced.
        let valued: Vec<(usize, f64)> = (0..input_rows)
            .filter_map(|row| table.cell(sales, row).as_f64().map(|v| (row, v)))
            .collect();

        let date_column = if columns.date_synthesized {
            None
        } else {
            table.column(&columns.date_column)
        };
        let parsed_dates: Option<Vec<Option<NaiveDate>>> = date_column.map(|column| {
            valued
                .iter()
                .map(|(row, _)| table.cell(column, *row).as_date())
                .collect()
        });

        let mut rows: Vec<(NaiveDate, f64)> = match parsed_dates {
            Some(dates) if dates.iter().any(Option::is_some) => valued
                .iter()
                .zip(dates)
                .filter_map(|((_, value), date)| date.map(|d| (d, *value)))
                .collect(),
            _ => {
                summary.date_synthesized = true;
                self.synthetic_axis(&valued)?
            }
        };
        summary.dropped_rows = input_rows - rows.len();

        if rows.is_empty() {
            return Err(SalesError::InsufficientData(format!(
                "no usable rows in '{sales_name}' after coercion"
            )));
        }

        self.check_span(&rows)?;
        summary.capped_outliers = self.cap_outliers(&mut rows);

        let merged = merge_duplicate_dates(&rows);
        summary.merged_duplicates = rows.len() - merged.len();

        let (series, filled_days) = reindex_daily(&merged)?;
        summary.filled_days = filled_days;

        info!(
            input_rows = summary.input_rows,
            dropped = summary.dropped_rows,
            capped = summary.capped_outliers,
            merged = summary.merged_duplicates,
            filled = summary.filled_days,
            output_len = series.len(),
            "Normalized sales series"
        );

        Ok((series, summary))
    }

    fn synthetic_axis(&self, valued: &[(usize, f64)]) -> Result<Vec<(NaiveDate, f64)>> {
        debug!(epoch = %self.synthetic_epoch, rows = valued.len(), "Synthesizing daily date axis");
        valued
            .iter()
            .enumerate()
            .map(|(i, (_, value))| Ok((add_days(self.synthetic_epoch, i as u64)?, *value)))
            .collect()
    }

    /// Reject date ranges too wide to reindex day by day, which usually
    /// means a mistyped year.
    fn check_span(&self, rows: &[(NaiveDate, f64)]) -> Result<()> {
        let (Some(first), Some(last)) = (
            rows.iter().map(|(d, _)| *d).min(),
            rows.iter().map(|(d, _)| *d).max(),
        ) else {
            return Ok(());
        };
        let span = (last - first).num_days();
        if span > self.max_span_days {
            return Err(SalesError::NormalizationError(format!(
                "dates span {span} days ({first} to {last}), more than the {} allowed",
                self.max_span_days
            )));
        }
        Ok(())
    }

    /// Clamp values to the IQR fences and return how many were changed.
    fn cap_outliers(&self, rows: &mut [(NaiveDate, f64)]) -> usize {
        let values: Vec<f64> = rows.iter().map(|(_, v)| *v).collect();
        let Some((lower, upper)) = iqr_bounds(&values, self.iqr_multiplier) else {
            return 0;
        };

        let mut capped = 0;
        for (_, value) in rows.iter_mut() {
            if *value < lower || *value > upper {
                *value = value.clamp(lower, upper);
                capped += 1;
            }
        }
        if capped > 0 {
            debug!(
                capped = capped,
                lower = format!("{:.2}", lower),
                upper = format!("{:.2}", upper),
                "Capped outliers to IQR bounds"
            );
        }
        capped
    }
}

impl Default for SeriesNormalizer {
    fn default() -> Self {
        Self::new(
            &NormalizationConfig::default(),
            common::DetectionConfig::default().synthetic_epoch,
        )
    }
}

/// Average the values of rows sharing a date; the result is sorted by date.
fn merge_duplicate_dates(rows: &[(NaiveDate, f64)]) -> Vec<(NaiveDate, f64)> {
    let mut groups: BTreeMap<NaiveDate, (f64, usize)> = BTreeMap::new();
    for (date, value) in rows {
        let entry = groups.entry(*date).or_insert((0.0, 0));
        entry.0 += value;
        entry.1 += 1;
    }
    groups
        .into_iter()
        .map(|(date, (sum, count))| (date, sum / count as f64))
        .collect()
}

/// Expand sorted, unique rows to a complete daily calendar. Returns the
/// series and the number of inserted days.
fn reindex_daily(rows: &[(NaiveDate, f64)]) -> Result<(Series, usize)> {
    let (Some(&(first, _)), Some(&(last, _))) = (rows.first(), rows.last()) else {
        return Ok((Series::empty(), 0));
    };
    let span = (last - first).num_days() as usize + 1;

    let mut slots: Vec<Option<f64>> = vec![None; span];
    for (date, value) in rows {
        slots[(*date - first).num_days() as usize] = Some(*value);
    }
    let filled_days = slots.iter().filter(|s| s.is_none()).count();

    forward_fill(&mut slots);
    backward_fill(&mut slots);

    let values = slots
        .into_iter()
        .map(|s| s.ok_or_else(|| SalesError::NormalizationError("unfilled calendar day".into())))
        .collect::<Result<Vec<f64>>>()?;
    Ok((Series::daily(first, values)?, filled_days))
}

fn forward_fill(slots: &mut [Option<f64>]) {
    let mut last = None;
    for slot in slots.iter_mut() {
        match slot {
            Some(v) => last = Some(*v),
            None => *slot = last,
        }
    }
}

fn backward_fill(slots: &mut [Option<f64>]) {
    let mut next = None;
    for slot in slots.iter_mut().rev() {
        match slot {
            Some(v) => next = Some(*v),
            None => *slot = next,
        }
    }
}
