use super::*;
use chrono::NaiveDate;
use common::{CellValue, ForecastConfig, RawColumn};
use selector::Capabilities;

fn dated_table(values: &[f64]) -> RawTable {
    let start = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
    let rows = values
        .iter()
        .enumerate()
        .map(|(i, &v)| {
            let date = start + chrono::Days::new(i as u64);
            vec![CellValue::from(date), CellValue::from(v)]
        })
        .collect();
    RawTable::from_rows(&["Date", "Sales"], rows)
}

fn naive_pipeline() -> Pipeline {
    let config = PipelineConfig::default();
    let engine = ForecastEngine::with_capabilities(&config.forecast, Capabilities::baseline());
    Pipeline::with_engine(&config, engine)
}

#[test]
fn test_run_forecasts_valid_table() {
    let values: Vec<f64> = (0..60).map(|i| 200.0 + i as f64).collect();
    let report = naive_pipeline().run(&dated_table(&values), 14).unwrap();

    assert!(report.verdict.is_valid);
    assert_eq!(report.column_map.sales_column.as_deref(), Some("Sales"));
    assert_eq!(report.metrics.total_days, 60);

    let forecast = report.forecast.unwrap();
    assert_eq!(forecast.model_name, "naive");
    assert_eq!(forecast.points.len(), 14);
    assert_eq!(forecast.target_column.as_deref(), Some("Sales"));
    assert_eq!(
        forecast.points[0].date,
        NaiveDate::from_ymd_opt(2024, 4, 30).unwrap()
    );

    let summary = report.normalization.unwrap();
    assert_eq!(summary.input_rows, 60);
    assert_eq!(summary.dropped_rows, 0);
}

#[test]
fn test_run_skips_forecast_when_invalid() {
    let table = RawTable::new(vec![RawColumn::new(
        "notes",
        vec![CellValue::text("hello"), CellValue::text("world")],
    )]);
    let report = naive_pipeline().run(&table, 7).unwrap();

    assert!(!report.verdict.is_valid);
    assert!(report.forecast.is_none());
    assert!(report.normalization.is_none());
    assert_eq!(report.metrics.total_days, 0);
}

#[test]
fn test_analyze_never_fails_on_unusable_table() {
    let (columns, verdict, metrics) = naive_pipeline().analyze(&RawTable::default());
    assert!(columns.sales_column.is_none());
    assert!(!verdict.is_valid);
    assert_eq!(metrics.total_revenue, 0.0);
    assert_eq!(metrics.trend_strength, 0.5);
}

#[test]
fn test_forecast_labels_target_column() {
    let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
    let series = Series::daily(start, vec![5.0; 20]).unwrap();
    let columns = ColumnMap {
        sales_column: Some("mrr".into()),
        date_column: "date".into(),
        date_synthesized: false,
        product_column: None,
        region_column: None,
        customer_column: None,
        additional_columns: Vec::new(),
    };
    let result = naive_pipeline().forecast(&series, 3, &columns).unwrap();
    assert_eq!(result.target_column.as_deref(), Some("mrr"));
}

#[test]
fn test_app_config_drives_pipeline() {
    let config =
        AppConfig::from_json_str(r#"{"pipeline": {"forecast": {"default_horizon": 21}}}"#).unwrap();
    let pipeline = Pipeline::from_app_config(&config);
    assert_eq!(pipeline.default_horizon(), 21);

    let forecast_config = ForecastConfig {
        seasonal_enabled: false,
        ..ForecastConfig::default()
    };
    let engine = ForecastEngine::new(&forecast_config);
    assert!(!engine.technique_names().contains(&"seasonal_trend"));
}
