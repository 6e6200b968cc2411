use std::collections::BTreeMap;

use charming::{
    Chart,
    component::{Axis, Grid, Title},
    element::{AxisType, Tooltip, Trigger},
    series::Scatter,
};
use serde_json::{Value, json};

use crate::{
    benchmark::{
        parser::BenchmarkRecord,
        stats::{MedianTable, metric_columns, numeric_columns},
    },
    core::{Result, SnakeErrorKind},
};

/// Symbol size range the size column is mapped onto, in pixels.
const SYMBOL_SIZE_RANGE: [f64; 2] = [6.0, 40.0];

/// Which columns drive the scatter plot.
#[derive(Debug, Clone, Copy)]
pub struct ScatterSpec<'a> {
    pub x: &'a str,
    pub y: &'a str,
    pub size: &'a str,
}

/// Position of `column` among the metric columns of the collection. Fails
/// unless it holds numbers.
pub fn numeric_column_index(records: &[BenchmarkRecord], column: &str) -> Result<usize> {
    let available = numeric_columns(records);
    match metric_columns(records).iter().position(|c| c == column) {
        Some(index) if available.iter().any(|c| c == column) => Ok(index),
        _ => Err(SnakeErrorKind::UnknownColumn {
            column: column.to_string(),
            available,
        }
        .into()),
    }
}

/// Build the ECharts options of the benchmark scatter plot: one series per
/// rule, every metric column carried as a data dimension and shown on hover,
/// point size mapped from `scatter.size`.
pub fn generate_scatter_chart(records: &[BenchmarkRecord], scatter: ScatterSpec) -> Result<Value> {
    let x = numeric_column_index(records, scatter.x)?;
    let y = numeric_column_index(records, scatter.y)?;
    let size = numeric_column_index(records, scatter.size)?;

    let columns = metric_columns(records);
    let medians = MedianTable::from_records(records);

    let mut by_rule: BTreeMap<&str, Vec<&BenchmarkRecord>> = BTreeMap::new();
    for record in records {
        by_rule.entry(record.rule.as_str()).or_default().push(record);
    }

    let mut chart = Chart::new()
        .title(
            Title::new()
                .text("Benchmarks")
                .subtext(format!("{} files, {} rules", records.len(), by_rule.len())),
        )
        .tooltip(Tooltip::new().trigger(Trigger::Item))
        .grid(
            Grid::new()
                .left("3%")
                .right("4%")
                .bottom("3%")
                .contain_label(true),
        )
        .x_axis(Axis::new().type_(AxisType::Value).name(scatter.x))
        .y_axis(Axis::new().type_(AxisType::Value).name(scatter.y));
    for rule in by_rule.keys() {
        chart = chart.series(Scatter::new().name(*rule));
    }

    let mut options = serde_json::to_value(&chart)?;

    // Per-point names, dimensions, median labels and the size mapping have no
    // builder in charming, so they are filled in on the serialized options.
    if let Some(series) = options.get_mut("series").and_then(Value::as_array_mut) {
        for (entry, (rule, group)) in series.iter_mut().zip(&by_rule) {
            let data: Vec<Value> = group
                .iter()
                .map(|record| {
                    let values: Vec<Value> = columns
                        .iter()
                        .map(|column| {
                            record
                                .get(column)
                                .map(|value| json!(value.as_f64()))
                                .unwrap_or(Value::Null)
                        })
                        .collect();
                    json!({ "name": record.relative_path, "value": values })
                })
                .collect();

            entry["data"] = Value::Array(data);
            entry["dimensions"] = json!(columns);
            entry["encode"] = json!({
                "x": x,
                "y": y,
                "tooltip": (0..columns.len()).collect::<Vec<_>>(),
            });
            if let Some(label) = median_label(&medians, rule, scatter) {
                entry["markPoint"] = label;
            }
        }
    }

    options["legend"] = json!({ "show": false });

    let (min, max) = value_range(records, scatter.size);
    options["visualMap"] = json!({
        "type": "continuous",
        "show": false,
        "dimension": size,
        "min": min,
        "max": max,
        "inRange": { "symbolSize": SYMBOL_SIZE_RANGE },
    });

    Ok(options)
}

/// Rule name drawn at the median of its points, in place of a legend.
fn median_label(medians: &MedianTable, rule: &str, scatter: ScatterSpec) -> Option<Value> {
    let x = medians.value(rule, scatter.x).filter(|v| !v.is_nan())?;
    let y = medians.value(rule, scatter.y).filter(|v| !v.is_nan())?;

    Some(json!({
        "symbolSize": 0,
        "silent": true,
        "label": { "show": true, "formatter": "{b}", "fontSize": 15 },
        "data": [{ "name": rule, "coord": [x, y] }],
    }))
}

/// Smallest and largest value of `column`, widened when they coincide.
fn value_range(records: &[BenchmarkRecord], column: &str) -> (f64, f64) {
    let (min, max) = records
        .iter()
        .filter_map(|record| record.number(column))
        .filter(|value| value.is_finite())
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(min, max), v| {
            (min.min(v), max.max(v))
        });

    if min > max {
        (0.0, 1.0)
    } else if min == max {
        (min, min + 1.0)
    } else {
        (min, max)
    }
}
