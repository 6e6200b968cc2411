//! Per-rule summary of benchmark records.

use std::{cmp::Ordering, collections::BTreeMap};

use serde::Serialize;

use crate::{
    benchmark::parser::BenchmarkRecord,
    core::{Result, SnakeErrorKind},
};

/// Name of the label column of the median table.
pub const RULE_COLUMN: &str = "rule";

/// Every metric column of `records`, in the order they are first seen.
pub fn metric_columns(records: &[BenchmarkRecord]) -> Vec<String> {
    let mut columns: Vec<String> = Vec::new();
    for record in records {
        for column in record.columns() {
            if !columns.iter().any(|c| c == column) {
                columns.push(column.to_string());
            }
        }
    }
    columns
}

/// The metric columns holding plain numbers in every record that has them.
pub fn numeric_columns(records: &[BenchmarkRecord]) -> Vec<String> {
    metric_columns(records)
        .into_iter()
        .filter(|column| {
            records
                .iter()
                .filter_map(|record| record.get(column))
                .all(|value| value.as_number().is_some())
        })
        .collect()
}

/// Median of the values, ignoring NaN. `NaN` when nothing is left.
pub fn median(values: &[f64]) -> f64 {
    let mut sorted: Vec<f64> = values.iter().copied().filter(|v| !v.is_nan()).collect();
    if sorted.is_empty() {
        return f64::NAN;
    }
    sorted.sort_by(|a, b| a.total_cmp(b));

    let middle = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        (sorted[middle - 1] + sorted[middle]) / 2.0
    } else {
        sorted[middle]
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RuleMedians {
    pub rule: String,
    /// One value per column of the table, NaN where the rule has no data
    pub values: Vec<f64>,
}

/// Median of every numeric column, one row per rule.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MedianTable {
    pub columns: Vec<String>,
    pub rows: Vec<RuleMedians>,
}

impl MedianTable {
    pub fn from_records(records: &[BenchmarkRecord]) -> Self {
        let columns = numeric_columns(records);

        let mut by_rule: BTreeMap<&str, Vec<&BenchmarkRecord>> = BTreeMap::new();
        for record in records {
            by_rule.entry(record.rule.as_str()).or_default().push(record);
        }

        let rows = by_rule
            .into_iter()
            .map(|(rule, group)| {
                let values = columns
                    .iter()
                    .map(|column| {
                        let samples: Vec<f64> =
                            group.iter().filter_map(|r| r.number(column)).collect();
                        median(&samples)
                    })
                    .collect();

                RuleMedians {
                    rule: rule.to_string(),
                    values,
                }
            })
            .collect();

        Self { columns, rows }
    }

    pub fn value(&self, rule: &str, column: &str) -> Option<f64> {
        let index = self.columns.iter().position(|c| c == column)?;
        self.rows
            .iter()
            .find(|row| row.rule == rule)
            .map(|row| row.values[index])
    }

    /// Sort rows ascending by `column` (`rule` or a numeric column). Missing
    /// values go last; ties keep their order.
    pub fn sort_by(&mut self, column: &str) -> Result<()> {
        if column == RULE_COLUMN {
            self.rows.sort_by(|a, b| a.rule.cmp(&b.rule));
            return Ok(());
        }

        let index = self
            .columns
            .iter()
            .position(|c| c == column)
            .ok_or_else(|| SnakeErrorKind::UnknownColumn {
                column: column.to_string(),
                available: self.header(),
            })?;

        self.rows.sort_by(|a, b| {
            let (a, b) = (a.values[index], b.values[index]);
            match (a.is_nan(), b.is_nan()) {
                (true, true) => Ordering::Equal,
                (true, false) => Ordering::Greater,
                (false, true) => Ordering::Less,
                (false, false) => a.total_cmp(&b),
            }
        });
        Ok(())
    }

    /// Column names including the leading `rule` column.
    pub fn header(&self) -> Vec<String> {
        std::iter::once(RULE_COLUMN.to_string())
            .chain(self.columns.iter().cloned())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::benchmark::parser::{Hms, MetricValue};

    fn record(rule: &str, metrics: &[(&str, f64)]) -> BenchmarkRecord {
        let mut metrics: Vec<(String, MetricValue)> = metrics
            .iter()
            .map(|(name, value)| (name.to_string(), MetricValue::Number(*value)))
            .collect();
        metrics.push((
            "h:m:s".to_string(),
            MetricValue::Time(Hms {
                hours: 0,
                minutes: 0,
                seconds: 1,
            }),
        ));

        BenchmarkRecord {
            metrics,
            relative_path: format!("{rule}/x.tsv"),
            rule: rule.to_string(),
        }
    }

    #[test]
    fn median_handles_odd_even_and_nan() {
        assert_eq!(median(&[3.0, 1.0, 2.0]), 2.0);
        assert_eq!(median(&[4.0, 1.0, 3.0, 2.0]), 2.5);
        assert_eq!(median(&[f64::NAN, 5.0]), 5.0);
        assert!(median(&[]).is_nan());
    }

    #[test]
    fn wall_clock_is_left_out_of_the_table() {
        let records = vec![record("a", &[("s", 1.0)])];
        assert_eq!(metric_columns(&records), ["s", "h:m:s"]);
        assert_eq!(numeric_columns(&records), ["s"]);
    }

    #[test]
    fn medians_are_grouped_by_rule() {
        let records = vec![
            record("sort", &[("s", 1.0), ("max_pss", 10.0)]),
            record("align", &[("s", 30.0), ("max_pss", 900.0)]),
            record("sort", &[("s", 3.0), ("max_pss", 30.0)]),
            record("sort", &[("s", 2.0), ("max_pss", 50.0)]),
        ];
        let table = MedianTable::from_records(&records);

        assert_eq!(table.header(), ["rule", "s", "max_pss"]);
        assert_eq!(table.rows.len(), 2);
        assert_eq!(table.value("sort", "s"), Some(2.0));
        assert_eq!(table.value("sort", "max_pss"), Some(30.0));
        assert_eq!(table.value("align", "s"), Some(30.0));
        assert_eq!(table.value("align", "h:m:s"), None);
    }

    #[test]
    fn columns_missing_for_a_rule_are_nan() {
        let records = vec![
            record("a", &[("s", 1.0), ("gpu", 4.0)]),
            record("b", &[("s", 2.0)]),
        ];
        let table = MedianTable::from_records(&records);

        assert!(table.value("b", "gpu").unwrap().is_nan());
    }

    #[test]
    fn sorting_puts_missing_values_last() {
        let records = vec![
            record("a", &[("max_pss", 300.0)]),
            record("b", &[("s", 1.0)]),
            record("c", &[("max_pss", 100.0)]),
        ];
        let mut table = MedianTable::from_records(&records);

        table.sort_by("max_pss").unwrap();
        let order: Vec<&str> = table.rows.iter().map(|r| r.rule.as_str()).collect();
        assert_eq!(order, ["c", "a", "b"]);

        table.sort_by("rule").unwrap();
        let order: Vec<&str> = table.rows.iter().map(|r| r.rule.as_str()).collect();
        assert_eq!(order, ["a", "b", "c"]);
    }

    #[test]
    fn sorting_by_unknown_column_fails() {
        let mut table = MedianTable::from_records(&[record("a", &[("s", 1.0)])]);
        let err = table.sort_by("h:m:s").unwrap_err();

        match err.kind() {
            SnakeErrorKind::UnknownColumn { available, .. } => assert_eq!(available, &["rule", "s"]),
            other => panic!("unexpected error: {other}"),
        }
    }
}
