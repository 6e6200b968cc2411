use serde::{Serialize, Serializer};
use std::{fmt, path::Path};

use crate::core::{Result, SnakeError, SnakeErrorKind};

/// The wall clock column of a Snakemake benchmark file.
pub const HMS_COLUMN: &str = "h:m:s";

/// Elapsed wall clock duration as written by Snakemake (`h:m:s`).
///
/// This is a duration, not a time of day: jobs running for a day or more
/// report `hours` of 24 and above.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Hms {
    pub hours: u32,
    pub minutes: u32,
    pub seconds: u32,
}

impl Hms {
    pub fn parse(value: &str) -> Option<Self> {
        let parts: Vec<u32> = value
            .trim()
            .split(':')
            .map(|part| part.parse::<u32>().ok())
            .collect::<Option<_>>()?;

        match parts.as_slice() {
            [hours, minutes, seconds] => Some(Self {
                hours: *hours,
                minutes: *minutes,
                seconds: *seconds,
            }),
            _ => None,
        }
    }

    pub fn as_seconds(&self) -> f64 {
        f64::from(self.hours) * 3600.0 + f64::from(self.minutes) * 60.0 + f64::from(self.seconds)
    }
}

impl fmt::Display for Hms {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:02}:{:02}:{:02}",
            self.hours, self.minutes, self.seconds
        )
    }
}

/// A single value of a benchmark file.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MetricValue {
    Number(f64),
    Time(Hms),
}

impl MetricValue {
    pub fn as_number(&self) -> Option<f64> {
        match self {
            MetricValue::Number(value) => Some(*value),
            MetricValue::Time(_) => None,
        }
    }

    /// Numeric view of the value, wall clock times counted in seconds.
    pub fn as_f64(&self) -> f64 {
        match self {
            MetricValue::Number(value) => *value,
            MetricValue::Time(hms) => hms.as_seconds(),
        }
    }
}

impl fmt::Display for MetricValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MetricValue::Number(value) => write!(f, "{value}"),
            MetricValue::Time(hms) => write!(f, "{hms}"),
        }
    }
}

impl Serialize for MetricValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        match self {
            MetricValue::Number(value) => serializer.serialize_f64(*value),
            MetricValue::Time(hms) => serializer.collect_str(hms),
        }
    }
}

/// Metrics of one benchmark file, in column order.
pub type Metrics = Vec<(String, MetricValue)>;

/// One benchmark file, labelled with the rule that produced it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BenchmarkRecord {
    pub metrics: Metrics,
    /// Path of the file, relative to the benchmarks root
    pub relative_path: String,
    pub rule: String,
}

impl BenchmarkRecord {
    pub fn get(&self, column: &str) -> Option<&MetricValue> {
        self.metrics
            .iter()
            .find(|(name, _)| name == column)
            .map(|(_, value)| value)
    }

    /// Numeric value of `column`, `None` if missing or not a number.
    pub fn number(&self, column: &str) -> Option<f64> {
        self.get(column).and_then(MetricValue::as_number)
    }

    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.metrics.iter().map(|(name, _)| name.as_str())
    }
}

/// Parse a Snakemake benchmark file: one tab separated header line and one
/// tab separated value line.
pub fn load_benchmark(path: &Path) -> Result<Metrics> {
    let content = std::fs::read_to_string(path).map_err(|source| SnakeErrorKind::ReadFile {
        path: path.to_path_buf(),
        source,
    })?;

    let metrics = parse_benchmark(&content, path)?;
    tracing::debug!("Loaded {} metric(s) from {}", metrics.len(), path.display());
    Ok(metrics)
}

/// Parse benchmark content. `path` names the file in errors.
pub fn parse_benchmark(content: &str, path: &Path) -> Result<Metrics> {
    let malformed = |reason: String| -> SnakeError {
        SnakeErrorKind::MalformedBenchmark {
            path: path.to_path_buf(),
            reason,
        }
        .into()
    };

    let lines: Vec<Vec<&str>> = content
        .lines()
        .filter(|line| !line.is_empty())
        .map(|line| line.split('\t').collect())
        .collect();

    let [header, values] = lines.as_slice() else {
        return Err(malformed(format!("{} instead of 2 lines", lines.len())));
    };

    if header.len() != values.len() {
        return Err(malformed(format!(
            "{} column names for {} values",
            header.len(),
            values.len()
        )));
    }

    let mut metrics: Metrics = Vec::with_capacity(header.len());
    for (column, raw) in header.iter().zip(values) {
        let invalid = || SnakeErrorKind::InvalidMetricValue {
            path: path.to_path_buf(),
            column: column.to_string(),
            value: raw.to_string(),
        };

        let value = if *column == HMS_COLUMN {
            MetricValue::Time(Hms::parse(raw).ok_or_else(invalid)?)
        } else {
            MetricValue::Number(raw.trim().parse::<f64>().map_err(|_| invalid())?)
        };

        // A repeated column keeps its first position but takes the last value
        match metrics.iter_mut().find(|(name, _)| name == column) {
            Some(existing) => existing.1 = value,
            None => metrics.push((column.to_string(), value)),
        }
    }

    Ok(metrics)
}
