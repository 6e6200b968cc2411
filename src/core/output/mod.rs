//! Shared output utilities for writing results (CSVs, the HTML report).

use std::path::{Path, PathBuf};

use serde_json::Value;

use crate::{
    Result,
    benchmark::{parser::BenchmarkRecord, stats::MedianTable},
};

pub mod csv;
pub mod report;
pub use csv::CsvWriter;
pub use report::ReportWriter;

// Simple data holder
#[derive(Debug)]
pub enum WriteData<'a> {
    Records(&'a [BenchmarkRecord]),

    Medians(&'a MedianTable),

    Report {
        records: &'a [BenchmarkRecord],
        medians: &'a MedianTable,
        chart: &'a Value,
        chart_size: (u32, u32),
        template_path: Option<&'a Path>,
    },
}

pub trait ResultWriter {
    fn write(&self, data: &WriteData, path: &Path) -> Result<()>;
}

/// Create the parent directory of the file at `path`, if it has one.
pub fn ensure_parent_dir(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    Ok(())
}

/// `report.html` -> `report_{suffix}.csv`, next to the report.
pub fn sibling_csv(report_path: &Path, suffix: &str) -> PathBuf {
    let stem = report_path
        .file_stem()
        .map(|stem| stem.to_string_lossy().to_string())
        .unwrap_or_else(|| "report".to_string());
    report_path.with_file_name(format!("{stem}_{suffix}.csv"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn csv_names_follow_the_report() {
        let path = sibling_csv(Path::new("out/bench.html"), "medians");
        assert_eq!(path, Path::new("out/bench_medians.csv"));
    }
}
