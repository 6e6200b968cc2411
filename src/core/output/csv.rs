use std::path::Path;

use crate::{
    Result,
    benchmark::{
        parser::BenchmarkRecord,
        stats::{MedianTable, metric_columns},
    },
    core::{
        error::SnakeErrorKind,
        output::{ResultWriter, WriteData, ensure_parent_dir},
        utils::format_metric,
    },
};

#[derive(Debug, Default)]
pub struct CsvWriter {}

impl CsvWriter {
    pub fn new() -> Self {
        Self {}
    }
}

impl ResultWriter for CsvWriter {
    fn write(&self, data: &WriteData, path: &Path) -> Result<()> {
        match data {
            WriteData::Records(records) => write_records_csv(records, path),
            WriteData::Medians(medians) => write_medians_csv(medians, path),
            WriteData::Report { .. } => Err(SnakeErrorKind::UnsupportedWriteData {
                writer: "csv",
            }
            .into()),
        }
    }
}

/// Write every record, one row per benchmark file
fn write_records_csv(records: &[BenchmarkRecord], path: &Path) -> Result<()> {
    ensure_parent_dir(path)?;
    let columns = metric_columns(records);
    let mut writer = csv::Writer::from_path(path)?;

    let mut header: Vec<&str> = columns.iter().map(String::as_str).collect();
    header.extend(["relative_path", "rule"]);
    writer.write_record(&header)?;

    for record in records {
        let mut row: Vec<String> = columns
            .iter()
            .map(|column| {
                record
                    .get(column)
                    .map(|value| value.to_string())
                    .unwrap_or_default()
            })
            .collect();
        row.push(record.relative_path.clone());
        row.push(record.rule.clone());
        writer.write_record(&row)?;
    }

    writer.flush()?;
    tracing::info!("Records written to {}", path.display());
    Ok(())
}

/// Write the per-rule medians
fn write_medians_csv(medians: &MedianTable, path: &Path) -> Result<()> {
    ensure_parent_dir(path)?;
    let mut writer = csv::Writer::from_path(path)?;

    writer.write_record(medians.header())?;
    for row in &medians.rows {
        let mut cells = vec![row.rule.clone()];
        cells.extend(row.values.iter().map(|value| format_metric(*value)));
        writer.write_record(&cells)?;
    }

    writer.flush()?;
    tracing::info!("Medians written to {}", path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::benchmark::parser::MetricValue;
    use tempfile::TempDir;

    fn records() -> Vec<BenchmarkRecord> {
        vec![
            BenchmarkRecord {
                metrics: vec![
                    ("s".to_string(), MetricValue::Number(1.5)),
                    ("max_pss".to_string(), MetricValue::Number(20.0)),
                ],
                relative_path: "sort/a.tsv".to_string(),
                rule: "sort".to_string(),
            },
            BenchmarkRecord {
                metrics: vec![("s".to_string(), MetricValue::Number(3.0))],
                relative_path: "index/a.tsv".to_string(),
                rule: "index".to_string(),
            },
        ]
    }

    #[test]
    fn records_csv_has_one_row_per_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("out/records.csv");

        CsvWriter::new()
            .write(&WriteData::Records(&records()), &path)
            .unwrap();

        let content = std::fs::read_to_string(path).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines[0], "s,max_pss,relative_path,rule");
        assert_eq!(lines[1], "1.5,20,sort/a.tsv,sort");
        assert_eq!(lines[2], "3,,index/a.tsv,index");
    }

    #[test]
    fn medians_csv_lists_rules() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("medians.csv");
        let medians = MedianTable::from_records(&records());

        CsvWriter::new()
            .write(&WriteData::Medians(&medians), &path)
            .unwrap();

        let content = std::fs::read_to_string(path).unwrap();
        assert_eq!(content, "rule,s,max_pss\nindex,3,\nsort,1.5,20\n");
    }
}
