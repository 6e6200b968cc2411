pub mod charts;
pub mod discovery;
pub mod parser;
pub mod rules;
pub mod stats;

use std::{
    collections::BTreeSet,
    path::{Path, PathBuf},
    time::Duration,
};

use indicatif::{ProgressBar, ProgressStyle};

pub use parser::{BenchmarkRecord, Hms, MetricValue};

use crate::core::{
    ReportConfig, Result, SnakeError, SnakeErrorKind,
    output::{self, CsvWriter, ReportWriter, ResultWriter, WriteData},
};
use charts::ScatterSpec;
use stats::MedianTable;

/// What a report run produced.
#[derive(Debug, Clone)]
pub struct ReportOutcome {
    pub report_path: PathBuf,
    pub record_count: usize,
    pub rule_count: usize,
    pub csv_paths: Vec<PathBuf>,
}

/// Rule names given in the configuration, plus those listed in the log file.
pub fn known_rule_names(config: &ReportConfig) -> Result<BTreeSet<String>> {
    let mut names: BTreeSet<String> = config.known_rules.iter().cloned().collect();
    if let Some(log_file) = &config.log_file {
        names.extend(rules::rules_from_log(log_file)?);
    }
    Ok(names)
}

/// Collect every benchmark below `bench_dir` and write the HTML report (and
/// optionally CSV exports) to `report_path`.
pub fn run(bench_dir: &Path, report_path: &Path, config: &ReportConfig) -> Result<ReportOutcome> {
    tracing::info!("Parsing benchmarks in {}...", bench_dir.display());
    tracing::debug!("Report config: {:?}", config);

    let known_names = known_rule_names(config)?;

    let progress = ProgressBar::new_spinner();
    progress.set_style(ProgressStyle::with_template("{spinner} {pos} benchmark files {msg}")?);
    progress.enable_steady_tick(Duration::from_millis(100));

    let collected = discovery::collect_benchmarks_with(bench_dir, &known_names, |record| {
        progress.inc(1);
        progress.set_message(record.rule.clone());
    });
    progress.finish_and_clear();
    let records = collected?;

    if records.is_empty() {
        return Err(SnakeError::from(SnakeErrorKind::NoBenchmarkRecords {
            path: bench_dir.to_path_buf(),
        })
        .with_hint(Some("benchmark files are expected to end in .tsv")));
    }

    let unused: Vec<&String> = config
        .known_rules
        .iter()
        .filter(|name| !records.iter().any(|record| &record.rule == *name))
        .collect();
    if !unused.is_empty() {
        tracing::warn!("Known rules without any benchmark: {:?}", unused);
    }

    let mut medians = MedianTable::from_records(&records);
    medians.sort_by(&config.sort_by)?;

    let chart = charts::generate_scatter_chart(
        &records,
        ScatterSpec {
            x: &config.x,
            y: &config.y,
            size: &config.size,
        },
    )?;

    ReportWriter::new().write(
        &WriteData::Report {
            records: &records,
            medians: &medians,
            chart: &chart,
            chart_size: (config.width, config.height),
            template_path: config.template_path.as_deref(),
        },
        report_path,
    )?;

    let mut csv_paths = Vec::new();
    if config.export_csv {
        let csv = CsvWriter::new();

        let records_path = output::sibling_csv(report_path, "records");
        csv.write(&WriteData::Records(&records), &records_path)?;
        csv_paths.push(records_path);

        let medians_path = output::sibling_csv(report_path, "medians");
        csv.write(&WriteData::Medians(&medians), &medians_path)?;
        csv_paths.push(medians_path);
    }

    Ok(ReportOutcome {
        report_path: report_path.to_path_buf(),
        record_count: records.len(),
        rule_count: medians.rows.len(),
        csv_paths,
    })
}
