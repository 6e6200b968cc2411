use std::{collections::BTreeSet, path::Path};

use walkdir::WalkDir;

use crate::{
    benchmark::{
        parser::{self, BenchmarkRecord},
        rules,
    },
    core::{Result, SnakeErrorKind},
};

/// Suffix of Snakemake benchmark files.
pub const BENCHMARK_SUFFIX: &str = ".tsv";

/// Recursively collect every benchmark file below `root`.
pub fn collect_benchmarks(
    root: &Path,
    known_names: &BTreeSet<String>,
) -> Result<Vec<BenchmarkRecord>> {
    collect_benchmarks_with(root, known_names, |_| {})
}

/// Same as [`collect_benchmarks`], calling `on_record` for every record as
/// soon as it is loaded.
pub fn collect_benchmarks_with<F>(
    root: &Path,
    known_names: &BTreeSet<String>,
    mut on_record: F,
) -> Result<Vec<BenchmarkRecord>>
where
    F: FnMut(&BenchmarkRecord),
{
    if !root.is_dir() {
        return Err(SnakeErrorKind::BenchmarkDirectoryNotFound {
            path: root.to_path_buf(),
        }
        .into());
    }

    let mut records = Vec::new();
    visit_directory(root, known_names, &mut records, &mut on_record)?;

    tracing::info!(
        "Found {} benchmark files in {}",
        records.len(),
        root.display()
    );
    Ok(records)
}

/// Walk `root` in file name order. Symlinks are not followed, so every file
/// is visited once even when links point back into the tree.
fn visit_directory<F>(
    root: &Path,
    known_names: &BTreeSet<String>,
    records: &mut Vec<BenchmarkRecord>,
    on_record: &mut F,
) -> Result<()>
where
    F: FnMut(&BenchmarkRecord),
{
    for entry in WalkDir::new(root).min_depth(1).sort_by_file_name() {
        let entry = entry?;
        let path = entry.path();

        if entry.file_type().is_file() && is_benchmark_file(path) {
            let record = load_record(path, root, known_names)?;
            on_record(&record);
            records.push(record);
        } else if !entry.file_type().is_dir() {
            tracing::debug!("Skipping {}", path.display());
        }
    }

    Ok(())
}

fn is_benchmark_file(path: &Path) -> bool {
    path.file_name()
        .and_then(|name| name.to_str())
        .is_some_and(|name| name.ends_with(BENCHMARK_SUFFIX))
}

fn load_record(
    path: &Path,
    root: &Path,
    known_names: &BTreeSet<String>,
) -> Result<BenchmarkRecord> {
    let metrics = parser::load_benchmark(path)?;
    let (rule, relative_path) = rules::resolve_rule_name(path, Some(root), known_names)?;
    let rule = rule
        .strip_suffix(BENCHMARK_SUFFIX)
        .map(str::to_string)
        .unwrap_or(rule);

    Ok(BenchmarkRecord {
        metrics,
        relative_path,
        rule,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write_benchmark(root: &Path, relative: &str, seconds: f64, pss: f64) {
        let path = root.join(relative);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(
            path,
            format!("s\th:m:s\tmax_pss\tmean_load\n{seconds}\t0:00:01\t{pss}\t50.0\n"),
        )
        .unwrap();
    }

    #[test]
    fn collects_every_benchmark_file() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        write_benchmark(root, "trim/sampleA.tsv", 1.0, 10.0);
        write_benchmark(root, "trim/sampleB.tsv", 2.0, 12.0);
        write_benchmark(root, "align/bwa/sampleA.tsv", 30.0, 900.0);
        write_benchmark(root, "multiqc.tsv", 5.0, 100.0);
        std::fs::write(root.join("trim/notes.txt"), "not a benchmark").unwrap();

        let records = collect_benchmarks(root, &BTreeSet::new()).unwrap();

        let labels: Vec<(&str, String)> = records
            .iter()
            .map(|r| (r.rule.as_str(), r.relative_path.replace('\\', "/")))
            .collect();
        assert_eq!(
            labels,
            [
                ("align", "align/bwa/sampleA.tsv".to_string()),
                ("multiqc", "multiqc.tsv".to_string()),
                ("trim", "trim/sampleA.tsv".to_string()),
                ("trim", "trim/sampleB.tsv".to_string()),
            ]
        );
        assert_eq!(records[0].number("max_pss"), Some(900.0));
    }

    #[test]
    fn known_names_apply_in_nested_directories() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        write_benchmark(root, "align/bwa/sampleA.tsv", 30.0, 900.0);
        write_benchmark(root, "align/bowtie2/sampleA.tsv", 20.0, 700.0);

        let known: BTreeSet<String> = ["bwa".to_string()].into();
        let records = collect_benchmarks(root, &known).unwrap();

        let rules: Vec<&str> = records.iter().map(|r| r.rule.as_str()).collect();
        assert_eq!(rules, ["align", "bwa"]);
    }

    #[test]
    fn collection_is_reproducible() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        for i in 0..6 {
            write_benchmark(root, &format!("rule{}/s{i}.tsv", i % 3), i as f64, 1.0);
        }

        let first = collect_benchmarks(root, &BTreeSet::new()).unwrap();
        let second = collect_benchmarks(root, &BTreeSet::new()).unwrap();

        assert_eq!(first.len(), 6);
        assert_eq!(first, second);
    }

    #[test]
    fn visitor_sees_every_record() {
        let temp_dir = TempDir::new().unwrap();
        write_benchmark(temp_dir.path(), "a/x.tsv", 1.0, 1.0);
        write_benchmark(temp_dir.path(), "b/y.tsv", 1.0, 1.0);

        let mut seen = Vec::new();
        let records = collect_benchmarks_with(temp_dir.path(), &BTreeSet::new(), |record| {
            seen.push(record.rule.clone())
        })
        .unwrap();

        assert_eq!(seen, ["a", "b"]);
        assert_eq!(records.len(), 2);
    }

    #[test]
    fn malformed_file_aborts_collection() {
        let temp_dir = TempDir::new().unwrap();
        write_benchmark(temp_dir.path(), "a/x.tsv", 1.0, 1.0);
        std::fs::write(temp_dir.path().join("a/broken.tsv"), "s\n1\n2\n").unwrap();

        let err = collect_benchmarks(temp_dir.path(), &BTreeSet::new()).unwrap_err();
        assert!(matches!(err.kind(), SnakeErrorKind::MalformedBenchmark { .. }));
    }

    #[cfg(unix)]
    #[test]
    fn symlinked_directories_are_not_walked() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        write_benchmark(root, "run1/a.tsv", 1.0, 1.0);
        std::os::unix::fs::symlink(root.join("run1"), root.join("latest")).unwrap();
        std::os::unix::fs::symlink(root, root.join("run1/loop")).unwrap();

        let records = collect_benchmarks(root, &BTreeSet::new()).unwrap();

        let paths: Vec<String> = records.iter().map(|r| r.relative_path.clone()).collect();
        assert_eq!(paths, ["run1/a.tsv"]);
    }

    #[test]
    fn missing_root_fails() {
        let temp_dir = TempDir::new().unwrap();
        let err = collect_benchmarks(&temp_dir.path().join("nope"), &BTreeSet::new()).unwrap_err();
        assert!(matches!(
            err.kind(),
            SnakeErrorKind::BenchmarkDirectoryNotFound { .. }
        ));
    }
}
