//! Inferring which rule produced a benchmark file.

use std::{
    collections::BTreeSet,
    path::{Component, Path, PathBuf},
};

use crate::core::{Result, SnakeError, SnakeErrorKind};

/// Directory name Snakemake workflows conventionally keep benchmarks in.
pub const BENCHMARKS_DIR: &str = "benchmarks";

/// Marker opening the per-rule job table of a Snakemake log.
const JOB_STATS_MARKER: &str = "Job stats";

/// Return `(rule, relative_path)` for a benchmark file.
///
/// When `root` is `None` the path must contain a `benchmarks` directory, which
/// is used as root. The first component of the path below the root found in
/// `known_names` is the rule; when none matches, the first component is used.
pub fn resolve_rule_name(
    file: &Path,
    root: Option<&Path>,
    known_names: &BTreeSet<String>,
) -> Result<(String, String)> {
    let root = match root {
        Some(root) => root.to_path_buf(),
        None => infer_benchmarks_root(file)?,
    };

    let relative = file
        .strip_prefix(&root)
        .map_err(|_| SnakeErrorKind::NotUnderRoot {
            path: file.to_path_buf(),
            root: root.clone(),
        })?;

    let parts: Vec<String> = relative
        .components()
        .map(|part| part.as_os_str().to_string_lossy().to_string())
        .collect();

    let rule = parts
        .iter()
        .find(|part| known_names.contains(part.as_str()))
        .or_else(|| parts.first())
        .cloned()
        .ok_or_else(|| SnakeErrorKind::EmptyRelativePath {
            path: file.to_path_buf(),
        })?;

    Ok((rule, relative.display().to_string()))
}

/// The path prefix of `file` up to and including its `benchmarks` directory.
pub fn infer_benchmarks_root(file: &Path) -> Result<PathBuf> {
    let mut root = PathBuf::new();
    for component in file.components() {
        root.push(component);
        if component == Component::Normal(BENCHMARKS_DIR.as_ref()) {
            return Ok(root);
        }
    }

    Err(SnakeError::from(SnakeErrorKind::NoBenchmarksRoot {
        path: file.to_path_buf(),
    })
    .with_hint(Some("pass the benchmarks directory explicitly")))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ScanState {
    Outside,
    InJobStats,
}

/// Collect rule names from the "Job stats" table of a Snakemake log.
///
/// Every line of the table up to the first blank line contributes its first
/// word, except separator lines starting with `--`.
pub fn scan_job_stats(log: &str) -> BTreeSet<String> {
    let mut rules = BTreeSet::new();
    let mut state = ScanState::Outside;

    for line in log.lines() {
        let blank = line.trim().is_empty();
        match state {
            ScanState::Outside => {
                if line.starts_with(JOB_STATS_MARKER) {
                    state = ScanState::InJobStats;
                }
            }
            ScanState::InJobStats if blank => state = ScanState::Outside,
            ScanState::InJobStats => {
                if !line.starts_with("--") {
                    if let Some(rule) = line.split_whitespace().next() {
                        rules.insert(rule.to_string());
                    }
                }
            }
        }
    }

    rules
}

/// Read a Snakemake execution log and return the rule names it lists.
pub fn rules_from_log(log_file: &Path) -> Result<BTreeSet<String>> {
    let log = std::fs::read_to_string(log_file).map_err(|source| SnakeErrorKind::ReadFile {
        path: log_file.to_path_buf(),
        source,
    })?;

    let rules = scan_job_stats(&log);
    let preview: Vec<&str> = rules.iter().take(5).map(String::as_str).collect();
    tracing::info!(
        "Found {} rules in '{}' : [{}...]",
        rules.len(),
        log_file
            .file_name()
            .map(|name| name.to_string_lossy())
            .unwrap_or_default(),
        preview.join(",")
    );

    Ok(rules)
}
