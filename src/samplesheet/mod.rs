//! Illumina-style samplesheets: `[Header]`, `[Settings]`, `[Reads]` and `[Data]`
//! sections, validated sample names and the FASTQ names a demultiplexer
//! derives from them.

pub mod reader;

use std::{
    collections::{BTreeMap, BTreeSet, HashMap},
    fmt,
    path::{Path, PathBuf},
    sync::LazyLock,
};

use regex::Regex;

use crate::core::{Result, SnakeErrorKind};
use reader::{Row, Section};

/// Column of the `[Data]` section holding the sample names.
pub const SAMPLE_NAME_COLUMN: &str = "Sample_Name";

/// Reads used to derive FASTQ names, independent of the `[Reads]` section.
const FASTQ_READS: [&str; 2] = ["R1", "R2"];

static SAMPLE_NAME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9_-]+$").expect("sample name pattern is valid"));

/// The closed set of sections a samplesheet may contain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SectionKind {
    Header,
    Settings,
    Reads,
    Data,
}

impl SectionKind {
    fn from_header(header: &str) -> Option<Self> {
        match header.to_lowercase().as_str() {
            "header" => Some(Self::Header),
            "settings" => Some(Self::Settings),
            "reads" => Some(Self::Reads),
            "data" => Some(Self::Data),
            _ => None,
        }
    }

    fn name(&self) -> &'static str {
        match self {
            Self::Header => "Header",
            Self::Settings => "Settings",
            Self::Reads => "Reads",
            Self::Data => "Data",
        }
    }
}

/// The `[Data]` table.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DataTable {
    pub columns: Vec<String>,
    /// Cells in column order. Rows shorter than the header are padded with
    /// empty strings.
    pub rows: Vec<Vec<String>>,
}

impl DataTable {
    pub fn column(&self, name: &str) -> Option<Vec<&str>> {
        let index = self.columns.iter().position(|c| c == name)?;
        Some(self.rows.iter().map(|row| row[index].as_str()).collect())
    }
}

/// A parsed and validated samplesheet.
#[derive(Debug, Clone, PartialEq)]
pub struct SampleSheet {
    path: PathBuf,
    header: BTreeMap<String, String>,
    settings: BTreeMap<String, String>,
    reads: Vec<String>,
    data: Option<DataTable>,
    samples: Option<Vec<String>>,
}

impl SampleSheet {
    /// Read and parse the samplesheet at `path`.
    pub fn parse(path: &Path) -> Result<Self> {
        let bytes = std::fs::read(path).map_err(|source| SnakeErrorKind::ReadFile {
            path: path.to_path_buf(),
            source,
        })?;
        let text = String::from_utf8(bytes).map_err(|source| SnakeErrorKind::Decode {
            path: path.to_path_buf(),
            source,
        })?;

        Self::from_text(&text, path)
    }

    /// Parse samplesheet content. `path` names the sheet in messages.
    pub fn from_text(text: &str, path: &Path) -> Result<Self> {
        let mut sheet = SampleSheet {
            path: path.to_path_buf(),
            header: BTreeMap::new(),
            settings: BTreeMap::new(),
            reads: Vec::new(),
            data: None,
            samples: None,
        };

        for section in reader::read_sections(text, path)? {
            sheet.handle_section(section)?;
        }

        tracing::debug!(
            "Parsed samplesheet {} with {} sample(s)",
            path.display(),
            sheet.samples().len()
        );
        Ok(sheet)
    }

    fn handle_section(&mut self, section: Section) -> Result<()> {
        let kind = SectionKind::from_header(&section.header).ok_or_else(|| {
            SnakeErrorKind::UnrecognizedSection {
                header: section.header.clone(),
            }
        })?;
        tracing::debug!("Section [{}]: {} row(s)", kind.name(), section.rows.len());

        match kind {
            SectionKind::Header => self.header = key_values(kind, &section.rows)?,
            SectionKind::Settings => self.settings = key_values(kind, &section.rows)?,
            SectionKind::Reads => {
                self.reads = section
                    .rows
                    .into_iter()
                    .filter_map(|row| row.fields.into_iter().next())
                    .collect();
            }
            SectionKind::Data => {
                let data = data_table(section.rows)?;
                let samples: Vec<String> = data
                    .column(SAMPLE_NAME_COLUMN)
                    .ok_or_else(|| SnakeErrorKind::MissingColumn {
                        column: SAMPLE_NAME_COLUMN.to_string(),
                    })?
                    .into_iter()
                    .map(str::to_string)
                    .collect();

                validate_samples(&samples)?;
                self.samples = Some(samples);
                self.data = Some(data);
            }
        }

        Ok(())
    }

    /// Name of the sheet file.
    pub fn name(&self) -> String {
        self.path
            .file_name()
            .map(|name| name.to_string_lossy().to_string())
            .unwrap_or_else(|| self.path.display().to_string())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn header(&self) -> &BTreeMap<String, String> {
        &self.header
    }

    pub fn settings(&self) -> &BTreeMap<String, String> {
        &self.settings
    }

    pub fn reads(&self) -> &[String] {
        &self.reads
    }

    pub fn data(&self) -> Option<&DataTable> {
        self.data.as_ref()
    }

    pub fn samples(&self) -> &[String] {
        self.samples.as_deref().unwrap_or_default()
    }

    /// FASTQ file names produced for every sample, all R1 files first, then
    /// all R2 files, each joined under `prefix`.
    ///
    /// Names follow `{sample}_S{n}_{read}_001.fastq.gz`, `n` being the 1-based
    /// position of the sample in the sheet.
    pub fn to_fastq(&self, prefix: &str) -> Result<Vec<String>> {
        let samples = match self.samples.as_deref() {
            Some(samples) if !samples.is_empty() => samples,
            _ => {
                return Err(SnakeErrorKind::NoSamples {
                    path: self.path.clone(),
                }
                .into());
            }
        };

        let prefix = Path::new(prefix);
        let fastqs = FASTQ_READS
            .iter()
            .flat_map(|read| {
                samples.iter().enumerate().map(move |(i, sample)| {
                    prefix
                        .join(format!("{sample}_S{}_{read}_001.fastq.gz", i + 1))
                        .display()
                        .to_string()
                })
            })
            .collect();

        Ok(fastqs)
    }
}

impl fmt::Display for SampleSheet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "SampleSheet : {}", self.path.display())?;
        writeln!(f, "    [Reads] : {}", self.reads.join(", "))?;
        for (name, entries) in [("header", &self.header), ("settings", &self.settings)] {
            writeln!(f, "    - {name}")?;
            for (key, value) in entries {
                writeln!(f, "        - {key} : {value}")?;
            }
        }
        write!(
            f,
            "    - {} samples : {}",
            self.samples().len(),
            self.samples().join(", ")
        )
    }
}

/// Build a key/value map from the first two fields of each row. Later keys
/// overwrite earlier ones.
fn key_values(kind: SectionKind, rows: &[Row]) -> Result<BTreeMap<String, String>> {
    let mut entries = BTreeMap::new();
    for row in rows {
        match row.fields.as_slice() {
            [key, value, ..] => {
                entries.insert(key.clone(), value.clone());
            }
            _ => {
                return Err(SnakeErrorKind::MalformedRow {
                    section: kind.name().to_string(),
                    line: row.line,
                    reason: "expected at least a key and a value".to_string(),
                }
                .into());
            }
        }
    }
    Ok(entries)
}

fn data_table(rows: Vec<Row>) -> Result<DataTable> {
    let mut rows = rows.into_iter();
    let Some(header) = rows.next() else {
        return Ok(DataTable::default());
    };
    let columns = header.fields;

    let malformed = |line: usize, reason: String| SnakeErrorKind::MalformedRow {
        section: SectionKind::Data.name().to_string(),
        line,
        reason,
    };

    let mut table = DataTable {
        columns,
        rows: Vec::new(),
    };
    for row in rows {
        if row.fields.len() > table.columns.len() {
            let reason = format!(
                "{} fields for {} columns",
                row.fields.len(),
                table.columns.len()
            );
            return Err(malformed(row.line, reason).into());
        }

        // Missing trailing cells, including an empty Sample_Name, are left
        // for sample validation to report
        let mut cells = row.fields;
        cells.resize(table.columns.len(), String::new());
        table.rows.push(cells);
    }

    Ok(table)
}

/// Check sample names for duplicates, then for forbidden characters. Every
/// offender is reported, not only the first one.
fn validate_samples(samples: &[String]) -> Result<()> {
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for sample in samples {
        *counts.entry(sample.as_str()).or_default() += 1;
    }

    let duplicates: BTreeSet<String> = counts
        .into_iter()
        .filter(|(_, count)| *count > 1)
        .map(|(name, _)| name.to_string())
        .collect();
    if !duplicates.is_empty() {
        return Err(SnakeErrorKind::DuplicateSamples { names: duplicates }.into());
    }

    let invalid: BTreeSet<String> = samples
        .iter()
        .filter(|sample| !SAMPLE_NAME.is_match(sample))
        .cloned()
        .collect();
    if !invalid.is_empty() {
        return Err(SnakeErrorKind::InvalidSampleName { names: invalid }.into());
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const SHEET: &str = "[Header]
IEMFileVersion,4
Investigator Name,jdoe
[Settings]
Adapter,AGATCGGAAGAGCACACGTCTGAACTCCAGTCA
[Reads]
151
151
[Data]
Sample_ID,Sample_Name,index
S01,sampleA,ATTACTCG
S02,sampleB,TCCGGAGA
S03,sample_C-3,CGCTCATT
";

    fn parse(text: &str) -> Result<SampleSheet> {
        SampleSheet::from_text(text, Path::new("SampleSheet.csv"))
    }

    #[test]
    fn parses_every_section() {
        let sheet = parse(SHEET).unwrap();

        assert_eq!(sheet.name(), "SampleSheet.csv");
        assert_eq!(sheet.header()["IEMFileVersion"], "4");
        assert_eq!(sheet.header()["Investigator Name"], "jdoe");
        assert_eq!(
            sheet.settings()["Adapter"],
            "AGATCGGAAGAGCACACGTCTGAACTCCAGTCA"
        );
        assert_eq!(sheet.reads(), ["151", "151"]);
        assert_eq!(sheet.samples(), ["sampleA", "sampleB", "sample_C-3"]);

        let data = sheet.data().unwrap();
        assert_eq!(data.columns, ["Sample_ID", "Sample_Name", "index"]);
        assert_eq!(data.column("index").unwrap()[1], "TCCGGAGA");
    }

    #[test]
    fn section_names_are_case_insensitive() {
        let sheet = parse("[HEADER]\nkey,value\n[data]\nSample_Name\nA\n").unwrap();
        assert_eq!(sheet.header()["key"], "value");
        assert_eq!(sheet.samples(), ["A"]);
    }

    #[test]
    fn later_duplicate_keys_win() {
        let sheet = parse("[Settings]\nkey,first\nkey,second,ignored\n").unwrap();
        assert_eq!(sheet.settings()["key"], "second");
    }

    #[test]
    fn unknown_section_fails() {
        let err = parse("[Header]\na,b\n[Manifests]\nx,y\n").unwrap_err();
        match err.kind() {
            SnakeErrorKind::UnrecognizedSection { header } => assert_eq!(header, "Manifests"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn duplicate_samples_are_reported_as_a_set() {
        let err = parse("[Data]\nSample_Name\nA\nB\nA\nC\nB\nA\n").unwrap_err();
        match err.kind() {
            SnakeErrorKind::DuplicateSamples { names } => {
                let expected: BTreeSet<String> = ["A", "B"].iter().map(|s| s.to_string()).collect();
                assert_eq!(names, &expected);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn duplicate_of_a_single_name() {
        let err = parse("[Data]\nSample_Name\nA\nA\n").unwrap_err();
        match err.kind() {
            SnakeErrorKind::DuplicateSamples { names } => {
                assert_eq!(names.iter().collect::<Vec<_>>(), ["A"]);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn every_invalid_sample_name_is_reported() {
        let err = parse("[Data]\nSample_Name\nok_1\nbad name\nbad.name\nfine-2\n").unwrap_err();
        match err.kind() {
            SnakeErrorKind::InvalidSampleName { names } => {
                assert_eq!(names.len(), 2);
                assert!(names.contains("bad name"));
                assert!(names.contains("bad.name"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn empty_sample_name_is_reported_with_other_invalid_names() {
        let err = parse("[Data]\nSample_ID,Sample_Name\nS1\nS2,bad.name\nS3,bad name\n")
            .unwrap_err();
        match err.kind() {
            SnakeErrorKind::InvalidSampleName { names } => {
                let expected: BTreeSet<String> =
                    ["", "bad name", "bad.name"].iter().map(|s| s.to_string()).collect();
                assert_eq!(names, &expected);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn missing_sample_column_fails() {
        let err = parse("[Data]\nSample_ID\nS01\n").unwrap_err();
        assert!(matches!(err.kind(), SnakeErrorKind::MissingColumn { .. }));
    }

    #[test]
    fn too_short_key_value_row_fails() {
        let err = parse("[Header]\nlonely\n").unwrap_err();
        assert!(matches!(
            err.kind(),
            SnakeErrorKind::MalformedRow { line: 2, .. }
        ));
    }

    #[test]
    fn data_row_wider_than_header_fails() {
        let err = parse("[Data]\nSample_Name\nA,extra\n").unwrap_err();
        assert!(matches!(err.kind(), SnakeErrorKind::MalformedRow { .. }));
    }

    #[test]
    fn fastq_names_list_r1_then_r2() {
        let sheet = parse(SHEET).unwrap();
        let fastqs = sheet.to_fastq("").unwrap();

        assert_eq!(
            fastqs,
            [
                "sampleA_S1_R1_001.fastq.gz",
                "sampleB_S2_R1_001.fastq.gz",
                "sample_C-3_S3_R1_001.fastq.gz",
                "sampleA_S1_R2_001.fastq.gz",
                "sampleB_S2_R2_001.fastq.gz",
                "sample_C-3_S3_R2_001.fastq.gz",
            ]
        );
        assert_eq!(fastqs.len(), 2 * sheet.samples().len());
    }

    #[test]
    fn fastq_names_ignore_the_reads_section() {
        let sheet = parse("[Reads]\nR1\n[Data]\nSample_Name\nA\n").unwrap();
        let fastqs = sheet.to_fastq("").unwrap();

        assert_eq!(fastqs, ["A_S1_R1_001.fastq.gz", "A_S1_R2_001.fastq.gz"]);
    }

    #[test]
    fn fastq_names_are_joined_under_the_prefix() {
        let sheet = parse("[Data]\nSample_Name\nA\n").unwrap();
        let fastqs = sheet.to_fastq("fastq/run1").unwrap();

        let expected = Path::new("fastq/run1").join("A_S1_R1_001.fastq.gz");
        assert_eq!(fastqs[0], expected.display().to_string());
    }

    #[test]
    fn fastq_without_samples_fails() {
        let sheet = parse("[Header]\nkey,value\n").unwrap();
        let err = sheet.to_fastq("").unwrap_err();
        assert!(matches!(err.kind(), SnakeErrorKind::NoSamples { .. }));

        let sheet = parse("[Data]\nSample_Name\n").unwrap();
        assert!(sheet.to_fastq("").is_err());
    }

    #[test]
    fn summary_lists_samples() {
        let sheet = parse(SHEET).unwrap();
        let summary = sheet.to_string();

        assert!(summary.starts_with("SampleSheet : SampleSheet.csv"));
        assert!(summary.contains("        - IEMFileVersion : 4"));
        assert!(summary.ends_with("3 samples : sampleA, sampleB, sample_C-3"));
    }

    #[test]
    fn parse_reads_from_disk_and_reports_decode_errors() {
        let temp_dir = TempDir::new().unwrap();
        let good = temp_dir.path().join("SampleSheet.csv");
        std::fs::write(&good, SHEET).unwrap();
        assert_eq!(SampleSheet::parse(&good).unwrap().samples().len(), 3);

        let bad = temp_dir.path().join("latin1.csv");
        std::fs::write(&bad, b"[Header]\nInvestigator,Ren\xe9\n").unwrap();
        let err = SampleSheet::parse(&bad).unwrap_err();
        match err.kind() {
            SnakeErrorKind::Decode { path, .. } => assert_eq!(path, &bad),
            other => panic!("unexpected error: {other}"),
        }
    }
}
