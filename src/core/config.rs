//! Layered configuration.
//!
//! Values are resolved with the following priority:
//! 1. CLI arguments (highest priority)
//! 2. Environment variables (`SNAKEUTILS_<SECTION>__<FIELD>`)
//! 3. Config file
//! 4. Default values (lowest priority)

use std::path::{Path, PathBuf};

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};

use crate::core::Result;

pub const ENV_PREFIX: &str = "SNAKEUTILS_";

/// Build a figment from the given TOML file and the environment.
///
/// A missing file is not an error; figment treats it as empty.
pub fn create_figment_from_file(path: &Path) -> Result<Figment> {
    tracing::debug!("Loading configuration from {}", path.display());

    Ok(Figment::new()
        .merge(Toml::file(path))
        .merge(Env::prefixed(ENV_PREFIX).split("__")))
}

/// Build a figment from an explicit config file, or from the default location
/// (`<config_dir>/snakeutils/config.toml`) when none is given.
pub fn create_figment(explicit: Option<&Path>) -> Result<Figment> {
    match explicit {
        Some(path) => create_figment_from_file(path),
        None => match default_config_path() {
            Some(path) if path.exists() => create_figment_from_file(&path),
            _ => Ok(Figment::new().merge(Env::prefixed(ENV_PREFIX).split("__"))),
        },
    }
}

pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("snakeutils").join("config.toml"))
}

/// Extract `section` out of `figment`, falling back to `T::default()` for
/// everything the section doesn't set.
fn extract_section<T>(figment: &Figment, section: &str) -> Result<T>
where
    T: Default + Serialize + for<'de> Deserialize<'de>,
{
    let config = Figment::from(Serialized::defaults(T::default()))
        .merge(figment.focus(section))
        .extract()?;
    Ok(config)
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GlobalConfig {
    pub verbose: bool,
}

impl GlobalConfig {
    pub fn from_figment(figment: &Figment) -> Result<Self> {
        extract_section(figment, "global")
    }
}

/// Settings for the benchmark report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportConfig {
    /// Column plotted on the x axis
    pub x: String,
    /// Column plotted on the y axis
    pub y: String,
    /// Column mapped to the point size
    pub size: String,
    /// Column the median table is sorted by
    pub sort_by: String,
    pub width: u32,
    pub height: u32,
    /// Rule names that take precedence over the first directory level
    pub known_rules: Vec<String>,
    /// Snakemake execution log to mine rule names from
    pub log_file: Option<PathBuf>,
    pub template_path: Option<PathBuf>,
    /// Also write the records and medians as CSV next to the report
    pub export_csv: bool,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            x: "s".to_string(),
            y: "max_pss".to_string(),
            size: "mean_load".to_string(),
            sort_by: "max_pss".to_string(),
            width: 1200,
            height: 1200,
            known_rules: Vec::new(),
            log_file: None,
            template_path: None,
            export_csv: false,
        }
    }
}

impl ReportConfig {
    pub fn from_figment(figment: &Figment) -> Result<Self> {
        extract_section(figment, "report")
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SampleSheetConfig {
    /// Directory prepended to every derived FASTQ name
    pub prefix: String,
}

impl SampleSheetConfig {
    pub fn from_figment(figment: &Figment) -> Result<Self> {
        extract_section(figment, "samplesheet")
    }
}

/// Values given on the command line. `None` means "not given" and leaves the
/// lower layers untouched.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ReportOverrides {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub x: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub y: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sort_by: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub known_rules: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub log_file: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub template_path: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub export_csv: Option<bool>,
}

impl ReportConfig {
    /// Resolve the report settings, with CLI values on top of everything else.
    pub fn resolve(figment: &Figment, overrides: &ReportOverrides) -> Result<Self> {
        let figment = figment
            .clone()
            .merge(Serialized::default("report", overrides));
        Self::from_figment(&figment)
    }
}
