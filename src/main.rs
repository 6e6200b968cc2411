//! Main binary entrypoint for snakeutils.
//!
//! Parses CLI arguments, loads the layered configuration, sets up logging, and
//! dispatches to subcommands.

use clap::{Parser, Subcommand};
use figment::Figment;
use std::path::PathBuf;

use snakeutils::{
    Result, SampleSheet, benchmark,
    core::{
        GlobalConfig, ReportConfig, SampleSheetConfig,
        config::{ReportOverrides, create_figment},
    },
};

#[derive(Parser)]
#[command(name = "snakeutils")]
#[command(about = "Samplesheet and benchmark utilities for Snakemake pipelines")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    #[arg(long, global = true, help = "Path to a TOML config file")]
    config: Option<PathBuf>,

    #[arg(long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Build an HTML report from a directory of Snakemake benchmark files
    Report {
        #[arg(help = "Path to the benchmarks directory")]
        bench: PathBuf,

        #[arg(help = "Path where the html report will be written")]
        report: PathBuf,

        #[arg(
            long,
            short = 'l',
            help = "Snakemake execution log, to infer correct rule names if the automatic detection fails"
        )]
        log_file: Option<PathBuf>,

        #[arg(short = 'x', help = "Column to use for the x axis [default: s]")]
        x: Option<String>,

        #[arg(short = 'y', help = "Column to use for the y axis [default: max_pss]")]
        y: Option<String>,

        #[arg(
            long,
            short = 's',
            help = "Column to use for the point size [default: mean_load]"
        )]
        size: Option<String>,

        #[arg(
            long,
            help = "Column to use for sorting the median table [default: max_pss]"
        )]
        sort_by: Option<String>,

        #[arg(
            long = "known-rule",
            value_delimiter = ',',
            help = "Rule names that take precedence over the first directory level"
        )]
        known_rules: Vec<String>,

        #[arg(long)]
        template_path: Option<PathBuf>,

        #[arg(long, help = "Also write the records and medians as CSV files")]
        export_csv: bool,
    },

    /// List the rule names found in the "Job stats" of a Snakemake log
    Rules { log_file: PathBuf },

    /// Summarize a samplesheet
    Samplesheet {
        path: PathBuf,

        #[arg(long, help = "Directory prepended to the FASTQ file names")]
        prefix: Option<String>,

        #[arg(long, help = "Print the expected FASTQ file names")]
        fastq: bool,
    },
}

fn main() {
    // Parse input
    let cli = Cli::parse();

    let figment = create_figment(cli.config.as_deref());
    let global = figment
        .as_ref()
        .ok()
        .and_then(|figment| GlobalConfig::from_figment(figment).ok())
        .unwrap_or_default();

    // Toggle the tracing level
    let level = if cli.verbose || global.verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .init();

    let result = figment.and_then(|figment| dispatch(cli.command, &figment));

    // If any command results in an error, print and exit
    if let Err(e) = result {
        tracing::error!("{e}");

        std::process::exit(1);
    }
}

fn dispatch(command: Commands, figment: &Figment) -> Result<()> {
    match command {
        Commands::Report {
            bench,
            report,
            log_file,
            x,
            y,
            size,
            sort_by,
            known_rules,
            template_path,
            export_csv,
        } => {
            let overrides = ReportOverrides {
                x,
                y,
                size,
                sort_by,
                known_rules: (!known_rules.is_empty()).then_some(known_rules),
                log_file,
                template_path,
                export_csv: export_csv.then_some(true),
            };
            let config = ReportConfig::resolve(figment, &overrides)?;

            let outcome = benchmark::run(&bench, &report, &config)?;
            println!(
                "Successfully written report to {} ({} files, {} rules)",
                outcome.report_path.display(),
                outcome.record_count,
                outcome.rule_count
            );
            for path in &outcome.csv_paths {
                println!("Exported {}", path.display());
            }
        }

        Commands::Rules { log_file } => {
            for rule in benchmark::rules::rules_from_log(&log_file)? {
                println!("{rule}");
            }
        }

        Commands::Samplesheet {
            path,
            prefix,
            fastq,
        } => {
            let config = SampleSheetConfig::from_figment(figment)?;
            let prefix = prefix.unwrap_or(config.prefix);

            let sheet = SampleSheet::parse(&path)?;
            println!("{sheet}");
            if fastq {
                for name in sheet.to_fastq(&prefix)? {
                    println!("{name}");
                }
            }
        }
    }

    Ok(())
}
