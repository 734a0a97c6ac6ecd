
use clap::Args;
use log::info;
use std::path::PathBuf;

use crate::cli::core::{check_required_filename, AFTER_HELP};
use crate::selection::config::{SelectionConfig, SUPPORTED_LOCI, DEFAULT_MIN_FRACTION};

#[derive(Args, Clone)]
#[clap(author, about,
    after_help = &**AFTER_HELP)]
pub struct SelectSettings {
    /// Input consensus sequences (FASTA or FASTQ, optionally gzipped)
    #[clap(required = true)]
    #[clap(short = 'i')]
    #[clap(long = "input")]
    #[clap(value_name = "FASTX")]
    #[clap(help_heading = Some("Input/Output"))]
    pub input_filename: PathBuf,

    /// Alignment report for the input sequences (.m1 or .m5)
    #[clap(required = true)]
    #[clap(short = 'a')]
    #[clap(long = "alignments")]
    #[clap(value_name = "REPORT")]
    #[clap(help_heading = Some("Input/Output"))]
    pub align_filename: PathBuf,

    /// Output file for the selected sequences; defaults to <input>.selected.<type>
    #[clap(short = 'o')]
    #[clap(long = "output")]
    #[clap(value_name = "FASTX")]
    #[clap(help_heading = Some("Input/Output"))]
    pub output_filename: Option<PathBuf>,

    /// Optional JSON file summarizing how many sequences survived selection
    #[clap(long = "summary-json")]
    #[clap(value_name = "JSON")]
    #[clap(help_heading = Some("Input/Output"))]
    pub summary_filename: Option<PathBuf>,

    /// How to group alignments before selection
    #[clap(long = "method")]
    #[clap(value_name = "METHOD")]
    #[clap(default_value = "locus")]
    #[clap(help_heading = Some("Selection"))]
    pub method: String,

    /// Metric used to rank candidates within a group
    #[clap(long = "sort")]
    #[clap(value_name = "METRIC")]
    #[clap(default_value = "accuracy")]
    #[clap(help_heading = Some("Selection"))]
    pub sort: String,

    /// Locus to consider, can be specified multiple times; defaults to all supported loci
    #[clap(long = "locus")]
    #[clap(value_name = "LOCUS")]
    #[clap(help_heading = Some("Selection"))]
    pub loci: Vec<String>,

    /// The minimum support fraction for a second allele, relative to the first
    #[clap(long = "min-fraction")]
    #[clap(value_name = "FLOAT")]
    #[clap(default_value_t = DEFAULT_MIN_FRACTION)]
    #[clap(help_heading = Some("Selection"))]
    pub min_fraction: f64,

    /// Enable verbose output.
    #[clap(short = 'v')]
    #[clap(long = "verbose")]
    #[clap(action = clap::ArgAction::Count)]
    pub verbosity: u8,
}

/// Validates the select settings and builds the engine configuration.
/// Configuration problems surface here, before any data files are parsed.
/// # Errors
/// * if the grouping method, sort metric, loci, or fraction are invalid
pub fn check_select_settings(mut settings: SelectSettings) -> Result<(SelectSettings, SelectionConfig), Box<dyn std::error::Error>> {
    info!("Inputs:");
    check_required_filename(&settings.input_filename, "Sequence file");
    check_required_filename(&settings.align_filename, "Alignment report");
    info!("\tSequences: {:?}", settings.input_filename);
    info!("\tAlignments: {:?}", settings.align_filename);

    if settings.loci.is_empty() {
        settings.loci = SUPPORTED_LOCI.iter().cloned().collect();
    }

    let config = SelectionConfig::from_strings(
        &settings.method, &settings.sort, &settings.loci, settings.min_fraction
    )?;

    info!("Selection settings:");
    info!("\tGrouping method: {}", config.method());
    info!("\tSort metric: {}", config.sort());
    info!("\tLoci: {:?}", config.loci());
    info!("\tMinimum fraction: {}", config.min_fraction());

    if let Some(filename) = settings.output_filename.as_ref() {
        info!("\tOutput: {filename:?}");
    }
    if let Some(filename) = settings.summary_filename.as_ref() {
        info!("\tSummary JSON: {filename:?}");
    }

    Ok((settings, config))
}
