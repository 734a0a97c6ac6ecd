
use clap::Args;
use log::info;
use std::path::PathBuf;

use crate::cli::core::{check_required_filename, AFTER_HELP};

#[derive(Args, Clone)]
#[clap(author, about,
    after_help = &**AFTER_HELP)]
pub struct OrientSettings {
    /// Input sequences to reorient (FASTA or FASTQ, optionally gzipped)
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

    /// Output file for the reoriented sequences; defaults to <input>.oriented.<type>
    #[clap(short = 'o')]
    #[clap(long = "output")]
    #[clap(value_name = "FASTX")]
    #[clap(help_heading = Some("Input/Output"))]
    pub output_filename: Option<PathBuf>,

    /// Enable verbose output.
    #[clap(short = 'v')]
    #[clap(long = "verbose")]
    #[clap(action = clap::ArgAction::Count)]
    pub verbosity: u8,
}

/// Validates the orient settings, logging every input
pub fn check_orient_settings(settings: OrientSettings) -> OrientSettings {
    info!("Inputs:");
    check_required_filename(&settings.input_filename, "Sequence file");
    check_required_filename(&settings.align_filename, "Alignment report");
    info!("\tSequences: {:?}", settings.input_filename);
    info!("\tAlignments: {:?}", settings.align_filename);
    if let Some(filename) = settings.output_filename.as_ref() {
        info!("\tOutput: {filename:?}");
    }
    settings
}
