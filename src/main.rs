
use log::{LevelFilter, error, info};

use pballele::cli::core::{Commands, get_cli};
use pballele::cli::orient::{OrientSettings, check_orient_settings};
use pballele::cli::select::{SelectSettings, check_select_settings};
use pballele::orientation::orient_sequence_file;
use pballele::selection::selector::select_allele_file;
use pballele::util::file_io::save_json;

/// Sets up env_logger with the requested verbosity, must run before anything logs
fn setup_logging(verbosity: u8) {
    let filter_level: LevelFilter = match verbosity {
        0 => LevelFilter::Info,
        1 => LevelFilter::Debug,
        _ => LevelFilter::Trace
    };

    env_logger::builder()
        .format_timestamp_millis()
        .filter_level(filter_level)
        .init();
}

/// This will run the "select" mode of the tool
/// # Arguments
/// * `settings` - the SelectSettings object
fn run_select(settings: SelectSettings) {
    setup_logging(settings.verbosity);

    // okay, now we can check all the other settings
    let (cli_settings, config) = match check_select_settings(settings) {
        Ok(checked) => checked,
        Err(e) => {
            error!("Error while processing CLI settings: {e}");
            std::process::exit(exitcode::USAGE);
        }
    };

    // all the work
    let (output_filename, summary) = match select_allele_file(
        &cli_settings.input_filename,
        &cli_settings.align_filename,
        cli_settings.output_filename.as_deref(),
        &config
    ) {
        Ok(result) => result,
        Err(e) => {
            error!("Error while selecting allele candidates: {e}");
            std::process::exit(exitcode::DATAERR);
        }
    };
    info!("Selected sequences written to {output_filename:?}");

    if let Some(summary_filename) = cli_settings.summary_filename.as_ref() {
        info!("Saving selection summary to {summary_filename:?}");
        match save_json(&summary, summary_filename) {
            Ok(()) => {},
            Err(e) => {
                error!("Error while writing selection summary: {e}");
                std::process::exit(exitcode::IOERR);
            }
        };
    }
}

/// This will run the "orient" mode of the tool
/// # Arguments
/// * `settings` - the OrientSettings object
fn run_orient(settings: OrientSettings) {
    setup_logging(settings.verbosity);

    let cli_settings: OrientSettings = check_orient_settings(settings);

    let output_filename = match orient_sequence_file(
        &cli_settings.input_filename,
        &cli_settings.align_filename,
        cli_settings.output_filename.as_deref()
    ) {
        Ok(filename) => filename,
        Err(e) => {
            error!("Error while reorienting sequences: {e}");
            std::process::exit(exitcode::DATAERR);
        }
    };
    info!("Oriented sequences written to {output_filename:?}");
}

fn main() {
    let cli = get_cli();
    match cli.command {
        Commands::Select(settings) => {
            run_select(*settings);
        },
        Commands::Orient(settings) => {
            run_orient(*settings);
        }
    };
    info!("Processing complete.");
}
