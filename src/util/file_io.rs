
use bio::io::{fasta, fastq};
use flate2::read::MultiGzDecoder;
use log::debug;
use simple_error::{bail, SimpleError};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use crate::data_types::sequence_record::{SequenceFormat, SequenceRecord};

/// FASTQ quality characters carry this offset
const PHRED_OFFSET: u8 = 33;
/// Highest legal FASTQ quality character, i.e. Phred 93
const PHRED_MAX_ENCODED: u8 = 126;

/// Builds the id + description header the way the on-disk formats store it
fn join_name(id: &str, description: Option<&str>) -> String {
    match description {
        Some(description) => format!("{id} {description}"),
        None => id.to_string()
    }
}

/// Strips the ASCII offset from a FASTQ quality track, rejecting corrupt characters
fn decode_quality(encoded: &[u8]) -> Result<Vec<u8>, SimpleError> {
    encoded.iter()
        .map(|&c| {
            if !(PHRED_OFFSET..=PHRED_MAX_ENCODED).contains(&c) {
                bail!("Quality character {c} is outside the Phred+33 range");
            }
            Ok(c - PHRED_OFFSET)
        })
        .collect()
}

/// Loads all records from a FASTA or FASTQ file, gzipped or not.
/// # Arguments
/// * `filename` - the file path to open and parse; the extension selects the parser
/// # Errors
/// * if the filename is not a recognized sequence format
/// * if the file does not open or parse properly
/// * if a FASTQ quality track contains characters outside the Phred+33 range
pub fn read_sequence_file(filename: &Path) -> Result<Vec<SequenceRecord>, Box<dyn std::error::Error>> {
    let format = match SequenceFormat::from_path(filename) {
        Some(format) => format,
        None => bail!("Input file must be either FASTA or FASTQ: {filename:?}")
    };
    debug!("Loading {format} records from {filename:?}");

    let fp: Box<dyn std::io::Read> = if filename.extension().unwrap_or_default() == "gz" {
        Box::new(
            MultiGzDecoder::new(
                File::open(filename)?
            )
        )
    } else {
        Box::new(File::open(filename)?)
    };

    let mut records: Vec<SequenceRecord> = vec![];
    match format {
        SequenceFormat::Fasta => {
            for entry in fasta::Reader::new(fp).records() {
                let entry = entry?;
                let name = join_name(entry.id(), entry.desc());
                records.push(SequenceRecord::new(name, entry.seq().to_vec()));
            }
        },
        SequenceFormat::Fastq => {
            for entry in fastq::Reader::new(fp).records() {
                let entry = entry?;
                let name = join_name(entry.id(), entry.desc());
                let quality = decode_quality(entry.qual())?;
                records.push(SequenceRecord::with_quality(name, entry.seq().to_vec(), quality));
            }
        }
    }
    Ok(records)
}

/// Writes records out in the requested format.
/// # Arguments
/// * `filename` - location to save the records to
/// * `records` - the records to write, in order
/// * `format` - the output format
/// # Errors
/// * if the file cannot be created or written
/// * if FASTQ output is requested for a record with no quality values
pub fn write_sequence_file(filename: &Path, records: &[SequenceRecord], format: SequenceFormat) -> Result<(), Box<dyn std::error::Error>> {
    debug!("Writing {} {format} records to {filename:?}", records.len());
    match format {
        SequenceFormat::Fasta => {
            let mut writer = fasta::Writer::to_file(filename)?;
            for record in records.iter() {
                let (id, description) = record.id_and_description();
                writer.write(id, description, record.sequence())?;
            }
        },
        SequenceFormat::Fastq => {
            let mut writer = fastq::Writer::to_file(filename)?;
            for record in records.iter() {
                let (id, description) = record.id_and_description();
                let quality = match record.quality() {
                    Some(quality) => quality,
                    None => bail!("Record \"{}\" has no quality values, cannot write FASTQ", record.id())
                };
                let encoded: Vec<u8> = quality.iter().map(|&q| q + PHRED_OFFSET).collect();
                writer.write(id, description, record.sequence(), &encoded)?;
            }
        }
    }
    Ok(())
}

/// Derives an output path as `<basename-without-extension>.<tag>.<format>`,
/// e.g. `sample.fastq` with tag "oriented" becomes `sample.oriented.fastq`.
/// A trailing `.gz` on the input is dropped along with the extension.
/// # Errors
/// * if the input filename is not a recognized sequence format
pub fn derived_output_path(input: &Path, tag: &str) -> Result<PathBuf, SimpleError> {
    let format = match SequenceFormat::from_path(input) {
        Some(format) => format,
        None => bail!("Cannot derive an output name from {input:?}, expected a FASTA or FASTQ file")
    };
    let filename = match input.file_name().and_then(|f| f.to_str()) {
        Some(filename) => filename,
        None => bail!("Cannot derive an output name from {input:?}")
    };

    let mut base = filename;
    if base.len() > 3 && base[base.len() - 3..].eq_ignore_ascii_case(".gz") {
        base = &base[..base.len() - 3];
    }
    let base = match base.rfind('.') {
        Some(index) => &base[..index],
        None => base
    };
    Ok(input.with_file_name(format!("{base}.{tag}.{format}")))
}

/// This will save a generic serializable struct to JSON.
/// # Arguments
/// * `data` - the data in memory
/// * `out_filename` - user provided path to write to
/// # Errors
/// * if opening or writing to the file throw errors
/// * if JSON serialization throws errors
pub fn save_json<T: serde::Serialize>(data: &T, out_filename: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let file = File::create(out_filename)?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, data)?;
    writer.flush()?;
    Ok(())
}

/// True if the path names a regular file with at least one byte in it
pub fn is_nonempty_file(filename: &Path) -> bool {
    std::fs::metadata(filename)
        .map(|metadata| metadata.is_file() && metadata.len() > 0)
        .unwrap_or(false)
}
