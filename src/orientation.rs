
use log::{debug, info};
use rustc_hash::FxHashSet as HashSet;
use simple_error::{bail, SimpleError};
use std::path::{Path, PathBuf};

use crate::data_types::sequence_record::{SequenceFormat, SequenceRecord};
use crate::report_io::{ReportError, ReportReader};
use crate::util::file_io::{derived_output_path, is_nonempty_file, read_sequence_file, write_sequence_file};

/// Collects the query names whose strand disagrees with their reference
/// target in an alignment report. These are the sequences that need to be
/// flipped onto the reference strand.
/// # Errors
/// * if the report cannot be opened or contains a malformed record
pub fn reversed_query_names(align_filename: &Path) -> Result<HashSet<String>, ReportError> {
    let mut reversed: HashSet<String> = Default::default();
    for entry in ReportReader::from_path(align_filename)? {
        let record = entry?;
        if record.qstrand() != record.tstrand() {
            reversed.insert(record.qname().to_string());
        }
    }
    Ok(reversed)
}

/// Reverse-complements the records named in the reversed set, passing all
/// others through untouched. Record order is preserved. Names in the set
/// with no matching record are ignored; the report may legitimately mention
/// sequences that were filtered out upstream.
/// # Errors
/// * if a flagged record contains a non-nucleotide character
pub fn orient_records(records: Vec<SequenceRecord>, reversed: &HashSet<String>) -> Result<Vec<SequenceRecord>, SimpleError> {
    records.into_iter()
        .map(|record| {
            if reversed.contains(record.id()) {
                record.reverse_complement()
            } else {
                Ok(record)
            }
        })
        .collect()
}

/// Whole-file driver: reorients a sequence file so every record points the
/// same direction as its reference. If the output file already exists with
/// content, the previous result is reused and nothing is recomputed.
/// # Arguments
/// * `input_filename` - FASTA/FASTQ of sequences to reorient
/// * `align_filename` - alignment report for the sequences
/// * `output_filename` - optional explicit output; derived as `<input>.oriented.<type>` otherwise
/// # Errors
/// * if the output is not a FASTA/FASTQ path, or any read/write fails
pub fn orient_sequence_file(
    input_filename: &Path, align_filename: &Path, output_filename: Option<&Path>
) -> Result<PathBuf, Box<dyn std::error::Error>> {
    info!("Reorienting sequences in {input_filename:?} to the direction of their reference");

    let output_filename = match output_filename {
        Some(filename) => filename.to_path_buf(),
        None => derived_output_path(input_filename, "oriented")?
    };
    let output_format = match SequenceFormat::from_path(&output_filename) {
        Some(format) => format,
        None => bail!("Output file must be either FASTA or FASTQ: {output_filename:?}")
    };

    if is_nonempty_file(&output_filename) {
        info!("Found existing output file {output_filename:?}, skipping orientation step");
        return Ok(output_filename);
    }

    let reversed = reversed_query_names(align_filename)?;
    debug!("{} sequences flagged for reverse-complement", reversed.len());

    let records = read_sequence_file(input_filename)?;
    let oriented = orient_records(records, &reversed)?;

    write_sequence_file(&output_filename, &oriented, output_format)?;
    Ok(output_filename)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    use crate::data_types::alignment_record::{AlignmentRecord, CompactRecord, ReportSchema, Strand};
    use crate::report_io::ReportWriter;

    fn compact(qname: &str, qstrand: Strand, tstrand: Strand) -> AlignmentRecord {
        AlignmentRecord::Compact(CompactRecord {
            qname: qname.to_string(),
            tname: "HLA_A*01:01".to_string(),
            qstrand,
            tstrand,
            score: -500, pctsimilarity: 99.0,
            tstart: 0, tend: 4, tlength: 4,
            qstart: 0, qend: 4, qlength: 4,
            ncells: 16
        })
    }

    fn write_report(records: &[AlignmentRecord]) -> tempfile::NamedTempFile {
        let temp = tempfile::Builder::new()
            .suffix(".m1")
            .tempfile()
            .unwrap();
        let mut writer = ReportWriter::new(temp.reopen().unwrap(), ReportSchema::Compact).unwrap();
        writer.write_all(records.iter()).unwrap();
        writer.flush().unwrap();
        temp
    }

    #[test]
    fn test_reversed_query_names() {
        let report = write_report(&[
            compact("q0", Strand::Forward, Strand::Forward),
            compact("q1", Strand::Forward, Strand::Reverse),
            compact("q2", Strand::Reverse, Strand::Forward),
            compact("q3", Strand::Reverse, Strand::Reverse)
        ]);
        let reversed = reversed_query_names(report.path()).unwrap();

        assert_eq!(reversed.len(), 2);
        assert!(reversed.contains("q1"));
        assert!(reversed.contains("q2"));
    }

    #[test]
    fn test_orient_records() {
        let records = vec![
            SequenceRecord::new("q0 some description".to_string(), b"AACG".to_vec()),
            SequenceRecord::new("q1".to_string(), b"AACG".to_vec())
        ];
        // q0 matches by first token; "phantom" has no record and is ignored
        let reversed: HashSet<String> = ["q0", "phantom"].iter().map(|id| id.to_string()).collect();
        let oriented = orient_records(records, &reversed).unwrap();

        assert_eq!(oriented.len(), 2);
        assert_eq!(oriented[0].sequence(), b"CGTT");
        assert_eq!(oriented[0].name(), "q0 some description");
        assert_eq!(oriented[1].sequence(), b"AACG");
    }

    #[test]
    fn test_orient_sequence_file_idempotent() {
        let temp_dir = tempfile::tempdir().unwrap();
        let input_filename = temp_dir.path().join("sample.fasta");
        std::fs::write(&input_filename, ">q0\nAACG\n>q1\nAACG\n").unwrap();

        let report = write_report(&[
            compact("q0", Strand::Forward, Strand::Reverse),
            compact("q1", Strand::Forward, Strand::Forward)
        ]);

        let output_filename = orient_sequence_file(&input_filename, report.path(), None).unwrap();
        assert_eq!(output_filename, temp_dir.path().join("sample.oriented.fasta"));
        let first_pass = std::fs::read_to_string(&output_filename).unwrap();
        assert!(first_pass.contains("CGTT"));

        // scribble on the output; a second run must keep it rather than recompute
        let mut handle = std::fs::OpenOptions::new().append(true).open(&output_filename).unwrap();
        writeln!(handle, ";marker").unwrap();
        let marked = std::fs::read_to_string(&output_filename).unwrap();

        let second = orient_sequence_file(&input_filename, report.path(), None).unwrap();
        assert_eq!(second, output_filename);
        assert_eq!(std::fs::read_to_string(&output_filename).unwrap(), marked);
    }
}
